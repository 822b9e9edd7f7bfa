//! SQLite-backed catalog of variable mappings.
//!
//! Holds two tables:
//!
//! - `mapping`: known raw-to-CMOR variable mappings, keyed by the composite
//!   identity (cmor_var, input_vars, calculation, cmor_table, model)
//! - `cmorvar`: canonical CMOR variable metadata, keyed by name
//!
//! The resolution engine only reads; the write paths exist for the bulk
//! ingestion of operator-curated mapping files and CMOR tables. Inserts are
//! idempotent (`INSERT OR IGNORE` against the primary key).
//!
//! Every read query carries an `ORDER BY` over the identity columns so that
//! "first candidate" always means lexicographic catalog order, not whatever
//! row order SQLite happens to return.

mod entry;
pub mod ingest;

pub use entry::{CatalogEntry, CmorVariable, DirectCandidate};

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

/// Errors from catalog operations.
///
/// A `Sqlite` error on open or query means the backing store is unreachable,
/// which is fatal to the whole resolution pass.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to determine database directory")]
    NoDatabaseDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

const MAPPING_COLUMNS: &str = "cmor_var, input_vars, calculation, units, dimensions, \
     frequency, realm, cell_methods, positive, cmor_table, model, notes, origin";

/// Identity-column ordering applied to every read query.
const MAPPING_ORDER: &str = "ORDER BY cmor_var, input_vars, calculation, cmor_table, model";

/// The mapping database.
pub struct MappingCatalog {
    conn: Connection,
}

impl MappingCatalog {
    /// Open or create the catalog database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> CatalogResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let catalog = Self { conn };
        catalog.init()?;
        info!("Opened mapping database at {}", path.display());
        Ok(catalog)
    }

    /// Open an in-memory catalog (for testing).
    pub fn open_in_memory() -> CatalogResult<Self> {
        let conn = Connection::open_in_memory()?;
        let catalog = Self { conn };
        catalog.init()?;
        Ok(catalog)
    }

    /// Default database location: `~/.mopdb/access.db`.
    pub fn default_path() -> CatalogResult<PathBuf> {
        let base = dirs::home_dir().ok_or(CatalogError::NoDatabaseDir)?;
        Ok(base.join(".mopdb").join("access.db"))
    }

    /// Create both tables if the database is empty.
    fn init(&self) -> CatalogResult<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS mapping (
                cmor_var TEXT,
                input_vars TEXT,
                calculation TEXT,
                units TEXT,
                dimensions TEXT,
                frequency TEXT,
                realm TEXT,
                cell_methods TEXT,
                positive TEXT,
                cmor_table TEXT,
                model TEXT,
                notes TEXT,
                origin TEXT,
                PRIMARY KEY (cmor_var, input_vars, calculation, cmor_table, model)
            ) WITHOUT ROWID;

            CREATE TABLE IF NOT EXISTS cmorvar (
                name TEXT PRIMARY KEY,
                frequency TEXT,
                modeling_realm TEXT,
                standard_name TEXT,
                units TEXT,
                cell_methods TEXT,
                cell_measures TEXT,
                long_name TEXT,
                comment TEXT,
                dimensions TEXT,
                out_name TEXT,
                type TEXT,
                positive TEXT,
                valid_min TEXT,
                valid_max TEXT,
                flag_values TEXT,
                flag_meanings TEXT,
                ok_min_mean_abs TEXT,
                ok_max_mean_abs TEXT
            );
            ",
        )?;
        Ok(())
    }

    /// Direct (non-derived) mapping candidates for one raw variable name.
    pub fn direct_candidates(&self, raw_name: &str) -> CatalogResult<Vec<DirectCandidate>> {
        let sql = format!(
            "SELECT cmor_var, input_vars, model, frequency, realm, positive, units, cmor_table \
             FROM mapping \
             WHERE input_vars = ?1 AND (calculation = '' OR calculation IS NULL) \
             {MAPPING_ORDER}"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![raw_name], candidate_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// All direct (non-derived) mappings, used to build the matcher index
    /// once per resolution pass.
    pub fn direct_mappings(&self) -> CatalogResult<Vec<DirectCandidate>> {
        let sql = format!(
            "SELECT cmor_var, input_vars, model, frequency, realm, positive, units, cmor_table \
             FROM mapping \
             WHERE calculation = '' OR calculation IS NULL \
             {MAPPING_ORDER}"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], candidate_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Full mapping rows whose input expression contains the given name.
    ///
    /// Substring containment, so callers must still check token membership.
    pub fn entries_containing(&self, raw_name: &str) -> CatalogResult<Vec<CatalogEntry>> {
        let sql = format!(
            "SELECT {MAPPING_COLUMNS} FROM mapping WHERE input_vars LIKE ?1 {MAPPING_ORDER}"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let pattern = format!("%{raw_name}%");
        let rows = stmt
            .query_map(params![pattern], entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Canonical CMOR metadata for one variable name.
    pub fn cmor_variable(&self, name: &str) -> CatalogResult<Option<CmorVariable>> {
        let row = self
            .conn
            .query_row(
                "SELECT name, frequency, modeling_realm, standard_name, units, cell_methods, \
                 cell_measures, long_name, comment, dimensions, out_name, type, positive, \
                 valid_min, valid_max, flag_values, flag_meanings, ok_min_mean_abs, \
                 ok_max_mean_abs FROM cmorvar WHERE name = ?1",
                params![name],
                cmor_variable_from_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Bulk-insert mapping rows, ignoring duplicates by primary key.
    ///
    /// Returns the number of rows actually inserted.
    pub fn insert_mappings(&mut self, rows: &[CatalogEntry]) -> CatalogResult<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let sql = format!(
                "INSERT OR IGNORE INTO mapping ({MAPPING_COLUMNS}) \
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13)"
            );
            let mut stmt = tx.prepare(&sql)?;
            for row in rows {
                inserted += stmt.execute(params![
                    row.cmor_var,
                    row.input_vars,
                    row.calculation,
                    row.units,
                    row.dimensions,
                    row.frequency,
                    row.realm,
                    row.cell_methods,
                    row.positive,
                    row.cmor_table,
                    row.model,
                    row.notes,
                    row.origin,
                ])?;
            }
        }
        tx.commit()?;
        info!("Rows modified: {inserted}");
        Ok(inserted)
    }

    /// Bulk-insert CMOR variable definitions, ignoring duplicates by name.
    pub fn insert_cmor_vars(&mut self, rows: &[CmorVariable]) -> CatalogResult<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO cmorvar (name, frequency, modeling_realm, \
                 standard_name, units, cell_methods, cell_measures, long_name, comment, \
                 dimensions, out_name, type, positive, valid_min, valid_max, flag_values, \
                 flag_meanings, ok_min_mean_abs, ok_max_mean_abs) \
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19)",
            )?;
            for row in rows {
                inserted += stmt.execute(params![
                    row.name,
                    row.frequency,
                    row.modeling_realm,
                    row.standard_name,
                    row.units,
                    row.cell_methods,
                    row.cell_measures,
                    row.long_name,
                    row.comment,
                    row.dimensions,
                    row.out_name,
                    row.var_type,
                    row.positive,
                    row.valid_min,
                    row.valid_max,
                    row.flag_values,
                    row.flag_meanings,
                    row.ok_min_mean_abs,
                    row.ok_max_mean_abs,
                ])?;
            }
        }
        tx.commit()?;
        info!("Rows modified: {inserted}");
        Ok(inserted)
    }
}

fn candidate_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DirectCandidate> {
    Ok(DirectCandidate {
        cmor_var: row.get(0)?,
        input_vars: row.get(1)?,
        model: row.get(2)?,
        frequency: row.get(3)?,
        realm: row.get(4)?,
        positive: row.get(5)?,
        units: row.get(6)?,
        cmor_table: row.get(7)?,
    })
}

fn entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CatalogEntry> {
    Ok(CatalogEntry {
        cmor_var: row.get(0)?,
        input_vars: row.get(1)?,
        calculation: row.get(2)?,
        units: row.get(3)?,
        dimensions: row.get(4)?,
        frequency: row.get(5)?,
        realm: row.get(6)?,
        cell_methods: row.get(7)?,
        positive: row.get(8)?,
        cmor_table: row.get(9)?,
        model: row.get(10)?,
        notes: row.get(11)?,
        origin: row.get(12)?,
    })
}

fn cmor_variable_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CmorVariable> {
    Ok(CmorVariable {
        name: row.get(0)?,
        frequency: row.get(1)?,
        modeling_realm: row.get(2)?,
        standard_name: row.get(3)?,
        units: row.get(4)?,
        cell_methods: row.get(5)?,
        cell_measures: row.get(6)?,
        long_name: row.get(7)?,
        comment: row.get(8)?,
        dimensions: row.get(9)?,
        out_name: row.get(10)?,
        var_type: row.get(11)?,
        positive: row.get(12)?,
        valid_min: row.get(13)?,
        valid_max: row.get(14)?,
        flag_values: row.get(15)?,
        flag_meanings: row.get(16)?,
        ok_min_mean_abs: row.get(17)?,
        ok_max_mean_abs: row.get(18)?,
    })
}
