//! Readers for operator-curated input files feeding the catalog.
//!
//! Three formats are supported:
//!
//! - the `;`-delimited mapping CSV written by the worklist emitter (and
//!   hand-edited by operators before ingestion)
//! - the legacy `,`-delimited APP4 mapping format
//! - CMOR table JSON files (`variable_entry` keyed by name)

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use super::{CatalogEntry, CmorVariable};

/// Errors from reading curated input files.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type IngestResult<T> = Result<T, IngestError>;

/// Read a complete mapping CSV file into catalog rows.
///
/// File columns: cmor_var, input_vars, calculation, units, dimensions,
/// frequency, realm, cell_methods, positive, cmor_table, version, vtype,
/// size, nsteps, filename, long_name, standard_name. The table's notes
/// column takes the standard_name position when filled, the long_name
/// position otherwise; an empty alias falls back to the filename column.
pub fn read_map<P: AsRef<Path>>(path: P, alias: &str) -> IngestResult<Vec<CatalogEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_path(path.as_ref())?;

    let mut origin = alias.to_string();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let first = record.get(0).unwrap_or("");
        if first.is_empty() || first.starts_with('#') || first == "cmor_var" {
            continue;
        }
        if record.len() < 17 {
            warn!("Skipping malformed mapping row ({} fields): {first}", record.len());
            continue;
        }
        let field = |i: usize| record.get(i).unwrap_or("").to_string();
        let notes = if record.get(16).unwrap_or("").is_empty() {
            field(15)
        } else {
            field(16)
        };
        if origin.is_empty() {
            origin = field(14);
        }
        rows.push(CatalogEntry {
            cmor_var: field(0),
            input_vars: field(1),
            calculation: field(2),
            units: field(3),
            dimensions: field(4),
            frequency: field(5),
            realm: field(6),
            cell_methods: field(7),
            positive: field(8),
            cmor_table: field(9),
            model: field(10),
            notes,
            origin: origin.clone(),
        });
    }
    Ok(rows)
}

/// Read a legacy APP4-style mapping file.
///
/// Old column order: cmor_var, definable, input_vars, calculation, units,
/// axes_mod, positive, version, realm, notes. A version of `both` expands
/// into one CM2 row and one ESM1.5 row.
pub fn read_map_app4<P: AsRef<Path>>(path: P) -> IngestResult<Vec<CatalogEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(false)
        .flexible(true)
        .from_path(path.as_ref())?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let first = record.get(0).unwrap_or("");
        if first.is_empty() || first.starts_with('#') {
            continue;
        }
        if record.len() < 10 {
            warn!("Skipping malformed APP4 row ({} fields): {first}", record.len());
            continue;
        }
        let field = |i: usize| record.get(i).unwrap_or("").to_string();
        let mut version = field(7);
        if version == "ESM" {
            version = "ESM1.5".to_string();
        }
        let row = CatalogEntry {
            cmor_var: field(0),
            input_vars: field(2),
            calculation: field(3),
            units: field(4),
            realm: field(8),
            positive: field(6),
            model: version.clone(),
            notes: field(9),
            origin: "app4".to_string(),
            ..Default::default()
        };
        if version == "both" {
            rows.push(CatalogEntry {
                model: "CM2".to_string(),
                ..row.clone()
            });
            rows.push(CatalogEntry {
                model: "ESM1.5".to_string(),
                ..row
            });
        } else {
            rows.push(row);
        }
    }
    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct CmorTableFile {
    #[serde(default)]
    variable_entry: BTreeMap<String, CmorVariable>,
}

/// Read variable definitions from a CMOR table JSON file.
pub fn read_cmor_table<P: AsRef<Path>>(path: P) -> IngestResult<Vec<CmorVariable>> {
    let content = fs::read_to_string(path.as_ref())?;
    let table: CmorTableFile = serde_json::from_str(&content)?;
    let rows = table
        .variable_entry
        .into_iter()
        .map(|(name, mut var)| {
            var.name = name;
            var
        })
        .collect();
    Ok(rows)
}
