//! Worklist assembly and the mapping template artifact.
//!
//! The four matcher buckets and the derived candidates converge here into a
//! single ordered row sequence. Bucket order is fixed (Matched,
//! VersionRelaxed, FrequencyRelaxed, Unmatched, Derived) and every bucket
//! after the first is preceded by its caution banner, whether or not the
//! bucket has rows, so review tooling can rely on the worklist structure.
//! The artifact is a `;`-delimited CSV named `map_{alias}.csv`.

use std::path::Path;

use tracing::info;

use crate::feed::DiscoveredVariable;
use crate::resolve::{remove_duplicates, DerivedCandidate, MatchPass};

/// Column order of the template artifact.
pub const TEMPLATE_HEADER: [&str; 17] = [
    "cmor_var",
    "input_vars",
    "calculation",
    "units",
    "dimensions",
    "frequency",
    "realm",
    "cell_methods",
    "positive",
    "cmor_table",
    "version",
    "vtype",
    "size",
    "nsteps",
    "filename",
    "long_name",
    "standard_name",
];

pub const BANNER_VERSION: &str =
    "# Variables definitions coming from different model version: Use with caution!";
pub const BANNER_FREQUENCY: &str = "# Variables with different frequency: Use with caution!";
pub const BANNER_UNMATCHED: &str = "# Variables without mapping";
pub const BANNER_DERIVED: &str = "# Derived variables: Use with caution!";
pub const BANNER_MULTIPLE: &str = "#Variables presenting definitions with different inputs";

/// Errors from writing the template artifact.
#[derive(Debug, thiserror::Error)]
pub enum WorklistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type WorklistResult<T> = Result<T, WorklistError>;

/// One worklist row: either a full-width variable entry or a caution banner
/// carried in the first column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorklistRow {
    Banner(&'static str),
    Entry(Box<[String; 17]>),
}

/// The ordered, annotated review worklist for one resolution pass.
#[derive(Debug, Default)]
pub struct Worklist {
    pub rows: Vec<WorklistRow>,
}

impl Worklist {
    /// Number of variable entries, banners excluded.
    pub fn entry_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r, WorklistRow::Entry(_)))
            .count()
    }
}

/// Assemble the worklist from a matching pass and the derived candidates.
///
/// Each bucket is deduplicated (strict identity) before rendering.
pub fn build_worklist(
    pass: MatchPass,
    derived: Vec<DerivedCandidate>,
    version: &str,
) -> Worklist {
    let mut rows = Vec::new();

    for var in remove_duplicates(pass.matched, true) {
        rows.push(WorklistRow::Entry(entry_line(&var, version)));
    }
    rows.push(WorklistRow::Banner(BANNER_VERSION));
    for var in remove_duplicates(pass.version_relaxed, true) {
        rows.push(WorklistRow::Entry(entry_line(&var, version)));
    }
    rows.push(WorklistRow::Banner(BANNER_FREQUENCY));
    for var in remove_duplicates(pass.frequency_relaxed, true) {
        rows.push(WorklistRow::Entry(entry_line(&var, version)));
    }
    rows.push(WorklistRow::Banner(BANNER_UNMATCHED));
    for var in remove_duplicates(pass.unmatched, true) {
        rows.push(WorklistRow::Entry(entry_line(&var, version)));
    }
    rows.push(WorklistRow::Banner(BANNER_DERIVED));
    for candidate in &derived {
        rows.push(WorklistRow::Entry(derived_line(candidate, version)));
    }
    rows.push(WorklistRow::Banner(BANNER_MULTIPLE));

    Worklist { rows }
}

/// Render one non-derived record; cmor_var falls back to the raw name.
fn entry_line(var: &DiscoveredVariable, version: &str) -> Box<[String; 17]> {
    let cmor_var = if var.cmor_var.is_empty() {
        var.name.clone()
    } else {
        var.cmor_var.clone()
    };
    Box::new([
        cmor_var,
        var.name.clone(),
        String::new(),
        var.units.clone(),
        var.dimensions.clone(),
        var.frequency.clone(),
        var.realm.clone(),
        var.cell_methods.clone(),
        var.positive.clone(),
        var.cmor_table.clone(),
        version.to_string(),
        var.vtype.clone(),
        var.size.clone(),
        var.nsteps.clone(),
        var.file_pattern.clone(),
        var.long_name.clone(),
        var.standard_name.clone(),
    ])
}

/// Render one derived candidate.
fn derived_line(candidate: &DerivedCandidate, version: &str) -> Box<[String; 17]> {
    let entry = &candidate.entry;
    Box::new([
        entry.cmor_var.clone(),
        entry.input_vars.clone(),
        quote_calculation(&entry.calculation),
        entry.units.clone(),
        entry.dimensions.clone(),
        entry.frequency.clone(),
        entry.realm.clone(),
        entry.cell_methods.clone(),
        entry.positive.clone(),
        entry.cmor_table.clone(),
        version.to_string(),
        candidate.vtype.clone(),
        candidate.size.clone(),
        candidate.nsteps.clone(),
        candidate.file_patterns.clone(),
        String::new(),
        String::new(),
    ])
}

/// Calculations containing a comma get double quotes so downstream
/// comma-delimited tooling keeps them as one field.
fn quote_calculation(calculation: &str) -> String {
    if calculation.contains(',') {
        format!("\"{calculation}\"")
    } else {
        calculation.to_string()
    }
}

/// Write the worklist as `;`-delimited CSV to the given path.
pub fn write_template<P: AsRef<Path>>(worklist: &Worklist, path: P) -> WorklistResult<()> {
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_path(path)?;

    writer.write_record(TEMPLATE_HEADER)?;
    for row in &worklist.rows {
        match row {
            WorklistRow::Banner(text) => {
                let mut record = vec![String::new(); TEMPLATE_HEADER.len()];
                record[0] = text.to_string();
                writer.write_record(&record)?;
            }
            WorklistRow::Entry(fields) => writer.write_record(fields.iter())?,
        }
    }
    writer.flush()?;
    info!(
        "Worklist with {} entries written to {}",
        worklist.entry_count(),
        path.display()
    );
    Ok(())
}
