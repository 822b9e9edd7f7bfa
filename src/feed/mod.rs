//! The discovered-variable feed.
//!
//! An external introspection step walks the model output files and writes one
//! `;`-delimited varlist per file pattern, one row per raw output variable.
//! This module turns those rows into [`DiscoveredVariable`] records, dropping
//! comment rows, the header row and anything malformed. One bad row never
//! aborts the batch.

use std::path::Path;

use tracing::warn;

/// Errors from reading a varlist feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type FeedResult<T> = Result<T, FeedError>;

/// Minimum fields a varlist row must carry (through file_pattern);
/// long_name and standard_name are optional trailers.
const REQUIRED_FIELDS: usize = 12;

/// One raw output variable observed in a batch of model output files.
///
/// Created by the introspection collaborator; the matcher only fills in
/// fields (cmor_var, cmor_table, positive, units), never restructures.
/// The frequency may carry a `Pt` modifier when the source had no time
/// bounds (e.g. `3hrPt`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredVariable {
    pub name: String,
    /// Resolved CMOR name; empty until resolution.
    pub cmor_var: String,
    pub units: String,
    pub dimensions: String,
    pub frequency: String,
    pub realm: String,
    pub cell_methods: String,
    pub cmor_table: String,
    /// Storage dtype of the variable, carried through verbatim.
    pub vtype: String,
    /// Grid size in bytes for one timestep, carried through verbatim.
    pub size: String,
    /// Total number of timesteps, carried through verbatim.
    pub nsteps: String,
    /// File pattern the variable was observed under.
    pub file_pattern: String,
    pub long_name: String,
    pub standard_name: String,
    /// Sign convention, filled from the catalog during matching.
    pub positive: String,
}

impl DiscoveredVariable {
    /// Build a record from positional varlist fields, or None when required
    /// fields are missing.
    pub fn from_fields(fields: &[&str]) -> Option<Self> {
        if fields.len() < REQUIRED_FIELDS {
            return None;
        }
        let field = |i: usize| fields.get(i).copied().unwrap_or("").to_string();
        Some(Self {
            name: field(0),
            cmor_var: field(1),
            units: field(2),
            dimensions: field(3),
            frequency: field(4),
            realm: field(5),
            cell_methods: field(6),
            cmor_table: field(7),
            vtype: field(8),
            size: field(9),
            nsteps: field(10),
            file_pattern: field(11),
            long_name: field(12),
            standard_name: field(13),
            positive: String::new(),
        })
    }

    /// The "name-frequency" key recorded for every observed variable and
    /// consulted by the derived-variable detector.
    pub fn seen_key(&self) -> String {
        format!("{}-{}", self.name, self.frequency)
    }
}

/// Read one varlist file into discovered-variable records.
pub fn read_varlist<P: AsRef<Path>>(path: P) -> FeedResult<Vec<DiscoveredVariable>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        let first = record.get(0).unwrap_or("");
        if first.is_empty() || first.starts_with('#') || first == "name" {
            continue;
        }
        let fields: Vec<&str> = record.iter().collect();
        match DiscoveredVariable::from_fields(&fields) {
            Some(var) => records.push(var),
            None => warn!(
                "Skipping malformed varlist row in {} ({} fields): {first}",
                path.display(),
                record.len()
            ),
        }
    }
    Ok(records)
}
