//! Record types for the two catalog tables.

use serde::{Deserialize, Serialize};

/// One row of the `mapping` table: a known raw-to-CMOR variable mapping.
///
/// Identity is the tuple (cmor_var, input_vars, calculation, cmor_table,
/// model); the store enforces it as the primary key and silently ignores
/// duplicate inserts. A non-empty `calculation` marks a derived mapping
/// that combines several raw inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub cmor_var: String,
    /// Space-separated raw input variable names.
    pub input_vars: String,
    /// Opaque calculation expression; empty for direct mappings.
    pub calculation: String,
    pub units: String,
    pub dimensions: String,
    pub frequency: String,
    pub realm: String,
    pub cell_methods: String,
    /// Sign convention ("up", "down" or empty).
    pub positive: String,
    pub cmor_table: String,
    /// Model version the mapping was defined for (e.g. "ESM1.5", "CM2").
    pub model: String,
    pub notes: String,
    /// Provenance tag: which curated file the row came from.
    pub origin: String,
}

impl CatalogEntry {
    /// Raw input names required by this mapping.
    pub fn input_tokens(&self) -> impl Iterator<Item = &str> {
        self.input_vars.split_whitespace()
    }

    /// True when the variable must be computed from its inputs.
    pub fn is_derived(&self) -> bool {
        !self.calculation.is_empty()
    }
}

/// A candidate returned by the direct (non-derived) lookup paths.
///
/// Carries the subset of mapping columns the resolver and matcher need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectCandidate {
    pub cmor_var: String,
    pub input_vars: String,
    pub model: String,
    pub frequency: String,
    pub realm: String,
    pub positive: String,
    pub units: String,
    pub cmor_table: String,
}

/// One row of the `cmorvar` table: canonical CMOR variable metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CmorVariable {
    #[serde(skip)]
    pub name: String,
    pub frequency: String,
    pub modeling_realm: String,
    pub standard_name: String,
    pub units: String,
    pub cell_methods: String,
    pub cell_measures: String,
    pub long_name: String,
    pub comment: String,
    pub dimensions: String,
    pub out_name: String,
    #[serde(rename = "type")]
    pub var_type: String,
    pub positive: String,
    pub valid_min: String,
    pub valid_max: String,
    pub flag_values: String,
    pub flag_meanings: String,
    pub ok_min_mean_abs: String,
    pub ok_max_mean_abs: String,
}
