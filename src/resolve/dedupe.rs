//! Order-preserving removal of duplicate variable definitions.

use std::collections::HashSet;

use crate::catalog::CatalogEntry;
use crate::feed::DiscoveredVariable;

/// The fields a variable definition is identified by for deduplication.
pub trait VariableIdentity {
    fn cmor_var(&self) -> &str;
    fn input_vars(&self) -> &str;
    fn calculation(&self) -> &str;
    fn frequency(&self) -> &str;
    fn realm(&self) -> &str;
}

impl VariableIdentity for CatalogEntry {
    fn cmor_var(&self) -> &str {
        &self.cmor_var
    }
    fn input_vars(&self) -> &str {
        &self.input_vars
    }
    fn calculation(&self) -> &str {
        &self.calculation
    }
    fn frequency(&self) -> &str {
        &self.frequency
    }
    fn realm(&self) -> &str {
        &self.realm
    }
}

impl VariableIdentity for DiscoveredVariable {
    fn cmor_var(&self) -> &str {
        &self.cmor_var
    }
    fn input_vars(&self) -> &str {
        &self.name
    }
    // Discovered records never carry a calculation of their own.
    fn calculation(&self) -> &str {
        ""
    }
    fn frequency(&self) -> &str {
        &self.frequency
    }
    fn realm(&self) -> &str {
        &self.realm
    }
}

/// Drop later occurrences of each variable identity, keeping first-seen order.
///
/// Identity is (cmor_var, input_vars, calculation, frequency, realm) in
/// strict mode and (cmor_var, input_vars, calculation) otherwise. Pure and
/// idempotent.
pub fn remove_duplicates<T: VariableIdentity>(rows: Vec<T>, strict: bool) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(rows.len());
    for row in rows {
        let vid = if strict {
            (
                row.cmor_var().to_string(),
                row.input_vars().to_string(),
                row.calculation().to_string(),
                row.frequency().to_string(),
                row.realm().to_string(),
            )
        } else {
            (
                row.cmor_var().to_string(),
                row.input_vars().to_string(),
                row.calculation().to_string(),
                String::new(),
                String::new(),
            )
        };
        if seen.insert(vid) {
            unique.push(row);
        }
    }
    unique
}
