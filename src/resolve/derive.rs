//! Detection of variables derivable from combinations of raw inputs.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::catalog::{CatalogEntry, CatalogResult, MappingCatalog};
use crate::feed::DiscoveredVariable;

/// A catalog mapping whose calculation can be satisfied by the discovered
/// batch.
///
/// Dimensions and frequency on `entry` are taken from the triggering record
/// rather than the catalog row: derived variables inherit grid and time shape
/// from the observed inputs, the catalog entry is frequency-agnostic.
/// Identity is the full rendered tuple, so an ordered set dedups candidates
/// structurally.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DerivedCandidate {
    pub entry: CatalogEntry,
    pub vtype: String,
    pub size: String,
    pub nsteps: String,
    /// Space-joined union of file patterns that supplied the inputs,
    /// lexicographically ordered.
    pub file_patterns: String,
}

/// Find catalog entries with a calculation whose required inputs were all
/// observed at the same frequency.
///
/// For each record the catalog is searched for entries containing the raw
/// name in their input expression; an entry materializes only when every
/// required token is present in `seen_keys` at the record's frequency.
pub fn derived_candidates(
    catalog: &MappingCatalog,
    records: &[DiscoveredVariable],
    seen_keys: &HashSet<String>,
) -> CatalogResult<Vec<DerivedCandidate>> {
    let mut candidates = BTreeSet::new();
    for record in records {
        for entry in catalog.entries_containing(&record.name)? {
            if !entry.is_derived() {
                continue;
            }
            let tokens: Vec<String> = entry.input_tokens().map(str::to_string).collect();
            let satisfied = tokens
                .iter()
                .all(|token| seen_keys.contains(&format!("{token}-{}", record.frequency)));
            if !satisfied {
                continue;
            }

            let file_patterns: BTreeSet<&str> = records
                .iter()
                .filter(|r| tokens.contains(&r.name) && r.frequency == record.frequency)
                .map(|r| r.file_pattern.as_str())
                .collect();

            let mut entry = entry;
            entry.dimensions = record.dimensions.clone();
            entry.frequency = record.frequency.clone();
            candidates.insert(DerivedCandidate {
                entry,
                vtype: record.vtype.clone(),
                size: record.size.clone(),
                nsteps: record.nsteps.clone(),
                file_patterns: file_patterns.into_iter().collect::<Vec<_>>().join(" "),
            });
        }
    }
    debug!("Found {} derivable variable candidates", candidates.len());
    Ok(candidates.into_iter().collect())
}
