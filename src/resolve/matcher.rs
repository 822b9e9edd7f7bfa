//! Classification of discovered variables against the catalog.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::catalog::{CatalogResult, DirectCandidate, MappingCatalog};
use crate::feed::DiscoveredVariable;

use super::resolver;

/// Result of one matching pass.
///
/// Every input record lands in exactly one of the four buckets. `seen_keys`
/// holds the "name-frequency" key of every record, matched or not, for the
/// derived-variable detector.
#[derive(Debug, Default)]
pub struct MatchPass {
    /// Exact (name, frequency, version) catalog match.
    pub matched: Vec<DiscoveredVariable>,
    /// Matched ignoring model version.
    pub version_relaxed: Vec<DiscoveredVariable>,
    /// Matched ignoring version and frequency.
    pub frequency_relaxed: Vec<DiscoveredVariable>,
    /// No catalog entry for the raw name at all.
    pub unmatched: Vec<DiscoveredVariable>,
    pub seen_keys: HashSet<String>,
}

impl MatchPass {
    /// Total records classified.
    pub fn len(&self) -> usize {
        self.matched.len()
            + self.version_relaxed.len()
            + self.frequency_relaxed.len()
            + self.unmatched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Catalog fields copied onto a record when a tier matches.
struct MatchInfo<'a> {
    cmor_var: &'a str,
    positive: &'a str,
    units: &'a str,
}

/// Classify a batch of discovered variables against the catalog.
///
/// The index over all non-derived mappings is built once up front and reused
/// read-only across the whole batch. Each record runs an ordered cascade of
/// three lookups (exact key, ignore version, ignore version and frequency);
/// every tier's candidate search is derived independently per record.
/// Records arriving with an empty cmor_var are first run through the name
/// resolver.
pub fn match_records(
    catalog: &MappingCatalog,
    records: Vec<DiscoveredVariable>,
    version: &str,
) -> CatalogResult<MatchPass> {
    let mappings = catalog.direct_mappings()?;
    // First row in catalog order wins when an index key repeats, matching
    // the tie-break of the relaxed tiers.
    let mut exact: HashMap<(&str, &str, &str), usize> = HashMap::new();
    for (i, m) in mappings.iter().enumerate() {
        exact
            .entry((m.input_vars.as_str(), m.frequency.as_str(), m.model.as_str()))
            .or_insert(i);
    }

    let mut pass = MatchPass::default();
    for mut record in records {
        if record.cmor_var.is_empty() {
            let (cmor_var, cmor_table) =
                resolver::resolve(catalog, &record.name, version, &record.frequency)?;
            record.cmor_var = cmor_var;
            if record.cmor_table.is_empty() {
                record.cmor_table = cmor_table;
            }
        }

        pass.seen_keys.insert(record.seen_key());

        let exact_hit = exact
            .get(&(record.name.as_str(), record.frequency.as_str(), version))
            .copied();
        if let Some(i) = exact_hit {
            apply_match(&mut record, candidate_info(&mappings[i]));
            pass.matched.push(record);
        } else if let Some(m) = mappings
            .iter()
            .find(|m| m.input_vars == record.name && m.frequency == record.frequency)
        {
            apply_match(&mut record, candidate_info(m));
            pass.version_relaxed.push(record);
        } else if let Some(m) = mappings.iter().find(|m| m.input_vars == record.name) {
            apply_match(&mut record, candidate_info(m));
            pass.frequency_relaxed.push(record);
        } else {
            // Synthetic match so the record still surfaces for review.
            let name = record.name.clone();
            apply_match(
                &mut record,
                MatchInfo {
                    cmor_var: &name,
                    positive: "",
                    units: "",
                },
            );
            pass.unmatched.push(record);
        }
    }

    debug!(
        "Matched {} records: {} exact, {} version-relaxed, {} frequency-relaxed, {} unmatched",
        pass.len(),
        pass.matched.len(),
        pass.version_relaxed.len(),
        pass.frequency_relaxed.len(),
        pass.unmatched.len()
    );
    Ok(pass)
}

fn candidate_info(m: &DirectCandidate) -> MatchInfo<'_> {
    MatchInfo {
        cmor_var: &m.cmor_var,
        positive: &m.positive,
        units: &m.units,
    }
}

/// Fill catalog-derived fields into a record: cmor_var only when the record
/// arrived without one, positive always, units only as a backfill.
fn apply_match(record: &mut DiscoveredVariable, info: MatchInfo<'_>) {
    if record.cmor_var.is_empty() {
        debug!("Assign cmor_var {} to {}", info.cmor_var, record.name);
        record.cmor_var = info.cmor_var.to_string();
    }
    record.positive = info.positive.to_string();
    if record.units.is_empty() {
        record.units = info.units.to_string();
    }
}
