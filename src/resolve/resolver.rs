//! Single-name resolution with the ambiguity tie-break policy.

use tracing::{debug, info};

use crate::catalog::{CatalogResult, MappingCatalog};

/// Resolve one raw variable name to its best (cmor_var, cmor_table) pair.
///
/// Returns empty strings when the catalog has no direct candidate. With
/// several candidates the tie-break runs in strict priority order:
///
/// 1. model version and frequency both match
/// 2. frequency matches
/// 3. model version matches
/// 4. first candidate in catalog order
///
/// The first satisfied tier wins; ties within a tier fall to catalog order.
/// A raw name that exists at all in the catalog always resolves to
/// something, so downstream review never loses it.
pub fn resolve(
    catalog: &MappingCatalog,
    raw_name: &str,
    version: &str,
    frequency: &str,
) -> CatalogResult<(String, String)> {
    let candidates = catalog.direct_candidates(raw_name)?;

    match candidates.len() {
        0 => Ok((String::new(), String::new())),
        1 => Ok((
            candidates[0].cmor_var.clone(),
            candidates[0].cmor_table.clone(),
        )),
        _ => {
            debug!(
                "Found more than 1 definition for {raw_name}: {:?}",
                candidates
                    .iter()
                    .map(|c| (&c.cmor_var, &c.model, &c.frequency))
                    .collect::<Vec<_>>()
            );
            let best = candidates
                .iter()
                .find(|c| c.model == version && c.frequency == frequency)
                .or_else(|| candidates.iter().find(|c| c.frequency == frequency))
                .or_else(|| candidates.iter().find(|c| c.model == version))
                .unwrap_or_else(|| {
                    info!(
                        "No context match for {raw_name}; using {} from {}",
                        candidates[0].cmor_var, candidates[0].cmor_table
                    );
                    &candidates[0]
                });
            Ok((best.cmor_var.clone(), best.cmor_table.clone()))
        }
    }
}
