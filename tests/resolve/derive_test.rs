//! Integration tests for derived-variable detection.

use std::collections::HashSet;

use mopdb::catalog::{CatalogEntry, MappingCatalog};
use mopdb::feed::DiscoveredVariable;
use mopdb::resolve::derived_candidates;

fn wind_speed_entry() -> CatalogEntry {
    CatalogEntry {
        cmor_var: "sfcWind".to_string(),
        input_vars: "u v".to_string(),
        calculation: "sqrt(u^2+v^2)".to_string(),
        units: "m s-1".to_string(),
        dimensions: "lon lat plev time".to_string(),
        frequency: "fx".to_string(),
        realm: "atmos".to_string(),
        cmor_table: "Amon".to_string(),
        model: "ESM1.5".to_string(),
        ..Default::default()
    }
}

fn record(name: &str, frequency: &str, file_pattern: &str) -> DiscoveredVariable {
    DiscoveredVariable {
        name: name.to_string(),
        dimensions: "lon lat time".to_string(),
        frequency: frequency.to_string(),
        realm: "atmos".to_string(),
        vtype: "float32".to_string(),
        size: "1000".to_string(),
        nsteps: "12".to_string(),
        file_pattern: file_pattern.to_string(),
        ..Default::default()
    }
}

fn seen(records: &[DiscoveredVariable]) -> HashSet<String> {
    records.iter().map(|r| r.seen_key()).collect()
}

#[test]
fn test_missing_input_suppresses_candidate() {
    let mut catalog = MappingCatalog::open_in_memory().unwrap();
    catalog.insert_mappings(&[wind_speed_entry()]).unwrap();

    // "u" at mon but no "v" at mon.
    let records = vec![record("u", "mon", "atm_pd")];
    let candidates = derived_candidates(&catalog, &records, &seen(&records)).unwrap();
    assert!(candidates.is_empty());
}

#[test]
fn test_input_at_wrong_frequency_suppresses_candidate() {
    let mut catalog = MappingCatalog::open_in_memory().unwrap();
    catalog.insert_mappings(&[wind_speed_entry()]).unwrap();

    let records = vec![record("u", "mon", "atm_pd"), record("v", "day", "atm_pe")];
    let candidates = derived_candidates(&catalog, &records, &seen(&records)).unwrap();
    assert!(candidates.is_empty());
}

#[test]
fn test_all_inputs_present_materializes_candidate() {
    let mut catalog = MappingCatalog::open_in_memory().unwrap();
    catalog.insert_mappings(&[wind_speed_entry()]).unwrap();

    let records = vec![record("u", "mon", "atm_pe"), record("v", "mon", "atm_pd")];
    let candidates = derived_candidates(&catalog, &records, &seen(&records)).unwrap();

    // Both u and v trigger the same entry; structural dedup leaves one.
    assert_eq!(candidates.len(), 1);
    let candidate = &candidates[0];
    assert_eq!(candidate.entry.cmor_var, "sfcWind");
    // Grid and time shape come from the observed inputs, not the catalog.
    assert_eq!(candidate.entry.dimensions, "lon lat time");
    assert_eq!(candidate.entry.frequency, "mon");
    assert_eq!(candidate.vtype, "float32");
    // File patterns are the ordered union over the contributing inputs.
    assert_eq!(candidate.file_patterns, "atm_pd atm_pe");
}

#[test]
fn test_direct_entries_are_ignored() {
    let mut catalog = MappingCatalog::open_in_memory().unwrap();
    catalog
        .insert_mappings(&[CatalogEntry {
            cmor_var: "ua".to_string(),
            input_vars: "u".to_string(),
            frequency: "mon".to_string(),
            model: "ESM1.5".to_string(),
            cmor_table: "Amon".to_string(),
            ..Default::default()
        }])
        .unwrap();

    let records = vec![record("u", "mon", "atm_pd")];
    let candidates = derived_candidates(&catalog, &records, &seen(&records)).unwrap();
    assert!(candidates.is_empty());
}

#[test]
fn test_same_inputs_at_two_frequencies_yield_two_candidates() {
    let mut catalog = MappingCatalog::open_in_memory().unwrap();
    catalog.insert_mappings(&[wind_speed_entry()]).unwrap();

    let records = vec![
        record("u", "mon", "atm_pe"),
        record("v", "mon", "atm_pe"),
        record("u", "day", "atm_pd"),
        record("v", "day", "atm_pd"),
    ];
    let candidates = derived_candidates(&catalog, &records, &seen(&records)).unwrap();

    assert_eq!(candidates.len(), 2);
    let mut frequencies: Vec<&str> = candidates
        .iter()
        .map(|c| c.entry.frequency.as_str())
        .collect();
    frequencies.sort();
    assert_eq!(frequencies, vec!["day", "mon"]);
}
