//! Integration tests for single-name resolution and its tie-break policy.

use mopdb::catalog::{CatalogEntry, MappingCatalog};
use mopdb::resolve::resolve;

fn entry(cmor_var: &str, input_vars: &str, frequency: &str, model: &str, table: &str) -> CatalogEntry {
    CatalogEntry {
        cmor_var: cmor_var.to_string(),
        input_vars: input_vars.to_string(),
        frequency: frequency.to_string(),
        model: model.to_string(),
        cmor_table: table.to_string(),
        ..Default::default()
    }
}

#[test]
fn test_no_candidate_resolves_empty() {
    let catalog = MappingCatalog::open_in_memory().unwrap();
    let (cmor_var, cmor_table) = resolve(&catalog, "fld_s03i236", "ESM1.5", "mon").unwrap();
    assert_eq!(cmor_var, "");
    assert_eq!(cmor_table, "");
}

#[test]
fn test_single_candidate_ignores_context() {
    let mut catalog = MappingCatalog::open_in_memory().unwrap();
    catalog
        .insert_mappings(&[entry("tas", "fld_s03i236", "mon", "ESM1.5", "Amon")])
        .unwrap();

    // Mismatched version and frequency still resolve to the only candidate.
    let (cmor_var, cmor_table) = resolve(&catalog, "fld_s03i236", "CM2", "day").unwrap();
    assert_eq!(cmor_var, "tas");
    assert_eq!(cmor_table, "Amon");
}

#[test]
fn test_tier_a_version_and_frequency() {
    let mut catalog = MappingCatalog::open_in_memory().unwrap();
    catalog
        .insert_mappings(&[
            entry("tas_day", "fld_s03i236", "day", "ESM1.5", "day"),
            entry("tas", "fld_s03i236", "mon", "ESM1.5", "Amon"),
            entry("tas_cm2", "fld_s03i236", "mon", "CM2", "Amon"),
        ])
        .unwrap();

    let (cmor_var, _) = resolve(&catalog, "fld_s03i236", "ESM1.5", "mon").unwrap();
    assert_eq!(cmor_var, "tas");
}

#[test]
fn test_tier_b_frequency_beats_version() {
    let mut catalog = MappingCatalog::open_in_memory().unwrap();
    catalog
        .insert_mappings(&[
            entry("tas_mon", "fld_s03i236", "mon", "ESM1.5", "Amon"),
            entry("tas_day", "fld_s03i236", "day", "CM2", "day"),
        ])
        .unwrap();

    // No (ESM1.5, day) candidate; the day entry wins over the version match.
    let (cmor_var, _) = resolve(&catalog, "fld_s03i236", "ESM1.5", "day").unwrap();
    assert_eq!(cmor_var, "tas_day");
}

#[test]
fn test_tier_c_version_match() {
    let mut catalog = MappingCatalog::open_in_memory().unwrap();
    catalog
        .insert_mappings(&[
            entry("tas_esm", "fld_s03i236", "mon", "ESM1.5", "Amon"),
            entry("tas_cm2", "fld_s03i236", "day", "CM2", "day"),
        ])
        .unwrap();

    // Queried frequency matches neither; version does.
    let (cmor_var, _) = resolve(&catalog, "fld_s03i236", "CM2", "3hr").unwrap();
    assert_eq!(cmor_var, "tas_cm2");
}

#[test]
fn test_tier_d_falls_back_to_catalog_order() {
    let mut catalog = MappingCatalog::open_in_memory().unwrap();
    catalog
        .insert_mappings(&[
            entry("zz_var", "fld_s03i236", "mon", "ESM1.5", "Amon"),
            entry("aa_var", "fld_s03i236", "day", "CM2", "day"),
        ])
        .unwrap();

    // Nothing matches the queried context; first candidate in lexicographic
    // catalog order wins.
    let (cmor_var, cmor_table) = resolve(&catalog, "fld_s03i236", "AUS2200", "10min").unwrap();
    assert_eq!(cmor_var, "aa_var");
    assert_eq!(cmor_table, "day");
}

#[test]
fn test_derived_entries_never_resolve() {
    let mut catalog = MappingCatalog::open_in_memory().unwrap();
    let mut derived = entry("sfcWind", "u v", "mon", "ESM1.5", "Amon");
    derived.calculation = "sqrt(u^2+v^2)".to_string();
    catalog.insert_mappings(&[derived]).unwrap();

    let (cmor_var, _) = resolve(&catalog, "u v", "ESM1.5", "mon").unwrap();
    assert_eq!(cmor_var, "");
}
