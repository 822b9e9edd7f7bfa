//! End-to-end worklist generation against an in-memory catalog.

use mopdb::catalog::{CatalogEntry, MappingCatalog};
use mopdb::feed::DiscoveredVariable;
use mopdb::resolve::{derived_candidates, match_records};
use mopdb::worklist::{
    build_worklist, write_template, WorklistRow, BANNER_DERIVED, BANNER_FREQUENCY,
    BANNER_MULTIPLE, BANNER_UNMATCHED, BANNER_VERSION, TEMPLATE_HEADER,
};

fn record(name: &str, frequency: &str, file_pattern: &str) -> DiscoveredVariable {
    DiscoveredVariable {
        name: name.to_string(),
        units: String::new(),
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

fn seeded_catalog() -> MappingCatalog {
    let mut catalog = MappingCatalog::open_in_memory().unwrap();
    catalog
        .insert_mappings(&[
            CatalogEntry {
                cmor_var: "tas".to_string(),
                input_vars: "tas_raw".to_string(),
                units: "K".to_string(),
                dimensions: "lon lat time".to_string(),
                frequency: "mon".to_string(),
                realm: "atmos".to_string(),
                cell_methods: "area: mean time: mean".to_string(),
                cmor_table: "Amon".to_string(),
                model: "ESM1.5".to_string(),
                ..Default::default()
            },
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
            },
        ])
        .unwrap();
    catalog
}

#[test]
fn test_full_pass_produces_annotated_worklist() {
    let catalog = seeded_catalog();
    let records = vec![
        record("tas_raw", "mon", "atm_pe"),
        record("u", "mon", "atm_pd"),
        record("v", "mon", "atm_pd"),
        record("mystery_var", "mon", "atm_pe"),
    ];

    let pass = match_records(&catalog, records.clone(), "ESM1.5").unwrap();
    let derived = derived_candidates(&catalog, &records, &pass.seen_keys).unwrap();
    let worklist = build_worklist(pass, derived, "ESM1.5");

    let first_fields: Vec<String> = worklist
        .rows
        .iter()
        .map(|row| match row {
            WorklistRow::Banner(text) => text.to_string(),
            WorklistRow::Entry(fields) => fields[0].clone(),
        })
        .collect();

    assert_eq!(
        first_fields,
        vec![
            "tas".to_string(),
            BANNER_VERSION.to_string(),
            BANNER_FREQUENCY.to_string(),
            BANNER_UNMATCHED.to_string(),
            "u".to_string(),
            "v".to_string(),
            "mystery_var".to_string(),
            BANNER_DERIVED.to_string(),
            "sfcWind".to_string(),
            BANNER_MULTIPLE.to_string(),
        ]
    );
}

#[test]
fn test_matched_row_fields() {
    let catalog = seeded_catalog();
    let records = vec![record("tas_raw", "mon", "atm_pe")];

    let pass = match_records(&catalog, records, "ESM1.5").unwrap();
    let worklist = build_worklist(pass, Vec::new(), "ESM1.5");

    let WorklistRow::Entry(fields) = &worklist.rows[0] else {
        panic!("first row should be the matched entry");
    };
    assert_eq!(fields[0], "tas"); // cmor_var resolved from the catalog
    assert_eq!(fields[1], "tas_raw"); // raw input name
    assert_eq!(fields[2], ""); // no calculation for direct mappings
    assert_eq!(fields[3], "K"); // units backfilled
    assert_eq!(fields[9], "Amon"); // cmor_table resolved
    assert_eq!(fields[10], "ESM1.5"); // caller-supplied version
    assert_eq!(fields[14], "atm_pe");
}

#[test]
fn test_derived_row_fields() {
    let catalog = seeded_catalog();
    let records = vec![
        record("u", "mon", "atm_pe"),
        record("v", "mon", "atm_pd"),
    ];

    let pass = match_records(&catalog, records.clone(), "ESM1.5").unwrap();
    let derived = derived_candidates(&catalog, &records, &pass.seen_keys).unwrap();
    let worklist = build_worklist(pass, derived, "ESM1.5");

    let derived_fields: Vec<_> = worklist
        .rows
        .iter()
        .filter_map(|row| match row {
            WorklistRow::Entry(fields) if fields[0] == "sfcWind" => Some(fields),
            _ => None,
        })
        .collect();
    assert_eq!(derived_fields.len(), 1);
    let fields = derived_fields[0];
    assert_eq!(fields[1], "u v");
    assert_eq!(fields[2], "sqrt(u^2+v^2)");
    assert_eq!(fields[4], "lon lat time"); // dimensions from the observed inputs
    assert_eq!(fields[5], "mon"); // frequency from the observed inputs
    assert_eq!(fields[14], "atm_pd atm_pe");
}

#[test]
fn test_duplicate_records_collapse_in_worklist() {
    let catalog = seeded_catalog();
    // Same variable observed under two file patterns at the same frequency.
    let records = vec![
        record("tas_raw", "mon", "atm_pe"),
        record("tas_raw", "mon", "atm_pe1"),
    ];

    let pass = match_records(&catalog, records, "ESM1.5").unwrap();
    let worklist = build_worklist(pass, Vec::new(), "ESM1.5");

    let tas_rows = worklist
        .rows
        .iter()
        .filter(|row| matches!(row, WorklistRow::Entry(fields) if fields[0] == "tas"))
        .count();
    assert_eq!(tas_rows, 1);
}

#[test]
fn test_written_template_layout() {
    let catalog = seeded_catalog();
    let records = vec![record("tas_raw", "mon", "atm_pe")];

    let pass = match_records(&catalog, records, "ESM1.5").unwrap();
    let worklist = build_worklist(pass, Vec::new(), "ESM1.5");

    let path = std::env::temp_dir().join("map_template_test.csv");
    write_template(&worklist, &path).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();

    assert_eq!(lines[0], TEMPLATE_HEADER.join(";"));
    assert!(lines[1].starts_with("tas;tas_raw;;K;"));
    // Banners keep their position even with empty buckets.
    assert!(lines[2].starts_with(BANNER_VERSION));
    assert!(lines.last().unwrap().starts_with(BANNER_MULTIPLE));
    // Every non-banner line carries the full column set.
    assert_eq!(lines[1].split(';').count(), TEMPLATE_HEADER.len());
}
