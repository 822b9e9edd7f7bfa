//! CMOR table JSON output.
//!
//! Renders a set of canonical variable definitions from the catalog into a
//! `CMOR_{name}.json` table file with the standard header block.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::catalog::{CmorVariable, MappingCatalog};

/// Errors from writing a CMOR table.
#[derive(Debug, thiserror::Error)]
pub enum CmorError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] crate::catalog::CatalogError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No cmorvar definitions found for table {0}")]
    Empty(String),
}

pub type CmorResult<T> = Result<T, CmorError>;

/// Approximate interval in days for each output frequency.
static APPROX_INTERVAL: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("dec", "3650.0"),
        ("yr", "365.0"),
        ("mon", "30.0"),
        ("day", "1.0"),
        ("6hr", "0.25"),
        ("3hr", "0.125"),
        ("1hr", "0.041667"),
        ("10min", "0.006944"),
        ("fx", "0.0"),
    ])
});

/// The fixed header block of a CMOR table file.
#[derive(Debug, Serialize)]
pub struct TableHeader {
    pub data_specs_version: String,
    pub cmor_version: String,
    pub table_id: String,
    pub realm: String,
    pub table_date: String,
    pub missing_value: String,
    pub int_missing_value: String,
    pub product: String,
    pub approx_interval: String,
    pub generic_levels: String,
    pub mip_era: String,
    #[serde(rename = "Conventions")]
    pub conventions: String,
}

/// Build the table header for the given table name, realm and frequency.
pub fn table_header(name: &str, realm: &str, frequency: &str) -> TableHeader {
    let interval = APPROX_INTERVAL.get(frequency).copied().unwrap_or_else(|| {
        warn!("No approximate interval known for frequency {frequency}");
        ""
    });
    TableHeader {
        data_specs_version: "01.00.33".to_string(),
        cmor_version: "3.5".to_string(),
        table_id: format!("Table {name}"),
        realm: realm.to_string(),
        table_date: Local::now().format("%d %B %Y").to_string(),
        missing_value: "1e20".to_string(),
        int_missing_value: "-999".to_string(),
        product: "model-output".to_string(),
        approx_interval: interval.to_string(),
        generic_levels: String::new(),
        mip_era: String::new(),
        conventions: "CF-1.7 ACDD1.3".to_string(),
    }
}

/// Collect cmorvar rows for the requested names and write `CMOR_{name}.json`
/// into `out_dir`. Names without a catalog definition are reported and
/// skipped; the table realm and frequency are majority votes over the
/// collected rows.
pub fn write_cmor_table<P: AsRef<Path>>(
    catalog: &MappingCatalog,
    names: &[String],
    table_name: &str,
    out_dir: P,
) -> CmorResult<PathBuf> {
    let mut vars = Vec::new();
    for name in names {
        match catalog.cmor_variable(name)? {
            Some(var) => vars.push(var),
            None => warn!("No cmorvar definition for {name}"),
        }
    }
    if vars.is_empty() {
        return Err(CmorError::Empty(table_name.to_string()));
    }

    let realm = majority(vars.iter().map(|v| v.modeling_realm.as_str()));
    let frequency = majority(vars.iter().map(|v| v.frequency.as_str()));
    let header = table_header(table_name, &realm, &frequency);

    let entries: BTreeMap<&str, serde_json::Value> = vars
        .iter()
        .map(|v| (v.name.as_str(), variable_entry(v)))
        .collect();
    let table = json!({
        "Header": header,
        "variable_entry": entries,
    });

    let path = out_dir.as_ref().join(format!("CMOR_{table_name}.json"));
    fs::write(&path, serde_json::to_string_pretty(&table)?)?;
    info!("CMOR table written to {}", path.display());
    Ok(path)
}

fn variable_entry(var: &CmorVariable) -> serde_json::Value {
    json!({
        "frequency": var.frequency,
        "modeling_realm": var.modeling_realm,
        "standard_name": var.standard_name,
        "units": var.units,
        "cell_methods": var.cell_methods,
        "cell_measures": var.cell_measures,
        "long_name": var.long_name,
        "comment": var.comment,
        "dimensions": var.dimensions,
        "out_name": var.out_name,
        "type": var.var_type,
        "positive": var.positive,
        "valid_min": var.valid_min,
        "valid_max": var.valid_max,
        "ok_min_mean_abs": var.ok_min_mean_abs,
        "ok_max_mean_abs": var.ok_max_mean_abs,
    })
}

/// Most common value in the iterator; logs when more than one is present.
fn majority<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    if counts.len() > 1 {
        info!(
            "More than one value found: {:?}",
            counts.keys().collect::<Vec<_>>()
        );
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(value, _)| value.to_string())
        .unwrap_or_default()
}
