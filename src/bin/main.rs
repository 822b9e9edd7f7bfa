//! mopdb CLI - map raw model output variables to CMOR definitions
//!
//! Usage:
//!   mopdb template <varlist.csv>... --alias <alias> --version <version>
//!   mopdb map <map.csv> [--alias <alias>] [--app4] [--loose]
//!   mopdb cmor <CMOR_table.json>
//!   mopdb table <map.csv> --name <table>
//!   mopdb lookup <varname> --version <version> --frequency <frequency>

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use mopdb::catalog::{ingest, MappingCatalog};
use mopdb::cmor;
use mopdb::config::Settings;
use mopdb::feed;
use mopdb::resolve::{self, remove_duplicates};
use mopdb::worklist;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mopdb")]
#[command(about = "Maps raw climate-model output variables to CMOR definitions")]
#[command(version)]
struct Cli {
    /// Path to the mapping database (overrides config)
    #[arg(long, global = true)]
    dbname: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a review worklist from varlist files
    Template {
        /// Varlist csv files produced by output-file introspection
        varlists: Vec<PathBuf>,

        /// Experiment alias used to name the output (map_{alias}.csv)
        #[arg(short, long)]
        alias: String,

        /// Model version to match against (falls back to config)
        #[arg(short, long)]
        version: Option<String>,
    },

    /// Ingest a mapping csv file into the catalog
    Map {
        /// Path to the mapping csv file
        fname: PathBuf,

        /// Provenance tag; defaults to the file's filename column
        #[arg(short, long, default_value = "")]
        alias: String,

        /// Input is in the legacy APP4 format
        #[arg(long)]
        app4: bool,

        /// Dedup ignoring frequency and realm before inserting
        #[arg(long)]
        loose: bool,
    },

    /// Ingest variable definitions from a CMOR table json file
    Cmor {
        /// Path to the CMOR table json file
        fname: PathBuf,
    },

    /// Write a CMOR table json for the variables of a mapping file
    Table {
        /// Path to the mapping csv file
        fname: PathBuf,

        /// CMOR table name (output is CMOR_{name}.json)
        #[arg(short, long)]
        name: String,
    },

    /// Resolve one raw variable name
    Lookup {
        varname: String,

        /// Model version to prefer
        #[arg(short, long)]
        version: Option<String>,

        /// Frequency to prefer
        #[arg(short, long)]
        frequency: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.debug { "mopdb=debug" } else { "mopdb=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let db_path = match cli
        .dbname
        .or_else(|| settings.database.path.clone())
        .map(Ok)
        .unwrap_or_else(MappingCatalog::default_path)
    {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error locating database: {e}");
            return ExitCode::FAILURE;
        }
    };

    let catalog = match MappingCatalog::open(&db_path) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Error opening database '{}': {e}", db_path.display());
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Template {
            varlists,
            alias,
            version,
        } => {
            let Some(version) = version.or(settings.template.version) else {
                eprintln!("No model version given (use --version or set template.version)");
                return ExitCode::FAILURE;
            };
            cmd_template(catalog, &varlists, &alias, &version)
        }
        Commands::Map {
            fname,
            alias,
            app4,
            loose,
        } => cmd_map(catalog, &fname, &alias, app4, loose),
        Commands::Cmor { fname } => cmd_cmor(catalog, &fname),
        Commands::Table { fname, name } => cmd_table(catalog, &fname, &name),
        Commands::Lookup {
            varname,
            version,
            frequency,
        } => cmd_lookup(
            catalog,
            &varname,
            version.or(settings.template.version).as_deref().unwrap_or(""),
            &frequency,
        ),
    }
}

fn cmd_template(
    catalog: MappingCatalog,
    varlists: &[PathBuf],
    alias: &str,
    version: &str,
) -> ExitCode {
    if varlists.is_empty() {
        eprintln!("No varlist files given");
        return ExitCode::FAILURE;
    }

    let mut records = Vec::new();
    for path in varlists {
        match feed::read_varlist(path) {
            Ok(mut batch) => records.append(&mut batch),
            Err(e) => {
                eprintln!("Error reading varlist '{}': {e}", path.display());
                return ExitCode::FAILURE;
            }
        }
    }
    info!("Read {} discovered variables", records.len());

    let pass = match resolve::match_records(&catalog, records.clone(), version) {
        Ok(pass) => pass,
        Err(e) => {
            eprintln!("Matching failed: {e}");
            return ExitCode::FAILURE;
        }
    };
    let derived = match resolve::derived_candidates(&catalog, &records, &pass.seen_keys) {
        Ok(derived) => derived,
        Err(e) => {
            eprintln!("Derived-variable detection failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let worklist = worklist::build_worklist(pass, derived, version);
    let out_path = PathBuf::from(format!("map_{alias}.csv"));
    if let Err(e) = worklist::write_template(&worklist, &out_path) {
        eprintln!("Error writing '{}': {e}", out_path.display());
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn cmd_map(
    mut catalog: MappingCatalog,
    fname: &PathBuf,
    alias: &str,
    app4: bool,
    loose: bool,
) -> ExitCode {
    let rows = if app4 {
        ingest::read_map_app4(fname)
    } else {
        ingest::read_map(fname, alias)
    };
    let rows = match rows {
        Ok(rows) => remove_duplicates(rows, !loose),
        Err(e) => {
            eprintln!("Error reading mapping file '{}': {e}", fname.display());
            return ExitCode::FAILURE;
        }
    };

    match catalog.insert_mappings(&rows) {
        Ok(inserted) => {
            info!("Inserted {inserted} of {} mapping rows", rows.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error updating mapping table: {e}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_cmor(mut catalog: MappingCatalog, fname: &PathBuf) -> ExitCode {
    let rows = match ingest::read_cmor_table(fname) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("Error reading CMOR table '{}': {e}", fname.display());
            return ExitCode::FAILURE;
        }
    };

    match catalog.insert_cmor_vars(&rows) {
        Ok(inserted) => {
            info!("Inserted {inserted} of {} variable definitions", rows.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error updating cmorvar table: {e}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_table(catalog: MappingCatalog, fname: &PathBuf, name: &str) -> ExitCode {
    let rows = match ingest::read_map(fname, "") {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("Error reading mapping file '{}': {e}", fname.display());
            return ExitCode::FAILURE;
        }
    };

    let mut names: Vec<String> = Vec::new();
    for row in rows {
        if !names.contains(&row.cmor_var) {
            names.push(row.cmor_var);
        }
    }

    match cmor::write_cmor_table(&catalog, &names, name, ".") {
        Ok(path) => {
            info!("Wrote {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error writing CMOR table: {e}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_lookup(catalog: MappingCatalog, varname: &str, version: &str, frequency: &str) -> ExitCode {
    match resolve::resolve(&catalog, varname, version, frequency) {
        Ok((cmor_var, cmor_table)) => {
            if cmor_var.is_empty() {
                println!("{varname}: no mapping");
            } else {
                println!("{varname}: {cmor_var} ({cmor_table})");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Lookup failed: {e}");
            ExitCode::FAILURE
        }
    }
}
