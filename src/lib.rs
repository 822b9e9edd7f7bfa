//! # mopdb
//!
//! Maps raw variable identifiers from climate-model output onto canonical
//! CMOR-style variable definitions held in a persisted catalog, and builds a
//! prioritized worklist of candidate definitions for operator review before
//! an output-generation run.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Varlist feed (discovered raw variables)           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [matcher + resolver]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Buckets: Matched / VersionRelaxed / FreqRelaxed /      │
//! │   Unmatched             + seen (name, frequency) keys    │
//! └─────────────────────────────────────────────────────────┘
//!              │                           │
//!              ▼ [dedup]                   ▼ [derived detector]
//! ┌───────────────────────────┐ ┌───────────────────────────┐
//! │   Unique bucket rows       │ │   Derivable candidates    │
//! └───────────────────────────┘ └───────────────────────────┘
//!              │                           │
//!              └─────────────┬─────────────┘
//!                            ▼ [worklist emitter]
//! ┌─────────────────────────────────────────────────────────┐
//! │        map_{alias}.csv (bucketed, banner-annotated)      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The catalog lives in SQLite ([`catalog::MappingCatalog`]) and is read-only
//! during a resolution pass; the ingestion paths ([`catalog::ingest`]) load it
//! from operator-curated mapping files and CMOR tables.

pub mod catalog;
pub mod cmor;
pub mod config;
pub mod feed;
pub mod resolve;
pub mod worklist;

pub use catalog::{CatalogEntry, CatalogError, CmorVariable, MappingCatalog};
pub use feed::DiscoveredVariable;
pub use resolve::{DerivedCandidate, MatchPass};
pub use worklist::Worklist;
