//! The variable-mapping resolution engine.
//!
//! A resolution pass takes a batch of discovered raw variables and
//! reconciles it against the catalog:
//!
//! 1. [`matcher::match_records`] classifies each record into one of four
//!    mutually exclusive buckets (exact, version-relaxed, frequency-relaxed,
//!    unmatched), calling [`resolver::resolve`] for records arriving without
//!    a CMOR name
//! 2. [`dedupe::remove_duplicates`] collapses each bucket to one row per
//!    identity
//! 3. [`derive::derived_candidates`] finds catalog calculations whose raw
//!    inputs were all observed at the same frequency
//!
//! The pass is synchronous and single-threaded; the catalog is read-only
//! throughout and its index is built once up front.

pub mod dedupe;
pub mod derive;
pub mod matcher;
pub mod resolver;

pub use dedupe::{remove_duplicates, VariableIdentity};
pub use derive::{derived_candidates, DerivedCandidate};
pub use matcher::{match_records, MatchPass};
pub use resolver::resolve;
