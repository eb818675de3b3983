pub mod config;
pub mod deduplication;
pub mod error;
pub mod instruments;
pub mod reference;
pub mod tracker;
pub mod types;

pub use deduplication::DedupStore;
pub use error::StoreError;
pub use instruments::{canonical_key, normalize_interval, normalize_symbol};
pub use reference::{parse, ReferenceParser};
pub use tracker::{Admission, ReferenceTracker};
pub use types::{ChartReference, DedupRecord, ParsedReference, RecordRepair, StoreStats};
