//! Extraction Strategy Module
//!
//! One strategy, three stages run in lockstep per record:
//! - records: record boundary detection over chunked input
//! - reclaim: release of each record once its row exists
//! - extract: the push and pull pipelines tying rules and sinks together

pub mod extract;
pub mod reclaim;
pub mod records;

pub use extract::{extract_file, extract_reader, ExtractSummary, RecordExtractor};
pub use reclaim::RetentionStats;
pub use records::{RecordScanner, ScanStatus};
