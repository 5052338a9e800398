pub mod paper;

pub use paper::{normalize_paper_id, Paper, ScanOutcome};
