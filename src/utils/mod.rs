pub mod logging;

pub use logging::{print_final_stats, truncate_text, RunStats};
