pub mod fetcher;
pub mod history;
pub mod notifier;
pub mod processor;

pub use fetcher::{deduplicate, filter_by_keywords, PaperFetcher};
pub use history::HistoryStore;
pub use notifier::{EmailNotifier, LarkNotifier, Notifier};
pub use processor::{strip_reasoning, PaperProcessor};
