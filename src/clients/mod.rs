pub mod arxiv_client;
pub mod llm_client;
pub mod repository;

pub use arxiv_client::ArxivClient;
pub use llm_client::{ChatModel, LlmClient};
pub use repository::{PaperRepository, SourceRef};
