//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod courses;
mod index;
mod serve;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use courses::run_courses;
pub use index::run_index;
pub use serve::run_serve;

use crate::config::Settings;
use crate::embedding::OpenAIEmbedder;
use crate::error::Result;
use crate::vector_store::{create_store, VectorStore};
use std::sync::Arc;

/// Open the configured vector store without a model client.
fn open_store(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    let embedder = Arc::new(OpenAIEmbedder::with_config(
        &settings.embedding.model,
        settings.embedding.dimensions as usize,
    )?);
    create_store(settings, embedder)
}
