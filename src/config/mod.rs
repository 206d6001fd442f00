//! Configuration module for Syllabus.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::Prompts;
pub use settings::{
    AnthropicSettings, ChunkingSettings, EmbeddingSettings, GeneralSettings, PromptSettings,
    ServerSettings, SessionSettings, Settings, VectorStoreSettings,
};
