//! Syllabus - a course materials assistant
//!
//! Indexes course documents into a vector store and answers questions
//! about them with a language model that can call search and outline
//! tools.
//!
//! # Overview
//!
//! Syllabus allows you to:
//! - Index folders of course documents (title, instructor, lessons)
//! - Ask questions answered from the course content, with cited sources
//! - Keep short conversations going through sessions
//! - Serve all of it over an HTTP API
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `llm` - Message types and the Anthropic client
//! - `embedding` - Embedding generation
//! - `vector_store` - Course catalog and content search
//! - `ingest` - Course document parsing and chunking
//! - `agent` - Course tools, tool registry and the tool-calling loop
//! - `session` - Conversation history per session
//! - `rag` - The question answering system
//! - `server` - HTTP API
//!
//! # Example
//!
//! ```rust,no_run
//! use syllabus::config::Settings;
//! use syllabus::rag::RagSystem;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let rag = RagSystem::new(&settings)?;
//!
//!     rag.add_course_folder(std::path::Path::new("docs"), false).await?;
//!     let response = rag.query("What does lesson 2 cover?", None).await?;
//!     println!("{}", response.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod openai;
pub mod rag;
pub mod server;
pub mod session;
pub mod vector_store;

pub use error::{Result, SyllabusError};
