//! RAG (Retrieval-Augmented Generation) over course materials.
//!
//! Answers questions by letting the model search the course catalog
//! through tools, and returns the sources those tools surfaced.

mod system;

pub use system::{CourseAnalytics, QueryResponse, RagSystem};
