//! Vector store abstraction for Syllabus.
//!
//! Provides a trait-based interface over a course catalog (one entry per
//! course, used to resolve fuzzy course names) and the chunked course
//! content searched by the tools.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

#[cfg(test)]
pub(crate) use memory::tests::sample_store;

use crate::config::Settings;
use crate::embedding::Embedder;
use crate::error::{Result, SyllabusError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// A lesson within a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub number: u32,
    pub title: String,
    pub link: Option<String>,
}

/// Course metadata stored in the catalog. The title is the unique key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub title: String,
    pub instructor: Option<String>,
    pub link: Option<String>,
    pub lessons: Vec<Lesson>,
}

impl Course {
    /// Link of the lesson with the given number, if both exist.
    pub fn lesson_link(&self, lesson_number: u32) -> Option<String> {
        self.lessons
            .iter()
            .find(|l| l.number == lesson_number)
            .and_then(|l| l.link.clone())
    }
}

/// A searchable piece of course text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseChunk {
    pub content: String,
    pub course_title: String,
    pub lesson_number: Option<u32>,
    pub chunk_index: usize,
}

/// Metadata returned alongside each search match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub course_title: String,
    pub lesson_number: Option<u32>,
    pub chunk_index: usize,
}

/// Search output. Failures are reported in `error` rather than raised, so
/// callers can hand the message to the model as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub documents: Vec<String>,
    pub metadata: Vec<ChunkMetadata>,
    pub distances: Vec<f32>,
    pub error: Option<String>,
}

impl SearchResults {
    /// An empty result carrying an error message.
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Iterate over (document, metadata) pairs.
    pub fn matches(&self) -> impl Iterator<Item = (&String, &ChunkMetadata)> {
        self.documents.iter().zip(self.metadata.iter())
    }
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Semantic search over course content, optionally restricted to a
    /// course (fuzzy-matched) and a lesson (exact).
    async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> SearchResults;

    /// Resolve a possibly partial course name to a catalog title.
    async fn resolve_course_name(&self, course_name: &str) -> Result<Option<String>>;

    /// Link for a lesson, looked up by exact course title.
    async fn get_lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>>;

    /// Course metadata for a possibly partial course name.
    async fn get_course_metadata(&self, course_name: &str) -> Result<Option<Course>>;

    /// Add or replace a course in the catalog.
    async fn add_course(&self, course: &Course) -> Result<()>;

    /// Add content chunks. Returns the number stored.
    async fn add_chunks(&self, chunks: &[CourseChunk]) -> Result<usize>;

    /// Titles of all courses in the catalog.
    async fn existing_course_titles(&self) -> Result<Vec<String>>;

    /// Number of courses in the catalog.
    async fn course_count(&self) -> Result<usize>;

    /// Remove all courses and content.
    async fn clear(&self) -> Result<()>;
}

/// Build the vector store selected by `vector_store.provider`.
pub fn create_store(settings: &Settings, embedder: Arc<dyn Embedder>) -> Result<Arc<dyn VectorStore>> {
    let max_results = settings.vector_store.max_results;
    match settings.vector_store.provider.to_lowercase().as_str() {
        "sqlite" => {
            let path = settings.sqlite_path();
            info!("Using SQLite vector store at {}", path.display());
            Ok(Arc::new(SqliteVectorStore::new(&path, embedder, max_results)?))
        }
        "memory" => {
            info!("Using in-memory vector store");
            Ok(Arc::new(MemoryVectorStore::new(embedder, max_results)))
        }
        other => Err(SyllabusError::Config(format!(
            "Unknown vector store provider: {}",
            other
        ))),
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Pick the catalog title closest to `query_embedding`. Titles with no
/// similarity at all are never chosen.
fn nearest_title<'a>(
    query_embedding: &[f32],
    catalog: impl Iterator<Item = (&'a str, &'a [f32])>,
) -> Option<String> {
    catalog
        .map(|(title, embedding)| (title, cosine_similarity(query_embedding, embedding)))
        .filter(|(_, score)| *score > 0.0)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(title, _)| title.to_string())
}

/// Rank candidate chunks by similarity and keep the best `limit`.
fn rank_chunks<'a>(
    query_embedding: &[f32],
    candidates: impl Iterator<Item = (&'a CourseChunk, &'a [f32])>,
    limit: usize,
) -> SearchResults {
    let mut scored: Vec<(&CourseChunk, f32)> = candidates
        .map(|(chunk, embedding)| (chunk, cosine_similarity(query_embedding, embedding)))
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);

    let mut results = SearchResults::default();
    for (chunk, score) in scored {
        results.documents.push(chunk.content.clone());
        results.metadata.push(ChunkMetadata {
            course_title: chunk.course_title.clone(),
            lesson_number: chunk.lesson_number,
            chunk_index: chunk.chunk_index,
        });
        results.distances.push(1.0 - score);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_nearest_title_ignores_unrelated() {
        let catalog = [("Python Basics", vec![1.0, 0.0]), ("AI Fundamentals", vec![0.0, 1.0])];
        let iter = || catalog.iter().map(|(t, e)| (*t, e.as_slice()));

        assert_eq!(nearest_title(&[0.2, 0.9], iter()), Some("AI Fundamentals".to_string()));
        assert_eq!(nearest_title(&[-1.0, 0.0], iter()), None);
    }

    #[test]
    fn test_rank_chunks_orders_and_truncates() {
        let chunk = |i: usize| CourseChunk {
            content: format!("chunk {}", i),
            course_title: "C".to_string(),
            lesson_number: Some(i as u32),
            chunk_index: i,
        };
        let chunks = [(chunk(0), vec![0.0, 1.0]), (chunk(1), vec![1.0, 0.0]), (chunk(2), vec![1.0, 1.0])];

        let results = rank_chunks(&[1.0, 0.0], chunks.iter().map(|(c, e)| (c, e.as_slice())), 2);

        assert_eq!(results.documents, vec!["chunk 1", "chunk 2"]);
        assert_eq!(results.metadata[0].lesson_number, Some(1));
        assert!(results.distances[0] < results.distances[1]);
        assert!(results.error.is_none());
    }

    #[test]
    fn test_create_store_by_provider() {
        let embedder: Arc<dyn Embedder> = Arc::new(crate::embedding::testing::KeywordEmbedder);
        let mut settings = Settings::default();

        settings.vector_store.provider = "memory".to_string();
        assert!(create_store(&settings, embedder.clone()).is_ok());

        let dir = tempfile::tempdir().unwrap();
        settings.vector_store.provider = "SQLite".to_string();
        settings.vector_store.sqlite_path = dir.path().join("db/courses.db").display().to_string();
        assert!(create_store(&settings, embedder.clone()).is_ok());
        assert!(dir.path().join("db/courses.db").exists());

        settings.vector_store.provider = "chroma".to_string();
        assert!(matches!(
            create_store(&settings, embedder),
            Err(SyllabusError::Config(_))
        ));
    }

    #[test]
    fn test_course_lesson_link() {
        let course = Course {
            title: "C".to_string(),
            instructor: None,
            link: None,
            lessons: vec![
                Lesson { number: 0, title: "Intro".to_string(), link: Some("https://x/0".to_string()) },
                Lesson { number: 1, title: "Next".to_string(), link: None },
            ],
        };
        assert_eq!(course.lesson_link(0).as_deref(), Some("https://x/0"));
        assert_eq!(course.lesson_link(1), None);
        assert_eq!(course.lesson_link(7), None);
    }
}
