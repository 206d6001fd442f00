//! In-memory vector store implementation.
//!
//! Useful for testing and small course collections.

use super::{nearest_title, rank_chunks, Course, CourseChunk, SearchResults, VectorStore};
use crate::embedding::Embedder;
use crate::error::{Result, SyllabusError};
use async_trait::async_trait;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

struct CatalogEntry {
    course: Course,
    embedding: Vec<f32>,
}

struct StoredChunk {
    chunk: CourseChunk,
    embedding: Vec<f32>,
}

/// In-memory vector store.
pub struct MemoryVectorStore {
    embedder: Arc<dyn Embedder>,
    max_results: usize,
    catalog: RwLock<Vec<CatalogEntry>>,
    chunks: RwLock<Vec<StoredChunk>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new(embedder: Arc<dyn Embedder>, max_results: usize) -> Self {
        Self {
            embedder,
            max_results,
            catalog: RwLock::new(Vec::new()),
            chunks: RwLock::new(Vec::new()),
        }
    }

    fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
        lock.read()
            .map_err(|e| SyllabusError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
        lock.write()
            .map_err(|e| SyllabusError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    async fn try_search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> Result<SearchResults> {
        let course_title = match course_name {
            Some(name) => match self.resolve_course_name(name).await? {
                Some(title) => Some(title),
                None => {
                    return Ok(SearchResults::from_error(format!(
                        "No course found matching '{}'",
                        name
                    )))
                }
            },
            None => None,
        };

        let query_embedding = self.embedder.embed(query).await?;
        let chunks = Self::read(&self.chunks)?;

        let candidates = chunks
            .iter()
            .filter(|s| course_title.as_ref().map_or(true, |t| &s.chunk.course_title == t))
            .filter(|s| lesson_number.map_or(true, |n| s.chunk.lesson_number == Some(n)))
            .map(|s| (&s.chunk, s.embedding.as_slice()));

        Ok(rank_chunks(&query_embedding, candidates, self.max_results))
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> SearchResults {
        self.try_search(query, course_name, lesson_number)
            .await
            .unwrap_or_else(|e| SearchResults::from_error(format!("Search error: {}", e)))
    }

    async fn resolve_course_name(&self, course_name: &str) -> Result<Option<String>> {
        let embedding = self.embedder.embed(course_name).await?;
        let catalog = Self::read(&self.catalog)?;
        Ok(nearest_title(
            &embedding,
            catalog
                .iter()
                .map(|e| (e.course.title.as_str(), e.embedding.as_slice())),
        ))
    }

    async fn get_lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>> {
        let catalog = Self::read(&self.catalog)?;
        Ok(catalog
            .iter()
            .find(|e| e.course.title == course_title)
            .and_then(|e| e.course.lesson_link(lesson_number)))
    }

    async fn get_course_metadata(&self, course_name: &str) -> Result<Option<Course>> {
        let Some(title) = self.resolve_course_name(course_name).await? else {
            return Ok(None);
        };
        let catalog = Self::read(&self.catalog)?;
        Ok(catalog
            .iter()
            .find(|e| e.course.title == title)
            .map(|e| e.course.clone()))
    }

    async fn add_course(&self, course: &Course) -> Result<()> {
        let embedding = self.embedder.embed(&course.title).await?;
        let mut catalog = Self::write(&self.catalog)?;
        catalog.retain(|e| e.course.title != course.title);
        catalog.push(CatalogEntry {
            course: course.clone(),
            embedding,
        });
        debug!("Catalog now holds {} courses", catalog.len());
        Ok(())
    }

    async fn add_chunks(&self, chunks: &[CourseChunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let mut store = Self::write(&self.chunks)?;
        store.extend(
            chunks
                .iter()
                .cloned()
                .zip(embeddings)
                .map(|(chunk, embedding)| StoredChunk { chunk, embedding }),
        );
        Ok(chunks.len())
    }

    async fn existing_course_titles(&self) -> Result<Vec<String>> {
        let catalog = Self::read(&self.catalog)?;
        Ok(catalog.iter().map(|e| e.course.title.clone()).collect())
    }

    async fn course_count(&self) -> Result<usize> {
        Ok(Self::read(&self.catalog)?.len())
    }

    async fn clear(&self) -> Result<()> {
        Self::write(&self.catalog)?.clear();
        Self::write(&self.chunks)?.clear();
        Ok(())
    }
}
