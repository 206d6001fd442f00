//! Loads course documents into a vector store.

use super::{course_files, DocumentProcessor};
use crate::error::Result;
use crate::vector_store::{Course, VectorStore};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Result of ingesting a folder of course documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub courses: usize,
    pub chunks: usize,
}

/// Adds parsed courses and their chunks to a store.
pub struct CourseIndexer {
    store: Arc<dyn VectorStore>,
    processor: DocumentProcessor,
}

impl CourseIndexer {
    pub fn new(store: Arc<dyn VectorStore>, processor: DocumentProcessor) -> Self {
        Self { store, processor }
    }

    /// Ingest a single course document. Returns the course and chunk count.
    #[instrument(skip(self))]
    pub async fn add_course_document(&self, path: &Path) -> Result<(Course, usize)> {
        let document = self.processor.process_file(path).await?;
        self.store.add_course(&document.course).await?;
        let chunks = self.store.add_chunks(&document.chunks).await?;
        Ok((document.course, chunks))
    }

    /// Ingest every course document in a folder. Courses already in the
    /// catalog are skipped unless `clear` empties the store first. Files
    /// that cannot be read are logged and skipped.
    #[instrument(skip(self))]
    pub async fn add_course_folder(&self, path: &Path, clear: bool) -> Result<IngestSummary> {
        if clear {
            info!("Clearing existing course data");
            self.store.clear().await?;
        }

        let files = course_files(path).await?;
        let mut existing: HashSet<String> = self
            .store
            .existing_course_titles()
            .await?
            .into_iter()
            .collect();
        let mut summary = IngestSummary::default();

        for file in files {
            let document = match self.processor.process_file(&file).await {
                Ok(document) => document,
                Err(e) => {
                    warn!("Failed to read {}: {}", file.display(), e);
                    continue;
                }
            };

            if existing.contains(&document.course.title) {
                info!("Course already indexed: {}", document.course.title);
                continue;
            }

            self.store.add_course(&document.course).await?;
            let chunks = self.store.add_chunks(&document.chunks).await?;
            info!("Added course {} with {} chunks", document.course.title, chunks);

            summary.courses += 1;
            summary.chunks += chunks;
            existing.insert(document.course.title);
        }

        Ok(summary)
    }
}
