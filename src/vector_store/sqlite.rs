//! SQLite-based vector store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust for simplicity.
//! Course collections are small enough that a full scan per query is fine.

use super::{nearest_title, rank_chunks, Course, CourseChunk, SearchResults, VectorStore};
use crate::embedding::Embedder;
use crate::error::{Result, SyllabusError};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS courses (
        title TEXT PRIMARY KEY,
        instructor TEXT,
        link TEXT,
        lessons_json TEXT NOT NULL,
        embedding BLOB NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS chunks (
        id TEXT PRIMARY KEY,
        course_title TEXT NOT NULL,
        lesson_number INTEGER,
        chunk_index INTEGER NOT NULL,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_chunks_course ON chunks(course_title, lesson_number);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
    embedder: Arc<dyn Embedder>,
    max_results: usize,
}

impl SqliteVectorStore {
    /// Open (or create) a SQLite vector store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path, embedder: Arc<dyn Embedder>, max_results: usize) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
            embedder,
            max_results,
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory(embedder: Arc<dyn Embedder>, max_results: usize) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
            embedder,
            max_results,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SyllabusError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn catalog_embeddings(&self) -> Result<Vec<(String, Vec<f32>)>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT title, embedding FROM courses")?;
        let rows = stmt.query_map([], |row| {
            let bytes: Vec<u8> = row.get(1)?;
            Ok((row.get::<_, String>(0)?, Self::bytes_to_embedding(&bytes)))
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn load_course(&self, title: &str) -> Result<Option<Course>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT title, instructor, link, lessons_json FROM courses WHERE title = ?1",
                params![title],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((title, instructor, link, lessons_json)) => Ok(Some(Course {
                title,
                instructor,
                link,
                lessons: serde_json::from_str(&lessons_json)?,
            })),
            None => Ok(None),
        }
    }

    fn load_candidates(
        &self,
        course_title: Option<&str>,
        lesson_number: Option<u32>,
    ) -> Result<Vec<(CourseChunk, Vec<f32>)>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT content, course_title, lesson_number, chunk_index, embedding
            FROM chunks
            WHERE (?1 IS NULL OR course_title = ?1)
              AND (?2 IS NULL OR lesson_number = ?2)
            "#,
        )?;

        let rows = stmt.query_map(params![course_title, lesson_number], |row| {
            let bytes: Vec<u8> = row.get(4)?;
            Ok((
                CourseChunk {
                    content: row.get(0)?,
                    course_title: row.get(1)?,
                    lesson_number: row.get(2)?,
                    chunk_index: row.get::<_, i64>(3)? as usize,
                },
                Self::bytes_to_embedding(&bytes),
            ))
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
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
        let candidates = self.load_candidates(course_title.as_deref(), lesson_number)?;

        let results = rank_chunks(
            &query_embedding,
            candidates.iter().map(|(c, e)| (c, e.as_slice())),
            self.max_results,
        );
        debug!("Found {} matching chunks", results.documents.len());
        Ok(results)
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self))]
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
        let catalog = self.catalog_embeddings()?;
        Ok(nearest_title(
            &embedding,
            catalog.iter().map(|(t, e)| (t.as_str(), e.as_slice())),
        ))
    }

    async fn get_lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>> {
        Ok(self
            .load_course(course_title)?
            .and_then(|c| c.lesson_link(lesson_number)))
    }

    async fn get_course_metadata(&self, course_name: &str) -> Result<Option<Course>> {
        match self.resolve_course_name(course_name).await? {
            Some(title) => self.load_course(&title),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, course), fields(title = %course.title))]
    async fn add_course(&self, course: &Course) -> Result<()> {
        let embedding = self.embedder.embed(&course.title).await?;
        let lessons_json = serde_json::to_string(&course.lessons)?;

        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO courses
            (title, instructor, link, lessons_json, embedding, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                course.title,
                course.instructor,
                course.link,
                lessons_json,
                Self::embedding_to_bytes(&embedding),
                Utc::now().to_rfc3339(),
            ],
        )?;
        debug!("Stored course metadata");
        Ok(())
    }

    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    async fn add_chunks(&self, chunks: &[CourseChunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
            tx.execute(
                r#"
                INSERT INTO chunks
                (id, course_title, lesson_number, chunk_index, content, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    uuid::Uuid::new_v4().to_string(),
                    chunk.course_title,
                    chunk.lesson_number,
                    chunk.chunk_index as i64,
                    chunk.content,
                    Self::embedding_to_bytes(embedding),
                ],
            )?;
        }
        tx.commit()?;

        info!("Stored {} chunks", chunks.len());
        Ok(chunks.len())
    }

    async fn existing_course_titles(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT title FROM courses ORDER BY title")?;
        let titles = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(titles.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn course_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM courses", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch("DELETE FROM chunks; DELETE FROM courses;")?;
        info!("Cleared all courses and content");
        Ok(())
    }
}
