//! Course document ingestion.
//!
//! A course document starts with header lines
//!
//! ```text
//! Course Title: Building Agents
//! Course Link: https://example.com/agents
//! Course Instructor: Jane Doe
//! ```
//!
//! followed by lesson sections, each opened by `Lesson {n}: {title}` and
//! optionally a `Lesson Link: {url}` line. Lesson text is chunked with a
//! [`SentenceChunker`] and loaded into a store by [`CourseIndexer`].

mod chunker;
mod indexer;

pub use chunker::SentenceChunker;
pub use indexer::{CourseIndexer, IngestSummary};

use crate::config::ChunkingSettings;
use crate::error::{Result, SyllabusError};
use crate::vector_store::{Course, CourseChunk, Lesson};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

/// File extensions read when ingesting a folder.
pub const COURSE_FILE_EXTENSIONS: &[&str] = &["txt", "md"];

/// A parsed course and its content chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseDocument {
    pub course: Course,
    pub chunks: Vec<CourseChunk>,
}

struct Section {
    lesson: Option<Lesson>,
    lines: Vec<String>,
}

/// Parses course documents into catalog entries and chunks.
pub struct DocumentProcessor {
    chunker: SentenceChunker,
    title: Regex,
    link: Regex,
    instructor: Regex,
    lesson: Regex,
    lesson_link: Regex,
}

fn pattern(source: &str) -> Result<Regex> {
    Regex::new(source).map_err(|e| SyllabusError::Ingest(format!("Invalid pattern {}: {}", source, e)))
}

impl DocumentProcessor {
    pub fn new(chunker: SentenceChunker) -> Result<Self> {
        Ok(Self {
            chunker,
            title: pattern(r"(?i)^course title:\s*(.+)$")?,
            link: pattern(r"(?i)^course link:\s*(.+)$")?,
            instructor: pattern(r"(?i)^course instructor:\s*(.+)$")?,
            lesson: pattern(r"(?i)^lesson\s+(\d+):\s*(.+)$")?,
            lesson_link: pattern(r"(?i)^lesson link:\s*(.+)$")?,
        })
    }

    pub fn from_settings(settings: &ChunkingSettings) -> Result<Self> {
        Self::new(SentenceChunker::from_settings(settings)?)
    }

    fn capture(re: &Regex, line: &str) -> Option<String> {
        re.captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
    }

    /// Parse a course document. `fallback_title` is used when the document
    /// has no `Course Title:` line.
    pub fn parse(&self, text: &str, fallback_title: &str) -> CourseDocument {
        let mut title = None;
        let mut link = None;
        let mut instructor = None;
        let mut sections = vec![Section {
            lesson: None,
            lines: Vec::new(),
        }];

        for raw in text.lines() {
            let line = raw.trim();

            if let Some(caps) = self.lesson.captures(line) {
                let number = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
                let lesson_title = caps.get(2).map(|m| m.as_str().trim().to_string());
                if let (Some(number), Some(lesson_title)) = (number, lesson_title) {
                    sections.push(Section {
                        lesson: Some(Lesson {
                            number,
                            title: lesson_title,
                            link: None,
                        }),
                        lines: Vec::new(),
                    });
                    continue;
                }
            }

            let Some(current) = sections.last_mut() else {
                continue;
            };

            match &mut current.lesson {
                None => {
                    if let Some(value) = Self::capture(&self.title, line) {
                        title.get_or_insert(value);
                    } else if let Some(value) = Self::capture(&self.link, line) {
                        link.get_or_insert(value);
                    } else if let Some(value) = Self::capture(&self.instructor, line) {
                        instructor.get_or_insert(value);
                    } else {
                        current.lines.push(line.to_string());
                    }
                }
                Some(lesson) => {
                    let at_start = current.lines.iter().all(|l| l.is_empty());
                    match Self::capture(&self.lesson_link, line) {
                        Some(value) if at_start && lesson.link.is_none() => lesson.link = Some(value),
                        _ => current.lines.push(line.to_string()),
                    }
                }
            }
        }

        let course_title = title.unwrap_or_else(|| fallback_title.to_string());
        let mut chunks = Vec::new();
        let mut lessons = Vec::new();

        for section in sections {
            let body = section.lines.join("\n");
            let pieces = self.chunker.chunk(&body);
            let lesson_number = section.lesson.as_ref().map(|l| l.number);

            for (i, piece) in pieces.into_iter().enumerate() {
                let content = match lesson_number {
                    Some(n) if i == 0 => format!("Lesson {} content: {}", n, piece),
                    _ => piece,
                };
                chunks.push(CourseChunk {
                    content,
                    course_title: course_title.clone(),
                    lesson_number,
                    chunk_index: chunks.len(),
                });
            }

            if let Some(lesson) = section.lesson {
                lessons.push(lesson);
            }
        }

        CourseDocument {
            course: Course {
                title: course_title,
                instructor,
                link,
                lessons,
            },
            chunks,
        }
    }

    /// Read and parse one course file. The file stem is the fallback title.
    #[instrument(skip(self))]
    pub async fn process_file(&self, path: &Path) -> Result<CourseDocument> {
        let text = tokio::fs::read_to_string(path).await?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let document = self.parse(&text, &stem);
        debug!(
            "Parsed {} with {} lessons and {} chunks",
            document.course.title,
            document.course.lessons.len(),
            document.chunks.len()
        );
        Ok(document)
    }
}

/// Whether a path looks like a course document.
pub fn is_course_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| COURSE_FILE_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

/// Course documents directly inside `dir`, sorted by path.
pub async fn course_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(SyllabusError::Ingest(format!(
            "Not a directory: {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && is_course_file(&path) {
            files.push(path);
        } else {
            debug!("Skipping {}", path.display());
        }
    }

    if files.is_empty() {
        warn!("No course documents found in {}", dir.display());
    }
    files.sort();
    Ok(files)
}
