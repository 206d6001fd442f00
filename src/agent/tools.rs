//! Course tools offered to the model: content search and course outline.

use super::registry::{Source, Tool, ToolOutput};
use crate::error::{Result, SyllabusError};
use crate::llm::{ToolDefinition, ToolInput};
use crate::vector_store::{Course, SearchResults, VectorStore};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

pub const SEARCH_TOOL_NAME: &str = "search_course_content";
pub const OUTLINE_TOOL_NAME: &str = "get_course_outline";

fn parse_args<T: DeserializeOwned>(tool: &str, input: &ToolInput) -> Result<T> {
    serde_json::from_value(Value::Object(input.clone()))
        .map_err(|e| SyllabusError::Tool(format!("Invalid arguments for {}: {}", tool, e)))
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    course_name: Option<String>,
    #[serde(default)]
    lesson_number: Option<u32>,
}

/// Searches course content with optional course and lesson filters.
pub struct CourseSearchTool {
    store: Arc<dyn VectorStore>,
}

impl CourseSearchTool {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    async fn format_results(&self, results: &SearchResults) -> Result<ToolOutput> {
        let mut blocks = Vec::with_capacity(results.documents.len());
        let mut sources = Vec::with_capacity(results.documents.len());

        for (document, meta) in results.matches() {
            let label = match meta.lesson_number {
                Some(n) => format!("{} - Lesson {}", meta.course_title, n),
                None => meta.course_title.clone(),
            };
            let link = match meta.lesson_number {
                Some(n) => self.store.get_lesson_link(&meta.course_title, n).await?,
                None => None,
            };

            blocks.push(format!("[{}]\n{}", label, document));
            sources.push(Source { text: label, link });
        }

        Ok(ToolOutput {
            content: blocks.join("\n\n"),
            sources,
        })
    }
}

fn no_results_message(course_name: Option<&str>, lesson_number: Option<u32>) -> String {
    let mut message = "No relevant content found".to_string();
    if let Some(course) = course_name {
        message.push_str(&format!(" in course '{}'", course));
    }
    if let Some(lesson) = lesson_number {
        message.push_str(&format!(" in lesson {}", lesson));
    }
    message.push('.');
    message
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: SEARCH_TOOL_NAME.to_string(),
            description: "Search course materials with smart course name matching and lesson filtering"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for in the course content"
                    },
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    },
                    "lesson_number": {
                        "type": "integer",
                        "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    #[instrument(skip(self, input))]
    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let args: SearchArgs = parse_args(SEARCH_TOOL_NAME, input)?;
        debug!("Searching for {:?}", args);

        let results = self
            .store
            .search(&args.query, args.course_name.as_deref(), args.lesson_number)
            .await;

        if let Some(error) = results.error {
            return Ok(ToolOutput::text(error));
        }
        if results.is_empty() {
            return Ok(ToolOutput::text(no_results_message(
                args.course_name.as_deref(),
                args.lesson_number,
            )));
        }

        self.format_results(&results).await
    }
}

#[derive(Debug, Deserialize)]
struct OutlineArgs {
    course_name: String,
}

/// Returns a course's title, link, instructor and lesson list.
pub struct CourseOutlineTool {
    store: Arc<dyn VectorStore>,
}

impl CourseOutlineTool {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }
}

/// Render a course outline as plain text.
pub fn format_outline(course: &Course) -> String {
    let mut lines = vec![format!("Course: {}", course.title)];
    lines.push(format!(
        "Link: {}",
        course.link.as_deref().unwrap_or("not available")
    ));
    if let Some(instructor) = &course.instructor {
        lines.push(format!("Instructor: {}", instructor));
    }

    lines.push(String::new());
    lines.push(format!("Lessons ({}):", course.lessons.len()));
    for lesson in &course.lessons {
        lines.push(format!("  Lesson {}: {}", lesson.number, lesson.title));
    }

    lines.join("\n")
}

#[async_trait]
impl Tool for CourseOutlineTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: OUTLINE_TOOL_NAME.to_string(),
            description: "Get the complete outline of a course: title, link, instructor and every lesson"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    }
                },
                "required": ["course_name"]
            }),
        }
    }

    #[instrument(skip(self, input))]
    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let args: OutlineArgs = parse_args(OUTLINE_TOOL_NAME, input)?;

        match self.store.get_course_metadata(&args.course_name).await? {
            Some(course) => Ok(ToolOutput::text(format_outline(&course))),
            None => Ok(ToolOutput::text(format!(
                "No course found matching '{}'",
                args.course_name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::sample_store;

    fn input(value: Value) -> ToolInput {
        value.as_object().cloned().unwrap_or_default()
    }

    async fn store() -> Arc<dyn VectorStore> {
        Arc::new(sample_store().await)
    }

    #[tokio::test]
    async fn test_search_formats_headers_and_sources() {
        let tool = CourseSearchTool::new(store().await);

        let output = tool
            .execute(&input(json!({"query": "machine learning", "course_name": "fundamentals"})))
            .await
            .unwrap();

        assert!(output
            .content
            .starts_with("[AI Fundamentals - Lesson 1]\nMachine learning is a subset"));
        assert_eq!(output.content.matches("[AI Fundamentals").count(), 2);
        assert_eq!(
            output.sources[0],
            Source {
                text: "AI Fundamentals - Lesson 1".to_string(),
                link: Some("https://example.com/lesson/1".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_search_source_without_lesson_link() {
        let tool = CourseSearchTool::new(store().await);

        let output = tool
            .execute(&input(json!({"query": "variables", "course_name": "Python"})))
            .await
            .unwrap();

        assert_eq!(output.sources.len(), 1);
        assert_eq!(output.sources[0].text, "Python Basics - Lesson 1");
        assert_eq!(output.sources[0].link, None);
    }

    #[tokio::test]
    async fn test_search_empty_results_message() {
        let tool = CourseSearchTool::new(store().await);

        let output = tool
            .execute(&input(json!({
                "query": "anything",
                "course_name": "Python",
                "lesson_number": 9
            })))
            .await
            .unwrap();

        assert_eq!(
            output.content,
            "No relevant content found in course 'Python' in lesson 9."
        );
        assert!(output.sources.is_empty());
    }

    #[tokio::test]
    async fn test_search_unknown_course_passes_error_through() {
        let tool = CourseSearchTool::new(store().await);

        let output = tool
            .execute(&input(json!({"query": "anything", "course_name": "Quantum Cooking"})))
            .await
            .unwrap();

        assert_eq!(output.content, "No course found matching 'Quantum Cooking'");
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let tool = CourseSearchTool::new(store().await);

        let err = tool
            .execute(&input(json!({"course_name": "Python"})))
            .await
            .unwrap_err();

        assert!(err.to_string().contains(SEARCH_TOOL_NAME));
    }

    #[test]
    fn test_no_results_message_variants() {
        assert_eq!(no_results_message(None, None), "No relevant content found.");
        assert_eq!(
            no_results_message(None, Some(2)),
            "No relevant content found in lesson 2."
        );
    }

    #[tokio::test]
    async fn test_outline_lists_lessons() {
        let tool = CourseOutlineTool::new(store().await);

        let output = tool
            .execute(&input(json!({"course_name": "fundamentals"})))
            .await
            .unwrap();

        assert_eq!(
            output.content,
            "Course: AI Fundamentals\n\
             Link: https://example.com/course\n\
             Instructor: Ada Lovelace\n\
             \n\
             Lessons (2):\n  \
             Lesson 0: Introduction\n  \
             Lesson 1: Machine Learning Basics"
        );
        assert!(output.sources.is_empty());
    }

    #[tokio::test]
    async fn test_outline_without_course_link() {
        let tool = CourseOutlineTool::new(store().await);

        let output = tool
            .execute(&input(json!({"course_name": "Python"})))
            .await
            .unwrap();

        assert_eq!(
            output.content.lines().take(2).collect::<Vec<_>>(),
            vec!["Course: Python Basics", "Link: not available"]
        );
        assert!(output.content.ends_with("Lessons (1):\n  Lesson 1: Variables"));
    }

    #[tokio::test]
    async fn test_outline_unknown_course() {
        let tool = CourseOutlineTool::new(store().await);

        let output = tool
            .execute(&input(json!({"course_name": "Quantum Cooking"})))
            .await
            .unwrap();

        assert_eq!(output.content, "No course found matching 'Quantum Cooking'");
        assert!(output.sources.is_empty());
    }

    #[test]
    fn test_definitions_match_tool_names() {
        let definition = CourseOutlineTool::new(Arc::new(crate::vector_store::MemoryVectorStore::new(
            Arc::new(crate::embedding::testing::KeywordEmbedder),
            5,
        )))
        .definition();
        assert_eq!(definition.name, OUTLINE_TOOL_NAME);
        assert_eq!(definition.input_schema["required"], json!(["course_name"]));
    }
}
