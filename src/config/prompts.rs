//! Prompt templates for Syllabus.
//!
//! Prompts can be customized by placing a `prompts.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Prompt templates used when answering questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    /// System prompt sent with every model call.
    pub system: String,
    /// Template wrapping the user's question, with `{{query}}`.
    pub query: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
            query: "Answer this question about course materials: {{query}}".to_string(),
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an AI assistant specialized in course materials and educational content with access to tools for course information.

Available Tools:
1. **search_course_content**: Search within course content for specific topics or information
2. **get_course_outline**: Get course structure including title, link, and complete lesson list

Tool Usage Guidelines:
- Use **get_course_outline** for questions about:
  - Course structure or outline
  - What lessons are in a course
  - Course links or lesson lists
  - Overview of course content
- Use **search_course_content** for questions about:
  - Specific course content or topics
  - Detailed information within lessons
- **Maximum 2 tool call rounds per query** - Use a second round only if first results are insufficient
- Each search should serve a distinct purpose (e.g., different courses or refining a query)
- If search yields no results, state this clearly without offering alternatives

Response Protocol:
- **General knowledge questions**: Answer using existing knowledge without searching
- **Course-specific questions**: Use appropriate tool first, then answer
- **No meta-commentary**:
  - Provide direct answers only, no reasoning process, search explanations, or question-type analysis
  - Do not mention "based on the search results" or "based on the outline"

For outline queries, always include:
- Course title
- Course link
- Complete lesson list with lesson numbers and titles

All responses must be:
1. **Brief, Concise and focused** - Get to the point quickly
2. **Educational** - Maintain instructional value
3. **Clear** - Use accessible language
4. **Example-supported** - Include relevant examples when they aid understanding
Provide only the direct answer to what was asked."#;

impl Prompts {
    /// Load prompts, overriding defaults from `<custom_dir>/prompts.toml` if it exists.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let Some(dir) = custom_dir else {
            return Ok(Prompts::default());
        };

        let path = PathBuf::from(shellexpand::tilde(dir).to_string()).join("prompts.toml");
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Prompts::default())
        }
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render the query template for a user question.
    pub fn render_query(&self, query: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), query.to_string());
        Self::render(&self.query, &vars)
    }
}
