//! Tool trait, executor seam and the registry that dispatches by name.

use crate::error::{Result, SyllabusError};
use crate::llm::{ToolDefinition, ToolInput};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// A citation surfaced by a tool for display next to the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub text: String,
    pub link: Option<String>,
}

/// What a tool run produces: text for the model plus the sources it used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    pub content: String,
    pub sources: Vec<Source>,
}

impl ToolOutput {
    /// Output without sources.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sources: Vec::new(),
        }
    }
}

/// A tool the model can call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Definition offered to the model.
    fn definition(&self) -> ToolDefinition;

    /// Run the tool with model-supplied arguments.
    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput>;
}

/// Runs tools by name on behalf of the tool-calling loop.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute the named tool. An `Err` marks the call as failed.
    async fn execute_tool(&self, name: &str, input: &ToolInput) -> Result<String>;
}

struct RegisteredTool {
    name: String,
    tool: Box<dyn Tool>,
    last_sources: Mutex<Vec<Source>>,
}

/// Registry of tools keyed by definition name.
///
/// Each tool has a single "last sources" slot that is overwritten by its
/// next run and emptied by [`ToolRegistry::reset_sources`]. The slots are
/// shared by every caller, so only one query should use a registry at a time.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A tool with the same name is replaced in place.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.definition().name;
        let entry = RegisteredTool {
            name: name.clone(),
            tool: Box::new(tool),
            last_sources: Mutex::new(Vec::new()),
        };

        match self.tools.iter_mut().find(|t| t.name == name) {
            Some(existing) => {
                debug!("Replacing tool {}", name);
                *existing = entry;
            }
            None => {
                debug!("Registered tool {}", name);
                self.tools.push(entry);
            }
        }
    }

    /// Whether a tool with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    /// Definitions of all tools, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.tool.definition()).collect()
    }

    /// Sources recorded by each tool's most recent run, concatenated in
    /// registration order.
    pub fn last_sources(&self) -> Vec<Source> {
        self.tools
            .iter()
            .filter_map(|t| t.last_sources.lock().ok().map(|s| s.clone()))
            .flatten()
            .collect()
    }

    /// Clear every tool's recorded sources.
    pub fn reset_sources(&self) {
        for tool in &self.tools {
            if let Ok(mut sources) = tool.last_sources.lock() {
                sources.clear();
            }
        }
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute_tool(&self, name: &str, input: &ToolInput) -> Result<String> {
        let Some(entry) = self.tools.iter().find(|t| t.name == name) else {
            warn!("Model requested unknown tool {}", name);
            return Ok(format!("Tool '{}' not found", name));
        };

        info!("Executing tool {}", name);
        let output = entry.tool.execute(input).await?;

        let mut slot = entry
            .last_sources
            .lock()
            .map_err(|e| SyllabusError::Tool(format!("Failed to record sources: {}", e)))?;
        *slot = output.sources;

        Ok(output.content)
    }
}
