//! Tool calling for course questions.
//!
//! Provides the course tools the model can call, a registry that runs them
//! by name and records their sources, and the generator that drives the
//! bounded tool-calling loop.

mod registry;
mod runner;
mod tools;

pub use registry::{Source, Tool, ToolExecutor, ToolOutput, ToolRegistry};
pub use runner::{AiGenerator, DEFAULT_MAX_TOOL_ROUNDS};
pub use tools::{format_outline, CourseOutlineTool, CourseSearchTool, OUTLINE_TOOL_NAME, SEARCH_TOOL_NAME};

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted model and executor doubles.

    use super::ToolExecutor;
    use crate::error::{Result, SyllabusError};
    use crate::llm::{ChatModel, ContentBlock, MessageRequest, MessageResponse, StopReason, ToolInput};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// A response asking for the given `(id, name, input)` tool uses.
    pub fn tool_use(calls: &[(&str, &str, Value)]) -> MessageResponse {
        MessageResponse {
            stop_reason: Some(StopReason::ToolUse),
            content: calls
                .iter()
                .map(|(id, name, input)| ContentBlock::ToolUse {
                    id: id.to_string(),
                    name: name.to_string(),
                    input: input.as_object().cloned().unwrap_or_default(),
                })
                .collect(),
        }
    }

    /// Model that replays a fixed script and records every request.
    pub struct ScriptedModel {
        script: Mutex<VecDeque<MessageResponse>>,
        requests: Mutex<Vec<MessageRequest>>,
    }

    impl ScriptedModel {
        pub fn new(script: Vec<MessageResponse>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn requests(&self) -> Vec<MessageRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn remaining(&self) -> usize {
            self.script.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn create_message(&self, request: &MessageRequest) -> Result<MessageResponse> {
            self.requests.lock().unwrap().push(request.clone());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| SyllabusError::Model("script exhausted".to_string()))
        }
    }

    /// Executor returning canned results or failures per tool name.
    #[derive(Default)]
    pub struct ScriptedExecutor {
        results: HashMap<String, std::result::Result<String, String>>,
        calls: Mutex<Vec<(String, ToolInput)>>,
    }

    impl ScriptedExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_result(mut self, name: &str, content: &str) -> Self {
            self.results.insert(name.to_string(), Ok(content.to_string()));
            self
        }

        pub fn with_failure(mut self, name: &str, message: &str) -> Self {
            self.results.insert(name.to_string(), Err(message.to_string()));
            self
        }

        pub fn calls(&self) -> Vec<(String, ToolInput)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ToolExecutor for ScriptedExecutor {
        async fn execute_tool(&self, name: &str, input: &ToolInput) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((name.to_string(), input.clone()));
            match self.results.get(name) {
                Some(Ok(content)) => Ok(content.clone()),
                Some(Err(message)) => Err(SyllabusError::Tool(message.clone())),
                None => Ok(format!("Tool '{}' not found", name)),
            }
        }
    }
}
