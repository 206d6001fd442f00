//! Answer generation with a bounded tool-calling loop.

use super::registry::ToolExecutor;
use crate::config::{AnthropicSettings, Prompts};
use crate::error::Result;
use crate::llm::{ChatModel, ContentBlock, Message, MessageRequest, MessageResponse, ToolDefinition};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Default number of sequential tool rounds per query.
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 2;

/// Generates answers from the model, running tools when it asks for them.
pub struct AiGenerator {
    model: Arc<dyn ChatModel>,
    model_id: String,
    temperature: f32,
    max_tokens: u32,
    max_tool_rounds: usize,
    system_prompt: String,
}

impl AiGenerator {
    /// Create a generator for the given model id with default parameters.
    pub fn new(model: Arc<dyn ChatModel>, model_id: &str) -> Self {
        Self {
            model,
            model_id: model_id.to_string(),
            temperature: 0.0,
            max_tokens: 800,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            system_prompt: Prompts::default().system,
        }
    }

    /// Create a generator configured from settings.
    pub fn from_settings(model: Arc<dyn ChatModel>, settings: &AnthropicSettings) -> Self {
        Self::new(model, &settings.model)
            .with_temperature(settings.temperature)
            .with_max_tokens(settings.max_tokens)
            .with_max_tool_rounds(settings.max_tool_rounds)
    }

    /// Set a custom system prompt.
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the maximum number of sequential tool rounds.
    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    /// System prompt, with the conversation history appended when present.
    pub fn system_content(&self, history: Option<&str>) -> String {
        match history {
            Some(h) if !h.is_empty() => {
                format!("{}\n\nPrevious conversation:\n{}", self.system_prompt, h)
            }
            _ => self.system_prompt.clone(),
        }
    }

    fn request(&self, system: &str, messages: Vec<Message>) -> MessageRequest {
        MessageRequest {
            model: self.model_id.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: system.to_string(),
            messages,
            tools: None,
            tool_choice: None,
        }
    }

    /// Answer a query, optionally offering tools.
    ///
    /// The tool loop only runs when tools are offered, the model asks for
    /// one, and an executor is available. Otherwise the first text block
    /// of the initial response is returned.
    #[instrument(skip_all, fields(query_len = query.len()))]
    pub async fn generate_response(
        &self,
        query: &str,
        history: Option<&str>,
        tools: &[ToolDefinition],
        executor: Option<&dyn ToolExecutor>,
    ) -> Result<String> {
        let system = self.system_content(history);
        let messages = vec![Message::user(query)];

        let mut request = self.request(&system, messages.clone());
        if !tools.is_empty() {
            request = request.with_tools(tools);
        }

        let response = self.model.create_message(&request).await?;

        match executor {
            Some(executor) if response.wants_tool() && !tools.is_empty() => {
                self.run_tool_loop(response, messages, &system, tools, executor)
                    .await
            }
            _ => Ok(response.text()),
        }
    }

    /// Drive tool rounds until the model answers, a tool fails, or the round
    /// budget runs out.
    ///
    /// Each round appends the assistant turn, executes every requested tool
    /// in order and sends all results back in one user message. Tools are
    /// offered again only while rounds remain and the round had no failure.
    /// After a failed round the model gets exactly one more call.
    pub async fn run_tool_loop(
        &self,
        initial: MessageResponse,
        mut messages: Vec<Message>,
        system: &str,
        tools: &[ToolDefinition],
        executor: &dyn ToolExecutor,
    ) -> Result<String> {
        let mut response = initial;
        let mut rounds = 0;

        while response.wants_tool() && rounds < self.max_tool_rounds {
            rounds += 1;
            messages.push(response.to_assistant_message());

            let (results, errored) = execute_tools(&response, executor).await;
            messages.push(Message::user_blocks(results));

            let offer_tools = !errored && rounds < self.max_tool_rounds;
            let mut request = self.request(system, messages.clone());
            if offer_tools {
                request = request.with_tools(tools);
            }

            debug!("Tool round {} complete, offering tools: {}", rounds, offer_tools);
            response = self.model.create_message(&request).await?;

            if errored {
                warn!("Tool round {} had a failing tool, stopping", rounds);
                break;
            }
        }

        if response.wants_tool() {
            info!("Tool round limit reached after {} rounds", rounds);
        }

        Ok(response.text())
    }
}

/// Execute every tool use in the response, in order. Returns the result
/// blocks and whether any tool failed.
async fn execute_tools(
    response: &MessageResponse,
    executor: &dyn ToolExecutor,
) -> (Vec<ContentBlock>, bool) {
    let mut results = Vec::new();
    let mut errored = false;

    for block in &response.content {
        let ContentBlock::ToolUse { id, name, input } = block else {
            continue;
        };

        match executor.execute_tool(name, input).await {
            Ok(content) => results.push(ContentBlock::tool_result(id.as_str(), content)),
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                errored = true;
                results.push(ContentBlock::tool_error(id.as_str(), format!("Error: {}", e)));
            }
        }
    }

    (results, errored)
}
