//! Message types and client abstraction for the hosted language model.
//!
//! Content is modeled as typed blocks (`text`, `tool_use`, `tool_result`)
//! tagged by a `type` discriminant, matching the Anthropic Messages API.

mod anthropic;

pub use anthropic::AnthropicClient;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Arguments supplied by the model to a tool.
pub type ToolInput = serde_json::Map<String, Value>;

/// Speaker of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single block of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text { text: String },

    /// A request from the model to run a tool.
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: ToolInput,
    },

    /// The outcome of a tool run, keyed by the originating call id.
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },

    /// Any block type this client does not handle (thinking, images, ...).
    #[serde(other)]
    Unsupported,
}

impl ContentBlock {
    /// Create a text block.
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    /// Create a successful tool result block.
    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// Create a failed tool result block.
    pub fn tool_error(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error: true,
        }
    }
}

/// Message content: either a plain string or a list of blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// A conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    /// A user message with plain text.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    /// A user message carrying content blocks (tool results).
    pub fn user_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Blocks(blocks),
        }
    }

    /// An assistant message carrying content blocks.
    pub fn assistant_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Blocks(blocks),
        }
    }
}

/// Definition of a tool offered to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// How the model may choose among offered tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolChoice {
    Auto,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
    #[serde(other)]
    Other,
}

/// A request to the messages endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub system: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

impl MessageRequest {
    /// Offer tools to the model with automatic tool choice.
    pub fn with_tools(mut self, tools: &[ToolDefinition]) -> Self {
        self.tools = Some(tools.to_vec());
        self.tool_choice = Some(ToolChoice::Auto);
        self
    }

    /// Whether this request offers any tools.
    pub fn offers_tools(&self) -> bool {
        self.tools.as_ref().is_some_and(|t| !t.is_empty())
    }
}

/// A response from the messages endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub stop_reason: Option<StopReason>,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

impl MessageResponse {
    /// Build a final text response.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            stop_reason: Some(StopReason::EndTurn),
            content: vec![ContentBlock::text(text)],
        }
    }

    /// Whether the model stopped to request a tool.
    pub fn wants_tool(&self) -> bool {
        self.stop_reason == Some(StopReason::ToolUse)
    }

    /// Text of the first text block, or an empty string if there is none.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .find_map(|block| match block {
                ContentBlock::Text { text } => Some(text.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// The content to echo back as an assistant message.
    pub fn to_assistant_message(&self) -> Message {
        Message::assistant_blocks(
            self.content
                .iter()
                .filter(|b| !matches!(b, ContentBlock::Unsupported))
                .cloned()
                .collect(),
        )
    }
}

/// A hosted model that answers message requests.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send one request and wait for the complete response.
    async fn create_message(&self, request: &MessageRequest) -> Result<MessageResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_result_omits_false_error_flag() {
        let message = Message::user_blocks(vec![ContentBlock::tool_result(
            "t1",
            "ML is a subset of AI",
        )]);

        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "role": "user",
                "content": [{
                    "type": "tool_result",
                    "tool_use_id": "t1",
                    "content": "ML is a subset of AI"
                }]
            })
        );
    }

    #[test]
    fn test_tool_error_sets_flag() {
        let block = ContentBlock::tool_error("t9", "Error: boom");
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["is_error"], json!(true));
    }

    #[test]
    fn test_response_with_tool_use_and_unknown_block() {
        let response: MessageResponse = serde_json::from_value(json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "stop_reason": "tool_use",
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "Let me search."},
                {"type": "tool_use", "id": "toolu_1", "name": "search_course_content",
                 "input": {"query": "neural networks", "lesson_number": 2}}
            ]
        }))
        .unwrap();

        assert!(response.wants_tool());
        assert_eq!(response.text(), "Let me search.");
        assert_eq!(response.content[0], ContentBlock::Unsupported);

        let echoed = response.to_assistant_message();
        match echoed.content {
            MessageContent::Blocks(blocks) => assert_eq!(blocks.len(), 2),
            MessageContent::Text(_) => panic!("Expected blocks"),
        }
    }

    #[test]
    fn test_unknown_stop_reason() {
        let response: MessageResponse =
            serde_json::from_value(json!({"stop_reason": "refusal", "content": []})).unwrap();
        assert_eq!(response.stop_reason, Some(StopReason::Other));
        assert!(!response.wants_tool());
        assert_eq!(response.text(), "");
    }

    #[test]
    fn test_request_serializes_tools_only_when_offered() {
        let request = MessageRequest {
            model: "m".to_string(),
            max_tokens: 800,
            temperature: 0.0,
            system: "sys".to_string(),
            messages: vec![Message::user("hi")],
            tools: None,
            tool_choice: None,
        };
        let plain = serde_json::to_value(&request).unwrap();
        assert!(plain.get("tools").is_none());
        assert!(plain.get("tool_choice").is_none());
        assert_eq!(plain["messages"][0], json!({"role": "user", "content": "hi"}));

        let tool = ToolDefinition {
            name: "t".to_string(),
            description: "d".to_string(),
            input_schema: json!({"type": "object"}),
        };
        let with_tools = serde_json::to_value(request.with_tools(&[tool])).unwrap();
        assert_eq!(with_tools["tool_choice"], json!({"type": "auto"}));
        assert_eq!(with_tools["tools"][0]["name"], json!("t"));
    }
}
