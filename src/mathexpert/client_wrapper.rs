//! A ClientWrapper is a wrapper around a specific cloud LLM service.
//! It provides a common interface to interact with the LLMs.
//! It does not keep track of the conversation, for that the
//! [`AgentExecutor`](crate::AgentExecutor) owns the message list of each run
//! and uses a ClientWrapper to interact with the LLM.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::error::Error;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Represents the possible roles for a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Role {
    // set by the developer to steer the model's responses
    System,
    // a message sent by a human user (or app user)
    User,
    // lets the model know the content was generated as a response to a user message
    Assistant,
    // the observation returned for one native tool call
    Tool { call_id: String },
}

/// How many tokens were spent on prompt vs. completion.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
}

impl TokenUsage {
    /// Add another round's usage onto this running total.
    pub fn accumulate(&mut self, other: &TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// A tool the model may call, described the way providers expect it.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON-Schema object describing the tool input.
    pub parameters_schema: JsonValue,
}

/// A tool invocation requested natively by the model.
#[derive(Clone, Debug, PartialEq)]
pub struct NativeToolCall {
    /// Provider-assigned id, echoed back in the matching [`Role::Tool`] message.
    pub id: String,
    pub name: String,
    pub arguments: JsonValue,
}

/// Represents a generic message to be sent to an LLM.
#[derive(Clone, Debug)]
pub struct Message {
    /// The role associated with the message.
    pub role: Role,
    /// The actual content of the message.
    pub content: Arc<str>,
    /// Tool calls requested by the assistant in this message.
    pub tool_calls: Vec<NativeToolCall>,
}

impl Message {
    pub fn system(content: &str) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: &str) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: &str) -> Self {
        Self::text(Role::Assistant, content)
    }

    /// Observation for the native tool call identified by `call_id`.
    pub fn tool_result(call_id: impl Into<String>, content: &str) -> Self {
        Self::text(
            Role::Tool {
                call_id: call_id.into(),
            },
            content,
        )
    }

    fn text(role: Role, content: &str) -> Self {
        Message {
            role,
            content: Arc::from(content),
            tool_calls: Vec::new(),
        }
    }
}

/// Trait defining the interface to interact with various LLM services.
#[async_trait]
pub trait ClientWrapper: Send + Sync {
    /// Identifier of the model requests are sent to.
    fn model_name(&self) -> &str;

    /// Send a message to the LLM and get a response.
    /// - `messages`: The messages to send in the request.
    /// - `tools`: Definitions the model may call natively; `None` disables tool use.
    async fn send_message(
        &self,
        messages: &[Message],
        tools: Option<Vec<ToolDefinition>>,
    ) -> Result<Message, Box<dyn Error + Send + Sync>>;

    /// Hook to retrieve usage from the *last* send_message() call.
    /// Default impl reads the slot exposed by [`usage_slot`](Self::usage_slot).
    async fn get_last_usage(&self) -> Option<TokenUsage> {
        match self.usage_slot() {
            Some(slot) => slot.lock().await.clone(),
            None => None,
        }
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        // ClientWrapper implementations supporting TokenUsage tracking should return a Mutex<Option<TokenUsage>> by overriding this method.
        None
    }
}
