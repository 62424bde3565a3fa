//! Tool-calling agent executor.
//!
//! An [`AgentExecutor`] binds a model client, a [`ToolRegistry`] and a system
//! prompt. [`invoke`](AgentExecutor::invoke) runs the usual loop: ask the
//! model, run whatever tools it requests, feed the observations back and ask
//! again until the model answers in plain text or the iteration cap is hit.
//!
//! Tool requests are taken from the model's native tool calls. When the cap is
//! hit the run ends with [`MAX_ITERATIONS_MESSAGE`] instead of whatever half
//! finished turn the model was on.
//!
//! # Example
//!
//! ```rust,no_run
//! use mathexpert::agent::AgentExecutor;
//! use mathexpert::client_wrapper::ClientWrapper;
//! use mathexpert::prompts::AGENT_SYSTEM_PROMPT;
//! use mathexpert::tool_protocol::ToolRegistry;
//! use mathexpert::tool_protocols::math_protocol;
//! use mathexpert::tools::MathTools;
//! use std::sync::Arc;
//!
//! # async fn demo(client: Arc<dyn ClientWrapper>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let math = Arc::new(MathTools::new());
//! let mut registry = ToolRegistry::new(Arc::new(math_protocol(math)));
//! registry.discover_tools_from_primary().await?;
//!
//! let executor = AgentExecutor::new(client, registry, AGENT_SYSTEM_PROMPT);
//! let output = executor.invoke("What is 5 + 3?").await?;
//! println!("{}", output.output);
//! # Ok(())
//! # }
//! ```

use crate::client_wrapper::{ClientWrapper, Message, NativeToolCall, TokenUsage};
use crate::tool_protocol::ToolRegistry;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Model rounds allowed per [`AgentExecutor::invoke`] unless overridden.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Final output of every run that hits the iteration cap.
pub const MAX_ITERATIONS_MESSAGE: &str = "Agent stopped due to max iterations.";

/// One executed tool call and what it returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentStep {
    pub tool_name: String,
    pub parameters: JsonValue,
    pub observation: String,
}

/// Result of one [`AgentExecutor::invoke`].
#[derive(Debug, Clone, Serialize)]
pub struct AgentOutput {
    /// The model's final answer.
    pub output: String,
    /// Tool calls in execution order.
    pub intermediate_steps: Vec<AgentStep>,
    /// Usage summed over every model round, when the client reports it.
    pub tokens_used: Option<TokenUsage>,
    /// `true` when the loop ended because the iteration cap was reached.
    pub stopped: bool,
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("model call failed: {0}")]
    Model(String),
}

/// Runs the tool loop for one model client and one tool registry.
pub struct AgentExecutor {
    client: Arc<dyn ClientWrapper>,
    tools: ToolRegistry,
    system_prompt: String,
    max_iterations: usize,
}

impl AgentExecutor {
    pub fn new(
        client: Arc<dyn ClientWrapper>,
        tools: ToolRegistry,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            client,
            tools,
            system_prompt: system_prompt.into(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Cap the number of model rounds. `0` returns immediately with
    /// [`MAX_ITERATIONS_MESSAGE`].
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Answer `input`, calling tools as the model requests them.
    ///
    /// Tool failures are passed back to the model as observations; only a
    /// failing model call ends the run with an error.
    pub async fn invoke(&self, input: &str) -> Result<AgentOutput, AgentError> {
        let run_id = Uuid::new_v4();
        log::info!("[{}] Entering agent executor chain", run_id);

        let definitions = if self.tools.is_empty() {
            None
        } else {
            Some(self.tools.tool_definitions())
        };

        let mut messages = vec![
            Message::system(&self.system_prompt),
            Message::user(input),
        ];
        let mut steps = Vec::new();
        let mut tokens_used: Option<TokenUsage> = None;

        for iteration in 1..=self.max_iterations {
            log::debug!(
                "[{}] Model round {}/{} on {}",
                run_id,
                iteration,
                self.max_iterations,
                self.client.model_name()
            );

            let reply = self
                .client
                .send_message(&messages, definitions.clone())
                .await
                .map_err(|e| {
                    log::error!("[{}] Model call failed: {}", run_id, e);
                    AgentError::Model(e.to_string())
                })?;

            if let Some(usage) = self.client.get_last_usage().await {
                tokens_used
                    .get_or_insert_with(TokenUsage::default)
                    .accumulate(&usage);
            }

            if !reply.tool_calls.is_empty() {
                let calls: Vec<NativeToolCall> = reply.tool_calls.clone();
                messages.push(reply);
                for call in calls {
                    let observation = self.observe(run_id, &call.name, &call.arguments).await;
                    messages.push(Message::tool_result(call.id, &observation));
                    steps.push(AgentStep {
                        tool_name: call.name,
                        parameters: call.arguments,
                        observation,
                    });
                }
                continue;
            }

            log::info!("[{}] Finished chain", run_id);
            return Ok(AgentOutput {
                output: reply.content.to_string(),
                intermediate_steps: steps,
                tokens_used,
                stopped: false,
            });
        }

        log::warn!(
            "[{}] Stopped after {} iteration(s) without a final answer",
            run_id,
            self.max_iterations
        );
        Ok(AgentOutput {
            output: MAX_ITERATIONS_MESSAGE.to_string(),
            intermediate_steps: steps,
            tokens_used,
            stopped: true,
        })
    }

    /// Run one tool and render what the model gets to see.
    async fn observe(&self, run_id: Uuid, name: &str, parameters: &JsonValue) -> String {
        log::info!("[{}] Invoking: `{}` with `{}`", run_id, name, parameters);

        let observation = match self.tools.execute_tool(name, parameters.clone()).await {
            Ok(result) if result.success => render_output(&result.output),
            Ok(result) => format!(
                "Tool '{}' failed. Error: {}",
                name,
                result.error.unwrap_or_default()
            ),
            Err(e) => format!("Tool execution error: {}", e),
        };

        log::info!("[{}] {}", run_id, observation);
        observation
    }
}

fn render_output(output: &JsonValue) -> String {
    match output {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
