use async_trait::async_trait;
use mathexpert::agent::{AgentExecutor, MAX_ITERATIONS_MESSAGE};
use mathexpert::client_wrapper::{
    ClientWrapper, Message, NativeToolCall, Role, TokenUsage, ToolDefinition,
};
use mathexpert::prompts::AGENT_SYSTEM_PROMPT;
use mathexpert::tool_protocol::ToolRegistry;
use mathexpert::tool_protocols::math_protocol;
use mathexpert::tools::MathTools;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Replays a fixed list of replies and records every request it receives.
struct SequentialMockClient {
    replies: Vec<Message>,
    call_count: AtomicUsize,
    requests: Mutex<Vec<Vec<Message>>>,
    offered_tools: Mutex<Vec<Option<Vec<ToolDefinition>>>>,
    usage: Mutex<Option<TokenUsage>>,
}

impl SequentialMockClient {
    fn new(replies: Vec<Message>) -> Self {
        Self {
            replies,
            call_count: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            offered_tools: Mutex::new(Vec::new()),
            usage: Mutex::new(None),
        }
    }

    fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientWrapper for SequentialMockClient {
    fn model_name(&self) -> &str {
        "mock"
    }

    async fn send_message(
        &self,
        messages: &[Message],
        tools: Option<Vec<ToolDefinition>>,
    ) -> Result<Message, Box<dyn std::error::Error + Send + Sync>> {
        let index = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(messages.to_vec());
        self.offered_tools.lock().await.push(tools);
        *self.usage.lock().await = Some(TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
            total_tokens: 15,
        });

        // Past the end of the script, keep repeating the last reply.
        let reply = self
            .replies
            .get(index)
            .or_else(|| self.replies.last())
            .cloned()
            .ok_or("no scripted reply")?;
        Ok(reply)
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        Some(&self.usage)
    }
}

/// Always fails, like a model endpoint that is unreachable.
struct FailingClient;

#[async_trait]
impl ClientWrapper for FailingClient {
    fn model_name(&self) -> &str {
        "failing"
    }

    async fn send_message(
        &self,
        _messages: &[Message],
        _tools: Option<Vec<ToolDefinition>>,
    ) -> Result<Message, Box<dyn std::error::Error + Send + Sync>> {
        Err("service unavailable".into())
    }
}

fn tool_reply(calls: Vec<(&str, &str, serde_json::Value)>) -> Message {
    let mut message = Message::assistant("");
    message.tool_calls = calls
        .into_iter()
        .map(|(id, name, arguments)| NativeToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        })
        .collect();
    message
}

async fn executor_for(client: Arc<dyn ClientWrapper>) -> (Arc<MathTools>, AgentExecutor) {
    let math = Arc::new(MathTools::new());
    let mut registry = ToolRegistry::new(Arc::new(math_protocol(math.clone())));
    registry.discover_tools_from_primary().await.unwrap();
    (
        math,
        AgentExecutor::new(client, registry, AGENT_SYSTEM_PROMPT),
    )
}

#[tokio::test]
async fn test_plain_answer_needs_no_tools() {
    let client = Arc::new(SequentialMockClient::new(vec![Message::assistant(
        "I can only help with math.",
    )]));
    let (math, executor) = executor_for(client.clone()).await;

    let output = executor.invoke("Tell me a joke").await.unwrap();

    assert_eq!(output.output, "I can only help with math.");
    assert!(output.intermediate_steps.is_empty());
    assert!(!output.stopped);
    assert_eq!(client.calls(), 1);
    assert!(math.is_empty());

    let requests = client.requests.lock().await;
    assert_eq!(requests[0][0].role, Role::System);
    assert_eq!(&*requests[0][0].content, AGENT_SYSTEM_PROMPT);
    assert_eq!(requests[0][1].role, Role::User);
    assert_eq!(&*requests[0][1].content, "Tell me a joke");

    let offered = client.offered_tools.lock().await;
    assert_eq!(offered[0].as_ref().map(|t| t.len()), Some(3));
}

#[tokio::test]
async fn test_native_tool_calls_run_in_order() {
    let client = Arc::new(SequentialMockClient::new(vec![
        tool_reply(vec![
            ("t1", "sum_values", json!({"a": 5, "b": 3})),
            ("t2", "diff_values", json!({"a": 10, "b": 4})),
        ]),
        tool_reply(vec![("t3", "get_history", json!({}))]),
        Message::assistant("5 + 3 = 8 and 10 - 4 = 6."),
    ]));
    let (math, executor) = executor_for(client.clone()).await;

    let output = executor.invoke("Add 5 and 3, subtract 4 from 10").await.unwrap();

    assert_eq!(output.output, "5 + 3 = 8 and 10 - 4 = 6.");
    assert!(!output.stopped);
    let observations: Vec<(&str, &str)> = output
        .intermediate_steps
        .iter()
        .map(|s| (s.tool_name.as_str(), s.observation.as_str()))
        .collect();
    assert_eq!(
        observations,
        vec![
            ("sum_values", "8"),
            ("diff_values", "6"),
            ("get_history", "5 + 3 = 8\n10 - 4 = 6"),
        ]
    );
    assert_eq!(math.recent_history(), "5 + 3 = 8\n10 - 4 = 6");

    let tokens = output.tokens_used.unwrap();
    assert_eq!(tokens.total_tokens, 45);
    assert_eq!(tokens.input_tokens, 30);

    // The second request carries the assistant turn and both tool results.
    let requests = client.requests.lock().await;
    let second = &requests[1];
    assert_eq!(second.len(), 5);
    assert_eq!(second[2].tool_calls.len(), 2);
    assert_eq!(
        second[3].role,
        Role::Tool {
            call_id: "t1".to_string()
        }
    );
    assert_eq!(&*second[3].content, "8");
    assert_eq!(
        second[4].role,
        Role::Tool {
            call_id: "t2".to_string()
        }
    );
}

#[tokio::test]
async fn test_tool_call_json_in_text_is_not_executed() {
    let client = Arc::new(SequentialMockClient::new(vec![Message::assistant(
        "{\"tool_call\": {\"name\": \"sum_values\", \"parameters\": {\"a\": 2, \"b\": 2}}}",
    )]));
    let (math, executor) = executor_for(client.clone()).await;

    let output = executor.invoke("What is 2 + 2?").await.unwrap();

    assert!(!output.stopped);
    assert!(output.intermediate_steps.is_empty());
    assert_eq!(client.calls(), 1);
    assert!(math.is_empty());
}

#[tokio::test]
async fn test_unknown_tool_and_bad_parameters_become_observations() {
    let client = Arc::new(SequentialMockClient::new(vec![
        tool_reply(vec![
            ("t1", "multiply_values", json!({"a": 2, "b": 3})),
            ("t2", "sum_values", json!({"a": "two", "b": 3})),
        ]),
        Message::assistant("I cannot multiply with the tools I have."),
    ]));
    let (math, executor) = executor_for(client).await;

    let output = executor.invoke("What is 2 * 3?").await.unwrap();

    assert_eq!(output.output, "I cannot multiply with the tools I have.");
    assert_eq!(output.intermediate_steps.len(), 2);
    assert_eq!(
        output.intermediate_steps[0].observation,
        "Tool execution error: Tool not found: multiply_values"
    );
    assert!(output.intermediate_steps[1]
        .observation
        .starts_with("Tool 'sum_values' failed. Error: Invalid parameters:"));
    assert!(math.is_empty());
}

#[tokio::test]
async fn test_iteration_cap_stops_the_loop() {
    let client = Arc::new(SequentialMockClient::new(vec![tool_reply(vec![(
        "loop",
        "sum_values",
        json!({"a": 1, "b": 1}),
    )])]));
    let (math, executor) = executor_for(client.clone()).await;

    let output = executor.invoke("Keep adding").await.unwrap();

    assert!(output.stopped);
    assert_eq!(output.output, MAX_ITERATIONS_MESSAGE);
    assert_eq!(client.calls(), 10);
    assert_eq!(output.intermediate_steps.len(), 10);
    assert_eq!(math.len(), 10);
}

#[tokio::test]
async fn test_iteration_cap_never_reports_an_unfinished_turn() {
    let mut looping = tool_reply(vec![("t", "get_history", json!({}))]);
    looping.content = Arc::from("Checking the history again.");
    let client = Arc::new(SequentialMockClient::new(vec![looping]));
    let (_, executor) = executor_for(client.clone()).await;
    let executor = executor.with_max_iterations(3);

    let output = executor.invoke("History please").await.unwrap();

    assert!(output.stopped);
    assert_eq!(output.output, MAX_ITERATIONS_MESSAGE);
    assert_eq!(output.intermediate_steps.len(), 3);
    assert_eq!(client.calls(), 3);
}

#[tokio::test]
async fn test_zero_iterations_stops_without_calling_the_model() {
    let client = Arc::new(SequentialMockClient::new(vec![Message::assistant("unused")]));
    let (_, executor) = executor_for(client.clone()).await;

    let output = executor.with_max_iterations(0).invoke("1 + 1").await.unwrap();

    assert!(output.stopped);
    assert_eq!(output.output, MAX_ITERATIONS_MESSAGE);
    assert!(output.tokens_used.is_none());
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_model_failure_is_an_error() {
    let (_, executor) = executor_for(Arc::new(FailingClient)).await;
    let err = executor.invoke("What is 1 + 1?").await.unwrap_err();
    assert_eq!(err.to_string(), "model call failed: service unavailable");
}

#[tokio::test]
async fn test_output_serializes_steps() {
    let client = Arc::new(SequentialMockClient::new(vec![
        tool_reply(vec![("t1", "sum_values", json!({"a": 1, "b": 2}))]),
        Message::assistant("3"),
    ]));
    let (_, executor) = executor_for(client).await;

    let output = executor.invoke("1 + 2").await.unwrap();
    let value = serde_json::to_value(&output).unwrap();

    assert_eq!(value["output"], "3");
    assert_eq!(value["intermediate_steps"][0]["tool_name"], "sum_values");
    assert_eq!(value["intermediate_steps"][0]["observation"], "3");
    assert_eq!(value["stopped"], false);
}
