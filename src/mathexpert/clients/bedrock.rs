//! Claude on Amazon Bedrock through the Converse API.
//!
//! ```rust,no_run
//! use mathexpert::aws::load_sdk_config;
//! use mathexpert::client_wrapper::{ClientWrapper, Message};
//! use mathexpert::clients::bedrock::BedrockClient;
//! use mathexpert::config::AwsConfig;
//! use mathexpert::model_params::{Model, ModelSettings};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let sdk_config = load_sdk_config(&AwsConfig::from_env()).await?;
//! let client = BedrockClient::new(&sdk_config, ModelSettings::new(Model::ClaudeSonnet4));
//! let reply = client
//!     .send_message(&[Message::user("What is 2 + 2?")], None)
//!     .await?;
//! println!("{}", reply.content);
//! # Ok(())
//! # }
//! ```

use crate::client_wrapper::{
    ClientWrapper, Message, NativeToolCall, Role, TokenUsage, ToolDefinition,
};
use crate::clients::common::{document_to_json, json_to_document, record_usage};
use crate::model_params::ModelSettings;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, ConverseOutput, InferenceConfiguration,
    Message as BedrockMessage, SystemContentBlock, Tool, ToolConfiguration, ToolInputSchema,
    ToolResultBlock, ToolResultContentBlock, ToolSpecification, ToolUseBlock,
};
use aws_smithy_types::{Document, Number};
use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;
use tokio::sync::Mutex;

/// [`ClientWrapper`] backed by `aws_sdk_bedrockruntime`.
pub struct BedrockClient {
    client: aws_sdk_bedrockruntime::Client,
    settings: ModelSettings,
    token_usage: Mutex<Option<TokenUsage>>,
}

impl BedrockClient {
    pub fn new(sdk_config: &SdkConfig, settings: ModelSettings) -> Self {
        Self::from_client(aws_sdk_bedrockruntime::Client::new(sdk_config), settings)
    }

    /// Wrap an already configured runtime client.
    pub fn from_client(client: aws_sdk_bedrockruntime::Client, settings: ModelSettings) -> Self {
        Self {
            client,
            settings,
            token_usage: Mutex::new(None),
        }
    }
}

fn inference_config(settings: &ModelSettings) -> InferenceConfiguration {
    InferenceConfiguration::builder()
        .max_tokens(i32::try_from(settings.max_tokens).unwrap_or(i32::MAX))
        .temperature(settings.temperature)
        .top_p(settings.top_p)
        .set_stop_sequences(Some(settings.stop_sequences.clone()))
        .build()
}

/// Anthropic-specific sampling fields Converse has no first-class slot for.
fn additional_fields(settings: &ModelSettings) -> Document {
    Document::Object(HashMap::from([(
        "top_k".to_string(),
        Document::Number(Number::PosInt(u64::from(settings.top_k))),
    )]))
}

#[async_trait]
impl ClientWrapper for BedrockClient {
    fn model_name(&self) -> &str {
        &self.settings.model_id
    }

    async fn send_message(
        &self,
        messages: &[Message],
        tools: Option<Vec<ToolDefinition>>,
    ) -> Result<Message, Box<dyn Error + Send + Sync>> {
        let (system, conversation) = to_converse_messages(messages)?;
        let tool_config = match tools {
            Some(definitions) if !definitions.is_empty() => Some(to_tool_config(&definitions)?),
            _ => None,
        };

        log::debug!(
            "Sending {} message(s) to {}",
            conversation.len(),
            self.settings.model_id
        );

        let response = self
            .client
            .converse()
            .model_id(&self.settings.model_id)
            .set_system(if system.is_empty() { None } else { Some(system) })
            .set_messages(Some(conversation))
            .inference_config(inference_config(&self.settings))
            .additional_model_request_fields(additional_fields(&self.settings))
            .set_tool_config(tool_config)
            .send()
            .await
            .map_err(|e| {
                log::error!("Bedrock converse call failed: {}", DisplayErrorContext(&e));
                DisplayErrorContext(&e).to_string()
            })?;

        let usage = response.usage().map(|u| TokenUsage {
            input_tokens: u.input_tokens().max(0) as usize,
            output_tokens: u.output_tokens().max(0) as usize,
            total_tokens: u.total_tokens().max(0) as usize,
        });
        record_usage(&self.token_usage, usage).await;

        log::debug!("Stop reason: {:?}", response.stop_reason());

        let reply = match response.output() {
            Some(ConverseOutput::Message(message)) => from_converse_message(message),
            _ => return Err("Bedrock returned no message".into()),
        };
        if !reply.content.is_empty() {
            log::debug!("{}", reply.content);
        }
        Ok(reply)
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        Some(&self.token_usage)
    }
}

/// Split the conversation into Converse `system` blocks and alternating
/// user/assistant messages. Consecutive messages that map to the same Converse
/// role are merged, which is how tool results end up in one user turn.
fn to_converse_messages(
    messages: &[Message],
) -> Result<(Vec<SystemContentBlock>, Vec<BedrockMessage>), Box<dyn Error + Send + Sync>> {
    let mut system = Vec::new();
    let mut conversation = Vec::new();
    let mut pending: Option<(ConversationRole, Vec<ContentBlock>)> = None;

    for message in messages {
        let (role, blocks) = match &message.role {
            Role::System => {
                if !message.content.trim().is_empty() {
                    system.push(SystemContentBlock::Text(message.content.to_string()));
                }
                continue;
            }
            Role::User => (ConversationRole::User, text_block(&message.content)),
            Role::Assistant => {
                let mut blocks = text_block(&message.content);
                for call in &message.tool_calls {
                    blocks.push(ContentBlock::ToolUse(
                        ToolUseBlock::builder()
                            .tool_use_id(&call.id)
                            .name(&call.name)
                            .input(json_to_document(&call.arguments))
                            .build()?,
                    ));
                }
                (ConversationRole::Assistant, blocks)
            }
            Role::Tool { call_id } => (
                ConversationRole::User,
                vec![ContentBlock::ToolResult(
                    ToolResultBlock::builder()
                        .tool_use_id(call_id)
                        .content(ToolResultContentBlock::Text(message.content.to_string()))
                        .build()?,
                )],
            ),
        };

        if blocks.is_empty() {
            continue;
        }
        pending = match pending.take() {
            Some((current, mut acc)) if current == role => {
                acc.extend(blocks);
                Some((current, acc))
            }
            Some((current, acc)) => {
                conversation.push(build_message(current, acc)?);
                Some((role, blocks))
            }
            None => Some((role, blocks)),
        };
    }

    if let Some((role, blocks)) = pending {
        conversation.push(build_message(role, blocks)?);
    }

    Ok((system, conversation))
}

fn text_block(content: &str) -> Vec<ContentBlock> {
    if content.trim().is_empty() {
        Vec::new()
    } else {
        vec![ContentBlock::Text(content.to_string())]
    }
}

fn build_message(
    role: ConversationRole,
    blocks: Vec<ContentBlock>,
) -> Result<BedrockMessage, Box<dyn Error + Send + Sync>> {
    Ok(BedrockMessage::builder()
        .role(role)
        .set_content(Some(blocks))
        .build()?)
}

fn to_tool_config(
    definitions: &[ToolDefinition],
) -> Result<ToolConfiguration, Box<dyn Error + Send + Sync>> {
    let mut tools = Vec::with_capacity(definitions.len());
    for definition in definitions {
        let spec = ToolSpecification::builder()
            .name(&definition.name)
            .description(&definition.description)
            .input_schema(ToolInputSchema::Json(json_to_document(
                &definition.parameters_schema,
            )))
            .build()?;
        tools.push(Tool::ToolSpec(spec));
    }
    Ok(ToolConfiguration::builder().set_tools(Some(tools)).build()?)
}

fn from_converse_message(message: &BedrockMessage) -> Message {
    let mut text = String::new();
    let mut tool_calls = Vec::new();

    for block in message.content() {
        match block {
            ContentBlock::Text(chunk) => {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(chunk);
            }
            ContentBlock::ToolUse(tool_use) => tool_calls.push(NativeToolCall {
                id: tool_use.tool_use_id().to_string(),
                name: tool_use.name().to_string(),
                arguments: document_to_json(tool_use.input()),
            }),
            other => log::debug!("Ignoring unsupported content block: {:?}", other),
        }
    }

    Message {
        role: Role::Assistant,
        content: Arc::from(text.as_str()),
        tool_calls,
    }
}
