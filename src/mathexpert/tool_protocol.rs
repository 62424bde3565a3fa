//! Tool Protocol Abstraction Layer
//!
//! This module describes tools as plain data (name, description, parameter
//! schema) and routes invocations to whatever [`ToolProtocol`] implementation
//! actually runs them. The agent never calls a tool directly; it asks the
//! [`ToolRegistry`] by name.
//!
//! # Architecture
//!
//! ```text
//! Agent → ToolRegistry → ToolProtocol (trait) → [Custom | User-defined]
//! ```
//!
//! # Example
//!
//! ```rust
//! use mathexpert::tool_protocol::{ToolMetadata, ToolParameter, ToolParameterType};
//!
//! let sum = ToolMetadata::new("sum_values", "Sums two numbers")
//!     .with_parameter(ToolParameter::new("a", ToolParameterType::Integer).required())
//!     .with_parameter(ToolParameter::new("b", ToolParameterType::Integer).required());
//!
//! let schema = sum.input_schema();
//! assert_eq!(schema["properties"]["a"]["type"], "integer");
//! assert_eq!(schema["required"], serde_json::json!(["a", "b"]));
//! ```

use crate::client_wrapper::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use std::error::Error;
use std::sync::Arc;
use thiserror::Error;

/// Represents the result of a tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool execution was successful
    pub success: bool,
    /// The output data from the tool
    pub output: JsonValue,
    /// Optional error message if execution failed
    pub error: Option<String>,
}

impl ToolResult {
    /// Convenience constructor for successful tool execution.
    pub fn success(output: JsonValue) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    /// Convenience constructor for failed tool execution.
    pub fn failure(error: String) -> Self {
        Self {
            success: false,
            output: JsonValue::Null,
            error: Some(error),
        }
    }
}

/// Defines the type of a tool parameter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToolParameterType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ToolParameterType {
    /// JSON-Schema name of the type.
    pub fn as_str(self) -> &'static str {
        match self {
            ToolParameterType::String => "string",
            ToolParameterType::Number => "number",
            ToolParameterType::Integer => "integer",
            ToolParameterType::Boolean => "boolean",
            ToolParameterType::Array => "array",
            ToolParameterType::Object => "object",
        }
    }
}

/// Defines a parameter for a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ToolParameterType,
    pub description: Option<String>,
    pub required: bool,
}

impl ToolParameter {
    /// Define a new tool parameter with the provided name and type.
    pub fn new(name: impl Into<String>, param_type: ToolParameterType) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: None,
            required: false,
        }
    }

    /// Add a human readable description that will surface in generated schemas.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the argument as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Metadata about a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

impl ToolMetadata {
    /// Create metadata with the supplied identifier and description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Append a parameter definition to the tool metadata.
    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    /// Render the parameters as a JSON-Schema object, the shape model
    /// providers expect for tool inputs.
    pub fn input_schema(&self) -> JsonValue {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.parameters {
            let mut property = Map::new();
            property.insert("type".into(), json!(param.param_type.as_str()));
            if let Some(description) = &param.description {
                property.insert("description".into(), json!(description));
            }
            properties.insert(param.name.clone(), JsonValue::Object(property));
            if param.required {
                required.push(json!(param.name));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Provider-neutral definition handed to a [`ClientWrapper`](crate::ClientWrapper).
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters_schema: self.input_schema(),
        }
    }
}

/// Trait for implementing tool execution protocols
#[async_trait]
pub trait ToolProtocol: Send + Sync {
    /// Execute a tool with the given parameters
    async fn execute(
        &self,
        tool_name: &str,
        parameters: JsonValue,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>>;

    /// Get metadata about available tools
    async fn list_tools(&self) -> Result<Vec<ToolMetadata>, Box<dyn Error + Send + Sync>>;

    /// Get metadata about a specific tool
    async fn get_tool_metadata(
        &self,
        tool_name: &str,
    ) -> Result<ToolMetadata, Box<dyn Error + Send + Sync>>;

    /// Protocol identifier (e.g., "custom")
    fn protocol_name(&self) -> &str;
}

/// Error types for tool operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// Requested tool is not registered in the current registry/protocol.
    #[error("Tool not found: {0}")]
    NotFound(String),
    /// Tool execution completed with an application level failure.
    #[error("Tool execution failed: {0}")]
    ExecutionFailed(String),
    /// The provided JSON parameters failed validation or deserialization.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

/// A tool that can be used by agents
pub struct Tool {
    /// Metadata describing the tool interface.
    metadata: ToolMetadata,
    /// Underlying protocol implementation that actually executes the tool.
    protocol: Arc<dyn ToolProtocol>,
}

impl Tool {
    /// Create a new tool bound to the supplied protocol implementation.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        protocol: Arc<dyn ToolProtocol>,
    ) -> Self {
        Self::from_metadata(ToolMetadata::new(name, description), protocol)
    }

    /// Bind already-built metadata to a protocol.
    pub fn from_metadata(metadata: ToolMetadata, protocol: Arc<dyn ToolProtocol>) -> Self {
        Self { metadata, protocol }
    }

    /// Borrow the static metadata for the tool.
    pub fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }

    /// Execute the tool using the configured protocol.
    pub async fn execute(
        &self,
        parameters: JsonValue,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
        self.protocol.execute(&self.metadata.name, parameters).await
    }
}

/// Registry for managing tools available to agents
///
/// Tools keep the order in which they were added, so the definitions sent to
/// the model are stable from one request to the next.
pub struct ToolRegistry {
    tools: Vec<Tool>,
    protocol: Arc<dyn ToolProtocol>,
}

impl ToolRegistry {
    /// Build a registry powered by the provided protocol implementation.
    ///
    /// The registry starts empty; call
    /// [`discover_tools_from_primary`](Self::discover_tools_from_primary) or
    /// [`add_tool`](Self::add_tool) to populate it.
    pub fn new(protocol: Arc<dyn ToolProtocol>) -> Self {
        Self {
            tools: Vec::new(),
            protocol,
        }
    }

    /// Register every tool the primary protocol advertises.
    pub async fn discover_tools_from_primary(
        &mut self,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let advertised = self.protocol.list_tools().await?;
        for metadata in advertised {
            log::debug!(
                "Registering tool '{}' from protocol '{}'",
                metadata.name,
                self.protocol.protocol_name()
            );
            self.add_tool(Tool::from_metadata(metadata, self.protocol.clone()));
        }
        Ok(())
    }

    /// Insert or replace a tool definition.
    pub fn add_tool(&mut self, tool: Tool) {
        match self
            .tools
            .iter_mut()
            .find(|existing| existing.metadata.name == tool.metadata.name)
        {
            Some(existing) => *existing = tool,
            None => self.tools.push(tool),
        }
    }

    /// Remove a tool by name returning the owned entry if present.
    pub fn remove_tool(&mut self, name: &str) -> Option<Tool> {
        let index = self.tools.iter().position(|t| t.metadata.name == name)?;
        Some(self.tools.remove(index))
    }

    /// Borrow a tool by name.
    pub fn get_tool(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.metadata.name == name)
    }

    /// List metadata for registered tools in registration order.
    pub fn list_tools(&self) -> Vec<&ToolMetadata> {
        self.tools.iter().map(|t| &t.metadata).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions for every registered tool, ready to send to a model.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.metadata.to_definition()).collect()
    }

    /// Execute a named tool with serialized parameters.
    pub async fn execute_tool(
        &self,
        tool_name: &str,
        parameters: JsonValue,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
        let tool = self
            .get_tool(tool_name)
            .ok_or_else(|| ToolError::NotFound(tool_name.to_string()))?;

        tool.execute(parameters).await
    }

    /// Borrow the registry level protocol implementation.
    pub fn protocol(&self) -> &Arc<dyn ToolProtocol> {
        &self.protocol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockProtocol;

    #[async_trait]
    impl ToolProtocol for MockProtocol {
        async fn execute(
            &self,
            tool_name: &str,
            _parameters: JsonValue,
        ) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
            Ok(ToolResult::success(json!({
                "tool": tool_name,
                "result": "mock_result"
            })))
        }

        async fn list_tools(&self) -> Result<Vec<ToolMetadata>, Box<dyn Error + Send + Sync>> {
            Ok(vec![
                ToolMetadata::new("first", "First tool"),
                ToolMetadata::new("second", "Second tool"),
            ])
        }

        async fn get_tool_metadata(
            &self,
            _tool_name: &str,
        ) -> Result<ToolMetadata, Box<dyn Error + Send + Sync>> {
            Ok(ToolMetadata::new("mock_tool", "A mock tool"))
        }

        fn protocol_name(&self) -> &str {
            "mock"
        }
    }

    #[test]
    fn test_tool_parameter_builder() {
        let param = ToolParameter::new("test_param", ToolParameterType::String)
            .with_description("A test parameter")
            .required();

        assert_eq!(param.name, "test_param");
        assert_eq!(param.param_type, ToolParameterType::String);
        assert_eq!(param.description, Some("A test parameter".to_string()));
        assert!(param.required);
    }

    #[test]
    fn test_input_schema_without_parameters() {
        let schema = ToolMetadata::new("get_history", "Gets the operation history").input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"], json!({}));
        assert_eq!(schema["required"], json!([]));
    }

    #[tokio::test]
    async fn test_tool_execution() {
        let protocol = Arc::new(MockProtocol);
        let tool = Tool::new("test_tool", "A test tool", protocol.clone());

        let result = tool.execute(json!({})).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output["tool"], "test_tool");
    }

    #[tokio::test]
    async fn test_registry_discovery_keeps_order() {
        let mut registry = ToolRegistry::new(Arc::new(MockProtocol));
        registry.discover_tools_from_primary().await.unwrap();

        let names: Vec<_> = registry.list_tools().iter().map(|m| m.name.clone()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(registry.tool_definitions().len(), 2);
    }

    #[tokio::test]
    async fn test_tool_registry() {
        let protocol = Arc::new(MockProtocol);
        let mut registry = ToolRegistry::new(protocol.clone());

        registry.add_tool(Tool::new("calculator", "Performs calculations", protocol.clone()));
        registry.add_tool(Tool::new("calculator", "Replaced", protocol.clone()));

        assert_eq!(registry.list_tools().len(), 1);
        assert_eq!(registry.get_tool("calculator").unwrap().metadata().description, "Replaced");

        let result = registry
            .execute_tool("calculator", json!({}))
            .await
            .unwrap();
        assert!(result.success);

        let missing = registry.execute_tool("nope", json!({})).await.unwrap_err();
        assert_eq!(missing.to_string(), "Tool not found: nope");

        assert!(registry.remove_tool("calculator").is_some());
        assert!(registry.is_empty());
    }
}
