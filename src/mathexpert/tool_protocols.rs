//! Tool Protocol Implementations
//!
//! Concrete [`ToolProtocol`] implementations.
//!
//! # Available Implementations
//!
//! - **CustomToolProtocol**: Direct Rust function calls. Each registration is a
//!   record of `{metadata, function}`.
//! - **math_protocol**: A `CustomToolProtocol` preloaded with the three
//!   [`MathTools`] operations (`diff_values`, `sum_values`, `get_history`),
//!   listed in the order the system prompt names them.
//!
//! # Usage
//!
//! ```ignore
//! let math = Arc::new(MathTools::new());
//! let mut registry = ToolRegistry::new(Arc::new(math_protocol(math)));
//! registry.discover_tools_from_primary().await?;
//! ```

use crate::mathexpert::tool_protocol::{
    ToolError, ToolMetadata, ToolParameter, ToolParameterType, ToolProtocol, ToolResult,
};
use crate::mathexpert::tools::MathTools;
use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use std::error::Error;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Name of the addition tool.
pub const SUM_VALUES: &str = "sum_values";
/// Name of the subtraction tool.
pub const DIFF_VALUES: &str = "diff_values";
/// Name of the history tool.
pub const GET_HISTORY: &str = "get_history";

/// Type alias for synchronous tool functions exposed via the custom adapter.
pub type ToolFunction =
    Arc<dyn Fn(JsonValue) -> Result<ToolResult, Box<dyn Error + Send + Sync>> + Send + Sync>;

struct ToolRecord {
    metadata: ToolMetadata,
    function: ToolFunction,
}

/// Custom function-calling tool adapter
///
/// Registers Rust closures as tools. Listing order follows registration order.
///
/// # Example
///
/// ```rust
/// use mathexpert::tool_protocols::CustomToolProtocol;
/// use mathexpert::tool_protocol::{ToolMetadata, ToolParameter, ToolParameterType, ToolResult};
/// use std::sync::Arc;
///
/// let adapter = CustomToolProtocol::new().with_tool(
///     ToolMetadata::new("double", "Doubles a number")
///         .with_parameter(ToolParameter::new("x", ToolParameterType::Integer).required()),
///     Arc::new(|params| {
///         let x = params["x"].as_i64().unwrap_or(0);
///         Ok(ToolResult::success(serde_json::json!(x * 2)))
///     }),
/// );
/// ```
pub struct CustomToolProtocol {
    tools: RwLock<Vec<ToolRecord>>,
}

impl CustomToolProtocol {
    /// Create an empty adapter ready to accept new tool registrations.
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(Vec::new()),
        }
    }

    /// Builder form of [`register_tool`](Self::register_tool) for use before
    /// the adapter is shared.
    pub fn with_tool(mut self, metadata: ToolMetadata, function: ToolFunction) -> Self {
        upsert(self.tools.get_mut(), ToolRecord { metadata, function });
        self
    }

    /// Register a synchronous tool function.
    ///
    /// Subsequent calls will overwrite any existing tool with the same name.
    pub async fn register_tool(&self, metadata: ToolMetadata, function: ToolFunction) {
        upsert(&mut *self.tools.write().await, ToolRecord { metadata, function });
    }

    /// Remove a tool from the adapter.
    pub async fn unregister_tool(&self, name: &str) {
        self.tools
            .write()
            .await
            .retain(|record| record.metadata.name != name);
    }
}

fn upsert(tools: &mut Vec<ToolRecord>, record: ToolRecord) {
    match tools
        .iter_mut()
        .find(|existing| existing.metadata.name == record.metadata.name)
    {
        Some(existing) => *existing = record,
        None => tools.push(record),
    }
}

impl Default for CustomToolProtocol {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolProtocol for CustomToolProtocol {
    async fn execute(
        &self,
        tool_name: &str,
        parameters: JsonValue,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
        let function = {
            let tools = self.tools.read().await;
            tools
                .iter()
                .find(|record| record.metadata.name == tool_name)
                .map(|record| record.function.clone())
        };

        match function {
            Some(function) => function(parameters),
            None => Err(ToolError::NotFound(tool_name.to_string()).into()),
        }
    }

    async fn list_tools(&self) -> Result<Vec<ToolMetadata>, Box<dyn Error + Send + Sync>> {
        let tools = self.tools.read().await;
        Ok(tools.iter().map(|record| record.metadata.clone()).collect())
    }

    async fn get_tool_metadata(
        &self,
        tool_name: &str,
    ) -> Result<ToolMetadata, Box<dyn Error + Send + Sync>> {
        let tools = self.tools.read().await;
        tools
            .iter()
            .find(|record| record.metadata.name == tool_name)
            .map(|record| record.metadata.clone())
            .ok_or_else(|| {
                Box::new(ToolError::NotFound(tool_name.to_string())) as Box<dyn Error + Send + Sync>
            })
    }

    fn protocol_name(&self) -> &str {
        "custom"
    }
}

/// Build a [`CustomToolProtocol`] exposing one [`MathTools`] instance.
///
/// | Tool | Parameters | Output |
/// |---|---|---|
/// | `diff_values` | `a`, `b` (integers) | integer |
/// | `sum_values` | `a`, `b` (integers) | integer |
/// | `get_history` | none | text |
///
/// Bad parameters and overflow come back as failed [`ToolResult`]s so the
/// model can see what went wrong; the operation log is left untouched.
pub fn math_protocol(math: Arc<MathTools>) -> CustomToolProtocol {
    let sum = math.clone();
    let diff = math.clone();
    let history = math;

    CustomToolProtocol::new()
        .with_tool(
            binary_metadata(
                DIFF_VALUES,
                "Calculates the difference between two numbers",
            ),
            Arc::new(move |params| {
                Ok(into_result(operands(&params).and_then(|(a, b)| {
                    log::info!("Calculating difference: {} - {}", a, b);
                    diff.subtract(a, b)
                        .map(|v| json!(v))
                        .map_err(|e| ToolError::ExecutionFailed(e.to_string()))
                })))
            }),
        )
        .with_tool(
            binary_metadata(SUM_VALUES, "Sums two numbers"),
            Arc::new(move |params| {
                Ok(into_result(operands(&params).and_then(|(a, b)| {
                    log::info!("Calculating sum: {} + {}", a, b);
                    sum.add(a, b)
                        .map(|v| json!(v))
                        .map_err(|e| ToolError::ExecutionFailed(e.to_string()))
                })))
            }),
        )
        .with_tool(
            ToolMetadata::new(GET_HISTORY, "Gets the operation history"),
            Arc::new(move |_params| {
                log::info!("Retrieving operation history");
                Ok(ToolResult::success(JsonValue::String(history.recent_history())))
            }),
        )
}

fn binary_metadata(name: &str, description: &str) -> ToolMetadata {
    ToolMetadata::new(name, description)
        .with_parameter(
            ToolParameter::new("a", ToolParameterType::Integer)
                .with_description("first number")
                .required(),
        )
        .with_parameter(
            ToolParameter::new("b", ToolParameterType::Integer)
                .with_description("second number")
                .required(),
        )
}

fn into_result(outcome: Result<JsonValue, ToolError>) -> ToolResult {
    match outcome {
        Ok(output) => ToolResult::success(output),
        Err(err) => ToolResult::failure(err.to_string()),
    }
}

fn operands(params: &JsonValue) -> Result<(i64, i64), ToolError> {
    Ok((integer_param(params, "a")?, integer_param(params, "b")?))
}

/// Read an integer argument, accepting the shapes models actually send:
/// JSON integers, integral floats (`5.0`) and numeric strings (`"5"`).
fn integer_param(params: &JsonValue, name: &str) -> Result<i64, ToolError> {
    let value = params
        .get(name)
        .ok_or_else(|| ToolError::InvalidParameters(format!("missing parameter '{}'", name)))?;

    let parsed = match value {
        JsonValue::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        JsonValue::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| {
        ToolError::InvalidParameters(format!("parameter '{}' must be an integer, got {}", name, value))
    })
}
