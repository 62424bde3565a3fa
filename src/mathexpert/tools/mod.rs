//! Built-in Tool Implementations
//!
//! Deterministic capabilities the agent can call instead of doing arithmetic itself.
//!
//! # Available Tools
//!
//! - **MathTools**: integer addition and subtraction with an operation log
//!   - Every completed operation is recorded as `"<a> <op> <b> = <result>"`
//!   - History queries surface the five most recent entries
//!   - Overflow is reported instead of wrapping
//!   - Exposed to agents through [`math_protocol`](crate::tool_protocols::math_protocol)
//!
//! # Integration with Agents
//!
//! ```ignore
//! use mathexpert::tools::MathTools;
//! use mathexpert::tool_protocols::math_protocol;
//! use mathexpert::tool_protocol::ToolRegistry;
//! use std::sync::Arc;
//!
//! let math = Arc::new(MathTools::new());
//! let mut registry = ToolRegistry::new(Arc::new(math_protocol(math)));
//! registry.discover_tools_from_primary().await?;
//! agent.with_tools(registry);
//! ```

pub mod math;

pub use math::{MathError, MathTools, Operator, EMPTY_HISTORY, HISTORY_WINDOW};
