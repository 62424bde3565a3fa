// src/mathexpert/mod.rs

pub mod agent;
pub mod aws;
pub mod cli;
pub mod client_wrapper;
pub mod clients;
pub mod config;
pub mod model_params;
pub mod prompts;
pub mod tool_protocol;
pub mod tool_protocols;
pub mod tools;

pub use agent::AgentExecutor;
pub use tools::MathTools;
