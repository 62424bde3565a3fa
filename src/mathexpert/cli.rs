//! Command line surface of the `math_expert` binary.

use crate::agent::{AgentError, AgentExecutor, AgentOutput};
use crate::aws::{load_sdk_config, AwsError};
use crate::client_wrapper::ClientWrapper;
use crate::clients::bedrock::BedrockClient;
use crate::config::{ConfigError, Settings};
use crate::model_params::{Model, ModelSettings};
use crate::prompts::AGENT_SYSTEM_PROMPT;
use crate::tool_protocol::ToolRegistry;
use crate::tool_protocols::math_protocol;
use crate::tools::MathTools;
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use std::sync::Arc;
use thiserror::Error;

/// Question asked when `--question` is not given.
pub const DEFAULT_QUESTION: &str =
    "What's the square root of 16 divided by two, squared? Show me also the history of operations.";

#[derive(Parser, Debug)]
#[command(
    name = "math_expert",
    version,
    about = "Math expert agent backed by Claude on Amazon Bedrock"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ask the math expert agent a question.
    #[command(name = "math-expert", alias = "math_expert")]
    MathExpert {
        #[arg(long, short)]
        question: Option<String>,
        #[arg(long, value_enum, default_value_t = ModelChoice::Claude4)]
        model: ModelChoice,
        /// Print the full agent output, tool steps included, as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelChoice {
    #[value(name = "claude-3-7")]
    Claude37,
    #[value(name = "claude-4")]
    Claude4,
}

impl From<ModelChoice> for Model {
    fn from(choice: ModelChoice) -> Self {
        match choice {
            ModelChoice::Claude37 => Model::Claude37Sonnet,
            ModelChoice::Claude4 => Model::ClaudeSonnet4,
        }
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Aws(#[from] AwsError),
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error("failed to register tools: {0}")]
    Tools(String),
    #[error("failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Answer `question` with a fresh [`MathTools`] and the given model client.
pub async fn run_with_client(
    question: &str,
    client: Arc<dyn ClientWrapper>,
) -> Result<AgentOutput, RunError> {
    let math = Arc::new(MathTools::new());
    let mut registry = ToolRegistry::new(Arc::new(math_protocol(math)));
    registry
        .discover_tools_from_primary()
        .await
        .map_err(|e| RunError::Tools(e.to_string()))?;

    let executor = AgentExecutor::new(client, registry, AGENT_SYSTEM_PROMPT);
    let output = executor.invoke(question).await?;

    log::info!("Agent response: {}", output.output);
    Ok(output)
}

/// Answer `question` with `model` on Bedrock.
pub async fn run(
    question: &str,
    model: Model,
    settings: &Settings,
) -> Result<AgentOutput, RunError> {
    let sdk_config = load_sdk_config(&settings.aws).await?;
    let model_settings = ModelSettings::new(model).with_max_tokens(settings.max_tokens);
    log::debug!("Model settings: {:?}", model_settings);

    let client: Arc<dyn ClientWrapper> = Arc::new(BedrockClient::new(&sdk_config, model_settings));
    run_with_client(question, client).await
}

/// Load settings, set up logging and dispatch the parsed command.
pub async fn execute(cli: Cli) -> Result<(), RunError> {
    let settings = Settings::load()?;
    crate::init_logger_with_level(if settings.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
    log::debug!("Running in environment '{}'", settings.environment);

    match cli.command {
        Command::MathExpert {
            question,
            model,
            json,
        } => {
            let question = question.as_deref().unwrap_or(DEFAULT_QUESTION);
            let output = run(question, model.into(), &settings).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", output.output);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_model_choice_maps_to_model() {
        assert_eq!(Model::from(ModelChoice::Claude37), Model::Claude37Sonnet);
        assert_eq!(Model::from(ModelChoice::Claude4), Model::ClaudeSonnet4);
    }
}
