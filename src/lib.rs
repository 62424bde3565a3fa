//! # mathexpert
//!
//! A command line math expert: Claude on Amazon Bedrock answering arithmetic
//! questions through a small set of tools instead of doing the math itself.
//!
//! The crate is layered the way requests flow through it:
//!
//! * **Math tools**: [`MathTools`] adds and subtracts integers and keeps an
//!   operation log whose last five entries can be queried.
//! * **Tool protocol**: [`tool_protocol::ToolRegistry`] holds tool metadata and
//!   dispatches calls; [`tool_protocols::math_protocol`] exposes one
//!   `MathTools` as `sum_values`, `diff_values` and `get_history`.
//! * **Model clients**: [`ClientWrapper`] is the provider-neutral seam;
//!   [`clients::bedrock::BedrockClient`] implements it on the Converse API.
//! * **Agent**: [`AgentExecutor`] runs the tool-calling loop.
//! * **Configuration**: [`config::Settings`] and [`config::AwsConfig`] are read
//!   once from the environment and passed down explicitly.
//!
//! ## Using the tools directly
//!
//! ```rust
//! use mathexpert::MathTools;
//!
//! let math = MathTools::new();
//! math.add(5, 3).unwrap();
//! math.subtract(10, 4).unwrap();
//! assert_eq!(math.recent_history(), "5 + 3 = 8\n10 - 4 = 6");
//! ```
//!
//! ## Running the agent
//!
//! ```rust,no_run
//! use mathexpert::cli::run;
//! use mathexpert::config::Settings;
//! use mathexpert::model_params::Model;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     mathexpert::init_logger();
//!     let settings = Settings::load()?;
//!     let output = run("What is 12 - 5?", Model::ClaudeSonnet4, &settings).await?;
//!     println!("{}", output.output);
//!     Ok(())
//! }
//! ```

use chrono::Local;
use log::LevelFilter;
use std::io::Write;
use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once at `info` level.
///
/// `RUST_LOG` still overrides the level. Lines look like
/// `17/10/2026 09:30:00 [INFO] message`.
///
/// ```rust
/// mathexpert::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    init_logger_with_level(LevelFilter::Info);
}

/// Like [`init_logger`] with a different default level. Later calls are no-ops.
pub fn init_logger_with_level(level: LevelFilter) {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::Builder::new()
            .filter_level(level)
            .parse_default_env()
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{} [{}] {}",
                    Local::now().format("%d/%m/%Y %H:%M:%S"),
                    record.level(),
                    record.args()
                )
            })
            .try_init();
    });
}

// Import the top-level `mathexpert` module.
pub mod mathexpert;

// Re-exporting key items for easier external access.
pub use mathexpert::agent;
pub use mathexpert::agent::{AgentExecutor, AgentOutput, AgentStep};
pub use mathexpert::aws;
pub use mathexpert::cli;
pub use mathexpert::client_wrapper;
pub use mathexpert::client_wrapper::{ClientWrapper, Message, Role};
pub use mathexpert::clients;
pub use mathexpert::config;
pub use mathexpert::model_params;
pub use mathexpert::prompts;
pub use mathexpert::tool_protocol;
pub use mathexpert::tool_protocols;
pub use mathexpert::tools;
pub use mathexpert::tools::MathTools;
