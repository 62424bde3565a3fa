//! Model identifiers and sampling presets for the Bedrock-hosted Claude models.
//!
//! Presets are plain enums with a `value()` accessor; [`ModelSettings`]
//! gathers the concrete numbers a request is sent with.
//!
//! # Example
//!
//! ```rust
//! use mathexpert::model_params::{Model, ModelSettings, TemperatureLevel, TokenLimit};
//!
//! let settings = ModelSettings::new(Model::ClaudeSonnet4)
//!     .with_max_tokens(TokenLimit::Small)
//!     .with_temperature(TemperatureLevel::Conservative.value())
//!     .with_stop_sequences("\n\nHuman");
//!
//! assert_eq!(settings.max_tokens, 9216);
//! assert_eq!(settings.stop_sequences, vec!["\n\nHuman".to_string()]);
//! ```

use crate::mathexpert::config::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Sampling temperature presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureLevel {
    Conservative,
    Balanced,
    Creative,
}

impl TemperatureLevel {
    pub fn value(self) -> f32 {
        match self {
            TemperatureLevel::Conservative => 0.1,
            TemperatureLevel::Balanced => 0.5,
            TemperatureLevel::Creative => 0.9,
        }
    }
}

/// Top-k sampling presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopKLevel {
    Conservative,
    Moderate,
    Diverse,
    VeryDiverse,
}

impl TopKLevel {
    pub fn value(self) -> u32 {
        match self {
            TopKLevel::Conservative => 10,
            TopKLevel::Moderate => 100,
            TopKLevel::Diverse => 250,
            TopKLevel::VeryDiverse => 500,
        }
    }
}

/// Nucleus (top-p) sampling presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopPLevel {
    Conservative,
    Moderate,
    Creative,
}

impl TopPLevel {
    pub fn value(self) -> f32 {
        match self {
            TopPLevel::Conservative => 0.7,
            TopPLevel::Moderate => 0.9,
            TopPLevel::Creative => 1.0,
        }
    }
}

/// Output token budgets, 512 apart from 8704 up to 15872.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TokenLimit {
    MinExtended,
    Small,
    SmallPlus,
    MediumSmall,
    MediumSmallPlus,
    MediumLow,
    MediumLowPlus,
    Medium,
    MediumPlus,
    MediumHigh,
    MediumHighPlus,
    Large,
    LargePlus,
    ExtraLarge,
    MaxExtended,
}

impl TokenLimit {
    pub const ALL: [TokenLimit; 15] = [
        TokenLimit::MinExtended,
        TokenLimit::Small,
        TokenLimit::SmallPlus,
        TokenLimit::MediumSmall,
        TokenLimit::MediumSmallPlus,
        TokenLimit::MediumLow,
        TokenLimit::MediumLowPlus,
        TokenLimit::Medium,
        TokenLimit::MediumPlus,
        TokenLimit::MediumHigh,
        TokenLimit::MediumHighPlus,
        TokenLimit::Large,
        TokenLimit::LargePlus,
        TokenLimit::ExtraLarge,
        TokenLimit::MaxExtended,
    ];

    pub fn value(self) -> u32 {
        match self {
            TokenLimit::MinExtended => 8704,
            TokenLimit::Small => 9216,
            TokenLimit::SmallPlus => 9728,
            TokenLimit::MediumSmall => 10240,
            TokenLimit::MediumSmallPlus => 10752,
            TokenLimit::MediumLow => 11264,
            TokenLimit::MediumLowPlus => 11776,
            TokenLimit::Medium => 12288,
            TokenLimit::MediumPlus => 12800,
            TokenLimit::MediumHigh => 13312,
            TokenLimit::MediumHighPlus => 13824,
            TokenLimit::Large => 14336,
            TokenLimit::LargePlus => 14848,
            TokenLimit::ExtraLarge => 15360,
            TokenLimit::MaxExtended => 15872,
        }
    }
}

impl From<TokenLimit> for u32 {
    fn from(limit: TokenLimit) -> u32 {
        limit.value()
    }
}

/// Claude models served through Bedrock's EU cross-region inference profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Model {
    /// `eu.anthropic.claude-3-7-sonnet-20250219-v1:0`
    Claude37Sonnet,
    /// `eu.anthropic.claude-sonnet-4-20250514-v1:0`
    #[default]
    ClaudeSonnet4,
}

impl Model {
    /// Bedrock model id sent with each request.
    pub fn id(self) -> &'static str {
        match self {
            Model::Claude37Sonnet => "eu.anthropic.claude-3-7-sonnet-20250219-v1:0",
            Model::ClaudeSonnet4 => "eu.anthropic.claude-sonnet-4-20250514-v1:0",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Model {
    type Err = ConfigError;

    /// Accepts the full Bedrock id or a short alias.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "claude-3-7" | "claude-3-7-sonnet" => Ok(Model::Claude37Sonnet),
            "claude-4" | "claude-sonnet-4" => Ok(Model::ClaudeSonnet4),
            other => [Model::Claude37Sonnet, Model::ClaudeSonnet4]
                .into_iter()
                .find(|m| m.id() == other)
                .ok_or_else(|| ConfigError::UnknownModel(other.to_string())),
        }
    }
}

/// Stop sequences given either as one string or as a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopSequences(pub Vec<String>);

impl From<&str> for StopSequences {
    fn from(single: &str) -> Self {
        StopSequences(vec![single.to_string()])
    }
}

impl From<String> for StopSequences {
    fn from(single: String) -> Self {
        StopSequences(vec![single])
    }
}

impl From<Vec<String>> for StopSequences {
    fn from(list: Vec<String>) -> Self {
        StopSequences(list)
    }
}

impl From<Vec<&str>> for StopSequences {
    fn from(list: Vec<&str>) -> Self {
        StopSequences(list.into_iter().map(str::to_string).collect())
    }
}

/// Stop sequence sent when none is configured.
pub const DEFAULT_STOP_SEQUENCE: &str = "\n\nHuman";

/// Concrete inference parameters for one model client.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model_id: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub stop_sequences: Vec<String>,
}

impl ModelSettings {
    /// Defaults: `Medium` token limit, `Balanced` temperature, `Diverse`
    /// top-k, `Creative` top-p and [`DEFAULT_STOP_SEQUENCE`].
    pub fn new(model: Model) -> Self {
        Self::with_model_id(model.id())
    }

    /// Same defaults as [`new`](Self::new) for a model id outside [`Model`].
    pub fn with_model_id(model_id: &str) -> Self {
        Self {
            model_id: model_id.to_string(),
            max_tokens: TokenLimit::Medium.value(),
            temperature: TemperatureLevel::Balanced.value(),
            top_k: TopKLevel::Diverse.value(),
            top_p: TopPLevel::Creative.value(),
            stop_sequences: vec![DEFAULT_STOP_SEQUENCE.to_string()],
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: impl Into<u32>) -> Self {
        self.max_tokens = max_tokens.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn with_stop_sequences(mut self, stop_sequences: impl Into<StopSequences>) -> Self {
        self.stop_sequences = stop_sequences.into().0;
        self
    }
}
