//! Application configuration
//!
//! Split into focused sub-modules:
//! - `server`: HTTP server settings
//! - `database`: SQLite database settings
//! - `quota`: daily limit and store selection
//! - `story`: composition and synthesis limits, retries
//! - `telemetry`: log filtering
//!
//! Provider sections reuse `ai_core::InferenceConfig` and
//! `ai_speech::SpeechConfig` directly.

mod database;
mod quota;
mod server;
mod story;
mod telemetry;

use std::fmt;

use ai_core::InferenceConfig;
use ai_speech::SpeechConfig;
use application::PipelineConfig;
use config::{ConfigError, Map};
use domain::{DomainError, VoiceCatalog, VoiceProfile};
use serde::{Deserialize, Serialize};

pub use database::DatabaseConfig;
pub use quota::{QuotaConfig, QuotaStoreKind};
pub use server::ServerConfig;
pub use story::StoryConfig;
pub use telemetry::TelemetryConfig;

/// Prefix for environment overrides, e.g. `TALEBOX_SERVER__PORT=8080`
pub const ENV_PREFIX: &str = "TALEBOX";

/// Shared default for boolean `true` fields across config structs
pub(crate) const fn default_true() -> bool {
    true
}

/// Application environment (development or production)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(format!(
                "Invalid environment: {s}. Use 'development' or 'production'"
            )),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub environment: Environment,

    #[serde(default)]
    pub server: ServerConfig,

    /// Story text provider
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Narration provider
    #[serde(default)]
    pub speech: SpeechConfig,

    #[serde(default)]
    pub quota: QuotaConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub story: StoryConfig,

    /// Replaces the built-in voice list when set
    #[serde(default)]
    pub voices: Option<Vec<VoiceProfile>>,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment and optional `config.toml`
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(config::File::with_name("config").required(false), None)
    }

    /// Defaults, then `file`, then environment variables
    ///
    /// `env` replaces the process environment when given.
    pub fn from_sources<F>(file: F, env: Option<Map<String, String>>) -> Result<Self, ConfigError>
    where
        F: config::Source + Send + Sync + 'static,
    {
        let builder = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.allowed_origins")
                    .try_parsing(true)
                    .source(env),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Cross-field checks the individual sections cannot do
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quota.daily_limit == 0 {
            return Err(ConfigError::Message(
                "quota.daily_limit must be at least 1".to_string(),
            ));
        }
        if self.story.max_chunk_chars == 0 {
            return Err(ConfigError::Message(
                "story.max_chunk_chars must be at least 1".to_string(),
            ));
        }
        if self.story.max_story_chars == 0 {
            return Err(ConfigError::Message(
                "story.max_story_chars must be at least 1".to_string(),
            ));
        }
        if self.story.min_story_chars > self.story.max_story_chars {
            return Err(ConfigError::Message(format!(
                "story.min_story_chars ({}) exceeds story.max_story_chars ({})",
                self.story.min_story_chars, self.story.max_story_chars
            )));
        }
        if !matches!(self.server.log_format.as_str(), "text" | "json") {
            return Err(ConfigError::Message(format!(
                "server.log_format must be 'text' or 'json', got '{}'",
                self.server.log_format
            )));
        }
        Ok(())
    }

    /// Configured voices, or the built-in set
    pub fn voice_catalog(&self) -> Result<VoiceCatalog, DomainError> {
        match &self.voices {
            Some(voices) => VoiceCatalog::new(voices.clone()),
            None => Ok(VoiceCatalog::default()),
        }
    }

    #[must_use]
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            daily_limit: self.quota.daily_limit,
            scratch_dir: self.story.scratch_dir.clone(),
        }
    }

    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }
}
