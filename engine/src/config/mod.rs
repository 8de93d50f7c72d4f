//! Configuration management
//!
//! This module handles loading, validation, and management of the Recall configuration.
//! Configuration is stored in TOML format at ~/.recall/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, optional log file, data directory
//! - **session**: User id that scopes long-term memory
//! - **agent**: Orchestration loop limits and timeouts
//! - **llm**: Gemini decision oracle settings
//! - **tools**: Built-in tool enablement and weather service settings
//! - **memory**: Long-term memory backend and retrieval limits
//!
//! Every section except `core` may be omitted and falls back to defaults.
//! Credentials never live in this file; see [`crate::secrets`].
//!
//! # Examples
//!
//! ```no_run
//! use recall_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//!
//! println!("Model: {}", config.llm.gemini.model);
//! println!("Max iterations: {}", config.agent.max_iterations);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Conversation settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Orchestration loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Decision oracle configuration
    #[serde(default)]
    pub llm: LLMConfig,

    /// Built-in tool enablement
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Long-term memory configuration
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Additional plain-text log file (supports ~ expansion)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: None,
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Opaque id scoping memory reads and writes
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
        }
    }
}

/// Orchestration loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Tool batches allowed per turn before the answer is forced
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Upper bound on a single oracle call (seconds)
    #[serde(default = "default_oracle_timeout")]
    pub oracle_timeout_secs: u64,

    /// Upper bound on a single tool call (seconds)
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,

    /// Run the calls of one batch concurrently
    #[serde(default)]
    pub parallel_tool_calls: bool,

    /// Approximate token budget for the running context
    #[serde(default = "default_context_token_limit")]
    pub context_token_limit: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            oracle_timeout_secs: default_oracle_timeout(),
            tool_timeout_secs: default_tool_timeout(),
            parallel_tool_calls: false,
            context_token_limit: default_context_token_limit(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Gemini provider settings
    #[serde(default)]
    pub gemini: GeminiConfig,
}

/// Gemini provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Base URL for Gemini API
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_gemini_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_top_p")]
    pub top_p: f64,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    // Note: API key comes from GEMINI_API_KEY or the OS keychain, not from config
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_gemini_base_url(),
            model: default_gemini_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

/// Built-in tools enablement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Enable `math_calculator`
    #[serde(default = "default_true")]
    pub math: bool,

    /// Enable `date_utility_tool`
    #[serde(default = "default_true")]
    pub date: bool,

    /// Enable `analyze_text`
    #[serde(default = "default_true")]
    pub text: bool,

    /// `get_weather` settings
    #[serde(default)]
    pub weather: WeatherConfig,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            math: true,
            date: true,
            text: true,
            weather: WeatherConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Enable `get_weather` (requires WEATHER_API_KEY)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base URL of the OpenWeatherMap API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,

    /// Unit system passed to the API (metric, imperial, standard)
    #[serde(default = "default_weather_units")]
    pub units: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_weather_base_url(),
            units: default_weather_units(),
        }
    }
}

/// Long-term memory backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryBackend {
    /// Hosted Mem0 API
    Mem0,
    /// Local SQLite full-text store
    Sqlite,
    /// No long-term memory
    #[serde(rename = "none")]
    Disabled,
}

/// Memory system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_backend")]
    pub backend: MemoryBackend,

    /// Queries shorter than this (after trimming) skip retrieval
    #[serde(default = "default_min_query_chars")]
    pub min_query_chars: usize,

    /// Most snippets injected into one prompt
    #[serde(default = "default_max_snippets")]
    pub max_snippets: usize,

    /// Upper bound on a single backend call (seconds)
    #[serde(default = "default_memory_timeout")]
    pub timeout_secs: u64,

    /// Mem0 backend settings
    #[serde(default)]
    pub mem0: Mem0Config,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            min_query_chars: default_min_query_chars(),
            max_snippets: default_max_snippets(),
            timeout_secs: default_memory_timeout(),
            mem0: Mem0Config::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mem0Config {
    /// Base URL for the Mem0 API
    #[serde(default = "default_mem0_base_url")]
    pub base_url: String,
    // Note: API key comes from MEM0_API_KEY or the OS keychain
}

impl Default for Mem0Config {
    fn default() -> Self {
        Self {
            base_url: default_mem0_base_url(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.recall/data")
}

fn default_user_id() -> String {
    "default".to_string()
}

fn default_max_iterations() -> usize {
    10
}

fn default_oracle_timeout() -> u64 {
    30
}

fn default_tool_timeout() -> u64 {
    10
}

fn default_context_token_limit() -> usize {
    32_000
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_temperature() -> f64 {
    0.2
}

fn default_top_p() -> f64 {
    0.9
}

fn default_top_k() -> u32 {
    40
}

fn default_max_output_tokens() -> u32 {
    512
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_weather_units() -> String {
    "metric".to_string()
}

fn default_memory_backend() -> MemoryBackend {
    MemoryBackend::Mem0
}

fn default_min_query_chars() -> usize {
    4
}

fn default_max_snippets() -> usize {
    5
}

fn default_memory_timeout() -> u64 {
    5
}

fn default_mem0_base_url() -> String {
    "https://api.mem0.ai".to_string()
}

impl Config {
    /// Load configuration from the default location (~/.recall/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    /// Validates the configuration after loading and returns descriptive errors
    /// if validation fails.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;
        Self::load_or_create_at(&config_path)
    }

    /// Load the configuration at `path`, writing defaults there first if missing
    pub fn load_or_create_at(path: &Path) -> Result<Self, EngineError> {
        if path.exists() {
            Self::load_from_path(path)
        } else {
            Self::create_default(path)
        }
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    ///
    /// The file is written before `~` expansion so it stays portable.
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let config = Self::default_config();

        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        let mut config = config;
        config.validate_and_process()?;
        Ok(config)
    }

    /// Get the default configuration file path (~/.recall/config.toml)
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".recall").join("config.toml"))
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            core: CoreConfig::default(),
            session: SessionConfig::default(),
            agent: AgentConfig::default(),
            llm: LLMConfig::default(),
            tools: ToolsConfig::default(),
            memory: MemoryConfig::default(),
        }
    }

    /// Validate and process configuration
    ///
    /// Checks value ranges and expands `~` in paths. Directories are not
    /// created here; the components that write to them do that.
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.session.user_id.trim().is_empty() {
            return Err(EngineError::Config(
                "session.user_id must not be empty".to_string(),
            ));
        }

        if self.agent.max_iterations == 0 {
            return Err(EngineError::Config(
                "agent.max_iterations must be at least 1".to_string(),
            ));
        }
        if self.agent.oracle_timeout_secs == 0 || self.agent.tool_timeout_secs == 0 {
            return Err(EngineError::Config(
                "agent timeouts must be at least 1 second".to_string(),
            ));
        }

        let gemini = &self.llm.gemini;
        if !(0.0..=2.0).contains(&gemini.temperature) {
            return Err(EngineError::Config(
                "llm.gemini.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&gemini.top_p) {
            return Err(EngineError::Config(
                "llm.gemini.top_p must be between 0.0 and 1.0".to_string(),
            ));
        }
        if gemini.max_output_tokens == 0 {
            return Err(EngineError::Config(
                "llm.gemini.max_output_tokens must be positive".to_string(),
            ));
        }

        let valid_units = ["metric", "imperial", "standard"];
        if !valid_units.contains(&self.tools.weather.units.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid weather units '{}'. Must be one of: {}",
                self.tools.weather.units,
                valid_units.join(", ")
            )));
        }

        if self.memory.max_snippets == 0 {
            return Err(EngineError::Config(
                "memory.max_snippets must be at least 1".to_string(),
            ));
        }
        if self.memory.timeout_secs == 0 {
            return Err(EngineError::Config(
                "memory.timeout_secs must be at least 1 second".to_string(),
            ));
        }

        self.core.data_dir = expand_path(&self.core.data_dir)?;
        if let Some(log_file) = &self.core.log_file {
            self.core.log_file = Some(expand_path(log_file)?);
        }

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}
