//! Configuration settings for PodEcho.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub reading: ReadingSettings,
    pub report: ReportSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory where exported reports are written by default.
    pub output_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            output_dir: "~/PodEcho".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Language model settings.
///
/// Any OpenAI-compatible chat completions endpoint works; the defaults point
/// at DeepSeek.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// API base URL.
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Chat model used for every call.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Sampling temperature for insight extraction.
    pub extract_temperature: f32,
    /// Sampling temperature for deep-dive replies.
    pub chat_temperature: f32,
    /// Sampling temperature for chat and session summaries.
    pub summary_temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com".to_string(),
            api_key_env: "DEEPSEEK_API_KEY".to_string(),
            model: "deepseek-chat".to_string(),
            timeout_secs: 300,
            extract_temperature: 0.3,
            chat_temperature: 0.7,
            summary_temperature: 0.5,
        }
    }
}

/// Reading view behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingSettings {
    /// How many characters of the excerpt the deep-dive greeting echoes.
    pub greeting_excerpt_chars: usize,
    /// Vertical distance between a selection and its action popover.
    pub popover_offset: f64,
}

impl Default for ReadingSettings {
    fn default() -> Self {
        Self {
            greeting_excerpt_chars: 50,
            popover_offset: 50.0,
        }
    }
}

/// Report export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Ask the model for a session summary before exporting.
    pub include_summary: bool,
    /// File name prefix; the podcast id and `.html` are appended.
    pub file_prefix: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            include_summary: true,
            file_prefix: "podecho-report".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Settings>(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> crate::error::Result<()> {
        url::Url::parse(&self.llm.base_url).map_err(|e| {
            crate::error::PodEchoError::Config(format!(
                "llm.base_url '{}' is not a valid URL: {}",
                self.llm.base_url, e
            ))
        })?;

        for (name, value) in [
            ("extract_temperature", self.llm.extract_temperature),
            ("chat_temperature", self.llm.chat_temperature),
            ("summary_temperature", self.llm.summary_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(crate::error::PodEchoError::Config(format!(
                    "llm.{} must be between 0.0 and 2.0, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::PodEchoError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("podecho")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded report output directory.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.output_dir)
    }
}
