use crate::api::Provider;
use crate::error::ConfigError;
use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

// ── Persisted settings ───────────────────────────────────────────

/// Flat preference map persisted across runs, mutated only by explicit user
/// edits (`config set …`). Generation parameter ranges mirror the clamps the
/// backend applies server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default = "default_server_url")]
    pub server_url: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub provider: Provider,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub openai_base_url: Option<String>,

    #[serde(default)]
    pub show_tokens: bool,
    #[serde(default)]
    pub dark_mode: bool,
}

fn default_server_url() -> String {
    "http://127.0.0.1:5001".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_top_p() -> f64 {
    0.8
}

fn default_top_k() -> u32 {
    40
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            server_url: default_server_url(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_tokens: default_max_tokens(),
            provider: Provider::default(),
            model: default_model(),
            openai_base_url: None,
            show_tokens: false,
            dark_mode: false,
        }
    }
}

impl Settings {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let chatterm_dir = home.join(".chatterm");
        Self::load_or_init_at(chatterm_dir.join("config.toml"))
    }

    /// Same as `load_or_init` with an explicit path; tests point this at a
    /// temp directory.
    pub fn load_or_init_at(config_path: PathBuf) -> Result<Self> {
        if let Some(parent) = config_path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let mut settings: Settings =
                toml::from_str(&contents).context("Failed to parse config file")?;
            settings.config_path = config_path;
            settings.validate()?;
            Ok(settings)
        } else {
            let settings = Self {
                config_path,
                ..Self::default()
            };
            settings.save()?;
            Ok(settings)
        }
    }

    /// Apply environment variable overrides to persisted settings
    pub fn apply_env_overrides(&mut self) {
        if let Ok(server) = std::env::var("CHATTERM_SERVER")
            && !server.is_empty()
        {
            self.server_url = server;
        }

        if let Ok(provider) = std::env::var("CHATTERM_PROVIDER")
            && let Ok(parsed) = provider.parse::<Provider>()
        {
            self.provider = parsed;
        }

        if let Ok(model) = std::env::var("CHATTERM_MODEL")
            && !model.is_empty()
        {
            self.model = model;
        }

        if let Ok(temp_str) = std::env::var("CHATTERM_TEMPERATURE")
            && let Ok(temp) = temp_str.parse::<f64>()
            && (0.0..=2.0).contains(&temp)
        {
            self.temperature = temp;
        }
    }

    /// Range checks matching the backend's parameter clamps.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Validation(format!(
                "temperature {} outside 0.0..=2.0",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(ConfigError::Validation(format!(
                "top_p {} outside 0.0..=1.0",
                self.top_p
            )));
        }
        if !(1..=100).contains(&self.top_k) {
            return Err(ConfigError::Validation(format!(
                "top_k {} outside 1..=100",
                self.top_k
            )));
        }
        if !(1..=4096).contains(&self.max_tokens) {
            return Err(ConfigError::Validation(format!(
                "max_tokens {} outside 1..=4096",
                self.max_tokens
            )));
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }

    /// Set one key from its CLI string form. Unknown keys and out-of-range
    /// values are validation errors.
    pub fn set_key(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "server_url" => self.server_url = value.to_string(),
            "temperature" => self.temperature = parse_value(key, value)?,
            "top_p" => self.top_p = parse_value(key, value)?,
            "top_k" => self.top_k = parse_value(key, value)?,
            "max_tokens" => self.max_tokens = parse_value(key, value)?,
            "provider" => self.provider = parse_value(key, value)?,
            "model" => self.model = value.to_string(),
            "openai_base_url" => {
                self.openai_base_url = (!value.is_empty()).then(|| value.to_string());
            }
            "show_tokens" => self.show_tokens = parse_value(key, value)?,
            "dark_mode" => self.dark_mode = parse_value(key, value)?,
            other => {
                return Err(ConfigError::Validation(format!("unknown key: {other}")));
            }
        }
        self.validate()
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("invalid value for {key}: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_settings() -> (TempDir, Settings) {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_or_init_at(dir.path().join("config.toml")).unwrap();
        (dir, settings)
    }

    #[test]
    fn init_writes_defaults_then_round_trips() {
        let (dir, mut settings) = temp_settings();
        assert!(dir.path().join("config.toml").exists());
        assert_eq!(settings.temperature, 0.7);
        assert_eq!(settings.provider, Provider::Google);

        settings.model = "gpt-4o-mini".to_string();
        settings.provider = Provider::Openai;
        settings.show_tokens = true;
        settings.save().unwrap();

        let reloaded = Settings::load_or_init_at(dir.path().join("config.toml")).unwrap();
        assert_eq!(reloaded.model, "gpt-4o-mini");
        assert_eq!(reloaded.provider, Provider::Openai);
        assert!(reloaded.show_tokens);
        assert_eq!(reloaded.top_k, 40);
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let (_dir, mut settings) = temp_settings();
        settings.temperature = 2.5;
        assert!(settings.validate().is_err());

        settings.temperature = 0.7;
        settings.top_k = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn set_key_parses_and_validates() {
        let (_dir, mut settings) = temp_settings();
        settings.set_key("temperature", "1.2").unwrap();
        assert_eq!(settings.temperature, 1.2);

        settings.set_key("provider", "anthropic").unwrap();
        assert_eq!(settings.provider, Provider::Anthropic);

        assert!(settings.set_key("top_p", "1.5").is_err());
        assert!(settings.set_key("nonsense", "1").is_err());
    }

    #[test]
    fn set_key_clears_empty_openai_base_url() {
        let (_dir, mut settings) = temp_settings();
        settings.set_key("openai_base_url", "http://localhost:8080/v1").unwrap();
        assert!(settings.openai_base_url.is_some());
        settings.set_key("openai_base_url", "").unwrap();
        assert!(settings.openai_base_url.is_none());
    }
}
