// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub budget: BudgetConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// address of the service fronting embeddings, search and generation
    #[serde(default = "default_backend_addr")]
    pub addr: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// how many matches to request from the vector store
    #[serde(default = "default_count")]
    pub count: usize,
    /// minimum similarity for a match to be considered at all
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// total token ceiling for one generation request
    #[serde(default = "default_prompt_ceiling")]
    pub prompt_ceiling: usize,
    /// cap on what the retrieved context block may occupy
    #[serde(default = "default_context_tokens")]
    pub context_tokens: usize,
    /// budget for the trimmed conversation history
    #[serde(default = "default_history_tokens")]
    pub history_tokens: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// answer returned when retrieval comes back empty
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,
    /// generic/homepage URLs, outranked by topic pages in attribution
    #[serde(default)]
    pub priority_urls: Vec<String>,
    /// whether topic pages beat homepage URLs unconditionally
    #[serde(default = "default_true")]
    pub prefer_specific: bool,
    /// how many stored turns the REPL supplies as history
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
    /// requests per client key per minute; 0 disables limiting
    #[serde(default)]
    pub rate_limit_per_minute: u32,
}

fn default_backend_addr() -> String {
    "127.0.0.1:8791".into()
}
fn default_connect_timeout_secs() -> u64 {
    10
}
fn default_count() -> usize {
    8
}
fn default_threshold() -> f32 {
    0.25
}
fn default_prompt_ceiling() -> usize {
    12_000
}
fn default_context_tokens() -> usize {
    3000
}
fn default_history_tokens() -> usize {
    2000
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_temperature() -> f32 {
    0.2
}
fn default_fallback_message() -> String {
    "I could not find anything about that in the site content. \
     Try rephrasing your question."
        .into()
}
fn default_history_turns() -> usize {
    12
}
fn default_true() -> bool {
    true
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            addr: default_backend_addr(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            count: default_count(),
            threshold: default_threshold(),
        }
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            prompt_ceiling: default_prompt_ceiling(),
            context_tokens: default_context_tokens(),
            history_tokens: default_history_tokens(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            fallback_message: default_fallback_message(),
            priority_urls: Vec::new(),
            prefer_specific: true,
            history_turns: default_history_turns(),
            rate_limit_per_minute: 0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            backend: BackendConfig::default(),
            retrieval: RetrievalConfig::default(),
            budget: BudgetConfig::default(),
            generation: GenerationConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

impl Config {
    fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wrag")
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("wrag")
            .join("config.toml")
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        let config = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config from {}", path.display()))?;
            let config: Config =
                toml::from_str(&content).with_context(|| "failed to parse config")?;
            config
        } else {
            Config::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // a missing or unparseable endpoint must fail before any request
        self.socket_addr()?;
        if self.retrieval.count == 0 {
            anyhow::bail!("retrieval.count must be > 0");
        }
        if self.retrieval.threshold < -1.0 || self.retrieval.threshold > 1.0 {
            anyhow::bail!("retrieval.threshold must be between -1.0 and 1.0");
        }
        if self.budget.prompt_ceiling == 0 {
            anyhow::bail!("budget.prompt_ceiling must be > 0");
        }
        if self.budget.context_tokens == 0 {
            anyhow::bail!("budget.context_tokens must be > 0");
        }
        if self.budget.context_tokens > self.budget.prompt_ceiling {
            anyhow::bail!("budget.context_tokens must not exceed budget.prompt_ceiling");
        }
        if self.budget.history_tokens == 0 {
            anyhow::bail!("budget.history_tokens must be > 0");
        }
        if self.generation.max_tokens == 0 {
            anyhow::bail!("generation.max_tokens must be > 0");
        }
        if self.generation.temperature < 0.0 || self.generation.temperature > 2.0 {
            anyhow::bail!("generation.temperature must be between 0.0 and 2.0");
        }
        if self.chat.history_turns == 0 {
            anyhow::bail!("chat.history_turns must be > 0");
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700))?;
            }
        }
        let content = toml::to_string_pretty(self).with_context(|| "failed to serialise config")?;
        std::fs::write(&path, &content)?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.backend
            .addr
            .parse()
            .with_context(|| format!("invalid backend.addr: {}", self.backend.addr))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.connect_timeout_secs)
    }

    pub fn sessions_db_path(&self) -> PathBuf {
        self.data_dir.join("sessions.db")
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.data_dir, std::fs::Permissions::from_mode(0o700))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.retrieval.count, config.retrieval.count);
        assert_eq!(parsed.budget.context_tokens, config.budget.context_tokens);
    }

    #[test]
    fn test_config_validation_bad_addr() {
        let mut config = Config::default();
        config.backend.addr = "not an address".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_count() {
        let mut config = Config::default();
        config.retrieval.count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_threshold_range() {
        let mut config = Config::default();
        config.retrieval.threshold = 1.5;
        assert!(config.validate().is_err());
        config.retrieval.threshold = -1.5;
        assert!(config.validate().is_err());
        config.retrieval.threshold = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_context_cap_within_ceiling() {
        let mut config = Config::default();
        config.budget.context_tokens = config.budget.prompt_ceiling + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_temperature_range() {
        let mut config = Config::default();
        config.generation.temperature = 3.0;
        assert!(config.validate().is_err());

        config.generation.temperature = -0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_partial_config() {
        let toml_str = r#"
[retrieval]
count = 20
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.retrieval.count, 20);
        assert_eq!(config.retrieval.threshold, default_threshold());
        assert_eq!(config.budget.prompt_ceiling, default_prompt_ceiling());
    }

    #[test]
    fn test_socket_addr_parses_default() {
        let config = Config::default();
        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.port(), 8791);
    }

    #[test]
    fn test_path_methods() {
        let config = Config::default();
        assert!(config.sessions_db_path().ends_with("sessions.db"));
        assert!(Config::config_path().ends_with("config.toml"));
    }
}
