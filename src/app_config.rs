use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{ProfolioError, ProfolioResult};
use crate::llm_handler::LLMProvider;
use crate::prompts::PromptOverrides;

pub const CONFIG_FILE: &str = "profolio_config.json";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Base URL of the hosted backend serving both the REST datastore and auth
    pub datastore_url: Option<String>,
    /// Service key for the hosted backend; only ever read from the environment
    #[serde(skip)]
    pub service_key: Option<String>,
    pub llm_provider: LLMProvider,
    pub openrouter_model: Option<String>,
    pub gemini_model: Option<String>,
    pub anthropic_model: Option<String>,
    /// API key for the selected provider; only ever read from the environment
    #[serde(skip)]
    pub llm_api_key: Option<String>,
    /// Built frontend to serve at `/`
    pub static_dir: Option<String>,
    /// Directory for the daily rolling log file; stdout only when unset
    pub log_dir: Option<String>,

    // User-configurable prompts
    pub prompts: PromptOverrides,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            datastore_url: None,
            service_key: None,
            llm_provider: LLMProvider::default(),
            openrouter_model: None,
            gemini_model: None,
            anthropic_model: None,
            llm_api_key: None,
            static_dir: None,
            log_dir: None,
            prompts: PromptOverrides::default(),
        }
    }
}

fn parse_provider(value: &str) -> Option<LLMProvider> {
    match value.trim().to_ascii_lowercase().as_str() {
        "openrouter" => Some(LLMProvider::OpenRouter),
        "gemini" => Some(LLMProvider::Gemini),
        "anthropic" => Some(LLMProvider::Anthropic),
        _ => None,
    }
}

impl AppConfig {
    /// Model configured for the selected provider, if any
    pub fn model(&self) -> Option<String> {
        match self.llm_provider {
            LLMProvider::OpenRouter => self.openrouter_model.clone(),
            LLMProvider::Gemini => self.gemini_model.clone(),
            LLMProvider::Anthropic => self.anthropic_model.clone(),
        }
    }

    /// Layer environment values over the file config. `lookup` is normally
    /// `std::env::var(..).ok()`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("PROFOLIO_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PROFOLIO_PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => warn!("Ignoring invalid PROFOLIO_PORT value {:?}", port),
            }
        }
        if let Some(provider) = lookup("PROFOLIO_LLM_PROVIDER") {
            match parse_provider(&provider) {
                Some(provider) => self.llm_provider = provider,
                None => warn!("Ignoring unknown PROFOLIO_LLM_PROVIDER value {:?}", provider),
            }
        }
        if let Some(model) = lookup("PROFOLIO_LLM_MODEL") {
            match self.llm_provider {
                LLMProvider::OpenRouter => self.openrouter_model = Some(model),
                LLMProvider::Gemini => self.gemini_model = Some(model),
                LLMProvider::Anthropic => self.anthropic_model = Some(model),
            }
        }
        if let Some(dir) = lookup("PROFOLIO_STATIC_DIR") {
            self.static_dir = Some(dir);
        }
        if let Some(dir) = lookup("PROFOLIO_LOG_DIR") {
            self.log_dir = Some(dir);
        }
        if let Some(url) = lookup("SUPABASE_URL") {
            self.datastore_url = Some(url);
        }
        if let Some(key) = lookup("SUPABASE_SERVICE_KEY") {
            self.service_key = Some(key);
        }
        if let Some(key) = lookup(self.llm_provider.api_key_var()) {
            self.llm_api_key = Some(key);
        }
    }

    /// Backend URL and service key, required outside development mode
    pub fn backend(&self) -> ProfolioResult<(&str, &str)> {
        match (self.datastore_url.as_deref(), self.service_key.as_deref()) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => Ok((url, key)),
            _ => Err(ProfolioError::Config(
                "SUPABASE_URL and SUPABASE_SERVICE_KEY must be set unless running with --dev".to_string(),
            )),
        }
    }
}

pub struct ConfigManager {
    config_file: String,
}

impl ConfigManager {
    pub fn new(config_file: &str) -> Self {
        Self {
            config_file: config_file.to_string(),
        }
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    pub fn load_config(&self) -> ProfolioResult<AppConfig> {
        let config_path = Path::new(&self.config_file);

        // If the file doesn't exist, return the default config
        if !config_path.exists() {
            info!("No config file at {}, using defaults", self.config_file);
            return Ok(AppConfig::default());
        }

        let config_str = fs::read_to_string(config_path)
            .map_err(|e| ProfolioError::Config(format!("Failed to read {}: {}", self.config_file, e)))?;
        Ok(serde_json::from_str(&config_str)?)
    }

    /// Write the config as JSON; secrets never reach the file
    pub fn save_config(&self, config: &AppConfig) -> ProfolioResult<()> {
        let config_str = serde_json::to_string_pretty(config)?;

        if let Some(parent) = Path::new(&self.config_file).parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ProfolioError::Config(format!("Failed to create {}: {}", parent.display(), e)))?;
        }

        fs::write(&self.config_file, config_str)
            .map_err(|e| ProfolioError::Config(format!("Failed to write {}: {}", self.config_file, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::new(dir.path().join(CONFIG_FILE).to_str().unwrap());

        let config = manager.load_config().unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_save_then_load_skips_secrets() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let manager = ConfigManager::new(path.to_str().unwrap());

        let config = AppConfig {
            port: 9000,
            llm_provider: LLMProvider::Gemini,
            gemini_model: Some("gemini-1.5-pro".to_string()),
            service_key: Some("secret".to_string()),
            prompts: PromptOverrides {
                technique_detail_system_prompt: Some("Be brief.".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        manager.save_config(&config).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(!written.contains("secret"));

        let loaded = ConfigManager::new(path.to_str().unwrap()).load_config().unwrap();
        assert_eq!(loaded.port, 9000);
        assert_eq!(loaded.model().as_deref(), Some("gemini-1.5-pro"));
        assert_eq!(loaded.service_key, None);
        assert_eq!(loaded.prompts.technique_detail_system_prompt.as_deref(), Some("Be brief."));
    }

    #[test]
    fn test_write_back_effective_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{ "host": "0.0.0.0" }"#).unwrap();
        let manager = ConfigManager::new(path.to_str().unwrap());

        let mut config = manager.load_config().unwrap();
        config.apply_env_overrides(|name| match name {
            "PROFOLIO_PORT" => Some("7070".to_string()),
            "SUPABASE_SERVICE_KEY" => Some("service".to_string()),
            _ => None,
        });
        manager.save_config(&config).unwrap();

        let reloaded = manager.load_config().unwrap();
        assert_eq!(reloaded.host, "0.0.0.0");
        assert_eq!(reloaded.port, 7070);
        assert_eq!(reloaded.service_key, None);
        assert_eq!(manager.config_file(), path.to_str().unwrap());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{ "port": 3000 }"#).unwrap();

        let config = ConfigManager::new(path.to_str().unwrap()).load_config().unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.host, DEFAULT_HOST);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PROFOLIO_PORT", "9090"),
            ("PROFOLIO_LLM_PROVIDER", "Anthropic"),
            ("PROFOLIO_LLM_MODEL", "claude-test"),
            ("SUPABASE_URL", "https://backend.example.com"),
            ("SUPABASE_SERVICE_KEY", "service"),
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("OPENROUTER_API_KEY", "unused"),
        ]);

        let mut config = AppConfig::default();
        config.apply_env_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.port, 9090);
        assert_eq!(config.llm_provider, LLMProvider::Anthropic);
        assert_eq!(config.model().as_deref(), Some("claude-test"));
        assert_eq!(config.llm_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.backend().unwrap(), ("https://backend.example.com", "service"));
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|name| match name {
            "PROFOLIO_PORT" => Some("not-a-port".to_string()),
            "PROFOLIO_LLM_PROVIDER" => Some("mystery".to_string()),
            _ => None,
        });

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.llm_provider, LLMProvider::OpenRouter);
        assert!(matches!(config.backend(), Err(ProfolioError::Config(_))));
    }
}
