use crate::error::{ProxyError, Result};
use crate::providers::ProviderPreset;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    pub provider: ProviderConfig,
    #[serde(default)]
    pub params: ParamsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
}

/// Fixed sampling parameters sent with every upstream request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamsConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

impl Default for ParamsConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_port() -> u16 {
    8888
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f64 {
    0.7
}

const FALLBACK_API_KEY_ENV: &str = "API_KEY";

/// Everything the chat handler needs to reach the upstream, resolved once at
/// startup and injected into `CompletionProxy`.
#[derive(Clone)]
pub struct UpstreamSettings {
    /// Full Chat Completions URL.
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl fmt::Debug for UpstreamSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamSettings")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl ProxyConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProxyError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Search standard locations for a config file.
    /// Priority: CLI arg > CWD > XDG config > home dir
    pub fn find_and_load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::load(path);
        }

        let candidates = config_search_paths();
        for candidate in &candidates {
            if candidate.exists() {
                tracing::info!(path = %candidate.display(), "Loading config");
                return Self::load(candidate);
            }
        }

        Err(ProxyError::config(format!(
            "No config file found. Searched: {}. Create one from chat-proxy.example.toml",
            candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }

    /// Resolve the effective base URL (config override or provider preset default)
    pub fn effective_base_url(&self) -> Result<String> {
        if let Some(ref url) = self.provider.base_url {
            return Ok(url.clone());
        }

        let preset = ProviderPreset::from_name(&self.provider.name).ok_or_else(|| {
            ProxyError::config(format!(
                "Unknown provider '{}' and no base_url configured. Known providers: {}",
                self.provider.name,
                ProviderPreset::names()
            ))
        })?;

        Ok(preset.base_url.to_string())
    }

    /// Name of the environment variable holding the API key: explicit setting,
    /// then the provider preset's default, then `API_KEY`.
    pub fn effective_api_key_env(&self) -> String {
        if let Some(ref var) = self.provider.api_key_env {
            return var.clone();
        }

        ProviderPreset::from_name(&self.provider.name)
            .map_or(FALLBACK_API_KEY_ENV, |p| p.default_api_key_env)
            .to_string()
    }

    /// Resolve the API key from the configured environment variable
    pub fn resolve_api_key(&self) -> Result<String> {
        let var = self.effective_api_key_env();
        match std::env::var(&var) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ProxyError::config(format!(
                "Environment variable '{var}' not set. Set it with your provider API key."
            ))),
        }
    }

    /// Chat Completions URL for the configured provider.
    pub fn completions_endpoint(&self) -> Result<String> {
        let base_url = self.effective_base_url()?;
        Ok(format!("{}/chat/completions", base_url.trim_end_matches('/')))
    }

    /// Resolve everything the handler needs, reading the API key from the environment.
    pub fn upstream_settings(&self) -> Result<UpstreamSettings> {
        let endpoint = self.completions_endpoint()?;
        let api_key = self.resolve_api_key()?;
        Ok(self.upstream_settings_with_key(endpoint, api_key))
    }

    fn upstream_settings_with_key(&self, endpoint: String, api_key: String) -> UpstreamSettings {
        UpstreamSettings {
            endpoint,
            api_key,
            model: self.provider.model.clone(),
            max_tokens: self.params.max_tokens,
            temperature: self.params.temperature,
        }
    }
}

/// Config file locations checked by `find_and_load`, in priority order.
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // CWD
    paths.push(PathBuf::from("chat-proxy.toml"));

    // XDG / platform config dir
    if cfg!(target_os = "macos") {
        if let Some(home) = dirs_path() {
            paths.push(
                home.join("Library")
                    .join("Application Support")
                    .join("chat-proxy")
                    .join("config.toml"),
            );
        }
    } else {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg).join("chat-proxy").join("config.toml"));
        }
        if let Some(home) = dirs_path() {
            paths.push(home.join(".config").join("chat-proxy").join("config.toml"));
        }
    }

    // Home directory fallback
    if let Some(home) = dirs_path() {
        paths.push(home.join(".chat-proxy.toml"));
    }

    paths
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}
