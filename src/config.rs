use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::gateway::GatewayConfig;

/// Application-level constants
pub const APP_NAME: &str = "Medikal";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Chat-completion endpoint used when `OPENROUTER_URL` is not set.
pub const DEFAULT_COMPLETION_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Free models tried in order when no specific model is requested.
pub const DEFAULT_CANDIDATE_MODELS: &[&str] = &[
    "openai/gpt-oss-120b:free",
    "z-ai/glm-4.5-air:free",
    "moonshotai/kimi-k2:free",
    "qwen/qwen3-coder:free",
    "nvidia/nemotron-nano-9b-v2:free",
];

/// Per-attempt timeout against the completion endpoint.
pub const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 45;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8001";

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "medikal=info,tower_http=info"
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Cannot determine a data directory; set MEDIKAL_DB_PATH")]
    NoDataDir,
}

/// Outbound completion endpoint settings.
#[derive(Debug, Clone)]
pub struct CompletionEndpoint {
    pub url: String,
    pub timeout: Duration,
    pub referer: String,
    pub title: String,
}

impl Default for CompletionEndpoint {
    fn default() -> Self {
        Self {
            url: DEFAULT_COMPLETION_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_COMPLETION_TIMEOUT_SECS),
            referer: "https://medikal.health".to_string(),
            title: "Medikal Healthcare System".to_string(),
        }
    }
}

/// Everything the server needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub cors_origins: Vec<String>,
    pub endpoint: CompletionEndpoint,
    pub gateway: GatewayConfig,
}

impl AppConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_raw = get("MEDIKAL_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: "MEDIKAL_BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let db_path = match get("MEDIKAL_DB_PATH") {
            Some(p) => PathBuf::from(p),
            None => default_db_path()?,
        };

        let mut endpoint = CompletionEndpoint::default();
        if let Some(url) = get("OPENROUTER_URL") {
            endpoint.url = url;
        }
        if let Some(raw) = get("OPENROUTER_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "OPENROUTER_TIMEOUT_SECS",
                value: raw.clone(),
            })?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "OPENROUTER_TIMEOUT_SECS",
                    value: raw,
                });
            }
            endpoint.timeout = Duration::from_secs(secs);
        }

        let mut gateway = GatewayConfig {
            api_key: get("OPENROUTER_API_KEY"),
            ..GatewayConfig::default()
        };
        if let Some(models) = get("OPENROUTER_MODELS") {
            let parsed = split_list(&models);
            if parsed.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "OPENROUTER_MODELS",
                    value: models,
                });
            }
            gateway.candidate_models = parsed;
        }

        let cors_origins = get("MEDIKAL_CORS_ORIGINS")
            .map(|v| split_list(&v))
            .unwrap_or_default();

        Ok(Self {
            bind_addr,
            db_path,
            cors_origins,
            endpoint,
            gateway,
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// `<data_dir>/Medikal/medikal.db`
pub fn default_db_path() -> Result<PathBuf, ConfigError> {
    let base = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
    Ok(base.join(APP_NAME).join("medikal.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let cfg = AppConfig::from_lookup(lookup(&[("MEDIKAL_DB_PATH", "/tmp/m.db")])).unwrap();
        assert_eq!(cfg.bind_addr.port(), 8001);
        assert_eq!(cfg.endpoint.url, DEFAULT_COMPLETION_URL);
        assert_eq!(cfg.endpoint.timeout, Duration::from_secs(45));
        assert!(cfg.gateway.api_key.is_none());
        assert_eq!(cfg.gateway.candidate_models.len(), DEFAULT_CANDIDATE_MODELS.len());
        assert!(cfg.cors_origins.is_empty());
    }

    #[test]
    fn empty_api_key_is_treated_as_absent() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("MEDIKAL_DB_PATH", "/tmp/m.db"),
            ("OPENROUTER_API_KEY", "   "),
        ]))
        .unwrap();
        assert!(cfg.gateway.api_key.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("MEDIKAL_BIND_ADDR", "127.0.0.1:9000"),
            ("MEDIKAL_DB_PATH", "/tmp/m.db"),
            ("OPENROUTER_API_KEY", "sk-test"),
            ("OPENROUTER_MODELS", "a/one, b/two ,"),
            ("OPENROUTER_TIMEOUT_SECS", "5"),
            ("MEDIKAL_CORS_ORIGINS", "https://a.example,https://b.example"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.gateway.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.gateway.candidate_models, vec!["a/one", "b/two"]);
        assert_eq!(cfg.endpoint.timeout, Duration::from_secs(5));
        assert_eq!(cfg.cors_origins.len(), 2);
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("MEDIKAL_DB_PATH", "/tmp/m.db"),
            ("OPENROUTER_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("OPENROUTER_TIMEOUT_SECS"));
    }

    #[test]
    fn invalid_bind_addr_is_rejected() {
        let result = AppConfig::from_lookup(lookup(&[
            ("MEDIKAL_DB_PATH", "/tmp/m.db"),
            ("MEDIKAL_BIND_ADDR", "not-an-addr"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn app_name_is_medikal() {
        assert_eq!(APP_NAME, "Medikal");
    }
}
