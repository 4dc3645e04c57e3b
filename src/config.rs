use thiserror::Error;

/// Shortest accepted token signing secret, in bytes
pub const MIN_SECRET_LEN: usize = 32;

pub const DEFAULT_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub federated: FederatedConfig,
    pub server: ServerConfig,
    pub tokens: TokenConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub data_dir: String,
}

#[derive(Clone)]
pub struct TokenConfig {
    /// HMAC signing secret; never logged
    pub secret: String,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct FederatedConfig {
    /// OAuth client id that ID tokens must be issued for. Federated login
    /// is disabled when unset.
    pub google_client_id: Option<String>,
    pub timeout_seconds: u64,
    pub tokeninfo_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            data_dir: "./data".to_string(),
        }
    }
}

impl Default for FederatedConfig {
    fn default() -> Self {
        Self {
            google_client_id: None,
            timeout_seconds: 10,
            tokeninfo_url: DEFAULT_TOKENINFO_URL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();
        let bind_address = std::env::var("BIND_ADDRESS").unwrap_or(defaults.bind_address);
        let data_dir = std::env::var("DATA_DIR").unwrap_or(defaults.data_dir);

        let secret = std::env::var("TOKEN_SECRET").map_err(|_| ConfigError::Missing("TOKEN_SECRET"))?;

        let google_client_id = std::env::var("GOOGLE_CLIENT_ID")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let tokeninfo_url = std::env::var("GOOGLE_TOKENINFO_URL")
            .unwrap_or_else(|_| DEFAULT_TOKENINFO_URL.to_string());
        let timeout_seconds = std::env::var("HTTP_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        let config = Config {
            federated: FederatedConfig {
                google_client_id,
                timeout_seconds,
                tokeninfo_url,
            },
            server: ServerConfig {
                bind_address,
                data_dir,
            },
            tokens: TokenConfig { secret },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tokens.secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::ValidationError(format!(
                "TOKEN_SECRET must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        if self.federated.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "HTTP_TIMEOUT_SECONDS must be greater than zero".to_string(),
            ));
        }
        if self.federated.google_client_id.is_none() {
            tracing::warn!("GOOGLE_CLIENT_ID is not set; federated login is disabled");
        }

        Ok(())
    }
}

/// Settings for the device-side client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    /// Directory holding the device session store
    pub data_dir: String,
    pub timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8080".to_string(),
            data_dir: "./device".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let api_url = std::env::var("API_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);
        let data_dir = std::env::var("CLIENT_DATA_DIR").unwrap_or(defaults.data_dir);
        let timeout_seconds = std::env::var("REQUEST_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.timeout_seconds);

        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "API_URL must be an http(s) URL, got {api_url:?}"
            )));
        }
        if timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "REQUEST_TIMEOUT_SECONDS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            api_url,
            data_dir,
            timeout_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_load_defaults() {
        temp_env::with_vars(
            [
                ("TOKEN_SECRET", Some(SECRET)),
                ("BIND_ADDRESS", None),
                ("DATA_DIR", None),
                ("GOOGLE_CLIENT_ID", None),
                ("GOOGLE_TOKENINFO_URL", None),
                ("HTTP_TIMEOUT_SECONDS", None),
            ],
            || {
                let config = Config::load().unwrap();
                assert_eq!(config.server.bind_address, "0.0.0.0:8080");
                assert_eq!(config.server.data_dir, "./data");
                assert!(config.federated.google_client_id.is_none());
                assert_eq!(config.federated.tokeninfo_url, DEFAULT_TOKENINFO_URL);
                assert_eq!(config.federated.timeout_seconds, 10);
            },
        );
    }

    #[test]
    fn test_missing_secret_fails() {
        temp_env::with_var_unset("TOKEN_SECRET", || {
            assert!(matches!(
                Config::load(),
                Err(ConfigError::Missing("TOKEN_SECRET"))
            ));
        });
    }

    #[test]
    fn test_short_secret_fails() {
        temp_env::with_var("TOKEN_SECRET", Some("too-short"), || {
            assert!(matches!(
                Config::load(),
                Err(ConfigError::ValidationError(_))
            ));
        });
    }

    #[test]
    fn test_blank_client_id_disables_federation() {
        temp_env::with_vars(
            [
                ("TOKEN_SECRET", Some(SECRET)),
                ("GOOGLE_CLIENT_ID", Some("   ")),
            ],
            || {
                let config = Config::load().unwrap();
                assert!(config.federated.google_client_id.is_none());
            },
        );
    }

    #[test]
    fn test_secret_is_redacted() {
        let tokens = TokenConfig {
            secret: SECRET.to_string(),
        };
        assert!(!format!("{tokens:?}").contains(SECRET));
    }

    #[test]
    fn test_client_config() {
        temp_env::with_vars(
            [
                ("API_URL", Some("https://api.example.com/")),
                ("CLIENT_DATA_DIR", None),
                ("REQUEST_TIMEOUT_SECONDS", Some("3")),
            ],
            || {
                let config = ClientConfig::load().unwrap();
                assert_eq!(config.api_url, "https://api.example.com");
                assert_eq!(config.data_dir, "./device");
                assert_eq!(config.timeout_seconds, 3);
            },
        );

        temp_env::with_var("API_URL", Some("ftp://nope"), || {
            assert!(ClientConfig::load().is_err());
        });
    }
}
