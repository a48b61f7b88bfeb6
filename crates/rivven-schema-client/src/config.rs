//! Client and emulator configuration

use crate::types::CompatibilityLevel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for [`SchemaRegistryClient`](crate::SchemaRegistryClient)
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Registry base URL, e.g. `http://localhost:8081`
    pub url: String,

    /// HTTP basic auth user
    #[serde(default)]
    pub username: Option<String>,

    /// HTTP basic auth password
    #[serde(default)]
    pub password: Option<String>,

    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Cache resolved schemas (default: true)
    #[serde(default = "default_true")]
    pub caching_enabled: bool,

    /// Build codecs eagerly on fetch (default: false)
    #[serde(default)]
    pub codec_creation_enabled: bool,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8081")
    }
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
            timeout_secs: default_timeout_secs(),
            caching_enabled: true,
            codec_creation_enabled: false,
        }
    }

    /// Set basic auth credentials
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_caching(mut self, enabled: bool) -> Self {
        self.caching_enabled = enabled;
        self
    }

    pub fn with_codec_creation(mut self, enabled: bool) -> Self {
        self.codec_creation_enabled = enabled;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("caching_enabled", &self.caching_enabled)
            .field("codec_creation_enabled", &self.codec_creation_enabled)
            .finish()
    }
}

/// Configuration for the reference catalog HTTP emulator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmulatorConfig {
    /// Bind host (default: 0.0.0.0)
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port (default: 8081)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Global compatibility level reported by `GET /config`
    #[serde(default)]
    pub compatibility: CompatibilityLevel,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            compatibility: CompatibilityLevel::default(),
        }
    }
}

impl EmulatorConfig {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set compatibility level
    pub fn with_compatibility(mut self, level: CompatibilityLevel) -> Self {
        self.compatibility = level;
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_defaults() {
        let config = ClientConfig::new("http://registry:8081");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.caching_enabled);
        assert!(!config.codec_creation_enabled);
        assert!(config.username.is_none());
    }

    #[test]
    fn test_client_config_from_json() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"url": "http://r:8081", "codec_creation_enabled": true}"#)
                .unwrap();
        assert_eq!(config.url, "http://r:8081");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.caching_enabled);
        assert!(config.codec_creation_enabled);
    }

    #[test]
    fn test_client_builders() {
        let config = ClientConfig::new("http://r:8081")
            .with_timeout_secs(5)
            .with_caching(false)
            .with_codec_creation(true);
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert!(!config.caching_enabled);
        assert!(config.codec_creation_enabled);
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = ClientConfig::new("http://r").with_credentials("alice", "s3cret");
        let debug = format!("{:?}", config);
        assert!(debug.contains("alice"));
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_emulator_defaults() {
        let config = EmulatorConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8081");
        assert_eq!(config.compatibility, CompatibilityLevel::Backward);

        let config = EmulatorConfig::default()
            .with_host("127.0.0.1")
            .with_port(0)
            .with_compatibility(CompatibilityLevel::Full);
        assert_eq!(config.bind_address(), "127.0.0.1:0");
        assert_eq!(config.compatibility, CompatibilityLevel::Full);
    }
}
