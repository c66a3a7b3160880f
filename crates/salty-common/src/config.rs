//! Configuration objects.
//!
//! Configuration is always passed explicitly: the codecs and the handshake
//! never read the environment. Binaries build a [`ClientConfig`] from an
//! optional JSON file and then apply command-line overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::helpers::decode_key_hex;

/// Default receive timeout for a single handshake step.
pub const DEFAULT_TIMEOUT_MS: u64 = 1_000;

/// Default initial CSN, right below the 32-bit boundary.
pub const DEFAULT_INITIAL_CSN: u64 = (1 << 32) - 1;

/// Default sub-protocol token.
pub const DEFAULT_SUBPROTOCOL: &str = "v1.saltyrtc.org";

/// Logging configuration handed to [`crate::init_tracing`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Include the event target (module path) in output.
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_target: true,
        }
    }
}

/// Client-side settings for connecting to a relay and running the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Relay base URL, e.g. `wss://127.0.0.1:8766`.
    pub url: String,
    /// Per-step receive timeout in milliseconds.
    pub timeout_ms: u64,
    /// Offered sub-protocols, in order of preference.
    pub subprotocols: Vec<String>,
    /// Requested WebSocket ping interval in seconds.
    pub ping_interval: Option<u32>,
    /// Relay permanent public key (hex). Enables `signed_keys` verification.
    pub server_permanent_key: Option<String>,
    /// Send the expected relay permanent key as `your_key` in client-auth.
    pub explicit_permanent_key: bool,
    /// Initial outgoing CSN.
    pub initial_csn: u64,
    pub log: LogConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "wss://127.0.0.1:8766".to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            subprotocols: vec![DEFAULT_SUBPROTOCOL.to_string()],
            ping_interval: None,
            server_permanent_key: None,
            explicit_permanent_key: false,
            initial_csn: DEFAULT_INITIAL_CSN,
            log: LogConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(Error::config("timeout_ms must be greater than zero"));
        }
        if self.subprotocols.is_empty() {
            return Err(Error::config("at least one subprotocol is required"));
        }
        if self.explicit_permanent_key && self.server_permanent_key.is_none() {
            return Err(Error::config(
                "explicit_permanent_key requires server_permanent_key",
            ));
        }
        self.server_permanent_key_bytes()?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Decoded relay permanent key, if configured.
    pub fn server_permanent_key_bytes(&self) -> Result<Option<[u8; 32]>> {
        self.server_permanent_key
            .as_deref()
            .map(decode_key_hex)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(1));
        assert_eq!(config.initial_csn, u32::MAX as u64);
        assert_eq!(config.subprotocols, vec!["v1.saltyrtc.org".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"url": "wss://relay.example:443", "timeout_ms": 250}"#)
                .unwrap();
        assert_eq!(config.url, "wss://relay.example:443");
        assert_eq!(config.timeout(), Duration::from_millis(250));
        assert_eq!(config.log, LogConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_key() {
        let config = ClientConfig {
            server_permanent_key: Some("not-hex".into()),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_validate_explicit_key_needs_key() {
        let config = ClientConfig {
            explicit_permanent_key: true,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("salty-config-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{
                "subprotocols": ["v2.example", "v1.saltyrtc.org"],
                "server_permanent_key": "b452e8a5abf54c5258db323b88d03cb9e002a4a84ba6f37715678901c20411c7",
                "explicit_permanent_key": true,
                "log": {"level": "debug"}
            }"#,
        )
        .unwrap();

        let config = ClientConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.subprotocols.len(), 2);
        assert!(config.server_permanent_key_bytes().unwrap().is_some());
        assert_eq!(config.log.level, "debug");
        assert!(config.log.with_target);
    }
}
