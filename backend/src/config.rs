//! # Server configuration
//!
//! Settings come from an optional YAML file named by `TUTOR_CONFIG`, then
//! individual environment variables override single fields:
//!
//! ```yaml
//! bind_addr: "127.0.0.1:3000"
//! cors_origin: "http://localhost:5173"
//! mock_latency_ms: 300
//! sample_data: true
//! messaging:
//!   timeout_secs: 30
//!   whatsapp:
//!     phone_number_id: "1234567890"
//!     access_token: "EAAG..."
//!     verify_token: "my-verify-token"
//!   wechat:
//!     app_id: "wx..."
//!     app_secret: "..."
//!     invoice_template_id: "..."
//! ```
//!
//! Credentials are passed through as given.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::domain::messaging::MessagingConfig;

pub const CONFIG_PATH_VAR: &str = "TUTOR_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub cors_origin: String,
    /// Simulated round-trip delay of the in-memory store
    pub mock_latency_ms: u64,
    /// Seed the store with development records at startup
    pub sample_data: bool,
    pub messaging: MessagingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            cors_origin: "http://localhost:5173".to_string(),
            mock_latency_ms: 300,
            sample_data: true,
            messaging: MessagingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `TUTOR_CONFIG` (when set) and the process environment
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) if !path.is_empty() => Self::from_file(Path::new(&path))?,
            _ => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let yaml = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_yaml::from_str(&yaml)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Override fields from variables found by `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = var("TUTOR_BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(v) = var("TUTOR_CORS_ORIGIN") {
            self.cors_origin = v;
        }
        if let Some(v) = var("TUTOR_MOCK_LATENCY_MS") {
            self.mock_latency_ms = v
                .parse()
                .with_context(|| format!("TUTOR_MOCK_LATENCY_MS is not a number: {}", v))?;
        }
        if let Some(v) = var("TUTOR_SAMPLE_DATA") {
            self.sample_data = parse_flag(&v)
                .with_context(|| format!("TUTOR_SAMPLE_DATA is not a boolean: {}", v))?;
        }
        if let Some(v) = var("MESSAGING_TIMEOUT_SECS") {
            self.messaging.timeout_secs = v
                .parse()
                .with_context(|| format!("MESSAGING_TIMEOUT_SECS is not a number: {}", v))?;
        }

        let whatsapp = &mut self.messaging.whatsapp;
        for (key, field) in [
            ("WHATSAPP_API_BASE", &mut whatsapp.api_base),
            ("WHATSAPP_PHONE_NUMBER_ID", &mut whatsapp.phone_number_id),
            ("WHATSAPP_ACCESS_TOKEN", &mut whatsapp.access_token),
            ("WHATSAPP_VERIFY_TOKEN", &mut whatsapp.verify_token),
            ("WHATSAPP_DEFAULT_COUNTRY_CODE", &mut whatsapp.default_country_code),
        ] {
            if let Some(v) = var(key) {
                debug!("{} set from environment", key);
                *field = v;
            }
        }

        let wechat = &mut self.messaging.wechat;
        for (key, field) in [
            ("WECHAT_API_BASE", &mut wechat.api_base),
            ("WECHAT_APP_ID", &mut wechat.app_id),
            ("WECHAT_APP_SECRET", &mut wechat.app_secret),
            ("WECHAT_INVOICE_TEMPLATE_ID", &mut wechat.invoice_template_id),
            ("WECHAT_REMINDER_TEMPLATE_ID", &mut wechat.reminder_template_id),
        ] {
            if let Some(v) = var(key) {
                debug!("{} set from environment", key);
                *field = v;
            }
        }

        Ok(())
    }

    pub fn mock_latency(&self) -> Duration {
        Duration::from_millis(self.mock_latency_ms)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "bind_addr: \"0.0.0.0:8080\"\nmessaging:\n  whatsapp:\n    phone_number_id: \"555\"\n"
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.messaging.whatsapp.phone_number_id, "555");
        assert_eq!(config.messaging.whatsapp.default_country_code, "27");
        assert_eq!(config.messaging.timeout_secs, 30);
        assert!(config.sample_data);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "mock_latency_ms: [not, a, number]").unwrap();
        assert!(AppConfig::from_file(file.path()).is_err());
        assert!(AppConfig::from_file(Path::new("/definitely/missing.yaml")).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("TUTOR_MOCK_LATENCY_MS", "0"),
            ("TUTOR_SAMPLE_DATA", "false"),
            ("WHATSAPP_ACCESS_TOKEN", "token-123"),
            ("WECHAT_APP_ID", "wx42"),
            ("MESSAGING_TIMEOUT_SECS", "5"),
            ("TUTOR_CORS_ORIGIN", ""),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_env_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.mock_latency(), Duration::ZERO);
        assert!(!config.sample_data);
        assert_eq!(config.messaging.whatsapp.access_token, "token-123");
        assert_eq!(config.messaging.wechat.app_id, "wx42");
        assert_eq!(config.messaging.timeout_secs, 5);
        assert_eq!(config.cors_origin, "http://localhost:5173");
    }

    #[test]
    fn test_bad_env_value_is_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_env_overrides(|key| {
            (key == "TUTOR_MOCK_LATENCY_MS").then(|| "fast".to_string())
        });
        assert!(result.is_err());
    }
}
