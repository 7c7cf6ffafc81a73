//! Config file loading and environment overrides.

use anyhow::{Context, Result};
use grounded_types::models::GatewayConfig;
use std::path::Path;
use tracing::{info, warn};
use validator::Validate;

/// Load the config file at `path`, or defaults when it is absent or not given.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig> {
    let Some(path) = path else {
        info!("[Config] No config file given, using defaults");
        return Ok(GatewayConfig::default());
    };

    if !path.exists() {
        warn!("[Config] {} not found, using defaults", path.display());
        return Ok(GatewayConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: GatewayConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    info!("[Config] Loaded {}", path.display());
    Ok(config)
}

/// Apply environment overrides from a lookup function.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty()) {
        config.gemini.api_key = Some(key);
    }
    if let Some(raw) = lookup("GROUNDED_DEBUG") {
        config.debug = matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
    }
}

/// Full startup sequence: file, environment, CLI port, validation.
pub fn resolve(path: Option<&Path>, port: Option<u16>) -> Result<GatewayConfig> {
    let mut config = load_config(path)?;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    if let Some(port) = port {
        config.port = port;
    }
    config.validate().context("Invalid configuration")?;

    if config.gemini.api_key.is_none() {
        warn!("[Config] No Gemini API key configured; grounded requests will be rejected");
    }
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "test assertions")]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(&dir.path().join("absent.json"))).unwrap();
        assert_eq!(config, GatewayConfig::default());
    }

    #[test]
    fn test_partial_file_is_merged_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"port": 9100, "strict_mode": {{"min_sources": 3}}}}"#).unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.strict_mode.min_sources, 3);
        assert_eq!(config.strict_mode.min_trusted, 1);
        assert_eq!(config.provider_timeout_secs, 60);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = GatewayConfig::default();
        apply_env_overrides(&mut config, env(&[("GEMINI_API_KEY", "AIza-test"), ("GROUNDED_DEBUG", "true")]));
        assert_eq!(config.gemini.api_key.as_deref(), Some("AIza-test"));
        assert!(config.debug);
    }

    #[test]
    fn test_blank_key_ignored() {
        let mut config = GatewayConfig::default();
        config.gemini.api_key = Some("from-file".to_string());
        apply_env_overrides(&mut config, env(&[("GEMINI_API_KEY", "  "), ("GROUNDED_DEBUG", "0")]));
        assert_eq!(config.gemini.api_key.as_deref(), Some("from-file"));
        assert!(!config.debug);
    }

    #[test]
    fn test_invalid_values_abort() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"provider_timeout_secs": 0}}"#).unwrap();
        let err = resolve(Some(file.path()), None).unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"));
    }

    #[test]
    fn test_cli_port_wins() {
        let dir = tempfile::tempdir().unwrap();
        let config = resolve(Some(&dir.path().join("absent.json")), Some(9200)).unwrap();
        assert_eq!(config.port, 9200);
    }
}
