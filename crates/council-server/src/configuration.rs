use anyhow::Context;
use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use council::providers::base::ProviderConfig;

const DEFAULT_SECRETS_FILE: &str = "secrets.json";

/// Server settings, overridable through `COUNCIL_SERVER__HOST` and
/// `COUNCIL_SERVER__PORT`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8077)?
            .add_source(
                Environment::with_prefix("COUNCIL_SERVER")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Load per-provider credentials from the secrets file, a JSON array of
/// `{provider, apiKey, model?, host?}` records. The path comes from
/// `COUNCIL_SECRETS_FILE` when set.
pub fn load_provider_configs() -> anyhow::Result<Vec<ProviderConfig>> {
    let path = std::env::var("COUNCIL_SECRETS_FILE")
        .unwrap_or_else(|_| DEFAULT_SECRETS_FILE.to_string());
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read secrets file at {path}"))?;
    let configs: Vec<ProviderConfig> = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse secrets file at {path}"))?;
    Ok(configs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::new().unwrap();
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 8077);
        assert_eq!(settings.socket_addr(), "127.0.0.1:8077");
    }

    #[test]
    fn test_secrets_file_parses_camel_case_records() {
        let dir = std::env::temp_dir().join(format!("council-secrets-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("secrets.json");
        std::fs::write(
            &path,
            r#"[{"provider": "openai", "apiKey": "sk-test", "model": "gpt-4o"}]"#,
        )
        .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let configs: Vec<ProviderConfig> = serde_json::from_str(&contents).unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].provider, "openai");
        assert_eq!(configs[0].api_key, "sk-test");
        assert_eq!(configs[0].model.as_deref(), Some("gpt-4o"));
    }
}
