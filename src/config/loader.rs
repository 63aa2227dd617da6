//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::PortalConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding the user database connection string.
pub const DATABASE_URL_ENV_VAR: &str = "DATABASE_URL";
/// Environment variable holding the JWT signing secret.
pub const JWT_SECRET_ENV_VAR: &str = "JWT_SECRET";
/// Environment variable holding the pinning service credential.
pub const PINATA_JWT_ENV_VAR: &str = "PINATA_JWT";
/// Environment variable holding the chain provider project id.
pub const BLOCKFROST_PROJECT_ID_ENV_VAR: &str = "BLOCKFROST_PROJECT_ID";
/// Environment variable overriding the listener bind address.
pub const BIND_ADDRESS_ENV_VAR: &str = "PORTAL_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, apply environment overrides and validate a TOML configuration file.
pub fn load_config(path: &Path) -> Result<PortalConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: PortalConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load configuration from defaults plus environment only.
pub fn load_from_env() -> Result<PortalConfig, ConfigError> {
    let mut config = PortalConfig::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay secrets and deployment values from the environment.
///
/// The lookup is injected so tests never touch process-wide state.
pub fn apply_env_overrides<F>(config: &mut PortalConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(DATABASE_URL_ENV_VAR) {
        config.database.url = url;
    }
    if let Some(secret) = lookup(JWT_SECRET_ENV_VAR) {
        config.auth.jwt_secret = secret;
    }
    if let Some(jwt) = lookup(PINATA_JWT_ENV_VAR) {
        config.pinning.jwt = jwt;
    }
    if let Some(project_id) = lookup(BLOCKFROST_PROJECT_ID_ENV_VAR) {
        config.chain.project_id = project_id;
    }
    if let Some(bind) = lookup(BIND_ADDRESS_ENV_VAR) {
        config.server.bind_address = bind;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (DATABASE_URL_ENV_VAR, "postgres://localhost/portal"),
            (JWT_SECRET_ENV_VAR, "secret"),
            (BIND_ADDRESS_ENV_VAR, "127.0.0.1:9999"),
        ]);
        let mut config = PortalConfig::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.database.url, "postgres://localhost/portal");
        assert_eq!(config.auth.jwt_secret, "secret");
        assert_eq!(config.server.bind_address, "127.0.0.1:9999");
        assert!(config.pinning.jwt.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config(Path::new("does-not-exist.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_invalid_file() {
        let path = std::env::temp_dir().join("cardano_portal_invalid_config.toml");
        fs::write(&path, "[auth]\ntoken_ttl_secs = 0\n").unwrap();

        let result = load_config(&path);
        fs::remove_file(&path).unwrap_or_default();

        let err = result.unwrap_err();
        assert!(err.to_string().contains("auth.token_ttl_secs"));
    }
}
