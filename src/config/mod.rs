//! # Configuration Management
//!
//! Loads `AppConfig` from defaults, an optional file, and `GATEWAY_`-prefixed
//! environment variables (spec.md §6).

pub mod settings;

pub use settings::{
    AppConfig, BackendConfig, ConfigStoreSettings, EnumServiceConfig, GlobalsConfig, ObservabilityConfig,
    ServerConfig,
};

use crate::errors::{GatewayError, Result};
use config::{Config, Environment, File};
use std::path::Path;

/// `ENV` and `SERVICE` (spec.md §6): required bare environment variables,
/// checked before the layered `config` crate loader runs at all. Their
/// absence is a fail-fast startup error (spec.md §6 exit codes), not a
/// missing-config-leaf the loader could paper over with a default.
pub struct RequiredEnv {
    pub env: String,
    pub service: String,
}

pub fn read_required_env() -> Result<RequiredEnv> {
    let env = std::env::var("ENV")
        .map_err(|_| GatewayError::config_missing("required environment variable ENV is not set"))?;
    let service = std::env::var("SERVICE")
        .map_err(|_| GatewayError::config_missing("required environment variable SERVICE is not set"))?;
    Ok(RequiredEnv { env, service })
}

/// Load configuration in the order: defaults → file (if given) →
/// `GATEWAY_`-prefixed environment variables (later sources win).
pub fn load_config<P: AsRef<Path>>(config_path: Option<P>) -> Result<AppConfig> {
    let mut builder = Config::builder();
    builder = builder.add_source(Config::try_from(&AppConfig::default())?);

    if let Some(path) = config_path {
        let path = path.as_ref();
        if path.exists() {
            builder = builder.add_source(File::from(path));
        } else {
            return Err(GatewayError::config_missing(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }
    }

    builder =
        builder.add_source(Environment::with_prefix("GATEWAY").separator("_").try_parsing(true));

    let config = builder.build()?;
    let app_config: AppConfig = config.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}

pub fn load_config_from_env() -> Result<AppConfig> {
    load_config::<&str>(None)
}

pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    load_config(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn load_default_config() {
        let config = load_config_from_env().unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn env_var_overrides_default() {
        env::set_var("GATEWAY_SERVER_PORT", "9191");
        let config = load_config_from_env().unwrap();
        assert_eq!(config.server.port, 9191);
        env::remove_var("GATEWAY_SERVER_PORT");
    }

    #[test]
    fn file_overrides_default_and_env_overrides_file() {
        let yaml = "server:\n  host: \"127.0.0.1\"\n  port: 8181\n";
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        env::set_var("GATEWAY_SERVER_PORT", "7171");
        let config = load_config_from_file(file.path()).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 7171);
        env::remove_var("GATEWAY_SERVER_PORT");
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = load_config_from_file("/nonexistent/gateway.yaml");
        assert!(result.is_err());
    }

    #[test]
    fn required_env_fails_closed_when_unset() {
        env::remove_var("ENV");
        env::remove_var("SERVICE");
        assert!(read_required_env().is_err());

        env::set_var("ENV", "staging");
        env::set_var("SERVICE", "gateway");
        let required = read_required_env().unwrap();
        assert_eq!(required.env, "staging");
        assert_eq!(required.service, "gateway");
        env::remove_var("ENV");
        env::remove_var("SERVICE");
    }
}
