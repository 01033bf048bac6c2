use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::lifecycle::{TransitionPolicy, DEFAULT_EXPIRING_SOON_DAYS};

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub jwt_secret: String,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_expiring_soon_days")]
    pub expiring_soon_days: i64,

    #[serde(default = "default_true")]
    pub allow_reactivate_terminated: bool,

    #[serde(default)]
    pub allow_reactivate_expired: bool,

    #[serde(default = "default_bill_due_days")]
    pub bill_due_days: i64,

    /// 0 disables the background sweep.
    #[serde(default)]
    pub sweep_interval_seconds: u64,

    #[serde(default = "default_true")]
    pub auto_create_schema: bool,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    database_url: Option<String>,
    jwt_secret: Option<String>,
    listen_addr: Option<String>,
    log_dir: Option<String>,
    max_connections: Option<u32>,
    expiring_soon_days: Option<i64>,
    allow_reactivate_terminated: Option<bool>,
    allow_reactivate_expired: Option<bool>,
    bill_due_days: Option<i64>,
    sweep_interval_seconds: Option<u64>,
    auto_create_schema: Option<bool>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_expiring_soon_days() -> i64 {
    DEFAULT_EXPIRING_SOON_DAYS
}

fn default_bill_due_days() -> i64 {
    7
}

fn default_true() -> bool {
    true
}

impl ServerConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        let file_config = match config_path {
            Some(path_str) => read_file_config(Path::new(path_str))?,
            None => PartialServerConfig::default(),
        };

        let env_config: PartialServerConfig = envy::from_env::<PartialServerConfig>()
            .map_err(|e| format!("Failed to load config from environment: {e}"))?;

        Self::merge(env_config, file_config)
    }

    /// Environment values win over file values; defaults fill the rest.
    fn merge(env_config: PartialServerConfig, file_config: PartialServerConfig) -> Result<Self, String> {
        let config = ServerConfig {
            database_url: env_config
                .database_url
                .or(file_config.database_url)
                .ok_or("DATABASE_URL is required")?,
            jwt_secret: env_config
                .jwt_secret
                .or(file_config.jwt_secret)
                .ok_or("JWT_SECRET is required")?,
            listen_addr: env_config
                .listen_addr
                .or(file_config.listen_addr)
                .unwrap_or_else(default_listen_addr),
            log_dir: env_config.log_dir.or(file_config.log_dir).unwrap_or_else(default_log_dir),
            max_connections: env_config
                .max_connections
                .or(file_config.max_connections)
                .unwrap_or_else(default_max_connections),
            expiring_soon_days: env_config
                .expiring_soon_days
                .or(file_config.expiring_soon_days)
                .unwrap_or_else(default_expiring_soon_days),
            allow_reactivate_terminated: env_config
                .allow_reactivate_terminated
                .or(file_config.allow_reactivate_terminated)
                .unwrap_or(true),
            allow_reactivate_expired: env_config
                .allow_reactivate_expired
                .or(file_config.allow_reactivate_expired)
                .unwrap_or(false),
            bill_due_days: env_config
                .bill_due_days
                .or(file_config.bill_due_days)
                .unwrap_or_else(default_bill_due_days),
            sweep_interval_seconds: env_config
                .sweep_interval_seconds
                .or(file_config.sweep_interval_seconds)
                .unwrap_or(0),
            auto_create_schema: env_config
                .auto_create_schema
                .or(file_config.auto_create_schema)
                .unwrap_or(true),
        };

        if config.expiring_soon_days < 0 {
            return Err("EXPIRING_SOON_DAYS must not be negative".to_string());
        }
        if config.bill_due_days < 0 {
            return Err("BILL_DUE_DAYS must not be negative".to_string());
        }
        Ok(config)
    }

    pub fn transition_policy(&self) -> TransitionPolicy {
        TransitionPolicy {
            allow_reactivate_terminated: self.allow_reactivate_terminated,
            allow_reactivate_expired: self.allow_reactivate_expired,
        }
    }
}

fn read_file_config(path: &Path) -> Result<PartialServerConfig, String> {
    if !path.exists() {
        return Ok(PartialServerConfig::default());
    }
    let contents =
        fs::read_to_string(path).map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
    toml::from_str(&contents).map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial(toml_text: &str) -> PartialServerConfig {
        toml::from_str(toml_text).unwrap()
    }

    #[test]
    fn defaults_fill_missing_values() {
        let file = partial(
            r#"
            database_url = "postgres://localhost/rooms"
            jwt_secret = "secret"
            "#,
        );
        let config = ServerConfig::merge(PartialServerConfig::default(), file).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.expiring_soon_days, 30);
        assert_eq!(config.bill_due_days, 7);
        assert_eq!(config.sweep_interval_seconds, 0);
        assert!(config.auto_create_schema);
        assert_eq!(config.transition_policy(), TransitionPolicy::default());
    }

    #[test]
    fn environment_overrides_file() {
        let file = partial(
            r#"
            database_url = "postgres://file/rooms"
            jwt_secret = "file-secret"
            expiring_soon_days = 14
            allow_reactivate_expired = false
            "#,
        );
        let env = PartialServerConfig {
            database_url: Some("postgres://env/rooms".into()),
            allow_reactivate_expired: Some(true),
            ..Default::default()
        };
        let config = ServerConfig::merge(env, file).unwrap();
        assert_eq!(config.database_url, "postgres://env/rooms");
        assert_eq!(config.jwt_secret, "file-secret");
        assert_eq!(config.expiring_soon_days, 14);
        assert!(config.transition_policy().allow_reactivate_expired);
    }

    #[test]
    fn required_values_are_enforced() {
        let err = ServerConfig::merge(PartialServerConfig::default(), PartialServerConfig::default()).unwrap_err();
        assert!(err.contains("DATABASE_URL"));

        let file = partial(
            r#"
            database_url = "postgres://localhost/rooms"
            jwt_secret = "secret"
            bill_due_days = -1
            "#,
        );
        assert!(ServerConfig::merge(PartialServerConfig::default(), file).is_err());
    }

    #[test]
    fn missing_config_file_is_not_an_error() {
        let cfg = read_file_config(Path::new("/definitely/not/here.toml")).unwrap();
        assert!(cfg.database_url.is_none());
    }
}
