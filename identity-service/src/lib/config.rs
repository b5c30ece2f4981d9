use std::env;
use std::time::Duration;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub sessions: SessionsConfig,
    pub bootstrap: Option<BootstrapConfig>,
    #[serde(default)]
    pub run_mode: RunMode,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiration_hours", &self.expiration_hours)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionsConfig {
    pub cleanup_interval_secs: u64,
}

impl SessionsConfig {
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

/// Administrator account created at startup when no user holds its email.
#[derive(Deserialize, Clone)]
pub struct BootstrapConfig {
    pub admin_username: String,
    #[serde(default = "BootstrapConfig::default_full_name")]
    pub admin_full_name: String,
    pub admin_email: String,
    pub admin_password: String,
}

impl BootstrapConfig {
    fn default_full_name() -> String {
        "Administrator".to_string()
    }
}

impl std::fmt::Debug for BootstrapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapConfig")
            .field("admin_username", &self.admin_username)
            .field("admin_email", &self.admin_email)
            .field("admin_password", &"<redacted>")
            .finish()
    }
}

/// Deployment mode, selected by `RUN_MODE`.
///
/// Production hides the message of internal errors from clients.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Development,
    Production,
    Test,
}

impl RunMode {
    pub fn is_production(self) -> bool {
        self == RunMode::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Development => "development",
            RunMode::Production => "production",
            RunMode::Test => "test",
        }
    }
}

impl Config {
    const MIN_SECRET_LENGTH: usize = auth::JwtHandler::MIN_SECRET_LENGTH;

    /// Secret committed in `config/development.toml`.
    pub const DEVELOPMENT_JWT_SECRET: &'static str = "development-only-secret-change-me-please";

    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__SECRET, etc.)
    /// 2. Environment-specific config file (config/{RUN_MODE}.toml)
    /// 3. Default config file (config/default.toml)
    ///
    /// Only the development and test files carry a JWT secret, so any other
    /// run mode fails here unless `JWT__SECRET` is set.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        Self::load_from("config", &run_mode)
    }

    /// Load from `{config_dir}/default` and `{config_dir}/{run_mode}`, then the environment.
    pub fn load_from(config_dir: &str, run_mode: &str) -> Result<Self, ConfigError> {
        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(false))
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            // DATABASE__URL=postgres://... overrides database.url
            .add_source(Environment::with_prefix("").separator("__"))
            .set_override("run_mode", run_mode)?
            .build()?;

        configuration.try_deserialize()
    }

    /// Reject values that would only fail later at runtime.
    ///
    /// # Errors
    /// * `Message` - Short or committed JWT secret in production, non-positive token lifetime,
    ///   empty pool or zero sweep interval
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.len() < Self::MIN_SECRET_LENGTH {
            return Err(ConfigError::Message(format!(
                "jwt.secret must be at least {} characters",
                Self::MIN_SECRET_LENGTH
            )));
        }
        if self.run_mode.is_production() && self.jwt.secret == Self::DEVELOPMENT_JWT_SECRET {
            return Err(ConfigError::Message(
                "jwt.secret is the development secret; set JWT__SECRET".to_string(),
            ));
        }
        if self.jwt.expiration_hours <= 0 {
            return Err(ConfigError::Message(
                "jwt.expiration_hours must be positive".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Message(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.sessions.cleanup_interval_secs == 0 {
            return Err(ConfigError::Message(
                "sessions.cleanup_interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.http_port)
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                http_port: 3000,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/identity".to_string(),
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: "s".repeat(32),
                expiration_hours: 168,
            },
            sessions: SessionsConfig {
                cleanup_interval_secs: 3600,
            },
            bootstrap: None,
            run_mode: RunMode::Test,
        }
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(config().validate().is_ok());
        assert_eq!(config().listen_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_validate_rejects_short_secret() {
        let mut config = config();
        config.jwt.secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut no_pool = config();
        no_pool.database.max_connections = 0;
        assert!(no_pool.validate().is_err());

        let mut no_sweep = config();
        no_sweep.sessions.cleanup_interval_secs = 0;
        assert!(no_sweep.validate().is_err());
    }

    #[test]
    fn test_jwt_secret_not_printed() {
        let printed = format!("{:?}", config().jwt);
        assert!(!printed.contains("ssss"));
    }

    #[test]
    fn test_run_mode_parses_lowercase() {
        let mode: RunMode = serde_json::from_str(r#""production""#).unwrap();
        assert!(mode.is_production());
        assert!(!RunMode::default().is_production());
    }

    #[test]
    fn test_validate_rejects_development_secret_in_production() {
        let mut config = config();
        config.jwt.secret = Config::DEVELOPMENT_JWT_SECRET.to_string();
        assert!(config.validate().is_ok());

        config.run_mode = RunMode::Production;
        let error = config.validate().unwrap_err();
        assert!(error.to_string().contains("JWT__SECRET"));
    }

    #[test]
    fn test_only_local_run_modes_ship_a_secret() {
        let development = Config::load_from("config", "development").unwrap();
        assert_eq!(development.run_mode, RunMode::Development);
        assert_eq!(development.jwt.secret, Config::DEVELOPMENT_JWT_SECRET);
        assert!(development.validate().is_ok());

        let test = Config::load_from("config", "test").unwrap();
        assert!(test.validate().is_ok());

        if env::var("JWT__SECRET").is_err() {
            let error = Config::load_from("config", "production").unwrap_err();
            assert!(error.to_string().contains("secret"), "{}", error);
        }
    }

    #[test]
    fn test_bootstrap_section_is_optional() {
        let without: Config = ConfigBuilder::builder()
            .add_source(File::from_str(MINIMAL, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert!(without.bootstrap.is_none());

        let with: Config = ConfigBuilder::builder()
            .add_source(File::from_str(MINIMAL, FileFormat::Toml))
            .add_source(File::from_str(
                "[bootstrap]\nadmin_username = \"root\"\nadmin_email = \"root@example.com\"\nadmin_password = \"hunter22\"\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        let bootstrap = with.bootstrap.unwrap();
        assert_eq!(bootstrap.admin_full_name, "Administrator");
        assert!(!format!("{:?}", bootstrap).contains("hunter22"));
    }

    const MINIMAL: &str = r#"
        [server]
        host = "127.0.0.1"
        http_port = 3000

        [database]
        url = "postgres://localhost/identity"
        max_connections = 1

        [jwt]
        secret = "0123456789abcdef0123456789abcdef"
        expiration_hours = 1

        [sessions]
        cleanup_interval_secs = 60
    "#;
}
