use config::{ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    /// When unset the service keeps everything in memory.
    pub uri: Option<String>,
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    pub secret_key: String,
    pub access_token_expire_minutes: i64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub origins: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.name", "splitledger")?
            .set_default("auth.secret_key", "")?
            .set_default("auth.access_token_expire_minutes", 30)?
            .set_default("cors.origins", vec!["*"])?
            .set_default("log.level", "info")?
            .set_default("log.json", false)?;

        let config_file =
            env::var("SPLITLEDGER_CONFIG").unwrap_or_else(|_| "config/default".to_string());
        builder = builder.add_source(File::with_name(&config_file).required(false));

        builder = builder.add_source(
            Environment::with_prefix("SPLITLEDGER")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("cors.origins")
                .try_parsing(true),
        );

        if let Ok(uri) = env::var("MONGODB_URI") {
            builder = builder.set_override("database.uri", uri)?;
        }
        if let Ok(secret) = env::var("SECRET_KEY") {
            builder = builder.set_override("auth.secret_key", secret)?;
        }
        if let Ok(port) = env::var("PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.auth.secret_key.is_empty() {
            return Err("auth.secret_key must be set (SECRET_KEY)".to_string());
        }
        if self.auth.access_token_expire_minutes <= 0 {
            return Err("auth.access_token_expire_minutes must be positive".to_string());
        }
        if self.cors.origins.is_empty() {
            return Err("cors.origins must name at least one origin".to_string());
        }
        Ok(())
    }

    /// Settings for running against the in-memory store.
    pub fn in_memory(secret_key: &str) -> Self {
        Settings {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                uri: None,
                name: "splitledger".to_string(),
            },
            auth: AuthConfig {
                secret_key: secret_key.to_string(),
                access_token_expire_minutes: 30,
            },
            cors: CorsConfig {
                origins: vec!["*".to_string()],
            },
            log: LogConfig {
                level: "info".to_string(),
                json: false,
            },
        }
    }
}
