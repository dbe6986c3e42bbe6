use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub storage: StorageConfig,
    pub mail: MailConfig,
    pub map: MapConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL; when unset the URL is assembled from the parts below
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_hours: i64,
    /// Account allowed to remove other admins
    pub supervisor_id: String,
    pub verification_code_minutes: i64,
    /// How long a verified email may be used to reset a password
    pub password_reset_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// S3 bucket; images are kept in memory when unset
    pub bucket: Option<String>,
    pub region: String,
    pub access_key_id: Option<String>,
    #[serde(skip_serializing)]
    pub secret_access_key: Option<String>,
    pub presigned_url_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// SMTP relay; mails are only logged when unset
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_user: String,
    #[serde(skip_serializing)]
    pub smtp_password: String,
    pub from: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub kakao_api_key: String,
}

const DEVELOPMENT_JWT_SECRET: &str = "boogie-development-secret";

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides();

        if config.security.jwt_secret.is_empty() {
            tracing::warn!("JWT_SECRET is not set; every token check will fail");
        }

        config
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DB_HOST") {
            self.database.host = v;
        }
        if let Ok(v) = env::var("DB_PORT") {
            self.database.port = v.parse().unwrap_or(self.database.port);
        }
        if let Ok(v) = env::var("DB_USER") {
            self.database.user = v;
        }
        if let Ok(v) = env::var("DB_PASSWORD") {
            self.database.password = v;
        }
        if let Ok(v) = env::var("DB_NAME") {
            self.database.name = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // API overrides
        if let Some(port) = env::var("BOOGIE_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Ok(v) = env::var("API_CORS_ORIGINS") {
            self.api.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("ACCESS_TOKEN_MINUTES") {
            self.security.access_token_minutes = v.parse().unwrap_or(self.security.access_token_minutes);
        }
        if let Ok(v) = env::var("REFRESH_TOKEN_HOURS") {
            self.security.refresh_token_hours = v.parse().unwrap_or(self.security.refresh_token_hours);
        }
        if let Ok(v) = env::var("SUPERVISOR_ID") {
            self.security.supervisor_id = v;
        }
        if let Ok(v) = env::var("VERIFICATION_CODE_MINUTES") {
            self.security.verification_code_minutes = v.parse().unwrap_or(self.security.verification_code_minutes);
        }
        if let Ok(v) = env::var("PASSWORD_RESET_MINUTES") {
            self.security.password_reset_minutes = v.parse().unwrap_or(self.security.password_reset_minutes);
        }

        // Storage overrides
        if let Ok(v) = env::var("S3_BUCKET_NAME") {
            self.storage.bucket = Some(v).filter(|b| !b.is_empty());
        }
        if let Ok(v) = env::var("S3_REGION") {
            self.storage.region = v;
        }
        if let Ok(v) = env::var("S3_ACCESS_KEY_ID") {
            self.storage.access_key_id = Some(v);
        }
        if let Ok(v) = env::var("S3_SECRET_ACCESS_KEY") {
            self.storage.secret_access_key = Some(v);
        }
        if let Ok(v) = env::var("S3_PRESIGNED_URL_SECS") {
            self.storage.presigned_url_secs = v.parse().unwrap_or(self.storage.presigned_url_secs);
        }

        // Mail overrides
        if let Ok(v) = env::var("SMTP_HOST") {
            self.mail.smtp_host = Some(v).filter(|h| !h.is_empty());
        }
        if let Ok(v) = env::var("SMTP_PORT") {
            self.mail.smtp_port = v.parse().unwrap_or(self.mail.smtp_port);
        }
        if let Ok(v) = env::var("SMTP_USER") {
            if self.mail.from.is_empty() {
                self.mail.from = v.clone();
            }
            self.mail.smtp_user = v;
        }
        if let Ok(v) = env::var("SMTP_PASSWORD") {
            self.mail.smtp_password = v;
        }
        if let Ok(v) = env::var("MAIL_FROM") {
            self.mail.from = v;
        }

        // Map overrides
        if let Ok(v) = env::var("KAKAO_API_KEY") {
            self.map.kakao_api_key = v;
        }
        if let Ok(v) = env::var("KAKAO_API_BASE_URL") {
            self.map.base_url = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                host: "localhost".to_string(),
                port: 3306,
                user: "root".to_string(),
                password: String::new(),
                name: "boogie".to_string(),
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: false,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 20 * 1024 * 1024, // 20MB
                cors_origins: vec![],
            },
            security: SecurityConfig {
                jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
                access_token_minutes: 5,
                refresh_token_hours: 24,
                supervisor_id: String::new(),
                verification_code_minutes: 5,
                password_reset_minutes: 30,
            },
            storage: StorageConfig {
                bucket: None,
                region: "ap-northeast-2".to_string(),
                access_key_id: None,
                secret_access_key: None,
                presigned_url_secs: 15 * 60,
            },
            mail: MailConfig {
                smtp_host: None,
                smtp_port: 587,
                smtp_user: String::new(),
                smtp_password: String::new(),
                from: String::new(),
            },
            map: MapConfig {
                base_url: "https://dapi.kakao.com".to_string(),
                kakao_api_key: String::new(),
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.api.max_request_size_bytes = 10 * 1024 * 1024; // 10MB
        config.security.jwt_secret = String::new();
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.api.enable_request_logging = false;
        config.api.max_request_size_bytes = 10 * 1024 * 1024; // 10MB
        config.security.jwt_secret = String::new();
        config
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_config_has_usable_defaults() {
        let config = AppConfig::development();
        assert_eq!(config.security.jwt_secret, DEVELOPMENT_JWT_SECRET);
        assert_eq!(config.security.access_token_minutes, 5);
        assert_eq!(config.security.refresh_token_hours, 24);
        assert!(config.storage.bucket.is_none());
        assert!(config.mail.smtp_host.is_none());
    }

    #[test]
    fn production_config_requires_explicit_secret() {
        let config = AppConfig::production();
        assert!(config.security.jwt_secret.is_empty());
        assert!(!config.api.enable_request_logging);
        assert_eq!(config.database.max_connections, 50);
    }

    #[test]
    fn secrets_are_not_serialized() {
        let value = serde_json::to_value(AppConfig::development()).unwrap();
        assert!(value["security"].get("jwt_secret").is_none());
        assert!(value["database"].get("password").is_none());
        assert_eq!(value["security"]["access_token_minutes"], 5);
    }
}
