use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the two JSON data files
    pub data_dir: PathBuf,
    pub users_file: String,
    pub reports_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// bcrypt cost factor for new and migrated password hashes
    pub bcrypt_cost: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env::var("PORTAL_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("PORTAL_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("PORTAL_USERS_FILE") {
            self.storage.users_file = v;
        }
        if let Ok(v) = env::var("PORTAL_REPORTS_FILE") {
            self.storage.reports_file = v;
        }
        if let Ok(v) = env::var("PORTAL_BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            storage: StorageConfig {
                data_dir: PathBuf::from("./data"),
                users_file: "users.json".to_string(),
                reports_file: "reports.json".to_string(),
            },
            // Low cost keeps local logins and test runs fast
            security: SecurityConfig { bcrypt_cost: 6 },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 3000 },
            storage: StorageConfig {
                data_dir: PathBuf::from("./data"),
                users_file: "users.json".to_string(),
                reports_file: "reports.json".to_string(),
            },
            security: SecurityConfig { bcrypt_cost: 10 },
        }
    }

    pub fn users_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.users_file)
    }

    pub fn reports_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.reports_file)
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
