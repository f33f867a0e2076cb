use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialAppConfig {
    database_url: Option<String>,
    jwt_secret: Option<String>,
    listen_addr: Option<String>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl AppConfig {
    /// Loads configuration from an optional TOML file, then lets environment
    /// variables override it. Missing required values fail startup.
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        let file_config: PartialAppConfig = if let Some(path_str) = config_path {
            let path = Path::new(path_str);
            if path.exists() {
                let contents = fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
                toml::from_str(&contents)
                    .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))?
            } else {
                PartialAppConfig::default()
            }
        } else {
            PartialAppConfig::default()
        };

        let database_url = env::var("DATABASE_URL")
            .ok()
            .or(file_config.database_url)
            .ok_or_else(|| "DATABASE_URL must be set".to_string())?;
        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .or(file_config.jwt_secret)
            .ok_or_else(|| "JWT_SECRET must be set".to_string())?;
        let listen_addr = env::var("LISTEN_ADDR")
            .ok()
            .or(file_config.listen_addr)
            .unwrap_or_else(default_listen_addr);

        Ok(AppConfig {
            database_url,
            jwt_secret,
            listen_addr,
        })
    }
}
