//! Configuration management
//!
//! Configuration is loaded from a `config.yml` file at startup. Every
//! section has serde defaults, so a missing file or a partial file still
//! yields a runnable configuration. A couple of deployment-critical values
//! (bind port, database URL) can be overridden through environment
//! variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Upload configuration
    #[serde(default)]
    pub upload: UploadConfig,
    /// Mail configuration
    #[serde(default)]
    pub mail: MailConfig,
}

impl Config {
    /// Load configuration from a YAML file.
    ///
    /// A missing file is not an error; defaults are used instead.
    /// `ATELIER_PORT` and `ATELIER_DATABASE_URL` override the file values.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config: Config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&raw)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Config::default()
        };

        if let Ok(port) = std::env::var("ATELIER_PORT") {
            config.server.port = port
                .parse()
                .with_context(|| format!("Invalid ATELIER_PORT value: {}", port))?;
        }
        if let Ok(url) = std::env::var("ATELIER_DATABASE_URL") {
            config.database.url = url;
        }

        Ok(config)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path or URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/atelier.db".to_string()
}

/// Upload configuration for article photos
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Directory where uploaded photos are stored
    #[serde(default = "default_upload_path")]
    pub path: PathBuf,
    /// Maximum photo size in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Allowed photo content types
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl UploadConfig {
    /// Check if a content type is accepted for upload
    pub fn is_type_allowed(&self, content_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == content_type)
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: default_upload_path(),
            max_file_size: default_max_file_size(),
            allowed_types: default_allowed_types(),
        }
    }
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_file_size() -> u64 {
    2 * 1024 * 1024
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/gif".to_string(),
        "image/webp".to_string(),
    ]
}

/// SMTP mail configuration
///
/// Mail is optional; when `enabled` is false registration mails are
/// silently skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: String,
    #[serde(default)]
    pub smtp_password: String,
    /// From address, e.g. `no-reply@example.com`
    #[serde(default)]
    pub from_address: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_address: String::new(),
            from_name: default_from_name(),
        }
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "Atelier".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url, "data/atelier.db");
        assert!(!config.mail.enabled);
        assert!(config.upload.is_type_allowed("image/png"));
        assert!(!config.upload.is_type_allowed("application/zip"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = Config::load(Path::new("/nonexistent/config.yml")).expect("load");
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_partial_yaml_is_filled_with_defaults() {
        let yaml = "server:\n  port: 9999\n";
        let config: Config = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.url, "data/atelier.db");
    }
}
