//! Configuration management
//!
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults. A hosted
//! backend is only used when both its URL and key are present; leaving them
//! out is a normal configuration, not an error.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Hosted backend configuration
    #[serde(default)]
    pub backend: BackendConfig,
    /// Static snapshot configuration
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    /// Data source loading behaviour
    #[serde(default)]
    pub sources: SourcesConfig,
    /// Local persisted store configuration
    #[serde(default)]
    pub storage: StorageConfig,
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
    /// Bearer token required on admin routes (admin routes are open when unset)
    #[serde(default)]
    pub admin_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            admin_token: None,
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

/// Hosted backend (PostgREST + object storage) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    #[serde(default)]
    pub url: Option<String>,
    /// Public (anon) API key
    #[serde(default)]
    pub anon_key: Option<String>,
    /// Object storage bucket for blog images
    #[serde(default = "default_image_bucket")]
    pub image_bucket: String,
    /// Folder inside the bucket
    #[serde(default = "default_image_folder")]
    pub image_folder: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            image_bucket: default_image_bucket(),
            image_folder: default_image_folder(),
        }
    }
}

impl BackendConfig {
    /// True when connection credentials are present
    pub fn is_configured(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.url) && present(&self.anon_key)
    }
}

fn default_image_bucket() -> String {
    "blog-images".to_string()
}

fn default_image_folder() -> String {
    "blog".to_string()
}

/// Static snapshot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// `http(s)://` URL or local file path of the snapshot document.
    /// Set to an empty string to disable the snapshot tier.
    #[serde(default = "default_snapshot_source")]
    pub source: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            source: default_snapshot_source(),
        }
    }
}

impl SnapshotConfig {
    pub fn is_enabled(&self) -> bool {
        !self.source.trim().is_empty()
    }
}

fn default_snapshot_source() -> String {
    "data/blog-posts.json".to_string()
}

/// Data source loading behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Upper bound for a single source load, in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl SourcesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}

fn default_timeout_seconds() -> u64 {
    5
}

/// Local persisted store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Store driver (file, memory or redis)
    #[serde(default)]
    pub driver: StorageDriver,
    /// Directory used by the file driver
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
    /// Redis connection URL (redis driver only)
    #[serde(default)]
    pub redis_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            driver: StorageDriver::default(),
            path: default_storage_path(),
            redis_url: None,
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("data/cache")
}

/// Local store driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
    /// JSON files in a directory (default)
    #[default]
    File,
    /// Process memory only
    Memory,
    /// Redis
    Redis,
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist or is empty, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: format_yaml_error(&e),
        })
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - BWBLOG_SERVER_HOST / _PORT / _CORS_ORIGIN / _ADMIN_TOKEN
    /// - BWBLOG_BACKEND_URL / _ANON_KEY / _IMAGE_BUCKET
    /// - BWBLOG_SNAPSHOT_SOURCE
    /// - BWBLOG_SOURCES_TIMEOUT_SECONDS
    /// - BWBLOG_STORAGE_DRIVER / _PATH / _REDIS_URL
    pub fn load_with_env(path: &std::path::Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        // Server
        if let Ok(host) = std::env::var("BWBLOG_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("BWBLOG_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("BWBLOG_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }
        if let Ok(token) = std::env::var("BWBLOG_SERVER_ADMIN_TOKEN") {
            self.server.admin_token = Some(token);
        }

        // Hosted backend
        if let Ok(url) = std::env::var("BWBLOG_BACKEND_URL") {
            self.backend.url = Some(url);
        }
        if let Ok(key) = std::env::var("BWBLOG_BACKEND_ANON_KEY") {
            self.backend.anon_key = Some(key);
        }
        if let Ok(bucket) = std::env::var("BWBLOG_BACKEND_IMAGE_BUCKET") {
            self.backend.image_bucket = bucket;
        }

        // Snapshot
        if let Ok(source) = std::env::var("BWBLOG_SNAPSHOT_SOURCE") {
            self.snapshot.source = source;
        }

        // Sources
        if let Ok(timeout) = std::env::var("BWBLOG_SOURCES_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.sources.timeout_seconds = timeout;
            }
        }

        // Storage
        if let Ok(driver) = std::env::var("BWBLOG_STORAGE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "file" => self.storage.driver = StorageDriver::File,
                "memory" => self.storage.driver = StorageDriver::Memory,
                "redis" => self.storage.driver = StorageDriver::Redis,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(path) = std::env::var("BWBLOG_STORAGE_PATH") {
            self.storage.path = PathBuf::from(path);
        }
        if let Ok(redis_url) = std::env::var("BWBLOG_STORAGE_REDIS_URL") {
            self.storage.redis_url = Some(redis_url);
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ENV_KEYS: &[&str] = &[
        "BWBLOG_SERVER_HOST",
        "BWBLOG_SERVER_PORT",
        "BWBLOG_SERVER_CORS_ORIGIN",
        "BWBLOG_SERVER_ADMIN_TOKEN",
        "BWBLOG_BACKEND_URL",
        "BWBLOG_BACKEND_ANON_KEY",
        "BWBLOG_BACKEND_IMAGE_BUCKET",
        "BWBLOG_SNAPSHOT_SOURCE",
        "BWBLOG_SOURCES_TIMEOUT_SECONDS",
        "BWBLOG_STORAGE_DRIVER",
        "BWBLOG_STORAGE_PATH",
        "BWBLOG_STORAGE_REDIS_URL",
    ];

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        let guard = super::CONFIG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
        guard
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::path::Path::new("nonexistent_bwblog_config.yml");
        let config = Config::load(path).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert!(config.server.admin_token.is_none());
        assert!(!config.backend.is_configured());
        assert_eq!(config.backend.image_bucket, "blog-images");
        assert_eq!(config.backend.image_folder, "blog");
        assert_eq!(config.snapshot.source, "data/blog-posts.json");
        assert_eq!(config.sources.timeout_seconds, 5);
        assert_eq!(config.storage.driver, StorageDriver::File);
        assert_eq!(config.storage.path, PathBuf::from("data/cache"));
    }

    #[test]
    fn test_load_empty_file_returns_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "   \n").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_load_full_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
server:
  host: "127.0.0.1"
  port: 9000
  admin_token: "s3cret"
backend:
  url: "https://example.supabase.co"
  anon_key: "anon"
  image_bucket: "media"
snapshot:
  source: "https://example.com/data/blog-posts.json"
sources:
  timeout_seconds: 2
storage:
  driver: memory
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.admin_token.as_deref(), Some("s3cret"));
        assert!(config.backend.is_configured());
        assert_eq!(config.backend.image_bucket, "media");
        assert_eq!(config.backend.image_folder, "blog");
        assert_eq!(config.snapshot.source, "https://example.com/data/blog-posts.json");
        assert_eq!(config.sources.timeout(), Duration::from_secs(2));
        assert_eq!(config.storage.driver, StorageDriver::Memory);
    }

    #[test]
    fn test_backend_requires_both_credentials() {
        let mut backend = BackendConfig {
            url: Some("https://example.supabase.co".into()),
            ..BackendConfig::default()
        };
        assert!(!backend.is_configured());

        backend.anon_key = Some("  ".into());
        assert!(!backend.is_configured());

        backend.anon_key = Some("key".into());
        assert!(backend.is_configured());
    }

    #[test]
    fn test_load_invalid_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: not_a_number\n").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let _guard = lock_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 3000\nstorage:\n  driver: file\n").unwrap();

        std::env::set_var("BWBLOG_SERVER_PORT", "4000");
        std::env::set_var("BWBLOG_BACKEND_URL", "https://env.supabase.co");
        std::env::set_var("BWBLOG_BACKEND_ANON_KEY", "env-key");
        std::env::set_var("BWBLOG_STORAGE_DRIVER", "MEMORY");
        std::env::set_var("BWBLOG_SNAPSHOT_SOURCE", "");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.server.port, 4000);
        assert!(config.backend.is_configured());
        assert_eq!(config.storage.driver, StorageDriver::Memory);
        assert!(!config.snapshot.is_enabled());

        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_env_override_invalid_values_ignored() {
        let _guard = lock_env();

        std::env::set_var("BWBLOG_SERVER_PORT", "not-a-port");
        std::env::set_var("BWBLOG_SOURCES_TIMEOUT_SECONDS", "-3");
        std::env::set_var("BWBLOG_STORAGE_DRIVER", "postgres");

        let config = Config::load_with_env(std::path::Path::new("nonexistent_bwblog_config.yml")).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.sources.timeout_seconds, 5);
        assert_eq!(config.storage.driver, StorageDriver::File);

        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }
}
