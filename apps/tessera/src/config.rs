//! # Configuration
//!
//! Application settings from `tessera.toml`, overridden by `TESSERA_*`
//! environment variables, overridden in turn by CLI flags.
//!
//! ```toml
//! dashboard = "dashboard.json"
//!
//! [storage]
//! backend = "redb"          # or "memory"
//! path = "tessera.redb"
//! key = "tessera-filters"
//!
//! [engine]
//! type_name_fallback = true
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! rate_limit = 100          # requests/second, 0 disables
//! cors_origins = ["http://localhost:3000"]   # ["*"] allows all
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tessera_core::TesseraError;
use tessera_core::primitives::DEFAULT_STORAGE_KEY;
use tessera_core::ResolverOptions;

/// Config file read from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "tessera.toml";

/// Maximum config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// SECTIONS
// =============================================================================

/// Where filter state is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Embedded redb database.
    #[default]
    Redb,
    /// Process memory only.
    Memory,
}

impl StorageBackend {
    /// Parse a backend name (`redb` or `memory`).
    pub fn parse(name: &str) -> Result<Self, TesseraError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "redb" => Ok(Self::Redb),
            "memory" => Ok(Self::Memory),
            other => Err(TesseraError::ConfigError(format!(
                "unknown storage backend '{}' (expected 'redb' or 'memory')",
                other
            ))),
        }
    }

    /// Backend name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Redb => "redb",
            Self::Memory => "memory",
        }
    }
}

/// `[storage]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub path: PathBuf,
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Redb,
            path: PathBuf::from("tessera.redb"),
            key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

/// `[engine]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub type_name_fallback: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            type_name_fallback: true,
        }
    }
}

impl EngineConfig {
    /// Resolver options for the core engine.
    #[must_use]
    pub const fn resolver_options(self) -> ResolverOptions {
        ResolverOptions {
            type_name_fallback: self.type_name_fallback,
        }
    }
}

/// `[server]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Requests per second; `0` disables rate limiting.
    pub rate_limit: u32,
    /// Allowed CORS origins; `None` means localhost only.
    pub cors_origins: Option<Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            rate_limit: 100,
            cors_origins: None,
        }
    }
}

impl ServerConfig {
    /// `host:port`.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// APP CONFIG
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Dashboard JSON file.
    pub dashboard: Option<PathBuf>,
    pub storage: StorageConfig,
    pub engine: EngineConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Parse TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self, TesseraError> {
        toml::from_str(raw).map_err(|e| TesseraError::ConfigError(e.to_string()))
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, `tessera.toml` in the
    /// working directory is used if present, defaults otherwise. Environment
    /// overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, TesseraError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, TesseraError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            TesseraError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(TesseraError::ConfigError(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let raw = std::fs::read_to_string(path).map_err(|e| {
            TesseraError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&raw)
    }

    /// Apply `TESSERA_*` overrides read through `lookup`.
    ///
    /// | Variable                      | Setting                 |
    /// |-------------------------------|-------------------------|
    /// | `TESSERA_DASHBOARD`           | `dashboard`             |
    /// | `TESSERA_STORAGE_BACKEND`     | `storage.backend`       |
    /// | `TESSERA_STORAGE_PATH`        | `storage.path`          |
    /// | `TESSERA_STORAGE_KEY`         | `storage.key`           |
    /// | `TESSERA_TYPE_NAME_FALLBACK`  | `engine.type_name_fallback` |
    /// | `TESSERA_HOST`                | `server.host`           |
    /// | `TESSERA_PORT`                | `server.port`           |
    /// | `TESSERA_RATE_LIMIT`          | `server.rate_limit`     |
    /// | `TESSERA_CORS_ORIGINS`        | `server.cors_origins` (comma-separated) |
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), TesseraError> {
        if let Some(v) = lookup("TESSERA_DASHBOARD") {
            self.dashboard = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("TESSERA_STORAGE_BACKEND") {
            self.storage.backend = StorageBackend::parse(&v)?;
        }
        if let Some(v) = lookup("TESSERA_STORAGE_PATH") {
            self.storage.path = PathBuf::from(v);
        }
        if let Some(v) = lookup("TESSERA_STORAGE_KEY") {
            self.storage.key = v;
        }
        if let Some(v) = lookup("TESSERA_TYPE_NAME_FALLBACK") {
            self.engine.type_name_fallback = parse_env("TESSERA_TYPE_NAME_FALLBACK", &v)?;
        }
        if let Some(v) = lookup("TESSERA_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("TESSERA_PORT") {
            self.server.port = parse_env("TESSERA_PORT", &v)?;
        }
        if let Some(v) = lookup("TESSERA_RATE_LIMIT") {
            self.server.rate_limit = parse_env("TESSERA_RATE_LIMIT", &v)?;
        }
        if let Some(v) = lookup("TESSERA_CORS_ORIGINS") {
            self.server.cors_origins = Some(
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            );
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, TesseraError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| TesseraError::ConfigError(format!("{}='{}': {}", name, raw, e)))
}

// =============================================================================
// TESTS
// =============================================================================
