//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. `KINGSROOM_ROOT_FOLDER` environment variable
//! 3. TOML config file (`root_folder`)
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file never stops a service; it logs a warning
//! and the compiled defaults are used instead.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "KINGSROOM_ROOT_FOLDER";

/// Compiled defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let root_folder = dirs::data_local_dir()
            .map(|d| d.join("kingsroom"))
            .unwrap_or_else(|| PathBuf::from("./kingsroom_data"));

        Self {
            root_folder,
            log_level: "info".to_string(),
        }
    }
}

/// Logging section of the TOML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Live fetch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Minimum delay between two live requests
    pub min_request_interval_ms: u64,
    /// Payloads shorter than this are classified as blank
    pub min_content_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("kingsroom-scraper/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            min_request_interval_ms: 1000,
            min_content_bytes: 200,
        }
    }
}

/// Default run thresholds applied when a request does not set its own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub max_consecutive_not_found: u32,
    pub max_consecutive_errors: u32,
    pub max_consecutive_blanks: u32,
    pub max_total_errors: u32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            max_consecutive_not_found: 10,
            max_consecutive_errors: 3,
            max_consecutive_blanks: 5,
            max_total_errors: 15,
        }
    }
}

/// One scrape target site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Owning entity id
    pub id: String,
    /// Tenant slug used as the first storage key segment; defaults to `id`
    #[serde(default)]
    pub tenant: String,
    /// Site base URL, used to resolve a URL back to its entity
    #[serde(default)]
    pub base_url: String,
    /// Page URL template; `{id}` is replaced by the tournament identifier
    pub page_url_template: String,
}

/// Scraper TOML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
}

impl TomlConfig {
    /// Look up an entity by id
    pub fn entity(&self, id: &str) -> Option<&EntityConfig> {
        self.entities.iter().find(|e| e.id == id)
    }
}

/// Default path of a module's TOML file: `<config_dir>/kingsroom/<module>.toml`
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("kingsroom").join(format!("{}.toml", module_name)))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Write config atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, target: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut tmp = target.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, target)?;
    Ok(())
}

/// Resolves the root folder from CLI, environment, TOML and defaults
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml_root: None,
        }
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_toml(mut self, config: &TomlConfig) -> Self {
        self.toml_root = config.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            debug!(module = %self.module_name, "Root folder from command line");
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                debug!(module = %self.module_name, "Root folder from {}", ROOT_FOLDER_ENV);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_root {
            debug!(module = %self.module_name, "Root folder from TOML config");
            return path.clone();
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder layout
pub struct RootFolderInitializer {
    root: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding cached page captures
    pub fn cache_path(&self) -> PathBuf {
        self.root.join("cache")
    }

    /// Default JSON-lines output of enriched records
    pub fn enriched_output_path(&self) -> PathBuf {
        self.root.join("enriched.jsonl")
    }

    /// Create root and cache directories; safe to call repeatedly
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(self.cache_path())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = TomlConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.thresholds.max_consecutive_errors, 3);
        assert!(config.fetch.min_content_bytes > 0);
        assert!(config.entities.is_empty());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            [thresholds]
            max_total_errors = 4

            [[entities]]
            id = "ent-1"
            tenant = "kings"
            base_url = "https://results.example.com"
            page_url_template = "https://results.example.com/tournament?id={id}"
            "#,
        )
        .unwrap();

        assert_eq!(config.thresholds.max_total_errors, 4);
        assert_eq!(config.thresholds.max_consecutive_blanks, 5);
        assert_eq!(config.entity("ent-1").map(|e| e.tenant.as_str()), Some("kings"));
        assert!(config.entity("missing").is_none());
    }

    #[test]
    fn test_initializer_paths() {
        let init = RootFolderInitializer::new(PathBuf::from("/tmp/kr"));
        assert_eq!(init.cache_path(), PathBuf::from("/tmp/kr/cache"));
        assert_eq!(init.enriched_output_path(), PathBuf::from("/tmp/kr/enriched.jsonl"));
    }
}
