use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Converter configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CookdownConfig {
    /// Directory scanned for recipe files
    #[serde(default)]
    pub input_dir: Option<PathBuf>,
    /// Directory receiving markdown files and images
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Maximum number of conversions running at once
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Search input directories recursively
    #[serde(default)]
    pub recursive: bool,
}

impl Default for CookdownConfig {
    fn default() -> Self {
        Self {
            input_dir: None,
            output_dir: None,
            workers: default_workers(),
            recursive: false,
        }
    }
}

fn default_workers() -> usize {
    4
}

impl CookdownConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with COOKDOWN__ prefix
    /// 2. cookdown.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: COOKDOWN__OUTPUT_DIR
    pub fn load() -> Result<Self, ConfigError> {
        load_config("cookdown")
    }

    /// Input directory from configuration, or the first existing default
    /// location under `base`.
    pub fn resolve_input_dir(&self, base: &Path) -> std::io::Result<PathBuf> {
        match &self.input_dir {
            Some(dir) => Ok(dir.clone()),
            None => find_directory(base, "input"),
        }
    }

    pub fn resolve_output_dir(&self, base: &Path) -> std::io::Result<PathBuf> {
        match &self.output_dir {
            Some(dir) => Ok(dir.clone()),
            None => find_directory(base, "output"),
        }
    }
}

/// Load configuration from `<name>.toml` (optional) and `COOKDOWN__*`
/// environment variables
pub fn load_config(name: &str) -> Result<CookdownConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name(name).required(false))
        // Use double underscore for nested keys: COOKDOWN__OUTPUT_DIR
        .add_source(
            Environment::with_prefix("COOKDOWN")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

/// First existing directory among `<base>/data/<kind>` and `<base>/<kind>`.
/// When neither exists, `<base>/data/<kind>` is created and returned.
pub fn find_directory(base: &Path, kind: &str) -> std::io::Result<PathBuf> {
    let candidates = [base.join("data").join(kind), base.join(kind)];

    if let Some(existing) = candidates.iter().find(|path| path.is_dir()) {
        return Ok(existing.clone());
    }

    let [default, _] = candidates;
    fs::create_dir_all(&default)?;
    Ok(default)
}
