//! Configuration loader for `limitgate`.
//!
//! Reads and writes the TOML configuration file and expands `~` in paths.
//! Configuration is stored at `~/.limitgate/config.toml` by default.
//!
//! # Examples
//!
//! ```no_run
//! use limitgate_core::config_loader::ConfigLoader;
//!
//! let loader = ConfigLoader::new().expect("failed to create loader");
//!
//! if loader.exists() {
//!     let config = loader.load().expect("failed to load config");
//!     println!("exchange rate: {}", config.limits.exchange_rate);
//! } else {
//!     loader.write_default().expect("failed to write default config");
//! }
//! ```

use crate::config::Config;
use crate::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};

/// The default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// The default base directory name within the home directory.
const BASE_DIR_NAME: &str = ".limitgate";

/// Reads and writes the configuration file under a base directory.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a loader rooted at `~/.limitgate`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHomeDirectory`] if the home directory cannot be determined.
    pub fn new() -> Result<Self, ConfigError> {
        let base_dir = default_base_dir()?;
        Ok(Self { base_dir })
    }

    /// Creates a loader with a custom base directory.
    ///
    /// # Examples
    ///
    /// ```
    /// use limitgate_core::config_loader::ConfigLoader;
    /// use std::path::PathBuf;
    ///
    /// let loader = ConfigLoader::with_base_dir(PathBuf::from("/srv/limitgate"));
    /// assert_eq!(loader.config_path(), PathBuf::from("/srv/limitgate/config.toml"));
    /// ```
    #[must_use]
    pub const fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Creates a loader for an explicit configuration file.
    ///
    /// The file's parent becomes the base directory, so the file must be
    /// named `config.toml`. Returns `None` otherwise.
    #[must_use]
    pub fn for_config_file(path: &Path) -> Option<Self> {
        if path.file_name()? != CONFIG_FILE_NAME {
            return None;
        }
        let parent = path.parent()?;
        Some(Self::with_base_dir(parent.to_path_buf()))
    }

    /// Returns the path to the configuration file.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILE_NAME)
    }

    /// Returns the base directory.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Loads configuration, returning defaults if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseFailed`] if the file contains invalid TOML.
    /// Returns [`ConfigError::Io`] if there's an I/O error reading the file.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let config_path = self.config_path();

        if !config_path.exists() {
            return Ok(Config::default());
        }

        Self::load_from_path(&config_path)
    }

    /// Loads configuration, failing if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileNotFound`] if the configuration file doesn't exist.
    /// Returns [`ConfigError::ParseFailed`] if the file contains invalid TOML.
    /// Returns [`ConfigError::Io`] if there's an I/O error reading the file.
    pub fn load_required(&self) -> Result<Config, ConfigError> {
        let config_path = self.config_path();

        if !config_path.exists() {
            return Err(ConfigError::file_not_found(
                config_path.display().to_string(),
            ));
        }

        Self::load_from_path(&config_path)
    }

    /// Saves configuration, creating the base directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if there's an I/O error writing the file.
    /// Returns [`ConfigError::ParseFailed`] if the configuration cannot be serialized.
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        self.ensure_base_dir()?;

        let config_path = self.config_path();

        let toml_str = toml::to_string_pretty(config).map_err(|e| {
            ConfigError::parse_failed(format!("failed to serialize configuration: {e}"))
        })?;

        fs::write(&config_path, toml_str).map_err(|e| {
            ConfigError::io(
                format!("failed to write configuration to {}", config_path.display()),
                e,
            )
        })?;

        Ok(())
    }

    /// Writes the commented default configuration from [`Config::default_toml`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if there's an I/O error writing the file.
    pub fn write_default(&self) -> Result<(), ConfigError> {
        self.ensure_base_dir()?;

        let config_path = self.config_path();

        fs::write(&config_path, Config::default_toml()).map_err(|e| {
            ConfigError::io(
                format!(
                    "failed to write default configuration to {}",
                    config_path.display()
                ),
                e,
            )
        })?;

        Ok(())
    }

    /// Checks if the configuration file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.config_path().exists()
    }

    fn ensure_base_dir(&self) -> Result<(), ConfigError> {
        if !self.base_dir.exists() {
            fs::create_dir_all(&self.base_dir).map_err(|e| {
                ConfigError::io(
                    format!(
                        "failed to create base directory {}",
                        self.base_dir.display()
                    ),
                    e,
                )
            })?;
        }
        Ok(())
    }

    fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::io(format!("failed to read {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| {
            ConfigError::parse_failed(format!("invalid TOML in {}: {e}", path.display()))
        })
    }
}

/// Expands a leading `~` to the home directory.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDirectory`] if the path starts with `~` and
/// the home directory cannot be determined.
///
/// # Examples
///
/// ```
/// use limitgate_core::config_loader::expand_path;
///
/// let path = expand_path("/var/lib/limitgate/history.db").expect("absolute path");
/// assert_eq!(path.to_string_lossy(), "/var/lib/limitgate/history.db");
/// ```
pub fn expand_path(path: &str) -> Result<PathBuf, ConfigError> {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = dirs::home_dir().ok_or_else(ConfigError::no_home_directory)?;
        Ok(home.join(rest))
    } else if path == "~" {
        dirs::home_dir().ok_or_else(ConfigError::no_home_directory)
    } else {
        Ok(PathBuf::from(path))
    }
}

/// Returns `~/.limitgate`.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDirectory`] if the home directory cannot be determined.
pub fn default_base_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or_else(ConfigError::no_home_directory)?;
    Ok(home.join(BASE_DIR_NAME))
}

/// Loads configuration from the default location and resolves
/// `history.database_path`.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDirectory`] if the home directory cannot be determined.
/// Returns [`ConfigError::ParseFailed`] if the configuration file contains invalid TOML.
/// Returns [`ConfigError::Io`] if there's an I/O error reading the file.
pub fn load_config() -> Result<Config, ConfigError> {
    let loader = ConfigLoader::new()?;
    let mut config = loader.load()?;
    expand_config_paths(&mut config, loader.base_dir())?;
    Ok(config)
}

/// Expands `~` in every path-valued setting and anchors relative paths at `base_dir`.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDirectory`] if a path starts with `~` and
/// the home directory cannot be determined.
pub fn expand_config_paths(config: &mut Config, base_dir: &Path) -> Result<(), ConfigError> {
    let expanded = expand_path(&config.history.database_path)?;
    let resolved = if expanded.is_relative() {
        base_dir.join(expanded)
    } else {
        expanded
    };
    config.history.database_path = resolved.to_string_lossy().to_string();
    Ok(())
}
