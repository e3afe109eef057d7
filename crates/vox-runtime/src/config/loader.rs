//! Configuration loader using figment.
//!
//! # Feature Flags
//!
//! - `toml-config`: enables TOML configuration files (`vox.toml`, `skill.toml`)
//! - `yaml-config`: enables YAML configuration files (`vox.yaml`, `vox.yml`, `skill.yaml`, `skill.yml`)
//!
//! Both features can be enabled simultaneously; if so, both file formats are searched and loaded.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Profile-specific config file (`vox.{profile}.toml` / `vox.{profile}.yaml`)
//! 3. Main config file (`vox.toml` / `vox.yaml`)
//! 4. Environment variables (`VOX_*`)
//! 5. Programmatic overrides
//!
//! # Environment Variable Mapping
//!
//! Environment variables are mapped using the `VOX_` prefix with `__` as separator:
//!
//! - `VOX_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `VOX_BINDER__SILENT=false` → `binder.silent = false`
//! - `VOX_SKILL__NAME=weather` → `skill.name = "weather"`
//!
//! # Example
//!
//! ```rust,ignore
//! use vox_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new().profile("production").load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::SkillConfig;

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    /// Development profile (default).
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name, accepting `dev` and `prod` as short forms.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            _ => Self::Custom(name.to_string()),
        }
    }

    /// Reads `VOX_PROFILE`, defaulting to Development.
    pub fn from_env() -> Self {
        std::env::var("VOX_PROFILE")
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    /// Programmatic overrides, merged last.
    overrides: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    /// Specific config file to load (overrides search).
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a search path for configuration files.
    ///
    /// Without any, the current directory and the user config directory
    /// (`~/.config/vox` on Linux) are searched.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges configuration programmatically, above every other source.
    pub fn merge(mut self, config: SkillConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<SkillConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: SkillConfig = figment.extract()?;

        debug!(
            profile = %profile,
            skill = %config.skill.name,
            logging_level = %config.logging.level,
            silent = config.binder.silent,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(SkillConfig::default()));

        if let Some(path) = self.config_file.take() {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = Self::merge_config_file(figment, &path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!("Loading environment variables with VOX_ prefix");
            figment = figment.merge(Env::prefixed("VOX_").split("__"));
        }

        let overrides = std::mem::take(&mut self.overrides);
        Ok(figment.merge(overrides))
    }

    /// Merges one explicitly requested file, picking the format from its
    /// extension.
    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        file_formats()
            .into_iter()
            .find(|format| format.extensions.contains(&ext))
            .map(|format| (format.merge)(figment, path))
            .ok_or_else(|| ConfigError::UnsupportedFormat(ext.to_string()))
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        std::env::current_dir()
            .ok()
            .into_iter()
            .chain(dirs::config_dir().map(|dir| dir.join("vox")))
            .collect()
    }

    /// Searches every enabled format in turn.
    ///
    /// Within a format the first directory holding one of its base names
    /// wins; a `{stem}.{profile}.{ext}` file next to it is merged beneath it.
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        let search_paths = self.resolve_search_paths();
        let mut found = false;

        for format in file_formats() {
            'search: for dir in &search_paths {
                for name in format.base_names {
                    let Some((stem, ext)) = name.rsplit_once('.') else {
                        continue;
                    };

                    let profile_path = dir.join(format!("{stem}.{}.{ext}", self.profile));
                    if profile_path.exists() {
                        debug!(path = %profile_path.display(), "Loading profile config");
                        figment = (format.merge)(figment, &profile_path);
                    }

                    let path = dir.join(name);
                    if path.exists() {
                        info!(path = %path.display(), "Loading configuration file");
                        figment = (format.merge)(figment, &path);
                        found = true;
                        break 'search;
                    }
                }
            }
        }

        if !found {
            warn!("No configuration file found, using defaults");
        }
        figment
    }
}

/// A configuration file format enabled at compile time.
struct FileFormat {
    base_names: &'static [&'static str],
    extensions: &'static [&'static str],
    merge: fn(Figment, &Path) -> Figment,
}

fn file_formats() -> Vec<FileFormat> {
    #[allow(unused_mut)]
    let mut formats = Vec::new();

    #[cfg(feature = "toml-config")]
    formats.push(FileFormat {
        base_names: &["vox.toml", "skill.toml"],
        extensions: &["toml"],
        merge: |figment, path| figment.merge(Toml::file(path)),
    });

    #[cfg(feature = "yaml-config")]
    formats.push(FileFormat {
        base_names: &["vox.yaml", "vox.yml", "skill.yaml", "skill.yml"],
        extensions: &["yaml", "yml"],
        merge: |figment, path| figment.merge(Yaml::file(path)),
    });

    formats
}

/// Loads the configuration from the default locations.
pub fn load_config() -> ConfigResult<SkillConfig> {
    ConfigLoader::new().load()
}

/// Loads the configuration from `path`, with environment overrides.
pub fn load_config_from_file(path: impl AsRef<Path>) -> ConfigResult<SkillConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogLevel;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        Jail::expect_with(|jail| {
            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.logging.level.as_str(), "info");
            assert!(config.binder.silent);
            assert_eq!(config.skill.locales, vec!["en".to_string()]);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides() {
        Jail::expect_with(|jail| {
            jail.set_env("VOX_BINDER__SILENT", "false");
            jail.set_env("VOX_LOGGING__LEVEL", "debug");
            jail.set_env("VOX_SKILL__NAME", "weather");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .map_err(|e| e.to_string())?;

            assert!(!config.binder.silent);
            assert_eq!(config.logging.level, LogLevel::Debug);
            assert_eq!(config.skill.name, "weather");
            Ok(())
        });
    }

    #[test]
    fn test_programmatic_overrides_win() {
        Jail::expect_with(|jail| {
            jail.set_env("VOX_SKILL__NAME", "from-env");

            let mut config = SkillConfig::default();
            config.skill.name = "from-code".to_string();
            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .merge(config)
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.skill.name, "from-code");
            Ok(())
        });
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("VOX_LOGGING__LEVEL", "loud");

            let result = ConfigLoader::new().search_path(jail.directory()).load();
            assert!(matches!(result, Err(ConfigError::Extract(_))));
            Ok(())
        });
    }

    #[test]
    fn test_unsupported_extension() {
        Jail::expect_with(|jail| {
            jail.create_file("vox.ini", "[skill]")?;
            let result = ConfigLoader::new()
                .file(jail.directory().join("vox.ini"))
                .without_env()
                .load();
            assert!(matches!(result, Err(ConfigError::UnsupportedFormat(ext)) if ext == "ini"));
            Ok(())
        });
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::new()
            .file("/nonexistent/vox.toml")
            .without_env()
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_profile_file_is_overridden_by_main_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "vox.production.toml",
                r#"
                [skill]
                name = "from-profile"
                version = "2.0.0"
                "#,
            )?;
            jail.create_file(
                "vox.toml",
                r#"
                [skill]
                name = "weather"
                "#,
            )?;

            let config = ConfigLoader::new()
                .profile("prod")
                .search_path(jail.directory())
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.skill.name, "weather");
            assert_eq!(config.skill.version, "2.0.0");
            Ok(())
        });
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("prod"), Profile::Production);
        assert_eq!(Profile::parse("Development"), Profile::Development);
        assert_eq!(
            Profile::parse("staging"),
            Profile::Custom("staging".to_string())
        );
    }
}
