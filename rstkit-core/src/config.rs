//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Main configuration struct matching the rstkit.yml schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub store: StoreConfig,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Directory holding the editor frontend, served at `/`
    #[serde(default)]
    pub static_dir: Option<PathBuf>,

    #[serde(default = "default_upload_limit_mb")]
    pub upload_limit_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            static_dir: None,
            upload_limit_mb: default_upload_limit_mb(),
        }
    }
}

fn default_listen_addr() -> String {
    String::from("127.0.0.1:5000")
}

fn default_upload_limit_mb() -> usize {
    50
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Build tool executable (looked up in PATH when relative)
    #[serde(default = "default_sphinx_bin")]
    pub sphinx_bin: PathBuf,

    /// Sphinx builder name passed as `-b`
    #[serde(default = "default_builder")]
    pub builder: String,

    /// Template tree staged into every build (None means use built-in)
    #[serde(default)]
    pub template_dir: Option<PathBuf>,

    /// Parent directory for per-build staging roots (None means OS temp dir)
    #[serde(default)]
    pub work_root: Option<PathBuf>,

    /// Where the most recent rendered output is kept, if anywhere
    #[serde(default)]
    pub retain_dir: Option<PathBuf>,

    #[serde(default = "default_archive_name")]
    pub archive_name: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            sphinx_bin: default_sphinx_bin(),
            builder: default_builder(),
            template_dir: None,
            work_root: None,
            retain_dir: None,
            archive_name: default_archive_name(),
        }
    }
}

fn default_sphinx_bin() -> PathBuf {
    PathBuf::from("sphinx-build")
}

fn default_builder() -> String {
    String::from("html")
}

fn default_archive_name() -> String {
    String::from("build.zip")
}

/// Object store backing the upload endpoint.
///
/// Credentials never live here; the HTTP token is read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    #[default]
    None,
    Fs {
        root: PathBuf,
    },
    Http {
        endpoint: String,
        bucket: String,
    },
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults.
    ///
    /// Relative paths still resolve against the would-be config location.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Self {
            config_path: Some(path.to_path_buf()),
            ..Self::default()
        })
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Get the static frontend directory, resolved relative to config file
    pub fn static_dir(&self) -> Option<PathBuf> {
        self.server.static_dir.as_ref().map(|p| self.resolve_path(p))
    }

    /// Get the build template directory (None means use built-in)
    pub fn template_dir(&self) -> Option<PathBuf> {
        self.build.template_dir.as_ref().map(|p| self.resolve_path(p))
    }

    /// Get the staging parent directory, defaulting to the OS temp dir
    pub fn work_root(&self) -> PathBuf {
        self.build
            .work_root
            .as_ref()
            .map(|p| self.resolve_path(p))
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Get the retained-output directory, resolved relative to config file
    pub fn retain_dir(&self) -> Option<PathBuf> {
        self.build.retain_dir.as_ref().map(|p| self.resolve_path(p))
    }

    /// Resolve the build tool path. Bare names are left for PATH lookup.
    pub fn sphinx_bin(&self) -> PathBuf {
        let bin = &self.build.sphinx_bin;
        if bin.components().count() > 1 {
            self.resolve_path(bin)
        } else {
            bin.clone()
        }
    }

    /// Get the filesystem store root when the fs store is configured
    pub fn store_root(&self) -> Option<PathBuf> {
        match &self.store {
            StoreConfig::Fs { root } => Some(self.resolve_path(root)),
            _ => None,
        }
    }

    /// Resolve an arbitrary path relative to the config file location
    pub fn resolve_relative(&self, path: &Path) -> PathBuf {
        self.resolve_path(path)
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(config_path) = &self.config_path {
            if let Some(parent) = config_path.parent() {
                parent.join(path)
            } else {
                path.to_path_buf()
            }
        } else {
            path.to_path_buf()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:5000");
        assert_eq!(config.build.builder, "html");
        assert_eq!(config.build.archive_name, "build.zip");
        assert_eq!(config.store, StoreConfig::None);
    }

    #[test]
    fn test_store_variants() {
        let config: Config = serde_yaml::from_str(
            "store:\n  kind: http\n  endpoint: https://objects.example.com\n  bucket: docs\n",
        )
        .unwrap();
        assert_eq!(
            config.store,
            StoreConfig::Http {
                endpoint: "https://objects.example.com".into(),
                bucket: "docs".into(),
            }
        );
    }

    #[test]
    fn test_paths_resolve_against_config_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rstkit.yml");
        fs::write(
            &path,
            "build:\n  template_dir: templates\n  retain_dir: /srv/last\n  sphinx_bin: bin/sphinx\nstore:\n  kind: fs\n  root: objects\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.template_dir(), Some(dir.path().join("templates")));
        assert_eq!(config.retain_dir(), Some(PathBuf::from("/srv/last")));
        assert_eq!(config.sphinx_bin(), dir.path().join("bin/sphinx"));
        assert_eq!(config.store_root(), Some(dir.path().join("objects")));
    }

    #[test]
    fn test_bare_sphinx_bin_left_for_path_lookup() {
        let config = Config::default();
        assert_eq!(config.sphinx_bin(), PathBuf::from("sphinx-build"));
        assert_eq!(config.work_root(), std::env::temp_dir());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("absent.yml")).unwrap();
        assert!(config.static_dir().is_none());
        assert_eq!(config.config_path(), Some(dir.path().join("absent.yml").as_path()));
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rstkit.yml");
        fs::write(&path, "server: [not, a, map").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::ParseError(_))
        ));
    }
}
