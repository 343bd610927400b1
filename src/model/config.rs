use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULTS: &str = include_str!("../../config/default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub repository: RepositoryConfig,
    pub download: DownloadConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadConfig {
    pub output_dir: String,
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    ///
    /// An explicit `path` must exist. Without one, the per-user
    /// `config.toml` is read when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let user_path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => user_config_path().filter(|path| path.exists()),
        };

        let mut merged: toml::Value = toml::from_str(DEFAULTS)?;
        if let Some(user_path) = user_path {
            let user_str = fs::read_to_string(&user_path)
                .with_context(|| format!("reading config {}", user_path.display()))?;
            let overlay: toml::Value = toml::from_str(&user_str)
                .with_context(|| format!("parsing config {}", user_path.display()))?;
            deep_merge(&mut merged, overlay);
            tracing::debug!("loaded user config from {}", user_path.display());
        }

        let mut config: AppConfig = merged.try_into()?;

        // Expand ~ in output_dir
        if config.download.output_dir.starts_with('~') {
            let home = dirs_home().ok_or_else(|| anyhow!("cannot determine home directory"))?;
            config.download.output_dir =
                config
                    .download
                    .output_dir
                    .replacen('~', &home.to_string_lossy(), 1);
        }

        Ok(config)
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.download.output_dir)
    }
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "jenkins-plugin-fetch")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

/// Tables merge key by key; any other value in `overlay` replaces `base`.
fn deep_merge(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_jenkins_update_site() {
        let config: AppConfig = toml::from_str(DEFAULTS).unwrap();
        assert_eq!(config.repository.base_url, "https://updates.jenkins.io");
        assert_eq!(config.output_dir(), PathBuf::from("plugins"));
    }

    #[test]
    fn user_file_overrides_single_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[download]\noutput_dir = \"my_plugins\"\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.output_dir(), PathBuf::from("my_plugins"));
        assert_eq!(config.repository.base_url, "https://updates.jenkins.io");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn wrong_value_type_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[repository]\nbase_url = 42\n").unwrap();

        assert!(AppConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn deep_merge_keeps_untouched_keys() {
        let mut base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\n[b]\nz = 4\n").unwrap();
        deep_merge(&mut base, overlay);

        assert_eq!(base["a"]["x"].as_integer(), Some(1));
        assert_eq!(base["a"]["y"].as_integer(), Some(3));
        assert_eq!(base["b"]["z"].as_integer(), Some(4));
    }
}
