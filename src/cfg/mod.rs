use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the optional per-project config file, looked up in the invocation
/// directory before falling back to the user-level config.
pub const PROJECT_CONFIG: &str = "djstrap.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub github: GitHubConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Interpreter used to create the venv. Everything after that runs
    /// through the venv's own binaries.
    #[serde(default = "default_python")]
    pub python: String,

    #[serde(default = "default_venv_dir")]
    pub venv_dir: String,

    /// Whether `app` creation also builds `templates/<app>/base.html`.
    #[serde(default = "default_app_templates")]
    pub app_templates: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GitHubConfig {
    /// Used only for the closing remote-setup hint after project creation.
    pub username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            general: GeneralConfig::default(),
            github: GitHubConfig::default(),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            python: default_python(),
            venv_dir: default_venv_dir(),
            app_templates: default_app_templates(),
        }
    }
}

fn default_python() -> String {
    if cfg!(windows) {
        "python".to_string()
    } else {
        "python3".to_string()
    }
}

fn default_venv_dir() -> String {
    "venv".to_string()
}

fn default_app_templates() -> bool {
    true
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("djstrap").join("config.toml"))
}

/// Loads the config from `<cwd>/djstrap.toml`, then the user config dir,
/// falling back to defaults when neither exists. The config is entirely
/// optional.
pub fn load(cwd: &Path) -> Result<Config> {
    let project = cwd.join(PROJECT_CONFIG);
    if project.exists() {
        return read(&project);
    }

    if let Some(user) = user_config_path() {
        if user.exists() {
            return read(&user);
        }
    }

    Ok(Config::default())
}

fn read(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_no_config_present() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(dir.path()).unwrap();

        assert_eq!(config.general.venv_dir, "venv");
        assert!(config.general.app_templates);
        assert!(config.github.username.is_none());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(PROJECT_CONFIG),
            "[github]\nusername = \"heitorchang\"\n",
        )
        .unwrap();

        let config = load(dir.path()).unwrap();
        assert_eq!(config.github.username.as_deref(), Some("heitorchang"));
        assert_eq!(config.general.venv_dir, "venv");
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PROJECT_CONFIG), "general = 3\n").unwrap();

        assert!(load(dir.path()).is_err());
    }
}
