use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Ok, Result};
use glob::Pattern;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = ".dmdescrc.json";

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Interfaces never treated as provided services.
    #[serde(default = "default_ignored_interfaces")]
    pub ignored_interfaces: Vec<String>,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub continue_on_error: bool,
    #[serde(default = "default_verify_filters")]
    pub verify_filters: bool,
}

fn default_ignored_interfaces() -> Vec<String> {
    vec!["scala.ScalaObject".to_string()]
}

fn default_output_dir() -> String {
    "META-INF/dependencymanager".to_string()
}

fn default_verify_filters() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ignored_interfaces: default_ignored_interfaces(),
            output_dir: default_output_dir(),
            continue_on_error: false,
            verify_filters: default_verify_filters(),
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns an error if any pattern in `ignoredInterfaces` is not a valid glob.
    pub fn validate(&self) -> Result<()> {
        self.ignored_interface_patterns().map(|_| ())
    }

    pub fn ignored_interface_patterns(&self) -> Result<Vec<Pattern>> {
        self.ignored_interfaces
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).with_context(|| {
                    format!("Invalid glob pattern in 'ignoredInterfaces': \"{}\"", pattern)
                })
            })
            .collect()
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// True if config was loaded from a file, false if using defaults.
    pub from_file: bool,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config.validate()?;
            Ok(ConfigLoadResult {
                config,
                from_file: true,
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            from_file: false,
        }),
    }
}
