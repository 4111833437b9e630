//! Configuration file support for huddle
//!
//! Reads from .huddle/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Directory holding config.toml and the JSON collections
pub const HUDDLE_DIR: &str = ".huddle";

/// Environment variable overriding where the collections live
pub const DATA_DIR_ENV: &str = "HUDDLE_DATA_DIR";

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    /// Team roster and the choices offered in forms
    #[serde(default)]
    pub team: TeamConfig,

    /// Dashboard server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Team weather settings
    #[serde(default)]
    pub weather: WeatherConfig,
}

/// Who is on the team and where they work
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TeamConfig {
    /// Names allowed to submit. Empty accepts any non-blank name.
    #[serde(default)]
    pub members: Vec<String>,

    /// Sites a check-in may name. Empty accepts any non-blank site.
    #[serde(default = "default_sites")]
    pub sites: Vec<String>,

    /// Roles a check-in may name. Empty accepts any non-blank role.
    #[serde(default = "default_roles")]
    pub roles: Vec<String>,
}

fn default_sites() -> Vec<String> {
    vec!["Site A".to_string(), "Site B".to_string(), "Site C".to_string()]
}

fn default_roles() -> Vec<String> {
    ["Technician", "Biologist", "Secretary", "Courier", "Manager"]
        .iter()
        .map(|r| r.to_string())
        .collect()
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            members: Vec::new(),
            sites: default_sites(),
            roles: default_roles(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Default: 127.0.0.1
    #[serde(default = "default_host")]
    pub host: String,

    /// Default: 3030
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3030
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WeatherConfig {
    /// Trailing window in days, today included. Default: 7
    #[serde(default = "default_window_days")]
    pub window_days: u32,
}

fn default_window_days() -> u32 {
    7
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
        }
    }
}

impl Config {
    /// Load config from .huddle/config.toml
    /// Returns default config if file doesn't exist
    pub fn load() -> Self {
        if let Some(path) = Self::find_config_path() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config")
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cannot read config")
                }
            }
        }
        Self::default()
    }

    /// Find config.toml by walking up directory tree
    fn find_config_path() -> Option<PathBuf> {
        let path = find_huddle_dir()?.join("config.toml");
        path.exists().then_some(path)
    }

    /// Check whether a name may submit records
    pub fn is_member(&self, name: &str) -> bool {
        allows(&self.team.members, name)
    }

    pub fn is_site(&self, site: &str) -> bool {
        allows(&self.team.sites, site)
    }

    pub fn is_role(&self, role: &str) -> bool {
        allows(&self.team.roles, role)
    }
}

fn allows(choices: &[String], value: &str) -> bool {
    choices.is_empty() || choices.iter().any(|c| c == value)
}

/// Walk up directory tree to find the .huddle folder (like git finds .git)
fn find_huddle_dir() -> Option<PathBuf> {
    let current_dir = std::env::current_dir().ok()?;
    let mut dir = current_dir.as_path();

    loop {
        let candidate = dir.join(HUDDLE_DIR);
        if candidate.is_dir() {
            return Some(candidate);
        }

        match dir.parent() {
            Some(parent) => dir = parent,
            None => break,
        }
    }
    None
}

/// Directory the JSON collections are read from and written to.
/// HUDDLE_DATA_DIR wins, then the nearest .huddle folder, then ./.huddle
pub fn data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(path);
    }
    find_huddle_dir().unwrap_or_else(|| PathBuf::from(HUDDLE_DIR))
}
