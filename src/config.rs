use crate::handlers::password;
use crate::reminders::DEFAULT_POLL_INTERVAL;
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CONFIG_ENV: &str = "UTILBOT_CONFIG";
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";
pub const TODO_FILE_ENV: &str = "UTILBOT_TODO_FILE";

/// Longest poll interval that still samples every minute.
pub const MAX_POLL_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl Units {
    pub fn as_str(self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Standard => "standard",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
            Units::Standard => "K",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            "standard" => Ok(Units::Standard),
            other => Err(anyhow!("unknown unit system '{}' (metric, imperial, standard)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub weather_api_key: Option<String>,
    pub weather_base_url: String,
    pub weather_units: Units,
    pub wiki_base_url: String,
    pub wiki_sentences: u32,
    pub todo_path: PathBuf,
    pub poll_interval_secs: u64,
    pub password_length: usize,
    pub http_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weather_api_key: None,
            weather_base_url: "https://api.openweathermap.org".to_string(),
            weather_units: Units::Metric,
            wiki_base_url: "https://en.wikipedia.org".to_string(),
            wiki_sentences: 2,
            todo_path: PathBuf::from("todo.json"),
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            password_length: password::DEFAULT_LENGTH,
            http_timeout_secs: 10,
        }
    }
}

pub const KEYS: [&str; 9] = [
    "weather_api_key",
    "weather_base_url",
    "weather_units",
    "wiki_base_url",
    "wiki_sentences",
    "todo_path",
    "poll_interval_secs",
    "password_length",
    "http_timeout_secs",
];

impl Config {
    /// `$UTILBOT_CONFIG`, else `<config dir>/utilbot/config.toml`.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("utilbot")
            .join("config.toml")
    }

    /// Read the file if it exists; a missing file means defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = match fs::read_to_string(path) {
            Ok(content) => toml::from_str::<Config>(&content)
                .with_context(|| format!("invalid config file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(e) => {
                return Err(e).with_context(|| format!("cannot read {}", path.display()));
            }
        };
        config.clamp();
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("cannot write {}", path.display()))?;
        Ok(())
    }

    /// Environment variables win over the file.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.weather_api_key = Some(key);
            }
        }
        if let Ok(path) = std::env::var(TODO_FILE_ENV) {
            if !path.trim().is_empty() {
                self.todo_path = PathBuf::from(path);
            }
        }
    }

    fn clamp(&mut self) {
        self.poll_interval_secs = self.poll_interval_secs.clamp(1, MAX_POLL_INTERVAL_SECS);
        self.http_timeout_secs = self.http_timeout_secs.max(1);
        self.wiki_sentences = self.wiki_sentences.max(1);
        self.password_length = self.password_length.clamp(1, password::MAX_LENGTH);
    }

    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "weather_api_key" => self.weather_api_key.clone().unwrap_or_default(),
            "weather_base_url" => self.weather_base_url.clone(),
            "weather_units" => self.weather_units.to_string(),
            "wiki_base_url" => self.wiki_base_url.clone(),
            "wiki_sentences" => self.wiki_sentences.to_string(),
            "todo_path" => self.todo_path.display().to_string(),
            "poll_interval_secs" => self.poll_interval_secs.to_string(),
            "password_length" => self.password_length.to_string(),
            "http_timeout_secs" => self.http_timeout_secs.to_string(),
            other => bail!("unknown config key '{}'", other),
        };
        Ok(value)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "weather_api_key" => {
                self.weather_api_key = Some(value.to_string()).filter(|v| !v.is_empty())
            }
            "weather_base_url" => self.weather_base_url = value.to_string(),
            "weather_units" => self.weather_units = value.parse()?,
            "wiki_base_url" => self.wiki_base_url = value.to_string(),
            "wiki_sentences" => self.wiki_sentences = parse_number(key, value)?,
            "todo_path" => self.todo_path = PathBuf::from(value),
            "poll_interval_secs" => self.poll_interval_secs = parse_number(key, value)?,
            "password_length" => self.password_length = parse_number(key, value)?,
            "http_timeout_secs" => self.http_timeout_secs = parse_number(key, value)?,
            other => bail!("unknown config key '{}'", other),
        }
        self.clamp();
        Ok(())
    }

    /// Reset one key to its default.
    pub fn unset(&mut self, key: &str) -> Result<()> {
        let defaults = Config::default();
        let value = defaults.get(key)?;
        if key == "weather_api_key" {
            self.weather_api_key = None;
            return Ok(());
        }
        self.set(key, &value)
    }

    /// All keys and values for listing. The API key is masked.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        KEYS.iter()
            .map(|&key| {
                let value = if key == "weather_api_key" {
                    mask(self.weather_api_key.as_deref())
                } else {
                    self.get(key).unwrap_or_default()
                };
                (key, value)
            })
            .collect()
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| anyhow!("'{}' expects a number, got '{}'", key, value))
}

fn mask(secret: Option<&str>) -> String {
    match secret {
        None => "(not set)".to_string(),
        Some(s) => {
            let tail: String = s.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
            format!("****{}", tail)
        }
    }
}
