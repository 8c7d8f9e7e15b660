use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "config.toml";
const API_KEY_ENV: &str = "SORTQUEST_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("remote detector requires an api key")]
    MissingApiKey,
    #[error("onnx detector requires a non-empty label list")]
    MissingLabels,
    #[error("camera fps must be greater than zero")]
    ZeroFps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorBackend {
    Remote,
    Onnx,
}

fn default_backend() -> DetectorBackend {
    DetectorBackend::Remote
}

fn default_endpoint() -> String {
    "https://detect.roboflow.com".to_string()
}

fn default_model() -> String {
    "trash-detection-2-4oj4h".to_string()
}

fn default_version() -> String {
    "3".to_string()
}

fn default_confidence() -> u32 {
    50
}

fn default_timeout() -> u64 {
    10
}

fn default_model_path() -> String {
    "model.onnx".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    #[serde(default = "default_backend")]
    pub backend: DetectorBackend,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub api_key: String,
    /// Minimum confidence in percent.
    #[serde(default = "default_confidence")]
    pub confidence: u32,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_model_path")]
    pub model_path: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            endpoint: default_endpoint(),
            model: default_model(),
            version: default_version(),
            api_key: String::new(),
            confidence: default_confidence(),
            timeout_secs: default_timeout(),
            model_path: default_model_path(),
            labels: Vec::new(),
        }
    }
}

fn default_fps() -> u32 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default)]
    pub index: i32,
    #[serde(default = "default_fps")]
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            fps: default_fps(),
        }
    }
}

fn default_cooldown() -> u64 {
    2
}

fn default_feedback() -> u64 {
    2
}

fn default_save_file() -> String {
    "game_data.json".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,
    #[serde(default = "default_feedback")]
    pub feedback_secs: u64,
    #[serde(default = "default_save_file")]
    pub save_file: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown(),
            feedback_secs: default_feedback(),
            save_file: default_save_file(),
        }
    }
}

fn default_http_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: default_http_port(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;

        if config.detector.api_key.is_empty() {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                config.detector.api_key = key;
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.detector.backend {
            DetectorBackend::Remote if self.detector.api_key.is_empty() => {
                return Err(ConfigError::MissingApiKey);
            }
            DetectorBackend::Onnx if self.detector.labels.is_empty() => {
                return Err(ConfigError::MissingLabels);
            }
            _ => {}
        }

        if self.camera.fps == 0 {
            return Err(ConfigError::ZeroFps);
        }

        Ok(())
    }
}
