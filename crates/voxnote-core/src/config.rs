use crate::error::ConfigError;
use crate::types::{RecognitionMode, TargetSpec};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub telegram: Option<TelegramConfig>,

    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub recognition: RecognitionConfig,

    #[serde(default)]
    pub reply: ReplyConfig,

    #[serde(default)]
    pub store: Option<StoreConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub token: String,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,

    #[serde(default = "default_true")]
    pub skip_pending_updates: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AudioConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_channels")]
    pub channels: u16,

    /// Leading window kept from each voice note; `0` keeps everything.
    #[serde(default = "default_max_duration_ms")]
    pub max_duration_ms: u64,

    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    #[serde(default)]
    pub artifact_dir: Option<PathBuf>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            max_duration_ms: default_max_duration_ms(),
            ffmpeg_path: default_ffmpeg_path(),
            artifact_dir: None,
        }
    }
}

impl AudioConfig {
    pub fn target_spec(&self) -> TargetSpec {
        TargetSpec {
            sample_rate_hz: self.sample_rate,
            channels: self.channels,
            max_duration_ms: (self.max_duration_ms > 0).then_some(self.max_duration_ms),
        }
    }

    pub fn artifact_dir(&self) -> PathBuf {
        self.artifact_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RecognitionConfig {
    #[serde(default)]
    pub mode: RecognitionMode,

    #[serde(default = "default_engine")]
    pub engine: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub whisper: Option<WhisperConfig>,

    #[serde(default)]
    pub vosk: Option<VoskConfig>,

    #[serde(default)]
    pub null: Option<toml::Value>,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            mode: RecognitionMode::default(),
            engine: default_engine(),
            timeout_secs: default_timeout_secs(),
            whisper: None,
            vosk: None,
            null: None,
        }
    }
}

impl RecognitionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Engine-specific table handed to the backend's `initialize`.
    pub fn engine_config(&self) -> Result<toml::Value, ConfigError> {
        let value = match self.engine.as_str() {
            "whisper" => match self.whisper {
                Some(ref cfg) => toml::Value::try_from(cfg)
                    .map_err(|e| ConfigError::Invalid(format!("whisper section: {e}")))?,
                None => {
                    return Err(ConfigError::Invalid(
                        "engine 'whisper' requires a [recognition.whisper] section".to_string(),
                    ))
                }
            },
            "vosk" => match self.vosk {
                Some(ref cfg) => toml::Value::try_from(cfg)
                    .map_err(|e| ConfigError::Invalid(format!("vosk section: {e}")))?,
                None => {
                    return Err(ConfigError::Invalid(
                        "engine 'vosk' requires a [recognition.vosk] section".to_string(),
                    ))
                }
            },
            "null" => self
                .null
                .clone()
                .unwrap_or_else(|| toml::Value::Table(Default::default())),
            _ => toml::Value::Table(Default::default()),
        };
        Ok(value)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WhisperConfig {
    pub model_path: String,

    #[serde(default = "default_beam_width")]
    pub beam_width: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VoskConfig {
    pub model_path: String,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grammar: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplyConfig {
    #[serde(default = "default_template")]
    pub template: String,

    #[serde(default = "default_not_recognized")]
    pub not_recognized: String,

    #[serde(default = "default_failure")]
    pub failure: String,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            template: default_template(),
            not_recognized: default_not_recognized(),
            failure: default_failure(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub url: String,
    pub key: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_channels() -> u16 {
    1
}

fn default_max_duration_ms() -> u64 {
    5000
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_engine() -> String {
    "whisper".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_beam_width() -> u32 {
    5
}

fn default_chunk_size() -> u32 {
    4000
}

fn default_template() -> String {
    "📝 Текст: {text}".to_string()
}

fn default_not_recognized() -> String {
    "📝 Текст: не удалось распознать".to_string()
}

fn default_failure() -> String {
    "⚠️ Не удалось обработать голосовое сообщение".to_string()
}

/// Interpolate `${VAR}` patterns with environment variable values.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([^}]+)\}").expect("interpolation pattern is valid");
    let mut result = input.to_string();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(val) => {
                result = result.replace(&cap[0], &val);
            }
            Err(_) => return Err(ConfigError::EnvVarNotFound(var_name.to_string())),
        }
    }

    Ok(result)
}

impl AppConfig {
    /// Load configuration from a TOML file, with environment variable interpolation.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let interpolated = interpolate_env_vars(s)?;
        let config: AppConfig = toml::from_str(&interpolated)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.audio.sample_rate == 0 {
            return Err(ConfigError::Invalid("audio.sample_rate must be > 0".to_string()));
        }
        if self.audio.channels == 0 {
            return Err(ConfigError::Invalid("audio.channels must be > 0".to_string()));
        }
        if let Some(ref whisper) = self.recognition.whisper {
            if whisper.beam_width == 0 {
                return Err(ConfigError::Invalid(
                    "recognition.whisper.beam_width must be > 0".to_string(),
                ));
            }
        }
        if let Some(ref vosk) = self.recognition.vosk {
            if vosk.chunk_size == 0 {
                return Err(ConfigError::Invalid(
                    "recognition.vosk.chunk_size must be > 0".to_string(),
                ));
            }
        }
        match self.recognition.engine.as_str() {
            "whisper" if self.recognition.whisper.is_none() => {
                return Err(ConfigError::Invalid(
                    "engine 'whisper' requires a [recognition.whisper] section".to_string(),
                ));
            }
            "vosk" if self.recognition.vosk.is_none() => {
                return Err(ConfigError::Invalid(
                    "engine 'vosk' requires a [recognition.vosk] section".to_string(),
                ));
            }
            _ => {}
        }
        if !self.reply.template.contains("{text}") {
            tracing::warn!("reply.template has no {{text}} placeholder; replies will omit the transcript");
        }
        Ok(())
    }
}
