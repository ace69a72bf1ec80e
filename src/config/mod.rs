// src/config/mod.rs
use crate::acquisition::FailurePolicy;
use crate::error::{EcgError, Result};
use crate::processing::beats::BEAT_WINDOW_LEN;
use crate::processing::detectors::ThresholdPolicy;
use crate::processing::filters::FilterConfig;
use crate::processing::pipeline::ProcessingSettings;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub processor: ProcessorConfig,
    pub filter: FilterConfig,
    pub detector: ThresholdPolicy,
    pub segmenter: SegmenterConfig,
    pub classifier: ClassifierConfig,
    pub acquisition: AcquisitionConfig,
    pub offline: OfflineConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProcessorConfig {
    pub fs: f64,
    pub log_level: String,
    pub enable_debug_logging: bool,
    pub session_log: String,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            fs: 125.0,
            log_level: "info".to_string(),
            enable_debug_logging: false,
            session_log: "ecg_session.csv".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SegmenterConfig {
    pub window_length: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            window_length: BEAT_WINDOW_LEN,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct ClassifierConfig {
    /// CSV of reference beats, one row per class. No classification without it.
    pub templates_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AcquisitionConfig {
    pub host: String,
    pub poll_interval_ms: u64,
    pub timeout_ms: u64,
    pub failure_policy: FailurePolicy,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1:3000".to_string(),
            poll_interval_ms: 1000,
            timeout_ms: 2000,
            failure_policy: FailurePolicy::Stop,
        }
    }
}

impl AcquisitionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Which part of a recording file becomes the signal.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct OfflineConfig {
    /// Overrides the ECG column of multi-column files.
    pub column: Option<usize>,
    pub start_row: usize,
    pub end_row: Option<usize>,
    pub max_samples: Option<usize>,
    pub has_header: bool,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            column: None,
            start_row: 0,
            end_row: None,
            max_samples: Some(500),
            has_header: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub window_size: usize,
    pub step: usize,
    pub column: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            window_size: 1100,
            step: 60,
            column: 0,
        }
    }
}

impl Config {
    pub fn processing_settings(&self) -> ProcessingSettings {
        ProcessingSettings {
            filter: self.filter.clone(),
            threshold: self.detector,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let fs = self.processor.fs;
        if !(fs > 0.0) || !fs.is_finite() {
            return Err(EcgError::InvalidConfig(format!(
                "processor.fs must be positive, got {}",
                fs
            )));
        }
        self.filter.validate(fs)?;
        if self.segmenter.window_length == 0 {
            return Err(EcgError::InvalidConfig(
                "segmenter.window_length must be at least 1".to_string(),
            ));
        }
        if self.server.window_size == 0 {
            return Err(EcgError::InvalidConfig(
                "server.window_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let config_str = fs::read_to_string(path)?;
    let config: Config = serde_yaml::from_str(&config_str)?;
    config.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(config: &Config, path: P) -> Result<()> {
    let yaml = serde_yaml::to_string(config)?;
    fs::write(path, yaml)?;
    Ok(())
}
