//! Configuration management - handles user settings and persistence

use crate::compressor::CompressionSettings;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_MAX_DIMENSION: u32 = 800;
pub const DEFAULT_JPEG_QUALITY: u8 = 70;

/// User configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Longest edge allowed after compression, in pixels
    pub max_dimension: u32,
    /// JPEG quality, 1-100
    pub jpeg_quality: u8,
    /// Overrides where the gallery is stored
    pub storage_dir: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            storage_dir: None,
        }
    }
}

impl Config {
    /// Get the config directory path (OS-specific)
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("orion-gallery")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.json")
    }

    /// Get the log directory path
    pub fn log_dir() -> PathBuf {
        Self::config_dir().join("logs")
    }

    /// Directory holding the persisted gallery
    pub fn storage_path(&self) -> PathBuf {
        match &self.storage_dir {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => Self::config_dir().join("storage"),
        }
    }

    /// Load config from file, or return default
    pub fn load() -> Self {
        let path = Self::config_path();
        if path.exists() {
            if let Ok(contents) = fs::read_to_string(&path) {
                match serde_json::from_str(&contents) {
                    Ok(config) => return config,
                    Err(e) => log::warn!("Ignoring malformed config {}: {}", path.display(), e),
                }
            }
        }
        Self::default()
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;

        Ok(())
    }

    /// Compression parameters with out-of-range values clamped
    pub fn compression(&self) -> CompressionSettings {
        CompressionSettings {
            max_dimension: self.max_dimension.max(1),
            quality: self.jpeg_quality.clamp(1, 100),
        }
    }
}
