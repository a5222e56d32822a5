//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default frame-pipeline parameters.
    pub render: RenderDefaults,

    /// Default interactive playback parameters.
    pub playback: PlaybackDefaults,

    /// Default export parameters.
    pub export: ExportDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default frame-pipeline parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDefaults {
    /// Top reflection: values at or below this are treated as cold reflections.
    pub zero_level_threshold: f32,

    /// Top reflection: values at or above this are treated as hot reflections.
    pub max_temp_threshold: f32,

    /// Bottom reflection: temperature a pixel must reach to count as hot.
    pub hot_threshold: f32,

    /// Bottom reflection: fraction of frames a pixel must be hot in to be
    /// considered part of the build.
    pub min_persistence: f64,

    /// Integer upscale factor applied before the overlay.
    pub scale: u32,
}

/// Default interactive playback parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackDefaults {
    /// Delay between presented frames, also the key-poll interval.
    pub frame_delay_ms: u64,

    /// Render every frame up front so seeking is instant.
    pub preload: bool,
}

/// Default export parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    /// Playback speed multiplier relative to realtime.
    pub playback_speed: u32,

    /// Rate at which the thermal camera captured frames (Hz).
    pub realtime_framerate: u32,

    /// Output format name (`ffv1`, `h264`, `mpeg4`).
    pub format: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "meltview=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            zero_level_threshold: 180.0,
            max_temp_threshold: 700.0,
            hot_threshold: 180.0,
            min_persistence: 0.25,
            scale: 1,
        }
    }
}

impl Default for PlaybackDefaults {
    fn default() -> Self {
        Self {
            frame_delay_ms: 1,
            preload: true,
        }
    }
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            playback_speed: 15,
            realtime_framerate: 4,
            format: "ffv1".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("meltview").join("config.json")
}
