//! Configuration types for driftline.
//!
//! [`AnalysisConfig::load`] reads `~/.config/driftline/config.toml`, creating
//! it with hardcoded defaults if it does not yet exist.
//! [`AnalysisConfig::defaults`] returns the same defaults without touching
//! the filesystem (useful in tests). The resolved config is passed explicitly
//! into batch/export invocations; nothing here is process-wide state.

use serde::Deserialize;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[output]
outdir = "analysis"

[chrony]
tracking_metric = "system_time"
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level analysis configuration, loaded from
/// `~/.config/driftline/config.toml` and overridable per-invocation from the
/// CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub chrony: ChronyConfig,
}

/// `[output]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Base directory receiving `parser_*/` tables and `plots_*/` specs.
    #[serde(default = "default_outdir")]
    pub outdir: PathBuf,
}

fn default_outdir() -> PathBuf {
    PathBuf::from("analysis")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            outdir: default_outdir(),
        }
    }
}

/// `[chrony]` section of `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChronyConfig {
    /// Which tracking metric is plotted as "offset".
    #[serde(default)]
    pub tracking_metric: TrackingMetric,
}

/// Which of the two tracking metrics represents the effective clock error
/// of the node. `system_time` is the default because it is the deviation of
/// the system clock itself, not just the last measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingMetric {
    #[default]
    SystemTime,
    LastOffset,
}

impl std::str::FromStr for TrackingMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "system_time" => Ok(TrackingMetric::SystemTime),
            "last_offset" => Ok(TrackingMetric::LastOffset),
            other => Err(format!(
                "unknown tracking metric {other:?} (expected system_time|last_offset)"
            )),
        }
    }
}

impl AnalysisConfig {
    /// Load from `~/.config/driftline/config.toml`, layered on top of the
    /// built-in defaults. Creates the file with defaults if it does not
    /// exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path();

        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, DEFAULT_CONFIG.trim_start())?;
        }

        config::Config::builder()
            .add_source(config::File::from_str(
                DEFAULT_CONFIG,
                config::FileFormat::Toml,
            ))
            .add_source(config::File::from(path.as_path()).required(false))
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(
                DEFAULT_CONFIG,
                config::FileFormat::Toml,
            ))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("driftline")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
