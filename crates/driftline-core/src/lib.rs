//! driftline-core — shared model for clock-sync report analysis.
//!
//! This crate holds everything the three format parsers have in common:
//! run identity, the normalized run container, the quantity normalizer,
//! descriptive statistics, the cross-run axis-scale calculator, the error
//! taxonomy, and configuration.
//!
//! # Architecture
//!
//! ```text
//! Parser ──► RunResult ──► { Summary Engine, Scale Calculator } ──► render/export
//! ```
//!
//! Parsing is batch-oriented and single-threaded: all inputs of a batch are
//! parsed before any cross-run statistic is computed, because shared axis
//! ranges need every run's samples.

pub mod config;
pub mod error;
pub mod quantity;
pub mod run;
pub mod scale;
pub mod stats;

pub use config::{AnalysisConfig, TrackingMetric};
pub use error::{Error, Result};
pub use run::{NoEvent, Role, RunMeta, RunResult, Scenario};
pub use scale::{axis_range, AxisRange, ScalePolicy, SharedScales};
