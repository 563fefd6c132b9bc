//! driftline — normalizes clock-sync reports into comparable time series.
//!
//! The parsing and statistics live in the workspace crates; this crate is
//! the batch layer on top of them:
//!
//! ```text
//! inputs ──► batch (parse, isolate failures)
//!               ├──► export  (CSV tables, summaries)
//!               └──► plot    (JSON plot specs with shared y-limits)
//! ```

pub mod batch;
pub mod export;
pub mod plot;

pub use batch::{BatchOptions, BatchReport};
pub use plot::PlotSpec;
