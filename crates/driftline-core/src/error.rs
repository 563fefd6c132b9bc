//! Error taxonomy shared across the driftline pipeline.
//!
//! Everything that can fail a *run* lives here. Soft skips (lines that match
//! none of a format's grammars) are deliberately not errors; parsers count
//! them and report via `tracing::debug!`.

use std::path::PathBuf;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal conditions for a single run.
///
/// A per-run failure never aborts the batch; the batch driver records it and
/// keeps processing the remaining inputs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A unit-suffixed numeric token failed full-token parsing.
    #[error("cannot parse quantity: {token:?}")]
    MalformedQuantity { token: String },

    /// Role or scenario could not be resolved for an input. Reported before
    /// any parsing of that input proceeds.
    #[error("cannot infer {missing} from input name: {name:?} (force it explicitly)")]
    AmbiguousMetadata { name: String, missing: &'static str },

    /// A required paired report is absent (e.g. tracking without its
    /// stats-of-sources sibling).
    #[error("missing companion report for {path:?}: expected {expected:?}")]
    MissingCompanion { path: PathBuf, expected: PathBuf },

    /// A line matched a classification grammar but one of its fields violated
    /// the stated field contract.
    #[error("line {line_no}: {reason}")]
    Format { line_no: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
