//! driftline-formats — the three report parsers.
//!
//! Each module owns one input family end to end: line grammar, sample and
//! event types, the per-run summary, and the batch-wide shared axis scales
//! for its metrics.
//!
//! ```text
//! chrony  ──► TrackingSample / SourceStatsSample      (no events)
//! ntpq    ──► PeerSample + PeerEvent                  (snapshot reduction)
//! ptp     ──► BoundarySample | ClientSample + PtpEvent
//! ```
//!
//! All three share the conventions of `driftline-core`: samples and events
//! of a run sit on one relative time base starting at zero, unrecognized
//! lines are counted and skipped, and malformed values inside recognized
//! lines are hard errors.

pub mod chrony;
pub mod ntpq;
pub mod ptp;
