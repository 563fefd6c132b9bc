//! Parser integration harness.
//!
//! # What this covers
//!
//! - **chrony tracking**: block flushing, slow/fast sign convention, NaN
//!   for a metric absent from its block, metric-less blocks dropped.
//! - **chrony sourcestats**: unit-suffixed quantities normalized to
//!   seconds, rows recognized only inside a table.
//! - **ntpq**: snapshot reduction to one authoritative row, selection
//!   marker precedence, reach reinterpretation, `.INIT.`/selection events.
//! - **ptp4l**: line classification priority, per-role sample grammars,
//!   shared time base across samples and events.
//! - **Soft-skip invariant**: noise lines in every corpus never abort a
//!   parse and never become samples.
//!
//! # What this does NOT cover
//!
//! - Batch orchestration and export (see `batch_harness` and
//!   `export_harness`).
//!
//! # Running
//!
//! ```sh
//! cargo test --test normalization_harness
//! ```

mod common;
use common::*;

use driftline_core::run::{Role, Scenario};
use driftline_formats::chrony::ChronyParser;
use driftline_formats::ntpq::{NtpqParser, PeerEventKind};
use driftline_formats::ptp::{PtpEventKind, PtpParser};
use pretty_assertions::assert_eq;

// ---------------------------------------------------------------------------
// chrony
// ---------------------------------------------------------------------------

#[test]
fn tracking_blocks_become_signed_samples() {
    let run = ChronyParser::new()
        .parse_tracking(TRACKING_LOW, meta(None, Scenario::Low, "chrony_low"))
        .unwrap();

    // Block 3 carried no metric and is dropped.
    assert_eq!(run.samples.len(), 2);
    assert_timeline!(run.samples, |s| s.t_rel_s);
    assert_eq!(run.samples[1].t_rel_s, 10.0);

    // slow of NTP time means the local clock is behind: negative.
    assert_close!(run.samples[0].system_time_offset_s, -0.002);
    assert_close!(run.samples[1].system_time_offset_s, 0.0015);

    // Absent metric is NaN in the series, not zero.
    assert_close!(run.samples[0].last_offset_s, -0.000424827);
    assert!(run.samples[1].last_offset_s.is_nan());
}

#[test]
fn sourcestats_quantities_normalize_to_seconds() {
    let run = ChronyParser::new()
        .parse_sourcestats(SOURCESTATS_LOW, meta(None, Scenario::Low, "chrony_low"))
        .unwrap();

    assert_eq!(run.samples.len(), 3);
    assert_close!(run.samples[0].offset_s, -1.1e-5, 1e-15);
    assert_close!(run.samples[1].offset_s, -3.28e-7, 1e-15);
    assert_close!(run.samples[1].stddev_s, 0.002, 1e-15);
    // Bare numbers and explicit `s` both mean seconds.
    assert_close!(run.samples[2].offset_s, 0.001, 1e-15);
}

// ---------------------------------------------------------------------------
// ntpq
// ---------------------------------------------------------------------------

#[test]
fn snapshots_reduce_to_one_row_each() {
    let run = NtpqParser::new()
        .parse(
            NTPQ_CLIENT_LOW,
            meta(Some(Role::Client), Scenario::Low, "ntp_client_low.log"),
        )
        .unwrap();

    // Three snapshots, three samples; the backup row and the noise line
    // contribute nothing.
    assert_eq!(run.samples.len(), 3);
    assert_timeline!(run.samples, |s| s.t_rel_s);
    assert!(run.samples.iter().all(|s| s.remote == "serverntp"));

    assert!(!run.samples[0].selected);
    assert!(run.samples[1].selected);
    assert_eq!(run.samples[1].reach_oct, Some(254));
    assert_eq!(run.samples[2].reach_oct, Some(255));
}

#[test]
fn init_then_lock_produces_the_expected_events() {
    let run = NtpqParser::new()
        .parse(
            NTPQ_CLIENT_LOW,
            meta(Some(Role::Client), Scenario::Low, "ntp_client_low.log"),
        )
        .unwrap();

    let kinds: Vec<_> = run.events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            PeerEventKind::Init,
            PeerEventKind::SelectedPeer,
            PeerEventKind::SelectedPeer,
        ]
    );
    assert_eq!(run.events[1].t_rel_s, 10.0);
    assert_eq!(run.events[1].detail, "serverntp");
}

// ---------------------------------------------------------------------------
// ptp4l
// ---------------------------------------------------------------------------

#[test]
fn boundary_log_classifies_in_priority_order() {
    let run = PtpParser::new()
        .parse_boundary(
            PTP_BOUNDARY_LOW,
            meta(Some(Role::Boundary), Scenario::Low, "ptp_boundary_low.log"),
        )
        .unwrap();

    assert_eq!(run.samples.len(), 3);
    assert_eq!(run.events.len(), 4);

    // The FAULT_DETECTED keyword sits inside a state-transition line, and
    // the transition classification wins.
    let last = run.events.last().unwrap();
    assert_eq!(last.kind, PtpEventKind::StateTransition);
    assert_eq!(last.to.as_deref(), Some("FAULTY"));

    // Time base is shared: the earliest event anchors t_rel for samples.
    assert_eq!(run.events[0].t_rel_s, 0.0);
    assert_eq!(run.samples[0].t_rel_s, 3.0);
}

#[test]
fn client_log_handles_the_optional_delay_tail() {
    let run = PtpParser::new()
        .parse_client(
            PTP_CLIENT_LOW,
            meta(Some(Role::Client), Scenario::Low, "ptp_client_low.log"),
        )
        .unwrap();

    assert_eq!(run.samples.len(), 3);
    assert_eq!(run.samples[1].path_delay_ns, Some(9120));
    assert_eq!(run.samples[1].path_delay_pm_ns, Some(44));
    assert_eq!(run.samples[2].path_delay_ns, None);
}
