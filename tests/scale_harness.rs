//! Cross-run scale harness.
//!
//! # What this covers
//!
//! - **Cross-scenario sharing**: the low and high scenario contribute to
//!   one range per metric, so the dominant run fixes every scenario's
//!   limits.
//! - **Policy selection**: signed metrics get symmetric ranges, magnitude
//!   metrics get zero-anchored ranges.
//! - **Determinism**: recomputation over the same batch is bit-identical,
//!   and adding smaller-magnitude runs never moves a bound.
//! - **Role separation**: ntpq/ptp scales never leak across roles.
//!
//! # Running
//!
//! ```sh
//! cargo test --test scale_harness
//! ```

mod common;
use common::*;

use driftline_core::config::TrackingMetric;
use driftline_core::run::{Role, Scenario};
use driftline_core::scale::AXIS_PADDING;
use driftline_formats::chrony::{self, ChronyParser};
use driftline_formats::ntpq::{self, NtpqParser};
use pretty_assertions::assert_eq;

fn chrony_batch() -> Vec<chrony::ChronyRun> {
    let parser = ChronyParser::new();
    vec![
        parser
            .parse_pair(
                TRACKING_LOW,
                SOURCESTATS_LOW,
                meta(None, Scenario::Low, "chrony_low"),
            )
            .unwrap(),
        parser
            .parse_pair(
                TRACKING_HIGH,
                SOURCESTATS_HIGH,
                meta(None, Scenario::High, "chrony_high"),
            )
            .unwrap(),
    ]
}

#[test]
fn dominant_scenario_fixes_the_shared_range() {
    let scales = chrony::shared_scales(&chrony_batch(), TrackingMetric::SystemTime);

    // The high run's 0.014 s offset dominates both scenarios (in us).
    let tracking = scales.get_unrolled(chrony::METRIC_TRACKING_OFFSET_US).unwrap();
    assert_eq!(tracking.max, 0.014 * 1e6 * (1.0 + AXIS_PADDING));
    assert_eq!(tracking.min, -tracking.max);

    // Sourcestats offset: 4200 us from the high run dominates.
    let offset = scales
        .get_unrolled(chrony::METRIC_SOURCESTATS_OFFSET_US)
        .unwrap();
    assert_eq!(offset.max, 4200.0 * (1.0 + AXIS_PADDING));

    // Std dev is zero-anchored; 2 ms from the low run dominates.
    let stddev = scales
        .get_unrolled(chrony::METRIC_SOURCESTATS_STDDEV_US)
        .unwrap();
    assert_eq!(stddev.min, 0.0);
    assert_eq!(stddev.max, 2000.0 * (1.0 + AXIS_PADDING));
}

#[test]
fn tracking_metric_selection_changes_the_contributing_series() {
    let batch = chrony_batch();
    let system = chrony::shared_scales(&batch, TrackingMetric::SystemTime);
    let last = chrony::shared_scales(&batch, TrackingMetric::LastOffset);

    let system_range = system.get_unrolled(chrony::METRIC_TRACKING_OFFSET_US).unwrap();
    let last_range = last.get_unrolled(chrony::METRIC_TRACKING_OFFSET_US).unwrap();
    assert_eq!(system_range.max, 0.014 * 1e6 * (1.0 + AXIS_PADDING));
    assert_eq!(last_range.max, 0.009 * 1e6 * (1.0 + AXIS_PADDING));
}

#[test]
fn recomputation_is_bit_identical() {
    let batch = chrony_batch();
    let a = chrony::shared_scales(&batch, TrackingMetric::SystemTime);
    let b = chrony::shared_scales(&batch, TrackingMetric::SystemTime);

    for metric in [
        chrony::METRIC_TRACKING_OFFSET_US,
        chrony::METRIC_SOURCESTATS_OFFSET_US,
        chrony::METRIC_SOURCESTATS_STDDEV_US,
    ] {
        let ra = a.get_unrolled(metric).unwrap();
        let rb = b.get_unrolled(metric).unwrap();
        assert_eq!(ra.min.to_bits(), rb.min.to_bits());
        assert_eq!(ra.max.to_bits(), rb.max.to_bits());
    }
}

#[test]
fn smaller_magnitude_runs_never_move_a_bound() {
    let parser = ChronyParser::new();
    let dominant = parser
        .parse_pair(
            TRACKING_HIGH,
            SOURCESTATS_HIGH,
            meta(None, Scenario::High, "chrony_high"),
        )
        .unwrap();

    let alone = chrony::shared_scales(
        std::slice::from_ref(&dominant),
        TrackingMetric::SystemTime,
    );
    let with_low = chrony::shared_scales(&chrony_batch(), TrackingMetric::SystemTime);

    assert_eq!(
        alone.get_unrolled(chrony::METRIC_TRACKING_OFFSET_US),
        with_low.get_unrolled(chrony::METRIC_TRACKING_OFFSET_US)
    );
}

#[test]
fn ntpq_scales_stay_within_their_role() {
    let run = NtpqParser::new()
        .parse(
            NTPQ_CLIENT_LOW,
            meta(Some(Role::Client), Scenario::Low, "ntp_client_low.log"),
        )
        .unwrap();
    let scales = ntpq::shared_scales(std::slice::from_ref(&run));

    let offset = scales.get(Role::Client, ntpq::METRIC_OFFSET_MS).unwrap();
    assert_eq!(offset.max, 2.7943 * (1.0 + AXIS_PADDING));
    assert_eq!(offset.min, -offset.max);

    assert_eq!(scales.get(Role::Boundary, ntpq::METRIC_OFFSET_MS), None);
}
