//! Export harness.
//!
//! # What this covers
//!
//! - **Column contracts**: each table's header matches its row builder.
//! - **Absent-not-zero on disk**: absent statistics are empty cells; NaN
//!   samples print as `NaN` and stay distinguishable from absent.
//! - **Empty-table suppression**: zero-row tables produce no file.
//! - **Plot specs**: JSON sidecars carry series data and shared limits,
//!   and parse back as valid JSON.
//!
//! # Running
//!
//! ```sh
//! cargo test --test export_harness
//! ```

mod common;
use common::*;

use driftline::export;
use driftline::plot;
use driftline_core::config::TrackingMetric;
use driftline_core::run::Scenario;
use driftline_formats::chrony::{self, ChronyParser};
use pretty_assertions::assert_eq;

fn low_run() -> chrony::ChronyRun {
    ChronyParser::new()
        .parse_pair(
            TRACKING_LOW,
            SOURCESTATS_LOW,
            meta(None, Scenario::Low, "chrony_low"),
        )
        .unwrap()
}

#[test]
fn tracking_table_round_trips_with_nan_cells() {
    let run = low_run();
    let rows = export::tracking_rows(&run.tracking);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].len(), export::TRACKING_HEADER.len());

    // Sample 2 has no last offset; the cell is the NaN marker, not empty
    // and not zero.
    assert_eq!(rows[1][4], "NaN");
    assert_eq!(rows[0][2], "-0.002");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracking.csv");
    assert!(export::write_csv(&path, &export::TRACKING_HEADER, &rows).unwrap());

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "iso_ts,t_rel_s,system_time_s,system_time_us,last_offset_s,last_offset_us"
    );
    assert_eq!(lines.count(), 2);
}

#[test]
fn summary_table_writes_absent_cells_empty() {
    let run = low_run();
    let summary = chrony::summarize_tracking(&run.tracking);
    let rows = export::tracking_summary_rows(std::slice::from_ref(&summary));

    // last_offset_std_s is absent (single finite value), so the cell is
    // empty.
    assert_eq!(rows[0][6], "");
    assert_eq!(rows[0][0], "low");
    assert_ne!(rows[0][1], "");
}

#[test]
fn canonical_unit_cells_round_trip_exactly() {
    let run = low_run();
    let rows = export::sourcestats_rows(&run.sourcestats);

    // Shortest-representation float formatting must parse back to the
    // identical value for every canonical-unit (seconds) cell.
    for (sample, row) in run.sourcestats.samples.iter().zip(&rows) {
        assert_eq!(row[3].parse::<f64>().unwrap(), sample.offset_s);
        assert_eq!(row[5].parse::<f64>().unwrap(), sample.stddev_s);
        assert_eq!(row[1].parse::<f64>().unwrap(), sample.t_rel_s);
    }
}

#[test]
fn empty_tables_leave_no_file_behind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("summary.csv");
    assert!(!export::write_csv(&path, &export::TRACKING_SUMMARY_HEADER, &[]).unwrap());
    assert!(!path.exists());
}

#[test]
fn plot_specs_serialize_with_shared_limits() {
    let run = low_run();
    let scales = chrony::shared_scales(std::slice::from_ref(&run), TrackingMetric::SystemTime);
    let specs = plot::chrony_plots(&run, TrackingMetric::SystemTime, &scales);
    assert_eq!(specs.len(), 3);

    let dir = tempfile::tempdir().unwrap();
    for spec in &specs {
        assert!(spec.write(dir.path()).unwrap());
    }

    let json: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("chrony_low_tracking_offset.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(json["xlabel"], "time (s, relative)");
    assert_eq!(json["x"].as_array().unwrap().len(), 2);
    // Symmetric shared limits around the dominant |offset| of 2000 us.
    let max = json["ylim"]["max"].as_f64().unwrap();
    assert!((max - 2100.0).abs() < 1e-9);
    assert_eq!(json["ylim"]["min"].as_f64().unwrap(), -max);
}
