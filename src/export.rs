//! CSV export of normalized runs and summary tables.
//!
//! Column layouts are stable per family and documented on each builder.
//! Absent statistics are written as empty cells, never as zeros. Floats use
//! Rust's shortest round-trip `Display`; a NaN sample cell prints as `NaN`
//! and is distinguishable from an absent one.
//!
//! A table with zero data rows is not written at all; callers skip the file
//! rather than leaving a header-only stub behind.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use driftline_core::run::{NoEvent, RunResult};
use driftline_formats::chrony::{SourceStatsSample, TrackingSample, TrackingSummary};
use driftline_formats::ntpq::{NtpSummary, PeerEvent, PeerSample};
use driftline_formats::ptp::{
    BoundarySample, BoundarySummary, ClientSample, ClientSummary, PtpEvent,
};

// ---------------------------------------------------------------------------
// Generic CSV machinery
// ---------------------------------------------------------------------------

/// Write a header plus rows. Returns `Ok(false)` without touching the
/// filesystem when there are no rows.
pub fn write_csv(
    path: &Path,
    header: &[&str],
    rows: &[Vec<String>],
) -> Result<bool> {
    if rows.is_empty() {
        return Ok(false);
    }

    let mut out = String::new();
    push_row(&mut out, header.iter().map(|s| s.to_string()));
    for row in rows {
        push_row(&mut out, row.iter().cloned());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    fs::write(path, out).with_context(|| format!("writing {}", path.display()))?;
    Ok(true)
}

fn push_row(out: &mut String, cells: impl Iterator<Item = String>) {
    let mut first = true;
    for cell in cells {
        if !first {
            out.push(',');
        }
        first = false;
        out.push_str(&quote(&cell));
    }
    out.push('\n');
}

/// Minimal quoting: only cells containing a comma, quote, or newline are
/// wrapped.
fn quote(cell: &str) -> String {
    if cell.contains([',', '"', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn num(v: f64) -> String {
    v.to_string()
}

fn opt(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

fn opt_u32(v: Option<u32>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// chrony tables
// ---------------------------------------------------------------------------

pub const TRACKING_HEADER: [&str; 6] = [
    "iso_ts",
    "t_rel_s",
    "system_time_s",
    "system_time_us",
    "last_offset_s",
    "last_offset_us",
];

pub fn tracking_rows(run: &RunResult<TrackingSample, NoEvent>) -> Vec<Vec<String>> {
    run.samples
        .iter()
        .map(|s| {
            vec![
                s.ts.to_rfc3339(),
                num(s.t_rel_s),
                num(s.system_time_offset_s),
                num(s.system_time_offset_s * 1e6),
                num(s.last_offset_s),
                num(s.last_offset_s * 1e6),
            ]
        })
        .collect()
}

pub const SOURCESTATS_HEADER: [&str; 7] = [
    "iso_ts",
    "t_rel_s",
    "source",
    "offset_s",
    "offset_us",
    "stddev_s",
    "stddev_us",
];

pub fn sourcestats_rows(run: &RunResult<SourceStatsSample, NoEvent>) -> Vec<Vec<String>> {
    run.samples
        .iter()
        .map(|s| {
            vec![
                s.ts.to_rfc3339(),
                num(s.t_rel_s),
                s.source.clone(),
                num(s.offset_s),
                num(s.offset_s * 1e6),
                num(s.stddev_s),
                num(s.stddev_s * 1e6),
            ]
        })
        .collect()
}

pub const TRACKING_SUMMARY_HEADER: [&str; 9] = [
    "scenario",
    "system_time_mean_s",
    "system_time_std_s",
    "system_time_p95_s",
    "system_time_maxabs_s",
    "last_offset_mean_s",
    "last_offset_std_s",
    "last_offset_p95_s",
    "last_offset_maxabs_s",
];

pub fn tracking_summary_rows(summaries: &[TrackingSummary]) -> Vec<Vec<String>> {
    summaries
        .iter()
        .map(|s| {
            vec![
                s.meta.scenario.to_string(),
                opt(s.system_time_mean_s),
                opt(s.system_time_std_s),
                opt(s.system_time_p95_s),
                opt(s.system_time_maxabs_s),
                opt(s.last_offset_mean_s),
                opt(s.last_offset_std_s),
                opt(s.last_offset_p95_s),
                opt(s.last_offset_maxabs_s),
            ]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// ntpq tables
// ---------------------------------------------------------------------------

pub const PEER_SAMPLES_HEADER: [&str; 15] = [
    "hhmmss",
    "t_rel_s",
    "selected",
    "sel_char",
    "remote",
    "refid",
    "stratum",
    "assoc_type",
    "when_s",
    "poll_s",
    "reach_raw",
    "reach_oct",
    "delay_ms",
    "offset_ms",
    "jitter_ms",
];

pub fn peer_sample_rows(run: &RunResult<PeerSample, PeerEvent>) -> Vec<Vec<String>> {
    run.samples
        .iter()
        .map(|s| {
            vec![
                s.hhmmss.clone(),
                num(s.t_rel_s),
                s.selected.to_string(),
                s.sel_char.map(String::from).unwrap_or_default(),
                s.remote.clone(),
                s.refid.clone(),
                s.stratum.to_string(),
                s.assoc_type.clone(),
                opt_u32(s.when_s),
                s.poll_s.to_string(),
                s.reach_raw.clone(),
                opt_u32(s.reach_oct),
                num(s.delay_ms),
                num(s.offset_ms),
                num(s.jitter_ms),
            ]
        })
        .collect()
}

pub const PEER_EVENTS_HEADER: [&str; 5] = ["hhmmss", "t_rel_s", "kind", "detail", "raw"];

pub fn peer_event_rows(run: &RunResult<PeerSample, PeerEvent>) -> Vec<Vec<String>> {
    run.events
        .iter()
        .map(|e| {
            vec![
                e.hhmmss.clone(),
                num(e.t_rel_s),
                e.kind.to_string(),
                e.detail.clone(),
                e.raw.clone(),
            ]
        })
        .collect()
}

pub const NTP_SUMMARY_HEADER: [&str; 13] = [
    "role",
    "scenario",
    "t_first_selected_s",
    "offset_mean_ms_post",
    "offset_std_ms_post",
    "offset_p95_ms_post",
    "offset_maxabs_ms_post",
    "jitter_mean_ms_post",
    "jitter_p95_ms_post",
    "delay_mean_ms_post",
    "delay_p95_ms_post",
    "reach_final_raw",
    "reach_final_oct",
];

pub fn ntp_summary_rows(summaries: &[NtpSummary]) -> Vec<Vec<String>> {
    summaries
        .iter()
        .map(|s| {
            vec![
                s.meta.role.map(|r| r.to_string()).unwrap_or_default(),
                s.meta.scenario.to_string(),
                opt(s.t_first_selected_s),
                opt(s.offset_mean_ms_post),
                opt(s.offset_std_ms_post),
                opt(s.offset_p95_ms_post),
                opt(s.offset_maxabs_ms_post),
                opt(s.jitter_mean_ms_post),
                opt(s.jitter_p95_ms_post),
                opt(s.delay_mean_ms_post),
                opt(s.delay_p95_ms_post),
                s.reach_final_raw.clone().unwrap_or_default(),
                opt_u32(s.reach_final_oct),
            ]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// ptp tables
// ---------------------------------------------------------------------------

pub const BOUNDARY_SAMPLES_HEADER: [&str; 6] = [
    "t_s",
    "t_rel_s",
    "offset_ns",
    "servo_state",
    "freq_ppb",
    "path_delay_ns",
];

pub fn boundary_sample_rows(run: &RunResult<BoundarySample, PtpEvent>) -> Vec<Vec<String>> {
    run.samples
        .iter()
        .map(|s| {
            vec![
                num(s.t_s),
                num(s.t_rel_s),
                s.offset_ns.to_string(),
                s.servo_state.to_string(),
                s.freq_raw.to_string(),
                s.path_delay_ns.to_string(),
            ]
        })
        .collect()
}

pub const CLIENT_SAMPLES_HEADER: [&str; 8] = [
    "t_s",
    "t_rel_s",
    "rms_ns",
    "max_ns",
    "freq_ppb",
    "freq_pm_ppb",
    "path_delay_ns",
    "path_delay_pm_ns",
];

pub fn client_sample_rows(run: &RunResult<ClientSample, PtpEvent>) -> Vec<Vec<String>> {
    run.samples
        .iter()
        .map(|s| {
            vec![
                num(s.t_s),
                num(s.t_rel_s),
                s.rms_ns.to_string(),
                s.max_ns.to_string(),
                s.freq_raw.to_string(),
                s.freq_pm_raw.to_string(),
                s.path_delay_ns.map(|v| v.to_string()).unwrap_or_default(),
                s.path_delay_pm_ns.map(|v| v.to_string()).unwrap_or_default(),
            ]
        })
        .collect()
}

pub const PTP_EVENTS_HEADER: [&str; 7] =
    ["t_s", "t_rel_s", "kind", "port", "from", "to", "detail"];

pub fn ptp_event_rows(events: &[PtpEvent]) -> Vec<Vec<String>> {
    events
        .iter()
        .map(|e| {
            vec![
                num(e.t_s),
                num(e.t_rel_s),
                e.kind.to_string(),
                e.port.map(|p| p.to_string()).unwrap_or_default(),
                e.from.clone().unwrap_or_default(),
                e.to.clone().unwrap_or_default(),
                e.detail.clone().unwrap_or_default(),
            ]
        })
        .collect()
}

pub const BOUNDARY_SUMMARY_HEADER: [&str; 12] = [
    "scenario",
    "convergence_s",
    "fault_count",
    "offset_mean_ns_s2",
    "offset_std_ns_s2",
    "offset_p50_ns_s2",
    "offset_p95_ns_s2",
    "offset_p99_ns_s2",
    "offset_maxabs_ns_s2",
    "path_delay_mean_ns_s2",
    "path_delay_std_ns_s2",
    "source",
];

pub fn boundary_summary_rows(summaries: &[BoundarySummary]) -> Vec<Vec<String>> {
    summaries
        .iter()
        .map(|s| {
            vec![
                s.meta.scenario.to_string(),
                opt(s.convergence_s),
                s.fault_count.to_string(),
                opt(s.offset_mean_ns_s2),
                opt(s.offset_std_ns_s2),
                opt(s.offset_p50_ns_s2),
                opt(s.offset_p95_ns_s2),
                opt(s.offset_p99_ns_s2),
                opt(s.offset_maxabs_ns_s2),
                opt(s.path_delay_mean_ns_s2),
                opt(s.path_delay_std_ns_s2),
                s.meta.source.display().to_string(),
            ]
        })
        .collect()
}

pub const CLIENT_SUMMARY_HEADER: [&str; 13] = [
    "scenario",
    "locked",
    "convergence_s",
    "best_master_reselection_count",
    "rms_mean_ns_post",
    "rms_std_ns_post",
    "rms_p95_ns_post",
    "rms_max_ns_post",
    "max_mean_ns_post",
    "max_max_ns_post",
    "path_delay_mean_ns_post",
    "path_delay_std_ns_post",
    "source",
];

pub fn client_summary_rows(summaries: &[ClientSummary]) -> Vec<Vec<String>> {
    summaries
        .iter()
        .map(|s| {
            vec![
                s.meta.scenario.to_string(),
                s.locked.to_string(),
                opt(s.convergence_s),
                s.best_master_reselection_count.to_string(),
                opt(s.rms_mean_ns_post),
                opt(s.rms_std_ns_post),
                opt(s.rms_p95_ns_post),
                opt(s.rms_max_ns_post),
                opt(s.max_mean_ns_post),
                opt(s.max_max_ns_post),
                opt(s.path_delay_mean_ns_post),
                opt(s.path_delay_std_ns_post),
                s.meta.source.display().to_string(),
            ]
        })
        .collect()
}
