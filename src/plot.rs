//! Plot specifications.
//!
//! Rendering is out of scope for this tool: each plot is emitted as a JSON
//! sidecar carrying the series data, labels, and the shared y-axis limits
//! computed over the whole batch. An external renderer consumes these specs
//! verbatim; everything that affects visual comparability (limits, titles,
//! units) is decided here.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use driftline_core::run::{Role, RunResult};
use driftline_core::scale::{AxisRange, SharedScales};
use driftline_formats::chrony::{self, ChronyRun};
use driftline_formats::ntpq::{self, PeerEvent, PeerSample};
use driftline_formats::ptp::{self, BoundarySample, ClientSample, PtpEvent};

/// One plot, self-contained. `ylim` is absent when no run in the batch had
/// finite values for the metric; renderers auto-scale in that case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotSpec {
    pub file_stem: String,
    pub title: String,
    pub xlabel: String,
    pub ylabel: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub ylim: Option<AxisRange>,
}

const XLABEL: &str = "time (s, relative)";

impl PlotSpec {
    fn new(
        file_stem: String,
        title: String,
        ylabel: &str,
        series: impl Iterator<Item = (f64, f64)>,
        ylim: Option<AxisRange>,
    ) -> Self {
        let (x, y): (Vec<f64>, Vec<f64>) = series.unzip();
        Self {
            file_stem,
            title,
            xlabel: XLABEL.to_string(),
            ylabel: ylabel.to_string(),
            x,
            y,
            ylim,
        }
    }

    /// Write the spec as `<outdir>/<file_stem>.json`. Specs with no data
    /// points are skipped, mirroring the CSV exporter.
    pub fn write(&self, outdir: &Path) -> Result<bool> {
        if self.x.is_empty() {
            return Ok(false);
        }
        fs::create_dir_all(outdir)
            .with_context(|| format!("creating plot directory {}", outdir.display()))?;
        let path = outdir.join(format!("{}.json", self.file_stem));
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// chrony
// ---------------------------------------------------------------------------

/// Tracking offset and sourcestats offset/std-dev plots for one run, in
/// microseconds. The tracking series plots whichever metric the config
/// selected; NaN samples stay in the series so the renderer shows gaps.
pub fn chrony_plots(
    run: &ChronyRun,
    tracking_metric: driftline_core::TrackingMetric,
    scales: &SharedScales,
) -> Vec<PlotSpec> {
    let label = run.tracking.meta.label();

    let tracking = PlotSpec::new(
        format!("chrony_{label}_tracking_offset"),
        format!("chrony tracking offset ({label})"),
        "offset (us)",
        run.tracking.samples.iter().map(|s| {
            let v = match tracking_metric {
                driftline_core::TrackingMetric::SystemTime => s.system_time_offset_s,
                driftline_core::TrackingMetric::LastOffset => s.last_offset_s,
            };
            (s.t_rel_s, v * 1e6)
        }),
        scales.get_unrolled(chrony::METRIC_TRACKING_OFFSET_US),
    );

    let offset = PlotSpec::new(
        format!("chrony_{label}_sourcestats_offset"),
        format!("chrony sourcestats offset ({label})"),
        "offset (us)",
        run.sourcestats
            .samples
            .iter()
            .map(|s| (s.t_rel_s, s.offset_s * 1e6)),
        scales.get_unrolled(chrony::METRIC_SOURCESTATS_OFFSET_US),
    );

    let stddev = PlotSpec::new(
        format!("chrony_{label}_sourcestats_stddev"),
        format!("chrony sourcestats std dev ({label})"),
        "std dev (us)",
        run.sourcestats
            .samples
            .iter()
            .map(|s| (s.t_rel_s, s.stddev_s * 1e6)),
        scales.get_unrolled(chrony::METRIC_SOURCESTATS_STDDEV_US),
    );

    vec![tracking, offset, stddev]
}

// ---------------------------------------------------------------------------
// ntpq
// ---------------------------------------------------------------------------

pub fn ntpq_plots(run: &RunResult<PeerSample, PeerEvent>, scales: &SharedScales) -> Vec<PlotSpec> {
    let label = run.meta.label();
    let role = run.meta.role;

    let lookup = |metric: &str| role.and_then(|r| scales.get(r, metric));

    let metric_plot = |suffix: &str, ylabel: &str, f: fn(&PeerSample) -> f64, metric: &str| {
        PlotSpec::new(
            format!("ntp_{label}_{suffix}"),
            format!("ntpq {suffix} ({label})"),
            ylabel,
            run.samples.iter().map(|s| (s.t_rel_s, f(s))),
            lookup(metric),
        )
    };

    vec![
        metric_plot("offset", "offset (ms)", |s| s.offset_ms, ntpq::METRIC_OFFSET_MS),
        metric_plot("jitter", "jitter (ms)", |s| s.jitter_ms, ntpq::METRIC_JITTER_MS),
        metric_plot("delay", "delay (ms)", |s| s.delay_ms, ntpq::METRIC_DELAY_MS),
    ]
}

// ---------------------------------------------------------------------------
// ptp
// ---------------------------------------------------------------------------

pub fn ptp_boundary_plots(
    run: &RunResult<BoundarySample, PtpEvent>,
    scales: &SharedScales,
) -> Vec<PlotSpec> {
    let label = run.meta.label();

    let offset = PlotSpec::new(
        format!("ptp_{label}_offset"),
        format!("ptp4l master offset ({label})"),
        "offset (ns)",
        run.samples.iter().map(|s| (s.t_rel_s, s.offset_ns as f64)),
        scales.get(Role::Boundary, ptp::METRIC_OFFSET_NS),
    );

    // Locked-servo view of the same metric, on the same shared limits.
    let offset_s2 = PlotSpec::new(
        format!("ptp_{label}_offset_s2"),
        format!("ptp4l master offset, servo locked ({label})"),
        "offset (ns)",
        run.samples
            .iter()
            .filter(|s| s.is_locked())
            .map(|s| (s.t_rel_s, s.offset_ns as f64)),
        scales.get(Role::Boundary, ptp::METRIC_OFFSET_NS),
    );

    let path_delay = PlotSpec::new(
        format!("ptp_{label}_path_delay"),
        format!("ptp4l path delay ({label})"),
        "path delay (ns)",
        run.samples
            .iter()
            .map(|s| (s.t_rel_s, s.path_delay_ns as f64)),
        scales.get(Role::Boundary, ptp::METRIC_PATH_DELAY_NS),
    );

    vec![offset, offset_s2, path_delay]
}

pub fn ptp_client_plots(
    run: &RunResult<ClientSample, PtpEvent>,
    scales: &SharedScales,
) -> Vec<PlotSpec> {
    let label = run.meta.label();

    let rms = PlotSpec::new(
        format!("ptp_{label}_rms"),
        format!("ptp4l offset rms ({label})"),
        "rms (ns)",
        run.samples.iter().map(|s| (s.t_rel_s, s.rms_ns as f64)),
        scales.get(Role::Client, ptp::METRIC_RMS_NS),
    );

    let path_delay = PlotSpec::new(
        format!("ptp_{label}_path_delay"),
        format!("ptp4l path delay ({label})"),
        "path delay (ns)",
        run.samples
            .iter()
            .filter_map(|s| s.path_delay_ns.map(|d| (s.t_rel_s, d as f64))),
        scales.get(Role::Client, ptp::METRIC_PATH_DELAY_NS),
    );

    vec![rms, path_delay]
}
