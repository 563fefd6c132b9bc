//! chrony report parsers: `tracking` blocks and the paired `sourcestats`
//! tables.
//!
//! Both inputs are sequences of blocks opened by a `SAMPLE n/m @ <iso-ts>`
//! header line. Tracking blocks carry up to two metric lines; sourcestats
//! blocks carry a banner, a `=`-run separator, then fixed-column source
//! rows whose offset/std-dev fields are unit-suffixed quantities.
//!
//! Sign convention for `System time`: the daemon prints a magnitude plus a
//! direction token. `slow` means the local clock is behind the reference,
//! so the normalized value is negative; `fast` is positive. Clock error is
//! always represented as (local - reference).

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

use driftline_core::config::TrackingMetric;
use driftline_core::error::{Error, Result};
use driftline_core::quantity::parse_quantity;
use driftline_core::run::{NoEvent, RunMeta, RunResult};
use driftline_core::scale::{ScalePolicy, SharedScales};
use driftline_core::stats;

/// One tracking block that carried at least one metric. A metric absent
/// from its block is `NAN`; downstream statistics drop non-finite values
/// explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingSample {
    pub ts: DateTime<Utc>,
    pub t_rel_s: f64,
    /// Signed seconds, (local - reference); see module docs for the
    /// slow/fast sign convention.
    pub system_time_offset_s: f64,
    /// Signed seconds, as printed by `Last offset`.
    pub last_offset_s: f64,
}

/// One sourcestats row, offset and std dev normalized to seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceStatsSample {
    pub ts: DateTime<Utc>,
    pub t_rel_s: f64,
    pub source: String,
    pub offset_s: f64,
    pub stddev_s: f64,
}

/// A chrony run is the tracking/sourcestats pair for one scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ChronyRun {
    pub tracking: RunResult<TrackingSample, NoEvent>,
    pub sourcestats: RunResult<SourceStatsSample, NoEvent>,
}

/// Aggregate row over one tracking run. The tracking family has no lock
/// notion, so statistics cover every finite sample.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingSummary {
    pub meta: RunMeta,
    pub system_time_mean_s: Option<f64>,
    pub system_time_std_s: Option<f64>,
    pub system_time_p95_s: Option<f64>,
    pub system_time_maxabs_s: Option<f64>,
    pub last_offset_mean_s: Option<f64>,
    pub last_offset_std_s: Option<f64>,
    pub last_offset_p95_s: Option<f64>,
    pub last_offset_maxabs_s: Option<f64>,
}

/// Parser for the chrony report family. Regexes are compiled once per
/// instance; the parser holds no per-run state.
pub struct ChronyParser {
    re_header: Regex,
    re_system_time: Regex,
    re_last_offset: Regex,
    re_source_row: Regex,
    re_table_separator: Regex,
}

impl Default for ChronyParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ChronyParser {
    pub fn new() -> Self {
        Self {
            re_header: Regex::new(r"^=+\s*SAMPLE\s+\d+/\d+\s+@\s+(?P<ts>[^ ]+)\s*=+\s*$")
                .expect("hardcoded header regex must compile"),
            re_system_time: Regex::new(
                r"^System time\s*:\s*(?P<val>[+-]?\d+(?:\.\d+)?)\s+seconds\s+(?P<dir>slow|fast)\s+of\s+NTP\s+time\s*$",
            )
            .expect("hardcoded system-time regex must compile"),
            re_last_offset: Regex::new(
                r"^Last offset\s*:\s*(?P<val>[+-]?\d+(?:\.\d+)?)\s+seconds\s*$",
            )
            .expect("hardcoded last-offset regex must compile"),
            re_source_row: Regex::new(
                r"^(?P<name>\S+)\s+(?P<np>\d+)\s+(?P<nr>\d+)\s+(?P<span>\d+)\s+(?P<freq>[+-]?\d+(?:\.\d+)?)\s+(?P<skew>[+-]?\d+(?:\.\d+)?)\s+(?P<offset>[+-]?\d+(?:\.\d+)?(?:ns|us|ms|s)?)\s+(?P<stddev>[+-]?\d+(?:\.\d+)?(?:ns|us|ms|s)?)\s*$",
            )
            .expect("hardcoded source-row regex must compile"),
            re_table_separator: Regex::new(r"^=+\s*$")
                .expect("hardcoded separator regex must compile"),
        }
    }

    /// Parse a tracking report. A block contributes a sample only if at
    /// least one of the two metrics was present; blocks with neither are
    /// silently dropped. Lines outside any block are soft-skipped.
    pub fn parse_tracking(
        &self,
        text: &str,
        meta: RunMeta,
    ) -> Result<RunResult<TrackingSample, NoEvent>> {
        let mut blocks: Vec<(DateTime<Utc>, Option<f64>, Option<f64>)> = Vec::new();
        let mut current: Option<(DateTime<Utc>, Option<f64>, Option<f64>)> = None;
        let mut skipped = 0usize;

        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();

            if let Some(caps) = self.re_header.captures(line) {
                flush_tracking_block(&mut blocks, current.take());
                current = Some((parse_iso_ts(&caps["ts"], idx + 1)?, None, None));
                continue;
            }

            let Some(block) = current.as_mut() else {
                skipped += 1;
                continue;
            };

            if let Some(caps) = self.re_system_time.captures(line) {
                let magnitude: f64 = parse_metric(&caps["val"], idx + 1)?;
                block.1 = Some(match &caps["dir"] {
                    "slow" => -magnitude,
                    _ => magnitude,
                });
                continue;
            }

            if let Some(caps) = self.re_last_offset.captures(line) {
                block.2 = Some(parse_metric(&caps["val"], idx + 1)?);
                continue;
            }

            skipped += 1;
        }
        flush_tracking_block(&mut blocks, current.take());

        if skipped > 0 {
            tracing::debug!(skipped, source = %meta.source.display(), "tracking lines ignored");
        }

        let t0 = blocks.first().map(|(ts, _, _)| epoch_seconds(*ts));
        let samples = blocks
            .into_iter()
            .map(|(ts, system, last)| TrackingSample {
                ts,
                t_rel_s: rel_seconds(ts, t0),
                system_time_offset_s: system.unwrap_or(f64::NAN),
                last_offset_s: last.unwrap_or(f64::NAN),
            })
            .collect();

        Ok(RunResult {
            meta,
            samples,
            events: Vec::new(),
        })
    }

    /// Parse a sourcestats report. Rows are recognized only after the
    /// `=`-run separator that ends the banner of each block.
    pub fn parse_sourcestats(
        &self,
        text: &str,
        meta: RunMeta,
    ) -> Result<RunResult<SourceStatsSample, NoEvent>> {
        let mut rows: Vec<(DateTime<Utc>, String, f64, f64)> = Vec::new();
        let mut current_ts: Option<DateTime<Utc>> = None;
        let mut in_table = false;
        let mut skipped = 0usize;

        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();

            if let Some(caps) = self.re_header.captures(line) {
                current_ts = Some(parse_iso_ts(&caps["ts"], idx + 1)?);
                in_table = false;
                continue;
            }

            let Some(ts) = current_ts else {
                skipped += 1;
                continue;
            };

            if self.re_table_separator.is_match(line) {
                in_table = true;
                continue;
            }
            if !in_table {
                continue;
            }

            if let Some(caps) = self.re_source_row.captures(line) {
                let offset_s = parse_quantity(&caps["offset"])?;
                let stddev_s = parse_quantity(&caps["stddev"])?;
                rows.push((ts, caps["name"].to_string(), offset_s, stddev_s));
            } else {
                skipped += 1;
            }
        }

        if skipped > 0 {
            tracing::debug!(skipped, source = %meta.source.display(), "sourcestats lines ignored");
        }

        let t0 = rows.first().map(|(ts, ..)| epoch_seconds(*ts));
        let samples = rows
            .into_iter()
            .map(|(ts, source, offset_s, stddev_s)| SourceStatsSample {
                ts,
                t_rel_s: rel_seconds(ts, t0),
                source,
                offset_s,
                stddev_s,
            })
            .collect();

        Ok(RunResult {
            meta,
            samples,
            events: Vec::new(),
        })
    }

    /// Parse the tracking/sourcestats pair for one run.
    pub fn parse_pair(
        &self,
        tracking_text: &str,
        sourcestats_text: &str,
        meta: RunMeta,
    ) -> Result<ChronyRun> {
        Ok(ChronyRun {
            tracking: self.parse_tracking(tracking_text, meta.clone())?,
            sourcestats: self.parse_sourcestats(sourcestats_text, meta)?,
        })
    }
}

fn flush_tracking_block(
    blocks: &mut Vec<(DateTime<Utc>, Option<f64>, Option<f64>)>,
    block: Option<(DateTime<Utc>, Option<f64>, Option<f64>)>,
) {
    if let Some((ts, system, last)) = block {
        if system.is_some() || last.is_some() {
            blocks.push((ts, system, last));
        }
    }
}

fn epoch_seconds(ts: DateTime<Utc>) -> f64 {
    ts.timestamp() as f64 + f64::from(ts.timestamp_subsec_micros()) * 1e-6
}

fn rel_seconds(ts: DateTime<Utc>, t0: Option<f64>) -> f64 {
    match t0 {
        Some(t0) => epoch_seconds(ts) - t0,
        None => 0.0,
    }
}

fn parse_metric(token: &str, line_no: usize) -> Result<f64> {
    token.parse().map_err(|_| Error::Format {
        line_no,
        reason: format!("bad numeric field {token:?}"),
    })
}

fn parse_iso_ts(token: &str, line_no: usize) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(token) {
        return Ok(dt.with_timezone(&Utc));
    }
    // Naive timestamps are taken as UTC, mirroring the capture scripts.
    if let Ok(naive) = NaiveDateTime::parse_from_str(token, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    Err(Error::Format {
        line_no,
        reason: format!("bad ISO-8601 timestamp {token:?}"),
    })
}

/// One aggregate row over a tracking run's finite samples.
pub fn summarize_tracking(run: &RunResult<TrackingSample, NoEvent>) -> TrackingSummary {
    let system: Vec<f64> = run.samples.iter().map(|s| s.system_time_offset_s).collect();
    let last: Vec<f64> = run.samples.iter().map(|s| s.last_offset_s).collect();

    TrackingSummary {
        meta: run.meta.clone(),
        system_time_mean_s: stats::mean(&system),
        system_time_std_s: stats::std_sample(&system),
        system_time_p95_s: stats::percentile(&system, 0.95),
        system_time_maxabs_s: stats::max_abs(&system),
        last_offset_mean_s: stats::mean(&last),
        last_offset_std_s: stats::std_sample(&last),
        last_offset_p95_s: stats::percentile(&last, 0.95),
        last_offset_maxabs_s: stats::max_abs(&last),
    }
}

/// Metric keys used for chrony shared scales (values in microseconds, as
/// plotted).
pub const METRIC_TRACKING_OFFSET_US: &str = "tracking_offset_us";
pub const METRIC_SOURCESTATS_OFFSET_US: &str = "sourcestats_offset_us";
pub const METRIC_SOURCESTATS_STDDEV_US: &str = "sourcestats_stddev_us";

/// Shared y-axis bounds across every scenario of a chrony batch. Tracking
/// and sourcestats offsets are signed (symmetric); std dev is not.
pub fn shared_scales(runs: &[ChronyRun], tracking_metric: TrackingMetric) -> SharedScales {
    let mut scales = SharedScales::new();

    let tracking_us = runs.iter().flat_map(|run| {
        run.tracking.samples.iter().map(move |s| {
            let v = match tracking_metric {
                TrackingMetric::SystemTime => s.system_time_offset_s,
                TrackingMetric::LastOffset => s.last_offset_s,
            };
            v * 1e6
        })
    });
    scales.insert_unrolled(METRIC_TRACKING_OFFSET_US, tracking_us, ScalePolicy::Symmetric);

    let offset_us = runs
        .iter()
        .flat_map(|run| run.sourcestats.samples.iter().map(|s| s.offset_s * 1e6));
    scales.insert_unrolled(METRIC_SOURCESTATS_OFFSET_US, offset_us, ScalePolicy::Symmetric);

    let stddev_us = runs
        .iter()
        .flat_map(|run| run.sourcestats.samples.iter().map(|s| s.stddev_s * 1e6));
    scales.insert_unrolled(
        METRIC_SOURCESTATS_STDDEV_US,
        stddev_us,
        ScalePolicy::PositiveOnly,
    );

    scales
}
