//! Batch driver: many inputs in, one set of tables and plot specs out.
//!
//! Parsing is isolated per input: a malformed or misnamed report is
//! recorded in the [`BatchReport`] and the rest of the batch proceeds.
//! Export happens only after every surviving run is parsed, because shared
//! axis limits need the full batch. Export I/O failures are hard errors;
//! at that point the problem is the output directory, not one input.
//!
//! Output layout under the configured outdir:
//!
//! ```text
//! parser_chrony/   chrony_<scenario>_{tracking,sourcestats}.csv + summary.csv
//! parser_ntp/      ntp_<role>_<scenario>_{samples,events}.csv   + summary.csv
//! parser_ptp/      ptp_<role>_<scenario>_{samples,events}.csv   + {boundary,client}_summary.csv
//! plots_<family>/  one JSON spec per plot
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use driftline_core::config::TrackingMetric;
use driftline_core::error::Error;
use driftline_core::run::{Role, RunMeta, RunResult, Scenario};
use driftline_formats::chrony::{self, ChronyParser, ChronyRun};
use driftline_formats::ntpq::{self, NtpqParser, PeerEvent, PeerSample};
use driftline_formats::ptp::{self, BoundarySample, ClientSample, PtpEvent, PtpParser};

use crate::export;
use crate::plot;

/// Fixed file names of a chrony capture directory.
pub const CHRONY_TRACKING_FILE: &str = "chrony_tracking_series.txt";
pub const CHRONY_SOURCESTATS_FILE: &str = "chrony_sourcestats_series.txt";

/// Per-invocation knobs, resolved from config plus CLI overrides before the
/// batch starts.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub outdir: PathBuf,
    pub forced_role: Option<Role>,
    pub forced_scenario: Option<Scenario>,
    pub tracking_metric: TrackingMetric,
}

/// What happened to each input of a batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub completed: usize,
    pub failed: Vec<(PathBuf, Error)>,
}

impl BatchReport {
    fn record<T>(&mut self, input: &Path, outcome: Result<T, Error>) -> Option<T> {
        match outcome {
            Ok(v) => Some(v),
            Err(err) => {
                tracing::warn!(input = %input.display(), %err, "run failed, continuing batch");
                self.failed.push((input.to_path_buf(), err));
                None
            }
        }
    }
}

/// Captured reports are raw terminal output; tolerate stray bytes instead
/// of refusing the whole file.
fn read_lossy(path: &Path) -> Result<String, Error> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// ---------------------------------------------------------------------------
// chrony
// ---------------------------------------------------------------------------

/// Resolve the tracking/sourcestats pair for one chrony input, which may be
/// the capture directory, the tracking file, or the sourcestats file.
fn resolve_chrony_pair(input: &Path) -> Result<(PathBuf, PathBuf), Error> {
    let (tracking, sourcestats) = if input.is_dir() {
        (
            input.join(CHRONY_TRACKING_FILE),
            input.join(CHRONY_SOURCESTATS_FILE),
        )
    } else {
        let name = input
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        // Substitute the full series token; a bare "tracking" substring in
        // an unrelated file name must not claim a sibling.
        if name.contains("tracking_series") {
            (
                input.to_path_buf(),
                input.with_file_name(name.replace("tracking_series", "sourcestats_series")),
            )
        } else if name.contains("sourcestats_series") {
            (
                input.with_file_name(name.replace("sourcestats_series", "tracking_series")),
                input.to_path_buf(),
            )
        } else {
            return Err(Error::MissingCompanion {
                path: input.to_path_buf(),
                expected: input.with_file_name(CHRONY_SOURCESTATS_FILE),
            });
        }
    };

    for path in [&tracking, &sourcestats] {
        if !path.is_file() {
            return Err(Error::MissingCompanion {
                path: input.to_path_buf(),
                expected: path.clone(),
            });
        }
    }
    Ok((tracking, sourcestats))
}

pub fn run_chrony(inputs: &[PathBuf], opts: &BatchOptions) -> anyhow::Result<BatchReport> {
    let parser = ChronyParser::new();
    let mut report = BatchReport::default();
    let mut runs: Vec<ChronyRun> = Vec::new();

    for input in inputs {
        let parsed = resolve_chrony_pair(input).and_then(|(tracking_path, sourcestats_path)| {
            let meta = RunMeta::resolve(input, None, opts.forced_scenario, false)?;
            let tracking_text = read_lossy(&tracking_path)?;
            let sourcestats_text = read_lossy(&sourcestats_path)?;
            parser.parse_pair(&tracking_text, &sourcestats_text, meta)
        });
        if let Some(run) = report.record(input, parsed) {
            runs.push(run);
        }
    }

    let scales = chrony::shared_scales(&runs, opts.tracking_metric);
    let tables = opts.outdir.join("parser_chrony");
    let plots = opts.outdir.join("plots_chrony");

    let mut summaries = Vec::new();
    for run in &runs {
        let scenario = run.tracking.meta.scenario;
        export::write_csv(
            &tables.join(format!("chrony_{scenario}_tracking.csv")),
            &export::TRACKING_HEADER,
            &export::tracking_rows(&run.tracking),
        )?;
        export::write_csv(
            &tables.join(format!("chrony_{scenario}_sourcestats.csv")),
            &export::SOURCESTATS_HEADER,
            &export::sourcestats_rows(&run.sourcestats),
        )?;
        for spec in plot::chrony_plots(run, opts.tracking_metric, &scales) {
            spec.write(&plots)?;
        }
        summaries.push(chrony::summarize_tracking(&run.tracking));
        report.completed += 1;
    }
    export::write_csv(
        &tables.join("summary.csv"),
        &export::TRACKING_SUMMARY_HEADER,
        &export::tracking_summary_rows(&summaries),
    )?;

    Ok(report)
}

// ---------------------------------------------------------------------------
// ntpq
// ---------------------------------------------------------------------------

pub fn run_ntp(inputs: &[PathBuf], opts: &BatchOptions) -> anyhow::Result<BatchReport> {
    let parser = NtpqParser::new();
    let mut report = BatchReport::default();
    let mut runs: Vec<RunResult<PeerSample, PeerEvent>> = Vec::new();

    for input in inputs {
        let parsed = RunMeta::resolve(input, opts.forced_role, opts.forced_scenario, true)
            .and_then(|meta| parser.parse(&read_lossy(input)?, meta));
        if let Some(run) = report.record(input, parsed) {
            runs.push(run);
        }
    }

    let scales = ntpq::shared_scales(&runs);
    let tables = opts.outdir.join("parser_ntp");
    let plots = opts.outdir.join("plots_ntp");

    let mut summaries = Vec::new();
    for run in &runs {
        let label = run.meta.label();
        export::write_csv(
            &tables.join(format!("ntp_{label}_samples.csv")),
            &export::PEER_SAMPLES_HEADER,
            &export::peer_sample_rows(run),
        )?;
        export::write_csv(
            &tables.join(format!("ntp_{label}_events.csv")),
            &export::PEER_EVENTS_HEADER,
            &export::peer_event_rows(run),
        )?;
        for spec in plot::ntpq_plots(run, &scales) {
            spec.write(&plots)?;
        }
        summaries.push(ntpq::summarize(run));
        report.completed += 1;
    }
    export::write_csv(
        &tables.join("summary.csv"),
        &export::NTP_SUMMARY_HEADER,
        &export::ntp_summary_rows(&summaries),
    )?;

    Ok(report)
}

// ---------------------------------------------------------------------------
// ptp
// ---------------------------------------------------------------------------

enum PtpRun {
    Boundary(RunResult<BoundarySample, PtpEvent>),
    Client(RunResult<ClientSample, PtpEvent>),
}

pub fn run_ptp(inputs: &[PathBuf], opts: &BatchOptions) -> anyhow::Result<BatchReport> {
    let parser = PtpParser::new();
    let mut report = BatchReport::default();
    let mut boundary_runs: Vec<RunResult<BoundarySample, PtpEvent>> = Vec::new();
    let mut client_runs: Vec<RunResult<ClientSample, PtpEvent>> = Vec::new();

    for input in inputs {
        // role_required=true, so a surviving meta always carries a role
        let parsed = RunMeta::resolve(input, opts.forced_role, opts.forced_scenario, true)
            .and_then(|meta| {
                let text = read_lossy(input)?;
                match meta.role {
                    Some(Role::Boundary) => {
                        parser.parse_boundary(&text, meta).map(PtpRun::Boundary)
                    }
                    _ => parser.parse_client(&text, meta).map(PtpRun::Client),
                }
            });
        match report.record(input, parsed) {
            Some(PtpRun::Boundary(run)) => boundary_runs.push(run),
            Some(PtpRun::Client(run)) => client_runs.push(run),
            None => {}
        }
    }

    let scales = ptp::shared_scales(&boundary_runs, &client_runs);
    let tables = opts.outdir.join("parser_ptp");
    let plots = opts.outdir.join("plots_ptp");

    let mut boundary_summaries = Vec::new();
    for run in &boundary_runs {
        let label = run.meta.label();
        export::write_csv(
            &tables.join(format!("ptp_{label}_samples.csv")),
            &export::BOUNDARY_SAMPLES_HEADER,
            &export::boundary_sample_rows(run),
        )?;
        export::write_csv(
            &tables.join(format!("ptp_{label}_events.csv")),
            &export::PTP_EVENTS_HEADER,
            &export::ptp_event_rows(&run.events),
        )?;
        for spec in plot::ptp_boundary_plots(run, &scales) {
            spec.write(&plots)?;
        }
        boundary_summaries.push(ptp::summarize_boundary(run));
        report.completed += 1;
    }
    export::write_csv(
        &tables.join("boundary_summary.csv"),
        &export::BOUNDARY_SUMMARY_HEADER,
        &export::boundary_summary_rows(&boundary_summaries),
    )?;

    let mut client_summaries = Vec::new();
    for run in &client_runs {
        let label = run.meta.label();
        export::write_csv(
            &tables.join(format!("ptp_{label}_samples.csv")),
            &export::CLIENT_SAMPLES_HEADER,
            &export::client_sample_rows(run),
        )?;
        export::write_csv(
            &tables.join(format!("ptp_{label}_events.csv")),
            &export::PTP_EVENTS_HEADER,
            &export::ptp_event_rows(&run.events),
        )?;
        for spec in plot::ptp_client_plots(run, &scales) {
            spec.write(&plots)?;
        }
        client_summaries.push(ptp::summarize_client(run));
        report.completed += 1;
    }
    export::write_csv(
        &tables.join("client_summary.csv"),
        &export::CLIENT_SUMMARY_HEADER,
        &export::client_summary_rows(&client_summaries),
    )?;

    Ok(report)
}
