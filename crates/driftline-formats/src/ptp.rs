//! ptp4l log parser (boundary and client roles).
//!
//! Every interesting line carries the daemon-uptime prefix
//! `ptp4l[SECONDS.FRAC]:`; lines without it are soft-skipped. Lines with the
//! prefix are classified in a fixed priority order, first match wins:
//! state transition, fault, best-master selection, timescale mismatch, new
//! foreign master, then the role's numeric sample row. The two roles print
//! different sample rows (boundary: `master offset ... sN freq ... path
//! delay ...`, client: `rms ... max ... freq ... +/- ...`) and get separate
//! sample types and summaries.
//!
//! Post-lock gating differs per role and both behaviors are kept:
//! boundary samples are servo-locked when `sN == s2`, client samples are
//! post-lock from the first `... to SLAVE ...` transition onward.

use regex::Regex;

use driftline_core::error::{Error, Result};
use driftline_core::run::{Role, RunMeta, RunResult};
use driftline_core::scale::{ScalePolicy, SharedScales};
use driftline_core::stats;

// ---------------------------------------------------------------------------
// Sample and event types
// ---------------------------------------------------------------------------

/// One boundary-clock servo row.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundarySample {
    /// Daemon uptime, as printed in the line prefix.
    pub t_s: f64,
    /// Seconds relative to the earliest timestamped line of the run.
    pub t_rel_s: f64,
    pub offset_ns: i64,
    /// Servo state digit from the `sN` token; `2` means locked.
    pub servo_state: u8,
    /// Frequency adjustment in the daemon's native unit (ppb).
    pub freq_raw: i64,
    pub path_delay_ns: u64,
    pub raw: String,
}

impl BoundarySample {
    pub fn is_locked(&self) -> bool {
        self.servo_state == 2
    }
}

/// One client summary row (`rms ... max ... freq ... +/- ...`). The delay
/// tail is optional: ptp4l omits it on some transports.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSample {
    pub t_s: f64,
    pub t_rel_s: f64,
    pub rms_ns: u64,
    pub max_ns: u64,
    pub freq_raw: i64,
    pub freq_pm_raw: u64,
    pub path_delay_ns: Option<u64>,
    pub path_delay_pm_ns: Option<u64>,
    pub raw: String,
}

/// Discrete ptp4l occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct PtpEvent {
    pub t_s: f64,
    pub t_rel_s: f64,
    pub kind: PtpEventKind,
    /// Port number for state/foreign-master events.
    pub port: Option<u32>,
    pub from: Option<String>,
    pub to: Option<String>,
    /// Transition reason, grandmaster identity, or foreign-master identity,
    /// depending on kind.
    pub detail: Option<String>,
    pub raw: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PtpEventKind {
    StateTransition,
    Fault,
    BestMasterSelected,
    TimescaleMismatch,
    NewForeignMaster,
}

impl std::fmt::Display for PtpEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PtpEventKind::StateTransition => "state_transition",
            PtpEventKind::Fault => "fault",
            PtpEventKind::BestMasterSelected => "best_master_selected",
            PtpEventKind::TimescaleMismatch => "timescale_mismatch",
            PtpEventKind::NewForeignMaster => "new_foreign_master",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Aggregate row for one boundary run. Offset and path-delay statistics
/// cover the locked (`s2`) samples only.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundarySummary {
    pub meta: RunMeta,
    /// Run-relative time of the first transition into SLAVE.
    pub convergence_s: Option<f64>,
    pub fault_count: usize,
    pub offset_mean_ns_s2: Option<f64>,
    pub offset_std_ns_s2: Option<f64>,
    pub offset_p50_ns_s2: Option<f64>,
    pub offset_p95_ns_s2: Option<f64>,
    pub offset_p99_ns_s2: Option<f64>,
    pub offset_maxabs_ns_s2: Option<f64>,
    pub path_delay_mean_ns_s2: Option<f64>,
    pub path_delay_std_ns_s2: Option<f64>,
}

/// Aggregate row for one client run. Statistics cover samples at or after
/// the first transition into SLAVE; a run that never locked reports every
/// post-lock statistic as absent.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSummary {
    pub meta: RunMeta,
    pub locked: bool,
    pub convergence_s: Option<f64>,
    pub best_master_reselection_count: usize,
    pub rms_mean_ns_post: Option<f64>,
    pub rms_std_ns_post: Option<f64>,
    pub rms_p95_ns_post: Option<f64>,
    pub rms_max_ns_post: Option<f64>,
    pub max_mean_ns_post: Option<f64>,
    pub max_max_ns_post: Option<f64>,
    pub path_delay_mean_ns_post: Option<f64>,
    pub path_delay_std_ns_post: Option<f64>,
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Classified content of one timestamped ptp4l line.
#[derive(Debug, Clone, PartialEq)]
enum LineKind {
    Event(PtpEvent),
    Boundary(BoundarySample),
    Client(ClientSample),
}

pub struct PtpParser {
    re_prefix: Regex,
    re_state: Regex,
    re_fault: Regex,
    re_best_master: Regex,
    re_timescale: Regex,
    re_foreign: Regex,
    re_boundary_sample: Regex,
    re_client_sample: Regex,
}

impl Default for PtpParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PtpParser {
    pub fn new() -> Self {
        let re = |pattern: &str| Regex::new(pattern).expect("hardcoded ptp4l regex must compile");
        Self {
            re_prefix: re(r"ptp4l\[(?P<t>\d+\.\d+)\]:\s+(?P<body>.*)$"),
            re_state: re(
                r"port\s+(?P<port>\d+)(?:\s+\(\S+\))?:\s+(?P<from>[A-Z_]+)\s+to\s+(?P<to>[A-Z_]+)(?:\s+on\s+(?P<reason>[A-Z_()0-9 ]+))?",
            ),
            re_fault: re(r"FAULT_DETECTED|FAULTY"),
            re_best_master: re(r"selected best master clock\s+(?P<gm>\S+)"),
            re_timescale: re(r"foreign master not using PTP timescale"),
            re_foreign: re(r"port\s+(?P<port>\d+)(?:\s+\(\S+\))?:\s+new foreign master\s+(?P<fm>\S+)"),
            re_boundary_sample: re(
                r"master offset\s+(?P<offset>-?\d+)\s+s(?P<state>\d)\s+freq\s+(?P<freq>[+-]?\d+)\s+path delay\s+(?P<delay>\d+)",
            ),
            re_client_sample: re(
                r"rms\s+(?P<rms>\d+)\s+max\s+(?P<max>\d+)\s+freq\s+(?P<freq>[+-]?\d+)\s+\+/-\s+(?P<freqpm>\d+)(?:\s+delay\s+(?P<delay>\d+)(?:\s+\+/-\s+(?P<delaypm>\d+))?)?",
            ),
        }
    }

    /// Classify one log line, or `None` when it has no `ptp4l[...]` prefix
    /// or its body matches nothing. Classification order is fixed and
    /// first-match-wins: a fault keyword inside a state-transition line is
    /// a state transition.
    fn classify(&self, line: &str, line_no: usize, role: Role) -> Result<Option<LineKind>> {
        let Some(prefix) = self.re_prefix.captures(line) else {
            return Ok(None);
        };
        let t_s: f64 = parse_num(&prefix["t"], line_no)?;
        let body = &prefix["body"];

        if let Some(caps) = self.re_state.captures(body) {
            return Ok(Some(LineKind::Event(PtpEvent {
                t_s,
                t_rel_s: 0.0,
                kind: PtpEventKind::StateTransition,
                port: Some(parse_num(&caps["port"], line_no)?),
                from: Some(caps["from"].to_string()),
                to: Some(caps["to"].to_string()),
                detail: caps.name("reason").map(|m| m.as_str().trim().to_string()),
                raw: line.to_string(),
            })));
        }
        if self.re_fault.is_match(body) {
            return Ok(Some(LineKind::Event(event(
                t_s,
                PtpEventKind::Fault,
                None,
                line,
            ))));
        }
        if let Some(caps) = self.re_best_master.captures(body) {
            return Ok(Some(LineKind::Event(event(
                t_s,
                PtpEventKind::BestMasterSelected,
                Some(caps["gm"].to_string()),
                line,
            ))));
        }
        if self.re_timescale.is_match(body) {
            return Ok(Some(LineKind::Event(event(
                t_s,
                PtpEventKind::TimescaleMismatch,
                None,
                line,
            ))));
        }
        if let Some(caps) = self.re_foreign.captures(body) {
            return Ok(Some(LineKind::Event(PtpEvent {
                t_s,
                t_rel_s: 0.0,
                kind: PtpEventKind::NewForeignMaster,
                port: Some(parse_num(&caps["port"], line_no)?),
                from: None,
                to: None,
                detail: Some(caps["fm"].to_string()),
                raw: line.to_string(),
            })));
        }

        match role {
            Role::Boundary => {
                if let Some(caps) = self.re_boundary_sample.captures(body) {
                    return Ok(Some(LineKind::Boundary(BoundarySample {
                        t_s,
                        t_rel_s: 0.0,
                        offset_ns: parse_num(&caps["offset"], line_no)?,
                        servo_state: parse_num(&caps["state"], line_no)?,
                        freq_raw: parse_num(&caps["freq"], line_no)?,
                        path_delay_ns: parse_num(&caps["delay"], line_no)?,
                        raw: line.to_string(),
                    })));
                }
            }
            Role::Client => {
                if let Some(caps) = self.re_client_sample.captures(body) {
                    return Ok(Some(LineKind::Client(ClientSample {
                        t_s,
                        t_rel_s: 0.0,
                        rms_ns: parse_num(&caps["rms"], line_no)?,
                        max_ns: parse_num(&caps["max"], line_no)?,
                        freq_raw: parse_num(&caps["freq"], line_no)?,
                        freq_pm_raw: parse_num(&caps["freqpm"], line_no)?,
                        path_delay_ns: opt_num(caps.name("delay"), line_no)?,
                        path_delay_pm_ns: opt_num(caps.name("delaypm"), line_no)?,
                        raw: line.to_string(),
                    })));
                }
            }
        }

        Ok(None)
    }

    /// Parse one boundary-clock log.
    pub fn parse_boundary(
        &self,
        text: &str,
        meta: RunMeta,
    ) -> Result<RunResult<BoundarySample, PtpEvent>> {
        let mut samples = Vec::new();
        let mut events = Vec::new();
        let mut skipped = 0usize;

        for (idx, line) in text.lines().enumerate() {
            match self.classify(line, idx + 1, Role::Boundary)? {
                Some(LineKind::Event(e)) => events.push(e),
                Some(LineKind::Boundary(s)) => samples.push(s),
                Some(LineKind::Client(_)) => unreachable!("boundary role never yields client rows"),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::debug!(skipped, source = %meta.source.display(), "ptp4l lines ignored");
        }

        rebase(&mut samples, &mut events, |s| s.t_s, |s, t0| s.t_rel_s = s.t_s - t0);
        Ok(RunResult {
            meta,
            samples,
            events,
        })
    }

    /// Parse one client log.
    pub fn parse_client(
        &self,
        text: &str,
        meta: RunMeta,
    ) -> Result<RunResult<ClientSample, PtpEvent>> {
        let mut samples = Vec::new();
        let mut events = Vec::new();
        let mut skipped = 0usize;

        for (idx, line) in text.lines().enumerate() {
            match self.classify(line, idx + 1, Role::Client)? {
                Some(LineKind::Event(e)) => events.push(e),
                Some(LineKind::Client(s)) => samples.push(s),
                Some(LineKind::Boundary(_)) => unreachable!("client role never yields servo rows"),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::debug!(skipped, source = %meta.source.display(), "ptp4l lines ignored");
        }

        rebase(&mut samples, &mut events, |s| s.t_s, |s, t0| s.t_rel_s = s.t_s - t0);
        Ok(RunResult {
            meta,
            samples,
            events,
        })
    }
}

fn event(t_s: f64, kind: PtpEventKind, detail: Option<String>, raw: &str) -> PtpEvent {
    PtpEvent {
        t_s,
        t_rel_s: 0.0,
        kind,
        port: None,
        from: None,
        to: None,
        detail,
        raw: raw.to_string(),
    }
}

/// Rebase samples and events onto one shared time origin: the minimum
/// timestamp observed across both sequences.
fn rebase<S>(
    samples: &mut [S],
    events: &mut [PtpEvent],
    sample_t: impl Fn(&S) -> f64,
    set_rel: impl Fn(&mut S, f64),
) {
    let t0 = samples
        .iter()
        .map(&sample_t)
        .chain(events.iter().map(|e| e.t_s))
        .fold(None, |acc: Option<f64>, t| {
            Some(acc.map_or(t, |m: f64| m.min(t)))
        });
    let Some(t0) = t0 else { return };
    for s in samples.iter_mut() {
        set_rel(s, t0);
    }
    for e in events.iter_mut() {
        e.t_rel_s = e.t_s - t0;
    }
}

fn parse_num<T: std::str::FromStr>(token: &str, line_no: usize) -> Result<T> {
    token.parse().map_err(|_| Error::Format {
        line_no,
        reason: format!("bad numeric field {token:?}"),
    })
}

fn opt_num<T: std::str::FromStr>(
    m: Option<regex::Match<'_>>,
    line_no: usize,
) -> Result<Option<T>> {
    m.map(|m| parse_num(m.as_str(), line_no)).transpose()
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Run-relative time of the first transition into SLAVE, if any.
fn convergence_time(events: &[PtpEvent]) -> Option<f64> {
    events
        .iter()
        .filter(|e| e.kind == PtpEventKind::StateTransition && e.to.as_deref() == Some("SLAVE"))
        .map(|e| e.t_rel_s)
        .fold(None, |acc: Option<f64>, t| {
            Some(acc.map_or(t, |m: f64| m.min(t)))
        })
}

pub fn summarize_boundary(run: &RunResult<BoundarySample, PtpEvent>) -> BoundarySummary {
    // Offsets and path delays alike are aggregated over the locked (s2)
    // samples only; the servo settling phase would skew both.
    let locked: Vec<&BoundarySample> = run.samples.iter().filter(|s| s.is_locked()).collect();
    let offsets: Vec<f64> = locked.iter().map(|s| s.offset_ns as f64).collect();
    let delays: Vec<f64> = locked.iter().map(|s| s.path_delay_ns as f64).collect();

    BoundarySummary {
        meta: run.meta.clone(),
        convergence_s: convergence_time(&run.events),
        fault_count: run
            .events
            .iter()
            .filter(|e| e.kind == PtpEventKind::Fault)
            .count(),
        offset_mean_ns_s2: stats::mean(&offsets),
        offset_std_ns_s2: stats::std_sample(&offsets),
        offset_p50_ns_s2: stats::percentile(&offsets, 0.50),
        offset_p95_ns_s2: stats::percentile(&offsets, 0.95),
        offset_p99_ns_s2: stats::percentile(&offsets, 0.99),
        offset_maxabs_ns_s2: stats::max_abs(&offsets),
        path_delay_mean_ns_s2: stats::mean(&delays),
        path_delay_std_ns_s2: stats::std_sample(&delays),
    }
}

pub fn summarize_client(run: &RunResult<ClientSample, PtpEvent>) -> ClientSummary {
    let convergence_s = convergence_time(&run.events);

    // Post-lock samples start at the first to-SLAVE transition. Without
    // one, every post-lock statistic is absent.
    let post: Vec<&ClientSample> = match convergence_s {
        Some(t_lock) => run
            .samples
            .iter()
            .filter(|s| s.t_rel_s >= t_lock)
            .collect(),
        None => Vec::new(),
    };

    let rms: Vec<f64> = post.iter().map(|s| s.rms_ns as f64).collect();
    let max: Vec<f64> = post.iter().map(|s| s.max_ns as f64).collect();
    let delays: Vec<f64> = post
        .iter()
        .filter_map(|s| s.path_delay_ns)
        .map(|d| d as f64)
        .collect();

    ClientSummary {
        meta: run.meta.clone(),
        locked: convergence_s.is_some(),
        convergence_s,
        best_master_reselection_count: run
            .events
            .iter()
            .filter(|e| e.kind == PtpEventKind::BestMasterSelected)
            .count(),
        rms_mean_ns_post: stats::mean(&rms),
        rms_std_ns_post: stats::std_sample(&rms),
        rms_p95_ns_post: stats::percentile(&rms, 0.95),
        rms_max_ns_post: stats::max(&rms),
        max_mean_ns_post: stats::mean(&max),
        max_max_ns_post: stats::max(&max),
        path_delay_mean_ns_post: stats::mean(&delays),
        path_delay_std_ns_post: stats::std_sample(&delays),
    }
}

// ---------------------------------------------------------------------------
// Shared scales
// ---------------------------------------------------------------------------

/// Metric keys used for ptp4l shared scales.
pub const METRIC_OFFSET_NS: &str = "offset_ns";
pub const METRIC_PATH_DELAY_NS: &str = "path_delay_ns";
pub const METRIC_RMS_NS: &str = "rms_ns";

/// Shared y-axis bounds across every scenario of a batch: boundary offset
/// is signed, the rest are non-negative.
pub fn shared_scales(
    boundary_runs: &[RunResult<BoundarySample, PtpEvent>],
    client_runs: &[RunResult<ClientSample, PtpEvent>],
) -> SharedScales {
    let mut scales = SharedScales::new();

    scales.insert(
        Role::Boundary,
        METRIC_OFFSET_NS,
        boundary_runs
            .iter()
            .flat_map(|r| r.samples.iter().map(|s| s.offset_ns as f64))
            .collect::<Vec<_>>(),
        ScalePolicy::Symmetric,
    );
    scales.insert(
        Role::Boundary,
        METRIC_PATH_DELAY_NS,
        boundary_runs
            .iter()
            .flat_map(|r| r.samples.iter().map(|s| s.path_delay_ns as f64))
            .collect::<Vec<_>>(),
        ScalePolicy::PositiveOnly,
    );
    scales.insert(
        Role::Client,
        METRIC_RMS_NS,
        client_runs
            .iter()
            .flat_map(|r| r.samples.iter().map(|s| s.rms_ns as f64))
            .collect::<Vec<_>>(),
        ScalePolicy::PositiveOnly,
    );
    scales.insert(
        Role::Client,
        METRIC_PATH_DELAY_NS,
        client_runs
            .iter()
            .flat_map(|r| r.samples.iter().filter_map(|s| s.path_delay_ns.map(|d| d as f64)))
            .collect::<Vec<_>>(),
        ScalePolicy::PositiveOnly,
    );

    scales
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
