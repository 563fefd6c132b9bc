//! ntpq peer-table parser (`ntpq -p` style snapshots).
//!
//! Input is a sequence of snapshots, each opened by `--- HH:MM:SS ---`,
//! followed by the usual banner and zero or more fixed-column peer rows.
//! The header timestamp carries no date: it is seconds since midnight and
//! wraps at 24h. Runs crossing midnight therefore show a spurious negative
//! jump; the original capture pipeline never corrected this and neither
//! does this parser (known limitation).
//!
//! Per snapshot exactly one peer row becomes the Sample: the `*`-marked row
//! when one exists, otherwise the first row in file order.

use regex::Regex;

use driftline_core::error::{Error, Result};
use driftline_core::run::{Role, RunMeta, RunResult};
use driftline_core::scale::{ScalePolicy, SharedScales};
use driftline_core::stats;

/// Banner lines preceding the peer rows.
const HEADER_PREFIXES: [&str; 2] = ["remote", "refid"];

/// The authoritative peer row of one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerSample {
    /// Wall-clock seconds since midnight, as printed.
    pub t_s: f64,
    /// Seconds relative to the earliest snapshot of the run.
    pub t_rel_s: f64,
    pub hhmmss: String,
    /// Leading selection marker of the remote token, if any (`*`, `+`, `-`,
    /// `x`, `o`, `#`, ...).
    pub sel_char: Option<char>,
    /// True iff the marker is `*`: this peer is the synchronization source.
    pub selected: bool,
    pub remote: String,
    pub refid: String,
    pub stratum: u32,
    pub assoc_type: String,
    /// Seconds since last poll; absent when printed as `-` or in a
    /// non-integer form.
    pub when_s: Option<u32>,
    pub poll_s: u32,
    /// Reachability register exactly as printed.
    pub reach_raw: String,
    /// The raw code reinterpreted as base-8 when it is all decimal digits;
    /// absent otherwise (the shift register is conventionally printed in
    /// octal-looking digits).
    pub reach_oct: Option<u32>,
    pub delay_ms: f64,
    pub offset_ms: f64,
    pub jitter_ms: f64,
    pub raw: String,
}

/// Discrete occurrence derived from a snapshot's chosen row.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerEvent {
    pub t_s: f64,
    pub t_rel_s: f64,
    pub hhmmss: String,
    pub kind: PeerEventKind,
    pub detail: String,
    pub raw: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerEventKind {
    /// The chosen row's refid was the `.INIT.` sentinel.
    Init,
    /// The chosen row carried the `*` marker; detail names the remote.
    SelectedPeer,
}

impl std::fmt::Display for PeerEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeerEventKind::Init => write!(f, "init"),
            PeerEventKind::SelectedPeer => write!(f, "selected_peer"),
        }
    }
}

/// Aggregate row over one peer-selection run. Post-lock statistics cover
/// the selected (`*`) samples only.
#[derive(Debug, Clone, PartialEq)]
pub struct NtpSummary {
    pub meta: RunMeta,
    /// Run-relative time of the first selected sample ("lock time").
    pub t_first_selected_s: Option<f64>,
    pub offset_mean_ms_post: Option<f64>,
    pub offset_std_ms_post: Option<f64>,
    pub offset_p95_ms_post: Option<f64>,
    pub offset_maxabs_ms_post: Option<f64>,
    pub jitter_mean_ms_post: Option<f64>,
    pub jitter_p95_ms_post: Option<f64>,
    pub delay_mean_ms_post: Option<f64>,
    pub delay_p95_ms_post: Option<f64>,
    pub reach_final_raw: Option<String>,
    pub reach_final_oct: Option<u32>,
}

/// Parser for ntpq snapshot reports. Regexes are compiled once per
/// instance; the parser holds no per-run state.
pub struct NtpqParser {
    re_snapshot: Regex,
    re_peer_row: Regex,
}

impl Default for NtpqParser {
    fn default() -> Self {
        Self::new()
    }
}

impl NtpqParser {
    pub fn new() -> Self {
        Self {
            re_snapshot: Regex::new(r"^---\s+(?P<h>\d{2}):(?P<m>\d{2}):(?P<s>\d{2})\s+---\s*$")
                .expect("hardcoded snapshot regex must compile"),
            re_peer_row: Regex::new(
                r"^(?P<remote_tok>\S+)\s+(?P<refid>\S+)\s+(?P<st>\d+)\s+(?P<t>\S+)\s+(?P<when>\S+)\s+(?P<poll>\d+)\s+(?P<reach>\S+)\s+(?P<delay>-?\d+(?:\.\d+)?)\s+(?P<offset>-?\d+(?:\.\d+)?)\s+(?P<jitter>-?\d+(?:\.\d+)?)\s*$",
            )
            .expect("hardcoded peer-row regex must compile"),
        }
    }

    /// Parse one report into a run. Unrecognized lines are soft-skipped;
    /// snapshots with zero peer rows contribute no sample.
    pub fn parse(&self, text: &str, meta: RunMeta) -> Result<RunResult<PeerSample, PeerEvent>> {
        let mut samples: Vec<PeerSample> = Vec::new();
        let mut events: Vec<PeerEvent> = Vec::new();

        let mut current_ts: Option<u32> = None;
        let mut snapshot_peers: Vec<PeerSample> = Vec::new();
        let mut skipped = 0usize;

        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();

            if let Some(caps) = self.re_snapshot.captures(line) {
                flush_snapshot(&mut samples, &mut events, current_ts, &mut snapshot_peers);
                let h: u32 = parse_field(&caps["h"], idx + 1)?;
                let m: u32 = parse_field(&caps["m"], idx + 1)?;
                let s: u32 = parse_field(&caps["s"], idx + 1)?;
                current_ts = Some(h * 3600 + m * 60 + s);
                continue;
            }

            if line.is_empty() {
                continue;
            }

            if HEADER_PREFIXES.iter().any(|p| line.starts_with(p)) || line.starts_with('=') {
                continue;
            }

            let Some(ts) = current_ts else {
                skipped += 1;
                continue;
            };

            let Some(caps) = self.re_peer_row.captures(line) else {
                skipped += 1;
                continue;
            };

            let remote_tok = &caps["remote_tok"];
            let (sel_char, remote) = split_selection_marker(remote_tok);
            let selected = sel_char == Some('*');

            let reach_raw = caps["reach"].to_string();
            let reach_oct = reinterpret_reach(&reach_raw);

            snapshot_peers.push(PeerSample {
                t_s: f64::from(ts),
                t_rel_s: 0.0, // rebased after the whole run is read
                hhmmss: format!("{:02}:{:02}:{:02}", ts / 3600, (ts % 3600) / 60, ts % 60),
                sel_char,
                selected,
                remote: remote.to_string(),
                refid: caps["refid"].to_string(),
                stratum: parse_field(&caps["st"], idx + 1)?,
                assoc_type: caps["t"].to_string(),
                when_s: caps["when"].parse().ok(),
                poll_s: parse_field(&caps["poll"], idx + 1)?,
                reach_raw,
                reach_oct,
                delay_ms: parse_field(&caps["delay"], idx + 1)?,
                offset_ms: parse_field(&caps["offset"], idx + 1)?,
                jitter_ms: parse_field(&caps["jitter"], idx + 1)?,
                raw: line.to_string(),
            });
        }
        flush_snapshot(&mut samples, &mut events, current_ts, &mut snapshot_peers);

        if skipped > 0 {
            tracing::debug!(skipped, source = %meta.source.display(), "ntpq lines ignored");
        }

        // Samples and events share one time base: the minimum observed
        // wall-clock value across the whole run.
        let t0 = samples
            .iter()
            .map(|s| s.t_s)
            .chain(events.iter().map(|e| e.t_s))
            .fold(None, |acc: Option<f64>, t| {
                Some(acc.map_or(t, |m: f64| m.min(t)))
            });
        if let Some(t0) = t0 {
            for s in &mut samples {
                s.t_rel_s = s.t_s - t0;
            }
            for e in &mut events {
                e.t_rel_s = e.t_s - t0;
            }
        }

        Ok(RunResult {
            meta,
            samples,
            events,
        })
    }
}

/// Pick the authoritative row of a snapshot and emit its samples/events.
fn flush_snapshot(
    samples: &mut Vec<PeerSample>,
    events: &mut Vec<PeerEvent>,
    current_ts: Option<u32>,
    snapshot_peers: &mut Vec<PeerSample>,
) {
    if current_ts.is_none() || snapshot_peers.is_empty() {
        snapshot_peers.clear();
        return;
    }

    let chosen_idx = snapshot_peers
        .iter()
        .position(|p| p.selected)
        .unwrap_or(0);
    let chosen = snapshot_peers.swap_remove(chosen_idx);
    snapshot_peers.clear();

    if chosen.refid == ".INIT." {
        events.push(PeerEvent {
            t_s: chosen.t_s,
            t_rel_s: 0.0,
            hhmmss: chosen.hhmmss.clone(),
            kind: PeerEventKind::Init,
            detail: "refid=.INIT.".to_string(),
            raw: chosen.raw.clone(),
        });
    }
    if chosen.selected {
        events.push(PeerEvent {
            t_s: chosen.t_s,
            t_rel_s: 0.0,
            hhmmss: chosen.hhmmss.clone(),
            kind: PeerEventKind::SelectedPeer,
            detail: chosen.remote.clone(),
            raw: chosen.raw.clone(),
        });
    }

    samples.push(chosen);
}

/// The leading character of a remote token is a selection marker iff it is
/// non-alphanumeric and not one of `.`/`_` (which legitimately start host
/// names and refid sentinels).
fn split_selection_marker(remote_tok: &str) -> (Option<char>, &str) {
    match remote_tok.chars().next() {
        Some(c) if !c.is_alphanumeric() && c != '.' && c != '_' => {
            (Some(c), &remote_tok[c.len_utf8()..])
        }
        _ => (None, remote_tok),
    }
}

/// Reinterpret an all-decimal-digit reach code as base-8. Codes containing
/// the digits 8/9 or any non-digit stay raw-only.
fn reinterpret_reach(reach_raw: &str) -> Option<u32> {
    if !reach_raw.is_empty() && reach_raw.bytes().all(|b| b.is_ascii_digit()) {
        u32::from_str_radix(reach_raw, 8).ok()
    } else {
        None
    }
}

fn parse_field<T: std::str::FromStr>(token: &str, line_no: usize) -> Result<T> {
    token.parse().map_err(|_| Error::Format {
        line_no,
        reason: format!("bad numeric field {token:?}"),
    })
}

/// One aggregate row per run. "Lock" is the first selected sample.
pub fn summarize(run: &RunResult<PeerSample, PeerEvent>) -> NtpSummary {
    let post: Vec<&PeerSample> = run.samples.iter().filter(|s| s.selected).collect();

    let t_first_selected_s = post
        .iter()
        .map(|s| s.t_rel_s)
        .fold(None, |acc: Option<f64>, t| {
            Some(acc.map_or(t, |m: f64| m.min(t)))
        });

    let offsets: Vec<f64> = post.iter().map(|s| s.offset_ms).collect();
    let jitters: Vec<f64> = post.iter().map(|s| s.jitter_ms).collect();
    let delays: Vec<f64> = post.iter().map(|s| s.delay_ms).collect();

    let last = run.samples.last();

    NtpSummary {
        meta: run.meta.clone(),
        t_first_selected_s,
        offset_mean_ms_post: stats::mean(&offsets),
        offset_std_ms_post: stats::std_sample(&offsets),
        offset_p95_ms_post: stats::percentile(&offsets, 0.95),
        offset_maxabs_ms_post: stats::max_abs(&offsets),
        jitter_mean_ms_post: stats::mean(&jitters),
        jitter_p95_ms_post: stats::percentile(&jitters, 0.95),
        delay_mean_ms_post: stats::mean(&delays),
        delay_p95_ms_post: stats::percentile(&delays, 0.95),
        reach_final_raw: last.map(|s| s.reach_raw.clone()),
        reach_final_oct: last.and_then(|s| s.reach_oct),
    }
}

/// Metric keys used for ntpq shared scales.
pub const METRIC_OFFSET_MS: &str = "offset_ms";
pub const METRIC_JITTER_MS: &str = "jitter_ms";
pub const METRIC_DELAY_MS: &str = "delay_ms";

/// Shared y-axis bounds per (role, metric) across every scenario of a
/// batch. Offset is signed; jitter and delay are non-negative in normal
/// output.
pub fn shared_scales(runs: &[RunResult<PeerSample, PeerEvent>]) -> SharedScales {
    let mut scales = SharedScales::new();

    for role in Role::ALL {
        let role_runs: Vec<_> = runs
            .iter()
            .filter(|r| r.meta.role == Some(role) && !r.samples.is_empty())
            .collect();
        if role_runs.is_empty() {
            continue;
        }

        let metric = |f: fn(&PeerSample) -> f64| {
            role_runs
                .iter()
                .flat_map(|r| r.samples.iter().map(f))
                .collect::<Vec<_>>()
        };

        scales.insert(
            role,
            METRIC_OFFSET_MS,
            metric(|s| s.offset_ms),
            ScalePolicy::Symmetric,
        );
        scales.insert(
            role,
            METRIC_JITTER_MS,
            metric(|s| s.jitter_ms),
            ScalePolicy::PositiveOnly,
        );
        scales.insert(
            role,
            METRIC_DELAY_MS,
            metric(|s| s.delay_ms),
            ScalePolicy::PositiveOnly,
        );
    }

    scales
}
