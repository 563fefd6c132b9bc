//! Run identity and the normalized run container.
//!
//! Every parsed report becomes exactly one [`RunResult`]: an ordered sample
//! sequence plus an ordered event sequence, tagged with which daemon/node
//! class produced it ([`Role`]) and the experiment degradation level
//! ([`Scenario`]). A `RunResult` is immutable after parsing.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};

/// Which daemon/node class a report came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Boundary,
    Client,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Boundary, Role::Client];

    /// Case-insensitive substring search over an input name.
    pub fn infer(name: &str) -> Option<Role> {
        let name = name.to_ascii_lowercase();
        if name.contains("boundary") {
            Some(Role::Boundary)
        } else if name.contains("client") {
            Some(Role::Client)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Boundary => write!(f, "boundary"),
            Role::Client => write!(f, "client"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "boundary" => Ok(Role::Boundary),
            "client" => Ok(Role::Client),
            other => Err(format!("unknown role {other:?} (expected boundary|client)")),
        }
    }
}

/// Experiment degradation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    Low,
    Medium,
    High,
}

impl Scenario {
    /// Case-insensitive substring search over an input name. `low` is
    /// checked before `medium` before `high`, matching the original lookup
    /// order.
    pub fn infer(name: &str) -> Option<Scenario> {
        let name = name.to_ascii_lowercase();
        for (token, scenario) in [
            ("low", Scenario::Low),
            ("medium", Scenario::Medium),
            ("high", Scenario::High),
        ] {
            if name.contains(token) {
                return Some(scenario);
            }
        }
        None
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scenario::Low => write!(f, "low"),
            Scenario::Medium => write!(f, "medium"),
            Scenario::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Scenario::Low),
            "medium" => Ok(Scenario::Medium),
            "high" => Ok(Scenario::High),
            other => Err(format!(
                "unknown scenario {other:?} (expected low|medium|high)"
            )),
        }
    }
}

/// Identity of one run. The chrony family carries no role; peer-selection
/// and PTP runs always do.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMeta {
    pub role: Option<Role>,
    pub scenario: Scenario,
    pub source: PathBuf,
}

impl RunMeta {
    /// Resolve role/scenario for an input, either from explicit overrides or
    /// by case-insensitive substring search over the file stem and then the
    /// parent directory name.
    ///
    /// Failure to resolve is [`Error::AmbiguousMetadata`], reported before
    /// any parsing of the input proceeds.
    pub fn resolve(
        path: &Path,
        forced_role: Option<Role>,
        forced_scenario: Option<Scenario>,
        role_required: bool,
    ) -> Result<RunMeta> {
        let candidates = name_candidates(path);

        let role = forced_role.or_else(|| candidates.iter().find_map(|n| Role::infer(n)));
        if role_required && role.is_none() {
            return Err(Error::AmbiguousMetadata {
                name: path.display().to_string(),
                missing: "role",
            });
        }

        let scenario =
            forced_scenario.or_else(|| candidates.iter().find_map(|n| Scenario::infer(n)));
        let Some(scenario) = scenario else {
            return Err(Error::AmbiguousMetadata {
                name: path.display().to_string(),
                missing: "scenario",
            });
        };

        Ok(RunMeta {
            role,
            scenario,
            source: path.to_path_buf(),
        })
    }

    /// `role_scenario` label used in output file names; chrony runs (no
    /// role) collapse to the scenario alone.
    pub fn label(&self) -> String {
        match self.role {
            Some(role) => format!("{role}_{}", self.scenario),
            None => self.scenario.to_string(),
        }
    }
}

fn name_candidates(path: &Path) -> Vec<String> {
    let mut names = Vec::new();
    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
        names.push(stem.to_string());
    }
    if let Some(parent) = path.parent().and_then(|p| p.file_name()).and_then(|s| s.to_str()) {
        names.push(parent.to_string());
    }
    names
}

/// One parsed report: ordered samples plus ordered events, sharing the same
/// time base. Created once per input and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult<S, E> {
    pub meta: RunMeta,
    pub samples: Vec<S>,
    pub events: Vec<E>,
}

/// Event type for families that emit no events (chrony).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoEvent {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_role_and_scenario_from_stems() {
        let meta = RunMeta::resolve(
            Path::new("logs/ntp_boundaryHIGH_live.log"),
            None,
            None,
            true,
        )
        .unwrap();
        assert_eq!(meta.role, Some(Role::Boundary));
        assert_eq!(meta.scenario, Scenario::High);

        let meta =
            RunMeta::resolve(Path::new("ptp_client_medium.txt"), None, None, true).unwrap();
        assert_eq!(meta.role, Some(Role::Client));
        assert_eq!(meta.scenario, Scenario::Medium);
    }

    #[test]
    fn falls_back_to_parent_directory_name() {
        let meta = RunMeta::resolve(
            Path::new("chrony_low/chrony_tracking_series.txt"),
            None,
            None,
            false,
        )
        .unwrap();
        assert_eq!(meta.role, None);
        assert_eq!(meta.scenario, Scenario::Low);
    }

    #[test]
    fn unresolved_metadata_is_a_hard_error() {
        let err = RunMeta::resolve(Path::new("run42.log"), None, None, true).unwrap_err();
        assert!(matches!(err, Error::AmbiguousMetadata { missing: "role", .. }));

        let err = RunMeta::resolve(
            Path::new("boundary_run42.log"),
            None,
            None,
            true,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::AmbiguousMetadata {
                missing: "scenario",
                ..
            }
        ));
    }

    #[test]
    fn forced_overrides_win() {
        let meta = RunMeta::resolve(
            Path::new("boundary_low.log"),
            Some(Role::Client),
            Some(Scenario::High),
            true,
        )
        .unwrap();
        assert_eq!(meta.role, Some(Role::Client));
        assert_eq!(meta.scenario, Scenario::High);
    }

    #[test]
    fn labels_for_file_naming() {
        let meta = RunMeta::resolve(Path::new("client_low.log"), None, None, true).unwrap();
        assert_eq!(meta.label(), "client_low");

        let meta = RunMeta::resolve(Path::new("chrony_high"), None, None, false).unwrap();
        assert_eq!(meta.label(), "high");
    }
}
