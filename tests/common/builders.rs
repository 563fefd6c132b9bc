//! Test builders: run metadata and on-disk capture layouts.
//!
//! These helpers panic on invalid input rather than returning `Result`;
//! they are for test readability, not production use.

use std::fs;
use std::path::{Path, PathBuf};

use driftline_core::run::{Role, RunMeta, Scenario};

/// Metadata for an in-memory run without touching the filesystem.
pub fn meta(role: Option<Role>, scenario: Scenario, source: &str) -> RunMeta {
    RunMeta {
        role,
        scenario,
        source: source.into(),
    }
}

/// Write a chrony capture directory `chrony_<scenario>/` with the fixed
/// pair of file names the batch driver resolves. Returns the directory.
pub fn write_chrony_capture(
    root: &Path,
    scenario: Scenario,
    tracking: &str,
    sourcestats: &str,
) -> PathBuf {
    let dir = root.join(format!("chrony_{scenario}"));
    fs::create_dir_all(&dir).expect("create capture dir");
    fs::write(dir.join("chrony_tracking_series.txt"), tracking).expect("write tracking");
    fs::write(dir.join("chrony_sourcestats_series.txt"), sourcestats).expect("write sourcestats");
    dir
}

/// Write a single log file whose name encodes role and scenario, the way
/// live captures are named.
pub fn write_log(root: &Path, family: &str, role: Role, scenario: Scenario, text: &str) -> PathBuf {
    let path = root.join(format!("{family}_{role}_{scenario}.log"));
    fs::write(&path, text).expect("write log");
    path
}
