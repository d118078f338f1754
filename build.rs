// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=SCANLINK_VERSION");

    // Packagers can pin the version string explicitly
    let version = match std::env::var("SCANLINK_VERSION") {
        Ok(v) => v,
        Err(_) => describe_version(),
    };

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// Build a version string from `git describe`, falling back to the crate version
///
/// "0.1.0" at a tag becomes "0.1.0-abcdef1", commits after a tag become
/// "0.1.0-dirty-abcdef1".
fn describe_version() -> String {
    let pkg_version = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".into());

    let Some(described) = git(&["describe", "--tags", "--always", "--match", "v*"]) else {
        return pkg_version;
    };
    let described = described.strip_prefix('v').unwrap_or(&described).to_string();
    let hash = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".into());

    let parts: Vec<&str> = described.rsplitn(3, '-').collect();
    if parts.len() >= 3 {
        format!("{}-dirty-{}", parts[2], hash)
    } else if described.contains('.') {
        format!("{}-{}", described, hash)
    } else {
        // No tags yet, describe returned a bare hash
        format!("{}-{}", pkg_version, hash)
    }
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if output.status.success() {
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        None
    }
}
