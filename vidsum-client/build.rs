//! Build script for vidsum-client
//!
//! Exposes build identification to the `vidsum` binary's start-up banner:
//! - `VIDSUM_GIT_HASH`: short commit hash, or "unknown" outside a git checkout
//! - `VIDSUM_BUILD_TIMESTAMP`: RFC 3339 local time of the build
//! - `VIDSUM_BUILD_PROFILE`: cargo profile (debug/release)

use std::process::Command;

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn main() {
    let git_hash = git_short_hash().unwrap_or_else(|| "unknown".to_string());
    let build_timestamp = chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, false);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=VIDSUM_GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=VIDSUM_BUILD_TIMESTAMP={}", build_timestamp);
    println!("cargo:rustc-env=VIDSUM_BUILD_PROFILE={}", profile);

    // Only the commit moves the hash; the timestamp is refreshed with it
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../.git/HEAD");
}
