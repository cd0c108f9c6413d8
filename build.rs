//! Embeds the build timestamp and git revision shown in the startup banner.

use std::process::Command;

/// Trimmed stdout of a successful command
fn capture(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn main() {
    let stamp = capture("date", &["+%Y-%m-%d %H:%M:%S"]).unwrap_or_else(|| "unknown".into());
    let revision = capture("git", &["rev-parse", "--short", "HEAD"])
        .map(|hash| match capture("git", &["status", "--porcelain", "--untracked-files=no"]) {
            Some(_) => format!("{}-dirty", hash),
            None => hash,
        })
        .unwrap_or_else(|| "unknown".into());

    println!("cargo:rustc-env=BUILD_STAMP={}", stamp);
    println!("cargo:rustc-env=GIT_REVISION={}", revision);
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=build.rs");
}
