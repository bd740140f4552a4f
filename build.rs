use std::env;
use std::process::Command;

/// Version string for `--version`: an explicit override, then git, then Cargo.
fn main() {
    println!("cargo:rerun-if-env-changed=TRIPWIZ_VERSION");

    let version = env::var("TRIPWIZ_VERSION")
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(git_describe)
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").into());

    println!("cargo:rustc-env=GIT_VERSION={version}");
}

fn git_describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--match", "v*"])
        .output()
        .ok()
        .filter(|o| o.status.success())?;
    let tag = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Some(tag.strip_prefix('v').unwrap_or(&tag).to_string())
}
