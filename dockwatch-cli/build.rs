use std::path::Path;
use std::process::Command;

/// Short HEAD of the workspace, if this is a git checkout.
fn git_short_sha(workspace: &Path) -> Option<String> {
    let out = Command::new("git")
        .arg("-C")
        .arg(workspace)
        .args(["rev-parse", "--short=9", "HEAD"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let sha = String::from_utf8_lossy(&out.stdout).trim().to_string();
    (!sha.is_empty()).then_some(sha)
}

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let workspace = Path::new(&manifest_dir).join("..");

    // Source tarballs carry no .git; packagers pass the revision in.
    let sha = std::env::var("DOCKWATCH_BUILD_SHA")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| git_short_sha(&workspace))
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=DOCKWATCH_BUILD_SHA={sha}");
    println!("cargo:rerun-if-env-changed=DOCKWATCH_BUILD_SHA");
    println!("cargo:rerun-if-changed=../.git/HEAD");
}
