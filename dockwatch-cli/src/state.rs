use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$DOCKWATCH_HOME`, else `~/.dockwatch`.
pub fn dockwatch_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("DOCKWATCH_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".dockwatch"))
}

pub fn ensure_dockwatch_home() -> Result<PathBuf> {
    let dir = dockwatch_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
