use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use dockwatch_core::time::parse_timezone;
use dockwatch_core::DockThresholds;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::state::{dockwatch_home, ensure_dockwatch_home};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceSection,
    pub facility: FacilitySection,
    pub refresh: RefreshSection,
    pub thresholds: DockThresholds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    /// Task endpoint (web app URL). Required for the HTTP source.
    pub base_url: Option<String>,
    /// chrono format of the date label the endpoint expects.
    pub date_format: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FacilitySection {
    /// IANA timezone of the warehouse.
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshSection {
    /// Refetch period while viewing today.
    pub interval_secs: u64,
    /// Live idle clock tick.
    pub clock_tick_secs: u64,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            base_url: None,
            date_format: "%d.%m.%Y".to_string(),
            timeout_secs: 15,
        }
    }
}

impl Default for FacilitySection {
    fn default() -> Self {
        Self {
            timezone: "Europe/Moscow".to_string(),
        }
    }
}

impl Default for RefreshSection {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            clock_tick_secs: 1,
        }
    }
}

impl Config {
    pub fn timezone(&self) -> Result<Tz> {
        Ok(parse_timezone(&self.facility.timezone)?)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh.interval_secs.max(1))
    }

    pub fn clock_tick(&self) -> Duration {
        Duration::from_secs(self.refresh.clock_tick_secs.max(1))
    }

    pub fn validate(&self) -> Result<()> {
        self.timezone()?;
        if let Err(e) = self.thresholds.validate() {
            bail!("[thresholds] {e}");
        }
        if self.source.date_format.trim().is_empty() {
            bail!("[source] date_format must be non-empty");
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(dockwatch_home()?.join("config.toml"))
}

/// Load from `path`, or the default location. A missing file means defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let p = match path {
        Some(p) => p.to_path_buf(),
        None => config_path()?,
    };
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    let cfg: Config = toml::from_str(&s).with_context(|| format!("parse {}", p.display()))?;
    cfg.validate().with_context(|| format!("invalid {}", p.display()))?;
    Ok(cfg)
}

pub fn save_config(cfg: &Config, path: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config(path: Option<&Path>) -> Result<()> {
    let p = match path {
        Some(p) => p.to_path_buf(),
        None => {
            ensure_dockwatch_home()?;
            config_path()?
        }
    };
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}
