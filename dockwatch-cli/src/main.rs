use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use dockwatch_core::{compute_zone_downtime_with, facility_now, facility_today, plan_completed, AnnotationIndex};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod dashboard;
mod monitor;
mod source;
mod state;
mod watch;

use config::Config;
use monitor::DowntimeMonitor;
use source::{FileTaskSource, HttpTaskSource, TaskSource};

#[derive(Parser, Debug)]
#[command(
    name = "dockwatch",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("DOCKWATCH_BUILD_SHA"), ")"),
    about = "Zone downtime analytics for container unloading docks"
)]
struct Cli {
    /// Config file (default: ~/.dockwatch/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the downtime report for one date and print it
    Report {
        /// Date (YYYY-MM-DD); defaults to today at the facility
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Read tasks from a JSON or CSV snapshot instead of the endpoint
        #[arg(long)]
        input: Option<PathBuf>,

        /// Also write the CSV export here
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Live dashboard: refetch every minute for today, tick the idle clock every second
    Watch {
        /// Date (YYYY-MM-DD); defaults to today and follows the date rollover
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Read tasks from a JSON or CSV snapshot instead of the endpoint
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config.toml if none exists
    Init,
    /// Print the effective config
    Show,
    /// Print the config file location
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The dashboard owns the terminal, so `watch` logs to a file.
    let log_file = match &cli.command {
        Command::Watch { .. } => Some(state::ensure_dockwatch_home()?.join("watch.log")),
        _ => None,
    };
    init_tracing(log_file.as_deref())?;

    match cli.command {
        Command::Report { date, input, csv } => {
            let cfg = config::load_config(cli.config.as_deref())?;
            report(&cfg, date, input.as_deref(), csv.as_deref()).await?;
        }

        Command::Watch { date, input } => {
            let cfg = config::load_config(cli.config.as_deref())?;
            let source = build_source(&cfg, input.as_deref())?;
            watch::run_watch(&cfg, date, source).await?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config(cli.config.as_deref())?,
            ConfigCommand::Show => {
                let cfg = config::load_config(cli.config.as_deref())?;
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
            ConfigCommand::Path => {
                let p = match cli.config {
                    Some(p) => p,
                    None => config::config_path()?,
                };
                println!("{}", p.display());
            }
        },
    }

    Ok(())
}

/// Logs go to stderr, or to `log_file` when the terminal is taken.
fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_env("DOCKWATCH_LOG")
        .unwrap_or_else(|_| EnvFilter::new("dockwatch=info,dockwatch_core=info,dockwatch_report=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn build_source(cfg: &Config, input: Option<&Path>) -> Result<Arc<dyn TaskSource>> {
    if let Some(path) = input {
        if !path.exists() {
            bail!("input not found: {}", path.display());
        }
        return Ok(Arc::new(FileTaskSource::new(path, cfg.source.date_format.clone())));
    }

    let Some(base_url) = cfg.source.base_url.clone() else {
        bail!("No endpoint configured. Set [source] base_url in config.toml (see: dockwatch config path) or pass --input <file>");
    };
    let timeout = std::time::Duration::from_secs(cfg.source.timeout_secs.max(1));
    Ok(Arc::new(HttpTaskSource::new(
        base_url,
        cfg.source.date_format.clone(),
        timeout,
    )?))
}

async fn report(cfg: &Config, date: Option<NaiveDate>, input: Option<&Path>, csv: Option<&Path>) -> Result<()> {
    let tz = cfg.timezone()?;
    let source = build_source(cfg, input)?;

    let now_utc = Utc::now();
    let today = facility_today(tz, now_utc);
    let date = date.unwrap_or(today);

    let tasks = source
        .fetch_tasks(date)
        .await
        .with_context(|| format!("fetching tasks for {date}"))?;
    let annotations = match source.fetch_downtime_annotations(date).await {
        Ok(a) => a,
        Err(e) => {
            warn!(%date, error = %e, "downtime reasons unavailable");
            Vec::new()
        }
    };

    let live = date == today;
    let report = compute_zone_downtime_with(
        &cfg.thresholds,
        &tasks,
        facility_now(tz, now_utc),
        live,
        plan_completed(&tasks),
    );
    info!(%date, tasks = tasks.len(), records = report.record_count(), "report computed");

    let header = dashboard::Header {
        date,
        live,
        updated: Some(now_utc.with_timezone(&tz).format("%H:%M:%S").to_string()),
    };
    print!("{}", dashboard::render(&report, &AnnotationIndex::build(annotations), &header));

    if let Some(path) = csv {
        dockwatch_report::write_report_csv_file(&report, path)?;
        println!(
            "\nWrote {} downtime rows and {} idle rows to {}",
            report.record_count(),
            report.active_idles.len(),
            path.display()
        );
    }

    Ok(())
}
