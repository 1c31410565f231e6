//! Task sources: where a day's task list comes from.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use dockwatch_core::time::date_label;
use dockwatch_core::{DowntimeAnnotation, TaskRecord};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn fetch_tasks(&self, date: NaiveDate) -> Result<Vec<TaskRecord>>;

    /// Optional enrichment; sources without reasons return nothing.
    async fn fetch_downtime_annotations(&self, _date: NaiveDate) -> Result<Vec<DowntimeAnnotation>> {
        Ok(Vec::new())
    }
}

/// Response shapes the web endpoint is known to return.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    List(Vec<T>),
    Tasks { tasks: Vec<T> },
    Data { data: Vec<T> },
    Error { error: String },
}

fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<Vec<T>> {
    let env: Envelope<T> = serde_json::from_str(body).context("parse endpoint response")?;
    match env {
        Envelope::List(v) | Envelope::Tasks { tasks: v } | Envelope::Data { data: v } => Ok(v),
        Envelope::Error { error } => bail!("endpoint error: {error}"),
    }
}

/// Drop records that fail basic validation; the rest of the day still counts.
fn keep_valid(tasks: Vec<TaskRecord>) -> Vec<TaskRecord> {
    tasks
        .into_iter()
        .filter(|t| match t.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, zone = ?t.zone, "skipping task record");
                false
            }
        })
        .collect()
}

/// The spreadsheet-backed web endpoint.
#[derive(Debug, Clone)]
pub struct HttpTaskSource {
    client: reqwest::Client,
    base_url: String,
    date_format: String,
}

impl HttpTaskSource {
    pub fn new(base_url: impl Into<String>, date_format: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            date_format: date_format.into(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, action: &str, date: NaiveDate) -> Result<Vec<T>> {
        let label = date_label(date, &self.date_format);
        debug!(action, date = %label, "endpoint request");

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("action", action), ("date", label.as_str())])
            .send()
            .await
            .with_context(|| format!("{action} request"))?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("{action} failed: {status} {txt}");
        }

        let body = resp.text().await.with_context(|| format!("read {action} response"))?;
        decode_envelope(&body).with_context(|| format!("{action} for {label}"))
    }
}

#[async_trait]
impl TaskSource for HttpTaskSource {
    async fn fetch_tasks(&self, date: NaiveDate) -> Result<Vec<TaskRecord>> {
        Ok(keep_valid(self.get("getTasks", date).await?))
    }

    async fn fetch_downtime_annotations(&self, date: NaiveDate) -> Result<Vec<DowntimeAnnotation>> {
        self.get("getDowntimeReasons", date).await
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DaySnapshot {
    Bare(Vec<TaskRecord>),
    Full {
        tasks: Vec<TaskRecord>,
        #[serde(default)]
        annotations: Vec<DowntimeAnnotation>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FileSnapshot {
    Day(DaySnapshot),
    /// Keyed by date label.
    ByDate(BTreeMap<String, DaySnapshot>),
}

/// Offline snapshot on disk: a task sheet CSV or a JSON dump.
///
/// Re-read on every fetch so edits show up while watching.
#[derive(Debug, Clone)]
pub struct FileTaskSource {
    path: PathBuf,
    date_format: String,
}

impl FileTaskSource {
    pub fn new(path: impl Into<PathBuf>, date_format: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            date_format: date_format.into(),
        }
    }

    fn is_csv(&self) -> bool {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
    }

    async fn load_day(&self, date: NaiveDate) -> Result<(Vec<TaskRecord>, Vec<DowntimeAnnotation>)> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("read {}", self.path.display()))?;
        let snapshot: FileSnapshot =
            serde_json::from_str(&text).with_context(|| format!("parse {}", self.path.display()))?;

        let day = match snapshot {
            FileSnapshot::Day(day) => day,
            FileSnapshot::ByDate(mut days) => {
                let label = date_label(date, &self.date_format);
                match days.remove(&label) {
                    Some(day) => day,
                    None => bail!("{} has no entry for {label}", self.path.display()),
                }
            }
        };

        Ok(match day {
            DaySnapshot::Bare(tasks) => (tasks, Vec::new()),
            DaySnapshot::Full { tasks, annotations } => (tasks, annotations),
        })
    }
}

#[async_trait]
impl TaskSource for FileTaskSource {
    async fn fetch_tasks(&self, date: NaiveDate) -> Result<Vec<TaskRecord>> {
        if self.is_csv() {
            let path = self.path.clone();
            return tokio::task::spawn_blocking(move || dockwatch_report::parse_task_csv(path))
                .await
                .context("csv import task panicked")?;
        }
        Ok(keep_valid(self.load_day(date).await?.0))
    }

    async fn fetch_downtime_annotations(&self, date: NaiveDate) -> Result<Vec<DowntimeAnnotation>> {
        if self.is_csv() {
            return Ok(Vec::new());
        }
        Ok(self.load_day(date).await?.1)
    }
}
