//! Refresh lifecycle for the downtime view.
//!
//! One refresh loop per selected date. It fetches once immediately and,
//! while the selected date is today, again every refresh interval. Each fetch
//! carries a sequence number; only the latest issued request may publish.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use dockwatch_core::{
    compute_zone_downtime_with, plan_completed, AnnotationIndex, DockThresholds, DowntimeReport,
    TaskRecord,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::source::TaskSource;

/// Everything fetched for one date. Replaced wholesale on each refresh.
#[derive(Debug)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub tasks: Vec<TaskRecord>,
    pub annotations: AnnotationIndex,
    pub fetched_at: DateTime<Utc>,
    pub seq: u64,
}

impl Snapshot {
    pub fn report(&self, thresholds: &DockThresholds, now: NaiveTime, today: NaiveDate) -> DowntimeReport {
        compute_zone_downtime_with(
            thresholds,
            &self.tasks,
            now,
            self.date == today,
            plan_completed(&self.tasks),
        )
    }
}

pub type SnapshotCell = Option<Arc<Snapshot>>;

#[derive(Clone)]
struct Shared {
    source: Arc<dyn TaskSource>,
    issued: Arc<AtomicU64>,
    state: Arc<watch::Sender<SnapshotCell>>,
}

impl Shared {
    fn next_seq(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Fetch and publish. `Ok(false)` means the response was stale.
    async fn refresh(&self, date: NaiveDate) -> Result<bool> {
        let seq = self.next_seq();
        debug!(%date, seq, "refresh started");

        let tasks = self
            .source
            .fetch_tasks(date)
            .await
            .with_context(|| format!("fetch tasks for {date}"))?;

        let annotations = match self.source.fetch_downtime_annotations(date).await {
            Ok(a) => a,
            Err(e) => {
                warn!(%date, error = %e, "downtime reasons unavailable");
                Vec::new()
            }
        };

        let snapshot = Snapshot {
            date,
            tasks,
            annotations: AnnotationIndex::build(annotations),
            fetched_at: Utc::now(),
            seq,
        };
        Ok(self.publish(snapshot))
    }

    /// The sequence check runs under the channel lock, the same lock
    /// `select_date` clears the cell under.
    fn publish(&self, snapshot: Snapshot) -> bool {
        let seq = snapshot.seq;
        let mut latest = 0;
        let applied = self.state.send_if_modified(|cell| {
            latest = self.issued.load(Ordering::SeqCst);
            if seq != latest {
                return false;
            }
            if cell.as_ref().is_some_and(|cur| cur.seq >= seq) {
                return false;
            }
            *cell = Some(Arc::new(snapshot));
            true
        });
        if !applied {
            debug!(seq, latest, "dropping stale response");
        }
        applied
    }

    async fn refresh_logged(&self, date: NaiveDate) {
        match self.refresh(date).await {
            Ok(true) => debug!(%date, "snapshot updated"),
            Ok(false) => {}
            // Keep whatever is on screen.
            Err(e) => warn!(%date, error = %format!("{e:#}"), "refresh failed"),
        }
    }
}

struct RefreshLoop {
    date: NaiveDate,
    polling: bool,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

async fn run_refresh_loop(shared: Shared, date: NaiveDate, poll_every: Option<Duration>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(poll_every.unwrap_or(Duration::from_secs(60)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = shared.refresh_logged(date) => {}
        }
        if poll_every.is_none() {
            break;
        }
    }

    debug!(%date, "refresh loop stopped");
}

/// Owns the refresh loop and the latest snapshot.
pub struct DowntimeMonitor {
    shared: Shared,
    interval: Duration,
    current: Option<RefreshLoop>,
}

impl DowntimeMonitor {
    pub fn new(source: Arc<dyn TaskSource>, interval: Duration) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            shared: Shared {
                source,
                issued: Arc::new(AtomicU64::new(0)),
                state: Arc::new(tx),
            },
            interval,
            current: None,
        }
    }

    /// Switch the view to `date`. Polls only when `date == today`.
    pub fn select_date(&mut self, date: NaiveDate, today: NaiveDate) {
        self.stop();

        // Anything still in flight belongs to the previous selection.
        self.shared.issued.fetch_add(1, Ordering::SeqCst);
        let other_date = self
            .shared
            .state
            .borrow()
            .as_ref()
            .is_some_and(|s| s.date != date);
        if other_date {
            self.shared.state.send_replace(None);
        }

        let polling = date == today;
        info!(%date, polling, "selected date");

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_refresh_loop(
            self.shared.clone(),
            date,
            polling.then_some(self.interval),
            cancel.clone(),
        ));

        self.current = Some(RefreshLoop {
            date,
            polling,
            cancel,
            handle,
        });
    }

    /// Manual refresh of the selected date. Returns at once; the result
    /// arrives on the snapshot channel through the same sequence guard and is
    /// cancelled with the current loop.
    pub fn request_refresh(&self) -> Result<()> {
        let current = self.current.as_ref().context("no date selected")?;
        let shared = self.shared.clone();
        let date = current.date;
        let cancel = current.cancel.clone();
        debug!(%date, "manual refresh requested");

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = shared.refresh_logged(date) => {}
            }
        });
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(l) = self.current.take() {
            l.cancel.cancel();
            l.handle.abort();
        }
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.current.as_ref().map(|l| l.date)
    }

    pub fn is_polling(&self) -> bool {
        self.current.as_ref().is_some_and(|l| l.polling && !l.handle.is_finished())
    }

    pub fn snapshot(&self) -> SnapshotCell {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SnapshotCell> {
        self.shared.state.subscribe()
    }
}

impl Drop for DowntimeMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
