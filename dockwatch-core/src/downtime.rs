//! Zone downtime report: the single entry point for the presentation layer.
//!
//! Pure function of (tasks, now, is_today, plan_completed, thresholds).
//! Nothing is cached between calls; every refresh recomputes from scratch.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::classifier::{live_idle, zone_downtime, ActiveIdleZone};
use crate::correlator::group_completions;
use crate::stats::{grand_totals, rank_active_idles, rank_zones, GrandTotals, ZoneStats};
use crate::task::TaskRecord;
use crate::thresholds::DockThresholds;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DowntimeReport {
    /// Ranked by total idle, worst first.
    pub zone_stats: Vec<ZoneStats>,
    /// Ranked by current idle, longest first. Empty unless today.
    pub active_idles: Vec<ActiveIdleZone>,
    pub grand_total_minutes: i64,
    /// Mean of the per-zone totals; 0 with no zones.
    pub grand_average_minutes: i64,
}

impl DowntimeReport {
    pub fn record_count(&self) -> usize {
        self.zone_stats.iter().map(|z| z.records.len()).sum()
    }
}

pub fn compute_zone_downtime(
    tasks: &[TaskRecord],
    now: NaiveTime,
    is_today: bool,
    plan_completed: bool,
) -> DowntimeReport {
    compute_zone_downtime_with(&DockThresholds::default(), tasks, now, is_today, plan_completed)
}

pub fn compute_zone_downtime_with(
    thresholds: &DockThresholds,
    tasks: &[TaskRecord],
    now: NaiveTime,
    is_today: bool,
    plan_completed: bool,
) -> DowntimeReport {
    let groups = group_completions(tasks);

    let mut zone_stats: Vec<ZoneStats> = groups
        .iter()
        .filter_map(|g| ZoneStats::from_records(g.zone, zone_downtime(g, thresholds)))
        .collect();
    rank_zones(&mut zone_stats);

    // A finished plan is not idle-and-blocked.
    let mut active_idles = if is_today && !plan_completed {
        live_idle(tasks, &groups, now, thresholds)
    } else {
        Vec::new()
    };
    rank_active_idles(&mut active_idles);

    let GrandTotals {
        total_idle_minutes,
        average_idle_minutes,
        ..
    } = grand_totals(&zone_stats);

    DowntimeReport {
        zone_stats,
        active_idles,
        grand_total_minutes: total_idle_minutes,
        grand_average_minutes: average_idle_minutes,
    }
}
