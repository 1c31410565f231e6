//! Downtime classification.
//!
//! Historical: a gap between two adjacent completions at a zone becomes a
//! [`DowntimeRecord`] once corrected for dock process offsets.
//! Live: a zone with nothing unloading and nothing waiting becomes an
//! [`ActiveIdleZone`] measured against the current wall clock.

use std::collections::HashSet;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::correlator::{Completion, ZoneCompletions};
use crate::task::TaskRecord;
use crate::thresholds::DockThresholds;
use crate::time::{clock_minutes, format_clock, millis_since_midnight, ClockMinutes};

/// A closed idle gap between two containers at the same zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DowntimeRecord {
    pub zone: String,
    pub prior_container_id: String,
    pub prior_end_time: String,
    pub next_container_id: String,
    pub next_start_time: String,
    /// Corrected; always above the minimum downtime threshold.
    pub idle_minutes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdleSeverity {
    Normal,
    Warning,
    Critical,
}

impl IdleSeverity {
    pub fn classify(idle_minutes: i64, thresholds: &DockThresholds) -> Self {
        if idle_minutes > thresholds.critical_minutes {
            IdleSeverity::Critical
        } else if idle_minutes > thresholds.warning_minutes {
            IdleSeverity::Warning
        } else {
            IdleSeverity::Normal
        }
    }
}

/// A zone sitting idle right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveIdleZone {
    pub zone: String,
    pub last_container_id: String,
    pub last_end_time: String,
    /// Corrected dock-free instant, minutes since midnight.
    pub idle_start: ClockMinutes,
    pub idle_minutes: i64,
    pub severity: IdleSeverity,
}

impl ActiveIdleZone {
    pub fn idle_start_label(&self) -> String {
        format_clock(self.idle_start)
    }
}

/// Corrected idle gap between `prior`'s end and `next`'s start, if reportable.
pub fn classify_pair(
    zone: &str,
    prior: &Completion<'_>,
    next: &Completion<'_>,
    thresholds: &DockThresholds,
) -> Option<DowntimeRecord> {
    let next_label = next.task.start_label();
    let Some(next_start) = clock_minutes(next_label) else {
        debug!(
            zone = %zone,
            container = %next.task.id,
            start = ?next.task.start_time,
            "skipping pair: next task has no usable start time"
        );
        return None;
    };

    let raw = i64::from(next_start) - i64::from(prior.end);
    if raw < 0 {
        warn!(
            zone = %zone,
            prior = %prior.task.id,
            prior_end = %format_clock(prior.end),
            next = %next.task.id,
            next_start = %format_clock(next_start),
            raw_minutes = raw,
            "dropping pair: next start precedes prior end"
        );
        return None;
    }

    let corrected = raw - thresholds.dock_interval_offset();
    if corrected <= thresholds.min_downtime_minutes {
        return None;
    }

    Some(DowntimeRecord {
        zone: zone.to_string(),
        prior_container_id: prior.task.id.clone(),
        prior_end_time: prior.end_label.to_string(),
        next_container_id: next.task.id.clone(),
        next_start_time: next_label.unwrap_or_default().to_string(),
        idle_minutes: corrected,
    })
}

/// All reportable historical gaps for one zone, in chronological order.
pub fn zone_downtime(group: &ZoneCompletions<'_>, thresholds: &DockThresholds) -> Vec<DowntimeRecord> {
    group
        .pairs()
        .filter_map(|(prior, next)| classify_pair(group.zone, prior, next, thresholds))
        .collect()
}

/// Zones that currently have a container unloading or waiting.
fn busy_zones(tasks: &[TaskRecord]) -> HashSet<&str> {
    tasks
        .iter()
        .filter(|t| t.is_unloading() || t.is_waiting())
        .filter_map(|t| t.zone_label())
        .collect()
}

/// Live idle state for every zone, measured against `now`.
///
/// Callers gate this on "today" and on the plan not being complete.
pub fn live_idle(
    tasks: &[TaskRecord],
    groups: &[ZoneCompletions<'_>],
    now: NaiveTime,
    thresholds: &DockThresholds,
) -> Vec<ActiveIdleZone> {
    let busy = busy_zones(tasks);
    let now_ms = millis_since_midnight(now);

    groups
        .iter()
        .filter(|g| !busy.contains(g.zone))
        .filter_map(|g| {
            let last = g.last()?;
            let dock_free = i64::from(last.end) + thresholds.dock_end_offset;
            let elapsed_ms = now_ms - dock_free * 60_000;
            let idle_minutes = (elapsed_ms as f64 / 60_000.0).round() as i64;

            if idle_minutes <= thresholds.min_live_idle_minutes {
                return None;
            }

            Some(ActiveIdleZone {
                zone: g.zone.to_string(),
                last_container_id: last.task.id.clone(),
                last_end_time: last.end_label.to_string(),
                idle_start: dock_free.clamp(0, i64::from(u32::MAX)) as ClockMinutes,
                idle_minutes,
                severity: IdleSeverity::classify(idle_minutes, thresholds),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlator::group_completions;
    use crate::task::TaskStatus;

    fn done(id: &str, zone: &str, start: &str, end: &str) -> TaskRecord {
        TaskRecord::new(id, TaskStatus::Done)
            .with_zone(zone)
            .with_start(start)
            .with_end(end)
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn history(tasks: &[TaskRecord]) -> Vec<DowntimeRecord> {
        let th = DockThresholds::default();
        group_completions(tasks)
            .iter()
            .flat_map(|g| zone_downtime(g, &th))
            .collect()
    }

    #[test]
    fn twenty_minute_gap_is_fifteen_after_correction() {
        let tasks = vec![
            done("c1", "G4", "09:30", "10:00"),
            done("c2", "G4", "10:20", "10:50"),
        ];
        let recs = history(&tasks);
        assert_eq!(recs.len(), 1);
        let r = &recs[0];
        assert_eq!(r.idle_minutes, 15);
        assert_eq!(r.prior_container_id, "c1");
        assert_eq!(r.prior_end_time, "10:00");
        assert_eq!(r.next_container_id, "c2");
        assert_eq!(r.next_start_time, "10:20");
    }

    #[test]
    fn records_keep_the_labels_as_recorded() {
        let tasks = vec![
            done("c1", "G2", "8:00", "9:00"),
            done("c2", "G2", " 9:30 ", "10:00"),
        ];
        let recs = history(&tasks);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].prior_end_time, "9:00");
        assert_eq!(recs[0].next_start_time, "9:30");
        assert_eq!(recs[0].idle_minutes, 25);

        let idles = live_idle(&tasks, &group_completions(&tasks), at(11, 0), &DockThresholds::default());
        assert_eq!(idles[0].last_end_time, "10:00");

        let unpadded = vec![done("c1", "G2", "7:00", "8:05")];
        let idles = live_idle(&unpadded, &group_completions(&unpadded), at(9, 0), &DockThresholds::default());
        assert_eq!(idles[0].last_end_time, "8:05");
        assert_eq!(idles[0].idle_start_label(), "08:06");
    }

    #[test]
    fn five_minute_gap_is_process_noise() {
        let tasks = vec![
            done("c1", "G4", "09:30", "10:00"),
            done("c2", "G4", "10:05", "10:50"),
        ];
        assert!(history(&tasks).is_empty());
    }

    #[test]
    fn threshold_is_strict() {
        // raw 6 -> corrected 1, not > 1
        let tasks = vec![
            done("c1", "G4", "09:30", "10:00"),
            done("c2", "G4", "10:06", "10:50"),
        ];
        assert!(history(&tasks).is_empty());

        // raw 7 -> corrected 2
        let tasks = vec![
            done("c1", "G4", "09:30", "10:00"),
            done("c2", "G4", "10:07", "10:50"),
        ];
        assert_eq!(history(&tasks)[0].idle_minutes, 2);
    }

    #[test]
    fn negative_gap_is_dropped() {
        // c2 starts before c1 ends (overlapping / bad data)
        let tasks = vec![
            done("c1", "G4", "09:00", "10:00"),
            done("c2", "G4", "09:40", "10:30"),
        ];
        assert!(history(&tasks).is_empty());
    }

    #[test]
    fn malformed_next_start_skips_pair_only() {
        let tasks = vec![
            done("c1", "G4", "08:00", "09:00"),
            done("c2", "G4", "??", "10:00"),
            done("c3", "G4", "10:30", "11:00"),
        ];
        let recs = history(&tasks);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].prior_container_id, "c2");
        assert_eq!(recs[0].idle_minutes, 25);
    }

    #[test]
    fn every_record_is_above_minimum() {
        let mut tasks = Vec::new();
        for (i, start) in ["08:00", "08:31", "09:10", "09:16", "10:40", "10:45"].iter().enumerate() {
            let end_m = crate::time::parse_clock_minutes(start).unwrap() + 20;
            tasks.push(done(&format!("c{i}"), "G4", start, &format_clock(end_m)));
        }
        for r in history(&tasks) {
            assert!(r.idle_minutes > 1, "record below minimum: {r:?}");
        }
    }

    #[test]
    fn custom_offsets_change_correction() {
        let th = DockThresholds {
            dock_start_offset: 0,
            dock_end_offset: 0,
            ..DockThresholds::default()
        };
        let tasks = vec![
            done("c1", "G4", "09:30", "10:00"),
            done("c2", "G4", "10:05", "10:50"),
        ];
        let groups = group_completions(&tasks);
        let recs = zone_downtime(&groups[0], &th);
        assert_eq!(recs[0].idle_minutes, 5);
    }

    #[test]
    fn live_idle_fifty_nine_minutes_is_warning() {
        let tasks = vec![done("c1", "G4", "09:00", "10:00")];
        let groups = group_completions(&tasks);
        let idles = live_idle(&tasks, &groups, at(11, 0), &DockThresholds::default());

        assert_eq!(idles.len(), 1);
        let z = &idles[0];
        assert_eq!(z.zone, "G4");
        assert_eq!(z.last_container_id, "c1");
        assert_eq!(z.idle_start_label(), "10:01");
        assert_eq!(z.idle_minutes, 59);
        assert_eq!(z.severity, IdleSeverity::Warning);
    }

    #[test]
    fn live_idle_severity_bands() {
        let th = DockThresholds::default();
        assert_eq!(IdleSeverity::classify(30, &th), IdleSeverity::Normal);
        assert_eq!(IdleSeverity::classify(31, &th), IdleSeverity::Warning);
        assert_eq!(IdleSeverity::classify(60, &th), IdleSeverity::Warning);
        assert_eq!(IdleSeverity::classify(61, &th), IdleSeverity::Critical);
    }

    #[test]
    fn live_idle_rounds_seconds_to_nearest_minute() {
        let tasks = vec![done("c1", "G4", "09:00", "10:00")];
        let groups = group_completions(&tasks);
        let th = DockThresholds::default();

        // dock free 10:01; 10:07:29 -> 6.48 -> 6
        let idles = live_idle(&tasks, &groups, NaiveTime::from_hms_opt(10, 7, 29).unwrap(), &th);
        assert_eq!(idles[0].idle_minutes, 6);

        // 10:06:29 -> 5.48 -> 5, not reported
        let idles = live_idle(&tasks, &groups, NaiveTime::from_hms_opt(10, 6, 29).unwrap(), &th);
        assert!(idles.is_empty());
    }

    #[test]
    fn zone_with_waiting_or_unloading_task_is_not_idle() {
        let waiting = vec![
            done("c1", "G4", "09:00", "10:00"),
            TaskRecord::new("c2", TaskStatus::Wait).with_zone("G4"),
        ];
        let groups = group_completions(&waiting);
        assert!(live_idle(&waiting, &groups, at(12, 0), &DockThresholds::default()).is_empty());

        let unloading = vec![
            done("c1", "G4", "09:00", "10:00"),
            TaskRecord::new("c2", TaskStatus::Active).with_zone("G4").with_start("11:50"),
        ];
        let groups = group_completions(&unloading);
        assert!(live_idle(&unloading, &groups, at(12, 0), &DockThresholds::default()).is_empty());
    }

    #[test]
    fn busy_zone_does_not_shadow_other_zones() {
        let tasks = vec![
            done("c1", "G4", "09:00", "10:00"),
            done("d1", "G5", "09:00", "10:00"),
            TaskRecord::new("c2", TaskStatus::Wait).with_zone("G4"),
        ];
        let groups = group_completions(&tasks);
        let idles = live_idle(&tasks, &groups, at(10, 30), &DockThresholds::default());
        assert_eq!(idles.len(), 1);
        assert_eq!(idles[0].zone, "G5");
        assert_eq!(idles[0].severity, IdleSeverity::Normal);
    }

    #[test]
    fn live_idle_uses_latest_completion() {
        let tasks = vec![
            done("late", "G4", "10:30", "11:20"),
            done("early", "G4", "09:00", "10:00"),
        ];
        let groups = group_completions(&tasks);
        let idles = live_idle(&tasks, &groups, at(12, 31), &DockThresholds::default());
        assert_eq!(idles[0].last_container_id, "late");
        assert_eq!(idles[0].idle_minutes, 70);
        assert_eq!(idles[0].severity, IdleSeverity::Critical);
    }

    #[test]
    fn now_before_dock_free_is_not_idle() {
        let tasks = vec![done("c1", "G4", "09:00", "10:00")];
        let groups = group_completions(&tasks);
        assert!(live_idle(&tasks, &groups, at(9, 30), &DockThresholds::default()).is_empty());
    }
}
