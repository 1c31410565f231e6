//! Event correlation: completed tasks grouped per zone, ordered by end time.

use std::collections::HashMap;

use crate::task::TaskRecord;
use crate::time::{clock_minutes, ClockMinutes};

/// A completed task with its parsed end time.
#[derive(Debug, Clone, Copy)]
pub struct Completion<'a> {
    pub task: &'a TaskRecord,
    pub end: ClockMinutes,
    /// The end time as recorded, trimmed.
    pub end_label: &'a str,
}

/// Completions at one zone in ascending end-time order.
#[derive(Debug, Clone)]
pub struct ZoneCompletions<'a> {
    pub zone: &'a str,
    pub completions: Vec<Completion<'a>>,
}

impl<'a> ZoneCompletions<'a> {
    pub fn last(&self) -> Option<&Completion<'a>> {
        self.completions.last()
    }

    /// Chronologically adjacent completions `(prior, next)`.
    pub fn pairs(&self) -> impl Iterator<Item = (&Completion<'a>, &Completion<'a>)> + '_ {
        self.completions.windows(2).map(|w| (&w[0], &w[1]))
    }
}

/// Group tasks that have a zone and a parseable end time.
///
/// Zones come back in first-encounter order. Sorting is stable, so equal end
/// times keep their input order.
pub fn group_completions(tasks: &[TaskRecord]) -> Vec<ZoneCompletions<'_>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<ZoneCompletions<'_>> = Vec::new();

    for task in tasks {
        let (Some(zone), Some(end_label)) = (task.zone_label(), task.end_label()) else {
            continue;
        };
        let Some(end) = clock_minutes(Some(end_label)) else {
            continue;
        };

        let idx = *index.entry(zone).or_insert_with(|| {
            groups.push(ZoneCompletions {
                zone,
                completions: Vec::new(),
            });
            groups.len() - 1
        });
        groups[idx].completions.push(Completion { task, end, end_label });
    }

    for g in groups.iter_mut() {
        g.completions.sort_by_key(|c| c.end);
    }

    groups
}
