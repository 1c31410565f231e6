//! Operator-supplied downtime reasons, keyed by zone and start time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::classifier::DowntimeRecord;
use crate::time::{clock_minutes, ClockMinutes};

/// A reason recorded against a downtime gap.
///
/// `start_time` is the start of the container that ended the gap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DowntimeAnnotation {
    pub zone: String,
    pub start_time: String,
    pub reason: String,
    #[serde(default)]
    pub author: Option<String>,
}

/// Identity of a downtime gap: zone plus the next container's start.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotationKey {
    pub zone: String,
    pub start: ClockMinutes,
}

impl AnnotationKey {
    pub fn new(zone: &str, start_time: &str) -> Option<Self> {
        let zone = zone.trim();
        if zone.is_empty() {
            return None;
        }
        Some(Self {
            zone: zone.to_string(),
            start: clock_minutes(Some(start_time))?,
        })
    }

    pub fn for_record(record: &DowntimeRecord) -> Option<Self> {
        Self::new(&record.zone, &record.next_start_time)
    }
}

/// Lookup table built from the endpoint's annotation list.
#[derive(Debug, Clone, Default)]
pub struct AnnotationIndex {
    by_key: HashMap<AnnotationKey, DowntimeAnnotation>,
}

impl AnnotationIndex {
    /// Later entries win on duplicate keys. Unkeyable entries are skipped.
    pub fn build(annotations: impl IntoIterator<Item = DowntimeAnnotation>) -> Self {
        let by_key = annotations
            .into_iter()
            .filter_map(|a| AnnotationKey::new(&a.zone, &a.start_time).map(|k| (k, a)))
            .collect();
        Self { by_key }
    }

    pub fn get(&self, record: &DowntimeRecord) -> Option<&DowntimeAnnotation> {
        AnnotationKey::for_record(record).and_then(|k| self.by_key.get(&k))
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
