//! Per-zone and global downtime statistics.

use serde::{Deserialize, Serialize};

use crate::classifier::{ActiveIdleZone, DowntimeRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneStats {
    pub zone: String,
    pub total_idle_minutes: i64,
    pub average_idle_minutes: i64,
    pub idle_count: usize,
    /// Chronological.
    pub records: Vec<DowntimeRecord>,
}

impl ZoneStats {
    /// Roll up one zone's records. Returns `None` when there are none.
    pub fn from_records(zone: impl Into<String>, records: Vec<DowntimeRecord>) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        let total: i64 = records.iter().map(|r| r.idle_minutes).sum();
        let count = records.len();
        Some(Self {
            zone: zone.into(),
            total_idle_minutes: total,
            average_idle_minutes: rounded_mean(total, count),
            idle_count: count,
            records,
        })
    }
}

/// Grand totals across zones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrandTotals {
    pub total_idle_minutes: i64,
    /// Mean of per-zone totals; 0 when no zone has downtime.
    pub average_idle_minutes: i64,
    pub zone_count: usize,
}

pub fn grand_totals(zones: &[ZoneStats]) -> GrandTotals {
    let total: i64 = zones.iter().map(|z| z.total_idle_minutes).sum();
    GrandTotals {
        total_idle_minutes: total,
        average_idle_minutes: rounded_mean(total, zones.len()),
        zone_count: zones.len(),
    }
}

/// Worst zones first. Ties keep encounter order.
pub fn rank_zones(zones: &mut [ZoneStats]) {
    zones.sort_by(|a, b| b.total_idle_minutes.cmp(&a.total_idle_minutes));
}

/// Longest current idle first. Ties keep encounter order.
pub fn rank_active_idles(idles: &mut [ActiveIdleZone]) {
    idles.sort_by(|a, b| b.idle_minutes.cmp(&a.idle_minutes));
}

fn rounded_mean(total: i64, count: usize) -> i64 {
    if count == 0 {
        return 0;
    }
    (total as f64 / count as f64).round() as i64
}
