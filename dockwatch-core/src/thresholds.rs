//! Dock process offsets and idle thresholds.
//!
//! Operators log events a little off from the physical state change, so
//! logged times are corrected before computing dock occupancy.

use serde::{Deserialize, Serialize};

/// Inspection, photo and seal steps logged as part of the next start:
/// the dock is occupied this many minutes before the logged start.
pub const DOCK_START_OFFSET: i64 = 4;

/// Driver-notify step logged as part of the prior end: the dock is
/// vacated this many minutes after the logged end.
pub const DOCK_END_OFFSET: i64 = 1;

/// Corrected gaps at or below this are process noise.
pub const MIN_DOWNTIME_MINUTES: i64 = 1;

/// Live idle shorter than or equal to this is not reported.
pub const MIN_LIVE_IDLE_MINUTES: i64 = 5;

pub const WARNING_IDLE_MINUTES: i64 = 30;
pub const CRITICAL_IDLE_MINUTES: i64 = 60;

/// Per-facility tuning of the downtime computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockThresholds {
    pub dock_start_offset: i64,
    pub dock_end_offset: i64,
    pub min_downtime_minutes: i64,
    pub min_live_idle_minutes: i64,
    pub warning_minutes: i64,
    pub critical_minutes: i64,
}

impl Default for DockThresholds {
    fn default() -> Self {
        Self {
            dock_start_offset: DOCK_START_OFFSET,
            dock_end_offset: DOCK_END_OFFSET,
            min_downtime_minutes: MIN_DOWNTIME_MINUTES,
            min_live_idle_minutes: MIN_LIVE_IDLE_MINUTES,
            warning_minutes: WARNING_IDLE_MINUTES,
            critical_minutes: CRITICAL_IDLE_MINUTES,
        }
    }
}

impl DockThresholds {
    /// Total correction applied to a gap between two logged events.
    pub fn dock_interval_offset(&self) -> i64 {
        self.dock_start_offset + self.dock_end_offset
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.dock_start_offset < 0 || self.dock_end_offset < 0 {
            return Err("dock offsets must be non-negative".to_string());
        }
        if self.min_downtime_minutes < 0 || self.min_live_idle_minutes < 0 {
            return Err("minimum idle thresholds must be non-negative".to_string());
        }
        if self.warning_minutes >= self.critical_minutes {
            return Err(format!(
                "warning_minutes ({}) must be below critical_minutes ({})",
                self.warning_minutes, self.critical_minutes
            ));
        }
        Ok(())
    }
}
