//! Task records as served by the warehouse task endpoint.
//!
//! One record per container per day. Records are read-only here; all
//! persistence belongs to the endpoint.

use serde::{Deserialize, Serialize};

use crate::time::{clock_minutes, ClockMinutes};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    /// Container arrived, waiting for a dock.
    Wait,
    /// Unloading in progress.
    Active,
    /// Unloading finished.
    Done,
    #[serde(other)]
    Unknown,
}

/// A container unloading task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Container identifier.
    pub id: String,
    #[serde(default)]
    pub zone: Option<String>,
    pub status: TaskStatus,
    /// `HH:MM`, facility-local.
    #[serde(default)]
    pub start_time: Option<String>,
    /// `HH:MM`, facility-local.
    #[serde(default)]
    pub end_time: Option<String>,
}

impl TaskRecord {
    pub fn new(id: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            id: id.into(),
            zone: None,
            status,
            start_time: None,
            end_time: None,
        }
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    pub fn with_start(mut self, start: impl Into<String>) -> Self {
        self.start_time = Some(start.into());
        self
    }

    pub fn with_end(mut self, end: impl Into<String>) -> Self {
        self.end_time = Some(end.into());
        self
    }

    /// Trimmed zone label; blank counts as unassigned.
    pub fn zone_label(&self) -> Option<&str> {
        non_blank(self.zone.as_deref())
    }

    pub fn start_label(&self) -> Option<&str> {
        non_blank(self.start_time.as_deref())
    }

    pub fn end_label(&self) -> Option<&str> {
        non_blank(self.end_time.as_deref())
    }

    pub fn start_minutes(&self) -> Option<ClockMinutes> {
        clock_minutes(self.start_label())
    }

    pub fn end_minutes(&self) -> Option<ClockMinutes> {
        clock_minutes(self.end_label())
    }

    /// Occupying the dock right now: active with no usable end time.
    pub fn is_unloading(&self) -> bool {
        self.status == TaskStatus::Active && self.end_minutes().is_none()
    }

    pub fn is_waiting(&self) -> bool {
        self.status == TaskStatus::Wait
    }

    /// Minimal invariants for a record coming off the wire.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("id must be non-empty".to_string());
        }
        Ok(())
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Every task for the date is `DONE` (and there is at least one).
pub fn plan_completed(tasks: &[TaskRecord]) -> bool {
    !tasks.is_empty() && tasks.iter().all(|t| t.status == TaskStatus::Done)
}
