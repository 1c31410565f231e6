//! dockwatch-core: zone downtime analytics for container unloading docks.

pub mod annotations;
pub mod classifier;
pub mod correlator;
pub mod downtime;
pub mod error;
pub mod format;
pub mod stats;
pub mod task;
pub mod thresholds;
pub mod time;

pub use annotations::{AnnotationIndex, AnnotationKey, DowntimeAnnotation};
pub use classifier::{ActiveIdleZone, DowntimeRecord, IdleSeverity};
pub use correlator::{group_completions, Completion, ZoneCompletions};
pub use downtime::{compute_zone_downtime, compute_zone_downtime_with, DowntimeReport};
pub use error::TimeError;
pub use format::format_minutes;
pub use stats::{GrandTotals, ZoneStats};
pub use task::{plan_completed, TaskRecord, TaskStatus};
pub use thresholds::DockThresholds;
pub use time::{ClockMinutes, facility_now, facility_today, parse_clock_minutes};
