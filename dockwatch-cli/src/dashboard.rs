//! Plain-text rendering of a downtime report.

use chrono::NaiveDate;
use dockwatch_core::{format_minutes, AnnotationIndex, DowntimeReport, IdleSeverity};
use std::fmt::Write;

pub struct Header {
    pub date: NaiveDate,
    pub live: bool,
    /// Facility-local time of the last successful fetch.
    pub updated: Option<String>,
}

fn severity_tag(s: IdleSeverity) -> &'static str {
    match s {
        IdleSeverity::Normal => "normal",
        IdleSeverity::Warning => "WARNING",
        IdleSeverity::Critical => "CRITICAL",
    }
}

pub fn render(report: &DowntimeReport, annotations: &AnnotationIndex, header: &Header) -> String {
    let mut s = String::new();

    let mode = if header.live { "live" } else { "history" };
    let _ = write!(s, "# Zone downtime {} ({mode})", header.date.format("%d.%m.%Y"));
    if let Some(t) = &header.updated {
        let _ = write!(s, ", updated {t}");
    }
    s.push_str("\n\n");

    let _ = writeln!(
        s,
        "Total idle: {} | avg per zone: {} | zones: {}",
        format_minutes(report.grand_total_minutes),
        format_minutes(report.grand_average_minutes),
        report.zone_stats.len()
    );

    if header.live {
        s.push_str("\n## Idle now\n\n");
        if report.active_idles.is_empty() {
            s.push_str("(no idle zones)\n");
        }
        for z in &report.active_idles {
            let _ = writeln!(
                s,
                "- [{}] {}: {} | last {} ended {}, dock free since {}",
                severity_tag(z.severity),
                z.zone,
                format_minutes(z.idle_minutes),
                z.last_container_id,
                z.last_end_time,
                z.idle_start_label()
            );
        }
    }

    s.push_str("\n## By zone\n\n");
    if report.zone_stats.is_empty() {
        s.push_str("(no downtime recorded)\n");
    }
    for z in &report.zone_stats {
        let _ = writeln!(
            s,
            "{}: total {} | {} gaps | avg {}",
            z.zone,
            format_minutes(z.total_idle_minutes),
            z.idle_count,
            format_minutes(z.average_idle_minutes)
        );
        for r in &z.records {
            let _ = write!(
                s,
                "  {} {} -> {} {}: {}",
                r.prior_end_time,
                r.prior_container_id,
                r.next_start_time,
                r.next_container_id,
                format_minutes(r.idle_minutes)
            );
            if let Some(a) = annotations.get(r) {
                let _ = write!(s, " | reason: {}", a.reason);
                if let Some(author) = &a.author {
                    let _ = write!(s, " ({author})");
                }
            }
            s.push('\n');
        }
    }

    s
}
