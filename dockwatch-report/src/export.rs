//! CSV export of a downtime report.
//!
//! Layout, one block after another:
//!   Downtime history
//!   zone,prior container,end time,next container,start time,idle minutes
//!   <one row per downtime record>
//!   Active idle
//!   zone,last container,end time,idle minutes
//!   <one row per idle zone>

use anyhow::{Context, Result};
use dockwatch_core::DowntimeReport;
use std::io::Write;
use std::path::Path;

pub const HISTORY_SECTION: &str = "Downtime history";
pub const ACTIVE_SECTION: &str = "Active idle";

pub const HISTORY_HEADER: [&str; 6] = [
    "zone",
    "prior container",
    "end time",
    "next container",
    "start time",
    "idle minutes",
];

pub const ACTIVE_HEADER: [&str; 4] = ["zone", "last container", "end time", "idle minutes"];

/// Section title and header rows added around the data rows.
pub const FRAME_ROWS: usize = 4;

pub fn write_report_csv<W: Write>(report: &DowntimeReport, out: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(out);

    wtr.write_record([HISTORY_SECTION])?;
    wtr.write_record(HISTORY_HEADER)?;
    for zone in &report.zone_stats {
        for r in &zone.records {
            let idle = r.idle_minutes.to_string();
            wtr.write_record([
                r.zone.as_str(),
                r.prior_container_id.as_str(),
                r.prior_end_time.as_str(),
                r.next_container_id.as_str(),
                r.next_start_time.as_str(),
                idle.as_str(),
            ])?;
        }
    }

    wtr.write_record([ACTIVE_SECTION])?;
    wtr.write_record(ACTIVE_HEADER)?;
    for z in &report.active_idles {
        let idle = z.idle_minutes.to_string();
        wtr.write_record([
            z.zone.as_str(),
            z.last_container_id.as_str(),
            z.last_end_time.as_str(),
            idle.as_str(),
        ])?;
    }

    wtr.flush().context("flushing csv writer")?;
    Ok(())
}

pub fn report_to_csv_string(report: &DowntimeReport) -> Result<String> {
    let mut buf = Vec::new();
    write_report_csv(report, &mut buf)?;
    String::from_utf8(buf).context("csv output is not utf-8")
}

pub fn write_report_csv_file(report: &DowntimeReport, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_report_csv(report, file).with_context(|| format!("write {}", path.display()))
}
