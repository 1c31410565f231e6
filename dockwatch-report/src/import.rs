//! Parse a CSV dump of the task sheet into task records.
//!
//! Sheet exports may carry title rows before the header, so rows are
//! skipped until a header with an `id` column shows up:
//! id,zone,status,start_time,end_time

use anyhow::{bail, Context, Result};
use dockwatch_core::{TaskRecord, TaskStatus};
use std::io::Read;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct Columns {
    id: usize,
    zone: Option<usize>,
    status: usize,
    start: Option<usize>,
    end: Option<usize>,
}

impl Columns {
    fn from_header(record: &csv::StringRecord) -> Option<Self> {
        let find = |name: &str| {
            record
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        Some(Self {
            id: find("id")?,
            zone: find("zone"),
            status: find("status")?,
            start: find("start_time"),
            end: find("end_time"),
        })
    }
}

fn parse_status(s: &str) -> TaskStatus {
    match s.trim().to_ascii_uppercase().as_str() {
        "WAIT" => TaskStatus::Wait,
        "ACTIVE" => TaskStatus::Active,
        "DONE" => TaskStatus::Done,
        _ => TaskStatus::Unknown,
    }
}

fn optional_field(record: &csv::StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn parse_task_csv_reader<R: Read>(rdr: R) -> Result<Vec<TaskRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(rdr);

    let mut columns: Option<Columns> = None;
    let mut tasks = Vec::new();

    for result in rdr.records() {
        let record = result?;

        let Some(cols) = columns else {
            columns = Columns::from_header(&record);
            continue;
        };

        let id = record.get(cols.id).unwrap_or("").trim();
        if id.is_empty() {
            continue;
        }

        let task = TaskRecord {
            id: id.to_string(),
            zone: optional_field(&record, cols.zone),
            status: parse_status(record.get(cols.status).unwrap_or("")),
            start_time: optional_field(&record, cols.start),
            end_time: optional_field(&record, cols.end),
        };
        tasks.push(task);
    }

    if columns.is_none() {
        bail!("no header row with id and status columns found");
    }

    debug!(count = tasks.len(), "parsed task csv");
    Ok(tasks)
}

/// Parse a task sheet CSV file.
pub fn parse_task_csv(path: impl AsRef<Path>) -> Result<Vec<TaskRecord>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_task_csv_reader(file).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_preamble_and_reads_rows() {
        let text = "\
Unloading plan,,,,
,,,,
ID,Zone,Status,Start_Time,End_Time
MSKU100,G4,DONE,09:00,09:40
MSKU101,G4,active,10:00,
MSKU102,,WAIT,,
";
        let tasks = parse_task_csv_reader(text.as_bytes()).unwrap();
        assert_eq!(tasks.len(), 3);

        assert_eq!(tasks[0].id, "MSKU100");
        assert_eq!(tasks[0].zone.as_deref(), Some("G4"));
        assert_eq!(tasks[0].status, TaskStatus::Done);
        assert_eq!(tasks[0].end_time.as_deref(), Some("09:40"));

        assert_eq!(tasks[1].status, TaskStatus::Active);
        assert_eq!(tasks[1].end_time, None);

        assert_eq!(tasks[2].zone, None);
        assert_eq!(tasks[2].status, TaskStatus::Wait);
    }

    #[test]
    fn column_order_follows_header() {
        let text = "status,end_time,id,zone,start_time\nDONE,11:00,c9,G2,10:15\n";
        let tasks = parse_task_csv_reader(text.as_bytes()).unwrap();
        assert_eq!(tasks[0].id, "c9");
        assert_eq!(tasks[0].start_time.as_deref(), Some("10:15"));
        assert_eq!(tasks[0].end_time.as_deref(), Some("11:00"));
    }

    #[test]
    fn rows_without_id_are_skipped() {
        let text = "id,zone,status,start_time,end_time\n,G4,DONE,09:00,09:30\nc1,G4,DONE,09:40,10:00\n";
        let tasks = parse_task_csv_reader(text.as_bytes()).unwrap();
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn missing_header_is_an_error() {
        let text = "a,b,c\n1,2,3\n";
        assert!(parse_task_csv_reader(text.as_bytes()).is_err());
    }
}
