//! dockwatch-report: CSV export of downtime reports and CSV import of task sheets

pub mod export;
pub mod import;

pub use export::{report_to_csv_string, write_report_csv, write_report_csv_file};
pub use import::{parse_task_csv, parse_task_csv_reader};
