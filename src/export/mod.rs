pub mod csv_export;

pub use csv_export::{export_cdps_csv, export_summary_csv, export_unified_csv, write_unified};
