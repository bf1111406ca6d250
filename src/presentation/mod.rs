pub mod display;

pub use display::{print_json, print_report, render_report, DisplayOptions, ScanSummary};
