pub mod report;
pub mod writer;

pub use report::{BuildReport, ReportChunk, ReportEntry, aggregate, build_report};
pub use writer::{relative_slash_path, validate_output_path, write_files};
