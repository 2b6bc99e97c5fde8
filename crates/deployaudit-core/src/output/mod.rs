//! Report rendering and file output

pub mod csv_format;
pub mod json_format;
pub mod writer;

pub use writer::{OutputFormat, ReportWriter};
