//! Report generation and parsing.
//!
//! The generator renders the fixed Markdown report structure; the extractor
//! recovers typed metrics from any text that follows that structure.

pub mod extractor;
pub mod generator;

pub use extractor::{extract_metrics, title_from_report};
pub use generator::{render_report, ReportContext};
