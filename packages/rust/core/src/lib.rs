//! Core pipeline logic for sheetsum: work-set computation, per-URL
//! orchestration, keyword categorization, and row merging.

pub mod categorize;
pub mod pipeline;

pub use categorize::categorize;
pub use pipeline::{PageFetcher, RunConfig, RunReport, SheetStore, Summarizer, run_pipeline};
