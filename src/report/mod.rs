//! Report generation module.
//!
//! Renders space reports (template or LLM-written) and stores them as
//! Markdown files.

pub mod composer;
pub mod generator;
pub mod store;

pub use composer::{ReportComposer, ReportMode};
pub use generator::ReportInput;
pub use store::{ReportStore, StoreError, StoredReport};
