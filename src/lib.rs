//! `audit-report-mapper` turns a mystery-shopper audit export (one row per store visit) into a
//! normalized report table with a fixed, operator-configured column schema.
//!
//! The primary entrypoint is [`pipeline::Pipeline`], which runs:
//!
//! - **load**: CSV bytes (UTF-8, optional byte-order marker) → in-memory [`types::DataSet`]
//! - **filter**: drop aborted visits and visits after the most recent Friday
//! - **sort**: order by product category, then day-first visit timestamp
//! - **reconcile**: derive answer columns from survey questions that differ between variants
//! - **project**: build output columns from a [`config::SchemaMapping`]
//! - **rename**: give placeholder columns sequential display names and blank them
//! - **export**: UTF-8 CSV with a byte-order marker
//!
//! All tunables (mapping, reconciliation rules, column names) are data in
//! [`config::PipelineConfig`]; [`config::PipelineConfig::asda`] loads the shipped mapping.
//!
//! Absent source columns are normal variation between survey versions and resolve to unset
//! values. Bad cells never abort a run; they are reported as [`FieldParseWarning`]s.
//!
//! ## Quick example
//!
//! ```rust
//! use audit_report_mapper::config::{MappingTarget, PipelineConfig, SchemaMapping};
//! use audit_report_mapper::pipeline::Pipeline;
//! use chrono::NaiveDate;
//!
//! # fn main() -> Result<(), audit_report_mapper::MapperError> {
//! let config = PipelineConfig {
//!     mapping: SchemaMapping::new([
//!         ("site", MappingTarget::single("site_name")),
//!         ("blank1", MappingTarget::Absent),
//!     ]),
//!     ..PipelineConfig::default()
//! };
//! let input = "site_name,primary_result,date_of_visit\n\
//!              Leeds,Pass,02/05/2024\n\
//!              York,Abort,02/05/2024\n";
//!
//! // 2024-05-06 is a Monday, so the cutoff is Friday 2024-05-03.
//! let today = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
//! let output = Pipeline::new(config)?.run(input.as_bytes(), today)?;
//!
//! assert_eq!(output.table.schema.columns, vec!["site", "_blank_1"]);
//! assert_eq!(output.table.row_count(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: CSV loading
//! - [`processing`]: filter, sort, reconcile, project, rename
//! - [`config`]: pipeline configuration and validation
//! - [`pipeline`]: the end-to-end run plus observer hooks
//! - [`export`]: CSV rendering
//! - [`logging`]: `tracing-subscriber` setup for the binary

pub mod config;
pub mod error;
pub mod export;
pub mod ingestion;
pub mod logging;
pub mod pipeline;
pub mod processing;
pub mod types;

pub use error::{FieldParseWarning, MapperError, MapperResult, Severity};
