//! In-memory record transformations.
//!
//! Each stage operates on a [`crate::types::DataSet`] and tolerates absent columns:
//!
//! - [`filter`]: drop aborted visits and visits after the reporting cutoff
//! - [`sort`]: order by (category, day-first visit timestamp)
//! - [`reconcile`]: derive columns from interchangeable survey questions
//! - [`project`]: build the output table from a [`crate::config::SchemaMapping`]
//! - [`rename`]: rename and blank placeholder output columns
//!
//! ## Example: reconcile → project
//!
//! ```rust
//! use audit_report_mapper::config::{MappingTarget, SchemaMapping};
//! use audit_report_mapper::processing::{project, reconcile, ReconciliationRule, Reducer};
//! use audit_report_mapper::types::{DataSet, Schema, Value};
//!
//! let mut ds = DataSet::new(
//!     Schema::new(["checkout", "cabinet"]),
//!     vec![
//!         vec![Value::text("No"), Value::text("Yes")],
//!         vec![Value::text("No"), Value::Null],
//!     ],
//! );
//! let rule = ReconciliationRule {
//!     target: "id_asked".to_string(),
//!     candidates: vec!["checkout".to_string(), "cabinet".to_string()],
//!     reducer: Reducer::AnyEquals {
//!         value: "Yes".to_string(),
//!         then: "Yes".to_string(),
//!         otherwise: "No".to_string(),
//!     },
//!     scope: None,
//!     clear_in_scope: Vec::new(),
//! };
//! reconcile(&mut ds, &rule);
//!
//! let mapping = SchemaMapping::new([("Was ID asked?", MappingTarget::single("id_asked"))]);
//! let out = project(&ds, &mapping);
//! assert_eq!(out.rows, vec![vec![Value::text("Yes")], vec![Value::text("No")]]);
//! ```

pub mod datetime;
pub mod filter;
pub mod project;
pub mod reconcile;
pub mod rename;
pub mod sort;

pub use datetime::{most_recent_friday, parse_day_first_date, parse_day_first_datetime};
pub use filter::{abort_mask, cutoff_mask, drop_aborted, drop_after_cutoff, CutoffMask};
pub use project::project;
pub use reconcile::{
    reconcile, reconcile_with, ReconcileOutcome, ReconciliationRule, Reducer, RowReducer, RowScope,
};
pub use rename::{rename_placeholders, PlaceholderColumn};
pub use sort::{sort_visits, visit_order, SortOrder};
