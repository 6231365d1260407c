//! Derived columns reconciled from several interchangeable source columns.
//!
//! Survey variants ask the same question with different wording, so one logical answer can
//! live in any of several columns. A [`ReconciliationRule`] names the candidates, picks a value
//! per row with a [`RowReducer`], and writes it to a derived column that schema projection can
//! then use as an ordinary source.

use serde::{Deserialize, Serialize};

use crate::types::{DataSet, Value};

/// Per-row selection strategy over the values of the candidate columns that are present.
///
/// `values` is never empty and follows candidate list order.
pub trait RowReducer {
    fn reduce(&self, values: &[&Value]) -> Value;
}

impl<F> RowReducer for F
where
    F: Fn(&[&Value]) -> Value,
{
    fn reduce(&self, values: &[&Value]) -> Value {
        self(values)
    }
}

/// Built-in reducers available from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reducer {
    /// First candidate equal to `value`, otherwise the last candidate's value.
    FirstEqualElseLast { value: String },
    /// `then` if any candidate equals `value`, otherwise `otherwise`.
    AnyEquals {
        value: String,
        then: String,
        otherwise: String,
    },
    /// First candidate that is neither missing nor the empty string, otherwise unset.
    FirstNonEmpty,
}

impl RowReducer for Reducer {
    fn reduce(&self, values: &[&Value]) -> Value {
        match self {
            Reducer::FirstEqualElseLast { value } => values
                .iter()
                .find(|v| v.eq_text(value))
                .or_else(|| values.last())
                .map_or(Value::Null, |v| (*v).clone()),
            Reducer::AnyEquals {
                value,
                then,
                otherwise,
            } => {
                if values.iter().any(|v| v.eq_text(value)) {
                    Value::text(then)
                } else {
                    Value::text(otherwise)
                }
            }
            Reducer::FirstNonEmpty => first_non_empty(values),
        }
    }
}

pub(crate) fn first_non_empty(values: &[&Value]) -> Value {
    values
        .iter()
        .find(|v| !v.is_blank())
        .map_or(Value::Null, |v| (*v).clone())
}

/// Restricts a rule to rows whose `column` equals `equals`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowScope {
    pub column: String,
    pub equals: String,
}

/// One derived column and how to compute it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRule {
    /// Name of the derived column added to the working table.
    pub target: String,
    /// Source columns, in priority order. Absent ones are ignored.
    pub candidates: Vec<String>,
    pub reducer: Reducer,
    /// When set, only matching rows get a value; all other rows stay unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<RowScope>,
    /// Columns blanked (set to the empty string) on in-scope rows once the value is derived.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clear_in_scope: Vec<String>,
}

/// What a rule found in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileOutcome {
    /// Candidate columns present in the table.
    pub candidates_present: usize,
    /// Rows the rule applied to.
    pub rows_in_scope: usize,
}

/// Apply `rule` with its configured reducer.
pub fn reconcile(dataset: &mut DataSet, rule: &ReconciliationRule) -> ReconcileOutcome {
    reconcile_with(dataset, rule, &rule.reducer)
}

/// Apply `rule`, selecting values with `reducer` instead of the configured one.
///
/// - No candidate present: the target column is unset on every row.
/// - Otherwise in-scope rows get `reducer(present candidate values)`; out-of-scope rows are unset.
/// - A scope whose column is absent matches no rows.
pub fn reconcile_with(
    dataset: &mut DataSet,
    rule: &ReconciliationRule,
    reducer: &dyn RowReducer,
) -> ReconcileOutcome {
    let present: Vec<usize> = rule
        .candidates
        .iter()
        .filter_map(|c| dataset.schema.index_of(c))
        .collect();
    let in_scope = scope_mask(dataset, rule.scope.as_ref());

    let values: Vec<Value> = if present.is_empty() {
        vec![Value::Null; dataset.row_count()]
    } else {
        dataset
            .rows
            .iter()
            .zip(&in_scope)
            .map(|(row, &selected)| {
                if selected {
                    let picked: Vec<&Value> = present.iter().map(|&i| &row[i]).collect();
                    reducer.reduce(&picked)
                } else {
                    Value::Null
                }
            })
            .collect()
    };
    dataset.upsert_column(&rule.target, values);

    for column in &rule.clear_in_scope {
        if let Some(idx) = dataset.schema.index_of(column) {
            for (row, _) in dataset.rows.iter_mut().zip(&in_scope).filter(|(_, s)| **s) {
                row[idx] = Value::text("");
            }
        }
    }

    ReconcileOutcome {
        candidates_present: present.len(),
        rows_in_scope: in_scope.iter().filter(|s| **s).count(),
    }
}

fn scope_mask(dataset: &DataSet, scope: Option<&RowScope>) -> Vec<bool> {
    match scope {
        None => vec![true; dataset.row_count()],
        Some(scope) => match dataset.schema.index_of(&scope.column) {
            Some(idx) => dataset
                .column_values(idx)
                .map(|v| v.eq_text(&scope.equals))
                .collect(),
            None => vec![false; dataset.row_count()],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Schema;

    const ALLOW: &str = "allow";
    const HANDOVER: &str = "handover";
    const FIREWORKS: &str = "Fireworks - No ID";

    fn handover_rule() -> ReconciliationRule {
        ReconciliationRule {
            target: "merged_no_id_allow_handover".to_string(),
            candidates: vec![ALLOW.to_string(), HANDOVER.to_string()],
            reducer: Reducer::FirstEqualElseLast {
                value: "No".to_string(),
            },
            scope: Some(RowScope {
                column: "item_to_order".to_string(),
                equals: FIREWORKS.to_string(),
            }),
            clear_in_scope: vec![ALLOW.to_string()],
        }
    }

    fn id_rule(candidates: &[&str]) -> ReconciliationRule {
        ReconciliationRule {
            target: "merged_id_asked".to_string(),
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
            reducer: Reducer::AnyEquals {
                value: "Yes".to_string(),
                then: "Yes".to_string(),
                otherwise: "No".to_string(),
            },
            scope: None,
            clear_in_scope: Vec::new(),
        }
    }

    fn text(s: &str) -> Value {
        Value::text(s)
    }

    fn column<'a>(ds: &'a DataSet, name: &str) -> Vec<&'a Value> {
        ds.column_values(ds.schema.index_of(name).unwrap()).collect()
    }

    #[test]
    fn handover_prefers_allow_when_it_says_no() {
        let mut ds = DataSet::new(
            Schema::new(["item_to_order", ALLOW, HANDOVER]),
            vec![
                vec![text(FIREWORKS), text("No"), text("Yes")],
                vec![text(FIREWORKS), text("Yes"), text("No")],
                vec![text("Alcohol"), text("No"), text("Yes")],
            ],
        );
        let outcome = reconcile(&mut ds, &handover_rule());
        assert_eq!(outcome.candidates_present, 2);
        assert_eq!(outcome.rows_in_scope, 2);

        assert_eq!(
            column(&ds, "merged_no_id_allow_handover"),
            vec![&text("No"), &text("No"), &Value::Null]
        );
        // Allow answer is subsumed for fireworks rows only.
        assert_eq!(column(&ds, ALLOW), vec![&text(""), &text(""), &text("No")]);
    }

    #[test]
    fn handover_with_only_one_source_copies_it() {
        let mut ds = DataSet::new(
            Schema::new(["item_to_order", HANDOVER]),
            vec![vec![text(FIREWORKS), text("Yes")]],
        );
        reconcile(&mut ds, &handover_rule());
        assert_eq!(column(&ds, "merged_no_id_allow_handover"), vec![&text("Yes")]);
    }

    #[test]
    fn handover_without_sources_stays_unset() {
        let mut ds = DataSet::new(
            Schema::new(["item_to_order"]),
            vec![vec![text(FIREWORKS)]],
        );
        let outcome = reconcile(&mut ds, &handover_rule());
        assert_eq!(outcome.candidates_present, 0);
        assert_eq!(column(&ds, "merged_no_id_allow_handover"), vec![&Value::Null]);
    }

    #[test]
    fn scope_column_missing_matches_nothing() {
        let mut ds = DataSet::new(Schema::new([ALLOW]), vec![vec![text("No")]]);
        reconcile(&mut ds, &handover_rule());
        assert_eq!(column(&ds, "merged_no_id_allow_handover"), vec![&Value::Null]);
        assert_eq!(column(&ds, ALLOW), vec![&text("No")]);
    }

    #[test]
    fn id_asked_is_inclusive_or() {
        let mut ds = DataSet::new(
            Schema::new(["checkout", "cabinet"]),
            vec![
                vec![text("No"), text("No")],
                vec![text("No"), text("Yes")],
                vec![Value::Null, Value::Null],
            ],
        );
        reconcile(&mut ds, &id_rule(&["checkout", "cabinet"]));
        assert_eq!(
            column(&ds, "merged_id_asked"),
            vec![&text("No"), &text("Yes"), &text("No")]
        );
    }

    #[test]
    fn id_asked_without_candidates_is_unset_not_no() {
        let mut ds = DataSet::new(Schema::new(["other"]), vec![vec![text("Yes")]; 2]);
        reconcile(&mut ds, &id_rule(&["checkout", "cabinet"]));
        assert_eq!(column(&ds, "merged_id_asked"), vec![&Value::Null, &Value::Null]);
    }

    #[test]
    fn custom_reducer_can_be_injected() {
        let mut ds = DataSet::new(
            Schema::new(["a", "b"]),
            vec![vec![text("x"), text("y")]],
        );
        let joined = |values: &[&Value]| {
            Value::text(
                values
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("+"),
            )
        };
        let rule = ReconciliationRule {
            reducer: Reducer::FirstNonEmpty,
            ..id_rule(&["a", "b"])
        };
        reconcile_with(&mut ds, &rule, &joined);
        assert_eq!(column(&ds, "merged_id_asked"), vec![&text("x+y")]);
    }

    #[test]
    fn reducers_deserialize_from_tagged_json() {
        let reducer: Reducer =
            serde_json::from_str(r#"{"kind":"first_equal_else_last","value":"No"}"#).unwrap();
        assert_eq!(
            reducer,
            Reducer::FirstEqualElseLast {
                value: "No".to_string()
            }
        );
        let reducer: Reducer = serde_json::from_str(r#"{"kind":"first_non_empty"}"#).unwrap();
        assert_eq!(reducer, Reducer::FirstNonEmpty);
    }
}
