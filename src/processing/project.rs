//! Schema projection: build the output table from the working table and a [`SchemaMapping`].

use crate::config::{MappingTarget, SchemaMapping};
use crate::types::{DataSet, Schema, Value};

use super::reconcile::first_non_empty;

/// Build the output table. Output columns follow mapping order exactly.
///
/// - [`MappingTarget::Absent`]: unset on every row.
/// - [`MappingTarget::Single`]: copied verbatim when present, otherwise unset.
/// - [`MappingTarget::Candidates`]: restricted to present columns; none present gives unset,
///   one present is copied verbatim, several pick the first non-empty value per row.
///
/// Missing source columns never fail; they degrade to unset values.
pub fn project(dataset: &DataSet, mapping: &SchemaMapping) -> DataSet {
    let sources: Vec<Vec<usize>> = mapping
        .iter()
        .map(|(_, target)| present_sources(dataset, target))
        .collect();

    let rows = dataset
        .rows
        .iter()
        .map(|row| {
            sources
                .iter()
                .map(|present| match present.as_slice() {
                    [] => Value::Null,
                    [only] => row[*only].clone(),
                    many => {
                        let values: Vec<&Value> = many.iter().map(|&i| &row[i]).collect();
                        first_non_empty(&values)
                    }
                })
                .collect()
        })
        .collect();

    DataSet::new(Schema::new(mapping.output_columns()), rows)
}

fn present_sources(dataset: &DataSet, target: &MappingTarget) -> Vec<usize> {
    target
        .sources()
        .iter()
        .filter_map(|c| dataset.schema.index_of(c))
        .collect()
}
