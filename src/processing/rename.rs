//! Placeholder renaming.

use crate::config::PlaceholderConfig;
use crate::types::{DataSet, Value};

/// A placeholder column that was renamed and neutralized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderColumn {
    /// Position in the output table.
    pub index: usize,
    /// Mapping key the column was projected under.
    pub key: String,
    /// Name it is exported under.
    pub display_name: String,
}

/// Rename placeholder columns to `<display_prefix><n>` (n counts from 1 per call) and force
/// every value in them to the empty string. Other columns are untouched.
pub fn rename_placeholders(
    table: &mut DataSet,
    config: &PlaceholderConfig,
) -> Vec<PlaceholderColumn> {
    let mut renamed = Vec::new();
    for (index, name) in table.schema.columns.iter_mut().enumerate() {
        if !config.is_placeholder(name) {
            continue;
        }
        let display_name = config.display_name(renamed.len() + 1);
        let key = std::mem::replace(name, display_name.clone());
        renamed.push(PlaceholderColumn {
            index,
            key,
            display_name,
        });
    }

    for row in &mut table.rows {
        for placeholder in &renamed {
            row[placeholder.index] = Value::text("");
        }
    }
    renamed
}
