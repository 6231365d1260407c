//! Pipeline configuration.
//!
//! Everything an operator may tune lives here as data: filter and sort columns, the
//! reconciliation rules, the output schema mapping and the placeholder naming convention.
//! Configurations are JSON documents; [`PipelineConfig::asda`] loads the one shipped with the
//! crate.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{MapperError, MapperResult};
use crate::processing::reconcile::ReconciliationRule;

const ASDA_CONFIG: &str = include_str!("../config/asda_mapping.json");

/// Default export file name.
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "Asda Report Data.csv";

/// Where an output column takes its values from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingTarget {
    /// No source; the column is present but unset.
    Absent,
    /// Copy one source column verbatim.
    Single(String),
    /// Interchangeable source columns in priority order; the first non-empty value wins.
    Candidates(Vec<String>),
}

impl MappingTarget {
    /// Build a single-source target.
    pub fn single(column: impl Into<String>) -> Self {
        Self::Single(column.into())
    }

    /// Build a candidate-list target.
    pub fn candidates<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Candidates(columns.into_iter().map(Into::into).collect())
    }

    /// Source column names referenced by this target.
    pub fn sources(&self) -> &[String] {
        match self {
            MappingTarget::Absent => &[],
            MappingTarget::Single(c) => std::slice::from_ref(c),
            MappingTarget::Candidates(cs) => cs,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTarget {
    Single(String),
    Candidates(Vec<String>),
}

impl From<Option<RawTarget>> for MappingTarget {
    fn from(raw: Option<RawTarget>) -> Self {
        match raw {
            None => MappingTarget::Absent,
            Some(RawTarget::Single(c)) => MappingTarget::Single(c),
            Some(RawTarget::Candidates(cs)) if cs.is_empty() => MappingTarget::Absent,
            Some(RawTarget::Candidates(cs)) => MappingTarget::Candidates(cs),
        }
    }
}

/// Ordered output column name → [`MappingTarget`] table.
///
/// Serialized as a JSON object whose key order is the output column order. Duplicate keys are
/// kept on decode so [`PipelineConfig::validate`] can reject them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaMapping {
    entries: Vec<(String, MappingTarget)>,
}

impl SchemaMapping {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, MappingTarget)>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, t)| (k.into(), t)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(output column, target)` pairs in output order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MappingTarget)> {
        self.entries.iter().map(|(k, t)| (k.as_str(), t))
    }

    /// Output column names in order.
    pub fn output_columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<'de> Deserialize<'de> for SchemaMapping {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MappingVisitor;

        impl<'de> Visitor<'de> for MappingVisitor {
            type Value = SchemaMapping;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of output column -> null | source column | [source columns]")
            }

            fn visit_map<A>(self, mut map: A) -> Result<SchemaMapping, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, raw)) = map.next_entry::<String, Option<RawTarget>>()? {
                    entries.push((key, MappingTarget::from(raw)));
                }
                Ok(SchemaMapping { entries })
            }
        }

        deserializer.deserialize_map(MappingVisitor)
    }
}

impl Serialize for SchemaMapping {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, target) in &self.entries {
            match target {
                MappingTarget::Absent => map.serialize_entry(key, &Option::<String>::None)?,
                MappingTarget::Single(c) => map.serialize_entry(key, c)?,
                MappingTarget::Candidates(cs) => map.serialize_entry(key, cs)?,
            }
        }
        map.end()
    }
}

/// Row filter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Column holding the visit outcome.
    pub result_column: String,
    /// Outcome marking an aborted visit (compared case-insensitively).
    pub abort_value: String,
    /// Day-first visit date used for the reporting cutoff.
    pub visit_date_column: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            result_column: "primary_result".to_string(),
            abort_value: "abort".to_string(),
            visit_date_column: "date_of_visit".to_string(),
        }
    }
}

/// Row sort settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortConfig {
    pub category_column: String,
    pub date_column: String,
    pub time_column: String,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            category_column: "item_to_order".to_string(),
            date_column: "date_of_visit".to_string(),
            time_column: "time_of_visit".to_string(),
        }
    }
}

/// Placeholder column naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderConfig {
    /// Mapping keys starting with this prefix are placeholders.
    pub key_prefix: String,
    /// Display names are this prefix followed by a 1-based counter.
    pub display_prefix: String,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            key_prefix: "blank".to_string(),
            display_prefix: "_blank_".to_string(),
        }
    }
}

impl PlaceholderConfig {
    pub fn is_placeholder(&self, key: &str) -> bool {
        key.starts_with(&self.key_prefix)
    }

    pub fn display_name(&self, ordinal: usize) -> String {
        format!("{}{}", self.display_prefix, ordinal)
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub filter: FilterConfig,
    pub sort: SortConfig,
    /// Applied in order; later rules may use earlier targets as candidates.
    pub reconciliation: Vec<ReconciliationRule>,
    pub mapping: SchemaMapping,
    pub placeholder: PlaceholderConfig,
    /// File name the export is delivered under.
    pub output_file_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            sort: SortConfig::default(),
            reconciliation: Vec::new(),
            mapping: SchemaMapping::default(),
            placeholder: PlaceholderConfig::default(),
            output_file_name: DEFAULT_OUTPUT_FILE_NAME.to_string(),
        }
    }
}

impl PipelineConfig {
    /// The shipped Asda audit mapping.
    pub fn asda() -> MapperResult<Self> {
        Self::from_json_str(ASDA_CONFIG)
    }

    /// Decode and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> MapperResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| MapperError::configuration(format!("cannot decode configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, decode and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> MapperResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check structural invariants before any row is processed.
    pub fn validate(&self) -> MapperResult<()> {
        for (what, name) in [
            ("filter.result_column", &self.filter.result_column),
            ("filter.visit_date_column", &self.filter.visit_date_column),
            ("sort.category_column", &self.sort.category_column),
            ("sort.date_column", &self.sort.date_column),
            ("sort.time_column", &self.sort.time_column),
            ("placeholder.key_prefix", &self.placeholder.key_prefix),
            ("placeholder.display_prefix", &self.placeholder.display_prefix),
            ("output_file_name", &self.output_file_name),
        ] {
            if name.is_empty() {
                return Err(MapperError::configuration(format!("{what} must not be empty")));
            }
        }

        let mut targets = HashSet::new();
        for rule in &self.reconciliation {
            if rule.target.is_empty() {
                return Err(MapperError::configuration("reconciliation target must not be empty"));
            }
            if !targets.insert(rule.target.as_str()) {
                return Err(MapperError::configuration(format!(
                    "duplicate reconciliation target '{}'",
                    rule.target
                )));
            }
            if rule.candidates.iter().any(String::is_empty) {
                return Err(MapperError::configuration(format!(
                    "reconciliation '{}' has an empty candidate column name",
                    rule.target
                )));
            }
        }

        let mut keys = HashSet::new();
        for (key, target) in self.mapping.iter() {
            if key.is_empty() {
                return Err(MapperError::configuration("output column name must not be empty"));
            }
            if !keys.insert(key) {
                return Err(MapperError::configuration(format!(
                    "duplicate output column '{key}'"
                )));
            }
            if target.sources().iter().any(String::is_empty) {
                return Err(MapperError::configuration(format!(
                    "output column '{key}' has an empty source column name"
                )));
            }
        }

        let mut display = HashSet::new();
        let mut ordinal = 0;
        for key in self.mapping.output_columns() {
            let name = if self.placeholder.is_placeholder(key) {
                ordinal += 1;
                self.placeholder.display_name(ordinal)
            } else {
                key.to_owned()
            };
            if !display.insert(name.clone()) {
                return Err(MapperError::configuration(format!(
                    "output column '{name}' appears twice after placeholder renaming"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_mapping(mapping: &str) -> MapperResult<PipelineConfig> {
        PipelineConfig::from_json_str(&format!(r#"{{"mapping": {mapping}}}"#))
    }

    #[test]
    fn mapping_decodes_into_tagged_targets_in_order() {
        let config =
            config_with_mapping(r#"{"b": "src_b", "a": null, "c": ["x", "y"], "d": []}"#).unwrap();
        let entries: Vec<_> = config.mapping.iter().collect();
        assert_eq!(
            entries,
            vec![
                ("b", &MappingTarget::single("src_b")),
                ("a", &MappingTarget::Absent),
                ("c", &MappingTarget::candidates(["x", "y"])),
                ("d", &MappingTarget::Absent),
            ]
        );
    }

    #[test]
    fn duplicate_output_columns_are_rejected() {
        let err = config_with_mapping(r#"{"a": "x", "a": "y"}"#).unwrap_err();
        assert!(err.to_string().contains("duplicate output column 'a'"), "{err}");
    }

    #[test]
    fn non_string_sources_are_rejected() {
        let err = config_with_mapping(r#"{"a": 5}"#).unwrap_err();
        assert!(matches!(err, MapperError::Configuration { .. }), "{err:?}");
        let err = config_with_mapping(r#"{"a": ["x", 1]}"#).unwrap_err();
        assert!(matches!(err, MapperError::Configuration { .. }), "{err:?}");
    }

    #[test]
    fn placeholder_rename_collisions_are_rejected() {
        let err = config_with_mapping(r#"{"blank1": null, "_blank_1": "x"}"#).unwrap_err();
        assert!(err.to_string().contains("'_blank_1' appears twice"), "{err}");
    }

    #[test]
    fn duplicate_reconciliation_targets_are_rejected() {
        let json = r#"{
            "reconciliation": [
                {"target": "m", "candidates": ["a"], "reducer": {"kind": "first_non_empty"}},
                {"target": "m", "candidates": ["b"], "reducer": {"kind": "first_non_empty"}}
            ]
        }"#;
        let err = PipelineConfig::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("duplicate reconciliation target 'm'"), "{err}");
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let config = PipelineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.filter.result_column, "primary_result");
        assert_eq!(config.output_file_name, DEFAULT_OUTPUT_FILE_NAME);
    }

    #[test]
    fn mapping_serializes_back_in_order() {
        let mapping = SchemaMapping::new([
            ("z", MappingTarget::Absent),
            ("a", MappingTarget::candidates(["p", "q"])),
        ]);
        let json = serde_json::to_string(&mapping).unwrap();
        assert_eq!(json, r#"{"z":null,"a":["p","q"]}"#);
        let back: SchemaMapping = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mapping);
    }

    #[test]
    fn shipped_asda_config_is_valid() {
        let config = PipelineConfig::asda().unwrap();
        assert_eq!(config.reconciliation.len(), 2);
        assert_eq!(config.mapping.output_columns().next(), Some("order_internal_id"));
        let placeholders = config
            .mapping
            .output_columns()
            .filter(|k| config.placeholder.is_placeholder(k))
            .count();
        assert_eq!(placeholders, 5);
    }
}
