use thiserror::Error;

/// Convenience result type for pipeline operations.
pub type MapperResult<T> = Result<T, MapperError>;

/// Error type returned by the loader, the configuration layer and the pipeline.
///
/// Missing source columns are never errors: they are normal variation between survey versions
/// and resolve to unset values. Individual unparseable cells are reported as
/// [`FieldParseWarning`]s instead.
#[derive(Debug, Error)]
pub enum MapperError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV transport error raised by the `csv` reader/writer.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The input cannot be tokenized as delimited text at all.
    #[error("failed to parse input: {message}")]
    Parse { message: String },

    /// The schema mapping or reconciliation rules are structurally invalid.
    #[error("invalid configuration: {message}")]
    Configuration { message: String },
}

impl MapperError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Severity used when reporting this error to observers.
    pub fn severity(&self) -> Severity {
        match self {
            MapperError::Io(_) => Severity::Critical,
            MapperError::Csv(err) => match err.kind() {
                csv::ErrorKind::Io(_) => Severity::Critical,
                _ => Severity::Error,
            },
            MapperError::Parse { .. } | MapperError::Configuration { .. } => Severity::Error,
        }
    }
}

/// Severity classification used for observer callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Non-fatal; the row was kept and a sentinel substituted.
    Warning,
    /// The run failed.
    Error,
    /// The run failed because of an infrastructure (I/O) problem.
    Critical,
}

/// A single cell that could not be interpreted. Non-fatal: the row is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldParseWarning {
    /// 1-based data row number in the loaded input (the header is row 0).
    pub row: usize,
    /// Column the value came from.
    pub column: String,
    /// Raw cell text.
    pub raw: String,
    /// What went wrong.
    pub reason: String,
}

impl std::fmt::Display for FieldParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "row {} column '{}': {} (raw='{}')",
            self.row, self.column, self.reason, self.raw
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_are_critical() {
        let err = MapperError::from(std::io::Error::other("disk gone"));
        assert_eq!(err.severity(), Severity::Critical);
    }

    #[test]
    fn configuration_errors_display_message() {
        let err = MapperError::configuration("duplicate output column 'site_name'");
        assert_eq!(err.severity(), Severity::Error);
        assert_eq!(
            err.to_string(),
            "invalid configuration: duplicate output column 'site_name'"
        );
    }

    #[test]
    fn warning_display_names_row_and_column() {
        let w = FieldParseWarning {
            row: 3,
            column: "date_of_visit".to_string(),
            raw: "32/13/2024".to_string(),
            reason: "unrecognised day-first date".to_string(),
        };
        assert_eq!(
            w.to_string(),
            "row 3 column 'date_of_visit': unrecognised day-first date (raw='32/13/2024')"
        );
    }
}
