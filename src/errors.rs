use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GcBenchError {
    #[error("benchmarker executable not found: {path}{}", list_suffix(.available))]
    MissingExecutable {
        path: PathBuf,
        available: Vec<String>,
    },
    #[error("test library not found: {path}{}", list_suffix(.available))]
    MissingWorkloadLibrary {
        path: PathBuf,
        available: Vec<String>,
    },
    #[error("no CSV files found in {dir}: {hint}{}", list_suffix(.available))]
    NoCsvFilesFound {
        dir: PathBuf,
        hint: String,
        available: Vec<String>,
    },
    #[error("{path}:{line}: field {field} is not a number: {value:?}")]
    MalformedCsvValue {
        path: String,
        line: usize,
        field: String,
        value: String,
    },
    #[error("no data to plot")]
    EmptyResultSet,
    #[error("benchmark exited with status {code:?}")]
    BenchmarkFailed { code: Option<i32> },
    #[error("io error: {0}")]
    Io(String),
    #[error("render error: {0}")]
    Render(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl GcBenchError {
    pub fn io<T: Into<String>>(msg: T) -> Self {
        GcBenchError::Io(msg.into())
    }

    pub fn render<T: Into<String>>(msg: T) -> Self {
        GcBenchError::Render(msg.into())
    }

    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        GcBenchError::InvalidInput(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        GcBenchError::Serialization(msg.into())
    }

    pub fn malformed_value(
        path: impl Into<String>,
        line: usize,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        GcBenchError::MalformedCsvValue {
            path: path.into(),
            line,
            field: field.into(),
            value: value.into(),
        }
    }

    /// Conditions the CLI reports as "missing something" and exits 1 for.
    pub fn is_missing_input(&self) -> bool {
        matches!(
            self,
            GcBenchError::MissingExecutable { .. }
                | GcBenchError::MissingWorkloadLibrary { .. }
                | GcBenchError::NoCsvFilesFound { .. }
        )
    }

    /// Alternatives worth printing alongside the error, if any.
    pub fn available(&self) -> &[String] {
        match self {
            GcBenchError::MissingExecutable { available, .. }
            | GcBenchError::MissingWorkloadLibrary { available, .. }
            | GcBenchError::NoCsvFilesFound { available, .. } => available,
            _ => &[],
        }
    }
}

fn list_suffix(available: &[String]) -> String {
    if available.is_empty() {
        String::new()
    } else {
        format!(" (available: {})", available.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_library_lists_alternatives() {
        let err = GcBenchError::MissingWorkloadLibrary {
            path: PathBuf::from("/b/libbenchmarks-con-nope.so"),
            available: vec!["libbenchmarks-con-gol.so".into()],
        };
        let text = err.to_string();
        assert!(text.contains("libbenchmarks-con-nope.so"));
        assert!(text.contains("available: libbenchmarks-con-gol.so"));
        assert!(err.is_missing_input());
    }

    #[test]
    fn malformed_value_names_location() {
        let err = GcBenchError::malformed_value("trace.csv", 4, "gc_call_count", "ten");
        assert_eq!(
            err.to_string(),
            "trace.csv:4: field gc_call_count is not a number: \"ten\""
        );
        assert!(!err.is_missing_input());
        assert!(err.available().is_empty());
    }
}
