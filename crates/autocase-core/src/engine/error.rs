use std::path::PathBuf;

/// Failure reading or writing test case files.
#[derive(Debug, thiserror::Error)]
pub enum CaseFormatError {
    #[error("Failed to {operation} test case file '{path}': {source}")]
    Io {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to deserialize test cases{}: {source}", .path.as_ref().map(|p| format!(" from '{}'", p.display())).unwrap_or_default())]
    Parse {
        path: Option<PathBuf>,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize test cases: {0}")]
    Encode(#[source] serde_json::Error),
}
