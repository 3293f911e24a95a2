use std::fmt;
use std::path::PathBuf;

/// Why a `${set.item}` placeholder was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// No closing `}` before the end of input or the next `${`
    Unterminated,
    /// No `.` between `${` and `}`
    MissingSeparator,
    /// Set or item name is empty
    EmptyName,
    UnknownDataSet,
    UnknownDataItem,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UnresolvedReason::Unterminated => "missing closing '}'",
            UnresolvedReason::MissingSeparator => "missing '.' between data set and item name",
            UnresolvedReason::EmptyName => "empty data set or item name",
            UnresolvedReason::UnknownDataSet => "data set not found",
            UnresolvedReason::UnknownDataItem => "data item not found",
        };
        f.write_str(text)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DataStoreError {
    #[error("DataSet with name '{name}' already exists")]
    DuplicateDataSetName { name: String },

    #[error("DataItem with name '{name}' already exists in DataSet {data_set}")]
    DuplicateDataItemName { data_set: String, name: String },

    #[error("DataSet {key} does not exist")]
    DataSetNotFound { key: String },

    #[error("DataItem {key} not found in DataSet {data_set}")]
    DataItemNotFound { data_set: String, key: String },

    #[error("Invalid data reference '{reference}': {reason}. Use ${{dataset_name.item_name}}")]
    InvalidReference { reference: String, reason: UnresolvedReason },

    #[error("Invalid DataSet file '{path}': {message}")]
    InvalidFormat { path: PathBuf, message: String },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
