//! JSON import and export of single data sets.
//!
//! File shape:
//!
//! ```json
//! {
//!   "name": "Users",
//!   "description": "login accounts",
//!   "items": [
//!     { "name": "admin", "type": "string", "value": "root", "description": "" },
//!     { "name": "retries", "type": "int", "value": 3 }
//!   ]
//! }
//! ```
//!
//! Items lacking `name`, `type` or `value` are skipped on import.
//!
//! Stored values are text, so the JSON kind of a value is not kept. On
//! export the `type` tag decides it: a `"string"` item is written as a JSON
//! string, any other item as the JSON its text parses to. A `"3"` imported
//! with type `int` is therefore exported as the number `3`.
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::error::DataStoreError;
use crate::data::model::{DataItem, DataSet, DataSetId, ProjectId};
use crate::data::store::{DataStore, Result};
use crate::logging::emit;

// --- Intermediate structs for (de)serialization ---

#[derive(Deserialize, Debug)]
struct RawDataSetFile {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Deserialize, Debug)]
struct RawDataItem {
    name: String,
    #[serde(rename = "type")]
    item_type: String,
    value: Value,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Serialize, Debug)]
struct ExportedDataSet<'a> {
    name: &'a str,
    description: &'a str,
    project_id: ProjectId,
    created_at: String,
    last_modified: String,
    items: Vec<ExportedDataItem<'a>>,
}

#[derive(Serialize, Debug)]
struct ExportedDataItem<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    item_type: &'a str,
    value: Value,
    description: &'a str,
}

// --- End intermediate structs ---

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Strings are stored without their JSON quotes; anything else as JSON text.
fn stored_value(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Inverse of [`stored_value`]: typed items whose text parses as JSON are
/// written back as JSON values.
fn exported_value(item: &DataItem) -> Value {
    if item.item_type != "string" {
        if let Ok(parsed) = serde_json::from_str::<Value>(&item.value) {
            return parsed;
        }
    }
    Value::String(item.value.clone())
}

impl DataStore {
    /// Read a data set file and create it under `project_id`.
    pub fn import_from_file(&mut self, path: impl AsRef<Path>, project_id: ProjectId) -> Result<DataSetId> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| DataStoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawDataSetFile = serde_json::from_str(&content).map_err(|source| DataStoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        if raw.name.is_empty() {
            return Err(DataStoreError::InvalidFormat {
                path: path.to_path_buf(),
                message: "missing or empty 'name' field".to_string(),
            });
        }

        let mut data_set = DataSet::new(raw.name)
            .with_description(raw.description.unwrap_or_default())
            .with_project(project_id);
        let mut skipped = 0usize;
        for value in raw.items {
            match serde_json::from_value::<RawDataItem>(value) {
                Ok(item) => data_set.items.push(
                    DataItem::new(item.name, item.item_type, stored_value(item.value))
                        .with_description(item.description.unwrap_or_default()),
                ),
                Err(_) => skipped += 1,
            }
        }
        if skipped > 0 {
            emit!(
                self.sink,
                Warn,
                "Skipped {} malformed item(s) while importing {}",
                skipped,
                path.display()
            );
        }

        let id = self.create_data_set(data_set)?;
        emit!(self.sink, Info, "Imported DataSet from {} as id {}", path.display(), id);
        Ok(id)
    }

    /// Write the set with `id` to `path` as pretty-printed JSON.
    pub fn export_to_file(&self, id: DataSetId, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let set = self.get_data_set(id).ok_or_else(|| DataStoreError::DataSetNotFound {
            key: format!("with ID {}", id),
        })?;

        let exported = ExportedDataSet {
            name: &set.name,
            description: &set.description,
            project_id: set.project_id,
            created_at: set.created_at.format(TIMESTAMP_FORMAT).to_string(),
            last_modified: set.updated_at.format(TIMESTAMP_FORMAT).to_string(),
            items: set
                .items
                .iter()
                .map(|item| ExportedDataItem {
                    name: &item.name,
                    item_type: &item.item_type,
                    value: exported_value(item),
                    description: &item.description,
                })
                .collect(),
        };
        let json = serde_json::to_string_pretty(&exported).map_err(|source| DataStoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| DataStoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        emit!(self.sink, Info, "Exported DataSet '{}' to {}", set.name, path.display());
        Ok(())
    }
}
