use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type DataSetId = u64;
pub type DataItemId = u64;
pub type ProjectId = i64;

/// A named value inside a [`DataSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataItem {
    /// Assigned by the store; unique within the owning set
    pub id: DataItemId,
    pub name: String,
    /// Advisory type tag (`string`, `int`, `json`, ...)
    #[serde(rename = "type")]
    pub item_type: String,
    /// String-encoded value
    pub value: String,
    pub description: String,
    /// Inherited from the owning set
    pub project_id: ProjectId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DataItem {
    pub fn new(name: impl Into<String>, item_type: impl Into<String>, value: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: name.into(),
            item_type: item_type.into(),
            value: value.into(),
            description: String::new(),
            project_id: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Named, ordered collection of [`DataItem`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSet {
    /// Assigned by the store
    pub id: DataSetId,
    /// Unique across the store
    pub name: String,
    pub description: String,
    pub project_id: ProjectId,
    pub items: Vec<DataItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DataSet {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: name.into(),
            description: String::new(),
            project_id: 0,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = project_id;
        self
    }

    pub fn with_item(mut self, item: DataItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn item(&self, id: DataItemId) -> Option<&DataItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Exact, case-sensitive lookup
    pub fn item_by_name(&self, name: &str) -> Option<&DataItem> {
        self.items.iter().find(|item| item.name == name)
    }
}
