use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use chrono::Utc;

use crate::data::error::DataStoreError;
use crate::data::model::{DataItem, DataItemId, DataSet, DataSetId, ProjectId};
use crate::data::resolver::{ReferenceResolver, Resolution, parse_placeholder};
use crate::logging::{LogSink, default_sink, emit};

pub type Result<T> = std::result::Result<T, DataStoreError>;

/// In-memory store of data sets, indexed by id and by name.
///
/// Nothing is persisted implicitly; use
/// [`export_to_file`](DataStore::export_to_file) to save a set.
pub struct DataStore {
    sets: BTreeMap<DataSetId, DataSet>,
    by_name: HashMap<String, DataSetId>,
    next_set_id: DataSetId,
    next_item_id: DataItemId,
    pub(crate) sink: Arc<dyn LogSink>,
}

fn set_not_found(id: DataSetId) -> DataStoreError {
    DataStoreError::DataSetNotFound { key: format!("with ID {}", id) }
}

impl DataStore {
    pub fn new() -> Self {
        Self::with_sink(default_sink())
    }

    pub fn with_sink(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sets: BTreeMap::new(),
            by_name: HashMap::new(),
            next_set_id: 1,
            next_item_id: 1,
            sink,
        }
    }

    fn allocate_item_id(&mut self) -> DataItemId {
        let id = self.next_item_id;
        self.next_item_id += 1;
        id
    }

    /// Insert a new set. The store assigns ids to the set and its items and
    /// stamps creation times. Fails if the name is taken or two items share
    /// a name.
    pub fn create_data_set(&mut self, mut data_set: DataSet) -> Result<DataSetId> {
        if self.by_name.contains_key(&data_set.name) {
            return Err(DataStoreError::DuplicateDataSetName { name: data_set.name });
        }
        let mut seen = HashSet::new();
        for item in &data_set.items {
            if !seen.insert(item.name.as_str()) {
                return Err(DataStoreError::DuplicateDataItemName {
                    data_set: data_set.name.clone(),
                    name: item.name.clone(),
                });
            }
        }

        let id = self.next_set_id;
        self.next_set_id += 1;
        let now = Utc::now();
        data_set.id = id;
        data_set.created_at = now;
        data_set.updated_at = now;
        for item in &mut data_set.items {
            item.id = self.next_item_id;
            self.next_item_id += 1;
            item.project_id = data_set.project_id;
            item.created_at = now;
            item.updated_at = now;
        }

        emit!(
            self.sink,
            Debug,
            "Created DataSet '{}' (id {}, {} item(s))",
            data_set.name,
            id,
            data_set.items.len()
        );
        self.by_name.insert(data_set.name.clone(), id);
        self.sets.insert(id, data_set);
        Ok(id)
    }

    /// Update the name, description and project of an existing set.
    /// Items are managed through the item operations and are left as they are.
    pub fn update_data_set(&mut self, data_set: &DataSet) -> Result<()> {
        let existing = self.sets.get(&data_set.id).ok_or_else(|| set_not_found(data_set.id))?;
        let old_name = existing.name.clone();
        if old_name != data_set.name && self.by_name.contains_key(&data_set.name) {
            return Err(DataStoreError::DuplicateDataSetName { name: data_set.name.clone() });
        }

        let existing = self.sets.get_mut(&data_set.id).ok_or_else(|| set_not_found(data_set.id))?;
        existing.name = data_set.name.clone();
        existing.description = data_set.description.clone();
        if existing.project_id != data_set.project_id {
            existing.project_id = data_set.project_id;
            for item in &mut existing.items {
                item.project_id = data_set.project_id;
            }
        }
        existing.updated_at = Utc::now();

        if old_name != data_set.name {
            self.by_name.remove(&old_name);
            self.by_name.insert(data_set.name.clone(), data_set.id);
        }
        Ok(())
    }

    /// Remove a set and return it.
    pub fn delete_data_set(&mut self, id: DataSetId) -> Result<DataSet> {
        let removed = self.sets.remove(&id).ok_or_else(|| set_not_found(id))?;
        self.by_name.remove(&removed.name);
        emit!(self.sink, Debug, "Deleted DataSet '{}' (id {})", removed.name, id);
        Ok(removed)
    }

    pub fn get_data_set(&self, id: DataSetId) -> Option<&DataSet> {
        self.sets.get(&id)
    }

    pub fn get_data_set_by_name(&self, name: &str) -> Option<&DataSet> {
        self.by_name.get(name).and_then(|id| self.sets.get(id))
    }

    pub fn project_data_sets(&self, project_id: ProjectId) -> Vec<&DataSet> {
        self.sets.values().filter(|set| set.project_id == project_id).collect()
    }

    /// Every set, ordered by id
    pub fn all_data_sets(&self) -> Vec<&DataSet> {
        self.sets.values().collect()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Append an item to a set. The item inherits the set's project.
    pub fn add_data_item(&mut self, set_id: DataSetId, mut item: DataItem) -> Result<DataItemId> {
        let set = self.sets.get(&set_id).ok_or_else(|| set_not_found(set_id))?;
        if set.item_by_name(&item.name).is_some() {
            return Err(DataStoreError::DuplicateDataItemName {
                data_set: set.name.clone(),
                name: item.name,
            });
        }

        let id = self.allocate_item_id();
        let set = self.sets.get_mut(&set_id).ok_or_else(|| set_not_found(set_id))?;
        let now = Utc::now();
        item.id = id;
        item.project_id = set.project_id;
        item.created_at = now;
        item.updated_at = now;
        set.items.push(item);
        set.updated_at = now;
        Ok(id)
    }

    /// Replace the item with `item.id`, keeping its creation time and project.
    pub fn update_data_item(&mut self, set_id: DataSetId, item: &DataItem) -> Result<()> {
        let set = self.sets.get_mut(&set_id).ok_or_else(|| set_not_found(set_id))?;
        let index = set
            .items
            .iter()
            .position(|existing| existing.id == item.id)
            .ok_or_else(|| DataStoreError::DataItemNotFound {
                data_set: set.name.clone(),
                key: format!("with ID {}", item.id),
            })?;
        if set.items.iter().any(|other| other.id != item.id && other.name == item.name) {
            return Err(DataStoreError::DuplicateDataItemName {
                data_set: set.name.clone(),
                name: item.name.clone(),
            });
        }

        let project_id = set.project_id;
        let existing = &mut set.items[index];

        let now = Utc::now();
        let created_at = existing.created_at;
        *existing = item.clone();
        existing.created_at = created_at;
        existing.project_id = project_id;
        existing.updated_at = now;
        set.updated_at = now;
        Ok(())
    }

    /// Remove an item by id. `Ok(false)` when the set has no such item.
    pub fn remove_data_item(&mut self, set_id: DataSetId, item_id: DataItemId) -> Result<bool> {
        let set = self.sets.get_mut(&set_id).ok_or_else(|| set_not_found(set_id))?;
        let before = set.items.len();
        set.items.retain(|item| item.id != item_id);
        if set.items.len() == before {
            return Ok(false);
        }
        set.updated_at = Utc::now();
        Ok(true)
    }

    /// Remove an item by name. `Ok(false)` when the set has no such item.
    pub fn remove_data_item_by_name(&mut self, set_id: DataSetId, name: &str) -> Result<bool> {
        let set = self.sets.get(&set_id).ok_or_else(|| set_not_found(set_id))?;
        match set.item_by_name(name).map(|item| item.id) {
            Some(item_id) => self.remove_data_item(set_id, item_id),
            None => Ok(false),
        }
    }

    pub fn get_data_item(&self, set_id: DataSetId, item_id: DataItemId) -> Result<&DataItem> {
        let set = self.sets.get(&set_id).ok_or_else(|| set_not_found(set_id))?;
        set.item(item_id).ok_or_else(|| DataStoreError::DataItemNotFound {
            data_set: set.name.clone(),
            key: format!("with ID {}", item_id),
        })
    }

    pub fn get_data_item_by_name(&self, set_id: DataSetId, name: &str) -> Result<&DataItem> {
        let set = self.sets.get(&set_id).ok_or_else(|| set_not_found(set_id))?;
        set.item_by_name(name).ok_or_else(|| DataStoreError::DataItemNotFound {
            data_set: set.name.clone(),
            key: format!("with name '{}'", name),
        })
    }

    /// Value of a string that is exactly one `${set.item}` placeholder.
    pub fn resolve_reference(&self, reference: &str) -> Result<String> {
        let invalid = |reason| DataStoreError::InvalidReference {
            reference: reference.to_string(),
            reason,
        };
        let (set_name, item_name) = parse_placeholder(reference).map_err(invalid)?;
        self.resolver()
            .lookup(set_name, item_name)
            .map(str::to_string)
            .map_err(invalid)
    }

    /// Substitute every placeholder in `input`; see [`ReferenceResolver`].
    pub fn substitute_references(&self, input: &str) -> Resolution {
        self.resolver().resolve(input)
    }

    pub fn resolver(&self) -> ReferenceResolver<'_> {
        ReferenceResolver::new(self)
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataStore")
            .field("sets", &self.sets)
            .field("next_set_id", &self.next_set_id)
            .field("next_item_id", &self.next_item_id)
            .finish()
    }
}
