use crate::data::error::{DataStoreError, UnresolvedReason};
use crate::data::model::{DataItem, DataSet};
use crate::data::store::DataStore;

fn users_store() -> (DataStore, u64) {
    let mut store = DataStore::new();
    let id = store
        .create_data_set(
            DataSet::new("Users")
                .with_project(7)
                .with_item(DataItem::new("admin", "string", "root"))
                .with_item(DataItem::new("guest", "string", "anonymous")),
        )
        .expect("create Users");
    (store, id)
}

#[test]
fn test_create_assigns_ids_and_inherits_project() {
    let (store, id) = users_store();
    let set = store.get_data_set(id).expect("set exists");

    assert_eq!(set.id, id);
    assert_eq!(set.items.len(), 2);
    assert_ne!(set.items[0].id, set.items[1].id);
    assert!(set.items.iter().all(|item| item.project_id == 7));
    assert_eq!(set.created_at, set.updated_at);
    assert_eq!(store.get_data_set_by_name("Users").map(|s| s.id), Some(id));
}

#[test]
fn test_duplicate_data_set_name_keeps_first() {
    let mut store = DataStore::new();
    let first = store.create_data_set(DataSet::new("Foo").with_description("first")).expect("first");

    let err = store.create_data_set(DataSet::new("Foo").with_description("second")).unwrap_err();
    assert!(matches!(err, DataStoreError::DuplicateDataSetName { ref name } if name == "Foo"));
    assert_eq!(store.len(), 1);
    assert_eq!(store.get_data_set(first).map(|s| s.description.as_str()), Some("first"));
}

#[test]
fn test_create_rejects_duplicate_item_names() {
    let mut store = DataStore::new();
    let err = store
        .create_data_set(
            DataSet::new("Dup")
                .with_item(DataItem::new("x", "string", "1"))
                .with_item(DataItem::new("x", "string", "2")),
        )
        .unwrap_err();
    assert!(matches!(err, DataStoreError::DuplicateDataItemName { .. }));
    assert!(store.is_empty());
}

#[test]
fn test_lookups_are_case_sensitive() {
    let (store, id) = users_store();
    assert!(store.get_data_set_by_name("users").is_none());
    assert!(store.get_data_item_by_name(id, "Admin").is_err());
    assert_eq!(store.get_data_item_by_name(id, "admin").map(|i| i.value.as_str()).ok(), Some("root"));
}

#[test]
fn test_update_data_set_renames_and_preserves_created_at() {
    let (mut store, id) = users_store();
    store.create_data_set(DataSet::new("Other")).expect("other");
    let original = store.get_data_set(id).cloned().expect("set");

    let mut renamed = original.clone();
    renamed.name = "Accounts".to_string();
    renamed.project_id = 9;
    store.update_data_set(&renamed).expect("rename");

    let updated = store.get_data_set(id).expect("set");
    assert_eq!(updated.name, "Accounts");
    assert_eq!(updated.created_at, original.created_at);
    assert!(updated.updated_at >= original.updated_at);
    assert!(updated.items.iter().all(|item| item.project_id == 9));
    assert!(store.get_data_set_by_name("Users").is_none());
    assert_eq!(store.get_data_set_by_name("Accounts").map(|s| s.id), Some(id));

    // Renaming onto an existing name fails
    let mut clash = updated.clone();
    clash.name = "Other".to_string();
    assert!(matches!(
        store.update_data_set(&clash),
        Err(DataStoreError::DuplicateDataSetName { .. })
    ));

    // Updating with an unchanged name is not a clash with itself
    assert!(store.update_data_set(&store.get_data_set(id).cloned().expect("set")).is_ok());
}

#[test]
fn test_update_missing_data_set_fails() {
    let mut store = DataStore::new();
    let mut ghost = DataSet::new("Ghost");
    ghost.id = 42;
    assert!(matches!(
        store.update_data_set(&ghost),
        Err(DataStoreError::DataSetNotFound { .. })
    ));
}

#[test]
fn test_add_and_update_data_item() {
    let (mut store, id) = users_store();
    let item_id = store
        .add_data_item(id, DataItem::new("operator", "string", "op"))
        .expect("add item");
    assert_eq!(store.get_data_item(id, item_id).map(|i| i.project_id).ok(), Some(7));

    assert!(matches!(
        store.add_data_item(id, DataItem::new("admin", "string", "again")),
        Err(DataStoreError::DuplicateDataItemName { .. })
    ));

    let created = store.get_data_item(id, item_id).cloned().expect("item");
    let mut changed = created.clone();
    changed.value = "operator1".to_string();
    changed.project_id = 99;
    store.update_data_item(id, &changed).expect("update");

    let item = store.get_data_item(id, item_id).expect("item");
    assert_eq!(item.value, "operator1");
    assert_eq!(item.created_at, created.created_at);
    assert_eq!(item.project_id, 7, "project stays inherited from the set");

    // Name uniqueness excludes the item being updated
    let mut clash = item.clone();
    clash.name = "guest".to_string();
    assert!(matches!(
        store.update_data_item(id, &clash),
        Err(DataStoreError::DuplicateDataItemName { .. })
    ));

    let mut missing = DataItem::new("nobody", "string", "");
    missing.id = 12345;
    assert!(matches!(
        store.update_data_item(id, &missing),
        Err(DataStoreError::DataItemNotFound { .. })
    ));
}

#[test]
fn test_update_unknown_item_reports_missing_before_name_clash() {
    let (mut store, id) = users_store();
    let mut ghost = DataItem::new("admin", "string", "root2");
    ghost.id = 4242;
    assert!(matches!(
        store.update_data_item(id, &ghost),
        Err(DataStoreError::DataItemNotFound { ref key, .. }) if key == "with ID 4242"
    ));
    assert_eq!(store.get_data_item_by_name(id, "admin").map(|i| i.value.as_str()).ok(), Some("root"));
}

#[test]
fn test_remove_data_item_outcomes() {
    let (mut store, id) = users_store();
    let guest_id = store.get_data_item_by_name(id, "guest").map(|i| i.id).expect("guest");

    assert_eq!(store.remove_data_item(id, guest_id).ok(), Some(true));
    assert_eq!(store.remove_data_item(id, guest_id).ok(), Some(false));
    assert_eq!(store.remove_data_item_by_name(id, "admin").ok(), Some(true));
    assert_eq!(store.remove_data_item_by_name(id, "admin").ok(), Some(false));
    assert!(store.get_data_set(id).map(|s| s.items.is_empty()).unwrap_or(false));

    // A missing set is a harder failure than a missing item
    assert!(matches!(
        store.remove_data_item(999, 1),
        Err(DataStoreError::DataSetNotFound { .. })
    ));
    assert!(matches!(
        store.remove_data_item_by_name(999, "admin"),
        Err(DataStoreError::DataSetNotFound { .. })
    ));
}

#[test]
fn test_delete_and_project_queries() {
    let (mut store, users) = users_store();
    let other = store.create_data_set(DataSet::new("Hosts").with_project(3)).expect("hosts");

    assert_eq!(store.project_data_sets(7).len(), 1);
    assert_eq!(store.all_data_sets().len(), 2);

    let removed = store.delete_data_set(users).expect("delete");
    assert_eq!(removed.name, "Users");
    assert!(store.get_data_set_by_name("Users").is_none());
    assert!(matches!(store.delete_data_set(users), Err(DataStoreError::DataSetNotFound { .. })));
    assert_eq!(store.all_data_sets().iter().map(|s| s.id).collect::<Vec<_>>(), vec![other]);

    // The freed name can be reused
    assert!(store.create_data_set(DataSet::new("Users")).is_ok());
}

#[test]
fn test_resolve_single_reference() {
    let (store, _) = users_store();
    assert_eq!(store.resolve_reference("${Users.admin}").ok().as_deref(), Some("root"));

    match store.resolve_reference("${Users.nobody}") {
        Err(DataStoreError::InvalidReference { reason, .. }) => assert_eq!(reason, UnresolvedReason::UnknownDataItem),
        other => panic!("expected InvalidReference, got {:?}", other),
    }
    match store.resolve_reference("Users.admin") {
        Err(DataStoreError::InvalidReference { reason, .. }) => assert_eq!(reason, UnresolvedReason::MissingSeparator),
        other => panic!("expected InvalidReference, got {:?}", other),
    }
    match store.resolve_reference("${Users}") {
        Err(DataStoreError::InvalidReference { reason, .. }) => assert_eq!(reason, UnresolvedReason::MissingSeparator),
        other => panic!("expected InvalidReference, got {:?}", other),
    }
    assert!(store.resolve_reference("${Users.admin} extra").is_err());
}
