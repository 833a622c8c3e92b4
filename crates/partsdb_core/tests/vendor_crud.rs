use partsdb_core::db::open_db_in_memory;
use partsdb_core::{
    EntityKind, RelationshipWriter, RepoError, SqliteRelationshipWriter, SqliteVendorRepository,
    ValidationError, Vendor, VendorRepository,
};

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVendorRepository::new(&conn);

    let id = repo.create_vendor("3M Co.").unwrap();

    let loaded = repo.get_vendor(id).unwrap().unwrap();
    assert_eq!(
        loaded,
        Vendor {
            vendor_id: id,
            vendor_name: "3M Co.".to_string()
        }
    );
}

#[test]
fn create_rejects_empty_name_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVendorRepository::new(&conn);

    for name in ["", "   "] {
        let err = repo.create_vendor(name).unwrap_err();
        assert!(matches!(
            err,
            RepoError::Validation(ValidationError::EmptyName {
                entity: EntityKind::Vendor
            })
        ));
    }
    assert!(repo.list_vendors().unwrap().is_empty());
}

#[test]
fn generated_ids_are_distinct_and_never_reused() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVendorRepository::new(&conn);

    let first = repo.create_vendor("AKM Semiconductor Inc.").unwrap();
    let second = repo.create_vendor("Asahi Glass Co Ltd.").unwrap();
    assert_ne!(first, second);

    assert!(repo.delete_vendor(second).unwrap());
    let third = repo.create_vendor("Daikin Industries Ltd.").unwrap();
    assert!(third > second, "id {third} reused after delete of {second}");
}

#[test]
fn list_vendors_orders_by_id() {
    let mut conn = open_db_in_memory().unwrap();
    let names = vec![
        "Murata Manufacturing Co. Ltd.".to_string(),
        "Dynacast International Inc.".to_string(),
        "Foster Electric Co. Ltd.".to_string(),
    ];
    let ids = SqliteRelationshipWriter::new(&mut conn)
        .create_vendors(&names)
        .unwrap();

    let listed = SqliteVendorRepository::new(&conn).list_vendors().unwrap();
    let listed_ids: Vec<i64> = listed.iter().map(|vendor| vendor.vendor_id).collect();
    let listed_names: Vec<String> = listed.into_iter().map(|vendor| vendor.vendor_name).collect();

    let mut sorted_ids = ids.clone();
    sorted_ids.sort_unstable();
    assert_eq!(listed_ids, sorted_ids);
    assert_eq!(listed_names, names);
}

#[test]
fn update_vendor_returns_new_state() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVendorRepository::new(&conn);
    let id = repo.create_vendor("3M Co.").unwrap();

    let updated = repo.update_vendor(id, "3M company").unwrap().unwrap();
    assert_eq!(updated.vendor_id, id);
    assert_eq!(updated.vendor_name, "3M company");
    assert_eq!(repo.get_vendor(id).unwrap().unwrap().vendor_name, "3M company");
}

#[test]
fn update_missing_vendor_returns_none_and_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVendorRepository::new(&conn);
    repo.create_vendor("3M Co.").unwrap();
    let before = repo.list_vendors().unwrap();

    assert_eq!(repo.update_vendor(999, "X").unwrap(), None);
    assert_eq!(repo.list_vendors().unwrap(), before);
}

#[test]
fn update_rejects_blank_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVendorRepository::new(&conn);
    let id = repo.create_vendor("3M Co.").unwrap();

    let err = repo.update_vendor(id, " ").unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(repo.get_vendor(id).unwrap().unwrap().vendor_name, "3M Co.");
}

#[test]
fn vendor_batch_is_all_or_nothing_on_invalid_name() {
    let mut conn = open_db_in_memory().unwrap();
    let names = vec!["AKM Semiconductor Inc.".to_string(), String::new()];

    let err = SqliteRelationshipWriter::new(&mut conn)
        .create_vendors(&names)
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(SqliteVendorRepository::new(&conn)
        .list_vendors()
        .unwrap()
        .is_empty());
}

#[test]
fn get_and_delete_missing_vendor_are_not_errors() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVendorRepository::new(&conn);

    assert_eq!(repo.get_vendor(42).unwrap(), None);
    assert!(!repo.delete_vendor(42).unwrap());
}
