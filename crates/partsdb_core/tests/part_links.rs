use partsdb_core::db::open_db_in_memory;
use partsdb_core::{
    PartDrawing, PartRepository, RelationshipWriter, RepoError, SqlitePartRepository,
    SqliteRelationshipWriter, SqliteVendorRepository, ValidationError, VendorPart,
    VendorRepository,
};
use rusqlite::Connection;
use std::collections::BTreeSet;

fn seed_vendors(conn: &Connection, names: &[&str]) -> Vec<i64> {
    let repo = SqliteVendorRepository::new(conn);
    names
        .iter()
        .map(|name| repo.create_vendor(name).unwrap())
        .collect()
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn add_part_with_vendors_creates_part_and_every_link() {
    let mut conn = open_db_in_memory().unwrap();
    let vendors = seed_vendors(&conn, &["LG Display", "Samsung Display"]);

    let part_id = SqliteRelationshipWriter::new(&mut conn)
        .add_part_with_vendors("OLED", &vendors.iter().copied().collect())
        .unwrap();

    assert_eq!(count(&conn, "parts"), 1);
    let links = SqliteRelationshipWriter::new(&mut conn)
        .list_vendor_parts()
        .unwrap();
    assert_eq!(
        links,
        vec![
            VendorPart {
                vendor_id: vendors[0],
                part_id
            },
            VendorPart {
                vendor_id: vendors[1],
                part_id
            },
        ]
    );
}

#[test]
fn add_part_with_missing_vendor_rolls_back_everything() {
    let mut conn = open_db_in_memory().unwrap();
    let vendors = seed_vendors(&conn, &["3M Co."]);

    let err = SqliteRelationshipWriter::new(&mut conn)
        .add_part_with_vendors("Bad", &BTreeSet::from([999]))
        .unwrap_err();
    match err {
        RepoError::Referential {
            operation,
            table,
            id,
        } => {
            assert_eq!(operation, "add_part_with_vendors");
            assert_eq!(table, "vendors");
            assert_eq!(id, 999);
        }
        other => panic!("unexpected error: {other}"),
    }

    let mixed = BTreeSet::from([vendors[0], 999]);
    let err = SqliteRelationshipWriter::new(&mut conn)
        .add_part_with_vendors("Half Linked", &mixed)
        .unwrap_err();
    assert!(matches!(err, RepoError::Referential { id: 999, .. }));

    assert_eq!(count(&conn, "parts"), 0);
    assert_eq!(count(&conn, "vendor_parts"), 0);
}

#[test]
fn smallest_missing_vendor_id_is_reported() {
    let mut conn = open_db_in_memory().unwrap();
    seed_vendors(&conn, &["3M Co."]);

    let err = SqliteRelationshipWriter::new(&mut conn)
        .add_part_with_vendors("Speaker", &BTreeSet::from([700, 500]))
        .unwrap_err();
    assert!(matches!(err, RepoError::Referential { id: 500, .. }));
}

#[test]
fn add_part_with_no_vendors_creates_unlinked_part() {
    let mut conn = open_db_in_memory().unwrap();

    let part_id = SqliteRelationshipWriter::new(&mut conn)
        .add_part_with_vendors("Vibrator", &BTreeSet::new())
        .unwrap();

    assert!(SqlitePartRepository::new(&conn)
        .get_part(part_id)
        .unwrap()
        .is_some());
    assert_eq!(count(&conn, "vendor_parts"), 0);
}

#[test]
fn add_part_with_blank_name_is_validation_error() {
    let mut conn = open_db_in_memory().unwrap();
    let vendors = seed_vendors(&conn, &["3M Co."]);

    let err = SqliteRelationshipWriter::new(&mut conn)
        .add_part_with_vendors("", &vendors.into_iter().collect())
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::EmptyName { .. })
    ));
    assert_eq!(count(&conn, "parts"), 0);
}

#[test]
fn deleting_vendor_cascades_to_links_but_keeps_part() {
    let mut conn = open_db_in_memory().unwrap();
    let vendors = seed_vendors(&conn, &["3M Co.", "AKM Semiconductor Inc."]);
    let part_id = SqliteRelationshipWriter::new(&mut conn)
        .add_part_with_vendors("LTE Modem", &vendors.iter().copied().collect())
        .unwrap();

    assert!(SqliteVendorRepository::new(&conn)
        .delete_vendor(vendors[0])
        .unwrap());

    let links = SqliteRelationshipWriter::new(&mut conn)
        .list_vendor_parts()
        .unwrap();
    assert_eq!(
        links,
        vec![VendorPart {
            vendor_id: vendors[1],
            part_id
        }]
    );
    assert!(SqlitePartRepository::new(&conn)
        .get_part(part_id)
        .unwrap()
        .is_some());
}

#[test]
fn deleting_part_cascades_to_links_and_drawing() {
    let mut conn = open_db_in_memory().unwrap();
    let vendors = seed_vendors(&conn, &["3M Co."]);
    let part_id = SqliteRelationshipWriter::new(&mut conn)
        .add_part_with_vendors("Home Button", &vendors.iter().copied().collect())
        .unwrap();
    let parts = SqlitePartRepository::new(&conn);
    parts
        .set_part_drawing(&PartDrawing::new(part_id, "png", vec![0x89, 0x50, 0x4E, 0x47]).unwrap())
        .unwrap();

    assert!(parts.delete_part(part_id).unwrap());

    assert_eq!(count(&conn, "vendor_parts"), 0);
    assert_eq!(count(&conn, "part_drawings"), 0);
    assert_eq!(count(&conn, "vendors"), 1);
}

#[test]
fn part_drawing_is_replaced_not_duplicated() {
    let conn = open_db_in_memory().unwrap();
    let parts = SqlitePartRepository::new(&conn);
    let part_id = parts.create_part("Transistor").unwrap();

    parts
        .set_part_drawing(&PartDrawing::new(part_id, "png", vec![1, 2, 3]).unwrap())
        .unwrap();
    parts
        .set_part_drawing(&PartDrawing::new(part_id, "jpg", vec![4, 5]).unwrap())
        .unwrap();

    let drawing = parts.get_part_drawing(part_id).unwrap().unwrap();
    assert_eq!(drawing.file_extension, "jpg");
    assert_eq!(drawing.drawing_data, vec![4, 5]);
    assert_eq!(count(&conn, "part_drawings"), 1);

    assert!(parts.delete_part_drawing(part_id).unwrap());
    assert_eq!(parts.get_part_drawing(part_id).unwrap(), None);
    assert!(parts.get_part(part_id).unwrap().is_some());
}

#[test]
fn part_drawing_requires_existing_part() {
    let conn = open_db_in_memory().unwrap();
    let parts = SqlitePartRepository::new(&conn);

    let err = parts
        .set_part_drawing(&PartDrawing::new(77, "png", vec![1]).unwrap())
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Referential {
            table: "parts",
            id: 77,
            ..
        }
    ));
}

#[test]
fn link_vendor_part_names_the_missing_parent() {
    let mut conn = open_db_in_memory().unwrap();
    let vendors = seed_vendors(&conn, &["3M Co."]);
    let part_id = SqlitePartRepository::new(&conn).create_part("Resistor").unwrap();
    let mut writer = SqliteRelationshipWriter::new(&mut conn);

    let err = writer.link_vendor_part(404, part_id).unwrap_err();
    assert!(matches!(err, RepoError::Referential { table: "vendors", id: 404, .. }));

    let err = writer.link_vendor_part(vendors[0], 405).unwrap_err();
    assert!(matches!(err, RepoError::Referential { table: "parts", id: 405, .. }));

    writer.link_vendor_part(vendors[0], part_id).unwrap();
    let err = writer.link_vendor_part(vendors[0], part_id).unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));

    assert!(writer.unlink_vendor_part(vendors[0], part_id).unwrap());
    assert!(!writer.unlink_vendor_part(vendors[0], part_id).unwrap());
    assert!(writer.list_vendor_parts().unwrap().is_empty());
}

#[test]
fn list_parts_orders_by_id() {
    let conn = open_db_in_memory().unwrap();
    let parts = SqlitePartRepository::new(&conn);
    let ids: Vec<i64> = ["Transistor", "Resistor", "Capacitor"]
        .into_iter()
        .map(|name| parts.create_part(name).unwrap())
        .collect();

    let listed: Vec<i64> = parts
        .list_parts()
        .unwrap()
        .into_iter()
        .map(|part| part.part_id)
        .collect();
    assert_eq!(listed, ids);
}
