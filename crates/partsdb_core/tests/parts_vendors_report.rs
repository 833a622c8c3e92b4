use partsdb_core::db::open_db_in_memory;
use partsdb_core::{
    AggregationReader, PartRepository, PartWithVendors, RelationshipWriter,
    SqliteAggregationReader, SqlitePartRepository, SqliteRelationshipWriter,
};

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn empty_catalog_has_no_rows() {
    let conn = open_db_in_memory().unwrap();

    let rows = SqliteAggregationReader::new(&conn)
        .list_parts_with_vendors()
        .unwrap();
    assert!(rows.is_empty());
}

#[test]
fn parts_are_listed_once_with_vendor_names_in_vendor_order() {
    let mut conn = open_db_in_memory().unwrap();
    let vendor_ids = SqliteRelationshipWriter::new(&mut conn)
        .create_vendors(&names(&["Samsung Display", "LG Display", "3M Co."]))
        .unwrap();

    let mut writer = SqliteRelationshipWriter::new(&mut conn);
    let oled = writer
        .add_part_with_vendors("OLED", &[vendor_ids[1], vendor_ids[0]].into_iter().collect())
        .unwrap();
    let vibrator = writer
        .add_part_with_vendors("Vibrator", &Default::default())
        .unwrap();
    let adhesive = writer
        .add_part_with_vendors("Adhesive", &[vendor_ids[2]].into_iter().collect())
        .unwrap();

    let rows = SqliteAggregationReader::new(&conn)
        .list_parts_with_vendors()
        .unwrap();
    assert_eq!(
        rows,
        vec![
            PartWithVendors {
                part_id: oled,
                part_name: "OLED".to_string(),
                vendor_names: names(&["Samsung Display", "LG Display"]),
            },
            PartWithVendors {
                part_id: vibrator,
                part_name: "Vibrator".to_string(),
                vendor_names: Vec::new(),
            },
            PartWithVendors {
                part_id: adhesive,
                part_name: "Adhesive".to_string(),
                vendor_names: names(&["3M Co."]),
            },
        ]
    );
}

#[test]
fn get_part_with_vendors_reads_one_part() {
    let mut conn = open_db_in_memory().unwrap();
    let vendor_ids = SqliteRelationshipWriter::new(&mut conn)
        .create_vendors(&names(&["Apple Inc."]))
        .unwrap();
    let antenna = SqliteRelationshipWriter::new(&mut conn)
        .add_part_with_vendors("Antenna", &vendor_ids.iter().copied().collect())
        .unwrap();
    let lonely = SqlitePartRepository::new(&conn).create_part("Transistor").unwrap();
    let reader = SqliteAggregationReader::new(&conn);

    let found = reader.get_part_with_vendors(antenna).unwrap().unwrap();
    assert_eq!(found.vendor_names, names(&["Apple Inc."]));

    let found = reader.get_part_with_vendors(lonely).unwrap().unwrap();
    assert!(found.vendor_names.is_empty());

    assert_eq!(reader.get_part_with_vendors(999).unwrap(), None);
}
