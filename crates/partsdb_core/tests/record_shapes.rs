use partsdb_core::{Part, PartDrawing, PartWithVendors, Vendor, VendorPart};
use serde_json::json;

#[test]
fn records_serialize_with_column_names() {
    let vendor = Vendor {
        vendor_id: 1,
        vendor_name: "3M Co.".to_string(),
    };
    assert_eq!(
        serde_json::to_value(&vendor).unwrap(),
        json!({ "vendor_id": 1, "vendor_name": "3M Co." })
    );

    let part = Part {
        part_id: 2,
        part_name: "Antenna".to_string(),
    };
    assert_eq!(
        serde_json::to_value(&part).unwrap(),
        json!({ "part_id": 2, "part_name": "Antenna" })
    );

    let link = VendorPart {
        vendor_id: 1,
        part_id: 2,
    };
    assert_eq!(
        serde_json::to_value(link).unwrap(),
        json!({ "vendor_id": 1, "part_id": 2 })
    );
}

#[test]
fn part_with_vendors_keeps_empty_vendor_list() {
    let report = PartWithVendors {
        part_id: 3,
        part_name: "Vibrator".to_string(),
        vendor_names: Vec::new(),
    };
    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        json!({ "part_id": 3, "part_name": "Vibrator", "vendor_names": [] })
    );
}

#[test]
fn drawing_deserializes_from_json() {
    let drawing: PartDrawing = serde_json::from_value(json!({
        "part_id": 4,
        "file_extension": "png",
        "drawing_data": [137, 80, 78, 71]
    }))
    .unwrap();
    assert_eq!(drawing, PartDrawing::new(4, "png", vec![137, 80, 78, 71]).unwrap());
}
