//! Plain-text table rendering for CLI listings.

use partsdb_core::db::introspect::TableInfo;
use partsdb_core::{Part, PartWithVendors, RoutineDefinition, Vendor};

/// Renders rows under a header with left-aligned, width-fitted columns.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|header| header.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    let mut lines = vec![
        render_row(headers.iter().copied(), &widths),
        render_row(rule.iter().map(String::as_str), &widths),
    ];
    for row in rows {
        lines.push(render_row(row.iter().map(String::as_str), &widths));
    }
    lines.join("\n")
}

fn render_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

pub fn print_vendors(vendors: &[Vendor]) {
    let rows: Vec<Vec<String>> = vendors
        .iter()
        .map(|vendor| vec![vendor.vendor_id.to_string(), vendor.vendor_name.clone()])
        .collect();
    println!("{}", render_table(&["vendor_id", "vendor_name"], &rows));
}

pub fn print_parts(parts: &[Part]) {
    let rows: Vec<Vec<String>> = parts
        .iter()
        .map(|part| vec![part.part_id.to_string(), part.part_name.clone()])
        .collect();
    println!("{}", render_table(&["part_id", "part_name"], &rows));
}

pub fn print_parts_with_vendors(parts: &[PartWithVendors]) {
    let rows: Vec<Vec<String>> = parts
        .iter()
        .map(|part| {
            vec![
                part.part_id.to_string(),
                part.part_name.clone(),
                part.vendor_names.join(", "),
            ]
        })
        .collect();
    println!("{}", render_table(&["part_id", "part_name", "vendors"], &rows));
}

pub fn print_routines(routines: &[RoutineDefinition]) {
    let rows: Vec<Vec<String>> = routines
        .iter()
        .map(|routine| vec![routine.name.clone(), routine.kind.to_string()])
        .collect();
    println!("{}", render_table(&["name", "kind"], &rows));
}

pub fn print_schema(tables: &[TableInfo]) {
    for table in tables {
        println!("{}", table.name);
        let rows: Vec<Vec<String>> = table
            .columns
            .iter()
            .map(|column| {
                let references = table
                    .foreign_keys
                    .iter()
                    .find(|fk| fk.column == column.name)
                    .map(|fk| {
                        format!(
                            "{}({}) ON UPDATE {} ON DELETE {}",
                            fk.referenced_table, fk.referenced_column, fk.on_update, fk.on_delete
                        )
                    })
                    .unwrap_or_default();
                vec![
                    column.name.clone(),
                    column.declared_type.clone(),
                    if column.not_null { "NOT NULL" } else { "" }.to_string(),
                    match column.primary_key_position {
                        0 => String::new(),
                        position => format!("PK{position}"),
                    },
                    references,
                ]
            })
            .collect();
        println!(
            "{}\n",
            render_table(&["column", "type", "null", "key", "references"], &rows)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::render_table;

    #[test]
    fn columns_are_padded_to_widest_cell() {
        let rows = vec![
            vec!["1".to_string(), "3M Co.".to_string()],
            vec!["12".to_string(), "AKM Semiconductor Inc.".to_string()],
        ];
        let table = render_table(&["vendor_id", "vendor_name"], &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "vendor_id  vendor_name");
        assert_eq!(lines[1], "---------  ----------------------");
        assert_eq!(lines[2], "1          3M Co.");
        assert_eq!(lines[3], "12         AKM Semiconductor Inc.");
    }

    #[test]
    fn empty_listing_keeps_header() {
        let table = render_table(&["part_id", "part_name"], &[]);
        assert_eq!(table.lines().count(), 2);
    }
}
