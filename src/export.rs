//! Tabular export of extraction results.
//!
//! A validated record is a nested mapping (addresses, contacts, a list of
//! line items). Spreadsheets want one flat row per line item, so the
//! export flattens nested objects into underscore-joined column names
//! (`buyer_address_city`) and repeats the invoice-level columns on every
//! item row, with item columns under an `item_` prefix
//! (`item_description`, `item_vat_rate`). A record without items still
//! produces one row.

use crate::error::ExtractError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// One flat row: column name to scalar cell value. BTreeMap keeps the
/// column set ordered, so the CSV header is deterministic.
pub type Row = BTreeMap<String, Value>;

/// Flatten a validated record into one row per line item.
pub fn to_rows(record: &Value) -> Vec<Row> {
    let mut base = Row::new();
    let mut items: &[Value] = &[];
    if let Some(map) = record.as_object() {
        for (key, value) in map {
            if key == "items" {
                if let Some(arr) = value.as_array() {
                    items = arr;
                }
            } else {
                flatten_into(&mut base, key, value);
            }
        }
    }

    if items.is_empty() {
        return vec![base];
    }
    items
        .iter()
        .map(|item| {
            let mut row = base.clone();
            flatten_into(&mut row, "item", item);
            row
        })
        .collect()
}

/// Recursively flatten `value` under `prefix`, joining nested keys with
/// underscores. Scalars land as-is; arrays inside nested objects are not
/// expected after validation and are stored as JSON text.
fn flatten_into(row: &mut Row, prefix: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_into(row, &format!("{prefix}_{key}"), nested);
            }
        }
        Value::Array(_) => {
            row.insert(
                prefix.to_string(),
                Value::String(value.to_string()),
            );
        }
        scalar => {
            row.insert(prefix.to_string(), scalar.clone());
        }
    }
}

/// Render a flattened cell for CSV: null becomes empty, strings are
/// written raw, numbers and booleans in their canonical form.
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Serialize a validated record to CSV text.
///
/// The header is the sorted union of all row columns, so records whose
/// items omit different fields still share one consistent header.
pub fn to_csv_string(record: &Value) -> Result<String, ExtractError> {
    let rows = to_rows(record);

    let mut columns: Vec<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .collect();
    columns.sort_unstable();
    columns.dedup();

    let mut writer = csv::Writer::from_writer(vec![]);
    writer
        .write_record(&columns)
        .map_err(|e| ExtractError::Internal(format!("CSV write failed: {e}")))?;
    for row in &rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|col| row.get(*col).map(cell_text).unwrap_or_default())
            .collect();
        writer
            .write_record(&cells)
            .map_err(|e| ExtractError::Internal(format!("CSV write failed: {e}")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExtractError::Internal(format!("CSV write failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| ExtractError::Internal(format!("CSV not UTF-8: {e}")))
}

/// Write export text to a file, wrapping io failures with the target path.
pub fn write_output(path: &Path, contents: &str) -> Result<(), ExtractError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| ExtractError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
    }
    std::fs::write(path, contents).map_err(|e| ExtractError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_two_items() -> Value {
        json!({
            "invoice_id": "INV-1",
            "invoice_total": 240.5,
            "buyer_address": {"city": "Oslo", "country": "NO"},
            "items": [
                {"description": "Beam", "quantity": 2.0, "total_price": 140.5},
                {"description": "Bolt kit", "quantity": 1.0, "vat_rate": 25.0},
            ],
        })
    }

    #[test]
    fn one_row_per_item_with_shared_invoice_columns() {
        let rows = to_rows(&record_two_items());
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row["invoice_id"], json!("INV-1"));
            assert_eq!(row["buyer_address_city"], json!("Oslo"));
        }
        assert_eq!(rows[0]["item_description"], json!("Beam"));
        assert_eq!(rows[1]["item_description"], json!("Bolt kit"));
    }

    #[test]
    fn nested_keys_join_with_underscores() {
        let rows = to_rows(&json!({
            "seller_contact": {"name": "Ann", "email": null},
        }));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["seller_contact_name"], json!("Ann"));
        assert_eq!(rows[0]["seller_contact_email"], json!(null));
    }

    #[test]
    fn no_items_still_yields_one_row() {
        let rows = to_rows(&json!({"invoice_id": "INV-2", "items": []}));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["invoice_id"], json!("INV-2"));
        assert!(!rows[0].contains_key("item_description"));
    }

    #[test]
    fn csv_header_is_sorted_union_of_columns() {
        let csv_text = to_csv_string(&record_two_items()).unwrap();
        let header = csv_text.lines().next().unwrap();
        let columns: Vec<&str> = header.split(',').collect();
        let mut sorted = columns.clone();
        sorted.sort_unstable();
        assert_eq!(columns, sorted);
        // vat_rate only appears on the second item but must be in the header.
        assert!(columns.contains(&"item_vat_rate"));
        assert!(columns.contains(&"item_total_price"));
    }

    #[test]
    fn csv_nulls_render_as_empty_cells() {
        let csv_text = to_csv_string(&json!({
            "invoice_id": null,
            "invoice_total": 12.5,
        }))
        .unwrap();
        let mut lines = csv_text.lines();
        assert_eq!(lines.next().unwrap(), "invoice_id,invoice_total");
        assert_eq!(lines.next().unwrap(), ",12.5");
    }

    #[test]
    fn csv_row_count_matches_items() {
        let csv_text = to_csv_string(&record_two_items()).unwrap();
        assert_eq!(csv_text.lines().count(), 3); // header + 2 items
    }

    #[test]
    fn write_output_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out/result.csv");
        write_output(&target, "a,b\n1,2\n").unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "a,b\n1,2\n");
    }

    #[test]
    fn write_output_failure_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be written as a file.
        let err = write_output(dir.path(), "nope").unwrap_err();
        assert!(matches!(err, ExtractError::OutputWriteFailed { .. }));
    }
}
