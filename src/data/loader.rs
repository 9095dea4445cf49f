use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Row, Table};
use crate::config::ColumnMapping;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a transaction table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one transaction per line
/// * `.json`    – `[{ "category": "Books", "price": 15.2, ... }, ...]`
/// * `.parquet` – flat columns of strings, ints, floats, bools
///
/// After parsing, mixed int/float columns are unified and the spend column
/// is derived from price and quantity when the file lacks it.
pub fn load_file(path: &Path, mapping: &ColumnMapping) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let (columns, rows) = match ext.as_str() {
        "csv" => read_csv(path)?,
        "json" => read_json(path)?,
        "parquet" | "pq" => read_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };
    let table = finish(columns, rows, mapping);
    log::info!(
        "Loaded {} rows with columns {:?} from {}",
        table.len(),
        table.columns(),
        path.display()
    );
    Ok(table)
}

/// Load CSV text already held in memory (e.g. an upload body).
pub fn load_csv_str(text: &str, mapping: &ColumnMapping) -> Result<Table> {
    let reader = csv::Reader::from_reader(text.as_bytes());
    let (columns, rows) = read_csv_records(reader)?;
    Ok(finish(columns, rows, mapping))
}

fn finish(columns: Vec<String>, mut rows: Vec<Row>, mapping: &ColumnMapping) -> Table {
    unify_numeric_columns(&columns, &mut rows);
    let mut columns = columns;
    derive_spend(&mut columns, &mut rows, mapping);
    Table::new(columns, rows)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<Row>)> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv_records(reader)
}

fn read_csv_records<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<(Vec<String>, Vec<Row>)> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(col, value)| (col.clone(), guess_cell_type(value)))
            .collect();
        rows.push(row);
    }
    Ok((headers, rows))
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Some(f) = super::model::parse_number(s) {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "customer_id": "C241288", "category": "Clothing", "price": 1500.4, "quantity": 5 },
///   ...
/// ]
/// ```
fn read_json(path: &Path) -> Result<(Vec<String>, Vec<Row>)> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        rows.push(
            obj.iter()
                .map(|(key, val)| (key.clone(), json_to_cell(val)))
                .collect(),
        );
    }
    // Column order is discovered from the rows.
    Ok((Vec::new(), rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn read_parquet(path: &Path) -> Result<(Vec<String>, Vec<Row>)> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let cells: Row = columns
                .iter()
                .zip(batch.columns())
                .map(|(name, col)| (name.clone(), extract_cell(col, row)))
                .collect();
            rows.push(cells);
        }
    }
    Ok((columns, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int8 => CellValue::Integer(col.as_primitive::<Int8Type>().value(row).into()),
        DataType::Int16 => CellValue::Integer(col.as_primitive::<Int16Type>().value(row).into()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row).into()),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row).into()),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        other => {
            // Dates, decimals, dictionaries: keep the display form.
            match arrow::util::display::array_value_to_string(col, row) {
                Ok(s) => CellValue::String(s),
                Err(_) => CellValue::String(format!("{other:?}")),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Post-processing
// ---------------------------------------------------------------------------

/// Promote integer cells to floats in columns that hold both, so `10` and
/// `10.0` group together.
fn unify_numeric_columns(columns: &[String], rows: &mut [Row]) {
    let mut names: Vec<String> = columns.to_vec();
    for row in rows.iter() {
        for key in row.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }

    for name in &names {
        let mut has_int = false;
        let mut has_float = false;
        for row in rows.iter() {
            match row.get(name) {
                Some(CellValue::Integer(_)) => has_int = true,
                Some(CellValue::Float(_)) => has_float = true,
                _ => {}
            }
        }
        if !(has_int && has_float) {
            continue;
        }
        for row in rows.iter_mut() {
            if let Some(value) = row.get_mut(name) {
                if let CellValue::Integer(i) = *value {
                    *value = CellValue::Float(i as f64);
                }
            }
        }
    }
}

/// Add `mapping.spend` as `price * quantity` when the source lacks it.
fn derive_spend(columns: &mut Vec<String>, rows: &mut [Row], mapping: &ColumnMapping) {
    let present = |name: &str| {
        columns.iter().any(|c| c == name) || rows.iter().any(|r| r.contains_key(name))
    };
    if present(&mapping.spend) || !present(&mapping.price) || !present(&mapping.quantity) {
        return;
    }
    log::info!(
        "Deriving '{}' as '{}' * '{}'",
        mapping.spend,
        mapping.price,
        mapping.quantity
    );
    for row in rows.iter_mut() {
        let price = row.get(&mapping.price).and_then(CellValue::as_f64);
        let quantity = row.get(&mapping.quantity).and_then(CellValue::as_f64);
        let spend = match (price, quantity) {
            (Some(p), Some(q)) => CellValue::Float(p * q),
            _ => CellValue::Null,
        };
        row.insert(mapping.spend.clone(), spend);
    }
    if !columns.is_empty() {
        columns.push(mapping.spend.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_types_are_guessed_from_text() {
        assert_eq!(guess_cell_type(""), CellValue::Null);
        assert_eq!(guess_cell_type("42"), CellValue::Integer(42));
        assert_eq!(guess_cell_type("-3.5"), CellValue::Float(-3.5));
        assert_eq!(guess_cell_type("true"), CellValue::Bool(true));
        assert_eq!(guess_cell_type("nan"), CellValue::from("nan"));
        assert_eq!(guess_cell_type("Clothing"), CellValue::from("Clothing"));
    }

    #[test]
    fn mixed_int_float_columns_become_float() {
        let text = "price,quantity\n10,1\n10.5,2\n";
        let table = load_csv_str(text, &ColumnMapping::default()).unwrap();
        let prices: Vec<_> = table.column_values("price").cloned().collect();
        assert_eq!(prices, vec![CellValue::Float(10.0), CellValue::Float(10.5)]);
        let quantities: Vec<_> = table.column_values("quantity").cloned().collect();
        assert_eq!(quantities, vec![CellValue::Integer(1), CellValue::Integer(2)]);
    }

    #[test]
    fn spend_is_derived_only_when_missing() {
        let text = "price,quantity\n10,3\nabc,2\n";
        let table = load_csv_str(text, &ColumnMapping::default()).unwrap();
        assert_eq!(table.columns(), &["price", "quantity", "total_spend"]);
        let spend: Vec<_> = table.column_values("total_spend").cloned().collect();
        assert_eq!(spend, vec![CellValue::Float(30.0), CellValue::Null]);

        let text = "price,quantity,total_spend\n10,3,1\n";
        let table = load_csv_str(text, &ColumnMapping::default()).unwrap();
        let spend: Vec<_> = table.column_values("total_spend").cloned().collect();
        assert_eq!(spend, vec![CellValue::Integer(1)]);
    }
}
