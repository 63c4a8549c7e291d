use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray,
    StringArray,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{FieldValue, FlightRecord, RecordSet, INDEX_COLUMN, REQUIRED_COLUMNS};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a flight dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with at least `airline, class, price, duration, stops`
/// * `.json`    – `[{ "airline": "...", "class": "...", "price": 1.0, ... }, ...]`
/// * `.parquet` – one column per field, as written by Pandas or Polars
///
/// A positional `index` column is dropped in every format. Any row missing a
/// required field, or carrying a negative / non-numeric price or duration,
/// fails the whole load.
pub fn load_file(path: &Path) -> Result<RecordSet> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let started = Instant::now();
    let set = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }?;
    info!(
        "loaded {} flights from {} in {:?}",
        set.len(),
        path.display(),
        started.elapsed()
    );
    Ok(set)
}

fn check_required(columns: &[String]) -> Result<()> {
    for required in REQUIRED_COLUMNS {
        if !columns.iter().any(|c| c == required) {
            bail!("missing required column '{required}'");
        }
    }
    if columns.iter().any(|c| c == INDEX_COLUMN) {
        debug!("dropping positional '{INDEX_COLUMN}' column");
    }
    Ok(())
}

fn check_amount(value: f64, row: usize, col: &str) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        bail!("Row {row}: '{col}' must be a non-negative number, got {value}");
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one flight per line.
/// Columns other than the five typed ones are kept as pass-through fields.
fn load_csv(path: &Path) -> Result<RecordSet> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(reader)
}

/// Parse CSV from any reader; shared by the file loader and in-memory callers.
pub fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<RecordSet> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    check_required(&headers)?;

    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("CSV missing '{name}' column"))
    };
    let airline_idx = position("airline")?;
    let class_idx = position("class")?;
    let price_idx = position("price")?;
    let duration_idx = position("duration")?;
    let stops_idx = position("stops")?;
    let typed = [airline_idx, class_idx, price_idx, duration_idx, stops_idx];

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;

        let text = |idx: usize, col: &str| -> Result<String> {
            match row.get(idx) {
                Some(s) if !s.is_empty() => Ok(s.to_string()),
                _ => bail!("Row {row_no}: missing '{col}'"),
            }
        };
        let number = |idx: usize, col: &str| -> Result<f64> {
            let raw = text(idx, col)?;
            let value = raw
                .parse::<f64>()
                .with_context(|| format!("Row {row_no}, {col}: '{raw}' is not a number"))?;
            check_amount(value, row_no, col)
        };

        let mut extra = BTreeMap::new();
        for (col_idx, value) in row.iter().enumerate() {
            if typed.contains(&col_idx) {
                continue;
            }
            let Some(col_name) = headers.get(col_idx) else {
                continue;
            };
            if col_name == INDEX_COLUMN {
                continue;
            }
            extra.insert(col_name.clone(), FieldValue::guess(value));
        }

        records.push(FlightRecord {
            airline: text(airline_idx, "airline")?,
            class: text(class_idx, "class")?,
            price: number(price_idx, "price")?,
            duration: number(duration_idx, "duration")?,
            stops: text(stops_idx, "stops")?,
            extra,
        });
    }

    Ok(RecordSet::new(records, headers))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "airline": "SpiceJet", "class": "Economy", "price": 5953,
///     "duration": 2.17, "stops": "zero", "source_city": "Delhi" },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<RecordSet> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

fn parse_json(text: &str) -> Result<RecordSet> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }

        let text = |col: &str| -> Result<String> {
            match obj.get(col) {
                Some(JsonValue::String(s)) if !s.is_empty() => Ok(s.clone()),
                Some(JsonValue::Number(n)) => Ok(n.to_string()),
                _ => bail!("Row {i}: missing or invalid '{col}'"),
            }
        };
        let number = |col: &str| -> Result<f64> {
            let value = obj
                .get(col)
                .and_then(JsonValue::as_f64)
                .with_context(|| format!("Row {i}: missing or non-numeric '{col}'"))?;
            check_amount(value, i, col)
        };

        let extra = obj
            .iter()
            .filter(|(key, _)| {
                key.as_str() != INDEX_COLUMN && !REQUIRED_COLUMNS.contains(&key.as_str())
            })
            .map(|(key, val)| (key.clone(), json_to_field(val)))
            .collect();

        records.push(FlightRecord {
            airline: text("airline")?,
            class: text("class")?,
            price: number("price")?,
            duration: number("duration")?,
            stops: text("stops")?,
            extra,
        });
    }

    if !records.is_empty() {
        check_required(&columns)?;
    }
    Ok(RecordSet::new(records, columns))
}

fn json_to_field(val: &JsonValue) -> FieldValue {
    match val {
        JsonValue::String(s) => FieldValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                FieldValue::Float(f)
            } else {
                FieldValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => FieldValue::Bool(*b),
        JsonValue::Null => FieldValue::Null,
        other => FieldValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing one column per flight field.
///
/// `airline`, `class` and `stops` may be Utf8 or LargeUtf8 (`stops` may also
/// be an integer column); `price` and `duration` may be any float or integer
/// type. Works with files written by both **Pandas** and **Polars**.
fn load_parquet(path: &Path) -> Result<RecordSet> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    check_required(&columns)?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let airline_col = column_of(&batch, "airline")?;
        let class_col = column_of(&batch, "class")?;
        let price_col = column_of(&batch, "price")?;
        let duration_col = column_of(&batch, "duration")?;
        let stops_col = column_of(&batch, "stops")?;

        let extra_cols: Vec<(usize, String)> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, f)| {
                f.name() != INDEX_COLUMN && !REQUIRED_COLUMNS.contains(&f.name().as_str())
            })
            .map(|(i, f)| (i, f.name().clone()))
            .collect();

        for row in 0..batch.num_rows() {
            let row_no = records.len();
            let price = extract_f64(price_col, row)
                .with_context(|| format!("Row {row_no}: failed to read 'price'"))?;
            let duration = extract_f64(duration_col, row)
                .with_context(|| format!("Row {row_no}: failed to read 'duration'"))?;

            let mut extra = BTreeMap::new();
            for (col_idx, col_name) in &extra_cols {
                extra.insert(
                    col_name.clone(),
                    extract_field_value(batch.column(*col_idx), row),
                );
            }

            records.push(FlightRecord {
                airline: extract_text(airline_col, row)
                    .with_context(|| format!("Row {row_no}: failed to read 'airline'"))?,
                class: extract_text(class_col, row)
                    .with_context(|| format!("Row {row_no}: failed to read 'class'"))?,
                price: check_amount(price, row_no, "price")?,
                duration: check_amount(duration, row_no, "duration")?,
                stops: extract_text(stops_col, row)
                    .with_context(|| format!("Row {row_no}: failed to read 'stops'"))?,
                extra,
            });
        }
    }

    Ok(RecordSet::new(records, columns))
}

// -- Parquet / Arrow helpers --

fn column_of<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))?;
    Ok(batch.column(idx))
}

fn downcast<'a, T: 'static>(col: &'a Arc<dyn Array>) -> Result<&'a T> {
    col.as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("unexpected array layout for {:?}", col.data_type()))
}

/// Read a non-null categorical cell as text.
fn extract_text(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null value in required column");
    }
    let text = match col.data_type() {
        DataType::Utf8 => downcast::<StringArray>(col)?.value(row).to_string(),
        DataType::LargeUtf8 => downcast::<LargeStringArray>(col)?.value(row).to_string(),
        DataType::Int32 => downcast::<Int32Array>(col)?.value(row).to_string(),
        DataType::Int64 => downcast::<Int64Array>(col)?.value(row).to_string(),
        other => bail!("Expected a string column, got {other:?}"),
    };
    if text.is_empty() {
        bail!("empty value in required column");
    }
    Ok(text)
}

/// Read a non-null numeric cell as `f64`.
fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<f64> {
    if col.is_null(row) {
        bail!("null value in required column");
    }
    Ok(match col.data_type() {
        DataType::Float64 => downcast::<Float64Array>(col)?.value(row),
        DataType::Float32 => downcast::<Float32Array>(col)?.value(row) as f64,
        DataType::Int64 => downcast::<Int64Array>(col)?.value(row) as f64,
        DataType::Int32 => downcast::<Int32Array>(col)?.value(row) as f64,
        other => bail!("Expected a numeric column, got {other:?}"),
    })
}

/// Extract a single pass-through value from an Arrow column at a given row.
fn extract_field_value(col: &Arc<dyn Array>, row: usize) -> FieldValue {
    if col.is_null(row) {
        return FieldValue::Null;
    }
    let value = match col.data_type() {
        DataType::Utf8 => downcast::<StringArray>(col).map(|a| FieldValue::String(a.value(row).into())),
        DataType::LargeUtf8 => {
            downcast::<LargeStringArray>(col).map(|a| FieldValue::String(a.value(row).into()))
        }
        DataType::Int32 => downcast::<Int32Array>(col).map(|a| FieldValue::Integer(a.value(row) as i64)),
        DataType::Int64 => downcast::<Int64Array>(col).map(|a| FieldValue::Integer(a.value(row))),
        DataType::Float32 => downcast::<Float32Array>(col).map(|a| FieldValue::Float(a.value(row) as f64)),
        DataType::Float64 => downcast::<Float64Array>(col).map(|a| FieldValue::Float(a.value(row))),
        DataType::Boolean => downcast::<BooleanArray>(col).map(|a| FieldValue::Bool(a.value(row))),
        other => return FieldValue::String(format!("{other:?}")),
    };
    value.unwrap_or(FieldValue::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv_reader(text: &str) -> csv::Reader<&[u8]> {
        csv::Reader::from_reader(text.as_bytes())
    }

    #[test]
    fn csv_drops_index_and_keeps_extra_columns() {
        let set = read_csv(csv_reader(
            "index,airline,flight,class,price,duration,stops\n\
             0,SpiceJet,SG-8709,Economy,5953,2.17,zero\n\
             1,Vistara,UK-995,Business,42000,10.5,one\n",
        ))
        .unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(
            set.column_names(),
            &["airline", "flight", "class", "price", "duration", "stops"]
        );
        let first = &set.records()[0];
        assert_eq!(first.airline, "SpiceJet");
        assert_eq!(first.price, 5953.0);
        assert_eq!(first.stops, "zero");
        assert!(!first.extra.contains_key("index"));
        assert_eq!(
            first.extra.get("flight"),
            Some(&FieldValue::String("SG-8709".into()))
        );
    }

    #[test]
    fn csv_without_index_is_accepted() {
        let set = read_csv(csv_reader(
            "airline,class,price,duration,stops\nA,Economy,100,2,0\n",
        ))
        .unwrap();
        assert_eq!(set.records()[0].stops, "0");
        assert!(set.records()[0].extra.is_empty());
    }

    #[test]
    fn csv_missing_column_fails() {
        let err = read_csv(csv_reader("airline,class,price,stops\nA,Economy,1,0\n")).unwrap_err();
        assert!(err.to_string().contains("duration"));
    }

    #[test]
    fn csv_malformed_rows_fail() {
        assert!(read_csv(csv_reader(
            "airline,class,price,duration,stops\nA,Economy,cheap,2,0\n"
        ))
        .is_err());
        assert!(read_csv(csv_reader(
            "airline,class,price,duration,stops\nA,,100,2,0\n"
        ))
        .is_err());
        assert!(read_csv(csv_reader(
            "airline,class,price,duration,stops\nA,Economy,-5,2,0\n"
        ))
        .is_err());
    }

    #[test]
    fn json_records() {
        let set = parse_json(
            r#"[
                {"index": 0, "airline": "A", "class": "Economy", "price": 100, "duration": 2.5, "stops": 0, "days_left": 1},
                {"index": 1, "airline": "B", "class": "Business", "price": 500.0, "duration": 5, "stops": "one", "days_left": 3}
            ]"#,
        )
        .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.column_names(),
            &["airline", "class", "price", "duration", "stops", "days_left"]
        );
        assert_eq!(set.records()[0].stops, "0");
        assert_eq!(set.records()[1].price, 500.0);
        assert_eq!(
            set.records()[1].extra.get("days_left"),
            Some(&FieldValue::Integer(3))
        );
    }

    #[test]
    fn json_keeps_source_column_order() {
        let set = parse_json(
            r#"[{"stops": "one", "price": 500, "duration": 5, "class": "Business", "airline": "B", "source_city": "Delhi"}]"#,
        )
        .unwrap();
        assert_eq!(
            set.column_names(),
            &["stops", "price", "duration", "class", "airline", "source_city"]
        );
    }

    #[test]
    fn csv_cells_are_not_trimmed() {
        let set = read_csv(csv_reader(
            "airline,class,price,duration,stops,flight
 Vistara,Economy ,100,2,zero,UK 995 
",
        ))
        .unwrap();
        let rec = &set.records()[0];
        assert_eq!(rec.airline, " Vistara");
        assert_eq!(rec.class, "Economy ");
        assert_eq!(rec.extra.get("flight"), Some(&FieldValue::String("UK 995 ".into())));
    }

    #[test]
    fn json_missing_field_fails() {
        assert!(parse_json(r#"[{"airline": "A", "class": "Economy", "price": 1}]"#).is_err());
        assert!(parse_json(r#"{"airline": "A"}"#).is_err());
    }

    #[test]
    fn unsupported_extension() {
        let err = load_file(Path::new("flights.xlsx")).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }
}
