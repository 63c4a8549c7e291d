use std::io::Write;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field as ArrowField, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use tempfile::NamedTempFile;

use flight_dash::data::aggregate::{
    by_airline_mean_price, duration_histogram_buckets, stops_distribution, summarize,
};
use flight_dash::{apply, DashError, FilterCriteria, RecordStore};

const TWO_FLIGHTS: &str = "\
index,airline,class,price,duration,stops
0,A,Economy,100,2,0
1,B,Business,500,5,1
";

fn csv_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn criteria(airline: &str, classes: &[&str], max_price: f64) -> FilterCriteria {
    FilterCriteria {
        airline: airline.parse().unwrap(),
        classes: classes.iter().map(|c| c.to_string()).collect(),
        max_price,
    }
}

#[test]
fn all_flights_pass_wide_criteria() {
    let file = csv_file(TWO_FLIGHTS);
    let store = RecordStore::new(file.path());
    let records = store.load().unwrap();

    let view = apply(records, &criteria("all", &["Economy", "Business"], 1000.0));
    assert_eq!(view.len(), 2);

    let m = summarize(&view);
    assert_eq!(m.count, 2);
    assert_eq!(m.mean_price, 300.0);
    assert_eq!(m.mean_duration, 3.5);
}

#[test]
fn class_narrows_view() {
    let file = csv_file(TWO_FLIGHTS);
    let store = RecordStore::new(file.path());
    let records = store.load().unwrap();

    let view = apply(records, &criteria("all", &["Economy"], 1000.0));
    let airlines: Vec<&str> = view.iter().map(|r| r.airline.as_str()).collect();
    assert_eq!(airlines, vec!["A"]);
    assert_eq!(summarize(&view).mean_price, 100.0);
}

#[test]
fn unmatched_airline_is_empty_not_an_error() {
    let file = csv_file(TWO_FLIGHTS);
    let store = RecordStore::new(file.path());
    let records = store.load().unwrap();

    let c = criteria("Z", &["Economy", "Business"], 1000.0);
    assert!(c.validate(records).is_ok());
    let view = apply(records, &c);
    assert!(view.is_empty());

    let m = summarize(&view);
    assert_eq!(m.count, 0);
    assert!(m.mean_price.is_nan());
    assert!(by_airline_mean_price(&view).is_empty());
    assert!(stops_distribution(&view).is_empty());
    assert!(duration_histogram_buckets(&view, 50).is_empty());
}

#[test]
fn max_price_boundary_is_inclusive() {
    let file = csv_file(TWO_FLIGHTS);
    let store = RecordStore::new(file.path());
    let records = store.load().unwrap();

    let view = apply(records, &criteria("all", &["Economy", "Business"], 100.0));
    let prices: Vec<f64> = view.iter().map(|r| r.price).collect();
    assert_eq!(prices, vec![100.0]);
}

#[test]
fn store_loads_once() {
    let file = csv_file(TWO_FLIGHTS);
    let store = RecordStore::new(file.path());
    assert!(!store.is_loaded());

    let first = store.load().unwrap();
    assert!(store.is_loaded());
    // the source disappearing no longer matters once cached
    std::fs::remove_file(file.path()).unwrap();
    let second = store.load().unwrap();
    assert!(std::ptr::eq(first, second));
    assert!(!first.column_names().iter().any(|c| c == "index"));
}

#[test]
fn malformed_source_is_data_unavailable() {
    let file = csv_file("airline,class,price,duration,stops\nA,Economy,abc,2,0\n");
    let store = RecordStore::new(file.path());
    let err = store.load().unwrap_err();
    assert!(matches!(err, DashError::DataUnavailable { .. }));
    assert!(err.to_string().contains("abc"));
}

#[test]
fn view_is_stable_subsequence_of_source() {
    let file = csv_file(
        "airline,class,price,duration,stops\n\
         A,Economy,300,2,0\n\
         B,Economy,100,3,1\n\
         A,Business,900,4,1\n\
         C,Economy,50,1.5,0\n\
         A,Economy,120,2.5,2\n",
    );
    let store = RecordStore::new(file.path());
    let records = store.load().unwrap();

    let view = apply(records, &criteria("A", &["Economy", "Business"], 500.0));
    assert_eq!(view.indices(), &[0, 4]);
    assert!(view.indices().windows(2).all(|w| w[0] < w[1]));

    let groups = by_airline_mean_price(&view);
    assert_eq!(
        groups.values().map(|g| g.count).sum::<usize>(),
        summarize(&view).count
    );

    let all = apply(records, &FilterCriteria::defaults_for(records));
    let buckets = duration_histogram_buckets(&all, 50);
    assert!(buckets.len() <= 50);
    assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), all.len());
}

#[test]
fn json_source() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(
        br#"[
            {"airline": "A", "class": "Economy", "price": 100, "duration": 2, "stops": "zero"},
            {"airline": "B", "class": "Business", "price": 500, "duration": 5, "stops": "one"}
        ]"#,
    )
    .unwrap();
    let store = RecordStore::new(file.path());
    let records = store.load().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(summarize(&apply(records, &FilterCriteria::defaults_for(records))).mean_price, 300.0);
}

#[test]
fn parquet_source() {
    let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();

    let schema = Arc::new(Schema::new(vec![
        ArrowField::new("index", DataType::Int64, false),
        ArrowField::new("airline", DataType::Utf8, false),
        ArrowField::new("class", DataType::Utf8, false),
        ArrowField::new("price", DataType::Int64, false),
        ArrowField::new("duration", DataType::Float64, false),
        ArrowField::new("stops", DataType::Utf8, false),
        ArrowField::new("days_left", DataType::Int64, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(vec![0, 1])),
        Arc::new(StringArray::from(vec!["A", "B"])),
        Arc::new(StringArray::from(vec!["Economy", "Business"])),
        Arc::new(Int64Array::from(vec![100, 500])),
        Arc::new(Float64Array::from(vec![2.0, 5.0])),
        Arc::new(StringArray::from(vec!["zero", "one"])),
        Arc::new(Int64Array::from(vec![1, 30])),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
    let mut writer = ArrowWriter::try_new(std::fs::File::create(file.path()).unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let store = RecordStore::new(file.path());
    let records = store.load().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(
        records.column_names(),
        &["airline", "class", "price", "duration", "stops", "days_left"]
    );
    let view = apply(records, &criteria("B", &["Business"], 500.0));
    assert_eq!(view.len(), 1);
    assert_eq!(summarize(&view).mean_duration, 5.0);
}
