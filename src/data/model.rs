use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

/// Columns every flight dataset must carry.
pub const REQUIRED_COLUMNS: [&str; 5] = ["airline", "class", "price", "duration", "stops"];

/// Positional column written by dataframe exports, dropped on load.
pub const INDEX_COLUMN: &str = "index";

// ---------------------------------------------------------------------------
// FieldValue – a single pass-through cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell for the descriptive columns the pipeline does not
/// interpret (flight code, cities, departure slot, days left, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{s}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Null => write!(f, "<null>"),
        }
    }
}

impl FieldValue {
    /// Infer the narrowest type for a raw text cell.
    pub fn guess(s: &str) -> Self {
        if s.is_empty() {
            return FieldValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return FieldValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return FieldValue::Float(f);
        }
        if s == "true" || s == "false" {
            return FieldValue::Bool(s == "true");
        }
        FieldValue::String(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// FlightRecord – one row of the dataset
// ---------------------------------------------------------------------------

/// A single flight offer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightRecord {
    /// Carrier name.
    pub airline: String,
    /// Cabin class, e.g. `Economy` or `Business`.
    pub class: String,
    /// Ticket price in USD.
    pub price: f64,
    /// Flight duration in hours.
    pub duration: f64,
    /// Number of layovers as written in the source (`zero`, `1`, ...).
    pub stops: String,
    /// Remaining columns, untouched: column_name → value.
    #[serde(flatten)]
    pub extra: BTreeMap<String, FieldValue>,
}

impl FlightRecord {
    /// Convenience constructor with no pass-through columns.
    pub fn new(
        airline: impl Into<String>,
        class: impl Into<String>,
        price: f64,
        duration: f64,
        stops: impl Into<String>,
    ) -> Self {
        Self {
            airline: airline.into(),
            class: class.into(),
            price,
            duration,
            stops: stops.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Text value of a categorical field.
    pub fn category(&self, field: Field) -> &str {
        match field {
            Field::Airline => &self.airline,
            Field::Class => &self.class,
            Field::Stops => &self.stops,
        }
    }

    /// Render any column (typed or pass-through) for tabular display.
    pub fn cell(&self, column: &str) -> String {
        match column {
            "airline" => self.airline.clone(),
            "class" => self.class.clone(),
            "price" => self.price.to_string(),
            "duration" => self.duration.to_string(),
            "stops" => self.stops.clone(),
            other => self
                .extra
                .get(other)
                .map(|v| v.to_string())
                .unwrap_or_default(),
        }
    }
}

/// Categorical columns that can be queried for their distinct values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Airline,
    Class,
    Stops,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Airline, Field::Class, Field::Stops];

    pub fn column_name(self) -> &'static str {
        match self {
            Field::Airline => "airline",
            Field::Class => "class",
            Field::Stops => "stops",
        }
    }
}

// ---------------------------------------------------------------------------
// RecordSet – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The canonical, immutable record collection with pre-computed category
/// indices. Record order is the input file order.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<FlightRecord>,
    /// Column names in source order, `index` excluded.
    column_names: Vec<String>,
    distinct: BTreeMap<&'static str, BTreeSet<String>>,
}

impl RecordSet {
    /// Build category indices from the loaded records.
    ///
    /// `column_names` is the header as found in the source; an `index`
    /// column is filtered out here as well so callers cannot leak it.
    pub fn new(records: Vec<FlightRecord>, column_names: Vec<String>) -> Self {
        let mut distinct: BTreeMap<&'static str, BTreeSet<String>> = BTreeMap::new();
        for rec in &records {
            for field in Field::ALL {
                distinct
                    .entry(field.column_name())
                    .or_default()
                    .insert(rec.category(field).to_string());
            }
        }
        let column_names = column_names
            .into_iter()
            .filter(|c| c != INDEX_COLUMN)
            .collect();
        RecordSet {
            records,
            column_names,
            distinct,
        }
    }

    /// Build a record set with only the required columns, mostly for tests
    /// and in-memory callers.
    pub fn from_records(records: Vec<FlightRecord>) -> Self {
        let columns = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
        Self::new(records, columns)
    }

    pub fn records(&self) -> &[FlightRecord] {
        &self.records
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Sorted distinct values observed for a categorical field.
    pub fn distinct_values(&self, field: Field) -> BTreeSet<String> {
        self.distinct
            .get(field.column_name())
            .cloned()
            .unwrap_or_default()
    }

    /// Whether `value` occurs in `field` anywhere in the dataset.
    pub fn contains_value(&self, field: Field, value: &str) -> bool {
        self.distinct
            .get(field.column_name())
            .is_some_and(|vals| vals.contains(value))
    }

    /// Smallest and largest price, `None` on an empty set.
    pub fn price_bounds(&self) -> Option<(f64, f64)> {
        let mut prices = self.records.iter().map(|r| r.price);
        let first = prices.next()?;
        Some(prices.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
