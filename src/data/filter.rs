use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::model::{Field, FlightRecord, RecordSet};
use crate::error::CriteriaError;

// ---------------------------------------------------------------------------
// Filter criteria
// ---------------------------------------------------------------------------

/// Airline constraint: every carrier, or exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AirlineFilter {
    #[default]
    All,
    Exact(String),
}

impl AirlineFilter {
    /// Sentinel spellings accepted for "every airline".
    pub const ALL_SENTINELS: [&'static str; 2] = ["all", "Todas"];

    pub fn matches(&self, airline: &str) -> bool {
        match self {
            AirlineFilter::All => true,
            AirlineFilter::Exact(name) => name == airline,
        }
    }
}

impl FromStr for AirlineFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::ALL_SENTINELS.contains(&s) {
            Ok(AirlineFilter::All)
        } else {
            Ok(AirlineFilter::Exact(s.to_string()))
        }
    }
}

impl fmt::Display for AirlineFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AirlineFilter::All => write!(f, "all"),
            AirlineFilter::Exact(name) => write!(f, "{name}"),
        }
    }
}

/// The user-selected constraints. All three predicates are ANDed.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub airline: AirlineFilter,
    /// Selected cabin classes. Empty means nothing passes, not "all".
    pub classes: BTreeSet<String>,
    /// Inclusive upper price bound in USD.
    pub max_price: f64,
}

impl FilterCriteria {
    /// The initial selection: every airline, every class, and a price ceiling
    /// at the dataset maximum rounded up to a whole dollar.
    pub fn defaults_for(records: &RecordSet) -> Self {
        Self {
            airline: AirlineFilter::All,
            classes: records.distinct_values(Field::Class),
            max_price: records
                .price_bounds()
                .map(|(_, hi)| hi.ceil())
                .unwrap_or(0.0),
        }
    }

    /// Check the criteria against the dataset's domain.
    ///
    /// An airline that matches nothing is accepted (it simply yields an
    /// empty view); an unknown class or a non-finite / negative price bound
    /// is not.
    pub fn validate(&self, records: &RecordSet) -> Result<(), CriteriaError> {
        if !self.max_price.is_finite() || self.max_price < 0.0 {
            return Err(CriteriaError::InvalidMaxPrice(self.max_price));
        }
        if let Some(unknown) = self
            .classes
            .iter()
            .find(|c| !records.contains_value(Field::Class, c))
        {
            return Err(CriteriaError::UnknownClass(unknown.clone()));
        }
        Ok(())
    }

    /// Whether a single record passes all predicates.
    pub fn accepts(&self, record: &FlightRecord) -> bool {
        self.airline.matches(&record.airline)
            && self.classes.contains(&record.class)
            && record.price <= self.max_price
    }
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// Records of a [`RecordSet`] that passed a [`FilterCriteria`], in source
/// order. Borrows the records; never owns or copies them.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    source: &'a RecordSet,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// A view over every record of `source`.
    pub fn all(source: &'a RecordSet) -> Self {
        Self {
            source,
            indices: (0..source.len()).collect(),
        }
    }

    /// Positions of the selected records in the source set.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a FlightRecord> + '_ {
        let records = self.source.records();
        self.indices.iter().filter_map(move |&i| records.get(i))
    }

    pub fn source(&self) -> &'a RecordSet {
        self.source
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Return the view of records passing `criteria`.
///
/// Pure and stable: the relative order of `records` is preserved and the
/// input is never touched. Criteria that match nothing give an empty view.
pub fn apply<'a>(records: &'a RecordSet, criteria: &FilterCriteria) -> FilteredView<'a> {
    let indices = records
        .records()
        .iter()
        .enumerate()
        .filter(|(_, rec)| criteria.accepts(rec))
        .map(|(i, _)| i)
        .collect();
    FilteredView {
        source: records,
        indices,
    }
}
