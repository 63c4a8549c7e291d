//! Filtering and aggregation over a static flight pricing dataset.
//!
//! A [`RecordStore`] loads the dataset once; each change of
//! [`FilterCriteria`] re-derives a [`FilteredView`] and the aggregates that
//! feed a dashboard. [`DashboardState`] runs that cycle for one session and
//! [`DashboardReport`] snapshots its output for a presentation layer.

pub mod data;
pub mod error;
pub mod report;
pub mod state;

pub use data::filter::{apply, AirlineFilter, FilterCriteria, FilteredView};
pub use data::model::{Field, FieldValue, FlightRecord, RecordSet};
pub use data::store::RecordStore;
pub use error::{CriteriaError, DashError};
pub use report::DashboardReport;
pub use state::DashboardState;
