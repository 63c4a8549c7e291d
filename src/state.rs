use log::{debug, warn};

use crate::data::filter::{apply, AirlineFilter, FilterCriteria, FilteredView};
use crate::data::model::{Field, RecordSet};
use crate::error::{DashError, Result};
use crate::report::DashboardReport;

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// One session's constraint cycle, independent of rendering.
///
/// Holds the current criteria and the view derived from them. Every accepted
/// change re-derives the view from the full record set; a rejected change
/// leaves both untouched.
#[derive(Debug, Clone)]
pub struct DashboardState<'a> {
    records: &'a RecordSet,

    /// Last accepted criteria.
    criteria: FilterCriteria,

    /// Flights passing `criteria`.
    view: FilteredView<'a>,

    /// Reason the last update was refused, cleared on the next success.
    pub status_message: Option<String>,
}

impl<'a> DashboardState<'a> {
    /// Start with every airline, every class and the full price range.
    pub fn new(records: &'a RecordSet) -> Self {
        let criteria = FilterCriteria::defaults_for(records);
        let view = apply(records, &criteria);
        Self {
            records,
            criteria,
            view,
            status_message: None,
        }
    }

    pub fn records(&self) -> &'a RecordSet {
        self.records
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn view(&self) -> &FilteredView<'a> {
        &self.view
    }

    /// Replace the criteria after validating them against the dataset.
    ///
    /// On [`DashError::InvalidCriteria`] the previous criteria and view are
    /// kept and the reason is stored in `status_message`.
    pub fn set_criteria(&mut self, criteria: FilterCriteria) -> Result<()> {
        if let Err(err) = criteria.validate(self.records) {
            warn!("rejecting criteria update: {err}");
            self.status_message = Some(err.to_string());
            return Err(DashError::InvalidCriteria(err));
        }
        self.criteria = criteria;
        self.status_message = None;
        self.refilter();
        Ok(())
    }

    pub fn set_airline(&mut self, airline: AirlineFilter) -> Result<()> {
        let mut next = self.criteria.clone();
        next.airline = airline;
        self.set_criteria(next)
    }

    pub fn set_max_price(&mut self, max_price: f64) -> Result<()> {
        let mut next = self.criteria.clone();
        next.max_price = max_price;
        self.set_criteria(next)
    }

    /// Toggle a single cabin class in the selection.
    pub fn toggle_class(&mut self, class: &str) -> Result<()> {
        let mut next = self.criteria.clone();
        if !next.classes.remove(class) {
            next.classes.insert(class.to_string());
        }
        self.set_criteria(next)
    }

    /// Select every class present in the dataset.
    pub fn select_all_classes(&mut self) {
        self.criteria.classes = self.records.distinct_values(Field::Class);
        self.status_message = None;
        self.refilter();
    }

    /// Deselect every class; the view becomes empty.
    pub fn select_no_classes(&mut self) {
        self.criteria.classes.clear();
        self.status_message = None;
        self.refilter();
    }

    /// Aggregate the current view for the presentation layer.
    pub fn report(&self, histogram_buckets: usize, preview_rows: usize) -> DashboardReport {
        let mut report =
            DashboardReport::build(&self.criteria, &self.view, histogram_buckets, preview_rows);
        report.status = self.status_message.clone();
        report
    }

    fn refilter(&mut self) {
        self.view = apply(self.records, &self.criteria);
        debug!(
            "criteria [{}] kept {} of {} flights",
            DisplayCriteria(&self.criteria),
            self.view.len(),
            self.records.len()
        );
    }
}

struct DisplayCriteria<'c>(&'c FilterCriteria);

impl std::fmt::Display for DisplayCriteria<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = self.0;
        let classes: Vec<&str> = c.classes.iter().map(String::as_str).collect();
        write!(
            f,
            "airline={} classes={{{}}} max_price={}",
            c.airline,
            classes.join(","),
            c.max_price
        )
    }
}
