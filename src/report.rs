use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::data::aggregate::{
    by_airline_mean_price, duration_histogram_buckets, price_distribution_by_class,
    stops_distribution, summarize, AirlinePrice, HistogramBucket, SummaryMetrics,
};
use crate::data::filter::{FilterCriteria, FilteredView};

// ---------------------------------------------------------------------------
// Dashboard snapshot
// ---------------------------------------------------------------------------

/// The criteria a report was derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriteriaSnapshot {
    pub airline: String,
    pub classes: Vec<String>,
    pub max_price: f64,
}

/// Leading rows of the filtered view, every column rendered as text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Everything one re-derivation pass hands to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub criteria: CriteriaSnapshot,
    pub summary: SummaryMetrics,
    pub duration_histogram: Vec<HistogramBucket>,
    pub price_by_class: BTreeMap<String, Vec<f64>>,
    pub airline_mean_price: BTreeMap<String, AirlinePrice>,
    pub stops: BTreeMap<String, usize>,
    pub preview: PreviewTable,
    /// Why the last criteria update was refused, if it was.
    pub status: Option<String>,
}

impl DashboardReport {
    pub fn build(
        criteria: &FilterCriteria,
        view: &FilteredView<'_>,
        histogram_buckets: usize,
        preview_rows: usize,
    ) -> Self {
        let columns = view.source().column_names().to_vec();
        let rows = view
            .iter()
            .take(preview_rows)
            .map(|rec| columns.iter().map(|c| rec.cell(c)).collect())
            .collect();

        Self {
            criteria: CriteriaSnapshot {
                airline: criteria.airline.to_string(),
                classes: criteria.classes.iter().cloned().collect(),
                max_price: criteria.max_price,
            },
            summary: summarize(view),
            duration_histogram: duration_histogram_buckets(view, histogram_buckets),
            price_by_class: price_distribution_by_class(view),
            airline_mean_price: by_airline_mean_price(view),
            stops: stops_distribution(view),
            preview: PreviewTable { columns, rows },
            status: None,
        }
    }

    /// Pretty JSON. Undefined means are written as `null`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// ---------------------------------------------------------------------------
// Plain text rendering
// ---------------------------------------------------------------------------

const BAR_WIDTH: usize = 40;

fn bar(value: f64, max: f64) -> String {
    if max.is_nan() || max <= 0.0 || !value.is_finite() {
        return String::new();
    }
    "#".repeat(((value / max) * BAR_WIDTH as f64).round() as usize)
}

impl fmt::Display for DashboardReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.criteria;
        writeln!(
            f,
            "Filters: airline={} classes=[{}] max_price={}",
            c.airline,
            c.classes.join(", "),
            c.max_price
        )?;
        if let Some(status) = &self.status {
            writeln!(f, "Filters rejected, showing previous view: {status}")?;
        }
        writeln!(f)?;

        let s = &self.summary;
        writeln!(f, "Total flights        {}", s.count)?;
        writeln!(f, "Mean price (USD)     {:.2}", s.mean_price)?;
        writeln!(f, "Mean duration (h)    {:.2}", s.mean_duration)?;
        if !s.has_data() {
            writeln!(f, "(no flights match the current filters)")?;
        }

        writeln!(f)?;
        writeln!(f, "Flight duration distribution (h)")?;
        let top = self
            .duration_histogram
            .iter()
            .map(|b| b.count)
            .max()
            .unwrap_or(0) as f64;
        for b in &self.duration_histogram {
            writeln!(
                f,
                "  {:>7.2} - {:<7.2} {:>7} {}",
                b.start,
                b.end,
                b.count,
                bar(b.count as f64, top)
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Prices by class")?;
        for (class, prices) in &self.price_by_class {
            let lo = prices.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            writeln!(f, "  {class:<12} n={:<7} min={lo:.2} max={hi:.2}", prices.len())?;
        }

        writeln!(f)?;
        writeln!(f, "Mean price by airline")?;
        let mut airlines: Vec<(&String, &AirlinePrice)> = self.airline_mean_price.iter().collect();
        airlines.sort_by(|a, b| b.1.mean_price.total_cmp(&a.1.mean_price));
        let top = airlines.first().map(|(_, g)| g.mean_price).unwrap_or(0.0);
        for (airline, group) in airlines {
            writeln!(
                f,
                "  {airline:<12} {:>10.2} {}",
                group.mean_price,
                bar(group.mean_price, top)
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Flights by number of stops")?;
        let total: usize = self.stops.values().sum();
        for (stops, count) in &self.stops {
            let share = 100.0 * *count as f64 / total as f64;
            writeln!(f, "  {stops:<12} {count:>7} ({share:.1}%)")?;
        }

        if !self.preview.rows.is_empty() {
            writeln!(f)?;
            writeln!(f, "Filtered data (first {} rows)", self.preview.rows.len())?;
            writeln!(f, "  {}", self.preview.columns.join(" | "))?;
            for row in &self.preview.rows {
                writeln!(f, "  {}", row.join(" | "))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::apply;
    use crate::data::model::{FlightRecord, RecordSet};

    fn flights() -> RecordSet {
        RecordSet::from_records(vec![
            FlightRecord::new("A", "Economy", 100.0, 2.0, "0"),
            FlightRecord::new("B", "Business", 500.0, 5.0, "1"),
        ])
    }

    #[test]
    fn report_collects_every_aggregate() {
        let set = flights();
        let criteria = FilterCriteria::defaults_for(&set);
        let report = DashboardReport::build(&criteria, &apply(&set, &criteria), 50, 1);

        assert_eq!(report.summary.count, 2);
        assert_eq!(report.duration_histogram.len(), 50);
        assert_eq!(report.airline_mean_price.len(), 2);
        assert_eq!(report.stops.values().sum::<usize>(), 2);
        assert_eq!(report.preview.rows, vec![vec!["A", "Economy", "100", "2", "0"]]);
        assert!(report.to_string().contains("Total flights        2"));
    }

    #[test]
    fn bars_skip_degenerate_scales() {
        assert_eq!(bar(10.0, 10.0).len(), BAR_WIDTH);
        assert_eq!(bar(5.0, 10.0).len(), BAR_WIDTH / 2);
        assert!(bar(1.0, 0.0).is_empty());
        assert!(bar(1.0, f64::NAN).is_empty());
        assert!(bar(f64::NAN, 10.0).is_empty());
    }

    #[test]
    fn empty_view_serialises_nan_as_null() {
        let set = flights();
        let mut criteria = FilterCriteria::defaults_for(&set);
        criteria.max_price = 1.0;
        let report = DashboardReport::build(&criteria, &apply(&set, &criteria), 50, 10);

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["summary"]["count"], 0);
        assert!(json["summary"]["mean_price"].is_null());
        assert!(report.to_string().contains("NaN"));
        assert!(report.duration_histogram.is_empty());
    }
}
