//! Scalar metrics and grouped datasets computed over a [`FilteredView`].
//!
//! Every function here is a pure function of the view it is given. Empty
//! views never fail: counts come back as zero, means as `NaN`, and grouped /
//! bucketed outputs as empty collections.

use std::collections::BTreeMap;

use serde::Serialize;

use super::filter::FilteredView;

/// Default bucket count of the duration histogram.
pub const DEFAULT_HISTOGRAM_BUCKETS: usize = 50;

/// Round to two decimals for display. `NaN` stays `NaN`.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Arithmetic mean; `NaN` for an empty input.
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

// ---------------------------------------------------------------------------
// Summary metrics
// ---------------------------------------------------------------------------

/// Headline figures for the current view.
///
/// Means are rounded to two decimals. On an empty view both means are `NaN`
/// (serialised as `null`), never `0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub count: usize,
    pub mean_price: f64,
    pub mean_duration: f64,
}

impl SummaryMetrics {
    /// `false` when the means are the undefined sentinel.
    pub fn has_data(&self) -> bool {
        self.count > 0
    }
}

pub fn summarize(view: &FilteredView<'_>) -> SummaryMetrics {
    SummaryMetrics {
        count: view.len(),
        mean_price: round2(mean(view.iter().map(|r| r.price))),
        mean_duration: round2(mean(view.iter().map(|r| r.duration))),
    }
}

// ---------------------------------------------------------------------------
// Grouped summaries
// ---------------------------------------------------------------------------

/// Mean price of one airline group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AirlinePrice {
    pub count: usize,
    pub mean_price: f64,
}

/// Mean price per airline. Airlines absent from the view are absent here.
pub fn by_airline_mean_price(view: &FilteredView<'_>) -> BTreeMap<String, AirlinePrice> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for rec in view.iter() {
        let entry = sums.entry(rec.airline.as_str()).or_insert((0.0, 0));
        entry.0 += rec.price;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(airline, (sum, count))| {
            (
                airline.to_string(),
                AirlinePrice {
                    count,
                    mean_price: sum / count as f64,
                },
            )
        })
        .collect()
}

/// Raw prices partitioned by cabin class, each list in view order.
pub fn price_distribution_by_class(view: &FilteredView<'_>) -> BTreeMap<String, Vec<f64>> {
    let mut out: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for rec in view.iter() {
        out.entry(rec.class.clone()).or_default().push(rec.price);
    }
    out
}

/// Number of flights per distinct `stops` value. Not normalised.
pub fn stops_distribution(view: &FilteredView<'_>) -> BTreeMap<String, usize> {
    let mut out: BTreeMap<String, usize> = BTreeMap::new();
    for rec in view.iter() {
        *out.entry(rec.stops.clone()).or_default() += 1;
    }
    out
}

// ---------------------------------------------------------------------------
// Duration histogram
// ---------------------------------------------------------------------------

/// One equal-width histogram bucket. Buckets are half-open `[start, end)`
/// except the last, which also holds `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBucket {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Split `[min(duration), max(duration)]` of the view into `bucket_count`
/// equal-width buckets and count flights per bucket.
///
/// An empty view or a zero bucket count gives no buckets. When every
/// duration is equal a single bucket holds all flights.
pub fn duration_histogram_buckets(
    view: &FilteredView<'_>,
    bucket_count: usize,
) -> Vec<HistogramBucket> {
    if bucket_count == 0 {
        return Vec::new();
    }
    let mut durations = view.iter().map(|r| r.duration);
    let Some(first) = durations.next() else {
        return Vec::new();
    };
    let (lo, hi) = durations.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));

    if hi <= lo {
        return vec![HistogramBucket {
            start: lo,
            end: hi,
            count: view.len(),
        }];
    }

    let width = (hi - lo) / bucket_count as f64;
    // edges[i]..edges[i + 1] bounds bucket i; the last edge is exactly `hi`
    let edges: Vec<f64> = (0..bucket_count)
        .map(|i| lo + i as f64 * width)
        .chain(std::iter::once(hi))
        .collect();
    let mut buckets: Vec<HistogramBucket> = edges
        .windows(2)
        .map(|w| HistogramBucket {
            start: w[0],
            end: w[1],
            count: 0,
        })
        .collect();

    let inner = &edges[1..bucket_count];
    for rec in view.iter() {
        let slot = inner.partition_point(|&edge| edge <= rec.duration);
        buckets[slot].count += 1;
    }
    buckets
}
