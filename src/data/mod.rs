/// Data layer: record store, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RecordSet (index column dropped)
///   └──────────┘
///        │
///        ▼
///   ┌─────────────┐
///   │ RecordStore  │  load once, read-only afterwards
///   └─────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  airline / class / max price → FilteredView
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  metrics, per-airline means, histograms, counts
///   └───────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod store;
