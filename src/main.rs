use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Builder, Env};
use log::info;

use flight_dash::data::aggregate::DEFAULT_HISTOGRAM_BUCKETS;
use flight_dash::{
    AirlineFilter, DashError, DashboardState, Field, FilterCriteria, RecordStore,
};

/// Interactive-style summary of a flight pricing dataset.
#[derive(Debug, Parser)]
#[command(name = "flight-dash", version, about)]
struct Cli {
    /// Dataset file (.csv, .json or .parquet).
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "FLIGHT_DASH_DATA",
        default_value = "airlines_flights_data.csv"
    )]
    data: PathBuf,

    /// Airline to keep, or "all".
    #[arg(short, long, default_value = "all")]
    airline: AirlineFilter,

    /// Cabin class to keep; repeat for several. Defaults to every class.
    #[arg(short, long = "class", value_name = "CLASS", conflicts_with = "no_class")]
    classes: Vec<String>,

    /// Keep no cabin class at all.
    #[arg(long)]
    no_class: bool,

    /// Inclusive price ceiling in USD. Defaults to the dataset maximum.
    #[arg(short, long, value_name = "USD", allow_negative_numbers = true)]
    max_price: Option<f64>,

    /// Number of duration histogram buckets.
    #[arg(long, default_value_t = DEFAULT_HISTOGRAM_BUCKETS)]
    bins: usize,

    /// Filtered rows to preview.
    #[arg(long, default_value_t = 10)]
    rows: usize,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,

    /// List airlines, classes, stops and the price range, then exit.
    #[arg(long)]
    list: bool,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Apply the command line filters on top of the default selection.
///
/// Rejected criteria are not fatal: the default view is kept and the reason
/// stays in the state's status message.
fn apply_filters(cli: &Cli, state: &mut DashboardState<'_>) -> Result<()> {
    let mut criteria = FilterCriteria {
        airline: cli.airline.clone(),
        ..state.criteria().clone()
    };
    if cli.no_class {
        criteria.classes.clear();
    } else if !cli.classes.is_empty() {
        criteria.classes = cli.classes.iter().cloned().collect();
    }
    if let Some(max_price) = cli.max_price {
        criteria.max_price = max_price;
    }
    match state.set_criteria(criteria) {
        Ok(()) | Err(DashError::InvalidCriteria(_)) => Ok(()),
        Err(err) => Err(err).context("applying command line filters"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.quiet { "warn" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    let store = RecordStore::new(&cli.data);
    let records = store.load()?;

    if cli.list {
        for field in Field::ALL {
            let values: Vec<String> = records.distinct_values(field).into_iter().collect();
            println!("{}: {}", field.column_name(), values.join(", "));
        }
        if let Some((lo, hi)) = records.price_bounds() {
            println!("price: {lo} - {hi}");
        }
        return Ok(());
    }

    let mut state = DashboardState::new(records);
    apply_filters(&cli, &mut state)?;
    info!("{} of {} flights selected", state.view().len(), records.len());

    let report = state.report(cli.bins, cli.rows);
    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{report}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flight_dash::{FlightRecord, RecordSet};

    fn flights() -> RecordSet {
        RecordSet::from_records(vec![
            FlightRecord::new("A", "Economy", 100.0, 2.0, "0"),
            FlightRecord::new("B", "Business", 500.0, 5.0, "1"),
        ])
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("flight-dash").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn valid_filters_narrow_the_view() {
        let set = flights();
        let mut state = DashboardState::new(&set);
        apply_filters(&cli(&["-c", "Economy", "-m", "200"]), &mut state).unwrap();
        assert_eq!(state.view().indices(), &[0]);
        assert!(state.status_message.is_none());
    }

    #[test]
    fn unknown_class_keeps_default_view() {
        let set = flights();
        let mut state = DashboardState::new(&set);
        apply_filters(&cli(&["-c", "First"]), &mut state).unwrap();
        assert_eq!(state.view().len(), 2);
        assert!(state
            .status_message
            .as_deref()
            .is_some_and(|m| m.contains("First")));
        assert_eq!(state.report(50, 0).status, state.status_message);
    }

    #[test]
    fn negative_max_price_reaches_validation() {
        let parsed = cli(&["--max-price", "-1"]);
        assert_eq!(parsed.max_price, Some(-1.0));

        let set = flights();
        let mut state = DashboardState::new(&set);
        apply_filters(&parsed, &mut state).unwrap();
        assert_eq!(state.criteria().max_price, 500.0);
        assert!(state.status_message.is_some());
    }
}
