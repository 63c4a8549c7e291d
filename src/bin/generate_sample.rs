use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;

/// Write a synthetic flight pricing dataset.
#[derive(Debug, Parser)]
struct Args {
    /// Output file; `.parquet` writes Parquet, anything else CSV.
    #[arg(default_value = "sample_flights.csv")]
    output: PathBuf,

    /// Number of flights to generate.
    #[arg(short, long, default_value_t = 2000)]
    count: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

const AIRLINES: [(&str, &str, f64); 6] = [
    ("SpiceJet", "SG", 0.85),
    ("AirAsia", "I5", 0.80),
    ("Vistara", "UK", 1.15),
    ("GO_FIRST", "G8", 0.90),
    ("Indigo", "6E", 0.95),
    ("Air_India", "AI", 1.10),
];
const CITIES: [&str; 6] = ["Delhi", "Mumbai", "Bangalore", "Kolkata", "Hyderabad", "Chennai"];
const SLOTS: [&str; 6] = ["Early_Morning", "Morning", "Afternoon", "Evening", "Night", "Late_Night"];
const STOPS: [&str; 3] = ["zero", "one", "two_or_more"];

struct Flight {
    airline: String,
    flight: String,
    source_city: String,
    departure_time: String,
    stops: String,
    arrival_time: String,
    destination_city: String,
    class: String,
    duration: f64,
    days_left: i64,
    price: i64,
}

fn generate(count: usize, rng: &mut SimpleRng) -> Vec<Flight> {
    (0..count)
        .map(|_| {
            let (airline, code, factor) = AIRLINES[(rng.next_u64() % AIRLINES.len() as u64) as usize];
            let source = rng.pick(&CITIES);
            let destination = loop {
                let city = rng.pick(&CITIES);
                if city != source {
                    break city;
                }
            };
            let stops_idx = (rng.next_u64() % STOPS.len() as u64) as usize;
            let business = airline != "SpiceJet" && rng.next_f64() < 0.3;
            let duration = 1.0 + stops_idx as f64 * 6.0 + rng.next_f64() * 8.0;
            let days_left = 1 + (rng.next_u64() % 49) as i64;
            let base = if business { 45000.0 } else { 5000.0 };
            let urgency = 1.0 + 1.5 / days_left as f64;
            let price = base * factor * urgency * (0.8 + 0.4 * rng.next_f64());

            Flight {
                airline: airline.to_string(),
                flight: format!("{code}-{}", 100 + rng.next_u64() % 900),
                source_city: source.to_string(),
                departure_time: rng.pick(&SLOTS).to_string(),
                stops: STOPS[stops_idx].to_string(),
                arrival_time: rng.pick(&SLOTS).to_string(),
                destination_city: destination.to_string(),
                class: if business { "Business" } else { "Economy" }.to_string(),
                duration: (duration * 100.0).round() / 100.0,
                days_left,
                price: price.round() as i64,
            }
        })
        .collect()
}

const HEADER: [&str; 12] = [
    "index",
    "airline",
    "flight",
    "source_city",
    "departure_time",
    "stops",
    "arrival_time",
    "destination_city",
    "class",
    "duration",
    "days_left",
    "price",
];

fn write_csv(path: &PathBuf, flights: &[Flight]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    writer.write_record(HEADER)?;
    for (i, f) in flights.iter().enumerate() {
        writer.write_record([
            i.to_string(),
            f.airline.clone(),
            f.flight.clone(),
            f.source_city.clone(),
            f.departure_time.clone(),
            f.stops.clone(),
            f.arrival_time.clone(),
            f.destination_city.clone(),
            f.class.clone(),
            f.duration.to_string(),
            f.days_left.to_string(),
            f.price.to_string(),
        ])?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(path: &PathBuf, flights: &[Flight]) -> Result<()> {
    let text = |get: fn(&Flight) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(flights.iter().map(get).collect::<Vec<_>>()))
    };

    let schema = Arc::new(Schema::new(
        HEADER
            .iter()
            .map(|&name| {
                let ty = match name {
                    "index" | "days_left" | "price" => DataType::Int64,
                    "duration" => DataType::Float64,
                    _ => DataType::Utf8,
                };
                Field::new(name, ty, false)
            })
            .collect::<Vec<_>>(),
    ));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(0..flights.len() as i64)),
        text(|f| f.airline.as_str()),
        text(|f| f.flight.as_str()),
        text(|f| f.source_city.as_str()),
        text(|f| f.departure_time.as_str()),
        text(|f| f.stops.as_str()),
        text(|f| f.arrival_time.as_str()),
        text(|f| f.destination_city.as_str()),
        text(|f| f.class.as_str()),
        Arc::new(Float64Array::from_iter_values(flights.iter().map(|f| f.duration))),
        Arc::new(Int64Array::from_iter_values(flights.iter().map(|f| f.days_left))),
        Arc::new(Int64Array::from_iter_values(flights.iter().map(|f| f.price))),
    ];

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);
    let flights = generate(args.count, &mut rng);

    let is_parquet = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("parquet"));
    if is_parquet {
        write_parquet(&args.output, &flights)?;
    } else {
        write_csv(&args.output, &flights)?;
    }

    println!("Wrote {} flights to {}", flights.len(), args.output.display());
    Ok(())
}
