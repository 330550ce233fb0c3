use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

const ROWS: usize = 2000;
const CSV_PATH: &str = "hotel_bookings_sample.csv";
const PARQUET_PATH: &str = "hotel_bookings_sample.parquet";

const HOTELS: [&str; 2] = ["City Hotel", "Resort Hotel"];
const COUNTRIES: [(&str, f64); 8] = [
    ("PRT", 0.40),
    ("GBR", 0.12),
    ("FRA", 0.10),
    ("ESP", 0.09),
    ("DEU", 0.07),
    ("ITA", 0.05),
    ("IRL", 0.04),
    ("USA", 0.13),
];
const CUSTOMER_TYPES: [(&str, f64); 4] = [
    ("Transient", 0.75),
    ("Transient-Party", 0.21),
    ("Contract", 0.035),
    ("Group", 0.005),
];
const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];
/// Relative arrival volume per month; summer peaks.
const SEASON: [f64; 12] = [0.5, 0.6, 0.8, 0.9, 1.0, 1.1, 1.4, 1.5, 1.0, 0.9, 0.6, 0.6];

#[derive(Debug, Serialize)]
struct Booking {
    hotel: &'static str,
    is_canceled: i64,
    lead_time: i64,
    arrival_date_year: i64,
    arrival_date_month: &'static str,
    arrival_date_day_of_month: i64,
    stays_in_weekend_nights: i64,
    stays_in_week_nights: i64,
    adults: i64,
    country: &'static str,
    customer_type: &'static str,
    adr: f64,
    /// Booking agent id; direct bookings have none.
    agent: Option<i64>,
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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn range(&mut self, lo: i64, hi: i64) -> i64 {
        lo + (self.next_f64() * (hi - lo + 1) as f64) as i64
    }

    /// Index drawn according to `weights` (need not sum to one).
    fn weighted(&mut self, weights: impl Iterator<Item = f64> + Clone) -> usize {
        let total: f64 = weights.clone().sum();
        let mut target = self.next_f64() * total;
        let mut last = 0;
        for (i, w) in weights.enumerate() {
            if target < w {
                return i;
            }
            target -= w;
            last = i;
        }
        last
    }
}

fn generate(rng: &mut SimpleRng) -> Vec<Booking> {
    (0..ROWS)
        .map(|_| {
            let hotel = HOTELS[rng.weighted([0.66, 0.34].into_iter())];
            let month = rng.weighted(SEASON.into_iter());
            let country = COUNTRIES[rng.weighted(COUNTRIES.iter().map(|c| c.1))].0;
            let customer_type = CUSTOMER_TYPES[rng.weighted(CUSTOMER_TYPES.iter().map(|c| c.1))].0;

            // Exponential-ish lead time, longer for resort stays.
            let mean_lead = if hotel == "Resort Hotel" { 95.0 } else { 110.0 };
            let lead_time = (-mean_lead * (1.0 - rng.next_f64()).max(1e-9).ln()).min(700.0) as i64;

            // Rate rises with the season and is higher at the resort in summer.
            let base = if hotel == "Resort Hotel" { 70.0 } else { 100.0 };
            let adr = (base * SEASON[month].sqrt() + rng.gauss(0.0, 25.0)).max(0.0);

            let agent = (rng.next_f64() > 0.15).then(|| rng.range(1, 250));

            Booking {
                hotel,
                is_canceled: i64::from(rng.next_f64() < 0.37),
                lead_time,
                arrival_date_year: rng.range(2015, 2017),
                arrival_date_month: MONTHS[month],
                arrival_date_day_of_month: rng.range(1, 28),
                stays_in_weekend_nights: rng.range(0, 2),
                stays_in_week_nights: rng.range(0, 5),
                adults: rng.range(1, 3),
                country,
                customer_type,
                adr: (adr * 100.0).round() / 100.0,
                agent,
            }
        })
        .collect()
}

fn write_csv(bookings: &[Booking]) -> Result<()> {
    let mut writer = csv::Writer::from_path(CSV_PATH)
        .with_context(|| format!("Failed to create {CSV_PATH}"))?;
    for booking in bookings {
        writer.serialize(booking)?;
    }
    writer.flush()?;
    Ok(())
}

fn to_batch(bookings: &[Booking]) -> Result<RecordBatch> {
    let ints = |f: fn(&Booking) -> i64| -> ArrayRef {
        Arc::new(Int64Array::from_iter_values(bookings.iter().map(f)))
    };
    let strings = |f: fn(&Booking) -> &'static str| -> ArrayRef {
        Arc::new(StringArray::from_iter_values(bookings.iter().map(f)))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("hotel", DataType::Utf8, false),
        Field::new("is_canceled", DataType::Int64, false),
        Field::new("lead_time", DataType::Int64, false),
        Field::new("arrival_date_year", DataType::Int64, false),
        Field::new("arrival_date_month", DataType::Utf8, false),
        Field::new("arrival_date_day_of_month", DataType::Int64, false),
        Field::new("stays_in_weekend_nights", DataType::Int64, false),
        Field::new("stays_in_week_nights", DataType::Int64, false),
        Field::new("adults", DataType::Int64, false),
        Field::new("country", DataType::Utf8, false),
        Field::new("customer_type", DataType::Utf8, false),
        Field::new("adr", DataType::Float64, false),
        Field::new("agent", DataType::Int64, true),
    ]));

    let columns: Vec<ArrayRef> = vec![
        strings(|b| b.hotel),
        ints(|b| b.is_canceled),
        ints(|b| b.lead_time),
        ints(|b| b.arrival_date_year),
        strings(|b| b.arrival_date_month),
        ints(|b| b.arrival_date_day_of_month),
        ints(|b| b.stays_in_weekend_nights),
        ints(|b| b.stays_in_week_nights),
        ints(|b| b.adults),
        strings(|b| b.country),
        strings(|b| b.customer_type),
        Arc::new(Float64Array::from_iter_values(bookings.iter().map(|b| b.adr))),
        Arc::new(bookings.iter().map(|b| b.agent).collect::<Int64Array>()),
    ];

    Ok(RecordBatch::try_new(schema, columns)?)
}

fn write_parquet(batch: &RecordBatch) -> Result<()> {
    let file = std::fs::File::create(PARQUET_PATH)
        .with_context(|| format!("Failed to create {PARQUET_PATH}"))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);
    let bookings = generate(&mut rng);

    write_csv(&bookings)?;
    let batch = to_batch(&bookings)?;
    write_parquet(&batch)?;
    log::info!("Wrote {} columns", batch.num_columns());

    println!("{}", pretty_format_batches(&[batch.slice(0, 5)])?);
    println!("Wrote {} bookings to {CSV_PATH} and {PARQUET_PATH}", bookings.len());
    Ok(())
}
