use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

const CATEGORIES: [(&str, f64); 8] = [
    ("Clothing", 300.08),
    ("Shoes", 600.17),
    ("Books", 15.15),
    ("Cosmetics", 40.66),
    ("Food & Beverage", 5.23),
    ("Toys", 35.84),
    ("Technology", 1050.0),
    ("Souvenir", 11.73),
];
const MALLS: [&str; 5] = ["Kanyon", "Forum Istanbul", "Metrocity", "Mall of Istanbul", "Istinye Park"];
const PAYMENTS: [&str; 3] = ["Cash", "Credit Card", "Debit Card"];

#[derive(Debug, Serialize)]
struct Transaction {
    invoice_no: String,
    customer_id: String,
    gender: &'static str,
    age: Option<i64>,
    category: &'static str,
    quantity: i64,
    price: f64,
    payment_method: &'static str,
    shopping_mall: &'static str,
    invoice_date_day: i64,
    invoice_date_month: i64,
    invoice_date_year: i64,
    cluster: i64,
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

    /// Uniform integer in `lo..=hi`.
    fn range(&mut self, lo: i64, hi: i64) -> i64 {
        lo + (self.next_u64() % (hi - lo + 1) as u64) as i64
    }

    fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        items[self.next_u64() as usize % items.len()]
    }
}

fn transaction(i: usize, rng: &mut SimpleRng) -> Transaction {
    let (category, unit_price) = rng.pick(&CATEGORIES);
    let quantity = rng.range(1, 5);
    // Roughly 2% of ages missing, to exercise the null group.
    let age = (rng.next_f64() > 0.02).then(|| rng.range(18, 69));
    let cluster = match (age, unit_price) {
        (_, p) if p > 500.0 => 3,
        (Some(a), _) if a < 30 => 0,
        (Some(a), _) if a < 50 => 1,
        _ => 2,
    };
    Transaction {
        invoice_no: format!("I{}", 100_000 + i),
        customer_id: format!("C{}", 200_000 + rng.range(0, 99_999)),
        gender: rng.pick(&["Female", "Male"]),
        age,
        category,
        quantity,
        price: unit_price * quantity as f64,
        payment_method: rng.pick(&PAYMENTS),
        shopping_mall: rng.pick(&MALLS),
        invoice_date_day: rng.range(1, 28),
        invoice_date_month: rng.range(1, 12),
        invoice_date_year: rng.range(2021, 2023),
        cluster,
    }
}

fn write_csv(path: &str, rows: &[Transaction]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &str, rows: &[Transaction]) -> Result<()> {
    let text = |f: fn(&Transaction) -> String| -> ArrayRef {
        Arc::new(rows.iter().map(|r| Some(f(r))).collect::<StringArray>())
    };
    let int = |f: fn(&Transaction) -> Option<i64>| -> ArrayRef {
        Arc::new(rows.iter().map(f).collect::<Int64Array>())
    };

    let columns: Vec<(&str, DataType, ArrayRef)> = vec![
        ("invoice_no", DataType::Utf8, text(|r| r.invoice_no.clone())),
        ("customer_id", DataType::Utf8, text(|r| r.customer_id.clone())),
        ("gender", DataType::Utf8, text(|r| r.gender.to_string())),
        ("age", DataType::Int64, int(|r| r.age)),
        ("category", DataType::Utf8, text(|r| r.category.to_string())),
        ("quantity", DataType::Int64, int(|r| Some(r.quantity))),
        (
            "price",
            DataType::Float64,
            Arc::new(rows.iter().map(|r| Some(r.price)).collect::<Float64Array>()),
        ),
        ("payment_method", DataType::Utf8, text(|r| r.payment_method.to_string())),
        ("shopping_mall", DataType::Utf8, text(|r| r.shopping_mall.to_string())),
        ("invoice_date_day", DataType::Int64, int(|r| Some(r.invoice_date_day))),
        ("invoice_date_month", DataType::Int64, int(|r| Some(r.invoice_date_month))),
        ("invoice_date_year", DataType::Int64, int(|r| Some(r.invoice_date_year))),
        ("cluster", DataType::Int64, int(|r| Some(r.cluster))),
    ];

    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, ty, _)| Field::new(*name, ty.clone(), true))
            .collect::<Vec<_>>(),
    ));
    let batch = RecordBatch::try_new(
        schema.clone(),
        columns.into_iter().map(|(_, _, a)| a).collect(),
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows: Vec<Transaction> = (0..2000).map(|i| transaction(i, &mut rng)).collect();

    write_csv("sample_transactions.csv", &rows)?;
    write_parquet("sample_transactions.parquet", &rows)?;

    println!(
        "Wrote {} transactions to sample_transactions.csv and sample_transactions.parquet",
        rows.len()
    );
    Ok(())
}
