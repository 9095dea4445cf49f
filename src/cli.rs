use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use mall_insight::Metric;

/// Filter, aggregate and profile retail transaction files.
#[derive(Debug, Parser)]
#[command(name = "mall-insight", version, about)]
pub struct Args {
    /// Transaction file (.csv, .json, .parquet)
    pub path: PathBuf,

    /// TOML config with column mapping, default query and profile options
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Group, aggregate and rank the filtered rows
    Query(QueryArgs),
    /// Show rows sorted by a column
    View(ViewArgs),
    /// Per-cluster counts, spend, spread, mean profile and category mix
    Profile(ProfileArgs),
    /// Row/column/missing-cell overview and headline spend figures
    Summary {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, ClapArgs)]
pub struct QueryArgs {
    /// Column to group by (default from config)
    #[arg(long, short = 'g')]
    pub group: Option<String>,

    /// Column to sum/average (default from config)
    #[arg(long, short = 'm')]
    pub measure: Option<String>,

    /// Sort metric: count, sum or mean
    #[arg(long)]
    pub metric: Option<Metric>,

    /// Sort ascending instead of descending
    #[arg(long)]
    pub ascending: bool,

    /// Keep only the first N groups (0 keeps all)
    #[arg(long, short = 't', value_name = "N")]
    pub top: Option<usize>,

    /// Derive age_class and price_class before filtering
    #[arg(long)]
    pub classify: bool,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Row selections shared by `query` and `profile`.
#[derive(Debug, Default, ClapArgs)]
pub struct FilterArgs {
    /// Keep rows whose COL value is one of the listed values (repeatable)
    #[arg(long = "only", value_name = "COL=A,B", value_parser = parse_only)]
    pub only: Vec<(String, Vec<String>)>,

    /// Keep rows whose COL value lies in [MIN, MAX] (repeatable)
    #[arg(long = "range", value_name = "COL=MIN:MAX", value_parser = parse_range)]
    pub range: Vec<(String, f64, f64)>,
}

#[derive(Debug, ClapArgs)]
pub struct ViewArgs {
    /// Column to sort by (defaults to `age` when present, else the first column)
    #[arg(long, short = 's')]
    pub sort: Option<String>,

    #[arg(long)]
    pub descending: bool,

    /// Number of rows shown
    #[arg(long, short = 'n', default_value_t = 100)]
    pub rows: usize,
}

#[derive(Debug, ClapArgs)]
pub struct ProfileArgs {
    /// Column identifying clusters (default from config)
    #[arg(long, short = 'g')]
    pub group: Option<String>,

    /// Categories shown in the composition (default from config)
    #[arg(long)]
    pub top_k: Option<usize>,

    // e.g. `--only cluster=0,2 --only gender=Female`; applied before any figure
    #[command(flatten)]
    pub filter: FilterArgs,

    #[arg(long)]
    pub json: bool,
}

fn split_assignment(s: &str) -> Result<(&str, &str), String> {
    let (col, rest) = s
        .split_once('=')
        .ok_or_else(|| format!("expected COL=..., got '{s}'"))?;
    if col.is_empty() {
        return Err(format!("missing column name in '{s}'"));
    }
    Ok((col, rest))
}

pub fn parse_only(s: &str) -> Result<(String, Vec<String>), String> {
    let (col, values) = split_assignment(s)?;
    let values = if values.is_empty() {
        Vec::new()
    } else {
        values.split(',').map(|v| v.to_string()).collect()
    };
    Ok((col.to_string(), values))
}

pub fn parse_range(s: &str) -> Result<(String, f64, f64), String> {
    let (col, bounds) = split_assignment(s)?;
    let (min, max) = bounds
        .split_once(':')
        .ok_or_else(|| format!("expected MIN:MAX, got '{bounds}'"))?;
    let min: f64 = min
        .trim()
        .parse()
        .map_err(|_| format!("invalid minimum '{min}'"))?;
    let max: f64 = max
        .trim()
        .parse()
        .map_err(|_| format!("invalid maximum '{max}'"))?;
    Ok((col.to_string(), min, max))
}
