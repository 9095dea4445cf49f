mod cli;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use cli::{Args, Command, FilterArgs, ProfileArgs, QueryArgs, ViewArgs};
use mall_insight::config::AppConfig;
use mall_insight::data::loader::load_file;
use mall_insight::data::view::{head, sort_rows};
use mall_insight::insight::profile::{
    self, CompositionCell, MeanProfile, Overview, Spread, Summary,
};
use mall_insight::{AggregateRow, InsightQuery, Metric, Session, Table};

fn main() {
    env_logger::init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        log::error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = AppConfig::load(args.config.as_deref())?;
    let table = load_file(&args.path, &config.columns)
        .with_context(|| format!("loading {}", args.path.display()))?;

    match args.command {
        Command::Query(q) => query(&table, &config, q),
        Command::View(v) => view(&table, v),
        Command::Profile(p) => cluster_profile(&table, &config, p),
        Command::Summary { json } => summary(&table, &config, json),
    }
}

// ---------------------------------------------------------------------------
// query
// ---------------------------------------------------------------------------

fn query(table: &Table, config: &AppConfig, args: QueryArgs) -> Result<()> {
    let mut query: InsightQuery = config.query.clone();
    if let Some(group) = args.group {
        query.group_column = group;
    }
    if let Some(measure) = args.measure {
        query.measure_column = measure;
    }
    if let Some(metric) = args.metric {
        query.metric = metric;
    }
    if args.ascending {
        query.descending = false;
    }
    if args.top.is_some() {
        query.top_n = args.top;
    }
    query.classify |= args.classify;

    // Derived columns are added once for the session so configured and
    // command-line filters can reference them; the query then runs on the
    // enriched table as is.
    let mut session = if query.classify {
        Session::classified(table, &query.class_sources)
    } else {
        Session::new(table.clone())
    };
    query.classify = false;
    session.merge(&std::mem::take(&mut query.filters))?;
    narrow(&mut session, &args.filter)?;

    let rows = session.query(&query)?;
    log::info!(
        "{} of {} rows matched, {} groups",
        session.visible_indices.len(),
        table.len(),
        rows.len()
    );
    if args.json {
        report::print_json(&rows)
    } else {
        let title = format!(
            "{} of '{}' by '{}' ({} rows)",
            query.metric,
            query.measure_column,
            query.group_column,
            session.visible_indices.len()
        );
        report::print_batch(&title, &report::aggregates_batch(&rows)?)
    }
}

/// Apply `--only` / `--range` selections on top of whatever the session holds.
fn narrow(session: &mut Session, filter: &FilterArgs) -> Result<()> {
    for (column, values) in &filter.only {
        session.select_values(column, values.iter().cloned())?;
    }
    for (column, min, max) in &filter.range {
        session.set_range(column, *min, *max)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// view
// ---------------------------------------------------------------------------

fn view(table: &Table, args: ViewArgs) -> Result<()> {
    let column = match args.sort {
        Some(c) => c,
        None if table.has_column("age") => "age".to_string(),
        None => match table.columns().first() {
            Some(c) => c.clone(),
            None => {
                println!("(empty table)");
                return Ok(());
            }
        },
    };
    let sorted = sort_rows(table, &column, !args.descending)?;
    let shown = head(&sorted, args.rows);
    let order = if args.descending { "descending" } else { "ascending" };
    let title = format!(
        "{} of {} rows sorted by '{column}' {order}",
        shown.len(),
        table.len()
    );
    report::print_batch(&title, &report::table_batch(&shown)?)
}

// ---------------------------------------------------------------------------
// profile
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ClusterReport {
    group_column: String,
    /// Distinct groups left after filtering.
    groups_selected: usize,
    summary: Summary,
    counts: Vec<(String, usize)>,
    spend: Vec<AggregateRow>,
    spread: Vec<Spread>,
    means: MeanProfile,
    composition: Option<Vec<CompositionCell>>,
}

/// Every per-group figure of the profile, computed on `table` as given.
fn cluster_report(
    table: &Table,
    config: &AppConfig,
    group: String,
    top_k: usize,
) -> Result<ClusterReport> {
    let spend = &config.columns.spend;
    let category = &config.columns.category;

    let mut spend_query = InsightQuery::new(&group, spend);
    spend_query.metric = Metric::Sum;
    let columns = profile::profile_columns(table, &group, &config.profile);
    let counts = profile::value_counts(table, &group)?;

    Ok(ClusterReport {
        groups_selected: counts.len(),
        summary: profile::summarize(table, spend)?,
        spend: mall_insight::run(table, &spend_query)?,
        spread: profile::spread(table, &group, spend)?,
        means: profile::mean_profile(table, &group, &columns)?,
        composition: if table.has_column(category) {
            Some(profile::composition(table, &group, category, top_k)?)
        } else {
            log::warn!("no '{category}' column, skipping composition");
            None
        },
        counts,
        group_column: group,
    })
}

fn cluster_profile(table: &Table, config: &AppConfig, args: ProfileArgs) -> Result<()> {
    let group = args.group.unwrap_or_else(|| config.columns.cluster.clone());
    let top_k = args.top_k.unwrap_or(config.profile.top_k);

    let mut session = Session::new(table.clone());
    narrow(&mut session, &args.filter)?;
    let filtered = session.filtered();
    log::info!("profiling {} of {} rows", filtered.len(), table.len());
    let report = cluster_report(&filtered, config, group, top_k)?;

    if args.json {
        return report::print_json(&report);
    }
    let spend = &config.columns.spend;
    let category = &config.columns.category;
    let g = report.group_column.as_str();
    println!(
        "Filtered rows: {} / {}  Groups selected: {}",
        filtered.len(),
        table.len(),
        report.groups_selected
    );
    print_summary(&report.summary);
    report::print_batch("Rows per group", &report::value_counts_batch(g, &report.counts)?)?;
    report::print_batch(
        &format!("Total '{spend}' per group"),
        &report::aggregates_batch(&report.spend)?,
    )?;
    report::print_batch(
        &format!("Spread of '{spend}' per group"),
        &report::spread_batch(g, &report.spread)?,
    )?;
    report::print_batch("Mean numeric features per group", &report::profile_batch(g, &report.means)?)?;
    if let Some(cells) = &report.composition {
        report::print_batch(
            &format!("Top {top_k} '{category}' mix per group"),
            &report::composition_batch(g, category, cells)?,
        )?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// summary
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SummaryReport {
    overview: Overview,
    spend: Option<Summary>,
}

fn print_summary(s: &Summary) {
    let mean = s
        .mean
        .map_or_else(|| "-".to_string(), |m| format!("{m:.2}"));
    println!("Rows: {}  Total spend: {:.2}  Avg spend: {mean}", s.rows, s.total);
}

fn summary(table: &Table, config: &AppConfig, json: bool) -> Result<()> {
    let spend = table
        .has_column(&config.columns.spend)
        .then(|| profile::summarize(table, &config.columns.spend))
        .transpose()?;
    let report = SummaryReport {
        overview: profile::overview(table),
        spend,
    };
    if json {
        return report::print_json(&report);
    }

    let o = &report.overview;
    println!(
        "{} rows, {} columns, {} missing cells",
        o.rows, o.columns, o.missing_cells
    );
    match &report.spend {
        Some(s) => print_summary(s),
        None => println!("No '{}' column", config.columns.spend),
    }
    for d in table.schema() {
        let derived = if d.derived { " (derived)" } else { "" };
        println!("  {:<24} {:?}{derived}", d.name, d.kind);
    }
    if let Some(corr) = &o.correlation {
        println!("Correlation:");
        for (name, row) in corr.columns.iter().zip(&corr.values) {
            let cells: Vec<String> = row
                .iter()
                .map(|v| v.map_or_else(|| "    -".to_string(), |c| format!("{c:>5.2}")))
                .collect();
            println!("  {name:<24} {}", cells.join(" "));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mall_insight::data::loader::load_csv_str;

    const CSV: &str = "\
cluster,gender,category,age,price,quantity
0,Female,Books,21,15.15,2
0,Male,Toys,25,35.84,1
1,Female,Shoes,44,600.17,1
1,Female,Books,38,15.15,4
2,Male,Technology,61,1050.00,1
";

    #[test]
    fn profile_figures_follow_the_row_filters() {
        let config = AppConfig::default();
        let table = load_csv_str(CSV, &config.columns).unwrap();
        let filter = FilterArgs {
            only: vec![
                cli::parse_only("cluster=0,1").unwrap(),
                cli::parse_only("gender=Female").unwrap(),
            ],
            range: Vec::new(),
        };
        let mut session = Session::new(table.clone());
        narrow(&mut session, &filter).unwrap();
        let filtered = session.filtered();
        assert_eq!(filtered.len(), 3);

        let report = cluster_report(&filtered, &config, "cluster".to_string(), 10).unwrap();
        assert_eq!(report.groups_selected, 2);
        assert_eq!(report.summary.rows, 3);
        assert!((report.summary.total - (30.3 + 600.17 + 60.6)).abs() < 1e-9);
        assert_eq!(
            report.counts,
            vec![("1".to_string(), 2), ("0".to_string(), 1)]
        );
        let categories: Vec<&str> = report
            .composition
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        assert_eq!(categories, vec!["Books", "Books", "Shoes"]);

        let whole = cluster_report(&table, &config, "cluster".to_string(), 10).unwrap();
        assert_eq!(whole.groups_selected, 3);
        assert_eq!(whole.summary.rows, 5);
    }

    #[test]
    fn bad_range_on_profile_is_an_error() {
        let table = load_csv_str(CSV, &AppConfig::default().columns).unwrap();
        let filter = FilterArgs {
            only: Vec::new(),
            range: vec![cli::parse_range("gender=0:1").unwrap()],
        };
        let mut session = Session::new(table);
        assert!(narrow(&mut session, &filter).is_err());
    }
}
