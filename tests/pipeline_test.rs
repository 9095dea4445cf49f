mod common;

use mall_insight::data::filter::apply_filters;
use mall_insight::insight::classify::{AGE_CLASS, PRICE_CLASS};
use mall_insight::{
    run, AggregateRow, CellValue, FilterSpec, InsightError, InsightQuery, Metric, NumericRange,
};

fn summary(rows: &[AggregateRow]) -> Vec<(String, usize, f64, f64)> {
    rows.iter()
        .map(|r| (r.group.label(), r.count, r.sum, r.mean))
        .collect()
}

#[test]
fn sum_by_category_descending() {
    let table = common::spend_by_category();
    let rows = run(&table, &InsightQuery::new("cat", "spend")).unwrap();
    assert_eq!(
        summary(&rows),
        vec![
            ("A".to_string(), 2, 40.0, 20.0),
            ("B".to_string(), 1, 5.0, 5.0)
        ]
    );
}

#[test]
fn filtered_query_only_sees_selected_rows() {
    let table = common::spend_by_category();
    let mut query = InsightQuery::new("cat", "spend");
    query.filters = FilterSpec::new().with_values("cat", ["B"]);
    let rows = run(&table, &query).unwrap();
    assert_eq!(summary(&rows), vec![("B".to_string(), 1, 5.0, 5.0)]);

    query.filters = FilterSpec::new().with_values("cat", Vec::<String>::new());
    assert!(run(&table, &query).unwrap().is_empty());
}

#[test]
fn input_table_is_not_modified() {
    let table = common::transactions();
    let before = table.clone();
    let mut query = InsightQuery::new("gender", "price");
    query.classify = true;
    query.filters = FilterSpec::new().with_range("age", 20.0, 60.0);
    run(&table, &query).unwrap();
    assert_eq!(table.rows(), before.rows());
    assert!(!table.has_column(AGE_CLASS));
}

#[test]
fn filtering_twice_changes_nothing() {
    let table = common::transactions();
    let spec = FilterSpec::new()
        .with_values("category", ["Books", "Clothing"])
        .with_range("price", 0.0, 500.0);
    let once = apply_filters(&table, &spec).unwrap();
    let twice = apply_filters(&once, &spec).unwrap();
    assert_eq!(once.rows(), twice.rows());
    assert_eq!(once.len(), 3);
}

#[test]
fn allow_all_and_covering_ranges_keep_every_row() {
    let table = common::transactions();
    let all = apply_filters(&table, &FilterSpec::select_all(&table)).unwrap();
    assert_eq!(all.rows(), table.rows());

    let covering = NumericRange::covering(&table, "price").unwrap();
    assert_eq!((covering.min, covering.max), (15.15, 2100.0));
    let spec = FilterSpec::new().with_range("price", covering.min, covering.max);
    assert_eq!(apply_filters(&table, &spec).unwrap().len(), table.len());
}

#[test]
fn range_filter_drops_null_cells() {
    let table = common::transactions();
    let spec = FilterSpec::new().with_range("age", 0.0, 200.0);
    assert_eq!(apply_filters(&table, &spec).unwrap().len(), table.len() - 1);
}

#[test]
fn sum_equals_count_times_mean() {
    let table = common::table(
        &["cat", "spend"],
        vec![
            vec!["A".into(), 10.0f64.into()],
            vec!["A".into(), "n/a".into()],
            vec![CellValue::Null, 7.0f64.into()],
            vec!["B".into(), CellValue::Null],
        ],
    );
    let rows = run(&table, &InsightQuery::new("cat", "spend")).unwrap();
    for r in &rows {
        assert!((r.sum - r.count as f64 * r.mean).abs() < 1e-9, "{r:?}");
    }
    // Null group kept, unparsable measure still counted.
    let a = rows.iter().find(|r| r.group == CellValue::from("A")).unwrap();
    assert_eq!((a.count, a.sum, a.mean), (2, 10.0, 5.0));
    assert!(rows.iter().any(|r| r.group.is_null()));
}

#[test]
fn top_n_is_a_prefix_of_the_full_ranking() {
    let table = common::transactions();
    let mut query = InsightQuery::new("category", "price");
    let full = run(&table, &query).unwrap();
    assert_eq!(full.len(), 4);
    for n in 1..=5 {
        query.top_n = Some(n);
        let top = run(&table, &query).unwrap();
        assert_eq!(top.len(), n.min(full.len()));
        assert_eq!(&full[..top.len()], &top[..]);
    }
    query.top_n = Some(0);
    assert_eq!(run(&table, &query).unwrap(), full);
}

#[test]
fn count_ties_break_on_group_key() {
    let table = common::transactions();
    let mut query = InsightQuery::new("category", "price");
    query.metric = Metric::Count;
    let groups: Vec<String> = run(&table, &query)
        .unwrap()
        .iter()
        .map(|r| r.group.label())
        .collect();
    assert_eq!(groups, vec!["Books", "Clothing", "Shoes", "Technology"]);

    query.descending = false;
    let groups: Vec<String> = run(&table, &query)
        .unwrap()
        .iter()
        .map(|r| r.group.label())
        .collect();
    assert_eq!(groups, vec!["Shoes", "Technology", "Books", "Clothing"]);
}

#[test]
fn classified_query_filters_on_derived_columns() {
    let table = common::transactions();
    let mut query = InsightQuery::new("gender", "price");
    query.classify = true;
    query.metric = Metric::Count;
    query.filters = FilterSpec::new().with_values(PRICE_CLASS, ["4"]);
    let rows = run(&table, &query).unwrap();
    assert_eq!(
        summary(&rows),
        vec![
            ("Female".to_string(), 1, 900.24, 900.24),
            ("Male".to_string(), 1, 600.17, 600.17)
        ]
    );

    let mut by_age = InsightQuery::new(AGE_CLASS, "price");
    by_age.classify = true;
    by_age.metric = Metric::Count;
    let groups: Vec<String> = run(&table, &by_age)
        .unwrap()
        .iter()
        .map(|r| r.group.label())
        .collect();
    assert_eq!(groups, vec!["1", "2", "3", "4", "6", "<null>"]);
}

#[test]
fn missing_columns_are_reported() {
    let table = common::spend_by_category();
    assert_eq!(
        run(&table, &InsightQuery::new("mall", "spend")).unwrap_err(),
        InsightError::GroupColumnNotFound("mall".into())
    );
    assert_eq!(
        run(&table, &InsightQuery::new("cat", "amount")).unwrap_err(),
        InsightError::MeasureColumnNotFound("amount".into())
    );

    let mut query = InsightQuery::new("cat", "spend");
    query.filters = FilterSpec::new().with_values("mall", ["X"]);
    assert_eq!(
        run(&table, &query).unwrap_err(),
        InsightError::ColumnNotFound("mall".into())
    );
    query.filters = FilterSpec::new().with_range("cat", 0.0, 1.0);
    assert_eq!(
        run(&table, &query).unwrap_err(),
        InsightError::RangeOnCategorical("cat".into())
    );
    query.filters = FilterSpec::new().with_range("spend", 9.0, 1.0);
    assert!(matches!(
        run(&table, &query).unwrap_err(),
        InsightError::InvalidRange { .. }
    ));
}
