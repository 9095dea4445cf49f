use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use super::schema::{self, ColumnDescriptor, ColumnKind};

/// String form of a missing cell. Categorical filters and labels use it, so
/// callers can keep null rows by selecting it explicitly.
pub const NULL_LABEL: &str = "<null>";

/// One cell of a transaction table, as produced by the loaders.
///
/// Group keys are `CellValue`s held in `BTreeMap`s, so the type carries a
/// total order: booleans, then numbers (integers and floats interleaved by
/// value), then strings, with `Null` after everything else. That last rule is
/// what puts the missing-value group at the end of every aggregate.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl CellValue {
    /// Position of the variant's family in the total order.
    fn family(&self) -> u8 {
        match self {
            CellValue::Bool(_) => 0,
            CellValue::Integer(_) | CellValue::Float(_) => 1,
            CellValue::String(_) => 2,
            CellValue::Null => 3,
        }
    }
}

// Equality follows the order: floats are equal when `total_cmp` says so (bit
// equality), which keeps `Eq` and `Hash` consistent for NaN and -0.0.
impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use CellValue::*;
        self.family()
            .cmp(&other.family())
            .then_with(|| match (self, other) {
                (Bool(a), Bool(b)) => a.cmp(b),
                (Integer(a), Integer(b)) => a.cmp(b),
                (Float(a), Float(b)) => a.total_cmp(b),
                // 3 and 3.0 stay distinct keys; the integer sorts first.
                (Integer(a), Float(b)) => (*a as f64).total_cmp(b).then(Ordering::Less),
                (Float(a), Integer(b)) => a.total_cmp(&(*b as f64)).then(Ordering::Greater),
                (String(a), String(b)) => a.cmp(b),
                _ => Ordering::Equal,
            })
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "{NULL_LABEL}"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(CellValue::Null, Into::into)
    }
}

impl CellValue {
    /// Interpret the value as a finite `f64`.
    ///
    /// Text cells count when they parse as a signed integer or decimal, so
    /// numeric columns read from untyped sources still take part in range
    /// filters and sums.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            CellValue::Float(v) => *v,
            CellValue::Integer(i) => *i as f64,
            CellValue::String(s) => parse_number(s)?,
            CellValue::Bool(_) | CellValue::Null => return None,
        };
        v.is_finite().then_some(v)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// String form used for categorical membership and labels.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

/// Parse a plain decimal number. Rejects `inf`/`nan` spellings that
/// `f64::from_str` would otherwise accept.
pub(crate) fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    let digits = s.strip_prefix(|c| c == '+' || c == '-').unwrap_or(s);
    if digits.is_empty() || !digits.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    if !digits
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Row – one transaction
// ---------------------------------------------------------------------------

/// One row of the source table: column_name → value.
pub type Row = BTreeMap<String, CellValue>;

// ---------------------------------------------------------------------------
// Table – the complete loaded dataset
// ---------------------------------------------------------------------------

/// A loaded table with column descriptors computed once at construction.
///
/// Rows missing a column read as [`CellValue::Null`].
#[derive(Debug, Clone)]
pub struct Table {
    rows: Vec<Row>,
    /// Column names in insertion order.
    columns: Vec<String>,
    /// One descriptor per column, same order as `columns`.
    schema: Vec<ColumnDescriptor>,
}

static NULL_CELL: CellValue = CellValue::Null;

impl Table {
    /// Build a table from rows, keeping `columns` as the column order.
    /// Columns that appear only in the rows are appended in name order.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let mut columns = columns;
        let mut seen: BTreeSet<String> = columns.iter().cloned().collect();
        for row in &rows {
            for col in row.keys() {
                if seen.insert(col.clone()) {
                    columns.push(col.clone());
                }
            }
        }
        let schema = columns
            .iter()
            .map(|name| ColumnDescriptor {
                name: name.clone(),
                kind: schema::classify_column(rows.iter().map(|r| cell(r, name))),
                derived: false,
            })
            .collect();
        Table {
            rows,
            columns,
            schema,
        }
    }

    /// Build a table whose columns are discovered from the rows (name order).
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self::new(Vec::new(), rows)
    }

    /// A table with the same columns and descriptors but a different row set.
    /// Used by operations that narrow or reorder rows without changing types.
    pub(crate) fn with_rows(&self, rows: Vec<Row>) -> Self {
        Table {
            rows,
            columns: self.columns.clone(),
            schema: self.schema.clone(),
        }
    }

    /// Append a derived column. `values` must hold one value per row.
    pub(crate) fn push_derived_column(&mut self, name: &str, values: Vec<CellValue>) {
        debug_assert_eq!(values.len(), self.rows.len());
        let kind = schema::classify_column(values.iter());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.insert(name.to_string(), value);
        }
        if let Some(existing) = self.schema.iter_mut().find(|d| d.name == name) {
            existing.kind = kind;
            existing.derived = true;
        } else {
            self.columns.push(name.to_string());
            self.schema.push(ColumnDescriptor {
                name: name.to_string(),
                kind,
                derived: true,
            });
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Ordered column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn schema(&self) -> &[ColumnDescriptor] {
        &self.schema
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn descriptor(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.schema.iter().find(|d| d.name == name)
    }

    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.descriptor(name).map(|d| d.kind)
    }

    /// Iterate one column's values, `Null` where a row lacks the column.
    pub fn column_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a CellValue> + 'a {
        self.rows.iter().map(move |r| cell(r, name))
    }

    /// The sorted set of string forms observed in a column.
    pub fn unique_labels(&self, name: &str) -> BTreeSet<String> {
        self.column_values(name).map(CellValue::label).collect()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Look up a cell, treating an absent key as null.
pub fn cell<'a>(row: &'a Row, column: &str) -> &'a CellValue {
    row.get(column).unwrap_or(&NULL_CELL)
}
