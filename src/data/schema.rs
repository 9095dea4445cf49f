use serde::Serialize;

use super::model::CellValue;

/// How a column is filtered: by numeric range or by a set of string forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// Type information for one column, computed once when a table is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub kind: ColumnKind,
    /// Produced by the classifier rather than read from the source.
    pub derived: bool,
}

/// A column is numeric iff every non-null value parses as a finite number.
///
/// Mixed columns ("N/A" next to numbers) are categorical and compared through
/// their string form. A column with no non-null values is numeric.
pub fn classify_column<'a, I>(values: I) -> ColumnKind
where
    I: IntoIterator<Item = &'a CellValue>,
{
    let all_numeric = values
        .into_iter()
        .filter(|v| !v.is_null())
        .all(|v| v.as_f64().is_some());
    if all_numeric {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}
