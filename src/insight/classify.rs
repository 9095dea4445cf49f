use crate::data::model::{CellValue, Table};

/// Name of the derived age bucket column.
pub const AGE_CLASS: &str = "age_class";
/// Name of the derived price bucket column.
pub const PRICE_CLASS: &str = "price_class";

/// Ordinal bucket code.
pub type ClassCode = u8;

/// Fixed breakpoints mapping a value to an ordinal code.
///
/// `bounds` are inclusive upper bounds in ascending order; the first bound
/// `>= value` wins and values above every bound take `overflow`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationRule {
    pub bounds: &'static [(f64, ClassCode)],
    pub overflow: ClassCode,
}

/// Ages: 20/30/40/50/60/70 → 1..=6. Ages above 70 stay in class 6.
pub const AGE_RULE: ClassificationRule = ClassificationRule {
    bounds: &[(20.0, 1), (30.0, 2), (40.0, 3), (50.0, 4), (60.0, 5), (70.0, 6)],
    overflow: 6,
};

/// Unit prices: 20/50/100/500/1000/2000 → 0..=5, anything higher → 6.
pub const PRICE_RULE: ClassificationRule = ClassificationRule {
    bounds: &[
        (20.0, 0),
        (50.0, 1),
        (100.0, 2),
        (500.0, 3),
        (1000.0, 4),
        (2000.0, 5),
    ],
    overflow: 6,
};

impl ClassificationRule {
    /// Bucket a value. Non-finite and negative values have no class.
    pub fn classify(&self, value: f64) -> Option<ClassCode> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        let code = self
            .bounds
            .iter()
            .find(|(upper, _)| value <= *upper)
            .map_or(self.overflow, |(_, code)| *code);
        Some(code)
    }

    /// Bucket a cell, `Null` when the cell is not a usable number.
    pub fn classify_cell(&self, value: &CellValue) -> CellValue {
        value
            .as_f64()
            .and_then(|v| self.classify(v))
            .map_or(CellValue::Null, |code| CellValue::Integer(code.into()))
    }
}

pub fn classify_age(age: f64) -> Option<ClassCode> {
    AGE_RULE.classify(age)
}

pub fn classify_price(price: f64) -> Option<ClassCode> {
    PRICE_RULE.classify(price)
}

/// Source columns the derived classes are computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSources {
    pub age: String,
    pub price: String,
}

impl Default for ClassSources {
    fn default() -> Self {
        Self {
            age: "age".to_string(),
            price: "price".to_string(),
        }
    }
}

/// Return a copy of `table` with `age_class` / `price_class` appended.
///
/// A source column missing from the table is skipped. Cells that cannot be
/// classified become `Null`.
pub fn derive_classes(table: &Table, sources: &ClassSources) -> Table {
    let mut out = table.clone();
    for (source, target, rule) in [
        (&sources.age, AGE_CLASS, &AGE_RULE),
        (&sources.price, PRICE_CLASS, &PRICE_RULE),
    ] {
        if !table.has_column(source) {
            log::debug!("no '{source}' column, skipping {target}");
            continue;
        }
        let values: Vec<CellValue> = table
            .column_values(source)
            .map(|v| rule.classify_cell(v))
            .collect();
        let undefined = values
            .iter()
            .zip(table.column_values(source))
            .filter(|(class, src)| class.is_null() && !src.is_null())
            .count();
        if undefined > 0 {
            log::warn!("{undefined} '{source}' values could not be classified into {target}");
        }
        out.push_derived_column(target, values);
    }
    out
}
