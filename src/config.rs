use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::insight::classify::ClassSources;
use crate::insight::pipeline::InsightQuery;

/// Complete application configuration, read from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub columns: ColumnMapping,
    pub query: InsightQuery,
    pub profile: ProfileConfig,
}

/// Concrete column names, resolved once at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    /// Measure column; derived as `price * quantity` when absent.
    pub spend: String,
    pub price: String,
    pub quantity: String,
    pub age: String,
    pub cluster: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Numeric columns left out of mean profiles.
    pub exclude: Vec<String>,
    pub max_columns: usize,
    /// Categories shown in a composition breakdown.
    pub top_k: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            columns: ColumnMapping::default(),
            query: InsightQuery::default(),
            profile: ProfileConfig::default(),
        }
    }
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            spend: "total_spend".to_string(),
            price: "price".to_string(),
            quantity: "quantity".to_string(),
            age: "age".to_string(),
            cluster: "cluster".to_string(),
            category: "category".to_string(),
        }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            exclude: vec![
                "invoice_date_day".to_string(),
                "invoice_date_month".to_string(),
                "invoice_date_year".to_string(),
            ],
            max_columns: 8,
            top_k: 10,
        }
    }
}

impl ColumnMapping {
    /// Source columns for the derived age/price classes.
    pub fn class_sources(&self) -> ClassSources {
        ClassSources {
            age: self.age.clone(),
            price: self.price.clone(),
        }
    }
}

impl AppConfig {
    /// Parse configuration from TOML text. Missing keys take their defaults.
    ///
    /// The default query classifies from the `[columns]` age and price names.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(text).context("parsing config TOML")?;
        config.query.class_sources = config.columns.class_sources();
        Ok(config)
    }

    /// Load configuration from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = Self::from_toml_str(&text)
            .with_context(|| format!("in config file {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}
