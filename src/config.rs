use crate::core::{Result, SeedError};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTORY_TABLE: &str = "__DataMigrationHistory";

lazy_static! {
    // Optionally schema-qualified: `dbo.__DataMigrationHistory`
    static ref TABLE_IDENT: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
            .expect("history table pattern is valid");
}

/// Settings for the migration runner and the SQL history store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Name of the history table, optionally schema-qualified.
    pub history_table: String,

    /// Create the history table before the first lookup.
    pub ensure_history_table: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            history_table: DEFAULT_HISTORY_TABLE.to_string(),
            ensure_history_table: false,
        }
    }
}

impl SeedConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the history table name
    pub fn history_table(mut self, table: &str) -> Self {
        self.history_table = table.to_string();
        self
    }

    /// Create the history table on first use
    pub fn ensure_history_table(mut self, ensure: bool) -> Self {
        self.ensure_history_table = ensure;
        self
    }

    /// Parse and validate a JSON configuration document.
    ///
    /// Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_table_name(&self.history_table)
    }
}

pub fn validate_table_name(name: &str) -> Result<()> {
    if TABLE_IDENT.is_match(name) {
        Ok(())
    } else {
        Err(SeedError::InvalidIdentifier(format!(
            "'{}' is not a valid table name",
            name
        )))
    }
}
