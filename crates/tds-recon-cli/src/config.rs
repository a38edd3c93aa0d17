use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tds_recon::reconcile::ReconcileOptions;

const CONFIG_LOCATIONS: [&str; 2] = ["tds-recon.toml", ".tds-recon.toml"];

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigArchive {
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(try_from = "RawConfigLedger")]
pub struct ConfigLedger {
    pub skip_rows: Option<usize>,
    pub amount_column: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfigLedger {
    skip_rows: Option<usize>,
    amount_column: Option<String>,
}

impl TryFrom<RawConfigLedger> for ConfigLedger {
    type Error = String;

    fn try_from(raw: RawConfigLedger) -> Result<Self, Self::Error> {
        if raw
            .amount_column
            .as_deref()
            .is_some_and(|column| column.trim().is_empty())
        {
            return Err("ledger section has an empty 'amount_column'".to_string());
        }
        Ok(ConfigLedger {
            skip_rows: raw.skip_rows,
            amount_column: raw.amount_column,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigStatement {
    pub skip_records: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub archive: ConfigArchive,
    #[serde(default)]
    pub ledger: ConfigLedger,
    #[serde(default)]
    pub statement: ConfigStatement,
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn find_and_load() -> Result<Option<Self>> {
        Self::find_in(Path::new(""))
    }

    fn find_in(dir: &Path) -> Result<Option<Self>> {
        for location in CONFIG_LOCATIONS {
            let path = dir.join(location);
            if path.exists() {
                tracing::debug!(path = %path.display(), "using config file");
                return Self::load_from_file(&path).map(Some);
            }
        }

        Ok(None)
    }

    /// Overwrite the options this file sets, leaving the rest untouched.
    pub fn apply(self, options: &mut ReconcileOptions) {
        if let Some(password) = self.archive.password {
            options.password = password;
        }
        if let Some(skip_rows) = self.ledger.skip_rows {
            options.ledger.skip_rows = skip_rows;
        }
        if let Some(amount_column) = self.ledger.amount_column {
            options.ledger.amount_column = amount_column;
        }
        if let Some(skip_records) = self.statement.skip_records {
            options.statement_skip_records = skip_records;
        }
    }
}
