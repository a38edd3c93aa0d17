//! The `^`-delimited text report found inside the statement archive, and the
//! per-deductor summary rows it contains.

use crate::{Decimal, Error, Result, Tan, parse_amount};

/// Index of the header line once blank lines are removed. Lines before it are metadata.
pub const HEADER_LINE: usize = 4;
pub const DELIMITER: char = '^';

pub const TAN_COLUMN: &str = "TAN of Deductor";
pub const DEDUCTOR_COLUMN: &str = "Name of Deductor";
pub const AMOUNT_PAID_COLUMN: &str = "Total Amount Paid / Credited(Rs.)";
pub const TAX_DEDUCTED_COLUMN: &str = "Total Tax Deducted(Rs.)";
pub const TDS_DEPOSITED_COLUMN: &str = "Total TDS Deposited(Rs.)";

/// Leading records that are not deductor rows: the header line itself and the
/// two section lines printed below it.
pub const DEFAULT_SKIP_RECORDS: usize = 3;

/// A rectangular table: every row has exactly `columns.len()` fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RecordSet {
    /// Split the report into a header and rows.
    ///
    /// Lines are trimmed and blank lines dropped. The line at [`HEADER_LINE`]
    /// names the columns, and every line from there on (the header included)
    /// becomes a record, padded with empty fields or truncated to the header width.
    pub fn parse<S: AsRef<str>>(lines: impl IntoIterator<Item = S>) -> Result<RecordSet> {
        let lines: Vec<String> = lines
            .into_iter()
            .map(|line| line.as_ref().trim().to_owned())
            .filter(|line| !line.is_empty())
            .collect();

        let Some(header) = lines.get(HEADER_LINE) else {
            return Err(Error::MalformedReport(format!(
                "expected at least {} non-empty lines, found {}",
                HEADER_LINE + 1,
                lines.len()
            )));
        };
        let columns: Vec<String> = header.split(DELIMITER).map(str::to_owned).collect();

        let rows = lines[HEADER_LINE..]
            .iter()
            .map(|line| {
                let mut fields: Vec<String> = line.split(DELIMITER).map(str::to_owned).collect();
                fields.resize(columns.len(), String::new());
                fields
            })
            .collect();

        Ok(RecordSet { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Position of the column whose name, ignoring surrounding whitespace, is `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.trim() == name)
    }
}

/// One deductor summary row of the statement.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementEntry {
    pub tan: Tan,
    pub deductor: String,
    pub amount_paid: Decimal,
    pub tax_deducted: Decimal,
    pub tds_deposited: Decimal,
}

/// Why a statement record did not make it into the reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DropReason {
    Blank,
    InvalidTan,
    MissingAmount,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatementDrops {
    pub blank: usize,
    pub invalid_tan: usize,
    pub missing_amount: usize,
}

impl StatementDrops {
    fn record(&mut self, reason: DropReason) {
        match reason {
            DropReason::Blank => self.blank += 1,
            DropReason::InvalidTan => self.invalid_tan += 1,
            DropReason::MissingAmount => self.missing_amount += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.blank + self.invalid_tan + self.missing_amount
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementExtraction {
    pub entries: Vec<StatementEntry>,
    pub skipped: usize,
    pub dropped: StatementDrops,
}

/// A TAN is exactly ten ASCII letters or digits. Nothing is repaired here.
pub fn is_valid_tan(tan: &str) -> bool {
    tan.len() == 10 && tan.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Turn parsed report records into validated statement entries.
///
/// The first `skip_records` records are ignored. Remaining records are dropped
/// when blank, when the TAN is invalid after trimming, or when any of the three
/// amounts is not a number.
pub fn normalize_statement(records: &RecordSet, skip_records: usize) -> Result<StatementExtraction> {
    let column = |name: &str| {
        records
            .column_index(name)
            .ok_or_else(|| Error::MalformedReport(format!("missing column '{name}'")))
    };
    let tan_idx = column(TAN_COLUMN)?;
    let deductor_idx = column(DEDUCTOR_COLUMN)?;
    let paid_idx = column(AMOUNT_PAID_COLUMN)?;
    let deducted_idx = column(TAX_DEDUCTED_COLUMN)?;
    let deposited_idx = column(TDS_DEPOSITED_COLUMN)?;

    let skipped = skip_records.min(records.rows().len());
    let mut extraction = StatementExtraction {
        skipped,
        ..Default::default()
    };

    for (index, row) in records.rows().iter().enumerate().skip(skip_records) {
        let kept = [tan_idx, deductor_idx, paid_idx, deducted_idx, deposited_idx];
        if kept.iter().all(|&idx| row[idx].trim().is_empty()) {
            extraction.dropped.record(DropReason::Blank);
            continue;
        }

        let tan = row[tan_idx].trim();
        if !is_valid_tan(tan) {
            tracing::debug!(record = index, tan, "dropping statement row with invalid TAN");
            extraction.dropped.record(DropReason::InvalidTan);
            continue;
        }

        let amounts = (
            parse_amount(&row[paid_idx]),
            parse_amount(&row[deducted_idx]),
            parse_amount(&row[deposited_idx]),
        );
        let (Some(amount_paid), Some(tax_deducted), Some(tds_deposited)) = amounts else {
            tracing::debug!(record = index, tan, "dropping statement row with missing amount");
            extraction.dropped.record(DropReason::MissingAmount);
            continue;
        };

        extraction.entries.push(StatementEntry {
            tan: tan.to_owned(),
            deductor: row[deductor_idx].clone(),
            amount_paid,
            tax_deducted,
            tds_deposited,
        });
    }

    tracing::info!(
        kept = extraction.entries.len(),
        dropped = extraction.dropped.total(),
        "normalized statement rows"
    );
    Ok(extraction)
}
