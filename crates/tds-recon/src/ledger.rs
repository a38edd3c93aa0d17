//! The company ledger export (a Tally workbook) and the TANs embedded in its particulars.

use std::io::{Read, Seek};
use std::path::Path;
use std::sync::LazyLock;

use calamine::{Data, Range, Reader, Xlsx, open_workbook};
use regex::Regex;
use rust_decimal::prelude::FromPrimitive;

use crate::{Decimal, Error, Result, Tan, parse_amount};

pub const PARTICULARS_COLUMN: &str = "Particulars";
pub const DEFAULT_AMOUNT_COLUMN: &str = "Transactions";
/// Rows of company and report metadata above the column headers.
pub const DEFAULT_SKIP_ROWS: usize = 13;

/// `TDS -<party name>(<TAN>`, e.g. `TDS -Bank X(AAAA11111A)`.
static TDS_PARTICULARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"TDS -([^()]+)\s*\((\w{4}\d{5}\w)").expect("particulars pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerOptions {
    pub skip_rows: usize,
    pub amount_column: String,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        LedgerOptions {
            skip_rows: DEFAULT_SKIP_ROWS,
            amount_column: DEFAULT_AMOUNT_COLUMN.to_owned(),
        }
    }
}

/// A data row of the ledger, reduced to the two columns the reconciliation looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    /// 1-based row number in the worksheet.
    pub row: usize,
    pub particulars: String,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerTable {
    pub rows: Vec<LedgerRow>,
}

/// A ledger row whose particulars name a deductor and its TAN.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub row: usize,
    pub tan: Tan,
    pub party_name: String,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerExtraction {
    pub entries: Vec<LedgerEntry>,
    /// Rows whose particulars do not carry a TAN. They take no part in the join.
    pub without_identifier: Vec<LedgerRow>,
}

impl LedgerExtraction {
    /// Entries whose amount could not be read as a number.
    pub fn amount_misses(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.amount.is_none())
            .count()
    }
}

#[tracing::instrument(level = "info", skip(path, options), fields(path = %path.as_ref().display()))]
pub fn read_ledger(path: impl AsRef<Path>, options: &LedgerOptions) -> Result<LedgerTable> {
    let mut workbook: Xlsx<_> = open_workbook(path.as_ref())?;
    read_first_sheet(&mut workbook, options)
}

/// Read a ledger workbook that is already in memory.
pub fn read_ledger_from<R: Read + Seek>(reader: R, options: &LedgerOptions) -> Result<LedgerTable> {
    let mut workbook = Xlsx::new(reader)?;
    read_first_sheet(&mut workbook, options)
}

fn read_first_sheet<R: Read + Seek>(
    workbook: &mut Xlsx<R>,
    options: &LedgerOptions,
) -> Result<LedgerTable> {
    let Some(sheet_name) = workbook.sheet_names().into_iter().next() else {
        return Err(Error::LedgerSchema("workbook has no worksheets".into()));
    };
    let range = workbook.worksheet_range(&sheet_name)?;
    LedgerTable::from_range(&range, options)
}

impl LedgerTable {
    /// Build the table from a worksheet: skip the metadata rows, take the next
    /// non-empty row as header, treat its first column as the particulars.
    /// Empty rows are never data rows.
    pub fn from_range(range: &Range<Data>, options: &LedgerOptions) -> Result<LedgerTable> {
        let Some((start_row, _)) = range.start() else {
            return Err(Error::LedgerSchema("worksheet is empty".into()));
        };
        let start_row = start_row as usize;

        let mut rows = range
            .rows()
            .enumerate()
            .skip(options.skip_rows.saturating_sub(start_row))
            .filter(|(_, cells)| !is_empty_row(cells));
        let Some((_, header)) = rows.next() else {
            return Err(Error::LedgerSchema(format!(
                "expected a header after {} rows, but the sheet ends first",
                options.skip_rows
            )));
        };
        let amount_idx = header
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, cell)| cell_text(cell).trim() == options.amount_column)
            .map(|(idx, _)| idx)
            .ok_or_else(|| {
                Error::LedgerSchema(format!("missing column '{}'", options.amount_column))
            })?;

        let rows = rows
            .map(|(offset, cells)| LedgerRow {
                row: start_row + offset + 1,
                particulars: cells.first().map(cell_text).unwrap_or_default(),
                amount: cells.get(amount_idx).and_then(cell_amount),
            })
            .collect::<Vec<_>>();

        tracing::info!(rows = rows.len(), "read ledger rows");
        Ok(LedgerTable { rows })
    }
}

fn is_empty_row(cells: &[Data]) -> bool {
    cells.iter().all(|cell| cell_text(cell).trim().is_empty())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn cell_amount(cell: &Data) -> Option<Decimal> {
    match cell {
        Data::Float(f) => Decimal::from_f64(*f),
        Data::Int(i) => Some(Decimal::from(*i)),
        Data::String(s) => parse_amount(s),
        _ => None,
    }
}

/// Pull the party name and TAN out of each row's particulars.
pub fn extract_identifiers(table: LedgerTable) -> LedgerExtraction {
    let mut extraction = LedgerExtraction::default();

    for row in table.rows {
        match TDS_PARTICULARS.captures(&row.particulars) {
            Some(captures) => extraction.entries.push(LedgerEntry {
                row: row.row,
                tan: captures[2].to_owned(),
                party_name: captures[1].to_owned(),
                amount: row.amount,
            }),
            None => {
                tracing::debug!(row = row.row, particulars = %row.particulars, "no TAN in particulars");
                extraction.without_identifier.push(row);
            }
        }
    }

    tracing::info!(
        with_tan = extraction.entries.len(),
        without_tan = extraction.without_identifier.len(),
        "extracted ledger identifiers"
    );
    extraction
}
