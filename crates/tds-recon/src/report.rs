//! The five tables of the reconciliation report, each closed by a TOTAL row.

use std::fmt;

use crate::Decimal;
use crate::reconcile::{Category, ReconciledRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub header: &'static str,
    pub kind: ColumnKind,
}

const fn text(header: &'static str) -> Column {
    Column {
        header,
        kind: ColumnKind::Text,
    }
}

const fn number(header: &'static str) -> Column {
    Column {
        header,
        kind: ColumnKind::Number,
    }
}

pub const COLUMNS: [Column; 9] = [
    text("Name of Deductor"),
    text("TAN of Deductor"),
    number("Total Tax Deducted(Rs.)"),
    // spacer between the statement and ledger halves
    text(" "),
    text("Party_Name"),
    text("TAN as per Tally"),
    number("AMT"),
    number("Difference"),
    text("Remarks"),
];

/// Column holding the `TOTAL` label on the last row.
pub const LABEL_COLUMN: usize = 0;
pub const DIFFERENCE_COLUMN: usize = 7;
pub const TOTAL_LABEL: &str = "TOTAL";
pub const FULL_SHEET_NAME: &str = "Full_Reconciliation";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Blank,
    Text(String),
    Number(Decimal),
}

impl Cell {
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Cell::Number(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        value.map_or(Cell::Blank, Cell::Text)
    }
}

impl From<Option<Decimal>> for Cell {
    fn from(value: Option<Decimal>) -> Self {
        value.map_or(Cell::Blank, Cell::Number)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Blank => Ok(()),
            Cell::Text(text) => f.write_str(text),
            Cell::Number(value) => write!(f, "{value}"),
        }
    }
}

fn cells(row: &ReconciledRow) -> Vec<Cell> {
    vec![
        row.deductor.clone().into(),
        row.statement_tan.clone().into(),
        row.tax_deducted.into(),
        Cell::Blank,
        row.party_name.clone().into(),
        row.ledger_tan.clone().into(),
        row.ledger_amount.into(),
        row.difference.into(),
        // left empty for manual annotation
        Cell::Blank,
    ]
}

/// Sum of every numeric column, skipping missing values. A column with no
/// values at all sums to zero; a sum that overflows [`Decimal`] is left blank.
fn total_row(rows: &[Vec<Cell>]) -> Vec<Cell> {
    COLUMNS
        .iter()
        .enumerate()
        .map(|(idx, column)| match column.kind {
            _ if idx == LABEL_COLUMN => Cell::Text(TOTAL_LABEL.to_owned()),
            ColumnKind::Number => column_sum(rows, idx).into(),
            ColumnKind::Text => Cell::Blank,
        })
        .collect()
}

fn column_sum(rows: &[Vec<Cell>], idx: usize) -> Option<Decimal> {
    let sum = rows
        .iter()
        .filter_map(|row| row[idx].as_number())
        .try_fold(Decimal::ZERO, Decimal::checked_add);
    if sum.is_none() {
        tracing::warn!(column = COLUMNS[idx].header, "column total overflows, leaving it blank");
    }
    sum
}

/// A named table of joined rows followed by exactly one TOTAL row.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    name: &'static str,
    rows: Vec<Vec<Cell>>,
}

impl ReportTable {
    pub fn new<'a>(name: &'static str, rows: impl IntoIterator<Item = &'a ReconciledRow>) -> Self {
        let mut rows: Vec<Vec<Cell>> = rows.into_iter().map(cells).collect();
        rows.push(total_row(&rows));
        ReportTable { name, rows }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn columns(&self) -> &'static [Column] {
        &COLUMNS
    }

    /// All rows, the TOTAL row included.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn data_rows(&self) -> &[Vec<Cell>] {
        &self.rows[..self.rows.len() - 1]
    }

    pub fn total(&self) -> &[Cell] {
        &self.rows[self.rows.len() - 1]
    }
}

impl fmt::Display for ReportTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        let headers: Vec<&str> = COLUMNS.iter().map(|column| column.header).collect();
        writeln!(f, "{}", headers.join("|"))?;
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(Cell::to_string).collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        Ok(())
    }
}

/// The complete reconciliation report, one table per sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    full: ReportTable,
    matched: ReportTable,
    only_in_statement: ReportTable,
    only_in_ledger: ReportTable,
    differences: ReportTable,
}

impl Report {
    pub fn build(rows: &[ReconciledRow]) -> Report {
        let section = |category: Category| {
            ReportTable::new(
                category.sheet_name(),
                rows.iter().filter(|row| row.category() == category),
            )
        };

        Report {
            full: ReportTable::new(FULL_SHEET_NAME, rows),
            matched: section(Category::Matched),
            only_in_statement: section(Category::OnlyInStatement),
            only_in_ledger: section(Category::OnlyInLedger),
            differences: section(Category::Differences),
        }
    }

    /// Tables in sheet order.
    pub fn tables(&self) -> [&ReportTable; 5] {
        [
            &self.full,
            &self.matched,
            &self.only_in_statement,
            &self.only_in_ledger,
            &self.differences,
        ]
    }

    pub fn full(&self) -> &ReportTable {
        &self.full
    }

    pub fn matched(&self) -> &ReportTable {
        &self.matched
    }

    pub fn table(&self, category: Category) -> &ReportTable {
        match category {
            Category::Matched => &self.matched,
            Category::OnlyInStatement => &self.only_in_statement,
            Category::OnlyInLedger => &self.only_in_ledger,
            Category::Differences => &self.differences,
        }
    }

    /// Number of joined rows in a category, not counting the TOTAL row.
    pub fn count(&self, category: Category) -> usize {
        self.table(category).data_rows().len()
    }
}
