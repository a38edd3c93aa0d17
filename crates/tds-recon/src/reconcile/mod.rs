//! Reconciling the deductions reported in the statement against the ledger.

mod classify;

pub use classify::Category;

use crate::archive::{self, ReportSource};
use crate::ledger::{self, LedgerEntry, LedgerExtraction, LedgerOptions, LedgerTable};
use crate::report::Report;
use crate::statement::{self, RecordSet, StatementDrops, StatementEntry, StatementExtraction};
use crate::utils::sort_merge_diff::{JoinResult, SortMergeDiff};
use crate::{DEFAULT_ARCHIVE_PASSWORD, Decimal, Result, Tan};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Which side of the join a row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provenance {
    Both,
    StatementOnly,
    LedgerOnly,
}

impl Provenance {
    pub fn as_str(self) -> &'static str {
        match self {
            Provenance::Both => "both",
            Provenance::StatementOnly => "left_only",
            Provenance::LedgerOnly => "right_only",
        }
    }
}

/// One row of the outer join. Fields of the absent side are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledRow {
    pub provenance: Provenance,
    pub deductor: Option<String>,
    pub statement_tan: Option<Tan>,
    pub amount_paid: Option<Decimal>,
    pub tax_deducted: Option<Decimal>,
    pub tds_deposited: Option<Decimal>,
    pub party_name: Option<String>,
    pub ledger_tan: Option<Tan>,
    pub ledger_amount: Option<Decimal>,
    /// `tax_deducted - ledger_amount`, missing when either operand is.
    pub difference: Option<Decimal>,
}

impl ReconciledRow {
    pub fn both(statement: &StatementEntry, ledger: &LedgerEntry) -> Self {
        let mut row = Self::statement_only(statement);
        row.provenance = Provenance::Both;
        row.set_ledger(ledger);
        row
    }

    pub fn statement_only(statement: &StatementEntry) -> Self {
        ReconciledRow {
            provenance: Provenance::StatementOnly,
            deductor: Some(statement.deductor.clone()),
            statement_tan: Some(statement.tan.clone()),
            amount_paid: Some(statement.amount_paid),
            tax_deducted: Some(statement.tax_deducted),
            tds_deposited: Some(statement.tds_deposited),
            party_name: None,
            ledger_tan: None,
            ledger_amount: None,
            difference: None,
        }
    }

    pub fn ledger_only(ledger: &LedgerEntry) -> Self {
        let mut row = ReconciledRow {
            provenance: Provenance::LedgerOnly,
            deductor: None,
            statement_tan: None,
            amount_paid: None,
            tax_deducted: None,
            tds_deposited: None,
            party_name: None,
            ledger_tan: None,
            ledger_amount: None,
            difference: None,
        };
        row.set_ledger(ledger);
        row
    }

    fn set_ledger(&mut self, ledger: &LedgerEntry) {
        self.party_name = Some(ledger.party_name.clone());
        self.ledger_tan = Some(ledger.tan.clone());
        self.ledger_amount = ledger.amount;
        self.difference = difference(self.tax_deducted, self.ledger_amount);
    }

    pub fn category(&self) -> Category {
        Category::of(self)
    }
}

fn difference(tax_deducted: Option<Decimal>, ledger_amount: Option<Decimal>) -> Option<Decimal> {
    tax_deducted?.checked_sub(ledger_amount?)
}

fn group_by_tan<'a, T>(items: &'a [T], tan: impl Fn(&T) -> &str) -> BTreeMap<&'a str, Vec<&'a T>> {
    let mut groups: BTreeMap<&'a str, Vec<&'a T>> = BTreeMap::new();
    for item in items {
        groups.entry(tan(item)).or_default().push(item);
    }
    groups
}

/// Full outer join of statement and ledger entries on their TAN.
///
/// Rows come out ordered by TAN. A TAN present on both sides yields one row per
/// pair of statement and ledger entries; every other entry yields a single row.
pub fn join(statement: &[StatementEntry], ledger: &[LedgerEntry]) -> Vec<ReconciledRow> {
    let statement = group_by_tan(statement, |entry| &entry.tan);
    let ledger = group_by_tan(ledger, |entry| &entry.tan);

    let mut rows = Vec::new();
    for bucket in SortMergeDiff::new(
        statement.into_iter(),
        ledger.into_iter(),
        |(tan_a, _), (tan_b, _)| tan_a.cmp(tan_b),
    ) {
        match bucket {
            JoinResult::OnlyInFirst((_, entries)) => {
                rows.extend(entries.into_iter().map(ReconciledRow::statement_only));
            }
            JoinResult::OnlyInSecond((_, entries)) => {
                rows.extend(entries.into_iter().map(ReconciledRow::ledger_only));
            }
            JoinResult::InBoth((_, statement_entries), (_, ledger_entries)) => {
                for statement_entry in &statement_entries {
                    for ledger_entry in &ledger_entries {
                        rows.push(ReconciledRow::both(statement_entry, ledger_entry));
                    }
                }
            }
        }
    }

    rows
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub password: String,
    pub ledger: LedgerOptions,
    pub statement_skip_records: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        ReconcileOptions {
            password: DEFAULT_ARCHIVE_PASSWORD.to_owned(),
            ledger: LedgerOptions::default(),
            statement_skip_records: statement::DEFAULT_SKIP_RECORDS,
        }
    }
}

/// Where to read the two inputs of a run from.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    statement_archive: PathBuf,
    ledger: PathBuf,
    options: ReconcileOptions,
}

impl ReconcileConfig {
    pub fn new(statement_archive: PathBuf, ledger: PathBuf, options: ReconcileOptions) -> Self {
        ReconcileConfig {
            statement_archive,
            ledger,
            options,
        }
    }

    /// Read and validate both inputs. Any failure here aborts the run.
    pub fn read(&self) -> Result<ReconcileInputs> {
        let source = archive::read_report(&self.statement_archive, self.options.password.as_bytes())?;
        let ledger = ledger::read_ledger(&self.ledger, &self.options.ledger)?;
        ReconcileInputs::new(source, ledger, &self.options)
    }
}

/// Both inputs, parsed and normalized, ready to be joined.
#[derive(Debug, Clone)]
pub struct ReconcileInputs {
    report_name: String,
    ignored_reports: Vec<String>,
    statement_records: usize,
    statement: StatementExtraction,
    ledger_rows: usize,
    ledger: LedgerExtraction,
}

impl ReconcileInputs {
    pub fn new(source: ReportSource, ledger: LedgerTable, options: &ReconcileOptions) -> Result<Self> {
        let records = RecordSet::parse(&source.lines)?;
        let statement = statement::normalize_statement(&records, options.statement_skip_records)?;
        let ledger_rows = ledger.rows.len();
        let ledger = ledger::extract_identifiers(ledger);

        Ok(ReconcileInputs {
            report_name: source.name,
            ignored_reports: source.ignored,
            statement_records: records.rows().len(),
            statement,
            ledger_rows,
            ledger,
        })
    }

    pub fn statement(&self) -> &StatementExtraction {
        &self.statement
    }

    pub fn ledger(&self) -> &LedgerExtraction {
        &self.ledger
    }

    /// Join, classify and total. Depends on nothing but `self`.
    pub fn reconcile(&self) -> Reconciliation {
        let rows = join(&self.statement.entries, &self.ledger.entries);
        let report = Report::build(&rows);

        let diagnostics = Diagnostics {
            report_name: self.report_name.clone(),
            ignored_reports: self.ignored_reports.clone(),
            statement_records: self.statement_records,
            statement_skipped: self.statement.skipped,
            statement_dropped: self.statement.dropped,
            statement_entries: self.statement.entries.len(),
            ledger_rows: self.ledger_rows,
            ledger_without_tan: self.ledger.without_identifier.len(),
            ledger_amount_misses: self.ledger.amount_misses(),
            ledger_entries: self.ledger.entries.len(),
            joined_rows: rows.len(),
        };
        tracing::info!(
            joined = diagnostics.joined_rows,
            matched = report.count(Category::Matched),
            differences = report.count(Category::Differences),
            "reconciled statement against ledger"
        );

        Reconciliation {
            rows,
            report,
            diagnostics,
        }
    }
}

/// Counts of everything that was read, skipped or dropped during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub report_name: String,
    pub ignored_reports: Vec<String>,
    pub statement_records: usize,
    pub statement_skipped: usize,
    pub statement_dropped: StatementDrops,
    pub statement_entries: usize,
    pub ledger_rows: usize,
    pub ledger_without_tan: usize,
    pub ledger_amount_misses: usize,
    pub ledger_entries: usize,
    pub joined_rows: usize,
}

#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub rows: Vec<ReconciledRow>,
    pub report: Report,
    pub diagnostics: Diagnostics,
}
