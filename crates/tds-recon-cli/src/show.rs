use std::path::Path;

use anstyle::{AnsiColor, Color, Style};
use anyhow::{Context, Result};
use tds_recon::Decimal;
use tds_recon::ledger::PARTICULARS_COLUMN;
use tds_recon::reconcile::{Category, ReconcileConfig, ReconciledRow, Reconciliation};
use tds_recon::xlsx;

fn category_style(category: Category) -> Style {
    let color = match category {
        Category::Matched => AnsiColor::Green,
        Category::OnlyInStatement => AnsiColor::Yellow,
        Category::OnlyInLedger => AnsiColor::Cyan,
        Category::Differences => AnsiColor::Red,
    };
    Style::new().fg_color(Some(Color::Ansi(color)))
}

pub fn write_report(config: &ReconcileConfig, output: &Path) -> Result<()> {
    let reconciliation = config.read()?.reconcile();

    xlsx::write_report(&reconciliation.report, output)
        .with_context(|| format!("Failed to write report: {}", output.display()))?;

    print_summary(&reconciliation);
    println!("✓ Wrote {}", output.display());
    Ok(())
}

pub fn show_diff(config: &ReconcileConfig) -> Result<()> {
    let inputs = config.read()?;
    let reconciliation = inputs.reconcile();
    println!(
        "{} deductor row(s) in the statement, {} ledger row(s) with a TAN",
        inputs.statement().entries.len(),
        inputs.ledger().entries.len()
    );
    println!();

    for category in Category::ALL {
        if category == Category::Matched {
            continue;
        }
        let style = category_style(category);
        let rows: Vec<&ReconciledRow> = reconciliation
            .rows
            .iter()
            .filter(|row| row.category() == category)
            .collect();
        if rows.is_empty() {
            continue;
        }

        println!("{style}━━━ {} ━━━{style:#}", category.sheet_name());
        for row in rows {
            println!("{}", format_row(row));
        }
        println!();
    }

    let without_tan = &inputs.ledger().without_identifier;
    if !without_tan.is_empty() {
        let dimmed = Style::new().dimmed();
        println!("{dimmed}━━━ Ledger rows without TAN ({PARTICULARS_COLUMN}) ━━━{dimmed:#}");
        for row in without_tan {
            println!("  row {:>4}  {}", row.row, row.particulars);
        }
        println!();
    }

    print_summary(&reconciliation);
    Ok(())
}

fn amount(value: Option<Decimal>) -> String {
    value.map_or_else(|| "-".to_string(), |value| value.to_string())
}

fn format_row(row: &ReconciledRow) -> String {
    let tan = row
        .statement_tan
        .as_deref()
        .or(row.ledger_tan.as_deref())
        .unwrap_or("-");
    let name = row
        .deductor
        .as_deref()
        .or(row.party_name.as_deref())
        .unwrap_or("-");
    format!(
        "  {:<10}  {tan}  {name:<30}  26AS {:>12}  Books {:>12}  Diff {:>12}",
        row.provenance.as_str(),
        amount(row.tax_deducted),
        amount(row.ledger_amount),
        amount(row.difference),
    )
}

fn print_summary(reconciliation: &Reconciliation) {
    let bold = Style::new().bold();
    let report = &reconciliation.report;
    let diagnostics = &reconciliation.diagnostics;

    println!("{bold}━━━ Summary ━━━{bold:#}");
    println!("  statement report: {}", diagnostics.report_name);
    for category in Category::ALL {
        let style = category_style(category);
        println!(
            "  {style}{:>4}{style:#} {}",
            report.count(category),
            category.sheet_name()
        );
    }

    let warning = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow)));
    if !diagnostics.ignored_reports.is_empty() {
        println!(
            "  {warning}ignored other text reports in the archive: {}{warning:#}",
            diagnostics.ignored_reports.join(", ")
        );
    }
    let dropped = diagnostics.statement_dropped;
    if dropped.total() > 0 {
        println!(
            "  {warning}{}{warning:#} statement row(s) dropped ({} blank, {} invalid TAN, {} missing amount)",
            dropped.total(),
            dropped.blank,
            dropped.invalid_tan,
            dropped.missing_amount
        );
    }
    if diagnostics.ledger_without_tan > 0 {
        println!(
            "  {warning}{}{warning:#} of {} ledger row(s) carry no TAN",
            diagnostics.ledger_without_tan, diagnostics.ledger_rows
        );
    }
    if diagnostics.ledger_amount_misses > 0 {
        println!(
            "  {warning}{}{warning:#} ledger amount(s) could not be read as numbers",
            diagnostics.ledger_amount_misses
        );
    }
}
