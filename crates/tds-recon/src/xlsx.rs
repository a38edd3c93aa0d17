//! Rendering the report as a styled workbook, one sheet per table.

use std::path::Path;

use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::reconcile::Category;
use crate::report::{Cell, DIFFERENCE_COLUMN, Report, ReportTable};
use crate::{Decimal, Error, Result};

const HEADER_FILL: u32 = 0x4CAF50;
const DIFFERENCE_FILL: u32 = 0xFFCDD2;
const NUMBER_FORMAT: &str = "#,##0.00";
/// Cell texts at least this long do not widen their column.
const WIDTH_CUTOFF: usize = 50;
const WIDTH_PADDING: usize = 5;

struct Formats {
    header: Format,
    text: Format,
    number: Format,
    flagged: Format,
}

impl Formats {
    fn new() -> Self {
        let border = Format::new().set_border(FormatBorder::Thin);
        let number = border.clone().set_num_format(NUMBER_FORMAT);

        Formats {
            header: border
                .clone()
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(HEADER_FILL))
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
            flagged: number
                .clone()
                .set_background_color(Color::RGB(DIFFERENCE_FILL)),
            number,
            text: border,
        }
    }
}

/// Render the report and write it to `path`.
///
/// The workbook is assembled in memory first; `path` is only created once
/// rendering has succeeded.
#[tracing::instrument(level = "info", skip(report, path), fields(path = %path.as_ref().display()))]
pub fn write_report(report: &Report, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let buffer = report_to_buffer(report)?;
    std::fs::write(path, &buffer).map_err(|source| Error::Io {
        path: path.to_owned(),
        source,
    })?;

    tracing::info!(bytes = buffer.len(), "wrote reconciliation workbook");
    Ok(())
}

pub fn report_to_buffer(report: &Report) -> Result<Vec<u8>> {
    let formats = Formats::new();
    let mut workbook = Workbook::new();
    for table in report.tables() {
        let worksheet = workbook.add_worksheet();
        write_table(worksheet, table, &formats)?;
    }
    Ok(workbook.save_to_buffer()?)
}

fn write_table(worksheet: &mut Worksheet, table: &ReportTable, formats: &Formats) -> Result<()> {
    worksheet.set_name(table.name())?;
    let flag_differences = table.name() == Category::Differences.sheet_name();

    for (col, column) in table.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, column.header, &formats.header)?;
    }

    for (idx, row) in table.rows().iter().enumerate() {
        let row_num = idx as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            let col_num = col as u16;
            match cell {
                Cell::Blank => worksheet.write_blank(row_num, col_num, &formats.text)?,
                Cell::Text(text) => {
                    worksheet.write_string_with_format(row_num, col_num, text, &formats.text)?
                }
                Cell::Number(value) => {
                    let format = if flag_differences && is_flagged(col, *value) {
                        &formats.flagged
                    } else {
                        &formats.number
                    };
                    worksheet.write_number_with_format(
                        row_num,
                        col_num,
                        value.to_f64().unwrap_or_default(),
                        format,
                    )?
                }
            };
        }
    }

    for (col, width) in column_widths(table).into_iter().enumerate() {
        worksheet.set_column_width(col as u16, width as f64)?;
    }
    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn is_flagged(col: usize, value: Decimal) -> bool {
    col == DIFFERENCE_COLUMN && !value.is_zero()
}

/// Header length or the longest cell text under [`WIDTH_CUTOFF`] characters,
/// whichever is larger, plus padding.
fn column_widths(table: &ReportTable) -> Vec<usize> {
    table
        .columns()
        .iter()
        .enumerate()
        .map(|(col, column)| {
            let longest = table
                .rows()
                .iter()
                .map(|row| row[col].to_string().chars().count())
                .filter(|&len| len < WIDTH_CUTOFF)
                .max()
                .unwrap_or(0);
            column.header.chars().count().max(longest) + WIDTH_PADDING
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{Provenance, ReconciledRow};
    use calamine::{Data, Reader, Xlsx};
    use std::io::Cursor;

    fn row(tan: &str, deductor: &str, tax_deducted: i64, ledger_amount: Option<i64>) -> ReconciledRow {
        let tax_deducted = Decimal::new(tax_deducted, 2);
        let ledger_amount = ledger_amount.map(|amount| Decimal::new(amount, 2));
        ReconciledRow {
            provenance: Provenance::Both,
            deductor: Some(deductor.into()),
            statement_tan: Some(tan.into()),
            amount_paid: None,
            tax_deducted: Some(tax_deducted),
            tds_deposited: None,
            party_name: Some(deductor.into()),
            ledger_tan: Some(tan.into()),
            ledger_amount,
            difference: ledger_amount.map(|amount| tax_deducted - amount),
        }
    }

    fn sample_report() -> Report {
        Report::build(&[
            row("AAAA11111A", "Bank X", 100000, Some(100000)),
            row("BBBB22222B", "Employer Y", 50000, Some(45000)),
            row("CCCC33333C", "Vendor Z", 20000, None),
        ])
    }

    fn read_back(report: &Report) -> Xlsx<Cursor<Vec<u8>>> {
        let buffer = report_to_buffer(report).unwrap();
        Xlsx::new(Cursor::new(buffer)).unwrap()
    }

    #[test]
    fn sheets_are_written_in_order() {
        let workbook = read_back(&sample_report());
        assert_eq!(
            workbook.sheet_names(),
            [
                "Full_Reconciliation",
                "Matched",
                "Only_in_26AS",
                "Only_in_Books",
                "Differences"
            ]
        );
    }

    #[test]
    fn differences_sheet_holds_rows_and_total() {
        let mut workbook = read_back(&sample_report());
        let range = workbook.worksheet_range("Differences").unwrap();

        assert_eq!(range.get_value((0, 0)), Some(&Data::String("Name of Deductor".into())));
        assert_eq!(range.get_value((0, 3)), Some(&Data::String(" ".into())));
        assert_eq!(range.get_value((0, 7)), Some(&Data::String("Difference".into())));

        assert_eq!(range.get_value((1, 0)), Some(&Data::String("Employer Y".into())));
        assert_eq!(range.get_value((1, 7)), Some(&Data::Float(50.0)));
        assert_eq!(range.get_value((2, 1)), Some(&Data::String("CCCC33333C".into())));
        assert_eq!(range.get_value((2, 6)), Some(&Data::Empty));
        assert_eq!(range.get_value((2, 7)), Some(&Data::Empty));

        assert_eq!(range.get_value((3, 0)), Some(&Data::String("TOTAL".into())));
        assert_eq!(range.get_value((3, 2)), Some(&Data::Float(700.0)));
        assert_eq!(range.get_value((3, 6)), Some(&Data::Float(450.0)));
        assert_eq!(range.get_value((3, 7)), Some(&Data::Float(50.0)));
        assert_eq!(range.height(), 4);
    }

    #[test]
    fn empty_sheets_keep_header_and_total() {
        let mut workbook = read_back(&sample_report());
        let range = workbook.worksheet_range("Only_in_Books").unwrap();

        assert_eq!(range.height(), 2);
        assert_eq!(range.get_value((1, 0)), Some(&Data::String("TOTAL".into())));
        assert_eq!(range.get_value((1, 2)), Some(&Data::Float(0.0)));
    }

    #[test]
    fn only_nonzero_differences_are_flagged() {
        assert!(is_flagged(DIFFERENCE_COLUMN, Decimal::new(-1, 2)));
        assert!(!is_flagged(DIFFERENCE_COLUMN, Decimal::new(0, 2)));
        assert!(!is_flagged(DIFFERENCE_COLUMN - 1, Decimal::from(5)));
    }

    #[test]
    fn widths_ignore_long_cells() {
        let long_name = "A deductor name that is well beyond fifty characters long";
        let report = Report::build(&[row("AAAA11111A", long_name, 100, Some(100))]);
        let widths = column_widths(report.full());

        assert_eq!(widths[0], "Name of Deductor".len() + 5);
        assert_eq!(widths[1], "TAN of Deductor".len() + 5);
        assert_eq!(widths[3], 1 + 5);
        assert_eq!(widths[4], "Party_Name".len() + 5);
    }

    #[test]
    fn widths_follow_content() {
        let report = Report::build(&[row("AAAA11111A", "Tax Deducted By A Fairly Long Name", 100, Some(100))]);
        let widths = column_widths(report.full());
        assert_eq!(widths[0], "Tax Deducted By A Fairly Long Name".len() + 5);
    }

    #[test]
    fn write_report_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("TDS_Reconciliation.xlsx");
        write_report(&sample_report(), &path).unwrap();

        let mut workbook: Xlsx<_> = calamine::open_workbook(&path).unwrap();
        let range = workbook.worksheet_range("Matched").unwrap();
        assert_eq!(range.get_value((1, 1)), Some(&Data::String("AAAA11111A".into())));
    }

    #[test]
    fn write_report_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.xlsx");
        let error = write_report(&sample_report(), &path).unwrap_err();

        assert!(matches!(error, Error::Io { .. }));
        assert!(!path.exists());
    }
}
