use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use calamine::{Data, Reader, Xlsx, open_workbook};
use rust_xlsxwriter::Workbook;
use tds_recon::reconcile::{Category, ReconcileConfig, ReconcileOptions};
use tds_recon::{DEFAULT_ARCHIVE_PASSWORD, Error, xlsx};
use zip::AesMode;
use zip::write::SimpleFileOptions;

const HEADER: &str = "Sr. No.^Name of Deductor^TAN of Deductor^Total Amount Paid / Credited(Rs.)^Total Tax Deducted(Rs.)^Total TDS Deposited(Rs.)";

fn write_statement(dir: &Path, records: &[&str], password: &str) -> PathBuf {
    let mut text = String::from(
        "File Creation Date^19-10-2026\r\n\
         Permanent Account Number (PAN)^Financial Year^Assessment Year\r\n\
         ABCDE1234F^2025-26^2026-27\r\n\
         \r\n\
         PART-I - Details of Tax Deducted at Source\r\n",
    );
    for line in [HEADER, "^^^^^", "PART-I^^^^^"].iter().chain(records) {
        text.push_str(line);
        text.push_str("\r\n");
    }

    let path = dir.join("ABCDE1234F-2026.zip");
    let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
    let options = SimpleFileOptions::default().with_aes_encryption(AesMode::Aes256, password);
    zip.start_file("ABCDE1234F-2026.txt", options).unwrap();
    zip.write_all(text.as_bytes()).unwrap();
    zip.finish().unwrap();
    path
}

fn write_ledger(dir: &Path, rows: &[(&str, Option<f64>)]) -> PathBuf {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Acme Traders Pvt Ltd").unwrap();
    sheet.write_string(1, 0, "Mumbai").unwrap();
    sheet.write_string(3, 0, "TDS Receivable").unwrap();
    sheet.write_string(4, 0, "Ledger Account").unwrap();
    sheet.write_string(6, 0, "1-Apr-2025 to 31-Mar-2026").unwrap();
    sheet.write_string(13, 0, "Particulars").unwrap();
    sheet.write_string(13, 1, "Transactions").unwrap();
    sheet.write_string(13, 2, "Closing Balance").unwrap();
    for (idx, (particulars, amount)) in rows.iter().enumerate() {
        let row = 14 + idx as u32;
        sheet.write_string(row, 0, *particulars).unwrap();
        if let Some(amount) = amount {
            sheet.write_number(row, 1, *amount).unwrap();
        }
    }

    let path = dir.join("ledger.xlsx");
    workbook.save(&path).unwrap();
    path
}

fn string(value: &str) -> Data {
    Data::String(value.into())
}

#[test]
fn single_match_produces_matched_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let statement = write_statement(
        dir.path(),
        &["1^Bank X^AAAA11111A^10000.00^1000.00^1000.00"],
        DEFAULT_ARCHIVE_PASSWORD,
    );
    let ledger = write_ledger(dir.path(), &[("TDS -Bank X(AAAA11111A)", Some(1000.0))]);

    let config = ReconcileConfig::new(statement, ledger, ReconcileOptions::default());
    let reconciliation = config.read().unwrap().reconcile();
    assert_eq!(reconciliation.report.count(Category::Matched), 1);
    assert_eq!(reconciliation.report.count(Category::Differences), 0);

    let output = dir.path().join("TDS_Reconciliation.xlsx");
    xlsx::write_report(&reconciliation.report, &output).unwrap();

    let mut workbook: Xlsx<_> = open_workbook(&output).unwrap();
    let matched = workbook.worksheet_range("Matched").unwrap();
    assert_eq!(matched.height(), 3);
    assert_eq!(matched.get_value((1, 0)), Some(&string("Bank X")));
    assert_eq!(matched.get_value((1, 1)), Some(&string("AAAA11111A")));
    assert_eq!(matched.get_value((1, 4)), Some(&string("Bank X")));
    assert_eq!(matched.get_value((1, 7)), Some(&Data::Float(0.0)));
    assert_eq!(matched.get_value((2, 0)), Some(&string("TOTAL")));
    assert_eq!(matched.get_value((2, 7)), Some(&Data::Float(0.0)));
}

#[test]
fn mixed_inputs_land_in_every_category() {
    let dir = tempfile::tempdir().unwrap();
    let statement = write_statement(
        dir.path(),
        &[
            "1^Bank X^AAAA11111A^10000.00^1000.00^1000.00",
            "2^Employer Y^BBBB22222B^50000.00^5000.00^5000.00",
            "3^Only Statement^ABCD123456^3000.00^300.00^300.00",
            "^1^194A^31-Mar-2026^F^04-Apr-2026^-^10000.00^1000.00^1000.00",
        ],
        DEFAULT_ARCHIVE_PASSWORD,
    );
    let ledger = write_ledger(
        dir.path(),
        &[
            ("Opening Balance", Some(10.0)),
            ("TDS -Bank X(AAAA11111A)", Some(1000.0)),
            ("TDS -Employer Y(BBBB22222B)", Some(4500.0)),
            ("TDS -Vendor Z(ZZZZ99999Z)", Some(75.0)),
        ],
    );

    let config = ReconcileConfig::new(statement, ledger, ReconcileOptions::default());
    let reconciliation = config.read().unwrap().reconcile();

    let report = &reconciliation.report;
    assert_eq!(report.count(Category::Matched), 1);
    assert_eq!(report.count(Category::Differences), 1);
    assert_eq!(report.count(Category::OnlyInStatement), 1);
    assert_eq!(report.count(Category::OnlyInLedger), 1);
    assert_eq!(report.full().data_rows().len(), 4);

    let diagnostics = &reconciliation.diagnostics;
    assert_eq!(diagnostics.report_name, "ABCDE1234F-2026.txt");
    assert_eq!(diagnostics.ledger_rows, 4);
    assert_eq!(diagnostics.ledger_without_tan, 1);
    assert_eq!(diagnostics.statement_dropped.invalid_tan, 1);

    let buffer = xlsx::report_to_buffer(report).unwrap();
    let mut workbook = Xlsx::new(std::io::Cursor::new(buffer)).unwrap();
    let differences = workbook.worksheet_range("Differences").unwrap();
    assert_eq!(differences.get_value((1, 1)), Some(&string("BBBB22222B")));
    assert_eq!(differences.get_value((1, 7)), Some(&Data::Float(500.0)));
    assert_eq!(differences.get_value((2, 7)), Some(&Data::Float(500.0)));

    let only_books = workbook.worksheet_range("Only_in_Books").unwrap();
    assert_eq!(only_books.get_value((1, 4)), Some(&string("Vendor Z")));
    assert_eq!(only_books.get_value((1, 0)), Some(&Data::Empty));
}

#[test]
fn zipcrypto_archive_from_the_portal() {
    let dir = tempfile::tempdir().unwrap();
    let statement = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/zipcrypto-26as.zip");
    let ledger = write_ledger(dir.path(), &[("TDS -Bank X(AAAA11111A)", Some(1000.0))]);

    let config = ReconcileConfig::new(statement.clone(), ledger.clone(), ReconcileOptions::default());
    let reconciliation = config.read().unwrap().reconcile();
    assert_eq!(reconciliation.diagnostics.report_name, "ABCDE1234F-2026.txt");
    assert_eq!(reconciliation.report.count(Category::Matched), 1);

    let options = ReconcileOptions {
        password: "01011970".into(),
        ..Default::default()
    };
    let error = ReconcileConfig::new(statement, ledger, options).read().unwrap_err();
    assert!(matches!(error, Error::ArchiveExtraction(_)), "{error}");
}

#[test]
fn wrong_password_aborts_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let statement = write_statement(
        dir.path(),
        &["1^Bank X^AAAA11111A^10000.00^1000.00^1000.00"],
        "not-the-default",
    );
    let ledger = write_ledger(dir.path(), &[]);

    let config = ReconcileConfig::new(statement, ledger, ReconcileOptions::default());
    let error = config.read().unwrap_err();
    assert!(matches!(error, Error::ArchiveExtraction(_)), "{error}");
}

#[test]
fn custom_password_and_amount_column() {
    let dir = tempfile::tempdir().unwrap();
    let statement = write_statement(
        dir.path(),
        &["1^Bank X^AAAA11111A^10000.00^1000.00^1000.00"],
        "s3cret",
    );
    let ledger = write_ledger(dir.path(), &[("TDS -Bank X(AAAA11111A)", Some(1000.0))]);

    let mut options = ReconcileOptions {
        password: "s3cret".into(),
        ..Default::default()
    };
    options.ledger.amount_column = "Closing Balance".into();
    let config = ReconcileConfig::new(statement, ledger, options);
    let reconciliation = config.read().unwrap().reconcile();

    // the closing balance column is empty, so the ledger amount is missing
    assert_eq!(reconciliation.report.count(Category::Differences), 1);
    assert_eq!(reconciliation.diagnostics.ledger_amount_misses, 1);
}
