use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures that abort a reconciliation run before any report is produced.
///
/// Row-level problems (unparseable particulars, invalid TANs, bad amounts) are
/// not errors; they are counted in [`crate::reconcile::Diagnostics`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Wrong password, corrupt archive or unreadable entry.
    #[error("failed to extract statement archive: {0}")]
    ArchiveExtraction(#[from] zip::result::ZipError),
    #[error("no text report found in statement archive")]
    NoReportFound,
    #[error("malformed statement report: {0}")]
    MalformedReport(String),
    #[error("ledger export does not match the expected layout: {0}")]
    LedgerSchema(String),
    #[error("failed to read ledger workbook: {0}")]
    LedgerRead(#[from] calamine::XlsxError),
    #[error("failed to write reconciliation report: {0}")]
    ReportWrite(#[from] rust_xlsxwriter::XlsxError),
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
