//! Reading the text report out of the password protected statement archive.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use zip::ZipArchive;
use zip::result::ZipError;

use crate::{Error, Result};

/// The decoded text report and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSource {
    pub name: String,
    pub lines: Vec<String>,
    /// Other text reports in the same archive that were not read.
    pub ignored: Vec<String>,
}

fn is_text_report(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".txt")
}

#[tracing::instrument(level = "info", skip(path, password), fields(path = %path.as_ref().display()))]
pub fn read_report(path: impl AsRef<Path>, password: &[u8]) -> Result<ReportSource> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::Io {
        path: path.to_owned(),
        source,
    })?;
    read_report_from(BufReader::new(file), password)
}

/// Pick the text report from an archive and decode it.
///
/// When the archive holds several `.txt` entries the lexicographically first
/// one is used and the rest are listed in [`ReportSource::ignored`].
pub fn read_report_from<R: Read + Seek>(reader: R, password: &[u8]) -> Result<ReportSource> {
    let mut archive = ZipArchive::new(reader)?;

    let mut candidates = Vec::new();
    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index)?;
        if entry.is_file() && is_text_report(entry.name()) {
            candidates.push((entry.name().to_owned(), index));
        }
    }
    candidates.sort();

    let mut candidates = candidates.into_iter();
    let Some((name, index)) = candidates.next() else {
        return Err(Error::NoReportFound);
    };
    let ignored: Vec<String> = candidates.map(|(name, _)| name).collect();
    if !ignored.is_empty() {
        tracing::warn!(chosen = %name, ?ignored, "archive holds several text reports, using the first");
    }

    let mut entry = archive.by_index_decrypt(index, password)?;
    // the declared size comes from the archive header and is not trusted
    let mut bytes = Vec::new();
    entry
        .read_to_end(&mut bytes)
        .map_err(|error| Error::ArchiveExtraction(ZipError::Io(error)))?;

    let lines = lines_from_bytes(&bytes)?;
    tracing::info!(report = %name, lines = lines.len(), "extracted statement report");
    Ok(ReportSource {
        name,
        lines,
        ignored,
    })
}

/// Split decrypted report bytes into lines. The report must be UTF-8.
pub fn lines_from_bytes(bytes: &[u8]) -> Result<Vec<String>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|error| Error::MalformedReport(format!("report is not valid UTF-8: {error}")))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    Ok(text.lines().map(str::to_owned).collect())
}
