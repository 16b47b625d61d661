use log::{debug, info};
use snafu::prelude::*;
use std::fs;

use crate::app::*;

/// Reads a voter roster file and returns the raw email entries, in file
/// order.
///
/// Entries are trimmed and blank ones dropped; deduplication and
/// canonicalization happen later in the store.
pub fn read_roster(
    path: &str,
    csv_column: Option<usize>,
    no_header: bool,
) -> AppResult<Vec<String>> {
    let emails = match csv_column {
        Some(column) => read_csv(path, column, no_header)?,
        None => read_lines(path)?,
    };
    info!("read_roster: {} entries read from {:?}", emails.len(), path);
    Ok(emails)
}

fn read_lines(path: &str) -> AppResult<Vec<String>> {
    let contents = fs::read_to_string(path).context(OpeningRosterSnafu {
        path: path.to_string(),
    })?;
    Ok(contents
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect())
}

fn read_csv(path: &str, column: usize, no_header: bool) -> AppResult<Vec<String>> {
    ensure!(column >= 1, InvalidCsvColumnSnafu { column });
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu {
            path: path.to_string(),
        })?;
    let mut emails: Vec<String> = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        // 1-based for error messages, like most spreadsheet tools.
        let lineno = idx + 1;
        if idx == 0 && !no_header {
            debug!("read_csv: skipping header line");
            continue;
        }
        let record = record.context(CsvLineParseSnafu { lineno })?;
        let cell = record
            .get(column - 1)
            .context(CsvLineTooShortSnafu { lineno, column })?;
        let cell = cell.trim();
        if !cell.is_empty() {
            emails.push(cell.to_string());
        }
    }
    Ok(emails)
}
