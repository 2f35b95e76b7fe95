//! Lead source reading and address cleaning
//!
//! Leads come from the first column of a spreadsheet or CSV file, read top
//! to bottom with no header row. Blank entries are dropped and order is kept.

use calamine::{Data, Reader, open_workbook_auto};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::errors::{HarvestError, HarvestResult};

// Characters that are invalid in file names on common platforms
static FORBIDDEN_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\/:*?"<>|]"#).expect("Invalid forbidden-character regex"));

/// One address to process, tagged with its position in the lead list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lead {
    index: usize,
    address: String,
}

impl Lead {
    /// Build a lead from an already-clean address
    pub fn new(index: usize, address: impl Into<String>) -> Self {
        Self {
            index,
            address: address.into(),
        }
    }

    /// Build a lead from a raw cell value; `None` if it cleans to nothing
    #[must_use]
    pub fn from_raw(index: usize, raw: &str) -> Option<Self> {
        let address = clean_address(raw);
        (!address.is_empty()).then(|| Self::new(index, address))
    }

    /// Position in the lead list (0-based)
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl fmt::Display for Lead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

/// Normalize an address cell the way it is searched and reported
///
/// Blank lines are removed, the result is trimmed, and path-hostile
/// characters become `_`.
#[must_use]
pub fn clean_address(raw: &str) -> String {
    let joined = raw
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    FORBIDDEN_CHARS
        .replace_all(joined.trim(), "_")
        .into_owned()
}

/// Turn raw first-column values into leads, dropping blanks
pub fn leads_from_values<I, S>(values: I) -> Vec<Lead>
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .flatten()
        .filter_map(|raw| {
            let address = clean_address(raw.as_ref());
            (!address.is_empty()).then_some(address)
        })
        .enumerate()
        .map(|(index, address)| Lead::new(index, address))
        .collect()
}

/// Read leads from `path`, choosing the reader by file extension
pub fn read_leads(path: &Path) -> HarvestResult<Vec<Lead>> {
    if !path.is_file() {
        return Err(HarvestError::LeadSource {
            path: path.to_path_buf(),
            message: "file does not exist".to_string(),
        });
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let leads = match extension.as_str() {
        "csv" | "txt" => read_csv_column(path)?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_sheet_column(path)?,
        other => {
            return Err(HarvestError::LeadSource {
                path: path.to_path_buf(),
                message: format!("unsupported lead file type '{other}'"),
            });
        }
    };

    info!("Loaded {} leads from {}", leads.len(), path.display());
    Ok(leads)
}

fn read_sheet_column(path: &Path) -> HarvestResult<Vec<Lead>> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| HarvestError::LeadSource {
            path: path.to_path_buf(),
            message: "workbook has no sheets".to_string(),
        })??;

    let (Some(start), Some(end)) = (range.start(), range.end()) else {
        debug!("Lead sheet is empty");
        return Ok(Vec::new());
    };

    // Absolute positions so a sheet whose used range starts right of column A
    // still reads column A (as empty)
    let values = (start.0..=end.0).map(|row| match range.get_value((row, 0)) {
        Some(Data::Empty) | None => None,
        Some(cell) => Some(cell.to_string()),
    });
    Ok(leads_from_values(values))
}

fn read_csv_column(path: &Path) -> HarvestResult<Vec<Lead>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record?;
        values.push(record.get(0).map(str::to_string));
    }
    Ok(leads_from_values(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_entries_are_dropped_in_order() {
        let leads = leads_from_values([Some("123 Main St"), Some(""), None, Some("456 Oak Ave")]);
        let addresses: Vec<_> = leads.iter().map(Lead::address).collect();
        assert_eq!(addresses, ["123 Main St", "456 Oak Ave"]);
        assert_eq!(leads[1].index(), 1);
    }

    #[test]
    fn address_cleaning() {
        assert_eq!(clean_address("  12 Elm St  "), "12 Elm St");
        assert_eq!(clean_address("12 Elm St\n\n  \nApt 4"), "12 Elm St\nApt 4");
        assert_eq!(clean_address("1/2 Main: \"A\""), "1_2 Main_ _A_");
        assert_eq!(clean_address(" \n \n"), "");
    }

    #[test]
    fn whitespace_only_cell_is_not_a_lead() {
        assert!(Lead::from_raw(0, "   ").is_none());
        assert_eq!(
            Lead::from_raw(3, " 9 Pine ").map(|l| l.address().to_string()),
            Some("9 Pine".to_string())
        );
    }

    #[test]
    fn csv_first_column_without_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("leads.csv");
        std::fs::write(&path, "123 Main St,ignored\n,\n456 Oak Ave\n").expect("write");
        let leads = read_leads(&path).expect("read");
        let addresses: Vec<_> = leads.iter().map(Lead::address).collect();
        assert_eq!(addresses, ["123 Main St", "456 Oak Ave"]);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("leads.pdf");
        std::fs::write(&path, "x").expect("write");
        assert!(matches!(
            read_leads(&path),
            Err(HarvestError::LeadSource { .. })
        ));
    }
}
