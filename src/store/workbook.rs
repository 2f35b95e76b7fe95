//! Spreadsheet serialization of a [`TableSnapshot`]
//!
//! Layout: row 1 holds the merged section headers, row 2 the field titles,
//! data starts at row 3. The address cell of every data row is filled light
//! green.

use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, XlsxError};
use std::path::Path;

use super::TableSnapshot;
use crate::errors::HarvestResult;
use crate::utils::constants::{
    ADDRESS_COLUMN, ADDRESS_FILL_RGB, DATA_START_ROW, FIELD_TITLE_ROW, SECTION_HEADER_ROW,
};

const ADDRESS_HEADER: &str = "Address";
const ADDRESS_COLUMN_WIDTH: f64 = 40.0;

/// Convert a 1-based column number into the writer's 0-based index
fn xlsx_col(column: usize) -> Result<u16, XlsxError> {
    column
        .checked_sub(1)
        .and_then(|c| u16::try_from(c).ok())
        .ok_or(XlsxError::RowColumnLimitError)
}

/// Convert a 1-based row number into the writer's 0-based index
fn xlsx_row(row: usize) -> Result<u32, XlsxError> {
    row.checked_sub(1)
        .and_then(|r| u32::try_from(r).ok())
        .ok_or(XlsxError::RowColumnLimitError)
}

/// Write the snapshot to `path`
///
/// The file is written next to the destination and renamed into place, so
/// readers never observe a half-written report.
pub fn write_workbook(snapshot: &TableSnapshot, path: &Path) -> HarvestResult<()> {
    let mut workbook = build_workbook(snapshot)?;

    let staging = path.with_extension("xlsx.partial");
    workbook.save(&staging)?;
    std::fs::rename(&staging, path)?;
    Ok(())
}

fn build_workbook(snapshot: &TableSnapshot) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    let header_format = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    let title_format = Format::new()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    let address_format = Format::new().set_background_color(Color::RGB(ADDRESS_FILL_RGB));

    let header_row = xlsx_row(SECTION_HEADER_ROW as usize)?;
    let title_row = xlsx_row(FIELD_TITLE_ROW as usize)?;
    let address_col = xlsx_col(ADDRESS_COLUMN)?;

    sheet.set_column_width(address_col, ADDRESS_COLUMN_WIDTH)?;
    sheet.write_string_with_format(header_row, address_col, ADDRESS_HEADER, &header_format)?;

    for (section, range) in &snapshot.header.sections {
        let first = xlsx_col(range.start)?;
        let last = xlsx_col(range.end)?;
        if first == last {
            sheet.write_string_with_format(header_row, first, section.header(), &header_format)?;
        } else {
            sheet.merge_range(header_row, first, header_row, last, section.header(), &header_format)?;
        }
    }

    for (idx, title) in snapshot.header.titles.iter().enumerate() {
        if title.is_empty() {
            continue;
        }
        sheet.write_string_with_format(title_row, xlsx_col(idx + 1)?, title, &title_format)?;
    }

    let first_data_row = xlsx_row(DATA_START_ROW as usize)?;
    for (offset, cells) in snapshot.rows.iter().enumerate() {
        let row = first_data_row
            .checked_add(u32::try_from(offset).map_err(|_| XlsxError::RowColumnLimitError)?)
            .ok_or(XlsxError::RowColumnLimitError)?;

        for (idx, cell) in cells.iter().enumerate() {
            let Some(value) = cell else { continue };
            let col = xlsx_col(idx + 1)?;
            if idx + 1 == ADDRESS_COLUMN {
                sheet.write_string_with_format(row, col, value, &address_format)?;
            } else {
                sheet.write_string_with_format(row, col, value, &title_format)?;
            }
        }
    }

    Ok(workbook)
}
