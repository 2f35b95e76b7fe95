//! Fixed output layout of the property report
//!
//! The report is a single sheet: column 1 carries the lead's address, then
//! five sections follow left to right, each a contiguous block of columns
//! with one field title per column. Field names discovered on a page are
//! mapped to columns by scanning the title row inside one section's range,
//! so the column of a field is a pure function of the schema.

mod definitions;

pub use definitions::{
    DEED_TITLES, DISTRESS_TITLES, GENERAL_INFO_TITLES, HOUSE_FEATURE_TITLES, MORTGAGE_TITLES,
};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::constants::ADDRESS_COLUMN;

/// Identifies one output section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionId {
    GeneralInfo,
    HouseFeatures,
    Deed,
    Mortgage,
    Distress,
}

impl SectionId {
    /// All sections in layout order
    pub const ALL: [SectionId; 5] = [
        Self::GeneralInfo,
        Self::HouseFeatures,
        Self::Deed,
        Self::Mortgage,
        Self::Distress,
    ];

    /// Header text of the merged section cell
    #[must_use]
    pub const fn header(self) -> &'static str {
        match self {
            Self::GeneralInfo => "general infos",
            Self::HouseFeatures => "house features",
            Self::Deed => "deed",
            Self::Mortgage => "mortgage",
            Self::Distress => "distress",
        }
    }

    /// Section fed by a record tab with the given label
    ///
    /// Only the three history panels map to a section; `Tax` and any
    /// unknown label return `None`.
    #[must_use]
    pub fn for_panel_title(title: &str) -> Option<Self> {
        match title.trim() {
            "Deed" => Some(Self::Deed),
            "Mortgage" => Some(Self::Mortgage),
            "Distressed" => Some(Self::Distress),
            _ => None,
        }
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Inclusive range of 1-based column numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRange {
    pub start: usize,
    pub end: usize,
}

impl ColumnRange {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.end + 1 - self.start
    }

    #[must_use]
    pub const fn contains(&self, column: usize) -> bool {
        column >= self.start && column <= self.end
    }
}

/// One section: a named block of field titles and where it sits
#[derive(Debug, Clone)]
pub struct Section {
    pub id: SectionId,
    pub titles: Vec<String>,
    pub range: ColumnRange,
}

impl Section {
    #[must_use]
    pub fn width(&self) -> usize {
        self.range.width()
    }
}

/// Header rows produced by [`SchemaRegistry::build_header`]
#[derive(Debug, Clone)]
pub struct HeaderLayout {
    /// Merged section headers in layout order
    pub sections: Vec<(SectionId, ColumnRange)>,
    /// Title row, index 0 is column 1 (empty for the address column)
    pub titles: Vec<String>,
}

/// Immutable registry of sections and their column spans
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    sections: Vec<Section>,
    /// Field title per column; index 0 is column 1
    title_row: Vec<String>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl SchemaRegistry {
    /// The report layout used by the harvester
    #[must_use]
    pub fn standard() -> Self {
        Self::from_definitions(&[
            (SectionId::GeneralInfo, GENERAL_INFO_TITLES),
            (SectionId::HouseFeatures, HOUSE_FEATURE_TITLES),
            (SectionId::Deed, DEED_TITLES),
            (SectionId::Mortgage, MORTGAGE_TITLES),
            (SectionId::Distress, DISTRESS_TITLES),
        ])
    }

    /// Lay out sections contiguously, starting right after the address column
    #[must_use]
    pub fn from_definitions(definitions: &[(SectionId, &[&str])]) -> Self {
        let mut sections = Vec::with_capacity(definitions.len());
        let mut title_row = vec![String::new(); ADDRESS_COLUMN];
        let mut next = ADDRESS_COLUMN + 1;

        for (id, titles) in definitions {
            if titles.is_empty() {
                continue;
            }
            let range = ColumnRange::new(next, next + titles.len() - 1);
            title_row.extend(titles.iter().map(|t| (*t).to_string()));
            sections.push(Section {
                id: *id,
                titles: titles.iter().map(|t| (*t).to_string()).collect(),
                range,
            });
            next = range.end + 1;
        }

        Self {
            sections,
            title_row,
        }
    }

    /// Section headers and the field-title row
    #[must_use]
    pub fn build_header(&self) -> HeaderLayout {
        HeaderLayout {
            sections: self.sections.iter().map(|s| (s.id, s.range)).collect(),
            titles: self.title_row.clone(),
        }
    }

    /// First column inside `range` whose title equals `field`
    ///
    /// The range is clamped to the table. Unknown fields return `None` and
    /// are dropped by callers.
    #[must_use]
    pub fn resolve_column(&self, range: ColumnRange, field: &str) -> Option<usize> {
        let end = range.end.min(self.title_row.len());
        (range.start.max(1)..=end).find(|&col| self.title_row[col - 1] == field)
    }

    /// Resolve `field` inside a section's own range
    #[must_use]
    pub fn resolve_in(&self, section: SectionId, field: &str) -> Option<usize> {
        self.range(section)
            .and_then(|range| self.resolve_column(range, field))
    }

    #[must_use]
    pub fn range(&self, section: SectionId) -> Option<ColumnRange> {
        self.section(section).map(|s| s.range)
    }

    #[must_use]
    pub fn section(&self, section: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == section)
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Columns in a row, address column included
    #[must_use]
    pub fn total_columns(&self) -> usize {
        self.title_row.len()
    }

    /// Title of a 1-based column
    #[must_use]
    pub fn title_at(&self, column: usize) -> Option<&str> {
        column
            .checked_sub(1)
            .and_then(|idx| self.title_row.get(idx))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn standard_layout_spans() {
        let schema = SchemaRegistry::standard();
        assert_eq!(schema.range(SectionId::GeneralInfo), Some(ColumnRange::new(2, 9)));
        assert_eq!(schema.range(SectionId::HouseFeatures), Some(ColumnRange::new(10, 17)));
        assert_eq!(schema.range(SectionId::Deed), Some(ColumnRange::new(18, 43)));
        assert_eq!(schema.range(SectionId::Mortgage), Some(ColumnRange::new(44, 73)));
        assert_eq!(schema.range(SectionId::Distress), Some(ColumnRange::new(74, 97)));
        assert_eq!(schema.total_columns(), 97);
    }

    #[test]
    fn sections_are_contiguous_and_cover_the_table() {
        let schema = SchemaRegistry::standard();
        let header = schema.build_header();

        let mut expected_start = ADDRESS_COLUMN + 1;
        let mut width_sum = 0;
        for (_, range) in &header.sections {
            assert_eq!(range.start, expected_start);
            expected_start = range.end + 1;
            width_sum += range.width();
        }
        assert_eq!(width_sum + ADDRESS_COLUMN, schema.total_columns());
        assert_eq!(header.titles.len(), schema.total_columns());
    }

    #[test]
    fn same_name_resolves_per_section() {
        let schema = SchemaRegistry::standard();
        let deed = schema.resolve_in(SectionId::Deed, "Document #");
        let mortgage = schema.resolve_in(SectionId::Mortgage, "Document #");
        let distress = schema.resolve_in(SectionId::Distress, "Document #");
        assert_eq!(deed, Some(18));
        assert_eq!(mortgage, Some(44));
        assert_eq!(distress, Some(74));
    }

    #[test]
    fn unknown_field_is_unresolved() {
        let schema = SchemaRegistry::standard();
        assert_eq!(schema.resolve_in(SectionId::Deed, "Favourite Colour"), None);
        // Known title, wrong section
        assert_eq!(schema.resolve_in(SectionId::Deed, "Bedrooms*"), None);
    }

    #[test]
    fn range_is_clamped_to_table() {
        let schema = SchemaRegistry::standard();
        let wide = ColumnRange::new(74, 10_000);
        assert_eq!(schema.resolve_column(wide, "Auction Date"), Some(96));
    }

    #[test]
    fn panel_titles() {
        assert_eq!(SectionId::for_panel_title("Deed"), Some(SectionId::Deed));
        assert_eq!(SectionId::for_panel_title(" Mortgage "), Some(SectionId::Mortgage));
        assert_eq!(SectionId::for_panel_title("Distressed"), Some(SectionId::Distress));
        assert_eq!(SectionId::for_panel_title("Tax"), None);
        assert_eq!(SectionId::for_panel_title("Listing"), None);
    }

    proptest! {
        #[test]
        fn every_title_resolves_to_its_own_column(section_idx in 0usize..5, title_seed in any::<prop::sample::Index>()) {
            let schema = SchemaRegistry::standard();
            let section = &schema.sections()[section_idx];
            let title_idx = title_seed.index(section.titles.len());
            let title = &section.titles[title_idx];
            let first = section.titles.iter().position(|t| t == title).unwrap_or(title_idx);

            let col = schema.resolve_column(section.range, title);
            prop_assert_eq!(col, Some(section.range.start + first));
            prop_assert_eq!(schema.resolve_column(section.range, title), col);
        }

        #[test]
        fn resolution_never_leaves_the_range(start in 1usize..120, len in 0usize..40, field in "[A-Za-z #*()]{1,24}") {
            let schema = SchemaRegistry::standard();
            let range = ColumnRange::new(start, start + len);
            if let Some(col) = schema.resolve_column(range, &field) {
                prop_assert!(range.contains(col));
                prop_assert_eq!(schema.title_at(col), Some(field.as_str()));
            }
        }
    }
}
