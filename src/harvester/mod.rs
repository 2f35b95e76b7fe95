//! Record table harvesting
//!
//! A record panel renders one history entry as a two-column table: field
//! names down the first column, values down the second. The report wants
//! one horizontal record per lead, so the captured grid is transposed and
//! the first two transposed rows become the (title, value) pairs.

use tracing::{debug, trace};

use crate::schema::SectionId;
use crate::session::{Locator, PageSession, TableCapture};
use crate::errors::LeadResult;
use crate::store::{AggregationStore, RowHandle};

/// Swap rows and columns
///
/// Ragged input is truncated to its shortest row, so every output row has
/// exactly one entry per input row.
#[must_use]
pub fn transpose(grid: &[Vec<String>]) -> Vec<Vec<String>> {
    let width = grid.iter().map(Vec::len).min().unwrap_or(0);
    (0..width)
        .map(|col| grid.iter().map(|row| row[col].clone()).collect())
        .collect()
}

/// (title, value) pairs read from a captured table
///
/// Fewer than two columns means there is nothing to pair and yields no
/// pairs.
#[must_use]
pub fn pairs_from_table(table: TableCapture) -> Vec<(String, String)> {
    let columns = transpose(&table.into_grid());
    match columns.as_slice() {
        [titles, values, ..] => titles
            .iter()
            .zip(values)
            .map(|(title, value)| (title.trim().to_string(), value.trim().to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Write the pairs into `row`, restricted to `section`'s column range
///
/// Returns how many pairs landed in a column. An empty pair list leaves
/// the row untouched.
pub fn fold_into_row(
    store: &AggregationStore,
    row: &RowHandle,
    section: SectionId,
    pairs: &[(String, String)],
) -> usize {
    let Some(range) = store.schema().range(section) else {
        return 0;
    };

    let mut written = 0;
    for (title, value) in pairs {
        if store.set_field(row, range, title, value.as_str()) {
            written += 1;
        } else {
            trace!(section = %section, field = %title, "Dropping unknown field");
        }
    }
    written
}

/// Read the table at `locator` and fold it into `row`
pub async fn harvest_table(
    session: &mut dyn PageSession,
    locator: &Locator,
    store: &AggregationStore,
    row: &RowHandle,
    section: SectionId,
) -> LeadResult<usize> {
    let table = session.read_table(locator).await?;
    let pairs = pairs_from_table(table);
    if pairs.is_empty() {
        debug!(section = %section, "Record table is empty");
        return Ok(0);
    }
    let written = fold_into_row(store, row, section, &pairs);
    debug!(section = %section, written, total = pairs.len(), "Harvested record table");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leads::Lead;
    use crate::schema::SchemaRegistry;
    use crate::store::RowOrder;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn s(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn panel_table_becomes_title_value_pairs() {
        let table = TableCapture {
            header: s(&["Recording Date", "03/14/2019"]),
            rows: vec![s(&["Sale Price", "$310,000"]), s(&["Buyer Name", "Jane Doe"])],
        };
        assert_eq!(
            pairs_from_table(table),
            vec![
                ("Recording Date".to_string(), "03/14/2019".to_string()),
                ("Sale Price".to_string(), "$310,000".to_string()),
                ("Buyer Name".to_string(), "Jane Doe".to_string()),
            ]
        );
    }

    #[test]
    fn ragged_rows_truncate() {
        let grid = vec![s(&["a", "b", "c"]), s(&["d", "e"])];
        assert_eq!(transpose(&grid), vec![s(&["a", "d"]), s(&["b", "e"])]);
    }

    #[test]
    fn single_column_yields_nothing() {
        let table = TableCapture {
            header: s(&["Document #"]),
            rows: vec![s(&["Sale Price"])],
        };
        assert!(pairs_from_table(table).is_empty());
        assert!(pairs_from_table(TableCapture::default()).is_empty());
    }

    #[test]
    fn empty_table_does_not_blank_existing_cells() {
        let store = AggregationStore::new(Arc::new(SchemaRegistry::standard()), RowOrder::Completion);
        let row = store.allocate_row(&Lead::new(0, "1 Elm"));
        assert!(store.set_section_field(&row, SectionId::Deed, "Sale Price", "$1"));

        let pairs = pairs_from_table(TableCapture::default());
        assert_eq!(fold_into_row(&store, &row, SectionId::Deed, &pairs), 0);

        let col = store.schema().resolve_in(SectionId::Deed, "Sale Price");
        assert_eq!(col.and_then(|c| store.cell(row.id(), c)).as_deref(), Some("$1"));
    }

    #[test]
    fn fields_stay_inside_their_section() {
        let store = AggregationStore::new(Arc::new(SchemaRegistry::standard()), RowOrder::Completion);
        let row = store.allocate_row(&Lead::new(0, "1 Elm"));
        let pairs = vec![
            ("Borrower Name".to_string(), "Sam".to_string()),
            ("Bedrooms*".to_string(), "4".to_string()),
        ];
        assert_eq!(fold_into_row(&store, &row, SectionId::Mortgage, &pairs), 1);
        let bedrooms = store.schema().resolve_in(SectionId::HouseFeatures, "Bedrooms*");
        assert_eq!(bedrooms.and_then(|c| store.cell(row.id(), c)), None);
    }

    proptest! {
        #[test]
        fn transpose_twice_is_identity_for_rectangles(rows in 1usize..6, cols in 1usize..6, seed in any::<u32>()) {
            let grid: Vec<Vec<String>> = (0..rows)
                .map(|r| (0..cols).map(|c| format!("{seed}-{r}-{c}")).collect())
                .collect();
            let once = transpose(&grid);
            prop_assert_eq!(once.len(), cols);
            prop_assert_eq!(transpose(&once), grid);
        }
    }
}
