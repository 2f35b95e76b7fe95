//! Shared aggregation store for the output table
//!
//! The store is the only mutable state shared by concurrent pipelines:
//! - Row allocation happens under one write lock, so the row number and
//!   the address write form a single atomic step.
//! - Each allocated row is handed out as a [`RowHandle`], which is not
//!   `Clone`. The pipeline that allocated the row is its only writer, so
//!   field writes only touch that row's own mutex and never the table lock.
//! - Persisting snapshots the table under the read lock (never mid-allocation)
//!   and is serialized against itself by a separate gate.

pub mod workbook;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::{HarvestError, HarvestResult};
use crate::leads::Lead;
use crate::schema::{ColumnRange, HeaderLayout, SchemaRegistry, SectionId};
use crate::utils::constants::ADDRESS_COLUMN;

/// Order in which committed rows are written to the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RowOrder {
    /// Rows appear in the order leads were committed (run-dependent)
    #[default]
    Completion,
    /// Rows appear in lead-list order, regardless of completion time
    LeadIndex,
}

/// Allocation-order identifier of a row (0 = first allocated)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(pub usize);

#[derive(Debug)]
struct RowCells {
    lead_index: usize,
    cells: Vec<Option<String>>,
}

/// Exclusive write access to one allocated row
#[derive(Debug)]
pub struct RowHandle {
    id: RowId,
    lead_index: usize,
    cells: Arc<Mutex<RowCells>>,
}

impl RowHandle {
    #[must_use]
    pub fn id(&self) -> RowId {
        self.id
    }

    #[must_use]
    pub fn lead_index(&self) -> usize {
        self.lead_index
    }
}

/// Point-in-time copy of the table, ready to serialize
#[derive(Debug, Clone)]
pub struct TableSnapshot {
    pub header: HeaderLayout,
    /// Data rows in report order; index 0 of each row is column 1
    pub rows: Vec<Vec<Option<String>>>,
}

/// Output table shared by every pipeline of a run
#[derive(Debug)]
pub struct AggregationStore {
    schema: Arc<SchemaRegistry>,
    order: RowOrder,
    rows: RwLock<Vec<Arc<Mutex<RowCells>>>>,
    persist_gate: tokio::sync::Mutex<()>,
}

impl AggregationStore {
    #[must_use]
    pub fn new(schema: Arc<SchemaRegistry>, order: RowOrder) -> Self {
        Self {
            schema,
            order,
            rows: RwLock::new(Vec::new()),
            persist_gate: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    /// Reserve the next row and write the lead's address into column 1
    pub fn allocate_row(&self, lead: &Lead) -> RowHandle {
        let mut cells = vec![None; self.schema.total_columns()];
        cells[ADDRESS_COLUMN - 1] = Some(lead.address().to_string());
        let row = Arc::new(Mutex::new(RowCells {
            lead_index: lead.index(),
            cells,
        }));

        let mut rows = self.rows.write();
        let id = RowId(rows.len());
        rows.push(Arc::clone(&row));
        drop(rows);

        debug!(row = id.0, lead = %lead.address(), "Allocated row");
        RowHandle {
            id,
            lead_index: lead.index(),
            cells: row,
        }
    }

    /// Write `value` under `field` within `range`; returns false if unresolved
    pub fn set_field(
        &self,
        row: &RowHandle,
        range: ColumnRange,
        field: &str,
        value: impl Into<String>,
    ) -> bool {
        let Some(column) = self.schema.resolve_column(range, field) else {
            return false;
        };
        row.cells.lock().cells[column - 1] = Some(value.into());
        true
    }

    /// [`set_field`](Self::set_field) restricted to a section's own range
    pub fn set_section_field(
        &self,
        row: &RowHandle,
        section: SectionId,
        field: &str,
        value: impl Into<String>,
    ) -> bool {
        match self.schema.range(section) {
            Some(range) => self.set_field(row, range, field, value),
            None => false,
        }
    }

    /// Number of allocated rows
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.read().len()
    }

    /// Value of a 1-based column in an allocated row
    #[must_use]
    pub fn cell(&self, row: RowId, column: usize) -> Option<String> {
        let rows = self.rows.read();
        let cells = rows.get(row.0)?.lock();
        column
            .checked_sub(1)
            .and_then(|idx| cells.cells.get(idx))
            .cloned()
            .flatten()
    }

    /// Copy of an allocated row, column 1 first
    #[must_use]
    pub fn read_row(&self, row: RowId) -> Option<Vec<Option<String>>> {
        let rows = self.rows.read();
        let cells = rows.get(row.0)?.lock();
        Some(cells.cells.clone())
    }

    /// Consistent copy of the whole table in report order
    #[must_use]
    pub fn snapshot(&self) -> TableSnapshot {
        let rows = self.rows.read();
        let mut keyed: Vec<(usize, Vec<Option<String>>)> = rows
            .iter()
            .map(|row| {
                let guard = row.lock();
                (guard.lead_index, guard.cells.clone())
            })
            .collect();
        drop(rows);

        if self.order == RowOrder::LeadIndex {
            keyed.sort_by_key(|(lead_index, _)| *lead_index);
        }

        TableSnapshot {
            header: self.schema.build_header(),
            rows: keyed.into_iter().map(|(_, cells)| cells).collect(),
        }
    }

    /// Make `destination` ready and write the empty header table to it
    ///
    /// Any file already at the path is removed first. Failing here is fatal
    /// to the run, before any lead is processed.
    pub async fn initialize(&self, destination: &Path) -> HarvestResult<()> {
        let output_error = |message: String| HarvestError::Output {
            path: destination.to_path_buf(),
            message,
        };

        if let Some(parent) = destination.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| output_error(format!("cannot create directory: {e}")))?;
        }

        if tokio::fs::try_exists(destination).await.unwrap_or(false) {
            tokio::fs::remove_file(destination)
                .await
                .map_err(|e| output_error(format!("close the file first ({e})")))?;
        }

        self.persist(destination)
            .await
            .map_err(|e| output_error(e.to_string()))?;
        info!("Output initialized at {}", destination.display());
        Ok(())
    }

    /// Serialize the table to `destination`
    ///
    /// Calls are serialized: a second caller waits for the first to finish.
    pub async fn persist(&self, destination: &Path) -> HarvestResult<()> {
        let _gate = self.persist_gate.lock().await;
        let snapshot = self.snapshot();
        let row_count = snapshot.rows.len();
        let path = destination.to_path_buf();

        tokio::task::spawn_blocking(move || workbook::write_workbook(&snapshot, &path)).await??;

        debug!(rows = row_count, "Persisted table to {}", destination.display());
        Ok(())
    }
}
