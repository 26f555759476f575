#![forbid(unsafe_code)]

//! Stored tables and rows.

use std::fmt;

use crate::ids::{RowId, TableId};
use crate::schema::{ColumnDef, TableSpec};
use crate::value::Value;

/// One row: a stable id plus one value per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: RowId,
    pub values: Vec<Value>,
}

impl Row {
    /// Create a row with every cell empty.
    #[must_use]
    pub fn empty(id: RowId, columns: usize) -> Self {
        Self {
            id,
            values: vec![Value::Null; columns],
        }
    }
}

/// A table: definition, column layout, and rows in display order.
///
/// # Invariants
///
/// Every row holds exactly `columns.len()` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub(crate) spec: TableSpec,
    pub(crate) columns: Vec<ColumnDef>,
    pub(crate) rows: Vec<Row>,
}

impl Table {
    /// Create an empty table from its spec.
    #[must_use]
    pub fn new(spec: TableSpec) -> Self {
        Self {
            spec,
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> TableId {
        self.spec.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    #[must_use]
    pub fn spec(&self) -> &TableSpec {
        &self.spec
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, index: usize) -> Option<&ColumnDef> {
        self.columns.get(index)
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has neither rows nor columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.columns.is_empty()
    }

    /// Position of the row with the given id.
    #[must_use]
    pub fn row_index(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|row| row.id == id)
    }

    /// Id of the row at `index`.
    #[must_use]
    pub fn row_id(&self, index: usize) -> Option<RowId> {
        self.rows.get(index).map(|row| row.id)
    }

    /// Value at a row index and column index.
    #[must_use]
    pub fn value(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row)?.values.get(column)
    }

    /// Value in the row with the given id.
    #[must_use]
    pub fn value_by_id(&self, row: RowId, column: usize) -> Option<&Value> {
        self.rows
            .iter()
            .find(|r| r.id == row)?
            .values
            .get(column)
    }

    /// True when every cell of the column is null.
    ///
    /// Returns `false` if the column does not exist.
    #[must_use]
    pub fn column_is_blank(&self, column: usize) -> bool {
        column < self.columns.len()
            && self
                .rows
                .iter()
                .all(|row| row.values.get(column).is_none_or(Value::is_null))
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} ({}): {} columns, {} rows",
            self.spec.name,
            self.spec.id,
            self.columns.len(),
            self.rows.len()
        )?;
        let header: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        writeln!(f, "  {}", header.join("\t"))?;
        for row in &self.rows {
            let cells: Vec<String> = row.values.iter().map(ToString::to_string).collect();
            writeln!(f, "  {}", cells.join("\t"))?;
        }
        Ok(())
    }
}
