#![forbid(unsafe_code)]

//! Reversible datastore mutations.
//!
//! A [`Command`] is an immutable description of one primitive mutation.
//! Applying it to a [`Datastore`] performs the mutation and returns a new
//! command that reverses it, or `None` if the store was left untouched.
//!
//! # Invariants
//!
//! - `c.apply(s)` returning `Some(inv)` followed by `inv.apply(s)` restores
//!   the prior state exactly and returns a command equivalent to `c`.
//! - `c.apply(s)` returning `None` leaves `s` unchanged.
//!
//! # Dependency order
//!
//! Structural deletes only succeed on empty structure: `DeleteColumn`
//! requires every cell in the column to be null and `DeleteTable` requires a
//! table with no rows and no columns. Their inverses therefore only have to
//! carry the column or table definition. Callers clear data first (see
//! [`UndoableDatastore::delete_column`](crate::UndoableDatastore::delete_column)).

use tabula_core::{
    ColumnDef, ColumnProperty, Datastore, Row, RowId, TableId, TableProperty, TableSpec, Value,
};

/// One reversible mutation of a tabular datastore.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Write one cell. No-op when the cell already holds `value`.
    SetCell {
        table: TableId,
        row: RowId,
        column: usize,
        value: Value,
    },
    /// Insert a row (with its values) at a position.
    InsertRow {
        table: TableId,
        index: usize,
        row: Row,
    },
    /// Delete the row at a position.
    DeleteRow { table: TableId, index: usize },
    /// Insert an empty column at a position.
    InsertColumn {
        table: TableId,
        index: usize,
        column: ColumnDef,
        allow_duplicate_names: bool,
    },
    /// Delete a column whose cells are all null.
    DeleteColumn { table: TableId, index: usize },
    /// Create an empty table at a position.
    CreateTable { spec: TableSpec, index: usize },
    /// Delete a table with no rows and no columns.
    DeleteTable { table: TableId },
    SetTableProperty {
        table: TableId,
        property: TableProperty,
    },
    SetColumnProperty {
        table: TableId,
        column: usize,
        property: ColumnProperty,
    },
}

impl Command {
    /// Apply the mutation, returning its inverse, or `None` if nothing
    /// changed.
    pub fn apply<D: Datastore + ?Sized>(&self, store: &mut D) -> Option<Command> {
        match self {
            Self::SetCell {
                table,
                row,
                column,
                value,
            } => {
                let current = store.table(*table)?.value_by_id(*row, *column)?;
                if current.is_identical(value) {
                    return None;
                }
                let old = store.set_value(*table, *row, *column, value.clone())?;
                Some(Self::SetCell {
                    table: *table,
                    row: *row,
                    column: *column,
                    value: old,
                })
            }
            Self::InsertRow { table, index, row } => store
                .insert_row(*table, *index, row.clone())
                .then_some(Self::DeleteRow {
                    table: *table,
                    index: *index,
                }),
            Self::DeleteRow { table, index } => {
                let row = store.remove_row(*table, *index)?;
                Some(Self::InsertRow {
                    table: *table,
                    index: *index,
                    row,
                })
            }
            Self::InsertColumn {
                table,
                index,
                column,
                allow_duplicate_names,
            } => store
                .insert_column(*table, *index, column.clone(), *allow_duplicate_names)
                .then_some(Self::DeleteColumn {
                    table: *table,
                    index: *index,
                }),
            Self::DeleteColumn { table, index } => {
                let column = store.remove_column(*table, *index)?;
                // Restoring a column must not trip over a name clash.
                Some(Self::InsertColumn {
                    table: *table,
                    index: *index,
                    column,
                    allow_duplicate_names: true,
                })
            }
            Self::CreateTable { spec, index } => store
                .create_table(spec.clone(), *index)
                .then_some(Self::DeleteTable { table: spec.id }),
            Self::DeleteTable { table } => {
                let index = store.table_index(*table)?;
                let removed = store.remove_table(*table)?;
                Some(Self::CreateTable {
                    spec: removed.spec().clone(),
                    index,
                })
            }
            Self::SetTableProperty { table, property } => {
                if store.table(*table)?.spec().current(property) == *property {
                    return None;
                }
                let old = store.set_table_property(*table, property.clone())?;
                Some(Self::SetTableProperty {
                    table: *table,
                    property: old,
                })
            }
            Self::SetColumnProperty {
                table,
                column,
                property,
            } => {
                if store.table(*table)?.column(*column)?.current(property) == *property {
                    return None;
                }
                let old = store.set_column_property(*table, *column, property.clone())?;
                Some(Self::SetColumnProperty {
                    table: *table,
                    column: *column,
                    property: old,
                })
            }
        }
    }

    /// The table this command operates on.
    #[must_use]
    pub fn table(&self) -> TableId {
        match self {
            Self::SetCell { table, .. }
            | Self::InsertRow { table, .. }
            | Self::DeleteRow { table, .. }
            | Self::InsertColumn { table, .. }
            | Self::DeleteColumn { table, .. }
            | Self::DeleteTable { table }
            | Self::SetTableProperty { table, .. }
            | Self::SetColumnProperty { table, .. } => *table,
            Self::CreateTable { spec, .. } => spec.id,
        }
    }

    /// Human-readable description for logs and UI.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::SetCell { .. } => "Set cell",
            Self::InsertRow { .. } => "Insert row",
            Self::DeleteRow { .. } => "Delete row",
            Self::InsertColumn { .. } => "Insert column",
            Self::DeleteColumn { .. } => "Delete column",
            Self::CreateTable { .. } => "Create table",
            Self::DeleteTable { .. } => "Delete table",
            Self::SetTableProperty { .. } => "Set table property",
            Self::SetColumnProperty { .. } => "Set column property",
        }
    }
}
