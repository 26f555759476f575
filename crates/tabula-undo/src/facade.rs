#![forbid(unsafe_code)]

//! Undoable datastore facade.
//!
//! [`UndoableDatastore`] wraps any [`Datastore`] and routes every mutation
//! through a [`TransactionLog`], so each one can be undone and redone.
//! Composite structural operations (`delete_column`, `delete_table`) run
//! inside a transaction and undo in a single step.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut ds = UndoableDatastore::new(MemoryDatastore::new());
//! let table = ds.create_table("Stops", None)?.unwrap();
//! ds.add_column(table, ColumnDef::new("name", ColumnType::Text))?;
//! ds.undo()?; // column gone
//! ds.redo()?; // column back
//! ```

use tabula_core::{
    ColumnDef, ColumnFlags, ColumnProperty, Datastore, ListenerId, Row, RowId, StoreListener,
    TableFlags, TableId, TableProperty, TableSpec, Value,
};
use tracing::warn;

use std::collections::BTreeSet;

use crate::command::Command;
use crate::config::UndoConfig;
use crate::error::UndoError;
use crate::gate::{SubscriptionId, UndoState};
use crate::log::TransactionLog;
use crate::transaction::TxId;

/// A datastore whose every mutation is recorded for undo and redo.
#[derive(Debug)]
pub struct UndoableDatastore<D: Datastore> {
    store: D,
    log: TransactionLog,
}

impl<D: Datastore + Default> Default for UndoableDatastore<D> {
    fn default() -> Self {
        Self::new(D::default())
    }
}

impl<D: Datastore> UndoableDatastore<D> {
    /// Wrap `store` with an unbounded history.
    pub fn new(store: D) -> Self {
        Self::with_config(store, UndoConfig::default())
    }

    pub fn with_config(store: D, config: UndoConfig) -> Self {
        Self {
            store,
            log: TransactionLog::new(config),
        }
    }

    /// Read access to the wrapped datastore.
    pub fn store(&self) -> &D {
        &self.store
    }

    /// Unwrap, discarding history.
    pub fn into_inner(self) -> D {
        self.store
    }

    pub fn log(&self) -> &TransactionLog {
        &self.log
    }

    /// Always true: open transactions can be rolled back.
    pub fn is_rollback_supported(&self) -> bool {
        true
    }

    // ====================================================================
    // History
    // ====================================================================

    /// Apply an arbitrary command through the log. Returns whether it
    /// changed anything.
    pub fn apply(&mut self, command: Command) -> Result<bool, UndoError> {
        Ok(self.log.apply(&mut self.store, command)?.is_some())
    }

    pub fn undo(&mut self) -> Result<(), UndoError> {
        self.log.undo(&mut self.store)
    }

    pub fn redo(&mut self) -> Result<(), UndoError> {
        self.log.redo(&mut self.store)
    }

    pub fn has_undo(&self) -> bool {
        self.log.has_undo()
    }

    pub fn has_redo(&self) -> bool {
        self.log.has_redo()
    }

    pub fn start_transaction(&mut self) -> Result<TxId, UndoError> {
        self.log.start_transaction(&mut self.store)
    }

    pub fn end_transaction(&mut self) -> Result<TxId, UndoError> {
        self.log.end_transaction(&mut self.store)
    }

    pub fn rollback_transaction(&mut self) -> Result<(), UndoError> {
        self.log.rollback_transaction(&mut self.store)
    }

    pub fn is_in_transaction(&self) -> bool {
        self.log.is_in_transaction()
    }

    // ====================================================================
    // Listeners
    // ====================================================================

    /// Register a callback fired when undo or redo availability changes.
    pub fn subscribe_undo_state(
        &mut self,
        listener: impl FnMut(UndoState) + Send + 'static,
    ) -> SubscriptionId {
        self.log.subscribe(listener)
    }

    pub fn unsubscribe_undo_state(&mut self, id: SubscriptionId) -> bool {
        self.log.unsubscribe(id)
    }

    /// Register a fine-grained change listener on the wrapped datastore.
    pub fn add_store_listener(&mut self, listener: StoreListener) -> ListenerId {
        self.store.add_listener(listener)
    }

    pub fn remove_store_listener(&mut self, id: ListenerId) -> bool {
        self.store.remove_listener(id)
    }

    // ====================================================================
    // Cells and rows
    // ====================================================================

    /// Write the cell at a row position.
    pub fn set_value(
        &mut self,
        table: TableId,
        row_index: usize,
        column: usize,
        value: impl Into<Value>,
    ) -> Result<bool, UndoError> {
        let Some(row) = self.store.table(table).and_then(|t| t.row_id(row_index)) else {
            return Ok(false);
        };
        self.set_value_by_id(table, row, column, value)
    }

    /// Write the cell in the row with the given id.
    pub fn set_value_by_id(
        &mut self,
        table: TableId,
        row: RowId,
        column: usize,
        value: impl Into<Value>,
    ) -> Result<bool, UndoError> {
        self.apply(Command::SetCell {
            table,
            row,
            column,
            value: value.into(),
        })
    }

    /// Append an all-null row, returning its position.
    ///
    /// A fresh row id is allocated unless `id` is given.
    pub fn create_empty_row(
        &mut self,
        table: TableId,
        id: Option<RowId>,
    ) -> Result<Option<usize>, UndoError> {
        let Some(index) = self.store.row_count(table) else {
            return Ok(None);
        };
        let inserted = self.insert_empty_row(table, index, id)?;
        Ok(inserted.then_some(index))
    }

    /// Insert an all-null row at `index`.
    pub fn insert_empty_row(
        &mut self,
        table: TableId,
        index: usize,
        id: Option<RowId>,
    ) -> Result<bool, UndoError> {
        let Some(columns) = self.store.column_count(table) else {
            return Ok(false);
        };
        let id = match id {
            Some(id) => id,
            None => self.store.allocate_row_id(),
        };
        self.apply(Command::InsertRow {
            table,
            index,
            row: Row::empty(id, columns),
        })
    }

    pub fn delete_row(&mut self, table: TableId, index: usize) -> Result<bool, UndoError> {
        self.apply(Command::DeleteRow { table, index })
    }

    /// Row insertion that bypasses history is not offered on an undoable
    /// store.
    pub fn bulk_append(&mut self, _table: TableId, _rows: Vec<Row>) -> Result<(), UndoError> {
        Err(UndoError::Unsupported {
            operation: "bulk append",
        })
    }

    // ====================================================================
    // Columns
    // ====================================================================

    /// Append a column, returning its index. Fails on a name clash.
    pub fn add_column(
        &mut self,
        table: TableId,
        column: ColumnDef,
    ) -> Result<Option<usize>, UndoError> {
        let Some(index) = self.store.column_count(table) else {
            return Ok(None);
        };
        let inserted = self.insert_column(table, index, column, false)?;
        Ok(inserted.then_some(index))
    }

    pub fn insert_column(
        &mut self,
        table: TableId,
        index: usize,
        column: ColumnDef,
        allow_duplicate_names: bool,
    ) -> Result<bool, UndoError> {
        self.apply(Command::InsertColumn {
            table,
            index,
            column,
            allow_duplicate_names,
        })
    }

    /// Delete a column and its data as one undoable step.
    ///
    /// Every cell is cleared first, then the empty column is removed. If the
    /// datastore refuses the removal the cleared cells are restored and
    /// [`UndoError::Rejected`] is returned.
    pub fn delete_column(&mut self, table: TableId, column: usize) -> Result<(), UndoError> {
        let Some(rows) = self
            .store
            .table(table)
            .filter(|t| column < t.column_count())
            .map(|t| t.rows().iter().map(|r| r.id).collect::<Vec<_>>())
        else {
            return Ok(());
        };
        self.in_transaction(|ds| {
            for row in rows {
                ds.set_value_by_id(table, row, column, Value::Null)?;
            }
            let removed = ds.apply(Command::DeleteColumn {
                table,
                index: column,
            })?;
            if !removed {
                return Err(UndoError::Rejected {
                    operation: "delete column",
                });
            }
            Ok(())
        })
    }

    // ====================================================================
    // Tables
    // ====================================================================

    /// Append an empty table. A fresh id is allocated unless `id` is given.
    ///
    /// Returns `None` when the name (case-insensitively) or id is taken.
    pub fn create_table(
        &mut self,
        name: &str,
        id: Option<TableId>,
    ) -> Result<Option<TableId>, UndoError> {
        let id = match id {
            Some(id) => id,
            None => self.store.allocate_table_id(),
        };
        let index = self.store.table_count();
        let created = self.apply(Command::CreateTable {
            spec: TableSpec::new(id, name),
            index,
        })?;
        Ok(created.then_some(id))
    }

    /// Delete a table with everything in it as one undoable step.
    ///
    /// Rows go first (last to first), then columns (last to first), then
    /// the empty table. A refused removal rolls everything back.
    pub fn delete_table(&mut self, table: TableId) -> Result<(), UndoError> {
        let Some((rows, columns)) = self
            .store
            .table(table)
            .map(|t| (t.row_count(), t.column_count()))
        else {
            return Ok(());
        };
        self.in_transaction(|ds| {
            for index in (0..rows).rev() {
                ds.delete_row(table, index)?;
            }
            for column in (0..columns).rev() {
                ds.delete_column(table, column)?;
            }
            if !ds.apply(Command::DeleteTable { table })? {
                return Err(UndoError::Rejected {
                    operation: "delete table",
                });
            }
            Ok(())
        })
    }

    // ====================================================================
    // Properties
    // ====================================================================

    /// Rename a table. Fails when another table already has the name.
    pub fn set_table_name(
        &mut self,
        table: TableId,
        name: impl Into<String>,
    ) -> Result<bool, UndoError> {
        self.set_table_property(table, TableProperty::Name(name.into()))
    }

    pub fn set_table_flags(&mut self, table: TableId, flags: TableFlags) -> Result<bool, UndoError> {
        self.set_table_property(table, TableProperty::Flags(flags))
    }

    pub fn set_table_tags(
        &mut self,
        table: TableId,
        tags: BTreeSet<String>,
    ) -> Result<bool, UndoError> {
        self.set_table_property(table, TableProperty::Tags(tags))
    }

    pub fn set_column_flags(
        &mut self,
        table: TableId,
        column: usize,
        flags: ColumnFlags,
    ) -> Result<bool, UndoError> {
        self.set_column_property(table, column, ColumnProperty::Flags(flags))
    }

    pub fn set_column_tags(
        &mut self,
        table: TableId,
        column: usize,
        tags: BTreeSet<String>,
    ) -> Result<bool, UndoError> {
        self.set_column_property(table, column, ColumnProperty::Tags(tags))
    }

    pub fn set_column_default_value(
        &mut self,
        table: TableId,
        column: usize,
        value: impl Into<Value>,
    ) -> Result<bool, UndoError> {
        self.set_column_property(table, column, ColumnProperty::DefaultValue(value.into()))
    }

    pub fn set_column_description(
        &mut self,
        table: TableId,
        column: usize,
        description: impl Into<String>,
    ) -> Result<bool, UndoError> {
        self.set_column_property(
            table,
            column,
            ColumnProperty::Description(description.into()),
        )
    }

    fn set_table_property(
        &mut self,
        table: TableId,
        property: TableProperty,
    ) -> Result<bool, UndoError> {
        self.apply(Command::SetTableProperty { table, property })
    }

    fn set_column_property(
        &mut self,
        table: TableId,
        column: usize,
        property: ColumnProperty,
    ) -> Result<bool, UndoError> {
        self.apply(Command::SetColumnProperty {
            table,
            column,
            property,
        })
    }

    /// Run `f` inside a transaction, opening one if none is open.
    ///
    /// A transaction opened here is rolled back if `f` fails.
    fn in_transaction<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R, UndoError>,
    ) -> Result<R, UndoError> {
        let opened = !self.log.is_in_transaction();
        if opened {
            self.start_transaction()?;
        }
        match f(self) {
            Ok(value) => {
                if opened {
                    self.end_transaction()?;
                }
                Ok(value)
            }
            Err(err) => {
                if opened && let Err(rollback) = self.rollback_transaction() {
                    warn!(
                        target: "tabula.undo",
                        error = %err,
                        rollback_error = %rollback,
                        "rollback after failed composite operation failed"
                    );
                }
                Err(err)
            }
        }
    }
}
