#![forbid(unsafe_code)]

//! The datastore capability consumed by commands and the undo log.
//!
//! # Contract
//!
//! Every primitive mutation either succeeds completely or reports rejection
//! (`false` / `None`) and leaves the store untouched. A rejected mutation is
//! how a command learns that it had no effect.
//!
//! Listener suppression nests: each [`Datastore::disable_listeners`] must be
//! paired with one [`Datastore::enable_listeners`], and events are held back
//! until the outermost pair is released.

use crate::ids::{RowId, TableId};
use crate::schema::{ColumnDef, ColumnProperty, TableProperty, TableSpec};
use crate::table::{Row, Table};
use crate::value::Value;

/// What changed inside a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    /// One cell was written.
    Cell { row: RowId, column: usize },
    RowInserted { row: RowId },
    RowDeleted { row: RowId },
    /// Columns were added or removed.
    Columns,
    /// A table or column property changed.
    Properties,
    TableCreated,
    TableDeleted,
}

/// Fine-grained change notification delivered to datastore listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub table: TableId,
    pub kind: ChangeKind,
}

impl StoreEvent {
    #[must_use]
    pub fn new(table: TableId, kind: ChangeKind) -> Self {
        Self { table, kind }
    }
}

/// Handle returned by [`Datastore::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Callback invoked for every delivered [`StoreEvent`].
pub type StoreListener = Box<dyn FnMut(&StoreEvent) + Send>;

/// A mutable, mutable-schema tabular datastore.
pub trait Datastore {
    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Number of tables.
    fn table_count(&self) -> usize;

    /// Table at a display position.
    fn table_at(&self, index: usize) -> Option<&Table>;

    /// Table with the given immutable id.
    fn table(&self, id: TableId) -> Option<&Table>;

    /// Display position of a table.
    fn table_index(&self, id: TableId) -> Option<usize>;

    /// Table whose name matches case-insensitively.
    fn table_by_name(&self, name: &str) -> Option<&Table>;

    /// Row count of a table, or `None` if it does not exist.
    fn row_count(&self, table: TableId) -> Option<usize> {
        self.table(table).map(Table::row_count)
    }

    /// Column count of a table, or `None` if it does not exist.
    fn column_count(&self, table: TableId) -> Option<usize> {
        self.table(table).map(Table::column_count)
    }

    // ------------------------------------------------------------------
    // Id allocation
    // ------------------------------------------------------------------

    /// Reserve a table id that no current table uses.
    fn allocate_table_id(&mut self) -> TableId;

    /// Reserve a row id that no current row uses.
    fn allocate_row_id(&mut self) -> RowId;

    // ------------------------------------------------------------------
    // Primitive mutations
    // ------------------------------------------------------------------

    /// Insert an empty table at `index`.
    ///
    /// Rejected when the id is in use, the name clashes with another table,
    /// or `index > table_count()`.
    fn create_table(&mut self, spec: TableSpec, index: usize) -> bool;

    /// Remove a table that has no rows and no columns, returning it.
    fn remove_table(&mut self, id: TableId) -> Option<Table>;

    /// Insert a row at `index`. Missing trailing values are filled with
    /// nulls. Rejected when the row id is in use anywhere in the store, the
    /// row has too many values, or the index is out of range.
    fn insert_row(&mut self, table: TableId, index: usize, row: Row) -> bool;

    /// Remove and return the row at `index`.
    fn remove_row(&mut self, table: TableId, index: usize) -> Option<Row>;

    /// Insert a column at `index`, adding a null cell to every row.
    ///
    /// Rejected on a case-insensitive name clash unless
    /// `allow_duplicate_names` is set.
    fn insert_column(
        &mut self,
        table: TableId,
        index: usize,
        column: ColumnDef,
        allow_duplicate_names: bool,
    ) -> bool;

    /// Remove a column whose cells are all null, returning its definition.
    fn remove_column(&mut self, table: TableId, index: usize) -> Option<ColumnDef>;

    /// Write a cell, returning the previous value.
    ///
    /// Rejected when the value does not fit the column type.
    fn set_value(
        &mut self,
        table: TableId,
        row: RowId,
        column: usize,
        value: Value,
    ) -> Option<Value>;

    /// Assign a table property, returning the previous value.
    ///
    /// Renames that clash with another table are rejected.
    fn set_table_property(
        &mut self,
        table: TableId,
        property: TableProperty,
    ) -> Option<TableProperty>;

    /// Assign a column property, returning the previous value.
    fn set_column_property(
        &mut self,
        table: TableId,
        column: usize,
        property: ColumnProperty,
    ) -> Option<ColumnProperty>;

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    /// Register a listener for fine-grained change events.
    fn add_listener(&mut self, listener: StoreListener) -> ListenerId;

    /// Unregister a listener. Returns `false` if the id was unknown.
    fn remove_listener(&mut self, id: ListenerId) -> bool;

    /// Hold back change events until the matching [`enable_listeners`].
    ///
    /// [`enable_listeners`]: Datastore::enable_listeners
    fn disable_listeners(&mut self);

    /// Release one level of suppression; the outermost release delivers
    /// everything that was held back.
    fn enable_listeners(&mut self);

    /// Whether events are currently being held back.
    fn listeners_suppressed(&self) -> bool;
}
