#![forbid(unsafe_code)]

//! In-memory [`Datastore`] implementation.
//!
//! [`MemoryDatastore`] keeps tables in display order in a `Vec` and looks
//! rows up by linear scan. It is the reference store used by the undo log's
//! tests and is small enough to embed in tools that do not need indexing.
//!
//! # Listener suppression
//!
//! ```text
//! disable_listeners()          depth 0 -> 1
//!   set_value(..)              event queued
//!   disable_listeners()        depth 1 -> 2
//!     set_value(..)            event queued (duplicates dropped)
//!   enable_listeners()         depth 2 -> 1, nothing delivered
//! enable_listeners()           depth 1 -> 0, queued events delivered once
//! ```

use std::fmt;

use tracing::{trace, warn};

use crate::datastore::{ChangeKind, Datastore, ListenerId, StoreEvent, StoreListener};
use crate::ids::{RowId, TableId};
use crate::schema::{ColumnDef, ColumnProperty, TableProperty, TableSpec, names_match};
use crate::table::{Row, Table};
use crate::value::Value;

/// A datastore held entirely in memory.
pub struct MemoryDatastore {
    tables: Vec<Table>,
    next_table_id: u32,
    next_row_id: u64,
    listeners: Vec<(ListenerId, StoreListener)>,
    next_listener_id: u64,
    /// Nesting depth of `disable_listeners`.
    suppress_depth: u32,
    /// Events held back while suppressed, de-duplicated, in first-seen order.
    pending: Vec<StoreEvent>,
}

impl fmt::Debug for MemoryDatastore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDatastore")
            .field("tables", &self.tables.len())
            .field("listeners", &self.listeners.len())
            .field("suppress_depth", &self.suppress_depth)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl fmt::Display for MemoryDatastore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tables.is_empty() {
            return writeln!(f, "(no tables)");
        }
        for table in &self.tables {
            write!(f, "{table}")?;
        }
        Ok(())
    }
}

impl Default for MemoryDatastore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDatastore {
    /// Create an empty datastore.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: Vec::new(),
            next_table_id: 1,
            next_row_id: 1,
            listeners: Vec::new(),
            next_listener_id: 1,
            suppress_depth: 0,
            pending: Vec::new(),
        }
    }

    /// All tables in display order.
    #[must_use]
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn table_mut(&mut self, id: TableId) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.spec.id == id)
    }

    fn row_id_in_use(&self, id: RowId) -> bool {
        self.tables.iter().any(|t| t.row_index(id).is_some())
    }

    fn emit(&mut self, event: StoreEvent) {
        if self.suppress_depth > 0 {
            if !self.pending.contains(&event) {
                self.pending.push(event);
            }
            return;
        }
        self.deliver(&event);
    }

    fn deliver(&mut self, event: &StoreEvent) {
        trace!(target: "tabula.store", table = %event.table, kind = ?event.kind, "store event");
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }
}

impl Datastore for MemoryDatastore {
    fn table_count(&self) -> usize {
        self.tables.len()
    }

    fn table_at(&self, index: usize) -> Option<&Table> {
        self.tables.get(index)
    }

    fn table(&self, id: TableId) -> Option<&Table> {
        self.tables.iter().find(|t| t.spec.id == id)
    }

    fn table_index(&self, id: TableId) -> Option<usize> {
        self.tables.iter().position(|t| t.spec.id == id)
    }

    fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| names_match(&t.spec.name, name))
    }

    fn allocate_table_id(&mut self) -> TableId {
        while self.table(TableId(self.next_table_id)).is_some() {
            self.next_table_id = self.next_table_id.wrapping_add(1).max(1);
        }
        let id = TableId(self.next_table_id);
        self.next_table_id = self.next_table_id.wrapping_add(1).max(1);
        id
    }

    fn allocate_row_id(&mut self) -> RowId {
        while self.row_id_in_use(RowId(self.next_row_id)) {
            self.next_row_id = self.next_row_id.wrapping_add(1).max(1);
        }
        let id = RowId(self.next_row_id);
        self.next_row_id = self.next_row_id.wrapping_add(1).max(1);
        id
    }

    fn create_table(&mut self, spec: TableSpec, index: usize) -> bool {
        if index > self.tables.len()
            || self.table(spec.id).is_some()
            || self.table_by_name(&spec.name).is_some()
        {
            return false;
        }
        let id = spec.id;
        self.tables.insert(index, Table::new(spec));
        self.emit(StoreEvent::new(id, ChangeKind::TableCreated));
        true
    }

    fn remove_table(&mut self, id: TableId) -> Option<Table> {
        let index = self.table_index(id)?;
        if !self.tables[index].is_empty() {
            return None;
        }
        let table = self.tables.remove(index);
        self.emit(StoreEvent::new(id, ChangeKind::TableDeleted));
        Some(table)
    }

    fn insert_row(&mut self, table: TableId, index: usize, mut row: Row) -> bool {
        if self.row_id_in_use(row.id) {
            return false;
        }
        let row_id = row.id;
        let Some(target) = self.table_mut(table) else {
            return false;
        };
        if index > target.rows.len() || row.values.len() > target.columns.len() {
            return false;
        }
        let fits = row
            .values
            .iter()
            .zip(&target.columns)
            .all(|(value, column)| column.column_type.accepts(value));
        if !fits {
            return false;
        }
        row.values.resize(target.columns.len(), Value::Null);
        target.rows.insert(index, row);
        self.emit(StoreEvent::new(table, ChangeKind::RowInserted { row: row_id }));
        true
    }

    fn remove_row(&mut self, table: TableId, index: usize) -> Option<Row> {
        let target = self.table_mut(table)?;
        if index >= target.rows.len() {
            return None;
        }
        let row = target.rows.remove(index);
        self.emit(StoreEvent::new(table, ChangeKind::RowDeleted { row: row.id }));
        Some(row)
    }

    fn insert_column(
        &mut self,
        table: TableId,
        index: usize,
        column: ColumnDef,
        allow_duplicate_names: bool,
    ) -> bool {
        let Some(target) = self.table_mut(table) else {
            return false;
        };
        if index > target.columns.len() {
            return false;
        }
        if !allow_duplicate_names
            && target
                .columns
                .iter()
                .any(|existing| names_match(&existing.name, &column.name))
        {
            return false;
        }
        target.columns.insert(index, column);
        for row in &mut target.rows {
            row.values.insert(index, Value::Null);
        }
        self.emit(StoreEvent::new(table, ChangeKind::Columns));
        true
    }

    fn remove_column(&mut self, table: TableId, index: usize) -> Option<ColumnDef> {
        let target = self.table_mut(table)?;
        if !target.column_is_blank(index) {
            return None;
        }
        let column = target.columns.remove(index);
        for row in &mut target.rows {
            row.values.remove(index);
        }
        self.emit(StoreEvent::new(table, ChangeKind::Columns));
        Some(column)
    }

    fn set_value(
        &mut self,
        table: TableId,
        row: RowId,
        column: usize,
        value: Value,
    ) -> Option<Value> {
        let target = self.table_mut(table)?;
        if !target.columns.get(column)?.column_type.accepts(&value) {
            return None;
        }
        let cell = target
            .rows
            .iter_mut()
            .find(|r| r.id == row)?
            .values
            .get_mut(column)?;
        let old = std::mem::replace(cell, value);
        self.emit(StoreEvent::new(table, ChangeKind::Cell { row, column }));
        Some(old)
    }

    fn set_table_property(
        &mut self,
        table: TableId,
        property: TableProperty,
    ) -> Option<TableProperty> {
        if let TableProperty::Name(name) = &property
            && self
                .table_by_name(name)
                .is_some_and(|other| other.spec.id != table)
        {
            return None;
        }
        let old = self.table_mut(table)?.spec.assign(property);
        self.emit(StoreEvent::new(table, ChangeKind::Properties));
        Some(old)
    }

    fn set_column_property(
        &mut self,
        table: TableId,
        column: usize,
        property: ColumnProperty,
    ) -> Option<ColumnProperty> {
        let old = self
            .table_mut(table)?
            .columns
            .get_mut(column)?
            .assign(property);
        self.emit(StoreEvent::new(table, ChangeKind::Properties));
        Some(old)
    }

    fn add_listener(&mut self, listener: StoreListener) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, listener));
        id
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn disable_listeners(&mut self) {
        self.suppress_depth += 1;
    }

    fn enable_listeners(&mut self) {
        if self.suppress_depth == 0 {
            warn!(target: "tabula.store", "enable_listeners called without matching disable");
            return;
        }
        self.suppress_depth -= 1;
        if self.suppress_depth > 0 {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        for event in &pending {
            self.deliver(event);
        }
    }

    fn listeners_suppressed(&self) -> bool {
        self.suppress_depth > 0
    }
}
