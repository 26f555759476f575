#![forbid(unsafe_code)]

//! Tabula core data model.
//!
//! This crate describes the tabular datastore that the undo log in
//! `tabula-undo` sits in front of:
//!
//! - [`TableId`] / [`RowId`] - stable identifiers that survive structural edits
//! - [`Value`] / [`ColumnType`] - cell contents and declared column types
//! - [`ColumnDef`] / [`TableSpec`] - everything needed to recreate an empty
//!   column or table
//! - [`Table`] / [`Row`] - the stored data itself
//! - [`Datastore`] - the capability trait that commands mutate through
//! - [`MemoryDatastore`] - an in-memory implementation with a listener
//!   registry and nested listener suppression
//!
//! # Role in Tabula
//! `tabula-core` knows nothing about history. Every primitive mutation on
//! [`Datastore`] reports rejection (`false` / `None`) instead of panicking,
//! which is what lets a command decide that it was a no-op.

pub mod datastore;
pub mod ids;
pub mod memory;
pub mod schema;
pub mod table;
pub mod value;

pub use datastore::{ChangeKind, Datastore, ListenerId, StoreEvent, StoreListener};
pub use ids::{RowId, TableId};
pub use memory::MemoryDatastore;
pub use schema::{ColumnDef, ColumnFlags, ColumnProperty, TableFlags, TableProperty, TableSpec};
pub use table::{Row, Table};
pub use value::{ColumnType, Value};
