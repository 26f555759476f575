#![forbid(unsafe_code)]

//! Tabula undo/redo.
//!
//! This crate puts a transactional undo/redo log in front of any
//! [`tabula_core::Datastore`].
//!
//! # Key Components
//!
//! - [`Command`] - one reversible mutation; applying it yields its inverse
//! - [`TransactionLog`] - history of (undo, redo, transaction) entries and a
//!   cursor; undo and redo step a whole transaction at a time
//! - [`TransactionCoordinator`] - `Idle` / `Open(tx)` state machine and id
//!   allocation
//! - [`ListenerSuppression`] / [`AvailabilityNotifier`] - notification
//!   gating for datastore listeners and undo/redo availability
//! - [`UndoableDatastore`] - the mutation surface callers use
//! - [`UndoConfig`] - history bound, loadable from TOML/JSON with the
//!   `config` feature
//!
//! # How it fits together
//!
//! ```text
//!   caller ──▶ UndoableDatastore ──▶ TransactionLog::apply
//!                                        │
//!                                        ├─▶ Command::apply(store) ─▶ inverse
//!                                        ├─▶ push (inverse, command, tx)
//!                                        └─▶ AvailabilityNotifier
//!
//!   undo/redo ──▶ ListenerSuppression(store) ──▶ replay entries
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use tabula_core::{ColumnDef, ColumnType, MemoryDatastore};
//! use tabula_undo::UndoableDatastore;
//!
//! let mut ds = UndoableDatastore::new(MemoryDatastore::new());
//! let table = ds.create_table("Stops", None)?.unwrap();
//! ds.start_transaction()?;
//! let row = ds.create_empty_row(table, None)?.unwrap();
//! ds.add_column(table, ColumnDef::new("name", ColumnType::Text))?;
//! ds.set_value(table, row, 0, "depot")?;
//! ds.end_transaction()?;
//! ds.undo()?; // row, column and value gone in one step
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod facade;
pub mod gate;
pub mod log;
pub mod transaction;

pub use command::Command;
pub use config::{UndoConfig, UndoConfigError};
pub use error::UndoError;
pub use facade::UndoableDatastore;
pub use gate::{
    AvailabilityListener, AvailabilityNotifier, ListenerSuppression, SubscriptionId, UndoState,
};
pub use log::{LogEntry, TransactionLog};
pub use transaction::{TransactionCoordinator, TxId, TxState};
