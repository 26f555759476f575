#![forbid(unsafe_code)]

//! Transactional undo/redo history.
//!
//! The [`TransactionLog`] records, for every command that changed the
//! datastore, the command and its inverse together with the id of the
//! transaction it ran in. Undo and redo walk the history a whole
//! transaction at a time.
//!
//! # Invariants
//!
//! 1. `0 <= position <= len`; `has_undo ⇔ position > 0`,
//!    `has_redo ⇔ position < len`.
//! 2. Entries sharing a transaction id are contiguous.
//! 3. Entries at `[0, position)` are undoable, entries at `[position, len)`
//!    are redoable; applying a new command discards the redoable tail.
//! 4. After a trim, `len <= max_entries` unless the oldest retained
//!    transaction straddles the bound. Trimming never splits a transaction.
//!
//! # History layout
//!
//! ```text
//!   tx:      -    7    7    7    -    9    9
//!          ┌────┬────┬────┬────┬────┬────┬────┐
//!          │ e0 │ e1 │ e2 │ e3 │ e4 │ e5 │ e6 │
//!          └────┴────┴────┴────┴────┴────┴────┘
//!                                  ▲
//!                              position = 4
//!
//!   undo()  → replays e3, e2, e1 (tx 7), position = 1
//!   redo()  → replays e4 (standalone), position = 5
//! ```
//!
//! # Failure modes
//!
//! A replayed command that reports no effect means history and datastore
//! disagree. The log reports [`UndoError::Inconsistent`] and refuses all
//! further work with [`UndoError::Poisoned`].

use std::collections::VecDeque;
use std::fmt;

use tabula_core::Datastore;
use tracing::{debug, error, trace};
use web_time::Instant;

use crate::command::Command;
use crate::config::UndoConfig;
use crate::error::UndoError;
use crate::gate::{AvailabilityNotifier, ListenerSuppression, SubscriptionId, UndoState};
use crate::transaction::{TransactionCoordinator, TxId};

/// One history record.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Reverses the mutation.
    pub undo: Command,
    /// Re-performs the mutation.
    pub redo: Command,
    /// Transaction the mutation ran in; `None` for standalone mutations.
    pub tx: Option<TxId>,
}

/// Direction of a history replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Replay {
    Undo,
    Redo,
}

impl Replay {
    fn operation(self) -> &'static str {
        match self {
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }
}

/// Ordered undo/redo history with a cursor and transaction grouping.
///
/// The log does not own the datastore; every mutating call takes it as an
/// argument. [`UndoableDatastore`](crate::UndoableDatastore) pairs the two.
pub struct TransactionLog {
    entries: VecDeque<LogEntry>,
    position: usize,
    config: UndoConfig,
    coordinator: TransactionCoordinator,
    notifier: AvailabilityNotifier,
    poisoned: bool,
}

impl fmt::Debug for TransactionLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionLog")
            .field("len", &self.entries.len())
            .field("position", &self.position)
            .field("config", &self.config)
            .field("transaction", &self.coordinator.current())
            .field("poisoned", &self.poisoned)
            .finish()
    }
}

impl Default for TransactionLog {
    fn default() -> Self {
        Self::new(UndoConfig::default())
    }
}

impl TransactionLog {
    /// Create an empty log. A bound of zero is treated as one.
    #[must_use]
    pub fn new(mut config: UndoConfig) -> Self {
        config.max_entries = config.max_entries.max(1);
        Self {
            entries: VecDeque::new(),
            position: 0,
            config,
            coordinator: TransactionCoordinator::new(),
            notifier: AvailabilityNotifier::new(),
            poisoned: false,
        }
    }

    // ====================================================================
    // Queries
    // ====================================================================

    #[must_use]
    pub fn config(&self) -> &UndoConfig {
        &self.config
    }

    #[must_use]
    pub fn has_undo(&self) -> bool {
        self.position > 0
    }

    #[must_use]
    pub fn has_redo(&self) -> bool {
        self.position < self.entries.len()
    }

    #[must_use]
    pub fn state(&self) -> UndoState {
        UndoState::new(self.has_undo(), self.has_redo())
    }

    /// Number of history entries, undoable and redoable.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cursor: the number of undoable entries.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// History, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn is_in_transaction(&self) -> bool {
        self.coordinator.is_open()
    }

    /// Id of the open transaction, if any.
    #[must_use]
    pub fn current_transaction(&self) -> Option<TxId> {
        self.coordinator.current()
    }

    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    // ====================================================================
    // Availability listeners
    // ====================================================================

    /// Register a callback fired when `has_undo` or `has_redo` changes.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(UndoState) + Send + 'static,
    ) -> SubscriptionId {
        self.notifier.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    // ====================================================================
    // Mutation
    // ====================================================================

    /// Apply `command` to `store` and record it.
    ///
    /// Returns the recorded command, or `None` if the command had no effect
    /// (nothing is recorded in that case). Redoable history is discarded
    /// either way.
    pub fn apply<D: Datastore + ?Sized>(
        &mut self,
        store: &mut D,
        command: Command,
    ) -> Result<Option<&Command>, UndoError> {
        self.check_poisoned()?;
        self.clear_redos();
        if !self.coordinator.is_open() {
            self.trim()?;
        }

        let tx = self.coordinator.current();
        let recorded = match command.apply(store) {
            Some(inverse) => {
                trace!(
                    target: "tabula.undo",
                    command = command.description(),
                    table = %command.table(),
                    tx = ?tx.map(TxId::get),
                    "command applied"
                );
                self.entries.push_back(LogEntry {
                    undo: inverse,
                    redo: command,
                    tx,
                });
                self.position += 1;
                true
            }
            None => {
                trace!(
                    target: "tabula.undo",
                    command = command.description(),
                    table = %command.table(),
                    "command had no effect"
                );
                false
            }
        };

        self.fire();
        Ok(if recorded {
            self.entries.back().map(|entry| &entry.redo)
        } else {
            None
        })
    }

    /// Undo the most recent standalone entry or transaction.
    ///
    /// A no-op without history. Datastore listeners are suppressed for the
    /// whole replay.
    pub fn undo<D: Datastore + ?Sized>(&mut self, store: &mut D) -> Result<(), UndoError> {
        self.replay(store, Replay::Undo)?;
        self.fire();
        Ok(())
    }

    /// Redo the next standalone entry or transaction.
    pub fn redo<D: Datastore + ?Sized>(&mut self, store: &mut D) -> Result<(), UndoError> {
        self.replay(store, Replay::Redo)?;
        self.fire();
        Ok(())
    }

    /// Walk one group in `direction` without notifying availability
    /// listeners.
    fn replay<D: Datastore + ?Sized>(
        &mut self,
        store: &mut D,
        direction: Replay,
    ) -> Result<(), UndoError> {
        self.check_poisoned()?;
        self.coordinator.ensure_idle(direction.operation())?;
        let available = match direction {
            Replay::Undo => self.has_undo(),
            Replay::Redo => self.has_redo(),
        };
        if !available {
            return Ok(());
        }

        let start = Instant::now();
        let span = match direction {
            Replay::Undo => tracing::debug_span!(
                "undo.undo",
                steps = tracing::field::Empty,
                duration_us = tracing::field::Empty,
            ),
            Replay::Redo => tracing::debug_span!(
                "undo.redo",
                steps = tracing::field::Empty,
                duration_us = tracing::field::Empty,
            ),
        };
        let _guard = span.enter();

        let (steps, outcome) = {
            let mut store = ListenerSuppression::new(store);
            match direction {
                Replay::Undo => self.undo_run(&mut *store),
                Replay::Redo => self.redo_run(&mut *store),
            }
        };

        let duration_us = start.elapsed().as_micros() as u64;
        span.record("steps", steps);
        span.record("duration_us", duration_us);

        match outcome {
            Ok(()) => {
                debug!(
                    target: "tabula.undo",
                    direction = direction.operation(),
                    steps,
                    duration_us,
                    position = self.position,
                    "replay completed"
                );
                Ok(())
            }
            Err(detail) => Err(self.poison(detail)),
        }
    }

    /// Step backwards through one standalone entry or one transaction.
    fn undo_run<D: Datastore + ?Sized>(&mut self, store: &mut D) -> (usize, Result<(), String>) {
        let tx = self.entries[self.position - 1].tx;
        let mut steps = 0;
        loop {
            let index = self.position - 1;
            let entry = &mut self.entries[index];
            match entry.undo.apply(store) {
                Some(redo) => entry.redo = redo,
                None => {
                    return (
                        steps,
                        Err(format!(
                            "undo of {} at entry {index} had no effect",
                            entry.undo.description()
                        )),
                    );
                }
            }
            self.position -= 1;
            steps += 1;
            if tx.is_none() || !self.has_undo() || self.entries[self.position - 1].tx != tx {
                return (steps, Ok(()));
            }
        }
    }

    /// Step forwards through one standalone entry or one transaction.
    fn redo_run<D: Datastore + ?Sized>(&mut self, store: &mut D) -> (usize, Result<(), String>) {
        let tx = self.entries[self.position].tx;
        let mut steps = 0;
        loop {
            let index = self.position;
            let entry = &mut self.entries[index];
            match entry.redo.apply(store) {
                Some(undo) => entry.undo = undo,
                None => {
                    return (
                        steps,
                        Err(format!(
                            "redo of {} at entry {index} had no effect",
                            entry.redo.description()
                        )),
                    );
                }
            }
            self.position += 1;
            steps += 1;
            if tx.is_none() || !self.has_redo() || self.entries[self.position].tx != tx {
                return (steps, Ok(()));
            }
        }
    }

    // ====================================================================
    // Transactions
    // ====================================================================

    /// Open a transaction. Datastore listeners stay disabled until the
    /// matching [`end_transaction`](Self::end_transaction) or
    /// [`rollback_transaction`](Self::rollback_transaction).
    pub fn start_transaction<D: Datastore + ?Sized>(
        &mut self,
        store: &mut D,
    ) -> Result<TxId, UndoError> {
        self.check_poisoned()?;
        if self.coordinator.is_open() {
            return Err(UndoError::AlreadyInTransaction);
        }
        self.trim()?;
        let id = self.coordinator.begin()?;
        store.disable_listeners();
        debug!(target: "tabula.undo", tx = id.get(), "transaction started");
        Ok(id)
    }

    /// Close the open transaction and release datastore listeners.
    pub fn end_transaction<D: Datastore + ?Sized>(
        &mut self,
        store: &mut D,
    ) -> Result<TxId, UndoError> {
        let id = self.coordinator.finish()?;
        store.enable_listeners();
        debug!(target: "tabula.undo", tx = id.get(), "transaction ended");
        Ok(id)
    }

    /// Close the open transaction and reverse everything it did.
    ///
    /// The transaction's entries are discarded rather than left redoable.
    /// Rolling back a transaction that recorded nothing is a no-op.
    pub fn rollback_transaction<D: Datastore + ?Sized>(
        &mut self,
        store: &mut D,
    ) -> Result<(), UndoError> {
        if !self.coordinator.is_open() {
            return Err(UndoError::NotInTransaction);
        }
        // Held across the close and the reversal so the datastore delivers
        // its queued events once, after the rollback is complete.
        let mut store = ListenerSuppression::new(store);
        let id = self.end_transaction(&mut *store)?;
        self.check_poisoned()?;
        let recorded_any = self.has_undo() && self.entries[self.position - 1].tx == Some(id);
        if recorded_any {
            self.replay(&mut *store, Replay::Undo)?;
            self.truncate_redos();
        }
        drop(store);
        debug!(
            target: "tabula.undo",
            tx = id.get(),
            recorded_any,
            "transaction rolled back"
        );
        self.fire();
        Ok(())
    }

    // ====================================================================
    // Maintenance
    // ====================================================================

    /// Discard everything after the cursor.
    fn clear_redos(&mut self) {
        self.truncate_redos();
        self.fire();
    }

    fn truncate_redos(&mut self) {
        if self.has_redo() {
            let dropped = self.entries.len() - self.position;
            self.entries.truncate(self.position);
            trace!(target: "tabula.undo", dropped, "redo history discarded");
        }
    }

    /// Enforce `max_entries` without splitting a transaction.
    fn trim(&mut self) -> Result<(), UndoError> {
        self.coordinator.ensure_idle("trim")?;
        let max = self.config.max_entries;

        // Redoable entries are speculative; shed them first, whole
        // transactions at a time from the far end.
        let mut dropped_redo = 0;
        while self.entries.len() > max && self.has_redo() {
            dropped_redo += self.pop_redo_group();
        }

        let mut dropped_head = 0;
        if self.entries.len() > max {
            let mut boundary = self.entries.len() - max;
            while boundary > 0 && self.same_transaction(boundary - 1, boundary) {
                boundary -= 1;
            }
            if boundary > self.position {
                return Err(self.poison(format!(
                    "trimming {boundary} entries would move the cursor below zero (position {})",
                    self.position
                )));
            }
            self.entries.drain(..boundary);
            self.position -= boundary;
            dropped_head = boundary;
        }

        if dropped_redo > 0 || dropped_head > 0 {
            debug!(
                target: "tabula.undo",
                dropped_redo,
                dropped_head,
                len = self.entries.len(),
                max_entries = max,
                "history trimmed"
            );
        }
        self.fire();
        Ok(())
    }

    /// Pop the last redoable standalone entry or transaction.
    fn pop_redo_group(&mut self) -> usize {
        let Some(last) = self.entries.pop_back() else {
            return 0;
        };
        let mut popped = 1;
        if last.tx.is_some() {
            while self.has_redo() && self.entries.back().is_some_and(|e| e.tx == last.tx) {
                self.entries.pop_back();
                popped += 1;
            }
        }
        popped
    }

    fn same_transaction(&self, a: usize, b: usize) -> bool {
        match (self.entries.get(a), self.entries.get(b)) {
            (Some(a), Some(b)) => a.tx.is_some() && a.tx == b.tx,
            _ => false,
        }
    }

    fn fire(&mut self) {
        let state = self.state();
        self.notifier.notify(state);
    }

    fn check_poisoned(&self) -> Result<(), UndoError> {
        if self.poisoned {
            Err(UndoError::Poisoned)
        } else {
            Ok(())
        }
    }

    fn poison(&mut self, detail: String) -> UndoError {
        error!(
            target: "tabula.undo",
            position = self.position,
            len = self.entries.len(),
            detail = %detail,
            "undo history inconsistent; log poisoned"
        );
        self.poisoned = true;
        UndoError::Inconsistent { detail }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tabula_core::{
        ChangeKind, ColumnDef, ColumnType, MemoryDatastore, Row, RowId, StoreEvent, TableId,
        TableSpec, Value,
    };

    const T: TableId = TableId(1);

    fn store() -> MemoryDatastore {
        let mut store = MemoryDatastore::new();
        store.create_table(TableSpec::new(T, "Jobs"), 0);
        store.insert_column(T, 0, ColumnDef::new("qty", ColumnType::Long), false);
        store
    }

    fn insert_row(id: u64) -> Command {
        Command::InsertRow {
            table: T,
            index: 0,
            row: Row {
                id: RowId(id),
                values: vec![Value::Long(id as i64)],
            },
        }
    }

    fn row_ids(store: &MemoryDatastore) -> Vec<u64> {
        store
            .table(T)
            .map(|t| t.rows().iter().map(|r| r.id.raw()).collect())
            .unwrap_or_default()
    }

    fn tx_of(log: &TransactionLog) -> Vec<Option<u32>> {
        log.entries().map(|e| e.tx.map(TxId::get)).collect()
    }

    #[test]
    fn apply_records_and_advances() {
        let mut store = store();
        let mut log = TransactionLog::default();
        let recorded = log.apply(&mut store, insert_row(1)).unwrap().cloned();
        assert_eq!(recorded, Some(insert_row(1)));
        assert_eq!(log.len(), 1);
        assert_eq!(log.position(), 1);
        assert!(log.has_undo());
        assert!(!log.has_redo());
    }

    #[test]
    fn noop_command_is_not_recorded() {
        let mut store = store();
        let mut log = TransactionLog::default();
        let noop = Command::DeleteRow { table: T, index: 3 };
        assert_eq!(log.apply(&mut store, noop).unwrap(), None);
        assert!(log.is_empty());
        assert!(!log.has_undo());
    }

    #[test]
    fn noop_still_discards_redo() {
        let mut store = store();
        let mut log = TransactionLog::default();
        log.apply(&mut store, insert_row(1)).unwrap();
        log.undo(&mut store).unwrap();
        assert!(log.has_redo());
        log.apply(&mut store, Command::DeleteRow { table: T, index: 9 })
            .unwrap();
        assert!(!log.has_redo());
        assert!(log.is_empty());
    }

    #[test]
    fn undo_redo_standalone_entries_one_at_a_time() {
        let mut store = store();
        let mut log = TransactionLog::default();
        log.apply(&mut store, insert_row(1)).unwrap();
        log.apply(&mut store, insert_row(2)).unwrap();
        assert_eq!(row_ids(&store), vec![2, 1]);

        log.undo(&mut store).unwrap();
        assert_eq!(row_ids(&store), vec![1]);
        log.undo(&mut store).unwrap();
        assert!(row_ids(&store).is_empty());
        assert!(!log.has_undo());

        log.undo(&mut store).unwrap();
        assert_eq!(log.position(), 0);

        log.redo(&mut store).unwrap();
        assert_eq!(row_ids(&store), vec![1]);
        log.redo(&mut store).unwrap();
        assert_eq!(row_ids(&store), vec![2, 1]);
        log.redo(&mut store).unwrap();
        assert_eq!(log.position(), 2);
    }

    #[test]
    fn transaction_undoes_and_redoes_as_unit() {
        let mut store = store();
        let mut log = TransactionLog::default();
        log.apply(&mut store, insert_row(1)).unwrap();
        let tx = log.start_transaction(&mut store).unwrap();
        log.apply(&mut store, insert_row(2)).unwrap();
        log.apply(&mut store, insert_row(3)).unwrap();
        log.end_transaction(&mut store).unwrap();
        assert_eq!(tx_of(&log), vec![None, Some(tx.get()), Some(tx.get())]);

        log.undo(&mut store).unwrap();
        assert_eq!(row_ids(&store), vec![1]);
        assert_eq!(log.position(), 1);

        log.redo(&mut store).unwrap();
        assert_eq!(row_ids(&store), vec![3, 2, 1]);
        assert_eq!(log.position(), 3);
    }

    #[test]
    fn adjacent_transactions_stay_separate() {
        let mut store = store();
        let mut log = TransactionLog::default();
        for pair in [[1, 2], [3, 4]] {
            log.start_transaction(&mut store).unwrap();
            for id in pair {
                log.apply(&mut store, insert_row(id)).unwrap();
            }
            log.end_transaction(&mut store).unwrap();
        }
        log.undo(&mut store).unwrap();
        assert_eq!(row_ids(&store), vec![2, 1]);
    }

    #[test]
    fn undo_and_redo_rejected_inside_transaction() {
        let mut store = store();
        let mut log = TransactionLog::default();
        log.start_transaction(&mut store).unwrap();
        assert_eq!(
            log.undo(&mut store),
            Err(UndoError::InTransaction { operation: "undo" })
        );
        assert_eq!(
            log.redo(&mut store),
            Err(UndoError::InTransaction { operation: "redo" })
        );
        assert_eq!(
            log.start_transaction(&mut store),
            Err(UndoError::AlreadyInTransaction)
        );
        log.end_transaction(&mut store).unwrap();
        assert_eq!(
            log.end_transaction(&mut store),
            Err(UndoError::NotInTransaction)
        );
        assert!(!store.listeners_suppressed());
    }

    #[test]
    fn rollback_reverses_and_discards() {
        let mut store = store();
        let mut log = TransactionLog::default();
        log.apply(&mut store, insert_row(1)).unwrap();
        log.start_transaction(&mut store).unwrap();
        log.apply(&mut store, insert_row(2)).unwrap();
        log.apply(&mut store, insert_row(3)).unwrap();
        log.rollback_transaction(&mut store).unwrap();

        assert_eq!(row_ids(&store), vec![1]);
        assert!(!log.is_in_transaction());
        assert!(!log.has_redo());
        assert_eq!(log.len(), 1);
        assert!(!store.listeners_suppressed());
    }

    #[test]
    fn rollback_of_empty_transaction_keeps_history() {
        let mut store = store();
        let mut log = TransactionLog::default();
        log.apply(&mut store, insert_row(1)).unwrap();
        log.start_transaction(&mut store).unwrap();
        log.rollback_transaction(&mut store).unwrap();
        assert_eq!(row_ids(&store), vec![1]);
        assert_eq!(log.position(), 1);
        assert_eq!(
            log.rollback_transaction(&mut store),
            Err(UndoError::NotInTransaction)
        );
    }

    #[test]
    fn trim_drops_oldest_standalone_entries() {
        let mut store = store();
        let mut log = TransactionLog::new(UndoConfig::new(2));
        for id in 1..=4 {
            log.apply(&mut store, insert_row(id)).unwrap();
        }
        // Trim runs before each append, so one extra entry is tolerated.
        assert_eq!(log.len(), 3);
        assert_eq!(log.position(), 3);
        log.apply(&mut store, insert_row(5)).unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(row_ids(&store), vec![5, 4, 3, 2, 1]);

        for _ in 0..5 {
            log.undo(&mut store).unwrap();
        }
        assert_eq!(row_ids(&store), vec![2, 1]);
    }

    #[test]
    fn trim_never_splits_a_transaction() {
        let mut store = store();
        let mut log = TransactionLog::new(UndoConfig::new(2));
        log.start_transaction(&mut store).unwrap();
        for id in 1..=4 {
            log.apply(&mut store, insert_row(id)).unwrap();
        }
        log.end_transaction(&mut store).unwrap();
        assert_eq!(log.len(), 4);

        log.apply(&mut store, insert_row(5)).unwrap();
        // The whole transaction straddles the bound and is kept.
        assert_eq!(log.len(), 5);

        log.apply(&mut store, insert_row(6)).unwrap();
        assert_eq!(log.len(), 6);

        // Once the transaction lies wholly outside the bound it goes as a unit.
        log.apply(&mut store, insert_row(7)).unwrap();
        assert_eq!(tx_of(&log), vec![None, None, None]);
        assert_eq!(log.position(), 3);
    }

    #[test]
    fn trim_sheds_redo_before_history() {
        let mut store = store();
        let mut log = TransactionLog::new(UndoConfig::new(2));
        for id in 1..=3 {
            log.apply(&mut store, insert_row(id)).unwrap();
        }
        log.undo(&mut store).unwrap();
        assert_eq!(log.len(), 3);
        log.start_transaction(&mut store).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.position(), 2);
        log.end_transaction(&mut store).unwrap();
    }

    #[test]
    fn zero_bound_is_clamped() {
        let log = TransactionLog::new(UndoConfig::new(0));
        assert_eq!(log.config().max_entries, 1);
    }

    #[test]
    fn availability_fires_on_change_only() {
        let mut store = store();
        let mut log = TransactionLog::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        log.subscribe(move |state| sink.lock().unwrap().push(state));

        log.apply(&mut store, insert_row(1)).unwrap();
        log.apply(&mut store, insert_row(2)).unwrap();
        log.undo(&mut store).unwrap();
        log.undo(&mut store).unwrap();
        log.redo(&mut store).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                UndoState::new(true, false),
                UndoState::new(true, true),
                UndoState::new(false, true),
                UndoState::new(true, true),
            ]
        );
    }

    #[test]
    fn rollback_fires_only_the_net_transition() {
        let mut store = store();
        let mut log = TransactionLog::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        log.subscribe(move |state| sink.lock().unwrap().push(state));

        log.start_transaction(&mut store).unwrap();
        log.apply(&mut store, insert_row(1)).unwrap();
        log.apply(&mut store, insert_row(2)).unwrap();
        log.rollback_transaction(&mut store).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![UndoState::new(true, false), UndoState::new(false, false)]
        );
    }

    #[test]
    fn rollback_holds_store_events_until_reversed() {
        let mut store = store();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        store.add_listener(Box::new(move |event: &StoreEvent| {
            sink.lock().unwrap().push(event.clone());
        }));
        let mut log = TransactionLog::default();

        log.start_transaction(&mut store).unwrap();
        log.apply(&mut store, insert_row(1)).unwrap();
        log.rollback_transaction(&mut store).unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                StoreEvent::new(T, ChangeKind::RowInserted { row: RowId(1) }),
                StoreEvent::new(T, ChangeKind::RowDeleted { row: RowId(1) }),
            ]
        );
        assert!(!store.listeners_suppressed());
    }

    #[test]
    fn store_listeners_hear_nothing_mid_transaction() {
        let mut store = store();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        store.add_listener(Box::new(move |event: &StoreEvent| {
            sink.lock().unwrap().push(event.clone());
        }));
        let mut log = TransactionLog::default();

        log.start_transaction(&mut store).unwrap();
        log.apply(&mut store, insert_row(1)).unwrap();
        log.apply(&mut store, insert_row(2)).unwrap();
        assert!(events.lock().unwrap().is_empty());
        log.end_transaction(&mut store).unwrap();
        assert_eq!(events.lock().unwrap().len(), 2);

        events.lock().unwrap().clear();
        log.undo(&mut store).unwrap();
        assert_eq!(events.lock().unwrap().len(), 2);
        assert!(!store.listeners_suppressed());
    }

    #[test]
    fn divergent_history_poisons_log() {
        let mut store = store();
        let mut log = TransactionLog::default();
        log.apply(&mut store, insert_row(1)).unwrap();
        // Mutate behind the log's back so the recorded inverse cannot apply.
        store.remove_row(T, 0);

        let err = log.undo(&mut store).unwrap_err();
        assert!(matches!(err, UndoError::Inconsistent { .. }));
        assert!(log.is_poisoned());
        assert!(!store.listeners_suppressed());

        assert_eq!(log.redo(&mut store), Err(UndoError::Poisoned));
        assert_eq!(
            log.apply(&mut store, insert_row(2)).map(|c| c.cloned()),
            Err(UndoError::Poisoned)
        );
        assert_eq!(
            log.start_transaction(&mut store),
            Err(UndoError::Poisoned)
        );
    }
}
