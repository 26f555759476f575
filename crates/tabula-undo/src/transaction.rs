#![forbid(unsafe_code)]

//! Transaction state machine and id allocation.
//!
//! ```text
//!            begin()                 finish()
//!   Idle ───────────────▶ Open(tx) ───────────────▶ Idle
//!    │  finish() = NotInTransaction   │  begin() = AlreadyInTransaction
//! ```
//!
//! Ids are never zero so that `Option<TxId>` stays the size of a `u32`;
//! standalone history entries carry `None`.

use std::fmt;
use std::num::NonZeroU32;

use crate::error::UndoError;

/// Identifier shared by every history entry of one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxId(NonZeroU32);

impl TxId {
    /// The first id handed out by a fresh generator.
    pub const FIRST: Self = Self(NonZeroU32::MIN);

    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// The id after this one, wrapping from `u32::MAX` back to 1.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.checked_add(1).unwrap_or(NonZeroU32::MIN))
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx#{}", self.0)
    }
}

/// Current transaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxState {
    #[default]
    Idle,
    Open(TxId),
}

/// Tracks whether a transaction is open and allocates transaction ids.
#[derive(Debug, Clone)]
pub struct TransactionCoordinator {
    state: TxState,
    next_id: TxId,
}

impl Default for TransactionCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: TxState::Idle,
            next_id: TxId::FIRST,
        }
    }

    /// Start allocating from `next_id`. Used to exercise wrap-around.
    #[cfg(test)]
    pub(crate) fn starting_at(next_id: TxId) -> Self {
        Self {
            state: TxState::Idle,
            next_id,
        }
    }

    #[must_use]
    pub fn state(&self) -> TxState {
        self.state
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.state, TxState::Open(_))
    }

    /// Id of the open transaction; `None` means mutations are standalone.
    #[must_use]
    pub fn current(&self) -> Option<TxId> {
        match self.state {
            TxState::Idle => None,
            TxState::Open(id) => Some(id),
        }
    }

    /// Open a transaction with a freshly allocated id.
    pub fn begin(&mut self) -> Result<TxId, UndoError> {
        if self.is_open() {
            return Err(UndoError::AlreadyInTransaction);
        }
        let id = self.next_id;
        self.next_id = id.next();
        self.state = TxState::Open(id);
        Ok(id)
    }

    /// Close the open transaction, returning its id.
    pub fn finish(&mut self) -> Result<TxId, UndoError> {
        match self.state {
            TxState::Idle => Err(UndoError::NotInTransaction),
            TxState::Open(id) => {
                self.state = TxState::Idle;
                Ok(id)
            }
        }
    }

    /// Fail with `InTransaction` naming `operation` if a transaction is open.
    pub fn ensure_idle(&self, operation: &'static str) -> Result<(), UndoError> {
        if self.is_open() {
            Err(UndoError::InTransaction { operation })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_and_finish() {
        let mut coord = TransactionCoordinator::new();
        assert_eq!(coord.current(), None);
        let id = coord.begin().unwrap();
        assert_eq!(id, TxId::FIRST);
        assert_eq!(coord.state(), TxState::Open(id));
        assert_eq!(coord.current(), Some(id));
        assert_eq!(coord.finish().unwrap(), id);
        assert!(!coord.is_open());
    }

    #[test]
    fn double_begin_leaves_state_unchanged() {
        let mut coord = TransactionCoordinator::new();
        let id = coord.begin().unwrap();
        assert_eq!(coord.begin(), Err(UndoError::AlreadyInTransaction));
        assert_eq!(coord.current(), Some(id));
    }

    #[test]
    fn finish_while_idle() {
        let mut coord = TransactionCoordinator::new();
        assert_eq!(coord.finish(), Err(UndoError::NotInTransaction));
    }

    #[test]
    fn ids_are_fresh_per_transaction() {
        let mut coord = TransactionCoordinator::new();
        let a = coord.begin().unwrap();
        coord.finish().unwrap();
        let b = coord.begin().unwrap();
        assert_ne!(a, b);
        assert_eq!(b.get(), 2);
    }

    #[test]
    fn ids_wrap_to_one() {
        let max = TxId(NonZeroU32::MAX);
        assert_eq!(max.next(), TxId::FIRST);

        let mut coord = TransactionCoordinator::starting_at(max);
        assert_eq!(coord.begin().unwrap().get(), u32::MAX);
        coord.finish().unwrap();
        assert_eq!(coord.begin().unwrap().get(), 1);
    }

    #[test]
    fn ensure_idle_names_operation() {
        let mut coord = TransactionCoordinator::new();
        assert!(coord.ensure_idle("undo").is_ok());
        coord.begin().unwrap();
        assert_eq!(
            coord.ensure_idle("redo"),
            Err(UndoError::InTransaction { operation: "redo" })
        );
    }

    #[test]
    fn display() {
        assert_eq!(TxId::FIRST.to_string(), "tx#1");
    }
}
