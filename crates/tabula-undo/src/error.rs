#![forbid(unsafe_code)]

//! Errors reported by the undo log and the undoable datastore.
//!
//! # Taxonomy
//!
//! - **Usage errors** (`AlreadyInTransaction`, `NotInTransaction`,
//!   `InTransaction`): the caller asked for something the current state does
//!   not allow. State is left unchanged.
//! - **Unsupported operations** (`Unsupported`): mutation paths that would
//!   bypass history.
//! - **Rejected operations** (`Rejected`): the datastore refused a step of a
//!   composite operation. The steps already taken are rolled back.
//! - **Internal-consistency violations** (`Inconsistent`): a replayed command
//!   produced no inverse, or trimming would move the cursor below zero. The
//!   log poisons itself; every later call reports `Poisoned`.
//!
//! A command that had no effect is not an error.

use std::fmt;

/// Errors that can occur while applying, undoing, or redoing commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoError {
    /// `start_transaction` while a transaction is already open.
    AlreadyInTransaction,
    /// `end_transaction` or `rollback_transaction` with no open transaction.
    NotInTransaction,
    /// An operation that is invalid while a transaction is open.
    InTransaction { operation: &'static str },
    /// A mutation path that an undoable datastore does not support.
    Unsupported { operation: &'static str },
    /// The datastore refused a step of a composite operation.
    Rejected { operation: &'static str },
    /// History no longer matches the datastore.
    Inconsistent { detail: String },
    /// The log hit an inconsistency earlier and refuses further work.
    Poisoned,
}

impl UndoError {
    /// True for errors caused by caller misuse rather than broken state.
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::AlreadyInTransaction | Self::NotInTransaction | Self::InTransaction { .. }
        )
    }

    /// True for errors after which the log cannot be trusted.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Inconsistent { .. } | Self::Poisoned)
    }
}

impl fmt::Display for UndoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInTransaction => write!(f, "datastore is already in a transaction"),
            Self::NotInTransaction => write!(f, "no transaction is open"),
            Self::InTransaction { operation } => {
                write!(f, "{operation} is invalid while a transaction is open")
            }
            Self::Unsupported { operation } => {
                write!(f, "{operation} is unsupported on an undoable datastore")
            }
            Self::Rejected { operation } => write!(f, "{operation} was rejected by the datastore"),
            Self::Inconsistent { detail } => write!(f, "undo history is inconsistent: {detail}"),
            Self::Poisoned => write!(f, "undo history was poisoned by an earlier inconsistency"),
        }
    }
}

impl std::error::Error for UndoError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_operation() {
        let err = UndoError::InTransaction { operation: "undo" };
        assert_eq!(err.to_string(), "undo is invalid while a transaction is open");

        let err = UndoError::Unsupported {
            operation: "bulk append",
        };
        assert!(err.to_string().contains("bulk append"));

        let err = UndoError::Rejected {
            operation: "delete table",
        };
        assert_eq!(err.to_string(), "delete table was rejected by the datastore");
    }

    #[test]
    fn classification() {
        assert!(UndoError::AlreadyInTransaction.is_usage_error());
        assert!(!UndoError::AlreadyInTransaction.is_fatal());
        assert!(UndoError::Poisoned.is_fatal());
        assert!(
            UndoError::Inconsistent {
                detail: String::new()
            }
            .is_fatal()
        );
        assert!(
            !UndoError::Unsupported {
                operation: "bulk append"
            }
            .is_usage_error()
        );
        let rejected = UndoError::Rejected {
            operation: "delete column",
        };
        assert!(!rejected.is_usage_error());
        assert!(!rejected.is_fatal());
    }
}
