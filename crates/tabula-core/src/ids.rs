#![forbid(unsafe_code)]

//! Stable identifiers for tables and rows.

use std::fmt;

/// Immutable identifier of a table.
///
/// Unlike a table's index in the datastore, the id never changes when other
/// tables are created or deleted, so commands can safely refer to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableId(pub u32);

impl TableId {
    /// Create a table id from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw id value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table#{}", self.0)
    }
}

/// Immutable identifier of a row, unique across the whole datastore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(pub u64);

impl RowId {
    /// Create a row id from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_raw_values() {
        assert_eq!(TableId::new(7).raw(), 7);
        assert_eq!(RowId::new(42).raw(), 42);
    }

    #[test]
    fn ids_display() {
        assert_eq!(TableId::new(3).to_string(), "table#3");
        assert_eq!(RowId::new(9).to_string(), "row#9");
    }
}
