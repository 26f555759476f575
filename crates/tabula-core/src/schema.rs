#![forbid(unsafe_code)]

//! Table and column definitions plus their settable properties.
//!
//! A [`TableSpec`] or [`ColumnDef`] carries everything needed to recreate an
//! *empty* table or column. Deleting structure therefore only has to capture
//! the definition, because the data was removed beforehand.

use std::collections::BTreeSet;

use bitflags::bitflags;

use crate::ids::TableId;
use crate::value::{ColumnType, Value};

bitflags! {
    /// Behavioural flags attached to a table.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TableFlags: u32 {
        /// The table may be absent from a datastore without error.
        const OPTIONAL  = 0b0001;
        /// Rows cannot be edited from the UI.
        const READ_ONLY = 0b0010;
        /// The table is not shown by default.
        const HIDDEN    = 0b0100;
        /// Rows are linked to an external source.
        const LINKED    = 0b1000;
    }
}

bitflags! {
    /// Behavioural flags attached to a column.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ColumnFlags: u32 {
        const OPTIONAL       = 0b0_0001;
        const READ_ONLY      = 0b0_0010;
        const HIDDEN         = 0b0_0100;
        /// Column participates in the table's natural sort order.
        const SORT_ASCENDING = 0b0_1000;
        /// Column values partition rows into batches.
        const BATCH_KEY      = 0b1_0000;
    }
}

/// Definition of a column, without its data.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub flags: ColumnFlags,
    pub description: String,
    /// Value a fresh cell takes when no explicit value is set.
    pub default_value: Value,
    pub tags: BTreeSet<String>,
}

impl ColumnDef {
    /// Create a column definition with no flags, description, default or tags.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            flags: ColumnFlags::empty(),
            description: String::new(),
            default_value: Value::Null,
            tags: BTreeSet::new(),
        }
    }

    /// Set the column flags.
    #[must_use]
    pub fn with_flags(mut self, flags: ColumnFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the column description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the default value.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = value.into();
        self
    }

    /// Current value of the property of the same kind as `like`.
    #[must_use]
    pub fn current(&self, like: &ColumnProperty) -> ColumnProperty {
        match like {
            ColumnProperty::Flags(_) => ColumnProperty::Flags(self.flags),
            ColumnProperty::Tags(_) => ColumnProperty::Tags(self.tags.clone()),
            ColumnProperty::DefaultValue(_) => {
                ColumnProperty::DefaultValue(self.default_value.clone())
            }
            ColumnProperty::Description(_) => {
                ColumnProperty::Description(self.description.clone())
            }
        }
    }

    /// Assign a property, returning the previous value of the same kind.
    pub fn assign(&mut self, property: ColumnProperty) -> ColumnProperty {
        match property {
            ColumnProperty::Flags(flags) => {
                ColumnProperty::Flags(std::mem::replace(&mut self.flags, flags))
            }
            ColumnProperty::Tags(tags) => {
                ColumnProperty::Tags(std::mem::replace(&mut self.tags, tags))
            }
            ColumnProperty::DefaultValue(value) => {
                ColumnProperty::DefaultValue(std::mem::replace(&mut self.default_value, value))
            }
            ColumnProperty::Description(text) => {
                ColumnProperty::Description(std::mem::replace(&mut self.description, text))
            }
        }
    }
}

/// Identity and properties of a table, without its columns or rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSpec {
    pub id: TableId,
    pub name: String,
    pub flags: TableFlags,
    pub tags: BTreeSet<String>,
}

impl TableSpec {
    /// Create a spec with no flags or tags.
    #[must_use]
    pub fn new(id: TableId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            flags: TableFlags::empty(),
            tags: BTreeSet::new(),
        }
    }

    /// Current value of the property of the same kind as `like`.
    #[must_use]
    pub fn current(&self, like: &TableProperty) -> TableProperty {
        match like {
            TableProperty::Name(_) => TableProperty::Name(self.name.clone()),
            TableProperty::Flags(_) => TableProperty::Flags(self.flags),
            TableProperty::Tags(_) => TableProperty::Tags(self.tags.clone()),
        }
    }

    /// Assign a property, returning the previous value of the same kind.
    pub fn assign(&mut self, property: TableProperty) -> TableProperty {
        match property {
            TableProperty::Name(name) => {
                TableProperty::Name(std::mem::replace(&mut self.name, name))
            }
            TableProperty::Flags(flags) => {
                TableProperty::Flags(std::mem::replace(&mut self.flags, flags))
            }
            TableProperty::Tags(tags) => {
                TableProperty::Tags(std::mem::replace(&mut self.tags, tags))
            }
        }
    }
}

/// A settable table-level property together with its new value.
#[derive(Debug, Clone, PartialEq)]
pub enum TableProperty {
    Name(String),
    Flags(TableFlags),
    Tags(BTreeSet<String>),
}

impl TableProperty {
    /// Short property name for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Name(_) => "name",
            Self::Flags(_) => "flags",
            Self::Tags(_) => "tags",
        }
    }
}

/// A settable column-level property together with its new value.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnProperty {
    Flags(ColumnFlags),
    Tags(BTreeSet<String>),
    DefaultValue(Value),
    Description(String),
}

impl ColumnProperty {
    /// Short property name for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Flags(_) => "flags",
            Self::Tags(_) => "tags",
            Self::DefaultValue(_) => "default_value",
            Self::Description(_) => "description",
        }
    }
}

/// Case-insensitive name comparison used for table and column uniqueness.
#[must_use]
pub fn names_match(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
