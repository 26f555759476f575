#![forbid(unsafe_code)]

//! Configuration for the undo log.
//!
//! # Loading
//!
//! With the `config` feature enabled, [`UndoConfig`] can be loaded from
//! TOML or JSON:
//!
//! ```toml
//! # tabula-undo.toml
//! max_entries = 500
//! ```
//!
//! ```rust,ignore
//! let config = UndoConfig::from_toml_file("tabula-undo.toml")?;
//! ```
//!
//! Missing fields take their defaults. The default history bound is
//! unbounded.

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Configuration for [`TransactionLog`](crate::TransactionLog).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct UndoConfig {
    /// History size ceiling. Trimming never splits a transaction, so the
    /// history may exceed this by the size of one transaction.
    pub max_entries: usize,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl UndoConfig {
    /// Create a configuration with the given history bound.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self { max_entries }
    }

    /// No practical bound on history length.
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_entries: usize::MAX,
        }
    }

    /// Set the history bound.
    #[must_use]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Validate all parameters. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.max_entries == 0 {
            errors.push("max_entries must be > 0".into());
        }
        errors
    }

    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, UndoConfigError> {
        let config: Self = toml::from_str(s).map_err(UndoConfigError::Toml)?;
        config.checked()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, UndoConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(UndoConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, UndoConfigError> {
        let config: Self = serde_json::from_str(s).map_err(UndoConfigError::Json)?;
        config.checked()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, UndoConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(UndoConfigError::Io)?;
        Self::from_json_str(&content)
    }

    #[cfg(feature = "config")]
    fn checked(self) -> Result<Self, UndoConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(UndoConfigError::Validation(errors))
        }
    }
}

/// Errors that can occur when loading an undo configuration.
#[derive(Debug)]
pub enum UndoConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for UndoConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for UndoConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
