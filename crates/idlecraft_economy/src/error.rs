//! # Economy Error Types
//!
//! Every way an economy operation can be declined.
//!
//! None of these are fatal: the core never panics on a declined operation,
//! it hands the reason back and leaves the ledger untouched.

use thiserror::Error;

/// Errors that can occur in the economy system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EconomyError {
    /// A craft or upgrade cost is not covered by the ledger.
    #[error("insufficient resources: need {required} of {item}, have {available}")]
    InsufficientResources {
        /// The item that was missing.
        item: String,
        /// The amount required.
        required: u32,
        /// The amount available.
        available: u32,
    },

    /// Craft key not present in the craft book.
    #[error("craft not found: {0}")]
    UnknownCraft(String),

    /// Upgrade key not present in the upgrade tree.
    #[error("upgrade not found: {0}")]
    UnknownUpgrade(String),

    /// Item key not present in the item catalog.
    #[error("item not found: {0}")]
    UnknownItem(String),

    /// Resource node key not present in the catalog.
    #[error("resource not found: {0}")]
    UnknownResource(String),

    /// No ledger entry carries this instance id.
    #[error("no inventory entry with instance id {0}")]
    UnknownInstance(String),

    /// Invalid catalog or configuration data.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A catalog file could not be read.
    #[error("failed to read {path}: {reason}")]
    Io {
        /// File that failed.
        path: String,
        /// Underlying error message.
        reason: String,
    },
}

impl EconomyError {
    /// Returns true when the operation was declined for lack of items.
    #[must_use]
    pub const fn is_insufficient(&self) -> bool {
        matches!(self, Self::InsufficientResources { .. })
    }
}

/// Result type for economy operations.
pub type EconomyResult<T> = Result<T, EconomyError>;
