//! Transaction settings for the read-modify-write operations.
//!
//! `update` and `delete` each run their lookup and write inside a single
//! transaction opened with these settings. Leaving both fields unset uses the
//! database defaults.
//!
//! ```yaml
//! repository:
//!   tx:
//!     isolation: serializable
//!     access_mode: read_write
//! ```

use sea_orm::{AccessMode, IsolationLevel};
use serde::Deserialize;

/// Transaction isolation level.
///
/// `SQLite` ignores everything but its own serializable default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxIsolationLevel {
    ReadUncommitted,
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

/// Transaction access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxAccessMode {
    ReadOnly,
    #[default]
    ReadWrite,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TxConfig {
    /// `None` keeps the database default.
    pub isolation: Option<TxIsolationLevel>,
    /// `None` keeps the database default (usually read-write).
    pub access_mode: Option<TxAccessMode>,
}

impl TxConfig {
    #[must_use]
    pub fn with_isolation(isolation: TxIsolationLevel) -> Self {
        Self {
            isolation: Some(isolation),
            access_mode: None,
        }
    }

    #[must_use]
    pub fn serializable() -> Self {
        Self::with_isolation(TxIsolationLevel::Serializable)
    }

    /// `SeaORM` arguments for `begin_with_config`.
    pub(crate) fn sea_args(&self) -> (Option<IsolationLevel>, Option<AccessMode>) {
        (
            self.isolation.map(Into::into),
            self.access_mode.map(Into::into),
        )
    }
}

impl From<TxIsolationLevel> for IsolationLevel {
    fn from(level: TxIsolationLevel) -> Self {
        match level {
            TxIsolationLevel::ReadUncommitted => IsolationLevel::ReadUncommitted,
            TxIsolationLevel::ReadCommitted => IsolationLevel::ReadCommitted,
            TxIsolationLevel::RepeatableRead => IsolationLevel::RepeatableRead,
            TxIsolationLevel::Serializable => IsolationLevel::Serializable,
        }
    }
}

impl From<TxAccessMode> for AccessMode {
    fn from(mode: TxAccessMode) -> Self {
        match mode {
            TxAccessMode::ReadOnly => AccessMode::ReadOnly,
            TxAccessMode::ReadWrite => AccessMode::ReadWrite,
        }
    }
}
