//! Crate-wide error taxonomy.
//!
//! Mirrors the error table of the engine's design document: conditions a
//! caller can hit in normal operation (`Duplicate`, `Capacity`,
//! `SynonymExhausted`, `Decode`, `Io`) are returned as `Result`; violations
//! of the training precondition (non-increasing keys, mismatched lengths)
//! remain panics, since they indicate a programmer error rather than a
//! recoverable runtime condition.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, RolexError>;

#[derive(Debug, Error)]
pub enum RolexError {
    /// Insert of a key that is already present.
    #[error("key {key} already present")]
    Duplicate {
        /// The duplicate key.
        key: u64,
    },

    /// The leaf arena has no free slots left; this insert requires
    /// retraining or reprovisioning.
    #[error("leaf arena exhausted")]
    Capacity,

    /// The submodel's synonym table has reached `SYN_MAX - 1` entries;
    /// this insert signals a retraining requirement.
    #[error("synonym table exhausted")]
    SynonymExhausted,

    /// A serialized buffer was truncated or internally inconsistent.
    #[error("decode error: {0}")]
    Decode(String),

    /// I/O failure reading/writing a serialized arena or an RPC stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
