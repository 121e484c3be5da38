//! Error
//!
//! This module provides the errors needed in [`crate::Session`]
//! with [`thiserror`]
//!
use std::io;
use thiserror::Error;

use crate::command::TransactionId;

/// Result use the [`DbgpError`] as error.
pub type Result<T> = std::result::Result<T, DbgpError>;

/// DbgpError is the specific error for the DBGP client.
#[derive(Error, Debug)]
pub enum DbgpError {
    #[error("io error {0}")]
    /// IO relevant errors
    IOError(#[from] io::Error),
    #[error("serde error {0}")]
    /// Serialized or Deserialized errors
    SerdeError(#[from] serde_json::Error),
    #[error("xml error {0}")]
    /// Inbound message is not well-formed XML
    XmlError(#[from] roxmltree::Error),
    #[error("base64 error {0}")]
    /// Payload is not valid base64
    Base64Error(#[from] base64::DecodeError),
    #[error("store error {0}")]
    /// Breakpoint store failure
    StoreError(#[from] sled::Error),

    /// The engine truncated a value to its `max_data` limit.
    #[error("insufficient value: declared size {declared}, got {actual} bytes")]
    UnsufficientValue {
        /// Size reported by the engine.
        declared: i64,
        /// Bytes actually received.
        actual: usize,
    },

    /// Character encoding name is not supported
    #[error("unsupported charset {0}")]
    UnsupportedCharset(String),

    /// Inbound frame could not be split
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Remove a non existent breakpoint
    #[error("the breakpoint {0} is not existent")]
    NonExistentBreakpoint(String),

    /// The engine connection is gone
    #[error("session closed")]
    SessionClosed,

    /// No response arrived for a transaction in time
    #[error("transaction {0} timed out")]
    Timeout(TransactionId),

    /// The worker pool no longer accepts jobs
    #[error("thread pool closed")]
    PoolClosed,
}
