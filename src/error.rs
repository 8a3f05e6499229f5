// src/error.rs
// =============================================================================
// Typed errors for the two collaborators the engine talks to:
// - TransportError: what can go wrong when we send a HEAD request
// - StoreError: what can go wrong when we read or write records
//
// The binary itself (main.rs, config.rs) uses anyhow::Result, just like the
// rest of a CLI app. These enums exist so the engine can tell failures apart:
// a DNS failure means "dead link", a timeout does not.
//
// Rust concepts:
// - thiserror: derives std::error::Error and Display from attributes
// - #[from]: automatic conversion so the ? operator works
// =============================================================================

use thiserror::Error;

/// Failure of a single HEAD request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The host name could not be resolved (the link is dead)
    #[error("could not resolve host: {0}")]
    NameResolution(String),

    /// The URL could not be parsed or is not http/https
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Timeout, refused connection, TLS failure, too many redirects, ...
    #[error("request failed: {0}")]
    Other(String),
}

/// Failure of the record store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("record {0} not found")]
    RecordNotFound(u64),
}
