// src/resolver/mod.rs
// =============================================================================
// This module decides whether URLs are alive.
//
// Submodules:
// - transport: Sends HEAD requests (the HttpTransport trait + reqwest impl)
// - lookup: The per-run memoizing Resolver on top of a transport
// =============================================================================

mod lookup;
mod transport;

#[cfg(test)]
pub(crate) mod stub;

pub use lookup::{Outcome, Resolver};
pub use transport::{HttpTransport, ReqwestTransport};
