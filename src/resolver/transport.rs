// src/resolver/transport.rs
// =============================================================================
// This module sends the actual HTTP requests.
//
// Key functionality:
// - Makes HTTP HEAD requests (lightweight, no body download)
// - Either stops at the first response (to see a 301 as a 301) or follows
//   redirects up to a hop limit (to find where a 301 ends up)
// - Tells DNS failures apart from every other kind of failure
//
// The engine never talks to reqwest directly. It talks to the HttpTransport
// trait, so tests can plug in a stub that answers from a table.
//
// Rust concepts:
// - Traits: An interface the resolver is generic over
// - async-trait: Lets a trait have async methods
// - Error source chains: Walking .source() to find the root cause
// =============================================================================

use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

use crate::error::TransportError;

/// Whether a HEAD request should follow redirects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Redirects {
    /// Return the first response as-is (a 301 stays a 301)
    Manual,
    /// Follow redirects up to the transport's configured hop limit
    Follow,
}

/// What a successful HEAD request tells us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadResponse {
    /// Status code of the last response received
    pub status: u16,
    /// URL of the last response received (differs from the request URL
    /// when redirects were followed)
    pub final_url: String,
}

/// Header-only HTTP access, as the resolver needs it.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn head(&self, url: &str, redirects: Redirects) -> Result<HeadResponse, TransportError>;
}

/// The production transport, backed by two reqwest clients.
///
/// reqwest fixes the redirect policy when a client is built, so we keep one
/// client per mode. Both share connection pools internally per client.
pub struct ReqwestTransport {
    manual: Client,
    follow: Client,
}

impl ReqwestTransport {
    /// Builds the transport.
    ///
    /// Parameters:
    ///   timeout: per-request timeout
    ///   max_redirects: hop limit used in Redirects::Follow mode
    pub fn new(timeout: Duration, max_redirects: usize) -> reqwest::Result<Self> {
        Ok(Self {
            manual: build_client(timeout, Policy::none())?,
            follow: build_client(timeout, Policy::limited(max_redirects))?,
        })
    }
}

fn build_client(timeout: Duration, policy: Policy) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .redirect(policy)
        .user_agent(concat!("link-mender/", env!("CARGO_PKG_VERSION")))
        .build()
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn head(&self, url: &str, redirects: Redirects) -> Result<HeadResponse, TransportError> {
        // Reject garbage like "httpfoo" before it costs a request
        let target = checkable_url(url)?;

        let client = match redirects {
            Redirects::Manual => &self.manual,
            Redirects::Follow => &self.follow,
        };

        match client.head(target).send().await {
            Ok(response) => Ok(HeadResponse {
                status: response.status().as_u16(),
                final_url: response.url().to_string(),
            }),
            Err(e) => Err(categorize_error(&e)),
        }
    }
}

// Parses a URL and makes sure it is something we can send a HEAD request to
//
// We skip anything that is not http/https (the bare-URL pattern only
// guarantees the token *starts* with "http")
pub fn checkable_url(url: &str) -> Result<Url, TransportError> {
    let parsed = Url::parse(url).map_err(|e| TransportError::InvalidUrl(format!("{url}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(TransportError::InvalidUrl(format!(
            "{url}: unsupported scheme '{other}'"
        ))),
    }
}

// Categorizes reqwest errors
//
// reqwest wraps the interesting part (hyper's "dns error", the resolver's
// "failed to lookup address information") a few levels deep, so we flatten
// the whole source chain into one string first.
fn categorize_error(error: &reqwest::Error) -> TransportError {
    let chain = error_chain(error);

    if is_dns_failure(&chain) {
        TransportError::NameResolution(chain)
    } else if error.is_timeout() {
        TransportError::Other("request timed out".to_string())
    } else if error.is_redirect() {
        TransportError::Other("too many redirects".to_string())
    } else {
        TransportError::Other(chain)
    }
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

fn is_dns_failure(chain: &str) -> bool {
    let lower = chain.to_lowercase();
    lower.contains("dns error")
        || lower.contains("failed to lookup address")
        || lower.contains("name or service not known")
        || lower.contains("no such host")
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a trait instead of calling reqwest directly?
//    - The resolver is written against HttpTransport, not reqwest
//    - Tests swap in a stub that answers from a HashMap and counts calls
//    - No test ever needs an internet connection
//
// 2. What does #[async_trait] do?
//    - It rewrites `async fn head(...)` into a method returning a boxed
//      future, which lets the trait be used generically and as a dyn object
//
// 3. What is an error source chain?
//    - Errors can wrap other errors; .source() returns the wrapped one
//    - reqwest -> hyper -> io error: the useful text is at the bottom
// -----------------------------------------------------------------------------
