// src/resolver/lookup.rs
// =============================================================================
// This module answers "is this URL still alive, and if it moved, where to?"
//
// Key functionality:
// - status(): one HEAD request without following redirects
// - redirect_destination(): one HEAD request following redirects
// - outcome(): combines both into Live / Moved / Dead
// - outcomes(): resolves many URLs concurrently
//
// Every answer is cached for the rest of the run, keyed by the exact URL
// string. Each cache entry is a tokio OnceCell, so if two tasks ask about the
// same URL at the same time, the second one waits for the first request
// instead of sending its own.
//
// Rust concepts:
// - Generics: Resolver<T> works with any HttpTransport
// - Arc<OnceCell<T>>: A shared slot that is filled exactly once
// - Streams: buffer_unordered() for bounded concurrency
// =============================================================================

use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::transport::{HttpTransport, Redirects};
use crate::error::TransportError;

/// What a HEAD request (without following redirects) says about a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// Any status code we take no action on (200, 302, 403, 500, ...)
    Live(u16),
    /// 301 Moved Permanently
    MovedPermanently,
    /// 404 Not Found, or the host name does not resolve
    NotFound,
    /// The request failed for another reason (timeout, refused, TLS, ...)
    Unknown,
}

impl LinkStatus {
    pub fn from_code(code: u16) -> Self {
        match code {
            301 => LinkStatus::MovedPermanently,
            404 => LinkStatus::NotFound,
            other => LinkStatus::Live(other),
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkStatus::Live(code) => write!(f, "{code}"),
            LinkStatus::MovedPermanently => f.write_str("301"),
            LinkStatus::NotFound => f.write_str("404"),
            LinkStatus::Unknown => f.write_str("unknown"),
        }
    }
}

/// The final verdict for a URL, as the rewrite policy sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Leave the link alone
    Live,
    /// The link moved permanently; holds the final destination
    Moved(String),
    /// The link is gone (404, dead host, or a 301 that leads nowhere)
    Dead,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Live => f.write_str("live"),
            Outcome::Moved(destination) => write!(f, "moved to {destination}"),
            Outcome::Dead => f.write_str("dead"),
        }
    }
}

type Slots<V> = Mutex<HashMap<String, Arc<OnceCell<V>>>>;

/// Memoizing URL resolver, scoped to one scan run.
pub struct Resolver<T> {
    transport: T,
    concurrency: usize,
    statuses: Slots<LinkStatus>,
    destinations: Slots<Option<String>>,
    requests: AtomicUsize,
}

impl<T: HttpTransport> Resolver<T> {
    /// Creates an empty resolver.
    ///
    /// `concurrency` bounds how many distinct URLs outcomes() resolves at
    /// once. Zero is treated as one.
    pub fn new(transport: T, concurrency: usize) -> Self {
        Self {
            transport,
            concurrency: concurrency.max(1),
            statuses: Mutex::default(),
            destinations: Mutex::default(),
            requests: AtomicUsize::new(0),
        }
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Number of HEAD requests attempted so far (invalid URLs included).
    pub fn requests_sent(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    /// Status of `url` without following redirects.
    pub async fn status(&self, url: &str) -> LinkStatus {
        let slot = slot(&self.statuses, url);
        *slot.get_or_init(|| self.fetch_status(url)).await
    }

    /// Where `url` ends up after following redirects, or None if the chain
    /// could not be followed to the end.
    pub async fn redirect_destination(&self, url: &str) -> Option<String> {
        let slot = slot(&self.destinations, url);
        slot.get_or_init(|| self.fetch_destination(url))
            .await
            .clone()
    }

    /// Status and (for 301s) destination, folded into an Outcome.
    pub async fn outcome(&self, url: &str) -> Outcome {
        match self.status(url).await {
            LinkStatus::Live(_) | LinkStatus::Unknown => Outcome::Live,
            LinkStatus::NotFound => Outcome::Dead,
            LinkStatus::MovedPermanently => match self.redirect_destination(url).await {
                Some(destination) => Outcome::Moved(destination),
                None => Outcome::Dead,
            },
        }
    }

    /// Resolves every distinct URL in `urls`, up to `concurrency` at a time.
    pub async fn outcomes<'u, I>(&self, urls: I) -> HashMap<&'u str, Outcome>
    where
        I: IntoIterator<Item = &'u str>,
    {
        let unique: HashSet<&'u str> = urls.into_iter().collect();

        stream::iter(unique)
            .map(|url| async move { (url, self.outcome(url).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await
    }

    async fn fetch_status(&self, url: &str) -> LinkStatus {
        self.requests.fetch_add(1, Ordering::Relaxed);

        match self.transport.head(url, Redirects::Manual).await {
            Ok(response) => {
                debug!(url, status = response.status, "status checked");
                LinkStatus::from_code(response.status)
            }
            Err(TransportError::NameResolution(reason)) => {
                // A host that no longer exists is as dead as a 404
                debug!(url, %reason, "host did not resolve");
                LinkStatus::NotFound
            }
            Err(e) => {
                warn!(url, error = %e, "status check failed");
                LinkStatus::Unknown
            }
        }
    }

    async fn fetch_destination(&self, url: &str) -> Option<String> {
        self.requests.fetch_add(1, Ordering::Relaxed);

        match self.transport.head(url, Redirects::Follow).await {
            Ok(response) => Some(response.final_url),
            Err(e) => {
                debug!(url, error = %e, "redirect chain could not be followed");
                None
            }
        }
    }
}

// Returns the cache slot for `url`, creating an empty one if needed.
// The lock is held only long enough to clone the Arc.
fn slot<V>(slots: &Slots<V>, url: &str) -> Arc<OnceCell<V>> {
    let mut map = slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    map.entry(url.to_string()).or_default().clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::stub::StubTransport;

    #[test]
    fn test_status_from_code() {
        assert_eq!(LinkStatus::from_code(200), LinkStatus::Live(200));
        assert_eq!(LinkStatus::from_code(301), LinkStatus::MovedPermanently);
        assert_eq!(LinkStatus::from_code(302), LinkStatus::Live(302));
        assert_eq!(LinkStatus::from_code(404), LinkStatus::NotFound);
        assert_eq!(LinkStatus::from_code(410), LinkStatus::Live(410));
        assert_eq!(LinkStatus::from_code(503), LinkStatus::Live(503));
    }

    #[tokio::test]
    async fn test_status_is_cached_per_exact_url() {
        let resolver = Resolver::new(StubTransport::new(), 4);

        assert_eq!(resolver.status("http://a.example/").await, LinkStatus::Live(200));
        assert_eq!(resolver.status("http://a.example/").await, LinkStatus::Live(200));
        // Different string, different key - no normalization
        assert_eq!(resolver.status("http://a.example").await, LinkStatus::Live(200));

        assert_eq!(resolver.transport().calls_for("http://a.example/"), 1);
        assert_eq!(resolver.transport().calls_for("http://a.example"), 1);
        assert_eq!(resolver.requests_sent(), 2);
    }

    #[tokio::test]
    async fn test_dns_failure_is_not_found() {
        let resolver = Resolver::new(StubTransport::new().unresolvable("http://gone.example/"), 1);
        assert_eq!(resolver.status("http://gone.example/").await, LinkStatus::NotFound);
        assert_eq!(resolver.outcome("http://gone.example/").await, Outcome::Dead);
    }

    #[tokio::test]
    async fn test_other_failure_is_unknown_and_live() {
        let resolver = Resolver::new(StubTransport::new().failing("http://flaky.example/"), 1);
        assert_eq!(resolver.status("http://flaky.example/").await, LinkStatus::Unknown);
        assert_eq!(resolver.outcome("http://flaky.example/").await, Outcome::Live);
    }

    #[tokio::test]
    async fn test_moved_outcome_uses_destination() {
        let stub = StubTransport::new().moved("http://old.example/a", "http://new.example/a");
        let resolver = Resolver::new(stub, 1);

        assert_eq!(
            resolver.outcome("http://old.example/a").await,
            Outcome::Moved("http://new.example/a".to_string())
        );
        // Second lookup answers from both caches
        resolver.outcome("http://old.example/a").await;
        assert_eq!(resolver.transport().calls_for("http://old.example/a"), 2);
    }

    #[tokio::test]
    async fn test_moved_without_destination_is_dead() {
        let stub = StubTransport::new().moved_nowhere("http://loop.example/");
        let resolver = Resolver::new(stub, 1);
        assert_eq!(resolver.redirect_destination("http://loop.example/").await, None);
        assert_eq!(resolver.outcome("http://loop.example/").await, Outcome::Dead);
    }

    #[tokio::test]
    async fn test_destination_not_queried_for_live_links() {
        let resolver = Resolver::new(StubTransport::new(), 1);
        resolver.outcome("http://fine.example/").await;
        assert_eq!(resolver.transport().follow_calls(), 0);
    }

    #[tokio::test]
    async fn test_outcomes_deduplicates() {
        let stub = StubTransport::new().dead("http://dead.example/");
        let resolver = Resolver::new(stub, 8);

        let urls = ["http://dead.example/", "http://ok.example/", "http://dead.example/"];
        let outcomes = resolver.outcomes(urls).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes["http://dead.example/"], Outcome::Dead);
        assert_eq!(outcomes["http://ok.example/"], Outcome::Live);
        assert_eq!(resolver.transport().calls_for("http://dead.example/"), 1);
    }
}
