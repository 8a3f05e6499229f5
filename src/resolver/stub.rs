// src/resolver/stub.rs
// Table-driven HttpTransport for tests. Unlisted URLs answer 200.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::transport::{HeadResponse, HttpTransport, Redirects};
use crate::error::TransportError;

#[derive(Default)]
pub struct StubTransport {
    statuses: HashMap<String, Result<u16, TransportError>>,
    destinations: HashMap<String, Result<String, TransportError>>,
    calls: Mutex<Vec<(String, Redirects)>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, url: &str, code: u16) -> Self {
        self.statuses.insert(url.to_string(), Ok(code));
        self
    }

    pub fn dead(self, url: &str) -> Self {
        self.with_status(url, 404)
    }

    pub fn moved(mut self, url: &str, destination: &str) -> Self {
        self.destinations
            .insert(url.to_string(), Ok(destination.to_string()));
        self.with_status(url, 301)
    }

    pub fn moved_nowhere(mut self, url: &str) -> Self {
        self.destinations.insert(
            url.to_string(),
            Err(TransportError::Other("too many redirects".to_string())),
        );
        self.with_status(url, 301)
    }

    pub fn unresolvable(mut self, url: &str) -> Self {
        self.statuses.insert(
            url.to_string(),
            Err(TransportError::NameResolution(url.to_string())),
        );
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.statuses.insert(
            url.to_string(),
            Err(TransportError::Other("connection refused".to_string())),
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(called, _)| called == url)
            .count()
    }

    pub fn follow_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, mode)| *mode == Redirects::Follow)
            .count()
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn head(&self, url: &str, redirects: Redirects) -> Result<HeadResponse, TransportError> {
        self.calls.lock().unwrap().push((url.to_string(), redirects));

        match redirects {
            Redirects::Manual => {
                let status = self.statuses.get(url).cloned().unwrap_or(Ok(200))?;
                Ok(HeadResponse {
                    status,
                    final_url: url.to_string(),
                })
            }
            Redirects::Follow => {
                let final_url = self
                    .destinations
                    .get(url)
                    .cloned()
                    .unwrap_or_else(|| Ok(url.to_string()))?;
                Ok(HeadResponse {
                    status: 200,
                    final_url,
                })
            }
        }
    }
}
