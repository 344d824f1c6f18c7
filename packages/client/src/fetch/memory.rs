//! In-memory fetcher.
//!
//! Serves canned bodies keyed by IRI and counts every request it receives,
//! so tests can assert exactly which pages a walk dereferenced. Unknown IRIs
//! answer with status 404, just as a server would.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use weftstreams::Iri;

use super::{Fetch, FetchError};
use crate::cancel::Cancellation;

enum Response {
    Body(Vec<u8>),
    Status(u16),
}

#[derive(Default)]
struct Inner {
    responses: HashMap<Iri, Response>,
    requests: Vec<Iri>,
}

/// Thread-safe, in-memory implementation of [`Fetch`].
#[derive(Default)]
pub struct MemoryFetcher {
    inner: RwLock<Inner>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `iri`, replacing any earlier response.
    pub fn insert(&self, iri: Iri, body: impl Into<Vec<u8>>) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.responses.insert(iri, Response::Body(body.into()));
    }

    /// Answer `iri` with a non-success `status`.
    pub fn insert_status(&self, iri: Iri, status: u16) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.responses.insert(iri, Response::Status(status));
    }

    /// Total requests served, successful or not.
    pub fn fetch_count(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .requests
            .len()
    }

    /// Requests in the order they arrived.
    pub fn requests(&self) -> Vec<Iri> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .requests
            .clone()
    }
}

impl Fetch for MemoryFetcher {
    fn fetch(&self, iri: &Iri, cancel: &Cancellation) -> Result<Vec<u8>, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled { iri: iri.clone() });
        }
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.requests.push(iri.clone());
        match inner.responses.get(iri) {
            Some(Response::Body(body)) if body.is_empty() => {
                Err(FetchError::EmptyBody { iri: iri.clone() })
            }
            Some(Response::Body(body)) => Ok(body.clone()),
            Some(Response::Status(status)) => Err(FetchError::Status {
                iri: iri.clone(),
                status: *status,
            }),
            None => Err(FetchError::Status {
                iri: iri.clone(),
                status: 404,
            }),
        }
    }
}
