//! Dereferencing IRIs into raw document bytes.
//!
//! The [`Fetch`] trait is the only contract between the walker and the
//! network. A fetcher returns the full body or a [`FetchError`]; it never
//! looks inside the body. Decoding is the codec's job.
//!
//! # Implementations
//!
//! | Type | When to use |
//! |------|-------------|
//! | [`HttpFetcher`] | Real servers; blocking HTTP with bounded retries |
//! | [`MemoryFetcher`] | Tests and offline fixtures |
//!
//! [`HttpFetcher`]: http::HttpFetcher
//! [`MemoryFetcher`]: memory::MemoryFetcher

pub mod http;
pub mod memory;

use std::sync::Arc;

use weftstreams::Iri;

use crate::cancel::Cancellation;

/// Media types requested from servers, most preferred first.
pub const ACCEPT_ACTIVITY: &str =
    "application/activity+json, application/ld+json; profile=\"https://www.w3.org/ns/activitystreams\"";

// ---------------------------------------------------------------------------
// FetchError
// ---------------------------------------------------------------------------

/// Errors a fetch can return. Each carries the IRI that was requested.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request could not be sent or the connection failed.
    #[error("network error fetching {iri}: {source}")]
    Network {
        iri: Iri,
        #[source]
        source: reqwest::Error,
    },

    /// The connection dropped while the body was being read.
    #[error("failed reading body of {iri}: {source}")]
    Read {
        iri: Iri,
        #[source]
        source: std::io::Error,
    },

    /// No response within the configured timeout.
    #[error("timed out fetching {iri}")]
    Timeout { iri: Iri },

    /// The server answered with a non-2xx status.
    #[error("{iri} returned status {status}")]
    Status { iri: Iri, status: u16 },

    #[error("{iri} returned an empty body")]
    EmptyBody { iri: Iri },

    #[error("body of {iri} exceeds {limit} bytes")]
    BodyTooLarge { iri: Iri, limit: u64 },

    /// The IRI cannot be dereferenced by this fetcher (e.g. `urn:`).
    #[error("cannot dereference {iri}: unsupported scheme")]
    UnsupportedScheme { iri: Iri },

    /// The caller's [`Cancellation`] fired, or its deadline passed.
    #[error("fetch of {iri} cancelled")]
    Cancelled { iri: Iri },

    /// The HTTP client itself could not be constructed.
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    /// Whether retrying the same request might succeed: connection
    /// failures, timeouts, interrupted bodies, 5xx, and 429.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network { source, .. } => source.is_connect() || source.is_timeout(),
            FetchError::Read { .. } | FetchError::Timeout { .. } => true,
            FetchError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled { .. })
    }

    /// The IRI the failed request was for, if the error concerns one.
    pub fn iri(&self) -> Option<&Iri> {
        match self {
            FetchError::Network { iri, .. }
            | FetchError::Read { iri, .. }
            | FetchError::Timeout { iri }
            | FetchError::Status { iri, .. }
            | FetchError::EmptyBody { iri }
            | FetchError::BodyTooLarge { iri, .. }
            | FetchError::UnsupportedScheme { iri }
            | FetchError::Cancelled { iri } => Some(iri),
            FetchError::Client(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Fetch trait
// ---------------------------------------------------------------------------

/// Dereferences one absolute IRI into the full response body.
///
/// Implementations must check `cancel` before doing any work and return
/// [`FetchError::Cancelled`] once it fires.
pub trait Fetch {
    fn fetch(&self, iri: &Iri, cancel: &Cancellation) -> Result<Vec<u8>, FetchError>;
}

impl<T: Fetch + ?Sized> Fetch for &T {
    fn fetch(&self, iri: &Iri, cancel: &Cancellation) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(iri, cancel)
    }
}

impl<T: Fetch + ?Sized> Fetch for Arc<T> {
    fn fetch(&self, iri: &Iri, cancel: &Cancellation) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(iri, cancel)
    }
}

impl<T: Fetch + ?Sized> Fetch for Box<T> {
    fn fetch(&self, iri: &Iri, cancel: &Cancellation) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(iri, cancel)
    }
}
