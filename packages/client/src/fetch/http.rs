//! Blocking HTTP fetcher.
//!
//! One [`HttpFetcher`] is built up front and shared by every fetch, so the
//! underlying [`reqwest::blocking::Client`] pools connections across the
//! pages of a walk.
//!
//! Each fetch is one `GET` with [`ACCEPT_ACTIVITY`]. Transient failures
//! (see [`FetchError::is_transient`]) are retried up to
//! [`FetchConfig::max_retries`] times with [`Backoff`]; everything else is
//! returned on the first attempt. The per-request timeout is clamped to the
//! time left on the caller's [`Cancellation`] deadline, and cancelling the
//! token abandons a request that is still in flight.

use std::io::{self, Read};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use tracing::{debug, warn};
use weftstreams::Iri;

use super::{Fetch, FetchError, ACCEPT_ACTIVITY};
use crate::backoff::Backoff;
use crate::cancel::Cancellation;
use crate::config::FetchConfig;

/// How often a waiting fetch checks its [`Cancellation`].
const CANCEL_POLL: Duration = Duration::from_millis(25);

pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Build a client from `config`.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client, config })
    }

    /// Use a pre-configured client; `config` still governs retries, limits,
    /// and the per-request timeout.
    pub fn with_client(client: Client, config: FetchConfig) -> Self {
        Self { client, config }
    }

    /// Shorthand for `HttpFetcher::new(FetchConfig::from_env())`.
    pub fn from_env() -> Result<Self, FetchError> {
        Self::new(FetchConfig::from_env())
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// One attempt. The request runs on a worker thread so that a cancelled
    /// token returns immediately; an abandoned worker ends at its own timeout.
    fn fetch_once(&self, iri: &Iri, cancel: &Cancellation) -> Result<Vec<u8>, FetchError> {
        let mut timeout = self.config.timeout;
        if let Some(left) = cancel.remaining() {
            if left.is_zero() {
                return Err(FetchError::Cancelled { iri: iri.clone() });
            }
            timeout = timeout.min(left);
        }

        let (tx, rx) = mpsc::channel();
        let client = self.client.clone();
        let limit = self.config.max_body_bytes;
        let (worker_iri, worker_cancel) = (iri.clone(), cancel.clone());
        thread::spawn(move || {
            let outcome = attempt(&client, &worker_iri, timeout, limit, &worker_cancel);
            let _ = tx.send(outcome);
        });

        loop {
            match rx.recv_timeout(CANCEL_POLL) {
                Ok(_) if cancel.is_cancelled() => {
                    return Err(FetchError::Cancelled { iri: iri.clone() })
                }
                Ok(outcome) => return outcome,
                Err(RecvTimeoutError::Timeout) if cancel.is_cancelled() => {
                    debug!("fetch: {iri} cancelled in flight");
                    return Err(FetchError::Cancelled { iri: iri.clone() });
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(FetchError::Read {
                        iri: iri.clone(),
                        source: io::Error::other("fetch worker exited without a result"),
                    })
                }
            }
        }
    }
}

fn attempt(
    client: &Client,
    iri: &Iri,
    timeout: Duration,
    limit: u64,
    cancel: &Cancellation,
) -> Result<Vec<u8>, FetchError> {
    let response = client
        .get(iri.as_url().clone())
        .header(ACCEPT, ACCEPT_ACTIVITY)
        .timeout(timeout)
        .send()
        .map_err(|e| classify(iri, cancel, e))?;
    if cancel.is_cancelled() {
        return Err(FetchError::Cancelled { iri: iri.clone() });
    }

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            iri: iri.clone(),
            status: status.as_u16(),
        });
    }

    if response.content_length().is_some_and(|len| len > limit) {
        return Err(FetchError::BodyTooLarge {
            iri: iri.clone(),
            limit,
        });
    }

    // Read one byte past the limit so an oversized chunked body is
    // detected without buffering all of it.
    let mut body = Vec::new();
    response
        .take(limit.saturating_add(1))
        .read_to_end(&mut body)
        .map_err(|e| {
            if cancel.is_cancelled() {
                FetchError::Cancelled { iri: iri.clone() }
            } else if e.kind() == io::ErrorKind::TimedOut {
                FetchError::Timeout { iri: iri.clone() }
            } else {
                FetchError::Read {
                    iri: iri.clone(),
                    source: e,
                }
            }
        })?;
    if cancel.is_cancelled() {
        return Err(FetchError::Cancelled { iri: iri.clone() });
    }

    if body.len() as u64 > limit {
        return Err(FetchError::BodyTooLarge {
            iri: iri.clone(),
            limit,
        });
    }
    if body.is_empty() {
        return Err(FetchError::EmptyBody { iri: iri.clone() });
    }
    Ok(body)
}

impl Fetch for HttpFetcher {
    fn fetch(&self, iri: &Iri, cancel: &Cancellation) -> Result<Vec<u8>, FetchError> {
        if !iri.is_http() {
            return Err(FetchError::UnsupportedScheme { iri: iri.clone() });
        }

        let mut backoff = Backoff::new(self.config.backoff_base, self.config.backoff_max);
        loop {
            if cancel.is_cancelled() {
                return Err(FetchError::Cancelled { iri: iri.clone() });
            }
            match self.fetch_once(iri, cancel) {
                Ok(body) => {
                    debug!("fetch: {iri} ({} bytes)", body.len());
                    return Ok(body);
                }
                Err(e) if e.is_transient() && backoff.attempts() < self.config.max_retries => {
                    let delay = backoff.next_delay();
                    warn!(
                        "fetch: {e}; retry {}/{} in {delay:?}",
                        backoff.attempts(),
                        self.config.max_retries
                    );
                    if !cancel.sleep(delay) {
                        return Err(FetchError::Cancelled { iri: iri.clone() });
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn classify(iri: &Iri, cancel: &Cancellation, e: reqwest::Error) -> FetchError {
    let iri = iri.clone();
    if e.is_timeout() {
        if cancel.is_cancelled() {
            FetchError::Cancelled { iri }
        } else {
            FetchError::Timeout { iri }
        }
    } else {
        FetchError::Network { iri, source: e }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_http_schemes_are_rejected_without_a_request() {
        let fetcher = HttpFetcher::new(FetchConfig::default()).unwrap();
        let iri = Iri::parse("urn:uuid:0b7ef2c5-7a1b-4b7e-9d1a-0e6a4f0f4a11").unwrap();
        let err = fetcher.fetch(&iri, &Cancellation::new()).unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedScheme { .. }));
    }

    #[test]
    fn cancelled_token_short_circuits() {
        let fetcher = HttpFetcher::new(FetchConfig::default()).unwrap();
        let cancel = Cancellation::new();
        cancel.cancel();
        let iri = Iri::parse("https://mastodon.social/users/Gargron").unwrap();
        assert!(fetcher.fetch(&iri, &cancel).unwrap_err().is_cancelled());
    }
}
