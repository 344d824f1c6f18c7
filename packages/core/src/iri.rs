//! Absolute IRIs: the identifiers of ActivityStreams objects.
//!
//! An [`Iri`] is always absolute: parsing a relative reference such as
//! `"/users/alice"` fails. This is what lets an Object's `id` and every
//! unresolved reference be dereferenced without a base.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use url::Url;

/// Errors returned when a string is not a usable absolute IRI.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum IriError {
    #[error("IRI must not be empty")]
    Empty,

    #[error("IRI must be absolute, got: {0:?}")]
    Relative(String),

    #[error("malformed IRI {0:?}: {1}")]
    Malformed(String, String),
}

/// An absolute IRI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Iri(Url);

impl Iri {
    /// Parse an absolute IRI.
    pub fn parse(s: &str) -> Result<Self, IriError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(IriError::Empty);
        }
        match Url::parse(trimmed) {
            Ok(url) => Ok(Self(url)),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Err(IriError::Relative(s.to_string()))
            }
            Err(e) => Err(IriError::Malformed(s.to_string(), e.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The underlying [`Url`], for callers that hand it to an HTTP client.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Whether the IRI can be dereferenced over HTTP(S).
    pub fn is_http(&self) -> bool {
        matches!(self.0.scheme(), "http" | "https")
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl FromStr for Iri {
    type Err = IriError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Iri::parse(s)
    }
}

impl From<Url> for Iri {
    fn from(url: Url) -> Self {
        Self(url)
    }
}

impl Serialize for Iri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Iri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Iri::parse(&s).map_err(serde::de::Error::custom)
    }
}
