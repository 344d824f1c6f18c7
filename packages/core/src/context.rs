//! The JSON-LD `@context` of a document, carried structurally.
//!
//! Contexts are preserved through parse and serialize exactly as written
//! (a single entry, a list, or absent). The only interpretation performed
//! is term lookup: [`Context::expand_term`] maps a compact term such as
//! `"IdentityProof"` or `"toot:Emoji"` to a full IRI so that extension types
//! can be recognised. No JSON-LD expansion or compaction is done.

use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use crate::vocab::{AS_CONTEXT, AS_NAMESPACE};

/// Nested term definitions deeper than this are treated as undefined.
const MAX_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ContextError {
    #[error("@context entry at index {0} must be an IRI string or a term map")]
    InvalidEntry(usize),
}

/// One element of a `@context` list.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextEntry {
    /// Reference to a shared context document.
    Iri(String),
    /// Inline term definitions, e.g. `{"toot": "http://joinmastodon.org/ns#"}`.
    Terms(Map<String, JsonValue>),
}

/// An ordered list of context entries. Later entries take precedence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    entries: Vec<ContextEntry>,
    /// Whether the wire form was a list, so a one-element list survives a
    /// round trip as a list.
    listed: bool,
}

impl Context {
    /// An empty context (serializes as no `@context` at all).
    pub fn new() -> Self {
        Self::default()
    }

    /// `"@context": "https://www.w3.org/ns/activitystreams"`.
    pub fn activity_streams() -> Self {
        Self {
            entries: vec![ContextEntry::Iri(AS_CONTEXT.to_string())],
            listed: false,
        }
    }

    /// Parse the value of a `@context` field. `null` is an empty context.
    pub fn from_json(value: &JsonValue) -> Result<Self, ContextError> {
        let (items, listed) = match value {
            JsonValue::Null => return Ok(Self::new()),
            JsonValue::Array(items) => (items.as_slice(), true),
            single => (std::slice::from_ref(single), false),
        };
        let entries = items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                JsonValue::String(iri) => Ok(ContextEntry::Iri(iri.clone())),
                JsonValue::Object(terms) => Ok(ContextEntry::Terms(terms.clone())),
                _ => Err(ContextError::InvalidEntry(i)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries, listed })
    }

    /// The wire form. `None` for an empty context.
    pub fn to_json(&self) -> Option<JsonValue> {
        let entry_json = |e: &ContextEntry| match e {
            ContextEntry::Iri(iri) => JsonValue::String(iri.clone()),
            ContextEntry::Terms(terms) => JsonValue::Object(terms.clone()),
        };
        match self.entries.as_slice() {
            [] => None,
            [single] if !self.listed => Some(entry_json(single)),
            many => Some(JsonValue::Array(many.iter().map(entry_json).collect())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ContextEntry] {
        &self.entries
    }

    /// Append an entry. A context with more than one entry is always written
    /// as a list.
    pub fn push(&mut self, entry: ContextEntry) {
        self.entries.push(entry);
        if self.entries.len() > 1 {
            self.listed = true;
        }
    }

    /// Define `term` as `iri` in a trailing inline term map, creating one if
    /// the last entry is a reference.
    pub fn define_term(&mut self, term: impl Into<String>, iri: impl Into<String>) {
        let value = JsonValue::String(iri.into());
        if let Some(ContextEntry::Terms(terms)) = self.entries.last_mut() {
            terms.insert(term.into(), value);
            return;
        }
        let mut terms = Map::new();
        terms.insert(term.into(), value);
        self.push(ContextEntry::Terms(terms));
    }

    /// The effective context for a nested object: this context followed by
    /// the nested object's own entries.
    pub fn merged(&self, inner: &Context) -> Context {
        if inner.is_empty() {
            return self.clone();
        }
        let mut merged = self.clone();
        for entry in &inner.entries {
            merged.push(entry.clone());
        }
        merged
    }

    /// Expand a term or compact IRI to a full IRI.
    ///
    /// Returns `None` when the term is neither defined by an inline term map
    /// nor shaped like a (compact) IRI.
    pub fn expand_term(&self, term: &str) -> Option<String> {
        self.expand(term, 0)
    }

    fn expand(&self, term: &str, depth: usize) -> Option<String> {
        if depth > MAX_EXPANSION_DEPTH {
            return None;
        }
        match self.definition(term) {
            Some(Definition::Iri(target)) if target != term => self.expand_iri(target, depth + 1),
            Some(Definition::Iri(_)) | None => self.expand_iri(term, depth + 1),
            Some(Definition::Unset) => None,
        }
    }

    fn expand_iri(&self, value: &str, depth: usize) -> Option<String> {
        if depth > MAX_EXPANSION_DEPTH {
            return None;
        }
        let (prefix, suffix) = value.split_once(':')?;
        if suffix.starts_with("//") || prefix == "_" {
            // Absolute IRI, or a blank node that never names a type.
            return (prefix != "_").then(|| value.to_string());
        }
        match self.definition(prefix) {
            Some(Definition::Iri(base)) => {
                if !base.contains(':') {
                    return None;
                }
                let base = self.expand_iri(base, depth + 1)?;
                Some(format!("{base}{suffix}"))
            }
            Some(Definition::Unset) => None,
            None if prefix == "as" => Some(format!("{AS_NAMESPACE}{suffix}")),
            // An undefined prefix means the value is already an absolute IRI
            // such as `urn:x:y`.
            None => Some(value.to_string()),
        }
    }

    fn definition(&self, term: &str) -> Option<Definition<'_>> {
        self.entries.iter().rev().find_map(|entry| {
            let ContextEntry::Terms(terms) = entry else {
                return None;
            };
            match terms.get(term)? {
                JsonValue::String(iri) => Some(Definition::Iri(iri)),
                JsonValue::Object(def) => match def.get("@id") {
                    Some(JsonValue::String(iri)) => Some(Definition::Iri(iri)),
                    _ => Some(Definition::Unset),
                },
                JsonValue::Null => Some(Definition::Unset),
                _ => None,
            }
        })
    }
}

enum Definition<'a> {
    Iri(&'a str),
    /// Explicitly undefined (`"term": null`) or without a usable `@id`.
    Unset,
}
