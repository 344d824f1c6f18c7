//! Type resolution: [`Document`] → typed [`Object`] → handler.
//!
//! A [`Resolver`] holds handlers keyed by [`VocabType`]. Resolving a
//! document reads its `type` terms in order, takes the first one the
//! [`Vocabulary`] recognises (honouring the document's `@context`), decodes
//! the remaining fields against that type's property table, and calls the
//! handler registered for the type.
//!
//! Two failures are deliberately distinct:
//!
//! - [`ResolveError::UnrecognizedType`]: no term names a known type. The
//!   content is not something this library understands.
//! - [`ResolveError::NoMatchingHandler`]: the type is known, the caller just
//!   did not ask for it. Check [`ResolveError::is_no_match`] to skip such
//!   documents quietly.
//!
//! Use [`to_object`] (or [`Resolver::to_object`]) when the type is not known
//! ahead of time and no dispatch is wanted.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::DateTime;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::codec::{self, json_kind, CodecError, Document};
use crate::context::{Context, ContextError};
use crate::iri::Iri;
use crate::object::Object;
use crate::property::{FunctionalProperty, NonFunctionalProperty, Property};
use crate::value::{Literal, Value};
use crate::vocab::{PropertyDef, Range, VocabType, Vocabulary};

/// The error type handlers return.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

type Handler<'h> = Box<dyn FnMut(Object) -> Result<(), HandlerError> + 'h>;

/// Errors returned while resolving a document.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("could not decode document: {0}")]
    Decode(#[from] CodecError),

    #[error("malformed @context: {0}")]
    Context(#[from] ContextError),

    #[error("no known vocabulary type among {terms:?}")]
    UnrecognizedType { terms: Vec<String> },

    #[error("no handler registered for type {vocab_type}")]
    NoMatchingHandler { vocab_type: VocabType },

    #[error("{property} must be an absolute IRI, got {value}")]
    MalformedIdentifier { property: String, value: String },

    #[error("handler for {vocab_type} failed: {source}")]
    Handler {
        vocab_type: VocabType,
        #[source]
        source: HandlerError,
    },
}

impl ResolveError {
    /// True for a known type nobody registered a handler for.
    pub fn is_no_match(&self) -> bool {
        matches!(self, ResolveError::NoMatchingHandler { .. })
    }

    pub fn is_unrecognized(&self) -> bool {
        matches!(self, ResolveError::UnrecognizedType { .. })
    }
}

/// Dispatches resolved objects to per-type handlers.
///
/// Handlers may borrow from the caller's scope (`'h`), so a handler can
/// stash the object it receives in a local variable.
pub struct Resolver<'h> {
    vocab: Arc<Vocabulary>,
    handlers: HashMap<VocabType, Handler<'h>>,
}

impl<'h> Resolver<'h> {
    /// A resolver over the standard vocabulary with no handlers.
    pub fn new() -> Self {
        Self::with_vocabulary(Vocabulary::standard())
    }

    pub fn with_vocabulary(vocab: Arc<Vocabulary>) -> Self {
        Self {
            vocab,
            handlers: HashMap::new(),
        }
    }

    /// Builder form of [`Resolver::register`].
    pub fn on<F>(mut self, vocab_type: impl Into<VocabType>, handler: F) -> Self
    where
        F: FnMut(Object) -> Result<(), HandlerError> + 'h,
    {
        self.register(vocab_type, handler);
        self
    }

    /// Register `handler` for exactly `vocab_type` (not its subtypes). A
    /// second registration for the same type replaces the first.
    pub fn register<F>(&mut self, vocab_type: impl Into<VocabType>, handler: F)
    where
        F: FnMut(Object) -> Result<(), HandlerError> + 'h,
    {
        self.handlers.insert(vocab_type.into(), Box::new(handler));
    }

    pub fn handles(&self, vocab_type: &VocabType) -> bool {
        self.handlers.contains_key(vocab_type)
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Decode `bytes` and resolve the resulting document.
    pub fn resolve_bytes(&mut self, bytes: &[u8]) -> Result<(), ResolveError> {
        let doc = codec::decode(bytes)?;
        self.resolve(doc)
    }

    /// Resolve a decoded document and invoke the matching handler.
    pub fn resolve(&mut self, doc: Document) -> Result<(), ResolveError> {
        let object = self.to_object(doc)?;
        self.resolve_object(object)
    }

    /// Dispatch an already-typed object to its handler.
    pub fn resolve_object(&mut self, object: Object) -> Result<(), ResolveError> {
        let vocab_type = object.vocab_type().clone();
        if !vocab_type.is_known() {
            return Err(ResolveError::UnrecognizedType {
                terms: object.type_terms().to_vec(),
            });
        }
        let Some(handler) = self.handlers.get_mut(&vocab_type) else {
            return Err(ResolveError::NoMatchingHandler { vocab_type });
        };
        handler(object).map_err(|source| ResolveError::Handler { vocab_type, source })
    }

    /// Generic mode: decode without requiring or invoking any handler.
    pub fn to_object(&self, doc: Document) -> Result<Object, ResolveError> {
        decode_object(&self.vocab, doc, &Context::new(), true)
    }
}

impl Default for Resolver<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a document into an [`Object`] over the standard vocabulary.
pub fn to_object(doc: Document) -> Result<Object, ResolveError> {
    decode_object(&Vocabulary::standard(), doc, &Context::new(), true)
}

/// Decode bytes into an [`Object`] over the standard vocabulary.
pub fn from_bytes(bytes: &[u8]) -> Result<Object, ResolveError> {
    to_object(codec::decode(bytes)?)
}

fn decode_object(
    vocab: &Arc<Vocabulary>,
    mut doc: Document,
    parent: &Context,
    top_level: bool,
) -> Result<Object, ResolveError> {
    let own_context = match doc.remove("@context") {
        Some(value) => Context::from_json(&value)?,
        None => Context::new(),
    };
    let context = parent.merged(&own_context);

    let terms = type_terms(take_either(&mut doc, "type", "@type"));
    let vocab_type = match terms.iter().find_map(|t| vocab.resolve_term(t, &context)) {
        Some(t) => t,
        None if top_level => return Err(ResolveError::UnrecognizedType { terms }),
        None => VocabType::Unknown(terms.first().cloned().unwrap_or_default()),
    };

    let id = match take_either(&mut doc, "id", "@id") {
        None => None,
        Some(JsonValue::String(s)) => Some(Iri::parse(&s).map_err(|_| {
            ResolveError::MalformedIdentifier {
                property: "id".into(),
                value: format!("{s:?}"),
            }
        })?),
        Some(other) => {
            return Err(ResolveError::MalformedIdentifier {
                property: "id".into(),
                value: json_kind(&other).into(),
            })
        }
    };

    let mut object = Object::decoded(vocab_type, terms, Arc::clone(vocab));
    object.set_decoded_id(id);
    object.set_decoded_context(own_context);

    for (name, json) in doc {
        let def = vocab.property(object.vocab_type(), &name);
        let property = decode_property(vocab, json, def, &context)?;
        object.insert_decoded(name, property);
    }
    Ok(object)
}

fn take_either(doc: &mut Document, key: &str, alias: &str) -> Option<JsonValue> {
    doc.remove(key).or_else(|| doc.remove(alias))
}

/// String terms of a `type` value. Empty strings and non-strings are not
/// terms and are dropped.
fn type_terms(value: Option<JsonValue>) -> Vec<String> {
    let items = match value {
        Some(JsonValue::Array(items)) => items,
        Some(single) => vec![single],
        None => Vec::new(),
    };
    items
        .into_iter()
        .filter_map(|item| match item {
            JsonValue::String(term) if !term.is_empty() => Some(term),
            _ => None,
        })
        .collect()
}

/// Whether a nested map carries at least one usable type term, and so
/// decodes as an object rather than as opaque JSON.
fn is_typed(map: &Document) -> bool {
    ["type", "@type"].iter().any(|key| match map.get(*key) {
        Some(JsonValue::String(term)) => !term.is_empty(),
        Some(JsonValue::Array(items)) => items
            .iter()
            .any(|item| item.as_str().is_some_and(|term| !term.is_empty())),
        _ => false,
    })
}

fn decode_property(
    vocab: &Arc<Vocabulary>,
    json: JsonValue,
    def: Option<PropertyDef>,
    context: &Context,
) -> Result<Property, ResolveError> {
    let range = def.map(|d| d.range);
    let functional = def.map(|d| d.functional);
    let property = match (json, functional) {
        // A declared functional property written as a one-element list.
        (JsonValue::Array(mut items), Some(true)) if items.len() == 1 => {
            let item = items.remove(0);
            FunctionalProperty::new(decode_value(vocab, item, range, context)?).into()
        }
        // Lists are kept as lists even where the vocabulary says functional,
        // so nothing in the document is lost.
        (JsonValue::Array(items), _) => items
            .into_iter()
            .map(|item| decode_value(vocab, item, range, context))
            .collect::<Result<NonFunctionalProperty, _>>()?
            .into(),
        (json, Some(false)) => {
            let mut p = NonFunctionalProperty::new();
            p.append(decode_value(vocab, json, range, context)?);
            p.into()
        }
        (json, _) => FunctionalProperty::new(decode_value(vocab, json, range, context)?).into(),
    };
    Ok(property)
}

fn decode_value(
    vocab: &Arc<Vocabulary>,
    json: JsonValue,
    range: Option<Range>,
    context: &Context,
) -> Result<Value, ResolveError> {
    let value = match json {
        JsonValue::String(s) => decode_string(s, range),
        JsonValue::Bool(b) => Value::Literal(Literal::Boolean(b)),
        JsonValue::Number(n) => Value::Literal(Literal::Number(n)),
        JsonValue::Object(map) if is_typed(&map) => {
            Value::from(decode_object(vocab, map, context, false)?)
        }
        other => Value::Literal(Literal::Json(other)),
    };
    Ok(value)
}

fn decode_string(s: String, range: Option<Range>) -> Value {
    match range {
        Some(Range::Reference) => match Iri::parse(&s) {
            Ok(iri) => Value::Iri(iri),
            Err(_) => Value::text(s),
        },
        Some(Range::DateTime) => match DateTime::parse_from_rfc3339(&s) {
            Ok(dt) => Value::Literal(Literal::DateTime(dt)),
            Err(_) => Value::text(s),
        },
        _ => Value::text(s),
    }
}
