//! Walking paginated collections.
//!
//! A [`CollectionWalker`] turns a starting reference (an IRI or an inline
//! collection) into the ordered items of every page, dereferencing pages
//! through its [`Fetch`] implementation as it goes:
//!
//! ```text
//! Start ──▶ HaveCollection ──first──▶ HavePage ──next──▶ HavePage … ──▶ Done
//!                │                                                  │
//!                └── no `first`: inline items, then Done            └──▶ Failed
//! ```
//!
//! - A start IRI may name a collection or a page; a page is walked directly.
//! - Every page IRI is recorded in a walk-local visited set, both the IRI
//!   requested and the `id` the page declares. A `next` pointing at a
//!   visited page ends the walk with [`WalkError::Cycle`].
//! - A `next` that is neither an IRI nor an inline object ends the walk with
//!   [`WalkError::MalformedReference`] rather than being read as "no more".
//! - A failure keeps what was collected: [`WalkFailure`] carries the items
//!   and page count gathered before the error.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};
use weftstreams::{
    codec, AsType, Iri, Literal, Object, ResolveError, Resolver, Value, VocabType, Vocabulary,
};

use crate::cancel::Cancellation;
use crate::config::WalkConfig;
use crate::fetch::{Fetch, FetchError};

const COLLECTION_TYPES: [AsType; 2] = [AsType::Collection, AsType::OrderedCollection];
const PAGE_TYPES: [AsType; 2] = [AsType::CollectionPage, AsType::OrderedCollectionPage];
const START_TYPES: [AsType; 4] = [
    AsType::Collection,
    AsType::OrderedCollection,
    AsType::CollectionPage,
    AsType::OrderedCollectionPage,
];

// ---------------------------------------------------------------------------
// Errors and results
// ---------------------------------------------------------------------------

/// Why a walk stopped early.
#[derive(Debug, thiserror::Error)]
pub enum WalkError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The fetched bytes did not decode or resolve to a known type.
    #[error("could not resolve {iri}: {source}")]
    Resolve {
        iri: Iri,
        #[source]
        source: ResolveError,
    },

    /// A reference resolved to something that is not a collection or page.
    #[error("{reference} is a {found}, expected {expected}")]
    UnexpectedType {
        reference: String,
        found: VocabType,
        expected: &'static str,
    },

    /// A page's `next` points back at a page already visited in this walk.
    #[error("cycle detected: {iri} was already visited")]
    Cycle { iri: Iri },

    /// A reference property holds a value that is neither an IRI nor an object.
    #[error("{property} of {on} is not an IRI or an object: {value}")]
    MalformedReference {
        property: &'static str,
        on: String,
        value: String,
    },

    /// A required reference property is absent.
    #[error("{on} has no {property}")]
    MissingReference { property: &'static str, on: String },

    #[error("walk exceeded the limit of {limit} pages")]
    PageLimit { limit: usize },

    #[error("walk cancelled")]
    Cancelled,
}

impl WalkError {
    pub fn is_cycle(&self) -> bool {
        matches!(self, WalkError::Cycle { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        match self {
            WalkError::Cancelled => true,
            WalkError::Fetch(e) => e.is_cancelled(),
            _ => false,
        }
    }
}

/// A completed walk.
#[derive(Debug, Clone, Default)]
pub struct Walk {
    /// Items in page order, then in the order each page lists them.
    pub items: Vec<Value>,
    /// Pages visited.
    pub pages: usize,
}

/// A walk that ended in [`WalkError`], with everything gathered before it.
#[derive(Debug, thiserror::Error)]
#[error("walk failed after {pages} page(s) and {} item(s): {error}", .items.len())]
pub struct WalkFailure {
    pub items: Vec<Value>,
    pub pages: usize,
    #[source]
    pub error: WalkError,
}

/// Where a walk begins.
#[derive(Debug, Clone)]
pub enum Start {
    /// Dereference this IRI first.
    Iri(Iri),
    /// An already-decoded collection or page.
    Object(Object),
}

impl From<Iri> for Start {
    fn from(iri: Iri) -> Self {
        Start::Iri(iri)
    }
}

impl From<Object> for Start {
    fn from(object: Object) -> Self {
        Start::Object(object)
    }
}

// ---------------------------------------------------------------------------
// CollectionWalker
// ---------------------------------------------------------------------------

/// Transient state of one walk. Never shared between walks.
#[derive(Default)]
struct Cursor {
    items: Vec<Value>,
    pages: usize,
    visited: HashSet<Iri>,
}

pub struct CollectionWalker<F> {
    fetcher: F,
    config: WalkConfig,
    vocab: Arc<Vocabulary>,
}

impl<F: Fetch> CollectionWalker<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_config(fetcher, WalkConfig::default())
    }

    pub fn with_config(fetcher: F, config: WalkConfig) -> Self {
        Self {
            fetcher,
            config,
            vocab: Vocabulary::standard(),
        }
    }

    /// Resolve fetched documents against `vocab` instead of the standard
    /// vocabulary.
    pub fn with_vocabulary(mut self, vocab: Arc<Vocabulary>) -> Self {
        self.vocab = vocab;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Walk every page reachable from `start`.
    pub fn walk(&self, start: impl Into<Start>, cancel: &Cancellation) -> Result<Walk, WalkFailure> {
        let start = start.into();
        let label = match &start {
            Start::Iri(iri) => iri.to_string(),
            Start::Object(obj) => describe(obj),
        };
        let mut cursor = Cursor::default();
        match self.run(start, cancel, &mut cursor) {
            Ok(()) => {
                info!(
                    "walk: {label} done, {} items over {} pages",
                    cursor.items.len(),
                    cursor.pages
                );
                Ok(Walk {
                    items: cursor.items,
                    pages: cursor.pages,
                })
            }
            Err(error) => {
                warn!("walk: {label} stopped after {} pages: {error}", cursor.pages);
                Err(WalkFailure {
                    items: cursor.items,
                    pages: cursor.pages,
                    error,
                })
            }
        }
    }

    /// Walk the `outbox` of an already-decoded actor.
    pub fn walk_outbox(&self, actor: &Object, cancel: &Cancellation) -> Result<Walk, WalkFailure> {
        let start = match actor.first_value("outbox") {
            Some(Value::Iri(iri)) => Start::Iri(iri.clone()),
            Some(Value::Object(obj)) => Start::Object(obj.as_ref().clone()),
            Some(other) => {
                return Err(failed(WalkError::MalformedReference {
                    property: "outbox",
                    on: describe(actor),
                    value: describe_value(other),
                }))
            }
            None => {
                return Err(failed(WalkError::MissingReference {
                    property: "outbox",
                    on: describe(actor),
                }))
            }
        };
        self.walk(start, cancel)
    }

    /// Fetch the actor at `actor`, then walk its outbox.
    pub fn walk_actor(&self, actor: &Iri, cancel: &Cancellation) -> Result<Walk, WalkFailure> {
        let object = self.fetch_object(actor, cancel).map_err(failed)?;
        if !object.as_type().is_some_and(AsType::is_actor) {
            return Err(failed(WalkError::UnexpectedType {
                reference: actor.to_string(),
                found: object.vocab_type().clone(),
                expected: "an actor",
            }));
        }
        debug!("walk: actor {actor} resolved as {}", object.vocab_type());
        self.walk_outbox(&object, cancel)
    }

    fn run(&self, start: Start, cancel: &Cancellation, cursor: &mut Cursor) -> Result<(), WalkError> {
        let top = match start {
            Start::Object(obj) => {
                expect_type(&obj, &START_TYPES, || describe(&obj))?;
                obj
            }
            Start::Iri(iri) => {
                let obj = self.dereference(&iri, &START_TYPES, cancel)?;
                if is_page(&obj) {
                    cursor.visited.insert(iri);
                }
                obj
            }
        };

        let mut page = if is_page(&top) {
            top
        } else {
            let mut collection = top;
            let first = collection.remove("first").and_then(|p| p.into_values().into_iter().next());
            match first {
                Some(reference) => {
                    let on = describe(&collection);
                    match self.follow(reference, "first", &on, cancel, cursor)? {
                        Some(page) => page,
                        None => return Ok(()),
                    }
                }
                None => {
                    let inline = take_items(&mut collection);
                    debug!("walk: {} has no first page, {} inline items", describe(&collection), inline.len());
                    cursor.items.extend(inline);
                    return Ok(());
                }
            }
        };

        loop {
            self.check_page_limit(cursor)?;
            if let Some(id) = page.id() {
                cursor.visited.insert(id.clone());
            }
            cursor.pages += 1;
            let items = take_items(&mut page);
            debug!("walk: page {} has {} items", describe(&page), items.len());
            cursor.items.extend(items);

            let Some(next) = page.remove("next").and_then(|p| p.into_values().into_iter().next()) else {
                return Ok(());
            };
            let on = describe(&page);
            page = match self.follow(next, "next", &on, cancel, cursor)? {
                Some(page) => page,
                None => return Ok(()),
            };
        }
    }

    fn check_page_limit(&self, cursor: &Cursor) -> Result<(), WalkError> {
        match self.config.max_pages {
            Some(limit) if cursor.pages >= limit => Err(WalkError::PageLimit { limit }),
            _ => Ok(()),
        }
    }

    /// Turn a `first`/`next` value into the page it names. `Ok(None)` means
    /// the reference was an explicit JSON `null`, i.e. no page.
    fn follow(
        &self,
        reference: Value,
        property: &'static str,
        on: &str,
        cancel: &Cancellation,
        cursor: &mut Cursor,
    ) -> Result<Option<Object>, WalkError> {
        if cancel.is_cancelled() {
            return Err(WalkError::Cancelled);
        }
        self.check_page_limit(cursor)?;

        match reference {
            Value::Iri(iri) => {
                if cursor.visited.contains(&iri) {
                    return Err(WalkError::Cycle { iri });
                }
                let page = self.dereference(&iri, &PAGE_TYPES, cancel)?;
                if let Some(id) = page.id().filter(|id| **id != iri) {
                    if cursor.visited.contains(id) {
                        return Err(WalkError::Cycle { iri: id.clone() });
                    }
                }
                cursor.visited.insert(iri);
                Ok(Some(page))
            }
            Value::Object(page) => {
                if let Some(id) = page.id() {
                    if cursor.visited.contains(id) {
                        return Err(WalkError::Cycle { iri: id.clone() });
                    }
                }
                expect_type(&page, &PAGE_TYPES, || describe(&page))?;
                Ok(Some(*page))
            }
            Value::Literal(Literal::Json(serde_json::Value::Null)) => Ok(None),
            other => Err(WalkError::MalformedReference {
                property,
                on: on.to_string(),
                value: describe_value(&other),
            }),
        }
    }

    /// Fetch `iri` and resolve it as one of `accepted`.
    fn dereference(
        &self,
        iri: &Iri,
        accepted: &[AsType],
        cancel: &Cancellation,
    ) -> Result<Object, WalkError> {
        let object = self.fetch_object(iri, cancel)?;
        expect_type(&object, accepted, || iri.to_string())?;
        Ok(object)
    }

    /// Fetch `iri` and resolve it in generic mode.
    fn fetch_object(&self, iri: &Iri, cancel: &Cancellation) -> Result<Object, WalkError> {
        let bytes = self.fetcher.fetch(iri, cancel)?;
        let resolver = Resolver::with_vocabulary(Arc::clone(&self.vocab));
        codec::decode(&bytes)
            .map_err(ResolveError::from)
            .and_then(|doc| resolver.to_object(doc))
            .map_err(|source| WalkError::Resolve {
                iri: iri.clone(),
                source,
            })
    }
}

fn failed(error: WalkError) -> WalkFailure {
    WalkFailure {
        items: Vec::new(),
        pages: 0,
        error,
    }
}

fn is_page(obj: &Object) -> bool {
    PAGE_TYPES.iter().any(|&t| obj.vocab_type() == &VocabType::As(t))
}

fn expect_type(
    obj: &Object,
    accepted: &[AsType],
    reference: impl FnOnce() -> String,
) -> Result<(), WalkError> {
    if accepted.iter().any(|&t| obj.vocab_type() == &VocabType::As(t)) {
        return Ok(());
    }
    Err(WalkError::UnexpectedType {
        reference: reference(),
        found: obj.vocab_type().clone(),
        expected: expected_label(accepted),
    })
}

fn expected_label(accepted: &[AsType]) -> &'static str {
    if accepted.iter().any(|t| COLLECTION_TYPES.contains(t)) {
        "a collection or collection page"
    } else {
        "a collection page"
    }
}

/// `orderedItems`, or `items` when a page has no ordered list.
fn take_items(obj: &mut Object) -> Vec<Value> {
    obj.remove("orderedItems")
        .or_else(|| obj.remove("items"))
        .map(|p| p.into_values())
        .unwrap_or_default()
}

fn describe(obj: &Object) -> String {
    match obj.id() {
        Some(id) => id.to_string(),
        None => format!("inline {}", obj.vocab_type()),
    }
}

fn describe_value(value: &Value) -> String {
    match value {
        Value::Iri(iri) => iri.to_string(),
        Value::Object(obj) => describe(obj),
        Value::Literal(Literal::Text(s)) => format!("{s:?}"),
        Value::Literal(Literal::Number(n)) => n.to_string(),
        Value::Literal(Literal::Boolean(b)) => b.to_string(),
        Value::Literal(Literal::DateTime(dt)) => Literal::format_datetime(dt),
        Value::Literal(Literal::Json(json)) => json.to_string(),
    }
}
