//! The vocabulary registry: which type tags and property names are known.
//!
//! [`AsType`] is the closed catalogue of ActivityStreams 2.0 core and
//! extended types. Types outside that catalogue are either registered
//! extensions ([`ExtensionType`], recognised by their full IRI) or
//! [`VocabType::Unknown`], which can be represented and serialized but never
//! resolved to a handler.
//!
//! Property tables are attached per type and inherited along the `extends`
//! chain, so `Note` knows `content` because `Object` does.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::{Arc, LazyLock};

use crate::context::Context;

/// Namespace IRI of the ActivityStreams vocabulary.
pub const AS_NAMESPACE: &str = "https://www.w3.org/ns/activitystreams#";

/// The ActivityStreams context document IRI.
pub const AS_CONTEXT: &str = "https://www.w3.org/ns/activitystreams";

/// What a property's values are expected to be.
///
/// The range only guides decoding of JSON strings: a string on a
/// [`Range::Reference`] property that parses as an absolute IRI becomes an
/// unresolved reference, a string on a [`Range::DateTime`] property becomes a
/// timestamp. Everything else is decoded structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Range {
    /// Objects, links, or IRIs standing in for them.
    Reference,
    Text,
    DateTime,
    Number,
    Boolean,
    Any,
}

/// A property declared for a vocabulary type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDef {
    pub name: &'static str,
    /// Functional properties hold at most one value.
    pub functional: bool,
    pub range: Range,
}

const fn single(name: &'static str, range: Range) -> PropertyDef {
    PropertyDef {
        name,
        functional: true,
        range,
    }
}

const fn multi(name: &'static str, range: Range) -> PropertyDef {
    PropertyDef {
        name,
        functional: false,
        range,
    }
}

macro_rules! as_types {
    ($($variant:ident),+ $(,)?) => {
        /// The ActivityStreams 2.0 type catalogue.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum AsType {
            $($variant,)+
        }

        impl AsType {
            /// Every type in the catalogue.
            pub const ALL: &'static [AsType] = &[$(AsType::$variant,)+];

            /// The compact term name, e.g. `"OrderedCollectionPage"`.
            pub fn term(self) -> &'static str {
                match self {
                    $(AsType::$variant => stringify!($variant),)+
                }
            }
        }
    };
}

as_types! {
    // core
    Object, Link, Activity, IntransitiveActivity,
    Collection, OrderedCollection, CollectionPage, OrderedCollectionPage,
    // activities
    Accept, Add, Announce, Arrive, Block, Create, Delete, Dislike, Flag, Follow,
    Ignore, Invite, Join, Leave, Like, Listen, Move, Offer, Question, Reject, Read,
    Remove, TentativeReject, TentativeAccept, Travel, Undo, Update, View,
    // actors
    Application, Group, Organization, Person, Service,
    // objects and links
    Article, Audio, Document, Event, Image, Note, Page, Place, Profile,
    Relationship, Tombstone, Video, Mention,
}

const OBJECT_PROPERTIES: &[PropertyDef] = &[
    multi("attachment", Range::Reference),
    multi("attributedTo", Range::Reference),
    multi("audience", Range::Reference),
    multi("bcc", Range::Reference),
    multi("bto", Range::Reference),
    multi("cc", Range::Reference),
    multi("content", Range::Text),
    multi("context", Range::Reference),
    single("duration", Range::Text),
    single("endTime", Range::DateTime),
    multi("generator", Range::Reference),
    multi("icon", Range::Reference),
    multi("image", Range::Reference),
    multi("inReplyTo", Range::Reference),
    single("likes", Range::Reference),
    multi("location", Range::Reference),
    single("mediaType", Range::Text),
    multi("name", Range::Text),
    multi("preview", Range::Reference),
    single("published", Range::DateTime),
    single("replies", Range::Reference),
    single("sensitive", Range::Boolean),
    single("shares", Range::Reference),
    single("source", Range::Any),
    single("startTime", Range::DateTime),
    multi("summary", Range::Text),
    multi("tag", Range::Reference),
    multi("to", Range::Reference),
    single("updated", Range::DateTime),
    multi("url", Range::Reference),
];

const LINK_PROPERTIES: &[PropertyDef] = &[
    multi("attributedTo", Range::Reference),
    single("height", Range::Number),
    single("href", Range::Reference),
    single("hreflang", Range::Text),
    single("mediaType", Range::Text),
    multi("name", Range::Text),
    multi("preview", Range::Reference),
    multi("rel", Range::Text),
    single("width", Range::Number),
];

const ACTIVITY_PROPERTIES: &[PropertyDef] = &[
    multi("actor", Range::Reference),
    multi("instrument", Range::Reference),
    multi("object", Range::Reference),
    multi("origin", Range::Reference),
    multi("result", Range::Reference),
    multi("target", Range::Reference),
];

const ACTOR_PROPERTIES: &[PropertyDef] = &[
    single("endpoints", Range::Any),
    single("followers", Range::Reference),
    single("following", Range::Reference),
    single("inbox", Range::Reference),
    single("liked", Range::Reference),
    single("outbox", Range::Reference),
    single("preferredUsername", Range::Text),
    multi("streams", Range::Reference),
];

const COLLECTION_PROPERTIES: &[PropertyDef] = &[
    single("current", Range::Reference),
    single("first", Range::Reference),
    multi("items", Range::Reference),
    single("last", Range::Reference),
    single("totalItems", Range::Number),
];

const ORDERED_COLLECTION_PROPERTIES: &[PropertyDef] = &[multi("orderedItems", Range::Reference)];

const COLLECTION_PAGE_PROPERTIES: &[PropertyDef] = &[
    single("next", Range::Reference),
    single("partOf", Range::Reference),
    single("prev", Range::Reference),
];

const ORDERED_COLLECTION_PAGE_PROPERTIES: &[PropertyDef] = &[single("startIndex", Range::Number)];

const QUESTION_PROPERTIES: &[PropertyDef] = &[
    multi("anyOf", Range::Reference),
    multi("closed", Range::Any),
    multi("oneOf", Range::Reference),
];

const PLACE_PROPERTIES: &[PropertyDef] = &[
    single("accuracy", Range::Number),
    single("altitude", Range::Number),
    single("latitude", Range::Number),
    single("longitude", Range::Number),
    single("radius", Range::Number),
    single("units", Range::Text),
];

const RELATIONSHIP_PROPERTIES: &[PropertyDef] = &[
    multi("object", Range::Reference),
    multi("relationship", Range::Reference),
    single("subject", Range::Reference),
];

const TOMBSTONE_PROPERTIES: &[PropertyDef] = &[
    single("deleted", Range::DateTime),
    multi("formerType", Range::Reference),
];

const PROFILE_PROPERTIES: &[PropertyDef] = &[single("describes", Range::Reference)];

impl AsType {
    /// Full IRI of the type, e.g. `https://www.w3.org/ns/activitystreams#Note`.
    pub fn iri(self) -> String {
        format!("{AS_NAMESPACE}{}", self.term())
    }

    /// Look a compact term name up in the catalogue.
    pub fn from_term(term: &str) -> Option<AsType> {
        AsType::ALL.iter().copied().find(|t| t.term() == term)
    }

    /// Direct supertypes.
    pub fn extends(self) -> &'static [AsType] {
        use AsType::*;
        match self {
            Object | Link => &[],
            Activity | Collection => &[Object],
            IntransitiveActivity => &[Activity],
            OrderedCollection | CollectionPage => &[Collection],
            OrderedCollectionPage => &[OrderedCollection, CollectionPage],
            Accept | Add | Announce | Create | Delete | Dislike | Flag | Follow | Ignore
            | Join | Leave | Like | Listen | Move | Offer | Read | Reject | Remove | Undo
            | Update | View => &[Activity],
            Arrive | Question | Travel => &[IntransitiveActivity],
            Block => &[Ignore],
            Invite => &[Offer],
            TentativeAccept => &[Accept],
            TentativeReject => &[Reject],
            Application | Group | Organization | Person | Service => &[Object],
            Article | Document | Event | Note | Place | Profile | Relationship | Tombstone => {
                &[Object]
            }
            Audio | Image | Page | Video => &[Document],
            Mention => &[Link],
        }
    }

    /// Properties this type declares itself, excluding inherited ones.
    pub fn own_properties(self) -> &'static [PropertyDef] {
        use AsType::*;
        match self {
            Object => OBJECT_PROPERTIES,
            Link => LINK_PROPERTIES,
            Activity => ACTIVITY_PROPERTIES,
            Collection => COLLECTION_PROPERTIES,
            OrderedCollection => ORDERED_COLLECTION_PROPERTIES,
            CollectionPage => COLLECTION_PAGE_PROPERTIES,
            OrderedCollectionPage => ORDERED_COLLECTION_PAGE_PROPERTIES,
            Question => QUESTION_PROPERTIES,
            Application | Group | Organization | Person | Service => ACTOR_PROPERTIES,
            Place => PLACE_PROPERTIES,
            Profile => PROFILE_PROPERTIES,
            Relationship => RELATIONSHIP_PROPERTIES,
            Tombstone => TOMBSTONE_PROPERTIES,
            _ => &[],
        }
    }

    /// Find a property on this type or any supertype, nearest first.
    pub fn property(self, name: &str) -> Option<&'static PropertyDef> {
        let mut queue = VecDeque::from([self]);
        let mut seen = HashSet::new();
        while let Some(t) = queue.pop_front() {
            if !seen.insert(t) {
                continue;
            }
            if let Some(def) = t.own_properties().iter().find(|p| p.name == name) {
                return Some(def);
            }
            queue.extend(t.extends().iter().copied());
        }
        None
    }

    /// Whether `self` is `other` or inherits from it.
    pub fn is_a(self, other: AsType) -> bool {
        self == other || self.extends().iter().any(|t| t.is_a(other))
    }

    pub fn is_collection(self) -> bool {
        self.is_a(AsType::Collection)
    }

    pub fn is_collection_page(self) -> bool {
        self.is_a(AsType::CollectionPage)
    }

    pub fn is_actor(self) -> bool {
        matches!(
            self,
            AsType::Application
                | AsType::Group
                | AsType::Organization
                | AsType::Person
                | AsType::Service
        )
    }
}

impl fmt::Display for AsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.term())
    }
}

impl std::str::FromStr for AsType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AsType::from_term(s).ok_or_else(|| format!("unknown ActivityStreams type {s:?}"))
    }
}

/// A type from an extension vocabulary, identified by its full IRI.
///
/// `term` is the compact name used when such an object is constructed
/// locally and no original type term is available.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtensionType {
    term: String,
    iri: String,
}

impl ExtensionType {
    pub fn new(term: impl Into<String>, iri: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            iri: iri.into(),
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn iri(&self) -> &str {
        &self.iri
    }
}

/// The type tag of an [`Object`](crate::Object).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VocabType {
    As(AsType),
    Extension(ExtensionType),
    /// A tag that matched nothing in the registry. Retained for nested
    /// objects so that decoding is lossless; never dispatched to a handler.
    Unknown(String),
}

impl VocabType {
    /// The compact term written to `type` when no original term is known.
    pub fn term(&self) -> &str {
        match self {
            VocabType::As(t) => t.term(),
            VocabType::Extension(e) => e.term(),
            VocabType::Unknown(term) => term,
        }
    }

    pub fn as_type(&self) -> Option<AsType> {
        match self {
            VocabType::As(t) => Some(*t),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, VocabType::Unknown(_))
    }
}

impl From<AsType> for VocabType {
    fn from(t: AsType) -> Self {
        VocabType::As(t)
    }
}

impl From<ExtensionType> for VocabType {
    fn from(t: ExtensionType) -> Self {
        VocabType::Extension(t)
    }
}

impl fmt::Display for VocabType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.term())
    }
}

/// Registration of an extension type.
#[derive(Debug, Clone)]
pub struct ExtensionDef {
    pub ty: ExtensionType,
    /// Catalogue type whose property table the extension inherits.
    pub extends: AsType,
    pub properties: Vec<PropertyDef>,
}

/// Lookup tables for type terms, type IRIs, and property declarations.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    by_iri: HashMap<String, VocabType>,
    extensions: HashMap<ExtensionType, ExtensionDef>,
}

static STANDARD: LazyLock<Arc<Vocabulary>> = LazyLock::new(|| Arc::new(Vocabulary::new()));

impl Vocabulary {
    /// The ActivityStreams catalogue plus the widely deployed extension types
    /// (`Hashtag`, `Emoji`, `IdentityProof`, `PropertyValue`).
    pub fn new() -> Self {
        let mut vocab = Self::core();
        for def in well_known_extensions() {
            vocab.register(def);
        }
        vocab
    }

    /// Only the ActivityStreams catalogue, no extensions.
    pub fn core() -> Self {
        let by_iri = AsType::ALL
            .iter()
            .map(|t| (t.iri(), VocabType::As(*t)))
            .collect();
        Self {
            by_iri,
            extensions: HashMap::new(),
        }
    }

    /// The shared default registry.
    pub fn standard() -> Arc<Vocabulary> {
        Arc::clone(&STANDARD)
    }

    /// Add an extension type. A later registration for the same IRI replaces
    /// the earlier one.
    pub fn register(&mut self, def: ExtensionDef) {
        let ty = def.ty.clone();
        self.extensions.retain(|k, _| k.iri() != ty.iri());
        self.by_iri
            .insert(ty.iri().to_string(), VocabType::Extension(ty.clone()));
        self.extensions.insert(ty, def);
    }

    /// Resolve one discriminator term to a known type.
    ///
    /// Accepts bare catalogue terms (`"Note"`), compact IRIs (`"as:Note"`,
    /// `"toot:Emoji"` when the context defines `toot`), full IRIs, and terms
    /// the context maps to the IRI of a registered type.
    pub fn resolve_term(&self, term: &str, context: &Context) -> Option<VocabType> {
        if let Some(t) = AsType::from_term(term) {
            return Some(VocabType::As(t));
        }
        let iri = context.expand_term(term)?;
        self.by_iri.get(&iri).cloned()
    }

    /// Find the declaration of `name` for `ty`, searching supertypes.
    pub fn property(&self, ty: &VocabType, name: &str) -> Option<PropertyDef> {
        match ty {
            VocabType::As(t) => t.property(name).copied(),
            VocabType::Extension(e) => {
                let def = self.extensions.get(e)?;
                def.properties
                    .iter()
                    .find(|p| p.name == name)
                    .copied()
                    .or_else(|| def.extends.property(name).copied())
            }
            VocabType::Unknown(_) => None,
        }
    }

    /// The catalogue type an object of `ty` behaves as, if any.
    pub fn base_type(&self, ty: &VocabType) -> Option<AsType> {
        match ty {
            VocabType::As(t) => Some(*t),
            VocabType::Extension(e) => self.extensions.get(e).map(|d| d.extends),
            VocabType::Unknown(_) => None,
        }
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

const MASTODON_NS: &str = "http://joinmastodon.org/ns#";
const SCHEMA_NS: &str = "http://schema.org#";

fn well_known_extensions() -> Vec<ExtensionDef> {
    vec![
        ExtensionDef {
            ty: ExtensionType::new("Hashtag", format!("{AS_NAMESPACE}Hashtag")),
            extends: AsType::Link,
            properties: vec![],
        },
        ExtensionDef {
            ty: ExtensionType::new("Emoji", format!("{MASTODON_NS}Emoji")),
            extends: AsType::Object,
            properties: vec![],
        },
        ExtensionDef {
            ty: ExtensionType::new("IdentityProof", format!("{MASTODON_NS}IdentityProof")),
            extends: AsType::Object,
            properties: vec![
                single("signatureAlgorithm", Range::Text),
                single("signatureValue", Range::Text),
            ],
        },
        ExtensionDef {
            ty: ExtensionType::new("PropertyValue", format!("{SCHEMA_NS}PropertyValue")),
            extends: AsType::Object,
            properties: vec![single("value", Range::Text)],
        },
    ]
}
