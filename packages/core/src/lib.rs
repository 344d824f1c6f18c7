//! ActivityStreams 2.0 object model.
//!
//! This crate provides the typed object model, the type resolver, and the
//! serialize/parse round trip between typed objects and JSON-LD documents.
//! Network access lives in `weftstreams-client`; nothing here performs I/O.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`vocab`] | The type catalogue ([`AsType`]), property tables, and the extension registry ([`Vocabulary`]) |
//! | [`iri`] | Absolute identifiers: [`Iri`] |
//! | [`context`] | The `@context` of a document, kept structurally: [`Context`] |
//! | [`value`] | Property values: [`Value`], [`Literal`] |
//! | [`property`] | [`FunctionalProperty`], [`NonFunctionalProperty`], [`Property`] |
//! | [`object`] | [`Object`], an instance of a vocabulary type |
//! | [`codec`] | Bytes ⇄ untyped [`Document`] |
//! | [`resolve`] | Document → typed [`Object`] → per-type handler ([`Resolver`]) |
//! | [`serialize`] | Typed [`Object`] → [`Document`] |
//!
//! # Quick start
//!
//! ```rust
//! use weftstreams::{AsType, Resolver, Value};
//!
//! let mut content = None;
//! {
//!     let mut resolver = Resolver::new().on(AsType::Note, |note| {
//!         content = note.first_value("content").and_then(Value::as_text).map(str::to_owned);
//!         Ok(())
//!     });
//!     resolver.resolve_bytes(br#"{"type":"Note","content":"hi"}"#).unwrap();
//! }
//! assert_eq!(content.as_deref(), Some("hi"));
//! ```

pub mod codec;
pub mod context;
pub mod iri;
pub mod object;
pub mod property;
pub mod resolve;
pub mod serialize;
pub mod value;
pub mod vocab;

pub use codec::{decode, encode, CodecError, Document};
pub use context::{Context, ContextError};
pub use iri::{Iri, IriError};
pub use object::{ModelError, Object};
pub use property::{FunctionalProperty, NonFunctionalProperty, Property};
pub use resolve::{from_bytes, to_object, HandlerError, ResolveError, Resolver};
pub use serialize::{serialize, to_bytes, SerializeError};
pub use value::{Literal, Value};
pub use vocab::{AsType, ExtensionDef, ExtensionType, PropertyDef, Range, VocabType, Vocabulary};
