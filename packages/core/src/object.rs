//! Instances of vocabulary types: the [`Object`] model.
//!
//! # Ownership
//!
//! Every property belongs to exactly one object. `Object: Clone` is a deep
//! copy, and there are two explicit ways to put an existing [`Property`] on
//! an object:
//!
//! - [`Object::attach`] moves the property in. The caller no longer has it,
//!   so later mutation through the object is the only mutation.
//! - [`Object::attach_copy`] copies it. The caller's property and the
//!   object's are independent from then on.
//!
//! There is no way to make two objects observe each other's mutations. Share
//! whole objects through `Arc` if that is what a caller needs.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::context::Context;
use crate::iri::Iri;
use crate::property::{FunctionalProperty, NonFunctionalProperty, Property};
use crate::value::Value;
use crate::vocab::{AsType, PropertyDef, VocabType, Vocabulary};

/// Keys that are object structure, not properties.
pub const RESERVED_NAMES: &[&str] = &["@context", "@id", "@type", "id", "type"];

/// Errors returned when mutating an [`Object`].
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ModelError {
    #[error("property name must not be empty")]
    EmptyName,

    #[error("{0:?} is reserved and cannot be used as a property name")]
    ReservedName(String),

    #[error("property {name:?} has the wrong cardinality (functional: {functional})")]
    WrongCardinality { name: String, functional: bool },
}

/// A vocabulary entity.
///
/// Each object keeps the [`Vocabulary`] it was built or decoded against, so
/// type checks and property declarations for extension types keep working
/// after the resolver is gone.
#[derive(Clone)]
pub struct Object {
    vocab_type: VocabType,
    type_terms: Vec<String>,
    id: Option<Iri>,
    context: Context,
    properties: BTreeMap<String, Property>,
    vocab: Arc<Vocabulary>,
}

impl Object {
    /// An object of the given type with no id, no context, and no properties,
    /// over the standard vocabulary.
    pub fn new(vocab_type: impl Into<VocabType>) -> Self {
        Self::with_vocabulary(vocab_type, Vocabulary::standard())
    }

    /// Like [`Object::new`], with declarations looked up in `vocab`.
    pub fn with_vocabulary(vocab_type: impl Into<VocabType>, vocab: Arc<Vocabulary>) -> Self {
        let vocab_type = vocab_type.into();
        let type_terms = vec![vocab_type.term().to_string()];
        Self::decoded(vocab_type, type_terms, vocab)
    }

    /// Build an object from decoded parts. `type_terms` are the discriminator
    /// terms exactly as they appeared on the wire.
    pub(crate) fn decoded(
        vocab_type: VocabType,
        type_terms: Vec<String>,
        vocab: Arc<Vocabulary>,
    ) -> Self {
        Self {
            vocab_type,
            type_terms,
            id: None,
            context: Context::new(),
            properties: BTreeMap::new(),
            vocab,
        }
    }

    /// The vocabulary this object's declarations come from.
    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocab
    }

    /// The resolved type.
    pub fn vocab_type(&self) -> &VocabType {
        &self.vocab_type
    }

    /// The catalogue type, or the catalogue type a registered extension
    /// builds on.
    pub fn as_type(&self) -> Option<AsType> {
        self.vocab.base_type(&self.vocab_type)
    }

    /// Whether the object is `t` or a subtype of it.
    pub fn is_a(&self, t: AsType) -> bool {
        self.as_type().is_some_and(|own| own.is_a(t))
    }

    /// All type terms as written to `type`, in order.
    pub fn type_terms(&self) -> &[String] {
        &self.type_terms
    }

    /// Add another type term (vocabulary types may be combined). Does not
    /// change the resolved type.
    pub fn add_type_term(&mut self, term: impl Into<String>) {
        let term = term.into();
        if !self.type_terms.contains(&term) {
            self.type_terms.push(term);
        }
    }

    pub fn id(&self) -> Option<&Iri> {
        self.id.as_ref()
    }

    pub fn set_id(&mut self, id: Iri) -> Option<Iri> {
        self.id.replace(id)
    }

    pub fn clear_id(&mut self) -> Option<Iri> {
        self.id.take()
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    pub fn set_context(&mut self, context: Context) {
        self.context = context;
    }

    /// The property under `name`, or `None` if it was never set.
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.get_mut(name)
    }

    pub fn functional(&self, name: &str) -> Option<&FunctionalProperty> {
        self.get(name).and_then(Property::as_functional)
    }

    pub fn non_functional(&self, name: &str) -> Option<&NonFunctionalProperty> {
        self.get(name).and_then(Property::as_non_functional)
    }

    /// Shorthand for the first value of a property, if present and non-empty.
    pub fn first_value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(Property::first)
    }

    /// First value of `name` when it is an IRI reference.
    pub fn first_iri(&self, name: &str) -> Option<&Iri> {
        self.first_value(name).and_then(Value::as_iri)
    }

    /// First value of `name` when it is an embedded object.
    pub fn first_object(&self, name: &str) -> Option<&Object> {
        self.first_value(name).and_then(Value::as_object)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Set a functional property, replacing any previous value.
    ///
    /// Names not declared for this type are accepted and stored as
    /// functional.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ModelError> {
        self.check(name, true)?;
        match self
            .properties
            .entry(name.to_string())
            .or_insert_with(|| Property::Functional(FunctionalProperty::default()))
        {
            Property::Functional(p) => {
                p.set(value);
                Ok(())
            }
            Property::NonFunctional(_) => Err(wrong(name, false)),
        }
    }

    /// Append to a non-functional property, creating it if absent.
    pub fn append(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ModelError> {
        self.non_functional_entry(name)?.append(value);
        Ok(())
    }

    /// Prepend to a non-functional property, creating it if absent.
    pub fn prepend(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ModelError> {
        self.non_functional_entry(name)?.prepend(value);
        Ok(())
    }

    /// Attach `property` by move, returning whatever was there before.
    pub fn attach(
        &mut self,
        name: &str,
        property: impl Into<Property>,
    ) -> Result<Option<Property>, ModelError> {
        let property = property.into();
        self.check(name, property.is_functional())?;
        Ok(self.properties.insert(name.to_string(), property))
    }

    /// Attach an independent copy of `property`.
    pub fn attach_copy(
        &mut self,
        name: &str,
        property: &Property,
    ) -> Result<Option<Property>, ModelError> {
        self.attach(name, property.clone())
    }

    pub fn remove(&mut self, name: &str) -> Option<Property> {
        self.properties.remove(name)
    }

    /// Properties in name order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// The declaration of `name` for this object's type, if it has one.
    pub fn declaration(&self, name: &str) -> Option<PropertyDef> {
        self.vocab.property(&self.vocab_type, name)
    }

    /// Names present on the object that its type does not declare.
    pub fn undeclared(&self) -> impl Iterator<Item = &str> {
        self.properties
            .keys()
            .map(String::as_str)
            .filter(|name| self.declaration(name).is_none())
    }

    /// Store a decoded property without cardinality checks; decoding keeps
    /// whatever shape the document had.
    pub(crate) fn insert_decoded(&mut self, name: String, property: Property) {
        self.properties.insert(name, property);
    }

    pub(crate) fn set_decoded_context(&mut self, context: Context) {
        self.context = context;
    }

    pub(crate) fn set_decoded_id(&mut self, id: Option<Iri>) {
        self.id = id;
    }

    fn non_functional_entry(&mut self, name: &str) -> Result<&mut NonFunctionalProperty, ModelError> {
        self.check(name, false)?;
        match self
            .properties
            .entry(name.to_string())
            .or_insert_with(|| Property::NonFunctional(NonFunctionalProperty::new()))
        {
            Property::NonFunctional(p) => Ok(p),
            Property::Functional(_) => Err(wrong(name, true)),
        }
    }

    fn check(&self, name: &str, functional: bool) -> Result<(), ModelError> {
        if name.is_empty() {
            return Err(ModelError::EmptyName);
        }
        if RESERVED_NAMES.contains(&name) {
            return Err(ModelError::ReservedName(name.to_string()));
        }
        match self.declaration(name) {
            Some(def) if def.functional != functional => Err(wrong(name, def.functional)),
            _ => Ok(()),
        }
    }
}

// Two objects are equal when their content is; the vocabulary they carry is
// not compared.
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.vocab_type == other.vocab_type
            && self.type_terms == other.type_terms
            && self.id == other.id
            && self.context == other.context
            && self.properties == other.properties
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("vocab_type", &self.vocab_type)
            .field("type_terms", &self.type_terms)
            .field("id", &self.id)
            .field("context", &self.context)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

fn wrong(name: &str, functional: bool) -> ModelError {
    ModelError::WrongCardinality {
        name: name.to_string(),
        functional,
    }
}
