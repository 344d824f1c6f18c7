//! Property values: nested objects, literals, and unresolved references.

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone};
use serde_json::{Number, Value as JsonValue};

use crate::iri::Iri;
use crate::object::Object;

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// A plain string.
    Text(String),
    Boolean(bool),
    /// Kept as a JSON number so integers and floats survive unchanged.
    Number(Number),
    /// A timestamp with its original offset.
    DateTime(DateTime<FixedOffset>),
    /// Structural JSON that is not a vocabulary entity: untyped maps such as
    /// `endpoints` or `contentMap`, and `null`.
    Json(JsonValue),
}

impl Literal {
    /// A float literal. `None` for NaN and infinities, which JSON cannot hold.
    pub fn float(f: f64) -> Option<Self> {
        Number::from_f64(f).map(Literal::Number)
    }

    /// The canonical wire form of a timestamp: RFC 3339, `Z` for UTC.
    pub fn format_datetime(dt: &DateTime<FixedOffset>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

/// The value of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An embedded object.
    Object(Box<Object>),
    Literal(Literal),
    /// An IRI standing in for an object that has not been fetched.
    Iri(Iri),
}

impl Value {
    /// A text literal.
    pub fn text(s: impl Into<String>) -> Self {
        Value::Literal(Literal::Text(s.into()))
    }

    /// True for an unresolved reference.
    pub fn is_iri(&self) -> bool {
        matches!(self, Value::Iri(_))
    }

    /// True for an embedded object.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// The reference, if this is one. Inline objects are not references;
    /// see [`Value::reference`].
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Value::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// The embedded object, if this is one.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Unbox the embedded object.
    pub fn into_object(self) -> Option<Object> {
        match self {
            Value::Object(obj) => Some(*obj),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Value::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// The string of a [`Literal::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Literal(Literal::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Literal(Literal::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    /// The number of a [`Literal::Number`], as written.
    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Literal(Literal::Number(n)) => Some(n),
            _ => None,
        }
    }

    /// The timestamp of a [`Literal::DateTime`].
    pub fn as_datetime(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Value::Literal(Literal::DateTime(dt)) => Some(dt),
            _ => None,
        }
    }

    /// The IRI this value refers to: the reference itself, or the `id` of
    /// an inline object.
    pub fn reference(&self) -> Option<&Iri> {
        match self {
            Value::Iri(iri) => Some(iri),
            Value::Object(obj) => obj.id(),
            Value::Literal(_) => None,
        }
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(Box::new(obj))
    }
}

impl From<Iri> for Value {
    fn from(iri: Iri) -> Self {
        Value::Iri(iri)
    }
}

impl From<Literal> for Value {
    fn from(lit: Literal) -> Self {
        Value::Literal(lit)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::text(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Literal(Literal::Boolean(b))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Literal(Literal::Number(n.into()))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Literal(Literal::Number(n.into()))
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(dt: DateTime<Tz>) -> Self {
        Value::Literal(Literal::DateTime(dt.fixed_offset()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::AsType;
    use chrono::Utc;

    #[test]
    fn accessors_branch_on_variant() {
        let iri = Iri::parse("https://example.com/notes/1").unwrap();
        let v = Value::from(iri.clone());
        assert!(v.is_iri());
        assert_eq!(v.as_iri(), Some(&iri));
        assert_eq!(v.as_object(), None);
        assert_eq!(v.reference(), Some(&iri));

        let t = Value::from("hello");
        assert_eq!(t.as_text(), Some("hello"));
        assert_eq!(t.reference(), None);
    }

    #[test]
    fn inline_object_reference_is_its_id() {
        let mut note = Object::new(AsType::Note);
        let iri = Iri::parse("https://example.com/notes/2").unwrap();
        note.set_id(iri.clone());
        let v = Value::from(note);
        assert_eq!(v.reference(), Some(&iri));
        assert!(v.into_object().is_some());
    }

    #[test]
    fn float_rejects_nan() {
        assert!(Literal::float(f64::NAN).is_none());
        assert!(Literal::float(1.5).is_some());
    }

    #[test]
    fn datetime_canonical_form() {
        let dt = DateTime::parse_from_rfc3339("2016-03-16T00:00:00Z").unwrap();
        assert_eq!(Literal::format_datetime(&dt), "2016-03-16T00:00:00Z");
        let dt = DateTime::parse_from_rfc3339("2016-03-16T02:00:00.5+02:00").unwrap();
        assert_eq!(Literal::format_datetime(&dt), "2016-03-16T02:00:00.500+02:00");
        let now = Value::from(Utc::now());
        assert!(now.as_datetime().is_some());
    }
}
