//! Functional and non-functional properties.
//!
//! Absence is never modelled here: an [`Object`](crate::Object) either has a
//! [`Property`] under a name or returns `None`. A present property may still
//! be empty (a cleared functional property, or `"tag": []`).

use crate::iri::Iri;
use crate::value::Value;

/// A property holding at most one value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionalProperty {
    value: Option<Value>,
}

impl FunctionalProperty {
    /// A property holding `value`.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
        }
    }

    /// Replace the value. Returns the previous one.
    pub fn set(&mut self, value: impl Into<Value>) -> Option<Value> {
        self.value.replace(value.into())
    }

    /// Empty the property, keeping it present. Returns the old value.
    pub fn clear(&mut self) -> Option<Value> {
        self.value.take()
    }

    /// The value, or `None` once cleared.
    pub fn get(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Mutable access to the value in place.
    pub fn get_mut(&mut self) -> Option<&mut Value> {
        self.value.as_mut()
    }

    /// True after [`FunctionalProperty::clear`] or for a default property.
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// True when the value is an unresolved IRI reference.
    pub fn is_iri(&self) -> bool {
        self.value.as_ref().is_some_and(Value::is_iri)
    }

    /// The IRI the property refers to, if it holds a reference.
    pub fn iri(&self) -> Option<&Iri> {
        self.value.as_ref().and_then(Value::as_iri)
    }

    /// Consume the property, returning its value.
    pub fn into_value(self) -> Option<Value> {
        self.value
    }
}

/// A property holding an ordered sequence of values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NonFunctionalProperty {
    values: Vec<Value>,
}

impl NonFunctionalProperty {
    /// An empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add at the end.
    pub fn append(&mut self, value: impl Into<Value>) {
        self.values.push(value.into());
    }

    /// Add at the start; existing values keep their relative order.
    pub fn prepend(&mut self, value: impl Into<Value>) {
        self.values.insert(0, value.into());
    }

    /// Insert at `index`, clamped to the end of the sequence.
    pub fn insert(&mut self, index: usize, value: impl Into<Value>) {
        let index = index.min(self.values.len());
        self.values.insert(index, value.into());
    }

    /// Remove the value at `index`, shifting later values down. `None` if
    /// `index` is out of range.
    pub fn remove(&mut self, index: usize) -> Option<Value> {
        (index < self.values.len()).then(|| self.values.remove(index))
    }

    /// The value at `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// The earliest value, if any.
    pub fn first(&self) -> Option<&Value> {
        self.values.first()
    }

    /// Number of values held.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for a present but empty sequence, such as `"tag": []`.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    /// Values in order, mutably.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Value> {
        self.values.iter_mut()
    }

    /// The values as a slice.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consume the property, returning its values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl FromIterator<Value> for NonFunctionalProperty {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a NonFunctionalProperty {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;
    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl IntoIterator for NonFunctionalProperty {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;
    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// A named attribute of an object.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// At most one value; writing replaces.
    Functional(FunctionalProperty),
    /// An ordered sequence; writing appends or prepends.
    NonFunctional(NonFunctionalProperty),
}

impl Property {
    /// Whether this is the single-valued kind.
    pub fn is_functional(&self) -> bool {
        matches!(self, Property::Functional(_))
    }

    /// The functional property, if that is what this is.
    pub fn as_functional(&self) -> Option<&FunctionalProperty> {
        match self {
            Property::Functional(p) => Some(p),
            Property::NonFunctional(_) => None,
        }
    }

    /// The non-functional property, if that is what this is.
    pub fn as_non_functional(&self) -> Option<&NonFunctionalProperty> {
        match self {
            Property::NonFunctional(p) => Some(p),
            Property::Functional(_) => None,
        }
    }

    /// All values in order, regardless of kind.
    pub fn values(&self) -> &[Value] {
        match self {
            Property::Functional(p) => p.value.as_slice(),
            Property::NonFunctional(p) => p.values(),
        }
    }

    /// The single value of a functional property, or the first value of a
    /// non-functional one.
    pub fn first(&self) -> Option<&Value> {
        self.values().first()
    }

    /// True when the property is present but holds no value.
    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    /// Consume the property, returning its values in order.
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Property::Functional(p) => p.value.into_iter().collect(),
            Property::NonFunctional(p) => p.values,
        }
    }
}

impl From<FunctionalProperty> for Property {
    fn from(p: FunctionalProperty) -> Self {
        Property::Functional(p)
    }
}

impl From<NonFunctionalProperty> for Property {
    fn from(p: NonFunctionalProperty) -> Self {
        Property::NonFunctional(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn functional_set_twice_keeps_second() {
        let mut p = FunctionalProperty::default();
        assert!(p.is_empty());
        assert_eq!(p.set("first"), None);
        assert_eq!(p.set("second"), Some(Value::text("first")));
        assert_eq!(p.get(), Some(&Value::text("second")));
        assert_eq!(Property::from(p).values().len(), 1);
    }

    #[test]
    fn functional_clear_leaves_present_but_empty() {
        let mut p = FunctionalProperty::new("x");
        assert_eq!(p.clear(), Some(Value::text("x")));
        assert!(p.is_empty());
        assert!(Property::from(p).is_empty());
    }

    #[test]
    fn functional_iri_accessors() {
        let iri = Iri::parse("https://go-fed.org/some/path").unwrap();
        let p = FunctionalProperty::new(iri.clone());
        assert!(p.is_iri());
        assert_eq!(p.iri(), Some(&iri));
    }

    #[test]
    fn append_then_prepend_orders_correctly() {
        let mut p = NonFunctionalProperty::new();
        for s in ["a", "b", "c"] {
            p.append(s);
        }
        p.prepend("z");
        let texts: Vec<_> = p.iter().filter_map(Value::as_text).collect();
        assert_eq!(texts, vec!["z", "a", "b", "c"]);
    }

    #[test]
    fn append_iri_is_just_a_value() {
        let mut p = NonFunctionalProperty::new();
        p.append(Iri::parse("https://go-fed.org/foo").unwrap());
        assert!(p.first().is_some_and(Value::is_iri));
    }

    #[test]
    fn insert_and_remove() {
        let mut p: NonFunctionalProperty = vec![Value::text("a"), Value::text("c")]
            .into_iter()
            .collect();
        p.insert(1, "b");
        p.insert(99, "d");
        let texts: Vec<_> = p.iter().filter_map(Value::as_text).collect();
        assert_eq!(texts, vec!["a", "b", "c", "d"]);
        assert_eq!(p.remove(0), Some(Value::text("a")));
        assert_eq!(p.remove(10), None);
        assert_eq!(p.len(), 3);
    }
}
