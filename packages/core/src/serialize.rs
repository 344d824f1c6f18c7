//! Typed [`Object`] → [`Document`].
//!
//! Output shape:
//!
//! - `@context` when the object carries one, `id` when set, `type` as a
//!   string (one term) or a list (several).
//! - Every property under its own name. Nested objects recurse, references
//!   become their IRI string, timestamps become RFC 3339 (`Z` for UTC).
//! - A non-functional property with exactly one value is written as that
//!   bare value, which is how ActivityStreams documents are usually
//!   compacted; empty or longer sequences are written as lists.
//!
//! Serializing, parsing, and serializing again yields the same document.

use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use crate::codec::{self, CodecError, Document};
use crate::object::Object;
use crate::property::Property;
use crate::value::{Literal, Value};

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("object has an empty type term")]
    EmptyTypeTerm,

    #[error("property name must not be empty")]
    EmptyPropertyName,

    #[error("property {property:?}: {source}")]
    Nested {
        property: String,
        #[source]
        source: Box<SerializeError>,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Convert an object into a document.
pub fn serialize(object: &Object) -> Result<Document, SerializeError> {
    let mut doc = Map::new();

    if let Some(context) = object.context().to_json() {
        doc.insert("@context".into(), context);
    }
    if let Some(id) = object.id() {
        doc.insert("id".into(), JsonValue::String(id.to_string()));
    }
    doc.insert("type".into(), type_json(object.type_terms())?);

    for (name, property) in object.properties() {
        if name.is_empty() {
            return Err(SerializeError::EmptyPropertyName);
        }
        let json = property_json(property).map_err(|e| SerializeError::Nested {
            property: name.to_string(),
            source: Box::new(e),
        })?;
        doc.insert(name.to_string(), json);
    }
    Ok(doc)
}

/// Serialize and encode as compact JSON bytes.
pub fn to_bytes(object: &Object) -> Result<Vec<u8>, SerializeError> {
    Ok(codec::encode(&serialize(object)?)?)
}

/// Serialize and encode as indented JSON bytes.
pub fn to_bytes_pretty(object: &Object) -> Result<Vec<u8>, SerializeError> {
    Ok(codec::encode_pretty(&serialize(object)?)?)
}

fn type_json(terms: &[String]) -> Result<JsonValue, SerializeError> {
    if terms.is_empty() || terms.iter().any(String::is_empty) {
        return Err(SerializeError::EmptyTypeTerm);
    }
    Ok(match terms {
        [single] => JsonValue::String(single.clone()),
        many => JsonValue::Array(many.iter().cloned().map(JsonValue::String).collect()),
    })
}

fn property_json(property: &Property) -> Result<JsonValue, SerializeError> {
    match property {
        Property::Functional(p) => match p.get() {
            Some(value) => value_json(value),
            None => Ok(JsonValue::Null),
        },
        Property::NonFunctional(p) => match p.values() {
            [single] => value_json(single),
            values => values
                .iter()
                .map(value_json)
                .collect::<Result<Vec<_>, _>>()
                .map(JsonValue::Array),
        },
    }
}

fn value_json(value: &Value) -> Result<JsonValue, SerializeError> {
    Ok(match value {
        Value::Object(obj) => JsonValue::Object(serialize(obj)?),
        Value::Iri(iri) => JsonValue::String(iri.to_string()),
        Value::Literal(lit) => match lit {
            Literal::Text(s) => JsonValue::String(s.clone()),
            Literal::Boolean(b) => JsonValue::Bool(*b),
            Literal::Number(n) => JsonValue::Number(n.clone()),
            Literal::DateTime(dt) => JsonValue::String(Literal::format_datetime(dt)),
            Literal::Json(json) => json.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode;
    use crate::iri::Iri;
    use crate::resolve::{from_bytes, to_object};
    use crate::vocab::{AsType, VocabType};
    use crate::Context;
    use serde_json::json;

    fn roundtrip_is_stable(object: &Object) {
        let first = serialize(object).unwrap();
        let reparsed = to_object(first.clone()).unwrap();
        let second = serialize(&reparsed).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn note_end_to_end() {
        let input = br#"{"type":"Note","content":"hi"}"#;
        let note = from_bytes(input).unwrap();
        assert_eq!(note.get("content").unwrap().values(), [Value::text("hi")]);
        let out = to_bytes(&note).unwrap();
        assert_eq!(decode(&out).unwrap(), decode(input).unwrap());
    }

    #[test]
    fn constructed_note_shape() {
        let mut note = Object::new(AsType::Note);
        note.set_context(Context::activity_streams());
        note.set_id(Iri::parse("https://example.com/some/path/to/this/note").unwrap());
        note.append("content", "jorts").unwrap();
        note.set(
            "published",
            chrono::DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z").unwrap(),
        )
        .unwrap();
        let doc = serialize(&note).unwrap();
        assert_eq!(
            JsonValue::Object(doc),
            json!({
                "@context": "https://www.w3.org/ns/activitystreams",
                "id": "https://example.com/some/path/to/this/note",
                "type": "Note",
                "content": "jorts",
                "published": "2024-05-01T12:00:00Z"
            })
        );
        roundtrip_is_stable(&note);
    }

    #[test]
    fn nested_objects_and_references() {
        let mut object = crate::property::NonFunctionalProperty::new();
        object.append(Object::new(AsType::Note));
        object.prepend(Object::new(AsType::Article));
        object.append(Iri::parse("https://go-fed.org/foo").unwrap());

        let mut create = Object::new(AsType::Create);
        create.attach("object", object).unwrap();
        let doc = serialize(&create).unwrap();
        assert_eq!(
            doc.get("object"),
            Some(&json!([{"type": "Article"}, {"type": "Note"}, "https://go-fed.org/foo"]))
        );
        roundtrip_is_stable(&create);
    }

    #[test]
    fn multiple_type_terms_written_as_list() {
        let mut obj = Object::new(AsType::Note);
        obj.add_type_term("toot:Status");
        let doc = serialize(&obj).unwrap();
        assert_eq!(doc.get("type"), Some(&json!(["Note", "toot:Status"])));
    }

    #[test]
    fn empty_type_term_is_an_error() {
        let obj = Object::new(VocabType::Unknown(String::new()));
        assert!(matches!(serialize(&obj), Err(SerializeError::EmptyTypeTerm)));

        let mut outer = Object::new(AsType::Collection);
        outer.append("items", obj).unwrap();
        assert!(matches!(
            serialize(&outer),
            Err(SerializeError::Nested { ref property, .. }) if property == "items"
        ));
    }

    #[test]
    fn cleared_functional_property_is_null() {
        let mut note = Object::new(AsType::Note);
        note.set("mediaType", "text/html").unwrap();
        if let Some(Property::Functional(p)) = note.get_mut("mediaType") {
            p.clear();
        }
        let doc = serialize(&note).unwrap();
        assert_eq!(doc.get("mediaType"), Some(&JsonValue::Null));
        roundtrip_is_stable(&note);
    }

    #[test]
    fn mastodon_actor_roundtrip() {
        let actor = json!({
            "@context": [
                "https://www.w3.org/ns/activitystreams",
                "https://w3id.org/security/v1",
                {
                    "toot": "http://joinmastodon.org/ns#",
                    "schema": "http://schema.org#",
                    "PropertyValue": "schema:PropertyValue",
                    "IdentityProof": "toot:IdentityProof",
                    "value": "schema:value",
                    "discoverable": "toot:discoverable"
                }
            ],
            "id": "https://mastodon.social/users/Gargron",
            "type": "Person",
            "alsoKnownAs": ["https://tooting.ai/users/Gargron"],
            "attachment": [
                {"type": "PropertyValue", "name": "Patreon", "value": "<a href=\"https://www.patreon.com/mastodon\">patreon</a>"},
                {"type": "IdentityProof", "name": "gargron", "signatureAlgorithm": "keybase", "signatureValue": "5cfc20c7"}
            ],
            "discoverable": true,
            "endpoints": {"sharedInbox": "https://mastodon.social/inbox"},
            "followers": "https://mastodon.social/users/Gargron/followers",
            "icon": {"type": "Image", "mediaType": "image/jpeg", "url": "https://files.mastodon.social/accounts/avatars/000/000/001/original/d96d39a0abb45b92.jpg"},
            "inbox": "https://mastodon.social/users/Gargron/inbox",
            "name": "Eugen",
            "outbox": "https://mastodon.social/users/Gargron/outbox",
            "preferredUsername": "Gargron",
            "publicKey": {
                "id": "https://mastodon.social/users/Gargron#main-key",
                "owner": "https://mastodon.social/users/Gargron",
                "publicKeyPem": "-----BEGIN PUBLIC KEY-----\n...\n-----END PUBLIC KEY-----\n"
            },
            "published": "2016-03-16T00:00:00Z",
            "tag": [],
            "url": "https://mastodon.social/@Gargron"
        });
        let JsonValue::Object(map) = actor else { unreachable!() };
        let person = to_object(map).unwrap();
        assert_eq!(person.vocab_type(), &VocabType::As(AsType::Person));

        let attachment = person.non_functional("attachment").unwrap();
        let types: Vec<_> = attachment
            .iter()
            .filter_map(Value::as_object)
            .map(|o| o.vocab_type().term().to_string())
            .collect();
        assert_eq!(types, vec!["PropertyValue", "IdentityProof"]);
        assert!(attachment
            .iter()
            .filter_map(Value::as_object)
            .all(|o| o.vocab_type().is_known()));

        roundtrip_is_stable(&person);
        let doc = serialize(&person).unwrap();
        assert_eq!(doc.get("tag"), Some(&json!([])));
        assert_eq!(doc.get("alsoKnownAs"), Some(&json!("https://tooting.ai/users/Gargron")));
        assert_eq!(doc.get("@context").and_then(JsonValue::as_array).map(Vec::len), Some(3));
    }
}
