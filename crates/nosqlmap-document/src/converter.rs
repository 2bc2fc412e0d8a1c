//! Entity <-> document conversion.

use crate::document::{Document, DocumentEntity};
use nosqlmap_core::{Entity, Value};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Errors raised while converting between entities and documents.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("failed to serialize {collection} entity: {source}")]
    Serialize {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to deserialize {collection} document: {source}")]
    Deserialize {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{collection} entity does not serialize to an object (got {kind})")]
    NotAnObject {
        collection: &'static str,
        kind: &'static str,
    },

    #[error("document from collection {found} cannot become a {expected} entity")]
    CollectionMismatch {
        expected: &'static str,
        found: String,
    },
}

/// Maps entities of type `T` to backend documents and back.
pub trait DocumentEntityConverter<T> {
    fn to_document(&self, entity: &T) -> Result<DocumentEntity, ConversionError>;

    fn to_entity(&self, document: DocumentEntity) -> Result<T, ConversionError>;
}

/// Converter for any serde-mapped [`Entity`].
///
/// Fields are emitted in key order. Extra document fields (for example a
/// backend-assigned `_id`) are ignored unless the entity declares them.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeConverter;

impl<T> DocumentEntityConverter<T> for SerdeConverter
where
    T: Entity + Serialize + DeserializeOwned,
{
    fn to_document(&self, entity: &T) -> Result<DocumentEntity, ConversionError> {
        let json = serde_json::to_value(entity).map_err(|source| ConversionError::Serialize {
            collection: T::COLLECTION,
            source,
        })?;
        match Value::from(json) {
            Value::Map(fields) => {
                let mut document = DocumentEntity::new(T::COLLECTION);
                for (name, value) in fields {
                    document.add(Document { name, value });
                }
                Ok(document)
            }
            other => Err(ConversionError::NotAnObject {
                collection: T::COLLECTION,
                kind: other.kind(),
            }),
        }
    }

    fn to_entity(&self, document: DocumentEntity) -> Result<T, ConversionError> {
        if document.name() != T::COLLECTION {
            return Err(ConversionError::CollectionMismatch {
                expected: T::COLLECTION,
                found: document.name().to_string(),
            });
        }
        let json = serde_json::Value::from(document.to_value());
        serde_json::from_value(json).map_err(|source| ConversionError::Deserialize {
            collection: T::COLLECTION,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Person {
        name: String,
        age: u32,
    }

    impl Entity for Person {
        const COLLECTION: &'static str = "Person";
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Tag(String);

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Counter {
        hits: u64,
        delta: i64,
    }

    impl Entity for Counter {
        const COLLECTION: &'static str = "Counter";
    }

    impl Entity for Tag {
        const COLLECTION: &'static str = "Tag";
    }

    #[test]
    fn entity_round_trips_through_document() {
        let ada = Person {
            name: "Ada".to_string(),
            age: 36,
        };
        let document = SerdeConverter.to_document(&ada).expect("to_document");
        assert_eq!(document.name(), "Person");
        assert_eq!(document.find("age").map(|d| &d.value), Some(&Value::Int(36)));

        let back: Person = SerdeConverter.to_entity(document).expect("to_entity");
        assert_eq!(back, ada);
    }

    #[test]
    fn full_range_integers_round_trip() {
        let counter = Counter {
            hits: u64::MAX,
            delta: i64::MIN,
        };
        let document = SerdeConverter.to_document(&counter).expect("to_document");
        assert_eq!(
            document.find("hits").map(|d| &d.value),
            Some(&Value::UInt(u64::MAX))
        );

        let back: Counter = SerdeConverter.to_entity(document).expect("to_entity");
        assert_eq!(back, counter);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let document = DocumentEntity::new("Person")
            .with("_id", "abc")
            .with("name", "Ada")
            .with("age", 36);
        let person: Person = SerdeConverter.to_entity(document).expect("to_entity");
        assert_eq!(person.name, "Ada");
    }

    #[test]
    fn wrong_collection_is_rejected() {
        let document = DocumentEntity::new("Robot").with("name", "R2");
        let err = <SerdeConverter as DocumentEntityConverter<Person>>::to_entity(
            &SerdeConverter,
            document,
        )
        .expect_err("collection mismatch");
        assert!(matches!(err, ConversionError::CollectionMismatch { .. }));
    }

    #[test]
    fn missing_field_fails_deserialization() {
        let document = DocumentEntity::new("Person").with("name", "Ada");
        let err = <SerdeConverter as DocumentEntityConverter<Person>>::to_entity(
            &SerdeConverter,
            document,
        )
        .expect_err("age is required");
        assert!(matches!(err, ConversionError::Deserialize { .. }));
    }

    #[test]
    fn scalar_entities_are_rejected() {
        let err = SerdeConverter
            .to_document(&Tag("x".to_string()))
            .expect_err("newtype serializes to a string");
        assert!(matches!(
            err,
            ConversionError::NotAnObject { kind: "text", .. }
        ));
    }
}
