//! Document records: a named collection entry holding ordered fields.

use nosqlmap_core::{Element, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One named field of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub value: Value,
}

impl Document {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl From<Element> for Document {
    fn from(element: Element) -> Self {
        let (name, value) = element.into_parts();
        Self { name, value }
    }
}

/// A backend-native document: collection name plus fields in insertion order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentEntity {
    name: String,
    documents: Vec<Document>,
}

impl DocumentEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: Vec::new(),
        }
    }

    /// Collection this document belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Append a field, replacing an existing field of the same name in place.
    pub fn add(&mut self, document: Document) {
        match self.documents.iter_mut().find(|d| d.name == document.name) {
            Some(existing) => existing.value = document.value,
            None => self.documents.push(document),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add(Document::new(name, value));
        self
    }

    pub fn find(&self, name: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.name == name)
    }

    /// Remove a field by name. Returns whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.documents.len();
        self.documents.retain(|d| d.name != name);
        self.documents.len() != before
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Fields as a [`Value::Map`].
    pub fn to_value(&self) -> Value {
        Value::Map(
            self.documents
                .iter()
                .map(|d| (d.name.clone(), d.value.clone()))
                .collect::<BTreeMap<_, _>>(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_replaces_same_named_field_in_place() {
        let mut entity = DocumentEntity::new("Person").with("name", "Ada").with("age", 36);
        entity.add(Document::new("name", "Grace"));
        let names: Vec<&str> = entity.documents().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["name", "age"]);
        assert_eq!(
            entity.find("name").map(|d| &d.value),
            Some(&Value::from("Grace"))
        );
    }

    #[test]
    fn property_elements_become_fields() {
        let mut entity = DocumentEntity::new("Knows");
        for element in [
            Element::new("since", 2020).expect("element"),
            Element::new("weight", 0.5).expect("element"),
        ] {
            entity.add(Document::from(element));
        }
        assert_eq!(entity.len(), 2);
        assert_eq!(
            entity.find("since").map(|d| &d.value),
            Some(&Value::Int(2020))
        );
    }

    #[test]
    fn remove_reports_whether_field_existed() {
        let mut entity = DocumentEntity::new("Person").with("name", "Ada");
        assert!(entity.remove("name"));
        assert!(!entity.remove("name"));
        assert!(entity.is_empty());
    }

    #[test]
    fn to_value_builds_a_map() {
        let entity = DocumentEntity::new("Person").with("age", 36);
        assert_eq!(
            entity.to_value().as_map().and_then(|m| m.get("age")),
            Some(&Value::Int(36))
        );
    }
}
