//! Collection descriptors.
//!
//! A descriptor names a collection and fixes its property list. The schema
//! is applied once, when the collection is created, and never migrated.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

/// Property data types understood by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Text,
    Number,
    Int,
    IntArray,
    Date,
}

impl DataType {
    /// Returns the Weaviate name for this type.
    #[inline]
    pub fn as_weaviate(&self) -> &'static str {
        match self {
            DataType::Text => "text",
            DataType::Number => "number",
            DataType::Int => "int",
            DataType::IntArray => "int[]",
            DataType::Date => "date",
        }
    }

    /// Returns true if values of this type are vectorized as text.
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self, DataType::Text)
    }
}

/// A single named, typed property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub data_type: DataType,
}

impl Property {
    /// Creates a new property.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Name and schema of a collection.
///
/// # Example
///
/// ```
/// use reelsearch_core::{CollectionDescriptor, DataType};
///
/// let descriptor = CollectionDescriptor::new("Book")
///     .with_property("title", DataType::Text)
///     .with_property("year", DataType::Int);
///
/// assert_eq!(descriptor.field_names(), vec!["title", "year"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDescriptor {
    pub name: String,
    pub properties: Vec<Property>,
    /// Vectorizer module the store uses to embed text properties.
    pub vectorizer: String,
    /// Optional generative module enabled on the collection.
    pub generative: Option<String>,
}

impl CollectionDescriptor {
    /// Creates a descriptor with no properties and the OpenAI vectorizer.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            vectorizer: "text2vec-openai".to_string(),
            generative: None,
        }
    }

    /// Appends a property. Chainable.
    pub fn with_property(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.properties.push(Property::new(name, data_type));
        self
    }

    /// Sets the vectorizer module. Chainable.
    pub fn with_vectorizer(mut self, module: impl Into<String>) -> Self {
        self.vectorizer = module.into();
        self
    }

    /// Enables a generative module. Chainable.
    pub fn with_generative(mut self, module: impl Into<String>) -> Self {
        self.generative = Some(module.into());
        self
    }

    /// Property names in schema order.
    pub fn field_names(&self) -> Vec<&str> {
        self.properties.iter().map(|p| p.name.as_str()).collect()
    }

    /// Names of the properties the store vectorizes.
    pub fn text_fields(&self) -> Vec<&str> {
        self.properties
            .iter()
            .filter(|p| p.data_type.is_text())
            .map(|p| p.name.as_str())
            .collect()
    }
}

/// A typed record stored in a collection.
///
/// Implementors serialize to a flat property map whose keys match
/// [`Record::descriptor`].
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    /// The collection schema this record type belongs to.
    fn descriptor() -> CollectionDescriptor;

    /// Deterministic object id, stable across imports of the same row.
    fn object_id(&self) -> Uuid;
}
