use super::attribute::AttributeId;
use super::tag::Tag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schema-level type describing one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Opaque identifier (stable key from version 3 onward)
    pub id: String,
    /// Fully qualified name (stable key before version 3)
    pub full_name: String,
    /// Simple name without package prefix
    pub name: String,
    /// Owning package
    pub package: Option<String>,
    /// Default label
    pub label: Option<String>,
    /// Default description
    pub description: Option<String>,
    /// Labels by language code
    pub labels: BTreeMap<String, String>,
    /// Descriptions by language code
    pub descriptions: BTreeMap<String, String>,
    /// Abstract entities hold no data of their own
    pub abstract_class: bool,
    /// Key of the superclass whose attributes are inherited
    pub extends: Option<String>,
    /// Storage backend name on the server
    pub backend: Option<String>,
    /// Semantic annotations
    pub tags: Vec<Tag>,
    pub(crate) attributes: Vec<AttributeId>,
}

impl Entity {
    pub fn new(id: impl Into<String>, full_name: impl Into<String>) -> Self {
        let full_name = full_name.into();
        let name = full_name
            .rsplit('_')
            .next()
            .unwrap_or(full_name.as_str())
            .to_string();
        Self {
            id: id.into(),
            name,
            full_name,
            package: None,
            label: None,
            description: None,
            labels: BTreeMap::new(),
            descriptions: BTreeMap::new(),
            abstract_class: false,
            extends: None,
            backend: None,
            tags: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Entity whose id and full name coincide.
    pub fn named(full_name: impl Into<String>) -> Self {
        let full_name = full_name.into();
        Self::new(full_name.clone(), full_name)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a label in a specific language.
    pub fn with_label_in(mut self, language: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(language.into(), label.into());
        self
    }

    /// Add a description in a specific language.
    pub fn with_description_in(
        mut self,
        language: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.descriptions.insert(language.into(), description.into());
        self
    }

    /// Mark as abstract.
    pub fn abstract_class(mut self) -> Self {
        self.abstract_class = true;
        self
    }

    /// Inherit attributes from the given superclass.
    pub fn extending(mut self, superclass: impl Into<String>) -> Self {
        self.extends = Some(superclass.into());
        self
    }

    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Top-level attributes declared on this entity (not inherited).
    pub fn attributes(&self) -> &[AttributeId] {
        &self.attributes
    }
}
