use serde::{Deserialize, Serialize};

/// Relation that marks a tag as the predicate to use for graph output.
pub const IS_ASSOCIATED_WITH: &str = "http://molgenis.org#isAssociatedWith";

/// Semantic annotation: a relation IRI pointing at an object IRI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    /// Tag identifier
    pub id: String,
    /// Human readable label
    pub label: Option<String>,
    /// IRI of the annotated concept
    pub object_iri: String,
    /// IRI of the relation
    pub relation_iri: String,
    /// Label of the relation
    pub relation_label: Option<String>,
    /// Code system the object belongs to
    pub code_system: Option<String>,
}

impl Tag {
    pub fn new(
        id: impl Into<String>,
        relation_iri: impl Into<String>,
        object_iri: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: None,
            object_iri: object_iri.into(),
            relation_iri: relation_iri.into(),
            relation_label: None,
            code_system: None,
        }
    }

    /// Tag whose relation is [`IS_ASSOCIATED_WITH`].
    pub fn associated_with(id: impl Into<String>, object_iri: impl Into<String>) -> Self {
        Self::new(id, IS_ASSOCIATED_WITH, object_iri).with_relation_label("isAssociatedWith")
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_relation_label(mut self, label: impl Into<String>) -> Self {
        self.relation_label = Some(label.into());
        self
    }

    pub fn with_code_system(mut self, code_system: impl Into<String>) -> Self {
        self.code_system = Some(code_system.into());
        self
    }

    /// Whether this tag selects a graph predicate.
    pub fn is_associated_with(&self) -> bool {
        self.relation_iri == IS_ASSOCIATED_WITH
    }
}

/// Language used for localized labels and descriptions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Language {
    /// ISO code, e.g. `en`
    pub code: String,
    /// Display name
    pub name: String,
}

impl Language {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Namespace grouping entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Fully qualified package name
    pub id: String,
    /// Label
    pub label: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Enclosing package
    pub parent: Option<String>,
    /// Annotations
    pub tags: Vec<Tag>,
}

impl Package {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            description: None,
            parent: None,
            tags: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }
}
