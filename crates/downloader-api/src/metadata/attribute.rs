use super::data_type::DataType;
use super::tag::Tag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable handle of an attribute inside a [`MetadataRepository`](super::MetadataRepository).
///
/// Handles are only minted by the repository that owns the attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeId(pub(crate) usize);

impl AttributeId {
    /// Position in the owning repository's attribute arena.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Boolean properties of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeFlags {
    /// Value identifies the entity instance
    pub id_attribute: bool,
    /// Used for lookups in reference pickers
    pub lookup_attribute: bool,
    /// May be empty
    pub nillable: bool,
    /// Generated by the server
    pub auto: bool,
    /// Shown in the user interface
    pub visible: bool,
    /// Cannot be edited
    pub read_only: bool,
    /// Values are unique across instances
    pub unique: bool,
    /// Can be aggregated
    pub aggregateable: bool,
    /// Used as the instance label
    pub label_attribute: bool,
}

impl Default for AttributeFlags {
    fn default() -> Self {
        Self {
            id_attribute: false,
            lookup_attribute: false,
            nillable: false,
            auto: false,
            visible: true,
            read_only: false,
            unique: false,
            aggregateable: false,
            label_attribute: false,
        }
    }
}

/// Field definition of an entity.
///
/// Attributes of one entity form a tree: compound attributes list their
/// children in `parts`, each child points back through `compound`. Those
/// links are managed by the repository and exposed read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Identifier
    pub id: String,
    /// Name, unique within the owning entity
    pub name: String,
    /// Data type
    pub data_type: DataType,
    /// Key of the referenced entity for relational types
    pub ref_entity: Option<String>,
    /// Boolean properties
    pub flags: AttributeFlags,
    /// Default label
    pub label: Option<String>,
    /// Default description
    pub description: Option<String>,
    /// Labels by language code
    pub labels: BTreeMap<String, String>,
    /// Descriptions by language code
    pub descriptions: BTreeMap<String, String>,
    /// Comma-separated options of an enum attribute
    pub enum_options: Option<String>,
    /// Computed value expression
    pub expression: Option<String>,
    /// Visibility expression
    pub visible_expression: Option<String>,
    /// Validation expression
    pub validation_expression: Option<String>,
    /// Default value
    pub default_value: Option<String>,
    /// Sort order of a one-to-many attribute
    pub order_by: Option<String>,
    /// Name of the attribute on the other side of a one-to-many relation
    pub mapped_by: Option<String>,
    /// Lower bound for numeric attributes
    pub range_min: Option<i64>,
    /// Upper bound for numeric attributes
    pub range_max: Option<i64>,
    /// Semantic annotations
    pub tags: Vec<Tag>,
    pub(crate) entity: String,
    pub(crate) parts: Vec<AttributeId>,
    pub(crate) compound: Option<AttributeId>,
}

impl Attribute {
    /// Create a STRING attribute whose id equals its name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            data_type: DataType::String,
            ref_entity: None,
            flags: AttributeFlags::default(),
            label: None,
            description: None,
            labels: BTreeMap::new(),
            descriptions: BTreeMap::new(),
            enum_options: None,
            expression: None,
            visible_expression: None,
            validation_expression: None,
            default_value: None,
            order_by: None,
            mapped_by: None,
            range_min: None,
            range_max: None,
            tags: Vec::new(),
            entity: String::new(),
            parts: Vec::new(),
            compound: None,
        }
    }

    /// Create an attribute of the given type.
    pub fn of_type(name: impl Into<String>, data_type: DataType) -> Self {
        Self::new(name).with_type(data_type)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn with_ref_entity(mut self, entity: impl Into<String>) -> Self {
        self.ref_entity = Some(entity.into());
        self
    }

    pub fn with_flags(mut self, flags: AttributeFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Mark as the id attribute of its entity.
    pub fn id_attribute(mut self) -> Self {
        self.flags.id_attribute = true;
        self
    }

    pub fn nillable(mut self, nillable: bool) -> Self {
        self.flags.nillable = nillable;
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

    pub fn with_enum_options(mut self, options: impl Into<String>) -> Self {
        self.enum_options = Some(options.into());
        self
    }

    pub fn with_range(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.range_min = min;
        self.range_max = max;
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Key of the entity that owns this attribute.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Children of a compound attribute, in declared order.
    pub fn parts(&self) -> &[AttributeId] {
        &self.parts
    }

    /// Enclosing compound attribute, if any.
    pub fn compound(&self) -> Option<AttributeId> {
        self.compound
    }

    /// Tags whose relation selects a graph predicate.
    pub fn associated_tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter().filter(|tag| tag.is_associated_with())
    }
}
