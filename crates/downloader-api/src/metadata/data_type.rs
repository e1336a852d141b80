use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Data type of an attribute.
///
/// [`DataType::Compound`] is structural only: a compound attribute groups
/// child attributes and never carries a value of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    /// Short string
    String,
    /// Long text
    Text,
    /// Script source
    Script,
    /// HTML fragment
    Html,
    /// One of a fixed set of options
    Enum,
    /// Boolean
    Bool,
    /// 32-bit integer
    Int,
    /// 64-bit integer
    Long,
    /// Floating point number
    Decimal,
    /// Calendar date
    Date,
    /// Instant in time
    DateTime,
    /// E-mail address
    Email,
    /// URL
    Hyperlink,
    /// Single reference to another entity
    Xref,
    /// Single reference rendered as a category
    Categorical,
    /// Multiple references to another entity
    Mref,
    /// Multiple references rendered as categories
    CategoricalMref,
    /// Uploaded file
    File,
    /// Group of child attributes
    Compound,
}

impl DataType {
    /// All data types in declaration order.
    pub const ALL: [DataType; 19] = [
        DataType::String,
        DataType::Text,
        DataType::Script,
        DataType::Html,
        DataType::Enum,
        DataType::Bool,
        DataType::Int,
        DataType::Long,
        DataType::Decimal,
        DataType::Date,
        DataType::DateTime,
        DataType::Email,
        DataType::Hyperlink,
        DataType::Xref,
        DataType::Categorical,
        DataType::Mref,
        DataType::CategoricalMref,
        DataType::File,
        DataType::Compound,
    ];

    /// Name used in EMX metadata sheets.
    pub fn emx_name(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Text => "text",
            DataType::Script => "script",
            DataType::Html => "html",
            DataType::Enum => "enum",
            DataType::Bool => "bool",
            DataType::Int => "int",
            DataType::Long => "long",
            DataType::Decimal => "decimal",
            DataType::Date => "date",
            DataType::DateTime => "datetime",
            DataType::Email => "email",
            DataType::Hyperlink => "hyperlink",
            DataType::Xref => "xref",
            DataType::Categorical => "categorical",
            DataType::Mref => "mref",
            DataType::CategoricalMref => "categorical_mref",
            DataType::File => "file",
            DataType::Compound => "compound",
        }
    }

    /// `true` for the structural compound type.
    pub fn is_compound(&self) -> bool {
        matches!(self, DataType::Compound)
    }

    /// `true` for types whose value points at another entity.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            DataType::Xref
                | DataType::Categorical
                | DataType::Mref
                | DataType::CategoricalMref
                | DataType::File
        )
    }

    /// `true` for types whose textual value is a comma-separated id list.
    pub fn is_multi_valued(&self) -> bool {
        matches!(self, DataType::Mref | DataType::CategoricalMref)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.emx_name())
    }
}

impl FromStr for DataType {
    type Err = String;

    /// Accepts EMX names case-insensitively, with or without underscores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        DataType::ALL
            .iter()
            .find(|dt| dt.emx_name().replace('_', "") == normalized)
            .copied()
            .ok_or_else(|| format!("Unknown data type: {s}"))
    }
}
