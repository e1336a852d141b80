use thiserror::Error;

/// Errors raised by an implementation of [`MolgenisClient`](crate::MolgenisClient).
#[derive(Error, Debug)]
pub enum ClientError {
    /// Credentials were rejected by the server
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The requested entity does not exist on the server
    #[error("entity: {0} does not exist")]
    NotFound(String),

    /// The server answered with something that is not a valid payload
    #[error("Could not decode response for {0}: {1}")]
    Decode(String, String),

    /// Network or protocol failure
    #[error("Transport error: {message}")]
    Transport {
        /// What the client was doing
        message: String,
        /// Underlying cause
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Schema delivered by the server could not be assembled
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

impl ClientError {
    /// Create a transport error from a message and optional source.
    pub fn transport<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }
}

/// Errors raised while building or querying a [`MetadataRepository`](crate::MetadataRepository).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    /// A requested entity depends on an entity that is not part of the schema
    #[error("Incomplete metadata: entity '{entity}' references '{missing}' which is not available")]
    IncompleteMetadata {
        /// Entity holding the reference
        entity: String,
        /// Referenced entity that could not be found
        missing: String,
    },

    /// No entity with the given key
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    /// Attempt to nest an attribute below a non-compound attribute
    #[error("Attribute '{0}' is not a compound attribute")]
    NotCompound(String),

    /// Attribute name already used within the entity
    #[error("Attribute '{attribute}' is declared twice in entity '{entity}'")]
    DuplicateAttribute {
        /// Owning entity
        entity: String,
        /// Duplicated attribute name
        attribute: String,
    },

    /// Entity does not have exactly one id attribute
    #[error("Entity '{entity}' has {count} id attributes, expected exactly one")]
    IdAttribute {
        /// Offending entity
        entity: String,
        /// Number of id attributes found
        count: usize,
    },

    /// Superclass chain loops back on itself
    #[error("Entity '{0}' has a cyclic superclass chain")]
    CyclicInheritance(String),

    /// Attribute arena does not form one tree per entity: an id is out of
    /// range, a node is reached twice, or a parent link disagrees
    #[error("Corrupt attribute tree in entity '{entity}': {reason}")]
    CorruptAttributeTree {
        /// Entity whose tree is broken
        entity: String,
        /// What was found
        reason: String,
    },

    /// Version string is not of the form `major.minor.patch`
    #[error("Invalid version string: '{0}'")]
    InvalidVersion(String),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type for metadata operations
pub type MetadataResult<T> = Result<T, MetadataError>;
