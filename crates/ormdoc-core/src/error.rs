//! Core error types.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Hard failures raised while building, processing or checking a model.
#[derive(Debug, Error)]
pub enum Error {
    /// A model constraint is violated. The message is meant to be shown verbatim.
    #[error("{0}")]
    Constraint(String),

    /// The inheritance or nesting graph contains a cycle.
    #[error("cyclic class hierarchy: {}", path.join(" -> "))]
    CyclicHierarchy {
        /// Classes on the cycle, starting and ending with the same class.
        path: Vec<String>,
    },

    /// A class with the same qualified name is already part of the model.
    #[error("class {0} is already defined in the model")]
    DuplicateClass(String),

    /// The operation needs a model that passed the constraint checks.
    #[error("the model has not been checked yet")]
    NotChecked,

    /// The model descriptor is malformed.
    #[error("invalid model descriptor: {0}")]
    Descriptor(String),

    /// Reading a descriptor failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a constraint violation.
    pub fn constraint(message: impl Into<String>) -> Self {
        Error::Constraint(message.into())
    }

    /// Check if this is a constraint violation.
    pub fn is_constraint(&self) -> bool {
        matches!(self, Error::Constraint(_))
    }
}

/// Failure of an external type lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeLookupError {
    /// The type is unknown to the configured type information.
    #[error("class {0} not found")]
    NotFound(String),

    /// No type information is configured at all.
    #[error("no type information available")]
    Unavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_message_is_verbatim() {
        let err = Error::constraint("The class A has no primary key");
        assert_eq!(err.to_string(), "The class A has no primary key");
        assert!(err.is_constraint());
    }

    #[test]
    fn test_cycle_message() {
        let err = Error::CyclicHierarchy {
            path: vec!["a.A".into(), "a.B".into(), "a.A".into()],
        };
        assert_eq!(err.to_string(), "cyclic class hierarchy: a.A -> a.B -> a.A");
        assert!(!err.is_constraint());
    }
}
