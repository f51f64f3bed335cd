//! Class-level descriptors: indices, object cache, stored procedures.

use super::keys;
use super::properties::{impl_definition, Definition, Properties};

/// An index over fields of a class.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDescriptorDef {
    name: String,
    properties: Properties,
}

impl_definition!(IndexDescriptorDef);

impl IndexDescriptorDef {
    /// Create an index over a comma-separated list of field names.
    pub fn new(name: impl Into<String>, fields: impl Into<String>) -> Self {
        let mut properties = Properties::new();
        properties.set(keys::FIELDS, fields);
        Self {
            name: name.into(),
            properties,
        }
    }

    /// Mark the index as unique.
    pub fn unique(mut self) -> Self {
        self.properties.set(keys::UNIQUE, "true");
        self
    }

    /// Check if the index is unique.
    pub fn is_unique(&self) -> bool {
        self.boolean_property(keys::UNIQUE, false)
    }

    /// Names of the indexed fields.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        keys::comma_list(self.property(keys::FIELDS))
    }
}

/// Object cache of a class.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectCacheDef {
    name: String,
    properties: Properties,
}

impl_definition!(ObjectCacheDef);

impl ObjectCacheDef {
    /// Create an object cache implemented by `class_name`.
    pub fn new(class_name: impl Into<String>) -> Self {
        let class_name = class_name.into();
        let mut properties = Properties::new();
        properties.set(keys::CLASS, class_name.clone());
        Self {
            name: class_name,
            properties,
        }
    }

    /// Implementing class.
    pub fn class_name(&self) -> &str {
        self.property(keys::CLASS).unwrap_or(&self.name)
    }
}

/// Kinds of stored procedures a class can declare.
pub const PROCEDURE_KINDS: [&str; 3] = ["insert", "update", "delete"];

/// A stored procedure used for `insert`, `update` or `delete`.
///
/// The definition name is the procedure kind; the procedure's own name is the
/// `name` property.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureDef {
    name: String,
    properties: Properties,
}

impl_definition!(ProcedureDef);

impl ProcedureDef {
    /// Create a procedure of the given kind.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            name: kind.into(),
            properties: Properties::new(),
        }
    }

    /// Set a property (builder style).
    pub fn with_property(mut self, key: &str, value: impl Into<String>) -> Self {
        self.properties.set(key, value);
        self
    }

    /// Procedure kind (`insert`, `update` or `delete`).
    pub fn kind(&self) -> &str {
        &self.name
    }

    /// Database name of the procedure.
    pub fn procedure_name(&self) -> Option<&str> {
        self.property(keys::NAME)
    }

    /// Names of the arguments passed to the procedure.
    pub fn argument_names(&self) -> impl Iterator<Item = &str> {
        keys::comma_list(self.property(keys::ARGUMENTS))
    }
}

/// An argument of a stored procedure.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureArgumentDef {
    name: String,
    properties: Properties,
}

impl_definition!(ProcedureArgumentDef);

impl ProcedureArgumentDef {
    /// Create an argument whose value is taken from a field at runtime.
    pub fn runtime(name: impl Into<String>, field_ref: impl Into<String>) -> Self {
        let mut properties = Properties::new();
        properties.set(keys::TYPE, keys::ARGUMENT_TYPE_RUNTIME);
        properties.set(keys::FIELD_REF, field_ref);
        Self {
            name: name.into(),
            properties,
        }
    }

    /// Create an argument with a constant value.
    pub fn constant(name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut properties = Properties::new();
        properties.set(keys::TYPE, "constant");
        properties.set(keys::VALUE, value);
        Self {
            name: name.into(),
            properties,
        }
    }

    /// Create an argument from raw properties.
    pub fn with_properties(name: impl Into<String>, properties: Properties) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }

    /// Check if the value comes from a field at runtime.
    pub fn is_runtime(&self) -> bool {
        self.property(keys::TYPE) == Some(keys::ARGUMENT_TYPE_RUNTIME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_fields() {
        let index = IndexDescriptorDef::new("name_idx", "lastName, firstName").unique();
        let fields: Vec<_> = index.field_names().collect();
        assert_eq!(fields, vec!["lastName", "firstName"]);
        assert!(index.is_unique());
    }

    #[test]
    fn test_procedure() {
        let proc = ProcedureDef::new("insert")
            .with_property(keys::NAME, "insert_person")
            .with_property(keys::ARGUMENTS, "arg1,arg2");
        assert_eq!(proc.kind(), "insert");
        assert_eq!(proc.procedure_name(), Some("insert_person"));
        assert_eq!(proc.argument_names().count(), 2);
    }

    #[test]
    fn test_procedure_arguments() {
        assert!(ProcedureArgumentDef::runtime("arg1", "id").is_runtime());
        assert!(!ProcedureArgumentDef::constant("arg2", "42").is_runtime());
    }

    #[test]
    fn test_object_cache_class() {
        let cache = ObjectCacheDef::new("org.apache.ojb.broker.cache.ObjectCacheEmptyImpl");
        assert_eq!(
            cache.class_name(),
            "org.apache.ojb.broker.cache.ObjectCacheEmptyImpl"
        );
    }
}
