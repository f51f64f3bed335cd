//! Features of a class: fields, references and collections.

use super::keys;
use super::properties::{impl_definition, Definition, Properties, PropertyOverrides};
use super::ClassId;
use std::fmt;

/// Kind of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureKind {
    /// A persistent field (one column).
    Field,
    /// A 1:1 reference to another persistent class.
    Reference,
    /// A 1:n or m:n collection of another persistent class.
    Collection,
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKind::Field => write!(f, "field"),
            FeatureKind::Reference => write!(f, "reference"),
            FeatureKind::Collection => write!(f, "collection"),
        }
    }
}

/// How a feature came to be part of its class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureOrigin {
    /// Declared in the class itself (or pulled up as a virtual field).
    #[default]
    Declared,
    /// Cloned from a base type.
    Inherited,
    /// Cloned from a nested object type.
    Nested,
}

/// Handle of a feature: owning class, kind and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureRef {
    /// Class that owns the feature.
    pub class: ClassId,
    /// Kind of the feature.
    pub kind: FeatureKind,
    /// Feature name.
    pub name: String,
}

/// A field, reference or collection of a class.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureDef {
    name: String,
    kind: FeatureKind,
    properties: Properties,
    owner: Option<ClassId>,
    origin: FeatureOrigin,
    anonymous: bool,
    original: Option<FeatureRef>,
}

impl_definition!(FeatureDef);

impl FeatureDef {
    /// Create a feature of the given kind.
    pub fn new(kind: FeatureKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            properties: Properties::new(),
            owner: None,
            origin: FeatureOrigin::Declared,
            anonymous: false,
            original: None,
        }
    }

    /// Create a field.
    pub fn field(name: impl Into<String>) -> Self {
        Self::new(FeatureKind::Field, name)
    }

    /// Create an anonymous field (declared at class level without a member).
    pub fn anonymous_field(name: impl Into<String>) -> Self {
        let mut field = Self::field(name);
        field.anonymous = true;
        field.properties.set(keys::ACCESS, keys::ACCESS_ANONYMOUS);
        field
    }

    /// Create a reference.
    pub fn reference(name: impl Into<String>) -> Self {
        Self::new(FeatureKind::Reference, name)
    }

    /// Create an anonymous reference, e.g. the `super` reference.
    pub fn anonymous_reference(name: impl Into<String>) -> Self {
        let mut reference = Self::reference(name);
        reference.anonymous = true;
        reference
    }

    /// Create a collection.
    pub fn collection(name: impl Into<String>) -> Self {
        Self::new(FeatureKind::Collection, name)
    }

    /// Set a property (builder style).
    pub fn with_property(mut self, key: &str, value: impl Into<String>) -> Self {
        self.properties.set(key, value);
        self
    }

    /// Mark as primary key (builder style).
    pub fn primary_key(self) -> Self {
        self.with_property(keys::PRIMARYKEY, "true")
    }

    /// Kind of this feature.
    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    /// Owning class, once added to a class that is part of a model.
    pub fn owner(&self) -> Option<ClassId> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: ClassId) {
        self.owner = Some(owner);
    }

    /// How the feature came to be part of its class.
    pub fn origin(&self) -> FeatureOrigin {
        self.origin
    }

    /// Check if the feature was cloned from a base type.
    pub fn is_inherited(&self) -> bool {
        self.origin == FeatureOrigin::Inherited
    }

    /// Check if the feature was cloned from a nested object type.
    pub fn is_nested(&self) -> bool {
        self.origin == FeatureOrigin::Nested
    }

    /// Check if the feature has no corresponding member in the source.
    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    /// The feature this one was cloned from.
    pub fn original(&self) -> Option<&FeatureRef> {
        self.original.as_ref()
    }

    /// Check if this is the anonymous reference to the super class.
    pub fn is_super_reference(&self) -> bool {
        self.kind == FeatureKind::Reference && self.anonymous && self.name == keys::SUPER_REFERENCE
    }

    /// Check if the feature is ignored in its class.
    pub fn is_ignored(&self) -> bool {
        self.boolean_property(keys::IGNORE, false)
    }

    /// Check if the field is (part of) the primary key.
    pub fn is_primary_key(&self) -> bool {
        self.boolean_property(keys::PRIMARYKEY, false)
    }

    /// Check if the collection uses an indirection table (m:n).
    pub fn has_indirection_table(&self) -> bool {
        self.has_property(keys::INDIRECTION_TABLE)
    }

    /// Size constraint of a field column: the length, or `precision,scale`.
    pub fn size_constraint(&self) -> Option<String> {
        if let Some(length) = self.property(keys::LENGTH) {
            return Some(length.to_string());
        }
        let precision = self.property(keys::PRECISION);
        let scale = self.property(keys::SCALE);
        if precision.is_none() && scale.is_none() {
            return None;
        }
        Some(format!(
            "{},{}",
            precision.unwrap_or("1"),
            scale.unwrap_or("0")
        ))
    }

    /// Clone `source` into the class `owner`.
    ///
    /// The clone gets `prefix` prepended to its name, loses its class-local
    /// `ignore` setting and then receives `overrides`. References also get
    /// their foreign key list prefixed, since it names sibling fields.
    pub fn clone_with_overrides(
        source: &FeatureDef,
        source_ref: FeatureRef,
        owner: ClassId,
        prefix: Option<&str>,
        overrides: Option<&PropertyOverrides>,
    ) -> FeatureDef {
        let prefix = prefix.unwrap_or_default();
        let mut copy = FeatureDef {
            name: format!("{}{}", prefix, source.name),
            kind: source.kind,
            properties: source.properties.clone(),
            owner: Some(owner),
            origin: FeatureOrigin::Declared,
            anonymous: source.anonymous,
            original: Some(source_ref),
        };

        if !prefix.is_empty() && copy.kind == FeatureKind::Reference {
            let prefixed: Vec<String> = keys::comma_list(copy.property(keys::FOREIGNKEY))
                .map(|key| format!("{}{}", prefix, key))
                .collect();
            copy.properties.set(keys::FOREIGNKEY, prefixed.join(","));
        }

        copy.properties.remove(keys::IGNORE);
        if let Some(overrides) = overrides {
            copy.properties.apply(overrides);
        }
        copy
    }

    /// Clone a field so it can be pulled up into another class as a declared feature.
    pub(crate) fn clone_declared(source: &FeatureDef, source_ref: FeatureRef, owner: ClassId) -> Self {
        let mut copy = Self::clone_with_overrides(source, source_ref, owner, None, None);
        if source.is_ignored() {
            copy.properties.set(keys::IGNORE, "true");
        }
        copy
    }

    pub(crate) fn set_origin(&mut self, origin: FeatureOrigin) {
        self.origin = origin;
    }
}

/// A nested object: its type's features are copied into the owning class.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedDef {
    name: String,
    properties: Properties,
    type_name: String,
    nested_type: Option<ClassId>,
}

impl_definition!(NestedDef);

impl NestedDef {
    /// Create a nested object declaration of the given type.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Properties::new(),
            type_name: type_name.into(),
            nested_type: None,
        }
    }

    /// Declared type name of the nested object.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Resolved nested type (after hierarchy resolution).
    pub fn nested_type(&self) -> Option<ClassId> {
        self.nested_type
    }

    pub(crate) fn set_nested_type(&mut self, id: ClassId) {
        self.nested_type = Some(id);
    }

    /// Prefix used for the names of copied features.
    pub fn prefix(&self) -> String {
        format!("{}::", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_ref(name: &str) -> FeatureRef {
        FeatureRef {
            class: ClassId(0),
            kind: FeatureKind::Field,
            name: name.into(),
        }
    }

    #[test]
    fn test_field_builder() {
        let field = FeatureDef::field("id")
            .primary_key()
            .with_property(keys::JDBC_TYPE, "INTEGER");

        assert_eq!(field.kind(), FeatureKind::Field);
        assert!(field.is_primary_key());
        assert!(!field.is_anonymous());
        assert_eq!(field.property(keys::JDBC_TYPE), Some("INTEGER"));
    }

    #[test]
    fn test_anonymous_field_access() {
        let field = FeatureDef::anonymous_field("ojbConcreteClass");
        assert!(field.is_anonymous());
        assert_eq!(field.property(keys::ACCESS), Some(keys::ACCESS_ANONYMOUS));
    }

    #[test]
    fn test_clone_drops_ignore_and_applies_overrides() {
        let source = FeatureDef::field("name")
            .with_property(keys::IGNORE, "true")
            .with_property(keys::LENGTH, "20");
        let mut overrides = PropertyOverrides::new();
        overrides.insert(keys::LENGTH.into(), "40".into());

        let copy = FeatureDef::clone_with_overrides(
            &source,
            source_ref("name"),
            ClassId(1),
            None,
            Some(&overrides),
        );

        assert!(!copy.is_ignored());
        assert_eq!(copy.property(keys::LENGTH), Some("40"));
        assert_eq!(copy.owner(), Some(ClassId(1)));
        assert_eq!(copy.original().map(|r| r.name.as_str()), Some("name"));
    }

    #[test]
    fn test_nested_clone_prefixes_reference_foreignkeys() {
        let source = FeatureDef::reference("country").with_property(keys::FOREIGNKEY, "countryId, region");
        let copy = FeatureDef::clone_with_overrides(
            &source,
            FeatureRef {
                class: ClassId(0),
                kind: FeatureKind::Reference,
                name: "country".into(),
            },
            ClassId(2),
            Some("address::"),
            None,
        );

        assert_eq!(copy.name(), "address::country");
        assert_eq!(
            copy.property(keys::FOREIGNKEY),
            Some("address::countryId,address::region")
        );
    }

    #[test]
    fn test_size_constraint() {
        let varchar = FeatureDef::field("name").with_property(keys::LENGTH, "254");
        assert_eq!(varchar.size_constraint().as_deref(), Some("254"));

        let decimal = FeatureDef::field("amount").with_property(keys::SCALE, "2");
        assert_eq!(decimal.size_constraint().as_deref(), Some("1,2"));

        assert!(FeatureDef::field("flag").size_constraint().is_none());
    }
}
