//! Persistent class definitions.

use super::descriptors::{IndexDescriptorDef, ObjectCacheDef, ProcedureArgumentDef, ProcedureDef};
use super::feature::{FeatureDef, FeatureKind, NestedDef};
use super::keys;
use super::properties::{impl_definition, Definition, Properties, PropertyOverrides};
use super::ClassId;
use std::collections::BTreeMap;

/// Normalize a class name for lookup (`$` of inner classes becomes `.`).
pub fn qualified_name(name: &str) -> String {
    name.replace('$', ".")
}

/// A class of the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    name: String,
    properties: Properties,
    id: Option<ClassId>,
    supertypes: Vec<String>,
    base_types: Vec<ClassId>,
    extent_names: Vec<String>,
    extents: Vec<ClassId>,
    pub(crate) fields: Vec<FeatureDef>,
    pub(crate) references: Vec<FeatureDef>,
    pub(crate) collections: Vec<FeatureDef>,
    nested: Vec<NestedDef>,
    modifications: BTreeMap<String, PropertyOverrides>,
    index_descriptors: Vec<IndexDescriptorDef>,
    object_cache: Option<ObjectCacheDef>,
    procedures: BTreeMap<String, ProcedureDef>,
    procedure_arguments: BTreeMap<String, ProcedureArgumentDef>,
    processed: bool,
}

impl_definition!(ClassDef);

impl ClassDef {
    /// Create a class definition. `name` may use `$` for inner classes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Properties::new(),
            id: None,
            supertypes: Vec::new(),
            base_types: Vec::new(),
            extent_names: Vec::new(),
            extents: Vec::new(),
            fields: Vec::new(),
            references: Vec::new(),
            collections: Vec::new(),
            nested: Vec::new(),
            modifications: BTreeMap::new(),
            index_descriptors: Vec::new(),
            object_cache: None,
            procedures: BTreeMap::new(),
            procedure_arguments: BTreeMap::new(),
            processed: false,
        }
    }

    /// Create a persistent class.
    pub fn persistent(name: impl Into<String>) -> Self {
        Self::new(name).with_property(keys::OJB_PERSISTENT, "true")
    }

    /// Set a property (builder style).
    pub fn with_property(mut self, key: &str, value: impl Into<String>) -> Self {
        self.properties.set(key, value);
        self
    }

    /// Add a direct supertype (class or interface) as declared in the source.
    pub fn with_supertype(mut self, name: impl Into<String>) -> Self {
        self.supertypes.push(name.into());
        self
    }

    /// Add an explicit extent class.
    pub fn with_extent(mut self, name: impl Into<String>) -> Self {
        self.extent_names.push(name.into());
        self
    }

    /// Add a feature (builder style).
    pub fn with_feature(mut self, feature: FeatureDef) -> Self {
        self.add_feature(feature);
        self
    }

    /// Add several features.
    pub fn with_features(mut self, features: impl IntoIterator<Item = FeatureDef>) -> Self {
        for feature in features {
            self.add_feature(feature);
        }
        self
    }

    /// Add a nested object.
    pub fn with_nested(mut self, nested: NestedDef) -> Self {
        self.nested.push(nested);
        self
    }

    /// Register a modification of an inherited or nested feature.
    pub fn with_modification(
        mut self,
        feature: impl Into<String>,
        overrides: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        let entry = self.modifications.entry(feature.into()).or_default();
        for (key, value) in overrides {
            entry.insert(key.into(), value.into());
        }
        self
    }

    /// Add an index descriptor.
    pub fn with_index(mut self, index: IndexDescriptorDef) -> Self {
        self.index_descriptors.push(index);
        self
    }

    /// Set the object cache.
    pub fn with_object_cache(mut self, cache: ObjectCacheDef) -> Self {
        self.object_cache = Some(cache);
        self
    }

    /// Add a stored procedure (replaces one of the same kind).
    pub fn with_procedure(mut self, procedure: ProcedureDef) -> Self {
        self.procedures.insert(procedure.kind().to_string(), procedure);
        self
    }

    /// Add a procedure argument.
    pub fn with_procedure_argument(mut self, argument: ProcedureArgumentDef) -> Self {
        self.procedure_arguments
            .insert(argument.name().to_string(), argument);
        self
    }

    /// Add a feature to the list of its kind.
    pub fn add_feature(&mut self, mut feature: FeatureDef) {
        if let Some(id) = self.id {
            feature.set_owner(id);
        }
        self.features_mut(feature.kind()).push(feature);
    }

    /// Handle of this class, once added to a model.
    pub fn id(&self) -> Option<ClassId> {
        self.id
    }

    pub(crate) fn attach(&mut self, id: ClassId) {
        self.id = Some(id);
        for kind in [FeatureKind::Field, FeatureKind::Reference, FeatureKind::Collection] {
            for feature in self.features_mut(kind) {
                feature.set_owner(id);
            }
        }
    }

    /// Qualified name (`$` replaced by `.`).
    pub fn qualified_name(&self) -> String {
        qualified_name(&self.name)
    }

    /// Default table name: the unqualified class name.
    pub fn default_table_name(&self) -> &str {
        let cut = self.name.rfind(['.', '$']).map(|pos| pos + 1).unwrap_or(0);
        &self.name[cut..]
    }

    /// Check if the class is persistent.
    pub fn is_persistent(&self) -> bool {
        self.boolean_property(keys::OJB_PERSISTENT, false)
    }

    /// Check if the class is abstract or an interface.
    pub fn is_abstract(&self) -> bool {
        self.boolean_property(keys::IS_ABSTRACT, false)
    }

    /// Check if repository info is generated for this class.
    pub fn generates_repository_info(&self) -> bool {
        self.boolean_property(keys::GENERATE_REPOSITORY_INFO, true)
    }

    /// Check if table info is generated for this class.
    pub fn generates_table_info(&self) -> bool {
        self.boolean_property(keys::GENERATE_TABLE_INFO, true)
    }

    /// Direct supertypes as declared in the source.
    pub fn supertypes(&self) -> &[String] {
        &self.supertypes
    }

    /// Direct base types that are part of the model.
    pub fn base_types(&self) -> &[ClassId] {
        &self.base_types
    }

    pub(crate) fn set_base_types(&mut self, bases: Vec<ClassId>) {
        self.base_types = bases;
    }

    /// Explicitly declared extent class names.
    pub fn extent_names(&self) -> &[String] {
        &self.extent_names
    }

    /// Direct extent classes (subtypes).
    pub fn extents(&self) -> &[ClassId] {
        &self.extents
    }

    pub(crate) fn add_extent(&mut self, id: ClassId) {
        if !self.extents.contains(&id) {
            self.extents.push(id);
        }
    }

    pub(crate) fn set_extents(&mut self, extents: Vec<ClassId>) {
        self.extents = extents;
    }

    /// Features of the given kind, in order.
    pub fn features(&self, kind: FeatureKind) -> &[FeatureDef] {
        match kind {
            FeatureKind::Field => &self.fields,
            FeatureKind::Reference => &self.references,
            FeatureKind::Collection => &self.collections,
        }
    }

    pub(crate) fn features_mut(&mut self, kind: FeatureKind) -> &mut Vec<FeatureDef> {
        match kind {
            FeatureKind::Field => &mut self.fields,
            FeatureKind::Reference => &mut self.references,
            FeatureKind::Collection => &mut self.collections,
        }
    }

    /// Fields in order.
    pub fn fields(&self) -> &[FeatureDef] {
        &self.fields
    }

    /// References in order.
    pub fn references(&self) -> &[FeatureDef] {
        &self.references
    }

    /// Collections in order.
    pub fn collections(&self) -> &[FeatureDef] {
        &self.collections
    }

    /// Get a field by name.
    pub fn field(&self, name: &str) -> Option<&FeatureDef> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Get a field by name, mutably.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut FeatureDef> {
        self.fields.iter_mut().find(|f| f.name() == name)
    }

    /// Get a reference by name.
    pub fn reference(&self, name: &str) -> Option<&FeatureDef> {
        self.references.iter().find(|f| f.name() == name)
    }

    /// Get a collection by name.
    pub fn collection(&self, name: &str) -> Option<&FeatureDef> {
        self.collections.iter().find(|f| f.name() == name)
    }

    /// Get a feature of the given kind by name.
    pub fn feature_of_kind(&self, kind: FeatureKind, name: &str) -> Option<&FeatureDef> {
        self.features(kind).iter().find(|f| f.name() == name)
    }

    /// Get a feature of the given kind by name, mutably.
    pub fn feature_of_kind_mut(&mut self, kind: FeatureKind, name: &str) -> Option<&mut FeatureDef> {
        self.features_mut(kind).iter_mut().find(|f| f.name() == name)
    }

    /// Get any feature by name (fields, references and collections share one namespace).
    pub fn feature(&self, name: &str) -> Option<&FeatureDef> {
        self.field(name)
            .or_else(|| self.reference(name))
            .or_else(|| self.collection(name))
    }

    /// Fields forming the primary key, in field order. Ignored fields are skipped.
    pub fn primary_keys(&self) -> Vec<&FeatureDef> {
        self.fields
            .iter()
            .filter(|f| f.is_primary_key() && !f.is_ignored())
            .collect()
    }

    /// Resolve a comma-separated list of field names.
    ///
    /// Returns the first name that is not a field of this class as error.
    pub fn fields_by_names(&self, names: Option<&str>) -> Result<Vec<&FeatureDef>, String> {
        keys::comma_list(names)
            .map(|name| self.field(name).ok_or_else(|| name.to_string()))
            .collect()
    }

    /// Nested object declarations.
    pub fn nested(&self) -> &[NestedDef] {
        &self.nested
    }

    pub(crate) fn nested_mut(&mut self) -> &mut [NestedDef] {
        &mut self.nested
    }

    /// Names of all modified features.
    pub fn modification_names(&self) -> impl Iterator<Item = &str> {
        self.modifications.keys().map(String::as_str)
    }

    /// Modification registered for a feature.
    pub fn modification(&self, feature: &str) -> Option<&PropertyOverrides> {
        self.modifications.get(feature)
    }

    /// Index descriptors.
    pub fn index_descriptors(&self) -> &[IndexDescriptorDef] {
        &self.index_descriptors
    }

    /// Object cache, if any.
    pub fn object_cache(&self) -> Option<&ObjectCacheDef> {
        self.object_cache.as_ref()
    }

    /// Stored procedures keyed by kind.
    pub fn procedures(&self) -> impl Iterator<Item = &ProcedureDef> {
        self.procedures.values()
    }

    /// Procedure of the given kind.
    pub fn procedure(&self, kind: &str) -> Option<&ProcedureDef> {
        self.procedures.get(kind)
    }

    /// Procedure arguments in name order.
    pub fn procedure_arguments(&self) -> impl Iterator<Item = &ProcedureArgumentDef> {
        self.procedure_arguments.values()
    }

    /// Procedure argument by name.
    pub fn procedure_argument(&self, name: &str) -> Option<&ProcedureArgumentDef> {
        self.procedure_arguments.get(name)
    }

    /// Check if the class has been flattened.
    pub fn has_been_processed(&self) -> bool {
        self.processed
    }

    pub(crate) fn mark_processed(&mut self) {
        self.processed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> ClassDef {
        ClassDef::persistent("com.acme.Person")
            .with_feature(FeatureDef::field("id").primary_key())
            .with_feature(FeatureDef::field("name"))
            .with_feature(FeatureDef::field("legacyId").primary_key().with_property(keys::IGNORE, "true"))
            .with_feature(FeatureDef::reference("address"))
            .with_feature(FeatureDef::collection("orders"))
    }

    #[test]
    fn test_class_builder() {
        let class = person();
        assert!(class.is_persistent());
        assert_eq!(class.fields().len(), 3);
        assert_eq!(class.references().len(), 1);
        assert_eq!(class.collections().len(), 1);
        assert!(class.generates_repository_info());
    }

    #[test]
    fn test_shared_feature_namespace() {
        let class = person();
        assert_eq!(class.feature("address").map(|f| f.kind()), Some(FeatureKind::Reference));
        assert_eq!(class.feature("orders").map(|f| f.kind()), Some(FeatureKind::Collection));
        assert!(class.feature("unknown").is_none());
    }

    #[test]
    fn test_primary_keys_skip_ignored() {
        let class = person();
        let keys: Vec<_> = class.primary_keys().iter().map(|f| f.name()).collect();
        assert_eq!(keys, vec!["id"]);
    }

    #[test]
    fn test_fields_by_names() {
        let class = person();
        let fields = class.fields_by_names(Some("name, id")).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(class.fields_by_names(Some("id,nope")).unwrap_err(), "nope");
    }

    #[test]
    fn test_names() {
        let class = ClassDef::new("com.acme.Outer$Inner");
        assert_eq!(class.qualified_name(), "com.acme.Outer.Inner");
        assert_eq!(class.default_table_name(), "Inner");
        assert_eq!(ClassDef::new("Plain").default_table_name(), "Plain");
    }

    #[test]
    fn test_modifications() {
        let class = ClassDef::new("B").with_modification("id", [(keys::COLUMN, "B_ID")]);
        assert_eq!(class.modification_names().collect::<Vec<_>>(), vec!["id"]);
        assert_eq!(
            class.modification("id").and_then(|m| m.get(keys::COLUMN)).map(String::as_str),
            Some("B_ID")
        );
    }
}
