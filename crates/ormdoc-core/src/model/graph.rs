//! The model: every class of one generation run.

use super::class::{qualified_name, ClassDef};
use super::feature::{FeatureDef, FeatureRef};
use super::flatten::flatten_class;
use super::{ClassId, Definition};
use crate::config::CheckLevel;
use crate::constraints;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::types::{NoTypeInfo, TypeOracle};
use std::collections::{BTreeMap, HashSet, VecDeque};

/// Arena of classes keyed by qualified name.
///
/// The front end adds classes, [`ModelDef::process`] flattens them and
/// [`ModelDef::check_constraints`] validates and completes the result.
#[derive(Debug, Clone, Default)]
pub struct ModelDef {
    classes: Vec<ClassDef>,
    by_name: BTreeMap<String, ClassId>,
    resolved: bool,
    checked: bool,
}

impl ModelDef {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class. Fails if a class of the same qualified name exists.
    pub fn add_class(&mut self, mut class: ClassDef) -> Result<ClassId> {
        let key = class.qualified_name();
        if self.by_name.contains_key(&key) {
            return Err(Error::DuplicateClass(key));
        }

        let id = ClassId(self.classes.len());
        class.attach(id);
        self.classes.push(class);
        self.by_name.insert(key, id);
        self.resolved = false;
        self.checked = false;
        Ok(id)
    }

    /// Get a class by handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle belongs to another model.
    pub fn class(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.0]
    }

    /// Get a class by handle, mutably.
    ///
    /// # Panics
    ///
    /// Panics if the handle belongs to another model.
    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassDef {
        &mut self.classes[id.0]
    }

    /// Get a class by handle, if it belongs to this model.
    pub fn get(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.0)
    }

    /// Look up a handle by class name (`$` and `.` are equivalent).
    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(&qualified_name(name)).copied()
    }

    /// Look up a class by name.
    pub fn class_by_name(&self, name: &str) -> Option<&ClassDef> {
        self.class_id(name).map(|id| self.class(id))
    }

    /// Classes sorted by qualified name.
    pub fn classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.by_name.values().map(|id| &self.classes[id.0])
    }

    /// Handles sorted by qualified class name.
    pub fn class_ids(&self) -> Vec<ClassId> {
        self.by_name.values().copied().collect()
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if the model has no classes.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Resolve a feature handle.
    pub fn feature(&self, feature: &FeatureRef) -> Option<&FeatureDef> {
        self.get(feature.class)?
            .feature_of_kind(feature.kind, &feature.name)
    }

    /// All direct and indirect extents (subtypes) of a class, breadth first.
    /// The class itself is not included.
    pub fn all_extent_classes(&self, id: ClassId) -> Vec<ClassId> {
        let mut result = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut queue: VecDeque<ClassId> = self.class(id).extents().iter().copied().collect();

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            result.push(current);
            queue.extend(self.class(current).extents().iter().copied());
        }
        result
    }

    /// Check if every class has been flattened.
    pub fn is_processed(&self) -> bool {
        self.classes.iter().all(ClassDef::has_been_processed)
    }

    /// Check if the last constraint pass succeeded.
    pub fn is_checked(&self) -> bool {
        self.checked
    }

    /// Flatten every class, returning the warnings raised.
    pub fn process(&mut self) -> Result<Diagnostics> {
        let mut diagnostics = Diagnostics::new();
        self.process_into(&mut diagnostics)?;
        Ok(diagnostics)
    }

    /// Flatten every class, recording warnings into `diagnostics`.
    ///
    /// Classes are processed after their base types and nested types.
    /// Already processed classes are left untouched.
    pub fn process_into(&mut self, diagnostics: &mut Diagnostics) -> Result<()> {
        self.ensure_resolved()?;
        for id in self.class_ids() {
            self.process_class(id, diagnostics)?;
        }
        Ok(())
    }

    /// Flatten one class (and, first, everything it depends on).
    pub fn process_class(&mut self, id: ClassId, diagnostics: &mut Diagnostics) -> Result<()> {
        self.ensure_resolved()?;
        let mut visiting = Vec::new();
        self.process_recursive(id, &mut visiting, diagnostics)
    }

    fn process_recursive(
        &mut self,
        id: ClassId,
        visiting: &mut Vec<ClassId>,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        if self.class(id).has_been_processed() {
            return Ok(());
        }
        if let Some(pos) = visiting.iter().position(|&v| v == id) {
            let mut path: Vec<String> = visiting[pos..]
                .iter()
                .map(|&v| self.class(v).name().to_string())
                .collect();
            path.push(self.class(id).name().to_string());
            return Err(Error::CyclicHierarchy { path });
        }

        let class = self.class(id);
        let dependencies: Vec<ClassId> = class
            .base_types()
            .iter()
            .copied()
            .chain(class.nested().iter().filter_map(|n| n.nested_type()))
            .collect();

        visiting.push(id);
        for dependency in dependencies {
            self.process_recursive(dependency, visiting, diagnostics)?;
        }
        visiting.pop();

        flatten_class(self, id, diagnostics)
    }

    fn ensure_resolved(&mut self) -> Result<()> {
        if !self.resolved {
            self.resolve_hierarchy()?;
            self.resolved = true;
        }
        Ok(())
    }

    /// Link supertypes, extents and nested types to classes of the model.
    fn resolve_hierarchy(&mut self) -> Result<()> {
        let mut links = Vec::with_capacity(self.classes.len());
        for (index, class) in self.classes.iter().enumerate() {
            let bases: Vec<ClassId> = class
                .supertypes()
                .iter()
                .filter_map(|name| self.class_id(name))
                .collect();

            let mut extents = Vec::new();
            for name in class.extent_names() {
                let extent = self.class_id(name).ok_or_else(|| {
                    Error::constraint(format!(
                        "The class {} specified as extent-class of class {} is not part of the model",
                        name,
                        class.name()
                    ))
                })?;
                if !extents.contains(&extent) {
                    extents.push(extent);
                }
            }

            let mut nested = Vec::with_capacity(class.nested().len());
            for def in class.nested() {
                let nested_type = self.class_id(def.type_name()).ok_or_else(|| {
                    Error::constraint(format!(
                        "The type {} of the nested object {} in class {} is not part of the model",
                        def.type_name(),
                        def.name(),
                        class.name()
                    ))
                })?;
                nested.push(nested_type);
            }

            links.push((ClassId(index), bases, extents, nested));
        }

        for (id, bases, extents, nested) in &links {
            let class = self.class_mut(*id);
            class.set_base_types(bases.clone());
            class.set_extents(extents.clone());
            for (def, nested_type) in class.nested_mut().iter_mut().zip(nested) {
                def.set_nested_type(*nested_type);
            }
        }

        for (id, bases, _, _) in &links {
            for base in bases {
                self.class_mut(*base).add_extent(*id);
            }
        }

        tracing::debug!(classes = self.classes.len(), "resolved class hierarchy");
        Ok(())
    }

    /// Check all constraints without external type information.
    pub fn check_constraints(&mut self, level: CheckLevel) -> Result<Diagnostics> {
        self.check_constraints_with(level, &NoTypeInfo)
    }

    /// Check all constraints, using `oracle` for types outside the model.
    pub fn check_constraints_with(
        &mut self,
        level: CheckLevel,
        oracle: &dyn TypeOracle,
    ) -> Result<Diagnostics> {
        let mut diagnostics = Diagnostics::new();
        self.check_into(level, oracle, &mut diagnostics)?;
        Ok(diagnostics)
    }

    /// Process (if necessary) and check the model, recording warnings into `diagnostics`.
    pub fn check_into(
        &mut self,
        level: CheckLevel,
        oracle: &dyn TypeOracle,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        self.process_into(diagnostics)?;
        self.checked = false;
        constraints::check_model(self, level, oracle, diagnostics)?;
        self.checked = true;
        tracing::debug!(level = %level, classes = self.classes.len(), "model checked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{keys, FeatureKind, NestedDef};

    #[test]
    fn test_duplicate_class() {
        let mut model = ModelDef::new();
        model.add_class(ClassDef::new("a.Outer$Inner")).unwrap();
        let err = model.add_class(ClassDef::new("a.Outer.Inner")).unwrap_err();
        assert!(matches!(err, Error::DuplicateClass(name) if name == "a.Outer.Inner"));
    }

    #[test]
    fn test_lookup_normalizes_inner_classes() {
        let mut model = ModelDef::new();
        let id = model.add_class(ClassDef::new("a.Outer$Inner")).unwrap();
        assert_eq!(model.class_id("a.Outer.Inner"), Some(id));
        assert_eq!(model.class_id("a.Outer$Inner"), Some(id));
    }

    #[test]
    fn test_classes_sorted_by_name() {
        let mut model = ModelDef::new();
        model.add_class(ClassDef::new("b.Z")).unwrap();
        model.add_class(ClassDef::new("a.Y")).unwrap();
        let names: Vec<_> = model.classes().map(|c| c.name()).collect();
        assert_eq!(names, vec!["a.Y", "b.Z"]);
    }

    #[test]
    fn test_subtypes_become_extents() {
        let mut model = ModelDef::new();
        let a = model.add_class(ClassDef::persistent("A")).unwrap();
        let b = model.add_class(ClassDef::persistent("B").with_supertype("A")).unwrap();
        let c = model.add_class(ClassDef::persistent("C").with_supertype("B")).unwrap();
        model.process().unwrap();

        assert_eq!(model.class(a).extents(), &[b]);
        assert_eq!(model.class(b).base_types(), &[a]);
        assert_eq!(model.all_extent_classes(a), vec![b, c]);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut model = ModelDef::new();
        model.add_class(ClassDef::new("A").with_supertype("B")).unwrap();
        model.add_class(ClassDef::new("B").with_supertype("A")).unwrap();

        let err = model.process().unwrap_err();
        match err {
            Error::CyclicHierarchy { path } => {
                assert_eq!(path.first(), path.last());
                assert_eq!(path.len(), 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_nested_type() {
        let mut model = ModelDef::new();
        model
            .add_class(ClassDef::persistent("A").with_nested(NestedDef::new("address", "Address")))
            .unwrap();
        let err = model.process().unwrap_err();
        assert!(err.is_constraint());
        assert!(err.to_string().contains("Address"));
    }

    #[test]
    fn test_process_is_idempotent() {
        let mut model = ModelDef::new();
        model
            .add_class(ClassDef::persistent("A").with_feature(FeatureDef::field("id")))
            .unwrap();
        let b = model
            .add_class(ClassDef::persistent("B").with_supertype("A"))
            .unwrap();

        model.process().unwrap();
        let once = model.class(b).clone();
        model.process().unwrap();
        let mut diagnostics = Diagnostics::quiet();
        model.process_class(b, &mut diagnostics).unwrap();

        assert_eq!(model.class(b), &once);
        assert!(model.is_processed());
    }

    #[test]
    fn test_feature_handle_resolves_original() {
        let mut model = ModelDef::new();
        let a = model
            .add_class(ClassDef::persistent("A").with_feature(FeatureDef::field("id")))
            .unwrap();
        let b = model
            .add_class(
                ClassDef::persistent("B")
                    .with_supertype("A")
                    .with_modification("id", [(keys::COLUMN, "B_ID")]),
            )
            .unwrap();
        model.process().unwrap();

        let copy = model.class(b).field("id").unwrap();
        assert_eq!(copy.property(keys::COLUMN), Some("B_ID"));
        let original = copy.original().unwrap();
        assert_eq!(original.class, a);
        assert_eq!(original.kind, FeatureKind::Field);
        assert!(model.feature(original).unwrap().property(keys::COLUMN).is_none());
    }
}
