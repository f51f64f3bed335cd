//! Metadata model for persistent classes.
//!
//! The model is an arena of [`ClassDef`]s addressed by [`ClassId`] handles.
//! Base types, extents and feature owners are stored as handles, so the
//! class graph may contain back-references without shared ownership.

mod class;
mod descriptors;
mod feature;
mod flatten;
mod graph;
pub mod keys;
mod properties;

pub use class::{qualified_name, ClassDef};
pub use descriptors::{
    IndexDescriptorDef, ObjectCacheDef, ProcedureArgumentDef, ProcedureDef, PROCEDURE_KINDS,
};
pub use feature::{FeatureDef, FeatureKind, FeatureOrigin, FeatureRef, NestedDef};
pub use graph::ModelDef;
pub use properties::{to_bool, Definition, Properties, PropertyOverrides};

/// Handle of a class inside a [`ModelDef`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub(crate) usize);

impl ClassId {
    /// Position of the class in the model arena.
    pub fn index(self) -> usize {
        self.0
    }
}
