//! ormdoc core - metadata model builder and constraint checker.
//!
//! This crate turns the persistence metadata declared on classes into a
//! complete model: inherited and nested features are copied into every
//! class, defaults are filled in and the result is checked for
//! consistency before it is handed to emitters such as the table schema.
//!
//! ```
//! use ormdoc_core::{keys, CheckLevel, ClassDef, FeatureDef, ModelDef};
//!
//! let mut model = ModelDef::new();
//! model
//!     .add_class(
//!         ClassDef::persistent("com.acme.Person")
//!             .with_feature(FeatureDef::field("id").with_property(keys::JDBC_TYPE, "INTEGER").primary_key()),
//!     )
//!     .unwrap();
//! model.check_constraints(CheckLevel::Strict).unwrap();
//! assert!(model.is_checked());
//! ```

pub mod config;
mod constraints;
pub mod descriptor;
pub mod diagnostics;
pub mod error;
pub mod model;
pub mod torque;
pub mod types;

pub use config::{CheckLevel, GeneratorConfig, DEFAULT_DATABASE_NAME};
pub use descriptor::ModelDescriptor;
pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{Error, Result, TypeLookupError};
pub use model::{
    keys, ClassDef, ClassId, Definition, FeatureDef, FeatureKind, FeatureOrigin, FeatureRef,
    IndexDescriptorDef, ModelDef, NestedDef, ObjectCacheDef, ProcedureArgumentDef, ProcedureDef,
    Properties,
};
pub use torque::{ColumnDef, ForeignkeyDef, IndexDef, TableDef, TorqueModelDef};
pub use types::{DeclaredTypes, InheritanceHelper, MethodInfo, NoTypeInfo, TypeOracle};

/// Output of a generator run.
#[derive(Debug)]
pub struct Generated {
    /// The processed and checked model.
    pub model: ModelDef,
    /// Warnings raised while processing and checking.
    pub diagnostics: Diagnostics,
    /// The table schema, unless disabled in the configuration.
    pub schema: Option<TorqueModelDef>,
}

/// Process and check `model`, then build the table schema if configured.
pub fn generate(
    mut model: ModelDef,
    config: &GeneratorConfig,
    oracle: &dyn TypeOracle,
) -> Result<Generated> {
    let mut diagnostics = if config.echo_warnings {
        Diagnostics::new()
    } else {
        Diagnostics::quiet()
    };
    model.check_into(config.check_level, oracle, &mut diagnostics)?;

    let schema = if config.generate_schema {
        Some(TorqueModelDef::build(config.database_name.clone(), &model)?)
    } else {
        None
    };

    tracing::info!(
        classes = model.len(),
        warnings = diagnostics.len(),
        level = %config.check_level,
        "model generated"
    );
    Ok(Generated {
        model,
        diagnostics,
        schema,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_without_schema() {
        let mut model = ModelDef::new();
        model
            .add_class(ClassDef::persistent("A").with_feature(
                FeatureDef::field("id").with_property(keys::JDBC_TYPE, "INTEGER").primary_key(),
            ))
            .unwrap();

        let config = GeneratorConfig::new(CheckLevel::Basic)
            .without_schema()
            .with_echo_warnings(false);
        let generated = generate(model, &config, &NoTypeInfo).unwrap();
        assert!(generated.schema.is_none());
        assert!(generated.model.is_checked());
    }

    #[test]
    fn test_generate_reports_constraint_violation() {
        let mut model = ModelDef::new();
        model
            .add_class(ClassDef::persistent("A").with_feature(
                FeatureDef::field("id").with_property(keys::JDBC_TYPE, "TEXT"),
            ))
            .unwrap();

        let err = generate(model, &GeneratorConfig::default(), &NoTypeInfo).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The field id in class A specifies the invalid jdbc type TEXT"
        );
    }
}
