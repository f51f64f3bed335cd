//! Class-level rules.

use super::Checker;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result, TypeLookupError};
use crate::model::{keys, ClassDef, ClassId, Definition};
use crate::types::MethodInfo;

/// Check and complete one class whose features were already checked.
pub(crate) fn check(
    checker: &Checker<'_>,
    class: &mut ClassDef,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    ensure_no_table_info_if_no_repository_info(class);
    check_modifications(checker, class)?;
    check_extents(checker, class)?;
    ensure_table_if_necessary(class);
    check_factory_class_and_method(checker, class, diagnostics)?;
    check_initialization_method(checker, class, diagnostics)?;
    check_primary_key(checker, class, diagnostics);
    checker.check_proxy_prefetching_limit(
        diagnostics,
        "class.proxy",
        &*class,
        class.has_property(keys::PROXY),
        &format!("class {}", class.name()),
    )?;
    check_row_reader(checker, class, diagnostics)?;
    check_object_cache(checker, class, diagnostics)?;
    check_procedures(checker, class)?;
    check_indices(checker, class)
}

fn ensure_no_table_info_if_no_repository_info(class: &mut ClassDef) {
    if !class.generates_repository_info() {
        class.set_property(keys::GENERATE_TABLE_INFO, "false");
    }
}

/// Modifications may only target inherited or nested features and modifiable properties.
fn check_modifications(checker: &Checker<'_>, class: &ClassDef) -> Result<()> {
    if checker.level.is_none() {
        return Ok(());
    }
    for name in class.modification_names() {
        let feature = class.feature(name).ok_or_else(|| {
            Error::constraint(format!(
                "Class {} contains a modification for an unknown feature {}",
                class.name(),
                name
            ))
        })?;
        if !feature.is_inherited() && !feature.is_nested() {
            return Err(Error::constraint(format!(
                "Class {} contains a modification for the feature {} that is not inherited but \
                 defined in the same class",
                class.name(),
                name
            )));
        }
        let overrides = class.modification(name).into_iter().flat_map(|m| m.keys());
        for property in overrides {
            if !keys::is_modifiable(feature.kind(), property) {
                return Err(Error::constraint(format!(
                    "The modification of the {} {} in class {} sets the property {} which \
                     cannot be modified",
                    feature.kind(),
                    name,
                    class.name(),
                    property
                )));
            }
        }
    }
    Ok(())
}

/// Extents must be real subtypes; extents below another listed extent are dropped.
fn check_extents(checker: &Checker<'_>, class: &mut ClassDef) -> Result<()> {
    if checker.level.is_none() {
        return Ok(());
    }
    let Some(id) = class.id() else {
        return Ok(());
    };

    for &extent in class.extents() {
        let extent_name = checker.model.class(extent).name();
        if extent == id {
            return Err(Error::constraint(format!(
                "The class {} specifies itself as an extent-class",
                class.name()
            )));
        }
        let is_subtype = checker
            .types
            .is_same_or_subtype(extent_name, class.name(), false)
            .unwrap_or(false);
        if !is_subtype {
            return Err(Error::constraint(format!(
                "The class {} specified as extent-class of class {} does not inherit from {}",
                extent_name,
                class.name(),
                class.name()
            )));
        }
    }

    let extents = class.extents().to_vec();
    let kept: Vec<ClassId> = extents
        .iter()
        .copied()
        .filter(|&extent| {
            !extents.iter().any(|&other| {
                other != extent
                    && checker
                        .types
                        .is_same_or_subtype(
                            checker.model.class(extent).name(),
                            checker.model.class(other).name(),
                            false,
                        )
                        .unwrap_or(false)
            })
        })
        .collect();
    if kept.len() != extents.len() {
        tracing::debug!(
            class = class.name(),
            removed = extents.len() - kept.len(),
            "removed redundant extents"
        );
        class.set_extents(kept);
    }
    Ok(())
}

fn ensure_table_if_necessary(class: &mut ClassDef) {
    if class.is_persistent() && !class.has_property(keys::TABLE) {
        let table = class.default_table_name().to_string();
        class.set_property(keys::TABLE, table);
    }
}

/// Strip an empty parameter list from a method name.
fn method_name(name: &str) -> &str {
    name.trim().trim_end_matches("()")
}

fn lookup_method(
    checker: &Checker<'_>,
    diagnostics: &mut Diagnostics,
    rule: &'static str,
    type_name: &str,
    method: &str,
    subject: &str,
) -> Result<Option<Option<MethodInfo>>> {
    match checker.types.oracle().find_method(type_name, method) {
        Ok(found) => Ok(Some(found)),
        Err(TypeLookupError::NotFound(missing)) => Err(Error::constraint(format!(
            "Could not find the class {} on the classpath while checking the {}",
            missing, subject
        ))),
        Err(TypeLookupError::Unavailable) => {
            diagnostics.warn(
                rule,
                format!(
                    "Could not check the {} because no type information is available",
                    subject
                ),
            );
            Ok(None)
        }
    }
}

fn check_factory_class_and_method(
    checker: &Checker<'_>,
    class: &ClassDef,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    if checker.level.is_none() {
        return Ok(());
    }
    let factory_class = class.property(keys::FACTORY_CLASS);
    let factory_method = class.property(keys::FACTORY_METHOD);
    let (factory_class, factory_method) = match (factory_class, factory_method) {
        (None, None) => return Ok(()),
        (Some(_), None) => {
            return Err(Error::constraint(format!(
                "Class {} has a factory-class but no factory-method",
                class.name()
            )))
        }
        (None, Some(_)) => {
            return Err(Error::constraint(format!(
                "Class {} has a factory-method but no factory-class",
                class.name()
            )))
        }
        (Some(factory_class), Some(factory_method)) => (factory_class, method_name(factory_method)),
    };
    if !checker.level.is_strict() {
        return Ok(());
    }

    let subject = format!("factory-method {} of class {}", factory_method, class.name());
    let Some(found) = lookup_method(
        checker,
        diagnostics,
        "class.factory",
        factory_class,
        factory_method,
        &subject,
    )?
    else {
        return Ok(());
    };
    let method = found.ok_or_else(|| {
        Error::constraint(format!(
            "The class {} does not have a method {} (specified as factory-method of class {})",
            factory_class,
            factory_method,
            class.name()
        ))
    })?;
    if !method.is_static {
        return Err(Error::constraint(format!(
            "The factory-method {} in class {} is not static",
            factory_method, factory_class
        )));
    }
    let return_type = method.return_type.as_deref().ok_or_else(|| {
        Error::constraint(format!(
            "The factory-method {} in class {} does not return a value",
            factory_method, factory_class
        ))
    })?;
    let compatible = checker.actual_subtype(
        diagnostics,
        "class.factory",
        return_type,
        class.name(),
        &subject,
    )?;
    if compatible == Some(false) {
        return Err(Error::constraint(format!(
            "The return type {} of the factory-method {} in class {} is not the same or a \
             subtype of class {}",
            return_type,
            factory_method,
            factory_class,
            class.name()
        )));
    }
    Ok(())
}

fn check_initialization_method(
    checker: &Checker<'_>,
    class: &ClassDef,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    if checker.level.is_none() {
        return Ok(());
    }
    let Some(declared) = class.property(keys::INITIALIZATION_METHOD) else {
        return Ok(());
    };
    let initialization_method = method_name(declared);
    if initialization_method.contains('(') {
        return Err(Error::constraint(format!(
            "The initialization-method {} of class {} must not take parameters",
            declared,
            class.name()
        )));
    }
    if !checker.level.is_strict() {
        return Ok(());
    }

    let subject = format!(
        "initialization-method {} of class {}",
        initialization_method,
        class.name()
    );
    let Some(found) = lookup_method(
        checker,
        diagnostics,
        "class.initialization-method",
        class.name(),
        initialization_method,
        &subject,
    )?
    else {
        return Ok(());
    };
    let method = found.ok_or_else(|| {
        Error::constraint(format!(
            "The class {} does not have a method {} (specified as initialization-method)",
            class.name(),
            initialization_method
        ))
    })?;
    if method.is_static {
        return Err(Error::constraint(format!(
            "The initialization-method {} of class {} is static",
            initialization_method,
            class.name()
        )));
    }
    if method.is_abstract {
        return Err(Error::constraint(format!(
            "The initialization-method {} of class {} is abstract",
            initialization_method,
            class.name()
        )));
    }
    Ok(())
}

fn check_primary_key(checker: &Checker<'_>, class: &ClassDef, diagnostics: &mut Diagnostics) {
    if checker.level.is_none() || !class.is_persistent() || !class.generates_table_info() {
        return;
    }
    if class.primary_keys().is_empty() {
        diagnostics.warn(
            "class.primarykey",
            format!("The class {} has no primary key", class.name()),
        );
    }
}

fn check_row_reader(
    checker: &Checker<'_>,
    class: &ClassDef,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    if !checker.level.is_strict() {
        return Ok(());
    }
    match class.property(keys::ROW_READER) {
        Some(row_reader) => checker.check_implements(
            diagnostics,
            "class.row-reader",
            row_reader,
            keys::ROW_READER_INTERFACE,
            &format!("row-reader {} specified for class {}", row_reader, class.name()),
        ),
        None => Ok(()),
    }
}

fn check_object_cache(
    checker: &Checker<'_>,
    class: &ClassDef,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    if checker.level.is_none() {
        return Ok(());
    }
    let Some(cache) = class.object_cache() else {
        return Ok(());
    };
    if cache.class_name().trim().is_empty() {
        return Err(Error::constraint(format!(
            "The object-cache of class {} does not specify its implementing class",
            class.name()
        )));
    }
    if !checker.level.is_strict() {
        return Ok(());
    }
    checker.check_implements(
        diagnostics,
        "class.object-cache",
        cache.class_name(),
        keys::OBJECT_CACHE_INTERFACE,
        &format!(
            "object-cache {} specified for class {}",
            cache.class_name(),
            class.name()
        ),
    )
}

/// Procedures may only refer to persistent fields and declared arguments.
fn check_procedures(checker: &Checker<'_>, class: &ClassDef) -> Result<()> {
    if checker.level.is_none() {
        return Ok(());
    }
    for procedure in class.procedures() {
        if let Some(field_name) = procedure.property(keys::RETURN_FIELD_REF) {
            let persistent = class.field(field_name).is_some_and(|f| !f.is_ignored());
            if !persistent {
                return Err(Error::constraint(format!(
                    "The {}-procedure in class {} references an unknown or non-persistent \
                     return field {}",
                    procedure.kind(),
                    class.name(),
                    field_name
                )));
            }
        }
        for argument in procedure.argument_names() {
            if class.procedure_argument(argument).is_none() {
                return Err(Error::constraint(format!(
                    "The {}-procedure in class {} references an unknown procedure argument {}",
                    procedure.kind(),
                    class.name(),
                    argument
                )));
            }
        }
    }

    for argument in class.procedure_arguments() {
        let Some(field_name) = argument.property(keys::FIELD_REF) else {
            continue;
        };
        let persistent = class.field(field_name).is_some_and(|f| !f.is_ignored());
        if !persistent {
            return Err(Error::constraint(format!(
                "The field {} referenced by the procedure argument {} in class {} is unknown or \
                 not persistent",
                field_name,
                argument.name(),
                class.name()
            )));
        }
    }
    Ok(())
}

/// Index descriptors must name persistent fields.
fn check_indices(checker: &Checker<'_>, class: &ClassDef) -> Result<()> {
    if checker.level.is_none() {
        return Ok(());
    }
    for index in class.index_descriptors() {
        let mut fields = index.field_names().peekable();
        if fields.peek().is_none() {
            return Err(Error::constraint(format!(
                "The index {} in class {} does not specify any fields",
                index.name(),
                class.name()
            )));
        }
        for field_name in fields {
            let persistent = class.field(field_name).is_some_and(|f| !f.is_ignored());
            if !persistent {
                return Err(Error::constraint(format!(
                    "The index {} in class {} uses the unknown or ignored field {}",
                    index.name(),
                    class.name(),
                    field_name
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckLevel;
    use crate::model::{
        FeatureDef, IndexDescriptorDef, ModelDef, ObjectCacheDef, ProcedureArgumentDef,
        ProcedureDef,
    };
    use crate::types::{DeclaredTypes, NoTypeInfo, TypeOracle};

    fn checked(
        classes: Vec<ClassDef>,
        name: &str,
        level: CheckLevel,
        oracle: &dyn TypeOracle,
    ) -> (Result<()>, ClassDef, Diagnostics) {
        let mut model = ModelDef::new();
        for class in classes {
            model.add_class(class).unwrap();
        }
        model.process().unwrap();
        let mut class = model.class_by_name(name).unwrap().clone();
        let checker = Checker::new(&model, level, oracle);
        let mut diagnostics = Diagnostics::quiet();
        let result = check(&checker, &mut class, &mut diagnostics);
        (result, class, diagnostics)
    }

    fn base() -> ClassDef {
        ClassDef::persistent("com.acme.Base")
            .with_feature(FeatureDef::field("id").primary_key())
            .with_feature(FeatureDef::field("name"))
    }

    #[test]
    fn test_default_table_and_primary_key_warning() {
        let (result, class, diagnostics) = checked(
            vec![ClassDef::persistent("com.acme.Plain")],
            "com.acme.Plain",
            CheckLevel::Basic,
            &NoTypeInfo,
        );
        result.unwrap();
        assert_eq!(class.property(keys::TABLE), Some("Plain"));
        assert!(diagnostics.mentions("has no primary key"));
    }

    #[test]
    fn test_no_repository_info_means_no_table_info() {
        let (result, class, _) = checked(
            vec![base().with_property(keys::GENERATE_REPOSITORY_INFO, "false")],
            "com.acme.Base",
            CheckLevel::Basic,
            &NoTypeInfo,
        );
        result.unwrap();
        assert!(!class.generates_table_info());
    }

    #[test]
    fn test_modification_of_own_feature() {
        let (result, _, _) = checked(
            vec![base().with_modification("name", [(keys::LENGTH, "40")])],
            "com.acme.Base",
            CheckLevel::Basic,
            &NoTypeInfo,
        );
        assert!(result.unwrap_err().to_string().contains("not inherited"));
    }

    #[test]
    fn test_modification_of_unmodifiable_property() {
        let sub = ClassDef::persistent("com.acme.Sub")
            .with_supertype("com.acme.Base")
            .with_modification("name", [(keys::ORDERBY, "id")]);
        let (result, _, _) = checked(vec![base(), sub], "com.acme.Sub", CheckLevel::Basic, &NoTypeInfo);
        assert!(result.unwrap_err().to_string().contains("cannot be modified"));

        let sub = ClassDef::persistent("com.acme.Sub")
            .with_supertype("com.acme.Base")
            .with_modification("name", [(keys::LENGTH, "40")]);
        let (result, _, _) = checked(vec![base(), sub], "com.acme.Sub", CheckLevel::Basic, &NoTypeInfo);
        assert!(result.is_ok());
    }

    #[test]
    fn test_extent_must_be_subtype() {
        let other = ClassDef::persistent("com.acme.Other");
        let (result, _, _) = checked(
            vec![base().with_extent("com.acme.Other"), other],
            "com.acme.Base",
            CheckLevel::Basic,
            &NoTypeInfo,
        );
        assert!(result.unwrap_err().to_string().contains("does not inherit from"));
    }

    #[test]
    fn test_redundant_extents_are_pruned() {
        let sub = ClassDef::persistent("com.acme.Sub").with_supertype("com.acme.Base");
        let leaf = ClassDef::persistent("com.acme.Leaf").with_supertype("com.acme.Sub");
        let (result, class, _) = checked(
            vec![base().with_extent("com.acme.Leaf"), sub, leaf],
            "com.acme.Base",
            CheckLevel::Basic,
            &NoTypeInfo,
        );
        result.unwrap();
        assert_eq!(class.extents().len(), 1);
    }

    #[test]
    fn test_factory_pairing() {
        let (result, _, _) = checked(
            vec![base().with_property(keys::FACTORY_CLASS, "com.acme.Factory")],
            "com.acme.Base",
            CheckLevel::Basic,
            &NoTypeInfo,
        );
        assert!(result.unwrap_err().to_string().contains("no factory-method"));
    }

    #[test]
    fn test_strict_factory_method() {
        let mut types = DeclaredTypes::with_ojb_defaults();
        types.declare_method(
            "com.acme.Factory",
            "create",
            MethodInfo {
                is_static: false,
                is_abstract: false,
                return_type: Some("com.acme.Base".into()),
            },
        );
        let (result, _, _) = checked(
            vec![base()
                .with_property(keys::FACTORY_CLASS, "com.acme.Factory")
                .with_property(keys::FACTORY_METHOD, "create()")],
            "com.acme.Base",
            CheckLevel::Strict,
            &types,
        );
        assert!(result.unwrap_err().to_string().contains("is not static"));
    }

    #[test]
    fn test_procedure_references() {
        let class = base()
            .with_procedure(
                ProcedureDef::new("insert")
                    .with_property(keys::NAME, "insert_base")
                    .with_property(keys::ARGUMENTS, "arg1")
                    .with_property(keys::RETURN_FIELD_REF, "id"),
            )
            .with_procedure_argument(ProcedureArgumentDef::runtime("arg1", "missing"));
        let (result, _, _) = checked(vec![class], "com.acme.Base", CheckLevel::Basic, &NoTypeInfo);
        assert!(result.unwrap_err().to_string().contains("missing"));
    }

    #[test]
    fn test_index_fields() {
        let class = base().with_index(IndexDescriptorDef::new("name_idx", "name, nickname"));
        let (result, _, _) = checked(vec![class], "com.acme.Base", CheckLevel::Basic, &NoTypeInfo);
        assert!(result.unwrap_err().to_string().contains("nickname"));
    }

    #[test]
    fn test_object_cache_interface() {
        let types = DeclaredTypes::with_ojb_defaults();
        let class = base().with_object_cache(ObjectCacheDef::new("org.apache.ojb.broker.accesslayer.RowReaderDefaultImpl"));
        let (result, _, _) = checked(vec![class], "com.acme.Base", CheckLevel::Strict, &types);
        assert!(result.unwrap_err().to_string().contains(keys::OBJECT_CACHE_INTERFACE));
    }
}
