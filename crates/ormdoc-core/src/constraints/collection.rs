//! Collection rules.

use super::Checker;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::model::{keys, Definition, FeatureDef};

/// Check and complete one collection.
pub(crate) fn check(
    checker: &Checker<'_>,
    collection: &mut FeatureDef,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    let owner = checker.owner_name(collection);

    ensure_element_class_ref(checker, collection, owner, diagnostics)?;
    check_inherited_foreignkey(checker, collection, owner)?;
    ensure_collection_class(checker, collection, owner, diagnostics)?;
    checker.check_proxy_prefetching_limit(
        diagnostics,
        "collection.proxy",
        &*collection,
        collection.boolean_property(keys::PROXY, false),
        &format!("collection {} in class {}", collection.name(), owner),
    )?;
    check_orderby(checker, collection, owner)?;
    check_query_customizer(checker, collection, owner, diagnostics)
}

/// Resolve the element class (falling back to the array element type).
fn ensure_element_class_ref(
    checker: &Checker<'_>,
    collection: &mut FeatureDef,
    owner: &str,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    let array_element = collection
        .property(keys::ARRAY_ELEMENT_CLASS_REF)
        .map(str::to_string);
    let element_name = match (collection.property(keys::ELEMENT_CLASS_REF), &array_element) {
        (Some(name), _) => name.to_string(),
        (None, Some(name)) => name.clone(),
        (None, None) => {
            return Err(Error::constraint(format!(
                "Collection {} in class {} does not specify its element class",
                collection.name(),
                owner
            )))
        }
    };

    let element = checker.model.class_by_name(&element_name).ok_or_else(|| {
        Error::constraint(format!(
            "Collection {} in class {} references an unknown class {}",
            collection.name(),
            owner,
            element_name
        ))
    })?;
    if !element.is_persistent() {
        return Err(Error::constraint(format!(
            "The element class {} of the collection {} in class {} is not persistent",
            element_name,
            collection.name(),
            owner
        )));
    }

    if checker.level.is_strict() {
        if let Some(array_element) = &array_element {
            let compatible = checker.actual_subtype(
                diagnostics,
                "collection.element-class-ref",
                element.name(),
                array_element,
                &format!("collection {} in class {}", collection.name(), owner),
            )?;
            if compatible == Some(false) {
                return Err(Error::constraint(format!(
                    "The element class {} of the collection {} in class {} is not the same or a \
                     subtype of the array base type {}",
                    element.name(),
                    collection.name(),
                    owner,
                    array_element
                )));
            }
        }
    }

    collection.set_property(keys::ELEMENT_CLASS_REF, element.name());
    Ok(())
}

/// An inherited or nested m:n collection must keep its foreign keys.
fn check_inherited_foreignkey(
    checker: &Checker<'_>,
    collection: &FeatureDef,
    owner: &str,
) -> Result<()> {
    if checker.level.is_none()
        || !(collection.is_inherited() || collection.is_nested())
        || !collection.has_indirection_table()
    {
        return Ok(());
    }
    let Some(original) = collection.original().and_then(|r| checker.model.feature(r)) else {
        return Ok(());
    };
    if !keys::same_lists(
        collection.property(keys::FOREIGNKEY),
        original.property(keys::FOREIGNKEY),
    ) {
        return Err(Error::constraint(format!(
            "The foreignkey property has been changed for the m:n collection {} in class {}",
            collection.name(),
            owner
        )));
    }
    Ok(())
}

fn ensure_collection_class(
    checker: &Checker<'_>,
    collection: &mut FeatureDef,
    owner: &str,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    if checker.level.is_none() {
        return Ok(());
    }

    if collection.has_property(keys::ARRAY_ELEMENT_CLASS_REF) {
        if collection.has_property(keys::COLLECTION_CLASS) {
            return Err(Error::constraint(format!(
                "Collection {} in class {} is an array but does specify collection-class",
                collection.name(),
                owner
            )));
        }
        return Ok(());
    }

    // the remaining checks need type information beyond the model
    if !checker.level.is_strict() {
        return Ok(());
    }

    if let Some(collection_class) = collection.property(keys::COLLECTION_CLASS) {
        return checker.check_implements(
            diagnostics,
            "collection.collection-class",
            collection_class,
            keys::MANAGEABLE_COLLECTION_INTERFACE,
            &format!(
                "collection-class {} specified for collection {} in class {}",
                collection_class,
                collection.name(),
                owner
            ),
        );
    }

    let Some(variable_type) = collection.property(keys::VARIABLE_TYPE).map(str::to_string) else {
        return Ok(());
    };
    let subject = format!("type of collection {} in class {}", collection.name(), owner);
    let is_collection = checker.actual_subtype(
        diagnostics,
        "collection.collection-class",
        &variable_type,
        keys::JAVA_COLLECTION_INTERFACE,
        &subject,
    )?;
    match is_collection {
        Some(false) => Err(Error::constraint(format!(
            "The type of collection {} in class {} is neither an array nor a collection",
            collection.name(),
            owner
        ))),
        Some(true) => {
            let manageable = checker.actual_subtype(
                diagnostics,
                "collection.collection-class",
                &variable_type,
                keys::MANAGEABLE_COLLECTION_INTERFACE,
                &subject,
            )?;
            if manageable == Some(true) {
                collection.set_property(keys::COLLECTION_CLASS, variable_type);
            }
            Ok(())
        }
        None => Ok(()),
    }
}

/// Every `orderby` entry names a field of the element class, optionally with `=ASC` or `=DESC`.
fn check_orderby(checker: &Checker<'_>, collection: &FeatureDef, owner: &str) -> Result<()> {
    if checker.level.is_none() || !collection.has_property(keys::ORDERBY) {
        return Ok(());
    }
    let element_name = collection.property(keys::ELEMENT_CLASS_REF).unwrap_or_default();
    let Some(element) = checker.model.class_by_name(element_name) else {
        return Ok(());
    };

    for entry in keys::comma_list(collection.property(keys::ORDERBY)) {
        let (field_name, order) = match entry.split_once('=') {
            Some((field, order)) => (field.trim(), Some(order.trim())),
            None => (entry, None),
        };
        if let Some(order) = order {
            if !order.eq_ignore_ascii_case("ASC") && !order.eq_ignore_ascii_case("DESC") {
                return Err(Error::constraint(format!(
                    "The orderby specification {} of collection {} in class {} contains an \
                     invalid sort order {}",
                    entry,
                    collection.name(),
                    owner,
                    order
                )));
            }
        }
        if element.field(field_name).is_none() {
            return Err(Error::constraint(format!(
                "The field {} specified in the orderby property of collection {} in class {} \
                 was not found in the element class {}",
                field_name,
                collection.name(),
                owner,
                element.name()
            )));
        }
    }
    Ok(())
}

fn check_query_customizer(
    checker: &Checker<'_>,
    collection: &FeatureDef,
    owner: &str,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    if !checker.level.is_strict() {
        return Ok(());
    }
    match collection.property(keys::QUERY_CUSTOMIZER) {
        Some(customizer) => checker.check_implements(
            diagnostics,
            "collection.query-customizer",
            customizer,
            keys::QUERY_CUSTOMIZER_INTERFACE,
            &format!(
                "query-customizer {} specified for collection {} in class {}",
                customizer,
                collection.name(),
                owner
            ),
        ),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckLevel;
    use crate::model::{ClassDef, ModelDef};
    use crate::types::{DeclaredTypes, NoTypeInfo, TypeOracle};

    fn model() -> ModelDef {
        let mut model = ModelDef::new();
        model
            .add_class(
                ClassDef::persistent("Order")
                    .with_feature(FeatureDef::field("id").primary_key())
                    .with_feature(FeatureDef::field("date"))
                    .with_feature(FeatureDef::collection("items")),
            )
            .unwrap();
        model
            .add_class(ClassDef::persistent("Item").with_feature(FeatureDef::field("position")))
            .unwrap();
        model.process().unwrap();
        model
    }

    fn run(
        level: CheckLevel,
        oracle: &dyn TypeOracle,
        edit: impl FnOnce(&mut FeatureDef),
    ) -> (Result<()>, FeatureDef, Diagnostics) {
        let model = model();
        let mut collection = model
            .class_by_name("Order")
            .unwrap()
            .collection("items")
            .unwrap()
            .clone();
        edit(&mut collection);
        let checker = Checker::new(&model, level, oracle);
        let mut diagnostics = Diagnostics::quiet();
        let result = check(&checker, &mut collection, &mut diagnostics);
        (result, collection, diagnostics)
    }

    #[test]
    fn test_element_class_required() {
        let (result, _, _) = run(CheckLevel::Basic, &NoTypeInfo, |_| {});
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("does not specify its element class"));
    }

    #[test]
    fn test_array_element_fallback() {
        let (result, collection, _) = run(CheckLevel::Basic, &NoTypeInfo, |c| {
            c.set_property(keys::ARRAY_ELEMENT_CLASS_REF, "Item");
        });
        result.unwrap();
        assert_eq!(collection.property(keys::ELEMENT_CLASS_REF), Some("Item"));
    }

    #[test]
    fn test_array_with_collection_class() {
        let (result, _, _) = run(CheckLevel::Basic, &NoTypeInfo, |c| {
            c.set_property(keys::ARRAY_ELEMENT_CLASS_REF, "Item");
            c.set_property(keys::COLLECTION_CLASS, "java.util.Vector");
        });
        assert!(result.unwrap_err().to_string().contains("is an array"));
    }

    #[test]
    fn test_orderby() {
        let (result, _, _) = run(CheckLevel::Basic, &NoTypeInfo, |c| {
            c.set_property(keys::ELEMENT_CLASS_REF, "Item");
            c.set_property(keys::ORDERBY, "position=DESC");
        });
        result.unwrap();

        let (result, _, _) = run(CheckLevel::Basic, &NoTypeInfo, |c| {
            c.set_property(keys::ELEMENT_CLASS_REF, "Item");
            c.set_property(keys::ORDERBY, "position=UP");
        });
        assert!(result.unwrap_err().to_string().contains("invalid sort order UP"));

        let (result, _, _) = run(CheckLevel::Basic, &NoTypeInfo, |c| {
            c.set_property(keys::ELEMENT_CLASS_REF, "Item");
            c.set_property(keys::ORDERBY, "weight");
        });
        assert!(result.unwrap_err().to_string().contains("weight"));
    }

    #[test]
    fn test_manageable_variable_type_is_adopted() {
        let types = DeclaredTypes::with_ojb_defaults();
        let (result, collection, _) = run(CheckLevel::Strict, &types, |c| {
            c.set_property(keys::ELEMENT_CLASS_REF, "Item");
            c.set_property(
                keys::VARIABLE_TYPE,
                "org.apache.ojb.broker.util.collections.ManageableArrayList",
            );
        });
        result.unwrap();
        assert_eq!(
            collection.property(keys::COLLECTION_CLASS),
            Some("org.apache.ojb.broker.util.collections.ManageableArrayList")
        );
    }

    #[test]
    fn test_variable_type_must_be_collection() {
        let mut types = DeclaredTypes::with_ojb_defaults();
        types.declare("java.util.Map", Vec::<String>::new());
        let (result, _, _) = run(CheckLevel::Strict, &types, |c| {
            c.set_property(keys::ELEMENT_CLASS_REF, "Item");
            c.set_property(keys::VARIABLE_TYPE, "java.util.Map");
        });
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("neither an array nor a collection"));
    }

    #[test]
    fn test_missing_type_information_warns() {
        let (result, collection, diagnostics) = run(CheckLevel::Strict, &NoTypeInfo, |c| {
            c.set_property(keys::ELEMENT_CLASS_REF, "Item");
            c.set_property(keys::VARIABLE_TYPE, "java.util.List");
        });
        result.unwrap();
        assert!(!collection.has_property(keys::COLLECTION_CLASS));
        assert_eq!(diagnostics.by_rule("collection.collection-class").count(), 1);
    }
}
