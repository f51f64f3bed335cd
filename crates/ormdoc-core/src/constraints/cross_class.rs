//! Rules spanning two classes: key propagation and key compatibility.

use super::Checker;
use crate::config::CheckLevel;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::model::{
    keys, ClassDef, ClassId, Definition, FeatureDef, FeatureKind, FeatureRef, ModelDef,
};
use crate::types::TypeOracle;

/// Run the cross-class rules in order.
pub(crate) fn check(
    model: &mut ModelDef,
    level: CheckLevel,
    oracle: &dyn TypeOracle,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    ensure_referenced_keys(model)?;

    let checker = Checker::new(model, level, oracle);
    check_reference_foreignkeys(&checker)?;
    check_collection_foreignkeys(&checker, diagnostics)?;
    check_key_modifications(&checker)
}

fn owner_name(model: &ModelDef, feature: &FeatureDef) -> String {
    feature
        .owner()
        .and_then(|id| model.get(id))
        .map(|class| class.name().to_string())
        .unwrap_or_default()
}

fn class_named(
    model: &ModelDef,
    name: &str,
    usage: impl FnOnce() -> String,
) -> Result<ClassId> {
    model.class_id(name).ok_or_else(|| {
        Error::constraint(format!(
            "The class {} used by {} is not part of the model",
            name,
            usage()
        ))
    })
}

/// The class itself followed by all its subtypes.
fn hierarchy(model: &ModelDef, id: ClassId) -> Vec<ClassId> {
    let mut classes = vec![id];
    classes.extend(model.all_extent_classes(id));
    classes
}

/// Two declarations of a key field are the same if name, column and jdbc type agree.
fn is_equal(first: &FeatureDef, second: &FeatureDef) -> bool {
    first.name() == second.name()
        && first.property(keys::COLUMN) == second.property(keys::COLUMN)
        && first.property(keys::JDBC_TYPE) == second.property(keys::JDBC_TYPE)
}

enum KeyTask {
    PrimaryKeys { target: ClassId },
    RemoteCollection { owner: ClassId, collection: String },
    ForeignKeys { owner: ClassId, collection: String },
}

/// Make sure the fields the other side of every association needs exist there.
fn ensure_referenced_keys(model: &mut ModelDef) -> Result<()> {
    let mut tasks = Vec::new();
    for class in model.classes() {
        let Some(owner) = class.id() else { continue };
        for reference in class.references().iter().filter(|r| !r.is_ignored()) {
            let target = class_named(
                model,
                reference.property(keys::CLASS_REF).unwrap_or_default(),
                || format!("the reference {} in class {}", reference.name(), class.name()),
            )?;
            tasks.push(KeyTask::PrimaryKeys { target });
        }
        for collection in class.collections().iter().filter(|c| !c.is_ignored()) {
            let name = collection.name().to_string();
            if collection.has_indirection_table() {
                tasks.push(KeyTask::RemoteCollection {
                    owner,
                    collection: name,
                });
            } else {
                tasks.push(KeyTask::ForeignKeys {
                    owner,
                    collection: name,
                });
            }
        }
    }

    for task in tasks {
        match task {
            KeyTask::PrimaryKeys { target } => ensure_pks_from_hierarchy(model, target)?,
            KeyTask::RemoteCollection { owner, collection } => {
                ensure_remote_collection(model, owner, &collection)?
            }
            KeyTask::ForeignKeys { owner, collection } => {
                ensure_referenced_fks(model, owner, &collection)?
            }
        }
    }
    Ok(())
}

/// Pull the primary keys of all subtypes up into `target`.
fn ensure_pks_from_hierarchy(model: &mut ModelDef, target: ClassId) -> Result<()> {
    let mut pks: Vec<FeatureDef> = Vec::new();
    for id in hierarchy(model, target) {
        for field in model.class(id).primary_keys() {
            match pks.iter().find(|pk| pk.name() == field.name()) {
                Some(found) if !is_equal(field, found) => {
                    return Err(Error::constraint(format!(
                        "Cannot pull up the declaration of the required primary key {} because \
                         its definitions in {} and {} differ",
                        field.name(),
                        owner_name(model, field),
                        owner_name(model, found)
                    )))
                }
                Some(_) => {}
                None => pks.push(field.clone()),
            }
        }
    }
    ensure_fields(model, target, pks)
}

/// Add the given fields to `target` as virtual fields unless already present.
fn ensure_fields(model: &mut ModelDef, target: ClassId, fields: Vec<FeatureDef>) -> Result<()> {
    let force_virtual = !model.class(target).generates_repository_info();

    for field in fields {
        let class = model.class(target);
        if let Some(found) = class.field(field.name()) {
            if !is_equal(&field, found) {
                return Err(Error::constraint(format!(
                    "Cannot pull up the declaration of the required field {} from type {} to \
                     basetype {} because there is already a different field of the same name",
                    field.name(),
                    owner_name(model, &field),
                    class.name()
                )));
            }
            if force_virtual {
                if let Some(found) = model.class_mut(target).field_mut(field.name()) {
                    found.set_property(keys::VIRTUAL_FIELD, "true");
                }
            }
            continue;
        }
        for (kind, existing) in [
            (FeatureKind::Collection, class.collection(field.name())),
            (FeatureKind::Reference, class.reference(field.name())),
        ] {
            if existing.is_some() {
                return Err(Error::constraint(format!(
                    "Cannot pull up the declaration of the required field {} from type {} to \
                     basetype {} because there is already a {} of the same name",
                    field.name(),
                    owner_name(model, &field),
                    class.name(),
                    kind
                )));
            }
        }

        let source = FeatureRef {
            class: field.owner().unwrap_or(target),
            kind: FeatureKind::Field,
            name: field.name().to_string(),
        };
        let mut copy = FeatureDef::clone_declared(&field, source, target);
        copy.set_property(keys::VIRTUAL_FIELD, "true");
        tracing::debug!(
            class = class.name(),
            field = field.name(),
            "pulled up key field"
        );
        model.class_mut(target).add_feature(copy);
    }
    Ok(())
}

/// Pull up the foreign key fields of a 1:n collection into its element class.
///
/// Every class of the element hierarchy that declares a key field must
/// declare it the same way.
fn ensure_referenced_fks(model: &mut ModelDef, owner: ClassId, name: &str) -> Result<()> {
    let owner_class = model.class(owner);
    let Some(collection) = owner_class.collection(name) else {
        return Ok(());
    };
    let element = class_named(
        model,
        collection.property(keys::ELEMENT_CLASS_REF).unwrap_or_default(),
        || format!("the collection {} in class {}", name, owner_class.name()),
    )?;

    let mut slots: Vec<(String, Option<FeatureDef>)> =
        keys::comma_list(collection.property(keys::FOREIGNKEY))
            .map(|key| (key.to_string(), None))
            .collect();

    for id in hierarchy(model, element) {
        let class = model.class(id);
        for (key, slot) in slots.iter_mut() {
            let Some(field) = class.field(key) else {
                continue;
            };
            match slot {
                Some(found) if !is_equal(field, found) => {
                    return Err(Error::constraint(format!(
                        "Cannot pull up the declaration of the required foreignkey {} because \
                         its definitions in {} and {} differ",
                        key,
                        owner_name(model, field),
                        owner_name(model, found)
                    )))
                }
                Some(_) => {}
                None => *slot = Some(field.clone()),
            }
        }
    }

    let mut fields = Vec::with_capacity(slots.len());
    for (key, field) in slots {
        let field = field.ok_or_else(|| {
            Error::constraint(format!(
                "Cannot find field {} in the hierarchy with root type {} which is used as \
                 foreignkey in collection {} in {}",
                key,
                model.class(element).name(),
                name,
                owner_class.name()
            ))
        })?;
        fields.push(field);
    }
    ensure_fields(model, element, fields)
}

/// The declaration a feature was (transitively) cloned from.
fn root_declaration(model: &ModelDef, owner: ClassId, feature: &FeatureDef) -> (ClassId, String) {
    let mut root = (owner, feature.name().to_string());
    let mut link = feature.original().cloned();
    while let Some(source) = link {
        let Some(def) = model.feature(&source) else {
            break;
        };
        root = (source.class, source.name.clone());
        link = def.original().cloned();
    }
    root
}

fn relation_name(model: &ModelDef, root: &(ClassId, String)) -> String {
    format!("{}.{}", model.class(root.0).default_table_name(), root.1)
}

/// Match an m:n collection with its counterpart in the element hierarchy.
///
/// The counterpart shares the indirection table. Its foreign key becomes the
/// `remote-foreignkey` of this collection and vice versa. Both sides get
/// symmetric relation names for the table schema.
fn ensure_remote_collection(model: &mut ModelDef, owner: ClassId, name: &str) -> Result<()> {
    let owner_class = model.class(owner);
    let Some(collection) = owner_class.collection(name) else {
        return Ok(());
    };
    let element = class_named(
        model,
        collection.property(keys::ELEMENT_CLASS_REF).unwrap_or_default(),
        || format!("the collection {} in class {}", name, owner_class.name()),
    )?;
    let indirection_table = collection.property(keys::INDIRECTION_TABLE);
    let local_key = collection.property(keys::FOREIGNKEY);
    let remote_key = collection.property(keys::REMOTE_FOREIGNKEY);

    let mut fitting: Vec<(ClassId, String, Option<String>)> = Vec::new();
    for id in hierarchy(model, element) {
        for other in model.class(id).collections() {
            if id == owner && other.name() == name {
                continue;
            }
            let fits = other.property(keys::INDIRECTION_TABLE) == indirection_table
                && (remote_key.is_none()
                    || keys::same_lists(remote_key, other.property(keys::FOREIGNKEY)))
                && (!other.has_property(keys::REMOTE_FOREIGNKEY)
                    || keys::same_lists(local_key, other.property(keys::REMOTE_FOREIGNKEY)));
            if fits {
                fitting.push((
                    id,
                    other.name().to_string(),
                    other.property(keys::FOREIGNKEY).map(str::to_string),
                ));
            }
        }
    }

    let mut own_remote_key = None;
    if remote_key.is_none() {
        if let Some((_, _, first_key)) = fitting.first() {
            let ambiguous = fitting
                .iter()
                .any(|(_, _, key)| !keys::same_lists(key.as_deref(), first_key.as_deref()));
            if ambiguous {
                return Err(Error::constraint(format!(
                    "Cannot determine the element-side collection that corresponds to the \
                     collection {} in type {} because there are at least two different \
                     collections that would fit. Specifying remote-foreignkey in the original \
                     collection {} will perhaps help",
                    name,
                    owner_class.name(),
                    name
                )));
            }
            own_remote_key = first_key.clone();
        }
    }

    let own_name = relation_name(model, &root_declaration(model, owner, collection));
    let inverse_name = match fitting.first() {
        Some((id, other_name, _)) => {
            let other = model.class(*id).collection(other_name);
            match other {
                Some(other) => relation_name(model, &root_declaration(model, *id, other)),
                None => format!("inverse {}", own_name),
            }
        }
        None => format!("inverse {}", own_name),
    };
    let local_key = local_key.map(str::to_string);

    if let Some(collection) = model
        .class_mut(owner)
        .feature_of_kind_mut(FeatureKind::Collection, name)
    {
        if let Some(key) = own_remote_key {
            collection.set_property(keys::REMOTE_FOREIGNKEY, key);
        }
        if !collection.has_property(keys::RELATION_NAME) {
            collection.set_property(keys::RELATION_NAME, own_name);
        }
        if !collection.has_property(keys::INVERSE_RELATION_NAME) {
            collection.set_property(keys::INVERSE_RELATION_NAME, inverse_name);
        }
    }
    if let Some(local_key) = local_key {
        for (id, other_name, _) in &fitting {
            if let Some(other) = model
                .class_mut(*id)
                .feature_of_kind_mut(FeatureKind::Collection, other_name)
            {
                if !other.has_property(keys::REMOTE_FOREIGNKEY) {
                    other.set_property(keys::REMOTE_FOREIGNKEY, local_key.clone());
                }
            }
        }
    }

    ensure_pks_from_hierarchy(model, element)
}

/// Foreign keys of references must match the primary keys of every mapped target class.
fn check_reference_foreignkeys(checker: &Checker<'_>) -> Result<()> {
    if checker.level.is_none() {
        return Ok(());
    }
    let model = checker.model;
    for class in model.classes() {
        for reference in class.references().iter().filter(|r| !r.is_ignored()) {
            let foreignkey = reference.property(keys::FOREIGNKEY);
            if keys::comma_list(foreignkey).next().is_none() {
                return Err(Error::constraint(format!(
                    "The reference {} in class {} has no foreignkeys",
                    reference.name(),
                    class.name()
                )));
            }
            let key_fields = class.fields_by_names(foreignkey).map_err(|missing| {
                Error::constraint(format!(
                    "The reference {} in class {} specifies a foreignkey {} that is not a \
                     persistent field in its owner class {}",
                    reference.name(),
                    class.name(),
                    missing,
                    class.name()
                ))
            })?;
            if let Some(ignored) = key_fields.iter().find(|f| f.is_ignored()) {
                return Err(Error::constraint(format!(
                    "The reference {} in class {} uses the field {} as foreignkey although this \
                     field is ignored in this class",
                    reference.name(),
                    class.name(),
                    ignored.name()
                )));
            }

            let target = class_named(
                model,
                reference.property(keys::CLASS_REF).unwrap_or_default(),
                || format!("the reference {} in class {}", reference.name(), class.name()),
            )?;
            for id in hierarchy(model, target) {
                let target_class = model.class(id);
                if !target_class.is_persistent() || !target_class.generates_repository_info() {
                    continue;
                }
                let primary_keys = target_class.primary_keys();
                if primary_keys.len() != key_fields.len() {
                    return Err(Error::constraint(format!(
                        "The number of foreignkeys ({}) of the reference {} in class {} doesn't \
                         match the number of primarykeys ({}) of the referenced class (or its \
                         subclass) {}",
                        key_fields.len(),
                        reference.name(),
                        class.name(),
                        primary_keys.len(),
                        target_class.name()
                    )));
                }
                for (key, primary_key) in key_fields.iter().zip(&primary_keys) {
                    if key.property(keys::JDBC_TYPE) != primary_key.property(keys::JDBC_TYPE) {
                        return Err(Error::constraint(format!(
                            "The jdbc-type of foreignkey {} of the reference {} in class {} \
                             doesn't match the jdbc-type of the corresponding primarykey {} of \
                             the referenced class (or its subclass) {}",
                            key.name(),
                            reference.name(),
                            class.name(),
                            primary_key.name(),
                            target_class.name()
                        )));
                    }
                }
            }
        }
    }
    Ok(())
}

/// Foreign keys of collections must match the primary keys of the owner (and element).
fn check_collection_foreignkeys(checker: &Checker<'_>, diagnostics: &mut Diagnostics) -> Result<()> {
    if checker.level.is_none() {
        return Ok(());
    }
    let model = checker.model;
    for class in model.classes() {
        if !class.generates_repository_info() {
            continue;
        }
        for collection in class.collections().iter().filter(|c| !c.is_ignored()) {
            let foreignkey = collection.property(keys::FOREIGNKEY);
            if keys::comma_list(foreignkey).next().is_none() {
                return Err(Error::constraint(format!(
                    "The collection {} in class {} has no foreignkeys",
                    collection.name(),
                    class.name()
                )));
            }
            let element_id = class_named(
                model,
                collection.property(keys::ELEMENT_CLASS_REF).unwrap_or_default(),
                || format!("the collection {} in class {}", collection.name(), class.name()),
            )?;
            let element = model.class(element_id);

            if collection.has_indirection_table() {
                check_indirection_keys(class, collection, element)?;
            } else {
                if collection.has_property(keys::REMOTE_FOREIGNKEY) {
                    diagnostics.warn(
                        "collection.foreignkey",
                        format!(
                            "The collection {} in class {} specifies a remote-foreignkey though \
                             it is a 1:n association; the remote-foreignkey is ignored",
                            collection.name(),
                            class.name()
                        ),
                    );
                }
                check_one_to_many_keys(class, collection, element)?;
                for sub in model.all_extent_classes(element_id) {
                    let sub_class = model.class(sub);
                    if sub_class.is_persistent() && sub_class.generates_repository_info() {
                        check_one_to_many_keys(class, collection, sub_class)?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn check_one_to_many_keys(
    class: &ClassDef,
    collection: &FeatureDef,
    element: &ClassDef,
) -> Result<()> {
    let key_fields = element
        .fields_by_names(collection.property(keys::FOREIGNKEY))
        .map_err(|missing| {
            Error::constraint(format!(
                "The collection {} in class {} specifies a foreignkey {} that is not a \
                 persistent field in the element class (or its subclass) {}",
                collection.name(),
                class.name(),
                missing,
                element.name()
            ))
        })?;
    if let Some(ignored) = key_fields.iter().find(|f| f.is_ignored()) {
        return Err(Error::constraint(format!(
            "The collection {} in class {} uses the field {} of the element class {} as \
             foreignkey although this field is ignored there",
            collection.name(),
            class.name(),
            ignored.name(),
            element.name()
        )));
    }

    let primary_keys = class.primary_keys();
    if primary_keys.len() != key_fields.len() {
        return Err(Error::constraint(format!(
            "The number of foreignkeys ({}) of the collection {} in class {} doesn't match the \
             number of primarykeys ({}) of its owner class",
            key_fields.len(),
            collection.name(),
            class.name(),
            primary_keys.len()
        )));
    }
    for (key, primary_key) in key_fields.iter().zip(&primary_keys) {
        if key.property(keys::JDBC_TYPE) != primary_key.property(keys::JDBC_TYPE) {
            return Err(Error::constraint(format!(
                "The jdbc-type of foreignkey {} in the element class (or its subclass) {} of the \
                 collection {} in class {} doesn't match the jdbc-type of the corresponding \
                 primarykey {} of the owner class",
                key.name(),
                element.name(),
                collection.name(),
                class.name(),
                primary_key.name()
            )));
        }
    }
    Ok(())
}

fn check_indirection_keys(
    class: &ClassDef,
    collection: &FeatureDef,
    element: &ClassDef,
) -> Result<()> {
    let remote_key = collection.property(keys::REMOTE_FOREIGNKEY);
    if keys::comma_list(remote_key).next().is_none() {
        return Err(Error::constraint(format!(
            "The m:n collection {} in class {} has no remote-foreignkey and no corresponding \
             collection in the element class {}",
            collection.name(),
            class.name(),
            element.name()
        )));
    }

    let local_count = keys::comma_list(collection.property(keys::FOREIGNKEY)).count();
    let owner_keys = class.primary_keys().len();
    if local_count != owner_keys {
        return Err(Error::constraint(format!(
            "The number of foreignkeys ({}) of the m:n collection {} in class {} doesn't match \
             the number of primarykeys ({}) of its owner class",
            local_count,
            collection.name(),
            class.name(),
            owner_keys
        )));
    }

    let remote_count = keys::comma_list(remote_key).count();
    let element_keys = element.primary_keys().len();
    if remote_count != element_keys {
        return Err(Error::constraint(format!(
            "The number of remote foreignkeys ({}) of the m:n collection {} in class {} doesn't \
             match the number of primarykeys ({}) of the element class {}",
            remote_count,
            collection.name(),
            class.name(),
            element_keys,
            element.name()
        )));
    }
    Ok(())
}

/// Inherited key fields may not change in a way that breaks associations using them.
fn check_key_modifications(checker: &Checker<'_>) -> Result<()> {
    if checker.level.is_none() {
        return Ok(());
    }
    let model = checker.model;
    for class in model.classes() {
        for field in class.fields().iter().filter(|f| f.is_inherited()) {
            let Some(source) = field.original() else {
                continue;
            };
            let Some(original) = model.feature(source) else {
                continue;
            };
            let modified = (field.is_ignored() && !original.is_ignored())
                || field.property(keys::JDBC_TYPE) != original.property(keys::JDBC_TYPE)
                || field.is_primary_key() != original.is_primary_key();
            if !modified {
                continue;
            }

            let mut current = Some((source.class, original));
            while let Some((owner, declaration)) = current {
                if let Some(usage) = find_key_usage(model, owner, declaration) {
                    return Err(Error::constraint(format!(
                        "Modification of the primarykey/foreignkey field {} in class {} is not \
                         allowed because the field {} in class {} is used by {}",
                        field.name(),
                        class.name(),
                        declaration.name(),
                        model.class(owner).name(),
                        usage
                    )));
                }
                current = declaration
                    .original()
                    .and_then(|r| model.feature(r).map(|def| (r.class, def)));
            }
        }
    }
    Ok(())
}

/// Find an association that depends on `field` declared in class `owner`.
fn find_key_usage(model: &ModelDef, owner: ClassId, field: &FeatureDef) -> Option<String> {
    let owner_name = model.class(owner).qualified_name();
    let target_is_owner = |def: &FeatureDef, key: &str| {
        def.property(key)
            .is_some_and(|name| crate::model::qualified_name(name) == owner_name)
    };

    for class in model.classes() {
        let in_owner = class.id() == Some(owner);
        for reference in class.references().iter().filter(|r| !r.is_ignored()) {
            let uses_pk = field.is_primary_key() && target_is_owner(reference, keys::CLASS_REF);
            let uses_fk =
                in_owner && keys::list_contains(reference.property(keys::FOREIGNKEY), field.name());
            if uses_pk || uses_fk {
                return Some(format!(
                    "the reference {} in class {}",
                    reference.name(),
                    class.name()
                ));
            }
        }
        for collection in class.collections().iter().filter(|c| !c.is_ignored()) {
            let uses = if collection.has_indirection_table() {
                field.is_primary_key()
                    && (in_owner || target_is_owner(collection, keys::ELEMENT_CLASS_REF))
            } else {
                (field.is_primary_key() && in_owner)
                    || (target_is_owner(collection, keys::ELEMENT_CLASS_REF)
                        && keys::list_contains(collection.property(keys::FOREIGNKEY), field.name()))
            };
            if uses {
                return Some(format!(
                    "the collection {} in class {}",
                    collection.name(),
                    class.name()
                ));
            }
        }
    }
    None
}
