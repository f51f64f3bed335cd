//! Flattening: copying inherited and nested features into a class.

use super::feature::{FeatureDef, FeatureKind, FeatureOrigin, FeatureRef};
use super::keys;
use super::{ClassDef, ClassId, Definition, ModelDef};
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use std::collections::HashSet;

const KINDS: [FeatureKind; 3] = [
    FeatureKind::Field,
    FeatureKind::Reference,
    FeatureKind::Collection,
];

/// Flatten one class whose base and nested types are already flattened.
///
/// Inherited and nested features are prepended to the own features of each
/// kind, then the fields are sorted by their `id` property.
pub(super) fn flatten_class(
    model: &mut ModelDef,
    id: ClassId,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    if model.class(id).has_been_processed() {
        return Ok(());
    }

    let additions = collect_features(model, id, diagnostics)?;

    let class = model.class_mut(id);
    for (kind, mut features) in KINDS.into_iter().zip(additions) {
        let own = std::mem::take(class.features_mut(kind));
        features.extend(own);
        *class.features_mut(kind) = features;
    }
    sort_fields(class.features_mut(FeatureKind::Field));
    class.mark_processed();

    tracing::debug!(
        class = class.name(),
        fields = class.fields().len(),
        references = class.references().len(),
        collections = class.collections().len(),
        "flattened class"
    );
    Ok(())
}

/// Clone the features this class inherits or embeds, grouped by kind.
fn collect_features(
    model: &ModelDef,
    id: ClassId,
    diagnostics: &mut Diagnostics,
) -> Result<[Vec<FeatureDef>; 3]> {
    let class = model.class(id);
    let mut collected: [Vec<FeatureDef>; 3] = Default::default();
    let mut names: HashSet<String> = HashSet::new();

    if class.boolean_property(keys::INCLUDE_INHERITED, true) {
        for base_id in relevant_base_types(model, id) {
            let base = model.class(base_id);
            for (slot, kind) in KINDS.into_iter().enumerate() {
                for feature in base.features(kind) {
                    if feature.is_super_reference() || names.contains(feature.name()) {
                        continue;
                    }
                    if let Some(own) = class.feature(feature.name()) {
                        ensure_redefinable(class, base, own, feature)?;
                        diagnostics.warn(
                            "class.redefinition",
                            format!(
                                "Class {} redefines the inherited {} {} of class {}",
                                class.name(),
                                feature.kind(),
                                feature.name(),
                                base.name()
                            ),
                        );
                        names.insert(feature.name().to_string());
                        continue;
                    }

                    let source = FeatureRef {
                        class: base_id,
                        kind,
                        name: feature.name().to_string(),
                    };
                    let mut copy = FeatureDef::clone_with_overrides(
                        feature,
                        source,
                        id,
                        None,
                        class.modification(feature.name()),
                    );
                    copy.set_origin(FeatureOrigin::Inherited);
                    names.insert(copy.name().to_string());
                    collected[slot].push(copy);
                }
            }
        }
    }

    for nested in class.nested() {
        let nested_id = nested.nested_type().ok_or_else(|| {
            Error::constraint(format!(
                "The type {} of the nested object {} in class {} is not part of the model",
                nested.type_name(),
                nested.name(),
                class.name()
            ))
        })?;
        let nested_class = model.class(nested_id);
        let prefix = nested.prefix();

        for (slot, kind) in KINDS.into_iter().enumerate() {
            for feature in nested_class.features(kind) {
                if feature.is_super_reference() {
                    continue;
                }
                let name = format!("{}{}", prefix, feature.name());
                if class.feature(&name).is_some() || names.contains(&name) {
                    diagnostics.warn(
                        "class.redefinition",
                        format!(
                            "Class {} redefines the {} {} of the nested object {}",
                            class.name(),
                            feature.kind(),
                            name,
                            nested.name()
                        ),
                    );
                    continue;
                }

                let source = FeatureRef {
                    class: nested_id,
                    kind,
                    name: feature.name().to_string(),
                };
                let mut copy = FeatureDef::clone_with_overrides(
                    feature,
                    source,
                    id,
                    Some(&prefix),
                    class.modification(&name),
                );
                copy.set_origin(FeatureOrigin::Nested);
                names.insert(name);
                collected[slot].push(copy);
            }
        }
    }

    Ok(collected)
}

fn ensure_redefinable(
    class: &ClassDef,
    base: &ClassDef,
    own: &FeatureDef,
    inherited: &FeatureDef,
) -> Result<()> {
    if inherited.kind() == FeatureKind::Field && inherited.is_anonymous() {
        return Err(Error::constraint(format!(
            "The anonymous field {} defined in class {} cannot be overridden in class {}",
            inherited.name(),
            base.name(),
            class.name()
        )));
    }
    if own.kind() == FeatureKind::Field && own.is_anonymous() {
        return Err(Error::constraint(format!(
            "The anonymous field {} in class {} overrides an inherited field of class {}",
            own.name(),
            class.name(),
            base.name()
        )));
    }
    Ok(())
}

/// Base types whose features are copied, in copy order.
///
/// A base that does not include its own inherited features is preceded by
/// its relevant bases, so the whole chain is still covered.
fn relevant_base_types(model: &ModelDef, id: ClassId) -> Vec<ClassId> {
    let mut result = Vec::new();
    add_relevant_base_types(model, id, &mut result);
    result
}

fn add_relevant_base_types(model: &ModelDef, id: ClassId, result: &mut Vec<ClassId>) {
    for &base in model.class(id).base_types() {
        if !model.class(base).boolean_property(keys::INCLUDE_INHERITED, true) {
            add_relevant_base_types(model, base, result);
        }
        if !result.contains(&base) {
            result.push(base);
        }
    }
}

/// Stable sort: numeric ids ascending, then unparseable ids, then fields without id.
fn sort_fields(fields: &mut [FeatureDef]) {
    fields.sort_by_key(|field| match field.property(keys::ID) {
        Some(id) => match id.trim().parse::<i64>() {
            Ok(n) => (0, n),
            Err(_) => (1, 0),
        },
        None => (2, 0),
    });
}
