//! Reference rules.

use super::Checker;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::model::{keys, ClassDef, ClassId, Definition, FeatureDef};
use std::collections::{HashSet, VecDeque};

/// Check and complete one reference.
pub(crate) fn check(
    checker: &Checker<'_>,
    reference: &mut FeatureDef,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    let owner = checker.owner_name(reference);

    ensure_class_ref(checker, reference, owner, diagnostics)?;
    checker.check_proxy_prefetching_limit(
        diagnostics,
        "reference.proxy",
        &*reference,
        reference.boolean_property(keys::PROXY, false),
        &format!("reference {} in class {}", reference.name(), owner),
    )
}

/// Resolve the referenced class and store its name as `class-ref`.
fn ensure_class_ref(
    checker: &Checker<'_>,
    reference: &mut FeatureDef,
    owner: &str,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    let target_name = match reference
        .property(keys::CLASS_REF)
        .or_else(|| reference.property(keys::DEFAULT_CLASS_REF))
    {
        Some(name) => name.to_string(),
        None => reference
            .property(keys::VARIABLE_TYPE)
            .and_then(|var| default_persistent_subtype(checker, var))
            .map(|class| class.name().to_string())
            .ok_or_else(|| {
                Error::constraint(format!(
                    "No class specified for reference {} in class {}",
                    reference.name(),
                    owner
                ))
            })?,
    };

    let target = checker.model.class_by_name(&target_name).ok_or_else(|| {
        Error::constraint(format!(
            "The class {} referenced by {} in class {} is unknown or not persistent",
            target_name,
            reference.name(),
            owner
        ))
    })?;
    if !target.is_persistent() {
        return Err(Error::constraint(format!(
            "The class {} referenced by {} in class {} is not persistent",
            target_name,
            reference.name(),
            owner
        )));
    }

    if checker.level.is_strict() {
        if reference.is_anonymous() {
            let is_base = checker
                .types
                .is_same_or_subtype(owner, target.name(), false)
                .unwrap_or(false);
            if !is_base {
                return Err(Error::constraint(format!(
                    "The class {} referenced by the anonymous reference {} in class {} is not a \
                     base type of {}",
                    target.name(),
                    reference.name(),
                    owner,
                    owner
                )));
            }
        } else if let Some(variable_type) = reference.property(keys::VARIABLE_TYPE) {
            let compatible = checker.actual_subtype(
                diagnostics,
                "reference.class-ref",
                target.name(),
                variable_type,
                &format!("reference {} in class {}", reference.name(), owner),
            )?;
            if compatible == Some(false) {
                return Err(Error::constraint(format!(
                    "The class {} referenced by {} in class {} is not the same or a subtype of \
                     the variable type {}",
                    target.name(),
                    reference.name(),
                    owner,
                    variable_type
                )));
            }
        }
    }

    reference.set_property(keys::CLASS_REF, target.name());
    Ok(())
}

/// Breadth-first search for the first persistent class among a type and its subtypes.
pub(crate) fn default_persistent_subtype<'a>(
    checker: &Checker<'a>,
    type_name: &str,
) -> Option<&'a ClassDef> {
    let start = checker.model.class_id(type_name)?;
    let mut queue = VecDeque::from([start]);
    let mut seen: HashSet<ClassId> = HashSet::new();

    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        let class = checker.model.class(id);
        if class.is_persistent() {
            return Some(class);
        }
        queue.extend(class.extents().iter().copied());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckLevel;
    use crate::model::{ClassDef, ModelDef};
    use crate::types::NoTypeInfo;

    fn model() -> ModelDef {
        let mut model = ModelDef::new();
        model.add_class(ClassDef::new("com.acme.Party")).unwrap();
        model
            .add_class(ClassDef::persistent("com.acme.Person").with_supertype("com.acme.Party"))
            .unwrap();
        model.add_class(ClassDef::new("com.acme.Draft")).unwrap();
        model
            .add_class(
                ClassDef::persistent("com.acme.Address")
                    .with_feature(FeatureDef::reference("owner"))
                    .with_feature(FeatureDef::reference("draft").with_property(keys::CLASS_REF, "com.acme.Draft")),
            )
            .unwrap();
        model.process().unwrap();
        model
    }

    fn run(
        model: &ModelDef,
        reference: &str,
        level: CheckLevel,
        edit: impl FnOnce(&mut FeatureDef),
    ) -> (Result<()>, FeatureDef) {
        let class = model.class_by_name("com.acme.Address").unwrap();
        let mut reference = class.reference(reference).unwrap().clone();
        edit(&mut reference);
        let checker = Checker::new(model, level, &NoTypeInfo);
        let mut diagnostics = Diagnostics::quiet();
        let result = check(&checker, &mut reference, &mut diagnostics);
        (result, reference)
    }

    #[test]
    fn test_class_ref_from_variable_type() {
        let model = model();
        let (result, reference) = run(&model, "owner", CheckLevel::Strict, |r| {
            r.set_property(keys::VARIABLE_TYPE, "com.acme.Party");
        });
        result.unwrap();
        assert_eq!(reference.property(keys::CLASS_REF), Some("com.acme.Person"));
    }

    #[test]
    fn test_missing_class() {
        let model = model();
        let (result, _) = run(&model, "owner", CheckLevel::Basic, |_| {});
        assert_eq!(
            result.unwrap_err().to_string(),
            "No class specified for reference owner in class com.acme.Address"
        );
    }

    #[test]
    fn test_target_must_be_persistent() {
        let model = model();
        let (result, _) = run(&model, "draft", CheckLevel::Basic, |_| {});
        assert!(result.unwrap_err().to_string().contains("is not persistent"));
    }

    #[test]
    fn test_strict_compatibility() {
        let model = model();
        let (result, _) = run(&model, "owner", CheckLevel::Strict, |r| {
            r.set_property(keys::CLASS_REF, "com.acme.Address");
            r.set_property(keys::VARIABLE_TYPE, "com.acme.Party");
        });
        assert!(result.unwrap_err().to_string().contains("variable type com.acme.Party"));

        let (result, _) = run(&model, "owner", CheckLevel::Basic, |r| {
            r.set_property(keys::CLASS_REF, "com.acme.Address");
            r.set_property(keys::VARIABLE_TYPE, "com.acme.Party");
        });
        assert!(result.is_ok());
    }

    #[test]
    fn test_proxy_prefetching_limit() {
        let model = model();
        let (result, _) = run(&model, "owner", CheckLevel::Basic, |r| {
            r.set_property(keys::CLASS_REF, "com.acme.Person");
            r.set_property(keys::PROXY_PREFETCHING_LIMIT, "-1");
        });
        assert!(result.is_err());
    }
}
