//! Constraint checks run after flattening.
//!
//! Each feature is checked on its own first (fields, references, then
//! collections of every class), followed by the class-level rules of that
//! class. The cross-class rules run last, once every class passed.
//!
//! Checks may complete the model (default columns, types, table names and
//! pulled-up key fields) besides rejecting it.

mod class;
mod collection;
mod cross_class;
mod field;
mod reference;

use crate::config::CheckLevel;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result, TypeLookupError};
use crate::model::{keys, ClassDef, Definition, FeatureDef, FeatureKind, ModelDef};
use crate::types::{InheritanceHelper, TypeOracle};

/// Shared state of one checking pass over a model.
pub(crate) struct Checker<'a> {
    pub model: &'a ModelDef,
    pub level: CheckLevel,
    pub types: InheritanceHelper<'a>,
}

impl<'a> Checker<'a> {
    pub fn new(model: &'a ModelDef, level: CheckLevel, oracle: &'a dyn TypeOracle) -> Self {
        Self {
            model,
            level,
            types: InheritanceHelper::new(model, oracle),
        }
    }

    /// Name of the class owning `feature`.
    pub fn owner_name(&self, feature: &FeatureDef) -> &'a str {
        feature
            .owner()
            .and_then(|id| self.model.get(id))
            .map(ClassDef::name)
            .unwrap_or_default()
    }

    /// Ask the type information whether `type_name` is `base` or a subtype.
    ///
    /// Returns `None` (after a warning) when no type information is available.
    pub fn actual_subtype(
        &self,
        diagnostics: &mut Diagnostics,
        rule: &'static str,
        type_name: &str,
        base: &str,
        subject: &str,
    ) -> Result<Option<bool>> {
        match self.types.is_same_or_subtype(type_name, base, true) {
            Ok(result) => Ok(Some(result)),
            Err(TypeLookupError::NotFound(class)) => Err(Error::constraint(format!(
                "Could not find the class {} on the classpath while checking the {}",
                class, subject
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

    /// Fail unless `type_name` implements `interface`.
    pub fn check_implements(
        &self,
        diagnostics: &mut Diagnostics,
        rule: &'static str,
        type_name: &str,
        interface: &str,
        subject: &str,
    ) -> Result<()> {
        match self.actual_subtype(diagnostics, rule, type_name, interface, subject)? {
            Some(false) => Err(Error::constraint(format!(
                "The {} does not implement the necessary interface {}",
                subject, interface
            ))),
            _ => Ok(()),
        }
    }

    /// Validate the `proxy-prefetching-limit` of a class, reference or collection.
    pub fn check_proxy_prefetching_limit(
        &self,
        diagnostics: &mut Diagnostics,
        rule: &'static str,
        def: &impl Definition,
        has_proxy: bool,
        subject: &str,
    ) -> Result<()> {
        if self.level.is_none() {
            return Ok(());
        }
        let Some(limit) = def.property(keys::PROXY_PREFETCHING_LIMIT) else {
            return Ok(());
        };
        if limit.trim().parse::<u32>().is_err() {
            return Err(Error::constraint(format!(
                "The proxy-prefetching-limit {} of the {} is not a non-negative number",
                limit, subject
            )));
        }
        if !has_proxy {
            diagnostics.warn(
                rule,
                format!(
                    "The {} has a proxy-prefetching-limit property but no proxy property",
                    subject
                ),
            );
        }
        Ok(())
    }
}

const KINDS: [FeatureKind; 3] = [
    FeatureKind::Field,
    FeatureKind::Reference,
    FeatureKind::Collection,
];

/// Run every check over a processed model.
pub(crate) fn check_model(
    model: &mut ModelDef,
    level: CheckLevel,
    oracle: &dyn TypeOracle,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    for id in model.class_ids() {
        for kind in KINDS {
            let count = model.class(id).features(kind).len();
            for index in 0..count {
                let mut feature = model.class(id).features(kind)[index].clone();
                let checker = Checker::new(model, level, oracle);
                match kind {
                    FeatureKind::Field => field::check(&checker, &mut feature, diagnostics)?,
                    FeatureKind::Reference => {
                        reference::check(&checker, &mut feature, diagnostics)?
                    }
                    FeatureKind::Collection => {
                        collection::check(&checker, &mut feature, diagnostics)?
                    }
                }
                model.class_mut(id).features_mut(kind)[index] = feature;
            }
        }

        let mut class = model.class(id).clone();
        class::check(&Checker::new(model, level, oracle), &mut class, diagnostics)?;
        *model.class_mut(id) = class;
    }

    cross_class::check(model, level, oracle, diagnostics)
}
