//! Field rules.

use super::Checker;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::model::{keys, Definition, FeatureDef};
use crate::types::jdbc;

/// Check and complete one field.
pub(crate) fn check(
    checker: &Checker<'_>,
    field: &mut FeatureDef,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    let owner = checker.owner_name(field);

    ensure_column(field);
    ensure_jdbc_type(checker, field, owner)?;
    ensure_conversion(checker, field, owner, diagnostics)?;
    ensure_length(field, owner, diagnostics);
    ensure_precision_and_scale(field, owner, diagnostics);
    check_locking(checker, field, owner)?;
    check_sequence_name(checker, field, owner)?;
    check_id(checker, field, owner)?;
    if field.is_anonymous() {
        check_anonymous(checker, field, owner)
    } else {
        check_readonly_access_for_native_pks(checker, field, owner, diagnostics);
        Ok(())
    }
}

/// Default the column to the field name, flattening nested names.
fn ensure_column(field: &mut FeatureDef) {
    if !field.has_property(keys::COLUMN) {
        let column = field.name().replace("::", "_");
        field.set_property(keys::COLUMN, column);
    }
}

fn ensure_jdbc_type(checker: &Checker<'_>, field: &mut FeatureDef, owner: &str) -> Result<()> {
    if let Some(jdbc_type) = field.property(keys::JDBC_TYPE) {
        if !checker.level.is_none() && !jdbc::is_valid_jdbc_type(jdbc_type) {
            return Err(Error::constraint(format!(
                "The field {} in class {} specifies the invalid jdbc type {}",
                field.name(),
                owner,
                jdbc_type
            )));
        }
        return Ok(());
    }

    let variable_type = field.property(keys::VARIABLE_TYPE).map(str::to_string);
    let jdbc_type = match (field.property(keys::DEFAULT_JDBC_TYPE), &variable_type) {
        (Some(default), _) => default.to_string(),
        (None, Some(java_type)) => jdbc::default_jdbc_type(java_type).to_string(),
        (None, None) => {
            return Err(Error::constraint(format!(
                "The field {} in class {} has no jdbc-type specified",
                field.name(),
                owner
            )))
        }
    };
    field.set_property(keys::JDBC_TYPE, jdbc_type);

    if !field.has_property(keys::CONVERSION) {
        let conversion = match (field.property(keys::DEFAULT_CONVERSION), &variable_type) {
            (Some(default), _) => Some(default.to_string()),
            (None, Some(java_type)) if !field.has_property(keys::DEFAULT_JDBC_TYPE) => {
                jdbc::default_conversion(java_type).map(str::to_string)
            }
            _ => None,
        };
        if let Some(conversion) = conversion {
            field.set_property(keys::CONVERSION, conversion);
        }
    }
    Ok(())
}

fn ensure_conversion(
    checker: &Checker<'_>,
    field: &FeatureDef,
    owner: &str,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    if checker.level.is_none() {
        return Ok(());
    }

    if field.property(keys::VARIABLE_TYPE) == Some("java.util.Date")
        && !field.has_property(keys::CONVERSION)
    {
        diagnostics.warn(
            "field.conversion",
            format!(
                "The field {} in class {} is of type java.util.Date which is not directly \
                 supported; specify a conversion like \
                 org.apache.ojb.broker.accesslayer.conversions.JavaDate2SqlDateFieldConversion",
                field.name(),
                owner
            ),
        );
    }

    if checker.level.is_strict() {
        if let Some(conversion) = field.property(keys::CONVERSION) {
            checker.check_implements(
                diagnostics,
                "field.conversion",
                conversion,
                keys::FIELD_CONVERSION_INTERFACE,
                &format!(
                    "conversion class {} specified for field {} in class {}",
                    conversion,
                    field.name(),
                    owner
                ),
            )?;
        }
    }
    Ok(())
}

fn ensure_length(field: &mut FeatureDef, owner: &str, diagnostics: &mut Diagnostics) {
    if field.has_property(keys::LENGTH) {
        return;
    }
    let jdbc_type = field.property(keys::JDBC_TYPE).unwrap_or_default();
    if let Some(length) = jdbc::default_length(jdbc_type) {
        diagnostics.warn(
            "field.length",
            format!(
                "The field {} in class {} has no length setting though its jdbc type requires \
                 it (in most databases); using default length of {}",
                field.name(),
                owner,
                length
            ),
        );
        field.set_property(keys::LENGTH, length);
    }
}

fn ensure_precision_and_scale(field: &mut FeatureDef, owner: &str, diagnostics: &mut Diagnostics) {
    let jdbc_type = field
        .property(keys::JDBC_TYPE)
        .unwrap_or_default()
        .to_string();

    if !field.has_property(keys::PRECISION) {
        let precision = match jdbc::default_precision(&jdbc_type) {
            Some(precision) => Some((
                precision,
                "has no precision setting though its jdbc type requires it (in most databases)",
            )),
            None if field.has_property(keys::SCALE) => {
                Some(("1", "has a scale setting but no precision setting"))
            }
            None => None,
        };
        if let Some((precision, reason)) = precision {
            diagnostics.warn(
                "field.precision",
                format!(
                    "The field {} in class {} {}; using default precision of {}",
                    field.name(),
                    owner,
                    reason,
                    precision
                ),
            );
            field.set_property(keys::PRECISION, precision);
        }
    }

    if !field.has_property(keys::SCALE) {
        let scale = match jdbc::default_scale(&jdbc_type) {
            Some(scale) => Some((
                scale,
                "has no scale setting though its jdbc type requires it (in most databases)",
            )),
            None if field.has_property(keys::PRECISION) => {
                Some(("0", "has a precision setting but no scale setting"))
            }
            None => None,
        };
        if let Some((scale, reason)) = scale {
            diagnostics.warn(
                "field.scale",
                format!(
                    "The field {} in class {} {}; using default scale of {}",
                    field.name(),
                    owner,
                    reason,
                    scale
                ),
            );
            field.set_property(keys::SCALE, scale);
        }
    }
}

fn check_locking(checker: &Checker<'_>, field: &FeatureDef, owner: &str) -> Result<()> {
    if checker.level.is_none() {
        return Ok(());
    }
    let locking = field.boolean_property(keys::LOCKING, false)
        || field.boolean_property(keys::UPDATE_LOCK, false);
    let jdbc_type = field.property(keys::JDBC_TYPE).unwrap_or_default();
    if locking && jdbc_type != "TIMESTAMP" && jdbc_type != "INTEGER" {
        return Err(Error::constraint(format!(
            "The field {} in class {} has locking set to true though it is not of TIMESTAMP \
             or INTEGER type",
            field.name(),
            owner
        )));
    }
    Ok(())
}

fn check_sequence_name(checker: &Checker<'_>, field: &FeatureDef, owner: &str) -> Result<()> {
    if checker.level.is_none() || !field.has_property(keys::SEQUENCE_NAME) {
        return Ok(());
    }
    match field.property(keys::AUTOINCREMENT) {
        Some(keys::AUTOINCREMENT_OJB) | Some(keys::AUTOINCREMENT_DATABASE) => Ok(()),
        _ => Err(Error::constraint(format!(
            "The field {} in class {} has a sequence-name though its autoincrement is neither \
             'ojb' nor 'database'",
            field.name(),
            owner
        ))),
    }
}

fn check_id(checker: &Checker<'_>, field: &FeatureDef, owner: &str) -> Result<()> {
    if checker.level.is_none() {
        return Ok(());
    }
    match field.property(keys::ID) {
        Some(id) if id.trim().parse::<i64>().is_err() => Err(Error::constraint(format!(
            "The id {} of the field {} in class {} is not a valid number",
            id,
            field.name(),
            owner
        ))),
        _ => Ok(()),
    }
}

fn check_anonymous(checker: &Checker<'_>, field: &FeatureDef, owner: &str) -> Result<()> {
    if checker.level.is_none() {
        return Ok(());
    }
    if field.property(keys::ACCESS) != Some(keys::ACCESS_ANONYMOUS) {
        return Err(Error::constraint(format!(
            "The access property of the field {} defined in class {} cannot be changed",
            field.name(),
            owner
        )));
    }
    if field.name().is_empty() {
        return Err(Error::constraint(format!(
            "An anonymous field defined in class {} has no name",
            owner
        )));
    }
    Ok(())
}

fn check_readonly_access_for_native_pks(
    checker: &Checker<'_>,
    field: &mut FeatureDef,
    owner: &str,
    diagnostics: &mut Diagnostics,
) {
    if checker.level.is_none() {
        return;
    }
    if field.property(keys::AUTOINCREMENT) == Some(keys::AUTOINCREMENT_DATABASE)
        && field.property(keys::ACCESS) != Some(keys::ACCESS_READONLY)
    {
        diagnostics.warn(
            "field.access",
            format!(
                "The field {} in class {} is set to database auto-increment, therefore its \
                 access is set to 'readonly'",
                field.name(),
                owner
            ),
        );
        field.set_property(keys::ACCESS, keys::ACCESS_READONLY);
    }
}
