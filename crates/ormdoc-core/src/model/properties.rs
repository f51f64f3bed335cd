//! Property bags shared by every definition in the model.

use std::collections::BTreeMap;

/// Raw property overrides (a modification). An empty value removes the property.
pub type PropertyOverrides = BTreeMap<String, String>;

/// Ordered string-keyed properties. Setting an empty value removes the key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    values: BTreeMap<String, String>,
}

impl Properties {
    /// Create an empty property bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a property value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set a property. An empty value removes it.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if value.is_empty() {
            self.values.remove(&key);
        } else {
            self.values.insert(key, value);
        }
    }

    /// Remove a property.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    /// Check if a (non-empty) property is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Interpret a property as a boolean.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        to_bool(self.get(key), default)
    }

    /// Copy every override onto this bag, removing properties overridden with empty values.
    pub fn apply(&mut self, overrides: &PropertyOverrides) {
        for (key, value) in overrides {
            self.set(key.clone(), value.clone());
        }
    }

    /// Iterate over all properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut properties = Properties::new();
        for (key, value) in iter {
            properties.set(key, value);
        }
        properties
    }
}

/// Interpret an optional string as a boolean, falling back to `default`.
pub fn to_bool(value: Option<&str>, default: bool) -> bool {
    match value {
        Some(v) if v.eq_ignore_ascii_case("true") => true,
        Some(v) if v.eq_ignore_ascii_case("false") => false,
        _ => default,
    }
}

/// A named entity carrying properties.
pub trait Definition {
    /// Name of the definition.
    fn name(&self) -> &str;

    /// The property bag.
    fn properties(&self) -> &Properties;

    /// The property bag, mutably.
    fn properties_mut(&mut self) -> &mut Properties;

    /// Get a property value.
    fn property(&self, key: &str) -> Option<&str> {
        self.properties().get(key)
    }

    /// Set a property. An empty value removes it.
    fn set_property(&mut self, key: &str, value: impl Into<String>)
    where
        Self: Sized,
    {
        self.properties_mut().set(key, value);
    }

    /// Remove a property.
    fn remove_property(&mut self, key: &str) {
        self.properties_mut().remove(key);
    }

    /// Check if a property is present.
    fn has_property(&self, key: &str) -> bool {
        self.properties().contains(key)
    }

    /// Get a boolean property.
    fn boolean_property(&self, key: &str, default: bool) -> bool {
        self.properties().get_bool(key, default)
    }

    /// Apply a modification.
    fn apply_modifications(&mut self, overrides: &PropertyOverrides) {
        self.properties_mut().apply(overrides);
    }
}

/// Implements [`Definition`] for structs with `name` and `properties` fields.
macro_rules! impl_definition {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::model::Definition for $ty {
                fn name(&self) -> &str {
                    &self.name
                }

                fn properties(&self) -> &$crate::model::Properties {
                    &self.properties
                }

                fn properties_mut(&mut self) -> &mut $crate::model::Properties {
                    &mut self.properties
                }
            }
        )+
    };
}

pub(crate) use impl_definition;
