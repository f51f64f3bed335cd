//! JSON model descriptors.
//!
//! A descriptor is the serialized input of the model builder: the classes
//! with their declared features, plus optional information about external
//! types used by the strict checks.
//!
//! ```json
//! {
//!   "classes": [{
//!     "name": "com.acme.Person",
//!     "properties": { "ojb-persistent": "true" },
//!     "fields": [{ "name": "id", "properties": { "primarykey": "true" } }]
//!   }],
//!   "types": [{ "name": "com.acme.PersonFactory", "methods": [{ "name": "create", "static": true, "return_type": "com.acme.Person" }] }]
//! }
//! ```

use crate::error::{Error, Result};
use crate::model::{
    ClassDef, Definition, FeatureDef, FeatureKind, IndexDescriptorDef, ModelDef, NestedDef,
    ObjectCacheDef, ProcedureArgumentDef, ProcedureDef, Properties, PROCEDURE_KINDS,
};
use crate::types::{DeclaredTypes, MethodInfo};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

type PropertyMap = BTreeMap<String, String>;

/// A whole model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Classes of the model.
    #[serde(default)]
    pub classes: Vec<ClassDescriptor>,
    /// External types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<TypeDescriptor>,
}

/// A class and its declarations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supertypes: Vec<String>,
    /// Explicitly declared extent classes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extents: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: PropertyMap,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FeatureDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<FeatureDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<FeatureDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested: Vec<NestedDescriptor>,
    /// Property overrides by (inherited or nested) feature name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub modifications: BTreeMap<String, PropertyMap>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indices: Vec<NamedDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_cache: Option<ObjectCacheDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub procedures: Vec<ProcedureDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub procedure_arguments: Vec<NamedDescriptor>,
}

/// A field, reference or collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureDescriptor {
    pub name: String,
    /// Anonymous features have no Java counterpart (fields and references only).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub anonymous: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: PropertyMap,
}

/// A nested object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NestedDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: PropertyMap,
}

/// An index or procedure argument: a name plus properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: PropertyMap,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectCacheDescriptor {
    pub class: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: PropertyMap,
}

/// A stored procedure; `kind` is `insert`, `update` or `delete`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcedureDescriptor {
    pub kind: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: PropertyMap,
}

/// A type outside the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub name: String,
    #[serde(default)]
    pub supertypes: Vec<String>,
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub return_type: Option<String>,
}

fn properties_of(map: &PropertyMap) -> Properties {
    map.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

fn map_of(properties: &Properties) -> PropertyMap {
    properties
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn with_properties<D: Definition>(mut def: D, map: &PropertyMap) -> D {
    for (key, value) in map {
        def.properties_mut().set(key.as_str(), value.as_str());
    }
    def
}

impl ModelDescriptor {
    /// Parse a descriptor from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a descriptor file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), bytes = json.len(), "read model descriptor");
        Self::from_json(&json)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the model and the type information for types outside it.
    ///
    /// The type information starts from the framework types the checks need
    /// (collection classes, conversion and row reader interfaces, etc.).
    pub fn into_model(self) -> Result<(ModelDef, DeclaredTypes)> {
        let mut model = ModelDef::new();
        for class in self.classes {
            model.add_class(class.into_class()?)?;
        }

        let mut types = DeclaredTypes::with_ojb_defaults();
        for declared in self.types {
            types.declare(declared.name.clone(), declared.supertypes);
            for method in declared.methods {
                types.declare_method(
                    declared.name.clone(),
                    method.name,
                    MethodInfo {
                        is_static: method.is_static,
                        is_abstract: method.is_abstract,
                        return_type: method.return_type,
                    },
                );
            }
        }
        tracing::debug!(classes = model.len(), types = types.len(), "built model from descriptor");
        Ok((model, types))
    }

    /// Describe a model. Features are exported as they currently are, so a
    /// processed model yields its flattened classes.
    pub fn from_model(model: &ModelDef) -> Self {
        Self {
            classes: model.classes().map(ClassDescriptor::from_class).collect(),
            types: Vec::new(),
        }
    }
}

impl ClassDescriptor {
    fn into_class(self) -> Result<ClassDef> {
        let mut class = with_properties(ClassDef::new(self.name.clone()), &self.properties);
        for supertype in self.supertypes {
            class = class.with_supertype(supertype);
        }
        for extent in self.extents {
            class = class.with_extent(extent);
        }

        let kinds = [
            (FeatureKind::Field, self.fields),
            (FeatureKind::Reference, self.references),
            (FeatureKind::Collection, self.collections),
        ];
        for (kind, features) in kinds {
            for feature in features {
                let def = match (kind, feature.anonymous) {
                    (_, false) => FeatureDef::new(kind, feature.name),
                    (FeatureKind::Field, true) => FeatureDef::anonymous_field(feature.name),
                    (FeatureKind::Reference, true) => FeatureDef::anonymous_reference(feature.name),
                    (FeatureKind::Collection, true) => {
                        return Err(Error::Descriptor(format!(
                            "the collection {} in class {} cannot be anonymous",
                            feature.name, self.name
                        )))
                    }
                };
                class.add_feature(with_properties(def, &feature.properties));
            }
        }

        for nested in self.nested {
            class = class.with_nested(with_properties(
                NestedDef::new(nested.name, nested.type_name),
                &nested.properties,
            ));
        }
        for (feature, overrides) in self.modifications {
            class = class.with_modification(feature, overrides);
        }
        for index in self.indices {
            let def = IndexDescriptorDef::new(index.name, "");
            class = class.with_index(with_properties(def, &index.properties));
        }
        if let Some(cache) = self.object_cache {
            class = class.with_object_cache(with_properties(
                ObjectCacheDef::new(cache.class),
                &cache.properties,
            ));
        }
        for procedure in self.procedures {
            if !PROCEDURE_KINDS.contains(&procedure.kind.as_str()) {
                return Err(Error::Descriptor(format!(
                    "unknown procedure kind '{}' in class {}, expected insert, update or delete",
                    procedure.kind, self.name
                )));
            }
            class = class.with_procedure(with_properties(
                ProcedureDef::new(procedure.kind),
                &procedure.properties,
            ));
        }
        for argument in self.procedure_arguments {
            class = class.with_procedure_argument(ProcedureArgumentDef::with_properties(
                argument.name,
                properties_of(&argument.properties),
            ));
        }
        Ok(class)
    }

    fn from_class(class: &ClassDef) -> Self {
        let features = |kind: FeatureKind| -> Vec<FeatureDescriptor> {
            class
                .features(kind)
                .iter()
                .map(|f| FeatureDescriptor {
                    name: f.name().to_string(),
                    anonymous: f.is_anonymous(),
                    properties: map_of(f.properties()),
                })
                .collect()
        };
        let named = |name: &str, properties: &Properties| NamedDescriptor {
            name: name.to_string(),
            properties: map_of(properties),
        };

        Self {
            name: class.name().to_string(),
            supertypes: class.supertypes().to_vec(),
            extents: class.extent_names().to_vec(),
            properties: map_of(class.properties()),
            fields: features(FeatureKind::Field),
            references: features(FeatureKind::Reference),
            collections: features(FeatureKind::Collection),
            nested: class
                .nested()
                .iter()
                .map(|n| NestedDescriptor {
                    name: n.name().to_string(),
                    type_name: n.type_name().to_string(),
                    properties: map_of(n.properties()),
                })
                .collect(),
            modifications: class
                .modification_names()
                .filter_map(|name| Some((name.to_string(), class.modification(name)?.clone())))
                .collect(),
            indices: class
                .index_descriptors()
                .iter()
                .map(|i| named(i.name(), i.properties()))
                .collect(),
            object_cache: class.object_cache().map(|cache| ObjectCacheDescriptor {
                class: cache.class_name().to_string(),
                properties: map_of(cache.properties()),
            }),
            procedures: class
                .procedures()
                .map(|p| ProcedureDescriptor {
                    kind: p.kind().to_string(),
                    properties: map_of(p.properties()),
                })
                .collect(),
            procedure_arguments: class
                .procedure_arguments()
                .map(|a| named(a.name(), a.properties()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckLevel;
    use crate::model::keys;
    use crate::types::TypeOracle;

    const PERSON: &str = r#"{
        "classes": [
            {
                "name": "com.acme.Person",
                "properties": { "ojb-persistent": "true" },
                "fields": [
                    { "name": "id", "properties": { "primarykey": "true", "jdbc-type": "INTEGER" } },
                    { "name": "name", "properties": { "jdbc-type": "VARCHAR" } }
                ],
                "indices": [{ "name": "person_name", "properties": { "fields": "name" } }]
            },
            {
                "name": "com.acme.Employee",
                "supertypes": ["com.acme.Person"],
                "properties": { "ojb-persistent": "true" },
                "modifications": { "name": { "length": "80" } }
            }
        ],
        "types": [
            {
                "name": "com.acme.PersonFactory",
                "methods": [{ "name": "create", "static": true, "return_type": "com.acme.Person" }]
            }
        ]
    }"#;

    #[test]
    fn test_into_model() {
        let (mut model, types) = ModelDescriptor::from_json(PERSON).unwrap().into_model().unwrap();
        assert_eq!(model.len(), 2);
        assert!(types.contains("com.acme.PersonFactory"));
        assert!(types.contains(keys::MANAGEABLE_COLLECTION_INTERFACE));
        let create = types.find_method("com.acme.PersonFactory", "create").unwrap().unwrap();
        assert!(create.is_static);

        model.check_constraints_with(CheckLevel::Strict, &types).unwrap();
        let employee = model.class_by_name("com.acme.Employee").unwrap();
        assert_eq!(employee.field("name").unwrap().property(keys::LENGTH), Some("80"));
        let person = model.class_by_name("com.acme.Person").unwrap();
        assert_eq!(person.index_descriptors()[0].field_names().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn test_anonymous_collection_rejected() {
        let json = r#"{ "classes": [{ "name": "A", "collections": [{ "name": "c", "anonymous": true }] }] }"#;
        let err = ModelDescriptor::from_json(json).unwrap().into_model().unwrap_err();
        assert!(matches!(err, Error::Descriptor(_)));
    }

    #[test]
    fn test_unknown_procedure_kind() {
        let json = r#"{ "classes": [{ "name": "A", "procedures": [{ "kind": "upsert" }] }] }"#;
        let err = ModelDescriptor::from_json(json).unwrap().into_model().unwrap_err();
        assert!(err.to_string().contains("upsert"));
    }

    #[test]
    fn test_from_model_exports_flattened_classes() {
        let (mut model, _) = ModelDescriptor::from_json(PERSON).unwrap().into_model().unwrap();
        model.process().unwrap();

        let exported = ModelDescriptor::from_model(&model);
        let employee = exported
            .classes
            .iter()
            .find(|c| c.name == "com.acme.Employee")
            .unwrap();
        let names: Vec<_> = employee.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);
        assert!(exported.to_json().unwrap().contains("\"com.acme.Employee\""));
    }

    #[test]
    fn test_malformed_json() {
        let err = ModelDescriptor::from_json("{ \"classes\": 3 }").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
