//! Conversion of a checked model into tables.

use super::{ColumnDef, ForeignkeyDef, IndexDef, TorqueModelDef};
use crate::error::{Error, Result};
use crate::model::{keys, ClassDef, ClassId, Definition, FeatureDef, ModelDef};

pub(super) fn build(name: String, model: &ModelDef) -> Result<TorqueModelDef> {
    if !model.is_checked() {
        return Err(Error::NotChecked);
    }

    let mut schema = TorqueModelDef::new(name);
    for class in model.classes() {
        if let Some(table) = table_of(class) {
            add_columns(&mut schema, class, table);
        }
    }

    for class in model.classes() {
        let Some(table) = table_of(class) else {
            continue;
        };
        add_reference_foreignkeys(&mut schema, model, class, table);
        for collection in class.collections().iter().filter(|c| !c.is_ignored()) {
            if collection.has_indirection_table() {
                add_indirection_table(&mut schema, model, class, collection);
            } else {
                add_collection_foreignkey(&mut schema, model, class, collection);
            }
        }
        add_indices(&mut schema, class, table);
    }

    tracing::debug!(database = %schema.name, tables = schema.len(), "built table schema");
    Ok(schema)
}

fn table_of(class: &ClassDef) -> Option<&str> {
    if class.is_persistent() && class.generates_table_info() {
        class.property(keys::TABLE)
    } else {
        None
    }
}

fn column_name(field: &FeatureDef) -> &str {
    field.property(keys::COLUMN).unwrap_or(field.name())
}

fn column_of(field: &FeatureDef) -> ColumnDef {
    let primary_key = field.is_primary_key();
    ColumnDef {
        name: column_name(field).to_string(),
        jdbc_type: field.property(keys::JDBC_TYPE).unwrap_or_default().to_string(),
        size: field.size_constraint(),
        primary_key,
        required: primary_key || !field.boolean_property(keys::NULLABLE, true),
        auto_increment: field.property(keys::AUTOINCREMENT) == Some(keys::AUTOINCREMENT_DATABASE),
        description: field
            .property(keys::COLUMN_DOCUMENTATION)
            .or_else(|| field.property(keys::DOCUMENTATION))
            .map(str::to_string),
    }
}

fn add_columns(schema: &mut TorqueModelDef, class: &ClassDef, table_name: &str) {
    let table = schema.table_mut(table_name);
    if table.documentation.is_none() {
        table.documentation = class
            .property(keys::TABLE_DOCUMENTATION)
            .or_else(|| class.property(keys::DOCUMENTATION))
            .map(str::to_string);
    }
    for field in class.fields().iter().filter(|f| !f.is_ignored()) {
        table.add_column(column_of(field));
    }
}

/// The table shared by a class and all its subtypes, if they map to exactly one.
fn hierarchy_table(model: &ModelDef, id: ClassId) -> Option<&str> {
    let mut found: Option<&str> = None;
    let classes = std::iter::once(id).chain(model.all_extent_classes(id));
    for class in classes.map(|id| model.class(id)) {
        let Some(table) = table_of(class) else {
            continue;
        };
        match found {
            Some(existing) if existing != table => return None,
            _ => found = Some(table),
        }
    }
    found
}

fn key_columns(class: &ClassDef, names: Option<&str>) -> Option<Vec<String>> {
    let fields = class.fields_by_names(names).ok()?;
    Some(fields.iter().map(|f| column_name(f).to_string()).collect())
}

fn primary_key_columns(class: &ClassDef) -> Vec<String> {
    class
        .primary_keys()
        .iter()
        .map(|f| column_name(f).to_string())
        .collect()
}

fn wants_foreignkey(feature: &FeatureDef) -> bool {
    feature.boolean_property(keys::DATABASE_FOREIGNKEY, true)
}

fn class_of(model: &ModelDef, feature: &FeatureDef, key: &str) -> Option<ClassId> {
    feature.property(key).and_then(|name| model.class_id(name))
}

fn add_reference_foreignkeys(
    schema: &mut TorqueModelDef,
    model: &ModelDef,
    class: &ClassDef,
    table: &str,
) {
    for reference in class.references() {
        if reference.is_ignored() || !wants_foreignkey(reference) {
            continue;
        }
        let Some(target) = class_of(model, reference, keys::CLASS_REF) else {
            continue;
        };
        let Some(foreign_table) = hierarchy_table(model, target) else {
            continue;
        };
        let Some(local_columns) = key_columns(class, reference.property(keys::FOREIGNKEY)) else {
            continue;
        };
        let remote_columns = primary_key_columns(model.class(target));
        if local_columns.is_empty() || local_columns.len() != remote_columns.len() {
            continue;
        }
        schema.table_mut(table).add_foreignkey(ForeignkeyDef {
            name: None,
            foreign_table: foreign_table.to_string(),
            local_columns,
            remote_columns,
        });
    }
}

/// The element table of a 1:n collection points back to the owner table.
fn add_collection_foreignkey(
    schema: &mut TorqueModelDef,
    model: &ModelDef,
    owner: &ClassDef,
    collection: &FeatureDef,
) {
    if !wants_foreignkey(collection) {
        return;
    }
    let Some(element) = class_of(model, collection, keys::ELEMENT_CLASS_REF) else {
        return;
    };
    let Some(owner_table) = owner.id().and_then(|id| hierarchy_table(model, id)) else {
        return;
    };
    let Some(element_table) = hierarchy_table(model, element) else {
        return;
    };
    let Some(local_columns) =
        key_columns(model.class(element), collection.property(keys::FOREIGNKEY))
    else {
        return;
    };
    let remote_columns = primary_key_columns(owner);
    if local_columns.is_empty() || local_columns.len() != remote_columns.len() {
        return;
    }
    schema.table_mut(element_table).add_foreignkey(ForeignkeyDef {
        name: None,
        foreign_table: owner_table.to_string(),
        local_columns,
        remote_columns,
    });
}

fn add_indirection_table(
    schema: &mut TorqueModelDef,
    model: &ModelDef,
    owner: &ClassDef,
    collection: &FeatureDef,
) {
    let Some(table_name) = collection.property(keys::INDIRECTION_TABLE) else {
        return;
    };
    let Some(element) = class_of(model, collection, keys::ELEMENT_CLASS_REF) else {
        return;
    };
    let local_key: Vec<String> = keys::comma_list(collection.property(keys::FOREIGNKEY))
        .map(str::to_string)
        .collect();
    let remote_key: Vec<String> = keys::comma_list(collection.property(keys::REMOTE_FOREIGNKEY))
        .map(str::to_string)
        .collect();
    let as_primary_key = collection.boolean_property(keys::INDIRECTION_TABLE_PRIMARYKEYS, false);

    {
        let table = schema.table_mut(table_name);
        if table.documentation.is_none() {
            table.documentation = collection
                .property(keys::INDIRECTION_TABLE_DOCUMENTATION)
                .map(str::to_string);
        }
        let sides = [
            (&local_key, owner, keys::FOREIGNKEY_DOCUMENTATION),
            (&remote_key, model.class(element), keys::REMOTE_FOREIGNKEY_DOCUMENTATION),
        ];
        for (columns, class, documentation) in sides {
            for (column, primary_key) in columns.iter().zip(class.primary_keys()) {
                let mut def = ColumnDef::new(
                    column.clone(),
                    primary_key.property(keys::JDBC_TYPE).unwrap_or_default(),
                );
                def.size = primary_key.size_constraint();
                def.primary_key = as_primary_key;
                def.required = as_primary_key;
                def.description = collection.property(documentation).map(str::to_string);
                table.add_column(def);
            }
        }
    }

    if !wants_foreignkey(collection) {
        return;
    }
    let sides = [
        (owner.id(), local_key, keys::RELATION_NAME),
        (Some(element), remote_key, keys::INVERSE_RELATION_NAME),
    ];
    for (class, local_columns, relation) in sides {
        let Some(class) = class else {
            continue;
        };
        let Some(foreign_table) = hierarchy_table(model, class) else {
            continue;
        };
        let remote_columns = primary_key_columns(model.class(class));
        if local_columns.is_empty() || local_columns.len() != remote_columns.len() {
            continue;
        }
        schema.table_mut(table_name).add_foreignkey(ForeignkeyDef {
            name: collection.property(relation).map(str::to_string),
            foreign_table: foreign_table.to_string(),
            local_columns,
            remote_columns,
        });
    }
}

fn add_indices(schema: &mut TorqueModelDef, class: &ClassDef, table: &str) {
    for index in class.index_descriptors() {
        let columns = index
            .field_names()
            .filter_map(|name| class.field(name))
            .map(|field| column_name(field).to_string())
            .collect();
        schema.table_mut(table).add_index(IndexDef {
            name: index.name().to_string(),
            unique: index.is_unique(),
            columns,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckLevel;
    use crate::model::IndexDescriptorDef;

    fn field(name: &str, jdbc_type: &str) -> FeatureDef {
        FeatureDef::field(name).with_property(keys::JDBC_TYPE, jdbc_type)
    }

    fn checked(classes: Vec<ClassDef>) -> ModelDef {
        let mut model = ModelDef::new();
        for class in classes {
            model.add_class(class).unwrap();
        }
        model.check_constraints(CheckLevel::Basic).unwrap();
        model
    }

    fn person_and_address() -> Vec<ClassDef> {
        vec![
            ClassDef::persistent("com.acme.Person")
                .with_feature(field("id", "INTEGER").primary_key())
                .with_feature(
                    FeatureDef::field("name")
                        .with_property(keys::JDBC_TYPE, "VARCHAR")
                        .with_property(keys::NULLABLE, "false"),
                )
                .with_index(IndexDescriptorDef::new("person_name", "name").unique()),
            ClassDef::persistent("com.acme.Address")
                .with_feature(field("id", "INTEGER").primary_key())
                .with_feature(field("personId", "INTEGER"))
                .with_feature(
                    FeatureDef::reference("person")
                        .with_property(keys::CLASS_REF, "com.acme.Person")
                        .with_property(keys::FOREIGNKEY, "personId"),
                ),
        ]
    }

    #[test]
    fn test_refuses_unchecked_model() {
        let mut model = ModelDef::new();
        model.add_class(ClassDef::persistent("A")).unwrap();
        let err = TorqueModelDef::build("db", &model).unwrap_err();
        assert!(matches!(err, Error::NotChecked));
    }

    #[test]
    fn test_tables_columns_and_reference_foreignkey() {
        let model = checked(person_and_address());
        let schema = TorqueModelDef::build("db", &model).unwrap();
        assert_eq!(schema.len(), 2);

        let person = schema.table("Person").unwrap();
        let name = person.column("name").unwrap();
        assert_eq!(name.jdbc_type, "VARCHAR");
        assert_eq!(name.size.as_deref(), Some("254"));
        assert!(name.required);
        assert_eq!(person.primary_key_columns().collect::<Vec<_>>(), vec!["id"]);
        assert_eq!(person.indices[0].columns, vec!["name"]);
        assert!(person.indices[0].unique);

        let address = schema.table("Address").unwrap();
        assert_eq!(address.foreignkeys.len(), 1);
        assert_eq!(address.foreignkeys[0].foreign_table, "Person");
        assert_eq!(address.foreignkeys[0].local_columns, vec!["personId"]);
        assert_eq!(address.foreignkeys[0].remote_columns, vec!["id"]);
    }

    #[test]
    fn test_database_foreignkey_disabled() {
        let mut classes = person_and_address();
        let address = classes.pop().unwrap();
        let mut address_without_fk = ClassDef::persistent("com.acme.Address");
        for feature in address.fields().iter().chain(address.references()) {
            let mut feature = feature.clone();
            if feature.name() == "person" {
                feature.set_property(keys::DATABASE_FOREIGNKEY, "false");
            }
            address_without_fk.add_feature(feature);
        }
        classes.push(address_without_fk);

        let schema = TorqueModelDef::build("db", &checked(classes)).unwrap();
        assert!(schema.table("Address").unwrap().foreignkeys.is_empty());
    }

    #[test]
    fn test_shared_table_merges_columns() {
        let model = checked(vec![
            ClassDef::persistent("Vehicle")
                .with_property(keys::TABLE, "VEHICLE")
                .with_feature(field("id", "INTEGER").primary_key()),
            ClassDef::persistent("Car")
                .with_supertype("Vehicle")
                .with_property(keys::TABLE, "VEHICLE")
                .with_feature(field("doors", "INTEGER")),
        ]);
        let schema = TorqueModelDef::build("db", &model).unwrap();
        assert_eq!(schema.len(), 1);
        let names: Vec<_> = schema.table("VEHICLE").unwrap().columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "doors"]);
    }

    #[test]
    fn test_indirection_table() {
        let model = checked(vec![
            ClassDef::persistent("Person")
                .with_feature(field("id", "INTEGER").primary_key())
                .with_feature(
                    FeatureDef::collection("projects")
                        .with_property(keys::ELEMENT_CLASS_REF, "Project")
                        .with_property(keys::INDIRECTION_TABLE, "PERSON_PROJECT")
                        .with_property(keys::INDIRECTION_TABLE_PRIMARYKEYS, "true")
                        .with_property(keys::FOREIGNKEY, "PERSON_ID"),
                ),
            ClassDef::persistent("Project")
                .with_feature(field("id", "BIGINT").primary_key())
                .with_feature(
                    FeatureDef::collection("members")
                        .with_property(keys::ELEMENT_CLASS_REF, "Person")
                        .with_property(keys::INDIRECTION_TABLE, "PERSON_PROJECT")
                        .with_property(keys::FOREIGNKEY, "PROJECT_ID"),
                ),
        ]);
        let schema = TorqueModelDef::build("db", &model).unwrap();
        let table = schema.table("PERSON_PROJECT").unwrap();

        let person_id = table.column("PERSON_ID").unwrap();
        assert_eq!(person_id.jdbc_type, "INTEGER");
        assert!(person_id.primary_key);
        assert_eq!(table.column("PROJECT_ID").unwrap().jdbc_type, "BIGINT");

        assert_eq!(table.foreignkeys.len(), 2);
        let to_person = table
            .foreignkeys
            .iter()
            .find(|fk| fk.foreign_table == "Person")
            .unwrap();
        assert_eq!(to_person.name.as_deref(), Some("Person.projects"));
        assert_eq!(to_person.local_columns, vec!["PERSON_ID"]);
    }
}
