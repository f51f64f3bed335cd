//! Table schema types.

use serde::Serialize;

/// A column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// JDBC type name.
    pub jdbc_type: String,
    /// Size constraint (`length` or `precision,scale`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Part of the primary key.
    pub primary_key: bool,
    /// `NOT NULL` column.
    pub required: bool,
    /// Values are generated by the database.
    pub auto_increment: bool,
    /// Column documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ColumnDef {
    /// Create a nullable, non-key column.
    pub fn new(name: impl Into<String>, jdbc_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            jdbc_type: jdbc_type.into(),
            size: None,
            primary_key: false,
            required: false,
            auto_increment: false,
            description: None,
        }
    }
}

/// A foreign key from a table to another one.
///
/// Two foreign keys are equal when they connect the same columns, whatever
/// their names.
#[derive(Debug, Clone, Serialize)]
pub struct ForeignkeyDef {
    /// Constraint name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Referenced table.
    pub foreign_table: String,
    /// Columns of the owning table.
    pub local_columns: Vec<String>,
    /// Columns of the referenced table.
    pub remote_columns: Vec<String>,
}

impl PartialEq for ForeignkeyDef {
    fn eq(&self, other: &Self) -> bool {
        self.foreign_table == other.foreign_table
            && self.local_columns == other.local_columns
            && self.remote_columns == other.remote_columns
    }
}

impl Eq for ForeignkeyDef {}

/// An index over columns of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDef {
    /// Index name.
    pub name: String,
    /// Unique index.
    pub unique: bool,
    /// Indexed columns.
    pub columns: Vec<String>,
}

/// A table of the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDef {
    /// Table name.
    pub name: String,
    /// Table documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDef>,
    /// Foreign keys.
    pub foreignkeys: Vec<ForeignkeyDef>,
    /// Indices.
    pub indices: Vec<IndexDef>,
}

impl TableDef {
    /// Create an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documentation: None,
            columns: Vec::new(),
            foreignkeys: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Add a column. A column of the same name that is already present wins.
    pub fn add_column(&mut self, column: ColumnDef) {
        if self.column(&column.name).is_none() {
            self.columns.push(column);
        }
    }

    /// Add a foreign key unless an equal one is already present.
    pub fn add_foreignkey(&mut self, foreignkey: ForeignkeyDef) {
        if !self.foreignkeys.contains(&foreignkey) {
            self.foreignkeys.push(foreignkey);
        }
    }

    /// Add an index unless one of the same name is already present.
    pub fn add_index(&mut self, index: IndexDef) {
        if !self.indices.iter().any(|i| i.name == index.name) {
            self.indices.push(index);
        }
    }

    /// Names of the primary key columns.
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_column_wins() {
        let mut table = TableDef::new("PERSON");
        table.add_column(ColumnDef::new("ID", "INTEGER"));
        table.add_column(ColumnDef::new("ID", "VARCHAR"));
        assert_eq!(table.columns.len(), 1);
        assert_eq!(table.column("ID").unwrap().jdbc_type, "INTEGER");
    }

    #[test]
    fn test_foreignkeys_compare_without_name() {
        let mut table = TableDef::new("PERSON_PROJECT");
        let unnamed = ForeignkeyDef {
            name: None,
            foreign_table: "PERSON".into(),
            local_columns: vec!["PERSON_ID".into()],
            remote_columns: vec!["ID".into()],
        };
        let named = ForeignkeyDef {
            name: Some("Person.projects".into()),
            ..unnamed.clone()
        };
        table.add_foreignkey(unnamed);
        table.add_foreignkey(named);
        assert_eq!(table.foreignkeys.len(), 1);
    }
}
