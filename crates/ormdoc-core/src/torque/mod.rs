//! Table schema derived from a checked model.
//!
//! Every class generating table info contributes a table. Classes sharing a
//! table name are merged, m:n collections add their indirection tables.

mod builder;
mod table;

pub use table::{ColumnDef, ForeignkeyDef, IndexDef, TableDef};

use crate::error::Result;
use crate::model::ModelDef;
use serde::Serialize;
use std::collections::BTreeMap;

/// A database schema: named tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TorqueModelDef {
    /// Database name.
    pub name: String,
    /// Tables by name.
    pub tables: BTreeMap<String, TableDef>,
}

impl TorqueModelDef {
    /// Create an empty schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: BTreeMap::new(),
        }
    }

    /// Build the schema of a model that passed the constraint checks.
    ///
    /// Returns [`Error::NotChecked`](crate::Error::NotChecked) otherwise.
    pub fn build(name: impl Into<String>, model: &ModelDef) -> Result<Self> {
        builder::build(name.into(), model)
    }

    /// Get a table by name.
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.get(name)
    }

    /// Get a table, creating it if necessary.
    pub fn table_mut(&mut self, name: &str) -> &mut TableDef {
        self.tables
            .entry(name.to_string())
            .or_insert_with(|| TableDef::new(name))
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if the schema has no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
