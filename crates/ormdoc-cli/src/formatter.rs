//! Output formatters for checked models.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use ormdoc_core::{
    keys, ClassDef, Definition, Diagnostics, FeatureDef, ModelDef, ModelDescriptor, TableDef,
    TorqueModelDef,
};

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter {
    /// Format a table schema.
    fn format_schema(&self, schema: &TorqueModelDef) -> Result<String, serde_json::Error>;

    /// Format the classes of a processed model.
    fn format_model(&self, model: &ModelDef) -> Result<String, serde_json::Error>;

    /// Format the warnings of a run.
    fn format_diagnostics(&self, diagnostics: &Diagnostics) -> Result<String, serde_json::Error>;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_schema(&self, schema: &TorqueModelDef) -> Result<String, serde_json::Error> {
        if schema.is_empty() {
            return Ok(format!("Database {}: no tables", schema.name));
        }
        let tables: Vec<String> = schema.tables.values().map(format_table).collect();
        Ok(format!("Database {}\n\n{}", schema.name, tables.join("\n\n")))
    }

    fn format_model(&self, model: &ModelDef) -> Result<String, serde_json::Error> {
        if model.is_empty() {
            return Ok("No classes".to_string());
        }
        let classes: Vec<String> = model.classes().map(format_class).collect();
        Ok(classes.join("\n\n"))
    }

    fn format_diagnostics(&self, diagnostics: &Diagnostics) -> Result<String, serde_json::Error> {
        if diagnostics.is_empty() {
            return Ok("No warnings".to_string());
        }
        let mut table = Table::new();
        table.set_header(vec!["Rule", "Warning"]);
        for diagnostic in diagnostics.entries() {
            table.add_row(vec![Cell::new(diagnostic.rule), Cell::new(&diagnostic.message)]);
        }
        Ok(format!("{} warning(s)\n{}", diagnostics.len(), table))
    }
}

fn yes(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        ""
    }
}

fn format_table(def: &TableDef) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Column", "Type", "Size", "PK", "Required", "Auto"]);
    for column in &def.columns {
        table.add_row(vec![
            Cell::new(&column.name),
            Cell::new(&column.jdbc_type),
            Cell::new(column.size.as_deref().unwrap_or("")),
            Cell::new(yes(column.primary_key)),
            Cell::new(yes(column.required)),
            Cell::new(yes(column.auto_increment)),
        ]);
    }

    let mut output = format!("{}\n{}", def.name, table);
    for foreignkey in &def.foreignkeys {
        output.push_str(&format!(
            "\n  FOREIGN KEY ({}) REFERENCES {} ({})",
            foreignkey.local_columns.join(", "),
            foreignkey.foreign_table,
            foreignkey.remote_columns.join(", ")
        ));
    }
    for index in &def.indices {
        output.push_str(&format!(
            "\n  {}INDEX {} ({})",
            if index.unique { "UNIQUE " } else { "" },
            index.name,
            index.columns.join(", ")
        ));
    }
    output
}

fn feature_details(feature: &FeatureDef) -> String {
    let details = [
        keys::COLUMN,
        keys::JDBC_TYPE,
        keys::CLASS_REF,
        keys::ELEMENT_CLASS_REF,
        keys::FOREIGNKEY,
        keys::INDIRECTION_TABLE,
    ];
    details
        .iter()
        .filter_map(|key| feature.property(key).map(|value| format!("{}={}", key, value)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_class(class: &ClassDef) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Feature", "Kind", "Origin", "PK", "Details"]);
    for feature in class
        .fields()
        .iter()
        .chain(class.references())
        .chain(class.collections())
    {
        table.add_row(vec![
            Cell::new(feature.name()),
            Cell::new(feature.kind()),
            Cell::new(format!("{:?}", feature.origin()).to_lowercase()),
            Cell::new(yes(feature.is_primary_key())),
            Cell::new(feature_details(feature)),
        ]);
    }
    let table_name = class.property(keys::TABLE).unwrap_or("-");
    format!("{} (table {})\n{}", class.name(), table_name, table)
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_schema(&self, schema: &TorqueModelDef) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(schema)
    }

    fn format_model(&self, model: &ModelDef) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&ModelDescriptor::from_model(model))
    }

    fn format_diagnostics(&self, diagnostics: &Diagnostics) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(diagnostics.entries())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ormdoc_core::{CheckLevel, ColumnDef};

    fn schema() -> TorqueModelDef {
        let mut schema = TorqueModelDef::new("acme");
        let table = schema.table_mut("PERSON");
        let mut id = ColumnDef::new("ID", "INTEGER");
        id.primary_key = true;
        id.required = true;
        table.add_column(id);
        schema
    }

    #[test]
    fn test_table_schema() {
        let output = TableFormatter.format_schema(&schema()).unwrap();
        assert!(output.starts_with("Database acme"));
        assert!(output.contains("PERSON"));
        assert!(output.contains("INTEGER"));
    }

    #[test]
    fn test_json_schema() {
        let output = JsonFormatter.format_schema(&schema()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["tables"]["PERSON"]["columns"][0]["name"], "ID");
    }

    #[test]
    fn test_diagnostics() {
        let mut diagnostics = Diagnostics::quiet();
        assert_eq!(TableFormatter.format_diagnostics(&diagnostics).unwrap(), "No warnings");

        diagnostics.warn("class.primarykey", "The class A has no primary key");
        let output = TableFormatter.format_diagnostics(&diagnostics).unwrap();
        assert!(output.starts_with("1 warning(s)"));

        let json = JsonFormatter.format_diagnostics(&diagnostics).unwrap();
        assert!(json.contains("class.primarykey"));
    }

    #[test]
    fn test_model_listing() {
        let mut model = ModelDef::new();
        model
            .add_class(ClassDef::persistent("com.acme.Person").with_feature(
                FeatureDef::field("id").with_property(keys::JDBC_TYPE, "INTEGER").primary_key(),
            ))
            .unwrap();
        model.check_constraints(CheckLevel::Basic).unwrap();

        let output = TableFormatter.format_model(&model).unwrap();
        assert!(output.contains("com.acme.Person (table Person)"));
        assert!(output.contains("jdbc-type=INTEGER"));
    }
}
