//! Property names, well-known type names and helpers for comma-separated lists.

use super::feature::FeatureKind;

// ============== Property names ==============
//
// Keys of class, feature and procedure properties, spelled as in model
// descriptors and modifications.

pub const ACCESS: &str = "access";
pub const ARGUMENTS: &str = "arguments";
pub const ARRAY_ELEMENT_CLASS_REF: &str = "array-element-class-ref";
pub const ATTRIBUTES: &str = "attributes";
pub const AUTO_DELETE: &str = "auto-delete";
pub const AUTO_RETRIEVE: &str = "auto-retrieve";
pub const AUTO_UPDATE: &str = "auto-update";
pub const AUTOINCREMENT: &str = "autoincrement";
pub const CLASS: &str = "class";
pub const CLASS_REF: &str = "class-ref";
pub const COLLECTION_CLASS: &str = "collection-class";
pub const COLUMN: &str = "column";
pub const COLUMN_DOCUMENTATION: &str = "column-documentation";
pub const CONVERSION: &str = "conversion";
pub const DATABASE_FOREIGNKEY: &str = "database-foreignkey";
pub const DEFAULT_CLASS_REF: &str = "default-class-ref";
pub const DEFAULT_CONVERSION: &str = "default-conversion";
pub const DEFAULT_FETCH: &str = "default-fetch";
pub const DEFAULT_JDBC_TYPE: &str = "default-jdbc-type";
pub const DOCUMENTATION: &str = "documentation";
pub const ELEMENT_CLASS_REF: &str = "element-class-ref";
pub const FACTORY_CLASS: &str = "factory-class";
pub const FACTORY_METHOD: &str = "factory-method";
pub const FIELD_REF: &str = "field-ref";
pub const FIELDS: &str = "fields";
pub const FOREIGNKEY: &str = "foreignkey";
pub const FOREIGNKEY_DOCUMENTATION: &str = "foreignkey-documentation";
pub const GENERATE_REPOSITORY_INFO: &str = "generate-repository-info";
pub const GENERATE_TABLE_INFO: &str = "generate-table-info";
pub const ID: &str = "id";
pub const IGNORE: &str = "ignore";
pub const INCLUDE_INHERITED: &str = "include-inherited";
pub const INDEXED: &str = "indexed";
pub const INDIRECTION_TABLE: &str = "indirection-table";
pub const INDIRECTION_TABLE_DOCUMENTATION: &str = "indirection-table-documentation";
pub const INDIRECTION_TABLE_PRIMARYKEYS: &str = "indirection-table-primarykeys";
pub const INITIALIZATION_METHOD: &str = "initialization-method";
pub const IS_ABSTRACT: &str = "abstract";
pub const JDBC_TYPE: &str = "jdbc-type";
pub const LENGTH: &str = "length";
pub const LOCKING: &str = "locking";
pub const NAME: &str = "name";
pub const NULLABLE: &str = "nullable";
pub const OJB_PERSISTENT: &str = "ojb-persistent";
pub const ORDERBY: &str = "orderby";
pub const OTM_DEPENDENT: &str = "otm-dependent";
pub const PRECISION: &str = "precision";
pub const PRIMARYKEY: &str = "primarykey";
pub const PROXY: &str = "proxy";
pub const PROXY_PREFETCHING_LIMIT: &str = "proxy-prefetching-limit";
pub const QUERY_CUSTOMIZER: &str = "query-customizer";
pub const QUERY_CUSTOMIZER_ATTRIBUTES: &str = "query-customizer-attributes";
pub const REFRESH: &str = "refresh";
pub const REMOTE_FOREIGNKEY: &str = "remote-foreignkey";
pub const REMOTE_FOREIGNKEY_DOCUMENTATION: &str = "remote-foreignkey-documentation";
pub const RETURN_FIELD_REF: &str = "return-field-ref";
pub const ROW_READER: &str = "row-reader";
pub const SCALE: &str = "scale";
pub const SEQUENCE_NAME: &str = "sequence-name";
pub const TABLE: &str = "table";
pub const TABLE_DOCUMENTATION: &str = "table-documentation";
pub const TYPE: &str = "type";
pub const UNIQUE: &str = "unique";
pub const UPDATE_LOCK: &str = "update-lock";
pub const VALUE: &str = "value";
pub const VARIABLE_TYPE: &str = "variable-type";
pub const VIRTUAL_FIELD: &str = "virtual-field";

// ============== Derived properties ==============

/// Relation name of an m:n collection used for table schema foreign keys.
pub const RELATION_NAME: &str = "relation-name";
/// Relation name of the element side of an m:n collection.
pub const INVERSE_RELATION_NAME: &str = "inverse-relation-name";

// ============== Property values ==============

/// `access` value of anonymous fields.
pub const ACCESS_ANONYMOUS: &str = "anonymous";
/// `access` value of read-only fields.
pub const ACCESS_READONLY: &str = "readonly";
/// `autoincrement` value for OJB-generated keys.
pub const AUTOINCREMENT_OJB: &str = "ojb";
/// `autoincrement` value for database-generated keys.
pub const AUTOINCREMENT_DATABASE: &str = "database";
/// Name of the anonymous reference to the super class.
pub const SUPER_REFERENCE: &str = "super";
/// Procedure argument type whose value comes from a field.
pub const ARGUMENT_TYPE_RUNTIME: &str = "runtime";

// ============== Interfaces ==============

/// Implemented by `conversion` classes.
pub const FIELD_CONVERSION_INTERFACE: &str =
    "org.apache.ojb.broker.accesslayer.conversions.FieldConversion";
/// Implemented by `row-reader` classes.
pub const ROW_READER_INTERFACE: &str = "org.apache.ojb.broker.accesslayer.RowReader";
/// Implemented by object cache classes.
pub const OBJECT_CACHE_INTERFACE: &str = "org.apache.ojb.broker.cache.ObjectCache";
/// Implemented by `query-customizer` classes.
pub const QUERY_CUSTOMIZER_INTERFACE: &str = "org.apache.ojb.broker.accesslayer.QueryCustomizer";
/// Required of `collection-class` classes.
pub const MANAGEABLE_COLLECTION_INTERFACE: &str = "org.apache.ojb.broker.ManageableCollection";
/// Required of collection variable types.
pub const JAVA_COLLECTION_INTERFACE: &str = "java.util.Collection";

const FIELD_MODIFIABLE: &[&str] = &[
    ACCESS,
    ATTRIBUTES,
    AUTOINCREMENT,
    COLUMN,
    COLUMN_DOCUMENTATION,
    CONVERSION,
    DEFAULT_FETCH,
    DOCUMENTATION,
    ID,
    IGNORE,
    INDEXED,
    JDBC_TYPE,
    LENGTH,
    LOCKING,
    NULLABLE,
    PRECISION,
    PRIMARYKEY,
    SCALE,
    SEQUENCE_NAME,
    UPDATE_LOCK,
];

const REFERENCE_MODIFIABLE: &[&str] = &[
    ATTRIBUTES,
    AUTO_DELETE,
    AUTO_RETRIEVE,
    AUTO_UPDATE,
    CLASS_REF,
    DATABASE_FOREIGNKEY,
    DEFAULT_FETCH,
    DOCUMENTATION,
    FOREIGNKEY,
    IGNORE,
    OTM_DEPENDENT,
    PROXY,
    PROXY_PREFETCHING_LIMIT,
    REFRESH,
];

const COLLECTION_MODIFIABLE: &[&str] = &[
    ATTRIBUTES,
    AUTO_DELETE,
    AUTO_RETRIEVE,
    AUTO_UPDATE,
    COLLECTION_CLASS,
    DATABASE_FOREIGNKEY,
    DEFAULT_FETCH,
    DOCUMENTATION,
    ELEMENT_CLASS_REF,
    FOREIGNKEY,
    FOREIGNKEY_DOCUMENTATION,
    IGNORE,
    INDIRECTION_TABLE,
    INDIRECTION_TABLE_DOCUMENTATION,
    INDIRECTION_TABLE_PRIMARYKEYS,
    ORDERBY,
    OTM_DEPENDENT,
    PROXY,
    PROXY_PREFETCHING_LIMIT,
    QUERY_CUSTOMIZER,
    QUERY_CUSTOMIZER_ATTRIBUTES,
    REFRESH,
    REMOTE_FOREIGNKEY,
    REMOTE_FOREIGNKEY_DOCUMENTATION,
];

/// Check whether a modification may change `property` on a feature of `kind`.
pub fn is_modifiable(kind: FeatureKind, property: &str) -> bool {
    let allowed = match kind {
        FeatureKind::Field => FIELD_MODIFIABLE,
        FeatureKind::Reference => REFERENCE_MODIFIABLE,
        FeatureKind::Collection => COLLECTION_MODIFIABLE,
    };
    allowed.contains(&property)
}

/// Split a comma-separated list into trimmed, non-empty entries.
pub fn comma_list(value: Option<&str>) -> impl Iterator<Item = &str> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Compare two comma-separated lists entry by entry, ignoring surrounding whitespace.
pub fn same_lists(first: Option<&str>, second: Option<&str>) -> bool {
    comma_list(first).eq(comma_list(second))
}

/// Check whether a comma-separated list contains `entry`.
pub fn list_contains(list: Option<&str>, entry: &str) -> bool {
    comma_list(list).any(|item| item == entry)
}
