//! JDBC type names and the default mappings from Java types.

/// Conversion applied to object types that are stored as serialized bytes.
pub const OBJECT_TO_BYTES_CONVERSION: &str =
    "org.apache.ojb.broker.accesslayer.conversions.Object2ByteArrFieldConversion";

/// All JDBC type names a field may specify.
pub const JDBC_TYPES: &[&str] = &[
    "BIT",
    "TINYINT",
    "SMALLINT",
    "INTEGER",
    "BIGINT",
    "FLOAT",
    "REAL",
    "DOUBLE",
    "NUMERIC",
    "DECIMAL",
    "CHAR",
    "VARCHAR",
    "LONGVARCHAR",
    "DATE",
    "TIME",
    "TIMESTAMP",
    "BINARY",
    "VARBINARY",
    "LONGVARBINARY",
    "CLOB",
    "BLOB",
    "ARRAY",
    "DISTINCT",
    "STRUCT",
    "REF",
    "DATALINK",
    "BOOLEAN",
    "JAVA_OBJECT",
    "OTHER",
    "NULL",
];

/// Check if `name` is a known JDBC type.
pub fn is_valid_jdbc_type(name: &str) -> bool {
    JDBC_TYPES.contains(&name)
}

/// Default JDBC type for a Java type.
pub fn default_jdbc_type(java_type: &str) -> &'static str {
    match java_type.trim() {
        "boolean" | "Boolean" | "java.lang.Boolean" => "BIT",
        "byte" | "Byte" | "java.lang.Byte" => "TINYINT",
        "short" | "Short" | "java.lang.Short" => "SMALLINT",
        "int" | "Integer" | "java.lang.Integer" => "INTEGER",
        "long" | "Long" | "java.lang.Long" => "BIGINT",
        "char" | "Character" | "java.lang.Character" => "CHAR",
        "float" | "Float" | "java.lang.Float" => "REAL",
        "double" | "Double" | "java.lang.Double" => "FLOAT",
        "String" | "java.lang.String" => "VARCHAR",
        "java.math.BigDecimal" => "DECIMAL",
        "java.util.Date" | "java.sql.Date" => "DATE",
        "java.sql.Time" => "TIME",
        "java.sql.Timestamp" => "TIMESTAMP",
        "java.sql.Blob" => "BLOB",
        "java.sql.Clob" => "CLOB",
        _ => "LONGVARBINARY",
    }
}

/// Default conversion for a Java type, for types without a direct JDBC mapping.
pub fn default_conversion(java_type: &str) -> Option<&'static str> {
    let java_type = java_type.trim();
    if java_type == "byte[]" {
        return None;
    }
    match default_jdbc_type(java_type) {
        "LONGVARBINARY" => Some(OBJECT_TO_BYTES_CONVERSION),
        _ => None,
    }
}

/// Default length of a column of the given JDBC type.
pub fn default_length(jdbc_type: &str) -> Option<&'static str> {
    match jdbc_type {
        "CHAR" => Some("1"),
        "VARCHAR" => Some("254"),
        _ => None,
    }
}

/// Default precision of a column of the given JDBC type.
pub fn default_precision(jdbc_type: &str) -> Option<&'static str> {
    match jdbc_type {
        "DECIMAL" | "NUMERIC" => Some("20"),
        _ => None,
    }
}

/// Default scale of a column of the given JDBC type.
pub fn default_scale(jdbc_type: &str) -> Option<&'static str> {
    match jdbc_type {
        "DECIMAL" | "NUMERIC" => Some("0"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_types() {
        assert!(is_valid_jdbc_type("VARCHAR"));
        assert!(is_valid_jdbc_type("DATALINK"));
        assert!(!is_valid_jdbc_type("NOT_A_TYPE"));
        assert!(!is_valid_jdbc_type("varchar"));
    }

    #[test]
    fn test_java_defaults() {
        assert_eq!(default_jdbc_type("int"), "INTEGER");
        assert_eq!(default_jdbc_type("java.lang.String"), "VARCHAR");
        assert_eq!(default_jdbc_type("double"), "FLOAT");
        assert_eq!(default_jdbc_type("byte[]"), "LONGVARBINARY");
        assert_eq!(default_conversion("byte[]"), None);
        assert_eq!(default_conversion("int"), None);
    }

    #[test]
    fn test_object_types_are_serialized() {
        assert_eq!(default_jdbc_type("com.acme.Money"), "LONGVARBINARY");
        assert_eq!(default_conversion("com.acme.Money"), Some(OBJECT_TO_BYTES_CONVERSION));
        assert_eq!(default_conversion("int[]"), Some(OBJECT_TO_BYTES_CONVERSION));
    }

    #[test]
    fn test_size_defaults() {
        assert_eq!(default_length("VARCHAR"), Some("254"));
        assert_eq!(default_length("CHAR"), Some("1"));
        assert_eq!(default_length("LONGVARCHAR"), None);
        assert_eq!(default_precision("DECIMAL"), Some("20"));
        assert_eq!(default_scale("NUMERIC"), Some("0"));
        assert_eq!(default_precision("INTEGER"), None);
    }
}
