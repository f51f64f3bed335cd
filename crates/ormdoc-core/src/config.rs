//! Generator configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default database name used for the table schema model.
pub const DEFAULT_DATABASE_NAME: &str = "ormdoc";

/// How much defaulting and checking is applied to a model.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CheckLevel {
    /// Only the defaulting that later stages depend on.
    None,
    /// Defaulting and checks against the model graph.
    #[default]
    Basic,
    /// Everything, including checks against external type information.
    Strict,
}

impl CheckLevel {
    /// The literal used for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckLevel::None => "none",
            CheckLevel::Basic => "basic",
            CheckLevel::Strict => "strict",
        }
    }

    /// Check if this level performs no validation.
    pub fn is_none(&self) -> bool {
        *self == CheckLevel::None
    }

    /// Check if this level consults external type information.
    pub fn is_strict(&self) -> bool {
        *self == CheckLevel::Strict
    }
}

impl fmt::Display for CheckLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(CheckLevel::None),
            "basic" => Ok(CheckLevel::Basic),
            "strict" => Ok(CheckLevel::Strict),
            other => Err(format!(
                "unknown check level '{}', expected none, basic or strict",
                other
            )),
        }
    }
}

/// Configuration of a generator run.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Check level applied by `check_constraints`.
    pub check_level: CheckLevel,

    /// Database name of the table schema model.
    pub database_name: String,

    /// Whether the table schema model is built after checking.
    pub generate_schema: bool,

    /// Whether warnings are echoed as they occur (in addition to being collected).
    pub echo_warnings: bool,
}

impl GeneratorConfig {
    /// Create a configuration with the given check level.
    pub fn new(check_level: CheckLevel) -> Self {
        Self {
            check_level,
            ..Default::default()
        }
    }

    /// Set the check level.
    pub fn with_check_level(mut self, level: CheckLevel) -> Self {
        self.check_level = level;
        self
    }

    /// Set the database name.
    pub fn with_database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = name.into();
        self
    }

    /// Skip building the table schema model.
    pub fn without_schema(mut self) -> Self {
        self.generate_schema = false;
        self
    }

    /// Set whether warnings are echoed.
    pub fn with_echo_warnings(mut self, echo: bool) -> Self {
        self.echo_warnings = echo;
        self
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            check_level: CheckLevel::default(),
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            generate_schema: true,
            echo_warnings: true,
        }
    }
}
