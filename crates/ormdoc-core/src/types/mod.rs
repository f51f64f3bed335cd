//! Type information: JDBC mappings and type compatibility oracles.

pub mod jdbc;
mod inheritance;

pub use inheritance::{DeclaredTypes, InheritanceHelper, MethodInfo, NoTypeInfo, TypeOracle};
