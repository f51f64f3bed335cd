//! Type compatibility checks.
//!
//! The model's own class graph answers most questions. Types outside the
//! model (framework interfaces, collection classes, conversions) are
//! looked up in a pluggable [`TypeOracle`].

use crate::error::TypeLookupError;
use crate::model::{qualified_name, ModelDef};
use std::collections::{HashMap, HashSet, VecDeque};

/// A method as seen by the type oracle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MethodInfo {
    /// Whether the method is static.
    pub is_static: bool,
    /// Whether the method is abstract.
    pub is_abstract: bool,
    /// Return type; `None` for `void`.
    pub return_type: Option<String>,
}

/// Source of type information for types that are not part of the model.
pub trait TypeOracle {
    /// Check whether `type_name` is `base_name` or one of its subtypes.
    fn is_subtype_of(&self, type_name: &str, base_name: &str) -> Result<bool, TypeLookupError>;

    /// Find a parameterless method declared by `type_name` or one of its supertypes.
    fn find_method(&self, type_name: &str, method: &str)
        -> Result<Option<MethodInfo>, TypeLookupError>;
}

/// Oracle used when no type information is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTypeInfo;

impl TypeOracle for NoTypeInfo {
    fn is_subtype_of(&self, _type_name: &str, _base_name: &str) -> Result<bool, TypeLookupError> {
        Err(TypeLookupError::Unavailable)
    }

    fn find_method(
        &self,
        _type_name: &str,
        _method: &str,
    ) -> Result<Option<MethodInfo>, TypeLookupError> {
        Err(TypeLookupError::Unavailable)
    }
}

#[derive(Debug, Clone, Default)]
struct DeclaredType {
    supertypes: Vec<String>,
    methods: HashMap<String, MethodInfo>,
}

/// Oracle backed by explicitly declared types.
///
/// Every type that is asked about must be declared; unknown types yield
/// [`TypeLookupError::NotFound`].
#[derive(Debug, Clone, Default)]
pub struct DeclaredTypes {
    types: HashMap<String, DeclaredType>,
}

const OJB_DEFAULTS: &[(&str, &[&str])] = &[
    ("java.lang.Object", &[]),
    ("java.util.Collection", &[]),
    ("java.util.List", &["java.util.Collection"]),
    ("java.util.Set", &["java.util.Collection"]),
    ("java.util.ArrayList", &["java.util.List"]),
    ("java.util.LinkedList", &["java.util.List"]),
    ("java.util.Vector", &["java.util.List"]),
    ("java.util.HashSet", &["java.util.Set"]),
    ("org.apache.ojb.broker.ManageableCollection", &[]),
    (
        "org.apache.ojb.broker.util.collections.ManageableArrayList",
        &["java.util.ArrayList", "org.apache.ojb.broker.ManageableCollection"],
    ),
    (
        "org.apache.ojb.broker.util.collections.ManageableVector",
        &["java.util.Vector", "org.apache.ojb.broker.ManageableCollection"],
    ),
    (
        "org.apache.ojb.broker.util.collections.ManageableHashSet",
        &["java.util.HashSet", "org.apache.ojb.broker.ManageableCollection"],
    ),
    (
        "org.apache.ojb.broker.util.collections.RemovalAwareCollection",
        &["org.apache.ojb.broker.util.collections.ManageableVector"],
    ),
    ("org.apache.ojb.broker.accesslayer.conversions.FieldConversion", &[]),
    (
        "org.apache.ojb.broker.accesslayer.conversions.Object2ByteArrFieldConversion",
        &["org.apache.ojb.broker.accesslayer.conversions.FieldConversion"],
    ),
    (
        "org.apache.ojb.broker.accesslayer.conversions.JavaDate2SqlDateFieldConversion",
        &["org.apache.ojb.broker.accesslayer.conversions.FieldConversion"],
    ),
    ("org.apache.ojb.broker.accesslayer.RowReader", &[]),
    (
        "org.apache.ojb.broker.accesslayer.RowReaderDefaultImpl",
        &["org.apache.ojb.broker.accesslayer.RowReader"],
    ),
    ("org.apache.ojb.broker.cache.ObjectCache", &[]),
    (
        "org.apache.ojb.broker.cache.ObjectCacheDefaultImpl",
        &["org.apache.ojb.broker.cache.ObjectCache"],
    ),
    (
        "org.apache.ojb.broker.cache.ObjectCacheEmptyImpl",
        &["org.apache.ojb.broker.cache.ObjectCache"],
    ),
    ("org.apache.ojb.broker.accesslayer.QueryCustomizer", &[]),
    (
        "org.apache.ojb.broker.accesslayer.QueryCustomizerDefaultImpl",
        &["org.apache.ojb.broker.accesslayer.QueryCustomizer"],
    ),
];

impl DeclaredTypes {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry that knows the `java.util` collections and the
    /// framework interfaces and their stock implementations.
    pub fn with_ojb_defaults() -> Self {
        let mut types = Self::new();
        for (name, supertypes) in OJB_DEFAULTS {
            types.declare(*name, supertypes.iter().copied());
        }
        types
    }

    /// Declare a type with its direct supertypes. Redeclaring adds supertypes.
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        supertypes: impl IntoIterator<Item = impl Into<String>>,
    ) -> &mut Self {
        let entry = self.types.entry(qualified_name(&name.into())).or_default();
        for supertype in supertypes {
            let supertype = qualified_name(&supertype.into());
            if !entry.supertypes.contains(&supertype) {
                entry.supertypes.push(supertype);
            }
        }
        self
    }

    /// Declare a parameterless method of a type (declaring the type if needed).
    pub fn declare_method(
        &mut self,
        type_name: impl Into<String>,
        method: impl Into<String>,
        info: MethodInfo,
    ) -> &mut Self {
        self.types
            .entry(qualified_name(&type_name.into()))
            .or_default()
            .methods
            .insert(method.into(), info);
        self
    }

    /// Check if a type is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(&qualified_name(name))
    }

    /// Number of declared types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if no type is declared.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn lookup(&self, name: &str) -> Result<&DeclaredType, TypeLookupError> {
        self.types
            .get(name)
            .ok_or_else(|| TypeLookupError::NotFound(name.to_string()))
    }
}

impl TypeOracle for DeclaredTypes {
    fn is_subtype_of(&self, type_name: &str, base_name: &str) -> Result<bool, TypeLookupError> {
        let start = qualified_name(type_name);
        let base = qualified_name(base_name);
        self.lookup(&start)?;

        let mut queue = VecDeque::from([start]);
        let mut seen = HashSet::new();
        while let Some(current) = queue.pop_front() {
            if current == base {
                return Ok(true);
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(declared) = self.types.get(&current) {
                queue.extend(declared.supertypes.iter().cloned());
            }
        }
        Ok(false)
    }

    fn find_method(
        &self,
        type_name: &str,
        method: &str,
    ) -> Result<Option<MethodInfo>, TypeLookupError> {
        let start = qualified_name(type_name);
        self.lookup(&start)?;

        let mut queue = VecDeque::from([start]);
        let mut seen = HashSet::new();
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(declared) = self.types.get(&current) {
                if let Some(info) = declared.methods.get(method) {
                    return Ok(Some(info.clone()));
                }
                queue.extend(declared.supertypes.iter().cloned());
            }
        }
        Ok(None)
    }
}

/// Answers subtype questions using the model graph first and the oracle second.
pub struct InheritanceHelper<'a> {
    model: &'a ModelDef,
    oracle: &'a dyn TypeOracle,
}

impl<'a> InheritanceHelper<'a> {
    /// Create a helper over a model.
    pub fn new(model: &'a ModelDef, oracle: &'a dyn TypeOracle) -> Self {
        Self { model, oracle }
    }

    /// The oracle for types outside the model.
    pub fn oracle(&self) -> &'a dyn TypeOracle {
        self.oracle
    }

    /// Check whether `type_name` is `base_name` or one of its subtypes.
    ///
    /// The supertypes declared by model classes are walked first. Types that
    /// are not part of the model are only resolved through the oracle when
    /// `check_actual` is set; otherwise they count as unrelated.
    pub fn is_same_or_subtype(
        &self,
        type_name: &str,
        base_name: &str,
        check_actual: bool,
    ) -> Result<bool, TypeLookupError> {
        let base = qualified_name(base_name);
        let mut queue = VecDeque::from([qualified_name(type_name)]);
        let mut seen = HashSet::new();
        let mut unavailable = false;
        let mut missing = None;

        while let Some(current) = queue.pop_front() {
            if current == base {
                return Ok(true);
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            match self.model.class_by_name(&current) {
                Some(class) => {
                    queue.extend(class.supertypes().iter().map(|s| qualified_name(s)));
                }
                None if check_actual => match self.oracle.is_subtype_of(&current, &base) {
                    Ok(true) => return Ok(true),
                    Ok(false) => {}
                    Err(TypeLookupError::Unavailable) => unavailable = true,
                    Err(err) => missing = missing.or(Some(err)),
                },
                None => {}
            }
        }

        match missing {
            Some(err) => Err(err),
            None if unavailable => Err(TypeLookupError::Unavailable),
            None => Ok(false),
        }
    }
}
