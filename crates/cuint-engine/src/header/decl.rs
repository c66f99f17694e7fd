//! Catalog of declarations recognised by naming convention.
//!
//! The binding contract is purely lexical:
//!
//! | C name          | Role                                   |
//! |-----------------|----------------------------------------|
//! | `name_t`        | opaque type (typedef of a struct/union) |
//! | `name_new`      | constructor of `name_t`                 |
//! | `name__method`  | method `method` of `name_t`             |
//! | anything else   | free function                           |

use serde::Serialize;

/// Suffix marking an opaque type name.
///
/// The key of a type is its typedef name with exactly these two characters
/// removed. Headers that use a different marker (or a marker of a different
/// length) are not recognised; this is a known fragility of the convention.
pub const OPAQUE_MARKER: &str = "_t";

/// Suffix of a constructor symbol.
pub const CONSTRUCTOR_SUFFIX: &str = "_new";

/// Separator between the owning type key and the method name.
pub const METHOD_SEPARATOR: &str = "__";

/// Conventional name of the method that releases an instance.
pub const DESTRUCTOR_METHOD: &str = "destroy";

/// Key of an opaque type: `foo_t` -> `foo`.
pub fn type_key(typedef_name: &str) -> Option<&str> {
    if typedef_name.len() > OPAQUE_MARKER.len() && typedef_name.ends_with(OPAQUE_MARKER) {
        Some(&typedef_name[..typedef_name.len() - OPAQUE_MARKER.len()])
    } else {
        None
    }
}

/// How a native return value is turned back into a [`crate::ffi::Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnKind {
    /// Default C `int` convention: the low 32 bits, sign-extended.
    Int,
    /// Full machine word: pointers and `long`-sized integers.
    Word,
    /// `char *`: a NUL-terminated byte string.
    CString,
    /// No value.
    Void,
}

/// A function prototype as far as the binding layer cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDeclaration {
    pub name: String,
    /// Parameter names in order; `None` for anonymous parameters.
    pub params: Vec<Option<String>>,
    pub variadic: bool,
    pub returns: ReturnKind,
}

impl FunctionDeclaration {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// No parameter has a name, so keyword arguments cannot be matched.
    pub fn is_positional_only(&self) -> bool {
        self.params.iter().all(Option::is_none)
    }

    /// Position of the parameter called `name`.
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params
            .iter()
            .position(|param| param.as_deref() == Some(name))
    }
}

/// Syntactic role of a function name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionRole<'a> {
    Constructor { owner: &'a str },
    Method { owner: &'a str, method: &'a str },
    Free,
}

/// Classify a function name by convention. Total: every name gets a role.
pub fn classify(name: &str) -> FunctionRole<'_> {
    if let Some(owner) = name.strip_suffix(CONSTRUCTOR_SUFFIX) {
        if !owner.is_empty() {
            return FunctionRole::Constructor { owner };
        }
    }
    if let Some((owner, method)) = name.split_once(METHOD_SEPARATOR) {
        if !owner.is_empty() && !method.is_empty() {
            return FunctionRole::Method { owner, method };
        }
    }
    FunctionRole::Free
}

/// A method attached to an opaque type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDeclaration {
    /// Method name without the owner prefix.
    pub name: String,
    pub function: FunctionDeclaration,
}

/// An opaque type and everything bound to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDeclaration {
    /// Key: the typedef name without its marker.
    pub name: String,
    pub typedef_name: String,
    pub fields: Vec<String>,
    pub constructor: Option<FunctionDeclaration>,
    pub methods: Vec<MethodDeclaration>,
}

impl TypeDeclaration {
    pub fn new(name: &str, typedef_name: &str, fields: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            typedef_name: typedef_name.to_string(),
            fields,
            constructor: None,
            methods: Vec::new(),
        }
    }

    pub fn constructor_symbol(&self) -> String {
        format!("{}{}", self.name, CONSTRUCTOR_SUFFIX)
    }

    pub fn method_symbol(&self, method: &str) -> String {
        format!("{}{}{}", self.name, METHOD_SEPARATOR, method)
    }

    pub fn method(&self, name: &str) -> Option<&MethodDeclaration> {
        self.methods.iter().find(|method| method.name == name)
    }
}

/// Result of collection: opaque types with a constructor, plus free functions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Catalog {
    pub types: Vec<TypeDeclaration>,
    pub functions: Vec<FunctionDeclaration>,
}

impl Catalog {
    /// Look up a type by key (`foo` for `foo_t`).
    pub fn get(&self, key: &str) -> Option<&TypeDeclaration> {
        self.types.iter().find(|ty| ty.name == key)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDeclaration> {
        self.functions.iter().find(|function| function.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.functions.is_empty()
    }
}
