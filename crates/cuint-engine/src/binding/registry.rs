//! Runtime types and the module that owns them.

use std::path::Path;
use std::sync::Arc;

use super::instance::Instance;
use super::BindError;
use crate::ffi::{Args, CallError, ForeignFunction, Library, LoadError, Value};
use crate::header::decl::{Catalog, TypeDeclaration, DESTRUCTOR_METHOD};
use crate::header::{DeclCollector, Preprocessor};

/// Runtime name of a type key: the first character uppercased (`foo` -> `Foo`).
pub fn runtime_name(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A bound opaque type: constructor plus resolved methods.
#[derive(Debug)]
pub struct RuntimeType {
    name: String,
    key: String,
    fields: Vec<String>,
    constructor: ForeignFunction,
    methods: Vec<(String, ForeignFunction)>,
}

impl RuntimeType {
    fn synthesize(decl: &TypeDeclaration, library: &Arc<Library>) -> Result<Self, BindError> {
        let symbol = decl.constructor_symbol();
        let constructor = match &decl.constructor {
            Some(ctor) => ForeignFunction::resolve(ctor, library),
            None => Err(LoadError::SymbolNotFound {
                symbol: symbol.clone(),
                library: library.path().to_string(),
            }),
        }
        .map_err(|source| BindError::Symbol { symbol, source })?;

        let mut methods = Vec::with_capacity(decl.methods.len());
        for method in &decl.methods {
            match ForeignFunction::resolve(&method.function, library) {
                Ok(function) => methods.push((method.name.clone(), function)),
                Err(err) => log::debug!("skipping method {}: {}", method.function.name, err),
            }
        }

        Ok(Self {
            name: runtime_name(&decl.name),
            key: decl.name.clone(),
            fields: decl.fields.clone(),
            constructor,
            methods,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The typedef name without its marker.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn constructor(&self) -> &ForeignFunction {
        &self.constructor
    }

    pub fn method(&self, name: &str) -> Option<&ForeignFunction> {
        self.methods
            .iter()
            .find(|(method, _)| method == name)
            .map(|(_, function)| function)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(|(name, _)| name.as_str())
    }

    /// Whether dropping an instance releases it: there is a `destroy` method
    /// that takes nothing but the handle.
    pub fn auto_release(&self) -> bool {
        self.method(DESTRUCTOR_METHOD).is_some_and(|destroy| {
            let decl = destroy.declaration();
            decl.arity() == 1 && !decl.variadic
        })
    }

    /// Call the constructor and wrap the handle it returns.
    pub fn new_instance(self: &Arc<Self>, args: Args) -> Result<Instance, CallError> {
        let value = self.constructor.call(&args)?;
        match value.as_handle() {
            Some(handle) if !handle.is_null() => Ok(Instance::new(Arc::clone(self), handle)),
            _ => Err(CallError::NullInstance {
                type_name: self.name.clone(),
            }),
        }
    }
}

/// Types and free functions bound from one header and its shared object.
#[derive(Debug)]
pub struct BindingModule {
    name: String,
    library: Arc<Library>,
    types: Vec<Arc<RuntimeType>>,
    functions: Vec<ForeignFunction>,
}

impl BindingModule {
    /// Bind every catalog entry against `library`.
    ///
    /// A type whose constructor symbol is missing fails the whole module.
    /// Missing method and free-function symbols are skipped.
    pub fn synthesize(name: &str, catalog: &Catalog, library: Library) -> Result<Self, BindError> {
        let library = Arc::new(library);

        let mut types = Vec::with_capacity(catalog.types.len());
        for decl in &catalog.types {
            types.push(Arc::new(RuntimeType::synthesize(decl, &library)?));
        }

        let mut functions = Vec::with_capacity(catalog.functions.len());
        for decl in &catalog.functions {
            match ForeignFunction::resolve(decl, &library) {
                Ok(function) => functions.push(function),
                Err(err) => log::debug!("skipping function {}: {}", decl.name, err),
            }
        }

        log::debug!(
            "bound module '{}': {} type(s), {} function(s)",
            name,
            types.len(),
            functions.len()
        );
        Ok(Self {
            name: name.to_string(),
            library,
            types,
            functions,
        })
    }

    /// Preprocess `header`, collect its declarations, load `library`, and bind.
    pub fn from_header(
        name: &str,
        header: &Path,
        library: &Path,
        preprocessor: &Preprocessor,
    ) -> Result<Self, BindError> {
        let text = preprocessor.run(header)?;
        let catalog = DeclCollector::collect(&text)?;
        let library = Library::open(library)?;
        Self::synthesize(name, &catalog, library)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Look up a type by runtime name (`Foo`) or key (`foo`).
    pub fn ty(&self, name: &str) -> Option<&Arc<RuntimeType>> {
        self.types
            .iter()
            .find(|ty| ty.name == name)
            .or_else(|| self.types.iter().find(|ty| ty.key == name))
    }

    pub fn types(&self) -> impl Iterator<Item = &Arc<RuntimeType>> {
        self.types.iter()
    }

    pub fn function(&self, name: &str) -> Option<&ForeignFunction> {
        self.functions.iter().find(|function| function.name() == name)
    }

    pub fn functions(&self) -> impl Iterator<Item = &ForeignFunction> {
        self.functions.iter()
    }

    /// Call a free function by name.
    pub fn call(&self, name: &str, args: Args) -> Result<Value, CallError> {
        let function = self.function(name).ok_or_else(|| CallError::Unknown {
            name: name.to_string(),
        })?;
        function.call(&args)
    }

    /// Construct an instance of the type called `type_name`.
    pub fn new_instance(&self, type_name: &str, args: Args) -> Result<Instance, CallError> {
        let ty = self.ty(type_name).ok_or_else(|| CallError::Unknown {
            name: type_name.to_string(),
        })?;
        ty.new_instance(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_name_capitalises_first_character() {
        assert_eq!(runtime_name("foo"), "Foo");
        assert_eq!(runtime_name("cache"), "Cache");
        assert_eq!(runtime_name("Person"), "Person");
        assert_eq!(runtime_name("x"), "X");
        assert_eq!(runtime_name(""), "");
    }
}
