//! Two-pass walk of a parsed header that builds the declaration [`Catalog`].
//!
//! Pass one registers every `typedef struct/union ... name_t` as an opaque
//! type and remembers all typedefs for return-type resolution. Pass two
//! classifies function declarations by name. Functions whose owner key has
//! no registered type are demoted to free functions, and types that end up
//! without a constructor are dropped.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::header::ast::{
    BuiltinKind, Declaration, Derived, Record, TranslationUnit, TypeSpec,
};
use crate::header::decl::{
    classify, type_key, Catalog, FunctionDeclaration, FunctionRole, MethodDeclaration,
    ReturnKind, TypeDeclaration,
};
use crate::header::parser::{self, ParseError};

/// Typedef chains longer than this are treated as unresolved.
const MAX_TYPEDEF_HOPS: usize = 32;

/// Builds a [`Catalog`] from preprocessed header text.
#[derive(Default)]
pub struct DeclCollector {
    types: Vec<TypeDeclaration>,
    index: FxHashMap<String, usize>,
    typedefs: FxHashMap<String, (TypeSpec, Vec<Derived>)>,
    record_fields: FxHashMap<String, Vec<String>>,
    functions: Vec<FunctionDeclaration>,
    seen_functions: FxHashSet<String>,
}

impl DeclCollector {
    /// Parse `source` and collect its declarations.
    ///
    /// A parse failure is logged with surrounding source context before it is
    /// returned.
    pub fn collect(source: &str) -> Result<Catalog, ParseError> {
        match parser::parse(source) {
            Ok(unit) => Ok(Self::from_unit(&unit)),
            Err(err) => {
                log::error!("{}", err.format_with_source(source));
                Err(err)
            }
        }
    }

    /// Collect declarations from an already parsed unit.
    pub fn from_unit(unit: &TranslationUnit) -> Catalog {
        let mut collector = Self::default();
        for item in &unit.items {
            collector.visit_type(item.declaration());
        }
        for item in &unit.items {
            collector.visit_function(item.declaration());
        }
        collector.finish()
    }

    fn visit_type(&mut self, decl: &Declaration) {
        if decl.storage.is_extern {
            return;
        }

        if let TypeSpec::Record(Record {
            tag: Some(tag),
            members: Some(members),
            ..
        }) = &decl.base
        {
            let fields = members.iter().filter_map(|m| m.name.clone()).collect();
            self.record_fields.insert(tag.clone(), fields);
        }

        if !decl.storage.is_typedef {
            return;
        }

        for declarator in &decl.declarators {
            let Some(name) = &declarator.name else {
                continue;
            };
            self.typedefs
                .insert(name.clone(), (decl.base.clone(), declarator.derived.clone()));

            let TypeSpec::Record(record) = &decl.base else {
                continue;
            };
            if !declarator.derived.is_empty() {
                continue;
            }
            let Some(key) = type_key(name) else {
                continue;
            };
            if self.index.contains_key(key) {
                continue;
            }

            let fields = match (&record.members, &record.tag) {
                (Some(members), _) => members.iter().filter_map(|m| m.name.clone()).collect(),
                (None, Some(tag)) => self.record_fields.get(tag).cloned().unwrap_or_default(),
                (None, None) => Vec::new(),
            };
            log::trace!("registered opaque type '{}' ({})", key, name);
            self.index.insert(key.to_string(), self.types.len());
            self.types.push(TypeDeclaration::new(key, name, fields));
        }
    }

    fn visit_function(&mut self, decl: &Declaration) {
        if decl.storage.is_extern || decl.storage.is_typedef {
            return;
        }

        for declarator in &decl.declarators {
            let (Some(name), Some(params)) = (&declarator.name, declarator.function_params())
            else {
                continue;
            };
            if !self.seen_functions.insert(name.clone()) {
                continue;
            }

            let function = FunctionDeclaration {
                name: name.clone(),
                params: params.params.iter().map(|p| p.name.clone()).collect(),
                variadic: params.variadic,
                returns: self.return_kind(&decl.base, &declarator.derived[1..]),
            };
            self.attach(function);
        }
    }

    fn attach(&mut self, function: FunctionDeclaration) {
        let (owner, method) = match classify(&function.name) {
            FunctionRole::Constructor { owner } => (owner.to_string(), None),
            FunctionRole::Method { owner, method } => (owner.to_string(), Some(method.to_string())),
            FunctionRole::Free => {
                self.functions.push(function);
                return;
            }
        };
        let Some(&slot) = self.index.get(&owner) else {
            self.demote(function);
            return;
        };

        match method {
            None => {
                log::trace!("constructor '{}' for '{}'", function.name, owner);
                self.types[slot].constructor = Some(function);
            }
            Some(name) => self.types[slot]
                .methods
                .push(MethodDeclaration { name, function }),
        }
    }

    fn demote(&mut self, function: FunctionDeclaration) {
        log::debug!(
            "'{}' names an unknown type; treating it as a free function",
            function.name
        );
        self.functions.push(function);
    }

    fn finish(mut self) -> Catalog {
        self.types.retain(|ty| {
            if ty.constructor.is_none() {
                log::debug!("dropping type '{}': no constructor", ty.typedef_name);
            }
            ty.constructor.is_some()
        });
        Catalog {
            types: self.types,
            functions: self.functions,
        }
    }

    /// Resolve the return type `base` + `derived` through typedefs and pick
    /// the coercion applied to the native return value.
    fn return_kind(&self, base: &TypeSpec, derived: &[Derived]) -> ReturnKind {
        let mut base = base.clone();
        let mut derived = derived.to_vec();

        for _ in 0..MAX_TYPEDEF_HOPS {
            let TypeSpec::Named(name) = &base else {
                break;
            };
            let Some((inner_base, inner_derived)) = self.typedefs.get(name) else {
                break;
            };
            derived.extend(inner_derived.iter().cloned());
            base = inner_base.clone();
        }

        match (derived.as_slice(), &base) {
            ([], TypeSpec::Void) => ReturnKind::Void,
            ([], TypeSpec::Builtin(builtin)) => match builtin.kind {
                BuiltinKind::Long | BuiltinKind::LongLong | BuiltinKind::Int128 => {
                    ReturnKind::Word
                }
                _ => ReturnKind::Int,
            },
            ([], _) => ReturnKind::Int,
            ([Derived::Pointer], TypeSpec::Builtin(builtin))
                if builtin.kind == BuiltinKind::Char =>
            {
                ReturnKind::CString
            }
            _ => ReturnKind::Word,
        }
    }
}
