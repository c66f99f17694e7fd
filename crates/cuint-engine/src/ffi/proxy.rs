//! Callable proxy around one native symbol.
//!
//! A [`ForeignFunction`] pairs a resolved symbol with the declaration it was
//! collected from. Argument checks happen before any native code runs; a
//! native fault during the call is not intercepted.

use std::ffi::{c_char, CStr, CString};
use std::sync::Arc;

use thiserror::Error;

use super::call::{self, MAX_ARGS};
use super::loader::{Library, Symbol};
use super::value::{Args, Value};
use crate::header::decl::{FunctionDeclaration, ReturnKind};

/// Errors raised by bound calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("{function}() takes {expected} argument(s) but {got} were given")]
    Arity {
        function: String,
        expected: String,
        got: usize,
    },

    #[error("{function}(): {message}")]
    Usage { function: String, message: String },

    #[error("{function}(): argument {index} contains an interior NUL byte")]
    InteriorNul { function: String, index: usize },

    #[error("{function}(): more than {} arguments are not supported", MAX_ARGS)]
    TooManyArguments { function: String },

    #[error("{type_name} constructor returned NULL")]
    NullInstance { type_name: String },

    #[error("{type_name} instance has already been released")]
    Released { type_name: String },

    #[error("{type_name} has no method '{method}'")]
    UnknownMethod { type_name: String, method: String },

    #[error("no bound function or type named '{name}'")]
    Unknown { name: String },
}

/// A native function ready to be called with dynamic [`Args`].
#[derive(Debug, Clone)]
pub struct ForeignFunction {
    decl: FunctionDeclaration,
    symbol: Symbol,
    library: Arc<Library>,
}

impl ForeignFunction {
    /// Resolve `decl.name` in `library`.
    pub fn resolve(
        decl: &FunctionDeclaration,
        library: &Arc<Library>,
    ) -> Result<Self, super::LoadError> {
        let symbol = library.symbol(&decl.name)?;
        Ok(Self {
            decl: decl.clone(),
            symbol,
            library: Arc::clone(library),
        })
    }

    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn declaration(&self) -> &FunctionDeclaration {
        &self.decl
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Validate `args` against the declaration without calling anything.
    pub fn check_args(&self, args: &Args) -> Result<(), CallError> {
        let fixed = self.decl.arity();
        let total = args.len();

        let arity_ok = if self.decl.variadic {
            total >= fixed
        } else {
            total == fixed
        };
        if !arity_ok {
            let expected = if self.decl.variadic {
                format!("at least {}", fixed)
            } else {
                fixed.to_string()
            };
            return Err(CallError::Arity {
                function: self.decl.name.clone(),
                expected,
                got: total,
            });
        }

        if args.keyword.is_empty() {
            return Ok(());
        }
        if self.decl.is_positional_only() {
            return Err(self.usage("takes positional arguments only"));
        }

        let mut filled = vec![false; fixed];
        for slot in filled.iter_mut().take(args.positional.len()) {
            *slot = true;
        }
        for (name, _) in &args.keyword {
            match self.decl.param_index(name) {
                None => {
                    return Err(self.usage(&format!("unexpected keyword argument '{}'", name)))
                }
                Some(index) if filled[index] => {
                    return Err(self.usage(&format!("got multiple values for argument '{}'", name)))
                }
                Some(index) => filled[index] = true,
            }
        }
        Ok(())
    }

    /// Check, marshal, invoke, and coerce the return value.
    pub fn call(&self, args: &Args) -> Result<Value, CallError> {
        self.check_args(args)?;
        let ordered = self.order(args);

        // owned C strings must outlive the native call
        let mut strings = Vec::new();
        let mut words = Vec::with_capacity(ordered.len());
        for (index, value) in ordered.iter().enumerate() {
            let word = match value {
                Value::Null => 0,
                Value::Int(n) => *n,
                Value::Handle(handle) => handle.addr() as i64,
                Value::Bytes(bytes) => {
                    let c_string = CString::new(bytes.as_slice()).map_err(|_| {
                        CallError::InteriorNul {
                            function: self.decl.name.clone(),
                            index,
                        }
                    })?;
                    let ptr = c_string.as_ptr() as i64;
                    strings.push(c_string);
                    ptr
                }
            };
            words.push(word);
        }

        log::trace!("calling {}({} words)", self.decl.name, words.len());
        let raw = unsafe { call::invoke(self.symbol.as_ptr(), &words) }.ok_or_else(|| {
            CallError::TooManyArguments {
                function: self.decl.name.clone(),
            }
        })?;
        drop(strings);

        Ok(self.coerce(raw))
    }

    /// Arrange positional and keyword values into declared parameter order.
    fn order<'a>(&self, args: &'a Args) -> Vec<&'a Value> {
        let slots = args.len().max(self.decl.arity());
        let mut ordered: Vec<Option<&Value>> = vec![None; slots];
        for (slot, value) in ordered.iter_mut().zip(&args.positional) {
            *slot = Some(value);
        }
        for (name, value) in &args.keyword {
            if let Some(index) = self.decl.param_index(name) {
                ordered[index] = Some(value);
            }
        }
        ordered.into_iter().flatten().collect()
    }

    fn coerce(&self, raw: i64) -> Value {
        match self.decl.returns {
            ReturnKind::Int => Value::Int(raw as i32 as i64),
            ReturnKind::Word => Value::Int(raw),
            ReturnKind::Void => Value::Null,
            ReturnKind::CString => {
                if raw == 0 {
                    Value::Null
                } else {
                    let text = unsafe { CStr::from_ptr(raw as *const c_char) };
                    Value::Bytes(text.to_bytes().to_vec())
                }
            }
        }
    }

    fn usage(&self, message: &str) -> CallError {
        CallError::Usage {
            function: self.decl.name.clone(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;

    fn proxy(params: &[Option<&str>], variadic: bool, returns: ReturnKind) -> ForeignFunction {
        let library = Arc::new(Library::open_self().unwrap());
        ForeignFunction {
            decl: FunctionDeclaration {
                name: "sample".to_string(),
                params: params.iter().map(|p| p.map(str::to_string)).collect(),
                variadic,
                returns,
            },
            symbol: library.symbol("strlen").unwrap(),
            library,
        }
    }

    #[test]
    fn test_arity_mismatch() {
        let f = proxy(&[Some("a"), Some("b")], false, ReturnKind::Int);
        let err = f.check_args(&args![1]).unwrap_err();
        assert!(matches!(err, CallError::Arity { got: 1, .. }));
        assert!(f.check_args(&args![1, 2, 3]).is_err());
        assert!(f.check_args(&args![1, 2]).is_ok());
    }

    #[test]
    fn test_variadic_needs_fixed_count() {
        let f = proxy(&[Some("fmt")], true, ReturnKind::Int);
        assert!(f.check_args(&args![]).is_err());
        assert!(f.check_args(&args!["x", 1, 2]).is_ok());
    }

    #[test]
    fn test_keywords_rejected_for_anonymous_params() {
        let f = proxy(&[None, None], false, ReturnKind::Int);
        let err = f.check_args(&Args::new().arg(1).kwarg("b", 2)).unwrap_err();
        assert!(matches!(err, CallError::Usage { .. }));
    }

    #[test]
    fn test_unknown_and_duplicate_keywords() {
        let f = proxy(&[Some("a"), Some("b")], false, ReturnKind::Int);
        let unknown = f.check_args(&Args::new().arg(1).kwarg("c", 2)).unwrap_err();
        assert!(unknown.to_string().contains("unexpected keyword argument 'c'"));

        let duplicate = f.check_args(&Args::new().arg(1).kwarg("a", 2)).unwrap_err();
        assert!(duplicate.to_string().contains("multiple values for argument 'a'"));

        assert!(f.check_args(&Args::new().kwarg("b", 2).kwarg("a", 1)).is_ok());
    }

    #[test]
    fn test_keywords_are_ordered_into_slots() {
        let f = proxy(&[Some("a"), Some("b"), Some("c")], false, ReturnKind::Int);
        let args = Args::new().arg(1).kwarg("c", 3).kwarg("b", 2);
        let ordered: Vec<_> = f.order(&args).into_iter().cloned().collect();
        assert_eq!(ordered, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn test_call_marshals_bytes_and_coerces_word() {
        // strlen(const char *) through the process image
        let f = proxy(&[Some("s")], false, ReturnKind::Word);
        assert_eq!(f.call(&args!["hello"]).unwrap(), Value::Int(5));
        let err = f.call(&args![b"a\0b".as_slice()]).unwrap_err();
        assert!(matches!(err, CallError::InteriorNul { index: 0, .. }));
    }

    #[test]
    fn test_int_return_sign_extends_low_bits() {
        let f = proxy(&[Some("s")], false, ReturnKind::Int);
        assert_eq!(f.coerce(0x1_FFFF_FFFF), Value::Int(-1));
        assert_eq!(f.coerce(7), Value::Int(7));
    }

    #[test]
    fn test_void_and_null_cstring() {
        assert_eq!(proxy(&[], false, ReturnKind::Void).coerce(99), Value::Null);
        assert_eq!(proxy(&[], false, ReturnKind::CString).coerce(0), Value::Null);
    }
}
