//! Raw invocation through the integer-class C calling convention.
//!
//! Every argument travels as one machine word and the return register is read
//! back as one word. This covers integers, pointers, and strings; floating
//! point parameters and by-value structs are not supported.

use std::ffi::c_void;

/// Most words a native call can take.
pub const MAX_ARGS: usize = 8;

type Fn0 = extern "C" fn() -> i64;
type Fn1 = extern "C" fn(i64) -> i64;
type Fn2 = extern "C" fn(i64, i64) -> i64;
type Fn3 = extern "C" fn(i64, i64, i64) -> i64;
type Fn4 = extern "C" fn(i64, i64, i64, i64) -> i64;
type Fn5 = extern "C" fn(i64, i64, i64, i64, i64) -> i64;
type Fn6 = extern "C" fn(i64, i64, i64, i64, i64, i64) -> i64;
type Fn7 = extern "C" fn(i64, i64, i64, i64, i64, i64, i64) -> i64;
type Fn8 = extern "C" fn(i64, i64, i64, i64, i64, i64, i64, i64) -> i64;

/// Call `symbol` with `words`. Returns `None` when more than [`MAX_ARGS`]
/// words are given.
///
/// # Safety
///
/// `symbol` must point to a C function whose parameters are all
/// integer-class and that accepts exactly `words.len()` arguments (or is
/// variadic with at most that many fixed ones). Pointer words must be valid
/// for whatever the callee does with them.
pub unsafe fn invoke(symbol: *mut c_void, words: &[i64]) -> Option<i64> {
    let w = words;
    let ret = match w.len() {
        0 => std::mem::transmute::<*mut c_void, Fn0>(symbol)(),
        1 => std::mem::transmute::<*mut c_void, Fn1>(symbol)(w[0]),
        2 => std::mem::transmute::<*mut c_void, Fn2>(symbol)(w[0], w[1]),
        3 => std::mem::transmute::<*mut c_void, Fn3>(symbol)(w[0], w[1], w[2]),
        4 => std::mem::transmute::<*mut c_void, Fn4>(symbol)(w[0], w[1], w[2], w[3]),
        5 => std::mem::transmute::<*mut c_void, Fn5>(symbol)(w[0], w[1], w[2], w[3], w[4]),
        6 => std::mem::transmute::<*mut c_void, Fn6>(symbol)(w[0], w[1], w[2], w[3], w[4], w[5]),
        7 => std::mem::transmute::<*mut c_void, Fn7>(symbol)(
            w[0], w[1], w[2], w[3], w[4], w[5], w[6],
        ),
        8 => std::mem::transmute::<*mut c_void, Fn8>(symbol)(
            w[0], w[1], w[2], w[3], w[4], w[5], w[6], w[7],
        ),
        _ => return None,
    };
    Some(ret)
}
