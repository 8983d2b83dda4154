//! # Path Module
//!
//! Route pattern compilation and the convertors that back typed path
//! parameters.
//!
//! ## Pattern syntax
//!
//! - Literal text is matched verbatim: `/users/list`
//! - `{name}` captures a run of characters up to the next `/`
//! - `{name:tag}` captures using the convertor registered under `tag`
//!   (built-ins: `str`, `int`)
//!
//! ```rust
//! use silkrouter::path::compile_path;
//!
//! let compiled = compile_path("/student/{name:str}/{age:int}").unwrap();
//! assert_eq!(compiled.normalized, "/student/{name}/{age}");
//! ```

mod compile;
mod convertor;

pub use compile::{compile_path, compile_path_with, CompiledPath, ConvertorList, PathSegment};
pub use convertor::{
    global_registry, register_convertor, ConvertError, Convertor, ConvertorRegistry,
    IntegerConvertor, ParamNotMatched, ParamValue, RawConvertor, RegexConvertor,
};
