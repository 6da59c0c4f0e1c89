//! oasm: a memoizing PEG front end for the Organised Assembly macro language.
//!
//! Source text is parsed against a fixed rule network into a concrete syntax
//! tree, which is rendered as one line of position-annotated JSON for the
//! downstream compiler.

pub use crate::errors::{print_error, ErrorCategory, ErrorKind, OasmError, SourceContext};
pub use crate::syntax::{parse, parse_rule, parse_str, parse_to_json, to_json, Node, Position};

pub mod cache;
pub mod cli;
pub mod errors;
pub mod project;
pub mod syntax;
