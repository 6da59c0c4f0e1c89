//! Syntax for Organised Assembly: lexical tables, the rule network, the
//! packrat engine, the concrete syntax tree and its JSON form.

pub mod engine;
pub mod error;
pub mod grammar;
pub mod input;
pub mod language;
pub mod lexicon;
pub mod parser;
pub mod serialize;
pub mod tree;
mod validator;

pub use engine::{MemoStats, ParseFailure, ParseOptions, Parser};
pub use grammar::{Grammar, GrammarBuilder, GrammarError, Rule, RuleId, RuleKind};
pub use input::{InputBuffer, Position};
pub use language::grammar;
pub use lexicon::{lexicon, Lexicon};
pub use parser::{parse, parse_rule, parse_str, parse_to_json, parse_with};
pub use serialize::{to_json, write_json};
pub use tree::Node;
