//! Entry points that parse source text against the language grammar.
//!
//! Each call builds its own [`Parser`], so the memo table and input index
//! never outlive one parse; only the grammar is shared.

use tracing::debug;

use crate::errors::{ErrorKind, OasmError, SourceContext};
use crate::syntax::engine::{ParseOptions, Parser};
use crate::syntax::error::failure_to_error;
use crate::syntax::grammar::{Grammar, RuleId};
use crate::syntax::input::InputBuffer;
use crate::syntax::language::grammar;
use crate::syntax::serialize::to_json;
use crate::syntax::tree::Node;

/// Parses a whole program with default options.
pub fn parse(source: &SourceContext) -> Result<Node, OasmError> {
    parse_with(source, ParseOptions::default())
}

pub fn parse_with(source: &SourceContext, options: ParseOptions) -> Result<Node, OasmError> {
    let grammar = grammar();
    let node = run(grammar, grammar.start(), source, options)?;
    node.ok_or_else(|| {
        OasmError::unspanned(
            ErrorKind::Grammar {
                message: "start rule produced no tree".into(),
            },
            &source.name,
            "parse",
        )
    })
}

/// Parses `text` as an anonymous source.
pub fn parse_str(text: &str) -> Result<Node, OasmError> {
    parse(&SourceContext::from_file("<input>", text))
}

/// Parses a program and renders it as one line of JSON.
pub fn parse_to_json(source: &SourceContext) -> Result<String, OasmError> {
    parse(source).map(|tree| to_json(&tree))
}

/// Parses `text` against the named production, which must consume all of it.
///
/// A production that matched without producing anything (an empty
/// `statement`, say) yields `Ok(None)`.
pub fn parse_rule(rule: &str, text: &str) -> Result<Option<Node>, OasmError> {
    let grammar = grammar();
    let id = grammar.id_of(rule).ok_or_else(|| {
        OasmError::unspanned(
            ErrorKind::UnknownRule {
                rule: rule.to_string(),
            },
            "grammar",
            "parse",
        )
    })?;
    let source = SourceContext::from_file(format!("<{rule}>"), text);
    run(grammar, id, &source, ParseOptions::default())
}

fn run(
    grammar: &Grammar,
    rule: RuleId,
    source: &SourceContext,
    options: ParseOptions,
) -> Result<Option<Node>, OasmError> {
    let input = InputBuffer::new(&source.content);
    let parser = Parser::new(grammar, &input, options);
    match parser.run(rule) {
        Ok(nodes) => Ok(nodes.into_iter().next()),
        Err(failure) => {
            debug!(source = %source.name, offset = failure.offset, "parse failed");
            Err(failure_to_error(
                &failure,
                grammar,
                &input,
                source,
                options.max_expected,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCategory;

    #[test]
    fn program_ends_with_eof_terminal() {
        let tree = parse_str("").unwrap();
        assert_eq!(tree.rule(), Some("program"));
        let last = tree.children().last().unwrap();
        assert_eq!(last.rule(), Some("EOF"));
        assert_eq!(last.text(), Some(""));
    }

    #[test]
    fn unknown_rule_is_reported() {
        let error = parse_rule("nonsense", "x").unwrap_err();
        assert_eq!(error.category(), ErrorCategory::Internal);
    }

    #[test]
    fn fragment_with_leftovers_is_trailing_input() {
        let error = parse_rule("decimal", "12 34").unwrap_err();
        assert!(matches!(error.kind, ErrorKind::TrailingInput { .. }));
    }
}
