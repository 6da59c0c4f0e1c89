//! Turns the engine's furthest-failure record into a diagnostic.

use crate::errors::{ErrorKind, OasmError, SourceContext};
use crate::syntax::engine::ParseFailure;
use crate::syntax::grammar::{Grammar, RuleKind};
use crate::syntax::input::InputBuffer;

/// Characters that can begin some token of the language.
const TOKEN_PUNCTUATION: &str = "[](){}<>,.:;=+-*/^&|~#'\"\n";

pub(crate) fn failure_to_error(
    failure: &ParseFailure,
    grammar: &Grammar,
    input: &InputBuffer<'_>,
    source: &SourceContext,
    max_expected: usize,
) -> OasmError {
    let offset = failure.offset;
    let location = input.position(offset);
    let expected = expected_summary(failure, grammar, max_expected);
    let found = found_token(input.rest(offset));

    let (kind, width) = if let Some(limit) = failure.depth_limit {
        (ErrorKind::NestingTooDeep { limit }, found.len())
    } else if let Some(word) = &failure.rejected {
        (ErrorKind::ReservedWord { word: word.clone() }, word.len())
    } else if offset >= input.len() {
        (ErrorKind::UnexpectedEnd { expected }, 0)
    } else if only_end_of_input(failure, grammar) {
        (
            ErrorKind::TrailingInput {
                found: describe(found),
            },
            found.len(),
        )
    } else {
        match found.chars().next() {
            Some(c) if !is_token_start(c) => (
                ErrorKind::InvalidCharacter {
                    character: c,
                    expected,
                },
                c.len_utf8(),
            ),
            _ => (
                ErrorKind::UnexpectedToken {
                    expected,
                    found: describe(found),
                },
                found.len(),
            ),
        }
    };

    OasmError::at(kind, source, (offset, width).into(), location, "parse")
}

/// Distinct labels of everything tried at the failure point, in the order
/// they were first tried, cut off after `limit`.
fn expected_summary(failure: &ParseFailure, grammar: &Grammar, limit: usize) -> String {
    let mut labels: Vec<&str> = Vec::new();
    for &id in &failure.expected {
        let rule = grammar.rule(id);
        let label = match rule.kind() {
            RuleKind::EndOfInput => "end of input",
            _ => rule.label(),
        };
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    let hidden = labels.len().saturating_sub(limit.max(1));
    labels.truncate(limit.max(1));

    let mut summary = match labels.split_last() {
        None => return "a valid statement".to_string(),
        Some((last, [])) => last.to_string(),
        Some((last, init)) => format!("{} or {}", init.join(", "), last),
    };
    if hidden > 0 {
        summary.push_str(&format!(" (and {hidden} more)"));
    }
    summary
}

fn only_end_of_input(failure: &ParseFailure, grammar: &Grammar) -> bool {
    !failure.expected.is_empty()
        && failure
            .expected
            .iter()
            .all(|&id| matches!(grammar.rule(id).kind(), RuleKind::EndOfInput))
}

/// The run of input the parser stumbled on: a whole word, or one character.
fn found_token(rest: &str) -> &str {
    let word_len: usize = rest
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .map(char::len_utf8)
        .sum();
    if word_len > 0 {
        return &rest[..word_len];
    }
    match rest.chars().next() {
        Some(c) => &rest[..c.len_utf8()],
        None => "",
    }
}

fn describe(found: &str) -> String {
    match found {
        "" => "end of input".to_string(),
        "\n" => "newline".to_string(),
        _ => format!("'{found}'"),
    }
}

fn is_token_start(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || TOKEN_PUNCTUATION.contains(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn found_token_takes_a_word_or_one_character() {
        assert_eq!(found_token("qword[x]"), "qword");
        assert_eq!(found_token("[x]"), "[");
        assert_eq!(found_token(""), "");
    }

    #[test]
    fn stray_characters_are_not_token_starts() {
        assert!(is_token_start('{'));
        assert!(is_token_start('r'));
        assert!(!is_token_start('@'));
        assert!(!is_token_start('$'));
    }

    #[test]
    fn describe_names_invisible_tokens() {
        assert_eq!(describe("\n"), "newline");
        assert_eq!(describe(""), "end of input");
        assert_eq!(describe("}"), "'}'");
    }
}
