//! Compact JSON rendering of a parse tree.
//!
//! The output is a single line. Strings are escaped for backslash, double
//! quote, tab and line feed only; every other character is copied as is, so
//! the text of a comment survives byte for byte.

use std::fmt::{self, Write};

use crate::syntax::tree::Node;

/// Renders `node` as one line of JSON, without a trailing newline.
pub fn to_json(node: &Node) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_json(node, &mut out);
    out
}

pub fn write_json<W: Write>(node: &Node, out: &mut W) -> fmt::Result {
    match node {
        Node::Terminal {
            rule: None, text, ..
        } => write_string(text, out),
        Node::Terminal {
            rule: Some(rule),
            text,
            position,
        } => {
            out.write_str("{")?;
            write_string(rule, out)?;
            out.write_str(":[")?;
            write_string(text, out)?;
            write!(out, ",{},{}]}}", position.line, position.column)
        }
        Node::NonTerminal {
            rule,
            children,
            position,
        } => {
            out.write_str("{")?;
            write_string(rule, out)?;
            out.write_str(":[")?;
            for child in children {
                write_json(child, out)?;
                out.write_char(',')?;
            }
            write!(out, "{},{}]}}", position.line, position.column)
        }
    }
}

/// Quotes `text`, escaping `\`, `"`, tab and line feed.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    let _ = write_string(text, &mut out);
    out
}

fn write_string<W: Write>(text: &str, out: &mut W) -> fmt::Result {
    out.write_char('"')?;
    for c in text.chars() {
        match c {
            '\\' => out.write_str("\\\\")?,
            '"' => out.write_str("\\\"")?,
            '\t' => out.write_str("\\t")?,
            '\n' => out.write_str("\\n")?,
            _ => out.write_char(c)?,
        }
    }
    out.write_char('"')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::input::Position;
    use std::sync::Arc;

    fn at(line: usize, column: usize) -> Position {
        Position {
            offset: 0,
            line,
            column,
        }
    }

    #[test]
    fn escapes_only_the_four_characters() {
        assert_eq!(escape("a\\b"), r#""a\\b""#);
        assert_eq!(escape("say \"hi\""), r#""say \"hi\"""#);
        assert_eq!(escape("\t\n"), r#""\t\n""#);
        assert_eq!(escape("\r/é"), "\"\r/é\"");
    }

    #[test]
    fn named_terminal_carries_text_and_position() {
        let node = Node::Terminal {
            rule: Some(Arc::from("comment")),
            text: "# \"x\"".into(),
            position: at(3, 14),
        };
        assert_eq!(to_json(&node), r##"{"comment":["# \"x\"",3,14]}"##);
    }

    #[test]
    fn nonterminal_lists_children_then_position() {
        let node = Node::NonTerminal {
            rule: Arc::from("label"),
            position: at(2, 1),
            children: vec![
                Node::Terminal {
                    rule: Some(Arc::from("name")),
                    text: "loop".into(),
                    position: at(2, 1),
                },
                Node::Terminal {
                    rule: None,
                    text: ":".into(),
                    position: at(2, 5),
                },
            ],
        };
        assert_eq!(to_json(&node), r#"{"label":[{"name":["loop",2,1]},":",2,1]}"#);
    }

    #[test]
    fn matches_the_serde_rendering() {
        let node = Node::NonTerminal {
            rule: Arc::from("namePath"),
            position: at(1, 7),
            children: vec![
                Node::Terminal {
                    rule: Some(Arc::from("name")),
                    text: "std".into(),
                    position: at(1, 7),
                },
                Node::Terminal {
                    rule: None,
                    text: ".".into(),
                    position: at(1, 10),
                },
            ],
        };
        let ours: serde_json::Value = serde_json::from_str(&to_json(&node)).unwrap();
        assert_eq!(ours, serde_json::to_value(&node).unwrap());
    }
}
