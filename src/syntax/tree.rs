//! Concrete syntax tree.
//!
//! Every node remembers the production that created it and where it starts.
//! Nonterminals own their children in match order; terminals keep the exact
//! matched text. Anonymous terminals (punctuation, keywords written inline in a
//! rule) carry no rule name.

use std::sync::Arc;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::syntax::input::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Terminal {
        rule: Option<Arc<str>>,
        text: String,
        position: Position,
    },
    NonTerminal {
        rule: Arc<str>,
        children: Vec<Node>,
        position: Position,
    },
}

impl Node {
    pub fn rule(&self) -> Option<&str> {
        match self {
            Node::Terminal { rule, .. } => rule.as_deref(),
            Node::NonTerminal { rule, .. } => Some(rule),
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Node::Terminal { position, .. } | Node::NonTerminal { position, .. } => *position,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Terminal { .. } => &[],
            Node::NonTerminal { children, .. } => children,
        }
    }

    /// Matched text of a terminal.
    pub fn text(&self) -> Option<&str> {
        match self {
            Node::Terminal { text, .. } => Some(text),
            Node::NonTerminal { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Node::Terminal { .. })
    }

    /// Direct children produced by `rule`.
    pub fn children_named<'a>(&'a self, rule: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children()
            .iter()
            .filter(move |child| child.rule() == Some(rule))
    }

    /// The direct child produced by `rule`, if there is exactly one.
    pub fn child(&self, rule: &str) -> Option<&Node> {
        let mut found = self
            .children()
            .iter()
            .filter(|child| child.rule() == Some(rule));
        let first = found.next()?;
        match found.next() {
            Some(_) => None,
            None => Some(first),
        }
    }

    /// Every node produced by `rule` below this one. A match is not searched
    /// further, so nested occurrences inside a match are not reported.
    pub fn find_all<'a>(&'a self, rule: &str) -> Vec<&'a Node> {
        let mut found = Vec::new();
        collect_named(self, rule, &mut found);
        found
    }

    /// Terminal texts of the subtree joined by single spaces.
    pub fn flatten(&self) -> String {
        match self {
            Node::Terminal { text, .. } => text.clone(),
            Node::NonTerminal { children, .. } => children
                .iter()
                .map(Node::flatten)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn collect_named<'a>(node: &'a Node, rule: &str, found: &mut Vec<&'a Node>) {
    for child in node.children() {
        if child.rule() == Some(rule) {
            found.push(child);
        } else {
            collect_named(child, rule, found);
        }
    }
}

// ============================================================================
// SERDE
// ============================================================================

/// Same shape as the wire form: `{"rule":[children...,line,column]}` for named
/// nodes and a bare string for anonymous terminals.
impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Terminal {
                rule: None, text, ..
            } => serializer.serialize_str(text),
            Node::Terminal {
                rule: Some(rule),
                text,
                position,
            } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(&**rule, &Entries::Text(text, *position))?;
                map.end()
            }
            Node::NonTerminal {
                rule,
                children,
                position,
            } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(&**rule, &Entries::Children(children, *position))?;
                map.end()
            }
        }
    }
}

enum Entries<'a> {
    Text(&'a str, Position),
    Children(&'a [Node], Position),
}

impl Serialize for Entries<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (len, position) = match self {
            Entries::Text(_, position) => (1, position),
            Entries::Children(children, position) => (children.len(), position),
        };
        let mut seq = serializer.serialize_seq(Some(len + 2))?;
        match self {
            Entries::Text(text, _) => seq.serialize_element(text)?,
            Entries::Children(children, _) => {
                for child in *children {
                    seq.serialize_element(child)?;
                }
            }
        }
        seq.serialize_element(&position.line)?;
        seq.serialize_element(&position.column)?;
        seq.end()
    }
}
