//! Grammar model: productions as data.
//!
//! A [`Grammar`] is a flat registry of [`Rule`]s addressed by [`RuleId`].
//! Composite rules hold ids, never owned copies, so the recursive language
//! (statement -> controlFlow -> ifStatement -> localBody -> statement) is an
//! ordinary graph. Named rules are registered before any body is lowered,
//! which is what lets a body refer to a rule declared further down.
//!
//! Grammars are written with the small [`Expr`] DSL and assembled by
//! [`GrammarBuilder`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use thiserror::Error;

use crate::syntax::validator;

// ============================================================================
// RULES
// ============================================================================

/// Identity of a rule inside one grammar. Memo entries are keyed on this, not
/// on the rule's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(u32);

impl RuleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The closed set of rule kinds the engine knows how to evaluate.
#[derive(Debug)]
pub enum RuleKind {
    /// Exact text. Word-like literals only match on a word boundary.
    Literal { text: String, word: bool },
    /// Regular expression anchored at the cursor.
    Pattern(Regex),
    /// Succeeds with empty text only when nothing but whitespace remains.
    EndOfInput,
    Sequence(Vec<RuleId>),
    /// Ordered choice: the first alternative that matches wins.
    Choice(Vec<RuleId>),
    Optional(RuleId),
    ZeroOrMore(RuleId),
    OneOrMore(RuleId),
    /// Negative lookahead. Never consumes input.
    NotFollowedBy(RuleId),
    /// A named rule whose whole body is another rule.
    Reference(RuleId),
}

#[derive(Debug)]
pub struct Rule {
    name: Option<Arc<str>>,
    kind: RuleKind,
    label: String,
}

impl Rule {
    /// The production name, or `None` for an anonymous sub-expression.
    pub fn name(&self) -> Option<&Arc<str>> {
        self.name.as_ref()
    }

    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    /// How the rule is described when it shows up in an "expected" list.
    pub fn label(&self) -> &str {
        &self.label
    }
}

// ============================================================================
// EXPRESSION DSL
// ============================================================================

/// Grammar source form. Lowered into [`Rule`]s by [`GrammarBuilder::build`].
#[derive(Debug, Clone)]
pub enum Expr {
    Lit(String),
    Re(String),
    Eof,
    Ref(String),
    Seq(Vec<Expr>),
    Choice(Vec<Expr>),
    Opt(Box<Expr>),
    Many(Box<Expr>),
    Many1(Box<Expr>),
    Not(Box<Expr>),
}

pub fn lit(text: impl Into<String>) -> Expr {
    Expr::Lit(text.into())
}

pub fn re(pattern: impl Into<String>) -> Expr {
    Expr::Re(pattern.into())
}

pub fn eof() -> Expr {
    Expr::Eof
}

/// Reference to a named rule, resolved at build time.
pub fn r(name: impl Into<String>) -> Expr {
    Expr::Ref(name.into())
}

pub fn seq(items: impl IntoIterator<Item = Expr>) -> Expr {
    Expr::Seq(items.into_iter().collect())
}

pub fn choice(items: impl IntoIterator<Item = Expr>) -> Expr {
    Expr::Choice(items.into_iter().collect())
}

/// Ordered choice over a table of literal words.
pub fn words<S: AsRef<str>>(table: impl IntoIterator<Item = S>) -> Expr {
    Expr::Choice(table.into_iter().map(|w| lit(w.as_ref())).collect())
}

pub fn opt(item: Expr) -> Expr {
    Expr::Opt(Box::new(item))
}

pub fn many(item: Expr) -> Expr {
    Expr::Many(Box::new(item))
}

pub fn many1(item: Expr) -> Expr {
    Expr::Many1(Box::new(item))
}

pub fn not(item: Expr) -> Expr {
    Expr::Not(Box::new(item))
}

impl Expr {
    /// A choice whose alternatives are all literals, such as a register table.
    fn is_word_set(&self) -> bool {
        matches!(self, Expr::Choice(items) if items.iter().all(|e| matches!(e, Expr::Lit(_))))
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("rule '{0}' is defined more than once")]
    DuplicateRule(String),
    #[error("rule '{rule}' refers to undefined rule '{target}'")]
    UndefinedReference { rule: String, target: String },
    #[error("start rule '{0}' is not defined")]
    MissingStart(String),
    #[error("rule '{rule}' has an invalid pattern /{pattern}/: {reason}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        reason: String,
    },
}

// ============================================================================
// BUILDER
// ============================================================================

/// Collects named definitions in declaration order.
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    definitions: Vec<(String, Expr)>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(&mut self, name: &str, body: Expr) -> &mut Self {
        self.definitions.push((name.to_string(), body));
        self
    }

    /// Checks the definitions and lowers them into a [`Grammar`].
    pub fn build(self, start: &str) -> Result<Grammar, GrammarError> {
        validator::check_definitions(&self.definitions, start)?;

        let mut by_name = BTreeMap::new();
        for (index, (name, _)) in self.definitions.iter().enumerate() {
            by_name.insert(name.clone(), RuleId(index as u32));
        }

        let mut lowering = Lowering {
            by_name: &by_name,
            rules: Vec::with_capacity(self.definitions.len() * 4),
        };
        // Named rules own the first ids; their slots are filled in below.
        for (name, _) in &self.definitions {
            lowering.rules.push(Rule {
                name: Some(Arc::from(name.as_str())),
                kind: RuleKind::Sequence(Vec::new()),
                label: name.clone(),
            });
        }
        for (index, (name, body)) in self.definitions.iter().enumerate() {
            let kind = lowering.lower_named(name, body)?;
            lowering.rules[index].kind = kind;
        }

        let end = lowering.push(None, RuleKind::EndOfInput, "end of input".to_string());
        let start = by_name[start];
        Ok(Grammar {
            rules: lowering.rules,
            by_name,
            named: self.definitions.len(),
            start,
            end,
        })
    }
}

struct Lowering<'a> {
    by_name: &'a BTreeMap<String, RuleId>,
    rules: Vec<Rule>,
}

impl Lowering<'_> {
    fn push(&mut self, name: Option<Arc<str>>, kind: RuleKind, label: String) -> RuleId {
        let id = RuleId(self.rules.len() as u32);
        self.rules.push(Rule { name, kind, label });
        id
    }

    fn lower_named(&mut self, name: &str, body: &Expr) -> Result<RuleKind, GrammarError> {
        let word_set = body.is_word_set();
        match body {
            Expr::Ref(target) => Ok(RuleKind::Reference(self.by_name[target])),
            _ => self.lower_kind(name, word_set, body),
        }
    }

    fn lower_kind(
        &mut self,
        owner: &str,
        word_set: bool,
        expr: &Expr,
    ) -> Result<RuleKind, GrammarError> {
        let kind = match expr {
            Expr::Lit(text) => RuleKind::Literal {
                word: is_word(text),
                text: text.clone(),
            },
            Expr::Re(pattern) => {
                let regex = Regex::new(&format!("^(?:{pattern})")).map_err(|e| {
                    GrammarError::InvalidPattern {
                        rule: owner.to_string(),
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    }
                })?;
                RuleKind::Pattern(regex)
            }
            Expr::Eof => RuleKind::EndOfInput,
            Expr::Ref(target) => RuleKind::Reference(self.by_name[target]),
            Expr::Seq(items) => RuleKind::Sequence(self.lower_all(owner, word_set, items)?),
            Expr::Choice(items) => RuleKind::Choice(self.lower_all(owner, word_set, items)?),
            Expr::Opt(item) => RuleKind::Optional(self.lower_anonymous(owner, word_set, item)?),
            Expr::Many(item) => RuleKind::ZeroOrMore(self.lower_anonymous(owner, word_set, item)?),
            Expr::Many1(item) => RuleKind::OneOrMore(self.lower_anonymous(owner, word_set, item)?),
            Expr::Not(item) => {
                RuleKind::NotFollowedBy(self.lower_anonymous(owner, word_set, item)?)
            }
        };
        Ok(kind)
    }

    fn lower_all(
        &mut self,
        owner: &str,
        word_set: bool,
        items: &[Expr],
    ) -> Result<Vec<RuleId>, GrammarError> {
        items
            .iter()
            .map(|item| self.lower_anonymous(owner, word_set, item))
            .collect()
    }

    fn lower_anonymous(
        &mut self,
        owner: &str,
        word_set: bool,
        expr: &Expr,
    ) -> Result<RuleId, GrammarError> {
        if let Expr::Ref(target) = expr {
            return Ok(self.by_name[target]);
        }
        let label = match expr {
            Expr::Lit(_) if word_set => owner.to_string(),
            Expr::Lit(text) => quote_literal(text),
            Expr::Re(_) => owner.to_string(),
            Expr::Eof => "end of input".to_string(),
            _ => owner.to_string(),
        };
        let kind = self.lower_kind(owner, word_set, expr)?;
        Ok(self.push(None, kind, label))
    }
}

/// Word-like literals (`for`, `r8`, `byte`) must be followed by a non-word
/// character to match.
fn is_word(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn quote_literal(text: &str) -> String {
    match text {
        "\n" => "newline".to_string(),
        "" => "empty text".to_string(),
        _ => format!("'{text}'"),
    }
}

// ============================================================================
// GRAMMAR
// ============================================================================

/// An immutable rule network with a designated start rule.
pub struct Grammar {
    rules: Vec<Rule>,
    by_name: BTreeMap<String, RuleId>,
    named: usize,
    start: RuleId,
    end: RuleId,
}

impl Grammar {
    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.index()]
    }

    pub fn id_of(&self, name: &str) -> Option<RuleId> {
        self.by_name.get(name).copied()
    }

    pub fn start(&self) -> RuleId {
        self.start
    }

    /// An anonymous end-of-input check, used when parsing a fragment against
    /// a rule that does not end with one itself.
    pub fn end_of_input(&self) -> RuleId {
        self.end
    }

    /// Named productions in declaration order.
    pub fn rule_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.rules[..self.named]
            .iter()
            .filter_map(|rule| rule.name.as_deref())
    }

    /// Total number of rules, anonymous sub-expressions included.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("rules", &self.rules.len())
            .field("named", &self.named)
            .field("start", &self.rule(self.start).label)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_references_resolve_to_named_ids() {
        let mut g = GrammarBuilder::new();
        g.rule("list", seq([lit("("), many(r("item")), lit(")")]));
        g.rule("item", choice([r("list"), re("[a-z]+")]));
        let grammar = g.build("list").unwrap();

        let item = grammar.id_of("item").unwrap();
        let list = grammar.id_of("list").unwrap();
        match grammar.rule(item).kind() {
            RuleKind::Choice(alternatives) => assert_eq!(alternatives[0], list),
            other => panic!("unexpected kind {other:?}"),
        }
        assert_eq!(grammar.rule_names().collect::<Vec<_>>(), ["list", "item"]);
    }

    #[test]
    fn word_literals_are_boundary_checked() {
        assert!(is_word("for"));
        assert!(is_word("r8d"));
        assert!(is_word("_x1"));
        assert!(!is_word("<<"));
        assert!(!is_word("\n"));
        assert!(!is_word(""));
    }

    #[test]
    fn word_set_literals_take_the_rule_label() {
        let mut g = GrammarBuilder::new();
        g.rule("reg", words(["al", "ah"]));
        g.rule("pair", seq([r("reg"), lit(","), r("reg")]));
        let grammar = g.build("pair").unwrap();
        let labels: Vec<&str> = (0..grammar.len())
            .map(|i| grammar.rules[i].label())
            .collect();
        assert!(labels.contains(&"reg"));
        assert!(labels.contains(&"','"));
        assert!(!labels.contains(&"'al'"));
    }

    #[test]
    fn alias_rule_lowers_to_reference() {
        let mut g = GrammarBuilder::new();
        g.rule("a", lit("x"));
        g.rule("b", r("a"));
        let grammar = g.build("b").unwrap();
        let b = grammar.id_of("b").unwrap();
        assert!(matches!(grammar.rule(b).kind(), RuleKind::Reference(_)));
    }

    #[test]
    fn invalid_pattern_is_reported_with_its_rule() {
        let mut g = GrammarBuilder::new();
        g.rule("bad", re("[unclosed"));
        let err = g.build("bad").unwrap_err();
        assert!(matches!(err, GrammarError::InvalidPattern { ref rule, .. } if rule == "bad"));
    }
}
