//! Packrat evaluation of a [`Grammar`].
//!
//! One [`Parser`] is one parse: it owns the memo table and the furthest-failure
//! record, borrows the grammar and the input, and is dropped afterwards.
//! Failure is a value ([`Outcome::Failed`]); nothing unwinds.
//!
//! Matched subtrees are [`Fragment`]s behind `Rc`, so the memo table and every
//! rule that splices a result share one copy. The owned [`Node`] tree is built
//! once, after the whole input has matched.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::syntax::grammar::{Grammar, Rule, RuleId, RuleKind};
use crate::syntax::input::{InputBuffer, Position};
use crate::syntax::tree::Node;

/// Grow the stack when less than this much remains.
const RED_ZONE: usize = 100 * 1024;

/// Size of each stack extension.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Engine-side parse tree with shared children.
#[derive(Debug, Clone)]
pub(crate) enum Fragment {
    Terminal {
        rule: Option<Arc<str>>,
        text: Rc<str>,
        position: Position,
    },
    NonTerminal {
        rule: Arc<str>,
        children: Rc<[Fragment]>,
        position: Position,
    },
}

impl Fragment {
    fn position(&self) -> Position {
        match self {
            Fragment::Terminal { position, .. } | Fragment::NonTerminal { position, .. } => {
                *position
            }
        }
    }

    fn flatten(&self) -> String {
        match self {
            Fragment::Terminal { text, .. } => text.to_string(),
            Fragment::NonTerminal { children, .. } => children
                .iter()
                .map(Fragment::flatten)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    fn to_node(&self) -> Node {
        match self {
            Fragment::Terminal {
                rule,
                text,
                position,
            } => Node::Terminal {
                rule: rule.clone(),
                text: text.to_string(),
                position: *position,
            },
            Fragment::NonTerminal {
                rule,
                children,
                position,
            } => Node::NonTerminal {
                rule: Arc::clone(rule),
                children: children.iter().map(Fragment::to_node).collect(),
                position: *position,
            },
        }
    }
}

/// Result of applying one rule at one position. Cloning is cheap.
#[derive(Debug, Clone)]
pub(crate) enum Outcome {
    /// `nodes` are spliced into the caller; anonymous rules may yield several
    /// or none.
    Matched { nodes: Rc<[Fragment]>, end: usize },
    Failed,
}

/// Knobs for a single parse.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Cache (rule, position) outcomes. Turning this off changes speed only.
    pub memoize: bool,
    /// How many expectations an error message lists before eliding the rest.
    pub max_expected: usize,
    /// Deepest chain of nested rule applications before the parse gives up.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            memoize: true,
            max_expected: 8,
            max_depth: 1000,
        }
    }
}

/// The furthest point any terminal failed to match, and what was tried there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseFailure {
    pub offset: usize,
    /// Rules that failed at `offset`, in first-attempt order.
    pub expected: Vec<RuleId>,
    /// A reserved word turned away by a negative lookahead at `offset`.
    pub rejected: Option<String>,
    /// Set when the parse was abandoned at `offset` because rule nesting
    /// reached this limit.
    pub depth_limit: Option<usize>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MemoStats {
    pub entries: usize,
    pub hits: usize,
}

pub struct Parser<'g, 'i> {
    grammar: &'g Grammar,
    input: &'i InputBuffer<'i>,
    options: ParseOptions,
    memo: HashMap<(RuleId, usize), Outcome>,
    hits: usize,
    furthest: ParseFailure,
    lookahead_depth: usize,
    depth: usize,
    /// Where nesting hit `max_depth`; every later application fails.
    too_deep: Option<usize>,
    empty: Rc<[Fragment]>,
}

impl<'g, 'i> Parser<'g, 'i> {
    pub fn new(grammar: &'g Grammar, input: &'i InputBuffer<'i>, options: ParseOptions) -> Self {
        Self {
            grammar,
            input,
            options,
            memo: HashMap::new(),
            hits: 0,
            furthest: ParseFailure::default(),
            lookahead_depth: 0,
            depth: 0,
            too_deep: None,
            empty: Rc::from(Vec::new()),
        }
    }

    /// Applies `rule` at the start of the input and requires that nothing but
    /// whitespace follows it.
    pub fn run(mut self, rule: RuleId) -> Result<Vec<Node>, ParseFailure> {
        debug!(
            rule = self.grammar.rule(rule).label(),
            bytes = self.input.len(),
            "parse started"
        );
        let matched = match self.apply(rule, 0) {
            Outcome::Matched { nodes, end } => match self.apply(self.grammar.end_of_input(), end) {
                Outcome::Matched { .. } => Some(nodes),
                Outcome::Failed => None,
            },
            Outcome::Failed => None,
        };

        let stats = self.stats();
        debug!(memo_entries = stats.entries, memo_hits = stats.hits, "parse finished");
        if let Some(offset) = self.too_deep {
            return Err(ParseFailure {
                offset,
                depth_limit: Some(self.options.max_depth),
                ..ParseFailure::default()
            });
        }
        match matched {
            Some(nodes) => Ok(nodes.iter().map(Fragment::to_node).collect()),
            None => {
                debug!(offset = self.furthest.offset, "furthest failure");
                Err(self.furthest)
            }
        }
    }

    pub fn stats(&self) -> MemoStats {
        MemoStats {
            entries: self.memo.len(),
            hits: self.hits,
        }
    }

    fn apply(&mut self, id: RuleId, offset: usize) -> Outcome {
        if self.too_deep.is_some() {
            return Outcome::Failed;
        }
        if self.options.memoize {
            if let Some(cached) = self.memo.get(&(id, offset)) {
                self.hits += 1;
                return cached.clone();
            }
        }
        if self.depth >= self.options.max_depth {
            let at = self.input.skip_whitespace(offset);
            debug!(offset = at, limit = self.options.max_depth, "nesting limit reached");
            self.too_deep = Some(at);
            return Outcome::Failed;
        }

        self.depth += 1;
        let outcome = stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || {
            self.evaluate(id, offset)
        });
        self.depth -= 1;

        if self.options.memoize && self.too_deep.is_none() {
            self.memo.insert((id, offset), outcome.clone());
        }
        outcome
    }

    fn evaluate(&mut self, id: RuleId, offset: usize) -> Outcome {
        let grammar = self.grammar;
        let rule = grammar.rule(id);
        match rule.kind() {
            RuleKind::Literal { text, word } => {
                let at = self.input.skip_whitespace(offset);
                let rest = self.input.rest(at);
                let matched = rest.starts_with(text.as_str())
                    && !(*word && starts_with_word_char(&rest[text.len()..]));
                if matched {
                    self.terminal(rule, text, at)
                } else {
                    self.expect(id, at)
                }
            }
            RuleKind::Pattern(regex) => {
                let at = self.input.skip_whitespace(offset);
                match regex.find(self.input.rest(at)) {
                    Some(found) => self.terminal(rule, found.as_str(), at),
                    None => self.expect(id, at),
                }
            }
            RuleKind::EndOfInput => {
                let at = self.input.skip_whitespace(offset);
                if at == self.input.len() {
                    self.terminal(rule, "", at)
                } else {
                    self.expect(id, at)
                }
            }
            RuleKind::Sequence(items) => {
                let mut nodes = Vec::new();
                let mut cursor = offset;
                for &item in items {
                    match self.apply(item, cursor) {
                        Outcome::Matched { nodes: found, end } => {
                            nodes.extend(found.iter().cloned());
                            cursor = end;
                        }
                        Outcome::Failed => return Outcome::Failed,
                    }
                }
                wrap(rule, nodes.into(), cursor)
            }
            RuleKind::Choice(alternatives) => {
                for &alternative in alternatives {
                    if let Outcome::Matched { nodes, end } = self.apply(alternative, offset) {
                        return wrap(rule, nodes, end);
                    }
                }
                Outcome::Failed
            }
            RuleKind::Optional(item) => match self.apply(*item, offset) {
                Outcome::Matched { nodes, end } => wrap(rule, nodes, end),
                Outcome::Failed => wrap(rule, self.empty.clone(), offset),
            },
            RuleKind::ZeroOrMore(item) => self.repeat(rule, *item, offset, 0),
            RuleKind::OneOrMore(item) => self.repeat(rule, *item, offset, 1),
            RuleKind::NotFollowedBy(item) => {
                self.lookahead_depth += 1;
                let guarded = self.apply(*item, offset);
                self.lookahead_depth -= 1;
                match guarded {
                    Outcome::Matched { nodes, .. } => {
                        if let Some(first) = nodes.first() {
                            self.reject(first.position().offset, first.flatten());
                        }
                        Outcome::Failed
                    }
                    Outcome::Failed => Outcome::Matched {
                        nodes: self.empty.clone(),
                        end: offset,
                    },
                }
            }
            RuleKind::Reference(target) => match self.apply(*target, offset) {
                Outcome::Matched { nodes, end } => wrap(rule, nodes, end),
                Outcome::Failed => Outcome::Failed,
            },
        }
    }

    /// Greedy repetition. An iteration that consumes nothing ends the loop.
    fn repeat(&mut self, rule: &Rule, item: RuleId, offset: usize, min: usize) -> Outcome {
        let mut nodes = Vec::new();
        let mut cursor = offset;
        let mut count = 0;
        while let Outcome::Matched { nodes: found, end } = self.apply(item, cursor) {
            if end == cursor {
                break;
            }
            nodes.extend(found.iter().cloned());
            cursor = end;
            count += 1;
        }
        if count < min {
            return Outcome::Failed;
        }
        wrap(rule, nodes.into(), cursor)
    }

    fn terminal(&self, rule: &Rule, text: &str, at: usize) -> Outcome {
        trace!(rule = rule.label(), text = %text, offset = at, "terminal");
        let node = Fragment::Terminal {
            rule: rule.name().cloned(),
            text: Rc::from(text),
            position: self.input.position(at),
        };
        Outcome::Matched {
            nodes: Rc::from([node]),
            end: at + text.len(),
        }
    }

    fn expect(&mut self, id: RuleId, at: usize) -> Outcome {
        if self.lookahead_depth == 0 {
            let furthest = &mut self.furthest;
            if at > furthest.offset {
                *furthest = ParseFailure {
                    offset: at,
                    expected: vec![id],
                    ..ParseFailure::default()
                };
            } else if at == furthest.offset && !furthest.expected.contains(&id) {
                furthest.expected.push(id);
            }
        }
        Outcome::Failed
    }

    fn reject(&mut self, at: usize, word: String) {
        if self.lookahead_depth > 0 {
            return;
        }
        let furthest = &mut self.furthest;
        if at > furthest.offset {
            *furthest = ParseFailure {
                offset: at,
                rejected: Some(word),
                ..ParseFailure::default()
            };
        } else if at == furthest.offset && furthest.rejected.is_none() {
            furthest.rejected = Some(word);
        }
    }
}

/// Named composite rules gather what they matched into one node. Anonymous
/// rules pass their nodes through, and a named rule that matched nothing
/// leaves no node behind.
fn wrap(rule: &Rule, nodes: Rc<[Fragment]>, end: usize) -> Outcome {
    let nodes = match (rule.name(), nodes.first()) {
        (Some(name), Some(first)) => {
            let position = first.position();
            Rc::from([Fragment::NonTerminal {
                rule: Arc::clone(name),
                children: nodes,
                position,
            }])
        }
        _ => nodes,
    };
    Outcome::Matched { nodes, end }
}

fn starts_with_word_char(text: &str) -> bool {
    text.chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::grammar::{
        choice, eof, lit, many, many1, not, opt, r, re, seq, words, GrammarBuilder,
    };

    fn toy() -> Grammar {
        let mut g = GrammarBuilder::new();
        g.rule("keyword", words(["for", "if"]));
        g.rule("name", seq([not(r("keyword")), re("[a-z]+")]));
        g.rule("number", re("[0-9]+"));
        g.rule("value", choice([r("number"), r("name")]));
        g.rule("list", seq([r("value"), many(seq([lit(","), r("value")]))]));
        g.rule("line", seq([opt(r("list")), lit("\n")]));
        g.rule("file", seq([many1(r("line")), eof()]));
        g.build("file").unwrap()
    }

    fn parse_with(grammar: &Grammar, text: &str, options: ParseOptions) -> Result<Vec<Node>, ParseFailure> {
        let input = InputBuffer::new(text);
        Parser::new(grammar, &input, options).run(grammar.start())
    }

    fn parse(grammar: &Grammar, text: &str) -> Result<Vec<Node>, ParseFailure> {
        parse_with(grammar, text, ParseOptions::default())
    }

    #[test]
    fn anonymous_rules_splice_into_named_parent() {
        let grammar = toy();
        let nodes = parse(&grammar, "a, 1, b\n").unwrap();
        let file = &nodes[0];
        let list = &file.find_all("list")[0];
        let kinds: Vec<_> = list
            .children()
            .iter()
            .map(|c| c.rule().unwrap_or("-"))
            .collect();
        assert_eq!(kinds, ["value", "-", "value", "-", "value"]);
    }

    #[test]
    fn empty_named_match_leaves_no_node() {
        let mut g = GrammarBuilder::new();
        g.rule("sign", opt(lit("-")));
        g.rule("num", seq([r("sign"), re("[0-9]+")]));
        let grammar = g.build("num").unwrap();

        let unsigned = parse(&grammar, "5").unwrap();
        assert_eq!(unsigned[0].children().len(), 1);
        assert!(unsigned[0].child("sign").is_none());

        let signed = parse(&grammar, "-5").unwrap();
        assert_eq!(signed[0].children().len(), 2);
        assert!(signed[0].child("sign").is_some());
    }

    #[test]
    fn word_literal_needs_a_boundary() {
        let grammar = toy();
        let nodes = parse(&grammar, "format\n").unwrap();
        let names = nodes[0].find_all("name");
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].flatten(), "format");
    }

    #[test]
    fn lookahead_rejects_reserved_word_at_its_position() {
        let grammar = toy();
        let failure = parse(&grammar, "a, for\n").unwrap_err();
        assert_eq!(failure.offset, 3);
        assert_eq!(failure.rejected.as_deref(), Some("for"));
    }

    #[test]
    fn furthest_failure_lists_expectations_in_order() {
        let grammar = toy();
        let failure = parse(&grammar, "a b\n").unwrap_err();
        assert_eq!(failure.offset, 2);
        let labels: Vec<_> = failure
            .expected
            .iter()
            .map(|id| grammar.rule(*id).label().to_string())
            .collect();
        assert_eq!(labels, ["','", "newline"]);
    }

    #[test]
    fn whitespace_is_skipped_before_terminals_only() {
        let grammar = toy();
        let nodes = parse(&grammar, "  7 \t\n").unwrap();
        let number = nodes[0].find_all("number")[0];
        assert_eq!(number.position().column, 3);
        assert_eq!(nodes[0].position().column, 3);
    }

    #[test]
    fn memoization_does_not_change_the_tree() {
        let grammar = toy();
        let text = "a, 1\n\nb, c, 22\n";
        let with = parse(&grammar, text).unwrap();
        let without = parse_with(
            &grammar,
            text,
            ParseOptions {
                memoize: false,
                ..ParseOptions::default()
            },
        )
        .unwrap();
        assert_eq!(with, without);
    }

    #[test]
    fn memo_table_is_hit_on_backtracking() {
        let mut g = GrammarBuilder::new();
        g.rule("item", re("[a-z]+"));
        g.rule("top", choice([seq([r("item"), lit("!")]), seq([r("item"), lit("?")])]));
        let grammar = g.build("top").unwrap();
        let input = InputBuffer::new("abc?");
        let mut parser = Parser::new(&grammar, &input, ParseOptions::default());
        let outcome = parser.apply(grammar.start(), 0);
        assert!(matches!(outcome, Outcome::Matched { end: 4, .. }));
        assert!(parser.stats().hits >= 1);
    }

    #[test]
    fn memo_hits_share_the_matched_subtree() {
        let grammar = toy();
        let input = InputBuffer::new("a, 1\n");
        let mut parser = Parser::new(&grammar, &input, ParseOptions::default());
        let list = grammar.id_of("list").unwrap();
        let (Outcome::Matched { nodes: first, .. }, Outcome::Matched { nodes: second, .. }) =
            (parser.apply(list, 0), parser.apply(list, 0))
        else {
            panic!("list should match");
        };
        assert!(Rc::ptr_eq(&first, &second));
        assert!(parser.stats().hits >= 1);
    }

    fn nested() -> Grammar {
        let mut g = GrammarBuilder::new();
        g.rule("group", choice([seq([lit("("), r("group"), lit(")")]), lit("x")]));
        g.build("group").unwrap()
    }

    #[test]
    fn nesting_within_the_limit_parses() {
        let grammar = nested();
        let text = format!("{}x{}", "(".repeat(20), ")".repeat(20));
        let nodes = parse(&grammar, &text).unwrap();
        assert_eq!(nodes[0].find_all("group").len(), 1);
    }

    #[test]
    fn nesting_past_the_limit_fails_at_the_deepest_point() {
        let grammar = nested();
        let text = format!("{}x{}", "(".repeat(50), ")".repeat(50));
        let options = ParseOptions {
            max_depth: 32,
            ..ParseOptions::default()
        };
        let failure = parse_with(&grammar, &text, options).unwrap_err();
        assert_eq!(failure.depth_limit, Some(32));
        assert!(failure.offset > 0 && failure.offset < 50);
        assert!(failure.expected.is_empty());
    }

    #[test]
    fn ordered_choice_keeps_the_first_success() {
        let mut g = GrammarBuilder::new();
        g.rule("short", lit("<"));
        g.rule("long", lit("<<"));
        g.rule("top", seq([choice([r("short"), r("long")]), re("<?")]));
        let grammar = g.build("top").unwrap();
        let nodes = parse(&grammar, "<<").unwrap();
        assert_eq!(nodes[0].children()[0].rule(), Some("short"));
        assert_eq!(nodes[0].children().len(), 2);
    }
}
