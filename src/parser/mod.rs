/// Backtracking PEG engine for markdown
///
/// Rules are plain methods returning `bool`, composed from the primitives in
/// this module: sequences are `&&` chains inside [`Parser::attempt`], ordered
/// choice is `||` over attempts, repetition is [`Parser::zero_or_more`] /
/// [`Parser::one_or_more`], and lookahead is [`Parser::test`] /
/// [`Parser::test_not`]. A rule that recognizes a construct pushes its node on
/// the value stack; the caller folds it into a parent with
/// [`Parser::add_as_child`]. Every backtrack restores both the input position
/// and the value stack height.
mod blocks;
mod html;
mod inlines;
mod reparse;
mod tables;

use crate::ast::{Node, NodeKind, RootNode};
use crate::error::ParseError;
use crate::extensions::Extensions;
use crate::options::Options;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tracing::debug;

/// Parse `source` with the given extensions.
pub fn parse(source: &str, extensions: Extensions) -> Result<RootNode, ParseError> {
    Parser::new(Options::new(extensions)).parse(source)
}

/// A markdown parser. One instance parses one document at a time; use separate
/// instances for concurrent documents.
pub struct Parser {
    options: Options,
    special_chars: Vec<char>,
    /// State of the parse in progress.
    ctx: Context,
    /// Outer parses suspended while a nested reparse runs.
    suspended: Vec<Context>,
    /// Set when a nested reparse failed; the whole parse is unwinding.
    abort: Option<Failure>,
}

#[derive(Debug, Default)]
struct Context {
    input: Vec<char>,
    pos: usize,
    stack: Vec<Node>,
    memo: HashMap<(Rule, usize), Memo>,
    /// Per backtick count: a range known to contain no closing run.
    code_span_misses: HashMap<usize, (usize, usize)>,
    failure: Failure,
}

/// Rules cached per input position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Rule {
    Inline,
    NonAutoLinkInline,
    Endline,
    UlOrStarLine,
    ClosedRun(char),
    Label,
    /// An HTML block element, by index into the block tag list.
    HtmlTagBlock(usize),
}

#[derive(Debug, Clone)]
enum Memo {
    Miss,
    Hit { end: usize, node: Option<Node> },
}

#[derive(Debug, Clone, Copy)]
struct Mark {
    pos: usize,
    stack: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Expected {
    Char(char),
    Named(&'static str),
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Char(c) => write!(f, "{:?}", c),
            Expected::Named(name) => f.write_str(name),
        }
    }
}

/// Furthest point a parse reached and what it tried there.
#[derive(Debug, Clone, Default)]
struct Failure {
    offset: usize,
    expected: BTreeSet<Expected>,
    depth: usize,
}

impl Parser {
    pub fn new(options: Options) -> Self {
        Parser {
            special_chars: options.extensions.special_chars().chars().collect(),
            options,
            ctx: Context::default(),
            suspended: Vec::new(),
            abort: None,
        }
    }

    pub fn extensions(&self) -> Extensions {
        self.options.extensions
    }

    fn ext(&self, extension: Extensions) -> bool {
        self.options.extensions.contains(extension)
    }

    /// Normalizes and parses a complete document.
    pub fn parse(&mut self, source: &str) -> Result<RootNode, ParseError> {
        let input = self.options.normalize(source);
        debug!(
            chars = input.len(),
            extensions = ?self.options.extensions,
            "parsing document"
        );
        self.abort = None;
        match self.parse_document(input.clone()) {
            Ok(tree) => {
                let root = RootNode::from_tree(tree);
                debug!(
                    blocks = root.node.children.len(),
                    references = root.references.len(),
                    abbreviations = root.abbreviations.len(),
                    "parsed document"
                );
                Ok(root)
            }
            Err(failure) => {
                let expected = failure.expected.iter().map(ToString::to_string).collect();
                Err(ParseError::at(&input, failure.offset, expected, failure.depth))
            }
        }
    }

    /// Runs the root rule over `input` in a fresh context, suspending the
    /// current one. Offsets in the returned tree are relative to `input`.
    fn parse_document(&mut self, input: Vec<char>) -> Result<Node, Failure> {
        let fresh = Context {
            input,
            ..Context::default()
        };
        self.suspended.push(std::mem::replace(&mut self.ctx, fresh));
        let matched = self.root();
        let depth = self.suspended.len() - 1;
        let outer = self.suspended.pop().unwrap_or_default();
        let mut ctx = std::mem::replace(&mut self.ctx, outer);

        if let Some(failure) = self.abort.take() {
            return Err(failure);
        }
        match ctx.stack.pop() {
            Some(root) if matched => Ok(root),
            _ => {
                ctx.failure.depth = depth;
                Err(ctx.failure)
            }
        }
    }

    fn root(&mut self) -> bool {
        let len = self.ctx.input.len();
        self.push(Node::new(NodeKind::Root, 0, len));
        self.zero_or_more(|p| p.block() && p.add_as_child());
        self.zero_or_more(Self::blank_line);
        if !self.eoi() {
            self.expect(Expected::Named("end of input"));
            return false;
        }
        true
    }

    // ---- input access ----

    fn pos(&self) -> usize {
        self.ctx.pos
    }

    fn peek(&self) -> Option<char> {
        if self.abort.is_some() {
            return None;
        }
        self.ctx.input.get(self.ctx.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        if self.abort.is_some() {
            return None;
        }
        self.ctx.input.get(self.ctx.pos + ahead).copied()
    }

    fn prev_char(&self) -> Option<char> {
        self.ctx.pos.checked_sub(1).map(|i| self.ctx.input[i])
    }

    fn eoi(&self) -> bool {
        self.ctx.pos >= self.ctx.input.len()
    }

    fn matched(&self, start: usize) -> String {
        self.ctx.input[start..self.ctx.pos].iter().collect()
    }

    fn expect(&mut self, expected: Expected) {
        let failure = &mut self.ctx.failure;
        if self.ctx.pos > failure.offset {
            failure.offset = self.ctx.pos;
            failure.expected.clear();
        }
        if self.ctx.pos == failure.offset {
            failure.expected.insert(expected);
        }
    }

    // ---- terminals ----

    fn ch(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.ctx.pos += 1;
            true
        } else {
            self.expect(Expected::Char(c));
            false
        }
    }

    fn string(&mut self, s: &str) -> bool {
        let start = self.ctx.pos;
        for c in s.chars() {
            if !self.ch(c) {
                self.ctx.pos = start;
                return false;
            }
        }
        true
    }

    fn any_of(&mut self, set: &'static str) -> bool {
        match self.peek() {
            Some(c) if set.contains(c) => {
                self.ctx.pos += 1;
                true
            }
            _ => {
                self.expect(Expected::Named(set));
                false
            }
        }
    }

    fn char_if(&mut self, name: &'static str, pred: impl Fn(char) -> bool) -> bool {
        match self.peek() {
            Some(c) if pred(c) => {
                self.ctx.pos += 1;
                true
            }
            _ => {
                self.expect(Expected::Named(name));
                false
            }
        }
    }

    fn any(&mut self) -> bool {
        self.char_if("any character", |_| true)
    }

    fn n_or_more(&mut self, c: char, n: usize) -> bool {
        let start = self.ctx.pos;
        while self.peek() == Some(c) {
            self.ctx.pos += 1;
        }
        if self.ctx.pos - start >= n {
            true
        } else {
            self.ctx.pos = start;
            self.expect(Expected::Char(c));
            false
        }
    }

    // ---- combinators ----

    fn mark(&self) -> Mark {
        Mark {
            pos: self.ctx.pos,
            stack: self.ctx.stack.len(),
        }
    }

    fn reset(&mut self, mark: Mark) {
        self.ctx.pos = mark.pos;
        self.ctx.stack.truncate(mark.stack);
    }

    /// Runs `rule` as a unit: on failure nothing it consumed or pushed survives.
    fn attempt(&mut self, rule: impl FnOnce(&mut Self) -> bool) -> bool {
        let mark = self.mark();
        if rule(self) {
            true
        } else {
            self.reset(mark);
            false
        }
    }

    /// Zero-width positive lookahead.
    fn test(&mut self, rule: impl FnOnce(&mut Self) -> bool) -> bool {
        let mark = self.mark();
        let matched = rule(self);
        self.reset(mark);
        matched
    }

    /// Zero-width negative lookahead.
    fn test_not(&mut self, rule: impl FnOnce(&mut Self) -> bool) -> bool {
        !self.test(rule)
    }

    fn optional(&mut self, rule: impl FnOnce(&mut Self) -> bool) -> bool {
        self.attempt(rule);
        true
    }

    fn zero_or_more(&mut self, mut rule: impl FnMut(&mut Self) -> bool) -> bool {
        loop {
            let before = self.ctx.pos;
            if !self.attempt(&mut rule) || self.ctx.pos == before {
                return true;
            }
        }
    }

    fn one_or_more(&mut self, mut rule: impl FnMut(&mut Self) -> bool) -> bool {
        self.attempt(&mut rule) && self.zero_or_more(rule)
    }

    /// Like [`Parser::attempt`], and stamps the source range it matched onto
    /// the node left on top of the stack.
    fn node_seq(&mut self, rule: impl FnOnce(&mut Self) -> bool) -> bool {
        let start = self.ctx.pos;
        let depth = self.ctx.stack.len();
        if !self.attempt(rule) {
            return false;
        }
        let end = self.ctx.pos;
        if self.ctx.stack.len() > depth
            && let Some(node) = self.ctx.stack.last_mut()
        {
            node.start = start;
            node.end = end;
        }
        true
    }

    /// Caches the outcome of `rule` at the current position. Misses are always
    /// cached. Successes are cached when the rule leaves no node or a single
    /// leaf; replaying a node with children would copy its whole subtree on
    /// every hit, which turns long nested runs quadratic.
    fn memo(&mut self, rule: Rule, parse: impl FnOnce(&mut Self) -> bool) -> bool {
        let key = (rule, self.ctx.pos);
        if let Some(entry) = self.ctx.memo.get(&key) {
            return match entry.clone() {
                Memo::Miss => false,
                Memo::Hit { end, node } => {
                    self.ctx.pos = end;
                    if let Some(node) = node {
                        self.push(node);
                    }
                    true
                }
            };
        }

        let depth = self.ctx.stack.len();
        let matched = self.attempt(parse);
        let entry = if !matched {
            Memo::Miss
        } else {
            let node = match self.ctx.stack.len() - depth {
                0 => None,
                1 => match self.ctx.stack.last() {
                    Some(node) if node.children.is_empty() => Some(node.clone()),
                    _ => return true,
                },
                _ => return true,
            };
            Memo::Hit { end: self.ctx.pos, node }
        };
        if self.abort.is_none() {
            self.ctx.memo.insert(key, entry);
        }
        matched
    }

    // ---- value stack ----

    fn push(&mut self, node: Node) -> bool {
        self.ctx.stack.push(node);
        true
    }

    fn pop(&mut self) -> Option<Node> {
        self.ctx.stack.pop()
    }

    fn peek_node_mut(&mut self) -> Option<&mut Node> {
        self.ctx.stack.last_mut()
    }

    /// Pushes a leaf spanning `start..pos`.
    fn push_leaf(&mut self, kind: NodeKind, start: usize) -> bool {
        let end = self.ctx.pos;
        self.push(Node::new(kind, start, end))
    }

    /// Pops the top node and appends it to the node beneath it.
    fn add_as_child(&mut self) -> bool {
        let Some(child) = self.pop() else {
            return false;
        };
        match self.peek_node_mut() {
            Some(parent) => {
                parent.push_child(child);
                true
            }
            None => false,
        }
    }

    fn drop_node(&mut self) -> bool {
        self.pop().is_some()
    }

    /// Pops the top node and pushes `kind` with the popped node's children and range.
    fn retype(&mut self, kind: NodeKind) -> bool {
        match self.pop() {
            Some(node) => self.push(Node::with_children(kind, node.start, node.end, node.children)),
            None => false,
        }
    }

    // ---- shared character classes ----

    fn spacechar(&mut self) -> bool {
        self.any_of(" \t")
    }

    fn nonspacechar(&mut self) -> bool {
        self.char_if("non-space character", |c| !matches!(c, ' ' | '\t' | '\n' | '\r'))
    }

    fn newline(&mut self) -> bool {
        if self.ch('\n') {
            return true;
        }
        if self.ch('\r') {
            self.ch('\n');
            return true;
        }
        false
    }

    fn not_newline(&mut self) -> bool {
        !matches!(self.peek(), Some('\n' | '\r'))
    }

    fn sp(&mut self) -> bool {
        self.zero_or_more(Self::spacechar)
    }

    /// Spaces, optionally one newline, then more spaces.
    fn spn1(&mut self) -> bool {
        self.sp();
        self.optional(|p| p.newline() && p.sp());
        true
    }

    fn blank_line(&mut self) -> bool {
        self.attempt(|p| p.sp() && p.newline())
    }

    fn nonindent_space(&mut self) -> bool {
        let _ = self.string("   ") || self.string("  ") || self.ch(' ');
        true
    }

    fn indent(&mut self) -> bool {
        self.ch('\t') || self.string("    ")
    }

    fn alphanumeric(&mut self) -> bool {
        self.char_if("alphanumeric", char::is_alphanumeric)
    }

    fn letter(&mut self) -> bool {
        self.char_if("letter", char::is_alphabetic)
    }

    fn digit(&mut self) -> bool {
        self.char_if("digit", |c| c.is_ascii_digit())
    }

    fn is_special(&self, c: char) -> bool {
        self.special_chars.contains(&c)
    }

    fn special_char(&mut self) -> bool {
        match self.peek() {
            Some(c) if self.is_special(c) => {
                self.ctx.pos += 1;
                true
            }
            _ => {
                self.expect(Expected::Named("special character"));
                false
            }
        }
    }

    fn normal_char(&mut self) -> bool {
        match self.peek() {
            Some(c) if !self.is_special(c) && !matches!(c, ' ' | '\t' | '\n' | '\r') => {
                self.ctx.pos += 1;
                true
            }
            _ => false,
        }
    }

    /// The rest of the current line including its newline.
    fn skip_line(&mut self) -> bool {
        self.attempt(|p| {
            p.zero_or_more(|p| p.not_newline() && p.any());
            p.newline()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser_over(text: &str) -> Parser {
        let mut parser = Parser::new(Options::default());
        parser.ctx.input = text.chars().collect();
        parser
    }

    #[test]
    fn test_attempt_restores_position_and_stack() {
        let mut p = parser_over("abc");
        let matched = p.attempt(|p| {
            p.push(Node::new(NodeKind::Group, 0, 0));
            p.ch('a') && p.ch('x')
        });
        assert!(!matched);
        assert_eq!(p.pos(), 0);
        assert!(p.ctx.stack.is_empty());
    }

    #[test]
    fn test_lookahead_consumes_nothing() {
        let mut p = parser_over("abc");
        assert!(p.test(|p| p.string("ab")));
        assert!(p.test_not(|p| p.string("ac")));
        assert_eq!(p.pos(), 0);
    }

    #[test]
    fn test_repetition() {
        let mut p = parser_over("aaab");
        assert!(p.one_or_more(|p| p.ch('a')));
        assert_eq!(p.pos(), 3);
        assert!(!p.one_or_more(|p| p.ch('a')));
        assert!(p.zero_or_more(|p| p.ch('a')));
        assert_eq!(p.pos(), 3);
    }

    #[test]
    fn test_node_seq_stamps_range() {
        let mut p = parser_over("  foo");
        assert!(p.node_seq(|p| {
            let start = p.pos();
            p.sp() && p.string("foo") && p.push_leaf(NodeKind::Text("foo".into()), start)
        }));
        let node = p.pop().unwrap();
        assert_eq!((node.start, node.end), (0, 5));
    }

    #[test]
    fn test_memo_replays_success_and_miss() {
        let mut p = parser_over("ab");
        let mut calls = 0;
        assert!(p.memo(Rule::Inline, |p| {
            calls += 1;
            p.ch('a') && p.push_leaf(NodeKind::Text("a".into()), 0)
        }));
        p.reset(Mark { pos: 0, stack: 0 });
        assert!(p.memo(Rule::Inline, |p| {
            calls += 1;
            p.ch('a')
        }));
        assert_eq!(calls, 1);
        assert_eq!(p.pos(), 1);
        assert_eq!(p.ctx.stack.len(), 1);
        p.reset(Mark { pos: 0, stack: 0 });

        assert!(!p.memo(Rule::Endline, |p| p.ch('x')));
        assert!(!p.memo(Rule::Endline, |_| unreachable!()));
    }

    #[test]
    fn test_memo_reruns_rules_that_leave_a_subtree() {
        let mut p = parser_over("ab");
        let mut calls = 0;
        for _ in 0..2 {
            p.reset(Mark { pos: 0, stack: 0 });
            assert!(p.memo(Rule::Inline, |p| {
                calls += 1;
                let child = Node::new(NodeKind::Text("a".into()), 0, 1);
                p.ch('a') && p.push(Node::with_children(NodeKind::Group, 0, 1, vec![child]))
            }));
            assert_eq!(p.ctx.stack.len(), 1);
            assert_eq!(p.pos(), 1);
        }
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_furthest_failure_is_reported() {
        let mut p = parser_over("abc");
        p.attempt(|p| p.string("ab") && p.ch('x'));
        p.ch('q');
        assert_eq!(p.ctx.failure.offset, 2);
        assert!(p.ctx.failure.expected.contains(&Expected::Char('x')));
    }

    #[test]
    fn test_add_as_child_needs_a_parent() {
        let mut p = parser_over("");
        p.push(Node::new(NodeKind::Text("x".into()), 0, 1));
        assert!(!p.add_as_child());
    }
}
