/// Inline rules: text runs, line ends, emphasis, code spans, links, images,
/// entities, escapes, typographic quotes and smarts
use super::{Expected, Parser, Rule};
use crate::ast::{Node, NodeKind, QuoteKind, SimpleKind};
use crate::extensions::Extensions;

const LINK_TRAILING_PUNCTUATION: &str = "*_.,:;!?)]\"'";

impl Parser {
    /// One or more inlines on consecutive lines, gathered into a `Group`.
    /// A trailing line end is consumed but not kept.
    pub(super) fn inlines(&mut self) -> bool {
        self.node_seq(|p| {
            p.push(Node::new(NodeKind::Group, 0, 0))
                && p.one_or_more(|p| p.inline_or_intermediate_endline() && p.add_as_child())
                && p.optional(|p| p.endline() && p.drop_node())
        })
    }

    fn inline_or_intermediate_endline(&mut self) -> bool {
        self.attempt(|p| p.test_not(Self::endline) && p.inline())
            || self.attempt(|p| p.endline() && p.test(Self::inline))
    }

    pub(super) fn inline(&mut self) -> bool {
        self.memo(Rule::Inline, |p| p.link() || p.non_link_inline())
    }

    fn non_auto_link_inline(&mut self) -> bool {
        self.memo(Rule::NonAutoLinkInline, |p| p.non_auto_link() || p.non_link_inline())
    }

    fn non_link_inline(&mut self) -> bool {
        self.plain_str()
            || self.endline()
            || self.ul_or_star_line()
            || self.space()
            || self.strong_or_emph()
            || self.image()
            || self.code()
            || self.inline_html()
            || self.entity()
            || self.escaped_char()
            || (self.ext(Extensions::QUOTES)
                && (self.single_quoted() || self.double_quoted() || self.double_angle_quoted()))
            || (self.ext(Extensions::SMARTS) && self.smarts())
            || self.symbol()
    }

    fn plain_str(&mut self) -> bool {
        let start = self.pos();
        while self.normal_char() {}
        if self.pos() == start {
            return false;
        }
        let text = self.matched(start);
        self.push_leaf(NodeKind::Text(text), start)
    }

    fn space(&mut self) -> bool {
        let start = self.pos();
        self.one_or_more(Self::spacechar) && self.push_leaf(NodeKind::Text(" ".into()), start)
    }

    fn symbol(&mut self) -> bool {
        let start = self.pos();
        self.special_char() && {
            let text = self.matched(start);
            self.push_leaf(NodeKind::SpecialText(text), start)
        }
    }

    // ---- line ends ----

    pub(super) fn endline(&mut self) -> bool {
        self.memo(Rule::Endline, |p| {
            p.node_seq(|p| p.line_break() || p.terminal_endline() || p.normal_endline())
        })
    }

    fn line_break(&mut self) -> bool {
        self.attempt(|p| {
            let start = p.pos();
            p.string("  ")
                && p.normal_endline()
                && p.drop_node()
                && p.push_leaf(NodeKind::Simple(SimpleKind::Linebreak), start)
        })
    }

    fn terminal_endline(&mut self) -> bool {
        self.attempt(|p| {
            let start = p.pos();
            p.sp() && p.newline() && p.eoi() && p.push_leaf(NodeKind::Text("\n".into()), start)
        })
    }

    /// A line end inside a paragraph: the next line must not start a block
    /// that interrupts paragraphs.
    fn normal_endline(&mut self) -> bool {
        self.attempt(|p| {
            let start = p.pos();
            p.sp()
                && p.newline()
                && p.test_not(|p| {
                    p.blank_line()
                        || p.ch('>')
                        || p.atx_start()
                        || p.setext_underline_ahead()
                        || (p.ext(Extensions::FENCED_CODE_BLOCKS) && p.fenced_code_block())
                })
                && if p.ext(Extensions::HARDWRAPS) {
                    p.push_leaf(NodeKind::Simple(SimpleKind::Linebreak), start)
                } else {
                    p.push_leaf(NodeKind::Text("\n".into()), start)
                }
        })
    }

    /// A line followed by a setext underline.
    fn setext_underline_ahead(&mut self) -> bool {
        self.skip_line()
            && (self.n_or_more('=', 3) || self.n_or_more('-', 3))
            && self.sp()
            && self.newline()
    }

    /// Memoized so long paragraphs of ruled-looking lines stay linear.
    pub(super) fn ul_or_star_line(&mut self) -> bool {
        self.memo(Rule::UlOrStarLine, |p| {
            let start = p.pos();
            (p.char_line('_') || p.char_line('*')) && {
                let text = p.matched(start);
                p.push_leaf(NodeKind::Text(text), start)
            }
        })
    }

    /// Four or more `c`, or a run of `c` framed by whitespace.
    pub(super) fn char_line(&mut self, c: char) -> bool {
        self.n_or_more(c, 4)
            || self.attempt(|p| p.spacechar() && p.one_or_more(|p| p.ch(c)) && p.test(Self::spacechar))
    }

    // ---- emphasis ----

    fn strong_or_emph(&mut self) -> bool {
        matches!(self.peek(), Some('*' | '_'))
            && (self.emph_or_strong("**")
                || self.emph_or_strong("__")
                || self.emph_or_strong("*")
                || self.emph_or_strong("_"))
    }

    /// An emphasis run opened by `delimiter`. Without a matching close the
    /// node is kept unclosed and renders as literal text.
    fn emph_or_strong(&mut self, delimiter: &'static str) -> bool {
        self.node_seq(|p| {
            p.emph_or_strong_open(delimiter)
                && p.push(Node::new(
                    NodeKind::Emphasis {
                        strong: delimiter.len() == 2,
                        closed: false,
                        delimiter: delimiter.to_string(),
                    },
                    0,
                    0,
                ))
                && p.one_or_more(|p| {
                    p.test_not(|p| p.emph_or_strong_close(delimiter))
                        && p.not_newline()
                        && p.inline()
                        && p.add_as_child()
                })
                && p.optional(|p| p.emph_or_strong_close(delimiter) && p.set_closed())
        })
    }

    fn emph_or_strong_open(&mut self, delimiter: &'static str) -> bool {
        let c = delimiter_char(delimiter);
        self.attempt(|p| {
            p.test_not(|p| p.char_line(c))
                && p.string(delimiter)
                && p.test_not(Self::spacechar)
                && p.not_newline()
        })
    }

    fn emph_or_strong_close(&mut self, delimiter: &'static str) -> bool {
        let c = delimiter_char(delimiter);
        self.attempt(|p| {
            !matches!(p.prev_char(), None | Some(' ' | '\t' | '\n' | '\r'))
                && (delimiter.len() == 2 || p.test_not(|p| p.closed_run(c)))
                && p.string(delimiter)
                && (c != '_' || p.test_not(Self::alphanumeric))
        })
    }

    /// A doubled `c` here would open a strong run that also closes.
    fn closed_run(&mut self, c: char) -> bool {
        let doubled = if c == '_' { "__" } else { "**" };
        self.memo(Rule::ClosedRun(c), |p| {
            p.test(|p| {
                p.emph_or_strong(doubled)
                    && matches!(
                        p.ctx.stack.last().map(|n| &n.kind),
                        Some(NodeKind::Emphasis { closed: true, .. })
                    )
            })
        })
    }

    fn set_closed(&mut self) -> bool {
        if let Some(node) = self.peek_node_mut()
            && let NodeKind::Emphasis { closed, .. } = &mut node.kind
        {
            *closed = true;
            return true;
        }
        false
    }

    // ---- code spans ----

    /// A code span delimited by a run of one to five backticks. Scans that
    /// find no closing run are remembered so later openers inside the same
    /// stretch fail immediately.
    fn code(&mut self) -> bool {
        if self.peek() != Some('`') {
            return false;
        }
        let input = &self.ctx.input;
        let start = self.ctx.pos;
        let ticks = tick_run(input, start);
        if ticks > 5 {
            return false;
        }
        let mut i = start + ticks;
        while matches!(input.get(i), Some(' ' | '\t')) {
            i += 1;
        }
        let text_start = i;
        if let Some(&(from, stop)) = self.ctx.code_span_misses.get(&ticks)
            && from <= text_start
            && text_start < stop
        {
            return false;
        }

        let close = loop {
            match input.get(i) {
                None => break None,
                Some('`') => {
                    let run = tick_run(input, i);
                    if run == ticks {
                        break Some(i);
                    }
                    i += run;
                }
                Some('\n' | '\r') => {
                    let mut next = i + 1;
                    if input[i] == '\r' && input.get(next) == Some(&'\n') {
                        next += 1;
                    }
                    if starts_blank_line(input, next) {
                        break None;
                    }
                    i = next;
                }
                Some(_) => i += 1,
            }
        };

        let Some(close) = close else {
            self.ctx.code_span_misses.insert(ticks, (text_start, i));
            self.expect(Expected::Named("closing backticks"));
            return false;
        };
        let mut text_end = close;
        while text_end > text_start && matches!(input[text_end - 1], ' ' | '\t') {
            text_end -= 1;
        }
        if text_end == text_start {
            return false;
        }
        let text: String = input[text_start..text_end].iter().collect();
        self.ctx.pos = close + ticks;
        self.push_leaf(NodeKind::Code(text), start)
    }

    // ---- entities and escapes ----

    fn entity(&mut self) -> bool {
        self.attempt(|p| {
            let start = p.pos();
            p.ch('&')
                && (p.attempt(|p| {
                    p.ch('#') && p.any_of("xX") && p.one_or_more(|p| p.char_if("hex digit", |c| c.is_ascii_hexdigit()))
                }) || p.attempt(|p| p.ch('#') && p.one_or_more(Self::digit))
                    || p.one_or_more(Self::alphanumeric))
                && p.ch(';')
                && {
                    let text = p.matched(start);
                    p.push_leaf(NodeKind::Entity(text), start)
                }
        })
    }

    fn escaped_char(&mut self) -> bool {
        self.attempt(|p| {
            let start = p.pos();
            p.ch('\\')
                && p.test_not(Self::newline)
                && p.char_if("escapable character", |c| c.is_ascii_punctuation())
                && {
                    let text = p.matched(start + 1);
                    p.push_leaf(NodeKind::Text(text), start)
                }
        })
    }

    // ---- typography ----

    fn smarts(&mut self) -> bool {
        let start = self.pos();
        let kind = if self.string("...") || self.string(". . .") {
            SimpleKind::Ellipsis
        } else if self.string("---") {
            SimpleKind::Emdash
        } else if self.string("--") {
            SimpleKind::Endash
        } else if self.ch('\'') {
            SimpleKind::Apostrophe
        } else {
            return false;
        };
        self.push_leaf(NodeKind::Simple(kind), start)
    }

    fn single_quoted(&mut self) -> bool {
        self.node_seq(|p| {
            !matches!(p.prev_char(), Some(c) if c.is_alphanumeric())
                && p.ch('\'')
                && p.test_not(|p| p.spacechar() || p.newline())
                && p.push(Node::new(NodeKind::Quoted(QuoteKind::Single), 0, 0))
                && p.one_or_more(|p| p.test_not(Self::single_quote_end) && p.inline() && p.add_as_child())
                && p.single_quote_end()
        })
    }

    fn single_quote_end(&mut self) -> bool {
        self.attempt(|p| p.ch('\'') && p.test_not(Self::alphanumeric))
    }

    fn double_quoted(&mut self) -> bool {
        self.node_seq(|p| {
            p.ch('"')
                && p.push(Node::new(NodeKind::Quoted(QuoteKind::Double), 0, 0))
                && p.one_or_more(|p| p.test_not(|p| p.ch('"')) && p.inline() && p.add_as_child())
                && p.ch('"')
        })
    }

    fn double_angle_quoted(&mut self) -> bool {
        self.node_seq(|p| {
            p.string("<<")
                && p.push(Node::new(NodeKind::Quoted(QuoteKind::DoubleAngle), 0, 0))
                && p.optional(|p| p.nbsp() && p.add_as_child())
                && p.one_or_more(|p| {
                    (p.attempt(|p| p.test(|p| p.sp() && p.string(">>")) && p.nbsp())
                        || p.attempt(|p| p.test_not(|p| p.string(">>")) && p.inline()))
                        && p.add_as_child()
                })
                && p.string(">>")
        })
    }

    fn nbsp(&mut self) -> bool {
        let start = self.pos();
        self.one_or_more(Self::spacechar) && self.push_leaf(NodeKind::Simple(SimpleKind::Nbsp), start)
    }

    // ---- links and images ----

    fn image(&mut self) -> bool {
        self.node_seq(|p| p.ch('!') && p.label() && (p.explicit_link(true) || p.reference_link(true)))
    }

    fn link(&mut self) -> bool {
        self.node_seq(|p| {
            (p.ext(Extensions::WIKILINKS) && p.wiki_link())
                || p.attempt(|p| p.label() && (p.explicit_link(false) || p.reference_link(false)))
                || p.auto_link()
        })
    }

    fn non_auto_link(&mut self) -> bool {
        self.node_seq(|p| p.label() && (p.explicit_link(false) || p.reference_link(false)))
    }

    /// `[` inlines `]`, pushed as a `Group`. Misses are memoized so runs of
    /// unclosed brackets stay linear.
    pub(super) fn label(&mut self) -> bool {
        self.memo(Rule::Label, |p| {
            p.node_seq(|p| {
                p.ch('[')
                    && p.push(Node::new(NodeKind::Group, 0, 0))
                    && p.one_or_more(|p| p.test_not(|p| p.ch(']')) && p.non_auto_link_inline() && p.add_as_child())
                    && p.ch(']')
            })
        })
    }

    /// `(url "title")` after a label; replaces the label with the link.
    fn explicit_link(&mut self, image: bool) -> bool {
        self.attempt(|p| {
            if !(p.spn1() && p.ch('(') && p.sp()) {
                return false;
            }
            let Some(url) = p.link_source() else {
                return false;
            };
            p.spn1();
            let title = p.link_title();
            if !(p.sp() && p.ch(')')) {
                return false;
            }
            let Some(label) = p.pop() else {
                return false;
            };
            let end = p.pos();
            p.push(Node::with_children(
                NodeKind::ExplicitLink { url, title, image },
                label.start,
                end,
                label.children,
            ))
        })
    }

    /// `[text][key]`, `[text][]` or a bare `[text]`; always matches after a label.
    fn reference_link(&mut self, image: bool) -> bool {
        self.attempt(|p| {
            let mark = p.mark();
            let sep_start = p.pos();
            p.spn1();
            let separator = p.matched(sep_start);
            let (separator, key) = if p.label() {
                (Some(separator), p.pop().map(Box::new))
            } else if p.string("[]") {
                (Some(separator), None)
            } else {
                p.reset(mark);
                (None, None)
            };
            let Some(label) = p.pop() else {
                return false;
            };
            let end = p.pos();
            p.push(Node::with_children(
                NodeKind::ReferenceLink { separator, key, image },
                label.start,
                end,
                label.children,
            ))
        })
    }

    /// Link target: `<...>` or a run without whitespace in which parentheses balance.
    pub(super) fn link_source(&mut self) -> Option<String> {
        let start = self.pos();
        if self.ch('<') {
            let mut url = String::new();
            while let Some(c) = self.peek() {
                match c {
                    '>' => {
                        self.ctx.pos += 1;
                        return Some(url);
                    }
                    '\n' | '\r' => break,
                    _ => {
                        url.push(c);
                        self.ctx.pos += 1;
                    }
                }
            }
            self.ctx.pos = start;
            return None;
        }

        let mut url = String::new();
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                '\\' if matches!(self.peek_at(1), Some('(' | ')')) => {
                    url.push(self.ctx.input[self.ctx.pos + 1]);
                    self.ctx.pos += 2;
                    continue;
                }
                '(' => depth += 1,
                ')' if depth == 0 => break,
                ')' => depth -= 1,
                ' ' | '\t' | '\n' | '\r' => break,
                _ => {}
            }
            url.push(c);
            self.ctx.pos += 1;
        }
        Some(url)
    }

    /// A title quoted with `'` or `"`. The closing quote is the one followed
    /// by optional spaces and `)` or a line end.
    fn link_title(&mut self) -> Option<String> {
        for delim in ['\'', '"'] {
            let start = self.pos();
            if !self.ch(delim) {
                continue;
            }
            let content_start = self.pos();
            loop {
                if self.test(|p| p.ch(delim) && p.sp() && (p.ch(')') || p.newline())) {
                    let title = self.matched(content_start);
                    self.ctx.pos += 1;
                    return Some(title);
                }
                if !self.not_newline() || !self.any() {
                    break;
                }
            }
            self.ctx.pos = start;
        }
        None
    }

    fn wiki_link(&mut self) -> bool {
        self.attempt(|p| {
            let start = p.pos();
            if !p.string("[[") {
                return false;
            }
            let text_start = p.pos();
            p.one_or_more(|p| p.test_not(|p| p.ch(']')) && p.not_newline() && p.any()) && {
                let text = p.matched(text_start);
                p.string("]]") && p.push_leaf(NodeKind::WikiLink(text), start)
            }
        })
    }

    /// `<http://...>` or `<user@host>`; with autolinks on the brackets are
    /// optional and trailing punctuation is left out of the link.
    fn auto_link(&mut self) -> bool {
        self.attempt(|p| {
            let start = p.pos();
            let bare = p.ext(Extensions::AUTOLINKS);
            let bracketed = p.ch('<');
            if !bracketed && !bare {
                return false;
            }
            let link_start = p.pos();
            let kind = if p.auto_link_url() {
                NodeKind::AutoLink(p.matched(link_start))
            } else if p.auto_link_email() {
                NodeKind::MailLink(p.matched(link_start))
            } else {
                return false;
            };
            if bracketed && !p.ch('>') && !bare {
                return false;
            }
            p.push_leaf(kind, start)
        })
    }

    fn auto_link_url(&mut self) -> bool {
        self.attempt(|p| p.one_or_more(Self::letter) && p.string("://") && p.auto_link_end())
    }

    fn auto_link_email(&mut self) -> bool {
        self.attempt(|p| {
            p.one_or_more(|p| p.alphanumeric() || p.any_of("-+_."))
                && p.ch('@')
                && p.auto_link_end()
        })
    }

    fn auto_link_end(&mut self) -> bool {
        let bare = self.ext(Extensions::AUTOLINKS);
        self.one_or_more(|p| {
            p.not_newline()
                && if bare {
                    p.test_not(|p| {
                        p.any_of("<>")
                            || p.attempt(|p| {
                                p.optional(|p| p.any_of(LINK_TRAILING_PUNCTUATION));
                                p.spacechar() || p.newline() || p.eoi()
                            })
                    })
                } else {
                    p.test_not(|p| p.ch('>'))
                }
                && p.any()
        })
    }
}

fn delimiter_char(delimiter: &str) -> char {
    if delimiter.starts_with('_') { '_' } else { '*' }
}

fn tick_run(input: &[char], from: usize) -> usize {
    input[from..].iter().take_while(|&&c| c == '`').count()
}

fn starts_blank_line(input: &[char], from: usize) -> bool {
    let rest = &input[from.min(input.len())..];
    let spaces = rest.iter().take_while(|&&c| c == ' ' || c == '\t').count();
    matches!(rest.get(spaces), Some('\n' | '\r'))
}

#[cfg(test)]
mod tests {
    use crate::ast::{Node, NodeKind, SimpleKind};
    use crate::extensions::Extensions;
    use crate::parser::parse;
    use std::time::{Duration, Instant};

    fn para(source: &str, ext: Extensions) -> Node {
        let root = parse(source, ext).unwrap();
        root.node.children.into_iter().next().unwrap()
    }

    #[test]
    fn test_emphasis_and_strong() {
        let p = para("*em* and **strong**\n", Extensions::NONE);
        assert!(matches!(
            p.children[0].kind,
            NodeKind::Emphasis { strong: false, closed: true, .. }
        ));
        assert!(matches!(
            p.children[2].kind,
            NodeKind::Emphasis { strong: true, closed: true, .. }
        ));
    }

    #[test]
    fn test_unclosed_emphasis_is_kept_open() {
        let p = para("a *b\n", Extensions::NONE);
        assert!(p.children.iter().any(|n| matches!(n.kind, NodeKind::Emphasis { closed: false, .. })));
    }

    #[test]
    fn test_intraword_underscore_does_not_close() {
        let p = para("snake_case_name\n", Extensions::NONE);
        let closed = p.children.iter().any(|n| {
            let mut found = false;
            n.walk(&mut |n| found |= matches!(n.kind, NodeKind::Emphasis { closed: true, .. }));
            found
        });
        assert!(!closed);
    }

    #[test]
    fn test_code_span_trims_and_needs_matching_run() {
        let p = para("`` a ` b ``\n", Extensions::NONE);
        assert_eq!(p.children[0].kind, NodeKind::Code("a ` b".into()));
        let p = para("``unclosed x\n", Extensions::NONE);
        assert!(!p.children.iter().any(|n| matches!(n.kind, NodeKind::Code(_))));
    }

    #[test]
    fn test_repeated_unclosed_code_spans() {
        // Runs of six never open a span, and no shorter run ever closes one.
        let source = "`a ".to_string() + &"``````b ".repeat(2000) + "\n";
        let started = Instant::now();
        let p = para(&source, Extensions::NONE);
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(!p.children.iter().any(|n| matches!(n.kind, NodeKind::Code(_))));
        let ticks: usize = p
            .children
            .iter()
            .map(|n| match &n.kind {
                NodeKind::Text(s) | NodeKind::SpecialText(s) => s.matches('`').count(),
                _ => 0,
            })
            .sum();
        assert_eq!(ticks, 1 + 6 * 2000);
    }

    /// Runs `f` on a thread with room for deeply nested runs.
    fn with_deep_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
        std::thread::Builder::new()
            .stack_size(256 * 1024 * 1024)
            .spawn(f)
            .unwrap()
            .join()
            .unwrap()
    }

    #[test]
    fn test_long_emphasis_runs_stay_fast() {
        let (elapsed, blocks) = with_deep_stack(|| {
            let source = "*a ".repeat(4000) + "\n";
            let started = Instant::now();
            let root = parse(&source, Extensions::ALL).unwrap();
            (started.elapsed(), root.node.children.len())
        });
        assert!(elapsed < Duration::from_secs(3), "took {:?}", elapsed);
        assert_eq!(blocks, 1);
    }

    #[test]
    fn test_unclosed_brackets_stay_fast() {
        let (elapsed, kind) = with_deep_stack(|| {
            let source = "[a ".repeat(3000) + "\n";
            let started = Instant::now();
            let p = para(&source, Extensions::NONE);
            (started.elapsed(), p.kind)
        });
        assert!(elapsed < Duration::from_secs(3), "took {:?}", elapsed);
        assert_eq!(kind, NodeKind::Paragraph);
    }

    #[test]
    fn test_explicit_link_with_title() {
        let p = para("[a](/u \"t\")\n", Extensions::NONE);
        match &p.children[0].kind {
            NodeKind::ExplicitLink { url, title, image } => {
                assert_eq!(url, "/u");
                assert_eq!(title.as_deref(), Some("t"));
                assert!(!image);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_reference_link_forms() {
        let p = para("[a][b] [c][] [d]\n", Extensions::NONE);
        let links: Vec<_> = p
            .children
            .iter()
            .filter_map(|n| match &n.kind {
                NodeKind::ReferenceLink { separator, key, .. } => Some((separator.clone(), key.is_some())),
                _ => None,
            })
            .collect();
        assert_eq!(
            links,
            vec![(Some(String::new()), true), (Some(String::new()), false), (None, false)]
        );
    }

    #[test]
    fn test_autolinks() {
        let p = para("<http://x.com> <me@x.com>\n", Extensions::NONE);
        assert_eq!(p.children[0].kind, NodeKind::AutoLink("http://x.com".into()));
        assert_eq!(p.children[2].kind, NodeKind::MailLink("me@x.com".into()));

        let p = para("see http://x.com.\n", Extensions::AUTOLINKS);
        assert!(p.children.iter().any(|n| n.kind == NodeKind::AutoLink("http://x.com".into())));
    }

    #[test]
    fn test_hard_line_break() {
        let p = para("a  \nb\n", Extensions::NONE);
        assert_eq!(p.children[1].kind, NodeKind::Simple(SimpleKind::Linebreak));
        let p = para("a\nb\n", Extensions::HARDWRAPS);
        assert_eq!(p.children[1].kind, NodeKind::Simple(SimpleKind::Linebreak));
    }

    #[test]
    fn test_smarts_and_quotes() {
        let p = para("\"it's\" -- ok...\n", Extensions::SMARTYPANTS);
        assert!(matches!(p.children[0].kind, NodeKind::Quoted(_)));
        assert!(p.children.iter().any(|n| n.kind == NodeKind::Simple(SimpleKind::Endash)));
        assert!(p.children.iter().any(|n| n.kind == NodeKind::Simple(SimpleKind::Ellipsis)));
    }

    #[test]
    fn test_escaped_char_is_text() {
        let p = para("\\*not em\\*\n", Extensions::NONE);
        assert_eq!(p.children, vec![Node::new(NodeKind::Text("*not em*".into()), 0, 10)]);
    }
}
