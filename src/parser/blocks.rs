/// Block rules
use super::Parser;
use super::reparse::fix_list_tightness;
use crate::ast::{AbbreviationNode, Node, NodeKind, ReferenceNode, SimpleKind};
use crate::extensions::Extensions;

impl Parser {
    /// One block, after any blank lines. Alternatives are tried in order and
    /// the first match wins.
    pub(super) fn block(&mut self) -> bool {
        self.zero_or_more(Self::blank_line);
        self.block_quote()
            || self.verbatim()
            || (self.ext(Extensions::ABBREVIATIONS) && self.abbreviation())
            || self.reference()
            || self.horizontal_rule()
            || self.heading()
            || self.ordered_list()
            || self.bullet_list()
            || self.html_block()
            || (self.ext(Extensions::TABLES) && self.table())
            || (self.ext(Extensions::DEFINITIONS) && self.definition_list())
            || (self.ext(Extensions::FENCED_CODE_BLOCKS) && self.fenced_code_block())
            || self.para()
            || self.inlines()
    }

    fn para(&mut self) -> bool {
        self.node_seq(|p| {
            p.nonindent_space() && p.inlines() && p.retype(NodeKind::Paragraph) && p.one_or_more(Self::blank_line)
        })
    }

    // ---- rules and headings ----

    pub(super) fn horizontal_rule(&mut self) -> bool {
        self.node_seq(|p| {
            p.nonindent_space()
                && (p.rule_chars('*') || p.rule_chars('-') || p.rule_chars('_'))
                && p.sp()
                && p.newline()
                && p.one_or_more(Self::blank_line)
                && p.push(Node::new(NodeKind::Simple(SimpleKind::HRule), 0, 0))
        })
    }

    fn rule_chars(&mut self, c: char) -> bool {
        self.attempt(|p| {
            p.ch(c) && p.sp() && p.ch(c) && p.sp() && p.ch(c) && p.zero_or_more(|p| p.sp() && p.ch(c))
        })
    }

    fn heading(&mut self) -> bool {
        self.atx_heading() || self.setext_heading()
    }

    /// `#` to `######`; pushes the header node.
    pub(super) fn atx_start(&mut self) -> bool {
        let run = self.ctx.input[self.ctx.pos.min(self.ctx.input.len())..]
            .iter()
            .take_while(|&&c| c == '#')
            .count();
        if run == 0 || self.abort.is_some() {
            return false;
        }
        let level = run.min(6);
        self.ctx.pos += level;
        self.push(Node::new(NodeKind::Header { level: level as u8 }, 0, 0))
    }

    fn atx_heading(&mut self) -> bool {
        self.node_seq(|p| {
            p.atx_start()
                && p.sp()
                && p.one_or_more(|p| p.atx_inline() && p.add_as_child())
                && p.optional(|p| p.sp() && p.zero_or_more(|p| p.ch('#')) && p.sp())
                && p.newline()
        })
    }

    fn atx_inline(&mut self) -> bool {
        self.not_newline()
            && self.test_not(|p| p.sp() && p.zero_or_more(|p| p.ch('#')) && p.sp() && p.newline())
            && self.inline()
    }

    fn setext_heading(&mut self) -> bool {
        self.test(|p| p.skip_line() && (p.n_or_more('=', 3) || p.n_or_more('-', 3)) && p.sp() && p.newline())
            && (self.setext_heading_with(1, '=') || self.setext_heading_with(2, '-'))
    }

    fn setext_heading_with(&mut self, level: u8, underline: char) -> bool {
        self.node_seq(|p| {
            p.push(Node::new(NodeKind::Header { level }, 0, 0))
                && p.one_or_more(|p| p.test_not(Self::endline) && p.inline() && p.add_as_child())
                && p.sp()
                && p.newline()
                && p.n_or_more(underline, 3)
                && p.sp()
                && p.newline()
        })
    }

    // ---- code ----

    /// Lines indented by a tab or four spaces. Blank lines between them are
    /// kept; tabs after the indent expand to four-column stops.
    fn verbatim(&mut self) -> bool {
        self.node_seq(|p| {
            let mut text = String::new();
            p.one_or_more(|p| {
                let mut blanks = 0;
                p.zero_or_more(|p| {
                    let blank = p.blank_line();
                    blanks += usize::from(blank);
                    blank
                });
                if !p.indent() {
                    return false;
                }
                let mut line = String::new();
                while let Some(c) = p.peek().filter(|&c| !matches!(c, '\n' | '\r')) {
                    if c == '\t' {
                        let col = line.chars().count();
                        line.extend(std::iter::repeat_n(' ', 4 - col % 4));
                    } else {
                        line.push(c);
                    }
                    p.ctx.pos += 1;
                }
                if line.is_empty() || !p.newline() {
                    return false;
                }
                text.extend(std::iter::repeat_n('\n', blanks));
                text.push_str(&line);
                text.push('\n');
                true
            }) && p.push(Node::new(NodeKind::Verbatim { text, lang: None }, 0, 0))
        })
    }

    /// A fence of three or more `` ` `` or `~`, closed by a fence of the same
    /// character and length. The first word after the opening fence names
    /// the language.
    pub(super) fn fenced_code_block(&mut self) -> bool {
        self.node_seq(|p| {
            let Some((fence, len, lang)) = p.code_fence_open() else {
                return false;
            };
            if p.test(|p| p.code_fence_close(fence, len)) {
                return false;
            }
            let mut text = String::new();
            p.zero_or_more(|p| {
                p.blank_line() && {
                    text.push('\n');
                    true
                }
            });
            let content_start = p.pos();
            if !p.one_or_more(|p| p.test_not(|p| p.newline() && p.code_fence_close(fence, len)) && p.any()) {
                return false;
            }
            text.extend(&p.ctx.input[content_start..p.pos()]);
            text.push('\n');
            p.newline()
                && p.code_fence_close(fence, len)
                && p.push(Node::new(NodeKind::Verbatim { text, lang }, 0, 0))
        })
    }

    fn code_fence_open(&mut self) -> Option<(char, usize, Option<String>)> {
        let mark = self.mark();
        let fence = self.peek().filter(|&c| matches!(c, '`' | '~'))?;
        let start = self.pos();
        if !self.n_or_more(fence, 3) {
            return None;
        }
        let len = self.pos() - start;
        self.sp();
        let info_start = self.pos();
        while self.not_newline() && self.any() {}
        let info = self.matched(info_start);
        if (fence == '`' && info.contains('`')) || !self.newline() {
            self.reset(mark);
            return None;
        }
        let lang = info.split_whitespace().next().map(str::to_string);
        Some((fence, len, lang))
    }

    fn code_fence_close(&mut self, fence: char, len: usize) -> bool {
        self.attempt(|p| {
            let start = p.pos();
            while p.peek() == Some(fence) {
                p.ctx.pos += 1;
            }
            p.pos() - start == len && p.sp() && p.newline()
        })
    }

    // ---- definitions ----

    /// `[key]: url "title"`
    fn reference(&mut self) -> bool {
        self.node_seq(|p| {
            let start = p.pos();
            if !(p.nonindent_space() && p.label() && p.ch(':') && p.spn1()) {
                return false;
            }
            let Some(url) = p.ref_src() else {
                return false;
            };
            let mark = p.mark();
            p.spn1();
            let title = p.ref_title();
            if title.is_none() {
                p.reset(mark);
            }
            if !(p.sp() && p.newline()) {
                return false;
            }
            p.zero_or_more(Self::blank_line);
            let Some(key) = p.pop() else {
                return false;
            };
            let end = p.pos();
            let reference = ReferenceNode {
                key,
                url,
                title,
                start,
                end,
            };
            p.push(Node::new(NodeKind::Reference(Box::new(reference)), start, end))
        })
    }

    fn ref_src(&mut self) -> Option<String> {
        let mark = self.mark();
        if self.ch('<') {
            let start = self.pos();
            if self.one_or_more(|p| p.test_not(|p| p.ch('>')) && p.nonspacechar()) {
                let url = self.matched(start);
                if self.ch('>') {
                    return Some(url);
                }
            }
            self.reset(mark);
            return None;
        }
        let start = self.pos();
        self.one_or_more(Self::nonspacechar).then(|| self.matched(start))
    }

    fn ref_title(&mut self) -> Option<String> {
        for (open, close) in [('\'', '\''), ('"', '"'), ('(', ')')] {
            let mark = self.mark();
            if !self.ch(open) {
                continue;
            }
            let start = self.pos();
            self.zero_or_more(|p| {
                p.test_not(|p| p.ch(close) && p.sp() && (p.newline() || p.eoi())) && p.not_newline() && p.any()
            });
            let title = self.matched(start);
            if self.ch(close) {
                return Some(title);
            }
            self.reset(mark);
        }
        None
    }

    /// `*[key]: expansion`
    fn abbreviation(&mut self) -> bool {
        self.node_seq(|p| {
            let start = p.pos();
            if !(p.nonindent_space() && p.ch('*') && p.label() && p.sp() && p.ch(':') && p.sp()) {
                return false;
            }
            let Some(key) = p.pop() else {
                return false;
            };
            p.abbreviation_text();
            let Some(expansion) = p.pop() else {
                return false;
            };
            p.zero_or_more(Self::blank_line);
            let end = p.pos();
            let abbreviation = AbbreviationNode {
                key,
                expansion,
                start,
                end,
            };
            p.push(Node::new(NodeKind::Abbreviation(Box::new(abbreviation)), start, end))
        })
    }

    fn abbreviation_text(&mut self) -> bool {
        self.node_seq(|p| {
            p.push(Node::new(NodeKind::Group, 0, 0))
                && p.zero_or_more(|p| {
                    p.test_not(|p| p.sp() && p.newline()) && p.inline() && p.add_as_child()
                })
        })
    }

    // ---- lists ----

    fn bullet_list(&mut self) -> bool {
        self.list(Self::bullet, NodeKind::BulletList)
    }

    fn ordered_list(&mut self) -> bool {
        self.list(Self::enumerator, NodeKind::OrderedList)
    }

    fn list(&mut self, marker: fn(&mut Self) -> bool, kind: NodeKind) -> bool {
        self.node_seq(|p| {
            p.test(marker)
                && p.push(Node::new(kind, 0, 0))
                && p.one_or_more(|p| p.list_item(marker, false) && p.add_as_child())
                && p.fix_tightness()
        })
    }

    fn fix_tightness(&mut self) -> bool {
        if let Some(list) = self.peek_node_mut() {
            fix_list_tightness(list);
        }
        true
    }

    pub(super) fn bullet(&mut self) -> bool {
        self.attempt(|p| {
            p.test_not(Self::horizontal_rule)
                && p.nonindent_space()
                && p.any_of("+*-")
                && p.one_or_more(Self::spacechar)
        })
    }

    pub(super) fn enumerator(&mut self) -> bool {
        self.attempt(|p| {
            p.nonindent_space() && p.one_or_more(Self::digit) && p.ch('.') && p.one_or_more(Self::spacechar)
        })
    }

    pub(super) fn def_list_bullet(&mut self) -> bool {
        self.attempt(|p| p.nonindent_space() && p.any_of(":~") && p.one_or_more(Self::spacechar))
    }

    /// Terms followed by `:` or `~` definitions, repeated.
    fn definition_list(&mut self) -> bool {
        self.node_seq(|p| {
            p.test_not(Self::spacechar)
                && p.test(|p| {
                    p.one_or_more(|p| {
                        p.test_not(Self::blank_line) && p.test_not(Self::def_list_bullet) && p.skip_line()
                    }) && p.zero_or_more(Self::blank_line)
                        && p.def_list_bullet()
                })
                && p.push(Node::new(NodeKind::DefinitionList, 0, 0))
                && p.one_or_more(|p| {
                    p.push(Node::new(NodeKind::Group, 0, 0))
                        && p.one_or_more(|p| p.def_list_term() && p.add_as_child())
                        && p.one_or_more(|p| p.list_item(Self::def_list_bullet, true) && p.add_as_child())
                        && p.optional(Self::blank_line)
                        && p.merge_group()
                })
                && p.fix_tightness()
        })
    }

    fn def_list_term(&mut self) -> bool {
        self.node_seq(|p| {
            p.test_not(Self::spacechar)
                && p.test_not(Self::def_list_bullet)
                && p.push(Node::new(NodeKind::DefinitionTerm, 0, 0))
                && p.one_or_more(|p| {
                    p.test_not(|p| p.sp() && p.newline())
                        && p.test_not(|p| p.ch(':') && p.newline())
                        && p.inline()
                        && p.add_as_child()
                })
                && p.optional(|p| p.ch(':'))
                && p.newline()
        })
    }

    /// Pops a `Group` and moves its children into the node beneath it.
    fn merge_group(&mut self) -> bool {
        let Some(group) = self.pop() else {
            return false;
        };
        match self.peek_node_mut() {
            Some(parent) => {
                parent.children.extend(group.children);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Node, NodeKind, SimpleKind};
    use crate::extensions::Extensions;
    use crate::parser::parse;

    fn blocks(source: &str, ext: Extensions) -> Vec<Node> {
        parse(source, ext).unwrap().node.children
    }

    #[test]
    fn test_headings() {
        let b = blocks("# One #\n\nTwo\n---\n", Extensions::NONE);
        assert_eq!(b[0].kind, NodeKind::Header { level: 1 });
        assert_eq!(b[0].children[0].kind, NodeKind::Text("One".into()));
        assert_eq!(b[1].kind, NodeKind::Header { level: 2 });
    }

    #[test]
    fn test_horizontal_rule() {
        let b = blocks("* * *\n", Extensions::NONE);
        assert_eq!(b[0].kind, NodeKind::Simple(SimpleKind::HRule));
    }

    #[test]
    fn test_verbatim_keeps_inner_blank_lines() {
        let b = blocks("    a\n\n    b\n", Extensions::NONE);
        assert_eq!(
            b[0].kind,
            NodeKind::Verbatim {
                text: "a\n\nb\n".into(),
                lang: None
            }
        );
    }

    #[test]
    fn test_fenced_code_needs_same_length_close() {
        let b = blocks("```rust\nfn x() {}\n```\n", Extensions::FENCED_CODE_BLOCKS);
        assert_eq!(
            b[0].kind,
            NodeKind::Verbatim {
                text: "fn x() {}\n".into(),
                lang: Some("rust".into())
            }
        );

        let b = blocks("````\ncode\n```\n````\n", Extensions::FENCED_CODE_BLOCKS);
        assert_eq!(
            b[0].kind,
            NodeKind::Verbatim {
                text: "code\n```\n".into(),
                lang: None
            }
        );

        let b = blocks("~~~\ncode\n~~~~\n", Extensions::FENCED_CODE_BLOCKS);
        assert!(!b.iter().any(|n| matches!(n.kind, NodeKind::Verbatim { .. })));
    }

    #[test]
    fn test_reference_is_lifted() {
        let root = parse("[Foo]: /url \"Title\"\n", Extensions::NONE).unwrap();
        assert!(root.node.children.is_empty());
        assert_eq!(root.references[0].url, "/url");
        assert_eq!(root.references[0].title.as_deref(), Some("Title"));
    }

    #[test]
    fn test_abbreviation_definition() {
        let root = parse("*[HTML]: Hyper Text\n", Extensions::ABBREVIATIONS).unwrap();
        assert_eq!(root.abbreviations.len(), 1);
        assert_eq!(
            root.abbreviations[0].expansion.children[0].kind,
            NodeKind::Text("Hyper Text".into())
        );
    }

    #[test]
    fn test_tight_and_loose_lists() {
        let b = blocks("- a\n- b\n", Extensions::NONE);
        assert!(b[0]
            .children
            .iter()
            .all(|item| item.kind == NodeKind::ListItem { tight: true }));
        assert_eq!(b[0].children[0].children[0].kind, NodeKind::Group);

        let b = blocks("1. a\n\n2. b\n", Extensions::NONE);
        assert_eq!(b[0].kind, NodeKind::OrderedList);
        assert!(b[0]
            .children
            .iter()
            .all(|item| item.kind == NodeKind::ListItem { tight: false }));
        assert_eq!(b[0].children[0].children[0].kind, NodeKind::Paragraph);
    }

    #[test]
    fn test_definition_list() {
        let b = blocks("Apple\n: A fruit\n", Extensions::DEFINITIONS);
        assert_eq!(b[0].kind, NodeKind::DefinitionList);
        let kinds: Vec<_> = b[0].children.iter().map(|n| n.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::DefinitionTerm, NodeKind::Definition { tight: true }]
        );
    }
}
