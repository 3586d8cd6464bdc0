/// Raw HTML: block-level elements, comments and inline tags
use super::{Parser, Rule};
use crate::ast::NodeKind;
use crate::extensions::Extensions;

/// Tags that may open an HTML block, sorted for binary search.
const HTML_BLOCK_TAGS: &[&str] = &[
    "address", "blockquote", "center", "dd", "dir", "div", "dl", "dt", "fieldset", "form", "frameset", "h1",
    "h2", "h3", "h4", "h5", "h6", "hr", "isindex", "li", "menu", "noframes", "noscript", "ol", "p", "pre",
    "script", "style", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

pub(super) fn is_block_tag(name: &str) -> bool {
    HTML_BLOCK_TAGS.binary_search(&name).is_ok()
}

impl Parser {
    pub(super) fn html_block(&mut self) -> bool {
        self.node_seq(|p| {
            let start = p.pos();
            (p.html_block_in_tags() || p.html_comment() || p.html_block_self_closing()) && {
                let text = if p.ext(Extensions::SUPPRESS_HTML_BLOCKS) {
                    String::new()
                } else {
                    p.matched(start)
                };
                p.push_leaf(NodeKind::HtmlBlock(text), start)
            } && p.one_or_more(Self::blank_line)
        })
    }

    fn html_block_in_tags(&mut self) -> bool {
        self.attempt(|p| {
            let Some(tag) = p.test_block_open() else {
                return false;
            };
            p.html_tag_block(&tag)
        })
    }

    /// Name of the block tag opened here, without consuming anything.
    fn test_block_open(&mut self) -> Option<String> {
        let mark = self.mark();
        let tag = self.html_block_open(None);
        self.reset(mark);
        tag
    }

    /// An element with its matching close; same-named elements nest.
    /// Memoized per tag and position: unclosed openers would otherwise be
    /// retried once for every opener before them.
    fn html_tag_block(&mut self, tag: &str) -> bool {
        let Ok(index) = HTML_BLOCK_TAGS.binary_search(&tag) else {
            return false;
        };
        self.memo(Rule::HtmlTagBlock(index), |p| {
            p.html_block_open(Some(tag)).is_some()
                && p.zero_or_more(|p| p.html_tag_block(tag) || (p.test_not(|p| p.html_block_close(tag)) && p.any()))
                && p.html_block_close(tag)
        })
    }

    /// `<tag attrs>` for a block tag, or for `expected` when given.
    fn html_block_open(&mut self, expected: Option<&str>) -> Option<String> {
        let mark = self.mark();
        let tag = if self.ch('<') && self.spn1() {
            self.block_tag_name(expected)
        } else {
            None
        };
        if let Some(tag) = tag
            && self.spn1()
            && self.zero_or_more(Self::html_attribute)
            && self.ch('>')
        {
            return Some(tag);
        }
        self.reset(mark);
        None
    }

    fn html_block_close(&mut self, tag: &str) -> bool {
        self.attempt(|p| {
            p.ch('<') && p.spn1() && p.ch('/') && p.block_tag_name(Some(tag)).is_some() && p.spn1() && p.ch('>')
        })
    }

    fn html_block_self_closing(&mut self) -> bool {
        self.attempt(|p| {
            p.ch('<')
                && p.spn1()
                && p.block_tag_name(None).is_some()
                && p.spn1()
                && p.zero_or_more(Self::html_attribute)
                && p.optional(|p| p.ch('/'))
                && p.spn1()
                && p.ch('>')
        })
    }

    fn block_tag_name(&mut self, expected: Option<&str>) -> Option<String> {
        let start = self.pos();
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric()) {
            self.ctx.pos += 1;
        }
        let name = self.matched(start).to_ascii_lowercase();
        let accepted = match expected {
            Some(expected) => name == expected,
            None => is_block_tag(&name),
        };
        if accepted {
            Some(name)
        } else {
            self.ctx.pos = start;
            None
        }
    }

    pub(super) fn inline_html(&mut self) -> bool {
        self.attempt(|p| {
            let start = p.pos();
            (p.html_comment() || p.html_tag()) && {
                let text = if p.ext(Extensions::SUPPRESS_INLINE_HTML) {
                    String::new()
                } else {
                    p.matched(start)
                };
                p.push_leaf(NodeKind::InlineHtml(text), start)
            }
        })
    }

    pub(super) fn html_comment(&mut self) -> bool {
        self.attempt(|p| {
            p.string("<!--") && p.zero_or_more(|p| p.test_not(|p| p.string("-->")) && p.any()) && p.string("-->")
        })
    }

    fn html_tag(&mut self) -> bool {
        self.attempt(|p| {
            p.ch('<')
                && p.spn1()
                && p.optional(|p| p.ch('/'))
                && p.one_or_more(Self::alphanumeric)
                && p.spn1()
                && p.zero_or_more(Self::html_attribute)
                && p.optional(|p| p.ch('/'))
                && p.spn1()
                && p.ch('>')
        })
    }

    fn html_attribute(&mut self) -> bool {
        self.attempt(|p| {
            p.one_or_more(|p| p.alphanumeric() || p.any_of("-_"))
                && p.spn1()
                && p.optional(|p| {
                    p.ch('=')
                        && p.spn1()
                        && (p.quoted()
                            || p.one_or_more(|p| p.test_not(|p| p.ch('>')) && p.nonspacechar()))
                })
                && p.spn1()
        })
    }

    fn quoted(&mut self) -> bool {
        ['"', '\''].into_iter().any(|q| {
            self.attempt(|p| p.ch(q) && p.zero_or_more(|p| p.test_not(|p| p.ch(q)) && p.any()) && p.ch(q))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use crate::parser::parse;
    use std::time::{Duration, Instant};

    #[test]
    fn test_block_tags_sorted() {
        assert!(HTML_BLOCK_TAGS.windows(2).all(|w| w[0] < w[1]));
        assert!(is_block_tag("div"));
        assert!(!is_block_tag("span"));
    }

    #[test]
    fn test_nested_same_tag_block() {
        let source = "<div>\n<div>x</div>\n</div>\n\nafter\n";
        let root = parse(source, Extensions::NONE).unwrap();
        assert_eq!(
            root.children()[0].kind,
            NodeKind::HtmlBlock("<div>\n<div>x</div>\n</div>".into())
        );
        assert_eq!(root.children()[1].kind, NodeKind::Paragraph);
    }

    #[test]
    fn test_unclosed_block_openers_stay_fast() {
        let source = "<div>\n".repeat(60);
        let started = Instant::now();
        let root = parse(&source, Extensions::NONE).unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(
            !root
                .children()
                .iter()
                .any(|n| matches!(n.kind, NodeKind::HtmlBlock(_)))
        );

        let closed = format!("{}x\n{}\n", "<div>\n".repeat(30), "</div>\n".repeat(30));
        let root = parse(&closed, Extensions::NONE).unwrap();
        assert!(matches!(root.children()[0].kind, NodeKind::HtmlBlock(_)));
    }

    #[test]
    fn test_suppressed_html_keeps_node() {
        let root = parse("<div>x</div>\n", Extensions::SUPPRESS_HTML_BLOCKS).unwrap();
        assert_eq!(root.children()[0].kind, NodeKind::HtmlBlock(String::new()));

        let root = parse("a <b>c</b>\n", Extensions::SUPPRESS_INLINE_HTML).unwrap();
        let para = &root.children()[0];
        assert!(para.children.iter().any(|n| n.kind == NodeKind::InlineHtml(String::new())));
    }
}
