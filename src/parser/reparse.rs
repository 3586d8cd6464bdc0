/// Nested parsing of container contents (block quotes, list items, definitions)
///
/// A container rule collects the text of its body while it matches, with the
/// structural prefixes (`> `, bullets, indentation, separating blank lines)
/// elided but still occupying their original positions. The cleaned text is
/// parsed as a document of its own and the resulting offsets are mapped back
/// through the elisions into the outer input.
use super::Parser;
use crate::ast::{Node, NodeKind};
use crate::extensions::Extensions;
use tracing::trace;

/// Body text of a container, in outer-input positions relative to its start.
#[derive(Debug, Default, Clone)]
pub(super) struct InnerText {
    /// `None` marks an elided character.
    chars: Vec<Option<char>>,
}

impl InnerText {
    pub(super) fn len(&self) -> usize {
        self.chars.len()
    }

    pub(super) fn truncate(&mut self, len: usize) {
        self.chars.truncate(len);
    }

    pub(super) fn elide(&mut self, count: usize) {
        self.chars.extend(std::iter::repeat_n(None, count));
    }

    pub(super) fn extend(&mut self, chars: &[char]) {
        self.chars.extend(chars.iter().copied().map(Some));
    }

    pub(super) fn push(&mut self, c: char) {
        self.chars.push(Some(c));
    }

    /// Returns the text without elided characters, and for every position of
    /// that text (plus one past the end) the position it came from.
    pub(super) fn clean(&self) -> (Vec<char>, Vec<usize>) {
        let mut text = Vec::with_capacity(self.chars.len());
        let mut index_map = Vec::with_capacity(self.chars.len() + 1);
        for (i, c) in self.chars.iter().enumerate() {
            if let Some(c) = c {
                text.push(*c);
                index_map.push(i);
            }
        }
        index_map.push(self.chars.len());
        (text, index_map)
    }
}

impl Parser {
    /// Matches `rule`, recording what it consumed as elided.
    pub(super) fn crossed_out(&mut self, inner: &mut InnerText, rule: impl FnOnce(&mut Self) -> bool) -> bool {
        let start = self.pos();
        if self.attempt(rule) {
            inner.elide(self.pos() - start);
            true
        } else {
            false
        }
    }

    /// Matches the rest of a line including its newline and keeps it verbatim.
    pub(super) fn line(&mut self, inner: &mut InnerText) -> bool {
        let start = self.pos();
        if self.skip_line() {
            inner.extend(&self.ctx.input[start..self.pos()]);
            true
        } else {
            false
        }
    }

    /// [`Parser::attempt`] that also rolls back what `rule` collected.
    pub(super) fn attempt_with(
        &mut self,
        inner: &mut InnerText,
        rule: impl FnOnce(&mut Self, &mut InnerText) -> bool,
    ) -> bool {
        let len = inner.len();
        if self.attempt(|p| rule(p, inner)) {
            true
        } else {
            inner.truncate(len);
            false
        }
    }

    pub(super) fn zero_or_more_with(
        &mut self,
        inner: &mut InnerText,
        mut rule: impl FnMut(&mut Self, &mut InnerText) -> bool,
    ) -> bool {
        loop {
            let before = self.pos();
            if !self.attempt_with(inner, &mut rule) || self.pos() == before {
                return true;
            }
        }
    }

    pub(super) fn one_or_more_with(
        &mut self,
        inner: &mut InnerText,
        mut rule: impl FnMut(&mut Self, &mut InnerText) -> bool,
    ) -> bool {
        self.attempt_with(inner, &mut rule) && self.zero_or_more_with(inner, rule)
    }

    /// Parses collected text as a nested document whose first character sits
    /// at `outer_start`, returning its top-level blocks with outer offsets.
    ///
    /// On failure the error is recorded for the whole parse and `None` is returned.
    pub(super) fn reparse(&mut self, inner: &InnerText, outer_start: usize) -> Option<Vec<Node>> {
        let (text, index_map) = inner.clean();
        let depth = self.suspended.len();
        trace!(depth, outer_start, chars = text.len(), "reparsing container body");
        let last = index_map.len() - 1;
        let map = |offset: usize| index_map[offset.min(last)] + outer_start;
        match self.parse_document(text) {
            Ok(mut root) => {
                root.map_offsets(&map);
                Some(root.children)
            }
            Err(mut failure) => {
                failure.offset = map(failure.offset);
                self.abort = Some(failure);
                None
            }
        }
    }

    pub(super) fn block_quote(&mut self) -> bool {
        self.node_seq(|p| {
            let start = p.pos();
            let mut inner = InnerText::default();
            p.one_or_more_with(&mut inner, |p, inner| {
                p.crossed_out(inner, |p| p.ch('>') && p.optional(|p| p.ch(' ')))
                    && p.line(inner)
                    && p.zero_or_more_with(inner, |p, inner| {
                        p.test_not(|p| p.ch('>')) && p.test_not(Self::blank_line) && p.line(inner)
                    })
                    && p.zero_or_more_with(inner, |p, inner| {
                        let start = p.pos();
                        p.blank_line() && {
                            inner.extend(&p.ctx.input[start..p.pos()]);
                            true
                        }
                    })
            }) && match p.reparse(&inner, start) {
                Some(children) => p.push(Node::with_children(NodeKind::BlockQuote, start, p.pos(), children)),
                None => false,
            }
        })
    }

    /// One list item or definition introduced by `marker`: the first chunk
    /// with its lazy continuation lines, then any further indented chunks.
    /// Each chunk is parsed on its own and the results concatenated. Blank
    /// lines before a chunk make the item loose.
    pub(super) fn list_item(&mut self, marker: fn(&mut Self) -> bool, definition: bool) -> bool {
        self.attempt(|p| {
            let start = p.pos();
            let mut block = InnerText::default();
            let mut loose = p.crossed_out(&mut block, |p| p.one_or_more(Self::blank_line));
            if !(p.crossed_out(&mut block, marker) && p.line(&mut block)) {
                return false;
            }
            p.zero_or_more_with(&mut block, |p, block| {
                let _ = p.crossed_out(block, Self::indent);
                p.not_item() && p.line(block)
            });
            if loose {
                block.push('\n');
            }
            let Some(mut children) = p.reparse(&block, start) else {
                return false;
            };

            loop {
                let chunk_start = p.pos();
                let mut chunk = InnerText::default();
                let mut chunk_loose = false;
                let matched = p.attempt_with(&mut chunk, |p, chunk| {
                    chunk_loose = p.crossed_out(chunk, |p| p.one_or_more(Self::blank_line));
                    p.crossed_out(chunk, Self::indent) && p.indented_block(chunk)
                });
                if !matched {
                    break;
                }
                if chunk_loose {
                    loose = true;
                    chunk.push('\n');
                }
                match p.reparse(&chunk, chunk_start) {
                    Some(nodes) => children.extend(nodes),
                    None => return false,
                }
            }

            let kind = if definition {
                NodeKind::Definition { tight: !loose }
            } else {
                NodeKind::ListItem { tight: !loose }
            };
            let item_start = children.first().map_or(start, |c| c.start);
            let item_end = children.last().map_or(p.pos(), |c| c.end);
            p.push(Node::with_children(kind, item_start, item_end, children))
        })
    }

    fn indented_block(&mut self, chunk: &mut InnerText) -> bool {
        self.line(chunk)
            && self.zero_or_more_with(chunk, |p, chunk| {
                let continued = p.attempt_with(chunk, |p, chunk| {
                    p.test_not(Self::blank_line) && p.crossed_out(chunk, Self::indent)
                }) || p.not_item();
                continued && p.line(chunk)
            })
    }

    /// Succeeds where no new item, blank line or rule starts.
    fn not_item(&mut self) -> bool {
        self.test_not(|p| {
            p.bullet() || p.enumerator() || p.blank_line() || p.horizontal_rule() || (p.ext(Extensions::DEFINITIONS) && p.def_list_bullet())
        })
    }

}

/// Marks every item loose when any item is loose, wrapping each item's
/// leading inline group in a paragraph.
pub(super) fn fix_list_tightness(list: &mut Node) {
    let any_loose = list.children.iter().any(|item| {
        matches!(
            item.kind,
            NodeKind::ListItem { tight: false } | NodeKind::Definition { tight: false }
        )
    });
    if !any_loose {
        return;
    }
    for item in &mut list.children {
        match &mut item.kind {
            NodeKind::ListItem { tight } | NodeKind::Definition { tight } => *tight = false,
            _ => continue,
        }
        if let Some(first) = item.children.first_mut()
            && first.kind == NodeKind::Group
        {
            let group = std::mem::replace(first, Node::new(NodeKind::Group, 0, 0));
            *first = Node::with_children(NodeKind::Paragraph, group.start, group.end, group.children);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    #[test]
    fn test_clean_maps_back_through_elisions() {
        let mut inner = InnerText::default();
        inner.elide(2);
        inner.extend(&['a', 'b']);
        inner.elide(1);
        inner.push('c');
        let (text, map) = inner.clean();
        assert_eq!(text.iter().collect::<String>(), "abc");
        assert_eq!(map, vec![2, 3, 5, 6]);
    }

    #[test]
    fn test_quote_offsets_point_into_outer_input() {
        let root = Parser::new(Options::default()).parse("> hello\n").unwrap();
        let quote = &root.children()[0];
        assert_eq!(quote.kind, NodeKind::BlockQuote);
        let para = &quote.children[0];
        // "hello" starts after the elided "> "
        assert_eq!(para.start, 2);
    }

    #[test]
    fn test_nested_list_item_offsets() {
        let source = "- a\n    - b\n";
        let root = Parser::new(Options::new(Extensions::NONE)).parse(source).unwrap();
        let outer = &root.children()[0];
        let item = &outer.children[0];
        let inner_list = &item.children[1];
        assert_eq!(inner_list.kind, NodeKind::BulletList);
        let b = &inner_list.children[0].children[0];
        assert_eq!(b.start, source.find('b').unwrap());
    }

    #[test]
    fn test_fix_list_tightness_wraps_groups() {
        let tight = Node::with_children(
            NodeKind::ListItem { tight: true },
            0,
            1,
            vec![Node::new(NodeKind::Group, 0, 1)],
        );
        let loose = Node::new(NodeKind::ListItem { tight: false }, 2, 3);
        let mut list = Node::with_children(NodeKind::BulletList, 0, 3, vec![tight, loose]);
        fix_list_tightness(&mut list);
        assert_eq!(list.children[0].kind, NodeKind::ListItem { tight: false });
        assert_eq!(list.children[0].children[0].kind, NodeKind::Paragraph);
    }
}
