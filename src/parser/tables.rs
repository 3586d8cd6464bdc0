/// Pipe tables: optional header rows, a divider that sets column alignment,
/// then optional body rows
use super::Parser;
use crate::ast::{Alignment, Node, NodeKind};

impl Parser {
    pub(super) fn table(&mut self) -> bool {
        self.node_seq(|p| {
            p.push(Node::new(NodeKind::Table { columns: Vec::new() }, 0, 0))
                && p.optional(|p| p.table_section(NodeKind::TableHeader) && p.add_as_child())
                && p.table_divider_columns()
                && p.optional(|p| p.table_section(NodeKind::TableBody) && p.add_as_child())
                && p.ctx.stack.last().is_some_and(|table| !table.children.is_empty())
        })
    }

    fn table_section(&mut self, kind: NodeKind) -> bool {
        self.node_seq(|p| p.push(Node::new(kind, 0, 0)) && p.one_or_more(|p| p.table_row() && p.add_as_child()))
    }

    fn table_divider_columns(&mut self) -> bool {
        let Some(columns) = self.table_divider() else {
            return false;
        };
        if let Some(table) = self.peek_node_mut()
            && let NodeKind::Table { columns: slot } = &mut table.kind
        {
            *slot = columns;
            return true;
        }
        false
    }

    /// `| :--- | :---: |`; accepted only with a pipe somewhere or at least two columns.
    fn table_divider(&mut self) -> Option<Vec<Node>> {
        let mark = self.mark();
        let mut pipe_seen = self.ch('|');
        let mut columns = Vec::new();
        loop {
            let column_mark = self.mark();
            let start = self.pos();
            self.sp();
            let left = self.ch(':');
            if !self.one_or_more(|p| p.ch('-')) {
                self.reset(column_mark);
                break;
            }
            let right = self.ch(':');
            self.sp();
            if self.ch('|') {
                pipe_seen = true;
            } else if !self.test(Self::newline) {
                self.reset(column_mark);
                break;
            }
            let alignment = match (left, right) {
                (true, true) => Alignment::Center,
                (true, false) => Alignment::Left,
                (false, true) => Alignment::Right,
                (false, false) => Alignment::None,
            };
            columns.push(Node::new(NodeKind::TableColumn(alignment), start, self.pos()));
        }
        if !columns.is_empty() && (pipe_seen || columns.len() > 1) && self.sp() && self.newline() {
            return Some(columns);
        }
        self.reset(mark);
        None
    }

    /// A row is only a row with a leading pipe, several cells or a trailing pipe.
    fn table_row(&mut self) -> bool {
        self.node_seq(|p| {
            let leading = p.ch('|');
            p.push(Node::new(NodeKind::TableRow, 0, 0))
                && p.one_or_more(|p| p.table_cell() && p.add_as_child())
                && (leading
                    || p.ctx.stack.last().is_some_and(|row| row.children.len() > 1)
                    || p.prev_char() == Some('|'))
                && p.sp()
                && p.newline()
        })
    }

    /// Cell content up to a pipe or the line end, trailing spaces excluded.
    /// A run of pipes closing the cell sets its column span.
    fn table_cell(&mut self) -> bool {
        self.attempt(|p| {
            let start = p.pos();
            if p.test(Self::divider_cell) {
                return false;
            }
            p.sp();
            p.push(Node::new(NodeKind::TableCell { col_span: 1 }, start, start));
            p.zero_or_more(|p| {
                p.test_not(|p| p.ch('|'))
                    && p.test_not(|p| p.sp() && (p.newline() || p.ch('|')))
                    && p.inline()
                    && p.add_as_child()
            });
            let end = p.pos();
            let has_content = p.ctx.stack.last().is_some_and(|cell| !cell.children.is_empty());
            p.sp();
            let pipes_start = p.pos();
            while p.ch('|') {}
            let pipes = p.pos() - pipes_start;
            if !has_content && pipes == 0 {
                return false;
            }
            match p.peek_node_mut() {
                Some(cell) => {
                    cell.kind = NodeKind::TableCell { col_span: pipes.max(1) };
                    cell.end = end;
                    true
                }
                None => false,
            }
        })
    }

    fn divider_cell(&mut self) -> bool {
        self.sp()
            && self.optional(|p| p.ch(':'))
            && self.one_or_more(|p| p.ch('-'))
            && self.optional(|p| p.ch(':'))
            && self.sp()
            && (self.ch('|') || self.test(Self::newline))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Alignment, Node, NodeKind};
    use crate::extensions::Extensions;
    use crate::parser::parse;

    fn first_block(source: &str) -> Node {
        parse(source, Extensions::TABLES).unwrap().node.children.remove(0)
    }

    #[test]
    fn test_table_with_alignment() {
        let table = first_block("| a | b |\n|:--|--:|\n| 1 | 2 |\n");
        match &table.kind {
            NodeKind::Table { columns } => {
                let aligns: Vec<_> = columns.iter().map(|c| c.kind.clone()).collect();
                assert_eq!(
                    aligns,
                    vec![
                        NodeKind::TableColumn(Alignment::Left),
                        NodeKind::TableColumn(Alignment::Right)
                    ]
                );
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(table.children[0].kind, NodeKind::TableHeader);
        assert_eq!(table.children[1].kind, NodeKind::TableBody);
        let row = &table.children[1].children[0];
        assert_eq!(row.children.len(), 2);
        assert_eq!(row.children[0].children[0].kind, NodeKind::Text("1".into()));
    }

    #[test]
    fn test_col_span_from_pipe_run() {
        let table = first_block("| a || b |\n|---|---|---|\n");
        let cells = &table.children[0].children[0].children;
        assert_eq!(cells[0].kind, NodeKind::TableCell { col_span: 2 });
        assert_eq!(cells[1].kind, NodeKind::TableCell { col_span: 1 });
    }

    #[test]
    fn test_single_dashed_column_is_not_a_divider() {
        let root = parse("| a\n---\n", Extensions::TABLES).unwrap();
        let mut tables = 0;
        root.node.walk(&mut |n| tables += usize::from(matches!(n.kind, NodeKind::Table { .. })));
        assert_eq!(tables, 0);
    }

    #[test]
    fn test_divider_only_is_rejected() {
        let root = parse("|---|---|\n", Extensions::TABLES).unwrap();
        assert!(!matches!(root.node.children[0].kind, NodeKind::Table { .. }));
    }
}
