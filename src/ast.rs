/// AST node types for parsed markdown documents
use serde::{Deserialize, Serialize};

/// A node of the parse tree.
///
/// `start`/`end` form a half-open range of `char` offsets into the normalized
/// top-level source, also for nodes produced by a nested reparse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Root,
    /// Children batched before being re-typed; renders as its children only.
    Group,
    // Block containers
    Paragraph,
    Header {
        level: u8,
    },
    BlockQuote,
    BulletList,
    OrderedList,
    ListItem {
        tight: bool,
    },
    DefinitionList,
    DefinitionTerm,
    Definition {
        tight: bool,
    },
    Table {
        columns: Vec<Node>, // TableColumn nodes, one per divider cell
    },
    TableHeader,
    TableBody,
    TableRow,
    TableCell {
        col_span: usize,
    },
    TableColumn(Alignment),
    // Leaves
    Text(String),
    SpecialText(String), // a single markup character that must be escaped
    Entity(String),      // `&name;` passed through verbatim
    Code(String),
    Verbatim {
        text: String,
        lang: Option<String>,
    },
    HtmlBlock(String),  // empty when suppressed
    InlineHtml(String), // empty when suppressed
    Simple(SimpleKind),
    // Links
    AutoLink(String),
    MailLink(String),
    ExplicitLink {
        url: String,
        title: Option<String>,
        image: bool,
    },
    WikiLink(String),
    ReferenceLink {
        separator: Option<String>,
        key: Option<Box<Node>>,
        image: bool,
    },
    // Definitions; lifted out of the tree into the RootNode side lists
    Reference(Box<ReferenceNode>),
    Abbreviation(Box<AbbreviationNode>),
    // Delimited runs
    Emphasis {
        strong: bool,
        closed: bool,
        delimiter: String,
    },
    Quoted(QuoteKind),
    /// Open slot for node kinds the core does not know; rendered by plugins.
    Extension {
        name: String,
        text: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimpleKind {
    HRule,
    Linebreak,
    Apostrophe,
    Ellipsis,
    Emdash,
    Endash,
    Nbsp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteKind {
    Single,
    Double,
    DoubleAngle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    None,
    Left,
    Right,
    Center,
}

/// `[key]: url "title"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceNode {
    pub key: Node,
    pub url: String,
    pub title: Option<String>,
    pub start: usize,
    pub end: usize,
}

/// `*[key]: expansion`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbbreviationNode {
    pub key: Node,
    pub expansion: Node,
    pub start: usize,
    pub end: usize,
}

/// Result of a top-level parse: the visible tree plus the definition side lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootNode {
    pub node: Node,
    pub references: Vec<ReferenceNode>,
    pub abbreviations: Vec<AbbreviationNode>,
}

impl Node {
    pub fn new(kind: NodeKind, start: usize, end: usize) -> Self {
        Node {
            kind,
            start,
            end,
            children: Vec::new(),
        }
    }

    pub fn with_children(kind: NodeKind, start: usize, end: usize, children: Vec<Node>) -> Self {
        Node {
            kind,
            start,
            end,
            children,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text(text) | NodeKind::SpecialText(text) | NodeKind::Code(text) => Some(text),
            _ => None,
        }
    }

    /// Appends a child, merging it into a trailing `Text` sibling when both are plain text.
    pub fn push_child(&mut self, child: Node) {
        if let NodeKind::Text(appended) = &child.kind
            && let Some(last) = self.children.last_mut()
            && let NodeKind::Text(text) = &mut last.kind
        {
            text.push_str(appended);
            last.end = child.end;
            return;
        }
        self.children.push(child);
    }

    /// Rewrites every offset in this subtree, including nodes held inside kinds.
    pub fn map_offsets(&mut self, map: &dyn Fn(usize) -> usize) {
        self.start = map(self.start);
        self.end = map(self.end).max(self.start);
        match &mut self.kind {
            NodeKind::Table { columns } => {
                for column in columns {
                    column.map_offsets(map);
                }
            }
            NodeKind::ReferenceLink { key: Some(key), .. } => key.map_offsets(map),
            NodeKind::Reference(reference) => reference.map_offsets(map),
            NodeKind::Abbreviation(abbreviation) => abbreviation.map_offsets(map),
            _ => {}
        }
        for child in &mut self.children {
            child.map_offsets(map);
        }
    }

    /// Depth-first pre-order visit of this node and all of its children.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Node)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

impl ReferenceNode {
    pub fn map_offsets(&mut self, map: &dyn Fn(usize) -> usize) {
        self.start = map(self.start);
        self.end = map(self.end).max(self.start);
        self.key.map_offsets(map);
    }
}

impl AbbreviationNode {
    pub fn map_offsets(&mut self, map: &dyn Fn(usize) -> usize) {
        self.start = map(self.start);
        self.end = map(self.end).max(self.start);
        self.key.map_offsets(map);
        self.expansion.map_offsets(map);
    }
}

impl RootNode {
    /// Builds a root from a freshly parsed tree, lifting reference and abbreviation
    /// definitions out of it in document order.
    pub fn from_tree(mut node: Node) -> Self {
        let mut references = Vec::new();
        let mut abbreviations = Vec::new();
        lift_definitions(&mut node, &mut references, &mut abbreviations);
        RootNode {
            node,
            references,
            abbreviations,
        }
    }

    pub fn children(&self) -> &[Node] {
        &self.node.children
    }
}

fn lift_definitions(
    node: &mut Node,
    references: &mut Vec<ReferenceNode>,
    abbreviations: &mut Vec<AbbreviationNode>,
) {
    let children = std::mem::take(&mut node.children);
    for mut child in children {
        match child.kind {
            NodeKind::Reference(reference) => references.push(*reference),
            NodeKind::Abbreviation(abbreviation) => abbreviations.push(*abbreviation),
            _ => {
                lift_definitions(&mut child, references, abbreviations);
                node.children.push(child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_child_merges_text() {
        let mut parent = Node::new(NodeKind::Paragraph, 0, 6);
        parent.push_child(Node::new(NodeKind::Text("foo".into()), 0, 3));
        parent.push_child(Node::new(NodeKind::Text(" ".into()), 3, 4));
        parent.push_child(Node::new(NodeKind::SpecialText("*".into()), 4, 5));
        parent.push_child(Node::new(NodeKind::Text("x".into()), 5, 6));
        assert_eq!(parent.children.len(), 3);
        assert_eq!(parent.children[0].kind, NodeKind::Text("foo ".into()));
        assert_eq!((parent.children[0].start, parent.children[0].end), (0, 4));
    }

    #[test]
    fn test_map_offsets_reaches_nested_keys() {
        let key = Node::new(NodeKind::Group, 1, 4);
        let mut link = Node::new(
            NodeKind::ReferenceLink {
                separator: None,
                key: Some(Box::new(key)),
                image: false,
            },
            0,
            5,
        );
        link.map_offsets(&|offset| offset + 10);
        assert_eq!((link.start, link.end), (10, 15));
        match link.kind {
            NodeKind::ReferenceLink { key: Some(key), .. } => assert_eq!(key.start, 11),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_from_tree_lifts_nested_definitions() {
        let reference = ReferenceNode {
            key: Node::new(NodeKind::Group, 3, 6),
            url: "/x".into(),
            title: None,
            start: 2,
            end: 12,
        };
        let quote = Node::with_children(
            NodeKind::BlockQuote,
            0,
            12,
            vec![Node::new(NodeKind::Reference(Box::new(reference)), 2, 12)],
        );
        let root = RootNode::from_tree(Node::with_children(NodeKind::Root, 0, 12, vec![quote]));
        assert_eq!(root.references.len(), 1);
        assert!(root.children()[0].children.is_empty());
    }
}
