/// HTML renderer for parsed markdown
///
/// Rendering runs in two passes over a [`RootNode`]: the reference and
/// abbreviation side lists are turned into lookup tables, then the tree is
/// walked once to emit HTML.
pub mod links;
pub mod plugins;
pub mod printer;
pub mod verbatim;

use crate::ast::{Alignment, Node, NodeKind, QuoteKind, RootNode, SimpleKind};
use crate::extensions::Extensions;
use links::{DefaultLinkRenderer, Link, LinkRenderer, Rendering};
use plugins::RenderPlugin;
use printer::{Printer, unescape_html};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};
use unicode_casefold::UnicodeCaseFold;
use verbatim::{DefaultVerbatimSerializer, VerbatimSerializer};

/// Renders `root` with the given link policy and per-language code block serializers.
pub fn render(
    root: &RootNode,
    link_renderer: impl LinkRenderer + 'static,
    verbatim_serializers: HashMap<String, Box<dyn VerbatimSerializer>>,
) -> String {
    let mut renderer = HtmlRenderer::new(Extensions::NONE).with_link_renderer(link_renderer);
    renderer.verbatim_serializers.extend(verbatim_serializers);
    renderer.render(root)
}

pub struct HtmlRenderer {
    link_renderer: Box<dyn LinkRenderer>,
    default_serializer: Box<dyn VerbatimSerializer>,
    verbatim_serializers: HashMap<String, Box<dyn VerbatimSerializer>>,
    plugins: Vec<Box<dyn RenderPlugin>>,
    no_follow: Box<dyn Fn(&Node) -> bool>,
    printer: Printer,
    references: HashMap<String, (String, Option<String>)>,
    /// Surface text and rendered expansion, in definition order.
    abbreviations: Vec<(String, String)>,
    table: TableState,
}

#[derive(Debug, Default, Clone)]
struct TableState {
    columns: Vec<Alignment>,
    column: usize,
    in_header: bool,
}

impl HtmlRenderer {
    /// A renderer with the default link policy; `NO_FOLLOW_LINKS` in
    /// `extensions` marks every link `rel="nofollow"`.
    pub fn new(extensions: Extensions) -> Self {
        let no_follow = extensions.contains(Extensions::NO_FOLLOW_LINKS);
        HtmlRenderer {
            link_renderer: Box::new(DefaultLinkRenderer::new()),
            default_serializer: Box::new(DefaultVerbatimSerializer),
            verbatim_serializers: HashMap::new(),
            plugins: Vec::new(),
            no_follow: Box::new(move |_| no_follow),
            printer: Printer::new(),
            references: HashMap::new(),
            abbreviations: Vec::new(),
            table: TableState::default(),
        }
    }

    pub fn with_link_renderer(mut self, link_renderer: impl LinkRenderer + 'static) -> Self {
        self.link_renderer = Box::new(link_renderer);
        self
    }

    /// Uses `serializer` for code blocks tagged `lang`.
    pub fn with_verbatim_serializer(
        mut self,
        lang: impl Into<String>,
        serializer: impl VerbatimSerializer + 'static,
    ) -> Self {
        self.verbatim_serializers.insert(lang.into(), Box::new(serializer));
        self
    }

    /// Replaces the serializer for code blocks without a registered language.
    pub fn with_default_verbatim_serializer(mut self, serializer: impl VerbatimSerializer + 'static) -> Self {
        self.default_serializer = Box::new(serializer);
        self
    }

    pub fn with_plugin(mut self, plugin: impl RenderPlugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Decides per link node whether to add `rel="nofollow"`.
    pub fn with_no_follow(mut self, policy: impl Fn(&Node) -> bool + 'static) -> Self {
        self.no_follow = Box::new(policy);
        self
    }

    /// # Panics
    ///
    /// Panics on an `Extension` node that no plugin renders.
    pub fn render(&mut self, root: &RootNode) -> String {
        self.printer = Printer::new();
        self.table = TableState::default();
        self.collect_definitions(root);
        self.visit(&root.node);
        std::mem::take(&mut self.printer).into_string()
    }

    fn collect_definitions(&mut self, root: &RootNode) {
        self.references.clear();
        self.abbreviations.clear();

        for reference in &root.references {
            let key = normalize_key(&self.render_children(&reference.key));
            self.references
                .insert(key, (reference.url.clone(), reference.title.clone()));
        }

        let mut abbreviations: Vec<(String, String)> = Vec::new();
        for abbreviation in &root.abbreviations {
            let surface = unescape_html(&self.render_children(&abbreviation.key));
            let expansion = self.render_children(&abbreviation.expansion);
            match abbreviations.iter_mut().find(|(known, _)| *known == surface) {
                Some(entry) => entry.1 = expansion,
                None => abbreviations.push((surface, expansion)),
            }
        }
        self.abbreviations = abbreviations;

        debug!(
            references = self.references.len(),
            abbreviations = self.abbreviations.len(),
            "collected link definitions"
        );
    }

    /// Renders the children of `node` into a string without touching the output.
    fn render_children(&mut self, node: &Node) -> String {
        let saved = std::mem::take(&mut self.printer);
        self.visit_children(node);
        std::mem::replace(&mut self.printer, saved).into_string()
    }

    fn without_abbreviations<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::take(&mut self.abbreviations);
        let out = f(self);
        self.abbreviations = saved;
        out
    }

    fn visit_children(&mut self, node: &Node) {
        for child in &node.children {
            self.visit(child);
        }
    }

    fn visit(&mut self, node: &Node) {
        match &node.kind {
            NodeKind::Root | NodeKind::Group => self.visit_children(node),
            NodeKind::Paragraph => self.print_basic_tag(node, "p"),
            NodeKind::Header { level } => self.print_basic_tag(node, &format!("h{}", level)),
            NodeKind::BlockQuote => self.print_indented_tag(node, "blockquote"),
            NodeKind::BulletList => self.print_indented_tag(node, "ul"),
            NodeKind::OrderedList => self.print_indented_tag(node, "ol"),
            NodeKind::ListItem { .. } => self.print_conditionally_indented_tag(node, "li"),
            NodeKind::DefinitionList => self.print_indented_tag(node, "dl"),
            NodeKind::DefinitionTerm => self.print_basic_tag(node, "dt"),
            NodeKind::Definition { .. } => self.print_conditionally_indented_tag(node, "dd"),
            NodeKind::Table { columns } => {
                let alignments = columns
                    .iter()
                    .map(|column| match column.kind {
                        NodeKind::TableColumn(alignment) => alignment,
                        _ => Alignment::None,
                    })
                    .collect();
                let outer = std::mem::replace(
                    &mut self.table,
                    TableState {
                        columns: alignments,
                        ..TableState::default()
                    },
                );
                self.print_indented_tag(node, "table");
                self.table = outer;
            }
            NodeKind::TableHeader => {
                self.table.in_header = true;
                self.print_indented_tag(node, "thead");
                self.table.in_header = false;
            }
            NodeKind::TableBody => self.print_indented_tag(node, "tbody"),
            NodeKind::TableRow => {
                self.table.column = 0;
                self.print_indented_tag(node, "tr");
            }
            NodeKind::TableCell { col_span } => self.print_table_cell(node, *col_span),
            NodeKind::TableColumn(_) => {}
            NodeKind::Text(text) => {
                if self.abbreviations.is_empty() {
                    self.printer.print_encoded(text);
                } else {
                    self.print_with_abbreviations(text);
                }
            }
            NodeKind::SpecialText(text) => {
                self.printer.print_encoded(text);
            }
            NodeKind::Entity(text) | NodeKind::InlineHtml(text) => {
                self.printer.print(text);
            }
            NodeKind::Code(text) => {
                self.printer.print("<code>").print_encoded(text).print("</code>");
            }
            NodeKind::Verbatim { text, lang } => {
                let serializer = lang
                    .as_deref()
                    .and_then(|lang| self.verbatim_serializers.get(lang))
                    .unwrap_or(&self.default_serializer);
                serializer.serialize(text, lang.as_deref(), &mut self.printer);
            }
            NodeKind::HtmlBlock(text) => {
                if !text.is_empty() {
                    self.printer.println().print(text);
                }
            }
            NodeKind::Simple(kind) => self.print_simple(*kind),
            NodeKind::AutoLink(url) => self.print_link(node, Link::Auto { url }),
            NodeKind::MailLink(address) => self.print_link(node, Link::Mail { address }),
            NodeKind::WikiLink(page) => self.print_link(node, Link::Wiki { page }),
            NodeKind::ExplicitLink { url, title, image } => {
                let text = self.render_children(node);
                let title = title.as_deref();
                if *image {
                    self.print_image(node, Link::Image { url, title, alt: &text });
                } else {
                    self.print_link(node, Link::Explicit { url, title, text: &text });
                }
            }
            NodeKind::ReferenceLink { separator, key, image } => {
                self.print_reference_link(node, separator.as_deref(), key.as_deref(), *image)
            }
            // Definitions live in the root side lists and print nothing in place.
            NodeKind::Reference(_) | NodeKind::Abbreviation(_) => {}
            NodeKind::Emphasis {
                strong,
                closed,
                delimiter,
            } => {
                if *closed {
                    self.print_tag(node, if *strong { "strong" } else { "em" });
                } else {
                    self.printer.print_encoded(delimiter);
                    self.visit_children(node);
                }
            }
            NodeKind::Quoted(kind) => {
                let (open, close) = match kind {
                    QuoteKind::Single => ("&lsquo;", "&rsquo;"),
                    QuoteKind::Double => ("&ldquo;", "&rdquo;"),
                    QuoteKind::DoubleAngle => ("&laquo;", "&raquo;"),
                };
                self.printer.print(open);
                self.visit_children(node);
                self.printer.print(close);
            }
            NodeKind::Extension { name, .. } => {
                let handled = self
                    .plugins
                    .iter_mut()
                    .any(|plugin| plugin.render(node, &mut self.printer));
                if !handled {
                    panic!("unknown node kind: extension `{}` has no render plugin", name);
                }
            }
        }
    }

    fn print_tag(&mut self, node: &Node, tag: &str) {
        self.printer.print_char('<').print(tag).print_char('>');
        self.visit_children(node);
        self.printer.print("</").print(tag).print_char('>');
    }

    fn print_basic_tag(&mut self, node: &Node, tag: &str) {
        self.printer.println();
        self.print_tag(node, tag);
    }

    fn print_indented_tag(&mut self, node: &Node, tag: &str) {
        self.printer.println().print_char('<').print(tag).print_char('>').indent(2);
        self.visit_children(node);
        self.printer.indent(-2).println().print("</").print(tag).print_char('>');
    }

    fn print_conditionally_indented_tag(&mut self, node: &Node, tag: &str) {
        if node.children.len() > 1 {
            self.print_indented_tag(node, tag);
        } else {
            self.print_basic_tag(node, tag);
        }
    }

    fn print_table_cell(&mut self, node: &Node, col_span: usize) {
        let tag = if self.table.in_header { "th" } else { "td" };
        let alignment = self
            .table
            .columns
            .get(self.table.column.min(self.table.columns.len().saturating_sub(1)))
            .copied()
            .unwrap_or_default();
        self.printer.println().print_char('<').print(tag);
        match alignment {
            Alignment::None => {}
            Alignment::Left => {
                self.printer.print(" align=\"left\"");
            }
            Alignment::Right => {
                self.printer.print(" align=\"right\"");
            }
            Alignment::Center => {
                self.printer.print(" align=\"center\"");
            }
        }
        if col_span > 1 {
            self.printer.print(&format!(" colspan=\"{}\"", col_span));
        }
        self.printer.print_char('>');
        self.visit_children(node);
        self.printer.print("</").print(tag).print_char('>');
        self.table.column += col_span;
    }

    fn print_simple(&mut self, kind: SimpleKind) {
        match kind {
            SimpleKind::HRule => {
                self.printer.println().print("<hr/>");
            }
            SimpleKind::Linebreak => {
                self.printer.print("<br/>").println();
            }
            SimpleKind::Apostrophe => {
                self.printer.print("&rsquo;");
            }
            SimpleKind::Ellipsis => {
                self.printer.print("&hellip;");
            }
            SimpleKind::Emdash => {
                self.printer.print("&mdash;");
            }
            SimpleKind::Endash => {
                self.printer.print("&ndash;");
            }
            SimpleKind::Nbsp => {
                self.printer.print("&nbsp;");
            }
        }
    }

    fn print_reference_link(&mut self, node: &Node, separator: Option<&str>, key: Option<&Node>, image: bool) {
        let text = self.render_children(node);
        let key_text = match key {
            Some(key) => self.render_children(key),
            None => text.clone(),
        };
        // Definition keys were rendered before any abbreviation was known.
        let lookup = self.without_abbreviations(|r| r.render_children(key.unwrap_or(node)));
        let Some((url, title)) = self.references.get(&normalize_key(&lookup)).cloned() else {
            trace!(key = %key_text, "unresolved reference, printing it literally");
            if image {
                self.printer.print_char('!');
            }
            self.printer.print_char('[').print(&text).print_char(']');
            if let Some(separator) = separator {
                self.printer.print(separator).print_char('[');
                if key.is_some() {
                    self.printer.print(&key_text);
                }
                self.printer.print_char(']');
            }
            return;
        };
        let title = title.as_deref();
        if image {
            self.print_image(node, Link::Image { url: &url, title, alt: &text });
        } else {
            self.print_link(node, Link::Reference { url: &url, title, text: &text });
        }
    }

    fn print_link(&mut self, node: &Node, link: Link<'_>) {
        let mut rendering = self.link_renderer.render(node, link);
        if (self.no_follow)(node) && !rendering.has_attribute("rel") {
            rendering = rendering.with_attribute("rel", "nofollow");
        }
        self.printer.print("<a href=\"").print(&rendering.href).print_char('"');
        self.print_attributes(&rendering);
        self.printer.print_char('>').print(&rendering.text).print("</a>");
    }

    fn print_image(&mut self, node: &Node, image: Link<'_>) {
        let rendering = self.link_renderer.render(node, image);
        self.printer.print("<img src=\"").print(&rendering.href).print_char('"');
        if !rendering.text.is_empty() {
            self.printer.print(" alt=\"").print(&rendering.text).print_char('"');
        }
        self.print_attributes(&rendering);
        self.printer.print("/>");
    }

    fn print_attributes(&mut self, rendering: &Rendering) {
        for attribute in &rendering.attributes {
            self.printer
                .print_char(' ')
                .print(&attribute.name)
                .print("=\"")
                .print(&attribute.value)
                .print_char('"');
        }
    }

    /// Prints text with whole-word abbreviation occurrences wrapped in `<abbr>`.
    fn print_with_abbreviations(&mut self, text: &str) {
        let mut matches: BTreeMap<usize, usize> = BTreeMap::new();
        for (index, (surface, _)) in self.abbreviations.iter().enumerate() {
            if surface.is_empty() {
                continue;
            }
            for (start, _) in text.match_indices(surface.as_str()) {
                let end = start + surface.len();
                let bounded_left = text[..start].chars().next_back().is_none_or(|c| !c.is_alphanumeric());
                let bounded_right = text[end..].chars().next().is_none_or(|c| !c.is_alphanumeric());
                if bounded_left && bounded_right {
                    matches.insert(start, index);
                }
            }
        }

        let mut ix = 0;
        for (start, index) in matches {
            if start < ix {
                continue;
            }
            let (surface, expansion) = &self.abbreviations[index];
            self.printer.print_encoded(&text[ix..start]).print("<abbr");
            if !expansion.is_empty() {
                self.printer.print(" title=\"").print(expansion).print_char('"');
            }
            self.printer.print_char('>').print_encoded(surface).print("</abbr>");
            ix = start + surface.len();
        }
        self.printer.print_encoded(&text[ix..]);
    }
}

/// Lookup key for references: whitespace removed, case folded.
fn normalize_key(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).case_fold().collect()
}
