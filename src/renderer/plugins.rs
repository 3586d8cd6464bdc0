/// Render hooks for node kinds the core renderer does not know
use super::printer::Printer;
use crate::ast::{Node, NodeKind};

pub trait RenderPlugin {
    /// Renders `node` and returns `true`, or returns `false` to pass it on to
    /// the next plugin.
    fn render(&mut self, node: &Node, printer: &mut Printer) -> bool;
}

/// Handles `Extension` nodes with one name by printing their text through a closure.
pub struct NamedExtension<F> {
    name: String,
    render: F,
}

impl<F> NamedExtension<F>
where
    F: FnMut(&str, &mut Printer),
{
    pub fn new(name: impl Into<String>, render: F) -> Self {
        NamedExtension {
            name: name.into(),
            render,
        }
    }
}

impl<F> RenderPlugin for NamedExtension<F>
where
    F: FnMut(&str, &mut Printer),
{
    fn render(&mut self, node: &Node, printer: &mut Printer) -> bool {
        match &node.kind {
            NodeKind::Extension { name, text } if *name == self.name => {
                (self.render)(text, printer);
                true
            }
            _ => false,
        }
    }
}
