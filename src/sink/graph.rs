use std::borrow::Cow;
use std::convert::Infallible;
use std::io::{self, Write};

use ptree::TreeItem;

use super::Sink;

/// One node of a call graph: a procedure tag, the indent its call site
/// added, and the procedures it called in turn.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub tag: String,
    pub indent: u16,
    pub children: Vec<GraphNode>,
}

impl TreeItem for GraphNode {
    type Child = Self;

    fn write_self<W: Write>(&self, f: &mut W, _style: &ptree::Style) -> io::Result<()> {
        write!(f, "{} (indent {})", self.tag, self.indent)
    }

    fn children(&self) -> Cow<[Self::Child]> {
        Cow::from(&self.children)
    }
}

/// Builds a parent-tag -> child-tag call graph from a run's `call`/`ret`
/// events, renderable as an indented tree via `ptree` — the same crate
/// used elsewhere in this codebase for AST pretty-printing.
#[derive(Debug, Default)]
pub struct GraphSink {
    roots: Vec<GraphNode>,
    stack: Vec<GraphNode>,
}

impl GraphSink {
    pub fn new() -> Self {
        Self {
            roots: Vec::new(),
            stack: Vec::new(),
        }
    }

    pub fn into_roots(self) -> Vec<GraphNode> {
        self.roots
    }

    pub fn print(&self) -> io::Result<()> {
        for root in &self.roots {
            ptree::print_tree(root)?;
        }
        Ok(())
    }
}

impl Sink for GraphSink {
    type Error = Infallible;

    fn call(&mut self, tag: &str, indent: u16) -> Result<(), Self::Error> {
        self.stack.push(GraphNode {
            tag: tag.to_string(),
            indent,
            children: Vec::new(),
        });
        Ok(())
    }

    fn ret(&mut self, _tag: &str) -> Result<(), Self::Error> {
        if let Some(node) = self.stack.pop() {
            match self.stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => self.roots.push(node),
            }
        }
        Ok(())
    }

    fn terminate(&mut self, _tag: &str) -> Result<(), Self::Error> {
        if let Some(node) = self.stack.pop() {
            self.roots.push(node);
        }
        Ok(())
    }
}

#[cfg(test)]
mod __tests__ {
    use super::*;

    #[test]
    fn nested_calls_build_a_parent_child_tree() {
        let mut sink = GraphSink::new();
        sink.call("outer", 0).unwrap();
        sink.call("inner", 4).unwrap();
        sink.ret("inner").unwrap();
        sink.terminate("outer").unwrap();
        let roots = sink.into_roots();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].tag, "outer");
        assert_eq!(roots[0].children.len(), 1);
        assert_eq!(roots[0].children[0].tag, "inner");
    }
}
