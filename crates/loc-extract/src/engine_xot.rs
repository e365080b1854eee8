//! xot engine
//!
//! Parses documents into an `xot::Xot` arena owned by [`XotEngine`] and
//! evaluates queries by walking that arena. Input goes through
//! [`crate::prolog::normalize`] first, so DOCTYPEs, XML 1.1 declarations
//! and undeclared prefixes do not stop xot. xot keeps no process-wide
//! state: every node, name and namespace lives in the engine value and is
//! released when the engine is dropped.

use xot::{Node, Xot};

use crate::error::{Error, Result};
use crate::prolog::normalize;
use crate::query::Query;
use crate::result::NodeSet;
use crate::traits::{XPathEngine, XmlParser};

/// xot engine wrapper
pub struct XotEngine {
    xot: Xot,
}

impl Default for XotEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl XotEngine {
    pub fn new() -> Self {
        Self { xot: Xot::new() }
    }

    /// Local name of an element node, `None` for any other node
    pub fn element_local_name(&self, node: Node) -> Option<&str> {
        match self.xot.value(node) {
            xot::Value::Element(_) => self
                .xot
                .node_name(node)
                .map(|name| self.xot.name_ns_str(name).0),
            _ => None,
        }
    }
}

/// Document handle (the xot document node)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XotDocument {
    root: Node,
}

impl XotDocument {
    pub fn root(&self) -> Node {
        self.root
    }
}

/// Query context bound to one document of a [`XotEngine`]
#[derive(Debug, Clone, Copy)]
pub struct XotContext<'a> {
    document: &'a XotDocument,
    document_element: Node,
}

impl XotContext<'_> {
    pub fn document(&self) -> &XotDocument {
        self.document
    }

    pub fn document_element(&self) -> Node {
        self.document_element
    }
}

impl XmlParser for XotEngine {
    type Document = XotDocument;

    fn parse(&mut self, xml: &str) -> Result<Self::Document> {
        let xml = normalize(xml);
        let root = self
            .xot
            .parse(&xml)
            .map_err(|e| Error::ParseError(e.to_string()))?;
        Ok(XotDocument { root })
    }
}

impl XPathEngine for XotEngine {
    type Node = Node;
    type Context<'a> = XotContext<'a>
    where
        Self: 'a;

    fn create_context<'a>(&'a self, doc: &'a Self::Document) -> Result<Self::Context<'a>> {
        let document_element = self
            .xot
            .document_element(doc.root)
            .map_err(|e| Error::ContextError(e.to_string()))?;
        Ok(XotContext {
            document: doc,
            document_element,
        })
    }

    fn evaluate(&self, ctx: &Self::Context<'_>, query: &Query) -> Result<NodeSet<Self::Node>> {
        // descendants() is a pre-order walk that includes the start node,
        // which is document order.
        let nodes: NodeSet<Node> = self
            .xot
            .descendants(ctx.document_element)
            .filter(|node| {
                self.element_local_name(*node)
                    .is_some_and(|local| query.matches_local_name(local))
            })
            .collect();
        tracing::debug!(query = %query, matched = nodes.len(), "evaluated query");
        Ok(nodes)
    }

    fn text_content(&self, node: Self::Node) -> Option<String> {
        let mut content = String::new();
        for descendant in self.xot.descendants(node) {
            if let xot::Value::Text(text) = self.xot.value(descendant) {
                content.push_str(text.get());
            }
        }
        if content.is_empty() {
            None
        } else {
            Some(content)
        }
    }
}
