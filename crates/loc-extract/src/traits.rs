//! Core traits for the query engine seam

use std::io::Read;

use crate::encoding::decode_document;
use crate::error::{Error, Result};
use crate::query::Query;
use crate::result::NodeSet;

/// XML parsing capability
pub trait XmlParser {
    /// The document type returned by this parser
    type Document;

    /// Parse XML from a string
    fn parse(&mut self, xml: &str) -> Result<Self::Document>;

    /// Read a whole stream into memory, decode it and parse it.
    ///
    /// The encoding comes from the byte order mark or the XML declaration.
    /// Read failures and undecodable bytes are reported as parse errors.
    fn parse_reader<R: Read>(&mut self, mut reader: R) -> Result<Self::Document> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| Error::ParseError(format!("reading input: {}", e)))?;
        tracing::debug!(bytes = bytes.len(), "read input");

        let xml = decode_document(&bytes)?;
        self.parse(&xml)
    }
}

/// Query evaluation capability
pub trait XPathEngine: XmlParser {
    /// Handle to a node inside a parsed document
    type Node: Copy;

    /// Evaluation context bound to one document
    type Context<'a>
    where
        Self: 'a;

    /// Build a query context over a parsed document
    fn create_context<'a>(&'a self, doc: &'a Self::Document) -> Result<Self::Context<'a>>;

    /// Evaluate a query, returning matched nodes in document order
    fn evaluate(&self, ctx: &Self::Context<'_>, query: &Query) -> Result<NodeSet<Self::Node>>;

    /// Concatenated descendant text of a node, or `None` when there is none
    fn text_content(&self, node: Self::Node) -> Option<String>;
}
