//! The Loc Extractor pipeline: parse, build context, evaluate, print.

use std::io::{Read, Write};

use crate::engine_xot::XotEngine;
use crate::error::Result;
use crate::query::Query;
use crate::result::Summary;
use crate::traits::{XPathEngine, XmlParser};

/// Runs one query over one document per call.
///
/// Each call builds a fresh engine, so the parsed tree and everything
/// derived from it is dropped before the call returns, on success and on
/// every error path alike.
#[derive(Debug, Clone, Default)]
pub struct LocExtractor {
    query: Query,
}

impl LocExtractor {
    /// Extractor for `loc` elements
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(query: Query) -> Self {
        Self { query }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Read a whole document from `input` and write the text of every
    /// match to `output`, one line each.
    ///
    /// Nothing is written unless parsing and context construction both
    /// succeed.
    pub fn run<R: Read, W: Write>(&self, input: R, mut output: W) -> Result<Summary> {
        let mut engine = XotEngine::new();
        let doc = engine.parse_reader(input)?;
        let summary = self.for_each_text(&engine, &doc, |text| writeln!(output, "{}", text))?;
        output.flush()?;
        Ok(summary)
    }

    /// Same pipeline over an in-memory document, collecting the lines.
    pub fn extract(&self, xml: &str) -> Result<Vec<String>> {
        let mut engine = XotEngine::new();
        let doc = engine.parse(xml)?;
        let mut lines = Vec::new();
        self.for_each_text(&engine, &doc, |text| {
            lines.push(text);
            Ok(())
        })?;
        Ok(lines)
    }

    fn for_each_text<E, F>(&self, engine: &E, doc: &E::Document, mut emit: F) -> Result<Summary>
    where
        E: XPathEngine,
        F: FnMut(String) -> std::io::Result<()>,
    {
        let ctx = engine.create_context(doc)?;
        let nodes = engine.evaluate(&ctx, &self.query)?;

        let mut summary = Summary {
            matched: nodes.len(),
            printed: 0,
        };
        for node in nodes {
            match engine.text_content(node) {
                Some(text) => {
                    emit(text)?;
                    summary.printed += 1;
                }
                None => tracing::debug!("skipping match without text content"),
            }
        }
        tracing::debug!(
            matched = summary.matched,
            printed = summary.printed,
            "extraction finished"
        );
        Ok(summary)
    }
}
