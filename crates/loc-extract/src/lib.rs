//! loc-extract: print the text of `loc` elements in an XML document
//!
//! The library parses a document with xot, selects every element whose
//! local name is `loc` (namespace prefixes and URIs are ignored) and
//! yields the concatenated text of each match in document order.
//!
//! # Quick Start
//!
//! ```rust
//! use loc_extract::LocExtractor;
//!
//! let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url><loc>https://example.com/</loc></url>
//! </urlset>"#;
//! let locs = LocExtractor::new().extract(xml)?;
//! assert_eq!(locs, vec!["https://example.com/"]);
//! # Ok::<(), loc_extract::Error>(())
//! ```

pub mod encoding;
pub mod error;
pub mod prolog;
pub mod query;
pub mod result;
pub mod traits;

pub mod engine_xot;
pub mod extractor;

// Re-export core types
pub use error::{Error, Result};
pub use query::Query;
pub use result::{NodeSet, Summary};
pub use traits::{XPathEngine, XmlParser};

pub use engine_xot::{XotContext, XotDocument, XotEngine};
pub use extractor::LocExtractor;
