//! Error types for loc-extract
//!
//! The `Display` text of each variant is the exact diagnostic line the
//! `extract-locs` binary writes to stderr. The wrapped reason is kept for
//! debug logging only.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Input was unreadable, empty, not UTF-8, or not well-formed XML
    #[error("Failed to parse XML")]
    ParseError(String),

    /// The query context could not be built over the parsed document
    #[error("Failed to create XPath context")]
    ContextError(String),

    /// Writing matched text to the output failed
    #[error("Failed to write output")]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// Underlying reason, for logging.
    pub fn reason(&self) -> String {
        match self {
            Error::ParseError(reason) | Error::ContextError(reason) => reason.clone(),
            Error::IoError(e) => e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
