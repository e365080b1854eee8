//! Reads an XML document from stdin and prints the text of every element
//! whose local name is `loc`, one per line.
//!
//! Exit status is 0 on success (including no matches) and 1 when the
//! input cannot be parsed or queried. Set `RUST_LOG=loc_extract=debug`
//! for diagnostics beyond the single error line.

use std::io::{self, BufWriter};
use std::process::ExitCode;

use loc_extract::LocExtractor;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "off".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let stdin = io::stdin().lock();
    let stdout = BufWriter::new(io::stdout().lock());

    match LocExtractor::new().run(stdin, stdout) {
        Ok(summary) => {
            tracing::info!(
                matched = summary.matched,
                printed = summary.printed,
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::debug!(reason = %e.reason(), "extraction failed");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
