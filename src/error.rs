//! Failures of a single oracle exchange.
//!
//! None of these abort a crawl. The walker logs them with the path that
//! caused them and moves on to the next sibling. An empty option list and a
//! missing link are outcomes, not errors, and are not represented here.

use thiserror::Error;

use crate::models::Level;

#[derive(Debug, Error)]
pub enum LookupError {
    /// The oracle answered with a non-success status.
    #[error("oracle returned HTTP {status}")]
    OracleUnavailable { status: u16 },

    /// No response arrived at all (connect failure, timeout, reset).
    #[error("request failed: {0}")]
    Transport(String),

    /// A success status, but the body is not the expected envelope.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The path does not carry every field this request needs.
    #[error("path is missing the {level} selection")]
    IncompletePath { level: Level },
}
