//! Extension traits at the two edges of a crawl.
//!
//! The walker never talks to the network or the filesystem directly. It
//! sends [`Form`]s through an [`Oracle`] and hands finished
//! [`LeafRecord`]s to a [`Sink`]. The binary wires in
//! [`HttpOracle`](crate::oracle::HttpOracle) and
//! [`FileSink`](crate::sink::FileSink); tests substitute scripted oracles and
//! a [`MemorySink`](crate::sink::MemorySink).
//!
//! ```text
//! ┌──────────┐  Form   ┌──────────┐
//! │  Walker  │────────▶│  Oracle  │  options / voter-list endpoints
//! │          │◀────────│          │
//! └────┬─────┘  Reply  └──────────┘
//!      │ LeafRecord
//!      ▼
//! ┌──────────┐
//! │   Sink   │  {state}_links.txt, in-memory, ...
//! └──────────┘
//! ```

use anyhow::Result;
use async_trait::async_trait;

use crate::form::Form;
use crate::models::LeafRecord;

// ═══════════════════════════════════════════════════════════════════════
// Oracle Trait
// ═══════════════════════════════════════════════════════════════════════

/// Which of the two remote endpoints a request goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Returns the `<option>` list for one level below a partial path.
    Options,
    /// Returns the page carrying the voter list link of a registration centre.
    VoterList,
}

/// Status and body of one oracle exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleReply {
    pub status: u16,
    pub body: String,
}

impl OracleReply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The remote lookup service, seen as a request/response black box.
///
/// Implementations return `Ok` for every exchange that produced a response,
/// whatever its status; interpreting the status is the caller's job. `Err`
/// means no response arrived (after whatever retries the implementation
/// applies).
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use anyhow::Result;
/// use voterlist_crawler::form::Form;
/// use voterlist_crawler::traits::{Endpoint, Oracle, OracleReply};
///
/// /// Every state has exactly one district.
/// struct OneDistrict;
///
/// #[async_trait]
/// impl Oracle for OneDistrict {
///     async fn submit(&self, endpoint: Endpoint, form: &Form) -> Result<OracleReply> {
///         match (endpoint, form.get("list_type")) {
///             (Endpoint::Options, Some("district")) => Ok(OracleReply::ok(
///                 r#"{"result":"<option value=\"1\">Only</option>"}"#,
///             )),
///             _ => Ok(OracleReply::status(404)),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Send `form` to `endpoint` and return whatever came back.
    async fn submit(&self, endpoint: Endpoint, form: &Form) -> Result<OracleReply>;
}

// ═══════════════════════════════════════════════════════════════════════
// Sink Trait
// ═══════════════════════════════════════════════════════════════════════

/// Append-only destination for discovered links.
///
/// `append` may be called from several workers at once. Implementations
/// must serialize writes so that no two records interleave, and must not
/// report success for a record that was not fully written. An `Err` aborts
/// the crawl.
pub trait Sink: Send + Sync {
    /// Record one leaf. Called exactly once per found link.
    fn append(&self, record: &LeafRecord) -> Result<()>;
}
