//! Option resolution: "what can be chosen next under this path?"
//!
//! Each request carries `state`, the codes of every level above the one
//! being asked for, and a `list_type` naming that level. Which parent
//! fields go into which request is data ([`PARENT_FIELDS`]), not per-level
//! code.
//!
//! The options endpoint answers with a JSON envelope whose `result` field
//! holds an HTML fragment of `<option value="CODE">LABEL</option>` elements.
//! Every match is returned in response order. Duplicates are kept and
//! nothing is sorted.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::LookupError;
use crate::form::Form;
use crate::models::{Level, LevelOption, SelectionPath};
use crate::traits::{Endpoint, Oracle};

/// Form field contributed by each level to requests for deeper levels.
///
/// A request for level `L` includes the fields of every entry whose level
/// is shallower than `L`.
pub const PARENT_FIELDS: [(Level, &str); 3] = [
    (Level::District, "district"),
    (Level::Village, "vdc"),
    (Level::Ward, "ward"),
];

static OPTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<option value="([^"]+)">([^<]+)</option>"#).expect("option pattern compiles")
});

#[derive(Deserialize)]
struct Envelope {
    result: Option<serde_json::Value>,
}

/// Build the options request for `level` under `path`.
pub fn options_form(level: Level, path: &SelectionPath) -> Result<Form, LookupError> {
    let mut form = Form::new().field("state", path.state());
    for (parent, name) in PARENT_FIELDS {
        if parent >= level {
            break;
        }
        let code = path
            .code(parent)
            .ok_or(LookupError::IncompletePath { level: parent })?;
        form = form.field(name, code);
    }
    Ok(form.field("list_type", level.list_type()))
}

/// Extract every `<option value="CODE">LABEL</option>` from `html`.
pub fn parse_options(html: &str) -> Vec<LevelOption> {
    OPTION_RE
        .captures_iter(html)
        .map(|caps| LevelOption::new(&caps[1], &caps[2]))
        .collect()
}

/// Pull the HTML fragment out of the options envelope.
pub fn parse_envelope(body: &str) -> Result<String, LookupError> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| LookupError::MalformedResponse(format!("invalid JSON envelope: {}", e)))?;
    match envelope.result {
        Some(serde_json::Value::String(html)) => Ok(html),
        Some(serde_json::Value::Null) | None => Err(LookupError::MalformedResponse(
            "missing `result` field".to_string(),
        )),
        Some(other) => Err(LookupError::MalformedResponse(format!(
            "`result` is not a string: {}",
            other
        ))),
    }
}

/// Resolves the option list of one level below a partial path.
#[derive(Clone)]
pub struct OptionResolver {
    oracle: Arc<dyn Oracle>,
}

impl OptionResolver {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    /// Query the options for `level` under `path`, surfacing every failure.
    ///
    /// An empty `Ok` vector means the oracle answered but offered nothing.
    pub async fn try_resolve(
        &self,
        level: Level,
        path: &SelectionPath,
    ) -> Result<Vec<LevelOption>, LookupError> {
        let form = options_form(level, path)?;
        tracing::debug!(%path, %level, "requesting options");

        let reply = self
            .oracle
            .submit(Endpoint::Options, &form)
            .await
            .map_err(|e| LookupError::Transport(format!("{:#}", e)))?;

        if !reply.is_success() {
            return Err(LookupError::OracleUnavailable {
                status: reply.status,
            });
        }

        let html = parse_envelope(&reply.body)?;
        Ok(parse_options(&html))
    }

    /// Like [`try_resolve`](Self::try_resolve) but fails soft: any failure
    /// is logged against `path` and reported as an empty list.
    pub async fn resolve(&self, level: Level, path: &SelectionPath) -> Vec<LevelOption> {
        match self.try_resolve(level, path).await {
            Ok(options) => options,
            Err(e) => {
                tracing::warn!(%path, %level, error = %e, "Failed to get {} options for {}", level, path);
                Vec::new()
            }
        }
    }
}
