//! Final voter-list lookup for a complete path.
//!
//! The voter-list endpoint takes the full selection (`state`, `district`,
//! `vdc_mun`, `ward`, `reg_centre`) and answers with an HTML page. The link
//! we want is the anchor rendered as
//!
//! ```html
//! <a style="color:white" target="_blank" href='…'>आफ्नो मतदान केन्द्र हेर्नुहोस्</a>
//! ```
//!
//! Its `href` is captured; a page without that anchor is a "link not found"
//! outcome rather than an error.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use crate::error::LookupError;
use crate::form::Form;
use crate::models::{Level, SelectionPath};
use crate::traits::{Endpoint, Oracle};

/// Field names of the voter-list request, in send order after `state`.
const LEAF_FIELDS: [(Level, &str); 4] = [
    (Level::District, "district"),
    (Level::Village, "vdc_mun"),
    (Level::Ward, "ward"),
    (Level::RegCentre, "reg_centre"),
];

static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"<a\s+style="color:white"\s+target="_blank"\s+href='([^']+)'>आफ्नो मतदान केन्द्र हेर्नुहोस्</a>"#,
    )
    .expect("link pattern compiles")
});

/// Build the voter-list request for a complete path.
pub fn lookup_form(path: &SelectionPath) -> Result<Form, LookupError> {
    let mut form = Form::new().field("state", path.state());
    for (level, name) in LEAF_FIELDS {
        let code = path
            .code(level)
            .ok_or(LookupError::IncompletePath { level })?;
        form = form.field(name, code);
    }
    Ok(form)
}

/// The voter-list link in `page`, if present.
pub fn find_link(page: &str) -> Option<&str> {
    LINK_RE
        .captures(page)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Issues voter-list lookups through an [`Oracle`].
#[derive(Clone)]
pub struct LinkLookup {
    oracle: Arc<dyn Oracle>,
}

impl LinkLookup {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    /// Look up the link for a complete `path`.
    ///
    /// `Ok(None)` means the oracle answered but the page has no link.
    pub async fn try_lookup(&self, path: &SelectionPath) -> Result<Option<String>, LookupError> {
        let form = lookup_form(path)?;
        tracing::debug!(%path, "requesting voter list page");

        let reply = self
            .oracle
            .submit(Endpoint::VoterList, &form)
            .await
            .map_err(|e| LookupError::Transport(format!("{:#}", e)))?;

        if !reply.is_success() {
            return Err(LookupError::OracleUnavailable {
                status: reply.status,
            });
        }

        Ok(find_link(&reply.body).map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LevelOption;
    use crate::traits::OracleReply;
    use anyhow::Result;
    use async_trait::async_trait;

    const PAGE: &str = "<div><a style=\"color:white\" target=\"_blank\" \
        href='https://voterlist.example/pdf/1-12-5-3-9.pdf'>आफ्नो मतदान केन्द्र हेर्नुहोस्</a></div>";

    struct Page(OracleReply);

    #[async_trait]
    impl Oracle for Page {
        async fn submit(&self, endpoint: Endpoint, form: &Form) -> Result<OracleReply> {
            assert_eq!(endpoint, Endpoint::VoterList);
            assert_eq!(form.get("vdc_mun"), Some("5"));
            Ok(self.0.clone())
        }
    }

    fn leaf() -> SelectionPath {
        SelectionPath::new("1")
            .child(LevelOption::new("12", "Kathmandu"))
            .child(LevelOption::new("5", "Tokha"))
            .child(LevelOption::new("3", "3"))
            .child(LevelOption::new("9", "School"))
    }

    #[test]
    fn test_find_link_captures_href() {
        assert_eq!(
            find_link(PAGE),
            Some("https://voterlist.example/pdf/1-12-5-3-9.pdf")
        );
    }

    #[test]
    fn test_find_link_tolerates_whitespace_between_attributes() {
        let page = "<a   style=\"color:white\"\n\ttarget=\"_blank\"  href='https://x/y'>आफ्नो मतदान केन्द्र हेर्नुहोस्</a>";
        assert_eq!(find_link(page), Some("https://x/y"));
    }

    #[test]
    fn test_find_link_requires_signature() {
        assert_eq!(find_link("<a href='https://x/y'>link</a>"), None);
        assert_eq!(
            find_link("<a style=\"color:red\" target=\"_blank\" href='https://x/y'>आफ्नो मतदान केन्द्र हेर्नुहोस्</a>"),
            None
        );
        assert_eq!(find_link(""), None);
    }

    #[test]
    fn test_lookup_form_layout() {
        let form = lookup_form(&leaf()).unwrap();
        let names: Vec<&str> = form.fields().iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec!["state", "district", "vdc_mun", "ward", "reg_centre"]
        );
        assert_eq!(form.get("reg_centre"), Some("9"));
        assert!(form.get("list_type").is_none());
    }

    #[test]
    fn test_lookup_form_needs_leaf() {
        let path = SelectionPath::new("1").child(LevelOption::new("12", "Kathmandu"));
        assert!(matches!(
            lookup_form(&path),
            Err(LookupError::IncompletePath {
                level: Level::Village
            })
        ));
    }

    #[tokio::test]
    async fn test_try_lookup_outcomes() {
        let found = LinkLookup::new(Arc::new(Page(OracleReply::ok(PAGE))));
        assert_eq!(
            found.try_lookup(&leaf()).await.unwrap().as_deref(),
            Some("https://voterlist.example/pdf/1-12-5-3-9.pdf")
        );

        let missing = LinkLookup::new(Arc::new(Page(OracleReply::ok("<p>no data</p>"))));
        assert_eq!(missing.try_lookup(&leaf()).await.unwrap(), None);

        let down = LinkLookup::new(Arc::new(Page(OracleReply::status(502))));
        assert!(matches!(
            down.try_lookup(&leaf()).await,
            Err(LookupError::OracleUnavailable { status: 502 })
        ));
    }
}
