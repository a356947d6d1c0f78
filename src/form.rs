//! Named-field form bodies for the oracle endpoints.
//!
//! Both endpoints take `multipart/form-data` with text fields only. The
//! boundary is fixed by configuration rather than generated per request, so
//! the same [`Form`] always encodes to the same bytes.
//!
//! ```rust
//! use voterlist_crawler::form::Form;
//!
//! let form = Form::new().field("state", "1").field("list_type", "district");
//! assert_eq!(
//!     form.encode("XYZ"),
//!     "--XYZ\r\nContent-Disposition: form-data; name=\"state\"\r\n\r\n1\r\n\
//!      --XYZ\r\nContent-Disposition: form-data; name=\"list_type\"\r\n\r\ndistrict\r\n\
//!      --XYZ--\r\n"
//! );
//! ```

/// An ordered list of `name = value` text fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    fields: Vec<(&'static str, String)>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Order is preserved in the encoded body.
    pub fn field(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((name, value.into()));
        self
    }

    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }

    /// Value of the first field called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Render the body for `Content-Type: multipart/form-data; boundary={boundary}`.
    pub fn encode(&self, boundary: &str) -> String {
        let mut body = String::new();
        for (name, value) in &self.fields {
            body.push_str("--");
            body.push_str(boundary);
            body.push_str("\r\nContent-Disposition: form-data; name=\"");
            body.push_str(name);
            body.push_str("\"\r\n\r\n");
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str("--");
        body.push_str(boundary);
        body.push_str("--\r\n");
        body
    }
}

/// The `Content-Type` header value matching [`Form::encode`].
pub fn content_type(boundary: &str) -> String {
    format!("multipart/form-data; boundary={}", boundary)
}
