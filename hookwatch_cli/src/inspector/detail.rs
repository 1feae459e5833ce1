//! Detail view projection for a selected request

use hookwatch_common::RequestRecord;
use serde_json::Value;

/// Request body, either parsed as JSON or kept as the original text
#[derive(Debug, Clone, PartialEq)]
pub enum BodyContent {
    Parsed(Value),
    Raw(String),
}

impl BodyContent {
    /// Parse a body as JSON, falling back to the raw text
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => BodyContent::Parsed(value),
            Err(_) => BodyContent::Raw(body.to_string()),
        }
    }

    /// Text shown in the body panel. JSON is pretty-printed with two-space indentation.
    pub fn display_text(&self) -> String {
        match self {
            BodyContent::Parsed(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            BodyContent::Raw(text) => text.clone(),
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, BodyContent::Parsed(_))
    }
}

/// Display-ready detail of one request
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub id: String,
    pub title: String,
    /// Header name/value pairs in map order
    pub headers: Vec<(String, String)>,
    /// `None` hides the body panel
    pub body: Option<BodyContent>,
}

impl DetailView {
    pub fn body_text(&self) -> Option<String> {
        self.body.as_ref().map(BodyContent::display_text)
    }
}

/// Build the detail view for a request
pub fn project(record: &RequestRecord) -> DetailView {
    let body = if record.body.is_empty() {
        None
    } else {
        Some(BodyContent::from_body(&record.body))
    };

    DetailView {
        id: record.id.clone(),
        title: record.summary(),
        headers: record.header_pairs(),
        body,
    }
}
