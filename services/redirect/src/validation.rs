//! Redirect URL validation and escaping

use regex::Regex;
use std::sync::OnceLock;

use crate::error::ApiError;

/// A redirect target that passed validation
///
/// The raw string is kept verbatim; escaping happens per output context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget(String);

impl RedirectTarget {
    /// Validate the submitted `redirectUrl` value
    pub fn parse(raw: Option<&str>) -> Result<Self, ApiError> {
        let url = match raw {
            Some(url) if !url.is_empty() => url,
            _ => return Err(ApiError::MissingRedirectUrl),
        };

        validate_redirect_url(url).map_err(ApiError::BadRequest)?;

        Ok(Self(url.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Form safe for a quoted HTML attribute value
    pub fn html_attribute(&self) -> String {
        escape_html(&self.0)
    }

    /// Form safe inside a quoted JavaScript string literal in a script block
    pub fn js_literal(&self) -> String {
        escape_js_string(&self.0)
    }
}

/// Validate a non-empty redirect URL
pub fn validate_redirect_url(url: &str) -> Result<(), String> {
    if url.chars().any(char::is_control) {
        return Err("Redirect URL contains invalid characters".to_string());
    }

    static BLOCKED_SCHEME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = BLOCKED_SCHEME_REGEX.get_or_init(|| {
        Regex::new(r"(?i)^\s*(javascript|vbscript|data)\s*:")
            .expect("Failed to compile blocked scheme regex")
    });

    if regex.is_match(url) {
        return Err("Redirect URL scheme is not allowed".to_string());
    }

    Ok(())
}

/// Escape text for HTML element content and quoted attribute values
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text for a single- or double-quoted JavaScript string literal
///
/// Angle brackets are hex-escaped so the value can never close the
/// surrounding `<script>` element.
pub fn escape_js_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '<' => out.push_str("\\x3C"),
            '>' => out.push_str("\\x3E"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}
