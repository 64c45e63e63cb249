//! Media type parsing.
//!
//! Implements the subset of RFC 2045 media type handling needed to read
//! `Content-Type` values: the lowercase type/subtype and its parameters.

use crate::error::{Error, Result};
use crate::grammar::{is_token, validate_boundary};
use std::collections::HashMap;

/// Parses a media type value and any optional parameters, per RFC 2045.
///
/// Returns the media type converted to lowercase and a map of parameters
/// keyed by lowercase name. Quoted parameter values are unquoted.
///
/// # Examples
///
/// ```
/// use mime_streamer::parse_media_type;
///
/// let (media_type, params) =
///     parse_media_type("Multipart/Related; boundary=\"MIME_boundary\"").unwrap();
/// assert_eq!(media_type, "multipart/related");
/// assert_eq!(params.get("boundary"), Some(&"MIME_boundary".to_string()));
/// ```
pub fn parse_media_type(v: &str) -> Result<(String, HashMap<String, String>)> {
    let (base, rest) = v.split_once(';').unwrap_or((v, ""));
    let mediatype = base.trim().to_lowercase();

    if let Some((major, sub)) = mediatype.split_once('/') {
        if !is_token(major) || !is_token(sub) {
            return Err(Error::MediaType(format!(
                "invalid media type format: {:?}",
                mediatype
            )));
        }
    } else {
        return Err(Error::MediaType("no media type".to_string()));
    }

    let mut params = HashMap::new();
    for param in split_params(rest) {
        let param = param.trim();
        if param.is_empty() {
            continue;
        }

        // Parameters without '=' are tolerated and skipped
        if let Some((key, value)) = param.split_once('=') {
            let key = key.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            params.insert(key, unquote(value.trim()));
        }
    }

    Ok((mediatype, params))
}

/// Returns the `boundary` parameter when `content_type` is `multipart/*`.
///
/// Unparseable values yield `None`.
pub fn multipart_boundary(content_type: &str) -> Option<String> {
    let (media_type, mut params) = parse_media_type(content_type).ok()?;
    if !media_type.starts_with("multipart/") {
        return None;
    }
    params
        .remove("boundary")
        .filter(|b| validate_boundary(b).is_ok())
}

/// Splits a parameter list on `;`, ignoring separators inside quoted strings.
fn split_params(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, ch) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                out.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&s[start..]);
    out
}

fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        let inner = &value[1..value.len() - 1];
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(ch) = chars.next() {
            if ch == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else {
                out.push(ch);
            }
        }
        out
    } else {
        value.to_string()
    }
}
