//! Part header blocks.

use crate::error::{Error, Result};
use std::fmt;

/// Default upper bound on the size of one header block.
pub const MAX_MIME_HEADER_SIZE: usize = 10 << 20; // 10 MB
/// Default upper bound on the number of headers in one block.
pub const MAX_MIME_HEADERS: usize = 10000;

/// Ordered MIME headers with case-insensitive lookup.
///
/// Repeated names are kept; [`HeaderMap::get`] returns the first value and
/// [`HeaderMap::get_all`] returns every value in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a header block whose lines are joined by `\r\n` or `\n`.
    ///
    /// Lines starting with a space or tab continue the previous header; the
    /// line break is removed and the leading whitespace kept. Lines without a
    /// colon are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use mime_streamer::HeaderMap;
    ///
    /// let headers = HeaderMap::parse("Content-Type: text/xml;\r\n\tcharset=utf-8\r\nContent-ID: <a>").unwrap();
    /// assert_eq!(headers.get("content-type"), Some("text/xml;\tcharset=utf-8"));
    /// assert!(headers.contains("CONTENT-ID"));
    /// ```
    pub fn parse(block: &str) -> Result<Self> {
        Self::parse_with_limits(block, MAX_MIME_HEADER_SIZE, MAX_MIME_HEADERS)
    }

    /// Like [`HeaderMap::parse`] with explicit size and count limits.
    pub fn parse_with_limits(block: &str, max_size: usize, max_headers: usize) -> Result<Self> {
        if block.len() > max_size {
            return Err(Error::MessageTooLarge);
        }

        let mut headers = HeaderMap::new();
        for line in block.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                continue;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some((_, value)) = headers.entries.last_mut() {
                    value.push_str(line.trim_end());
                }
                continue;
            }

            if let Some((name, value)) = line.split_once(':') {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                if headers.entries.len() >= max_headers {
                    return Err(Error::MessageTooLarge);
                }
                headers.append(name, value.trim());
            }
        }

        Ok(headers)
    }

    /// Appends a header, keeping existing values for the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Returns the first value for `name`, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the first value for `name`, or `default`.
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    /// Returns every value for `name` in order of appearance.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if a header named `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The `Content-Type` value, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.get("content-type")
    }

    /// The `Content-ID` value, if any, as written (angle brackets included).
    pub fn content_id(&self) -> Option<&str> {
        self.get("content-id")
    }

    /// Iterates over `(name, value)` pairs with names as written.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of header entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no headers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for HeaderMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            write!(f, "{}: {}\r\n", name, value)?;
        }
        Ok(())
    }
}
