//! Grammar validation helpers for MIME tokens and boundaries.
//!
//! Token rules follow RFC 2045.

use crate::error::{Error, Result};

/// Reports whether the character is in 'tspecials' as defined by RFC 2045.
///
/// tspecials := "(" / ")" / "<" / ">" / "@" / "," / ";" / ":" / "\" / <"> / "/" / "[" / "]" / "?" / "="
pub fn is_tspecial(c: char) -> bool {
    matches!(c, '(' | ')' | '<' | '>' | '@' | ',' | ';' | ':' | '\\' | '"' | '/' | '[' | ']' | '?' | '=')
}

/// Reports whether the character is in 'token' as defined by RFC 2045.
///
/// token := 1*<any (US-ASCII) CHAR except SPACE, CTLs, or tspecials>
pub fn is_token_char(c: char) -> bool {
    c > '\x20' && c < '\x7f' && !is_tspecial(c)
}

/// Reports whether the string is a valid 'token' as defined by RFC 2045.
pub fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_token_char)
}

/// Validates a boundary token.
///
/// The token is opaque: any non-empty string is accepted as long as it fits
/// on one line, since boundary detection works line by line.
pub fn validate_boundary(boundary: &str) -> Result<()> {
    if boundary.is_empty() {
        return Err(Error::InvalidBoundary("boundary cannot be empty".to_string()));
    }

    if boundary.contains(|c| c == '\r' || c == '\n') {
        return Err(Error::InvalidBoundary(format!(
            "boundary cannot contain a line break: {:?}",
            boundary
        )));
    }

    Ok(())
}
