//! Service token handling
//!
//! Callers of an internal API present a shared secret as a bearer token.

use axum::http::{HeaderMap, header};

/// Bearer token from the `Authorization` header
///
/// The scheme is matched case-insensitively; surrounding whitespace is
/// ignored. Returns `None` for any other scheme or an empty token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    Some(token.trim()).filter(|t| !t.is_empty())
}

/// Constant-time comparison to prevent timing attacks
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Whether the request carries `expected` as its bearer token
pub fn has_service_token(headers: &HeaderMap, expected: &str) -> bool {
    bearer_token(headers).is_some_and(|token| constant_time_eq(token.as_bytes(), expected.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&with_auth("Bearer s3cret")), Some("s3cret"));
        assert_eq!(bearer_token(&with_auth("bearer  s3cret ")), Some("s3cret"));
        assert_eq!(bearer_token(&with_auth("Basic dXNlcjpwdw==")), None);
        assert_eq!(bearer_token(&with_auth("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abcd", b"abcd"));
        assert!(!constant_time_eq(b"abcd", b"abce"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }

    #[test]
    fn test_has_service_token() {
        assert!(has_service_token(&with_auth("Bearer s3cret"), "s3cret"));
        assert!(!has_service_token(&with_auth("Bearer wrong"), "s3cret"));
        assert!(!has_service_token(&HeaderMap::new(), "s3cret"));
    }
}
