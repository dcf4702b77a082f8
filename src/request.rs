use http::uri::Authority;
use http::HeaderMap;
use http::HeaderValue;
use http::Method;

use crate::error::Error;
use crate::error::Result;

/// Parsed view of a request used during signing.
///
/// Built from borrowed [`http::request::Parts`]: the caller's request stays
/// untouched until the computed headers are applied back.
#[derive(Debug)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP authority.
    pub authority: Authority,
    /// HTTP path.
    pub path: String,
    /// HTTP query parameters, percent decoded.
    pub query: Vec<(String, String)>,
    /// HTTP headers.
    pub headers: HeaderMap,
}

impl SigningRequest {
    /// Build a signing view from request parts.
    pub fn build(parts: &http::request::Parts) -> Result<Self> {
        let uri = parts.uri.clone().into_parts();

        Ok(SigningRequest {
            method: parts.method.clone(),
            authority: uri.authority.ok_or_else(|| {
                Error::request_invalid("request without authority is invalid for signing")
            })?,
            path: uri
                .path_and_query
                .as_ref()
                .map(|paq| paq.path().to_string())
                .unwrap_or_else(|| "/".to_string()),
            query: uri
                .path_and_query
                .as_ref()
                .and_then(|paq| paq.query())
                .map(|v| {
                    form_urlencoded::parse(v.as_bytes())
                        .map(|(k, v)| (k.into_owned(), v.into_owned()))
                        .collect()
                })
                .unwrap_or_default(),
            headers: parts.headers.clone(),
        })
    }

    /// Get header names as sorted vector.
    ///
    /// Names in a [`HeaderMap`] are already lowercase and unique, so this is
    /// both the canonical headers order and the `SignedHeaders` list.
    pub fn header_name_to_vec_sorted(&self) -> Vec<&str> {
        let mut h = self
            .headers
            .keys()
            .map(|k| k.as_str())
            .collect::<Vec<&str>>();
        h.sort_unstable();

        h
    }

    /// Normalize header value.
    ///
    /// Surrounding spaces are not part of the canonical form.
    pub fn header_value_normalize(v: &mut HeaderValue) {
        let bs = v.as_bytes();

        let starting_index = bs.iter().position(|b| *b != b' ').unwrap_or(0);
        let ending_offset = bs.iter().rev().position(|b| *b != b' ').unwrap_or(0);
        let ending_index = bs.len() - ending_offset;

        // This can't fail because we started with a valid HeaderValue and then only trimmed spaces
        *v = HeaderValue::from_bytes(&bs[starting_index..ending_index])
            .expect("invalid header value")
    }
}

#[cfg(test)]
mod tests {
    use http::Request;

    use super::*;
    use crate::error::ErrorKind;

    fn parts(uri: &str) -> http::request::Parts {
        Request::builder()
            .uri(uri)
            .body(())
            .expect("request must be valid")
            .into_parts()
            .0
    }

    #[test]
    fn test_build_splits_uri() {
        let req = SigningRequest::build(&parts("http://example.amazonaws.com/hello?a=1&b=2"))
            .expect("must build");

        assert_eq!(req.authority.as_str(), "example.amazonaws.com");
        assert_eq!(req.path, "/hello");
        assert_eq!(
            req.query,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn test_build_defaults_path_to_root() {
        let req = SigningRequest::build(&parts("http://example.amazonaws.com"))
            .expect("must build");

        assert_eq!(req.path, "/");
        assert!(req.query.is_empty());
    }

    #[test]
    fn test_build_rejects_missing_authority() {
        let err = SigningRequest::build(&parts("/relative/path")).expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    }

    #[test]
    fn test_header_value_normalize() {
        let mut v = HeaderValue::from_static("  trimmed  ");
        SigningRequest::header_value_normalize(&mut v);
        assert_eq!(v, HeaderValue::from_static("trimmed"));
    }
}
