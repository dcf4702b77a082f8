use std::fmt::Write;

use http::header;
use http::request::Parts;
use http::HeaderValue;
use log::debug;
use percent_encoding::percent_decode_str;
use percent_encoding::utf8_percent_encode;
use serde::Serialize;

use crate::constants::AWS_QUERY_ENCODE_SET;
use crate::constants::AWS_URI_ENCODE_SET;
use crate::constants::X_AMZ_DATE;
use crate::constants::X_AMZ_SECURITY_TOKEN;
use crate::credential::Credential;
use crate::error::Error;
use crate::error::Result;
use crate::hash::hex_hmac_sha256;
use crate::hash::hex_sha256;
use crate::hash::hmac_sha256;
use crate::request::SigningRequest;
use crate::time;
use crate::time::format_date;
use crate::time::format_iso8601;
use crate::time::DateTime;

/// Signer that implements AWS SigV4.
///
/// - [Signature Version 4 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)
///
/// The signer holds service and region only and keeps no state across
/// calls; it is safe to share between threads.
#[derive(Debug, Clone)]
pub struct Signer {
    service: String,
    region: String,
}

impl Signer {
    /// Create a new signer for the given service and region, like
    /// `("s3", "us-east-1")`.
    pub fn new(service: &str, region: &str) -> Self {
        Self {
            service: service.to_string(),
            region: region.to_string(),
        }
    }

    /// Sign the request with the current time.
    ///
    /// `body` is the request payload, hashed into the canonical request
    /// after JSON serialization; pass `None` for bodyless requests.
    pub fn sign<T: Serialize>(
        &self,
        parts: &mut Parts,
        body: Option<&T>,
        cred: &Credential,
    ) -> Result<()> {
        self.sign_at(parts, body, cred, time::now())
    }

    /// Sign the request at the given time.
    ///
    /// The timestamp is an explicit input so that signing stays a pure
    /// function of its arguments; [`Signer::sign`] reads the wall clock
    /// once at the boundary and delegates here.
    ///
    /// On success `authorization` and `x-amz-date` are inserted into the
    /// request's headers (plus `x-amz-security-token` when the credential
    /// carries one); on error the request is left untouched.
    pub fn sign_at<T: Serialize>(
        &self,
        parts: &mut Parts,
        body: Option<&T>,
        cred: &Credential,
        now: DateTime,
    ) -> Result<()> {
        if self.service.is_empty() || self.region.is_empty() {
            return Err(Error::config_invalid(
                "service and region must not be empty",
            ));
        }
        if !cred.is_valid() {
            return Err(Error::credential_invalid(
                "access key id and secret access key must not be empty",
            ));
        }

        let mut ctx = SigningRequest::build(parts)?;
        let encoded_payload = payload_hash(body)?;

        // canonicalize context
        canonicalize_header(&mut ctx, cred, now)?;
        canonicalize_query(&mut ctx);

        // build canonical request and string to sign.
        let creq = canonical_request_string(&ctx, &encoded_payload)?;
        debug!("calculated canonical request: {creq}");
        let encoded_req = hex_sha256(creq.as_bytes());

        // Scope: "20150830/<region>/<service>/aws4_request"
        let scope = format!(
            "{}/{}/{}/aws4_request",
            format_date(now),
            self.region,
            self.service
        );
        debug!("calculated scope: {scope}");

        // StringToSign:
        //
        // AWS4-HMAC-SHA256
        // 20150830T123600Z
        // 20150830/<region>/<service>/aws4_request
        // <hashed_canonical_request>
        let string_to_sign = {
            let mut f = String::new();
            writeln!(f, "AWS4-HMAC-SHA256")?;
            writeln!(f, "{}", format_iso8601(now))?;
            writeln!(f, "{}", &scope)?;
            write!(f, "{}", &encoded_req)?;
            f
        };
        debug!("calculated string to sign: {string_to_sign}");

        let signing_key =
            generate_signing_key(&cred.secret_access_key, now, &self.region, &self.service);
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

        let mut authorization = HeaderValue::from_str(&format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            cred.access_key_id,
            scope,
            ctx.header_name_to_vec_sorted().join(";"),
            signature
        ))?;
        authorization.set_sensitive(true);

        // Only touch the caller's request once the signature is complete.
        parts.headers.insert(header::AUTHORIZATION, authorization);
        parts
            .headers
            .insert(X_AMZ_DATE, HeaderValue::try_from(format_iso8601(now))?);
        if let Some(token) = &cred.session_token {
            let mut value = HeaderValue::from_str(token)?;
            value.set_sensitive(true);
            parts.headers.insert(X_AMZ_SECURITY_TOKEN, value);
        }

        Ok(())
    }
}

/// Hash the request payload into the lowercase hex form the canonical
/// request ends with. An absent body hashes as the empty byte string.
fn payload_hash<T: Serialize>(body: Option<&T>) -> Result<String> {
    let bs = match body {
        Some(v) => serde_json::to_vec(v)
            .map_err(|e| Error::serialization_failed("failed to serialize payload").with_source(e))?,
        None => Vec::new(),
    };

    Ok(hex_sha256(&bs))
}

fn canonical_request_string(ctx: &SigningRequest, encoded_payload: &str) -> Result<String> {
    // 256 is specially chosen to avoid reallocation for most requests.
    let mut f = String::with_capacity(256);

    // Insert method
    writeln!(f, "{}", ctx.method.as_str().to_uppercase())?;
    // Insert encoded path
    let path = percent_decode_str(&ctx.path)
        .decode_utf8()
        .map_err(|e| Error::request_invalid("request path is not valid utf-8").with_source(e))?;
    writeln!(f, "{}", utf8_percent_encode(&path, &AWS_URI_ENCODE_SET))?;
    // Insert query
    writeln!(
        f,
        "{}",
        ctx.query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    )?;
    // Insert signed headers
    let signed_headers = ctx.header_name_to_vec_sorted();
    for name in signed_headers.iter() {
        writeln!(f, "{}:{}", name, ctx.headers[*name].to_str()?)?;
    }
    writeln!(f)?;
    writeln!(f, "{}", signed_headers.join(";"))?;
    write!(f, "{encoded_payload}")?;

    Ok(f)
}

fn canonicalize_header(ctx: &mut SigningRequest, cred: &Credential, now: DateTime) -> Result<()> {
    // Header names and values need to be normalized according to Step 4 of https://docs.aws.amazon.com/general/latest/gr/sigv4-create-canonical-request.html
    for (_, value) in ctx.headers.iter_mut() {
        SigningRequest::header_value_normalize(value)
    }

    // Insert HOST header if not present.
    if ctx.headers.get(header::HOST).is_none() {
        let host = HeaderValue::from_str(ctx.authority.as_str())?;
        ctx.headers.insert(header::HOST, host);
    }

    // The date line always reflects the signing time.
    ctx.headers
        .insert(X_AMZ_DATE, HeaderValue::try_from(format_iso8601(now))?);

    // Insert X_AMZ_SECURITY_TOKEN header if security token exists.
    if let Some(token) = &cred.session_token {
        let mut value = HeaderValue::from_str(token)?;
        // Set token value sensitive to avoid leaking.
        value.set_sensitive(true);
        ctx.headers.insert(X_AMZ_SECURITY_TOKEN, value);
    }

    Ok(())
}

fn canonicalize_query(ctx: &mut SigningRequest) {
    if ctx.query.is_empty() {
        return;
    }

    // Sort by param name, then by value.
    ctx.query.sort();

    ctx.query = ctx
        .query
        .iter()
        .map(|(k, v)| {
            (
                utf8_percent_encode(k, &AWS_QUERY_ENCODE_SET).to_string(),
                utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET).to_string(),
            )
        })
        .collect();
}

fn generate_signing_key(secret: &str, time: DateTime, region: &str, service: &str) -> Vec<u8> {
    // Sign secret
    let secret = format!("AWS4{secret}");
    // Sign date
    let sign_date = hmac_sha256(secret.as_bytes(), format_date(time).as_bytes());
    // Sign region
    let sign_region = hmac_sha256(sign_date.as_slice(), region.as_bytes());
    // Sign service
    let sign_service = hmac_sha256(sign_region.as_slice(), service.as_bytes());
    // Sign request
    hmac_sha256(sign_service.as_slice(), "aws4_request".as_bytes())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;
    use http::Request;
    use pretty_assertions::assert_eq;

    use super::*;

    fn test_time() -> DateTime {
        Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0)
            .single()
            .expect("in bounds")
    }

    fn test_credential() -> Credential {
        Credential::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY")
    }

    #[test]
    fn test_generate_signing_key() {
        // Derived signing key example from
        // https://docs.aws.amazon.com/general/latest/gr/sigv4-calculate-signature.html
        let key = generate_signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            test_time(),
            "us-east-1",
            "iam",
        );
        assert_eq!(
            hex::encode(key),
            "c4afb1cc5771d871763a393e44b703571b55cc28424d1a5e86da6ed3c154a4b9"
        );
    }

    #[test]
    fn test_canonical_request_string() {
        let parts = Request::builder()
            .method("POST")
            .uri("http://example.amazonaws.com/")
            .body(())
            .expect("request must be valid")
            .into_parts()
            .0;

        let mut ctx = SigningRequest::build(&parts).expect("must build");
        canonicalize_header(&mut ctx, &test_credential(), test_time()).expect("must canonicalize");
        canonicalize_query(&mut ctx);

        let creq = canonical_request_string(&ctx, &payload_hash(None::<&()>).unwrap())
            .expect("must build canonical request");
        assert_eq!(
            creq,
            "POST\n\
             /\n\
             \n\
             host:example.amazonaws.com\n\
             x-amz-date:20150830T123600Z\n\
             \n\
             host;x-amz-date\n\
             e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_canonicalize_query_sorts_and_encodes() {
        let parts = Request::builder()
            .uri("http://example.amazonaws.com/?b=2&a=with%20space&a=1")
            .body(())
            .expect("request must be valid")
            .into_parts()
            .0;

        let mut ctx = SigningRequest::build(&parts).expect("must build");
        canonicalize_query(&mut ctx);

        assert_eq!(
            ctx.query,
            vec![
                ("a".to_string(), "1".to_string()),
                ("a".to_string(), "with%20space".to_string()),
                ("b".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_payload_hash() {
        // Absent body hashes as the empty byte string.
        assert_eq!(
            payload_hash(None::<&()>).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );

        let body = serde_json::json!({"hello": "world"});
        assert_eq!(
            payload_hash(Some(&body)).unwrap(),
            hex_sha256(serde_json::to_vec(&body).unwrap().as_slice())
        );
    }
}
