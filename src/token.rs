use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value as JsonValue;
use time::OffsetDateTime;

use crate::error::Error;

/// Decodes the `exp` claim of a JWT without verifying its signature.
///
/// The signature is the server's concern; the client only needs to know
/// whether a stored token is worth presenting.
///
/// # Errors
///
/// Returns `Error::Token` if the token is not three dot-separated segments,
/// the payload is not base64url JSON, or `exp` is missing or not a number.
pub fn decode_expiry(token_str: &str) -> Result<OffsetDateTime, Error> {
    let exp = expiry_seconds(token_str)?;
    OffsetDateTime::from_unix_timestamp(exp)
        .map_err(|e| Error::Token(format!("exp out of range: {e}")))
}

/// Returns `true` iff the token's `exp` (seconds) × 1000 is after `now` in
/// milliseconds. Tokens that fail to decode are never fresh.
#[must_use]
pub fn is_fresh(token_str: &str, now: OffsetDateTime) -> bool {
    let Ok(exp) = expiry_seconds(token_str) else {
        return false;
    };
    let now_ms = now.unix_timestamp_nanos() / 1_000_000;
    i128::from(exp) * 1000 > now_ms
}

fn expiry_seconds(token_str: &str) -> Result<i64, Error> {
    let payload = decode_payload(token_str)?;
    let exp = payload
        .get("exp")
        .ok_or_else(|| Error::Token("missing claim: exp".into()))?;

    // Some issuers emit fractional seconds.
    exp.as_i64()
        .or_else(|| exp.as_f64().map(|f| f.floor() as i64))
        .ok_or_else(|| Error::Token("invalid claim: exp".into()))
}

/// Extracts and parses the JSON payload segment of a JWT.
pub(crate) fn decode_payload(token_str: &str) -> Result<JsonValue, Error> {
    let parts: Vec<&str> = token_str.split('.').collect();
    if parts.len() != 3 {
        return Err(Error::Token("invalid token format".into()));
    }

    // Tolerate padded payloads from non-conforming issuers.
    let payload_b64 = parts[1].trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| Error::Token("invalid payload encoding".into()))?;

    let payload: JsonValue =
        serde_json::from_slice(&bytes).map_err(|_| Error::Token("invalid payload".into()))?;
    if !payload.is_object() {
        return Err(Error::Token("invalid payload".into()));
    }
    Ok(payload)
}
