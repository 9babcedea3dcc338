//! Slack request signature verification.
//!
//! Slack signs every slash-command request:
//!
//! ```text
//! X-Slack-Request-Timestamp: 1531420618
//! X-Slack-Signature: v0=hex(HMAC-SHA256(secret, "v0:1531420618:" + raw_body))
//! ```
//!
//! The tag comparison goes through `ring::hmac::verify`, which is constant
//! time. Requests whose timestamp is more than [`MAX_SIGNATURE_AGE`] seconds
//! from the local clock are rejected as replays.

use chrono::Utc;
use ring::hmac;
use tracing::debug;

/// Header carrying the request timestamp (Unix seconds).
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Header carrying the versioned signature.
pub const SIGNATURE_HEADER: &str = "x-slack-signature";

/// Signature scheme version Slack currently uses.
pub const DEFAULT_VERSION: &str = "v0";

/// Maximum allowed clock distance of a request timestamp (in seconds).
pub const MAX_SIGNATURE_AGE: i64 = 5 * 60;

/// Length of a hex-encoded SHA-256 tag.
const HEX_TAG_LEN: usize = 64;

/// Why a request failed authentication.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),
    #[error("invalid request timestamp")]
    InvalidTimestamp,
    #[error("request timestamp outside the allowed window")]
    Expired,
    #[error("malformed signature")]
    MalformedSignature,
    #[error("signature mismatch")]
    SignatureMismatch,
}

/// Verifies inbound request signatures against the signing secret.
///
/// Immutable after construction and cheap to share behind an `Arc`.
pub struct RequestVerifier {
    key: hmac::Key,
    version: String,
}

impl RequestVerifier {
    /// Create a verifier for the `v0` scheme.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self::with_version(secret, DEFAULT_VERSION)
    }

    /// Create a verifier for a specific scheme version.
    pub fn with_version(secret: impl AsRef<[u8]>, version: impl Into<String>) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret.as_ref()),
            version: version.into(),
        }
    }

    /// Verify a request against the current time.
    pub fn verify(&self, body: &[u8], timestamp: &str, signature: &str) -> Result<(), AuthError> {
        self.verify_at(body, timestamp, signature, Utc::now().timestamp())
    }

    /// Boolean form of [`verify`](Self::verify).
    pub fn is_valid(&self, body: &[u8], timestamp: &str, signature: &str) -> bool {
        self.verify(body, timestamp, signature).is_ok()
    }

    /// Verify a request as if the current Unix time were `now`.
    pub fn verify_at(
        &self,
        body: &[u8],
        timestamp: &str,
        signature: &str,
        now: i64,
    ) -> Result<(), AuthError> {
        let sent_at: i64 = timestamp.parse().map_err(|_| {
            debug!(timestamp, "request timestamp is not an integer");
            AuthError::InvalidTimestamp
        })?;

        if now.abs_diff(sent_at) > MAX_SIGNATURE_AGE.unsigned_abs() {
            debug!(timestamp, now, "request timestamp outside window");
            return Err(AuthError::Expired);
        }

        let tag = self.parse_signature(signature).ok_or_else(|| {
            debug!("signature header is not in {}=<hex> form", self.version);
            AuthError::MalformedSignature
        })?;

        hmac::verify(&self.key, &self.base_string(body, timestamp), &tag).map_err(|_| {
            debug!(timestamp, "request signature mismatch");
            AuthError::SignatureMismatch
        })
    }

    /// Produce the signature header value for `body` sent at `timestamp`.
    pub fn sign(&self, body: &[u8], timestamp: &str) -> String {
        let tag = hmac::sign(&self.key, &self.base_string(body, timestamp));
        format!("{}={}", self.version, hex::encode(tag.as_ref()))
    }

    fn base_string(&self, body: &[u8], timestamp: &str) -> Vec<u8> {
        let mut base = Vec::with_capacity(self.version.len() + timestamp.len() + body.len() + 2);
        base.extend_from_slice(self.version.as_bytes());
        base.push(b':');
        base.extend_from_slice(timestamp.as_bytes());
        base.push(b':');
        base.extend_from_slice(body);
        base
    }

    /// Extract the raw tag from `{version}={lowercase hex}`.
    ///
    /// Uppercase hex is rejected so that the accepted header is exactly the
    /// string [`sign`](Self::sign) produces.
    fn parse_signature(&self, signature: &str) -> Option<Vec<u8>> {
        let hex_tag = signature
            .strip_prefix(self.version.as_str())?
            .strip_prefix('=')?;

        if hex_tag.len() != HEX_TAG_LEN
            || !hex_tag
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return None;
        }

        hex::decode(hex_tag).ok()
    }
}

impl std::fmt::Debug for RequestVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestVerifier")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}
