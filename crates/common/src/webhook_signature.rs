//! Verification of signed video-platform webhooks.
//!
//! The sender signs `"{timestamp}.{raw body}"` with HMAC-SHA256 under a shared
//! secret and sends `t=<unix-ts>,v1=<hex digest>` in the `Mux-Signature`
//! header. Timestamp freshness is not checked here; callers that need replay
//! protection have to compare [`SignatureHeader::timestamp`] themselves.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "Mux-Signature";

/// Parsed signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Timestamp segment value, as sent.
    pub timestamp: String,
    /// Hex-encoded signature segment value, as sent.
    pub signature: String,
}

impl SignatureHeader {
    /// Parse a `t=<ts>,v1=<hex>` header value.
    ///
    /// The value must split into exactly two comma-separated segments, each a
    /// single `key=value` pair. The first value is the timestamp, the second
    /// the signature.
    pub fn parse(value: &str) -> AppResult<Self> {
        let segments: Vec<&str> = value.split(',').collect();
        let [timestamp, signature] = segments.as_slice() else {
            return Err(AppError::MalformedSignatureHeader);
        };

        Ok(Self {
            timestamp: segment_value(timestamp)?.to_string(),
            signature: segment_value(signature)?.to_string(),
        })
    }
}

fn segment_value(segment: &str) -> AppResult<&str> {
    let parts: Vec<&str> = segment.trim().split('=').collect();
    match parts.as_slice() {
        [key, value] if !key.is_empty() => Ok(*value),
        _ => Err(AppError::MalformedSignatureHeader),
    }
}

/// Verifies webhook bodies against the shared signing secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Vec<u8>,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier").finish_non_exhaustive()
    }
}

impl SignatureVerifier {
    /// Create a verifier for the given shared secret.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verify `body` against the raw signature header value.
    ///
    /// An absent or empty header is malformed. The digest comparison is
    /// constant-time.
    pub fn verify(&self, header: Option<&str>, body: &[u8]) -> AppResult<SignatureHeader> {
        let header = match header {
            Some(value) if !value.is_empty() => SignatureHeader::parse(value)?,
            _ => return Err(AppError::MalformedSignatureHeader),
        };

        let expected = hex::decode(&header.signature).map_err(|_| AppError::SignatureMismatch)?;

        self.mac(&header.timestamp, body)?
            .verify_slice(&expected)
            .map_err(|_| AppError::SignatureMismatch)?;

        Ok(header)
    }

    /// Compute the hex signature the sender would attach for `timestamp` and `body`.
    pub fn sign(&self, timestamp: &str, body: &[u8]) -> AppResult<String> {
        let mac = self.mac(timestamp, body)?;
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn mac(&self, timestamp: &str, body: &[u8]) -> AppResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AppError::Internal(format!("invalid HMAC key: {e}")))?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        Ok(mac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_for(verifier: &SignatureVerifier, timestamp: &str, body: &[u8]) -> String {
        format!("t={timestamp},v1={}", verifier.sign(timestamp, body).unwrap())
    }

    #[test]
    fn test_sign_matches_known_digest() {
        let verifier = SignatureVerifier::new("s");
        let signature = verifier.sign("1000", b"{}").unwrap();

        let mut mac = HmacSha256::new_from_slice(b"s").unwrap();
        mac.update(b"1000.{}");
        assert_eq!(signature, hex::encode(mac.finalize().into_bytes()));
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn test_accepts_valid_signature() {
        let verifier = SignatureVerifier::new("s");
        let header = header_for(&verifier, "1000", b"{}");

        let parsed = verifier.verify(Some(&header), b"{}").unwrap();
        assert_eq!(parsed.timestamp, "1000");
    }

    #[test]
    fn test_rejects_flipped_hex_character() {
        let verifier = SignatureVerifier::new("s");
        let signature = verifier.sign("1000", b"{}").unwrap();

        for position in 0..signature.len() {
            let mut chars: Vec<char> = signature.chars().collect();
            chars[position] = if chars[position] == 'a' { 'b' } else { 'a' };
            let tampered: String = chars.into_iter().collect();
            let header = format!("t=1000,v1={tampered}");

            assert!(matches!(
                verifier.verify(Some(&header), b"{}"),
                Err(AppError::SignatureMismatch)
            ));
        }
    }

    #[test]
    fn test_rejects_tampered_body_and_timestamp() {
        let verifier = SignatureVerifier::new("s");
        let header = header_for(&verifier, "1000", b"{}");

        assert!(matches!(
            verifier.verify(Some(&header), b"{\"type\":\"x\"}"),
            Err(AppError::SignatureMismatch)
        ));

        let signature = verifier.sign("1000", b"{}").unwrap();
        let shifted = format!("t=1001,v1={signature}");
        assert!(matches!(
            verifier.verify(Some(&shifted), b"{}"),
            Err(AppError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let sender = SignatureVerifier::new("other");
        let header = header_for(&sender, "1000", b"{}");

        let verifier = SignatureVerifier::new("s");
        assert!(matches!(
            verifier.verify(Some(&header), b"{}"),
            Err(AppError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_non_hex_signature_is_a_mismatch() {
        let verifier = SignatureVerifier::new("s");
        assert!(matches!(
            verifier.verify(Some("t=1000,v1=zz"), b"{}"),
            Err(AppError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_malformed_headers() {
        let verifier = SignatureVerifier::new("s");
        let cases = [
            "t=1000",
            "",
            "t=1000,v1=ab,extra=1",
            "t1000,v1=ab",
            "t=1000,v1",
            "t=1000,v1=a=b",
            "=1000,v1=ab",
        ];

        for header in cases {
            assert!(
                matches!(
                    verifier.verify(Some(header), b"{}"),
                    Err(AppError::MalformedSignatureHeader)
                ),
                "header {header:?} should be malformed"
            );
        }

        assert!(matches!(
            verifier.verify(None, b"{}"),
            Err(AppError::MalformedSignatureHeader)
        ));
    }
}
