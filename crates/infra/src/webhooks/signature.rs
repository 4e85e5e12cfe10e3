//! HMAC-SHA256 payload signing.
//!
//! The signature covers the exact snapshotted payload bytes, so retries of
//! the same delivery always carry the same signature.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use slotwise_domain::{Result, SlotwiseError};

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Signature header value: `sha256=<hex of HMAC-SHA256(secret, payload)>`.
pub fn sign_payload(secret: &str, payload: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| SlotwiseError::Internal(format!("invalid signing key: {e}")))?;
    mac.update(payload);
    Ok(format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes())))
}

/// Constant-time verification of a received signature header value.
pub fn verify_payload(secret: &str, payload: &[u8], signature: &str) -> bool {
    let Some(hex_digest) = signature.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_round_trips() {
        let payload = br#"{"event":"booking.created","data":{"id":"b1"}}"#;
        let signature = sign_payload("whsec_test", payload).unwrap();
        assert!(signature.starts_with("sha256="));
        assert!(verify_payload("whsec_test", payload, &signature));
    }

    #[test]
    fn rejects_wrong_secret_payload_or_format() {
        let payload = b"payload";
        let signature = sign_payload("secret-a", payload).unwrap();
        assert!(!verify_payload("secret-b", payload, &signature));
        assert!(!verify_payload("secret-a", b"other payload", &signature));
        assert!(!verify_payload("secret-a", payload, "md5=abcdef"));
        assert!(!verify_payload("secret-a", payload, "sha256=not-hex"));
    }

    #[test]
    fn same_payload_signs_identically() {
        let payload = b"stable bytes";
        assert_eq!(
            sign_payload("s", payload).unwrap(),
            sign_payload("s", payload).unwrap()
        );
    }
}
