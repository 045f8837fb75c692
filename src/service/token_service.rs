//! Student confirmation tokens.
//!
//! A token is `<job_id>.<expires_unix>.<hmac_hex>` where the MAC covers
//! `<job_id>.<expires_unix>`. Verification checks shape first, then
//! expiry, then the signature, so an expired-but-authentic token reports
//! expiry rather than tampering.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token has expired")]
    Expired,
    #[error("token signature mismatch")]
    BadSignature,
    #[error("token signing failed")]
    SigningFailed,
}

/// Claims recovered from a verified token.
#[derive(Debug, PartialEq, Eq)]
pub struct VerifiedToken {
    pub job_id: String,
    pub expires_at: i64,
}

/// Signs a confirmation token for `job_id` expiring at `expires_at`
/// (unix seconds).
pub fn sign(job_id: &str, expires_at: i64, secret: &str) -> Result<String, TokenError> {
    let mac_hex = mac_hex(job_id, expires_at, secret)?;
    Ok(format!("{job_id}.{expires_at}.{mac_hex}"))
}

/// Verifies shape, expiry, and signature of a token against `now`
/// (unix seconds).
pub fn verify(token: &str, secret: &str, now: i64) -> Result<VerifiedToken, TokenError> {
    // Job ids never contain dots, so the two rightmost separators are
    // the token's own.
    let mut parts = token.rsplitn(3, '.');
    let mac_part = parts.next().ok_or(TokenError::Malformed)?;
    let expires_part = parts.next().ok_or(TokenError::Malformed)?;
    let job_id = parts.next().ok_or(TokenError::Malformed)?;
    if job_id.is_empty() || mac_part.is_empty() {
        return Err(TokenError::Malformed);
    }

    let expires_at: i64 = expires_part.parse().map_err(|_| TokenError::Malformed)?;
    if now > expires_at {
        return Err(TokenError::Expired);
    }

    let signature = hex::decode(mac_part).map_err(|_| TokenError::Malformed)?;
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::SigningFailed)?;
    mac.update(payload(job_id, expires_at).as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| TokenError::BadSignature)?;

    Ok(VerifiedToken {
        job_id: job_id.to_string(),
        expires_at,
    })
}

fn mac_hex(job_id: &str, expires_at: i64, secret: &str) -> Result<String, TokenError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::SigningFailed)?;
    mac.update(payload(job_id, expires_at).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn payload(job_id: &str, expires_at: i64) -> String {
    format!("{job_id}.{expires_at}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn sign_then_verify_round_trips_claims() {
        let token = sign("4f3c2a", 1_000_000, SECRET).unwrap();
        let verified = verify(&token, SECRET, 999_999).unwrap();
        assert_eq!(verified.job_id, "4f3c2a");
        assert_eq!(verified.expires_at, 1_000_000);
    }

    #[test]
    fn expired_token_is_rejected_before_signature_check() {
        let token = sign("4f3c2a", 1_000, SECRET).unwrap();
        assert_eq!(verify(&token, SECRET, 1_001), Err(TokenError::Expired));
        // exact expiry instant is still valid
        assert!(verify(&token, SECRET, 1_000).is_ok());
    }

    #[test]
    fn wrong_secret_fails_signature() {
        let token = sign("4f3c2a", 1_000_000, SECRET).unwrap();
        assert_eq!(
            verify(&token, "other-secret", 0),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn tampered_job_id_fails_signature() {
        let token = sign("4f3c2a", 1_000_000, SECRET).unwrap();
        let tampered = token.replacen("4f3c2a", "deadbe", 1);
        assert_eq!(verify(&tampered, SECRET, 0), Err(TokenError::BadSignature));
    }

    #[test]
    fn truncated_token_is_malformed() {
        let token = sign("4f3c2a", 1_000_000, SECRET).unwrap();
        let cut = &token[..token.len() - 10];
        assert!(matches!(
            verify(cut, SECRET, 0),
            Err(TokenError::Malformed) | Err(TokenError::BadSignature)
        ));
        assert_eq!(verify("no-dots-here", SECRET, 0), Err(TokenError::Malformed));
        assert_eq!(verify("a.b.c", SECRET, 0), Err(TokenError::Malformed));
    }
}
