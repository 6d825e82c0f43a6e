//! Opaque signed-token issuer. The coordinator is the only component that
//! mints or verifies tokens; bank participants never see them (section 3,
//! "Token"). The signing scheme itself is an implementation detail of this
//! out-of-scope collaborator - any stateless signed-token scheme works -
//! so this follows the HMAC-SHA256 callback-signature pattern already used
//! elsewhere in the corpus for signing opaque payloads.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::time::get_current_time_in_seconds;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenPayload {
    bank: String,
    username: String,
    expires_at: u64,
}

/// The subject a verified token is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub bank: String,
    pub username: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("signature mismatch")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

/// Mints and verifies bearer tokens bound to `(bank, username, expiry)`.
/// Holds no per-token state: validity is entirely self-contained in the
/// signed payload, so any number of coordinator replicas could share one
/// `TokenIssuer` key without coordinating further state (irrelevant here
/// since this design has a single coordinator, but it is why no token
/// table needs to be kept at all per section 9's design notes).
pub struct TokenIssuer {
    key: Vec<u8>,
}

impl TokenIssuer {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    /// Mint a token for `(bank, username)` valid for `ttl` seconds from now.
    pub fn mint(&self, bank: &str, username: &str, ttl: std::time::Duration) -> String {
        let payload = TokenPayload {
            bank: bank.to_string(),
            username: username.to_string(),
            expires_at: get_current_time_in_seconds() + ttl.as_secs(),
        };
        let body = serde_json::to_string(&payload).expect("TokenPayload always serializes");
        let body_b64 = hex::encode(body.as_bytes());
        let sig = self.sign(&body_b64);
        format!("{body_b64}.{sig}")
    }

    /// Verify a token, returning the subject it is bound to if valid and
    /// not expired.
    pub fn verify(&self, token: &str) -> Result<Subject, TokenError> {
        let (body_b64, sig) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let expected = self.sign(body_b64);
        if !constant_time_eq(sig.as_bytes(), expected.as_bytes()) {
            return Err(TokenError::BadSignature);
        }

        let body = hex::decode(body_b64).map_err(|_| TokenError::Malformed)?;
        let payload: TokenPayload =
            serde_json::from_slice(&body).map_err(|_| TokenError::Malformed)?;

        if payload.expires_at < get_current_time_in_seconds() {
            return Err(TokenError::Expired);
        }

        Ok(Subject {
            bank: payload.bank,
            username: payload.username,
        })
    }

    fn sign(&self, body_b64: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any length");
        mac.update(body_b64.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mints_and_verifies_a_valid_token() {
        let issuer = TokenIssuer::new(b"test-key".to_vec());
        let token = issuer.mint("bank_a", "alice", std::time::Duration::from_secs(60));
        let subject = issuer.verify(&token).unwrap();
        assert_eq!(subject.bank, "bank_a");
        assert_eq!(subject.username, "alice");
    }

    #[test]
    fn rejects_expired_token() {
        let issuer = TokenIssuer::new(b"test-key".to_vec());
        let token = issuer.mint("bank_a", "alice", std::time::Duration::from_secs(0));
        std::thread::sleep(std::time::Duration::from_millis(1100));
        let err = issuer.verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn rejects_tampered_signature() {
        let issuer = TokenIssuer::new(b"test-key".to_vec());
        let mut token = issuer.mint("bank_a", "alice", std::time::Duration::from_secs(60));
        token.push('0');
        let err = issuer.verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::BadSignature));
    }

    #[test]
    fn rejects_token_signed_with_different_key() {
        let issuer_a = TokenIssuer::new(b"key-a".to_vec());
        let issuer_b = TokenIssuer::new(b"key-b".to_vec());
        let token = issuer_a.mint("bank_a", "alice", std::time::Duration::from_secs(60));
        let err = issuer_b.verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::BadSignature));
    }
}
