//! Authentication gate: shared-password check and HMAC session tokens.
//!
//! A successful password check mints an opaque bearer token embedding its
//! issuance instant; validity is the HMAC tag verifying plus the token
//! being younger than 24 hours. No revocation store, no per-user identity
//! just a single shared secret and a single class of session.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Token payload version tag.
const TOKEN_PREFIX: &str = "voxbot.v1";

/// Token lifetime.
const TOKEN_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Tolerated clock skew for tokens dated slightly in the future.
const CLOCK_SKEW_MS: i64 = 60 * 1000;

/// The authentication gate.
pub struct AuthGate {
    password: String,
    secret: Vec<u8>,
}

impl AuthGate {
    /// Create a gate from the configured password and token secret.
    ///
    /// An empty `token_secret` derives the signing key from the password so
    /// a minimal config still gets signed tokens.
    pub fn new(password: &str, token_secret: &str) -> Self {
        let secret = if token_secret.is_empty() {
            let mut hasher = Sha256::new();
            hasher.update(b"voxbot-token-key:");
            hasher.update(password.as_bytes());
            hasher.finalize().to_vec()
        } else {
            token_secret.as_bytes().to_vec()
        };

        Self {
            password: password.to_string(),
            secret,
        }
    }

    /// Whether a password has been configured at all.
    pub fn is_configured(&self) -> bool {
        !self.password.is_empty()
    }

    /// Check a submitted password and mint a session token on match.
    ///
    /// Returns `None` for a wrong password. The comparison goes through
    /// fixed-length digests so timing does not leak prefix information.
    pub fn issue(&self, password: &str) -> Option<String> {
        if !self.is_configured() || !digest_eq(password, &self.password) {
            return None;
        }
        Some(self.issue_at(chrono::Utc::now().timestamp_millis()))
    }

    /// Validate a bearer token: structural decode, HMAC verify, freshness.
    pub fn verify(&self, token: &str) -> bool {
        self.verify_at(token, chrono::Utc::now().timestamp_millis())
    }

    fn issue_at(&self, now_ms: i64) -> String {
        let payload = format!(
            "{}.{}.{}",
            TOKEN_PREFIX,
            now_ms,
            Uuid::new_v4().simple()
        );
        let tag = self.sign(payload.as_bytes());
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload.as_bytes()),
            URL_SAFE_NO_PAD.encode(tag)
        )
    }

    fn verify_at(&self, token: &str, now_ms: i64) -> bool {
        let Some((payload_b64, tag_b64)) = token.split_once('.') else {
            return false;
        };
        let Ok(payload) = URL_SAFE_NO_PAD.decode(payload_b64) else {
            return false;
        };
        let Ok(tag) = URL_SAFE_NO_PAD.decode(tag_b64) else {
            return false;
        };

        // Constant-time tag check before anything is parsed out of the payload.
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any size");
        mac.update(&payload);
        if mac.verify_slice(&tag).is_err() {
            return false;
        }

        let Ok(payload) = String::from_utf8(payload) else {
            return false;
        };
        let mut parts = payload.splitn(3, '.');
        let prefix = format!(
            "{}.{}",
            parts.next().unwrap_or(""),
            parts.next().unwrap_or("")
        );
        if prefix != TOKEN_PREFIX {
            return false;
        }
        let Some(issued_ms) = parts
            .next()
            .and_then(|rest| rest.split('.').next())
            .and_then(|ts| ts.parse::<i64>().ok())
        else {
            return false;
        };

        let age = now_ms - issued_ms;
        age < TOKEN_TTL_MS && age > -CLOCK_SKEW_MS
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any size");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Compare two strings through fixed-length SHA-256 digests, accumulating
/// the difference so the comparison does not short-circuit.
fn digest_eq(a: &str, b: &str) -> bool {
    let da = Sha256::digest(a.as_bytes());
    let db = Sha256::digest(b.as_bytes());
    da.iter().zip(db.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
