//! Credential hashing and bearer-token signing.
//!
//! Tokens are HMAC-SHA256 signed, not encrypted:
//! `base64(username:expiry) "." hex(mac)`. The signing key is loaded from
//! `VITIS_TOKEN_KEY_FILE`, then `VITIS_TOKEN_KEY`, then a development
//! default that is not suitable for production.

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Token lifetime in seconds.
pub const TOKEN_TTL_SECS: i64 = 3600;

/// Why a presented credential was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid or malformed token")]
    InvalidToken,
    #[error("token expired")]
    Expired,
}

/// Salted SHA-256 password hash, encoded as `salt_hex$digest_hex`.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    format!("{}${}", hex::encode(salt), hex::encode(digest(&salt, password)))
}

/// Check `password` against a stored `salt_hex$digest_hex` hash.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    hex::encode(digest(&salt, password)) == digest_hex
}

fn digest(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

/// A freshly issued bearer token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies HMAC-signed bearer tokens.
#[derive(Clone)]
pub struct TokenSigner {
    key: Vec<u8>,
}

impl TokenSigner {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    /// Load the signing key from the environment.
    ///
    /// Priority:
    /// 1. `VITIS_TOKEN_KEY_FILE` reads the key from the file path
    /// 2. `VITIS_TOKEN_KEY` uses the value directly (visible in `ps`)
    /// 3. a development default, not suitable for production secrets
    pub fn from_env() -> Result<Self> {
        if let Ok(key_path) = std::env::var("VITIS_TOKEN_KEY_FILE") {
            let key = std::fs::read(&key_path)
                .with_context(|| format!("cannot read token key file at '{key_path}'"))?;
            if key.len() < 16 {
                bail!(
                    "token key file is too short ({} bytes), need at least 16",
                    key.len()
                );
            }
            return Ok(Self::new(key));
        }
        if let Ok(key) = std::env::var("VITIS_TOKEN_KEY") {
            if key.len() < 16 {
                bail!("VITIS_TOKEN_KEY is too short ({} chars), need at least 16", key.len());
            }
            return Ok(Self::new(key.into_bytes()));
        }
        Ok(Self::new(b"vitis-dev-key-not-for-production".to_vec()))
    }

    /// Issue a token for `username`, valid for [`TOKEN_TTL_SECS`].
    pub fn issue(&self, username: &str) -> IssuedToken {
        self.issue_with_ttl(username, Duration::seconds(TOKEN_TTL_SECS))
    }

    pub fn issue_with_ttl(&self, username: &str, ttl: Duration) -> IssuedToken {
        let expires_at = Utc::now() + ttl;
        let payload = format!("{username}:{}", expires_at.timestamp());
        let mac = hex::encode(self.sign(payload.as_bytes()));
        IssuedToken {
            token: format!("{}.{mac}", BASE64.encode(payload)),
            expires_at,
        }
    }

    /// Verify a token's signature and expiry, returning the username it
    /// names.
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        let (payload_b64, mac_hex) = token.split_once('.').ok_or(AuthError::InvalidToken)?;
        let payload = BASE64.decode(payload_b64).map_err(|_| AuthError::InvalidToken)?;
        let mac = hex::decode(mac_hex).map_err(|_| AuthError::InvalidToken)?;

        let mut verifier = HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size");
        verifier.update(&payload);
        verifier.verify_slice(&mac).map_err(|_| AuthError::InvalidToken)?;

        let payload = String::from_utf8(payload).map_err(|_| AuthError::InvalidToken)?;
        let (username, expiry) = payload.rsplit_once(':').ok_or(AuthError::InvalidToken)?;
        let expiry: i64 = expiry.parse().map_err(|_| AuthError::InvalidToken)?;
        if Utc::now().timestamp() >= expiry {
            return Err(AuthError::Expired);
        }
        Ok(username.to_string())
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Parse an `Authorization: Basic` header value into (username, password).
pub fn parse_basic(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Parse an `Authorization: Bearer` header value into the raw token.
pub fn parse_bearer(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ").map(str::trim)
}
