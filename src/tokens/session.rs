//! Stateless bearer tokens.
//!
//! A token is `base64url(header).base64url(claims).base64url(hmac)` with an
//! HMAC-SHA256 signature over the first two segments. Verification needs only
//! the signing secret, so any request handler can check a token on its own.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Every token is valid for exactly this long after issue.
pub const TOKEN_TTL_HOURS: i64 = 24;

const ALGORITHM: &str = "HS256";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("Token expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
    #[error("Invalid signing key")]
    Key,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    exp: i64,
    iat: i64,
    sub: String,
}

/// A freshly issued token and its absolute expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub expires_at: DateTime<Utc>,
    pub token: String,
}

/// Issues and verifies bearer tokens with a shared secret.
#[derive(Clone)]
pub struct TokenService {
    secret: Vec<u8>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService").finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Issue a token for `user_id`, valid for [`TOKEN_TTL_HOURS`] from now.
    pub fn issue(&self, user_id: &str) -> Result<IssuedToken, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let expires_at = now + Duration::hours(TOKEN_TTL_HOURS);
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };
        let claims = Claims {
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            sub: user_id.to_string(),
        };

        let signing_input = format!("{}.{}", b64e_json(&header)?, b64e_json(&claims)?);
        let signature = self.sign(signing_input.as_bytes())?;

        Ok(IssuedToken {
            expires_at: Utc
                .timestamp_opt(claims.exp, 0)
                .single()
                .unwrap_or(expires_at),
            token: format!("{signing_input}.{signature}"),
        })
    }

    /// Verify a token and return the user id it was issued for.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Tampered or malformed tokens fail with [`TokenError::Invalid`]; a
    /// correctly signed token at or past its expiry fails with
    /// [`TokenError::Expired`].
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let mut parts = token.split('.');
        let header_b64 = parts.next().ok_or(TokenError::Invalid)?;
        let claims_b64 = parts.next().ok_or(TokenError::Invalid)?;
        let signature_b64 = parts.next().ok_or(TokenError::Invalid)?;
        if parts.next().is_some() {
            return Err(TokenError::Invalid);
        }

        let header: Header = b64d_json(header_b64)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::Invalid);
        }

        let signature =
            Base64UrlUnpadded::decode_vec(signature_b64).map_err(|_| TokenError::Invalid)?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::Invalid)?;

        let claims: Claims = b64d_json(claims_b64)?;
        if claims.sub.is_empty() {
            return Err(TokenError::Invalid);
        }
        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims.sub)
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        <HmacSha256 as Mac>::new_from_slice(&self.secret).map_err(|_| TokenError::Key)
    }

    fn sign(&self, signing_input: &[u8]) -> Result<String, TokenError> {
        let mut mac = self.mac()?;
        mac.update(signing_input);
        Ok(Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes()))
    }
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, TokenError> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| TokenError::Invalid)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Invalid)
}
