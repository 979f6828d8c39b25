//! Signed, expiring token primitive.
//!
//! Tokens are compact HS256 JWTs. Each token kind is signed with its own key
//! and carries an explicit `type` claim, so a payload signed for one kind can
//! never verify as another even if the shapes match.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::model::VerifyStatus;

type HmacSha256 = Hmac<Sha256>;

/// The four token kinds issued by the engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    AccessToken,
    RefreshToken,
    EmailVerifyToken,
    ForgotPasswordToken,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct TokenHeader {
    alg: String,
    typ: String,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Decoded contents of any signed token.
///
/// `verify` is a snapshot of the user's verification status at issuance, not
/// a live view of the account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPayload {
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub verify: VerifyStatus,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signing key")]
    Key,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("unexpected token kind")]
    KindMismatch,
}

/// Current unix time in seconds.
#[must_use]
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(0))
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, Error> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| Error::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Create an HS256 signed token from the payload.
///
/// # Errors
///
/// Returns an error if the header/payload JSON cannot be encoded or the key
/// is rejected by the MAC.
pub fn sign_hs256(key: &[u8], payload: &TokenPayload) -> Result<String, Error> {
    let header_b64 = b64e_json(&TokenHeader::hs256())?;
    let payload_b64 = b64e_json(payload)?;
    let signing_input = format!("{header_b64}.{payload_b64}");

    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| Error::Key)?;
    mac.update(signing_input.as_bytes());
    let signature_b64 = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature_b64}"))
}

/// Verify an HS256 token and return its decoded payload.
///
/// # Errors
///
/// Returns an error if:
/// - the token is malformed or contains invalid base64/json,
/// - the algorithm is not HS256,
/// - the signature does not verify under `key`,
/// - the payload has expired relative to `now_unix_seconds`.
pub fn verify_hs256(
    token: &str,
    key: &[u8],
    now_unix_seconds: i64,
) -> Result<TokenPayload, Error> {
    let mut parts = token.split('.');
    let header_b64 = parts.next().ok_or(Error::TokenFormat)?;
    let payload_b64 = parts.next().ok_or(Error::TokenFormat)?;
    let sig_b64 = parts.next().ok_or(Error::TokenFormat)?;
    if parts.next().is_some() {
        return Err(Error::TokenFormat);
    }

    let header: TokenHeader = b64d_json(header_b64)?;
    if header.alg != "HS256" {
        return Err(Error::UnsupportedAlg(header.alg));
    }

    let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| Error::Base64)?;
    let signing_input = format!("{header_b64}.{payload_b64}");
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| Error::Key)?;
    mac.update(signing_input.as_bytes());
    // Constant-time comparison happens inside the MAC verification.
    mac.verify_slice(&signature)
        .map_err(|_| Error::InvalidSignature)?;

    let payload: TokenPayload = b64d_json(payload_b64)?;
    if payload.exp <= now_unix_seconds {
        return Err(Error::Expired);
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;
    const KEY: &[u8] = b"test-signing-key";

    fn test_payload(kind: TokenKind) -> TokenPayload {
        TokenPayload {
            user_id: Uuid::nil(),
            kind,
            verify: VerifyStatus::Unverified,
            iat: NOW,
            exp: NOW + 900,
        }
    }

    #[test]
    fn sign_and_verify_round_trip() -> Result<(), Error> {
        let payload = test_payload(TokenKind::AccessToken);
        let token = sign_hs256(KEY, &payload)?;
        let verified = verify_hs256(&token, KEY, NOW)?;
        assert_eq!(verified, payload);
        Ok(())
    }

    #[test]
    fn rejects_wrong_key() -> Result<(), Error> {
        let token = sign_hs256(KEY, &test_payload(TokenKind::AccessToken))?;
        let result = verify_hs256(&token, b"another-key", NOW);
        assert!(matches!(result, Err(Error::InvalidSignature)));
        Ok(())
    }

    #[test]
    fn rejects_expired() -> Result<(), Error> {
        let token = sign_hs256(KEY, &test_payload(TokenKind::RefreshToken))?;
        let result = verify_hs256(&token, KEY, NOW + 901);
        assert!(matches!(result, Err(Error::Expired)));
        Ok(())
    }

    #[test]
    fn expiry_boundary_is_exclusive() -> Result<(), Error> {
        let token = sign_hs256(KEY, &test_payload(TokenKind::RefreshToken))?;
        // exp == now counts as expired; one second earlier does not.
        assert!(matches!(
            verify_hs256(&token, KEY, NOW + 900),
            Err(Error::Expired)
        ));
        assert!(verify_hs256(&token, KEY, NOW + 899).is_ok());
        Ok(())
    }

    #[test]
    fn rejects_tampered_payload() -> Result<(), Error> {
        let token = sign_hs256(KEY, &test_payload(TokenKind::AccessToken))?;
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = b64e_json(&test_payload(TokenKind::RefreshToken))?;
        parts[1] = &forged;
        let forged_token = parts.join(".");
        let result = verify_hs256(&forged_token, KEY, NOW);
        assert!(matches!(result, Err(Error::InvalidSignature)));
        Ok(())
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(matches!(
            verify_hs256("a.b", KEY, NOW),
            Err(Error::TokenFormat)
        ));
        assert!(matches!(
            verify_hs256("a.b.c.d", KEY, NOW),
            Err(Error::TokenFormat)
        ));
        assert!(matches!(
            verify_hs256("!!.??.!!", KEY, NOW),
            Err(Error::Base64)
        ));
    }

    #[test]
    fn rejects_unsupported_algorithm() -> Result<(), Error> {
        let header = TokenHeader {
            alg: "none".to_string(),
            typ: "JWT".to_string(),
        };
        let header_b64 = b64e_json(&header)?;
        let payload_b64 = b64e_json(&test_payload(TokenKind::AccessToken))?;
        let token = format!("{header_b64}.{payload_b64}.AAAA");
        let result = verify_hs256(&token, KEY, NOW);
        assert!(matches!(result, Err(Error::UnsupportedAlg(alg)) if alg == "none"));
        Ok(())
    }

    #[test]
    fn token_kind_serializes_like_the_wire_names() -> Result<(), Error> {
        let json = serde_json::to_string(&TokenKind::EmailVerifyToken)?;
        assert_eq!(json, "\"email_verify_token\"");
        let json = serde_json::to_string(&TokenKind::ForgotPasswordToken)?;
        assert_eq!(json, "\"forgot_password_token\"");
        Ok(())
    }
}
