//! Account and session entities shared across the engine and its stores.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Tri-state account trust level.
///
/// Only `verify_email` advances `Unverified` to `Verified`; `Banned` is an
/// administrative state set outside this engine and never regressed here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VerifyStatus {
    Unverified,
    Verified,
    Banned,
}

impl VerifyStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unverified => "unverified",
            Self::Verified => "verified",
            Self::Banned => "banned",
        }
    }

    #[must_use]
    pub fn parse(status: &str) -> Option<Self> {
        match status {
            "unverified" => Some(Self::Unverified),
            "verified" => Some(Self::Verified),
            "banned" => Some(Self::Banned),
            _ => None,
        }
    }
}

/// Identity record owned by the user store.
///
/// `email_verify_token` and `forgot_password_token` hold the single live
/// one-time token of their kind; the empty string means unused or consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub verify: VerifyStatus,
    pub email_verify_token: String,
    pub forgot_password_token: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Partial update applied through `UserStore::update_fields`.
///
/// `None` leaves the column untouched; stores bump `updated_at` themselves.
#[derive(Debug, Clone, Default)]
pub struct UserFields {
    pub password_hash: Option<String>,
    pub verify: Option<VerifyStatus>,
    pub email_verify_token: Option<String>,
    pub forgot_password_token: Option<String>,
}

/// One persisted row per currently valid refresh token.
///
/// The token string is the signed value itself, treated as an opaque unique
/// key. Deleting the row is the sole revocation mechanism for refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub user_id: Uuid,
    pub token: String,
    pub iat: i64,
    pub exp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_status_round_trips_through_strings() {
        for status in [
            VerifyStatus::Unverified,
            VerifyStatus::Verified,
            VerifyStatus::Banned,
        ] {
            assert_eq!(VerifyStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(VerifyStatus::parse("active"), None);
    }

    #[test]
    fn verify_status_json_names() {
        let json = serde_json::to_string(&VerifyStatus::Unverified).unwrap_or_default();
        assert_eq!(json, "\"unverified\"");
    }

    #[test]
    fn user_fields_default_touches_nothing() {
        let fields = UserFields::default();
        assert!(fields.password_hash.is_none());
        assert!(fields.verify.is_none());
        assert!(fields.email_verify_token.is_none());
        assert!(fields.forgot_password_token.is_none());
    }
}
