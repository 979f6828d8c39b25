//! Postgres-backed stores.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use crate::auth::model::{RefreshTokenRecord, User, UserFields, VerifyStatus};
use crate::auth::store::{RefreshTokenStore, UserStore};
use crate::token::unix_now;

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> Result<User> {
    let verify: String = row.get("verify");
    let verify = VerifyStatus::parse(&verify)
        .ok_or_else(|| anyhow!("unknown verify status in users row: {verify}"))?;
    Ok(User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        verify,
        email_verify_token: row.get("email_verify_token"),
        forgot_password_token: row.get("forgot_password_token"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = r"
            SELECT id, name, email, username, password_hash, verify,
                   email_verify_token, forgot_password_token, created_at, updated_at
            FROM users
            WHERE email = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup user by email")?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let query = r"
            SELECT id, name, email, username, password_hash, verify,
                   email_verify_token, forgot_password_token, created_at, updated_at
            FROM users
            WHERE id = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup user by id")?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let query = r"
            SELECT id, name, email, username, password_hash, verify,
                   email_verify_token, forgot_password_token, created_at, updated_at
            FROM users
            WHERE username = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup user by username")?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn insert(&self, user: User) -> Result<()> {
        let query = r"
            INSERT INTO users
                (id, name, email, username, password_hash, verify,
                 email_verify_token, forgot_password_token, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.verify.as_str())
            .bind(&user.email_verify_token)
            .bind(&user.forgot_password_token)
            .bind(user.created_at)
            .bind(user.updated_at)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to insert user")?;
        Ok(())
    }

    async fn update_fields(&self, id: Uuid, fields: UserFields) -> Result<()> {
        // COALESCE keeps untouched columns; NULL binds mean "no change".
        let query = r"
            UPDATE users
            SET password_hash = COALESCE($2, password_hash),
                verify = COALESCE($3, verify),
                email_verify_token = COALESCE($4, email_verify_token),
                forgot_password_token = COALESCE($5, forgot_password_token),
                updated_at = $6
            WHERE id = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .bind(fields.password_hash)
            .bind(fields.verify.map(VerifyStatus::as_str))
            .bind(fields.email_verify_token)
            .bind(fields.forgot_password_token)
            .bind(unix_now())
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to update user fields")?;
        Ok(())
    }
}

pub struct PgRefreshTokenStore {
    pool: PgPool,
}

impl PgRefreshTokenStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    async fn insert(&self, record: RefreshTokenRecord) -> Result<()> {
        let query = r"
            INSERT INTO refresh_tokens (user_id, token, iat, exp)
            VALUES ($1, $2, $3, $4)
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(record.user_id)
            .bind(&record.token)
            .bind(record.iat)
            .bind(record.exp)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to insert refresh token")?;
        Ok(())
    }

    async fn consume_if_present(&self, token: &str) -> Result<Option<RefreshTokenRecord>> {
        // Single-statement find-and-delete; two concurrent callers can never
        // both get the row back.
        let query = r"
            DELETE FROM refresh_tokens
            WHERE token = $1
            RETURNING user_id, token, iat, exp
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(token)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to consume refresh token")?;

        Ok(row.map(|row| RefreshTokenRecord {
            user_id: row.get("user_id"),
            token: row.get("token"),
            iat: row.get("iat"),
            exp: row.get("exp"),
        }))
    }
}
