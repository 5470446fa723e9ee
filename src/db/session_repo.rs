// src/db/session_repo.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::AppError;

// Sessões emitidas no login. Revogar = marcar revoked_at.
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)",
        )
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // Idempotente: revogar duas vezes não é erro
    pub async fn revoke(&self, session_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE auth_sessions SET revoked_at = COALESCE(revoked_at, now()) WHERE id = $1",
        )
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn is_active(&self, session_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let active = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM auth_sessions
                WHERE id = $1
                  AND user_id = $2
                  AND revoked_at IS NULL
                  AND expires_at > now()
            )
            "#,
        )
            .bind(session_id)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(active)
    }
}
