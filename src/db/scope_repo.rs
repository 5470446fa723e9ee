// src/db/scope_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::scope::ScopeSelection};

/// Armazena a última seleção de filial confirmada por usuário.
#[async_trait]
pub trait ScopeSelectionStore: Send + Sync {
    /// Sem registro gravado = consolidado.
    async fn load(&self, user_id: Uuid) -> Result<ScopeSelection, AppError>;

    /// Última escrita vence.
    async fn save(&self, user_id: Uuid, selection: ScopeSelection) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct ScopeSelectionRepository {
    pool: PgPool,
}

impl ScopeSelectionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScopeSelectionStore for ScopeSelectionRepository {
    async fn load(&self, user_id: Uuid) -> Result<ScopeSelection, AppError> {
        let stored = sqlx::query_scalar::<_, Option<Uuid>>(
            "SELECT selected_branch_id FROM user_scope_selections WHERE user_id = $1",
        )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(ScopeSelection::from(stored.flatten()))
    }

    async fn save(&self, user_id: Uuid, selection: ScopeSelection) -> Result<(), AppError> {
        let branch_id: Option<Uuid> = selection.into();

        sqlx::query(
            r#"
            INSERT INTO user_scope_selections (user_id, selected_branch_id, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (user_id)
            DO UPDATE SET selected_branch_id = EXCLUDED.selected_branch_id,
                          updated_at = now()
            "#,
        )
            .bind(user_id)
            .bind(branch_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
