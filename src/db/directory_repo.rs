// src/db/directory_repo.rs

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::identity::{Branch, Role, UserIdentity},
};

/// Fatos somente-leitura sobre filiais e sobre o vínculo de um usuário.
#[async_trait]
pub trait BranchDirectory: Send + Sync {
    /// Filiais ativas da empresa, matriz primeiro e depois alfabética.
    async fn active_branches(&self, company_id: Uuid) -> Result<Vec<Branch>, AppError>;

    /// Cargos e filial do usuário. `Inactive` se ele ou a filial estiverem desativados.
    async fn user_identity(&self, user_id: Uuid) -> Result<UserIdentity, AppError>;
}

// Linha crua do usuário + filial (LEFT JOIN)
#[derive(Debug, FromRow)]
struct UserAccessRow {
    id: Uuid,
    company_id: Uuid,
    branch_id: Option<Uuid>,
    is_active: bool,
    is_team_lead: bool,
    branch_company_id: Option<Uuid>,
    branch_is_active: Option<bool>,
}

#[derive(Clone)]
pub struct DirectoryRepository {
    pool: PgPool,
}

impl DirectoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn company_exists(&self, company_id: Uuid) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM companies WHERE id = $1)",
        )
            .bind(company_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }
}

#[async_trait]
impl BranchDirectory for DirectoryRepository {
    async fn active_branches(&self, company_id: Uuid) -> Result<Vec<Branch>, AppError> {
        if !self.company_exists(company_id).await? {
            return Err(AppError::NotFound("company"));
        }

        let mut branches = sqlx::query_as::<_, Branch>(
            r#"
            SELECT id, company_id, name, is_head, is_active
            FROM branches
            WHERE company_id = $1 AND is_active = true
            "#,
        )
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?;

        // Ordenamos aqui (e não no SQL) para não depender da collation do banco
        branches.sort_by(Branch::display_order);
        Ok(branches)
    }

    async fn user_identity(&self, user_id: Uuid) -> Result<UserIdentity, AppError> {
        let row = sqlx::query_as::<_, UserAccessRow>(
            r#"
            SELECT
                u.id, u.company_id, u.branch_id, u.is_active, u.is_team_lead,
                b.company_id AS branch_company_id,
                b.is_active AS branch_is_active
            FROM users u
            LEFT JOIN branches b ON b.id = u.branch_id
            WHERE u.id = $1
            "#,
        )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("user"))?;

        if !row.is_active {
            return Err(AppError::Inactive);
        }

        if row.branch_id.is_some() {
            // Filial de outra empresa é dado corrompido: tratamos como inexistente
            if row.branch_company_id != Some(row.company_id) {
                tracing::error!(user_id = %row.id, "Filial atribuída não pertence à empresa do usuário.");
                return Err(AppError::NotFound("branch"));
            }
            if row.branch_is_active != Some(true) {
                return Err(AppError::Inactive);
            }
        }

        let roles: Vec<Role> = sqlx::query_scalar::<_, String>(
            "SELECT role FROM user_roles WHERE user_id = $1 ORDER BY role",
        )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Role::from)
            .collect();

        UserIdentity::new(row.id, row.company_id, roles, row.branch_id, row.is_team_lead)
    }
}
