// src/db/user_repo.rs

use sqlx::PgPool;
use crate::{common::error::AppError, models::auth::CredentialRow};

// O repositório de usuários, responsável pelas credenciais da tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca as credenciais de um usuário pelo seu e-mail
    pub async fn find_by_email(&self, email: &str) -> Result<Option<CredentialRow>, AppError> {
        let maybe_user = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, password_hash, is_active FROM users WHERE lower(email) = lower($1)",
        )
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(maybe_user)
    }
}
