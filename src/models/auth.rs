// src/models/auth.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::scope::{EffectiveScope, LoginLocation};

// Linha mínima de credenciais vinda da tabela `users`
#[derive(Debug, Clone, FromRow)]
pub struct CredentialRow {
    pub id: Uuid,
    pub password_hash: String,
    pub is_active: bool,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginUserPayload {
    #[schema(example = "tecnico@empresa.com")]
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    pub password: String,
    pub location: LoginLocation,
}

/// Credenciais já validadas, entregues ao portão de login.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl From<&LoginUserPayload> for Credentials {
    fn from(payload: &LoginUserPayload) -> Self {
        Self {
            email: payload.email.trim().to_lowercase(),
            password: payload.password.clone(),
        }
    }
}

/// Sessão emitida pelo provedor de autenticação.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub token: String,
}

// Resposta de autenticação com o token e o escopo resolvido
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub scope: EffectiveScope,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub sid: Uuid,  // Sessão (revogável)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}
