// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::{message, MessageKey};
use crate::middleware::i18n::Locale;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Rejeições de política de login NÃO moram aqui: elas são um resultado
// (`LoginOutcome::Rejected`), não uma falha.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Não encontrado: {0}")]
    NotFound(&'static str),

    #[error("Usuário ou filial desativados")]
    Inactive,

    #[error("Usuário sem filial atribuída")]
    UnassignedUser,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Sessão revogada ou expirada")]
    SessionRevoked,

    #[error("Acesso negado")]
    Forbidden,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// Erro "pronto para o cliente": status + mensagem já traduzida
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self { status, error: error.into(), details: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    /// Status HTTP e chave de mensagem para cada variante.
    fn status_and_key(&self) -> (StatusCode, MessageKey) {
        match self {
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, MessageKey::ValidationFailed),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, MessageKey::NotFound),
            // Inativo e sem filial são tratados como falha de autenticação
            AppError::Inactive | AppError::UnassignedUser | AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, MessageKey::InvalidCredentials)
            }
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, MessageKey::InvalidToken),
            AppError::SessionRevoked => (StatusCode::UNAUTHORIZED, MessageKey::SessionRevoked),
            AppError::Forbidden => (StatusCode::FORBIDDEN, MessageKey::Forbidden),
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => (StatusCode::INTERNAL_SERVER_ERROR, MessageKey::Internal),
        }
    }

    /// Converte o erro de domínio num erro de API no idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let (status, key) = self.status_and_key();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // O `tracing` loga a mensagem detalhada; o cliente recebe só a genérica.
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let details = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            AppError::NotFound(entity) => Some(json!({ "entity": entity })),
            _ => None,
        };

        ApiError {
            status,
            error: message(locale, key).to_string(),
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_is_reported_like_bad_credentials() {
        let locale = Locale::default();
        let inactive = AppError::Inactive.to_api_error(&locale);
        let bad_password = AppError::InvalidCredentials.to_api_error(&locale);

        assert_eq!(inactive.status, StatusCode::UNAUTHORIZED);
        assert_eq!(inactive.status, bad_password.status);
        assert_eq!(inactive.error, bad_password.error);
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::InternalServerError(anyhow::anyhow!("segredo do pool"));
        let api = err.to_api_error(&Locale("en".into()));

        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("segredo"));
        assert!(api.details.is_none());
    }

    #[test]
    fn not_found_names_the_entity() {
        let api = AppError::NotFound("branch").to_api_error(&Locale::default());
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.details, Some(json!({ "entity": "branch" })));
    }
}
