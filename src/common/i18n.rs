// src/common/i18n.rs

use crate::middleware::i18n::Locale;

/// Mensagens que chegam ao usuário final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    ValidationFailed,
    NotFound,
    InvalidCredentials,
    InvalidToken,
    SessionRevoked,
    Forbidden,
    Internal,
    // Rejeições do login
    LocationMismatch,
    MustUseGeneral,
    WrongBranch,
}

// Só temos dois catálogos: português e inglês (padrão).
pub fn message(locale: &Locale, key: MessageKey) -> &'static str {
    match locale.0.as_str() {
        "pt" => pt(key),
        _ => en(key),
    }
}

fn pt(key: MessageKey) -> &'static str {
    match key {
        MessageKey::ValidationFailed => "Um ou mais campos são inválidos.",
        MessageKey::NotFound => "Registro não encontrado.",
        MessageKey::InvalidCredentials => "E-mail ou senha inválidos.",
        MessageKey::InvalidToken => "Token de autenticação inválido ou ausente.",
        MessageKey::SessionRevoked => "Sua sessão expirou. Faça login novamente.",
        MessageKey::Forbidden => "Você não tem acesso a este recurso.",
        MessageKey::Internal => "Ocorreu um erro inesperado.",
        MessageKey::LocationMismatch => "Seu usuário está vinculado a uma filial. Selecione a sua filial para entrar.",
        MessageKey::MustUseGeneral => "Administradores do sistema devem entrar pelo acesso geral.",
        MessageKey::WrongBranch => "Você não tem acesso a esta filial.",
    }
}

fn en(key: MessageKey) -> &'static str {
    match key {
        MessageKey::ValidationFailed => "One or more fields are invalid.",
        MessageKey::NotFound => "Record not found.",
        MessageKey::InvalidCredentials => "Invalid e-mail or password.",
        MessageKey::InvalidToken => "Missing or invalid authentication token.",
        MessageKey::SessionRevoked => "Your session has ended. Please sign in again.",
        MessageKey::Forbidden => "You do not have access to this resource.",
        MessageKey::Internal => "An unexpected error occurred.",
        MessageKey::LocationMismatch => "Your user is bound to a branch. Select your branch to sign in.",
        MessageKey::MustUseGeneral => "System administrators must sign in with general access.",
        MessageKey::WrongBranch => "You do not have access to this branch.",
    }
}
