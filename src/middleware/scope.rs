// src/middleware/scope.rs

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::scope::EffectiveScope,
};

/// Escopo efetivo da requisição, resolvido uma única vez.
///
/// Os handlers recebem o valor e o repassam às consultas; nada lê
/// "filial atual" de estado compartilhado.
#[derive(Debug, Clone, Copy)]
pub struct RequestScope(pub EffectiveScope);

impl<S> FromRequestParts<S> for RequestScope
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_request_parts(parts, state).await.unwrap_or_default();

        // A. Usuário (colocado pelo auth_guard)
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        // B. Seleção gravada + vínculo -> escopo
        let scope = app_state
            .scope_service
            .current_scope(&user.identity)
            .await
            .map_err(|e| e.to_api_error(&locale))?;

        Ok(RequestScope(scope))
    }
}
