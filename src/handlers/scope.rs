// src/handlers/scope.rs

use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, scope::RequestScope},
    models::{
        identity::Branch,
        scope::{EffectiveScope, ScopeSelection},
    },
};

// Payload da troca de filial: null = todas as filiais
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwitchBranchPayload {
    #[serde(default)]
    pub branch_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScopeResponse {
    pub scope: EffectiveScope,
}

// GET /api/scope
#[utoipa::path(
    get,
    path = "/api/scope",
    tag = "Scope",
    responses(
        (status = 200, description = "Escopo efetivo da sessão", body = ScopeResponse),
        (status = 401, description = "Não autorizado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_scope(RequestScope(scope): RequestScope) -> Json<ScopeResponse> {
    Json(ScopeResponse { scope })
}

// PUT /api/scope
#[utoipa::path(
    put,
    path = "/api/scope",
    tag = "Scope",
    request_body = SwitchBranchPayload,
    responses(
        (status = 200, description = "Filial da sessão alterada", body = ScopeResponse),
        (status = 401, description = "Não autorizado"),
        (status = 403, description = "Usuário preso a uma filial"),
        (status = 404, description = "Filial não encontrada")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn switch_scope(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<SwitchBranchPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let selection = ScopeSelection::from(payload.branch_id);

    let scope = app_state
        .scope_service
        .switch_branch(&user.identity, selection)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(ScopeResponse { scope }))
}

// GET /api/branches
#[utoipa::path(
    get,
    path = "/api/branches",
    tag = "Scope",
    responses(
        (status = 200, description = "Filiais ativas, matriz primeiro", body = Vec<Branch>),
        (status = 401, description = "Não autorizado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_branches(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let branches = app_state
        .scope_service
        .branches(&user.identity)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(branches))
}
