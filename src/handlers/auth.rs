// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        i18n::message,
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, scope::RequestScope},
    models::{
        auth::{AuthResponse, Credentials, LoginUserPayload},
        identity::UserIdentity,
        scope::{EffectiveScope, HierarchyLevel},
    },
    services::{
        auth::AuthProvider,
        login_gate::LoginOutcome,
        scope_service::hierarchy_level,
    },
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    #[serde(flatten)]
    pub identity: UserIdentity,
    pub hierarchy_level: HierarchyLevel,
    pub scope: EffectiveScope,
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Login aceito; token e escopo resolvido", body = AuthResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 401, description = "Credenciais inválidas"),
        (status = 403, description = "Local de login não permitido para o usuário")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<LoginUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let credentials = Credentials::from(&payload);

    let outcome = app_state
        .login_gate
        .validate_login(&credentials, payload.location)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    match outcome {
        LoginOutcome::Accepted { session, scope } => Ok((
            StatusCode::OK,
            Json(AuthResponse { token: session.token, scope }),
        )),
        // A sessão já foi revogada pelo portão; o cliente volta a ficar deslogado
        LoginOutcome::Rejected(reason) => Err(ApiError {
            status: StatusCode::FORBIDDEN,
            error: message(&locale, reason.message_key()).to_string(),
            details: Some(json!({ "reason": reason })),
        }),
    }
}

// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses(
        (status = 204, description = "Sessão revogada"),
        (status = 401, description = "Não autorizado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn logout(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .auth_service
        .revoke(user.session_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    tracing::info!(user_id = %user.identity.user_id(), "Logout.");
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/users/me
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Identidade, nível hierárquico e escopo atual", body = MeResponse),
        (status = 401, description = "Não autorizado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_me(
    user: AuthenticatedUser,
    RequestScope(scope): RequestScope,
) -> Json<MeResponse> {
    Json(MeResponse {
        hierarchy_level: hierarchy_level(&user.identity),
        identity: user.identity,
        scope,
    })
}
