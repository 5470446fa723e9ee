// src/handlers/overview.rs

use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, scope::RequestScope},
    // Importamos o model para referenciar no Swagger
    models::consolidated::ConsolidatedOverview,
};

// GET /api/overview/consolidated
#[utoipa::path(
    get,
    path = "/api/overview/consolidated",
    tag = "Overview",
    responses(
        (status = 200, description = "Métricas por filial e total geral no escopo atual", body = ConsolidatedOverview),
        (status = 401, description = "Não autorizado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn consolidated(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    RequestScope(scope): RequestScope,
) -> Result<impl IntoResponse, ApiError> {
    let overview = app_state
        .consolidated_service
        .overview(&user.identity, &scope)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(overview))
}
