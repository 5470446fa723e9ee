// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::logout,

        // --- Users ---
        handlers::auth::get_me,

        // --- Scope ---
        handlers::scope::get_scope,
        handlers::scope::switch_scope,
        handlers::scope::list_branches,

        // --- Overview ---
        handlers::overview::consolidated,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            handlers::auth::MeResponse,

            // --- Identity ---
            models::identity::Branch,
            models::identity::Access,
            models::identity::UserIdentity,

            // --- Scope ---
            models::scope::EffectiveScope,
            models::scope::LoginLocation,
            models::scope::HierarchyLevel,
            handlers::scope::SwitchBranchPayload,
            handlers::scope::ScopeResponse,

            // --- Overview ---
            models::consolidated::ServiceOrderCounts,
            models::consolidated::MetricBundle,
            models::consolidated::ConsolidatedRow,
            models::consolidated::ConsolidatedOverview,
        )
    ),
    tags(
        (name = "Auth", description = "Login com escolha de local e logout"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "Scope", description = "Filial da sessão e lista de filiais"),
        (name = "Overview", description = "Visão consolidada por filial")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
