// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        BranchDirectory, BranchMetricsSource, DirectoryRepository, MetricsRepository,
        ScopeSelectionRepository, ScopeSelectionStore, SessionRepository, UserRepository,
    },
    services::{
        auth::AuthService, consolidated_service::ConsolidatedService, login_gate::LoginGate,
        scope_service::ScopeService,
    },
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 3;
const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;

/// Configuração lida do ambiente (ou do arquivo .env).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub session_ttl: chrono::Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de uma função de busca (testável sem mexer no ambiente).
    pub fn from_vars<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        if jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET não pode ser vazio");
        }

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw.parse().context("DB_MAX_CONNECTIONS inválido")?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let acquire_secs: u64 = match lookup("DB_ACQUIRE_TIMEOUT_SECS") {
            Some(raw) => raw.parse().context("DB_ACQUIRE_TIMEOUT_SECS inválido")?,
            None => DEFAULT_ACQUIRE_TIMEOUT_SECS,
        };

        let ttl_hours: i64 = match lookup("SESSION_TTL_HOURS") {
            Some(raw) => raw.parse().context("SESSION_TTL_HOURS inválido")?,
            None => DEFAULT_SESSION_TTL_HOURS,
        };
        if ttl_hours <= 0 {
            anyhow::bail!("SESSION_TTL_HOURS deve ser positivo");
        }

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            db_max_connections,
            db_acquire_timeout: Duration::from_secs(acquire_secs),
            session_ttl: chrono::Duration::hours(ttl_hours),
        })
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub login_gate: LoginGate,
    pub scope_service: ScopeService,
    pub consolidated_service: ConsolidatedService,
    pub directory: Arc<dyn BranchDirectory>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout)
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_pool(db_pool, config))
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_pool(db_pool: PgPool, config: Config) -> Self {
        let auth_service = AuthService::new(
            UserRepository::new(db_pool.clone()),
            SessionRepository::new(db_pool.clone()),
            config.jwt_secret.clone(),
            config.session_ttl,
        );

        let directory: Arc<dyn BranchDirectory> = Arc::new(DirectoryRepository::new(db_pool.clone()));
        let selections: Arc<dyn ScopeSelectionStore> =
            Arc::new(ScopeSelectionRepository::new(db_pool.clone()));
        let metrics: Arc<dyn BranchMetricsSource> = Arc::new(MetricsRepository::new(db_pool.clone()));

        let login_gate = LoginGate::new(
            Arc::new(auth_service.clone()),
            Arc::clone(&directory),
            Arc::clone(&selections),
        );
        let scope_service = ScopeService::new(Arc::clone(&directory), selections);
        let consolidated_service = ConsolidatedService::new(Arc::clone(&directory), metrics);

        Self {
            db_pool,
            config: Arc::new(config),
            auth_service,
            login_gate,
            scope_service,
            consolidated_service,
            directory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_are_applied() {
        let config = Config::from_vars(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/filiais"),
            ("JWT_SECRET", "segredo"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.db_acquire_timeout, Duration::from_secs(3));
        assert_eq!(config.session_ttl, chrono::Duration::days(7));
    }

    #[test]
    fn missing_secret_fails() {
        let result = Config::from_vars(lookup_from(&[("DATABASE_URL", "postgres://localhost/filiais")]));
        assert!(result.is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_vars(lookup_from(&[
            ("DATABASE_URL", "postgres://db/filiais"),
            ("JWT_SECRET", "segredo"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("DB_MAX_CONNECTIONS", "20"),
            ("SESSION_TTL_HOURS", "12"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.db_max_connections, 20);
        assert_eq!(config.session_ttl, chrono::Duration::hours(12));
    }

    #[tokio::test]
    async fn state_keeps_the_loaded_config() {
        let config = Config::from_vars(lookup_from(&[
            ("DATABASE_URL", "postgres://db/filiais"),
            ("JWT_SECRET", "segredo"),
            ("BIND_ADDR", "127.0.0.1:8080"),
        ]))
        .unwrap();

        // Pool preguiçoso: nenhuma conexão é aberta até a primeira consulta
        let pool = PgPoolOptions::new().connect_lazy(&config.database_url).unwrap();
        let state = AppState::from_pool(pool, config);

        assert_eq!(state.config.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn invalid_number_fails() {
        let result = Config::from_vars(lookup_from(&[
            ("DATABASE_URL", "postgres://db/filiais"),
            ("JWT_SECRET", "segredo"),
            ("DB_MAX_CONNECTIONS", "muitas"),
        ]))
        .unwrap_err();
        assert!(result.to_string().contains("DB_MAX_CONNECTIONS"));
    }
}
