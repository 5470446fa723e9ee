// Common test utilities for integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use branch_access::common::error::AppError;
use branch_access::common::scope_filter::BranchPredicate;
use branch_access::db::{BranchDirectory, BranchMetricsSource, ScopeSelectionStore};
use branch_access::models::auth::{AuthSession, Credentials};
use branch_access::models::consolidated::MetricBundle;
use branch_access::models::identity::{Branch, Role, UserIdentity};
use branch_access::models::scope::{EffectiveScope, ScopeSelection};
use branch_access::services::auth::AuthProvider;
use branch_access::services::consolidated_service::ConsolidatedService;
use branch_access::services::login_gate::LoginGate;
use branch_access::services::scope_service::ScopeService;

pub const PASSWORD: &str = "senha-forte";

// ---
// Provedor de autenticação em memória
// ---
#[derive(Debug, Clone)]
pub struct FakeSession {
    pub user_id: Uuid,
    pub revoked: bool,
}

#[derive(Default)]
pub struct FakeAuth {
    accounts: Mutex<HashMap<String, Uuid>>,
    pub sessions: Mutex<HashMap<Uuid, FakeSession>>,
    revoke_delay: Mutex<Duration>,
    failing_revokes: AtomicU32,
}

impl FakeAuth {
    pub fn add_account(&self, email: &str, user_id: Uuid) {
        self.accounts.lock().unwrap().insert(email.to_string(), user_id);
    }

    pub fn set_revoke_delay(&self, delay: Duration) {
        *self.revoke_delay.lock().unwrap() = delay;
    }

    /// As próximas `n` revogações falham antes de funcionar.
    pub fn fail_next_revokes(&self, n: u32) {
        self.failing_revokes.store(n, Ordering::SeqCst);
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn is_revoked(&self, session_id: Uuid) -> bool {
        self.sessions
            .lock()
            .unwrap()
            .get(&session_id)
            .map(|s| s.revoked)
            .unwrap_or(false)
    }

    /// Simula uma consulta protegida feita com o token.
    pub fn authorize_token(&self, token: &str) -> Result<Uuid, AppError> {
        let session_id = token
            .strip_prefix("token-")
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .ok_or(AppError::InvalidToken)?;

        match self.sessions.lock().unwrap().get(&session_id) {
            Some(session) if !session.revoked => Ok(session.user_id),
            Some(_) => Err(AppError::SessionRevoked),
            None => Err(AppError::InvalidToken),
        }
    }

    /// Última sessão emitida (só há uma por teste, na prática).
    pub fn only_session(&self) -> (Uuid, FakeSession) {
        let sessions = self.sessions.lock().unwrap();
        assert_eq!(sessions.len(), 1, "esperava exatamente uma sessão emitida");
        let (id, session) = sessions.iter().next().unwrap();
        (*id, session.clone())
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Option<AuthSession>, AppError> {
        let user_id = match self.accounts.lock().unwrap().get(&credentials.email) {
            Some(id) if credentials.password == PASSWORD => *id,
            _ => return Ok(None),
        };

        let session_id = Uuid::new_v4();
        self.sessions
            .lock()
            .unwrap()
            .insert(session_id, FakeSession { user_id, revoked: false });

        Ok(Some(AuthSession {
            session_id,
            user_id,
            token: format!("token-{session_id}"),
        }))
    }

    async fn revoke(&self, session_id: Uuid) -> Result<(), AppError> {
        let delay = *self.revoke_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let failing = self
            .failing_revokes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(AppError::InternalServerError(anyhow::anyhow!("provedor indisponível")));
        }

        if let Some(session) = self.sessions.lock().unwrap().get_mut(&session_id) {
            session.revoked = true;
        }
        Ok(())
    }
}

// ---
// Diretório em memória
// ---
#[derive(Debug, Clone)]
pub struct FakeUser {
    pub company_id: Uuid,
    pub roles: Vec<Role>,
    pub branch_id: Option<Uuid>,
    pub is_active: bool,
    pub is_team_lead: bool,
}

#[derive(Default)]
pub struct FakeDirectory {
    pub branches: Mutex<Vec<Branch>>,
    pub companies: Mutex<Vec<Uuid>>,
    pub users: Mutex<HashMap<Uuid, FakeUser>>,
    lookup_delay: Mutex<Duration>,
}

impl FakeDirectory {
    /// Atrasa a busca de identidade (simula um banco lento).
    pub fn set_lookup_delay(&self, delay: Duration) {
        *self.lookup_delay.lock().unwrap() = delay;
    }

    pub fn deactivate_branch(&self, branch_id: Uuid) {
        if let Some(branch) = self.branches.lock().unwrap().iter_mut().find(|b| b.id == branch_id) {
            branch.is_active = false;
        }
    }
}

#[async_trait]
impl BranchDirectory for FakeDirectory {
    async fn active_branches(&self, company_id: Uuid) -> Result<Vec<Branch>, AppError> {
        if !self.companies.lock().unwrap().contains(&company_id) {
            return Err(AppError::NotFound("company"));
        }

        let mut branches: Vec<Branch> = self
            .branches
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.company_id == company_id && b.is_active)
            .cloned()
            .collect();
        branches.sort_by(Branch::display_order);
        Ok(branches)
    }

    async fn user_identity(&self, user_id: Uuid) -> Result<UserIdentity, AppError> {
        let delay = *self.lookup_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let user = self
            .users
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .ok_or(AppError::NotFound("user"))?;

        if !user.is_active {
            return Err(AppError::Inactive);
        }

        if let Some(branch_id) = user.branch_id {
            let branch_active = self
                .branches
                .lock()
                .unwrap()
                .iter()
                .find(|b| b.id == branch_id)
                .map(|b| b.is_active)
                .ok_or(AppError::NotFound("branch"))?;
            if !branch_active {
                return Err(AppError::Inactive);
            }
        }

        UserIdentity::new(user_id, user.company_id, user.roles, user.branch_id, user.is_team_lead)
    }
}

// ---
// Seleções em memória
// ---
#[derive(Default)]
pub struct FakeSelections {
    pub stored: Mutex<HashMap<Uuid, ScopeSelection>>,
    pub fail_saves: Mutex<bool>,
}

impl FakeSelections {
    pub fn get(&self, user_id: Uuid) -> Option<ScopeSelection> {
        self.stored.lock().unwrap().get(&user_id).copied()
    }
}

#[async_trait]
impl ScopeSelectionStore for FakeSelections {
    async fn load(&self, user_id: Uuid) -> Result<ScopeSelection, AppError> {
        Ok(self.get(user_id).unwrap_or_default())
    }

    async fn save(&self, user_id: Uuid, selection: ScopeSelection) -> Result<(), AppError> {
        if *self.fail_saves.lock().unwrap() {
            return Err(AppError::InternalServerError(anyhow::anyhow!("banco fora do ar")));
        }
        self.stored.lock().unwrap().insert(user_id, selection);
        Ok(())
    }
}

// ---
// Métricas em memória: uma linha por registro de domínio
// ---
#[derive(Default)]
pub struct FakeMetrics {
    pub rows: Mutex<Vec<(Uuid, Option<Uuid>, MetricBundle)>>,
}

impl FakeMetrics {
    pub fn push(&self, company_id: Uuid, branch_id: Option<Uuid>, bundle: MetricBundle) {
        self.rows.lock().unwrap().push((company_id, branch_id, bundle));
    }
}

#[async_trait]
impl BranchMetricsSource for FakeMetrics {
    async fn collect(
        &self,
        company_id: Uuid,
        scope: &EffectiveScope,
    ) -> Result<HashMap<Uuid, MetricBundle>, AppError> {
        let predicate = BranchPredicate::for_aggregate(scope);
        let mut out: HashMap<Uuid, MetricBundle> = HashMap::new();

        for (row_company, branch_id, bundle) in self.rows.lock().unwrap().iter() {
            if *row_company != company_id || !predicate.matches(*branch_id) {
                continue;
            }
            if let Some(id) = branch_id {
                *out.entry(*id).or_default() += bundle.clone();
            }
        }
        Ok(out)
    }
}

// ---
// Mundo de teste: empresa T com Matriz (H) e Norte (N)
// ---
pub struct World {
    pub auth: Arc<FakeAuth>,
    pub directory: Arc<FakeDirectory>,
    pub selections: Arc<FakeSelections>,
    pub metrics: Arc<FakeMetrics>,
    pub company: Uuid,
    pub head: Uuid,
    pub north: Uuid,
    /// Filial desativada da mesma empresa
    pub closed: Uuid,
    /// Filial de outra empresa
    pub foreign: Uuid,
    pub technician: Uuid,
    pub director: Uuid,
    pub superadmin: Uuid,
    pub supervisor: Uuid,
    pub inactive: Uuid,
}

fn branch(company_id: Uuid, name: &str, is_head: bool, is_active: bool) -> Branch {
    Branch {
        id: Uuid::new_v4(),
        company_id,
        name: name.to_string(),
        is_head,
        is_active,
    }
}

impl World {
    pub fn new() -> Self {
        let company = Uuid::new_v4();
        let other_company = Uuid::new_v4();

        let head = branch(company, "Matriz", true, true);
        let north = branch(company, "Norte", false, true);
        let closed = branch(company, "Antiga Sul", false, false);
        let foreign = branch(other_company, "Outra Matriz", true, true);

        let directory = Arc::new(FakeDirectory::default());
        directory.companies.lock().unwrap().extend([company, other_company]);
        directory
            .branches
            .lock()
            .unwrap()
            .extend([head.clone(), north.clone(), closed.clone(), foreign.clone()]);

        let auth = Arc::new(FakeAuth::default());

        let mut world = Self {
            auth,
            directory,
            selections: Arc::new(FakeSelections::default()),
            metrics: Arc::new(FakeMetrics::default()),
            company,
            head: head.id,
            north: north.id,
            closed: closed.id,
            foreign: foreign.id,
            technician: Uuid::nil(),
            director: Uuid::nil(),
            superadmin: Uuid::nil(),
            supervisor: Uuid::nil(),
            inactive: Uuid::nil(),
        };

        world.technician = world.add_user("x@t.com", vec![Role::Technician], Some(north.id), true);
        world.director = world.add_user("y@t.com", vec![Role::Manager], None, true);
        world.superadmin = world.add_user("z@t.com", vec![Role::SuperAdmin], None, true);
        world.supervisor = world.add_user("s@t.com", vec![Role::Supervisor], Some(head.id), true);
        world.inactive = world.add_user("old@t.com", vec![Role::Technician], Some(north.id), false);

        world
    }

    pub fn add_user(&self, email: &str, roles: Vec<Role>, branch_id: Option<Uuid>, is_active: bool) -> Uuid {
        let user_id = Uuid::new_v4();
        self.directory.users.lock().unwrap().insert(
            user_id,
            FakeUser {
                company_id: self.company,
                roles,
                branch_id,
                is_active,
                is_team_lead: false,
            },
        );
        self.auth.add_account(email, user_id);
        user_id
    }

    pub fn gate(&self) -> LoginGate {
        LoginGate::new(self.auth.clone(), self.directory.clone(), self.selections.clone())
    }

    pub fn scope_service(&self) -> ScopeService {
        ScopeService::new(self.directory.clone(), self.selections.clone())
    }

    pub fn consolidated_service(&self) -> ConsolidatedService {
        ConsolidatedService::new(self.directory.clone(), self.metrics.clone())
    }

    pub async fn identity(&self, user_id: Uuid) -> UserIdentity {
        self.directory.user_identity(user_id).await.unwrap()
    }
}

pub fn credentials(email: &str) -> Credentials {
    Credentials {
        email: email.to_string(),
        password: PASSWORD.to_string(),
    }
}
