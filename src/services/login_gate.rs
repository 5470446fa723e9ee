// src/services/login_gate.rs

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    common::{error::AppError, i18n::MessageKey},
    db::{BranchDirectory, ScopeSelectionStore},
    models::{
        auth::{AuthSession, Credentials},
        identity::UserIdentity,
        scope::{EffectiveScope, LoginLocation, ScopeSelection},
    },
    services::{auth::AuthProvider, scope_service::resolve_scope},
};

// Tentativas de revogação antes de desistir e reportar erro
const REVOKE_ATTEMPTS: u32 = 3;
const REVOKE_BACKOFF: Duration = Duration::from_millis(50);

/// Motivo de uma rejeição de política no login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RejectReason {
    /// Usuário vinculado a uma filial tentou o acesso geral.
    LocationMismatch,
    /// Superadmin puro tentou entrar numa filial específica.
    MustUseGeneral,
    /// Filial escolhida não é a do usuário (ou não é uma filial ativa da empresa).
    WrongBranch,
}

impl RejectReason {
    pub fn message_key(&self) -> MessageKey {
        match self {
            RejectReason::LocationMismatch => MessageKey::LocationMismatch,
            RejectReason::MustUseGeneral => MessageKey::MustUseGeneral,
            RejectReason::WrongBranch => MessageKey::WrongBranch,
        }
    }
}

// ---
// Máquina de estados do login
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    CredentialsSubmitted,
    RolesFetched,
    LocationValidated,
    SessionEstablished,
    Rejected(RejectReason),
}

impl GateState {
    pub fn can_advance_to(&self, next: &GateState) -> bool {
        use GateState::*;

        matches!(
            (self, next),
            (Idle, CredentialsSubmitted)
                // credenciais inválidas: volta ao início sem sessão
                | (CredentialsSubmitted, Idle)
                | (CredentialsSubmitted, RolesFetched)
                | (RolesFetched, LocationValidated)
                | (RolesFetched, Rejected(_))
                | (LocationValidated, SessionEstablished)
                | (LocationValidated, Rejected(_))
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GateState::SessionEstablished | GateState::Rejected(_))
    }
}

/// Uma tentativa de login em andamento.
#[derive(Debug)]
pub struct LoginAttempt {
    state: GateState,
    history: Vec<GateState>,
}

impl Default for LoginAttempt {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginAttempt {
    pub fn new() -> Self {
        Self { state: GateState::Idle, history: vec![GateState::Idle] }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn history(&self) -> &[GateState] {
        &self.history
    }

    pub fn advance(&mut self, next: GateState) -> Result<(), AppError> {
        if !self.state.can_advance_to(&next) {
            return Err(AppError::InternalServerError(anyhow::anyhow!(
                "Transição de login inválida: {:?} -> {:?}",
                self.state,
                next
            )));
        }

        tracing::debug!(from = ?self.state, to = ?next, "Login avançou de estado.");
        self.state = next;
        self.history.push(next);
        Ok(())
    }
}

/// Resultado do login: aceito com escopo, ou rejeitado com motivo.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    Accepted {
        session: AuthSession,
        scope: EffectiveScope,
    },
    Rejected(RejectReason),
}

/// Regra de local de login. Pura: só olha a identidade e o local escolhido.
///
/// Devolve a seleção a ser gravada em caso de sucesso.
pub fn check_location(
    identity: &UserIdentity,
    location: LoginLocation,
) -> Result<ScopeSelection, RejectReason> {
    let is_super_admin = identity.is_super_admin();
    let is_director = identity.is_director();
    let is_general_access = is_super_admin || is_director;

    match location {
        LoginLocation::General if is_general_access => Ok(ScopeSelection::Consolidated),
        LoginLocation::General => Err(RejectReason::LocationMismatch),
        LoginLocation::Branch(_) if is_super_admin && !is_director => Err(RejectReason::MustUseGeneral),
        LoginLocation::Branch(branch_id) if !is_general_access => {
            if identity.assigned_branch_id() == Some(branch_id) {
                Ok(ScopeSelection::Branch(branch_id))
            } else {
                Err(RejectReason::WrongBranch)
            }
        }
        LoginLocation::Branch(branch_id) => Ok(ScopeSelection::Branch(branch_id)),
    }
}

#[derive(Clone)]
pub struct LoginGate {
    auth: Arc<dyn AuthProvider>,
    directory: Arc<dyn BranchDirectory>,
    selections: Arc<dyn ScopeSelectionStore>,
}

impl LoginGate {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        directory: Arc<dyn BranchDirectory>,
        selections: Arc<dyn ScopeSelectionStore>,
    ) -> Self {
        Self { auth, directory, selections }
    }

    /// Autentica, valida o local escolhido e estabelece a sessão.
    ///
    /// Qualquer saída sem sucesso depois de a sessão ter sido emitida revoga essa
    /// sessão ANTES de devolver o controle ao chamador.
    pub async fn validate_login(
        &self,
        credentials: &Credentials,
        location: LoginLocation,
    ) -> Result<LoginOutcome, AppError> {
        let mut attempt = LoginAttempt::new();
        attempt.advance(GateState::CredentialsSubmitted)?;

        let Some(session) = self.auth.sign_in(credentials).await? else {
            attempt.advance(GateState::Idle)?;
            return Err(AppError::InvalidCredentials);
        };

        // Com a sessão emitida, o resto roda numa task própria: se o chamador
        // abandonar o futuro do login, a validação (e a revogação) vai até o fim.
        let gate = self.clone();
        tokio::spawn(async move { gate.settle(attempt, session, location).await })
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de login: {}", e))?
    }

    // Decide o destino da sessão já emitida: aceita ou revoga.
    async fn settle(
        &self,
        mut attempt: LoginAttempt,
        session: AuthSession,
        location: LoginLocation,
    ) -> Result<LoginOutcome, AppError> {
        match self.authorize(&mut attempt, &session, location).await {
            Ok(Ok(scope)) => {
                tracing::info!(user_id = %session.user_id, ?scope, "✅ Login aceito.");
                Ok(LoginOutcome::Accepted { session, scope })
            }
            Ok(Err(reason)) => {
                self.revoke_with_retries(session.session_id).await?;
                tracing::warn!(user_id = %session.user_id, ?reason, "Login rejeitado; sessão revogada.");
                Ok(LoginOutcome::Rejected(reason))
            }
            Err(err) => {
                self.revoke_with_retries(session.session_id).await?;
                tracing::warn!(user_id = %session.user_id, error = %err, "Falha após autenticação; sessão revogada.");
                match err {
                    // Inativo (ou sem filial) é tratado igual a falha de autenticação
                    AppError::Inactive | AppError::UnassignedUser => Err(AppError::InvalidCredentials),
                    other => Err(other),
                }
            }
        }
    }

    // Da busca de cargos até a gravação da seleção.
    // Erro externo = falha dura; erro interno = rejeição de política.
    async fn authorize(
        &self,
        attempt: &mut LoginAttempt,
        session: &AuthSession,
        location: LoginLocation,
    ) -> Result<Result<EffectiveScope, RejectReason>, AppError> {
        // 1. Cargos e filial do usuário
        let identity = self.directory.user_identity(session.user_id).await?;
        attempt.advance(GateState::RolesFetched)?;

        // 2. Regra de local
        let selection = match check_location(&identity, location) {
            Ok(selection) => selection,
            Err(reason) => {
                attempt.advance(GateState::Rejected(reason))?;
                return Ok(Err(reason));
            }
        };
        attempt.advance(GateState::LocationValidated)?;

        // 3. A filial escolhida precisa ser uma filial ativa da empresa
        if let ScopeSelection::Branch(branch_id) = selection {
            let branches = self.directory.active_branches(identity.company_id()).await?;
            if !branches.iter().any(|b| b.id == branch_id) {
                let reason = RejectReason::WrongBranch;
                attempt.advance(GateState::Rejected(reason))?;
                return Ok(Err(reason));
            }
        }

        // 4. Grava a seleção e estabelece a sessão
        self.selections.save(identity.user_id(), selection).await?;
        attempt.advance(GateState::SessionEstablished)?;

        Ok(Ok(resolve_scope(&identity, selection)))
    }

    async fn revoke_with_retries(&self, session_id: Uuid) -> Result<(), AppError> {
        let mut last_error = None;
        for attempt in 1..=REVOKE_ATTEMPTS {
            match self.auth.revoke(session_id).await {
                Ok(()) => {
                    tracing::info!(%session_id, "Sessão revogada.");
                    return Ok(());
                }
                Err(e) => {
                    tracing::error!(%session_id, attempt, error = %e, "🔥 Falha ao revogar sessão.");
                    last_error = Some(e);
                    tokio::time::sleep(REVOKE_BACKOFF * attempt).await;
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            AppError::InternalServerError(anyhow::anyhow!("Revogação não executada"))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::identity::Role;

    fn user(roles: Vec<Role>, branch: Option<Uuid>) -> UserIdentity {
        UserIdentity::new(Uuid::new_v4(), Uuid::new_v4(), roles, branch, false).unwrap()
    }

    #[test]
    fn branch_bound_user_cannot_use_general() {
        let tech = user(vec![Role::Technician], Some(Uuid::new_v4()));
        assert_eq!(check_location(&tech, LoginLocation::General), Err(RejectReason::LocationMismatch));
    }

    #[test]
    fn branch_bound_user_must_pick_own_branch() {
        let own = Uuid::new_v4();
        let tech = user(vec![Role::Technician], Some(own));

        assert_eq!(check_location(&tech, LoginLocation::Branch(own)), Ok(ScopeSelection::Branch(own)));
        assert_eq!(
            check_location(&tech, LoginLocation::Branch(Uuid::new_v4())),
            Err(RejectReason::WrongBranch)
        );
    }

    #[test]
    fn manager_with_branch_is_treated_as_branch_bound() {
        let own = Uuid::new_v4();
        let manager = user(vec![Role::Manager], Some(own));
        assert_eq!(check_location(&manager, LoginLocation::General), Err(RejectReason::LocationMismatch));
    }

    #[test]
    fn pure_superadmin_must_use_general() {
        let admin = user(vec![Role::SuperAdmin], None);
        assert_eq!(
            check_location(&admin, LoginLocation::Branch(Uuid::new_v4())),
            Err(RejectReason::MustUseGeneral)
        );
        assert_eq!(check_location(&admin, LoginLocation::General), Ok(ScopeSelection::Consolidated));
    }

    #[test]
    fn director_may_choose_general_or_any_branch() {
        let director = user(vec![Role::Admin], None);
        let branch = Uuid::new_v4();

        assert_eq!(check_location(&director, LoginLocation::General), Ok(ScopeSelection::Consolidated));
        assert_eq!(check_location(&director, LoginLocation::Branch(branch)), Ok(ScopeSelection::Branch(branch)));
    }

    #[test]
    fn legal_transitions() {
        let mut attempt = LoginAttempt::new();
        attempt.advance(GateState::CredentialsSubmitted).unwrap();
        attempt.advance(GateState::RolesFetched).unwrap();
        attempt.advance(GateState::LocationValidated).unwrap();
        attempt.advance(GateState::SessionEstablished).unwrap();

        assert!(attempt.state().is_terminal());
        assert_eq!(attempt.history().len(), 5);
    }

    #[test]
    fn rejection_only_after_roles_are_known() {
        let rejected = GateState::Rejected(RejectReason::WrongBranch);

        assert!(!GateState::Idle.can_advance_to(&rejected));
        assert!(!GateState::CredentialsSubmitted.can_advance_to(&rejected));
        assert!(GateState::RolesFetched.can_advance_to(&rejected));
        assert!(GateState::LocationValidated.can_advance_to(&rejected));
        assert!(!GateState::SessionEstablished.can_advance_to(&rejected));
    }

    #[test]
    fn skipping_location_validation_is_illegal() {
        let mut attempt = LoginAttempt::new();
        attempt.advance(GateState::CredentialsSubmitted).unwrap();
        attempt.advance(GateState::RolesFetched).unwrap();

        assert!(attempt.advance(GateState::SessionEstablished).is_err());
        assert_eq!(attempt.state(), GateState::RolesFetched);
    }
}
