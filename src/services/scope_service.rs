// src/services/scope_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BranchDirectory, ScopeSelectionStore},
    models::{
        identity::{Access, Branch, Role, UserIdentity},
        scope::{EffectiveScope, HierarchyLevel, ScopeSelection},
    },
};

/// Resolve o escopo efetivo. Pura e determinística.
///
/// Superadmin/diretor: a seleção da sessão pode estreitar para uma filial.
/// Usuário vinculado: sempre a própria filial, qualquer que seja a seleção.
pub fn resolve_scope(identity: &UserIdentity, selection: ScopeSelection) -> EffectiveScope {
    match identity.access() {
        Access::Consolidated => match selection {
            ScopeSelection::Branch(branch_id) => EffectiveScope::SingleBranch(branch_id),
            ScopeSelection::Consolidated => EffectiveScope::AllBranches,
        },
        Access::BranchBound(branch_id) => EffectiveScope::SingleBranch(branch_id),
    }
}

pub fn hierarchy_level(identity: &UserIdentity) -> HierarchyLevel {
    if identity.is_director() || identity.is_super_admin() {
        HierarchyLevel::Director
    } else if identity.has_management_role() {
        HierarchyLevel::Manager
    } else if identity.has_role(&Role::Supervisor) || identity.is_team_lead() {
        HierarchyLevel::Supervisor
    } else {
        HierarchyLevel::Technician
    }
}

/// A seleção gravada contradiz o vínculo de um usuário preso a uma filial.
pub fn is_stale_selection(identity: &UserIdentity, selection: ScopeSelection) -> bool {
    match identity.access() {
        Access::BranchBound(branch_id) => selection != ScopeSelection::Branch(branch_id),
        Access::Consolidated => false,
    }
}

/// Filtrar não protege escritas: toda mutação revalida a filial da linha alvo.
pub fn ensure_writable(identity: &UserIdentity, row_branch: Option<Uuid>) -> Result<(), AppError> {
    match identity.access() {
        Access::Consolidated => Ok(()),
        Access::BranchBound(branch_id) if row_branch == Some(branch_id) => Ok(()),
        Access::BranchBound(_) => Err(AppError::Forbidden),
    }
}

#[derive(Clone)]
pub struct ScopeService {
    directory: Arc<dyn BranchDirectory>,
    selections: Arc<dyn ScopeSelectionStore>,
}

impl ScopeService {
    pub fn new(directory: Arc<dyn BranchDirectory>, selections: Arc<dyn ScopeSelectionStore>) -> Self {
        Self { directory, selections }
    }

    /// Escopo da requisição atual, calculado uma vez e passado adiante.
    pub async fn current_scope(&self, identity: &UserIdentity) -> Result<EffectiveScope, AppError> {
        let selection = self.selections.load(identity.user_id()).await?;

        if is_stale_selection(identity, selection) {
            // Não é erro: o resolvedor já ignora a seleção divergente
            tracing::debug!(
                user_id = %identity.user_id(),
                ?selection,
                "Seleção de filial desatualizada ignorada."
            );
        }

        // Filial escolhida que deixou de estar ativa volta para o consolidado
        let selection = match (identity.access(), selection) {
            (Access::Consolidated, ScopeSelection::Branch(branch_id)) => {
                let branches = self.directory.active_branches(identity.company_id()).await?;
                if branches.iter().any(|b| b.id == branch_id) {
                    selection
                } else {
                    tracing::debug!(
                        user_id = %identity.user_id(),
                        %branch_id,
                        "Filial selecionada não está mais ativa; usando todas as filiais."
                    );
                    ScopeSelection::Consolidated
                }
            }
            _ => selection,
        };

        Ok(resolve_scope(identity, selection))
    }

    /// Troca de filial na sessão (somente superadmin/diretor).
    pub async fn switch_branch(
        &self,
        identity: &UserIdentity,
        selection: ScopeSelection,
    ) -> Result<EffectiveScope, AppError> {
        if !identity.is_consolidated_eligible() {
            return Err(AppError::Forbidden);
        }

        if let ScopeSelection::Branch(branch_id) = selection {
            let branches = self.directory.active_branches(identity.company_id()).await?;
            if !branches.iter().any(|b| b.id == branch_id) {
                return Err(AppError::NotFound("branch"));
            }
        }

        self.selections.save(identity.user_id(), selection).await?;

        let scope = resolve_scope(identity, selection);
        tracing::info!(user_id = %identity.user_id(), ?scope, "Filial da sessão alterada.");
        Ok(scope)
    }

    pub async fn branches(&self, identity: &UserIdentity) -> Result<Vec<Branch>, AppError> {
        self.directory.active_branches(identity.company_id()).await
    }
}
