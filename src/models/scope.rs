// src/models/scope.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Fronteira de visibilidade aplicada a uma requisição. Nunca é persistida.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", content = "branchId", rename_all = "camelCase")]
pub enum EffectiveScope {
    SingleBranch(Uuid),
    AllBranches,
}

impl EffectiveScope {
    pub fn branch_id(&self) -> Option<Uuid> {
        match self {
            EffectiveScope::SingleBranch(id) => Some(*id),
            EffectiveScope::AllBranches => None,
        }
    }
}

/// Seleção de filial gravada por usuário ("nenhuma" = consolidado).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<Uuid>", into = "Option<Uuid>")]
pub enum ScopeSelection {
    #[default]
    Consolidated,
    Branch(Uuid),
}

impl From<Option<Uuid>> for ScopeSelection {
    fn from(value: Option<Uuid>) -> Self {
        match value {
            Some(id) => ScopeSelection::Branch(id),
            None => ScopeSelection::Consolidated,
        }
    }
}

impl From<ScopeSelection> for Option<Uuid> {
    fn from(selection: ScopeSelection) -> Self {
        match selection {
            ScopeSelection::Branch(id) => Some(id),
            ScopeSelection::Consolidated => None,
        }
    }
}

/// Nível hierárquico (escolhe variações de dashboard e relatórios).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HierarchyLevel {
    Technician,
    Supervisor,
    Manager,
    Director,
}

/// Local escolhido na tela de login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", content = "branchId", rename_all = "camelCase")]
pub enum LoginLocation {
    /// Acesso geral / matriz (todas as filiais).
    General,
    Branch(Uuid),
}
