// src/common/scope_filter.rs

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::scope::EffectiveScope;

/// Predicado de filial derivado de um `EffectiveScope`.
///
/// Todas as consultas de domínio passam por aqui antes de tocar no banco.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchPredicate {
    /// `branch_id = $id`
    Equals(Uuid),
    /// `branch_id IS NOT NULL` (agregados: dados sem filial não contam como "todas")
    NotNull,
    /// Sem restrição de filial (listagens consolidadas)
    Any,
}

impl BranchPredicate {
    /// Para listagens: no consolidado, linhas sem filial continuam visíveis.
    pub fn for_read(scope: &EffectiveScope) -> Self {
        scope.branch_id().map_or(BranchPredicate::Any, BranchPredicate::Equals)
    }

    /// Para totais verdadeiros: no consolidado, exige filial preenchida.
    pub fn for_aggregate(scope: &EffectiveScope) -> Self {
        scope.branch_id().map_or(BranchPredicate::NotNull, BranchPredicate::Equals)
    }

    /// Acrescenta ` AND <coluna> ...` a uma consulta em construção.
    pub fn push_to(&self, qb: &mut QueryBuilder<'_, Postgres>, column: &str) {
        match self {
            BranchPredicate::Equals(id) => {
                qb.push(" AND ").push(column).push(" = ").push_bind(*id);
            }
            BranchPredicate::NotNull => {
                qb.push(" AND ").push(column).push(" IS NOT NULL");
            }
            BranchPredicate::Any => {}
        }
    }

    /// Avalia o predicado em memória.
    pub fn matches(&self, row_branch: Option<Uuid>) -> bool {
        match self {
            BranchPredicate::Equals(id) => row_branch == Some(*id),
            BranchPredicate::NotNull => row_branch.is_some(),
            BranchPredicate::Any => true,
        }
    }
}
