// src/services/consolidated_service.rs

use std::sync::Arc;

use crate::{
    common::{error::AppError, scope_filter::BranchPredicate},
    db::{BranchDirectory, BranchMetricsSource},
    models::{
        consolidated::{BranchMetrics, ConsolidatedOverview, ConsolidatedRow, MetricBundle},
        identity::{head_first_order, UserIdentity},
        scope::EffectiveScope,
    },
};

/// Junta as métricas por filial: linhas ordenadas (matriz primeiro, depois
/// alfabética) e um total geral somando cada métrica.
///
/// Linhas zeradas continuam na lista para o total bater com as linhas.
/// Linhas repetidas da mesma filial são somadas numa só.
pub fn aggregate(per_branch: Vec<BranchMetrics>) -> ConsolidatedOverview {
    let mut merged: Vec<BranchMetrics> = Vec::with_capacity(per_branch.len());

    for row in per_branch {
        match merged.iter_mut().find(|existing| existing.branch_id == row.branch_id) {
            Some(existing) => {
                existing.metrics += row.metrics;
                existing.is_head |= row.is_head;
            }
            None => merged.push(row),
        }
    }

    merged.sort_by(|a, b| {
        head_first_order(a.is_head, &a.branch_name, b.is_head, &b.branch_name)
            .then_with(|| a.branch_id.cmp(&b.branch_id))
    });

    let totals: MetricBundle = merged.iter().map(|row| &row.metrics).sum();

    let rows = merged
        .into_iter()
        .map(|row| ConsolidatedRow {
            branch_id: row.branch_id,
            branch_name: row.branch_name,
            is_head: row.is_head,
            metrics: row.metrics,
        })
        .collect();

    ConsolidatedOverview { rows, totals }
}

#[derive(Clone)]
pub struct ConsolidatedService {
    directory: Arc<dyn BranchDirectory>,
    metrics: Arc<dyn BranchMetricsSource>,
}

impl ConsolidatedService {
    pub fn new(directory: Arc<dyn BranchDirectory>, metrics: Arc<dyn BranchMetricsSource>) -> Self {
        Self { directory, metrics }
    }

    /// Visão consolidada no escopo já resolvido da requisição.
    pub async fn overview(
        &self,
        identity: &UserIdentity,
        scope: &EffectiveScope,
    ) -> Result<ConsolidatedOverview, AppError> {
        let company_id = identity.company_id();
        let branches = self.directory.active_branches(company_id).await?;
        let mut collected = self.metrics.collect(company_id, scope).await?;

        let predicate = BranchPredicate::for_aggregate(scope);

        // Toda filial ativa no escopo ganha uma linha, mesmo sem movimento
        let per_branch: Vec<BranchMetrics> = branches
            .into_iter()
            .filter(|branch| predicate.matches(Some(branch.id)))
            .map(|branch| BranchMetrics {
                metrics: collected.remove(&branch.id).unwrap_or_default(),
                branch_id: branch.id,
                branch_name: branch.name,
                is_head: branch.is_head,
            })
            .collect();

        // Sobras são dados de filiais desativadas: não entram nem nas linhas nem no total
        if !collected.is_empty() {
            tracing::debug!(
                %company_id,
                ignored = collected.len(),
                "Métricas de filiais inativas fora da visão consolidada."
            );
        }

        Ok(aggregate(per_branch))
    }
}
