// src/db/metrics_repo.rs

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::AppError, scope_filter::BranchPredicate},
    models::{consolidated::MetricBundle, scope::EffectiveScope},
};

/// Fonte das métricas por filial usadas na visão consolidada.
#[async_trait]
pub trait BranchMetricsSource: Send + Sync {
    /// Métricas agrupadas por filial. Filiais sem nenhum dado podem faltar no mapa.
    async fn collect(
        &self,
        company_id: Uuid,
        scope: &EffectiveScope,
    ) -> Result<HashMap<Uuid, MetricBundle>, AppError>;
}

#[derive(Clone)]
pub struct MetricsRepository {
    pool: PgPool,
}

impl MetricsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Monta "SELECT ... FROM <tabela> WHERE company_id = $1 AND <filtro> [extra] GROUP BY ..."
fn scoped_query<'a>(
    select: &str,
    company_id: Uuid,
    predicate: &BranchPredicate,
    extra_filter: Option<&str>,
    group_by: &str,
) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(select);
    qb.push(" WHERE company_id = ").push_bind(company_id);
    predicate.push_to(&mut qb, "branch_id");
    if let Some(extra) = extra_filter {
        qb.push(" AND ").push(extra);
    }
    qb.push(" GROUP BY ").push(group_by);
    qb
}

#[async_trait]
impl BranchMetricsSource for MetricsRepository {
    async fn collect(
        &self,
        company_id: Uuid,
        scope: &EffectiveScope,
    ) -> Result<HashMap<Uuid, MetricBundle>, AppError> {
        // Agregado verdadeiro: no consolidado exige branch_id preenchido
        let predicate = BranchPredicate::for_aggregate(scope);
        let mut metrics: HashMap<Uuid, MetricBundle> = HashMap::new();

        // Snapshot consistente de todas as tabelas
        let mut tx = self.pool.begin().await?;

        // A. Produtos e valor em estoque
        let products: Vec<(Option<Uuid>, i64, Decimal)> = scoped_query(
            "SELECT branch_id, COUNT(*), COALESCE(SUM(quantity * unit_cost), 0) FROM products",
            company_id,
            &predicate,
            Some("is_active = true"),
            "branch_id",
        )
            .build_query_as()
            .fetch_all(&mut *tx)
            .await?;

        for (branch_id, count, value) in products {
            if let Some(id) = branch_id {
                let entry = metrics.entry(id).or_default();
                entry.product_count += count;
                entry.stock_value += value;
            }
        }

        // B. Funcionários ativos
        let employees: Vec<(Option<Uuid>, i64)> = scoped_query(
            "SELECT branch_id, COUNT(*) FROM employees",
            company_id,
            &predicate,
            Some("is_active = true"),
            "branch_id",
        )
            .build_query_as()
            .fetch_all(&mut *tx)
            .await?;

        for (branch_id, count) in employees {
            if let Some(id) = branch_id {
                metrics.entry(id).or_default().headcount += count;
            }
        }

        // C. Frota
        let vehicles: Vec<(Option<Uuid>, i64)> = scoped_query(
            "SELECT branch_id, COUNT(*) FROM vehicles",
            company_id,
            &predicate,
            Some("is_active = true"),
            "branch_id",
        )
            .build_query_as()
            .fetch_all(&mut *tx)
            .await?;

        for (branch_id, count) in vehicles {
            if let Some(id) = branch_id {
                metrics.entry(id).or_default().vehicle_count += count;
            }
        }

        // D. Ordens de serviço por status
        let orders: Vec<(Option<Uuid>, String, i64)> = scoped_query(
            "SELECT branch_id, status, COUNT(*) FROM service_orders",
            company_id,
            &predicate,
            None,
            "branch_id, status",
        )
            .build_query_as()
            .fetch_all(&mut *tx)
            .await?;

        for (branch_id, status, count) in orders {
            let Some(id) = branch_id else { continue };
            let counts = &mut metrics.entry(id).or_default().service_orders;
            match status.as_str() {
                "open" => counts.open += count,
                "in_progress" => counts.in_progress += count,
                "completed" => counts.completed += count,
                "cancelled" => counts.cancelled += count,
                other => tracing::warn!(status = other, "Status de ordem de serviço desconhecido ignorado."),
            }
        }

        // E. Obras ativas
        let projects: Vec<(Option<Uuid>, i64)> = scoped_query(
            "SELECT branch_id, COUNT(*) FROM projects",
            company_id,
            &predicate,
            Some("status = 'active'"),
            "branch_id",
        )
            .build_query_as()
            .fetch_all(&mut *tx)
            .await?;

        for (branch_id, count) in projects {
            if let Some(id) = branch_id {
                metrics.entry(id).or_default().active_projects += count;
            }
        }

        // Leitura pura: commit ou rollback tanto faz, commit é mais limpo
        tx.commit().await?;

        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_query_places_filter_before_group_by() {
        let qb = scoped_query(
            "SELECT branch_id, COUNT(*) FROM vehicles",
            Uuid::nil(),
            &BranchPredicate::NotNull,
            Some("is_active = true"),
            "branch_id",
        );
        assert_eq!(
            qb.sql(),
            "SELECT branch_id, COUNT(*) FROM vehicles WHERE company_id = $1 AND branch_id IS NOT NULL AND is_active = true GROUP BY branch_id"
        );
    }

    #[test]
    fn single_branch_binds_second_parameter() {
        let qb = scoped_query(
            "SELECT branch_id, status, COUNT(*) FROM service_orders",
            Uuid::nil(),
            &BranchPredicate::Equals(Uuid::nil()),
            None,
            "branch_id, status",
        );
        assert!(qb.sql().contains("AND branch_id = $2 GROUP BY branch_id, status"));
    }
}
