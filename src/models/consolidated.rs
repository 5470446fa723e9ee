// src/models/consolidated.rs

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

// Contagem de ordens de serviço por status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrderCounts {
    pub open: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
}

impl ServiceOrderCounts {
    pub fn total(&self) -> i64 {
        self.open + self.in_progress + self.completed + self.cancelled
    }
}

impl AddAssign for ServiceOrderCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.open += rhs.open;
        self.in_progress += rhs.in_progress;
        self.completed += rhs.completed;
        self.cancelled += rhs.cancelled;
    }
}

/// Pacote de métricas de uma filial (ou o total geral).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricBundle {
    pub product_count: i64,
    #[schema(example = "1500.50")]
    pub stock_value: Decimal,
    pub headcount: i64,
    pub vehicle_count: i64,
    pub service_orders: ServiceOrderCounts,
    pub active_projects: i64,
}

impl MetricBundle {
    pub fn is_zero(&self) -> bool {
        *self == MetricBundle::default()
    }
}

// Soma simples, métrica a métrica, sem pesos
impl AddAssign for MetricBundle {
    fn add_assign(&mut self, rhs: Self) {
        self.product_count += rhs.product_count;
        self.stock_value += rhs.stock_value;
        self.headcount += rhs.headcount;
        self.vehicle_count += rhs.vehicle_count;
        self.service_orders += rhs.service_orders;
        self.active_projects += rhs.active_projects;
    }
}

impl Add for MetricBundle {
    type Output = MetricBundle;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl Sum for MetricBundle {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(MetricBundle::default(), Add::add)
    }
}

impl<'a> Sum<&'a MetricBundle> for MetricBundle {
    fn sum<I: Iterator<Item = &'a MetricBundle>>(iter: I) -> Self {
        iter.cloned().sum()
    }
}

// Entrada do agregador: uma linha por filial ativa
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchMetrics {
    pub branch_id: Uuid,
    pub branch_name: String,
    pub is_head: bool,
    pub metrics: MetricBundle,
}

// Saída: linha por filial, marcada com is_head
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedRow {
    pub branch_id: Uuid,
    pub branch_name: String,
    pub is_head: bool,
    #[serde(flatten)]
    pub metrics: MetricBundle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedOverview {
    pub rows: Vec<ConsolidatedRow>,
    pub totals: MetricBundle,
}
