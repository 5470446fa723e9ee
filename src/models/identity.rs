// src/models/identity.rs

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

// ---
// 1. Branch (A "Filial")
// ---
// Exatamente uma filial por empresa é a matriz (is_head).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: Uuid,
    pub company_id: Uuid,
    #[schema(example = "Matriz")]
    pub name: String,
    pub is_head: bool,
    pub is_active: bool,
}

/// Matriz primeiro, depois alfabética (sem diferenciar maiúsculas).
pub fn head_first_order(a_is_head: bool, a_name: &str, b_is_head: bool, b_name: &str) -> Ordering {
    b_is_head
        .cmp(&a_is_head)
        .then_with(|| a_name.to_lowercase().cmp(&b_name.to_lowercase()))
        .then_with(|| a_name.cmp(b_name))
}

impl Branch {
    /// Ordem de exibição das filiais; o id só desempata nomes idênticos.
    pub fn display_order(a: &Branch, b: &Branch) -> Ordering {
        head_first_order(a.is_head, &a.name, b.is_head, &b.name).then_with(|| a.id.cmp(&b.id))
    }
}

// ---
// 2. Role (O "Cargo")
// ---
// Cargos desconhecidos são preservados como `Other` e não dão acesso especial.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    SuperAdmin,
    Admin,
    Manager,
    Supervisor,
    Technician,
    WarehouseClerk,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::SuperAdmin => "superadmin",
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Supervisor => "supervisor",
            Role::Technician => "technician",
            Role::WarehouseClerk => "warehouse-clerk",
            Role::Other(name) => name,
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "superadmin" => Role::SuperAdmin,
            "admin" => Role::Admin,
            "manager" => Role::Manager,
            "supervisor" => Role::Supervisor,
            "technician" => Role::Technician,
            "warehouse-clerk" | "warehouse_clerk" => Role::WarehouseClerk,
            other => Role::Other(other.to_string()),
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---
// 3. UserIdentity (Os "fatos" de acesso de um usuário)
// ---

/// Como o usuário enxerga os dados da empresa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", content = "branchId", rename_all = "camelCase")]
pub enum Access {
    /// Superadmin ou diretor: pode ver todas as filiais.
    Consolidated,
    /// Qualquer outro usuário: preso à filial atribuída.
    BranchBound(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    user_id: Uuid,
    company_id: Uuid,
    #[schema(value_type = Vec<String>, example = json!(["technician"]))]
    roles: Vec<Role>,
    assigned_branch_id: Option<Uuid>,
    is_team_lead: bool,
    access: Access,
}

impl UserIdentity {
    /// Monta a identidade e classifica o acesso.
    ///
    /// Falha com `UnassignedUser` quando um usuário que não é superadmin nem
    /// diretor não tem filial: ele não pode ser resolvido para nenhum escopo.
    pub fn new(
        user_id: Uuid,
        company_id: Uuid,
        roles: Vec<Role>,
        assigned_branch_id: Option<Uuid>,
        is_team_lead: bool,
    ) -> Result<Self, AppError> {
        let is_super_admin = roles.contains(&Role::SuperAdmin);
        let is_director = !is_super_admin
            && assigned_branch_id.is_none()
            && roles.iter().any(|r| matches!(r, Role::Manager | Role::Admin));

        let access = if is_super_admin || is_director {
            if is_super_admin && assigned_branch_id.is_some() {
                tracing::warn!(%user_id, "Superadmin com filial atribuída; a filial será ignorada.");
            }
            Access::Consolidated
        } else {
            match assigned_branch_id {
                Some(branch_id) => Access::BranchBound(branch_id),
                None => return Err(AppError::UnassignedUser),
            }
        };

        Ok(Self {
            user_id,
            company_id,
            roles,
            assigned_branch_id,
            is_team_lead,
            access,
        })
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn company_id(&self) -> Uuid {
        self.company_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn assigned_branch_id(&self) -> Option<Uuid> {
        self.assigned_branch_id
    }

    pub fn is_team_lead(&self) -> bool {
        self.is_team_lead
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    pub fn is_super_admin(&self) -> bool {
        self.has_role(&Role::SuperAdmin)
    }

    pub fn has_management_role(&self) -> bool {
        self.has_role(&Role::Manager) || self.has_role(&Role::Admin)
    }

    /// Gerente/admin sem filial e que não é superadmin.
    pub fn is_director(&self) -> bool {
        self.has_management_role() && self.assigned_branch_id.is_none() && !self.is_super_admin()
    }

    /// Pode usar o acesso geral (todas as filiais) e trocar de filial na sessão.
    pub fn is_consolidated_eligible(&self) -> bool {
        self.access == Access::Consolidated
    }
}
