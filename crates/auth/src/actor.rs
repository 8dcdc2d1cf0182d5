use serde::{Deserialize, Serialize};

use loomtrade_core::{ManagerId, SalesmanId};

/// Authenticated identity acting on the core.
///
/// Carries only what authorization needs. Resolved at the boundary, never
/// re-derived mid-operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Actor {
    Manager(ManagerId),
    Salesman(SalesmanId),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    Manager,
    Salesman,
}

impl Actor {
    pub fn kind(&self) -> ActorKind {
        match self {
            Actor::Manager(_) => ActorKind::Manager,
            Actor::Salesman(_) => ActorKind::Salesman,
        }
    }

    pub fn as_salesman(&self) -> Option<SalesmanId> {
        match self {
            Actor::Salesman(id) => Some(*id),
            Actor::Manager(_) => None,
        }
    }

    pub fn as_manager(&self) -> Option<ManagerId> {
        match self {
            Actor::Manager(id) => Some(*id),
            Actor::Salesman(_) => None,
        }
    }
}

impl core::fmt::Display for Actor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Actor::Manager(id) => write!(f, "manager:{id}"),
            Actor::Salesman(id) => write!(f, "salesman:{id}"),
        }
    }
}

impl core::fmt::Display for ActorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            ActorKind::Manager => "manager",
            ActorKind::Salesman => "salesman",
        })
    }
}
