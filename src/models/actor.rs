//! Actors and roles.
//!
//! The lifecycle state machine gates its transitions on who is asking.
//! Roles mirror the shop-floor hierarchy: admins and technologists manage
//! every order, masters act on the operations assigned to them.

use serde::{Deserialize, Serialize};

/// Shop-floor role of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access.
    Admin,
    /// Plans orders and operations.
    Technologist,
    /// Runs assigned operations on the floor.
    Master,
}

impl Role {
    /// Whether the role may act on any operation regardless of
    /// assignment.
    #[inline]
    pub fn is_elevated(&self) -> bool {
        matches!(self, Role::Admin | Role::Technologist)
    }
}

/// An authenticated user as seen by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Stable user identifier, compared against `Operation::master`.
    pub id: String,
    /// Shop-floor role.
    pub role: Role,
}

impl Actor {
    /// Creates an actor.
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self { id: id.into(), role }
    }
}
