use serde::{Deserialize, Serialize};

use creamery_core::UserId;

use crate::roles::Role;

/// Identity of an authenticated caller (human user, service account, etc).
///
/// Carried through every mutating operation so tracking events, batches and
/// invoices can record who acted. The display name is denormalized here so
/// the core never has to join against a user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub name: String,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, name: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            name: name.into(),
            role,
        }
    }
}
