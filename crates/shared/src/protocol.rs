use serde::{Deserialize, Serialize};

use crate::domain::{User, UserId};

/// Body of `POST /users` and `PUT /users/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPayload {
    pub id: UserId,
    pub name: String,
}

impl From<&User> for UserPayload {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
        }
    }
}

/// Request to rename a stored user remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUpdate {
    pub id: UserId,
    pub name: String,
}

impl UserUpdate {
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl From<&UserUpdate> for UserPayload {
    fn from(update: &UserUpdate) -> Self {
        Self {
            id: update.id.clone(),
            name: update.name.clone(),
        }
    }
}
