//! Who is calling.

use crate::error::ValidationError;
use review_store::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    User { id: UserId, display_name: String },
}

impl Actor {
    pub fn user(id: impl Into<UserId>, display_name: impl Into<String>) -> Self {
        Actor::User {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    /// The user id and display name, or an `Unauthenticated` rejection
    /// naming the `action` the caller attempted
    pub fn require_user(&self, action: &'static str) -> Result<(&str, &str), ValidationError> {
        match self {
            Actor::User { id, display_name } => Ok((id, display_name)),
            Actor::Anonymous => Err(ValidationError::Unauthenticated { action }),
        }
    }
}
