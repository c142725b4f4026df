use shared::{
    domain::{PermissionLevel, SteamId},
    protocol::Person,
};
use tracing::{info, warn};

use crate::api::ApiGateway;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub steam_id: SteamId,
    pub name: String,
    pub permission_level: PermissionLevel,
}

impl CurrentUser {
    pub fn guest() -> Self {
        Self {
            steam_id: SteamId::default(),
            name: String::new(),
            permission_level: PermissionLevel::Guest,
        }
    }
}

impl From<&Person> for CurrentUser {
    fn from(person: &Person) -> Self {
        Self {
            steam_id: person.steam_id,
            name: person.personaname.clone(),
            permission_level: person.permission_level,
        }
    }
}

/// Identity of whoever drives the views. Handed to every controller
/// explicitly rather than looked up from ambient state.
#[derive(Debug, Clone)]
pub struct Session {
    user: CurrentUser,
}

impl Session {
    pub fn new(user: CurrentUser) -> Self {
        Self { user }
    }

    pub fn guest() -> Self {
        Self::new(CurrentUser::guest())
    }

    /// Resolves the current user from the backend, falling back to a guest
    /// session when the token is missing or rejected.
    pub async fn establish(api: &dyn ApiGateway) -> Self {
        match api.current_profile().await {
            Ok(person) => {
                let user = CurrentUser::from(&person);
                info!(
                    "session: established steam_id={} level={:?}",
                    user.steam_id, user.permission_level
                );
                Self::new(user)
            }
            Err(err) => {
                warn!("session: falling back to guest err={err}");
                Self::guest()
            }
        }
    }

    pub fn user(&self) -> &CurrentUser {
        &self.user
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.steam_id.is_valid_individual()
    }

    pub fn has_permission(&self, required: PermissionLevel) -> bool {
        self.user.permission_level >= required
    }

    pub fn can_moderate(&self) -> bool {
        self.has_permission(PermissionLevel::Moderator)
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
