use serde::{Deserialize, Serialize};

use crate::webhooks::webhooks_model::EventActor;

/// Application roles. Only managers and administrators run the change
/// monitor; clients only see their own records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Manager,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }

    pub fn can_monitor(&self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }
}

/// The authenticated session a change monitor runs under. Its identity is
/// attributed as the actor on pipeline-stage change notifications.
#[derive(Clone, Debug)]
pub struct MonitorSession {
    pub user_id: String,
    pub user_name: String,
    pub role: Role,
}

impl MonitorSession {
    pub fn actor(&self) -> EventActor {
        EventActor {
            id: self.user_id.clone(),
            name: self.user_name.clone(),
            role: self.role.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_staff_roles_can_monitor() {
        assert!(!Role::Client.can_monitor());
        assert!(Role::Manager.can_monitor());
        assert!(Role::Admin.can_monitor());
    }
}
