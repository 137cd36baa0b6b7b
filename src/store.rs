//! In-memory store backing every service module.
//!
//! One `Store` is constructed per process/session (or per test) and passed
//! by reference into the service functions — there is no ambient singleton.
//! Persistence is layered on top by [`crate::state::AppState`].

use crate::types::{
    AccountManagerUser, Client, ClientServiceAssignment, Role, ServiceCategory, ServiceDefinition,
};

#[derive(Debug, Default)]
pub struct Store {
    pub services: Vec<ServiceDefinition>,
    pub clients: Vec<Client>,
    pub client_services: Vec<ClientServiceAssignment>,
    /// User directory. Seeded in memory; not one of the persisted collections.
    pub users: Vec<AccountManagerUser>,
    /// Working set of categories offered in the catalog UI: the six defaults
    /// plus any custom strings registered at runtime.
    pub categories: Vec<ServiceCategory>,
}

impl Store {
    /// Empty store with the default category set and user directory.
    pub fn new() -> Self {
        Store {
            services: Vec::new(),
            clients: Vec::new(),
            client_services: Vec::new(),
            users: default_users(),
            categories: ServiceCategory::DEFAULTS.to_vec(),
        }
    }

    pub fn get_service(&self, id: &str) -> Option<&ServiceDefinition> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn get_client(&self, id: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == id)
    }

    pub fn get_client_mut(&mut self, id: &str) -> Option<&mut Client> {
        self.clients.iter_mut().find(|c| c.id == id)
    }

    pub fn get_assignment(&self, id: &str) -> Option<&ClientServiceAssignment> {
        self.client_services.iter().find(|a| a.id == id)
    }
}

/// The built-in operations-team directory.
fn default_users() -> Vec<AccountManagerUser> {
    vec![
        AccountManagerUser {
            id: "u-admin".to_string(),
            name: "Alex Rivera".to_string(),
            email: "alex@agency.test".to_string(),
            username: "admin".to_string(),
            password: "admin".to_string(),
            role: Role::Admin,
        },
        AccountManagerUser {
            id: "u-sarah".to_string(),
            name: "Sarah Chen".to_string(),
            email: "sarah.chen@agency.test".to_string(),
            username: "sarah".to_string(),
            password: "password1".to_string(),
            role: Role::Manager,
        },
        AccountManagerUser {
            id: "u-joe".to_string(),
            name: "Joe Smith".to_string(),
            email: "joe.smith@agency.test".to_string(),
            username: "joe".to_string(),
            password: "password2".to_string(),
            role: Role::Manager,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_is_seeded() {
        let store = Store::new();
        assert_eq!(store.categories.len(), 6);
        assert!(store.categories.iter().all(ServiceCategory::is_default));
        assert!(store.users.iter().any(|u| u.role == Role::Admin));
        assert!(store.services.is_empty());
    }
}
