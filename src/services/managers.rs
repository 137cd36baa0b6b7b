// Account-manager directory and the guarded deletion/reassignment workflow.

use crate::error::AppError;
use crate::store::Store;
use crate::types::{AccountManagerUser, Role};

/// Users capable of managing clients: role `manager` or `admin`.
pub fn list_managers(store: &Store) -> Vec<&AccountManagerUser> {
    store
        .users
        .iter()
        .filter(|u| matches!(u.role, Role::Manager | Role::Admin))
        .collect()
}

/// Role check: admin implies every other role.
pub fn has_role(user: &AccountManagerUser, role: Role) -> bool {
    user.role == role || user.role == Role::Admin
}

pub fn find_by_name<'a>(store: &'a Store, name: &str) -> Option<&'a AccountManagerUser> {
    list_managers(store).into_iter().find(|u| u.name == name)
}

pub fn find_by_id<'a>(store: &'a Store, id: &str) -> Option<&'a AccountManagerUser> {
    list_managers(store).into_iter().find(|u| u.id == id)
}

/// Clients currently assigned to the named manager.
pub fn assigned_client_count(store: &Store, manager_name: &str) -> usize {
    store
        .clients
        .iter()
        .filter(|c| c.account_manager_name == manager_name)
        .count()
}

/// Outcome of [`ReassignmentFlow::request_delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteRequest {
    /// No clients were assigned; the manager is already gone.
    Deleted,
    /// Clients must be reassigned first; confirm or cancel.
    NeedsReassignment { affected: usize },
}

/// Guarded manager-deletion workflow.
///
/// Idle → ConfirmingReassignment → Committed / Cancelled. Deleting a manager
/// with assigned clients requires choosing a replacement; the commit
/// reassigns every affected client and removes the manager as one
/// all-or-nothing step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReassignmentFlow {
    #[default]
    Idle,
    ConfirmingReassignment {
        manager_id: String,
        affected: usize,
    },
    Committed {
        deleted_manager: String,
        reassigned: usize,
    },
    Cancelled,
}

impl ReassignmentFlow {
    pub fn new() -> Self {
        ReassignmentFlow::Idle
    }

    /// Begin deleting manager `manager_id`. Managers with no assigned
    /// clients are deleted immediately; otherwise the flow waits for a
    /// replacement choice.
    pub fn request_delete(
        &mut self,
        store: &mut Store,
        manager_id: &str,
    ) -> Result<DeleteRequest, AppError> {
        if matches!(self, ReassignmentFlow::ConfirmingReassignment { .. }) {
            return Err(AppError::Validation(
                "A manager deletion is already awaiting confirmation".to_string(),
            ));
        }

        let manager = find_by_id(store, manager_id)
            .ok_or_else(|| AppError::not_found("manager", manager_id))?;
        let affected = assigned_client_count(store, &manager.name);

        if affected == 0 {
            let name = manager.name.clone();
            store.users.retain(|u| u.id != manager_id);
            log::info!("deleted manager {} (no assigned clients)", name);
            *self = ReassignmentFlow::Committed {
                deleted_manager: manager_id.to_string(),
                reassigned: 0,
            };
            return Ok(DeleteRequest::Deleted);
        }

        *self = ReassignmentFlow::ConfirmingReassignment {
            manager_id: manager_id.to_string(),
            affected,
        };
        Ok(DeleteRequest::NeedsReassignment { affected })
    }

    /// Commit the pending deletion: reassign every affected client to
    /// `replacement_id`, then delete the manager. Validation happens before
    /// any mutation, so a failure leaves the store untouched.
    pub fn confirm(&mut self, store: &mut Store, replacement_id: &str) -> Result<usize, AppError> {
        let manager_id = match self {
            ReassignmentFlow::ConfirmingReassignment { manager_id, .. } => manager_id.clone(),
            _ => {
                return Err(AppError::Validation(
                    "No manager deletion is awaiting confirmation".to_string(),
                ))
            }
        };

        if replacement_id == manager_id {
            return Err(AppError::Validation(
                "Replacement must be a different manager".to_string(),
            ));
        }
        let manager_name = find_by_id(store, &manager_id)
            .ok_or_else(|| AppError::not_found("manager", &manager_id))?
            .name
            .clone();
        let replacement_name = find_by_id(store, replacement_id)
            .ok_or_else(|| AppError::not_found("manager", replacement_id))?
            .name
            .clone();

        let mut reassigned = 0;
        for client in store
            .clients
            .iter_mut()
            .filter(|c| c.account_manager_name == manager_name)
        {
            client.account_manager_name = replacement_name.clone();
            reassigned += 1;
        }
        store.users.retain(|u| u.id != manager_id);
        log::info!(
            "deleted manager {}, reassigned {} client(s) to {}",
            manager_name,
            reassigned,
            replacement_name
        );

        *self = ReassignmentFlow::Committed {
            deleted_manager: manager_id,
            reassigned,
        };
        Ok(reassigned)
    }

    /// Abandon the pending deletion. The manager and all clients are left
    /// unchanged.
    pub fn cancel(&mut self) {
        *self = ReassignmentFlow::Cancelled;
    }
}
