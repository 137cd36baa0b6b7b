// Client-service assignment ledger: the many-to-many join between clients
// and catalog services, with per-assignment overrides.

use rust_decimal::Decimal;

use crate::error::AppError;
use crate::store::Store;
use crate::types::ClientServiceAssignment;

/// Payload for binding a catalog service to a client.
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub client_id: String,
    pub service_id: String,
    pub custom_cost: Option<Decimal>,
    pub notes: Option<String>,
    pub domain: Option<String>,
    /// Defaults to true when not supplied.
    pub is_active: Option<bool>,
}

/// Create an assignment. The domain defaults to the client's website when
/// not given.
pub fn add_client_service(
    store: &mut Store,
    new: NewAssignment,
) -> Result<ClientServiceAssignment, AppError> {
    let client = store
        .get_client(&new.client_id)
        .ok_or_else(|| AppError::not_found("client", &new.client_id))?;
    if store.get_service(&new.service_id).is_none() {
        return Err(AppError::not_found("service", &new.service_id));
    }

    let assignment = ClientServiceAssignment {
        id: crate::util::new_id(),
        domain: new.domain.or_else(|| client.website.clone()),
        client_id: new.client_id,
        service_id: new.service_id,
        custom_cost: new.custom_cost,
        notes: new.notes,
        is_active: new.is_active.unwrap_or(true),
    };
    store.client_services.push(assignment.clone());
    Ok(assignment)
}

/// Full-record replace by id.
pub fn update_client_service(
    store: &mut Store,
    assignment: ClientServiceAssignment,
) -> Result<(), AppError> {
    match store
        .client_services
        .iter_mut()
        .find(|a| a.id == assignment.id)
    {
        Some(existing) => {
            *existing = assignment;
            Ok(())
        }
        None => Err(AppError::not_found("assignment", &assignment.id)),
    }
}

pub fn delete_client_service(store: &mut Store, id: &str) -> Result<(), AppError> {
    let before = store.client_services.len();
    store.client_services.retain(|a| a.id != id);
    if store.client_services.len() == before {
        return Err(AppError::not_found("assignment", id));
    }
    Ok(())
}

/// All assignments for a client, active and inactive.
pub fn get_client_services<'a>(
    store: &'a Store,
    client_id: &str,
) -> Vec<&'a ClientServiceAssignment> {
    store
        .client_services
        .iter()
        .filter(|a| a.client_id == client_id)
        .collect()
}

/// Only the active assignments for a client.
pub fn get_active_client_services<'a>(
    store: &'a Store,
    client_id: &str,
) -> Vec<&'a ClientServiceAssignment> {
    store
        .client_services
        .iter()
        .filter(|a| a.client_id == client_id && a.is_active)
        .collect()
}

/// Clone an assignment under a new id, appending " (Copy)" to the notes (or
/// setting them to "(Copy)" when empty). Everything else, including the
/// active flag, is preserved.
pub fn duplicate_client_service(
    store: &mut Store,
    id: &str,
) -> Result<ClientServiceAssignment, AppError> {
    let source = store
        .get_assignment(id)
        .ok_or_else(|| AppError::not_found("assignment", id))?
        .clone();

    let notes = match source.notes.as_deref() {
        Some(n) if !n.is_empty() => Some(format!("{} (Copy)", n)),
        _ => Some("(Copy)".to_string()),
    };
    let copy = ClientServiceAssignment {
        id: crate::util::new_id(),
        notes,
        ..source
    };
    store.client_services.push(copy.clone());
    Ok(copy)
}

/// Flip the active flag only.
pub fn toggle_client_service_status(
    store: &mut Store,
    id: &str,
    is_active: bool,
) -> Result<(), AppError> {
    match store.client_services.iter_mut().find(|a| a.id == id) {
        Some(assignment) => {
            assignment.is_active = is_active;
            Ok(())
        }
        None => Err(AppError::not_found("assignment", id)),
    }
}

/// Outcome of a bulk reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncOutcome {
    pub created: usize,
    pub deleted: usize,
}

/// Reconcile a client's assignments against a target set of service ids.
///
/// Set-difference sync, not a merge: every target id without an assignment
/// gets a fresh one (domain defaulting to the client's website), and every
/// assignment whose service id is outside the target set is deleted — custom
/// costs on those rows are lost.
pub fn sync_client_services(
    store: &mut Store,
    client_id: &str,
    target_service_ids: &[String],
) -> Result<SyncOutcome, AppError> {
    if store.get_client(client_id).is_none() {
        return Err(AppError::not_found("client", client_id));
    }
    for service_id in target_service_ids {
        if store.get_service(service_id).is_none() {
            return Err(AppError::not_found("service", service_id));
        }
    }

    let mut outcome = SyncOutcome::default();

    let before = store.client_services.len();
    store
        .client_services
        .retain(|a| a.client_id != client_id || target_service_ids.contains(&a.service_id));
    outcome.deleted = before - store.client_services.len();

    for service_id in target_service_ids {
        let exists = store
            .client_services
            .iter()
            .any(|a| a.client_id == client_id && a.service_id == *service_id);
        if !exists {
            add_client_service(
                store,
                NewAssignment {
                    client_id: client_id.to_string(),
                    service_id: service_id.clone(),
                    custom_cost: None,
                    notes: None,
                    domain: None,
                    is_active: None,
                },
            )?;
            outcome.created += 1;
        }
    }

    log::debug!(
        "synced services for client {}: +{} -{}",
        client_id,
        outcome.created,
        outcome.deleted
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::{self, NewService};
    use crate::services::clients::{self, tests::sample_client};
    use crate::types::ServiceCategory;

    fn setup() -> (Store, String, String, String) {
        let mut store = Store::new();
        let client = clients::add_client(&mut store, sample_client("Acme Corp")).unwrap();
        let hosting = catalog::add_service(
            &mut store,
            NewService {
                name: "Hosting".to_string(),
                default_cost: Decimal::new(2500, 2),
                category: ServiceCategory::Hosting,
                description: None,
            },
        )
        .unwrap();
        let design = catalog::add_service(
            &mut store,
            NewService {
                name: "Design Retainer".to_string(),
                default_cost: Decimal::new(50000, 2),
                category: ServiceCategory::Design,
                description: None,
            },
        )
        .unwrap();
        (store, client.id, hosting.id, design.id)
    }

    fn assignment_for(client_id: &str, service_id: &str) -> NewAssignment {
        NewAssignment {
            client_id: client_id.to_string(),
            service_id: service_id.to_string(),
            custom_cost: None,
            notes: None,
            domain: None,
            is_active: None,
        }
    }

    #[test]
    fn test_add_defaults_active_and_domain_from_website() {
        let (mut store, client_id, hosting_id, _) = setup();
        let a = add_client_service(&mut store, assignment_for(&client_id, &hosting_id)).unwrap();
        assert!(a.is_active);
        // sample_client sets website to client.test
        assert_eq!(a.domain.as_deref(), Some("client.test"));
    }

    #[test]
    fn test_explicit_domain_wins() {
        let (mut store, client_id, hosting_id, _) = setup();
        let mut new = assignment_for(&client_id, &hosting_id);
        new.domain = Some("shop.client.test".to_string());
        let a = add_client_service(&mut store, new).unwrap();
        assert_eq!(a.domain.as_deref(), Some("shop.client.test"));
    }

    #[test]
    fn test_active_filter() {
        let (mut store, client_id, hosting_id, design_id) = setup();
        let a = add_client_service(&mut store, assignment_for(&client_id, &hosting_id)).unwrap();
        add_client_service(&mut store, assignment_for(&client_id, &design_id)).unwrap();
        toggle_client_service_status(&mut store, &a.id, false).unwrap();

        assert_eq!(get_client_services(&store, &client_id).len(), 2);
        let active = get_active_client_services(&store, &client_id);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].service_id, design_id);
    }

    #[test]
    fn test_duplicate_copy_semantics() {
        let (mut store, client_id, hosting_id, _) = setup();
        let mut new = assignment_for(&client_id, &hosting_id);
        new.custom_cost = Some(Decimal::ZERO);
        new.notes = Some("Legacy pricing".to_string());
        new.is_active = Some(false);
        let source = add_client_service(&mut store, new).unwrap();

        let copy = duplicate_client_service(&mut store, &source.id).unwrap();
        assert_ne!(copy.id, source.id);
        assert_eq!(copy.notes.as_deref(), Some("Legacy pricing (Copy)"));
        assert_eq!(copy.custom_cost, source.custom_cost);
        assert_eq!(copy.domain, source.domain);
        assert_eq!(copy.is_active, source.is_active);
    }

    #[test]
    fn test_duplicate_empty_notes_becomes_copy_marker() {
        let (mut store, client_id, hosting_id, _) = setup();
        let source =
            add_client_service(&mut store, assignment_for(&client_id, &hosting_id)).unwrap();
        let copy = duplicate_client_service(&mut store, &source.id).unwrap();
        assert_eq!(copy.notes.as_deref(), Some("(Copy)"));
    }

    #[test]
    fn test_sync_is_set_difference() {
        let (mut store, client_id, hosting_id, design_id) = setup();
        // Existing hosting assignment with a custom cost that will be dropped
        let mut new = assignment_for(&client_id, &hosting_id);
        new.custom_cost = Some(Decimal::new(999, 2));
        add_client_service(&mut store, new).unwrap();

        let outcome =
            sync_client_services(&mut store, &client_id, &[design_id.clone()]).unwrap();
        assert_eq!(outcome, SyncOutcome { created: 1, deleted: 1 });

        let remaining = get_client_services(&store, &client_id);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].service_id, design_id);
        assert!(remaining[0].custom_cost.is_none());
    }

    #[test]
    fn test_sync_keeps_existing_overlap() {
        let (mut store, client_id, hosting_id, design_id) = setup();
        let mut new = assignment_for(&client_id, &hosting_id);
        new.custom_cost = Some(Decimal::new(1500, 2));
        let kept = add_client_service(&mut store, new).unwrap();

        let targets = vec![hosting_id.clone(), design_id.clone()];
        let outcome = sync_client_services(&mut store, &client_id, &targets).unwrap();
        assert_eq!(outcome, SyncOutcome { created: 1, deleted: 0 });

        // The overlapping assignment survives untouched, override intact
        let hosting = store.get_assignment(&kept.id).unwrap();
        assert_eq!(hosting.custom_cost, Some(Decimal::new(1500, 2)));
    }

    #[test]
    fn test_unknown_ids_fail() {
        let (mut store, client_id, hosting_id, _) = setup();
        assert!(add_client_service(&mut store, assignment_for("ghost", &hosting_id)).is_err());
        assert!(add_client_service(&mut store, assignment_for(&client_id, "ghost")).is_err());
        assert!(delete_client_service(&mut store, "ghost").is_err());
        assert!(toggle_client_service_status(&mut store, "ghost", true).is_err());
    }
}
