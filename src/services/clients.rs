// Client registry — CRUD, the status/end-date lifecycle, and last-contact
// stamping. Work-log sub-operations live in `worklogs`.

use chrono::NaiveDate;

use crate::error::AppError;
use crate::services::managers;
use crate::store::Store;
use crate::types::{Address, Client, ClientStatus};

/// Payload for creating a client.
#[derive(Debug, Clone)]
pub struct NewClient {
    pub company_name: String,
    pub address: Address,
    pub account_manager_name: String,
    pub main_contact: String,
    pub email: String,
    pub phone: String,
    pub start_date: NaiveDate,
    /// Status as given by the caller, typically `Active`. Creating an
    /// inactive client requires `end_date` to satisfy the lifecycle
    /// invariant.
    pub status: ClientStatus,
    pub end_date: Option<NaiveDate>,
    pub website: Option<String>,
    pub notes: Option<String>,
}

fn validate_client(
    store: &Store,
    company_name: &str,
    account_manager_name: &str,
    status: ClientStatus,
    end_date: Option<NaiveDate>,
) -> Result<(), AppError> {
    if company_name.trim().is_empty() {
        return Err(AppError::Validation("Company name is required".to_string()));
    }
    if managers::find_by_name(store, account_manager_name).is_none() {
        return Err(AppError::Validation(format!(
            "Account manager '{}' does not exist",
            account_manager_name
        )));
    }
    match (status, end_date) {
        (ClientStatus::Active, Some(_)) => Err(AppError::Validation(
            "An active client cannot have an end date".to_string(),
        )),
        (ClientStatus::Inactive, None) => Err(AppError::Validation(
            "An inactive client requires an end date".to_string(),
        )),
        _ => Ok(()),
    }
}

pub fn add_client(store: &mut Store, new: NewClient) -> Result<Client, AppError> {
    validate_client(
        store,
        &new.company_name,
        &new.account_manager_name,
        new.status,
        new.end_date,
    )?;

    let client = Client {
        id: crate::util::new_id(),
        company_name: new.company_name,
        address: new.address,
        account_manager_name: new.account_manager_name,
        main_contact: new.main_contact,
        email: new.email,
        phone: new.phone,
        start_date: new.start_date,
        end_date: new.end_date,
        status: new.status,
        website: new.website,
        last_contact_date: None,
        notes: new.notes,
        work_logs: Vec::new(),
    };
    store.clients.push(client.clone());
    log::info!("added client {} ({})", client.company_name, client.id);
    Ok(client)
}

/// Full-record replace by id.
///
/// The manager reference is re-validated here: a record whose manager has
/// been deleted out from under it must be repaired (reassigned to an
/// existing manager) before any other edit goes through.
pub fn update_client(store: &mut Store, client: Client) -> Result<(), AppError> {
    validate_client(
        store,
        &client.company_name,
        &client.account_manager_name,
        client.status,
        client.end_date,
    )?;

    match store.clients.iter_mut().find(|c| c.id == client.id) {
        Some(existing) => {
            *existing = client;
            Ok(())
        }
        None => Err(AppError::not_found("client", &client.id)),
    }
}

/// Delete a client and its ledger assignments.
pub fn delete_client(store: &mut Store, id: &str) -> Result<(), AppError> {
    let before = store.clients.len();
    store.clients.retain(|c| c.id != id);
    if store.clients.len() == before {
        return Err(AppError::not_found("client", id));
    }
    store.client_services.retain(|a| a.client_id != id);
    Ok(())
}

pub fn get_client<'a>(store: &'a Store, id: &str) -> Option<&'a Client> {
    store.get_client(id)
}

/// Apply a status change with its end-date side effect:
/// - to inactive: stamp `end_date = today`
/// - to active: clear `end_date` entirely
///
/// Setting the same status again is a permitted no-op that still re-stamps
/// or re-clears the end date.
pub fn update_client_status(
    store: &mut Store,
    id: &str,
    status: ClientStatus,
    today: NaiveDate,
) -> Result<(), AppError> {
    let client = store
        .get_client_mut(id)
        .ok_or_else(|| AppError::not_found("client", id))?;

    client.status = status;
    client.end_date = match status {
        ClientStatus::Inactive => Some(today),
        ClientStatus::Active => None,
    };
    Ok(())
}

/// Set `last_contact_date` to the given date.
pub fn update_last_contact_date(
    store: &mut Store,
    id: &str,
    date: NaiveDate,
) -> Result<(), AppError> {
    let client = store
        .get_client_mut(id)
        .ok_or_else(|| AppError::not_found("client", id))?;
    client.last_contact_date = Some(date);
    Ok(())
}

/// Clients whose `account_manager_name` no longer references an existing
/// manager-capable user. These records are invalid and must be repaired.
pub fn clients_with_invalid_manager(store: &Store) -> Vec<&Client> {
    store
        .clients
        .iter()
        .filter(|c| managers::find_by_name(store, &c.account_manager_name).is_none())
        .collect()
}
