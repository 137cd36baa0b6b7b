//! Application state: the shared store plus its persistence collaborator.
//!
//! One `AppState` is constructed at session start and passed (by `Arc` or
//! reference) to whatever layer needs it. Every catalog/registry/ledger
//! mutation persists its collection immediately; work-log and notes edits
//! go through the debounced auto-save instead (see `autosave`).

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::persist::{
    load_collection, save_collection, MemoryPersistence, Persistence, COLLECTION_CLIENTS,
    COLLECTION_CLIENT_SERVICES, COLLECTION_SERVICES,
};
use crate::services::catalog::{self, NewService};
use crate::services::clients::{self, NewClient};
use crate::services::ledger::{self, NewAssignment, SyncOutcome};
use crate::services::managers::{DeleteRequest, ReassignmentFlow};
use crate::services::worklogs;
use crate::store::Store;
use crate::types::{
    Client, ClientServiceAssignment, ClientStatus, Recurrence, ServiceCategory,
    ServiceDefinition, WorkLog,
};

pub struct AppState {
    store: Mutex<Store>,
    persistence: Box<dyn Persistence>,
    /// Feeds the debounced auto-save task once one is attached.
    autosave_tx: Mutex<Option<mpsc::UnboundedSender<()>>>,
    /// Set by work-log/notes edits, cleared by `save_clients`.
    clients_dirty: AtomicBool,
}

impl AppState {
    /// Construct state over a persistence backend, loading the three
    /// collections into memory.
    pub fn new(persistence: Box<dyn Persistence>) -> Result<Self, AppError> {
        let mut store = Store::new();
        store.services = load_collection(persistence.as_ref(), COLLECTION_SERVICES)?;
        store.clients = load_collection(persistence.as_ref(), COLLECTION_CLIENTS)?;
        store.client_services =
            load_collection(persistence.as_ref(), COLLECTION_CLIENT_SERVICES)?;

        // Custom categories referenced by loaded services re-enter the
        // working set.
        let custom: Vec<ServiceCategory> = store
            .services
            .iter()
            .map(|s| s.category.clone())
            .filter(|c| !store.categories.contains(c))
            .collect();
        store.categories.extend(custom);

        log::info!(
            "loaded {} service(s), {} client(s), {} assignment(s)",
            store.services.len(),
            store.clients.len(),
            store.client_services.len()
        );

        Ok(AppState {
            store: Mutex::new(store),
            persistence,
            autosave_tx: Mutex::new(None),
            clients_dirty: AtomicBool::new(false),
        })
    }

    /// Ephemeral state for tests and demos.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryPersistence::new())).expect("in-memory state")
    }

    /// Run a read-only closure against the store.
    pub fn read<R>(&self, f: impl FnOnce(&Store) -> R) -> R {
        f(&self.store.lock())
    }

    // =========================================================================
    // Service catalog
    // =========================================================================

    pub fn add_service(&self, new: NewService) -> Result<ServiceDefinition, AppError> {
        let mut store = self.store.lock();
        let service = catalog::add_service(&mut store, new)?;
        save_collection(self.persistence.as_ref(), COLLECTION_SERVICES, &store.services)?;
        Ok(service)
    }

    pub fn update_service(&self, def: ServiceDefinition) -> Result<(), AppError> {
        let mut store = self.store.lock();
        catalog::update_service(&mut store, def)?;
        save_collection(self.persistence.as_ref(), COLLECTION_SERVICES, &store.services)
    }

    /// Delete a definition; the ledger cascade persists both collections.
    pub fn delete_service(&self, id: &str) -> Result<(), AppError> {
        let mut store = self.store.lock();
        catalog::delete_service(&mut store, id)?;
        save_collection(self.persistence.as_ref(), COLLECTION_SERVICES, &store.services)?;
        save_collection(
            self.persistence.as_ref(),
            COLLECTION_CLIENT_SERVICES,
            &store.client_services,
        )
    }

    pub fn get_service(&self, id: &str) -> Option<ServiceDefinition> {
        self.read(|store| store.get_service(id).cloned())
    }

    pub fn remove_category(
        &self,
        category: &ServiceCategory,
        editing_service_id: Option<&str>,
    ) -> Result<(), AppError> {
        let mut store = self.store.lock();
        catalog::remove_category(&mut store, category, editing_service_id)
    }

    // =========================================================================
    // Client registry
    // =========================================================================

    pub fn add_client(&self, new: NewClient) -> Result<Client, AppError> {
        let mut store = self.store.lock();
        let client = clients::add_client(&mut store, new)?;
        save_collection(self.persistence.as_ref(), COLLECTION_CLIENTS, &store.clients)?;
        Ok(client)
    }

    pub fn update_client(&self, client: Client) -> Result<(), AppError> {
        let mut store = self.store.lock();
        clients::update_client(&mut store, client)?;
        save_collection(self.persistence.as_ref(), COLLECTION_CLIENTS, &store.clients)
    }

    pub fn delete_client(&self, id: &str) -> Result<(), AppError> {
        let mut store = self.store.lock();
        clients::delete_client(&mut store, id)?;
        save_collection(self.persistence.as_ref(), COLLECTION_CLIENTS, &store.clients)?;
        save_collection(
            self.persistence.as_ref(),
            COLLECTION_CLIENT_SERVICES,
            &store.client_services,
        )
    }

    pub fn get_client(&self, id: &str) -> Option<Client> {
        self.read(|store| store.get_client(id).cloned())
    }

    pub fn update_client_status(&self, id: &str, status: ClientStatus) -> Result<(), AppError> {
        self.update_client_status_on(id, status, chrono::Local::now().date_naive())
    }

    /// Status transition with an explicit "today", for callers that need a
    /// fixed date.
    pub fn update_client_status_on(
        &self,
        id: &str,
        status: ClientStatus,
        today: NaiveDate,
    ) -> Result<(), AppError> {
        let mut store = self.store.lock();
        clients::update_client_status(&mut store, id, status, today)?;
        save_collection(self.persistence.as_ref(), COLLECTION_CLIENTS, &store.clients)
    }

    pub fn update_last_contact_date(
        &self,
        id: &str,
        date: Option<NaiveDate>,
    ) -> Result<(), AppError> {
        let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
        let mut store = self.store.lock();
        clients::update_last_contact_date(&mut store, id, date)?;
        save_collection(self.persistence.as_ref(), COLLECTION_CLIENTS, &store.clients)
    }

    /// Notes edits are flushed by the periodic auto-save, not per keystroke.
    pub fn update_client_notes(&self, id: &str, notes: Option<String>) -> Result<(), AppError> {
        let mut store = self.store.lock();
        let client = store
            .get_client_mut(id)
            .ok_or_else(|| AppError::not_found("client", id))?;
        client.notes = notes;
        drop(store);
        self.clients_dirty.store(true, Ordering::SeqCst);
        Ok(())
    }

    // =========================================================================
    // Work logs (debounce-persisted)
    // =========================================================================

    pub fn add_work_log(&self, client_id: &str) -> Result<WorkLog, AppError> {
        let mut store = self.store.lock();
        let log = worklogs::add_work_log(&mut store, client_id, Utc::now())?;
        drop(store);
        self.schedule_client_save();
        Ok(log)
    }

    pub fn update_work_log(&self, client_id: &str, log: WorkLog) -> Result<(), AppError> {
        let mut store = self.store.lock();
        worklogs::update_work_log(&mut store, client_id, log, Utc::now())?;
        drop(store);
        self.schedule_client_save();
        Ok(())
    }

    pub fn delete_work_log(&self, client_id: &str, log_id: &str) -> Result<(), AppError> {
        let mut store = self.store.lock();
        worklogs::delete_work_log(&mut store, client_id, log_id)?;
        drop(store);
        self.schedule_client_save();
        Ok(())
    }

    pub fn duplicate_work_log(&self, client_id: &str, log_id: &str) -> Result<WorkLog, AppError> {
        let mut store = self.store.lock();
        let copy = worklogs::duplicate_work_log(&mut store, client_id, log_id, Utc::now())?;
        drop(store);
        self.schedule_client_save();
        Ok(copy)
    }

    pub fn toggle_work_log_complete(&self, client_id: &str, log_id: &str) -> Result<bool, AppError> {
        let mut store = self.store.lock();
        let completed = worklogs::toggle_complete(&mut store, client_id, log_id, Utc::now())?;
        drop(store);
        self.schedule_client_save();
        Ok(completed)
    }

    pub fn toggle_work_log_recurring(
        &self,
        client_id: &str,
        log_id: &str,
    ) -> Result<bool, AppError> {
        let mut store = self.store.lock();
        let recurring = worklogs::toggle_recurring(&mut store, client_id, log_id, Utc::now())?;
        drop(store);
        self.schedule_client_save();
        Ok(recurring)
    }

    pub fn set_work_log_recurrence(
        &self,
        client_id: &str,
        log_id: &str,
        recurrence: Option<Recurrence>,
        next_date: Option<NaiveDate>,
    ) -> Result<(), AppError> {
        let mut store = self.store.lock();
        worklogs::set_recurrence(&mut store, client_id, log_id, recurrence, next_date, Utc::now())?;
        drop(store);
        self.schedule_client_save();
        Ok(())
    }

    pub fn start_work_log_tracking(&self, client_id: &str, log_id: &str) -> Result<(), AppError> {
        let mut store = self.store.lock();
        worklogs::start_tracking(&mut store, client_id, log_id, Utc::now())?;
        drop(store);
        self.schedule_client_save();
        Ok(())
    }

    pub fn stop_work_log_tracking(&self, client_id: &str, log_id: &str) -> Result<(), AppError> {
        let mut store = self.store.lock();
        worklogs::stop_tracking(&mut store, client_id, log_id, Utc::now())?;
        drop(store);
        self.schedule_client_save();
        Ok(())
    }

    // =========================================================================
    // Assignment ledger
    // =========================================================================

    pub fn add_client_service(
        &self,
        new: NewAssignment,
    ) -> Result<ClientServiceAssignment, AppError> {
        let mut store = self.store.lock();
        let assignment = ledger::add_client_service(&mut store, new)?;
        save_collection(
            self.persistence.as_ref(),
            COLLECTION_CLIENT_SERVICES,
            &store.client_services,
        )?;
        Ok(assignment)
    }

    pub fn update_client_service(
        &self,
        assignment: ClientServiceAssignment,
    ) -> Result<(), AppError> {
        let mut store = self.store.lock();
        ledger::update_client_service(&mut store, assignment)?;
        save_collection(
            self.persistence.as_ref(),
            COLLECTION_CLIENT_SERVICES,
            &store.client_services,
        )
    }

    pub fn delete_client_service(&self, id: &str) -> Result<(), AppError> {
        let mut store = self.store.lock();
        ledger::delete_client_service(&mut store, id)?;
        save_collection(
            self.persistence.as_ref(),
            COLLECTION_CLIENT_SERVICES,
            &store.client_services,
        )
    }

    pub fn duplicate_client_service(&self, id: &str) -> Result<ClientServiceAssignment, AppError> {
        let mut store = self.store.lock();
        let copy = ledger::duplicate_client_service(&mut store, id)?;
        save_collection(
            self.persistence.as_ref(),
            COLLECTION_CLIENT_SERVICES,
            &store.client_services,
        )?;
        Ok(copy)
    }

    pub fn toggle_client_service_status(&self, id: &str, is_active: bool) -> Result<(), AppError> {
        let mut store = self.store.lock();
        ledger::toggle_client_service_status(&mut store, id, is_active)?;
        save_collection(
            self.persistence.as_ref(),
            COLLECTION_CLIENT_SERVICES,
            &store.client_services,
        )
    }

    pub fn sync_client_services(
        &self,
        client_id: &str,
        target_service_ids: &[String],
    ) -> Result<SyncOutcome, AppError> {
        let mut store = self.store.lock();
        let outcome = ledger::sync_client_services(&mut store, client_id, target_service_ids)?;
        save_collection(
            self.persistence.as_ref(),
            COLLECTION_CLIENT_SERVICES,
            &store.client_services,
        )?;
        Ok(outcome)
    }

    pub fn client_monthly_total(&self, client_id: &str) -> Decimal {
        self.read(|store| crate::services::billing::client_monthly_total(store, client_id))
    }

    // =========================================================================
    // Manager deletion workflow
    // =========================================================================

    pub fn request_manager_delete(
        &self,
        flow: &mut ReassignmentFlow,
        manager_id: &str,
    ) -> Result<DeleteRequest, AppError> {
        let mut store = self.store.lock();
        flow.request_delete(&mut store, manager_id)
    }

    /// Commit the pending manager deletion; the reassigned clients are
    /// persisted in the same step.
    pub fn confirm_manager_delete(
        &self,
        flow: &mut ReassignmentFlow,
        replacement_id: &str,
    ) -> Result<usize, AppError> {
        let mut store = self.store.lock();
        let reassigned = flow.confirm(&mut store, replacement_id)?;
        save_collection(self.persistence.as_ref(), COLLECTION_CLIENTS, &store.clients)?;
        Ok(reassigned)
    }

    // =========================================================================
    // Auto-save plumbing
    // =========================================================================

    /// Explicit manual save of the clients collection (work logs included).
    pub fn save_clients(&self) -> Result<(), AppError> {
        let store = self.store.lock();
        save_collection(self.persistence.as_ref(), COLLECTION_CLIENTS, &store.clients)?;
        self.clients_dirty.store(false, Ordering::SeqCst);
        Ok(())
    }

    pub(crate) fn attach_autosave(&self, tx: mpsc::UnboundedSender<()>) {
        *self.autosave_tx.lock() = Some(tx);
    }

    pub(crate) fn clients_dirty(&self) -> bool {
        self.clients_dirty.load(Ordering::SeqCst)
    }

    /// Mark the clients collection dirty and nudge the debounced auto-save.
    /// Without an attached auto-save the edit waits for a manual save.
    fn schedule_client_save(&self) {
        self.clients_dirty.store(true, Ordering::SeqCst);
        if let Some(tx) = self.autosave_tx.lock().as_ref() {
            let _ = tx.send(());
        }
    }
}

// =============================================================================
// Config
// =============================================================================

/// Configuration stored in ~/.clientdesk/config.json
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub data_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = crate::persist::default_data_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "data".to_string());
        Config { data_dir }
    }
}

/// Canonical config file path (~/.clientdesk/config.json).
pub fn config_path() -> Result<PathBuf, AppError> {
    let home = dirs::home_dir().ok_or_else(|| {
        AppError::Validation("Could not find home directory".to_string())
    })?;
    Ok(home.join(".clientdesk").join("config.json"))
}

/// Load configuration, writing the default on first run.
pub fn load_or_init_config() -> Result<Config, AppError> {
    let path = config_path()?;
    if path.exists() {
        let content = fs::read_to_string(&path)?;
        return Ok(serde_json::from_str(&content)?);
    }

    let config = Config::default();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, serde_json::to_string_pretty(&config)?)?;
    Ok(config)
}

impl AppState {
    /// File-backed state at the configured data directory.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let persistence =
            crate::persist::open_file_persistence(std::path::Path::new(&config.data_dir))?;
        Self::new(Box::new(persistence))
    }
}
