//! Debounced auto-save for the clients collection.
//!
//! Work-log edits arrive in bursts (field-by-field UI edits), so each edit
//! signal schedules a save one second out and any newer signal supersedes
//! the pending one. A slower periodic task flushes notes edits, which only
//! mark the collection dirty.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::state::AppState;

/// Debounce window after the last work-log edit.
const DEBOUNCE_MS: u64 = 1000;

/// Interval for the notes flush.
const FLUSH_SECS: u64 = 30;

/// Handle to the background auto-save tasks. Dropping it stops both tasks
/// after any pending save completes.
pub struct Autosave {
    debounce: JoinHandle<()>,
    flush: JoinHandle<()>,
}

impl Autosave {
    /// Attach auto-save to `state` and spawn the background tasks.
    /// Requires a running tokio runtime.
    pub fn spawn(state: Arc<AppState>) -> Autosave {
        let (tx, rx) = mpsc::unbounded_channel();
        state.attach_autosave(tx);

        let debounce = tokio::spawn(debounce_loop(state.clone(), rx));
        let flush = tokio::spawn(flush_loop(state));
        Autosave { debounce, flush }
    }

    pub fn shutdown(self) {
        self.debounce.abort();
        self.flush.abort();
    }
}

async fn debounce_loop(state: Arc<AppState>, mut rx: mpsc::UnboundedReceiver<()>) {
    loop {
        // Wait for the first edit of a burst
        if rx.recv().await.is_none() {
            break;
        }
        let mut deadline = Instant::now() + Duration::from_millis(DEBOUNCE_MS);

        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {
                    if let Err(e) = state.save_clients() {
                        log::warn!("auto-save failed: {}", e);
                    } else {
                        log::debug!("auto-saved clients after edit burst");
                    }
                    break;
                }
                msg = rx.recv() => match msg {
                    // A newer edit supersedes the pending save
                    Some(()) => deadline = Instant::now() + Duration::from_millis(DEBOUNCE_MS),
                    None => {
                        let _ = state.save_clients();
                        return;
                    }
                }
            }
        }
    }
}

async fn flush_loop(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(FLUSH_SECS));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // First tick fires immediately; skip it
    interval.tick().await;
    loop {
        interval.tick().await;
        if state.clients_dirty() {
            if let Err(e) = state.save_clients() {
                log::warn!("notes flush failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::{MemoryPersistence, COLLECTION_CLIENTS};
    use crate::services::clients::tests::sample_client;

    fn state_with_client(mem: &MemoryPersistence) -> (Arc<AppState>, String) {
        let state = Arc::new(AppState::new(Box::new(mem.clone())).unwrap());
        let client = state.add_client(sample_client("Acme Corp")).unwrap();
        (state, client.id)
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_edits_coalesce_into_one_save() {
        let mem = MemoryPersistence::new();
        let (state, client_id) = state_with_client(&mem);
        let autosave = Autosave::spawn(state.clone());
        let baseline = mem.save_count(COLLECTION_CLIENTS);

        let log = state.add_work_log(&client_id).unwrap();
        state.toggle_work_log_complete(&client_id, &log.id).unwrap();
        state.toggle_work_log_complete(&client_id, &log.id).unwrap();

        tokio::time::sleep(Duration::from_millis(DEBOUNCE_MS + 200)).await;
        assert_eq!(mem.save_count(COLLECTION_CLIENTS), baseline + 1);
        assert!(!state.clients_dirty());

        // A second burst triggers a second save
        state.add_work_log(&client_id).unwrap();
        tokio::time::sleep(Duration::from_millis(DEBOUNCE_MS + 200)).await;
        assert_eq!(mem.save_count(COLLECTION_CLIENTS), baseline + 2);

        autosave.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_notes_flush_on_interval() {
        let mem = MemoryPersistence::new();
        let (state, client_id) = state_with_client(&mem);
        let autosave = Autosave::spawn(state.clone());
        let baseline = mem.save_count(COLLECTION_CLIENTS);

        state
            .update_client_notes(&client_id, Some("renewal call scheduled".to_string()))
            .unwrap();
        assert_eq!(mem.save_count(COLLECTION_CLIENTS), baseline);

        tokio::time::sleep(Duration::from_secs(FLUSH_SECS + 1)).await;
        assert_eq!(mem.save_count(COLLECTION_CLIENTS), baseline + 1);
        assert!(!state.clients_dirty());

        autosave.shutdown();
    }
}
