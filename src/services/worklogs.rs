// Work-log sub-operations. All of these mutate the `work_logs` array inside
// a single client record; persistence of the whole record is handled by the
// debounced auto-save (see `autosave`) plus the explicit manual save.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::AppError;
use crate::store::Store;
use crate::types::{Recurrence, WorkLog};

fn client_logs<'a>(store: &'a mut Store, client_id: &str) -> Result<&'a mut Vec<WorkLog>, AppError> {
    store
        .get_client_mut(client_id)
        .map(|c| &mut c.work_logs)
        .ok_or_else(|| AppError::not_found("client", client_id))
}

fn log_mut<'a>(
    store: &'a mut Store,
    client_id: &str,
    log_id: &str,
) -> Result<&'a mut WorkLog, AppError> {
    client_logs(store, client_id)?
        .iter_mut()
        .find(|l| l.id == log_id)
        .ok_or_else(|| AppError::not_found("work log", log_id))
}

/// Create an empty work log on a client. Fields are filled in afterwards,
/// edit by edit.
pub fn add_work_log(
    store: &mut Store,
    client_id: &str,
    now: DateTime<Utc>,
) -> Result<WorkLog, AppError> {
    let log = WorkLog {
        id: crate::util::new_id(),
        client_id: client_id.to_string(),
        description: String::new(),
        notes: String::new(),
        start_time: None,
        end_time: None,
        duration_minutes: 0,
        completed: false,
        recurring: false,
        recurrence: None,
        next_recurrence_date: None,
        due_date: None,
        created_at: now,
        updated_at: now,
    };
    client_logs(store, client_id)?.push(log.clone());
    Ok(log)
}

/// Replace a work log by id, stamping `updated_at`.
pub fn update_work_log(
    store: &mut Store,
    client_id: &str,
    mut log: WorkLog,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    log.updated_at = now;
    let existing = log_mut(store, client_id, &log.id)?;
    *existing = log;
    Ok(())
}

pub fn delete_work_log(store: &mut Store, client_id: &str, log_id: &str) -> Result<(), AppError> {
    let logs = client_logs(store, client_id)?;
    let before = logs.len();
    logs.retain(|l| l.id != log_id);
    if logs.len() == before {
        return Err(AppError::not_found("work log", log_id));
    }
    Ok(())
}

/// Duplicate a work log. The copy resets tracking state (`start_time`,
/// `end_time`, `completed`) but keeps the accumulated duration.
pub fn duplicate_work_log(
    store: &mut Store,
    client_id: &str,
    log_id: &str,
    now: DateTime<Utc>,
) -> Result<WorkLog, AppError> {
    let source = log_mut(store, client_id, log_id)?.clone();
    let copy = WorkLog {
        id: crate::util::new_id(),
        start_time: None,
        end_time: None,
        completed: false,
        created_at: now,
        updated_at: now,
        ..source
    };
    client_logs(store, client_id)?.push(copy.clone());
    Ok(copy)
}

pub fn toggle_complete(
    store: &mut Store,
    client_id: &str,
    log_id: &str,
    now: DateTime<Utc>,
) -> Result<bool, AppError> {
    let log = log_mut(store, client_id, log_id)?;
    log.completed = !log.completed;
    log.updated_at = now;
    Ok(log.completed)
}

pub fn toggle_recurring(
    store: &mut Store,
    client_id: &str,
    log_id: &str,
    now: DateTime<Utc>,
) -> Result<bool, AppError> {
    let log = log_mut(store, client_id, log_id)?;
    log.recurring = !log.recurring;
    if !log.recurring {
        log.recurrence = None;
        log.next_recurrence_date = None;
    }
    log.updated_at = now;
    Ok(log.recurring)
}

pub fn set_recurrence(
    store: &mut Store,
    client_id: &str,
    log_id: &str,
    recurrence: Option<Recurrence>,
    next_date: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let log = log_mut(store, client_id, log_id)?;
    log.recurring = recurrence.is_some();
    log.recurrence = recurrence;
    log.next_recurrence_date = next_date;
    log.updated_at = now;
    Ok(())
}

/// Begin a tracking session.
pub fn start_tracking(
    store: &mut Store,
    client_id: &str,
    log_id: &str,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let log = log_mut(store, client_id, log_id)?;
    if log.in_progress() {
        return Err(AppError::Validation(
            "Time tracking is already running for this entry".to_string(),
        ));
    }
    log.start_time = Some(now);
    log.end_time = None;
    log.updated_at = now;
    Ok(())
}

/// End the running session, adding its length to the accumulated duration.
/// Duration accumulates across start/stop cycles rather than being
/// overwritten.
pub fn stop_tracking(
    store: &mut Store,
    client_id: &str,
    log_id: &str,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let log = log_mut(store, client_id, log_id)?;
    let started = match (log.start_time, log.end_time) {
        (Some(start), None) => start,
        _ => {
            return Err(AppError::Validation(
                "Time tracking is not running for this entry".to_string(),
            ))
        }
    };
    log.duration_minutes += (now - started).num_minutes().max(0);
    log.end_time = Some(now);
    log.updated_at = now;
    Ok(())
}

/// Elapsed minutes for display: accumulated duration plus the live session
/// when tracking is in progress.
pub fn elapsed_minutes(log: &WorkLog, now: DateTime<Utc>) -> i64 {
    match (log.start_time, log.end_time) {
        (Some(start), None) => log.duration_minutes + (now - start).num_minutes().max(0),
        _ => log.duration_minutes,
    }
}
