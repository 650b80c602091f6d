//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level household functions to Dart via FRB.
//! - Own the process-wide tokio runtime and the running `HomeApp`.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Command-style functions return an empty string on success and a
//!   human-readable message on failure.
//! - Ids cross the boundary as hyphenated UUID strings, instants as Unix
//!   epoch milliseconds.

use homeapp_core::repo::datetime::{from_epoch_millis, local_now, to_epoch_millis};
use homeapp_core::{
    core_version as core_version_inner, format_deadline as format_deadline_inner,
    init_logging as init_logging_inner, ping as ping_inner, FamilyMember, HomeApp, HomeConfig,
    HomeState, QueueNotifier, ReminderNotification, Task,
};
use log::info;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tokio::runtime::Runtime;
use uuid::Uuid;

static HOME: OnceLock<HomeHandle> = OnceLock::new();

struct HomeHandle {
    runtime: Runtime,
    app: HomeApp,
    notifications: Arc<QueueNotifier>,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One task as rendered by the home screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskView {
    pub id: String,
    pub title: String,
    pub deadline_epoch_ms: i64,
    /// Deadline formatted as `5 March 14:30`.
    pub deadline_label: String,
    pub is_done: bool,
    pub completed_at_epoch_ms: Option<i64>,
    pub is_overdue: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberView {
    pub id: String,
    pub name: String,
    pub tasks: Vec<TaskView>,
}

/// Home screen state envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeStateView {
    pub members: Vec<MemberView>,
    pub daily_advice: String,
    /// Empty when the snapshot is valid; otherwise why it is not.
    pub message: String,
}

/// Reminder queued for the Flutter side to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationView {
    pub channel_id: String,
    pub title: String,
    pub body: String,
}

/// Starts the household core against `db_path`.
///
/// An empty `db_path` falls back to `HOMEAPP_DB_PATH` or the temp directory.
///
/// # FFI contract
/// - Sync call; opens the database and spawns background tasks.
/// - Idempotent for the same path; a different path after success is refused.
#[flutter_rust_bridge::frb(sync)]
pub fn home_init(db_path: String) -> String {
    let mut config = HomeConfig::from_env();
    let trimmed = db_path.trim();
    if !trimmed.is_empty() {
        config.db_path = PathBuf::from(trimmed);
    }

    if let Some(home) = HOME.get() {
        return already_started(home, &config);
    }

    let handle = match start_home(config.clone()) {
        Ok(handle) => handle,
        Err(err) => return err,
    };
    // A concurrent caller may have won the race; its instance is kept.
    let _ = HOME.set(handle);
    match HOME.get() {
        Some(home) => already_started(home, &config),
        None => "home core failed to start".to_string(),
    }
}

/// Current home screen state.
///
/// # FFI contract
/// - Sync call, reads the in-memory snapshot only.
#[flutter_rust_bridge::frb(sync)]
pub fn home_snapshot() -> HomeStateView {
    match HOME.get() {
        Some(home) => to_state_view(&home.app.controller().state()),
        None => HomeStateView {
            members: Vec::new(),
            daily_advice: String::new(),
            message: not_initialized(),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn home_add_member(name: String) -> String {
    with_home(|home| home.app.controller().add_member(name))
}

#[flutter_rust_bridge::frb(sync)]
pub fn home_remove_member(member_id: String) -> String {
    let member_id = match parse_id(&member_id, "member_id") {
        Ok(id) => id,
        Err(err) => return err,
    };
    with_home(|home| home.app.controller().remove_member(member_id))
}

/// Adds a task with a deadline given in Unix epoch milliseconds.
#[flutter_rust_bridge::frb(sync)]
pub fn home_add_task(member_id: String, title: String, deadline_epoch_ms: i64) -> String {
    let member_id = match parse_id(&member_id, "member_id") {
        Ok(id) => id,
        Err(err) => return err,
    };
    let deadline = match from_epoch_millis(deadline_epoch_ms) {
        Ok(deadline) => deadline,
        Err(err) => return err.to_string(),
    };
    with_home(|home| home.app.controller().add_task(member_id, title, deadline))
}

#[flutter_rust_bridge::frb(sync)]
pub fn home_remove_task(task_id: String) -> String {
    let task_id = match parse_id(&task_id, "task_id") {
        Ok(id) => id,
        Err(err) => return err,
    };
    with_home(|home| home.app.controller().remove_task(task_id))
}

#[flutter_rust_bridge::frb(sync)]
pub fn home_toggle_task(task_id: String) -> String {
    let task_id = match parse_id(&task_id, "task_id") {
        Ok(id) => id,
        Err(err) => return err,
    };
    with_home(|home| home.app.controller().toggle_task(task_id))
}

/// Removes and returns reminders that fired since the last call.
#[flutter_rust_bridge::frb(sync)]
pub fn home_take_notifications() -> Vec<NotificationView> {
    HOME.get()
        .map(|home| {
            home.notifications
                .drain()
                .into_iter()
                .map(to_notification_view)
                .collect()
        })
        .unwrap_or_default()
}

/// Formats an epoch-millis deadline as `5 March 14:30` in local time.
///
/// Returns an empty string for out-of-range input.
#[flutter_rust_bridge::frb(sync)]
pub fn format_deadline(epoch_ms: i64) -> String {
    from_epoch_millis(epoch_ms)
        .map(format_deadline_inner)
        .unwrap_or_default()
}

fn start_home(config: HomeConfig) -> Result<HomeHandle, String> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("homeapp-core")
        .enable_all()
        .build()
        .map_err(|err| format!("runtime start failed: {err}"))?;
    let notifications = Arc::new(QueueNotifier::new());
    let app = {
        let _entered = runtime.enter();
        HomeApp::start(config, notifications.clone()).map_err(|err| err.to_string())?
    };
    info!("event=ffi_home_init module=ffi status=ok");
    Ok(HomeHandle {
        runtime,
        app,
        notifications,
    })
}

fn already_started(home: &HomeHandle, requested: &HomeConfig) -> String {
    let active = &home.app.config().db_path;
    if *active == requested.db_path {
        return String::new();
    }
    format!(
        "home core already started at `{}`; refusing to switch to `{}`",
        active.display(),
        requested.db_path.display()
    )
}

/// Sends one intent and waits until the controller has applied it.
fn with_home(dispatch: impl FnOnce(&HomeHandle)) -> String {
    let Some(home) = HOME.get() else {
        return not_initialized();
    };
    dispatch(home);
    home.runtime.block_on(home.app.controller().flush());
    String::new()
}

fn not_initialized() -> String {
    "home core is not initialized; call home_init first".to_string()
}

fn parse_id(raw: &str, field: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|err| format!("invalid {field}: {err}"))
}

fn to_state_view(state: &HomeState) -> HomeStateView {
    HomeStateView {
        members: state.members.iter().map(to_member_view).collect(),
        daily_advice: state.daily_advice.clone(),
        message: String::new(),
    }
}

fn to_member_view(member: &FamilyMember) -> MemberView {
    MemberView {
        id: member.id.to_string(),
        name: member.name.clone(),
        tasks: member.tasks.iter().map(to_task_view).collect(),
    }
}

fn to_task_view(task: &Task) -> TaskView {
    TaskView {
        id: task.id.to_string(),
        title: task.title.clone(),
        deadline_epoch_ms: to_epoch_millis(task.deadline),
        deadline_label: format_deadline_inner(task.deadline),
        is_done: task.is_done,
        completed_at_epoch_ms: task.completed_at.map(to_epoch_millis),
        is_overdue: task.is_overdue(local_now()),
    }
}

fn to_notification_view(notification: ReminderNotification) -> NotificationView {
    NotificationView {
        channel_id: notification.channel_id,
        title: notification.title,
        body: notification.body,
    }
}
