//! Application state controller for the home screen.
//!
//! # Responsibility
//! - Own the single `HomeState` value (member list + daily advice).
//! - Accept fire-and-forget user intents and apply them sequentially.
//! - Schedule a reminder after every successful task creation.
//!
//! # Invariants
//! - Only the actor task writes `HomeState`; callers observe it through a
//!   `watch` channel.
//! - Exactly one advice fetch is issued per controller; failure yields the
//!   fallback label, never an empty value.
//! - `toggle_task` decides from the last-known snapshot, not a fresh read.
//!   A concurrent external change to the same task can be overwritten.

use crate::config::HomeLabels;
use crate::model::member::{find_task, FamilyMember, MemberId};
use crate::model::task::{Task, TaskId};
use crate::repo::datetime::local_now;
use crate::service::home_repository::HomeRepository;
use crate::service::members_feed::MembersSubscription;
use crate::service::reminder_scheduler::ReminderScheduler;
use chrono::NaiveDateTime;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// Screen state rendered by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeState {
    pub members: Vec<FamilyMember>,
    pub daily_advice: String,
}

impl HomeState {
    fn initial(labels: &HomeLabels) -> Self {
        Self {
            members: Vec::new(),
            daily_advice: labels.advice_loading.clone(),
        }
    }

    /// Finds a task across all members.
    pub fn find_task(&self, task_id: TaskId) -> Option<&Task> {
        find_task(&self.members, task_id)
    }

    /// Finds a member by id.
    pub fn member(&self, member_id: MemberId) -> Option<&FamilyMember> {
        self.members.iter().find(|member| member.id == member_id)
    }
}

enum HomeCommand {
    AddMember {
        name: String,
    },
    RemoveMember {
        member_id: MemberId,
    },
    AddTask {
        member_id: MemberId,
        title: String,
        deadline: NaiveDateTime,
    },
    RemoveTask {
        task_id: TaskId,
    },
    ToggleTask {
        task_id: TaskId,
    },
    AdviceResolved {
        text: String,
    },
    Flush {
        done: oneshot::Sender<()>,
    },
}

/// Handle to the running state controller.
///
/// Dropping the handle stops the actor and any in-flight advice fetch.
pub struct HomeController {
    commands: mpsc::UnboundedSender<HomeCommand>,
    state: watch::Receiver<HomeState>,
    actor: JoinHandle<()>,
    advice_fetch: JoinHandle<()>,
}

impl HomeController {
    /// Starts the controller actor and the one-shot advice fetch.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        repository: HomeRepository,
        scheduler: ReminderScheduler,
        labels: &HomeLabels,
    ) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(HomeState::initial(labels));

        let advice_fetch = tokio::spawn(load_advice(
            repository.clone(),
            labels.advice_fallback.clone(),
            commands.clone(),
        ));

        let actor = HomeActor {
            members: repository.observe_members(),
            repository,
            scheduler,
            state: state_tx,
            commands: command_rx,
        };

        Self {
            commands,
            state,
            actor: tokio::spawn(actor.run()),
            advice_fetch,
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> HomeState {
        self.state.borrow().clone()
    }

    /// Observes state changes.
    pub fn subscribe(&self) -> watch::Receiver<HomeState> {
        self.state.clone()
    }

    pub fn add_member(&self, name: impl Into<String>) {
        self.send(HomeCommand::AddMember { name: name.into() });
    }

    pub fn remove_member(&self, member_id: MemberId) {
        self.send(HomeCommand::RemoveMember { member_id });
    }

    pub fn add_task(&self, member_id: MemberId, title: impl Into<String>, deadline: NaiveDateTime) {
        self.send(HomeCommand::AddTask {
            member_id,
            title: title.into(),
            deadline,
        });
    }

    pub fn remove_task(&self, task_id: TaskId) {
        self.send(HomeCommand::RemoveTask { task_id });
    }

    pub fn toggle_task(&self, task_id: TaskId) {
        self.send(HomeCommand::ToggleTask { task_id });
    }

    /// Waits until every previously sent intent has been applied to storage.
    ///
    /// The matching state emission may still be in flight.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        self.send(HomeCommand::Flush { done });
        let _ = wait.await;
    }

    /// Stops the actor and any in-flight advice fetch. Later intents are
    /// dropped with a warning.
    pub fn shutdown(&self) {
        self.advice_fetch.abort();
        self.actor.abort();
    }

    fn send(&self, command: HomeCommand) {
        if self.commands.send(command).is_err() {
            warn!("event=home_intent module=controller status=dropped reason=actor_stopped");
        }
    }
}

impl Drop for HomeController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn load_advice(
    repository: HomeRepository,
    fallback: String,
    commands: mpsc::UnboundedSender<HomeCommand>,
) {
    let text = match repository.fetch_advice().await {
        Ok(advice) => advice.text,
        Err(err) => {
            warn!("event=advice_load module=controller status=fallback error={err}");
            fallback
        }
    };
    let _ = commands.send(HomeCommand::AdviceResolved { text });
}

struct HomeActor {
    repository: HomeRepository,
    scheduler: ReminderScheduler,
    members: MembersSubscription,
    state: watch::Sender<HomeState>,
    commands: mpsc::UnboundedReceiver<HomeCommand>,
}

impl HomeActor {
    async fn run(mut self) {
        let mut members_open = true;
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                snapshot = self.members.next(), if members_open => match snapshot {
                    Some(members) => self.state.send_modify(|state| {
                        state.members = members.as_ref().clone();
                    }),
                    None => members_open = false,
                },
            }
        }
        debug!("event=home_actor module=controller status=stopped");
    }

    fn handle(&mut self, command: HomeCommand) {
        match command {
            HomeCommand::AddMember { name } => {
                if let Err(err) = self.repository.add_member(&name) {
                    error!("event=member_add module=controller status=error error={err}");
                }
            }
            HomeCommand::RemoveMember { member_id } => {
                if let Err(err) = self.repository.remove_member(member_id) {
                    error!("event=member_remove module=controller status=error error={err}");
                }
            }
            HomeCommand::AddTask {
                member_id,
                title,
                deadline,
            } => self.add_task(member_id, title, deadline),
            HomeCommand::RemoveTask { task_id } => {
                if let Err(err) = self.repository.remove_task(task_id) {
                    error!("event=task_remove module=controller status=error error={err}");
                }
            }
            HomeCommand::ToggleTask { task_id } => self.toggle_task(task_id),
            HomeCommand::AdviceResolved { text } => {
                self.state.send_modify(|state| state.daily_advice = text);
            }
            HomeCommand::Flush { done } => {
                let _ = done.send(());
            }
        }
    }

    fn add_task(&self, member_id: MemberId, title: String, deadline: NaiveDateTime) {
        let task = Task::new(title, deadline);
        if let Err(err) = self.repository.add_task(member_id, &task) {
            error!(
                "event=task_add module=controller status=error member_id={member_id} error={err}"
            );
            return;
        }
        // A past deadline is skipped silently; the UI is not told either way.
        if let Err(err) = self.scheduler.schedule(&task) {
            error!(
                "event=reminder_schedule module=controller status=error task_id={} error={err}",
                task.id
            );
        }
    }

    fn toggle_task(&self, task_id: TaskId) {
        let completion = {
            let state = self.state.borrow();
            match state.find_task(task_id) {
                Some(task) => task.toggled(local_now()),
                None => {
                    debug!("event=task_toggle module=controller status=noop task_id={task_id}");
                    return;
                }
            }
        };
        if let Err(err) =
            self.repository
                .toggle_task(task_id, completion.is_done, completion.completed_at)
        {
            error!("event=task_toggle module=controller status=error task_id={task_id} error={err}");
        }
    }
}
