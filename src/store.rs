//! The canonical in-memory task collection.
//!
//! [`TaskStore`] is the only writer of the task list. Mutations go through the
//! repository first and are reconciled only after the service confirms them;
//! a failed mutation leaves the list exactly as it was.
//!
//! Toggles and removals are ticketed per task id. When a response arrives it
//! is applied only if no newer operation on that id has been issued in the
//! meantime, so the last-issued operation wins regardless of resolution order.
//! After [`TaskStore::detach`] nothing is reconciled at all.

use std::collections::HashMap;
use std::future::Future;

use chrono::Utc;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::TaskRepository;
use crate::error::{Error, Result};
use crate::models::{CreateTaskDto, NewTask, Task};

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
struct State {
    tasks: Vec<Task>,
    loading: bool,
    error: Option<String>,
    pending: HashMap<String, u64>,
    next_ticket: u64,
}

impl State {
    fn issue(&mut self, id: &str) -> u64 {
        self.next_ticket += 1;
        self.pending.insert(id.to_string(), self.next_ticket);
        self.next_ticket
    }

    /// Retires `ticket` and reports whether it was still the newest for `id`.
    fn settle(&mut self, id: &str, ticket: u64) -> bool {
        if self.pending.get(id) == Some(&ticket) {
            self.pending.remove(id);
            true
        } else {
            false
        }
    }
}

pub struct TaskStore<R> {
    repo: R,
    state: Mutex<State>,
    cancel: CancellationToken,
}

impl<R: TaskRepository> TaskStore<R> {
    /// A store in its initial state: empty and loading until [`load`](Self::load) resolves.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            state: Mutex::new(State {
                tasks: Vec::new(),
                loading: true,
                error: None,
                pending: HashMap::new(),
                next_ticket: 0,
            }),
            cancel: CancellationToken::new(),
        }
    }

    /// Fetches the full list. A failure is recorded in the store's error state
    /// (and returned); the current list is kept.
    pub async fn load(&self) -> Result<()> {
        let result = self.guarded(self.repo.fetch_all()).await;

        let mut state = self.state.lock();
        if self.is_detached() {
            return Err(Error::Cancelled);
        }
        state.loading = false;
        match result {
            Ok(tasks) => {
                debug!(count = tasks.len(), "tasks loaded");
                state.tasks = tasks;
                state.error = None;
                Ok(())
            }
            Err(err) => {
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Creates a task and puts it at the front of the list.
    pub async fn create(&self, dto: CreateTaskDto) -> Result<Task> {
        if dto.title.trim().is_empty() {
            return Err(Error::validation("Title is required"));
        }
        self.ensure_attached()?;

        let payload = NewTask::from_dto(dto, Utc::now());
        let created = self.guarded(self.repo.create(&payload)).await?;

        let mut state = self.state.lock();
        if self.is_detached() {
            return Err(Error::Cancelled);
        }
        state.tasks.retain(|t| t.id != created.id);
        state.tasks.insert(0, created.clone());
        Ok(created)
    }

    /// Flips `complete` on the service and swaps in the returned task in place.
    pub async fn toggle_complete(&self, task: &Task) -> Result<Task> {
        self.ensure_attached()?;
        let ticket = self.state.lock().issue(&task.id);

        let result = self
            .guarded(self.repo.update(&task.id, !task.complete))
            .await;

        let mut state = self.state.lock();
        let latest = state.settle(&task.id, ticket);
        if self.is_detached() {
            return Err(Error::Cancelled);
        }
        let updated = result?;
        if latest {
            if let Some(slot) = state.tasks.iter_mut().find(|t| t.id == updated.id) {
                *slot = updated.clone();
            }
        } else {
            debug!(id = %task.id, "discarding stale toggle response");
        }
        Ok(updated)
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        self.ensure_attached()?;
        let ticket = self.state.lock().issue(id);

        let result = self.guarded(self.repo.delete(id)).await;

        let mut state = self.state.lock();
        let latest = state.settle(id, ticket);
        if self.is_detached() {
            return Err(Error::Cancelled);
        }
        result?;
        if latest {
            state.tasks.retain(|t| t.id != id);
        } else {
            debug!(%id, "discarding stale delete response");
        }
        Ok(())
    }

    /// Stops reconciliation for good and abandons in-flight calls.
    pub fn detach(&self) {
        self.cancel.cancel();
    }

    pub fn is_detached(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.lock();
        Snapshot {
            tasks: state.tasks.clone(),
            loading: state.loading,
            error: state.error.clone(),
        }
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().tasks.clone()
    }

    pub fn find(&self, id: &str) -> Option<Task> {
        self.state.lock().tasks.iter().find(|t| t.id == id).cloned()
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.state.lock().pending.contains_key(id)
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    fn ensure_attached(&self) -> Result<()> {
        if self.is_detached() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    async fn guarded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            result = call => result,
        }
    }
}
