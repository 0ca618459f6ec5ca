//! Remote task service access.
//!
//! [`HttpTaskClient`] speaks to a JSON resource at a configured base URL:
//! `GET base`, `POST base`, `PATCH base/{id}`, `DELETE base/{id}`. Each call
//! is a single attempt; retries are the caller's business.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::error;

use crate::error::{Error, Result};
use crate::models::{NewTask, Task};

/// Create/read/update/delete over tasks.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<Task>>;

    /// Persists a fully formed creation payload and returns the stored task
    /// with its service-assigned id.
    async fn create(&self, task: &NewTask) -> Result<Task>;

    /// Sets the `complete` flag and returns the task as persisted.
    async fn update(&self, id: &str, complete: bool) -> Result<Task>;

    async fn delete(&self, id: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct HttpTaskClient {
    http: reqwest::Client,
    base: Url,
}

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

impl HttpTaskClient {
    pub fn new(base: &str) -> Result<Self> {
        Self::with_timeout(base, DEFAULT_TIMEOUT)
    }

    /// A client whose every request gives up after `timeout`.
    pub fn with_timeout(base: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| Error::Config(format!("building http client: {err}")))?;
        Self::with_client(http, base)
    }

    pub fn with_client(http: reqwest::Client, base: &str) -> Result<Self> {
        let base = Url::parse(base)
            .map_err(|err| Error::Config(format!("invalid task service url `{base}`: {err}")))?;
        if base.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "task service url `{base}` cannot carry a task id"
            )));
        }
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn item_url(&self, id: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(id);
        }
        url
    }

    async fn get_tasks(&self) -> Result<Vec<Task>> {
        let res = self
            .http
            .get(self.base.clone())
            .send()
            .await
            .map_err(|err| network(err, "Unknown error fetching tasks"))?;
        if !res.status().is_success() {
            return Err(Error::Transport {
                status: Some(res.status().as_u16()),
                message: format!("Failed to load tasks ({})", res.status().as_u16()),
            });
        }
        decode(res, "Unknown error fetching tasks").await
    }

    async fn post_task(&self, task: &NewTask) -> Result<Task> {
        let res = self
            .http
            .post(self.base.clone())
            .json(task)
            .send()
            .await
            .map_err(|err| network(err, "Unknown error creating task"))?;
        let res = reject_with_body(res, "Failed to create task").await?;
        decode(res, "Unknown error creating task").await
    }

    async fn patch_complete(&self, id: &str, complete: bool) -> Result<Task> {
        let fallback = format!("Unknown error updating task {id}");
        let res = self
            .http
            .patch(self.item_url(id))
            .json(&json!({ "complete": complete }))
            .send()
            .await
            .map_err(|err| network(err, &fallback))?;
        let res = reject_with_body(res, "Failed to update task").await?;
        decode(res, &fallback).await
    }

    async fn delete_task(&self, id: &str) -> Result<()> {
        let res = self
            .http
            .delete(self.item_url(id))
            .send()
            .await
            .map_err(|err| network(err, &format!("Unknown error deleting task {id}")))?;
        if !res.status().is_success() {
            return Err(Error::Transport {
                status: Some(res.status().as_u16()),
                message: format!("Failed to delete task ({})", res.status().as_u16()),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for HttpTaskClient {
    async fn fetch_all(&self) -> Result<Vec<Task>> {
        self.get_tasks()
            .await
            .inspect_err(|err| error!(error = %err, "fetch tasks failed"))
    }

    async fn create(&self, task: &NewTask) -> Result<Task> {
        self.post_task(task)
            .await
            .inspect_err(|err| error!(error = %err, title = %task.title, "create task failed"))
    }

    async fn update(&self, id: &str, complete: bool) -> Result<Task> {
        self.patch_complete(id, complete)
            .await
            .inspect_err(|err| error!(error = %err, %id, "update task failed"))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.delete_task(id)
            .await
            .inspect_err(|err| error!(error = %err, %id, "delete task failed"))
    }
}

fn network(err: reqwest::Error, fallback: &str) -> Error {
    let message = err.to_string();
    Error::Transport {
        status: err.status().map(|s| s.as_u16()),
        message: if message.is_empty() {
            fallback.to_string()
        } else {
            message
        },
    }
}

/// Turns a non-2xx response into a transport error carrying the body text.
async fn reject_with_body(res: Response, what: &str) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let text = res.text().await.unwrap_or_default();
    Err(Error::Transport {
        status: Some(status.as_u16()),
        message: format!("{what} ({}): {text}", status.as_u16()),
    })
}

async fn decode<T: DeserializeOwned>(res: Response, fallback: &str) -> Result<T> {
    let status: StatusCode = res.status();
    let bytes = res.bytes().await.map_err(|err| network(err, fallback))?;
    serde_json::from_slice(&bytes).map_err(|err| {
        Error::Decode(format!(
            "unexpected task payload ({}): {err}",
            status.as_u16()
        ))
    })
}
