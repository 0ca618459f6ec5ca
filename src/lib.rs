//! Task tracking against a remote task service: a repository client, the
//! in-memory task store, the filter/paginate pipeline, and the page state
//! that ties them together.

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod store;
pub mod view;
pub mod web;

pub use client::{HttpTaskClient, TaskRepository};
pub use error::{Error, Result};
pub use models::{CreateTaskDto, DateRange, DueState, NewTask, StatusFilter, Task};
pub use store::{Snapshot, TaskStore};
pub use view::{PageController, PageView, ViewController};
