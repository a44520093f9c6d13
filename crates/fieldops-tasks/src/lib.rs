//! # fieldops-tasks
//!
//! Task management: CRUD with role-gated updates, the approve/deliver
//! workflow, comments, and the pure recurrence evaluator used by the
//! calendar views.

#![deny(unsafe_code)]

pub mod errors;
pub mod recurrence;
pub mod repository;
pub mod service;
pub mod types;

pub use errors::TaskError;
pub use recurrence::occurs_on;
pub use repository::{AssigneeStats, TaskRepository};
pub use service::{TaskCreateRequest, TaskService};
pub use types::{
    CommentView, Task, TaskCreateParams, TaskFilter, TaskUpdateParams, TaskVisibility,
};
