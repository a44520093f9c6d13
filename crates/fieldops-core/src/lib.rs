//! # fieldops-core
//!
//! Core domain vocabulary shared by every `FieldOps` crate: role and
//! status enums, prefixed ID generation, the organization clock, and
//! the department permission model.

#![deny(unsafe_code)]

pub mod clock;
pub mod errors;
pub mod ids;
pub mod permissions;
pub mod types;

pub use clock::OrgClock;
pub use errors::CoreError;
pub use ids::generate_id;
pub use permissions::{GranularActions, ModulePermission, WILDCARD_MODULE};
pub use types::{Recurrence, Role, TaskPriority, TaskStatus};
