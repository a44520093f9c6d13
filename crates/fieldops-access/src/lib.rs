//! # fieldops-access
//!
//! Authorization: who can see whose records ([`Scope`]), what a
//! department may do per module ([`permissions`]), and which task
//! status transitions each role may perform ([`transitions`]).

#![deny(unsafe_code)]

pub mod errors;
pub mod permissions;
pub mod scope;
pub mod transitions;

pub use errors::AccessError;
pub use permissions::has_permission;
pub use scope::{is_in_scope, resolve_scope, Scope};
pub use transitions::{approve_transition, deliver_transition, direct_status_allowed};
