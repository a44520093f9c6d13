//! # fieldops-users
//!
//! The directory: user and department CRUD, department permission
//! administration, the activity audit log, and the two user-deletion
//! modes (soft anonymize, hard delete with reassign/purge).

#![deny(unsafe_code)]

pub mod errors;
pub mod repository;
pub mod service;
pub mod types;

pub use errors::UsersError;
pub use repository::{
    ActivityLogRepository, DepartmentRepository, PermissionRepository, UserRepository,
};
pub use service::DirectoryService;
pub use types::{
    ActivityEntry, Department, DepartmentCreateParams, DepartmentUpdateParams, DependentCounts,
    PermissionEntry, User, UserCreateParams, UserUpdateParams,
};
