//! # fieldops-settings
//!
//! Settings for the server binary: compiled defaults, deep-merged JSON
//! file overrides, and `FIELDOPS_*` environment overrides on top.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::SettingsError;
pub use loader::{load_settings_from_path, settings_path};
pub use types::{AuthSettings, DatabaseSettings, FieldOpsSettings, OrgSettings, ServerSettings};
