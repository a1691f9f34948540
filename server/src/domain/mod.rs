//! Domain layer: pure logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::api`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod command;
pub mod error;
pub mod project;
pub mod reconcile;

pub use command::{Pm2Cli, StartSpec, shell_quote, validate_process_name};
pub use error::{DeckError, ErrorKind};
pub use project::{CloneProject, CreateProject, next_project_id};
pub use reconcile::{Reconciliation, SyncReport, reconcile};
