//! Application services: use-case orchestration.
//!
//! Each service composes domain logic with port trait calls. Services import
//! only from `crate::domain` and `crate::application::ports`, never from
//! `crate::infra` or `crate::api`.

pub mod projects;
pub mod remote;
pub mod sync;

pub use projects::{BuildOutcome, CloneOutcome, ProjectService};
pub use remote::RemoteOps;
pub use sync::SyncService;
