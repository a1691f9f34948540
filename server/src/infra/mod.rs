//! Infrastructure layer: concrete implementations of application port traits.
//!
//! Everything that performs I/O lives here: the `ssh` child processes behind
//! [`RemoteShell`](crate::application::RemoteShell), the Valkey and
//! in-memory [`ProjectStore`](crate::application::ProjectStore)s, and
//! environment configuration loading.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::api` are forbidden.

pub mod config;
pub mod memory_store;
pub mod ssh;
pub mod valkey_store;

pub use memory_store::MemoryProjectStore;
pub use ssh::SshExecutor;
pub use valkey_store::ValkeyProjectStore;
