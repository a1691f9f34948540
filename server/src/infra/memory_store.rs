//! In-process `ProjectStore`, used with `LIGHTDECK_STORE=memory` and in tests.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use lightdeck_common::{Project, ProjectDraft, ProjectPatch};
use tokio::sync::RwLock;

use crate::application::ports::{ProjectStore, StoreStatus, StoreWrite};
use crate::domain::next_project_id;

#[derive(Debug, Default)]
struct Inner {
    /// Keyed by numeric id so iteration is in id order.
    projects: BTreeMap<u64, Project>,
    high_water: u64,
}

impl Inner {
    fn name_holder(&self, name: &str) -> Option<u64> {
        self.projects
            .iter()
            .find(|(_, p)| p.name == name)
            .map(|(id, _)| *id)
    }
}

/// Projects held in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryProjectStore {
    inner: RwLock<Inner>,
}

impl MemoryProjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn list(&self) -> Result<Vec<Project>> {
        Ok(self.inner.read().await.projects.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Project>> {
        let Ok(key) = id.parse::<u64>() else {
            return Ok(None);
        };
        Ok(self.inner.read().await.projects.get(&key).cloned())
    }

    async fn insert(&self, draft: ProjectDraft) -> Result<StoreWrite> {
        let mut inner = self.inner.write().await;
        if inner.name_holder(&draft.name).is_some() {
            return Ok(StoreWrite::NameTaken);
        }
        let id = next_project_id(
            inner.projects.values().map(|p| p.id.as_str()),
            inner.high_water,
        );
        let project = draft.into_project(id.to_string(), Utc::now());
        inner.projects.insert(id, project.clone());
        inner.high_water = id;
        tracing::debug!(project_id = id, name = %project.name, "stored project");
        Ok(StoreWrite::Stored(project))
    }

    async fn update(&self, id: &str, patch: ProjectPatch) -> Result<StoreWrite> {
        let Ok(key) = id.parse::<u64>() else {
            return Ok(StoreWrite::Missing);
        };
        let mut inner = self.inner.write().await;
        if !inner.projects.contains_key(&key) {
            return Ok(StoreWrite::Missing);
        }
        let renamed_onto_other = patch
            .name
            .as_deref()
            .and_then(|name| inner.name_holder(name))
            .is_some_and(|holder| holder != key);
        if renamed_onto_other {
            return Ok(StoreWrite::NameTaken);
        }
        let Some(project) = inner.projects.get_mut(&key) else {
            return Ok(StoreWrite::Missing);
        };
        project.apply(patch, Utc::now());
        Ok(StoreWrite::Stored(project.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let Ok(key) = id.parse::<u64>() else {
            return Ok(false);
        };
        Ok(self.inner.write().await.projects.remove(&key).is_some())
    }

    async fn status(&self) -> StoreStatus {
        StoreStatus {
            backend: "memory",
            connected: true,
            message: "In-memory store (not persisted)".into(),
        }
    }
}
