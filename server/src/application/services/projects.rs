//! Application service: project use-cases.
//!
//! Name lookups, uniqueness checks and the project-scoped remote actions
//! (clone, build, deploy) live here; the store only persists.

use std::sync::Arc;

use lightdeck_common::{
    BuildReport, CommandReport, Project, ProjectDraft, ProjectPatch, validate_project_id,
};
use serde::Serialize;

use crate::application::ports::{ProjectStore, StoreWrite};
use crate::application::services::remote::RemoteOps;
use crate::domain::command::validate_process_name;
use crate::domain::project::{self, CloneProject, CreateProject, validate_path_update};
use crate::domain::DeckError;

const DUPLICATE_NAME: &str = "Project with this name already exists";

/// What a build produced: the layout-driven sequence, or the project's own
/// build steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BuildOutcome {
    Layout(BuildReport),
    Steps(CommandReport),
}

impl BuildOutcome {
    #[must_use]
    pub fn success(&self) -> bool {
        match self {
            Self::Layout(r) => r.report.success,
            Self::Steps(r) => r.success,
        }
    }
}

/// A registered clone and the output of the `git clone` that preceded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneOutcome {
    pub project: Project,
    pub output: String,
}

#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn ProjectStore>,
    ops: RemoteOps,
}

impl ProjectService {
    #[must_use]
    pub fn new(store: Arc<dyn ProjectStore>, ops: RemoteOps) -> Self {
        Self { store, ops }
    }

    /// # Errors
    ///
    /// [`DeckError::Store`] when the store cannot be read.
    pub async fn list(&self) -> Result<Vec<Project>, DeckError> {
        Ok(self.store.list().await?)
    }

    /// The project named `name`.
    ///
    /// # Errors
    ///
    /// [`DeckError::NotFound`] when no project has that name.
    pub async fn find_by_name(&self, name: &str) -> Result<Project, DeckError> {
        let projects = self.store.list().await?;
        project::find_by_name(&projects, name)
            .cloned()
            .ok_or_else(|| DeckError::NotFound(format!("Project '{name}' not found")))
    }

    async fn ensure_name_free(&self, name: &str, except_id: Option<&str>) -> Result<(), DeckError> {
        let projects = self.store.list().await?;
        let taken = projects
            .iter()
            .any(|p| p.name == name && Some(p.id.as_str()) != except_id);
        if taken {
            return Err(DeckError::Conflict(DUPLICATE_NAME.into()));
        }
        Ok(())
    }

    /// Persist `draft`; the store refuses a name claimed since the last check.
    async fn insert(&self, draft: ProjectDraft) -> Result<Project, DeckError> {
        match self.store.insert(draft).await? {
            StoreWrite::Stored(project) => Ok(project),
            StoreWrite::NameTaken | StoreWrite::Missing => {
                Err(DeckError::Conflict(DUPLICATE_NAME.into()))
            }
        }
    }

    /// Validate, reject duplicate names, persist.
    ///
    /// # Errors
    ///
    /// [`DeckError::Validation`], [`DeckError::Conflict`] or
    /// [`DeckError::Store`].
    pub async fn create(&self, req: CreateProject) -> Result<Project, DeckError> {
        let draft = req.into_draft()?;
        self.ensure_name_free(&draft.name, None).await?;
        let project = self.insert(draft).await?;
        tracing::info!(project_id = %project.id, name = %project.name, "project created");
        Ok(project)
    }

    /// Clone the repository, then register the working copy as a project.
    /// Nothing is stored when the clone does not succeed.
    ///
    /// # Errors
    ///
    /// Validation and conflict errors before anything runs remotely,
    /// [`DeckError::DirectoryExists`] and shell errors from the clone, and
    /// [`DeckError::RemoteFailed`] when `git clone` itself fails.
    pub async fn clone_project(&self, req: CloneProject) -> Result<CloneOutcome, DeckError> {
        let plan = req.into_plan()?;
        self.ensure_name_free(&plan.draft.name, None).await?;

        let report = self
            .ops
            .clone_repository(&plan.git_url, &plan.target_path)
            .await?;
        if !report.report.success {
            return Err(DeckError::RemoteFailed {
                message: "Failed to clone repository".into(),
                details: report.report.error,
            });
        }

        let project = self.insert(plan.draft).await?;
        tracing::info!(
            project_id = %project.id,
            name = %project.name,
            path = %report.path,
            "cloned project registered"
        );
        Ok(CloneOutcome {
            project,
            output: report.report.output,
        })
    }

    /// Merge `patch` into project `id`.
    ///
    /// # Errors
    ///
    /// [`DeckError::Validation`] for a malformed id, path or `pm2Name`,
    /// [`DeckError::Conflict`] when renaming onto another project's name,
    /// [`DeckError::NotFound`] when `id` is unknown.
    pub async fn update(&self, id: &str, patch: ProjectPatch) -> Result<Project, DeckError> {
        validate_project_id(id).map_err(|e| DeckError::Validation(e.into()))?;
        if let Some(path) = patch.path.as_deref() {
            validate_path_update(path)?;
        }
        if let Some(name) = patch.name.as_deref() {
            if name.trim().is_empty() {
                return Err(DeckError::Validation("name must not be empty".into()));
            }
            self.ensure_name_free(name, Some(id)).await?;
        }
        if let Some(pm2_name) = patch.pm2_name.as_deref() {
            validate_process_name(pm2_name)?;
        }
        let project = match self.store.update(id, patch).await? {
            StoreWrite::Stored(project) => project,
            StoreWrite::NameTaken => return Err(DeckError::Conflict(DUPLICATE_NAME.into())),
            StoreWrite::Missing => {
                return Err(DeckError::NotFound(format!("Project {id} not found")));
            }
        };
        tracing::info!(project_id = %project.id, name = %project.name, "project updated");
        Ok(project)
    }

    /// # Errors
    ///
    /// [`DeckError::Validation`] for a malformed id, [`DeckError::NotFound`]
    /// when `id` is unknown.
    pub async fn delete(&self, id: &str) -> Result<(), DeckError> {
        validate_project_id(id).map_err(|e| DeckError::Validation(e.into()))?;
        if !self.store.delete(id).await? {
            return Err(DeckError::NotFound(format!("Project {id} not found")));
        }
        tracing::info!(project_id = %id, "project deleted");
        Ok(())
    }

    /// Run the project's build steps if it has any, otherwise the
    /// layout-driven build.
    ///
    /// # Errors
    ///
    /// [`DeckError::NotFound`] for an unknown project, plus remote errors.
    pub async fn build(&self, name: &str) -> Result<BuildOutcome, DeckError> {
        let project = self.find_by_name(name).await?;
        if project.build_steps.is_empty() {
            self.ops.build(&project.path).await.map(BuildOutcome::Layout)
        } else {
            self.ops
                .run_steps(&project.path, &project.build_steps, Some(&project.pm2_name))
                .await
                .map(BuildOutcome::Steps)
        }
    }

    /// Run the project's deploy steps if it has any, otherwise the standard
    /// pull/install/build/restart-or-start sequence.
    ///
    /// # Errors
    ///
    /// [`DeckError::NotFound`] for an unknown project, plus remote errors.
    pub async fn deploy(&self, name: &str) -> Result<CommandReport, DeckError> {
        let project = self.find_by_name(name).await?;
        if project.deploy_steps.is_empty() {
            self.ops.deploy(&project.path, &project.pm2_name).await
        } else {
            self.ops
                .run_steps(&project.path, &project.deploy_steps, Some(&project.pm2_name))
                .await
        }
    }

    /// # Errors
    ///
    /// [`DeckError::NotFound`] for an unknown project, plus remote errors.
    pub async fn deploy_script(&self, name: &str) -> Result<CommandReport, DeckError> {
        let project = self.find_by_name(name).await?;
        self.ops.deploy_script(&project.path).await
    }
}
