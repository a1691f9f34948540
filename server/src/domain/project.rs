//! Project request validation, defaults and id generation.

use lightdeck_common::{
    CLONED_PROJECT_TYPE, CommandStep, DEFAULT_PROJECT_TYPE, ProcessSnapshot, Project,
    ProjectDraft,
};
use serde::Deserialize;

use crate::domain::command::{split_target_path, validate_process_name};
use crate::domain::error::DeckError;

/// Description given to records synthesised from unmapped processes.
pub const AUTO_MAPPED_DESCRIPTION: &str = "Auto-detected from PM2";

/// Body of a create-project request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProject {
    pub name: Option<String>,
    pub path: Option<String>,
    pub pm2_name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub build_steps: Vec<CommandStep>,
    #[serde(default)]
    pub deploy_steps: Vec<CommandStep>,
}

/// Body of a clone-project request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneProject {
    pub git_url: Option<String>,
    pub target_path: Option<String>,
    pub name: Option<String>,
    pub pm2_name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub build_steps: Vec<CommandStep>,
    #[serde(default)]
    pub deploy_steps: Vec<CommandStep>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn ensure_absolute(field: &str, path: &str) -> Result<(), DeckError> {
    if path.starts_with('/') {
        Ok(())
    } else {
        Err(DeckError::Validation(format!(
            "{field} must be an absolute path (got '{path}')"
        )))
    }
}

impl CreateProject {
    /// Resolve defaults: `pm2Name` falls back to `name`, `type` to `mern`.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::Validation`] when `name` or `path` is missing,
    /// `path` is relative, or the resolved `pm2Name` is not a usable process
    /// name.
    pub fn into_draft(self) -> Result<ProjectDraft, DeckError> {
        let (Some(name), Some(path)) = (non_blank(self.name), non_blank(self.path)) else {
            return Err(DeckError::Validation(
                "Project name and path are required".into(),
            ));
        };
        ensure_absolute("path", &path)?;
        let pm2_name = non_blank(self.pm2_name).unwrap_or_else(|| name.clone());
        validate_process_name(&pm2_name)?;
        Ok(ProjectDraft {
            pm2_name,
            name,
            path,
            description: self.description.unwrap_or_default(),
            kind: non_blank(self.kind).unwrap_or_else(|| DEFAULT_PROJECT_TYPE.to_string()),
            build_steps: self.build_steps,
            deploy_steps: self.deploy_steps,
            git_url: None,
        })
    }
}

/// A validated clone request: where to clone from and the record to create
/// once the clone has succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClonePlan {
    pub git_url: String,
    pub target_path: String,
    pub draft: ProjectDraft,
}

impl CloneProject {
    /// Validate and resolve defaults. Name and `pm2Name` default to the last
    /// segment of `targetPath`.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::Validation`] when `gitUrl` or `targetPath` is
    /// missing, `targetPath` is not an absolute directory path, or the
    /// resolved `pm2Name` is not a usable process name.
    pub fn into_plan(self) -> Result<ClonePlan, DeckError> {
        let (Some(git_url), Some(target_path)) =
            (non_blank(self.git_url), non_blank(self.target_path))
        else {
            return Err(DeckError::Validation(
                "gitUrl and targetPath are required".into(),
            ));
        };
        let (_, dir_name) = split_target_path(&target_path)?;
        let name = non_blank(self.name).unwrap_or_else(|| dir_name.to_string());
        let pm2_name = non_blank(self.pm2_name).unwrap_or_else(|| name.clone());
        validate_process_name(&pm2_name)?;
        let draft = ProjectDraft {
            pm2_name,
            name,
            path: target_path.clone(),
            description: non_blank(self.description)
                .unwrap_or_else(|| format!("Cloned from {git_url}")),
            kind: non_blank(self.kind).unwrap_or_else(|| CLONED_PROJECT_TYPE.to_string()),
            build_steps: self.build_steps,
            deploy_steps: self.deploy_steps,
            git_url: Some(git_url.clone()),
        };
        Ok(ClonePlan {
            git_url,
            target_path,
            draft,
        })
    }
}

/// Validate a new `path` supplied through an update.
///
/// # Errors
///
/// Returns [`DeckError::Validation`] for blank or relative paths.
pub fn validate_path_update(path: &str) -> Result<(), DeckError> {
    if path.trim().is_empty() {
        return Err(DeckError::Validation("path must not be empty".into()));
    }
    ensure_absolute("path", path)
}

/// Next project id: one above both the largest numeric id present and the
/// highest id ever handed out, so ids are never reused after a delete.
/// Non-numeric ids are ignored.
#[must_use]
pub fn next_project_id<'a>(existing: impl IntoIterator<Item = &'a str>, high_water: u64) -> u64 {
    existing
        .into_iter()
        .filter_map(|id| id.parse::<u64>().ok())
        .fold(high_water, u64::max)
        .saturating_add(1)
}

/// First project named exactly `name`.
#[must_use]
pub fn find_by_name<'a>(projects: &'a [Project], name: &str) -> Option<&'a Project> {
    projects.iter().find(|p| p.name == name)
}

/// Minimal record for a live process nobody registered.
///
/// The path is the supervisor's working directory when reported, otherwise
/// `<project_root>/<process name>`.
#[must_use]
pub fn auto_mapped_draft(process: &ProcessSnapshot, project_root: &str) -> ProjectDraft {
    let path = process.cwd().map_or_else(
        || format!("{}/{}", project_root.trim_end_matches('/'), process.name),
        str::to_string,
    );
    ProjectDraft {
        name: process.name.clone(),
        path,
        pm2_name: process.name.clone(),
        description: AUTO_MAPPED_DESCRIPTION.to_string(),
        kind: DEFAULT_PROJECT_TYPE.to_string(),
        build_steps: Vec::new(),
        deploy_steps: Vec::new(),
        git_url: None,
    }
}
