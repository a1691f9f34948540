/// Valkey key layout for lightdeck state.
pub mod keys {
    /// Project records
    /// Format: lightdeck:projects (hash)
    /// Field: project id
    /// Value: JSON-serialized Project
    pub const PROJECTS: &str = "lightdeck:projects";

    /// Highest project id ever assigned
    /// Format: lightdeck:projects:seq
    /// Value: decimal integer, only ever raised
    pub const PROJECT_SEQ: &str = "lightdeck:projects:seq";

    /// Name index enforcing unique project names
    /// Format: lightdeck:projects:names (hash)
    /// Field: project name
    /// Value: id of the project holding it
    pub const PROJECT_NAMES: &str = "lightdeck:projects:names";
}

/// Validate that a project id is a positive decimal integer without sign or
/// leading zeros (the only form the id generator produces).
///
/// SECURITY: call before using untrusted input as a hash field or in a path.
pub fn validate_project_id(id: &str) -> Result<(), &'static str> {
    if id.is_empty() {
        return Err("project id must not be empty");
    }
    if id.len() > 20 {
        return Err("project id is too long");
    }
    if !id.chars().all(|c| c.is_ascii_digit()) {
        return Err("project id must be decimal digits");
    }
    if id.starts_with('0') {
        return Err("project id must not start with 0");
    }
    Ok(())
}
