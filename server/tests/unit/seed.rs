//! Seeding from the bundled YAML fixture.

use std::path::Path;
use std::sync::Arc;

use lightdeck::app::{load_seed_file, seed_projects};
use lightdeck::application::services::{ProjectService, RemoteOps};
use lightdeck::infra::MemoryProjectStore;

use crate::helpers::{ScriptedShell, pm2};

fn fixture() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/projects.yaml")
}

#[test]
fn fixture_parses_with_mixed_step_forms() {
    let defs = load_seed_file(&fixture()).expect("load");
    assert_eq!(defs.len(), 3);
    assert_eq!(defs[0].build_steps.len(), 4);
    assert_eq!(defs[1].build_steps[2].command(), "npm run build");
    assert_eq!(defs[1].pm2_name.as_deref(), Some("harbor-hub-prod"));
}

#[test]
fn missing_seed_file_is_an_error() {
    let err = load_seed_file(Path::new("/nonexistent/projects.yaml")).expect_err("missing");
    assert!(err.to_string().contains("/nonexistent/projects.yaml"));
}

#[tokio::test]
async fn seeding_twice_skips_existing_names() {
    let store = Arc::new(MemoryProjectStore::new());
    let svc = ProjectService::new(store, RemoteOps::new(ScriptedShell::replying(vec![]), pm2()));

    let first = seed_projects(&svc, load_seed_file(&fixture()).expect("load"))
        .await
        .expect("seed");
    assert_eq!(first.created, ["feedback-reviewer", "harbor-hub", "bulletin-checker"]);
    assert!(first.skipped.is_empty());

    let second = seed_projects(&svc, load_seed_file(&fixture()).expect("load"))
        .await
        .expect("seed");
    assert!(second.created.is_empty());
    assert_eq!(second.skipped.len(), 3);

    let projects = svc.list().await.expect("list");
    assert_eq!(projects.len(), 3);
    assert_eq!(projects[1].pm2_name, "harbor-hub-prod");
    assert_eq!(projects[2].kind, "node");
}
