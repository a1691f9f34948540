//! Structural tests for layer boundary enforcement.
//!
//! These scan source files so that the domain stays pure and the
//! application layer depends only on ports.

use std::path::{Path, PathBuf};

fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Non-comment lines outside `#[cfg(test)]` blocks, with line numbers.
fn production_lines(path: &Path) -> Vec<(usize, String)> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    let mut lines = Vec::new();
    let mut depth = 0i32;
    let mut test_start: Option<i32> = None;
    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with("#[cfg(test)]") || trimmed.starts_with("#[cfg(all(test") {
            test_start = Some(depth);
        }
        if test_start.is_none() && !trimmed.starts_with("//") {
            lines.push((i + 1, line.to_string()));
        }
        for ch in line.chars() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if test_start.is_some_and(|start| depth <= start) {
                        test_start = None;
                    }
                }
                _ => {}
            }
        }
    }
    lines
}

fn violations(layer: &str, forbidden: &[&str]) -> Vec<String> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let mut found = Vec::new();
    for file in collect_rs_files(&root.join("src").join(layer)) {
        let rel = file.strip_prefix(root).unwrap_or(&file).display().to_string();
        for (lineno, line) in production_lines(&file) {
            for needle in forbidden {
                if line.contains(needle) {
                    found.push(format!("{rel}:{lineno}: `{needle}`: {}", line.trim()));
                }
            }
        }
    }
    found
}

#[test]
fn domain_is_pure() {
    let found = violations(
        "domain",
        &[
            "crate::infra",
            "crate::api",
            "crate::application",
            "tokio",
            "std::fs",
            "std::process",
            "std::net",
        ],
    );
    assert!(found.is_empty(), "domain/ must stay free of I/O:\n{}", found.join("\n"));
}

#[test]
fn application_depends_only_on_ports() {
    let found = violations("application", &["crate::infra", "crate::api"]);
    assert!(
        found.is_empty(),
        "application/ must not import infra/ or api/:\n{}",
        found.join("\n")
    );
}

#[test]
fn infra_does_not_import_api() {
    let found = violations("infra", &["crate::api"]);
    assert!(found.is_empty(), "infra/ must not import api/:\n{}", found.join("\n"));
}

#[test]
fn infra_has_no_print_macros_outside_tests() {
    let found = violations("infra", &["println!", "eprintln!"]);
    assert!(
        found.is_empty(),
        "infra/ must log through tracing:\n{}",
        found.join("\n")
    );
}
