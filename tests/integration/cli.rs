//! End-to-end tests of the `dwflatten` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary project with an isolated, empty configuration file.
struct CliProject {
    temp: TempDir,
}

impl CliProject {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.toml"), "namespace = \"user-ns\"\n").unwrap();
        Self {
            temp,
        }
    }

    fn path(&self) -> &Path {
        self.temp.path()
    }

    fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("dwflatten").unwrap();
        cmd.current_dir(self.path())
            .env("DWFLATTEN_CONFIG", self.path().join("config.toml"))
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }

    fn write_templates(&self) {
        self.write(
            "templates/che-code.yaml",
            r#"
apiVersion: workspace.devfile.io/v1alpha2
kind: DevWorkspaceTemplate
metadata:
  name: che-code
  labels:
    devworkspace.devfile.io/editor-name: che-code
spec:
  components:
    - name: che-code-injector
      container:
        image: quay.io/che-incubator/che-code
  commands:
    - id: init-che-code
      apply: {component: che-code-injector}
"#,
        );
        self.write(
            "templates/legacy-extension.yaml",
            r#"
apiVersion: workspace.devfile.io/v1alpha2
kind: DevWorkspaceTemplate
metadata:
  name: legacy-extension
  labels:
    devworkspace.devfile.io/editor-compatibility: theia
spec:
  components:
    - name: extension
      container: {image: extension}
"#,
        );
    }
}

const FLAT_DEVFILE: &str = r#"
schemaVersion: 2.2.0
metadata:
  name: flat
variables:
  tag: "1.0"
components:
  - name: tools
    container:
      image: "quay.io/devfile/universal-developer-image:{{tag}}"
"#;

#[test]
fn test_resolve_flat_devfile() {
    let project = CliProject::new();
    project.write("devfile.yaml", FLAT_DEVFILE);

    project
        .command()
        .arg("resolve")
        .arg("devfile.yaml")
        .assert()
        .success()
        .stdout(predicate::str::contains("name: tools"))
        .stdout(predicate::str::contains("universal-developer-image:1.0"));
}

#[test]
fn test_resolve_json_output() {
    let project = CliProject::new();
    project.write("devfile.yaml", FLAT_DEVFILE);

    let output = project.command().args(["resolve", "devfile.yaml", "--format", "json"]).output().unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["components"][0]["name"], "tools");
    assert_eq!(value["components"][0]["container"]["image"], "quay.io/devfile/universal-developer-image:1.0");
}

#[test]
fn test_resolve_devworkspace_with_templates_dir() {
    let project = CliProject::new();
    project.write_templates();
    project.write(
        "workspace.yaml",
        r#"
apiVersion: workspace.devfile.io/v1alpha2
kind: DevWorkspace
metadata:
  name: my-workspace
spec:
  started: true
  template:
    components:
      - name: tools
        container: {image: tools}
  contributions:
    - name: editor
      kubernetes: {name: che-code}
"#,
    );

    project
        .command()
        .args(["resolve", "workspace.yaml", "--templates-dir", "templates"])
        .assert()
        .success()
        .stdout(predicate::str::contains("che-code-injector"))
        .stdout(predicate::str::contains("controller.devfile.io/imported-by: editor"));
}

#[test]
fn test_check_prints_tree() {
    let project = CliProject::new();
    project.write_templates();
    project.write(
        "devfile.yaml",
        "schemaVersion: 2.2.0\ncomponents:\n  - name: editor\n    plugin:\n      kubernetes: {name: che-code}\n",
    );

    project
        .command()
        .args(["check", "devfile.yaml", "--templates-dir", "templates"])
        .assert()
        .success()
        .stdout(predicate::str::contains("devworkspace\n└── editor (kubernetes che-code)"))
        .stdout(predicate::str::contains("1 plugin(s) compatible"));
}

#[test]
fn test_check_reports_incompatible_plugins() {
    let project = CliProject::new();
    project.write_templates();
    project.write(
        "devfile.yaml",
        r#"
schemaVersion: 2.2.0
components:
  - name: editor
    plugin:
      kubernetes: {name: che-code}
  - name: ext
    plugin:
      kubernetes: {name: legacy-extension}
"#,
    );

    project
        .command()
        .args(["check", "devfile.yaml", "--templates-dir", "templates"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("but plugins [ext] depend on editor theia"));

    project
        .command()
        .args(["resolve", "devfile.yaml", "--templates-dir", "templates", "--check-compatibility"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_missing_template_is_reported() {
    let project = CliProject::new();
    project.write_templates();
    project.write(
        "devfile.yaml",
        "schemaVersion: 2.2.0\ncomponents:\n  - name: ghost\n    plugin:\n      kubernetes: {name: does-not-exist}\n",
    );

    project
        .command()
        .args(["resolve", "devfile.yaml", "--templates-dir", "templates"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("plugin for component ghost not found"));
}

#[test]
fn test_invalid_reference_is_reported() {
    let project = CliProject::new();
    project.write(
        "devfile.yaml",
        "schemaVersion: 2.2.0\ncomponents:\n  - name: broken\n    plugin: {}\n",
    );

    project
        .command()
        .args(["resolve", "devfile.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid import reference for 'broken'"));
}

#[test]
fn test_missing_input_file() {
    let project = CliProject::new();

    project
        .command()
        .args(["resolve", "nope.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("nope.yaml"));
}

#[test]
fn test_explicit_missing_config_fails() {
    let project = CliProject::new();
    project.write("devfile.yaml", FLAT_DEVFILE);

    project
        .command()
        .args(["--config", "missing.toml", "resolve", "devfile.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.toml"));
}

#[test]
fn test_undefined_variables_warn_on_stderr() {
    let project = CliProject::new();
    project.write(
        "devfile.yaml",
        "schemaVersion: 2.2.0\ncomponents:\n  - name: tools\n    container: {image: \"img:{{missing}}\"}\n",
    );

    project
        .command()
        .args(["resolve", "devfile.yaml"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Warning:"))
        .stderr(predicate::str::contains("missing"));
}
