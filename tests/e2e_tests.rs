//! End-to-end tests for the depbot CLI
//!
//! These tests verify:
//! - Required configuration is enforced at startup
//! - Help and version output
//! - Exit behavior when the configured host is unreachable

use assert_cmd::Command;
use predicates::prelude::*;

/// Environment variables the CLI reads; cleared so ambient CI settings
/// cannot leak into the assertions
const CLI_ENV: [&str; 7] = [
    "PROJECT_PATH",
    "GITLAB_ORGANIZATION",
    "GITLAB_HOSTNAME",
    "GITLAB_ACCESS_TOKEN",
    "GITHUB_ACCESS_TOKEN",
    "LOCAL_CONFIG_VARIABLES",
    "MR_LIMIT_PER_REPO",
];

fn depbot() -> Command {
    let mut cmd = Command::cargo_bin("depbot").expect("binary builds");
    for var in CLI_ENV {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help_lists_configuration_options() {
    depbot()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--project"))
        .stdout(predicate::str::contains("--gitlab-token"))
        .stdout(predicate::str::contains("--mr-limit"))
        .stdout(predicate::str::contains("--resolver"));
}

#[test]
fn test_version() {
    depbot()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("depbot"));
}

#[test]
fn test_missing_project_is_rejected() {
    depbot()
        .args(["--gitlab-token", "glpat-secret"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--project"));
}

#[test]
fn test_missing_token_is_rejected() {
    depbot()
        .args(["--project", "acme/widgets"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--gitlab-token"));
}

#[test]
fn test_malformed_extra_credentials_fail_at_startup() {
    depbot()
        .args([
            "--project",
            "acme/widgets",
            "--gitlab-token",
            "glpat-secret",
            "--extra-credentials",
            "{not json",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid extra credentials"));
}

#[test]
fn test_unreachable_host_completes_without_panicking() {
    // The repository lookup fails and the run logs and exits cleanly
    depbot()
        .args([
            "--project",
            "acme/widgets",
            "--gitlab-token",
            "glpat-secret",
            "--gitlab-hostname",
            "host.invalid",
        ])
        .timeout(std::time::Duration::from_secs(60))
        .assert()
        .success();
}
