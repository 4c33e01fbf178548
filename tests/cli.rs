//! Integration tests for the gitea-release binary.
//!
//! These tests run the CLI end to end. None of them reach a network: every
//! scenario fails verification before the remote check.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for running gitea-release with a clean environment.
fn gitea_release() -> Command {
    let mut cmd = Command::cargo_bin("gitea-release").unwrap();
    cmd.env_clear();
    cmd
}

fn write_context(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("context.json");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn help_flag_works() {
    gitea_release()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("publish"))
        .stdout(predicate::str::contains("add-channel"));
}

#[test]
fn version_flag_works() {
    gitea_release()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gitea-release"));
}

#[test]
fn verify_without_url_or_token_fails() {
    let dir = TempDir::new().unwrap();
    let ctx = write_context(
        &dir,
        r#"{"options": {"repositoryUrl": "https://gitea.io/test_user/test_repo.git"},
            "branch": {"name": "master", "type": "release"}, "nextRelease": {"gitTag": "v1.0.0"}}"#,
    );

    gitea_release()
        .args(["verify", "--context"])
        .arg(&ctx)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("ENOGITEAURL"))
        .stderr(predicate::str::contains("ENOGITEATOKEN"));
}

#[test]
fn verify_reports_invalid_options_from_file() {
    let dir = TempDir::new().unwrap();
    let ctx = write_context(
        &dir,
        r#"{"env": {"GITEA_TOKEN": "gitea_token"},
            "options": {"repositoryUrl": "not a repository"},
            "branch": {"name": "master", "type": "release"}, "nextRelease": {"gitTag": "v1.0.0"}}"#,
    );
    let config = dir.path().join("release.toml");
    std::fs::write(&config, "assets = 42\ngiteaUrl = \"https://gitea.io\"\n").unwrap();

    gitea_release()
        .args(["verify", "--context"])
        .arg(&ctx)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("EINVALIDASSETS"))
        .stderr(predicate::str::contains("EINVALIDGITEAURL"))
        .stderr(predicate::str::contains("gitea_token").not());
}

#[test]
fn publish_reports_verification_errors() {
    let dir = TempDir::new().unwrap();
    let ctx = write_context(&dir, r#"{"branch": {"name": "master", "type": "release"}, "nextRelease": {"gitTag": "v1.0.0"}}"#);

    gitea_release()
        .args(["publish", "--context"])
        .arg(&ctx)
        .args(["--options", r#"{"assets": ["dist/*"]}"#])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("ENOGITEAURL"));
}

#[test]
fn missing_context_file_fails() {
    gitea_release()
        .args(["verify", "--context", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read context file"));
}

#[test]
fn invalid_inline_options_fail() {
    let dir = TempDir::new().unwrap();
    let ctx = write_context(&dir, r#"{"branch": {"name": "master", "type": "release"}, "nextRelease": {"gitTag": "v1.0.0"}}"#);

    gitea_release()
        .args(["verify", "--context"])
        .arg(&ctx)
        .args(["--options", "{not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--options is not valid JSON"));
}
