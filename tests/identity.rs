use covref::*;
use git2::Repository;
use std::ffi::OsString;
use tempfile::tempdir;

const VARS: [&str; 4] = [
    "GIT_AUTHOR_NAME",
    "GIT_AUTHOR_EMAIL",
    "GIT_COMMITTER_NAME",
    "GIT_COMMITTER_EMAIL",
];

fn clear_env() -> Vec<(&'static str, Option<OsString>)> {
    VARS.iter()
        .map(|k| {
            let v = std::env::var_os(k);
            std::env::remove_var(k);
            (*k, v)
        })
        .collect()
}

fn restore_env(saved: Vec<(&'static str, Option<OsString>)>) {
    for (k, v) in saved {
        match v {
            Some(v) => std::env::set_var(k, v),
            None => std::env::remove_var(k),
        }
    }
}

#[test]
#[serial_test::serial]
fn test_config_identity_wins_over_env() {
    let tmp = tempdir().unwrap();
    let repo = Repository::init(tmp.path()).unwrap();
    let saved = clear_env();
    std::env::set_var("GIT_AUTHOR_NAME", "Env User");
    std::env::set_var("GIT_AUTHOR_EMAIL", "env@example.com");
    let config = FileConfig {
        identity_name: Some("CI Build".into()),
        identity_email: Some("ci@example.com".into()),
        ..FileConfig::default()
    };
    let (id, src) = resolve_identity(&repo, &config);
    restore_env(saved);
    assert_eq!(id.name, "CI Build");
    assert!(src.contains("covref.toml"));
}

#[test]
#[serial_test::serial]
fn test_author_env_is_used() {
    let tmp = tempdir().unwrap();
    let repo = Repository::init(tmp.path()).unwrap();
    let saved = clear_env();
    std::env::set_var("GIT_AUTHOR_NAME", "Env User");
    std::env::set_var("GIT_AUTHOR_EMAIL", "env@example.com");
    let (id, src) = resolve_identity(&repo, &FileConfig::default());
    restore_env(saved);
    assert_eq!(
        id,
        Identity {
            name: "Env User".into(),
            email: "env@example.com".into()
        }
    );
    assert!(src.contains("GIT_AUTHOR_NAME"));
}

#[test]
#[serial_test::serial]
fn test_repo_config_used_without_env() {
    let tmp = tempdir().unwrap();
    let repo = Repository::init(tmp.path()).unwrap();
    repo.config()
        .unwrap()
        .set_str("user.name", "Repo User")
        .unwrap();
    repo.config()
        .unwrap()
        .set_str("user.email", "repo@example.com")
        .unwrap();
    let saved = clear_env();
    let (id, src) = resolve_identity(&repo, &FileConfig::default());
    restore_env(saved);
    assert_eq!(id.name, "Repo User");
    assert_eq!(id.email, "repo@example.com");
    assert!(src.contains("git config"));
}
