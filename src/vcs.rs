use crate::config::FileConfig;
use git2::{Repository, Status};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::Command;

const FALLBACK_NAME: &str = "Coverage Build";
const FALLBACK_EMAIL: &str = "coverage-build@localhost";

/// Author and committer identity for the reference commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    fn new(name: &str, email: &str) -> Self {
        Identity {
            name: name.to_string(),
            email: email.to_string(),
        }
    }
}

/// Check if Git is installed.
pub fn check_git_installed() -> bool {
    if let Ok(output) = Command::new("git").arg("--version").output() {
        output.status.success()
    } else {
        false
    }
}

/// Resolve the committer identity and describe its source for logging.
pub fn resolve_identity(repo: &Repository, config: &FileConfig) -> (Identity, String) {
    if let (Some(name), Some(email)) = (&config.identity_name, &config.identity_email) {
        return (Identity::new(name, email), "covref.toml [identity]".into());
    }
    if let (Ok(name), Ok(email)) = (
        std::env::var("GIT_AUTHOR_NAME"),
        std::env::var("GIT_AUTHOR_EMAIL"),
    ) {
        return (
            Identity::new(&name, &email),
            "env:GIT_AUTHOR_NAME/GIT_AUTHOR_EMAIL".into(),
        );
    }
    if let (Ok(name), Ok(email)) = (
        std::env::var("GIT_COMMITTER_NAME"),
        std::env::var("GIT_COMMITTER_EMAIL"),
    ) {
        return (
            Identity::new(&name, &email),
            "env:GIT_COMMITTER_NAME/GIT_COMMITTER_EMAIL".into(),
        );
    }
    if let Ok(cfg) = repo.config() {
        let name = cfg.get_string("user.name").ok();
        let email = cfg.get_string("user.email").ok();
        if let (Some(name), Some(email)) = (name, email) {
            return (
                Identity::new(&name, &email),
                "git config (repo/global)".into(),
            );
        }
    }
    (
        Identity::new(FALLBACK_NAME, FALLBACK_EMAIL),
        "covref fallback".into(),
    )
}

/// Open the repository containing `path` and return it with `path` relative to its workdir.
pub fn locate_in_repository(path: &Path) -> Result<(Repository, PathBuf), Box<dyn Error>> {
    let absolute = path
        .canonicalize()
        .map_err(|e| format!("cannot resolve '{}': {}", path.display(), e))?;
    let start = absolute.parent().ok_or("reference file has no parent directory")?;
    let repo = Repository::discover(start)
        .map_err(|_| format!("'{}' is not inside a git repository", start.display()))?;
    let workdir = repo
        .workdir()
        .ok_or("cannot commit into a bare repository")?
        .canonicalize()?;
    let relative = absolute
        .strip_prefix(&workdir)
        .map_err(|_| format!("'{}' is outside '{}'", absolute.display(), workdir.display()))?
        .to_path_buf();
    Ok((repo, relative))
}

fn workdir_of(repo: &Repository) -> Result<PathBuf, Box<dyn Error>> {
    Ok(repo
        .workdir()
        .ok_or("cannot commit into a bare repository")?
        .to_path_buf())
}

/// Stage and commit the reference file alone. Returns `false` when nothing was committed.
pub fn commit_reference(
    reference: &Path,
    config: &FileConfig,
    message: &str,
    dry_run: bool,
) -> Result<bool, Box<dyn Error>> {
    let (repo, relative) = locate_in_repository(reference)?;
    let workdir = workdir_of(&repo)?;
    let (identity, source) = resolve_identity(&repo, config);
    log::debug!(
        "Committing as {} <{}> (from {})",
        identity.name,
        identity.email,
        source
    );

    if dry_run {
        log::info!(
            "[dry-run] Would run: git -C {} add {}",
            workdir.display(),
            relative.display()
        );
        log::info!(
            "[dry-run] Would run: git -C {} commit -m \"{}\" -- {}",
            workdir.display(),
            message,
            relative.display()
        );
        return Ok(false);
    }

    let status = repo.status_file(&relative)?;
    if status.contains(Status::IGNORED) {
        return Err(format!("'{}' is ignored by git", relative.display()).into());
    }
    if status.is_empty() {
        log::info!(
            "'{}' is unchanged against HEAD; nothing to commit.",
            relative.display()
        );
        return Ok(false);
    }

    let add = Command::new("git")
        .arg("-C")
        .arg(&workdir)
        .arg("add")
        .arg("--")
        .arg(&relative)
        .status()?;
    if !add.success() {
        return Err("failed to stage coverage reference".into());
    }

    let commit = Command::new("git")
        .arg("-C")
        .arg(&workdir)
        .arg("-c")
        .arg(format!("user.name={}", identity.name))
        .arg("-c")
        .arg(format!("user.email={}", identity.email))
        .arg("commit")
        .arg("-m")
        .arg(message)
        .arg("--")
        .arg(&relative)
        // Author/committer env vars outrank `-c user.*`, so pin them too.
        .env("GIT_AUTHOR_NAME", &identity.name)
        .env("GIT_AUTHOR_EMAIL", &identity.email)
        .env("GIT_COMMITTER_NAME", &identity.name)
        .env("GIT_COMMITTER_EMAIL", &identity.email)
        .status()?;
    if !commit.success() {
        return Err("failed to commit coverage reference".into());
    }
    log::info!("Committed '{}'", relative.display());
    Ok(true)
}

/// Push the current branch of the repository containing `dir` to `remote`.
pub fn push_reference(
    dir: &Path,
    remote: &str,
    refspec: &str,
    dry_run: bool,
) -> Result<(), Box<dyn Error>> {
    let repo = Repository::discover(dir)
        .map_err(|_| format!("'{}' is not inside a git repository", dir.display()))?;
    repo.find_remote(remote)
        .map_err(|_| format!("remote '{}' not found", remote))?;
    let workdir = workdir_of(&repo)?;

    if dry_run {
        log::info!(
            "[dry-run] Would run: git -C {} push {} {}",
            workdir.display(),
            remote,
            refspec
        );
        return Ok(());
    }

    let status = Command::new("git")
        .arg("-C")
        .arg(&workdir)
        .arg("push")
        .arg(remote)
        .arg(refspec)
        .status()?;
    if !status.success() {
        return Err("failed to push coverage reference".into());
    }
    log::info!("Pushed '{}' to '{}'", refspec, remote);
    Ok(())
}
