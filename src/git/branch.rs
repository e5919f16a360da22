//! Current branch lookup using libgit2
//!
//! The lookup is read-only: it opens the repository, reads `HEAD` and
//! returns the short branch name. Unborn branches (fresh repositories with
//! no commits) resolve to the branch `HEAD` points at.

use crossbeam_channel::{bounded, RecvTimeoutError};
use git2::Repository;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default upper bound for a branch lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum VcsLookupError {
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("HEAD is detached")]
    Detached,

    #[error("branch lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("branch lookup worker exited without a result")]
    WorkerLost,
}

/// Read-only query for the branch a project is on
pub trait BranchLookup {
    fn current_branch(&self, project_root: &Path) -> Result<String, VcsLookupError>;
}

/// Branch lookup against the git repository containing the project root.
#[derive(Debug, Clone)]
pub struct GitBranchLookup {
    timeout: Duration,
}

impl Default for GitBranchLookup {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKUP_TIMEOUT)
    }
}

impl GitBranchLookup {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl BranchLookup for GitBranchLookup {
    fn current_branch(&self, project_root: &Path) -> Result<String, VcsLookupError> {
        let root: PathBuf = project_root.to_path_buf();
        with_timeout(self.timeout, move || read_branch(&root))
    }
}

/// Run a lookup on a worker thread so a wedged repository (network
/// filesystem, lock contention) cannot hang the run past `timeout`.
fn with_timeout<F>(timeout: Duration, lookup: F) -> Result<String, VcsLookupError>
where
    F: FnOnce() -> Result<String, VcsLookupError> + Send + 'static,
{
    let (tx, rx) = bounded(1);

    thread::Builder::new()
        .name("archgate-branch".into())
        .spawn(move || {
            let _ = tx.send(lookup());
        })
        .map_err(|_| VcsLookupError::WorkerLost)?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(VcsLookupError::Timeout(timeout)),
        Err(RecvTimeoutError::Disconnected) => Err(VcsLookupError::WorkerLost),
    }
}

/// Read the current branch name without touching the working tree.
pub fn read_branch(project_root: &Path) -> Result<String, VcsLookupError> {
    let repo = Repository::discover(project_root)?;
    debug!("Opened git repository at {:?}", repo.path());

    let head = repo.find_reference("HEAD")?;
    let target = head.symbolic_target().ok_or(VcsLookupError::Detached)?;

    Ok(target
        .strip_prefix("refs/heads/")
        .unwrap_or(target)
        .to_string())
}
