use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use super::{read_under, DocumentRepository};
use crate::error::{Result, VanceError};

/// Repository backed by a git work tree
///
/// Paths come from the tree of `branch`; file contents are read from the
/// work tree.
#[derive(Clone, Debug)]
pub struct GitRepository {
    root: PathBuf,
    branch: String,
}

impl GitRepository {
    pub fn new(root: impl Into<PathBuf>, branch: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            branch: branch.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }
}

impl DocumentRepository for GitRepository {
    fn list_all_paths(&self) -> Result<Vec<String>> {
        let git_dir = self.root.join(".git");
        debug!(git_dir = %git_dir.display(), branch = %self.branch, "listing repository tree");

        let output = Command::new("git")
            .arg("--git-dir")
            .arg(&git_dir)
            .args(["ls-tree", "-r", &self.branch, "--name-only"])
            .output()
            .map_err(|e| VanceError::Repository(format!("failed to run git: {}", e)))?;

        if !output.status.success() {
            return Err(VanceError::Repository(format!(
                "git ls-tree failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn read_file(&self, path: &str) -> Result<String> {
        read_under(&self.root, path)
    }
}
