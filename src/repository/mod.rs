//! Document repositories
//!
//! A repository lists page paths and reads their text. Pages are files with
//! one of the [`PAGE_EXTENSIONS`]; everything else is skipped.

mod directory;
mod git;
mod page;

pub use directory::DirectoryRepository;
pub use git::GitRepository;
pub use page::{Page, PageHeader};

use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, VanceError};
use crate::models::Document;

/// File extensions indexed as wiki pages
pub const PAGE_EXTENSIONS: [&str; 3] = ["md", "txt", "rst"];

/// Source of wiki pages
pub trait DocumentRepository: Send + Sync + fmt::Debug {
    /// Every path tracked by the repository, relative to its root
    fn list_all_paths(&self) -> Result<Vec<String>>;

    /// Read the text of a file
    fn read_file(&self, path: &str) -> Result<String>;

    /// Read and parse a page; `lang` overrides the declared language
    fn read_document(&self, path: &str, lang: Option<&str>) -> Result<Document> {
        let data = self.read_file(path)?;
        Ok(Page::parse(&data)?.into_document(path, lang))
    }

    /// Paths of every page in the repository
    fn list_pages(&self) -> Result<Vec<String>> {
        Ok(self
            .list_all_paths()?
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| is_page_path(p))
            .collect())
    }
}

/// Whether a path has a page extension
pub fn is_page_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| PAGE_EXTENSIONS.contains(&ext))
}

/// Resolve a repository-relative path under `root`, refusing escapes
pub(crate) fn resolve(root: &Path, path: &str) -> Result<PathBuf> {
    let relative = Path::new(path);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if path.is_empty() || escapes {
        return Err(VanceError::InvalidRequest(format!(
            "invalid repository path: {}",
            path
        )));
    }
    Ok(root.join(relative))
}

/// Read a UTF-8 file under `root`
pub(crate) fn read_under(root: &Path, path: &str) -> Result<String> {
    let full = resolve(root, path)?;
    match std::fs::read(&full) {
        Ok(data) => String::from_utf8(data)
            .map_err(|_| VanceError::Repository(format!("{} is not valid UTF-8", path))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(VanceError::DocumentNotFound(path.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}
