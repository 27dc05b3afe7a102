//! Single-file fetch from a remote repository
//!
//! Reading one file (the Unholyfile) should not require a checkout. Two
//! strategies are tried in order:
//!
//! 1. `git archive --remote`, which streams a tar of just the requested path.
//!    Hosts that are known not to serve archives (github.com) skip this step.
//! 2. A depth-1 bare clone into a temporary directory, reading the blob
//!    straight out of the fetched tree.
//!
//! When both fail the error of the first attempted strategy is returned.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;

use git2::build::RepoBuilder;
use git2::{AutotagOption, ErrorCode, FetchOptions};

use crate::{Error, Result};

/// Fetches individual files from a remote repository.
pub trait RemoteFiles {
    /// Fetch `path` at `branch` (the remote's default when `None`).
    fn fetch_file(&self, repository: &str, path: &str, branch: Option<&str>) -> Result<Vec<u8>>;
}

/// [`RemoteFiles`] backed by the `git` binary and libgit2.
#[derive(Debug, Clone)]
pub struct GitRemote {
    git: PathBuf,
}

impl Default for GitRemote {
    fn default() -> Self {
        Self {
            git: PathBuf::from("git"),
        }
    }
}

impl GitRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific `git` executable for `git archive`.
    pub fn with_git_binary(mut self, git: impl Into<PathBuf>) -> Self {
        self.git = git.into();
        self
    }

    fn fetch_by_archive(&self, repository: &str, path: &str, branch: Option<&str>) -> Result<Vec<u8>> {
        let tree_ish = branch.unwrap_or("HEAD");
        tracing::debug!(repository, path, tree_ish, "Fetching file with git archive");

        // Buffered rather than streamed so a git failure is reported as such
        // instead of surfacing as a truncated archive.
        let output = Command::new(&self.git)
            .arg("archive")
            .arg(format!("--remote={repository}"))
            .arg(tree_ish)
            .arg(path)
            .output()
            .map_err(|e| Error::io(&self.git, e))?;

        if !output.status.success() {
            return Err(Error::Command {
                command: format!("git archive --remote={repository} {tree_ish} {path}"),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        extract_file(&output.stdout, path, repository)
    }
}

impl RemoteFiles for GitRemote {
    fn fetch_file(&self, repository: &str, path: &str, branch: Option<&str>) -> Result<Vec<u8>> {
        if !supports_archive(repository) {
            tracing::debug!(repository, "Host does not serve git archive - cloning");
            return fetch_by_clone(repository, path, branch);
        }

        match self.fetch_by_archive(repository, path, branch) {
            Ok(bytes) => Ok(bytes),
            Err(first) => {
                tracing::debug!(error = %first, "git archive failed - falling back to clone");
                fetch_by_clone(repository, path, branch).map_err(|second| {
                    tracing::debug!(error = %second, "Clone fallback failed");
                    first
                })
            }
        }
    }
}

/// Whether `git archive --remote` is worth attempting for this repository.
pub fn supports_archive(repository: &str) -> bool {
    !repository.contains("github.com")
}

/// Pull a single regular file out of a tar stream.
pub fn extract_file(archive: &[u8], path: &str, repository: &str) -> Result<Vec<u8>> {
    let malformed = |e: std::io::Error| Error::Archive {
        repository: repository.to_string(),
        message: e.to_string(),
    };
    let wanted = Path::new(path);

    let mut archive = tar::Archive::new(archive);
    for entry in archive.entries().map_err(malformed)? {
        let mut entry = entry.map_err(malformed)?;
        let entry_path = entry.path().map_err(malformed)?.into_owned();
        let entry_path = entry_path.strip_prefix(".").unwrap_or(entry_path.as_path());
        if entry_path == wanted && entry.header().entry_type().is_file() {
            let mut contents = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut contents).map_err(malformed)?;
            return Ok(contents);
        }
    }

    Err(Error::FileNotFound {
        repository: repository.to_string(),
        path: path.to_string(),
    })
}

/// Clone `repository` bare at depth 1 and read `path` from its tree.
pub fn fetch_by_clone(repository: &str, path: &str, branch: Option<&str>) -> Result<Vec<u8>> {
    let scratch = tempfile::Builder::new()
        .prefix("unholy-fetch-")
        .tempdir()
        .map_err(|e| Error::io(std::env::temp_dir(), e))?;
    tracing::debug!(repository, ?branch, scratch = %scratch.path().display(), "Shallow cloning");

    let mut fetch = FetchOptions::new();
    fetch.download_tags(AutotagOption::None);
    // libgit2's local transport cannot serve shallow fetches.
    if !is_local(repository) {
        fetch.depth(1);
    }

    let mut builder = RepoBuilder::new();
    builder.bare(true).fetch_options(fetch);
    if let Some(branch) = branch {
        builder.branch(branch);
    }
    let repo = builder.clone(repository, scratch.path())?;

    let tree = repo.head()?.peel_to_tree()?;
    let entry = tree.get_path(Path::new(path)).map_err(|e| match e.code() {
        ErrorCode::NotFound => Error::FileNotFound {
            repository: repository.to_string(),
            path: path.to_string(),
        },
        _ => Error::Git(e),
    })?;
    let blob = entry.to_object(&repo)?.peel_to_blob()?;
    let contents = blob.content().to_vec();

    Ok(contents)
}

fn is_local(repository: &str) -> bool {
    repository.starts_with("file://") || Path::new(repository).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn archive_with(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_entry_type(tar::EntryType::Regular);
            header.set_cksum();
            builder.append_data(&mut header, path, *data).unwrap();
        }
        builder.into_inner().unwrap()
    }

    #[test]
    fn test_extract_file_finds_requested_path() {
        let archive = archive_with(&[("README.md", b"readme"), ("Unholyfile", b"echo hi\n")]);
        let contents = extract_file(&archive, "Unholyfile", "repo").unwrap();
        assert_eq!(contents, b"echo hi\n");
    }

    #[test]
    fn test_extract_file_nested_path() {
        let archive = archive_with(&[("sub/dir/file.txt", b"nested")]);
        assert_eq!(extract_file(&archive, "sub/dir/file.txt", "repo").unwrap(), b"nested");
    }

    #[test]
    fn test_extract_file_missing_is_not_found() {
        let archive = archive_with(&[("README.md", b"readme")]);
        let err = extract_file(&archive, "Unholyfile", "repo").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_github_skips_archive() {
        assert!(!supports_archive("https://github.com/astraluma/unholy.git"));
        assert!(!supports_archive("git@github.com:astraluma/unholy.git"));
        assert!(supports_archive("ssh://git.example.com/unholy.git"));
    }
}
