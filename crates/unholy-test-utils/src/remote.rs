//! Canned remote repository files.

use std::cell::RefCell;
use std::collections::BTreeMap;

use unholy_git::{Error, RemoteFiles, Result};

/// [`RemoteFiles`] serving files registered up front.
#[derive(Debug, Default)]
pub struct FakeRemote {
    files: BTreeMap<(String, String), Vec<u8>>,
    requests: RefCell<Vec<(String, String, Option<String>)>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, repository: &str, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.files
            .insert((repository.to_string(), path.to_string()), contents.into());
        self
    }

    /// Every `(repository, path, branch)` requested so far.
    pub fn requests(&self) -> Vec<(String, String, Option<String>)> {
        self.requests.borrow().clone()
    }
}

impl RemoteFiles for FakeRemote {
    fn fetch_file(&self, repository: &str, path: &str, branch: Option<&str>) -> Result<Vec<u8>> {
        self.requests.borrow_mut().push((
            repository.to_string(),
            path.to_string(),
            branch.map(str::to_string),
        ));
        self.files
            .get(&(repository.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| Error::FileNotFound {
                repository: repository.to_string(),
                path: path.to_string(),
            })
    }
}
