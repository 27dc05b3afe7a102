//! Project names derived from repository URLs

use crate::{Error, Result};

/// Guess a project name from a git remote URL.
///
/// Takes the final path segment and strips a trailing `.git`:
/// `https://example.com/org/My-Repo.git` -> `My-Repo`. scp-style remotes
/// (`git@host:repo.git`) are split on the colon as well.
pub fn guess_project_from_url(url: &str) -> Result<String> {
    let trimmed = url.trim_end_matches('/');
    let end = trimmed.rsplit(['/', ':']).next().unwrap_or(trimmed);
    let name = end.strip_suffix(".git").unwrap_or(end);

    if name.is_empty() || name.contains(['?', '#']) {
        return Err(Error::InvalidUrl {
            url: url.to_string(),
        });
    }

    Ok(name.to_string())
}
