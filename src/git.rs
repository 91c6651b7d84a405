//! Git repository access: staged diff collection and committing

use crate::errors::QuillError;
use crate::log_debug;
use anyhow::{Context, Result};
use git2::{Delta, DiffOptions, Repository};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

/// Summary of the staged change-set, as consumed by the prompt builder.
#[derive(Debug, Clone, Default)]
pub struct DiffSummary {
    /// Changed paths, unique, in diff order
    pub files_changed: Vec<String>,
    /// Lines added (heuristic count, see `count_changed_lines`)
    pub additions: u32,
    /// Lines removed (heuristic count)
    pub deletions: u32,
    /// Full unified diff text
    pub diff_text: String,
    /// One-letter change code per path (A/M/D/R/C/T)
    pub change_types: HashMap<String, char>,
    /// True iff no staged changes exist
    pub is_empty: bool,
}

/// Repository metadata for verbose display.
#[derive(Debug, Clone)]
pub struct RepoInfo {
    pub branch: String,
    pub remote: String,
    pub root: String,
}

/// Represents a Git repository and provides methods for interacting with it.
pub struct GitRepo {
    repo_path: PathBuf,
}

impl GitRepo {
    /// Creates a new `GitRepo` instance from a local path.
    pub fn new(repo_path: &Path) -> Result<Self, QuillError> {
        Repository::open(repo_path).map_err(|e| {
            QuillError::GitRepository(format!(
                "not a git repository: {}: {e}",
                repo_path.display()
            ))
        })?;

        Ok(Self {
            repo_path: repo_path.to_path_buf(),
        })
    }

    /// Creates a `GitRepo` by walking up from the current directory.
    pub fn discover() -> Result<Self, QuillError> {
        let current_dir = env::current_dir()
            .map_err(|e| QuillError::GitRepository(format!("cannot read current directory: {e}")))?;
        let repo = Repository::discover(&current_dir).map_err(|_| {
            QuillError::GitRepository(format!(
                "not a git repository: {}; run 'git init' first",
                current_dir.display()
            ))
        })?;

        let path = repo
            .workdir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| repo.path().to_path_buf());
        Ok(Self { repo_path: path })
    }

    /// Whether the current directory is inside a Git work tree.
    pub fn is_inside_work_tree() -> bool {
        env::current_dir()
            .ok()
            .and_then(|dir| Repository::discover(dir).ok())
            .is_some_and(|repo| !repo.is_bare())
    }

    /// Open the repository at the stored path
    fn open_repo(&self) -> Result<Repository, git2::Error> {
        Repository::open(&self.repo_path)
    }

    /// Returns the repository path
    pub fn repo_path(&self) -> &PathBuf {
        &self.repo_path
    }

    /// Retrieves a summary of the staged change-set.
    ///
    /// Returns an empty summary (`is_empty == true`) when nothing is staged;
    /// an empty diff is a normal result here, not an error.
    pub fn get_staged_diff(&self) -> Result<DiffSummary> {
        let repo = self.open_repo()?;
        log_debug!("Collecting staged diff for {:?}", self.repo_path);

        // Unborn HEAD (initial commit) diffs the index against an empty tree.
        let head_tree = match repo.head() {
            Ok(head) => Some(head.peel_to_tree()?),
            Err(_) => None,
        };

        let mut opts = DiffOptions::new();
        let diff = repo.diff_tree_to_index(head_tree.as_ref(), None, Some(&mut opts))?;

        let mut files_changed = Vec::new();
        let mut change_types = HashMap::new();

        for delta in diff.deltas() {
            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .and_then(Path::to_str)
                .context("non-UTF-8 path in staged diff")?
                .to_string();

            change_types.insert(path.clone(), change_code(delta.status()));
            files_changed.push(path);
        }

        if files_changed.is_empty() {
            return Ok(DiffSummary {
                is_empty: true,
                ..DiffSummary::default()
            });
        }

        let mut diff_text = String::new();
        diff.print(git2::DiffFormat::Patch, |_delta, _hunk, line| {
            match line.origin() {
                o @ ('+' | '-' | ' ') => {
                    diff_text.push(o);
                    diff_text.push_str(&String::from_utf8_lossy(line.content()));
                }
                // File and hunk headers carry their own text verbatim.
                _ => diff_text.push_str(&String::from_utf8_lossy(line.content())),
            }
            true
        })?;

        let (additions, deletions) = count_changed_lines(&diff_text);

        log_debug!(
            "Staged diff: {} files, +{} -{}",
            files_changed.len(),
            additions,
            deletions
        );

        Ok(DiffSummary {
            files_changed,
            additions,
            deletions,
            diff_text,
            change_types,
            is_empty: false,
        })
    }

    /// Whether any changes are staged for commit.
    pub fn has_staged_changes(&self) -> Result<bool> {
        Ok(!self.get_staged_diff()?.is_empty)
    }

    /// Commits the staged changes with the given message.
    ///
    /// Returns the full commit id as a hex string.
    pub fn commit(&self, message: &str) -> Result<String> {
        let repo = self.open_repo()?;
        let signature = repo.signature()?;
        let mut index = repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = repo.find_tree(tree_id)?;

        // First commit on an unborn branch has no parent.
        let parent = match repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None,
        };
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let commit_oid = repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;

        log_debug!("Created commit {}", commit_oid);
        Ok(commit_oid.to_string())
    }

    /// Repository metadata: current branch, remote URL, root path.
    pub fn repo_info(&self) -> Result<RepoInfo> {
        let repo = self.open_repo()?;

        let branch = match repo.head() {
            Ok(head) => head.shorthand().unwrap_or("detached HEAD").to_string(),
            Err(_) => "HEAD (unborn)".to_string(),
        };

        let remote = repo
            .find_remote("origin")
            .ok()
            .and_then(|r| r.url().map(ToString::to_string))
            .unwrap_or_else(|| "no remote".to_string());

        let root = repo
            .workdir()
            .unwrap_or_else(|| repo.path())
            .display()
            .to_string();

        Ok(RepoInfo {
            branch,
            remote,
            root,
        })
    }
}

/// Map a git2 delta status to the one-letter change code used in prompts.
fn change_code(status: Delta) -> char {
    match status {
        Delta::Added => 'A',
        Delta::Deleted => 'D',
        Delta::Renamed => 'R',
        Delta::Copied => 'C',
        Delta::Typechange => 'T',
        _ => 'M',
    }
}

/// Count added/removed lines in unified diff text.
///
/// Lines beginning `+`/`-` minus lines beginning `+++`/`---`. This is the
/// documented heuristic: it can miscount diffs containing literal `+++` or
/// `---` content lines, and that behavior is kept as-is.
fn count_changed_lines(diff_text: &str) -> (u32, u32) {
    let mut additions: u32 = 0;
    let mut deletions: u32 = 0;

    for line in diff_text.lines() {
        if line.starts_with("+++") || line.starts_with("---") {
            continue;
        }
        if line.starts_with('+') {
            additions += 1;
        } else if line.starts_with('-') {
            deletions += 1;
        }
    }

    (additions, deletions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting_skips_file_headers() {
        let diff = "--- a/foo.rs\n+++ b/foo.rs\n@@ -1,2 +1,3 @@\n context\n+added one\n+added two\n-removed one\n";
        assert_eq!(count_changed_lines(diff), (2, 1));
    }

    #[test]
    fn counting_handles_empty_diff() {
        assert_eq!(count_changed_lines(""), (0, 0));
    }

    #[test]
    fn change_codes_map_to_single_letters() {
        assert_eq!(change_code(Delta::Added), 'A');
        assert_eq!(change_code(Delta::Modified), 'M');
        assert_eq!(change_code(Delta::Deleted), 'D');
        assert_eq!(change_code(Delta::Renamed), 'R');
        assert_eq!(change_code(Delta::Unmodified), 'M');
    }
}
