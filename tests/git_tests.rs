use git2::Repository;

#[path = "test_utils.rs"]
mod test_utils;
use test_utils::{setup_empty_git_repo, setup_git_repo, stage_deletion, stage_file};

#[test]
fn staged_diff_is_empty_after_commit() {
    let (_temp_dir, git_repo) = setup_git_repo();

    let summary = git_repo.get_staged_diff().expect("Failed to get diff");
    assert!(summary.is_empty);
    assert!(summary.files_changed.is_empty());
    assert_eq!(summary.additions, 0);
    assert_eq!(summary.deletions, 0);
    assert!(!git_repo.has_staged_changes().expect("Failed to check"));
}

#[test]
fn staged_diff_reports_added_file() {
    let (temp_dir, git_repo) = setup_git_repo();
    stage_file(&temp_dir, "new_file.txt", "line one\nline two\n");

    let summary = git_repo.get_staged_diff().expect("Failed to get diff");
    assert!(!summary.is_empty);
    assert_eq!(summary.files_changed, vec!["new_file.txt".to_string()]);
    assert_eq!(summary.change_types.get("new_file.txt"), Some(&'A'));
    assert_eq!(summary.additions, 2);
    assert_eq!(summary.deletions, 0);
    assert!(summary.diff_text.contains("+line one"));
}

#[test]
fn staged_diff_reports_modification_and_deletion() {
    let (temp_dir, git_repo) = setup_git_repo();

    stage_file(&temp_dir, "initial.txt", "Changed content\n");
    let summary = git_repo.get_staged_diff().expect("Failed to get diff");
    assert_eq!(summary.change_types.get("initial.txt"), Some(&'M'));
    assert_eq!(summary.additions, 1);
    assert_eq!(summary.deletions, 1);

    // Commit the modification, then stage a deletion
    git_repo
        .commit("chore: update initial file")
        .expect("Failed to commit");
    stage_deletion(&temp_dir, "initial.txt");

    let summary = git_repo.get_staged_diff().expect("Failed to get diff");
    assert_eq!(summary.change_types.get("initial.txt"), Some(&'D'));
    assert_eq!(summary.additions, 0);
    assert_eq!(summary.deletions, 1);
}

#[test]
fn commit_preserves_message_and_returns_full_id() {
    let (temp_dir, git_repo) = setup_git_repo();
    stage_file(&temp_dir, "feature.rs", "pub fn feature() {}\n");

    let message = "feat: add feature module\n\nIntroduce the feature entry point.";
    let commit_id = git_repo.commit(message).expect("Failed to commit");

    // Full 40-char hex id
    assert_eq!(commit_id.len(), 40);
    assert!(commit_id.chars().all(|c| c.is_ascii_hexdigit()));

    let repo = Repository::open(temp_dir.path()).expect("Failed to open repository");
    let head = repo
        .head()
        .expect("Failed to get HEAD")
        .peel_to_commit()
        .expect("Failed to peel to commit");
    assert_eq!(head.id().to_string(), commit_id);
    assert_eq!(head.message(), Some(message));

    // The staged set is empty again once the commit lands
    assert!(!git_repo.has_staged_changes().expect("Failed to check"));
}

#[test]
fn unborn_head_diffs_against_empty_tree() {
    let (temp_dir, git_repo) = setup_empty_git_repo();
    stage_file(&temp_dir, "first.txt", "first file\n");

    let summary = git_repo.get_staged_diff().expect("Failed to get diff");
    assert!(!summary.is_empty);
    assert_eq!(summary.change_types.get("first.txt"), Some(&'A'));
    assert_eq!(summary.additions, 1);
}

#[test]
fn first_commit_on_unborn_branch_has_no_parent() {
    let (temp_dir, git_repo) = setup_empty_git_repo();
    stage_file(&temp_dir, "first.txt", "first file\n");

    let commit_id = git_repo
        .commit("chore: initial commit")
        .expect("Failed to commit");

    let repo = Repository::open(temp_dir.path()).expect("Failed to open repository");
    let head = repo
        .head()
        .expect("Failed to get HEAD")
        .peel_to_commit()
        .expect("Failed to peel to commit");
    assert_eq!(head.id().to_string(), commit_id);
    assert_eq!(head.parent_count(), 0);
}

#[test]
fn repo_info_reports_branch_and_root() {
    let (temp_dir, git_repo) = setup_git_repo();

    let info = git_repo.repo_info().expect("Failed to get repo info");
    assert!(!info.branch.is_empty());
    assert_eq!(info.remote, "no remote");

    let root = std::fs::canonicalize(&info.root).expect("Failed to canonicalize root");
    let expected = std::fs::canonicalize(temp_dir.path()).expect("Failed to canonicalize");
    assert_eq!(root, expected);
}

#[test]
fn opening_a_plain_directory_fails() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temporary directory");
    assert!(git_quill::git::GitRepo::new(temp_dir.path()).is_err());
}
