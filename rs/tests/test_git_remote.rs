mod common;

use std::sync::Arc;

use verstore::*;

fn create_remote(dir: &std::path::Path) -> GitRemote {
    GitRemote::open(
        dir.join("docs.git"),
        OpenOptions {
            create: true,
            branch: Some("main".into()),
            author: Some("Doc Bot".into()),
            email: Some("bot@example.com".into()),
        },
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Open / create
// ---------------------------------------------------------------------------

#[test]
fn open_missing_errors() {
    let dir = tempfile::tempdir().unwrap();
    let result = GitRemote::open(dir.path().join("nope.git"), OpenOptions::default());
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[test]
fn open_rejects_bad_branch() {
    let dir = tempfile::tempdir().unwrap();
    let result = GitRemote::open(
        dir.path().join("docs.git"),
        OpenOptions {
            create: true,
            branch: Some("bad branch".into()),
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(Error::InvalidPath(_))));
}

#[test]
fn fresh_repo_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let remote = create_remote(dir.path());
    assert!(remote.list_tree().unwrap().is_empty());
    assert!(remote.fetch("a.txt").unwrap_err().is_not_found());
    assert_eq!(remote.branch(), "main");
    assert_eq!(remote.signature().name, "Doc Bot");
}

// ---------------------------------------------------------------------------
// create / update / fetch
// ---------------------------------------------------------------------------

#[test]
fn create_then_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let remote = create_remote(dir.path());

    let id = remote.create("docs/a.md", "hello", "add a").unwrap();
    assert_eq!(id.len(), 40);
    assert_eq!(remote.fetch("docs/a.md").unwrap(), "hello");
    assert!(remote.fetch("docs").unwrap_err().is_not_found());
}

#[test]
fn create_existing_fails() {
    let dir = tempfile::tempdir().unwrap();
    let remote = create_remote(dir.path());
    remote.create("a.md", "1", "add").unwrap();
    let err = remote.create("a.md", "2", "add again").unwrap_err();
    assert!(!err.is_not_found());
    assert_eq!(remote.fetch("a.md").unwrap(), "1");
}

#[test]
fn update_missing_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let remote = create_remote(dir.path());
    assert!(remote.update("a.md", "x", "m").unwrap_err().is_not_found());
}

#[test]
fn update_changes_content_and_keeps_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let remote = create_remote(dir.path());
    let first = remote.create("d/a.md", "1", "add a").unwrap();
    remote.create("d/b.md", "b", "add b").unwrap();

    let second = remote.update("d/a.md", "2", "edit a").unwrap().unwrap();
    assert_ne!(first, second);
    assert_eq!(remote.fetch("d/a.md").unwrap(), "2");
    assert_eq!(remote.fetch("d/b.md").unwrap(), "b");

    let mut files = remote.list_tree().unwrap();
    files.sort();
    assert_eq!(files, vec!["d/a.md", "d/b.md"]);
}

#[test]
fn update_same_content_skips_commit() {
    let dir = tempfile::tempdir().unwrap();
    let remote = create_remote(dir.path());
    remote.create("a.md", "same", "add").unwrap();
    assert_eq!(remote.update("a.md", "same", "noop").unwrap(), None);
}

#[test]
fn commits_carry_message_and_signature() {
    let dir = tempfile::tempdir().unwrap();
    let remote = create_remote(dir.path());
    let id = remote.create("a.md", "x", "Updating versioned file [a.1.md]").unwrap();

    let repo = git2::Repository::open(dir.path().join("docs.git")).unwrap();
    let commit = repo
        .find_commit(git2::Oid::from_str(&id).unwrap())
        .unwrap();
    assert_eq!(commit.message(), Some("Updating versioned file [a.1.md]"));
    assert_eq!(commit.author().name(), Some("Doc Bot"));
    assert_eq!(commit.author().email(), Some("bot@example.com"));
    let head = repo.find_reference("refs/heads/main").unwrap();
    assert_eq!(head.target().unwrap().to_string(), id);
}

#[test]
fn reopen_sees_history() {
    let dir = tempfile::tempdir().unwrap();
    {
        let remote = create_remote(dir.path());
        remote.create("a.md", "persisted", "add").unwrap();
    }
    let remote = GitRemote::open(
        dir.path().join("docs.git"),
        OpenOptions {
            branch: Some("main".into()),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(remote.fetch("a.md").unwrap(), "persisted");
}

// ---------------------------------------------------------------------------
// Through the file service
// ---------------------------------------------------------------------------

#[test]
fn service_mirrors_saves_to_git() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(create_remote(dir.path()));
    let service = common::create_service(dir.path()).with_remote(remote.clone());

    let first = common::save(&service, "src/lib.rs", "fn a() {}").unwrap();
    assert_eq!(first.commit.as_deref().map(str::len), Some(40));
    let second = common::save(&service, &first.name, "fn b() {}").unwrap();
    assert_eq!(second.commit.as_deref().map(str::len), Some(40));
    assert_ne!(first.commit, second.commit);

    assert_eq!(remote.fetch("src/lib.rs").unwrap(), "fn b() {}");
    assert_eq!(service.remote_list().unwrap().files, vec!["src/lib.rs"]);
}
