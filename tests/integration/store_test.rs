//! Document Store Integration Tests
//!
//! Snapshot, restore, diff and listing behavior on a real temporary
//! workspace.

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use site_tailor::services::DocumentStore;
use site_tailor::AppError;

fn store() -> (TempDir, DocumentStore) {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path(), "versions");
    (dir, store)
}

#[tokio::test]
async fn test_every_overwrite_keeps_the_previous_content() {
    let (_dir, store) = store();
    let contents = ["<p>one</p>", "<p>two</p>", "<p>three</p>"];

    let first = store.write("site", "index.html", contents[0]).await.unwrap();
    assert!(first.is_none());
    for content in &contents[1..] {
        let snapshot = store.write("site", "index.html", content).await.unwrap();
        assert!(snapshot.is_some());
    }

    let versions = store.list_versions("site", "index.html").await.unwrap();
    assert_eq!(versions.len(), 2);
    for (version, expected) in versions.iter().zip(contents) {
        let stored = store
            .read_version("site", "index.html", &version.id)
            .await
            .unwrap();
        assert_eq!(stored, expected);
        assert_eq!(version.size, expected.len() as u64);
    }
    assert_eq!(store.read("site", "index.html").await.unwrap(), contents[2]);
}

#[tokio::test]
async fn test_restore_is_itself_snapshotted() {
    let (_dir, store) = store();
    store.write("site", "index.html", "<p>old</p>\n").await.unwrap();
    store.write("site", "index.html", "<p>new</p>\n").await.unwrap();
    let original = store.list_versions("site", "index.html").await.unwrap()[0].clone();

    let diff = store
        .diff_version("site", "index.html", &original.id)
        .await
        .unwrap();
    assert!(diff.contains("-<p>old</p>"), "{diff}");
    assert!(diff.contains("+<p>new</p>"), "{diff}");

    let saved = store
        .restore_version("site", "index.html", &original.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(store.read("site", "index.html").await.unwrap(), "<p>old</p>\n");
    assert_eq!(
        store.read_version("site", "index.html", &saved.id).await.unwrap(),
        "<p>new</p>\n"
    );
    assert_eq!(store.list_versions("site", "index.html").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_listing_skips_snapshots_and_other_files() {
    let (dir, store) = store();
    store.write("site", "index.html", "<p>1</p>").await.unwrap();
    store.write("site", "index.html", "<p>2</p>").await.unwrap();
    store.write("site", "blog/post.htm", "<p>post</p>").await.unwrap();
    std::fs::write(dir.path().join("site").join("style.css"), "p{}").unwrap();
    std::fs::create_dir_all(dir.path().join("other")).unwrap();

    assert_eq!(
        store.list_files("site").await.unwrap(),
        vec!["blog/post.htm".to_string(), "index.html".to_string()]
    );
    assert_eq!(
        store.list_domains().await.unwrap(),
        vec!["other".to_string(), "site".to_string()]
    );
}

#[tokio::test]
async fn test_unsafe_paths_are_rejected() {
    let (_dir, store) = store();
    for file in ["../escape.html", "/etc/passwd", "versions/index.html"] {
        let err = store.write("site", file, "x").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "{file}: {err}");
    }
    let err = store.read("site", "missing.html").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
