use std::fs;
use std::path::Path;

use quire::application::loader::{ContentLoader, LoadError, LoadOptions, WarningKind};
use quire::config::ContentSettings;
use quire::domain::content::ContentKind;
use tempfile::TempDir;
use time::macros::date;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directories");
    }
    fs::write(path, contents).expect("write content file");
}

fn site() -> (TempDir, ContentLoader) {
    let dir = tempfile::tempdir().expect("tempdir");
    let loader = ContentLoader::new(&ContentSettings::under(dir.path()));
    (dir, loader)
}

fn blog_fixture(root: &Path) {
    write(
        root,
        "blog/first-post.md",
        concat!(
            "---\ntitle: First post\ndate: 2024-01-05\ntags: [x, y]\ncategory: Notes\n---\n",
            "\n## Intro\n\nHello.\n\n## Intro\n",
        ),
    );
    write(
        root,
        "blog/second-post.mdx",
        "+++\ntitle = \"Second post\"\ndate = 2024-02-10\ntags = [\"x\"]\n+++\n\n# Second\n",
    );
    write(
        root,
        "blog/third.md",
        "---\ntitle: Third\ndate: 2023-12-24\n---\nNo headings here.\n",
    );
    write(root, "blog/broken.md", "---\ntitle: Broken\ndate: [2024\n---\nbody\n");
    write(root, "blog/notes.txt", "not content");
    write(root, "blog/.hidden/secret.md", "# hidden\n");
}

#[tokio::test]
async fn three_valid_and_one_malformed_file_yield_three_records_and_one_warning() {
    let (dir, loader) = site();
    blog_fixture(dir.path());

    let report = loader
        .load_all(ContentKind::Blog, &LoadOptions::default())
        .await
        .expect("load succeeds");

    let slugs: Vec<&str> = report.records.iter().map(|r| r.slug.as_str()).collect();
    assert_eq!(slugs, vec!["second-post", "first-post", "third"]);

    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].path, "broken.md");
    assert_eq!(report.warnings[0].kind, WarningKind::FrontMatter);
}

#[tokio::test]
async fn records_carry_front_matter_headings_and_aggregates() {
    let (dir, loader) = site();
    blog_fixture(dir.path());

    let report = loader
        .load_all(ContentKind::Blog, &LoadOptions::default())
        .await
        .expect("load succeeds");

    let first = report.find("first-post").expect("first post loaded");
    assert_eq!(first.path, "first-post.md");
    assert_eq!(first.front_matter.date, Some(date!(2024 - 01 - 05)));
    assert_eq!(first.category(), Some("Notes"));
    assert!(first.body.starts_with("\n## Intro"));
    let ids: Vec<&str> = first.headings.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["intro", "intro-1"]);

    let second = report.find("second-post").expect("toml front-matter parsed");
    assert_eq!(second.title(), "Second post");

    let tags: Vec<(&str, usize)> = report
        .tags
        .terms()
        .iter()
        .map(|term| (term.name.as_str(), term.count))
        .collect();
    assert_eq!(tags, vec![("x", 2), ("y", 1)]);

    assert_eq!(report.categories.len(), 1);
    let months: Vec<&str> = report.archive.iter().map(|m| m.key.as_str()).collect();
    assert_eq!(months, vec!["2024-02", "2024-01", "2023-12"]);
}

#[tokio::test]
async fn loading_twice_is_identical() {
    let (dir, loader) = site();
    blog_fixture(dir.path());
    let options = LoadOptions::default();

    let first = loader
        .load_all(ContentKind::Blog, &options)
        .await
        .expect("first load");
    let second = loader
        .load_all(ContentKind::Blog, &options)
        .await
        .expect("second load");

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).expect("encode"),
        serde_json::to_string(&second).expect("encode")
    );
}

#[tokio::test]
async fn nested_duplicates_and_index_files_get_distinct_slugs() {
    let (dir, loader) = site();
    let root = dir.path();
    write(root, "docs/index.md", "# Home\n");
    write(root, "docs/guides/index.md", "---\nweight: 1\n---\n# Guides\n");
    write(root, "docs/guides/setup.md", "# Setup\n");
    write(root, "docs/reference/setup.md", "# Setup reference\n");
    write(root, "docs/Guides.md", "# Shadow\n");

    let report = loader
        .load_all(ContentKind::Docs, &LoadOptions::default())
        .await
        .expect("load succeeds");

    let mut slugs: Vec<&str> = report.records.iter().map(|r| r.slug.as_str()).collect();
    slugs.sort_unstable();
    assert_eq!(
        slugs,
        vec![
            "guides",
            "guides-1",
            "guides/setup",
            "index",
            "reference/setup"
        ]
    );
    assert!(report.warnings.is_empty());
}

#[tokio::test]
async fn drafts_are_excluded_unless_requested() {
    let (dir, loader) = site();
    write(dir.path(), "links/kept.md", "---\ntitle: Kept\n---\n");
    write(dir.path(), "links/wip.md", "---\ntitle: WIP\ndraft: true\n---\n");

    let published = loader
        .load_all(ContentKind::Links, &LoadOptions::default())
        .await
        .expect("load succeeds");
    assert_eq!(published.records.len(), 1);

    let everything = loader
        .load_all(
            ContentKind::Links,
            &LoadOptions {
                include_drafts: true,
                ..LoadOptions::default()
            },
        )
        .await
        .expect("load succeeds");
    assert_eq!(everything.records.len(), 2);
}

#[tokio::test]
async fn missing_root_is_a_discovery_failure() {
    let (_dir, loader) = site();

    let err = loader
        .load_all(ContentKind::Docs, &LoadOptions::default())
        .await
        .expect_err("docs root does not exist");

    match err {
        LoadError::DiscoveryFailure { kind, root, .. } => {
            assert_eq!(kind, ContentKind::Docs);
            assert!(root.ends_with("docs"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn root_that_is_a_file_is_a_discovery_failure() {
    let (dir, loader) = site();
    write(dir.path(), "blog", "not a directory");

    let err = loader
        .load_all(ContentKind::Blog, &LoadOptions::default())
        .await
        .expect_err("blog root is a file");
    assert!(matches!(err, LoadError::DiscoveryFailure { .. }));
}

#[tokio::test]
async fn load_one_finds_by_slug_and_reports_missing_as_none() {
    let (dir, loader) = site();
    blog_fixture(dir.path());

    let record = loader
        .load_one(ContentKind::Blog, "third")
        .await
        .expect("load succeeds")
        .expect("third exists");
    assert_eq!(record.title(), "Third");

    let missing = loader
        .load_one(ContentKind::Blog, "nope")
        .await
        .expect("load succeeds");
    assert!(missing.is_none());

    let malformed = loader
        .load_one(ContentKind::Blog, "broken")
        .await
        .expect("load succeeds");
    assert!(malformed.is_none());
}

#[tokio::test]
async fn with_root_redirects_one_kind() {
    let (dir, loader) = site();
    write(dir.path(), "elsewhere/post.md", "# Post\n");

    let loader = loader.with_root(ContentKind::Blog, dir.path().join("elsewhere"));
    let report = loader
        .load_all(ContentKind::Blog, &LoadOptions::default())
        .await
        .expect("load succeeds");

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].title(), "Post");
}
