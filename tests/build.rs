//! End-to-end builds against a temporary content directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use blogkit::config::{Permalink, SiteConfig};
use blogkit::error::{BuildError, DocumentError, Problem};
use blogkit::generator::{build, load, BuildOptions};
use tempfile::TempDir;

fn site() -> (TempDir, SiteConfig) {
    let tmp = TempDir::new().unwrap();
    let config = SiteConfig {
        site_title: "Engineering".to_string(),
        content_dir: tmp.path().join("_posts"),
        output_dir: tmp.path().join("_site"),
        static_dir: tmp.path().join("static"),
        template_dir: tmp.path().join("_layouts"),
        ..SiteConfig::default()
    };
    fs::create_dir_all(&config.content_dir).unwrap();
    (tmp, config)
}

fn post(config: &SiteConfig, name: &str, content: &str) {
    fs::write(config.content_dir.join(name), content).unwrap();
}

fn outputs(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            (
                e.path().strip_prefix(root).unwrap().to_path_buf(),
                fs::read(e.path()).unwrap(),
            )
        })
        .collect()
}

fn document_failures(err: anyhow::Error) -> Vec<DocumentError> {
    match err.downcast::<BuildError>() {
        Ok(BuildError::Documents { failures }) => failures,
        other => panic!("expected document failures, got {other:?}"),
    }
}

#[test]
fn empty_content_directory_builds_an_empty_index() {
    let (_tmp, config) = site();
    let report = build(&config, BuildOptions::default()).unwrap();
    assert_eq!(report.posts, 0);

    let index = fs::read_to_string(config.output_dir.join("index.html")).unwrap();
    assert!(index.contains("No posts yet."));
    assert!(!index.contains("<li>"));
    assert!(config.output_dir.join("feed.xml").exists());
}

#[test]
fn index_lists_newest_first() {
    let (_tmp, config) = site();
    post(
        &config,
        "2025-07-20-doc.md",
        "---\ntitle: Older doc\ndate: 2025-07-20\n---\nolder\n",
    );
    post(
        &config,
        "2025-07-25-other-doc.md",
        "---\ntitle: Newer doc\ndate: 2025-07-25\n---\nnewer\n",
    );

    let loaded = load(&config, false).unwrap();
    let order: Vec<_> = loaded
        .collection
        .entries()
        .iter()
        .map(|e| e.post.slug.as_str())
        .collect();
    assert_eq!(order, vec!["other-doc", "doc"]);

    build(&config, BuildOptions::default()).unwrap();
    let index = fs::read_to_string(config.output_dir.join("index.html")).unwrap();
    let newer = index.find("Newer doc").unwrap();
    let older = index.find("Older doc").unwrap();
    assert!(newer < older);
}

#[test]
fn missing_title_is_one_issue() {
    let (_tmp, config) = site();
    post(&config, "2025-07-20-untitled.md", "---\ndate: 2025-07-20\n---\n");
    let failures = document_failures(build(&config, BuildOptions::default()).unwrap_err());
    assert_eq!(failures.len(), 1);
    match &failures[0] {
        DocumentError::Validation { issues, .. } => {
            let title: Vec<_> = issues.iter().filter(|i| i.field == "title").collect();
            assert_eq!(title.len(), 1);
            assert_eq!(title[0].problem, Problem::Missing);
            assert_eq!(issues.len(), 1);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn bad_date_is_excluded_while_others_render() {
    let (_tmp, config) = site();
    post(
        &config,
        "2025-07-20-good.md",
        "---\ntitle: Good\ndate: 2025-07-20\n---\nok\n",
    );
    post(
        &config,
        "2025-07-21-bad.md",
        "---\ntitle: Bad\ndate: \"not-a-date\"\n---\nnope\n",
    );

    let failures = document_failures(build(&config, BuildOptions::default()).unwrap_err());
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        &failures[0],
        DocumentError::Validation { issues, .. }
            if issues[0].problem == Problem::InvalidDate("not-a-date".into())
    ));

    assert!(config.output_dir.join("good.html").exists());
    assert!(!config.output_dir.join("bad.html").exists());
}

#[test]
fn colliding_slugs_write_nothing() {
    let (_tmp, config) = site();
    fs::create_dir_all(config.content_dir.join("2024")).unwrap();
    post(
        &config,
        "2025-07-20-same-name.md",
        "---\ntitle: One\ndate: 2025-07-20\n---\n",
    );
    post(
        &config,
        "2024/2024-01-01-same-name.md",
        "---\ntitle: Two\ndate: 2024-01-01\n---\n",
    );

    let err = build(&config, BuildOptions::default()).unwrap_err();
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::SlugCollision { output, .. }) => {
            assert_eq!(output, &PathBuf::from("same-name.html"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(!config.output_dir.join("same-name.html").exists());
}

#[test]
fn post_named_like_a_generated_page_writes_nothing() {
    let (_tmp, config) = site();
    post(
        &config,
        "2025-07-20-index.md",
        "---\ntitle: Index\ndate: 2025-07-20\n---\n",
    );
    let err = build(&config, BuildOptions::default()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::SlugCollision { output, .. }) if output == &PathBuf::from("index.html")
    ));
    assert!(!config.output_dir.exists());
}

#[test]
fn dated_permalinks_avoid_the_collision() {
    let (_tmp, mut config) = site();
    config.permalink = Permalink::Dated;
    post(
        &config,
        "2025-07-20-same-name.md",
        "---\ntitle: One\ndate: 2025-07-20\n---\n",
    );
    post(
        &config,
        "2025-07-21-same-name.md",
        "---\ntitle: Two\ndate: 2025-07-21\n---\n",
    );
    build(&config, BuildOptions::default()).unwrap();
    assert!(config.output_dir.join("2025/07/20/same-name.html").exists());
    assert!(config.output_dir.join("2025/07/21/same-name.html").exists());
}

#[test]
fn rebuilding_unchanged_input_is_byte_identical() {
    let (_tmp, config) = site();
    post(
        &config,
        "2025-07-20-first.md",
        "---\ntitle: First\ndate: 2025-07-20\ntags: [rust, ci]\ncategories: infra\n---\nA\n\nB\n",
    );
    post(
        &config,
        "2025-07-25-second.html",
        "---\ntitle: Second\ndate: 2025-07-25T12:00:00Z\nauthor: Sam\n---\n<p>raw</p>\n",
    );
    fs::create_dir_all(config.static_dir.join("css")).unwrap();
    fs::write(config.static_dir.join("css/site.css"), "body {}").unwrap();

    let report = build(&config, BuildOptions::default()).unwrap();
    assert_eq!(report.static_bytes, "body {}".len() as u64);
    let first = outputs(&config.output_dir);
    build(&config, BuildOptions::default()).unwrap();
    let second = outputs(&config.output_dir);
    assert_eq!(first, second);

    let files: Vec<_> = first.keys().map(|p| p.to_string_lossy().replace('\\', "/")).collect();
    for expected in [
        "categories/infra.html",
        "css/site.css",
        "feed.xml",
        "first.html",
        "index.html",
        "second.html",
        "tags/ci.html",
        "tags/rust.html",
    ] {
        assert!(files.iter().any(|f| f == expected), "missing {expected}");
    }
}

#[test]
fn custom_templates_replace_builtins() {
    let (_tmp, config) = site();
    fs::create_dir_all(&config.template_dir).unwrap();
    fs::write(
        config.template_dir.join("post.hbs"),
        "{{post.title}}|{{date_fmt post.date \"%d.%m.%Y\"}}|{{post.extra.team}}",
    )
    .unwrap();
    post(
        &config,
        "2025-07-20-custom.md",
        "---\ntitle: Custom\ndate: 2025-07-20\nteam: platform\n---\n",
    );
    build(&config, BuildOptions::default()).unwrap();
    let html = fs::read_to_string(config.output_dir.join("custom.html")).unwrap();
    assert_eq!(html, "Custom|20.07.2025|platform");
}
