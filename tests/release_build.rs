// tests/release_build.rs

use std::error::Error;
use std::fs;

use sitebuild::lifecycle::run_release;
use sitebuild_test_utils::builders::ConfigFileBuilder;
use sitebuild_test_utils::fixtures::SourceTree;
use sitebuild_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn release_writes_every_asset_kind() -> TestResult {
    init_tracing();
    let tree = SourceTree::site();
    tree.write("fonts/body.woff2", "font-bytes");
    tree.write("favicon.ico", "ico-bytes");
    let cfg = ConfigFileBuilder::rooted_at(tree.root())
        .with_fast_avif()
        .build();

    run_release(&cfg).await?;

    for rel in [
        "css/style.min.css",
        "css/style.min.css.map",
        "js/app.js",
        "js/app.js.map",
        "index.html",
        "img/photo.jpg",
        "img/photo.avif",
        "img/photo.webp",
        "img/logo.svg",
        "img/sprite.svg",
        "fonts/body.woff2",
        "favicon.ico",
    ] {
        assert!(tree.output_file(rel).is_file(), "missing {rel}");
    }

    assert!(!tree.output_file("img/sprite-icons/star.svg").exists());
    assert!(tree.read_output("img/sprite.svg").contains(r#"<symbol id="star""#));
    assert!(!tree.read_output("img/logo.svg").contains("<!--"));
    assert!(!tree.read_output("js/app.js").contains("// greet"));
    assert!(tree.read_output("js/app.js").contains("sourceMappingURL=app.js.map"));
    assert!(tree.read_output("css/style.min.css.map").contains("\"mappings\""));
    assert_eq!(tree.read_output("fonts/body.woff2"), "font-bytes");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn clean_removes_stale_output() -> TestResult {
    init_tracing();
    let tree = SourceTree::empty();
    tree.write("index.html", "<p>hi</p>");
    fs::create_dir_all(tree.output_file("old"))?;
    fs::write(tree.output_file("old/stale.css"), "x")?;

    let cfg = ConfigFileBuilder::rooted_at(tree.root()).build();
    run_release(&cfg).await?;

    assert!(!tree.output_file("old").exists());
    assert!(tree.output_file("index.html").is_file());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn style_error_fails_release_and_names_task() -> TestResult {
    init_tracing();
    let tree = SourceTree::empty();
    tree.write("sass/style.scss", "body { color: ; \n");

    let cfg = ConfigFileBuilder::rooted_at(tree.root()).build();
    let err = run_release(&cfg).await.unwrap_err();

    assert!(err.to_string().contains("'styles'"), "got {err}");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn empty_source_tree_builds_empty_output() -> TestResult {
    init_tracing();
    let tree = SourceTree::empty();
    let cfg = ConfigFileBuilder::rooted_at(tree.root()).build();

    run_release(&cfg).await?;

    assert!(tree.output().is_dir());
    assert_eq!(fs::read_dir(tree.output())?.count(), 0);
    Ok(())
}
