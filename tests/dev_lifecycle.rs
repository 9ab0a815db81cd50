// tests/dev_lifecycle.rs
//
// Runs the whole dev plan: initial build, preview server on an ephemeral
// port, the real file watcher, then shutdown through the watch channel.

use std::error::Error;
use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::{sleep, timeout, Duration};

use sitebuild::lifecycle::{dev_plan, run_dev_plan};
use sitebuild_test_utils::builders::ConfigFileBuilder;
use sitebuild_test_utils::fixtures::SourceTree;
use sitebuild_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

/// Poll `check` until it holds. The initial build encodes images, so the
/// limit is well above the usual test timeout.
async fn eventually(what: &str, mut check: impl FnMut() -> bool) {
    let polled = timeout(Duration::from_secs(60), async {
        while !check() {
            sleep(Duration::from_millis(50)).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "timed out waiting for {what}");
}

async fn joined<F: Future>(f: F) -> F::Output {
    timeout(Duration::from_secs(10), f)
        .await
        .expect("dev run did not stop after shutdown")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dev_serves_rebuilds_and_stops_on_shutdown() -> TestResult {
    init_tracing();
    let tree = SourceTree::site();
    let cfg = ConfigFileBuilder::rooted_at(tree.root())
        .with_port(0)
        .with_debounce_ms(20)
        .with_fast_avif()
        .build();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let plan = Arc::new(dev_plan(&cfg, shutdown_rx)?);
    let server = Arc::clone(&plan.server);
    let run = {
        let plan = Arc::clone(&plan);
        tokio::spawn(async move { run_dev_plan(&plan).await })
    };

    eventually("preview server", || server.local_addr().is_some()).await;
    let addr = server.local_addr().expect("server address");
    TcpStream::connect(addr).await?;
    assert!(tree.output_file("css/style.min.css").is_file());

    // Let the watcher arm before touching sources.
    sleep(Duration::from_millis(500)).await;

    tree.write("sass/_colors.scss", "$ink: #00ff00;\n");
    eventually("styles rebuild", || {
        let css = tree.read_output("css/style.min.css");
        css.contains("#0f0") || css.contains("lime")
    })
    .await;

    shutdown_tx.send(true)?;
    joined(run).await??;
    assert!(server.local_addr().is_none());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_before_serving_still_returns_ok() -> TestResult {
    init_tracing();
    let tree = SourceTree::site();
    let cfg = ConfigFileBuilder::rooted_at(tree.root())
        .with_port(0)
        .with_fast_avif()
        .build();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let plan = dev_plan(&cfg, shutdown_rx)?;
    shutdown_tx.send(true)?;

    timeout(Duration::from_secs(60), run_dev_plan(&plan))
        .await
        .expect("dev run did not stop")?;
    assert!(plan.server.local_addr().is_none());
    Ok(())
}
