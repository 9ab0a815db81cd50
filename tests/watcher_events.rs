// tests/watcher_events.rs

use std::error::Error;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

use sitebuild::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use sitebuild::task::Task;
use sitebuild::watch::{spawn_watcher, WatchBinding};
use sitebuild_test_utils::fake_backend::FakeRunBackend;
use sitebuild_test_utils::fixtures::SourceTree;
use sitebuild_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn noop(name: &str) -> Task {
    Task::sync(name, || Ok(Vec::new()))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn real_file_events_reach_only_matching_bindings() -> TestResult {
    init_tracing();
    let tree = SourceTree::empty();
    let bindings = Arc::new(vec![
        WatchBinding::new(["sass/**/*.scss"], noop("styles"))?,
        WatchBinding::new(["js/**/*.js"], noop("scripts"))?,
    ]);

    let (tx, rx) = mpsc::channel::<RuntimeEvent>(64);
    let started = Arc::new(Mutex::new(Vec::new()));
    let backend = FakeRunBackend::new(tx.clone(), Arc::clone(&started));
    let core = CoreRuntime::new(
        bindings.len(),
        RuntimeOptions {
            debounce: Duration::from_millis(50),
        },
    );

    let _watcher = spawn_watcher(tree.source(), Arc::clone(&bindings), tx.clone(), false)?;
    let join = tokio::spawn(Runtime::new(core, rx, tx.clone(), backend).run());

    // Give the OS watcher a moment to register.
    sleep(Duration::from_millis(100)).await;
    tree.write("sass/_partial.scss", "$a: 1;\n");
    tree.write("notes.md", "ignored");

    with_timeout(async {
        while started.lock().unwrap().is_empty() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    sleep(Duration::from_millis(200)).await;

    assert!(started.lock().unwrap().iter().all(|&b| b == 0));

    tx.send(RuntimeEvent::ShutdownRequested).await?;
    join.await??;
    Ok(())
}
