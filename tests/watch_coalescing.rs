// tests/watch_coalescing.rs

use std::error::Error;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

use sitebuild::engine::{BindingId, CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use sitebuild_test_utils::fake_backend::FakeRunBackend;
use sitebuild_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

struct Harness {
    tx: mpsc::Sender<RuntimeEvent>,
    started: Arc<Mutex<Vec<BindingId>>>,
    join: tokio::task::JoinHandle<sitebuild::errors::Result<()>>,
}

fn spawn_runtime(bindings: usize, failing: bool) -> Harness {
    let (tx, rx) = mpsc::channel::<RuntimeEvent>(64);
    let started = Arc::new(Mutex::new(Vec::new()));
    let mut backend = FakeRunBackend::new(tx.clone(), Arc::clone(&started));
    if failing {
        backend = backend.failing();
    }
    let core = CoreRuntime::new(
        bindings,
        RuntimeOptions {
            debounce: Duration::from_millis(150),
        },
    );
    let join = tokio::spawn(Runtime::new(core, rx, tx.clone(), backend).run());
    Harness { tx, started, join }
}

async fn trigger(tx: &mpsc::Sender<RuntimeEvent>, binding: BindingId, path: &str) -> TestResult {
    tx.send(RuntimeEvent::BindingTriggered {
        binding,
        path: path.to_string(),
    })
    .await?;
    Ok(())
}

impl Harness {
    fn started(&self) -> Vec<BindingId> {
        self.started.lock().unwrap().clone()
    }

    async fn shutdown(self) -> TestResult {
        self.tx.send(RuntimeEvent::ShutdownRequested).await?;
        self.join.await??;
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn burst_inside_window_runs_once() -> TestResult {
    init_tracing();
    let h = spawn_runtime(1, false);

    for _ in 0..5 {
        trigger(&h.tx, 0, "sass/_colors.scss").await?;
        sleep(Duration::from_millis(40)).await;
    }
    sleep(Duration::from_millis(500)).await;

    assert_eq!(h.started(), vec![0]);
    h.shutdown().await
}

#[tokio::test(start_paused = true)]
async fn spaced_triggers_each_run() -> TestResult {
    init_tracing();
    let h = spawn_runtime(1, false);

    for _ in 0..3 {
        trigger(&h.tx, 0, "js/app.js").await?;
        sleep(Duration::from_millis(400)).await;
    }

    assert_eq!(h.started(), vec![0, 0, 0]);
    h.shutdown().await
}

#[tokio::test(start_paused = true)]
async fn bindings_debounce_independently() -> TestResult {
    init_tracing();
    let h = spawn_runtime(2, false);

    trigger(&h.tx, 0, "sass/style.scss").await?;
    trigger(&h.tx, 1, "index.html").await?;
    trigger(&h.tx, 0, "sass/_colors.scss").await?;
    sleep(Duration::from_millis(500)).await;

    let mut started = h.started();
    started.sort_unstable();
    assert_eq!(started, vec![0, 1]);
    h.shutdown().await
}

#[tokio::test(start_paused = true)]
async fn failed_run_keeps_watching() -> TestResult {
    init_tracing();
    let h = spawn_runtime(1, true);

    trigger(&h.tx, 0, "sass/style.scss").await?;
    sleep(Duration::from_millis(400)).await;
    trigger(&h.tx, 0, "sass/style.scss").await?;
    sleep(Duration::from_millis(400)).await;

    assert_eq!(h.started(), vec![0, 0]);
    h.shutdown().await
}

#[tokio::test(start_paused = true)]
async fn shutdown_before_window_closes_starts_nothing() -> TestResult {
    init_tracing();
    let h = spawn_runtime(1, false);

    trigger(&h.tx, 0, "index.html").await?;
    sleep(Duration::from_millis(10)).await;
    let started = Arc::clone(&h.started);
    h.shutdown().await?;

    assert!(started.lock().unwrap().is_empty());
    Ok(())
}
