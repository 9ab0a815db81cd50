// tests/composition_properties.rs

use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use sitebuild::errors::TransformError;
use sitebuild::task::{parallel, run, series, Task};

type Log = Arc<Mutex<Vec<String>>>;

fn leaf(name: String, fails: bool, log: &Log) -> Task {
    let log = Arc::clone(log);
    let label = name.clone();
    Task::sync(name, move || {
        log.lock().unwrap().push(label.clone());
        if fails {
            Err(TransformError::Failed(format!("{label} failed")))
        } else {
            Ok(Vec::new())
        }
    })
}

fn leaves(fails: &[bool], log: &Log) -> Vec<Task> {
    fails
        .iter()
        .enumerate()
        .map(|(i, &f)| leaf(format!("t{i}"), f, log))
        .collect()
}

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(f)
}

proptest! {
    #[test]
    fn series_runs_in_order_and_stops_at_first_failure(
        fails in proptest::collection::vec(any::<bool>(), 1..8)
    ) {
        let log: Log = Arc::default();
        let tree = series(leaves(&fails, &log)).unwrap();
        let result = block_on(run(&tree));

        let first_failure = fails.iter().position(|&f| f);
        let expected: Vec<String> = match first_failure {
            Some(i) => (0..=i).map(|j| format!("t{j}")).collect(),
            None => (0..fails.len()).map(|j| format!("t{j}")).collect(),
        };
        prop_assert_eq!(log.lock().unwrap().clone(), expected);

        match (first_failure, result) {
            (None, Ok(_)) => {}
            (Some(i), Err(failure)) => prop_assert_eq!(failure.task, format!("t{i}")),
            (expected, got) => prop_assert!(false, "expected failure at {:?}, got {:?}", expected, got.is_ok()),
        }
    }

    #[test]
    fn parallel_runs_everything_and_fails_iff_any_child_fails(
        fails in proptest::collection::vec(any::<bool>(), 1..8)
    ) {
        let log: Log = Arc::default();
        let tree = parallel(leaves(&fails, &log)).unwrap();
        let result = block_on(run(&tree));

        let mut ran = log.lock().unwrap().clone();
        ran.sort();
        let mut all: Vec<String> = (0..fails.len()).map(|j| format!("t{j}")).collect();
        all.sort();
        prop_assert_eq!(ran, all);

        prop_assert_eq!(result.is_err(), fails.iter().any(|&f| f));
        if let Err(failure) = result {
            let idx: usize = failure.task[1..].parse().unwrap();
            prop_assert!(fails[idx]);
        }
    }

    #[test]
    fn nested_series_inside_parallel_keeps_its_order(
        len in 1usize..6
    ) {
        let log: Log = Arc::default();
        let inner = series(leaves(&vec![false; len], &log)).unwrap();
        let sibling = leaf("other".to_string(), false, &log);
        let tree = parallel([inner, sibling]).unwrap();
        block_on(run(&tree)).unwrap();

        let order: Vec<String> = log
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.starts_with('t'))
            .cloned()
            .collect();
        let expected: Vec<String> = (0..len).map(|j| format!("t{j}")).collect();
        prop_assert_eq!(order, expected);
    }
}

#[test]
fn empty_compositions_are_rejected() {
    assert!(series(Vec::<Task>::new()).is_err());
    assert!(parallel(Vec::<Task>::new()).is_err());
}
