use std::cell::RefCell;
use std::collections::HashMap;

use super::*;

fn transient(item: &str) -> Error {
    Error::Network {
        url: format!("https://cutouts.invalid/{}", item),
        status: Some(503),
        reason: "HTTP 503".to_string(),
    }
}

#[test]
fn test_all_succeed_in_one_pass() {
    let items = vec![1, 2, 3];
    let mut calls = 0;
    let report = run_batch(&items, 3, |&x| {
        calls += 1;
        Ok::<_, Error>(x * 10)
    });

    assert!(report.is_complete());
    assert_eq!(calls, 3);
    let results: Vec<i32> = report.succeeded.iter().map(|(_, r)| *r).collect();
    assert_eq!(results, vec![10, 20, 30]);
}

#[test]
fn test_retries_only_failures() {
    let items = vec!["NGC1300", "M95", "NGC4321"];
    let attempts = RefCell::new(HashMap::<&str, usize>::new());

    // M95 succeeds on its second attempt.
    let report = run_batch(&items, 3, |&name| {
        let mut attempts = attempts.borrow_mut();
        let count = attempts.entry(name).or_insert(0);
        *count += 1;
        if name == "M95" && *count < 2 {
            Err(transient(name))
        } else {
            Ok(())
        }
    });

    assert!(report.is_complete());
    assert_eq!(report.total(), 3);
    let attempts = attempts.into_inner();
    assert_eq!(attempts["NGC1300"], 1);
    assert_eq!(attempts["M95"], 2);
    assert_eq!(attempts["NGC4321"], 1);
    assert_eq!(*report.succeeded.last().unwrap().0, "M95");
}

#[test]
fn test_persistent_failure_is_reported_after_all_items() {
    let items = vec!["A", "broken", "C"];
    let mut seen = Vec::new();

    let report = run_batch(&items, 3, |&name| {
        seen.push(name);
        if name == "broken" {
            Err(transient(name))
        } else {
            Ok(name.len())
        }
    });

    // The failure does not stop later items.
    assert_eq!(seen, vec!["A", "broken", "C", "broken", "broken"]);
    assert_eq!(report.succeeded.len(), 2);
    assert_eq!(report.failed.len(), 1);

    let failure = &report.failed[0];
    assert_eq!(*failure.item, "broken");
    assert_eq!(failure.attempts, 3);
    assert!(failure.error.to_string().contains("broken"));
}

#[test]
fn test_zero_passes_still_runs_once() {
    let items = vec![()];
    let mut calls = 0;
    let report = run_batch(&items, 0, |_| {
        calls += 1;
        Err::<(), _>(transient("x"))
    });
    assert_eq!(calls, 1);
    assert_eq!(report.failed[0].attempts, 1);
}

#[test]
fn test_empty_batch() {
    let items: Vec<u8> = Vec::new();
    let report = run_batch(&items, 3, |_| Ok::<_, Error>(()));
    assert_eq!(report.total(), 0);
    assert!(report.is_complete());
}
