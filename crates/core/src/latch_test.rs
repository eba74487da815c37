//! Tests for the shutdown latches

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::time::timeout;

use super::*;

#[tokio::test]
async fn test_waitable_latch_close_is_idempotent() {
    let latch = WaitableLatch::new();
    assert!(!latch.is_closed());
    latch.close();
    latch.close();
    assert!(latch.is_closed());
    timeout(Duration::from_secs(1), latch.wait())
        .await
        .expect("wait returns after close");
}

#[tokio::test]
async fn test_waitable_latch_clones_share_the_event() {
    let latch = WaitableLatch::new();
    let observer = latch.clone();
    latch.close();
    assert!(observer.is_closed());
}

#[tokio::test]
async fn test_handler_registered_before_close_runs_once() {
    let latch = WaitableLatch::new();
    let handlers = HandleableLatch::new(&latch);

    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    handlers.handle_with(move || {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    latch.close();
    timeout(Duration::from_secs(1), async {
        while calls.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("handler runs after close");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_handler_registered_after_close_runs_immediately() {
    let latch = WaitableLatch::new();
    let handlers = HandleableLatch::new(&latch);
    latch.close();

    // Let the watcher drain first so registration hits the closed branch.
    tokio::time::sleep(Duration::from_millis(20)).await;

    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    handlers.handle_with(move || {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_handlers_run_in_registration_order() {
    let latch = WaitableLatch::new();
    let handlers = HandleableLatch::new(&latch);

    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
    for i in 0..3 {
        let order = Arc::clone(&order);
        handlers.handle_with(move || order.lock().push(i));
    }
    latch.close();

    timeout(Duration::from_secs(1), async {
        while order.lock().len() < 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("all handlers run");
    assert_eq!(*order.lock(), vec![0, 1, 2]);
}
