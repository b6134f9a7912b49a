//! Pool checkout semantics: keyed reuse, capacity, guaranteed return.

use std::time::Duration;

use lupine_sandbox::SandboxPool;

#[tokio::test]
async fn same_key_reuses_the_primed_slot() {
  let dir = tempfile::tempdir().expect("tempdir");
  let pool = SandboxPool::new(dir.path(), 2);

  let first = pool.checkout("version-1").await.expect("checkout");
  assert!(!first.cached());
  let root = first.root().to_path_buf();
  drop(first);

  let second = pool.checkout("version-1").await.expect("checkout");
  assert!(second.cached());
  assert_eq!(second.root(), root);
}

#[tokio::test]
async fn distinct_keys_never_come_back_cached() {
  let dir = tempfile::tempdir().expect("tempdir");
  let pool = SandboxPool::new(dir.path(), 2);

  let first = pool.checkout("version-1-draft-a").await.expect("checkout");
  assert!(!first.cached());
  drop(first);

  let second = pool.checkout("version-1-draft-b").await.expect("checkout");
  assert!(!second.cached());
}

#[tokio::test]
async fn same_key_held_twice_gets_two_slots() {
  let dir = tempfile::tempdir().expect("tempdir");
  let pool = SandboxPool::new(dir.path(), 2);

  let first = pool.checkout("version-1").await.expect("checkout");
  let second = pool.checkout("version-1").await.expect("checkout");

  // The primed slot is busy, so the second checkout claims a fresh one.
  assert!(!second.cached());
  assert_ne!(first.id(), second.id());
}

#[tokio::test]
async fn checkout_waits_for_capacity_and_drop_releases() {
  let dir = tempfile::tempdir().expect("tempdir");
  let pool = SandboxPool::new(dir.path(), 1);

  let held = pool.checkout("version-1").await.expect("checkout");
  assert_eq!(pool.available(), 0);

  let waiter = {
    let pool = pool.clone();
    tokio::spawn(async move { pool.checkout("version-2").await.expect("checkout").cached() })
  };

  // The waiter cannot proceed while the only slot is held.
  tokio::time::sleep(Duration::from_millis(50)).await;
  assert!(!waiter.is_finished());

  drop(held);
  let cached = waiter.await.expect("join");
  assert!(!cached);
  assert_eq!(pool.available(), 1);
}
