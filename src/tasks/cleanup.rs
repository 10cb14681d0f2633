//! Expiry Sweep Task
//!
//! Background task that periodically removes stale cache entries, so entries
//! that are never read again still release their space.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;

/// Spawns a background task that periodically removes stale cache entries.
///
/// Each sweep runs on the blocking pool. A round that finds the store busy
/// is skipped; the next round retries.
///
/// # Arguments
/// * `cache` - Shared handle to the store
/// * `interval` - Time between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(CacheStore::with_max_size(Some(1 << 20)));
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(30));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(cache: Arc<CacheStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting expiry sweep with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            // The store lock blocks, so the sweep runs off the async workers
            let sweep = Arc::clone(&cache);
            match tokio::task::spawn_blocking(move || sweep.cleanup_expired()).await {
                Ok(Ok(0)) => debug!("Expiry sweep: no stale entries found"),
                Ok(Ok(removed)) => info!("Expiry sweep: removed {} stale entries", removed),
                Ok(Err(err)) => debug!("Expiry sweep skipped: {}", err),
                Err(err) => warn!("Expiry sweep failed: {}", err),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cleanup_task_removes_stale_entries() {
        let cache = Arc::new(CacheStore::with_max_size(Some(1000)));
        cache
            .set("expire_soon", "value", Some(Duration::from_millis(50)))
            .unwrap();

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(350)).await;

        // Gone from the table without any read touching it
        assert!(!cache.contains_key("expire_soon").unwrap());
        assert_eq!(cache.current_size().unwrap(), 0);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let cache = Arc::new(CacheStore::with_max_size(Some(1000)));
        cache
            .set("long_lived", "value", Some(Duration::from_secs(3600)))
            .unwrap();
        cache.set("no_ttl", "value", None).unwrap();

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(
            cache.try_get("long_lived").unwrap().as_deref(),
            Some("value")
        );
        assert!(cache.contains_key("no_ttl").unwrap());

        handle.abort();
    }

    #[tokio::test]
    async fn test_busy_sweep_does_not_stall_runtime() {
        use crate::config::CacheConfig;
        use std::sync::mpsc;
        use std::time::Instant;

        let cache = Arc::new(CacheStore::new(
            CacheConfig::with_max_size(Some(1000)).lock_timeout(Duration::from_millis(200)),
        ));
        let (locked_tx, locked_rx) = mpsc::channel();
        let holder = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                let _guard = cache.lock_exclusive();
                locked_tx.send(()).unwrap();
                std::thread::sleep(Duration::from_millis(500));
            })
        };
        locked_rx.recv().unwrap();

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(5));
        let started = Instant::now();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let waited = started.elapsed();

        handle.abort();
        holder.join().unwrap();

        assert!(waited < Duration::from_millis(150), "runtime stalled for {:?}", waited);
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let cache = Arc::new(CacheStore::with_max_size(Some(1000)));

        let handle = spawn_cleanup_task(cache, Duration::from_secs(1));

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
