//! Shared Tokio runtime backing the blocking wrappers on [`crate::Recognizer`].

use once_cell::sync::Lazy;
use std::future::Future;

/// Global Tokio runtime for synchronous operations.
///
/// Lazily initialized on first use and shared across all sync wrappers.
///
/// # Safety
///
/// The `.expect()` here is justified because runtime creation can only fail on resource
/// exhaustion (thread limit, OOM), in which case no recognition could run anyway.
static GLOBAL_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("inkscan-worker")
        .build()
        .expect("Failed to create global Tokio runtime - system may be out of resources")
});

/// Drive `future` to completion on the global runtime.
///
/// Must not be called from inside an async context; use the async APIs there.
pub fn block_on<F: Future>(future: F) -> F::Output {
    GLOBAL_RUNTIME.block_on(future)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_on_returns_output() {
        let value = block_on(async { 40 + 2 });
        assert_eq!(value, 42);
    }

    #[test]
    fn test_block_on_supports_spawned_tasks() {
        let value = block_on(async { tokio::spawn(async { "done" }).await.unwrap() });
        assert_eq!(value, "done");
    }
}
