use crate::environ::AdmissionConfig;
use crate::error::HttpError;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tracing::{info, warn};

/// Bounds concurrent decoder invocations against a fixed admission-slot count and sheds load
/// with a 503 rather than queueing, so the upstream producer can coalesce a newer audio window
/// instead of waiting on stale audio.
///
/// The semaphore is the admission slot count; the waiting counter tracks requests that passed
/// the busy check but have not yet acquired a slot, guarded by its own mutex exactly as spec'd
/// ("a mutex guarding the waiting counter... the semaphore is atomic").
pub struct AdmissionController {
    config: AdmissionConfig,
    slots: Arc<Semaphore>,
    waiting: Mutex<u32>,
}

impl AdmissionController {
    pub fn new(config: AdmissionConfig) -> Self {
        let slots = Arc::new(Semaphore::new(config.max_concurrent));
        Self {
            config,
            slots,
            waiting: Mutex::new(0),
        }
    }

    /// Runs the four-step admission algorithm and returns the acquired permit on success.
    /// The permit's `Drop` releases the slot on every exit path, including panics unwound
    /// through the caller.
    pub async fn admit(&self) -> Result<OwnedSemaphorePermit, HttpError> {
        {
            let mut waiting = self.waiting.lock().await;

            if self.config.fail_fast_when_busy
                && (self.slots.available_permits() == 0 || *waiting > 0)
            {
                return Err(self.shed("server busy, fail-fast"));
            }

            if *waiting as usize >= self.config.max_queue {
                warn!(
                    waiting = *waiting,
                    max_queue = self.config.max_queue,
                    "admission queue full, rejecting request"
                );
                return Err(self.shed("admission queue full"));
            }

            *waiting += 1;
        }

        let permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .expect("admission semaphore is never closed");

        {
            let mut waiting = self.waiting.lock().await;
            *waiting -= 1;
        }

        info!(
            available = self.slots.available_permits(),
            "admission slot acquired"
        );
        Ok(permit)
    }

    fn shed(&self, reason: &str) -> HttpError {
        info!(reason, "shedding request with 503");
        HttpError::Overloaded {
            retry_after_seconds: self.config.busy_retry_after_s as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_concurrent: usize, max_queue: usize, fail_fast: bool) -> AdmissionConfig {
        AdmissionConfig {
            max_concurrent,
            max_queue,
            fail_fast_when_busy: fail_fast,
            busy_retry_after_s: 1,
        }
    }

    #[tokio::test]
    async fn two_concurrent_acceptances_then_503() {
        let controller = Arc::new(AdmissionController::new(config(2, 10, true)));

        let p1 = controller.admit().await.expect("first should admit");
        let p2 = controller.admit().await.expect("second should admit");

        let err = controller
            .admit()
            .await
            .expect_err("third should be shed while both slots held");
        assert!(matches!(err, HttpError::Overloaded { .. }));

        drop(p1);
        drop(p2);
    }

    #[tokio::test]
    async fn fail_fast_disabled_queue_saturation() {
        // MAX_CONCURRENT=1, MAX_QUEUE=2: 1 running + 2 queued succeed, the 4th is shed.
        let controller = Arc::new(AdmissionController::new(config(1, 2, false)));

        // Runs to completion immediately: the only slot is free.
        let p1 = controller.admit().await.expect("first request runs immediately");

        let c2 = Arc::clone(&controller);
        let h2 = tokio::spawn(async move { c2.admit().await });
        tokio::task::yield_now().await;

        let c3 = Arc::clone(&controller);
        let h3 = tokio::spawn(async move { c3.admit().await });
        tokio::task::yield_now().await;

        // Both h2 and h3 are now parked on the semaphore, holding the waiting counter at 2.
        let r4 = controller.admit().await;
        assert!(matches!(r4, Err(HttpError::Overloaded { .. })));

        drop(p1);
        let p2 = h2.await.unwrap().expect("second request queues behind the first");
        drop(p2);
        let p3 = h3.await.unwrap().expect("third request queues behind the second");
        drop(p3);
    }
}
