//! Timer capability shared by the stats fetcher and the events poller
//!
//! Request deadlines, retry backoff and the poller's error interval all go
//! through [`Clock`], so tests can substitute a clock that does not wait on
//! wall time.

use std::time::Duration;

/// Something that can suspend the current task for a duration
#[async_trait::async_trait]
pub trait Clock: Send + Sync {
    /// Complete after `duration` has elapsed
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait::async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::sync::Semaphore;

    /// A clock that records every sleep it is asked for.
    ///
    /// By default sleeps complete immediately. A gated clock instead parks
    /// each sleep until [`ManualClock::release`] hands out a permit.
    #[derive(Clone, Default)]
    pub struct ManualClock {
        sleeps: Arc<Mutex<Vec<Duration>>>,
        gate: Option<Arc<Semaphore>>,
    }

    impl ManualClock {
        /// Clock whose sleeps return immediately
        pub fn new() -> Self {
            Self::default()
        }

        /// Clock whose sleeps wait for `release`
        pub fn gated() -> Self {
            Self {
                sleeps: Arc::default(),
                gate: Some(Arc::new(Semaphore::new(0))),
            }
        }

        /// Let `count` parked (or future) sleeps complete
        pub fn release(&self, count: usize) {
            if let Some(gate) = &self.gate {
                gate.add_permits(count);
            }
        }

        /// Durations requested so far, in order
        pub fn sleeps(&self) -> Vec<Duration> {
            self.sleeps.lock().unwrap().clone()
        }

        /// Number of sleeps requested so far
        pub fn sleep_count(&self) -> usize {
            self.sleeps.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl Clock for ManualClock {
        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
            match &self.gate {
                Some(gate) => {
                    if let Ok(permit) = gate.acquire().await {
                        permit.forget();
                    }
                }
                None => tokio::task::yield_now().await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::ManualClock;
    use super::*;

    #[tokio::test]
    async fn test_manual_clock_records_sleeps() {
        let clock = ManualClock::new();
        clock.sleep(Duration::from_millis(5)).await;
        clock.sleep(Duration::from_secs(3)).await;
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_millis(5), Duration::from_secs(3)]
        );
    }

    #[tokio::test]
    async fn test_gated_clock_waits_for_release() {
        let clock = ManualClock::gated();
        let sleeper = clock.clone();
        let handle = tokio::spawn(async move {
            sleeper.sleep(Duration::from_secs(60)).await;
        });

        tokio::task::yield_now().await;
        assert!(!handle.is_finished());

        clock.release(1);
        handle.await.unwrap();
        assert_eq!(clock.sleep_count(), 1);
    }

    #[tokio::test]
    async fn test_tokio_clock_sleeps() {
        let start = std::time::Instant::now();
        TokioClock.sleep(Duration::from_millis(10)).await;
        assert!(start.elapsed() >= Duration::from_millis(10));
    }
}
