//! Clock port.
//!
//! Time-dependent code (watermarks, poll schedules, replay windows) takes
//! a clock so tests can drive it without sleeping.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::foundation::Timestamp;

#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;

    /// Pause for `duration`. Test clocks may return immediately.
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by the tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_object_safe() {
        fn _accepts_dyn(_clock: &dyn Clock) {}
    }

    #[tokio::test]
    async fn system_clock_advances() {
        let clock = SystemClock;
        let a = clock.now();
        clock.sleep(Duration::from_millis(5)).await;
        let b = clock.now();
        assert!(!a.is_after(&b));
    }
}
