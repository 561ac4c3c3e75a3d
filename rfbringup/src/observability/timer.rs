//! Stage timing.

use tokio::time::Instant;

/// Measures the wall time of a span.
///
/// Uses the tokio clock so paused-time tests see the simulated delays.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts timing `name`.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// The span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stops the timer and returns the elapsed milliseconds.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_timer_follows_tokio_clock() {
        let timer = SpanTimer::start("rf-synthesis");
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(timer.name(), "rf-synthesis");
        let elapsed = timer.finish();
        assert!((200.0..201.0).contains(&elapsed), "{elapsed}");
    }
}
