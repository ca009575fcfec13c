//! Periodic inventory refresh
//!
//! Runs the dump → inventory pipeline on a fixed interval until cancelled.
//! Cancellation also interrupts a pending wait, so shutdown never has to
//! sit out the rest of an interval.

use crate::engine::Engine;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// Handle to the running refresh task
pub struct Refresher {
    token: CancellationToken,
    handle: JoinHandle<u64>,
}

impl Refresher {
    /// Spawn the refresh loop. The first refresh happens one `interval`
    /// from now; the caller performs the initial one.
    pub fn spawn(engine: Arc<Engine>, interval: Duration) -> Self {
        let token = CancellationToken::new();
        let handle = tokio::spawn(run(engine, interval, token.clone()));
        info!("Refresher started ({}s interval)", interval.as_secs());
        Self { token, handle }
    }

    /// Token that stops the loop when cancelled
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Stop the loop and wait for it. Returns the number of refreshes run.
    pub async fn stop(self) -> u64 {
        self.token.cancel();
        match self.handle.await {
            Ok(cycles) => {
                debug!(cycles, "Refresher stopped");
                cycles
            }
            Err(e) => {
                debug!("Refresher task ended abnormally: {}", e);
                0
            }
        }
    }
}

async fn run(engine: Arc<Engine>, interval: Duration, token: CancellationToken) -> u64 {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cycles = 0u64;

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                cycles += 1;
                trace!(cycles, "Periodic refresh");
                engine.refresh_logged().await;
            }
        }
    }

    cycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_tool::fake::FakeTool;
    use crate::cli::Settings;

    const DUMP: &str = "Name\tType\tDirection\tDevice State\tItem ID\r\nSpeakers\tDevice\tRender\tActive\tDevA\r\n\r\n";

    fn engine(tool: &Arc<FakeTool>) -> Arc<Engine> {
        Arc::new(Engine::new(tool.clone(), Settings::default()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_every_interval() {
        let tool = Arc::new(FakeTool::with_dump(DUMP));
        let engine = engine(&tool);
        let refresher = Refresher::spawn(Arc::clone(&engine), Duration::from_secs(30));

        tokio::time::sleep(Duration::from_secs(95)).await;
        let cycles = refresher.stop().await;

        assert_eq!(cycles, 3);
        assert_eq!(tool.queries(), 3);
        assert_eq!(engine.inventory().devices.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_interrupts_pending_wait() {
        let tool = Arc::new(FakeTool::with_dump(DUMP));
        let refresher = Refresher::spawn(engine(&tool), Duration::from_secs(3600));

        assert_eq!(refresher.stop().await, 0);
        assert_eq!(tool.queries(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_refresh_keeps_running() {
        let tool = Arc::new(FakeTool::default());
        let refresher = Refresher::spawn(engine(&tool), Duration::from_secs(30));

        tokio::time::sleep(Duration::from_secs(65)).await;
        assert_eq!(refresher.stop().await, 2);
        assert_eq!(tool.queries(), 2);
    }

    #[tokio::test]
    async fn test_token_cancels_loop() {
        let tool = Arc::new(FakeTool::with_dump(DUMP));
        let refresher = Refresher::spawn(engine(&tool), Duration::from_secs(3600));

        refresher.token().cancel();
        assert_eq!(refresher.stop().await, 0);
    }
}
