//! Periodic sweep for sessions whose connection died silently.
//!
//! A client that vanishes without signing off (cable pulled, process
//! killed) is usually noticed by its receiver or by a failed send. The
//! reaper catches the rest: it wakes every `interval` and, on every
//! `every`-th wake-up, retires each session whose connection reports
//! not-connected.

use std::sync::Arc;
use std::time::Duration;

use lanchat_session::SessionRegistry;
use lanchat_transport::Connection;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::lifecycle::{self, Departure};

/// Retires disconnected sessions on a fixed cadence.
pub struct Reaper<C> {
    registry: Arc<SessionRegistry<C>>,
    interval: Duration,
    every: u32,
}

impl<C: Connection> Reaper<C> {
    /// Creates a reaper that scans once per `interval * every`.
    pub fn new(registry: Arc<SessionRegistry<C>>, interval: Duration, every: u32) -> Self {
        Self {
            registry,
            interval,
            every: every.max(1),
        }
    }

    /// Retires every disconnected session right now. Returns how many this
    /// call removed; sessions retired concurrently elsewhere are not counted.
    pub async fn sweep(&self) -> usize {
        let mut retired = 0;
        for session in self.registry.disconnected().await {
            if lifecycle::retire(
                &self.registry,
                &session.id,
                &session.nickname,
                Departure::Dropped,
            )
            .await
            {
                retired += 1;
            }
        }
        if retired > 0 {
            debug!(retired, "reaper swept stale sessions");
        }
        retired
    }

    /// Runs until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks: u32 = 0;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    ticks += 1;
                    if ticks >= self.every {
                        ticks = 0;
                        trace!("reaper scanning");
                        self.sweep().await;
                    }
                }
            }
        }
        debug!("reaper stopped");
    }
}
