//! Relay configuration.

use std::time::Duration;

use lanchat_transport::DEFAULT_READ_BUFFER_SIZE;
use tracing::warn;

/// Tunables for a relay server.
///
/// Every field has a sensible default; override only what you need:
///
/// ```rust
/// use lanchat::RelayConfig;
///
/// let config = RelayConfig {
///     max_connections: 32,
///     ..RelayConfig::default()
/// };
/// assert_eq!(config.sweep_every, 1200);
/// ```
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Upper bound on simultaneously open client connections. Once reached,
    /// the acceptor stops accepting until a connection closes.
    pub max_connections: usize,

    /// Capacity of the queue between receivers and the dispatcher. A full
    /// queue makes receivers wait before reading more.
    pub inbound_capacity: usize,

    /// Capacity of the queue between the dispatcher and the sender.
    pub outbound_capacity: usize,

    /// Bytes handed to each read call. A frame larger than this cannot be
    /// decoded.
    pub read_buffer_size: usize,

    /// How often the reaper wakes up.
    pub sweep_interval: Duration,

    /// The reaper only scans every `sweep_every` wake-ups, so the effective
    /// disconnect-detection window is `sweep_interval * sweep_every`.
    pub sweep_every: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_connections: 256,
            inbound_capacity: 1024,
            outbound_capacity: 1024,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            sweep_interval: Duration::from_millis(100),
            sweep_every: 1200, // 2 minutes at the default interval
        }
    }
}

impl RelayConfig {
    /// Smallest accepted read buffer.
    pub const MIN_READ_BUFFER_SIZE: usize = 256;
    /// Largest accepted read buffer.
    pub const MAX_READ_BUFFER_SIZE: usize = 64 * 1024;

    /// Clamp and fix any out-of-range values so the config is safe to use.
    ///
    /// Called automatically when the server is built. Rules:
    /// - counts and capacities are at least 1,
    /// - `read_buffer_size` is clamped to
    ///   [`MIN_READ_BUFFER_SIZE`](Self::MIN_READ_BUFFER_SIZE)..=[`MAX_READ_BUFFER_SIZE`](Self::MAX_READ_BUFFER_SIZE),
    /// - a zero `sweep_interval` becomes 1 ms.
    pub fn validated(mut self) -> Self {
        if self.max_connections == 0 {
            warn!("max_connections is 0, using 1");
            self.max_connections = 1;
        }
        self.inbound_capacity = self.inbound_capacity.max(1);
        self.outbound_capacity = self.outbound_capacity.max(1);
        let clamped = self
            .read_buffer_size
            .clamp(Self::MIN_READ_BUFFER_SIZE, Self::MAX_READ_BUFFER_SIZE);
        if clamped != self.read_buffer_size {
            warn!(
                requested = self.read_buffer_size,
                clamped, "read_buffer_size out of range, clamping"
            );
            self.read_buffer_size = clamped;
        }
        if self.sweep_interval.is_zero() {
            self.sweep_interval = Duration::from_millis(1);
        }
        self.sweep_every = self.sweep_every.max(1);
        self
    }

    /// How long a dead session may linger before the reaper notices it.
    pub fn sweep_window(&self) -> Duration {
        self.sweep_interval * self.sweep_every
    }
}
