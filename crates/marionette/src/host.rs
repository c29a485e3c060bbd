//! # Owner Tick Loop
//!
//! The owner thread's side of the bargain: build the stage, then drain
//! the action queue once per tick, forever. Scripts on worker threads see
//! their effects land between ticks; nothing here ever waits on a worker.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use marionette_bridge::{EventBridge, EventTable, StageQueue};
use marionette_core::ActionQueue;
use marionette_ui::{Stage, WindowRegistry};

use crate::config::HostConfig;

/// Tick timing statistics.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostStats {
    /// Total ticks executed.
    pub ticks: u64,
    /// Total queued tasks executed.
    pub tasks_executed: u64,
    /// Maximum drain duration observed (microseconds).
    pub max_drain_us: u64,
    /// Rolling average drain duration (microseconds).
    pub avg_drain_us: u64,
}

/// The owner-thread shell around stage, queue and bridge.
pub struct Host {
    queue: StageQueue,
    bridge: EventBridge,
    config: HostConfig,
    stats: HostStats,
}

impl Host {
    /// Builds a host from configuration.
    ///
    /// Must be called on the thread that will tick: that thread becomes
    /// the stage's owner.
    #[must_use]
    pub fn new(config: HostConfig) -> Self {
        let stage = Stage::new(
            config.viewport_width,
            config.viewport_height,
            WindowRegistry::new(),
        );
        let queue = ActionQueue::new(stage);
        let bridge = EventBridge::new(Arc::clone(&queue), Arc::new(EventTable::standard()));
        Self {
            queue,
            bridge,
            config,
            stats: HostStats::default(),
        }
    }

    /// A queue handle for workers (and for owner-side stage access).
    #[must_use]
    pub fn queue(&self) -> StageQueue {
        Arc::clone(&self.queue)
    }

    /// An event bridge handle for workers.
    #[must_use]
    pub fn bridge(&self) -> EventBridge {
        self.bridge.clone()
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Tick statistics so far.
    #[must_use]
    pub fn stats(&self) -> HostStats {
        self.stats
    }

    /// Executes one tick: a single drain plus bookkeeping.
    ///
    /// Returns the number of tasks executed.
    pub fn tick(&mut self) -> usize {
        let started = Instant::now();
        let executed = self.queue.drain();
        let drain_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

        self.stats.ticks += 1;
        self.stats.tasks_executed += executed as u64;
        self.stats.max_drain_us = self.stats.max_drain_us.max(drain_us);
        self.stats.avg_drain_us = (self.stats.avg_drain_us * 15 + drain_us) / 16;

        if executed > 0 {
            tracing::trace!("tick {}: {} task(s)", self.stats.ticks, executed);
        }
        executed
    }

    /// Runs the fixed-timestep loop for (at least) the given duration.
    pub fn run_for(&mut self, duration: Duration) {
        let tick_duration = self.config.tick_duration();
        let start = Instant::now();
        let mut next_tick = start;

        while start.elapsed() < duration {
            let now = Instant::now();
            if now < next_tick {
                thread::sleep(next_tick - now);
            }
            next_tick += tick_duration;
            self.tick();
        }
    }

    /// Ticks until `done` reports true, yielding between ticks.
    ///
    /// Convenience for joining worker scripts without a wall-clock bound.
    pub fn run_until(&mut self, mut done: impl FnMut() -> bool) {
        while !done() {
            self.tick();
            thread::yield_now();
        }
    }

    /// Shuts the queue down; blocked scripts fail fast from here on.
    pub fn shutdown(&self) {
        self.queue.shutdown();
        tracing::info!(
            "host shut down after {} tick(s), {} task(s)",
            self.stats.ticks,
            self.stats.tasks_executed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_executes_queued_tasks_and_counts_them() {
        let mut host = Host::new(HostConfig::default());
        let queue = host.queue();

        queue.post(|stage| {
            let id = stage.next_id();
            stage.add_root(Box::new(marionette_ui::Window::new(id, "main")));
        });

        assert_eq!(host.tick(), 1);
        let stats = host.stats();
        assert_eq!(stats.ticks, 1);
        assert_eq!(stats.tasks_executed, 1);
        queue.with_stage(|stage| assert_eq!(stage.len(), 1));
    }

    #[test]
    fn test_run_for_keeps_ticking() {
        let mut host = Host::new(HostConfig {
            tick_rate: 200,
            ..HostConfig::default()
        });
        host.run_for(Duration::from_millis(50));
        assert!(host.stats().ticks >= 2);
    }

    #[test]
    fn test_shutdown_fails_blocked_scripts_fast() {
        let host = Host::new(HostConfig::default());
        let queue = host.queue();

        host.shutdown();
        let worker = thread::spawn(move || queue.call(|stage| stage.len()));
        assert_eq!(
            worker.join().unwrap(),
            Err(marionette_core::QueueError::ShutDown)
        );
    }
}
