//! View-scoped runtime pieces: liveness guard and countdown ticker.
//!
//! # Responsibility
//! - Let a view signal teardown so in-flight operations stop applying state.
//! - Drive periodic recomputation of derived countdown values.
//!
//! # Invariants
//! - A closed `ViewLiveness` never reopens.
//! - A ticker stops no later than one tick after cancel, and its thread is
//!   joined before `cancel` returns.

use crate::clock::{now_epoch_ms, EpochMs};
use crate::config::CoreConfig;
use crossbeam_channel::{bounded, select, tick, Sender};
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Liveness flag shared between a view and the operations it started.
#[derive(Debug, Clone)]
pub struct ViewLiveness {
    alive: Arc<AtomicBool>,
}

impl Default for ViewLiveness {
    fn default() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl ViewLiveness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Marks the view as torn down.
    pub fn close(&self) {
        self.alive.store(false, Ordering::Release);
    }
}

/// Returns `true` when no guard is set or the guard is still alive.
pub(crate) fn still_alive(liveness: Option<&ViewLiveness>) -> bool {
    liveness.map_or(true, ViewLiveness::is_alive)
}

/// Repeating recompute task owned by one view.
pub struct CountdownTicker;

impl CountdownTicker {
    /// Calls `on_tick(now)` every `interval` on a dedicated thread until the
    /// returned handle is cancelled or dropped.
    pub fn start<F>(interval: Duration, on_tick: F) -> std::io::Result<TickerHandle>
    where
        F: FnMut(EpochMs) + Send + 'static,
    {
        Self::start_with_clock(interval, now_epoch_ms, on_tick)
    }

    /// `start` at the configured `tick_interval_ms`.
    pub fn start_with_config<F>(config: &CoreConfig, on_tick: F) -> std::io::Result<TickerHandle>
    where
        F: FnMut(EpochMs) + Send + 'static,
    {
        Self::start(config.tick_interval(), on_tick)
    }

    /// Same as `start` with an injectable clock.
    pub fn start_with_clock<C, F>(
        interval: Duration,
        clock: C,
        mut on_tick: F,
    ) -> std::io::Result<TickerHandle>
    where
        C: Fn() -> EpochMs + Send + 'static,
        F: FnMut(EpochMs) + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let ticks = tick(interval);
        let thread = std::thread::Builder::new()
            .name("countdown-ticker".to_string())
            .spawn(move || {
                debug!(
                    "event=ticker_start module=session status=ok interval_ms={}",
                    interval.as_millis()
                );
                loop {
                    select! {
                        recv(stop_rx) -> _ => break,
                        recv(ticks) -> _ => on_tick(clock()),
                    }
                }
                debug!("event=ticker_stop module=session status=ok");
            })?;

        Ok(TickerHandle {
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        })
    }
}

/// Cancel handle for a running `CountdownTicker`.
pub struct TickerHandle {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl TickerHandle {
    pub fn is_running(&self) -> bool {
        self.thread
            .as_ref()
            .is_some_and(|thread| !thread.is_finished())
    }

    /// Stops the ticker and waits for its thread.
    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // The sender is dropped right after, so a full channel still wakes
        // the select through disconnection.
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.try_send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!(
                    "event=ticker_stop module=session status=error error_code=tick_callback_panicked"
                );
            }
        }
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
