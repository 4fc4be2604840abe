//! The poll loop.
//!
//! Every tick re-derives the connection state from a fresh `netsh` query:
//!
//! 1. Status query fails: log it and wait for the next tick.
//! 2. Connected to the target: nothing to do.
//! 3. Not connected: scan. If the target is in range, send a connect command;
//!    its effect is only checked on the following tick.
//!
//! Ticks run strictly one after another. Every error is logged and the loop
//! carries on; nothing during steady-state polling is fatal.

use std::time::Duration;

use anyhow::Result;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::connection;
use crate::runner::CommandRunner;
use crate::scan;

/// What a single tick observed and did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Already connected to the target network.
    Connected,
    /// The status query failed; nothing else was attempted.
    StatusUnavailable,
    /// Not connected, and the scan failed.
    VisibilityUnavailable,
    /// Not connected, and the target is out of range.
    NotVisible,
    /// A connect command was accepted.
    ReconnectIssued,
    /// The connect command failed or timed out.
    ReconnectFailed,
}

/// Keeps one interface connected to one network.
pub struct Monitor<R> {
    runner: R,
    ssid: String,
    interface: String,
}

impl<R: CommandRunner> Monitor<R> {
    pub fn new(runner: R, ssid: impl Into<String>, interface: impl Into<String>) -> Self {
        Self {
            runner,
            ssid: ssid.into(),
            interface: interface.into(),
        }
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Run one check-and-connect pass.
    pub async fn check_once(&self) -> CheckOutcome {
        let ssid = self.ssid.as_str();
        let interface = self.interface.as_str();
        info!(ssid, interface, "Checking WiFi connection");

        let connected = match connection::is_connected(&self.runner, ssid, interface).await {
            Ok(connected) => connected,
            Err(e) => {
                error!(ssid, interface, error = %e, timeout = e.is_timeout(), "Failed to query connection status");
                return CheckOutcome::StatusUnavailable;
            }
        };

        if connected {
            info!(ssid, "Connected to target network");
            return CheckOutcome::Connected;
        }

        warn!(ssid, interface, "Not connected to target network");

        let visible = match scan::is_network_visible(&self.runner, ssid, interface).await {
            Ok(visible) => visible,
            Err(e) => {
                error!(ssid, interface, error = %e, timeout = e.is_timeout(), "Failed to check network visibility");
                return CheckOutcome::VisibilityUnavailable;
            }
        };

        if !visible {
            warn!(ssid, "Target network not visible, skipping connect attempt");
            return CheckOutcome::NotVisible;
        }

        info!(ssid, "Target network visible, connecting");
        match connection::connect(&self.runner, ssid, interface).await {
            Ok(()) => {
                info!(ssid, "Connect command sent, will confirm on the next check");
                CheckOutcome::ReconnectIssued
            }
            Err(e) => {
                error!(ssid, error = %e, "Connect attempt failed");
                CheckOutcome::ReconnectFailed
            }
        }
    }

    /// Check immediately, then every `interval`, until Ctrl-C.
    ///
    /// A tick that overruns the interval delays the next one rather than
    /// causing a burst of catch-up ticks.
    pub async fn run(&self, interval: Duration) -> Result<()> {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                result = &mut shutdown => {
                    result?;
                    info!("Interrupted, stopping");
                    return Ok(());
                }
                instant = ticker.tick() => {
                    debug!(elapsed = ?instant.elapsed(), "Tick");
                    self.check_once().await;
                }
            }
        }
    }

    /// Like [`Monitor::run`] but stops after `ticks` passes, returning what
    /// each pass did.
    pub async fn run_ticks(&self, interval: Duration, ticks: usize) -> Vec<CheckOutcome> {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut outcomes = Vec::with_capacity(ticks);
        for _ in 0..ticks {
            ticker.tick().await;
            outcomes.push(self.check_once().await);
        }
        outcomes
    }
}
