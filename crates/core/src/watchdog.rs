//! Liveness watchdog for the host's log stream
//!
//! A single timer thread owns the Armed -> Fired decision. Resets and the
//! disarm request reach it over a channel, so a reset can never race with
//! the timeout: either the reset is received before the deadline or the
//! timer has already fired.

use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use std::io;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Default silence allowed before the host is considered hung (5 minutes)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogState {
    /// Timer running
    Armed,
    /// Timeout elapsed and the fire action ran. Terminal.
    Fired,
    /// Stopped on purpose (load finished or watchdog dropped). Terminal.
    Disarmed,
}

impl WatchdogState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WatchdogState::Armed,
            1 => WatchdogState::Fired,
            _ => WatchdogState::Disarmed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            WatchdogState::Armed => 0,
            WatchdogState::Fired => 1,
            WatchdogState::Disarmed => 2,
        }
    }
}

enum Control {
    Reset,
    Disarm,
}

/// Handle to an armed watchdog timer
pub struct Watchdog {
    control: Sender<Control>,
    state: Arc<AtomicU8>,
    timeout: Duration,
}

impl Watchdog {
    /// Start the timer. `on_fire` runs on the timer thread, at most once.
    pub fn arm<F>(timeout: Duration, on_fire: F) -> io::Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let (control, control_rx) = unbounded();
        let state = Arc::new(AtomicU8::new(WatchdogState::Armed.as_u8()));

        let timer_state = Arc::clone(&state);
        thread::Builder::new()
            .name("liveness-watchdog".to_string())
            .spawn(move || loop {
                match control_rx.recv_timeout(timeout) {
                    Ok(Control::Reset) => continue,
                    Ok(Control::Disarm) | Err(RecvTimeoutError::Disconnected) => {
                        timer_state.store(WatchdogState::Disarmed.as_u8(), Ordering::SeqCst);
                        debug!("Watchdog disarmed");
                        return;
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        timer_state.store(WatchdogState::Fired.as_u8(), Ordering::SeqCst);
                        on_fire();
                        return;
                    }
                }
            })?;

        Ok(Self {
            control,
            state,
            timeout,
        })
    }

    /// Restart the countdown. Ignored once fired or disarmed.
    pub fn reset(&self) {
        let _ = self.control.send(Control::Reset);
    }

    /// Stop the timer without firing
    pub fn disarm(&self) {
        let _ = self.control.send(Control::Disarm);
    }

    pub fn state(&self) -> WatchdogState {
        WatchdogState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
