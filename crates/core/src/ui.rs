//! Single-threaded UI update contract
//!
//! Only the thread that owns the splash window may touch it. Worker threads
//! (line reader, window tracker, watchdog) describe what they want as a
//! [`UiCommand`] and post it through a [`UiDispatch`]; the UI thread applies
//! commands in the order they were posted. In the other direction the UI
//! thread publishes a few facts about the window in [`OverlayState`] atomics.

use crate::progress::LoadEvent;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};

/// UI process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Loading finished, or the host went away
    Normal,
    /// Something inside the UI process broke
    InternalFailure,
    /// No log line from the host within the watchdog timeout
    Silence,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        match self {
            ExitCode::Normal => 0,
            ExitCode::InternalFailure => 1,
            ExitCode::Silence => 3,
        }
    }
}

/// A request for the UI thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    SetStatusDetail(String),
    /// A load stage was entered
    Stage(LoadEvent),
    PluginPercent(u8),
    SetVisible(bool),
    SetTopMost(bool),
    /// Move the window's outer top-left corner to this screen position
    MoveTo { x: i32, y: i32 },
    /// Window is now pinned over the target: drop borders and resizing,
    /// hide from the taskbar, stay on top
    LockToTarget,
    Exit(ExitCode),
}

/// Posts commands to the UI thread
pub trait UiDispatch: Send + Sync {
    /// Returns false when the UI thread is gone
    fn post(&self, command: UiCommand) -> bool;
}

impl UiDispatch for crossbeam_channel::Sender<UiCommand> {
    fn post(&self, command: UiCommand) -> bool {
        self.send(command).is_ok()
    }
}

/// Window facts published by the UI thread for workers to read
#[derive(Debug)]
pub struct OverlayState {
    disposed: AtomicBool,
    visible: AtomicBool,
    width: AtomicU32,
    height: AtomicU32,
    x: AtomicI32,
    y: AtomicI32,
}

impl OverlayState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            disposed: AtomicBool::new(false),
            visible: AtomicBool::new(true),
            width: AtomicU32::new(width),
            height: AtomicU32::new(height),
            x: AtomicI32::new(0),
            y: AtomicI32::new(0),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub fn mark_disposed(&self) {
        self.disposed.store(true, Ordering::Release);
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Release);
    }

    /// Outer size in physical pixels
    pub fn size(&self) -> (u32, u32) {
        (
            self.width.load(Ordering::Acquire),
            self.height.load(Ordering::Acquire),
        )
    }

    pub fn set_size(&self, width: u32, height: u32) {
        self.width.store(width, Ordering::Release);
        self.height.store(height, Ordering::Release);
    }

    /// Outer top-left corner in screen pixels
    pub fn position(&self) -> (i32, i32) {
        (self.x.load(Ordering::Acquire), self.y.load(Ordering::Acquire))
    }

    pub fn set_position(&self, x: i32, y: i32) {
        self.x.store(x, Ordering::Release);
        self.y.store(y, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::Normal.code(), 0);
        assert_eq!(ExitCode::InternalFailure.code(), 1);
        assert_eq!(ExitCode::Silence.code(), 3);
    }

    #[test]
    fn test_sender_dispatch_reports_closed_ui() {
        let (tx, rx) = crossbeam_channel::unbounded();
        assert!(tx.post(UiCommand::SetVisible(false)));
        assert_eq!(rx.recv().unwrap(), UiCommand::SetVisible(false));

        drop(rx);
        assert!(!tx.post(UiCommand::Exit(ExitCode::Normal)));
    }
}
