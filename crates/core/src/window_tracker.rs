//! Keeps the splash window centered over the game's main window
//!
//! The game creates its main window some time after the splash appears, and
//! Unity may first show its own resolution dialog ("<Game> Configuration").
//! Every poll re-resolves the target, so the tracker copes with:
//! - no window yet, or only the mod loader's console window
//! - the configuration dialog, during which the splash is hidden
//! - a window that exists but reports an empty rectangle

use crate::config::WindowMode;
use crate::ui::{ExitCode, OverlayState, UiCommand, UiDispatch};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Title suffix of Unity's pre-launch configuration dialog
pub const CONFIGURATION_DIALOG_SUFFIX: &str = " Configuration";

/// Titles of the mod loader's own console windows, never a tracking target
pub const EXCLUDED_TITLE_PREFIXES: [&str; 2] = ["BepInEx", "Select BepInEx"];

/// Opaque OS window handle. Zero is never valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetInfo {
    pub handle: WindowHandle,
    pub title: String,
}

/// Screen rectangle in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl ScreenRect {
    /// All-zero rectangles are reported for windows that are not ready yet
    pub fn is_unset(&self) -> bool {
        *self == ScreenRect::default()
    }

    /// Top-left corner for a `width` x `height` box centered on this rectangle
    pub fn centered(&self, width: u32, height: u32) -> (i32, i32) {
        let x = self.left + (self.right - self.left) / 2 - width as i32 / 2;
        let y = self.top + (self.bottom - self.top) / 2 - height as i32 / 2;
        (x, y)
    }
}

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("failed to read the rectangle of window {0:?}")]
    RectUnavailable(WindowHandle),
    #[error("window query failed: {0}")]
    Query(String),
}

/// OS access to the window being tracked
pub trait TargetWindow: Send {
    /// Current main window of the target process, if it has one
    fn resolve(&mut self) -> Option<TargetInfo>;

    /// Drop cached process information so the next resolve sees new windows
    fn refresh(&mut self);

    fn rect(&self, handle: WindowHandle) -> Result<ScreenRect, TrackError>;
}

/// Target that never resolves, for platforms without window queries
#[derive(Debug, Default)]
pub struct NoTarget;

impl TargetWindow for NoTarget {
    fn resolve(&mut self) -> Option<TargetInfo> {
        None
    }

    fn refresh(&mut self) {}

    fn rect(&self, handle: WindowHandle) -> Result<ScreenRect, TrackError> {
        Err(TrackError::RectUnavailable(handle))
    }
}

#[derive(Debug)]
pub struct WindowTracker {
    mode: WindowMode,
    target: Option<WindowHandle>,
    temporarily_hidden: bool,
    locked: bool,
}

impl WindowTracker {
    pub fn new(mode: WindowMode) -> Self {
        Self {
            mode,
            target: None,
            temporarily_hidden: false,
            locked: false,
        }
    }

    pub fn is_temporarily_hidden(&self) -> bool {
        self.temporarily_hidden
    }

    /// Whether the splash has been pinned to the target window
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn target(&self) -> Option<WindowHandle> {
        self.target
    }

    /// One poll. Returns the commands the UI thread should apply.
    pub fn tick(
        &mut self,
        target: &mut dyn TargetWindow,
        overlay: &OverlayState,
    ) -> Result<Vec<UiCommand>, TrackError> {
        let mut commands = Vec::new();

        if !overlay.is_visible() && !self.temporarily_hidden {
            return Ok(commands);
        }

        let info = match target.resolve() {
            Some(info) if !is_excluded_title(&info.title) => info,
            _ => {
                self.keep_on_top(&mut commands);
                target.refresh();
                return Ok(commands);
            }
        };

        if self.target != Some(info.handle) {
            debug!("Tracking window {:?} \"{}\"", info.handle, info.title);
            self.target = Some(info.handle);
        }

        if info.title.ends_with(CONFIGURATION_DIALOG_SUFFIX) {
            if !self.temporarily_hidden {
                info!("Configuration dialog \"{}\" is open, hiding splash", info.title);
                commands.push(UiCommand::SetVisible(false));
                self.temporarily_hidden = true;
            }
            self.keep_on_top(&mut commands);
            target.refresh();
            return Ok(commands);
        }

        if self.temporarily_hidden {
            self.temporarily_hidden = false;
            commands.push(UiCommand::SetVisible(true));
        }

        let rect = target.rect(info.handle)?;
        self.keep_on_top(&mut commands);

        if rect.is_unset() {
            return Ok(commands);
        }

        let (width, height) = overlay.size();
        let (x, y) = rect.centered(width, height);
        if overlay.position() != (x, y) {
            commands.push(UiCommand::MoveTo { x, y });
        }

        if !self.locked {
            // Snapped to the game window from here on, so it must not be dragged away
            self.locked = true;
            commands.push(UiCommand::LockToTarget);
        }

        Ok(commands)
    }

    fn keep_on_top(&self, commands: &mut Vec<UiCommand>) {
        if self.mode == WindowMode::FixedWindow {
            commands.push(UiCommand::SetTopMost(true));
        }
    }

    /// Run the polling loop on its own thread until the splash is disposed.
    /// A tracking failure ends the UI process with [`ExitCode::InternalFailure`].
    pub fn spawn(
        mut self,
        mut target: Box<dyn TargetWindow>,
        overlay: Arc<OverlayState>,
        dispatch: Arc<dyn UiDispatch>,
    ) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("window-tracker".to_string())
            .spawn(move || {
                while !overlay.is_disposed() {
                    thread::sleep(POLL_INTERVAL);

                    match self.tick(target.as_mut(), &overlay) {
                        Ok(commands) => {
                            for command in commands {
                                if !dispatch.post(command) {
                                    return;
                                }
                            }
                        }
                        Err(e) => {
                            error!("Window tracking failed: {}", e);
                            dispatch.post(UiCommand::Exit(ExitCode::InternalFailure));
                            return;
                        }
                    }
                }
            })
    }
}

fn is_excluded_title(title: &str) -> bool {
    EXCLUDED_TITLE_PREFIXES
        .iter()
        .any(|prefix| title.starts_with(prefix))
}
