//! Loading Screen Core Library
//!
//! Shared functionality for the mod loader host and the splash UI process
//!
//! Architecture:
//! - Host side pushes its log lines to the UI process over stdin (protocol, line_queue)
//! - UI process classifies each line and tracks load progress (classifier, progress)
//! - Worker threads post window updates to the UI thread (ui, view_model)
//! - Liveness and window tracking run as their own loops (watchdog, window_tracker)

pub mod classifier;
pub mod config;
pub mod line_queue;
pub mod logging;
pub mod progress;
pub mod protocol;
pub mod session;
pub mod ui;
pub mod view_model;
pub mod watchdog;
pub mod window_tracker;

pub use crate::classifier::{classify, ClassifyError, Signal};
pub use crate::config::{SplashSettings, WindowMode};
pub use crate::progress::{LoadEvent, ProgressState, ProgressStateMachine, ProgressUpdate};
pub use crate::ui::{ExitCode, OverlayState, UiCommand, UiDispatch};
