//! Host side of the loading screen
//!
//! Runs inside the mod loader process:
//! - [`ipc`]: spawns the UI process and relays log lines to it
//! - [`controller`]: decides whether to show the splash and owns the channel
//! - [`log_layer`]: tracing layer that feeds host log events into the channel

pub mod controller;
pub mod ipc;
pub mod log_layer;

pub use controller::SplashController;
pub use ipc::{ChildStream, IpcChannel, LogSink, SpawnError, TracingSink};
pub use log_layer::{ForwardHandle, LogForwardLayer};
