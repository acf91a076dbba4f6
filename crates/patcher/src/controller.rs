//! Host entry point for the splash
//!
//! One controller per host process. It owns the only long-lived handle to
//! the channel and kills the UI process when dropped.

use crate::ipc::{IpcChannel, LogSink, TracingSink};
use crate::log_layer::ForwardHandle;
use loading_screen_core::config::SplashSettings;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error};

pub const GUI_EXE_STEM: &str = "LoadingScreen_GUI";

/// Where the UI executable is expected inside `dir`
pub fn gui_executable_path(dir: &Path) -> PathBuf {
    dir.join(format!("{}{}", GUI_EXE_STEM, std::env::consts::EXE_SUFFIX))
}

/// UI executable next to the running host executable
pub fn default_gui_path() -> io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe.parent().unwrap_or(Path::new("."));
    Ok(gui_executable_path(dir))
}

pub struct SplashController {
    channel: Option<IpcChannel>,
}

impl SplashController {
    /// Show the splash unless disabled. Failures are logged and leave the
    /// controller inert; the host keeps loading either way.
    pub fn start(settings: &SplashSettings, gui_exe: &Path) -> Self {
        Self::start_with_sink(settings, gui_exe, Arc::new(TracingSink::default()))
    }

    pub fn start_with_sink(settings: &SplashSettings, gui_exe: &Path, sink: Arc<dyn LogSink>) -> Self {
        if !settings.enabled {
            debug!("Not showing splash because the Enabled setting is off");
            return Self { channel: None };
        }

        debug!("Starting GUI process: {}", gui_exe.display());
        let host_pid = std::process::id().to_string();
        match IpcChannel::spawn(gui_exe, [host_pid], sink) {
            Ok(channel) => Self {
                channel: Some(channel),
            },
            Err(e) => {
                error!("Failed to start GUI: {}", e);
                Self { channel: None }
            }
        }
    }

    /// Route host log events into the channel
    pub fn attach(&self, forward: &ForwardHandle) {
        if let Some(channel) = &self.channel {
            forward.attach(channel.clone());
        }
    }

    pub fn is_running(&self) -> bool {
        self.channel.as_ref().is_some_and(IpcChannel::is_alive)
    }

    pub fn send(&self, line: &str) {
        if let Some(channel) = &self.channel {
            channel.enqueue(line);
        }
    }

    pub fn channel(&self) -> Option<&IpcChannel> {
        self.channel.as_ref()
    }

    /// Kill the UI process now. Safe to call more than once.
    pub fn kill(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.shutdown();
        }
    }
}

impl Drop for SplashController {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gui_path() {
        let path = gui_executable_path(Path::new("patchers"));
        assert!(path.starts_with("patchers"));
        assert!(path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(GUI_EXE_STEM)));
    }

    #[test]
    fn test_disabled_does_not_spawn() {
        let settings = SplashSettings {
            enabled: false,
            ..SplashSettings::default()
        };
        let controller = SplashController::start(&settings, Path::new("/definitely/not/here"));
        assert!(!controller.is_running());
        assert!(controller.channel().is_none());
    }

    #[test]
    fn test_missing_gui_leaves_host_running() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = SplashController::start(&SplashSettings::default(), &gui_executable_path(dir.path()));
        assert!(!controller.is_running());
        controller.send("Preloader started");
        controller.kill();
    }
}
