//! UI-side session: everything one splash process owns
//!
//! The session is built once per UI process and owns the progress state
//! machine and the liveness watchdog. Its reader loop consumes the host's
//! log lines from standard input and turns them into [`UiCommand`]s.

use crate::classifier::classify;
use crate::config::SplashSettings;
use crate::progress::{LoadEvent, ProgressState, ProgressStateMachine, ProgressUpdate};
use crate::ui::{ExitCode, UiCommand, UiDispatch};
use crate::watchdog::Watchdog;
use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

/// Pause between reads once standard input reached end of stream
pub const END_OF_STREAM_BACKOFF: Duration = Duration::from_millis(100);

/// The host (mod loader) process, as seen from the UI process
pub trait HostProcess: Send + Sync {
    fn is_alive(&self) -> bool;

    /// Forcefully terminate the host. Returns false if it could not be killed.
    fn kill(&self) -> bool;
}

/// What the reader loop should do after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Continue,
    /// The host reached [`LoadEvent::LoadFinished`]
    Finished,
}

pub struct SplashSession {
    machine: ProgressStateMachine,
    watchdog: Watchdog,
    dispatch: Arc<dyn UiDispatch>,
    host: Arc<dyn HostProcess>,
    settings: SplashSettings,
}

impl SplashSession {
    /// Create the session and arm the watchdog. When the host stays silent
    /// for `silence_timeout` the UI is told to exit with [`ExitCode::Silence`].
    pub fn start(
        settings: SplashSettings,
        dispatch: Arc<dyn UiDispatch>,
        host: Arc<dyn HostProcess>,
        silence_timeout: Duration,
    ) -> io::Result<Self> {
        let fire_dispatch = Arc::clone(&dispatch);
        let watchdog = Watchdog::arm(silence_timeout, move || {
            error!(
                "Stopped receiving log messages from the game, assuming preloader/chainloader has crashed or is stuck"
            );
            fire_dispatch.post(UiCommand::Exit(ExitCode::Silence));
        })?;

        Ok(Self {
            machine: ProgressStateMachine::new(),
            watchdog,
            dispatch,
            host,
            settings,
        })
    }

    pub fn progress(&self) -> &ProgressState {
        self.machine.state()
    }

    pub fn watchdog(&self) -> &Watchdog {
        &self.watchdog
    }

    /// Process one received line (already stripped of its terminator)
    pub fn handle_line(&mut self, line: &str) -> LineOutcome {
        // Any line at all proves the host is still alive
        self.watchdog.reset();

        let signals = match classify(line) {
            Ok(signals) => signals,
            Err(e) => {
                error!("Failed to process message \"{}\": {}", line, e);
                return LineOutcome::Continue;
            }
        };
        if signals.is_empty() {
            debug!("Ignoring message \"{}\"", line);
            return LineOutcome::Continue;
        }

        for update in self.machine.apply_all(signals) {
            let command = match update {
                ProgressUpdate::Stage(event) => {
                    debug!("Load stage {:?}", event);
                    UiCommand::Stage(event)
                }
                ProgressUpdate::Detail(text) => UiCommand::SetStatusDetail(text),
                ProgressUpdate::PluginPercent(percent) => UiCommand::PluginPercent(percent),
            };
            self.dispatch.post(command);
        }

        if self.machine.state().last_event() == LoadEvent::LoadFinished {
            LineOutcome::Finished
        } else {
            LineOutcome::Continue
        }
    }

    /// Stop the watchdog, keep the splash up for the configured grace
    /// period, then ask the UI to exit normally. The grace counts from
    /// `LoadFinished`; the first frame of the game window is not observable
    /// from here.
    fn finish(&self) {
        self.watchdog.disarm();
        if !self.settings.extra_wait.is_zero() {
            debug!("Load finished, keeping splash for {:?}", self.settings.extra_wait);
            thread::sleep(self.settings.extra_wait);
        }
        info!("Game finished loading, closing splash");
        self.dispatch.post(UiCommand::Exit(ExitCode::Normal));
    }

    /// Read lines until loading finishes, the host goes away or input fails
    pub fn run_reader<R: BufRead>(mut self, mut reader: R) {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => {
                    if !self.host.is_alive() {
                        info!("Game process exited, closing splash");
                        self.watchdog.disarm();
                        self.dispatch.post(UiCommand::Exit(ExitCode::Normal));
                        return;
                    }
                    thread::sleep(END_OF_STREAM_BACKOFF);
                }
                Ok(_) => {
                    let text = String::from_utf8_lossy(&buf);
                    let line = text.trim_end_matches(['\n', '\r']);
                    if self.handle_line(line) == LineOutcome::Finished {
                        self.finish();
                        return;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!("Failed to read from the game process: {}", e);
                    self.watchdog.disarm();
                    self.dispatch.post(UiCommand::Exit(ExitCode::InternalFailure));
                    return;
                }
            }
        }
    }

    /// [`SplashSession::run_reader`] on a background thread
    pub fn spawn_reader<R>(self, reader: R) -> io::Result<JoinHandle<()>>
    where
        R: BufRead + Send + 'static,
    {
        thread::Builder::new()
            .name("line-reader".to_string())
            .spawn(move || self.run_reader(reader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{unbounded, Receiver};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Instant;

    struct FakeHost {
        alive: AtomicBool,
    }

    impl HostProcess for FakeHost {
        fn is_alive(&self) -> bool {
            self.alive.load(Ordering::SeqCst)
        }

        fn kill(&self) -> bool {
            self.alive.store(false, Ordering::SeqCst);
            true
        }
    }

    fn session(alive: bool) -> (SplashSession, Receiver<UiCommand>) {
        session_with_wait(alive, Duration::ZERO)
    }

    fn session_with_wait(alive: bool, extra_wait: Duration) -> (SplashSession, Receiver<UiCommand>) {
        let (tx, rx) = unbounded();
        let settings = SplashSettings {
            extra_wait,
            ..SplashSettings::default()
        };
        let host = Arc::new(FakeHost {
            alive: AtomicBool::new(alive),
        });
        let session = SplashSession::start(settings, Arc::new(tx), host, Duration::from_secs(60)).unwrap();
        (session, rx)
    }

    #[test]
    fn test_garbage_line_is_ignored() {
        let (mut session, rx) = session(true);
        assert_eq!(session.handle_line("garbage not matching any rule"), LineOutcome::Continue);
        assert!(rx.try_recv().is_err());
        assert_eq!(session.progress().last_event(), LoadEvent::None);
    }

    #[test]
    fn test_bad_count_does_not_stop_processing() {
        let (mut session, rx) = session(true);
        session.handle_line("many plugins to load");
        assert!(rx.try_recv().is_err());

        session.handle_line("Chainloader started");
        assert_eq!(session.progress().last_event(), LoadEvent::ChainloaderStart);
    }

    #[test]
    fn test_reader_exits_when_host_is_gone() {
        let (session, rx) = session(false);
        session.run_reader(io::Cursor::new(b"Preloader started\n".to_vec()));

        let commands: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            commands,
            vec![
                UiCommand::Stage(LoadEvent::PreloaderStart),
                UiCommand::Exit(ExitCode::Normal),
            ]
        );
    }

    #[test]
    fn test_extra_wait_starts_at_load_finished() {
        let extra_wait = Duration::from_millis(200);
        let (session, rx) = session_with_wait(true, extra_wait);
        let started = Instant::now();
        session.run_reader(io::Cursor::new(b"Chainloader startup complete\n".to_vec()));

        assert!(started.elapsed() >= extra_wait);
        let commands: Vec<_> = rx.try_iter().collect();
        let finished = commands
            .iter()
            .position(|c| *c == UiCommand::Stage(LoadEvent::LoadFinished))
            .unwrap();
        assert_eq!(commands[finished + 1..], [UiCommand::Exit(ExitCode::Normal)]);
    }

    #[test]
    fn test_reader_handles_crlf() {
        let (session, rx) = session(false);
        session.run_reader(io::Cursor::new(b"Chainloader started\r\n".to_vec()));

        assert_eq!(rx.try_iter().last(), Some(UiCommand::Exit(ExitCode::Normal)));
    }
}
