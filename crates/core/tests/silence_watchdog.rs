use crossbeam_channel::unbounded;
use loading_screen_core::session::{HostProcess, SplashSession};
use loading_screen_core::watchdog::WatchdogState;
use loading_screen_core::{ExitCode, SplashSettings, UiCommand};
use std::sync::Arc;
use std::time::Duration;

struct AliveHost;

impl HostProcess for AliveHost {
    fn is_alive(&self) -> bool {
        true
    }

    fn kill(&self) -> bool {
        false
    }
}

#[test]
fn silent_host_ends_with_exit_code_3() {
    let (tx, rx) = unbounded();
    let session = SplashSession::start(
        SplashSettings::default(),
        Arc::new(tx),
        Arc::new(AliveHost),
        Duration::from_millis(100),
    )
    .unwrap();

    // Nothing is ever written to the session's input
    let command = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(command, UiCommand::Exit(ExitCode::Silence));
    assert_eq!(ExitCode::Silence.code(), 3);
    assert_eq!(session.watchdog().state(), WatchdogState::Fired);
}

#[test]
fn chatty_host_keeps_watchdog_armed() {
    let (tx, rx) = unbounded();
    let mut session = SplashSession::start(
        SplashSettings::default(),
        Arc::new(tx),
        Arc::new(AliveHost),
        Duration::from_millis(300),
    )
    .unwrap();

    for _ in 0..8 {
        std::thread::sleep(Duration::from_millis(60));
        session.handle_line("[Info   :   BepInEx] still going");
    }

    assert!(rx.try_iter().all(|c| c != UiCommand::Exit(ExitCode::Silence)));
    assert_eq!(session.watchdog().state(), WatchdogState::Armed);
}

#[test]
fn finished_load_disarms_watchdog_and_exits_normally() {
    let (tx, rx) = unbounded();
    let settings = SplashSettings {
        extra_wait: Duration::ZERO,
        ..SplashSettings::default()
    };
    let session = SplashSession::start(
        settings,
        Arc::new(tx),
        Arc::new(AliveHost),
        Duration::from_millis(500),
    )
    .unwrap();

    let input = "Chainloader started\nChainloader startup complete\n";
    session.run_reader(std::io::Cursor::new(input.as_bytes().to_vec()));

    let commands: Vec<_> = rx.try_iter().collect();
    assert_eq!(commands.last(), Some(&UiCommand::Exit(ExitCode::Normal)));
    assert_eq!(
        commands
            .iter()
            .filter(|c| matches!(c, UiCommand::Exit(_)))
            .count(),
        1
    );

    // Well past the timeout: the watchdog must not fire after completion
    assert!(rx.recv_timeout(Duration::from_millis(800)).is_err());
}
