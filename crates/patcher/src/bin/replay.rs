//! LoadingScreen.Replay - feeds a captured mod loader log through the splash
//!
//! Usage: LoadingScreen_Replay <LogOutput.log> [--gui <path>] [--delay-ms <n>]
//!
//! Starts the splash exactly like the host does, then re-emits every line of
//! the log as a host log event so it travels through the real forwarding
//! layer and channel. Handy for checking a modpack's log against the splash
//! without launching the game.

use anyhow::{bail, Context, Result};
use loading_screen_core::config::SplashSettings;
use loading_screen_patcher::controller::{default_gui_path, SplashController};
use loading_screen_patcher::LogForwardLayer;
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_DELAY_MS: u64 = 20;
/// How long to wait for the splash to close on its own after the last line
const CLOSE_TIMEOUT: Duration = Duration::from_secs(90);

struct Args {
    log_file: PathBuf,
    gui: Option<PathBuf>,
    delay: Duration,
}

fn parse_args() -> Result<Args> {
    let mut log_file = None;
    let mut gui = None;
    let mut delay = Duration::from_millis(DEFAULT_DELAY_MS);

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--gui" => {
                let value = args.next().context("--gui needs a path")?;
                gui = Some(PathBuf::from(value));
            }
            "--delay-ms" => {
                let value = args.next().context("--delay-ms needs a value")?;
                let ms: u64 = value
                    .parse()
                    .with_context(|| format!("invalid --delay-ms value \"{}\"", value))?;
                delay = Duration::from_millis(ms);
            }
            other if other.starts_with("--") => bail!("unknown option {}", other),
            other => log_file = Some(PathBuf::from(other)),
        }
    }

    let Some(log_file) = log_file else {
        bail!("usage: LoadingScreen_Replay <LogOutput.log> [--gui <path>] [--delay-ms <n>]");
    };
    Ok(Args { log_file, gui, delay })
}

/// Strip the `[Level : Source] ` header mod loader log files put on each entry
fn strip_log_header(line: &str) -> &str {
    if !line.starts_with('[') {
        return line;
    }
    match line.find("] ") {
        Some(end) if line[..end].contains(':') => &line[end + 2..],
        _ => line,
    }
}

fn main() -> Result<()> {
    let (forward_layer, forward) = LogForwardLayer::new();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(forward_layer)
        .init();

    let args = parse_args()?;
    let text = fs::read_to_string(&args.log_file)
        .with_context(|| format!("Failed to read {}", args.log_file.display()))?;

    let gui = match args.gui {
        Some(path) => path,
        None => default_gui_path().context("Failed to locate the GUI executable")?,
    };

    let settings = SplashSettings::load_for_current_exe();
    let controller = SplashController::start(&settings, &gui);
    if !controller.is_running() {
        bail!("Splash did not start, see the log above");
    }
    controller.attach(&forward);

    let mut replayed = 0usize;
    for line in text.lines() {
        if !controller.is_running() {
            break;
        }
        let message = strip_log_header(line);
        if message.is_empty() {
            continue;
        }
        info!(target: "BepInEx", "{}", message);
        replayed += 1;
        thread::sleep(args.delay);
    }
    info!(target: "replay", "Replayed {} lines from {}", replayed, args.log_file.display());

    let deadline = Instant::now() + CLOSE_TIMEOUT;
    while controller.is_running() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(200));
    }
    if controller.is_running() {
        info!(target: "replay", "Splash still open after {:?}, closing it", CLOSE_TIMEOUT);
    }

    Ok(())
}
