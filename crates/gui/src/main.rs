//! LoadingScreen.GUI - splash window shown while a modded game starts
//!
//! Started by the host with the host's process id as its only argument.
//! This process:
//! - reads the host's log lines from stdin and shows load progress
//! - keeps itself centered over the game window once it appears
//! - exits on its own when loading finishes, the host dies or goes silent
//!
//! Exit codes: 0 normal, 1 internal failure, 3 host went silent.

#![windows_subsystem = "windows"]

mod host;
mod render;
mod target;

use anyhow::{Context, Result};
use host::SysinfoHost;
use loading_screen_core::logging::init_wire_logging;
use loading_screen_core::session::{HostProcess, SplashSession};
use loading_screen_core::view_model::SplashModel;
use loading_screen_core::watchdog::DEFAULT_TIMEOUT;
use loading_screen_core::window_tracker::{ScreenRect, WindowTracker};
use loading_screen_core::{ExitCode, OverlayState, SplashSettings, UiCommand, UiDispatch, WindowMode};
use parking_lot::Mutex;
use render::Renderer;
use std::io::{self, BufReader};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use winit::window::{Window, WindowBuilder, WindowLevel};

const WINDOW_WIDTH: u32 = 640;
const WINDOW_HEIGHT: u32 = 360;

/// Posts commands into the winit event loop
struct ProxyDispatch(Mutex<EventLoopProxy<UiCommand>>);

impl UiDispatch for ProxyDispatch {
    fn post(&self, command: UiCommand) -> bool {
        self.0.lock().send_event(command).is_ok()
    }
}

/// Everything the UI thread owns
struct SplashApp {
    window: Rc<Window>,
    renderer: Renderer,
    model: SplashModel,
    overlay: Arc<OverlayState>,
    host: Arc<SysinfoHost>,
    game_name: String,
    title: String,
}

impl SplashApp {
    fn apply(&mut self, command: UiCommand) {
        match &command {
            UiCommand::SetVisible(visible) => {
                self.window.set_visible(*visible);
                self.overlay.set_visible(*visible);
            }
            UiCommand::SetTopMost(top) => {
                let level = if *top {
                    WindowLevel::AlwaysOnTop
                } else {
                    WindowLevel::Normal
                };
                self.window.set_window_level(level);
            }
            UiCommand::MoveTo { x, y } => {
                self.window.set_outer_position(PhysicalPosition::new(*x, *y));
                self.overlay.set_position(*x, *y);
            }
            UiCommand::LockToTarget => self.lock_to_target(),
            UiCommand::Exit(code) => self.exit(*code),
            _ => {}
        }

        self.model.apply(&command);
        if self.model.dirty {
            self.update_title();
            self.window.request_redraw();
        }
    }

    /// Snapped to the game window: not draggable, not in the taskbar
    fn lock_to_target(&self) {
        debug!("Locking splash to the game window");
        // Leave topmost while restyling, the taskbar flag does not stick otherwise
        self.window.set_window_level(WindowLevel::Normal);
        self.window.set_decorations(false);
        self.window.set_resizable(false);
        #[cfg(windows)]
        {
            use winit::platform::windows::WindowExtWindows;
            self.window.set_skip_taskbar(true);
        }
        self.window.set_window_level(WindowLevel::AlwaysOnTop);
        self.publish_size();
    }

    fn update_title(&mut self) {
        let title = format!("{} - {}", self.game_name, self.model.status_text());
        if title != self.title {
            self.window.set_title(&title);
            self.title = title;
        }
    }

    fn publish_size(&self) {
        let size = self.window.outer_size();
        self.overlay.set_size(size.width, size.height);
    }

    fn redraw(&mut self) {
        let size = self.window.inner_size();
        match self.renderer.draw(&self.model, size.width, size.height) {
            Ok(()) => self.model.dirty = false,
            Err(e) => warn!("Failed to draw splash: {}", e),
        }
    }

    fn on_window_event(&mut self, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                // Closing the splash by hand means the user wants the game gone
                error!("Splash window was closed before the game finished loading, closing the game");
                if !self.host.kill() {
                    warn!("Failed to kill the game process");
                }
                self.exit(ExitCode::InternalFailure);
            }
            WindowEvent::Moved(position) => self.overlay.set_position(position.x, position.y),
            WindowEvent::Resized(_) => {
                self.publish_size();
                self.window.request_redraw();
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn exit(&self, code: ExitCode) -> ! {
        self.overlay.mark_disposed();
        info!("Closing splash with exit code {}", code.code());
        std::process::exit(code.code())
    }
}

fn main() {
    init_wire_logging();

    if let Err(e) = run() {
        error!("Failed to create window: {:#}", e);
        std::process::exit(ExitCode::InternalFailure.code());
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(pid_arg) = args.last() else {
        info!(
            "This splash screen shows loading progress while a BepInEx game starts. \
             It is started and updated by the loading screen patcher and can't be opened manually."
        );
        return Ok(());
    };
    let pid: u32 = pid_arg
        .parse()
        .with_context(|| format!("Invalid game process id \"{}\"", pid_arg))?;

    let settings = SplashSettings::load_for_current_exe();
    debug!("Window mode {:?}, extra wait {:?}", settings.window_mode, settings.extra_wait);

    let host = Arc::new(SysinfoHost::attach(pid).with_context(|| format!("Game process {} is not running", pid))?);
    let game_name = host.display_name().to_string();

    let event_loop = EventLoopBuilder::<UiCommand>::with_user_event()
        .build()
        .context("Failed to create event loop")?;

    let fixed = settings.window_mode == WindowMode::FixedWindow;
    let mut builder = WindowBuilder::new()
        .with_title(&game_name)
        .with_inner_size(PhysicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT))
        .with_resizable(false);
    if fixed {
        builder = builder
            .with_decorations(false)
            .with_window_level(WindowLevel::AlwaysOnTop);
    }
    #[cfg(windows)]
    {
        use winit::platform::windows::WindowBuilderExtWindows;
        builder = builder.with_skip_taskbar(fixed);
    }
    let window = Rc::new(builder.build(&event_loop).context("Failed to create splash window")?);

    let outer = window.outer_size();
    let overlay = Arc::new(OverlayState::new(outer.width, outer.height));
    if let Some(monitor) = window.current_monitor() {
        let origin = monitor.position();
        let size = monitor.size();
        let screen = ScreenRect {
            left: origin.x,
            top: origin.y,
            right: origin.x + size.width as i32,
            bottom: origin.y + size.height as i32,
        };
        let (x, y) = screen.centered(outer.width, outer.height);
        window.set_outer_position(PhysicalPosition::new(x, y));
        overlay.set_position(x, y);
    }

    let renderer = Renderer::new(Rc::clone(&window)).map_err(|e| anyhow::anyhow!("{}", e)).context("Failed to create drawing surface")?;
    let dispatch: Arc<dyn UiDispatch> = Arc::new(ProxyDispatch(Mutex::new(event_loop.create_proxy())));

    let session = SplashSession::start(
        settings.clone(),
        Arc::clone(&dispatch),
        Arc::clone(&host) as Arc<dyn HostProcess>,
        DEFAULT_TIMEOUT,
    )
    .context("Failed to start watchdog")?;
    session
        .spawn_reader(BufReader::new(io::stdin()))
        .context("Failed to start input reader")?;

    WindowTracker::new(settings.window_mode)
        .spawn(target::host_target(pid), Arc::clone(&overlay), Arc::clone(&dispatch))
        .context("Failed to start window tracker")?;

    let mut app = SplashApp {
        window,
        renderer,
        model: SplashModel::new(),
        overlay,
        host,
        game_name,
        title: String::new(),
    };
    app.update_title();

    info!("Splash screen window started successfully");

    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Wait);
            match event {
                Event::UserEvent(command) => app.apply(command),
                Event::WindowEvent { event, .. } => app.on_window_event(event),
                _ => {}
            }
        })
        .context("Event loop failed")?;

    Ok(())
}
