//! The mod loader process, seen through sysinfo

use loading_screen_core::session::HostProcess;
use parking_lot::Mutex;
use sysinfo::{Pid, System};
use tracing::warn;

pub struct SysinfoHost {
    pid: Pid,
    name: String,
    system: Mutex<System>,
}

impl SysinfoHost {
    /// None if no process with `pid` is running
    pub fn attach(pid: u32) -> Option<Self> {
        let pid = Pid::from_u32(pid);
        let mut system = System::new();
        if !system.refresh_process(pid) {
            return None;
        }
        let name = system.process(pid)?.name().to_string();
        Some(Self {
            pid,
            name,
            system: Mutex::new(system),
        })
    }

    /// Process name without extension, used as the splash title
    pub fn display_name(&self) -> &str {
        self.name
            .strip_suffix(".exe")
            .unwrap_or(&self.name)
    }
}

impl HostProcess for SysinfoHost {
    fn is_alive(&self) -> bool {
        self.system.lock().refresh_process(self.pid)
    }

    fn kill(&self) -> bool {
        let mut system = self.system.lock();
        if !system.refresh_process(self.pid) {
            return false;
        }
        match system.process(self.pid) {
            Some(process) => process.kill(),
            None => {
                warn!("Game process {} vanished before it could be killed", self.pid);
                false
            }
        }
    }
}
