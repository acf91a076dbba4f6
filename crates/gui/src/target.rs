//! Finding the game's main window

use loading_screen_core::window_tracker::TargetWindow;

/// Window source for the host process on this platform
pub fn host_target(pid: u32) -> Box<dyn TargetWindow> {
    #[cfg(windows)]
    {
        Box::new(win32::HostWindows::new(pid))
    }
    #[cfg(not(windows))]
    {
        tracing::debug!("No window tracking on this platform, ignoring pid {}", pid);
        Box::new(loading_screen_core::window_tracker::NoTarget)
    }
}

#[cfg(windows)]
mod win32 {
    use loading_screen_core::window_tracker::{
        ScreenRect, TargetInfo, TargetWindow, TrackError, WindowHandle,
    };
    use windows::Win32::Foundation::{BOOL, FALSE, HWND, LPARAM, RECT, TRUE};
    use windows::Win32::UI::WindowsAndMessaging::{
        EnumWindows, GetWindow, GetWindowRect, GetWindowTextLengthW, GetWindowTextW,
        GetWindowThreadProcessId, IsWindowVisible, GW_OWNER,
    };

    /// Main window of a process: its first visible, unowned top-level window
    pub struct HostWindows {
        pid: u32,
    }

    impl HostWindows {
        pub fn new(pid: u32) -> Self {
            Self { pid }
        }
    }

    impl TargetWindow for HostWindows {
        fn resolve(&mut self) -> Option<TargetInfo> {
            let hwnd = main_window(self.pid)?;
            Some(TargetInfo {
                handle: WindowHandle(hwnd.0),
                title: window_title(hwnd),
            })
        }

        // Windows are enumerated fresh on every resolve
        fn refresh(&mut self) {}

        fn rect(&self, handle: WindowHandle) -> Result<ScreenRect, TrackError> {
            let mut rect = RECT::default();
            unsafe { GetWindowRect(HWND(handle.0), &mut rect) }
                .map_err(|e| TrackError::Query(format!("GetWindowRect failed: {}", e)))?;
            Ok(ScreenRect {
                left: rect.left,
                top: rect.top,
                right: rect.right,
                bottom: rect.bottom,
            })
        }
    }

    struct Search {
        pid: u32,
        found: HWND,
    }

    unsafe extern "system" fn enum_proc(hwnd: HWND, lparam: LPARAM) -> BOOL {
        let search = &mut *(lparam.0 as *mut Search);

        let mut pid = 0u32;
        GetWindowThreadProcessId(hwnd, Some(&mut pid as *mut u32));
        if pid != search.pid || !IsWindowVisible(hwnd).as_bool() || GetWindow(hwnd, GW_OWNER).0 != 0 {
            return TRUE;
        }

        search.found = hwnd;
        FALSE
    }

    fn main_window(pid: u32) -> Option<HWND> {
        let mut search = Search {
            pid,
            found: HWND(0),
        };
        // Reports an error when the callback stops the enumeration early
        let _ = unsafe { EnumWindows(Some(enum_proc), LPARAM(&mut search as *mut Search as isize)) };
        (search.found.0 != 0).then_some(search.found)
    }

    fn window_title(hwnd: HWND) -> String {
        let len = unsafe { GetWindowTextLengthW(hwnd) };
        if len <= 0 {
            return String::new();
        }
        let mut buf = vec![0u16; len as usize + 1];
        let copied = unsafe { GetWindowTextW(hwnd, &mut buf) };
        String::from_utf16_lossy(&buf[..copied.max(0) as usize])
    }
}
