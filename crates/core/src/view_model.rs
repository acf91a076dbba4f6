//! Presentation model of the splash window
//!
//! Owned by the UI thread and fed with [`UiCommand`]s. Rendering reads it;
//! nothing else does.

use crate::progress::LoadEvent;
use crate::ui::UiCommand;

const WORKING: &str = "...";
const DONE: &str = "...Done";

/// Progress bar points awarded per completed stage item
pub const STAGE_WEIGHT: u32 = 15;

pub const STAGE_LABELS: [&str; 4] = [
    "Start the preloader",
    "Apply patches",
    "Load plugins",
    "Start the game",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageItem {
    pub label: &'static str,
    pub suffix: &'static str,
    pub checked: bool,
}

impl StageItem {
    pub fn text(&self) -> String {
        format!("{}{}", self.label, self.suffix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplashModel {
    pub items: [StageItem; 4],
    /// Status line under the progress bar. Stage texts and detail lines
    /// share it; the latest write wins.
    pub status: String,
    pub plugin_percent: u8,
    /// Set whenever something visible changed; cleared by the renderer
    pub dirty: bool,
}

impl Default for SplashModel {
    fn default() -> Self {
        let mut model = Self {
            items: STAGE_LABELS.map(|label| StageItem {
                label,
                suffix: "",
                checked: false,
            }),
            status: "Initializing...".to_string(),
            plugin_percent: 0,
            dirty: true,
        };
        model.items[0].suffix = WORKING;
        model
    }
}

impl SplashModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the presentation part of a command. Window-level commands
    /// (visibility, position, exit) are ignored here.
    pub fn apply(&mut self, command: &UiCommand) {
        match command {
            UiCommand::SetStatusDetail(text) => self.set_status_detail(text),
            UiCommand::Stage(event) => self.enter_stage(*event),
            UiCommand::PluginPercent(percent) => {
                self.plugin_percent = (*percent).clamp(self.plugin_percent, 100);
                self.dirty = true;
            }
            _ => {}
        }
    }

    /// Empty stage texts leave the current status alone
    fn set_status_main(&mut self, text: &str) {
        if !text.is_empty() {
            self.status = text.to_string();
            self.dirty = true;
        }
    }

    fn set_status_detail(&mut self, text: &str) {
        self.status = text.to_string();
        self.dirty = true;
    }

    fn enter_stage(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::PreloaderStart => {
                self.check(0);
                self.items[1].suffix = WORKING;
                self.set_status_main("BepInEx patchers are being applied...");
            }
            LoadEvent::PreloaderFinish => {
                self.check(1);
                self.set_status_main("Finished applying patchers.");
                self.set_status_detail("Plugins should start loading soon.");
            }
            LoadEvent::ChainloaderStart => {
                self.items[2].suffix = WORKING;
                self.set_status_main("BepInEx plugins are being loaded...");
            }
            LoadEvent::ChainloaderFinish => {
                self.plugin_percent = 100;
                self.check(2);
                self.items[3].suffix = WORKING;
                self.set_status_main("Finished loading plugins.");
                self.set_status_detail("Waiting for the game to start...");
            }
            LoadEvent::LoadFinished => {
                self.check(3);
            }
            LoadEvent::None => return,
        }
        self.dirty = true;
    }

    fn check(&mut self, index: usize) {
        self.items[index].checked = true;
        self.items[index].suffix = DONE;
    }

    /// Current progress bar value, out of [`SplashModel::progress_max`]
    pub fn progress_value(&self) -> u32 {
        let checked = self.items.iter().filter(|item| item.checked).count() as u32;
        (checked * STAGE_WEIGHT + u32::from(self.plugin_percent)).min(self.progress_max())
    }

    pub fn progress_max(&self) -> u32 {
        100 + self.items.len() as u32 * STAGE_WEIGHT
    }

    /// Progress as a 0.0..=1.0 fraction for drawing
    pub fn progress_fraction(&self) -> f32 {
        self.progress_value() as f32 / self.progress_max() as f32
    }

    /// Status line shown under the progress bar
    pub fn status_text(&self) -> &str {
        &self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_model() {
        let model = SplashModel::new();
        assert_eq!(model.items[0].text(), "Start the preloader...");
        assert_eq!(model.progress_value(), 0);
        assert_eq!(model.progress_max(), 160);
        assert_eq!(model.status_text(), "Initializing...");
    }

    #[test]
    fn test_stages_check_items() {
        let mut model = SplashModel::new();
        model.apply(&UiCommand::Stage(LoadEvent::PreloaderStart));
        model.apply(&UiCommand::Stage(LoadEvent::PreloaderFinish));

        assert!(model.items[0].checked && model.items[1].checked);
        assert_eq!(model.items[1].text(), "Apply patches...Done");
        assert_eq!(model.progress_value(), 30);
        assert_eq!(model.status_text(), "Plugins should start loading soon.");
    }

    #[test]
    fn test_chainloader_finish_fills_plugin_share() {
        let mut model = SplashModel::new();
        model.apply(&UiCommand::PluginPercent(40));
        model.apply(&UiCommand::Stage(LoadEvent::ChainloaderFinish));

        assert_eq!(model.plugin_percent, 100);
        assert_eq!(model.progress_value(), 115);
    }

    #[test]
    fn test_percent_never_goes_back() {
        let mut model = SplashModel::new();
        model.apply(&UiCommand::PluginPercent(60));
        model.apply(&UiCommand::PluginPercent(20));
        assert_eq!(model.plugin_percent, 60);
    }

    #[test]
    fn test_stage_text_replaces_earlier_detail() {
        let mut model = SplashModel::new();
        model.apply(&UiCommand::Stage(LoadEvent::PreloaderStart));
        model.apply(&UiCommand::Stage(LoadEvent::PreloaderFinish));
        assert_eq!(model.status_text(), "Plugins should start loading soon.");

        model.apply(&UiCommand::Stage(LoadEvent::ChainloaderStart));
        assert_eq!(model.status_text(), "BepInEx plugins are being loaded...");

        model.apply(&UiCommand::SetStatusDetail("Loading [LC_API 3.4.5]".to_string()));
        assert_eq!(model.status_text(), "Loading [LC_API 3.4.5]");
    }

    #[test]
    fn test_empty_stage_text_keeps_status() {
        let mut model = SplashModel::new();
        model.set_status_main("");
        assert_eq!(model.status_text(), "Initializing...");

        // Detail lines always overwrite, even when empty
        model.set_status_detail("");
        assert_eq!(model.status_text(), "");
    }
}
