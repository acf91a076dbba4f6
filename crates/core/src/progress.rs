//! Load stage tracking and plugin progress
//!
//! The state machine only ever moves forward. A signal for a stage at or
//! before the current one changes nothing, which is what keeps out-of-order
//! log lines (for example `"Preloader finished"` arriving before
//! `"Preloader started"`) harmless.

use crate::classifier::Signal;

/// Failsafe plugin total used until a `"N plugins to load"` line arrives
pub const DEFAULT_PLUGIN_COUNT: u32 = 10;

/// Mod loader startup stages, in the order they happen
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LoadEvent {
    #[default]
    None,
    PreloaderStart,
    PreloaderFinish,
    ChainloaderStart,
    ChainloaderFinish,
    LoadFinished,
}

impl LoadEvent {
    pub const ALL: [LoadEvent; 6] = [
        LoadEvent::None,
        LoadEvent::PreloaderStart,
        LoadEvent::PreloaderFinish,
        LoadEvent::ChainloaderStart,
        LoadEvent::ChainloaderFinish,
        LoadEvent::LoadFinished,
    ];

    /// The stage directly after this one
    pub fn next(self) -> Option<LoadEvent> {
        match self {
            LoadEvent::None => Some(LoadEvent::PreloaderStart),
            LoadEvent::PreloaderStart => Some(LoadEvent::PreloaderFinish),
            LoadEvent::PreloaderFinish => Some(LoadEvent::ChainloaderStart),
            LoadEvent::ChainloaderStart => Some(LoadEvent::ChainloaderFinish),
            LoadEvent::ChainloaderFinish => Some(LoadEvent::LoadFinished),
            LoadEvent::LoadFinished => None,
        }
    }
}

/// What changed as a result of applying a signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressUpdate {
    /// A stage was entered. Skipped intermediate stages are reported too.
    Stage(LoadEvent),
    /// Free-text detail for the status line
    Detail(String),
    /// New plugin percentage, only reported when it actually changed
    PluginPercent(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressState {
    last_event: LoadEvent,
    plugin_count: u32,
    plugin_processed_count: u32,
    plugin_percent_done: u8,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            last_event: LoadEvent::None,
            plugin_count: DEFAULT_PLUGIN_COUNT,
            plugin_processed_count: 0,
            plugin_percent_done: 0,
        }
    }
}

impl ProgressState {
    pub fn last_event(&self) -> LoadEvent {
        self.last_event
    }

    pub fn plugin_count(&self) -> u32 {
        self.plugin_count
    }

    pub fn plugin_processed_count(&self) -> u32 {
        self.plugin_processed_count
    }

    pub fn plugin_percent_done(&self) -> u8 {
        self.plugin_percent_done
    }

    pub fn is_finished(&self) -> bool {
        self.last_event == LoadEvent::LoadFinished
    }
}

/// Applies classifier signals to a [`ProgressState`]
#[derive(Debug, Default)]
pub struct ProgressStateMachine {
    state: ProgressState,
}

impl ProgressStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// Apply one signal and report what changed
    pub fn apply(&mut self, signal: Signal) -> Vec<ProgressUpdate> {
        let mut updates = Vec::new();
        match signal {
            Signal::Stage(target) => self.advance_to(target, &mut updates),
            Signal::Detail(text) => updates.push(ProgressUpdate::Detail(text)),
            Signal::PluginProcessed => {
                self.state.plugin_processed_count = self.state.plugin_processed_count.saturating_add(1);
                let percent = percent_of(self.state.plugin_processed_count, self.state.plugin_count);
                let clamped = percent.clamp(self.state.plugin_percent_done, 100);
                if clamped != self.state.plugin_percent_done {
                    self.state.plugin_percent_done = clamped;
                    updates.push(ProgressUpdate::PluginPercent(clamped));
                }
            }
            Signal::PluginCount(count) => {
                self.state.plugin_count = count.max(1);
            }
        }
        updates
    }

    /// Apply signals in order
    pub fn apply_all(&mut self, signals: impl IntoIterator<Item = Signal>) -> Vec<ProgressUpdate> {
        signals.into_iter().flat_map(|signal| self.apply(signal)).collect()
    }

    fn advance_to(&mut self, target: LoadEvent, updates: &mut Vec<ProgressUpdate>) {
        while self.state.last_event < target {
            let Some(next) = self.state.last_event.next() else {
                break;
            };
            self.state.last_event = next;
            updates.push(ProgressUpdate::Stage(next));
        }
    }
}

fn percent_of(processed: u32, total: u32) -> u8 {
    let ratio = 100.0 * f64::from(processed) / f64::from(total.max(1));
    ratio.round().min(100.0) as u8
}
