//! Forwards host log events to the UI process
//!
//! Installed next to the host's normal fmt layer. Only the event message is
//! sent; level, target and fields stay in the host log. Events from this
//! crate are never forwarded, since relayed UI output is itself logged here
//! and would otherwise bounce back to the UI.

use crate::ipc::IpcChannel;
use loading_screen_core::protocol::CHAINLOADER_COMPLETE;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

const OWN_TARGET: &str = "loading_screen_patcher";

type Slot = Arc<Mutex<Option<IpcChannel>>>;

pub struct LogForwardLayer {
    slot: Slot,
}

/// Attaches or detaches the channel a [`LogForwardLayer`] writes to
#[derive(Clone)]
pub struct ForwardHandle {
    slot: Slot,
}

impl LogForwardLayer {
    /// The layer starts detached; nothing is forwarded until
    /// [`ForwardHandle::attach`] is called.
    pub fn new() -> (Self, ForwardHandle) {
        let slot: Slot = Arc::new(Mutex::new(None));
        let handle = ForwardHandle {
            slot: Arc::clone(&slot),
        };
        (Self { slot }, handle)
    }
}

impl ForwardHandle {
    pub fn attach(&self, channel: IpcChannel) {
        *self.slot.lock() = Some(channel);
    }

    pub fn detach(&self) {
        *self.slot.lock() = None;
    }

    pub fn is_attached(&self) -> bool {
        self.slot.lock().is_some()
    }
}

impl<S: Subscriber> Layer<S> for LogForwardLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if event.metadata().target().starts_with(OWN_TARGET) {
            return;
        }

        let mut slot = self.slot.lock();
        let Some(channel) = slot.as_ref() else {
            return;
        };
        if !channel.is_alive() {
            *slot = None;
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let Some(message) = visitor.message else {
            return;
        };

        channel.enqueue(&message);

        // Nothing after this line matters to the splash
        if message == CHAINLOADER_COMPLETE {
            *slot = None;
        }
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_detached() {
        let (_layer, handle) = LogForwardLayer::new();
        assert!(!handle.is_attached());
        handle.detach();
        assert!(!handle.is_attached());
    }

    #[test]
    fn test_own_target_prefix_matches_crate() {
        assert_eq!(OWN_TARGET, module_path!().split("::").next().unwrap_or_default());
    }
}
