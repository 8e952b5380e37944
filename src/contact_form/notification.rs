use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

/// How long a notification stays up unless replaced.
pub const DEFAULT_DISMISS_AFTER: Duration = Duration::from_millis(3500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

#[derive(Default)]
struct Slot {
    // Bumped on every `show`, so a stale timer never clears a newer notification
    generation: u64,
    current: Option<Notification>,
}

/// Holds at most one notification and dismisses it after a fixed delay.
///
/// The dismiss timer is a tokio task owned by the notifier: showing a new
/// notification aborts the previous timer, and dropping the notifier aborts
/// the pending one.
pub struct Notifier {
    slot: Arc<Mutex<Slot>>,
    dismiss_timer: Mutex<Option<JoinHandle<()>>>,
    dismiss_after: Duration,
}

impl Notifier {
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::default())),
            dismiss_timer: Mutex::new(None),
            dismiss_after,
        }
    }

    /// Replace the current notification and restart the dismiss timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn show(&self, kind: NotificationKind, message: impl Into<String>) {
        let mut dismiss_timer = self.dismiss_timer.lock();
        if let Some(previous) = dismiss_timer.take() {
            previous.abort();
        }

        let generation = {
            let mut slot = self.slot.lock();
            slot.generation += 1;
            slot.current = Some(Notification {
                kind,
                message: message.into(),
            });
            slot.generation
        };

        let slot = Arc::clone(&self.slot);
        let dismiss_after = self.dismiss_after;
        *dismiss_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(dismiss_after).await;
            let mut slot = slot.lock();
            if slot.generation == generation {
                slot.current = None;
            }
        }));
    }

    pub fn current(&self) -> Option<Notification> {
        self.slot.lock().current.clone()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_DISMISS_AFTER)
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        if let Some(timer) = self.dismiss_timer.get_mut().take() {
            timer.abort();
        }
    }
}
