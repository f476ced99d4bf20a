//! Stage-transition notification seam.
//!
//! Notifications are fire-and-forget. The engine swallows every error
//! returned from here and never waits on one.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::NotifyError;

pub trait Notifier {
    fn play_completion_sound(&self) -> Result<(), NotifyError>;
}

/// Does nothing. Used when notifications are disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn play_completion_sound(&self) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Counts requests; optionally fails every one of them.
#[derive(Debug, Clone, Default)]
pub struct CountingNotifier {
    calls: Rc<Cell<u32>>,
    failing: bool,
}

impl CountingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose sound output is unavailable.
    pub fn failing() -> Self {
        Self {
            calls: Rc::default(),
            failing: true,
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl Notifier for CountingNotifier {
    fn play_completion_sound(&self) -> Result<(), NotifyError> {
        self.calls.set(self.calls.get() + 1);
        if self.failing {
            return Err(NotifyError::Unavailable("no audio device".into()));
        }
        Ok(())
    }
}
