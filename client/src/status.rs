use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use log::{info, warn};

pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub is_error: bool,
}

#[derive(Default)]
struct State {
    current: Option<Status>,
    generation: u64,
}

/// One transient message, cleared `delay` after it was shown.
///
/// Showing a new message replaces the old one; the old message's pending
/// clear then does nothing.
#[derive(Clone)]
pub struct StatusLine {
    state: Arc<Mutex<State>>,
    delay: Duration,
}

impl StatusLine {
    pub fn new(delay: Duration) -> Self {
        Self {
            state: Arc::default(),
            delay,
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn show(&self, text: impl Into<String>, is_error: bool) {
        let text = text.into();
        if is_error {
            warn!("{}", text);
        } else {
            info!("{}", text);
        }

        let generation = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.generation += 1;
            state.current = Some(Status { text, is_error });
            state.generation
        };

        let state = Arc::clone(&self.state);
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.generation == generation {
                state.current = None;
            }
        });
    }

    pub fn current(&self) -> Option<Status> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current
            .clone()
    }
}

impl Default for StatusLine {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}
