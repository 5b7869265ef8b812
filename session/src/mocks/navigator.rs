//! Recording navigator mock.

use std::sync::{Arc, Mutex};

use crate::providers::navigator::Navigator;

/// One blocking-loader transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderEvent {
    /// Loader shown.
    Show,
    /// Loader hidden.
    Hide,
}

#[derive(Default)]
struct Inner {
    redirects: Vec<String>,
    referrer: Option<String>,
    loader_events: Vec<LoaderEvent>,
}

/// Navigator that records redirects and loader transitions.
#[derive(Clone, Default)]
pub struct RecordingNavigator {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingNavigator {
    /// Create a recorder with no referrer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::unwrap_used)] // Mutex poison in a mock is unrecoverable
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Script the document referrer.
    pub fn set_referrer(&self, referrer: impl Into<String>) {
        self.lock().referrer = Some(referrer.into());
    }

    /// All full-page redirects performed, in order.
    #[must_use]
    pub fn redirects(&self) -> Vec<String> {
        self.lock().redirects.clone()
    }

    /// The most recent redirect, if any.
    #[must_use]
    pub fn last_redirect(&self) -> Option<String> {
        self.lock().redirects.last().cloned()
    }

    /// Loader transitions, in order.
    #[must_use]
    pub fn loader_events(&self) -> Vec<LoaderEvent> {
        self.lock().loader_events.clone()
    }

    /// Whether the loader ended hidden (or was never shown).
    #[must_use]
    pub fn loader_finally_hidden(&self) -> bool {
        self.lock().loader_events.last() != Some(&LoaderEvent::Show)
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, url: &str) {
        self.lock().redirects.push(url.to_string());
    }

    fn referrer(&self) -> Option<String> {
        self.lock().referrer.clone()
    }

    fn show_blocking_loader(&self) {
        self.lock().loader_events.push(LoaderEvent::Show);
    }

    fn hide_blocking_loader(&self) {
        self.lock().loader_events.push(LoaderEvent::Hide);
    }
}
