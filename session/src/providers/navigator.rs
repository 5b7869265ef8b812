//! Hosting-page navigation seam.
//!
//! Full-page redirects, the HTTP referrer, and the blocking loading
//! indicator are capabilities of the page hosting this core. They sit
//! behind one trait so nothing else touches ambient page state.

/// The hosting page: navigation, referrer, and the blocking loader.
pub trait Navigator: Send + Sync {
    /// Perform a full-page navigation to `url`.
    ///
    /// Handoff to the login host and to the hosted checkout is
    /// intentionally a navigation, not an API integration.
    fn redirect(&self, url: &str);

    /// The document referrer, when one exists.
    fn referrer(&self) -> Option<String>;

    /// Show the blocking loading indicator.
    fn show_blocking_loader(&self);

    /// Hide the blocking loading indicator.
    fn hide_blocking_loader(&self);
}
