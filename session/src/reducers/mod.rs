//! Reducers for the session core.
//!
//! Three reducers share one [`AppState`]/[`AppAction`] pair and are
//! stitched together with `combine_reducers`:
//!
//! - [`SessionReducer`]: auth/session domain
//! - [`LoginFlowReducer`]: the multi-screen login state machine
//! - [`AnalyticsReducer`]: dispatch counters and dimension maps, scoped
//!   onto the analytics domain with `scope_reducer`

use certflow_core::composition::{CombinedReducer, combine_reducers, scope_reducer};

use crate::actions::AppAction;
use crate::environment::SessionEnvironment;
use crate::state::AppState;

pub use analytics::AnalyticsReducer;
pub use login_flow::LoginFlowReducer;
pub use session::SessionReducer;

pub mod analytics;
pub mod login_flow;
pub mod session;

/// The combined application reducer.
pub type AppReducer = CombinedReducer<AppState, AppAction, SessionEnvironment>;

/// Build the combined application reducer.
#[must_use]
pub fn app_reducer() -> AppReducer {
    combine_reducers(vec![
        Box::new(SessionReducer),
        Box::new(LoginFlowReducer),
        Box::new(scope_reducer(
            AnalyticsReducer,
            |state: &AppState| &state.analytics,
            |state: &mut AppState, analytics| {
                state.analytics = analytics;
            },
        )),
    ])
}
