//! Session reducer.
//!
//! Owns the auth/session domain of [`AppState`]: identity resolution,
//! entitlement assignment, and logout clearing. Resolution events also
//! describe a `LoginChecked` notification effect, which reaches the
//! store's action broadcast for external listeners.

use certflow_core::effect::Effect;
use certflow_core::reducer::Reducer;
use certflow_core::{SmallVec, smallvec};

use crate::actions::AppAction;
use crate::entitlement;
use crate::environment::SessionEnvironment;
use crate::state::{AppState, SessionState, UserInfo};

/// Session/auth reducer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionReducer;

impl SessionReducer {
    /// Store the resolved identity and notify listeners.
    ///
    /// The cookie writes for this resolution happened in the effect that
    /// produced the action; store fields are set here in one reduction so
    /// no observer sees a ticket without the matching user info.
    fn apply_identity(state: &mut AppState, user_info: UserInfo) -> Effect<AppAction> {
        let is_logged = user_info.is_logged;
        state.session.is_login = is_logged;
        state.session.ticket_id = user_info.ticket_id.clone();
        state.session.user_info = Some(user_info);

        Effect::future(async move { Some(AppAction::LoginChecked { is_logged }) })
    }
}

impl Reducer for SessionReducer {
    type State = AppState;
    type Action = AppAction;
    type Environment = SessionEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            AppAction::ChannelConfigured { channel } => {
                state.channel = channel;
                // Bootstrap started: the login round-trip is in flight
                // until the after-login flush lands
                state.session.login_processing = true;
                smallvec![Effect::None]
            },

            AppAction::LoginResolved { user_info } | AppAction::AuthCompleted { user_info } => {
                smallvec![Self::apply_identity(state, user_info)]
            },

            AppAction::LoginFailed => {
                // Degrade to logged-out without touching entitlements from
                // a previous session of another user: everything clears
                state.session.user_info = None;
                state.session.is_login = false;
                state.session.ticket_id = None;
                state.session.user_token = None;

                smallvec![Effect::future(async {
                    Some(AppAction::LoginChecked { is_logged: false })
                })]
            },

            AppAction::PermissionsResolved {
                permissions,
                accessible_features,
                subscription_detail,
                user_type,
                token,
            } => {
                state.session.is_group_user = entitlement::is_group_user(&permissions);
                state.session.permissions = permissions;
                state.session.accessible_features = accessible_features;
                state.session.subscription_detail = subscription_detail;
                state.session.user_type = user_type;
                if token.is_some() {
                    state.session.user_token = token;
                }
                smallvec![Effect::None]
            },

            AppAction::AfterLoginProcessed => {
                state.session.after_login_done = true;
                state.session.login_processing = false;
                smallvec![Effect::None]
            },

            AppAction::LoggedOut => {
                // Session tokens invalidate together; channel context stays
                state.session = SessionState::default();
                smallvec![Effect::None]
            },

            // Pure notification: observed via the action broadcast
            AppAction::LoginChecked { .. } => smallvec![Effect::None],

            _ => smallvec![Effect::None],
        }
    }
}
