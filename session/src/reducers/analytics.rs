//! Analytics reducer.
//!
//! Counts dispatches and mirrors tracked dimensions into the
//! `updateGAEvents`/`updateCSEvents` session-storage merge-maps. Scoped
//! onto the analytics domain of the app state.

use certflow_core::effect::Effect;
use certflow_core::reducer::Reducer;
use certflow_core::{SmallVec, smallvec};
use std::collections::BTreeMap;

use crate::actions::{AnalyticsTarget, AppAction};
use crate::environment::SessionEnvironment;
use crate::state::AnalyticsState;
use crate::storage::{KEY_CS_EVENTS, KEY_GA_EVENTS, StorageAreaExt};

/// Analytics reducer.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticsReducer;

impl Reducer for AnalyticsReducer {
    type State = AnalyticsState;
    type Action = AppAction;
    type Environment = SessionEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        state.dispatches += 1;

        if let AppAction::TrackEvent { target, key, value } = action {
            let storage_key = match target {
                AnalyticsTarget::Ga => {
                    state.ga_events.insert(key.clone(), value.clone());
                    KEY_GA_EVENTS
                },
                AnalyticsTarget::Cs => {
                    state.cs_events.insert(key.clone(), value.clone());
                    KEY_CS_EVENTS
                },
            };

            let storage = env.storage.clone();
            return smallvec![Effect::future(async move {
                let mut patch = BTreeMap::new();
                patch.insert(key, value);
                if let Err(e) = storage.merge_update(storage_key, &patch) {
                    tracing::warn!(error = %e, key = storage_key, "analytics mirror write failed");
                }
                None
            })];
        }

        smallvec![Effect::None]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::test_environment;
    use certflow_testing::assertions;

    #[test]
    fn every_action_counts_a_dispatch() {
        let env = test_environment();
        let mut state = AnalyticsState::default();

        let _ = AnalyticsReducer.reduce(&mut state, AppAction::FlowReset, &env);
        let _ = AnalyticsReducer.reduce(&mut state, AppAction::LoginFailed, &env);

        assert_eq!(state.dispatches, 2);
    }

    #[test]
    fn tracked_dimension_lands_in_map_and_describes_mirror_write() {
        let env = test_environment();
        let mut state = AnalyticsState::default();

        let effects = AnalyticsReducer.reduce(
            &mut state,
            AppAction::TrackEvent {
                target: AnalyticsTarget::Ga,
                key: "dimension2".to_string(),
                value: "trial".to_string(),
            },
            &env,
        );

        assert_eq!(state.ga_events.get("dimension2"), Some(&"trial".to_string()));
        assertions::assert_has_future_effect(&effects);
    }

    #[test]
    fn cs_events_go_to_their_own_map() {
        let env = test_environment();
        let mut state = AnalyticsState::default();

        let _ = AnalyticsReducer.reduce(
            &mut state,
            AppAction::TrackEvent {
                target: AnalyticsTarget::Cs,
                key: "loggedin".to_string(),
                value: "1".to_string(),
            },
            &env,
        );

        assert!(state.ga_events.is_empty());
        assert_eq!(state.cs_events.get("loggedin"), Some(&"1".to_string()));
    }
}
