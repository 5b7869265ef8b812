//! # Certflow Testing
//!
//! Testing utilities and helpers for the certflow architecture.
//!
//! This crate provides:
//! - A fluent Given/When/Then harness for reducers ([`ReducerTest`])
//! - Assertion helpers for effect vectors
//! - A deterministic clock for time-dependent reductions
//!
//! ## Example
//!
//! ```ignore
//! use certflow_testing::ReducerTest;
//!
//! ReducerTest::new(LoginFlowReducer::new(config))
//!     .with_env(test_environment())
//!     .given_state(LoginFlowState::default())
//!     .when_action(LoginFlowAction::EmailOrMobileChanged {
//!         value: "user@example.com".into(),
//!     })
//!     .then_state(|state| {
//!         assert_eq!(state.email_or_mobile, "user@example.com");
//!     })
//!     .run();
//! ```

pub use reducer_test::{ReducerTest, assertions};

pub mod reducer_test;

/// Mock implementations of environment traits
pub mod mocks {
    use certflow_core::environment::Clock;
    use chrono::{DateTime, TimeZone, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use certflow_testing::mocks::FixedClock;
    /// use certflow_core::environment::Clock;
    ///
    /// let clock = FixedClock::at_epoch();
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone, Copy)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a clock pinned to the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }

        /// Create a clock pinned to the Unix epoch
        ///
        /// # Panics
        ///
        /// Never panics; the epoch timestamp is always representable.
        #[must_use]
        #[allow(clippy::unwrap_used)] // Epoch is always representable
        pub fn at_epoch() -> Self {
            Self {
                time: Utc.timestamp_opt(0, 0).single().unwrap(),
            }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }
}
