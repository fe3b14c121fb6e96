// src/engine.rs
// Hysteresis state machine deciding when a context-usage reminder fires.
//
// Two observable states per session: Quiet (no stored warning) and
// Warned(p) (last warned at integer percentage p). One evaluation per hook
// invocation; the host serializes invocations per session, so transitions
// never race within a session.

use crate::state::StateStore;

/// Stored warning state for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarnState {
    /// No warning shown since the last reset (or ever).
    Quiet,
    /// Last warned at this integer percentage.
    Warned(u32),
}

impl WarnState {
    /// Build from the optional stored percentage.
    pub fn from_stored(stored: Option<u32>) -> Self {
        match stored {
            Some(p) => Self::Warned(p),
            None => Self::Quiet,
        }
    }
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Nothing to emit; stored state stays as it is.
    Stay,
    /// Emit a reminder at this percentage and record it.
    Warn(u32),
    /// Usage fell back under the threshold; forget the stored level.
    Reset,
}

/// Current context usage as a fraction of the window.
///
/// Returns None when max_tokens is zero (misconfiguration): the caller
/// suppresses the reminder instead of dividing by zero.
pub fn usage_ratio(total_context: u64, max_tokens: u64) -> Option<f64> {
    if max_tokens == 0 {
        return None;
    }
    Some(total_context as f64 / max_tokens as f64)
}

/// Integer percentage for a usage ratio, rounded down.
pub fn percent(ratio: f64) -> u32 {
    (ratio * 100.0).floor() as u32
}

/// Evaluate one invocation. Pure: no I/O, no ambient state.
///
/// A ratio exactly at the threshold counts as above it. After a drop below
/// the threshold the state resets, so the next crossing warns again even
/// at the same percentage as before the drop.
pub fn evaluate(state: WarnState, ratio: f64, threshold: f64) -> Decision {
    if ratio < threshold {
        return match state {
            WarnState::Warned(_) => Decision::Reset,
            WarnState::Quiet => Decision::Stay,
        };
    }

    let cur = percent(ratio);
    match state {
        WarnState::Quiet => Decision::Warn(cur),
        WarnState::Warned(p) if cur > p => Decision::Warn(cur),
        WarnState::Warned(_) => Decision::Stay,
    }
}

/// Load the stored state for `key`, evaluate, and persist the transition.
///
/// Returns the percentage to warn at, or None when this invocation stays
/// silent. Persistence failures are logged and do not suppress a due
/// warning; the worst case is a repeat reminder on the next tool call.
pub fn check_and_update(
    store: &StateStore,
    key: &str,
    ratio: f64,
    threshold: f64,
) -> Option<u32> {
    let state = WarnState::from_stored(store.load(key));

    match evaluate(state, ratio, threshold) {
        Decision::Stay => None,
        Decision::Reset => {
            store.clear(key);
            None
        }
        Decision::Warn(cur) => {
            if let Err(e) = store.save(key, cur) {
                tracing::warn!(error = %e, key, "Failed to persist warning state");
            }
            Some(cur)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_ratio() {
        assert_eq!(usage_ratio(190_500, 200_000), Some(0.9525));
        assert_eq!(usage_ratio(0, 200_000), Some(0.0));
        assert_eq!(usage_ratio(1000, 0), None);
    }

    #[test]
    fn test_percent_floors() {
        assert_eq!(percent(0.9525), 95);
        assert_eq!(percent(0.9599), 95);
        assert_eq!(percent(0.96), 96);
        assert_eq!(percent(0.0), 0);
        assert_eq!(percent(1.2), 120);
    }

    #[test]
    fn test_below_threshold_stays_quiet() {
        assert_eq!(evaluate(WarnState::Quiet, 0.50, 0.95), Decision::Stay);
        assert_eq!(evaluate(WarnState::Quiet, 0.9499, 0.95), Decision::Stay);
    }

    #[test]
    fn test_below_threshold_resets_warned() {
        assert_eq!(evaluate(WarnState::Warned(96), 0.75, 0.95), Decision::Reset);
    }

    #[test]
    fn test_first_crossing_warns() {
        assert_eq!(evaluate(WarnState::Quiet, 0.9525, 0.95), Decision::Warn(95));
    }

    #[test]
    fn test_exactly_at_threshold_warns() {
        assert_eq!(evaluate(WarnState::Quiet, 0.95, 0.95), Decision::Warn(95));
    }

    #[test]
    fn test_same_percent_stays_silent() {
        assert_eq!(evaluate(WarnState::Warned(95), 0.953, 0.95), Decision::Stay);
    }

    #[test]
    fn test_lower_percent_above_threshold_stays_silent() {
        assert_eq!(evaluate(WarnState::Warned(97), 0.96, 0.95), Decision::Stay);
    }

    #[test]
    fn test_each_increment_warns_once() {
        assert_eq!(evaluate(WarnState::Warned(95), 0.96, 0.95), Decision::Warn(96));
        assert_eq!(evaluate(WarnState::Warned(96), 0.984, 0.95), Decision::Warn(98));
    }

    #[test]
    fn test_overfull_window_warns_past_100() {
        assert_eq!(evaluate(WarnState::Quiet, 1.05, 0.95), Decision::Warn(105));
    }

    mod check_and_update {
        use super::*;
        use crate::state::StateStore;

        fn temp_store() -> (tempfile::TempDir, StateStore) {
            let dir = tempfile::tempdir().unwrap();
            let store = StateStore::new(dir.path().to_path_buf());
            (dir, store)
        }

        #[test]
        fn test_warn_persists_percentage() {
            let (_dir, store) = temp_store();
            assert_eq!(check_and_update(&store, "k", 0.9525, 0.95), Some(95));
            assert_eq!(store.load("k"), Some(95));
        }

        #[test]
        fn test_stay_leaves_state_untouched() {
            let (_dir, store) = temp_store();
            store.save("k", 95).unwrap();
            assert_eq!(check_and_update(&store, "k", 0.953, 0.95), None);
            assert_eq!(store.load("k"), Some(95));
        }

        #[test]
        fn test_reset_clears_state() {
            let (_dir, store) = temp_store();
            store.save("k", 96).unwrap();
            assert_eq!(check_and_update(&store, "k", 0.75, 0.95), None);
            assert_eq!(store.load("k"), None);
        }

        #[test]
        fn test_drop_and_recross_warns_again() {
            let (_dir, store) = temp_store();
            assert_eq!(check_and_update(&store, "k", 0.9525, 0.95), Some(95));
            assert_eq!(check_and_update(&store, "k", 0.75, 0.95), None);
            assert_eq!(check_and_update(&store, "k", 0.955, 0.95), Some(95));
        }

        #[test]
        fn test_sessions_are_isolated() {
            let (_dir, store) = temp_store();
            assert_eq!(check_and_update(&store, "a", 0.96, 0.95), Some(96));
            // A different session key starts quiet regardless.
            assert_eq!(check_and_update(&store, "b", 0.96, 0.95), Some(96));
        }
    }
}
