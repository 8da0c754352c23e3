//! Optional per-user usage tracking so heavy users degrade first under
//! admission pressure.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use tower_resilience_core::PriorityLevel;

struct FairnessState {
    usage: HashMap<String, f64>,
    // Front = least recently touched, so eviction pops from the front.
    recency: VecDeque<String>,
}

/// Tracks a usage EWMA per user id, bounded to the most recently active
/// `capacity` users, and maps a user's standing among its peers into a
/// priority level adjustment.
///
/// Heavier users rank toward the bottom of their priority's level range, so
/// a [`Prioritizer`](crate::Prioritizer) calibrated under load sheds their
/// traffic before lighter users of the same nominal priority.
pub struct FairnessTracker {
    capacity: usize,
    alpha: f64,
    state: Mutex<FairnessState>,
}

impl FairnessTracker {
    /// Creates a tracker bounded to `capacity` distinct users. Usage is
    /// smoothed with a fixed EWMA of the last ~20 updates per user.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            alpha: 2.0 / 21.0,
            state: Mutex::new(FairnessState {
                usage: HashMap::new(),
                recency: VecDeque::new(),
            }),
        }
    }

    /// Records one unit of usage (e.g. a request) for `user_id`.
    pub fn record_usage(&self, user_id: &str) {
        let mut state = self.state.lock().unwrap();

        if let Some(pos) = state.recency.iter().position(|id| id == user_id) {
            state.recency.remove(pos);
        } else if state.usage.len() >= self.capacity {
            if let Some(evicted) = state.recency.pop_front() {
                state.usage.remove(&evicted);
            }
        }
        state.recency.push_back(user_id.to_string());

        let alpha = self.alpha;
        state
            .usage
            .entry(user_id.to_string())
            .and_modify(|value| *value = *value * (1.0 - alpha) + alpha)
            .or_insert(1.0);
    }

    /// The priority level for a `(user_id, priority)` query: `lowerLevel(priority)
    /// + floor(99 * (1 - quantile))`, where `quantile` is `user_id`'s usage
    /// rank among currently tracked users (0 = lightest, 1 = heaviest). An
    /// untracked user is treated as the lightest (quantile 0).
    pub fn level_for(&self, user_id: &str, priority: PriorityLevel) -> u32 {
        let quantile = self.usage_quantile(user_id);
        let lower = *priority.level_range().start();
        lower + (99.0 * (1.0 - quantile)).floor() as u32
    }

    fn usage_quantile(&self, user_id: &str) -> f64 {
        let state = self.state.lock().unwrap();
        let Some(&target) = state.usage.get(user_id) else {
            return 0.0;
        };
        if state.usage.len() <= 1 {
            return 0.0;
        }

        let below = state.usage.values().filter(|&&usage| usage < target).count();
        below as f64 / (state.usage.len() - 1) as f64
    }
}
