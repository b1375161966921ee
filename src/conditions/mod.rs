//! Eligibility conditions
//!
//! A condition is a named predicate over live server state: player-count
//! bounds plus optional permission, world, weather, and day/night
//! requirements. Messages are bound to conditions by name; an unbound
//! message, or a binding to a name nobody registered, is always eligible.
//! Evaluation is a pure read of the [`ServerStateProvider`] and never
//! mutates anything.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::host::{ServerStateProvider, Weather};

/// A named predicate gating whether a message may fire.
///
/// Player-count bounds always apply. The remaining predicates apply only
/// when configured, and every configured predicate must hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageCondition {
    /// Minimum online players, inclusive.
    pub min_players: usize,
    /// Maximum online players, inclusive.
    pub max_players: usize,
    /// At least one online player must hold this permission node.
    pub required_permission: Option<String>,
    /// At least one online player must be in this world.
    pub required_world: Option<String>,
    /// Server weather must match.
    pub required_weather: Option<Weather>,
    /// Must be daytime.
    pub require_day: bool,
    /// Must be nighttime.
    pub require_night: bool,
}

impl Default for MessageCondition {
    fn default() -> Self {
        Self {
            min_players: 0,
            max_players: usize::MAX,
            required_permission: None,
            required_world: None,
            required_weather: None,
            require_day: false,
            require_night: false,
        }
    }
}

impl MessageCondition {
    /// Whether the condition currently holds.
    ///
    /// Player-count bounds are checked first; each optional predicate is
    /// then evaluated independently and all must hold.
    pub fn is_met(&self, state: &dyn ServerStateProvider) -> bool {
        let online = state.online_player_count();
        if online < self.min_players || online > self.max_players {
            return false;
        }

        if let Some(permission) = &self.required_permission {
            if !state.any_player_has_permission(permission) {
                return false;
            }
        }

        if let Some(world) = &self.required_world {
            if !state.any_player_in_world(world) {
                return false;
            }
        }

        if let Some(weather) = self.required_weather {
            if state.weather() != weather {
                return false;
            }
        }

        if self.require_day && !state.is_daytime() {
            return false;
        }
        if self.require_night && state.is_daytime() {
            return false;
        }

        true
    }
}

// ============================================================================
// Evaluator
// ============================================================================

/// Registry of named conditions for one catalog.
#[derive(Debug, Default)]
pub struct ConditionEvaluator {
    conditions: HashMap<String, MessageCondition>,
}

impl ConditionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the registered condition set.
    pub fn load(&mut self, conditions: HashMap<String, MessageCondition>) {
        debug!(count = conditions.len(), "conditions loaded");
        self.conditions = conditions;
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&MessageCondition> {
        self.conditions.get(name)
    }

    /// Whether the named condition holds.
    ///
    /// A missing name, or a name nobody registered, counts as met: the
    /// absence of a condition is not a failure.
    pub fn is_met(&self, name: Option<&str>, state: &dyn ServerStateProvider) -> bool {
        match name.and_then(|n| self.conditions.get(n)) {
            Some(condition) => condition.is_met(state),
            None => true,
        }
    }

    /// Whether every named condition holds. Empty input is met.
    pub fn all_met(&self, names: &[&str], state: &dyn ServerStateProvider) -> bool {
        names.iter().all(|name| self.is_met(Some(name), state))
    }

    /// Whether at least one named condition holds. Empty input is met.
    pub fn any_met(&self, names: &[&str], state: &dyn ServerStateProvider) -> bool {
        names.is_empty() || names.iter().any(|name| self.is_met(Some(name), state))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeState {
        online: usize,
        permission: Option<String>,
        world: Option<String>,
        weather: Weather,
        daytime: bool,
    }

    impl Default for FakeState {
        fn default() -> Self {
            Self {
                online: 5,
                permission: None,
                world: None,
                weather: Weather::Clear,
                daytime: true,
            }
        }
    }

    impl ServerStateProvider for FakeState {
        fn online_player_count(&self) -> usize {
            self.online
        }
        fn max_player_count(&self) -> usize {
            100
        }
        fn server_name(&self) -> String {
            "test".to_string()
        }
        fn any_player_has_permission(&self, permission: &str) -> bool {
            self.permission.as_deref() == Some(permission)
        }
        fn any_player_in_world(&self, world: &str) -> bool {
            self.world.as_deref() == Some(world)
        }
        fn weather(&self) -> Weather {
            self.weather
        }
        fn is_daytime(&self) -> bool {
            self.daytime
        }
    }

    #[test]
    fn test_default_condition_always_met() {
        let condition = MessageCondition::default();
        assert!(condition.is_met(&FakeState::default()));
        assert!(condition.is_met(&FakeState {
            online: 0,
            ..FakeState::default()
        }));
    }

    #[test]
    fn test_player_count_bounds_inclusive() {
        let condition = MessageCondition {
            min_players: 5,
            max_players: 10,
            ..MessageCondition::default()
        };

        assert!(!condition.is_met(&FakeState { online: 4, ..FakeState::default() }));
        assert!(condition.is_met(&FakeState { online: 5, ..FakeState::default() }));
        assert!(condition.is_met(&FakeState { online: 10, ..FakeState::default() }));
        assert!(!condition.is_met(&FakeState { online: 11, ..FakeState::default() }));
    }

    #[test]
    fn test_permission_requirement() {
        let condition = MessageCondition {
            required_permission: Some("vip.news".to_string()),
            ..MessageCondition::default()
        };

        assert!(!condition.is_met(&FakeState::default()));
        assert!(condition.is_met(&FakeState {
            permission: Some("vip.news".to_string()),
            ..FakeState::default()
        }));
    }

    #[test]
    fn test_world_requirement() {
        let condition = MessageCondition {
            required_world: Some("nether".to_string()),
            ..MessageCondition::default()
        };

        assert!(!condition.is_met(&FakeState::default()));
        assert!(condition.is_met(&FakeState {
            world: Some("nether".to_string()),
            ..FakeState::default()
        }));
    }

    #[test]
    fn test_weather_requirement() {
        let condition = MessageCondition {
            required_weather: Some(Weather::Rain),
            ..MessageCondition::default()
        };

        assert!(!condition.is_met(&FakeState::default()));
        assert!(condition.is_met(&FakeState {
            weather: Weather::Rain,
            ..FakeState::default()
        }));
    }

    #[test]
    fn test_day_night_requirements() {
        let day = MessageCondition {
            require_day: true,
            ..MessageCondition::default()
        };
        let night = MessageCondition {
            require_night: true,
            ..MessageCondition::default()
        };

        let daytime = FakeState::default();
        let nighttime = FakeState {
            daytime: false,
            ..FakeState::default()
        };

        assert!(day.is_met(&daytime));
        assert!(!day.is_met(&nighttime));
        assert!(night.is_met(&nighttime));
        assert!(!night.is_met(&daytime));
    }

    #[test]
    fn test_all_predicates_must_hold() {
        let condition = MessageCondition {
            min_players: 1,
            required_weather: Some(Weather::Clear),
            require_day: true,
            ..MessageCondition::default()
        };

        assert!(condition.is_met(&FakeState::default()));
        assert!(!condition.is_met(&FakeState {
            weather: Weather::Thunder,
            ..FakeState::default()
        }));
    }

    #[test]
    fn test_unknown_and_missing_names_are_met() {
        let evaluator = ConditionEvaluator::new();
        let state = FakeState::default();

        assert!(evaluator.is_met(None, &state));
        assert!(evaluator.is_met(Some("never_registered"), &state));
    }

    #[test]
    fn test_registered_condition_is_checked() {
        let mut evaluator = ConditionEvaluator::new();
        let mut conditions = HashMap::new();
        conditions.insert(
            "crowded".to_string(),
            MessageCondition {
                min_players: 50,
                ..MessageCondition::default()
            },
        );
        evaluator.load(conditions);

        let state = FakeState::default();
        assert!(!evaluator.is_met(Some("crowded"), &state));
        assert!(evaluator.is_met(Some("other"), &state));
    }

    #[test]
    fn test_all_met_and_any_met() {
        let mut evaluator = ConditionEvaluator::new();
        let mut conditions = HashMap::new();
        conditions.insert(
            "impossible".to_string(),
            MessageCondition {
                min_players: usize::MAX,
                ..MessageCondition::default()
            },
        );
        conditions.insert("trivial".to_string(), MessageCondition::default());
        evaluator.load(conditions);

        let state = FakeState::default();
        assert!(evaluator.all_met(&[], &state));
        assert!(evaluator.all_met(&["trivial"], &state));
        assert!(!evaluator.all_met(&["trivial", "impossible"], &state));

        assert!(evaluator.any_met(&[], &state));
        assert!(evaluator.any_met(&["impossible", "trivial"], &state));
        assert!(!evaluator.any_met(&["impossible"], &state));
    }

    #[test]
    fn test_condition_deserializes_with_defaults() {
        let condition: MessageCondition = toml::from_str("min_players = 3").unwrap();
        assert_eq!(condition.min_players, 3);
        assert_eq!(condition.max_players, usize::MAX);
        assert!(condition.required_permission.is_none());
    }
}
