//! Catalog configuration loading and validation
//!
//! A catalog is described by one TOML document: messages, interval (in
//! minutes, converted to ticks here), appearance and ordering settings,
//! named conditions, message-to-condition bindings, and per-message
//! schedules. Validation is forgiving: an invalid value is logged and
//! replaced by the documented default, a malformed schedule entry drops
//! only itself. The single hard failure is a catalog with no usable
//! messages.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::catalog::{Catalog, DEFAULT_SEPARATOR, TICKS_PER_SECOND};
use crate::conditions::MessageCondition;
use crate::host::Weather;
use crate::schedule::{ActiveDay, MessageSchedule, TimeRange};

/// Configuration errors surfaced by catalog loading.
///
/// Most of these are logged and absorbed by a fallback; only
/// [`ConfigError::NoMessages`] aborts the load of its catalog.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Catalog had no non-blank messages.
    #[error("catalog '{name}' has no usable messages")]
    NoMessages { name: String },

    /// Interval must be a positive number of minutes.
    #[error("invalid interval {value} (must be > 0)")]
    InvalidInterval { value: i64 },

    /// Time range bounds must be `HH:MM`.
    #[error("invalid time range '{start}' - '{end}'")]
    InvalidTimeRange { start: String, end: String },

    /// Day tokens are weekday names, WEEKDAY, or WEEKEND.
    #[error("unknown day token '{token}'")]
    UnknownDay { token: String },

    /// Weather must be clear, rain, or thunder.
    #[error("unknown weather '{value}'")]
    UnknownWeather { value: String },

    /// Binding keys are message indices.
    #[error("invalid message index '{key}'")]
    InvalidMessageIndex { key: String },
}

// ============================================================================
// Defaults
// ============================================================================

/// Fallback settings applied when a catalog file omits a value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogDefaults {
    /// Firing period in minutes.
    pub interval_minutes: u64,
    pub separator: String,
    pub enable_clickable_links: bool,
    pub randomize_messages: bool,
}

impl Default for CatalogDefaults {
    fn default() -> Self {
        Self {
            interval_minutes: 5,
            separator: DEFAULT_SEPARATOR.to_string(),
            enable_clickable_links: true,
            randomize_messages: false,
        }
    }
}

fn minutes_to_ticks(minutes: u64) -> u64 {
    minutes * 60 * TICKS_PER_SECOND
}

// ============================================================================
// Raw file shape
// ============================================================================

/// Raw TOML shape of one catalog file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogFile {
    /// Firing period in minutes.
    pub interval: Option<i64>,
    pub appearance: AppearanceSection,
    pub order: OrderSection,
    pub messages: Vec<String>,
    /// Named conditions owned by this catalog.
    pub conditions: HashMap<String, ConditionSpec>,
    /// Message index (as a string key) → condition name.
    pub bindings: HashMap<String, String>,
    pub schedules: Vec<ScheduleSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceSection {
    pub separator: Option<String>,
    pub enable_clickable_links: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderSection {
    pub randomize_messages: Option<bool>,
}

/// Raw shape of one named condition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionSpec {
    pub min_players: Option<usize>,
    pub max_players: Option<usize>,
    pub required_permission: Option<String>,
    pub required_world: Option<String>,
    pub required_weather: Option<String>,
    pub require_day: Option<bool>,
    pub require_night: Option<bool>,
}

/// Raw shape of one per-message schedule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSpec {
    pub message_index: Option<i64>,
    /// Custom firing period in minutes; absent or non-positive (the legacy
    /// `-1` sentinel) inherits the catalog interval.
    pub interval: Option<i64>,
    pub active_times: Vec<TimeRangeSpec>,
    pub active_days: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeRangeSpec {
    pub start: String,
    pub end: String,
}

// ============================================================================
// Validated output
// ============================================================================

/// A fully validated catalog plus everything it owns.
#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub catalog: Catalog,
    pub conditions: HashMap<String, MessageCondition>,
    pub bindings: HashMap<usize, String>,
    pub schedules: Vec<MessageSchedule>,
}

impl CatalogFile {
    /// Validate and normalize into a [`LoadedCatalog`].
    ///
    /// Invalid values fall back to `defaults` with a warning; malformed
    /// condition, binding, and schedule entries drop only themselves.
    pub fn into_catalog(
        self,
        name: &str,
        defaults: &CatalogDefaults,
    ) -> Result<LoadedCatalog, ConfigError> {
        let interval_minutes = match self.interval {
            None => defaults.interval_minutes,
            Some(value) if value > 0 => value as u64,
            Some(value) => {
                warn!(
                    catalog = name,
                    error = %ConfigError::InvalidInterval { value },
                    "using default interval"
                );
                defaults.interval_minutes
            }
        };

        let separator = match self.appearance.separator {
            Some(separator) if !separator.trim().is_empty() => separator,
            Some(_) => {
                warn!(catalog = name, "empty separator, using default");
                defaults.separator.clone()
            }
            None => defaults.separator.clone(),
        };

        let catalog = Catalog {
            name: name.to_string(),
            messages: self.messages,
            interval_ticks: minutes_to_ticks(interval_minutes),
            separator,
            clickable_links: self
                .appearance
                .enable_clickable_links
                .unwrap_or(defaults.enable_clickable_links),
            randomize: self
                .order
                .randomize_messages
                .unwrap_or(defaults.randomize_messages),
        };

        if !catalog.has_usable_messages() {
            return Err(ConfigError::NoMessages {
                name: name.to_string(),
            });
        }

        let conditions = self
            .conditions
            .into_iter()
            .map(|(condition_name, spec)| (condition_name, spec.into_condition(name)))
            .collect();

        let mut bindings = HashMap::new();
        for (key, condition_name) in self.bindings {
            if condition_name.trim().is_empty() {
                continue;
            }
            match key.parse::<usize>() {
                Ok(index) => {
                    bindings.insert(index, condition_name);
                }
                Err(_) => {
                    warn!(
                        catalog = name,
                        error = %ConfigError::InvalidMessageIndex { key },
                        "skipping binding"
                    );
                }
            }
        }

        let schedules = self
            .schedules
            .into_iter()
            .filter_map(|spec| spec.into_schedule(name))
            .collect();

        Ok(LoadedCatalog {
            catalog,
            conditions,
            bindings,
            schedules,
        })
    }
}

impl ConditionSpec {
    fn into_condition(self, catalog: &str) -> MessageCondition {
        let required_weather = self.required_weather.and_then(|raw| {
            let parsed = Weather::from_name(&raw);
            if parsed.is_none() {
                warn!(
                    catalog,
                    error = %ConfigError::UnknownWeather { value: raw },
                    "ignoring weather requirement"
                );
            }
            parsed
        });

        MessageCondition {
            min_players: self.min_players.unwrap_or(0),
            max_players: self.max_players.unwrap_or(usize::MAX),
            required_permission: self.required_permission,
            required_world: self.required_world,
            required_weather,
            require_day: self.require_day.unwrap_or(false),
            require_night: self.require_night.unwrap_or(false),
        }
    }
}

impl ScheduleSpec {
    fn into_schedule(self, catalog: &str) -> Option<MessageSchedule> {
        let message_index = match self.message_index {
            Some(value) if value >= 0 => value as usize,
            _ => {
                warn!(catalog, "schedule without a valid message_index, skipping");
                return None;
            }
        };

        let custom_interval_ticks = match self.interval {
            Some(value) if value > 0 => Some(minutes_to_ticks(value as u64)),
            _ => None,
        };

        let mut schedule = MessageSchedule::new(message_index, custom_interval_ticks);

        for range in self.active_times {
            match TimeRange::parse(&range.start, &range.end) {
                Ok(parsed) => schedule.active_time_ranges.push(parsed),
                Err(_) => {
                    warn!(
                        catalog,
                        error = %ConfigError::InvalidTimeRange {
                            start: range.start,
                            end: range.end,
                        },
                        "rejecting time range"
                    );
                }
            }
        }

        for token in self.active_days {
            match ActiveDay::from_name(&token) {
                Some(day) => schedule.active_days.push(day),
                None => {
                    warn!(
                        catalog,
                        error = %ConfigError::UnknownDay { token },
                        "rejecting day token"
                    );
                }
            }
        }

        Some(schedule)
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Parse a catalog from TOML text.
pub fn load_str(name: &str, text: &str, defaults: &CatalogDefaults) -> Result<LoadedCatalog> {
    let file: CatalogFile =
        toml::from_str(text).with_context(|| format!("parsing catalog '{name}'"))?;
    Ok(file.into_catalog(name, defaults)?)
}

/// Load a catalog file. The catalog takes its name from the file stem.
pub fn load_path(path: impl AsRef<Path>, defaults: &CatalogDefaults) -> Result<LoadedCatalog> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("catalog")
        .to_string();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    load_str(&name, &text, defaults)
}

// ============================================================================
// Tests
// ============================================================================
