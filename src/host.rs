//! Host collaborator contracts
//!
//! The engine never talks to the outside world directly. Delivery
//! transport, live server state, wall-clock time, and optional host
//! capabilities all come in through the traits defined here; the host
//! implements them once and hands the engine trait objects at
//! construction. Every trait is substitutable in tests.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::markup::Segment;

// ============================================================================
// Weather
// ============================================================================

/// Weather states a condition can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    Clear,
    Rain,
    Thunder,
}

impl Weather {
    /// Parse from a configuration string, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "clear" => Some(Self::Clear),
            "rain" => Some(Self::Rain),
            "thunder" | "storm" => Some(Self::Thunder),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Rain => "rain",
            Self::Thunder => "thunder",
        }
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

// ============================================================================
// Delivery
// ============================================================================

/// Who receives a delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Audience {
    /// Every connected recipient.
    Everyone,
    /// Only recipients holding the given permission node.
    WithPermission { permission: String },
    /// An explicit recipient list.
    Players { names: Vec<String> },
}

/// One rendered announcement, ready for transport.
///
/// The engine produces these; the host decides framing and transport. The
/// separator is delivered around the segments, matching the catalog's
/// appearance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    /// Name of the catalog the message came from.
    pub catalog: String,
    /// Separator line printed before and after the message body.
    pub separator: String,
    /// Rendered message body.
    pub segments: Vec<Segment>,
    /// Recipients.
    pub audience: Audience,
}

/// Delivery transport owned by the host.
///
/// The engine guarantees that calls arrive from a single task, so
/// implementations never see interleaved sends from concurrent timers.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn deliver(&self, delivery: Delivery);
}

// ============================================================================
// Live state and time
// ============================================================================

/// Read-only view of live server state, used by condition evaluation and
/// placeholder expansion. All reads are expected to be cheap and
/// non-blocking; the engine calls them from timer tasks.
pub trait ServerStateProvider: Send + Sync {
    /// Number of currently connected players.
    fn online_player_count(&self) -> usize;

    /// Configured player capacity.
    fn max_player_count(&self) -> usize;

    /// Display name of the server.
    fn server_name(&self) -> String;

    /// Whether at least one online player holds the permission node.
    fn any_player_has_permission(&self, permission: &str) -> bool;

    /// Whether at least one online player is in the named world.
    fn any_player_in_world(&self, world: &str) -> bool;

    /// Current weather.
    fn weather(&self) -> Weather;

    /// Whether it is currently daytime in the primary world.
    fn is_daytime(&self) -> bool;
}

/// Wall-clock source for the schedule matcher and time placeholders.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The host machine's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

// ============================================================================
// Optional capabilities
// ============================================================================

/// Optional capability: the host's real tick length.
///
/// When absent the engine assumes the default 50 ms tick (20 ticks per
/// second). Absence is a normal, typed case, not a probing fallback.
pub trait TickRateSource: Send + Sync {
    fn millis_per_tick(&self) -> u64;
}

/// Optional capability: an external placeholder expander.
///
/// Consulted before the built-in placeholders; returning `None` falls
/// through to them.
pub trait PlaceholderSource: Send + Sync {
    fn resolve(&self, key: &str) -> Option<String>;
}
