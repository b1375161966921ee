//! Catalog model
//!
//! A catalog is a named, ordered collection of announcement messages with
//! shared appearance and ordering settings. Catalogs are immutable after
//! construction; reconfiguration replaces the whole catalog rather than
//! editing it in place, which is what lets the cursor and cache assume a
//! stable message list.

pub mod cache;
pub mod rotation;

pub use cache::RenderCache;
pub use rotation::RotationCursor;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ticks per second assumed when the host provides no tick rate.
pub const TICKS_PER_SECOND: u64 = 20;

/// Default firing period: 5 minutes.
pub const DEFAULT_INTERVAL_TICKS: u64 = 5 * 60 * TICKS_PER_SECOND;

/// Default separator printed around a delivered announcement.
pub const DEFAULT_SEPARATOR: &str = "------------------------------";

/// A named group of messages with shared scheduling and appearance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// Unique catalog name.
    pub name: String,
    /// Messages in rotation order. Entries may contain embedded newlines;
    /// blank entries are legal but never rendered or selected.
    pub messages: Vec<String>,
    /// Firing period in ticks. Always positive.
    pub interval_ticks: u64,
    /// Separator line delivered around each message.
    pub separator: String,
    /// Whether bare URLs become clickable links.
    pub clickable_links: bool,
    /// Uniform random selection instead of sequential rotation.
    pub randomize: bool,
}

impl Catalog {
    /// A catalog with default interval and appearance settings.
    pub fn new(name: impl Into<String>, messages: Vec<String>) -> Self {
        Self {
            name: name.into(),
            messages,
            interval_ticks: DEFAULT_INTERVAL_TICKS,
            separator: DEFAULT_SEPARATOR.to_string(),
            clickable_links: true,
            randomize: false,
        }
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Whether the catalog has at least one non-blank message.
    pub fn has_usable_messages(&self) -> bool {
        self.messages.iter().any(|m| !m.trim().is_empty())
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} messages, every {} ticks{})",
            self.name,
            self.messages.len(),
            self.interval_ticks,
            if self.randomize { ", randomized" } else { "" }
        )
    }
}
