//! Placeholder expansion
//!
//! Catalog messages may contain `{key}` tokens, expanded at cache-rebuild
//! time. Built-in keys come from the host's [`ServerStateProvider`] and
//! [`Clock`]; an optional external [`PlaceholderSource`] is consulted
//! first, so hosts can plug in their own vocabulary without touching the
//! built-ins. Unknown keys pass through unchanged, keeping typos visible
//! in the delivered output.

use regex::{Captures, Regex};
use std::sync::{Arc, LazyLock};

use crate::host::{Clock, PlaceholderSource, ServerStateProvider};

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([^{}]+)\}").unwrap());

/// Expands `{key}` tokens from host state and an optional external source.
#[derive(Clone, Default)]
pub struct PlaceholderEngine {
    external: Option<Arc<dyn PlaceholderSource>>,
}

impl PlaceholderEngine {
    /// An engine with only the built-in placeholders.
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine that consults `source` before the built-ins.
    pub fn with_source(source: Arc<dyn PlaceholderSource>) -> Self {
        Self {
            external: Some(source),
        }
    }

    /// Replace every known placeholder in `text`.
    pub fn expand(
        &self,
        text: &str,
        state: &dyn ServerStateProvider,
        clock: &dyn Clock,
    ) -> String {
        if !text.contains('{') {
            return text.to_string();
        }

        PLACEHOLDER_RE
            .replace_all(text, |caps: &Captures| {
                let key = &caps[1];
                self.resolve(key, state, clock)
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    fn resolve(
        &self,
        key: &str,
        state: &dyn ServerStateProvider,
        clock: &dyn Clock,
    ) -> Option<String> {
        if let Some(source) = &self.external {
            if let Some(value) = source.resolve(key) {
                return Some(value);
            }
        }

        match key {
            "server_name" => Some(state.server_name()),
            "online_players" => Some(state.online_player_count().to_string()),
            "max_players" => Some(state.max_player_count().to_string()),
            "time" => Some(clock.now().format("%H:%M:%S").to_string()),
            "date" => Some(clock.now().format("%Y-%m-%d").to_string()),
            "datetime" => Some(clock.now().format("%Y-%m-%d %H:%M:%S").to_string()),
            _ => None,
        }
    }
}

impl std::fmt::Debug for PlaceholderEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaceholderEngine")
            .field("external", &self.external.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
