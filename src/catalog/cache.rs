//! Render cache: message index → parsed segment list
//!
//! Rendering a message (placeholder expansion plus markup parsing) happens
//! once per configuration, not once per dispatch. The cache is built
//! lazily and invalidated wholesale whenever the owning catalog changes;
//! there is no partial invalidation. Blank messages never enter the cache,
//! which is what makes "has a cached rendering" usable as an eligibility
//! test during selection.

use std::collections::HashMap;
use tracing::debug;

use super::Catalog;
use crate::markup::{self, Segment};

/// Cached renderings for one catalog, keyed by message index.
#[derive(Debug, Default)]
pub struct RenderCache {
    entries: HashMap<usize, Vec<Segment>>,
    valid: bool,
}

impl RenderCache {
    /// An empty, invalid cache. The first lookup path must rebuild.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the message at `index` has a cached rendering.
    pub fn contains(&self, index: usize) -> bool {
        self.entries.contains_key(&index)
    }

    /// The cached rendering for `index`, if any.
    pub fn get(&self, index: usize) -> Option<&[Segment]> {
        self.entries.get(&index).map(Vec::as_slice)
    }

    /// Indices with a cached rendering, in no particular order.
    pub fn cached_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.keys().copied()
    }

    /// Drop every entry and mark the cache invalid.
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.valid = false;
    }

    /// Re-render every non-blank message.
    ///
    /// Each message is split on embedded newlines; every line is trimmed,
    /// run through `expand` and the markup parser, and the per-line outputs
    /// are concatenated under the message's index. Blank or whitespace-only
    /// messages are omitted entirely.
    pub fn rebuild(&mut self, catalog: &Catalog, expand: impl Fn(&str) -> String) {
        self.entries.clear();

        for (index, message) in catalog.messages.iter().enumerate() {
            if message.trim().is_empty() {
                continue;
            }

            let mut segments = Vec::new();
            for line in message.split('\n') {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let expanded = expand(line);
                segments.extend(markup::parse(&expanded, catalog.clickable_links));
            }

            self.entries.insert(index, segments);
        }

        self.valid = true;
        debug!(
            catalog = %catalog.name,
            entries = self.entries.len(),
            "render cache rebuilt"
        );
    }

    /// Rebuild only if the cache is invalid (lazy revalidation).
    pub fn ensure_valid(&mut self, catalog: &Catalog, expand: impl Fn(&str) -> String) {
        if !self.valid {
            self.rebuild(catalog, expand);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
