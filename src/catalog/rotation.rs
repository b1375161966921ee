//! Rotation cursor: per-catalog selection state
//!
//! Selection comes in two modes, fixed per catalog. Sequential mode scans
//! forward from the cursor with wraparound until it finds an eligible
//! message, visiting every slot at most once; randomized mode draws
//! uniformly from the full eligible set and leaves the cursor untouched.
//! Eligibility is supplied by the caller as a predicate so this module
//! stays independent of caches and conditions.

use rand::Rng;

/// Mutable rotation position for sequential selection.
///
/// Holds the index the next sequential scan starts from. Created at zero
/// alongside its catalog and reset to zero whenever the catalog is
/// replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationCursor {
    current: usize,
}

impl RotationCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The index the next sequential scan starts from.
    pub fn position(&self) -> usize {
        self.current
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }

    /// Sequential selection with wraparound.
    ///
    /// Scans forward from the cursor, wrapping modulo `message_count`,
    /// until `eligible` accepts an index or every slot has been visited
    /// once. On success the cursor advances to the slot after the
    /// selection; on exhaustion the cursor is left unchanged and no
    /// selection is made.
    pub fn select_sequential(
        &mut self,
        message_count: usize,
        eligible: impl Fn(usize) -> bool,
    ) -> Option<usize> {
        if message_count == 0 {
            return None;
        }

        // The cursor can point past the end if the catalog shrank without
        // being replaced; clamp by wrapping.
        let start = self.current % message_count;
        let mut index = start;
        loop {
            if eligible(index) {
                self.current = (index + 1) % message_count;
                return Some(index);
            }
            index = (index + 1) % message_count;
            if index == start {
                return None;
            }
        }
    }

    /// Uniform draw over the whole eligible set. The cursor plays no part
    /// in randomized mode.
    pub fn select_random(
        message_count: usize,
        eligible: impl Fn(usize) -> bool,
        rng: &mut impl Rng,
    ) -> Option<usize> {
        let candidates: Vec<usize> = (0..message_count).filter(|&i| eligible(i)).collect();
        if candidates.is_empty() {
            None
        } else {
            Some(candidates[rng.gen_range(0..candidates.len())])
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
