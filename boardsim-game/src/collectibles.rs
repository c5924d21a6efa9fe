//! Collectible markers and their no-adjacency placement rule.
//!
//! Two collectibles never sit on cyclically adjacent tiles. Every mutation in
//! this module preserves that invariant.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Set of tile indices currently bearing a pickup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectibleSet {
    items: BTreeSet<usize>,
}

impl CollectibleSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.items.contains(&index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.items.iter().copied()
    }

    /// Sorted indices.
    #[must_use]
    pub fn to_vec(&self) -> Vec<usize> {
        self.items.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Remove a pickup; returns whether one was present.
    pub fn take(&mut self, index: usize) -> bool {
        self.items.remove(&index)
    }

    /// Whether `index` is free and neither cyclic neighbour holds a pickup.
    #[must_use]
    pub fn can_place(&self, index: usize, board_len: usize) -> bool {
        if board_len == 0 || index >= board_len || self.contains(index) {
            return false;
        }
        let prev = (index + board_len - 1) % board_len;
        let next = (index + 1) % board_len;
        !self.contains(prev) && !self.contains(next)
    }

    /// Place a pickup at `index` if the adjacency rule allows it.
    pub fn try_place(&mut self, index: usize, board_len: usize) -> bool {
        if self.can_place(index, board_len) {
            self.items.insert(index)
        } else {
            false
        }
    }

    /// Place one pickup uniformly among all valid spots. Returns the chosen
    /// index, or `None` when the board has no valid spot left.
    pub fn respawn<R: Rng + ?Sized>(&mut self, board_len: usize, rng: &mut R) -> Option<usize> {
        let candidates: Vec<usize> = (0..board_len)
            .filter(|&index| self.can_place(index, board_len))
            .collect();
        let chosen = *candidates.choose(rng)?;
        self.items.insert(chosen);
        Some(chosen)
    }

    /// Clear and greedily place up to `count` pickups by scanning a shuffled
    /// permutation of all indices. Returns how many were actually placed.
    pub fn generate<R: Rng + ?Sized>(&mut self, board_len: usize, count: usize, rng: &mut R) -> usize {
        self.items.clear();
        let mut order: Vec<usize> = (0..board_len).collect();
        order.shuffle(rng);
        let mut placed = 0;
        for index in order {
            if placed >= count {
                break;
            }
            if self.try_place(index, board_len) {
                placed += 1;
            }
        }
        placed
    }

    /// True when no two pickups are cyclically adjacent.
    #[must_use]
    pub fn is_spaced(&self, board_len: usize) -> bool {
        if board_len < 2 {
            return true;
        }
        self.items
            .iter()
            .all(|&index| !self.contains((index + 1) % board_len))
    }
}
