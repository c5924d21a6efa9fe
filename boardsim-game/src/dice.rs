//! Step generation: uniform two-dice rolls or weighted destination targeting.
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::board::Board;
use crate::collectibles::CollectibleSet;
use crate::constants::{DIE_FACES, MAX_STEP, MIN_STEP, STEP_CANDIDATES};

/// How the next step is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepPolicy {
    /// Sum of two independent fair dice.
    #[default]
    Uniform,
    /// Weighted choice over the eleven reachable destinations.
    WeightedDestination,
}

impl StepPolicy {
    #[must_use]
    pub const fn from_smart_targeting(enabled: bool) -> Self {
        if enabled {
            Self::WeightedDestination
        } else {
            Self::Uniform
        }
    }
}

/// Weight inputs for destination scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestinationWeights {
    pub default_weight: u32,
    pub collectible_weight: u32,
}

/// One reachable destination considered by weighted selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepCandidate {
    pub step: u8,
    pub target_index: usize,
    pub weight: u32,
}

pub type CandidateList = SmallVec<[StepCandidate; STEP_CANDIDATES]>;

/// Explainability telemetry for a weighted step draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepTrace {
    /// Draw in `1..=total_weight`.
    pub roll: u64,
    /// Sum of candidate weights, widened so eleven `u32` weights never overflow.
    pub total_weight: u64,
    pub candidates: CandidateList,
}

/// Outcome of step generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDecision {
    pub step: u8,
    pub target_index: usize,
    pub target_weight: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<StepTrace>,
}

/// Sum of two independent `1..=6` draws.
pub fn roll_two_dice<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    let first = rng.gen_range(1..=DIE_FACES);
    let second = rng.gen_range(1..=DIE_FACES);
    first + second
}

/// Destination weight: collectible weight beats tile weight beats the default.
#[must_use]
pub fn destination_weight(
    board: &Board,
    collectibles: &CollectibleSet,
    index: usize,
    weights: DestinationWeights,
) -> u32 {
    if collectibles.contains(index) {
        return weights.collectible_weight.max(1);
    }
    board
        .tile(index)
        .and_then(|tile| tile.weight)
        .unwrap_or(weights.default_weight)
        .max(1)
}

/// Candidates for steps `2..=12` in increasing step order.
#[must_use]
pub fn step_candidates(
    board: &Board,
    collectibles: &CollectibleSet,
    position: usize,
    weights: DestinationWeights,
) -> CandidateList {
    (MIN_STEP..=MAX_STEP)
        .map(|step| {
            let target_index = board.advance(position, usize::from(step));
            StepCandidate {
                step,
                target_index,
                weight: destination_weight(board, collectibles, target_index, weights),
            }
        })
        .collect()
}

/// Sum of candidate weights in `u64`.
#[must_use]
pub fn total_weight(candidates: &[StepCandidate]) -> u64 {
    candidates
        .iter()
        .map(|candidate| u64::from(candidate.weight))
        .sum()
}

/// Draw `roll` in `1..=total` and walk the candidates subtracting weights; the
/// first candidate that brings the remainder to zero or below wins.
///
/// Returns the chosen position in `candidates` and the roll, or `None` when
/// the list is empty.
pub fn choose_weighted<R: Rng + ?Sized>(
    candidates: &[StepCandidate],
    rng: &mut R,
) -> Option<(usize, u64)> {
    let total = total_weight(candidates);
    if total == 0 {
        return None;
    }
    let roll = rng.gen_range(1..=total);
    Some((pick_by_roll(candidates, roll), roll))
}

fn pick_by_roll(candidates: &[StepCandidate], roll: u64) -> usize {
    let mut remaining = roll;
    for (idx, candidate) in candidates.iter().enumerate() {
        let weight = u64::from(candidate.weight);
        if remaining <= weight {
            return idx;
        }
        remaining -= weight;
    }
    candidates.len().saturating_sub(1)
}

/// Produce the next step for a token at `position`.
pub fn next_step<R: Rng + ?Sized>(
    policy: StepPolicy,
    board: &Board,
    collectibles: &CollectibleSet,
    position: usize,
    weights: DestinationWeights,
    rng: &mut R,
) -> StepDecision {
    match policy {
        StepPolicy::Uniform => {
            let step = roll_two_dice(rng);
            let target_index = board.advance(position, usize::from(step));
            StepDecision {
                step,
                target_index,
                target_weight: destination_weight(board, collectibles, target_index, weights),
                trace: None,
            }
        }
        StepPolicy::WeightedDestination => {
            let candidates = step_candidates(board, collectibles, position, weights);
            let total = total_weight(&candidates);
            // Weights are clamped to >= 1, so the draw always succeeds.
            let (chosen, roll) = choose_weighted(&candidates, rng).unwrap_or((0, 0));
            let pick = candidates[chosen];
            StepDecision {
                step: pick.step,
                target_index: pick.target_index,
                target_weight: pick.weight,
                trace: Some(StepTrace {
                    roll,
                    total_weight: total,
                    candidates,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{TileDescriptor, TileKind};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const WEIGHTS: DestinationWeights = DestinationWeights {
        default_weight: 100,
        collectible_weight: 200,
    };

    fn board(len: usize) -> Board {
        Board::new(
            (0..len)
                .map(|index| TileDescriptor::new(index, TileKind::PlainCell { value: 0 }, "cell"))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn two_dice_stay_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut seen = [false; 13];
        for _ in 0..2_000 {
            let step = roll_two_dice(&mut rng);
            assert!((2..=12).contains(&step));
            seen[usize::from(step)] = true;
        }
        assert!(seen[2..=12].iter().all(|hit| *hit));
    }

    #[test]
    fn collectible_weight_overrides_tile_weight() {
        let mut tiles: Vec<TileDescriptor> = (0..20)
            .map(|index| TileDescriptor::new(index, TileKind::Parking, "p"))
            .collect();
        tiles[5] = tiles[5].clone().with_weight(40);
        tiles[6] = tiles[6].clone().with_weight(40);
        let board = Board::new(tiles).unwrap();
        let mut collectibles = CollectibleSet::new();
        assert!(collectibles.try_place(6, 20));

        assert_eq!(destination_weight(&board, &collectibles, 5, WEIGHTS), 40);
        assert_eq!(destination_weight(&board, &collectibles, 6, WEIGHTS), 200);
        assert_eq!(destination_weight(&board, &collectibles, 7, WEIGHTS), 100);
    }

    #[test]
    fn candidates_cover_steps_two_through_twelve_with_wrap() {
        let board = board(10);
        let candidates = step_candidates(&board, &CollectibleSet::new(), 8, WEIGHTS);
        assert_eq!(candidates.len(), 11);
        assert_eq!(candidates[0].step, 2);
        assert_eq!(candidates[0].target_index, 0);
        assert_eq!(candidates[10].step, 12);
        assert_eq!(candidates[10].target_index, 0);
    }

    #[test]
    fn roll_scan_picks_first_candidate_reaching_zero() {
        let candidates: Vec<StepCandidate> = [(2, 100), (3, 200), (4, 100)]
            .into_iter()
            .map(|(step, weight)| StepCandidate {
                step,
                target_index: usize::from(step),
                weight,
            })
            .collect();
        assert_eq!(pick_by_roll(&candidates, 1), 0);
        assert_eq!(pick_by_roll(&candidates, 100), 0);
        assert_eq!(pick_by_roll(&candidates, 101), 1);
        assert_eq!(pick_by_roll(&candidates, 300), 1);
        assert_eq!(pick_by_roll(&candidates, 301), 2);
        assert_eq!(pick_by_roll(&candidates, 400), 2);
    }

    #[test]
    fn weighted_selection_is_deterministic_for_a_fixed_source() {
        let board = board(52);
        let mut collectibles = CollectibleSet::new();
        assert!(collectibles.try_place(9, 52));
        let decide = |seed: u64| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            next_step(
                StepPolicy::WeightedDestination,
                &board,
                &collectibles,
                2,
                WEIGHTS,
                &mut rng,
            )
        };
        for seed in 0..32 {
            let first = decide(seed);
            let second = decide(seed);
            assert_eq!(first, second);
            let trace = first.trace.expect("weighted draws carry a trace");
            assert_eq!(trace.total_weight, 100 * 10 + 200);
            assert_eq!(trace.candidates[usize::from(first.step) - 2].target_index, first.target_index);
        }
    }

    #[test]
    fn weighted_selection_favours_collectible_destinations() {
        let board = board(52);
        let mut collectibles = CollectibleSet::new();
        assert!(collectibles.try_place(7, 52));
        let heavy = DestinationWeights {
            default_weight: 1,
            collectible_weight: 10_000,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let hits = (0..200)
            .filter(|_| {
                next_step(
                    StepPolicy::WeightedDestination,
                    &board,
                    &collectibles,
                    0,
                    heavy,
                    &mut rng,
                )
                .target_index
                    == 7
            })
            .count();
        assert!(hits > 190, "expected collectible target to dominate, got {hits}");
    }

    #[test]
    fn maximum_weights_never_overflow_the_draw() {
        let tiles: Vec<TileDescriptor> = (0..40)
            .map(|index| TileDescriptor::new(index, TileKind::Parking, "p").with_weight(u32::MAX))
            .collect();
        let board = Board::new(tiles).unwrap();
        let mut collectibles = CollectibleSet::new();
        assert!(collectibles.try_place(5, 40));
        let heaviest = DestinationWeights {
            default_weight: u32::MAX,
            collectible_weight: u32::MAX,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for position in 0..40 {
            let decision = next_step(
                StepPolicy::WeightedDestination,
                &board,
                &collectibles,
                position,
                heaviest,
                &mut rng,
            );
            let trace = decision.trace.unwrap();
            assert_eq!(trace.total_weight, 11 * u64::from(u32::MAX));
            assert!((1..=trace.total_weight).contains(&trace.roll));
            assert!((2..=12).contains(&decision.step));
        }
        let candidates = step_candidates(&board, &collectibles, 0, heaviest);
        assert_eq!(pick_by_roll(&candidates, 11 * u64::from(u32::MAX)), 10);
    }
}
