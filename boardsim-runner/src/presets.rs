//! Built-in board and level table used when no configuration file is given.
use boardsim_game::{LevelEntry, TileDescriptor, TileKind};

pub const DEFAULT_BOARD_SIZE: usize = 40;

const RAILROADS: [usize; 4] = [5, 15, 25, 35];

/// Classic 40-tile loop: start, four railroads, jail, parking, go-to-jail,
/// a handful of bonus tiles and priced cells in between.
#[must_use]
pub fn default_board() -> Vec<TileDescriptor> {
    (0..DEFAULT_BOARD_SIZE).map(default_tile).collect()
}

fn default_tile(index: usize) -> TileDescriptor {
    let sector = i64::try_from(1 + index / 10).unwrap_or(1);
    match index {
        0 => TileDescriptor::new(index, TileKind::Start, "Start (GO)"),
        10 => TileDescriptor::new(index, TileKind::Jail, "Jail (Visit)"),
        20 => TileDescriptor::new(index, TileKind::Parking, "Free Parking"),
        30 => TileDescriptor::new(index, TileKind::ToJail, "Go To Jail"),
        i if RAILROADS.contains(&i) => TileDescriptor::new(
            index,
            TileKind::Other {
                label: "RAILROAD".to_string(),
            },
            format!("Railroad #{index}"),
        ),
        7 | 22 | 36 => TileDescriptor::new(index, TileKind::SmallBonus { value: 300 }, "Small Gold"),
        17 => TileDescriptor::new(index, TileKind::BigBonus { value: 1_500 }, "Big Gold")
            .with_weight(150),
        2 | 28 => TileDescriptor::new(
            index,
            TileKind::BonusChance {
                probability: 0.3,
                value: 2_000,
            },
            "Airport",
        ),
        i if i % 2 == 0 => TileDescriptor::new(
            index,
            TileKind::PlainCell { value: 20 * sector },
            format!("Property #{index}"),
        ),
        _ => TileDescriptor::new(
            index,
            TileKind::PlainCell {
                value: -100 * sector,
            },
            format!("Upkeep #{index}"),
        ),
    }
}

/// Five-step collection ladder.
#[must_use]
pub fn default_levels() -> Vec<LevelEntry> {
    [
        (1, 3, 1_000, "Bronze collector"),
        (2, 5, 2_000, "Silver collector"),
        (3, 8, 3_500, "Gold collector"),
        (4, 12, 5_000, "Platinum collector"),
        (5, 20, 10_000, "Legendary collector"),
    ]
    .into_iter()
    .map(|(level, required_points, reward_amount, description)| LevelEntry {
        level,
        required_points,
        reward_amount,
        description: description.to_string(),
    })
    .collect()
}
