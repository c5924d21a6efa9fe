//! Centralized balance and tuning constants for the boardsim engine.
//!
//! These are the defaults a session starts from. Every value here can be
//! overridden per session through [`crate::config::SystemConfig`]; the
//! constants only decide what an unconfigured session looks like.

// Economy ------------------------------------------------------------------
pub const DEFAULT_STARTING_MONEY: i64 = 5_000;
pub const DEFAULT_STARTING_DICE: u64 = 1_000;
pub const DEFAULT_MULTIPLIER: u32 = 1;
pub const DEFAULT_SALARY: i64 = 2_000;

// Collection ---------------------------------------------------------------
pub const DEFAULT_PICKUP_POINTS: u32 = 1;
pub const STARTING_LEVEL: u32 = 1;

// Step selection -----------------------------------------------------------
pub const DIE_FACES: u8 = 6;
pub const MIN_STEP: u8 = 2;
pub const MAX_STEP: u8 = 12;
pub const DEFAULT_TILE_WEIGHT: u32 = 100;
pub const DEFAULT_COLLECTIBLE_WEIGHT: u32 = 200;
/// Number of candidate steps considered by weighted destination selection.
pub const STEP_CANDIDATES: usize = (MAX_STEP - MIN_STEP + 1) as usize;

// Run control --------------------------------------------------------------
pub const DEFAULT_BATCH_SIZE: u32 = 500;
pub const DEFAULT_LOG_CAPACITY: usize = 50;

// RNG stream domain tags ---------------------------------------------------
pub(crate) const RNG_DOMAIN_DICE: &[u8] = b"boardsim.dice";
pub(crate) const RNG_DOMAIN_EVENTS: &[u8] = b"boardsim.events";
pub(crate) const RNG_DOMAIN_PLACEMENT: &[u8] = b"boardsim.placement";
