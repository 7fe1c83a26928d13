pub const GRID_SIZE: i32 = 10;
pub const TOWN_POSITION: (i32, i32) = (0, 0);

pub const ASTEROID_FLOOR: usize = 3;
pub const INITIAL_MONSTER_COUNT: usize = 2;
pub const REPOPULATE_MONSTER_COUNT: usize = 2;
pub const MAX_SPAWN_ATTEMPTS: u32 = 256;

pub const MONSTER_LONG_STEP_CHANCE: f32 = 0.25;
pub const MONSTER_LONG_STEP_DISTANCE: i32 = 2;

pub const DEFAULT_CRIT_CHANCE: f32 = 0.05;
pub const DEFAULT_CRIT_MULTIPLIER: f32 = 1.5;
pub const DEFAULT_MISS_CHANCE: f32 = 0.05;

// Flee succeeds when a 0..=99 roll is at or below this value.
pub const FLEE_SUCCESS_MAX_ROLL: i32 = 80;

pub const START_PLAYER_HP: i32 = 30;
pub const START_PLAYER_GOLD: i32 = 10;
pub const START_PLAYER_POWER: i32 = 5;
pub const INN_COST: i32 = 5;

pub const SAVE_FORMAT_VERSION: u8 = 1;
