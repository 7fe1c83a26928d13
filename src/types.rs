use serde::{Deserialize, Serialize};

use crate::constants::{
    ASTEROID_FLOOR, DEFAULT_CRIT_CHANCE, DEFAULT_CRIT_MULTIPLIER, DEFAULT_MISS_CHANCE,
    FLEE_SUCCESS_MAX_ROLL, GRID_SIZE, INITIAL_MONSTER_COUNT, MAX_SPAWN_ATTEMPTS,
    MONSTER_LONG_STEP_CHANCE, MONSTER_LONG_STEP_DISTANCE, REPOPULATE_MONSTER_COUNT, TOWN_POSITION,
};
use crate::grid::{Direction, GridPos};

pub type Color = (u8, u8, u8);

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombatModifiers {
    #[serde(rename = "critChance")]
    pub crit_chance: f32,
    #[serde(rename = "critMultiplier")]
    pub crit_multiplier: f32,
    #[serde(rename = "missChance")]
    pub miss_chance: f32,
}

impl Default for CombatModifiers {
    fn default() -> Self {
        Self {
            crit_chance: DEFAULT_CRIT_CHANCE,
            crit_multiplier: DEFAULT_CRIT_MULTIPLIER,
            miss_chance: DEFAULT_MISS_CHANCE,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct GameConfig {
    #[serde(rename = "gridSize")]
    pub grid_size: i32,
    pub town: GridPos,
    #[serde(rename = "asteroidFloor")]
    pub asteroid_floor: usize,
    #[serde(rename = "initialMonsters")]
    pub initial_monsters: usize,
    #[serde(rename = "repopulateMonsters")]
    pub repopulate_monsters: usize,
    #[serde(rename = "maxSpawnAttempts")]
    pub max_spawn_attempts: u32,
    #[serde(rename = "monsterLongStepChance")]
    pub monster_long_step_chance: f32,
    #[serde(rename = "monsterLongStepDistance")]
    pub monster_long_step_distance: i32,
    #[serde(rename = "fleeSuccessMaxRoll")]
    pub flee_success_max_roll: i32,
    pub unarmed: CombatModifiers,
}

impl GameConfig {
    pub const MIN_GRID_SIZE: i32 = 3;

    pub fn with_grid_size(grid_size: i32) -> Self {
        Self {
            grid_size: grid_size.max(Self::MIN_GRID_SIZE),
            ..Self::default()
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            town: GridPos::from(TOWN_POSITION),
            asteroid_floor: ASTEROID_FLOOR,
            initial_monsters: INITIAL_MONSTER_COUNT,
            repopulate_monsters: REPOPULATE_MONSTER_COUNT,
            max_spawn_attempts: MAX_SPAWN_ATTEMPTS,
            monster_long_step_chance: MONSTER_LONG_STEP_CHANCE,
            monster_long_step_distance: MONSTER_LONG_STEP_DISTANCE,
            flee_success_max_roll: FLEE_SUCCESS_MAX_ROLL,
            unarmed: CombatModifiers::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapInput {
    Move(Direction),
    Quit,
    Idle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MapAction {
    Quit,
    MonsterEncounter,
    ReturnToTown,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapEvent {
    MoveBlocked {
        from: GridPos,
        to: GridPos,
    },
    PlayerMoved {
        to: GridPos,
    },
    AsteroidSpawned {
        at: GridPos,
        dx: i32,
        dy: i32,
    },
    AsteroidDestroyed {
        at: GridPos,
    },
    MonsterMoved {
        name: String,
        from: GridPos,
        to: GridPos,
    },
    Encounter {
        #[serde(rename = "monsterIndex")]
        monster_index: usize,
        name: String,
        at: GridPos,
    },
    ReturnedToTown,
    MonsterDefeated {
        name: String,
    },
    MonstersRepopulated {
        count: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatAction {
    Attack,
    Flee,
    UseConsumable,
}

impl CombatAction {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "a" | "attack" | "fight" => Some(Self::Attack),
            "2" | "f" | "flee" | "run" => Some(Self::Flee),
            "3" | "u" | "use" | "item" => Some(Self::UseConsumable),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CombatState {
    Active,
    PlayerFled,
    MonsterDefeated,
    PlayerDefeated,
}

impl CombatState {
    pub fn is_terminal(self) -> bool {
        self != Self::Active
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CombatEvent {
    PlayerHit {
        damage: i32,
        critical: bool,
        #[serde(rename = "monsterHp")]
        monster_hp: i32,
    },
    PlayerMissed,
    WeaponNonFunctional {
        name: String,
    },
    MonsterHit {
        raw: i32,
        blocked: i32,
        damage: i32,
        critical: bool,
        #[serde(rename = "playerHp")]
        player_hp: i32,
    },
    MonsterMissed,
    FleeSucceeded,
    FleeFailed {
        damage: i32,
        #[serde(rename = "playerHp")]
        player_hp: i32,
    },
    ConsumableUsed {
        name: String,
    },
    Reward {
        gold: i32,
        total: i32,
    },
    PlayerDefeated,
    WeaponDiscarded {
        name: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub hp: i32,
    #[serde(rename = "maxHp")]
    pub max_hp: i32,
    pub gold: i32,
    pub power: i32,
}

impl PlayerStats {
    pub fn starting() -> Self {
        use crate::constants::{START_PLAYER_GOLD, START_PLAYER_HP, START_PLAYER_POWER};
        Self {
            hp: START_PLAYER_HP,
            max_hp: START_PLAYER_HP,
            gold: START_PLAYER_GOLD,
            power: START_PLAYER_POWER,
        }
    }
}
