use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CRIT_CHANCE, DEFAULT_CRIT_MULTIPLIER, DEFAULT_MISS_CHANCE};
use crate::error::EngineError;
use crate::grid::{in_bounds, is_occupied, GridPos, OccupiedSet, EIGHT_WAY};
use crate::rng::Rng;
use crate::types::{Color, CombatModifiers, GameConfig};

use super::MobileEntity;

#[derive(Clone, Debug, PartialEq)]
pub struct WanderingMonster {
    pub name: String,
    pub description: String,
    pub health: i32,
    pub max_health: i32,
    pub power: i32,
    pub money: i32,
    pub color: Color,
    pub sprite_name: String,
    pub modifiers: CombatModifiers,
    pos: GridPos,
}

pub struct MonsterStep<'a> {
    pub town: GridPos,
    pub turn_count: u64,
    pub obstacles: &'a OccupiedSet,
    pub config: &'a GameConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonsterRecord {
    pub name: String,
    pub description: String,
    pub health: i32,
    #[serde(default)]
    pub max_health: Option<i32>,
    pub power: i32,
    pub money: i32,
    pub color: Color,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub sprite_name: String,
    #[serde(default = "default_crit_chance")]
    pub crit_chance: f32,
    #[serde(default = "default_crit_multiplier")]
    pub crit_multiplier: f32,
    #[serde(default = "default_miss_chance")]
    pub miss_chance: f32,
}

fn default_crit_chance() -> f32 {
    DEFAULT_CRIT_CHANCE
}

fn default_crit_multiplier() -> f32 {
    DEFAULT_CRIT_MULTIPLIER
}

fn default_miss_chance() -> f32 {
    DEFAULT_MISS_CHANCE
}

impl WanderingMonster {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        description: &str,
        health: i32,
        power: i32,
        money: i32,
        color: Color,
        sprite_name: &str,
        modifiers: CombatModifiers,
        pos: GridPos,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            health,
            max_health: health,
            power,
            money,
            color,
            sprite_name: sprite_name.to_string(),
            modifiers,
            pos,
        }
    }

    pub fn is_defeated(&self) -> bool {
        self.health <= 0
    }

    pub(crate) fn place(&mut self, pos: GridPos) {
        self.pos = pos;
    }
}

impl MobileEntity for WanderingMonster {
    type Context<'a> = MonsterStep<'a>;
    type Record = MonsterRecord;

    fn position(&self) -> GridPos {
        self.pos
    }

    // Greedy random walk. Only odd turns move; the step is 1 cell, or 2 with
    // the configured long-step chance, along the first of eight shuffled
    // directions that stays on the grid, off the town and off obstacles.
    fn advance(&mut self, ctx: MonsterStep<'_>, rng: &mut Rng) -> GridPos {
        if ctx.turn_count % 2 == 0 {
            return self.pos;
        }

        let distance = if rng.chance(ctx.config.monster_long_step_chance) {
            ctx.config.monster_long_step_distance
        } else {
            1
        };
        let mut directions = EIGHT_WAY;
        rng.shuffle(&mut directions);

        for (dx, dy) in directions {
            let next = self.pos.offset(dx * distance, dy * distance);
            if in_bounds(next, ctx.config.grid_size)
                && next != ctx.town
                && !is_occupied(next, ctx.obstacles)
            {
                self.pos = next;
                break;
            }
        }
        self.pos
    }

    fn to_record(&self) -> MonsterRecord {
        MonsterRecord {
            name: self.name.clone(),
            description: self.description.clone(),
            health: self.health,
            max_health: Some(self.max_health),
            power: self.power,
            money: self.money,
            color: self.color,
            x: self.pos.x,
            y: self.pos.y,
            sprite_name: self.sprite_name.clone(),
            crit_chance: self.modifiers.crit_chance,
            crit_multiplier: self.modifiers.crit_multiplier,
            miss_chance: self.modifiers.miss_chance,
        }
    }

    fn from_record(record: MonsterRecord, grid_size: i32) -> Result<Self, EngineError> {
        let invalid = |reason: String| EngineError::InvalidRecord {
            kind: "monster",
            reason,
        };
        let pos = GridPos::new(record.x, record.y);
        if !in_bounds(pos, grid_size) {
            return Err(EngineError::OutOfBounds { pos, grid_size });
        }
        if record.health <= 0 {
            return Err(invalid(format!("{} has no health left", record.name)));
        }
        let max_health = record.max_health.unwrap_or(record.health).max(record.health);
        for chance in [record.crit_chance, record.miss_chance] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(invalid(format!("probability {chance} outside [0, 1]")));
            }
        }
        if !record.crit_multiplier.is_finite() || record.crit_multiplier < 1.0 {
            return Err(invalid(format!(
                "crit multiplier {} below 1",
                record.crit_multiplier
            )));
        }
        Ok(Self {
            name: record.name,
            description: record.description,
            health: record.health,
            max_health,
            power: record.power.max(0),
            money: record.money.max(0),
            color: record.color,
            sprite_name: record.sprite_name,
            modifiers: CombatModifiers {
                crit_chance: record.crit_chance,
                crit_multiplier: record.crit_multiplier,
                miss_chance: record.miss_chance,
            },
            pos,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goblin_at(x: i32, y: i32) -> WanderingMonster {
        WanderingMonster::new(
            "Goblin",
            "A goblin",
            25,
            9,
            20,
            (200, 0, 0),
            "goblin",
            CombatModifiers::default(),
            GridPos::new(x, y),
        )
    }

    fn step<'a>(turn_count: u64, obstacles: &'a OccupiedSet, config: &'a GameConfig) -> MonsterStep<'a> {
        MonsterStep {
            town: config.town,
            turn_count,
            obstacles,
            config,
        }
    }

    #[test]
    fn even_turns_never_move() {
        let config = GameConfig::default();
        let obstacles = OccupiedSet::new();
        let mut rng = Rng::new(5);
        let mut monster = goblin_at(5, 5);
        for turn in (0..200).step_by(2) {
            assert_eq!(monster.advance(step(turn, &obstacles, &config), &mut rng), GridPos::new(5, 5));
        }
    }

    #[test]
    fn odd_turn_distance_split_is_three_to_one() {
        let config = GameConfig::default();
        let obstacles = OccupiedSet::new();
        let mut rng = Rng::new(2024);
        let trials = 10_000;
        let mut long_steps = 0;
        for _ in 0..trials {
            let mut monster = goblin_at(5, 5);
            let to = monster.advance(step(1, &obstacles, &config), &mut rng);
            let distance = to.chebyshev(GridPos::new(5, 5));
            assert!(distance == 1 || distance == 2);
            if distance == 2 {
                long_steps += 1;
            }
        }
        let ratio = long_steps as f32 / trials as f32;
        assert!((0.22..=0.28).contains(&ratio), "long step ratio {ratio}");
    }

    #[test]
    fn never_steps_into_town_or_obstacles() {
        let config = GameConfig::default();
        let obstacles: OccupiedSet = [GridPos::new(1, 0), GridPos::new(0, 1)].into_iter().collect();
        for seed in 0..500 {
            let mut rng = Rng::new(seed);
            let mut monster = goblin_at(1, 1);
            let to = monster.advance(step(1, &obstacles, &config), &mut rng);
            assert_ne!(to, config.town);
            assert!(!obstacles.contains(&to));
            assert!(in_bounds(to, config.grid_size));
        }
    }

    #[test]
    fn boxed_in_monster_holds_position() {
        let config = GameConfig::default();
        let mut obstacles = OccupiedSet::new();
        for (dx, dy) in EIGHT_WAY {
            obstacles.insert(GridPos::new(5 + dx, 5 + dy));
            obstacles.insert(GridPos::new(5 + dx * 2, 5 + dy * 2));
        }
        let mut rng = Rng::new(8);
        let mut monster = goblin_at(5, 5);
        assert_eq!(monster.advance(step(3, &obstacles, &config), &mut rng), GridPos::new(5, 5));
    }

    #[test]
    fn record_round_trip_preserves_every_field() {
        let mut monster = goblin_at(3, 4);
        monster.health = 11;
        monster.modifiers = CombatModifiers {
            crit_chance: 0.2,
            crit_multiplier: 2.0,
            miss_chance: 0.1,
        };
        let text = serde_json::to_string(&monster.to_record()).expect("serialize");
        assert!(text.contains(r#""color":[200,0,0]"#));
        let record: MonsterRecord = serde_json::from_str(&text).expect("deserialize");
        let restored = WanderingMonster::from_record(record, 10).expect("restore");
        assert_eq!(restored, monster);
    }

    #[test]
    fn legacy_record_fills_defaults() {
        let text = r#"{"name":"Slime","description":"A blob","health":12,"power":5,
            "money":8,"color":[0,200,0],"x":2,"y":2}"#;
        let record: MonsterRecord = serde_json::from_str(text).expect("deserialize");
        let monster = WanderingMonster::from_record(record, 10).expect("restore");
        assert_eq!(monster.max_health, 12);
        assert_eq!(monster.modifiers, CombatModifiers::default());
        assert_eq!(monster.sprite_name, "");
    }

    #[test]
    fn record_outside_grid_is_rejected() {
        let mut record = goblin_at(0, 0).to_record();
        record.x = 42;
        assert!(matches!(
            WanderingMonster::from_record(record, 10),
            Err(EngineError::OutOfBounds { .. })
        ));
    }
}
