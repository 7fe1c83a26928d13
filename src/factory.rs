use crate::entities::{Asteroid, WanderingMonster};
use crate::error::EngineError;
use crate::grid::{GridPos, OccupiedSet};
use crate::rng::Rng;
use crate::types::{Color, CombatModifiers, GameConfig};

pub const COLOR_RED: Color = (200, 0, 0);
pub const COLOR_GREEN: Color = (0, 200, 0);
pub const COLOR_BLUE: Color = (0, 0, 200);
pub const COLOR_YELLOW: Color = (200, 200, 0);

#[derive(Clone, Debug)]
pub struct MonsterTemplate {
    pub name: &'static str,
    pub description: &'static str,
    pub health_range: (i32, i32),
    pub power_range: (i32, i32),
    pub money_range: (i32, i32),
    pub color: Color,
    pub sprite_name: &'static str,
    pub modifiers: Option<CombatModifiers>,
}

pub const MONSTER_TEMPLATES: &[MonsterTemplate] = &[
    MonsterTemplate {
        name: "Goblin",
        description: "A Goblin who looks unhappy you are here",
        health_range: (20, 40),
        power_range: (8, 12),
        money_range: (10, 30),
        color: COLOR_RED,
        sprite_name: "goblin",
        modifiers: None,
    },
    MonsterTemplate {
        name: "Slime",
        description: "A gelatinous green blob.",
        health_range: (10, 20),
        power_range: (4, 8),
        money_range: (5, 15),
        color: COLOR_GREEN,
        sprite_name: "slime",
        modifiers: Some(CombatModifiers {
            crit_chance: 0.02,
            crit_multiplier: 1.5,
            miss_chance: 0.15,
        }),
    },
    MonsterTemplate {
        name: "Vulture",
        description: "A smelly angry bird",
        health_range: (15, 35),
        power_range: (6, 10),
        money_range: (15, 25),
        color: COLOR_YELLOW,
        sprite_name: "vulture",
        modifiers: Some(CombatModifiers {
            crit_chance: 0.1,
            crit_multiplier: 1.5,
            miss_chance: 0.1,
        }),
    },
    MonsterTemplate {
        name: "Troll",
        description: "A large creature with a giant club.",
        health_range: (50, 80),
        power_range: (20, 30),
        money_range: (50, 100),
        color: COLOR_BLUE,
        sprite_name: "troll",
        modifiers: Some(CombatModifiers {
            crit_chance: 0.08,
            crit_multiplier: 2.0,
            miss_chance: 0.12,
        }),
    },
];

pub fn spawn_monster(
    templates: &[MonsterTemplate],
    config: &GameConfig,
    excluded: &OccupiedSet,
    rng: &mut Rng,
) -> Result<WanderingMonster, EngineError> {
    let Some(template) = templates.get(rng.pick_index(templates.len())) else {
        return Err(EngineError::InvalidRecord {
            kind: "monster template",
            reason: "template table is empty".to_string(),
        });
    };
    let health = rng.int(template.health_range.0, template.health_range.1);
    let power = rng.int(template.power_range.0, template.power_range.1);
    let base_money = rng.int(template.money_range.0, template.money_range.1);
    let money_modifier = rng.next_f32() * 0.2 + 0.9;
    let money = (base_money as f32 * money_modifier).floor() as i32;

    let pos = sample_free_cell(config, rng, "monster", |rng| {
        let candidate = GridPos::new(
            rng.int(0, config.grid_size - 1),
            rng.int(0, config.grid_size - 1),
        );
        (candidate != config.town && !excluded.contains(&candidate)).then_some(candidate)
    })?;

    Ok(WanderingMonster::new(
        template.name,
        template.description,
        health,
        power,
        money,
        template.color,
        template.sprite_name,
        template.modifiers.unwrap_or(config.unarmed),
        pos,
    ))
}

pub fn spawn_asteroid(
    config: &GameConfig,
    excluded: &OccupiedSet,
    rng: &mut Rng,
) -> Result<Asteroid, EngineError> {
    let last = config.grid_size - 1;
    let mut velocity = (1, 1);
    let pos = sample_free_cell(config, rng, "asteroid", |rng| {
        let (pos, dx, dy) = match rng.int(0, 3) {
            0 => (GridPos::new(rng.int(0, last), 0), rng.int(-1, 1), 1),
            1 => (GridPos::new(rng.int(0, last), last), rng.int(-1, 1), -1),
            2 => (GridPos::new(0, rng.int(0, last)), 1, rng.int(-1, 1)),
            _ => (GridPos::new(last, rng.int(0, last)), -1, rng.int(-1, 1)),
        };
        velocity = (dx, dy);
        (!excluded.contains(&pos)).then_some(pos)
    })?;
    Ok(Asteroid::new(pos, velocity.0, velocity.1, config.grid_size))
}

fn sample_free_cell(
    config: &GameConfig,
    rng: &mut Rng,
    what: &'static str,
    mut draw: impl FnMut(&mut Rng) -> Option<GridPos>,
) -> Result<GridPos, EngineError> {
    for _ in 0..config.max_spawn_attempts {
        if let Some(pos) = draw(rng) {
            return Ok(pos);
        }
    }
    Err(EngineError::SpawnExhausted {
        what,
        attempts: config.max_spawn_attempts,
    })
}
