use serde::Serialize;

use crate::combat::{run_combat, CombatInput, CombatOutcome};
use crate::entities::{
    AsteroidRecord, AsteroidStep, MobileEntity, MonsterRecord, MonsterStep, Player, PlayerStep,
    WanderingMonster,
};
use crate::error::EngineError;
use crate::grid::{in_bounds, GridPos, OccupiedSet};
use crate::items::Inventory;
use crate::rng::Rng;
use crate::types::{GameConfig, MapAction, MapEvent, MapInput, PlayerStats};

mod spawn_system;
mod state;
mod utils;

pub use self::state::{MapRecord, MapState};

use self::utils::cells_of;

pub trait MapDriver {
    fn poll_input(&mut self, state: &MapState) -> MapInput;

    fn render(&mut self, _state: &MapState, _events: &[MapEvent]) {}
}

#[derive(Clone, Debug, Serialize)]
pub struct MapSnapshot {
    pub turn: u64,
    pub player: GridPos,
    pub town: GridPos,
    #[serde(rename = "movedFromTown")]
    pub moved_from_town: bool,
    #[serde(rename = "activeEncounter")]
    pub active_encounter: Option<usize>,
    pub monsters: Vec<MonsterRecord>,
    pub asteroids: Vec<AsteroidRecord>,
}

#[derive(Clone, Debug)]
pub struct MapEngine {
    pub config: GameConfig,
    state: MapState,
    events: Vec<MapEvent>,
}

impl MapEngine {
    pub fn new_game(config: GameConfig, rng: &mut Rng) -> Result<Self, EngineError> {
        let state = MapState::new(&config)?;
        let mut engine = Self::resume(config, state);
        engine.spawn_monsters(engine.config.initial_monsters, rng)?;
        engine.top_up_asteroids(rng)?;
        Ok(engine)
    }

    pub fn restore(config: GameConfig, record: MapRecord, rng: &mut Rng) -> Result<Self, EngineError> {
        let state = MapState::from_record(record, &config)?;
        let mut engine = Self::resume(config, state);
        engine.top_up_asteroids(rng)?;
        Ok(engine)
    }

    pub fn resume(config: GameConfig, state: MapState) -> Self {
        Self {
            config,
            state,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &MapState {
        &self.state
    }

    pub fn into_state(self) -> MapState {
        self.state
    }

    pub fn drain_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> MapSnapshot {
        MapSnapshot {
            turn: self.state.turn_count,
            player: self.state.player_pos(),
            town: self.state.town(),
            moved_from_town: self.state.moved_from_town,
            active_encounter: self.state.active_encounter,
            monsters: self.state.monsters.iter().map(|m| m.to_record()).collect(),
            asteroids: self.state.asteroids.iter().map(|a| a.to_record()).collect(),
        }
    }

    pub fn step(&mut self, input: MapInput, rng: &mut Rng) -> Result<Option<MapAction>, EngineError> {
        let direction = match input {
            MapInput::Quit => return Ok(Some(MapAction::Quit)),
            MapInput::Idle => return Ok(None),
            MapInput::Move(direction) => direction,
        };

        let from = self.state.player_pos();
        let asteroid_cells = cells_of(&self.state.asteroids);
        let player_step = PlayerStep {
            direction,
            blocked: &asteroid_cells,
            grid_size: self.config.grid_size,
        };
        if self.state.player.destination(&player_step).is_none() {
            let (dx, dy) = direction.delta();
            self.events.push(MapEvent::MoveBlocked {
                from,
                to: from.offset(dx, dy),
            });
            return Ok(None);
        }
        let to = self.state.player.advance(player_step, rng);
        self.events.push(MapEvent::PlayerMoved { to });

        if let Some(idx) = self.state.monster_at(to) {
            return Ok(Some(self.raise_encounter(idx)));
        }

        self.state.turn_count += 1;
        self.move_asteroids(rng);
        self.top_up_asteroids(rng)?;
        if let Some(idx) = self.move_monsters(rng) {
            return Ok(Some(self.raise_encounter(idx)));
        }

        if to == self.state.town() && self.state.moved_from_town {
            self.events.push(MapEvent::ReturnedToTown);
            return Ok(Some(MapAction::ReturnToTown));
        }
        if to != from {
            self.state.moved_from_town = true;
        }
        Ok(None)
    }

    pub fn run(&mut self, driver: &mut impl MapDriver, rng: &mut Rng) -> Result<MapAction, EngineError> {
        loop {
            let events = self.drain_events();
            driver.render(&self.state, &events);
            let input = driver.poll_input(&self.state);
            if let Some(action) = self.step(input, rng)? {
                let events = self.drain_events();
                driver.render(&self.state, &events);
                return Ok(action);
            }
        }
    }

    pub fn encountered_monster(&self) -> Option<&WanderingMonster> {
        self.state.active_encounter.and_then(|idx| self.state.monsters.get(idx))
    }

    pub fn fight(
        &mut self,
        stats: PlayerStats,
        inventory: Inventory,
        input: &mut impl CombatInput,
        rng: &mut Rng,
    ) -> Result<CombatOutcome, EngineError> {
        let idx = self
            .state
            .active_encounter
            .ok_or(EngineError::NoActiveEncounter)?;
        let monster = self
            .state
            .monsters
            .get_mut(idx)
            .ok_or(EngineError::NoActiveEncounter)?;
        let outcome = run_combat(&self.config, stats, inventory, monster, input, rng);
        self.resolve_encounter(outcome.won, rng)?;
        Ok(outcome)
    }

    pub fn resolve_encounter(&mut self, won: bool, rng: &mut Rng) -> Result<(), EngineError> {
        let idx = self
            .state
            .active_encounter
            .take()
            .ok_or(EngineError::NoActiveEncounter)?;
        if !won {
            return Ok(());
        }
        if idx >= self.state.monsters.len() {
            return Err(EngineError::NoActiveEncounter);
        }
        let defeated = self.state.monsters.remove(idx);
        self.events.push(MapEvent::MonsterDefeated {
            name: defeated.name,
        });
        if self.state.monsters.is_empty() {
            self.repopulate_monsters(rng)?;
        }
        Ok(())
    }

    fn raise_encounter(&mut self, idx: usize) -> MapAction {
        self.state.active_encounter = Some(idx);
        let monster = &self.state.monsters[idx];
        self.events.push(MapEvent::Encounter {
            monster_index: idx,
            name: monster.name.clone(),
            at: monster.position(),
        });
        MapAction::MonsterEncounter
    }

    // Drifts every asteroid in order. The blocked set is updated after each
    // move so later asteroids see earlier ones where they ended up.
    fn move_asteroids(&mut self, rng: &mut Rng) {
        let mut blocked = self.state.occupied_cells();
        for idx in 0..self.state.asteroids.len() {
            let from = self.state.asteroids[idx].position();
            let shared = self.state.is_held_by_other_than_asteroid(from, idx);
            if !shared {
                blocked.remove(&from);
            }
            let to = self.state.asteroids[idx].advance(AsteroidStep { avoid: &blocked }, rng);
            if in_bounds(to, self.config.grid_size) {
                blocked.insert(to);
            }
        }

        let events = &mut self.events;
        self.state.asteroids.retain(|asteroid| {
            let gone = asteroid.is_out_of_bounds();
            if gone {
                events.push(MapEvent::AsteroidDestroyed {
                    at: asteroid.position(),
                });
            }
            !gone
        });
    }

    fn move_monsters(&mut self, rng: &mut Rng) -> Option<usize> {
        let obstacles: OccupiedSet = cells_of(&self.state.asteroids);
        let player = self.state.player_pos();
        let town = self.state.town();
        let turn_count = self.state.turn_count;
        for idx in 0..self.state.monsters.len() {
            let monster = &mut self.state.monsters[idx];
            let from = monster.position();
            let to = monster.advance(
                MonsterStep {
                    town,
                    turn_count,
                    obstacles: &obstacles,
                    config: &self.config,
                },
                rng,
            );
            if to != from {
                self.events.push(MapEvent::MonsterMoved {
                    name: monster.name.clone(),
                    from,
                    to,
                });
            }
            if to == player {
                return Some(idx);
            }
        }
        None
    }
}

pub fn run_map(
    config: &GameConfig,
    state: MapState,
    driver: &mut impl MapDriver,
    rng: &mut Rng,
) -> Result<(MapAction, MapState), EngineError> {
    let mut engine = MapEngine::resume(config.clone(), state);
    let action = engine.run(driver, rng)?;
    Ok((action, engine.into_state()))
}
