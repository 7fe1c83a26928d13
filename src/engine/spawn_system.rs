use super::*;
use crate::factory::{spawn_asteroid, spawn_monster, MONSTER_TEMPLATES};

impl MapEngine {
    pub(super) fn spawn_monsters(&mut self, count: usize, rng: &mut Rng) -> Result<(), EngineError> {
        for _ in 0..count {
            let excluded = self.state.occupied_cells();
            let monster = spawn_monster(MONSTER_TEMPLATES, &self.config, &excluded, rng)?;
            self.state.monsters.push(monster);
        }
        Ok(())
    }

    pub(super) fn repopulate_monsters(&mut self, rng: &mut Rng) -> Result<(), EngineError> {
        let count = self.config.repopulate_monsters;
        self.spawn_monsters(count, rng)?;
        self.events.push(MapEvent::MonstersRepopulated { count });
        Ok(())
    }

    pub(super) fn top_up_asteroids(&mut self, rng: &mut Rng) -> Result<(), EngineError> {
        while self.state.asteroids.len() < self.config.asteroid_floor {
            let excluded = self.state.occupied_cells();
            let asteroid = spawn_asteroid(&self.config, &excluded, rng)?;
            let (dx, dy) = asteroid.velocity();
            self.events.push(MapEvent::AsteroidSpawned {
                at: asteroid.position(),
                dx,
                dy,
            });
            self.state.asteroids.push(asteroid);
        }
        Ok(())
    }
}
