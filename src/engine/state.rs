use serde::{Deserialize, Serialize};

use super::*;
use crate::entities::Asteroid;

#[derive(Clone, Debug, PartialEq)]
pub struct MapState {
    pub player: Player,
    town: GridPos,
    pub monsters: Vec<WanderingMonster>,
    pub asteroids: Vec<Asteroid>,
    pub moved_from_town: bool,
    pub turn_count: u64,
    pub active_encounter: Option<usize>,
}

// Asteroids are not persisted; they are re-seeded on load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapRecord {
    pub player_pos: GridPos,
    pub town_pos: GridPos,
    #[serde(default)]
    pub moved_from_town: bool,
    #[serde(default)]
    pub turn_count: u64,
    #[serde(default)]
    pub monsters: Vec<MonsterRecord>,
}

impl MapState {
    pub fn new(config: &GameConfig) -> Result<Self, EngineError> {
        if !in_bounds(config.town, config.grid_size) {
            return Err(EngineError::OutOfBounds {
                pos: config.town,
                grid_size: config.grid_size,
            });
        }
        Ok(Self {
            player: Player::new(config.town),
            town: config.town,
            monsters: Vec::new(),
            asteroids: Vec::new(),
            moved_from_town: false,
            turn_count: 0,
            active_encounter: None,
        })
    }

    pub fn town(&self) -> GridPos {
        self.town
    }

    pub fn player_pos(&self) -> GridPos {
        self.player.position()
    }

    pub fn monster_at(&self, pos: GridPos) -> Option<usize> {
        self.monsters.iter().position(|m| m.position() == pos)
    }

    pub fn occupied_cells(&self) -> OccupiedSet {
        let mut cells = cells_of(&self.monsters);
        cells.extend(cells_of(&self.asteroids));
        cells.insert(self.player_pos());
        cells.insert(self.town);
        cells
    }

    pub(super) fn is_held_by_other_than_asteroid(&self, pos: GridPos, idx: usize) -> bool {
        pos == self.player_pos()
            || pos == self.town
            || self.monster_at(pos).is_some()
            || self
                .asteroids
                .iter()
                .enumerate()
                .any(|(other, a)| other != idx && a.position() == pos)
    }

    pub fn to_record(&self) -> MapRecord {
        MapRecord {
            player_pos: self.player_pos(),
            town_pos: self.town,
            moved_from_town: self.moved_from_town,
            turn_count: self.turn_count,
            monsters: self.monsters.iter().map(|m| m.to_record()).collect(),
        }
    }

    pub fn from_record(record: MapRecord, config: &GameConfig) -> Result<Self, EngineError> {
        let grid_size = config.grid_size;
        let player = Player::from_record(record.player_pos, grid_size)?;
        if !in_bounds(record.town_pos, grid_size) {
            return Err(EngineError::OutOfBounds {
                pos: record.town_pos,
                grid_size,
            });
        }
        let monsters = record
            .monsters
            .into_iter()
            .map(|m| WanderingMonster::from_record(m, grid_size))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(m) = monsters.iter().find(|m| m.position() == record.town_pos) {
            return Err(EngineError::InvalidRecord {
                kind: "monster",
                reason: format!("{} is standing in town", m.name),
            });
        }
        Ok(Self {
            player,
            town: record.town_pos,
            monsters,
            asteroids: Vec::new(),
            moved_from_town: record.moved_from_town,
            turn_count: record.turn_count,
            active_encounter: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CombatModifiers;

    fn goblin(x: i32, y: i32) -> WanderingMonster {
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

    #[test]
    fn occupied_cells_cover_every_entity_and_town() {
        let config = GameConfig::default();
        let mut state = MapState::new(&config).expect("state");
        state.player.place(GridPos::new(3, 3));
        state.monsters.push(goblin(4, 4));
        state.asteroids.push(Asteroid::new(GridPos::new(9, 2), -1, 0, 10));
        let cells = state.occupied_cells();
        for pos in [(0, 0), (3, 3), (4, 4), (9, 2)] {
            assert!(cells.contains(&GridPos::from(pos)), "{pos:?} missing");
        }
        assert_eq!(cells.len(), 4);
    }

    #[test]
    fn shared_asteroid_cell_is_detected() {
        let config = GameConfig::default();
        let mut state = MapState::new(&config).expect("state");
        state.asteroids.push(Asteroid::new(GridPos::new(5, 5), 1, 0, 10));
        assert!(!state.is_held_by_other_than_asteroid(GridPos::new(5, 5), 0));
        state.asteroids.push(Asteroid::new(GridPos::new(5, 5), -1, 0, 10));
        assert!(state.is_held_by_other_than_asteroid(GridPos::new(5, 5), 0));
    }

    #[test]
    fn record_round_trip_drops_asteroids_and_encounter() {
        let config = GameConfig::default();
        let mut state = MapState::new(&config).expect("state");
        state.player.place(GridPos::new(2, 7));
        state.monsters.push(goblin(6, 1));
        state.asteroids.push(Asteroid::new(GridPos::new(0, 5), 1, 0, 10));
        state.moved_from_town = true;
        state.turn_count = 17;
        state.active_encounter = Some(0);

        let text = serde_json::to_string(&state.to_record()).expect("serialize");
        assert!(text.contains(r#""player_pos":[2,7]"#));
        assert!(!text.contains("asteroid"));
        let record: MapRecord = serde_json::from_str(&text).expect("deserialize");
        let restored = MapState::from_record(record, &config).expect("restore");
        assert_eq!(restored.player_pos(), GridPos::new(2, 7));
        assert_eq!(restored.monsters, state.monsters);
        assert_eq!(restored.turn_count, 17);
        assert!(restored.moved_from_town);
        assert!(restored.asteroids.is_empty());
        assert_eq!(restored.active_encounter, None);
    }

    #[test]
    fn record_with_monster_in_town_is_rejected() {
        let config = GameConfig::default();
        let mut state = MapState::new(&config).expect("state");
        state.monsters.push(goblin(0, 0));
        let result = MapState::from_record(state.to_record(), &config);
        assert!(matches!(result, Err(EngineError::InvalidRecord { kind: "monster", .. })));
    }

    #[test]
    fn town_outside_grid_is_rejected() {
        let mut config = GameConfig::default();
        config.town = GridPos::new(12, 0);
        assert!(MapState::new(&config).is_err());
    }
}
