use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::SAVE_FORMAT_VERSION;
use crate::engine::{MapEngine, MapRecord, MapState};
use crate::error::SaveError;
use crate::items::{Inventory, Item};
use crate::rng::Rng;
use crate::types::{GameConfig, PlayerStats};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveGame {
    pub version: u8,
    #[serde(default)]
    pub saved_at: String,
    pub player_hp: i32,
    pub player_max_hp: i32,
    pub player_gold: i32,
    pub player_power: i32,
    #[serde(default)]
    pub equipped_weapon: Option<Item>,
    #[serde(default)]
    pub player_inventory: Vec<Item>,
    pub map_state: MapRecord,
}

#[derive(Deserialize)]
struct SaveHeader {
    version: u8,
}

pub struct LoadedGame {
    pub stats: PlayerStats,
    pub inventory: Inventory,
    pub map: MapEngine,
}

impl SaveGame {
    pub fn capture(stats: &PlayerStats, inventory: &Inventory, map: &MapState) -> Self {
        let (equipped_weapon, player_inventory) = inventory.to_records();
        Self {
            version: SAVE_FORMAT_VERSION,
            saved_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            player_hp: stats.hp,
            player_max_hp: stats.max_hp,
            player_gold: stats.gold,
            player_power: stats.power,
            equipped_weapon,
            player_inventory,
            map_state: map.to_record(),
        }
    }

    pub fn restore(self, config: &GameConfig, rng: &mut Rng) -> Result<LoadedGame, SaveError> {
        let max_hp = self.player_max_hp.max(1);
        let stats = PlayerStats {
            hp: self.player_hp.clamp(1, max_hp),
            max_hp,
            gold: self.player_gold.max(0),
            power: self.player_power.max(0),
        };
        let inventory = Inventory::from_records(self.equipped_weapon, self.player_inventory)?;
        let map = MapEngine::restore(config.clone(), self.map_state, rng)?;
        Ok(LoadedGame {
            stats,
            inventory,
            map,
        })
    }
}

pub struct SaveStore {
    file_path: PathBuf,
}

impl SaveStore {
    pub fn new(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn exists(&self) -> bool {
        self.file_path.is_file()
    }

    pub fn load(&self) -> Result<SaveGame, SaveError> {
        let result = load_save(&self.file_path);
        if let Err(error) = &result {
            if !matches!(error, SaveError::NotFound) {
                eprintln!(
                    "[save-store] failed to load {}: {error}",
                    self.file_path.display()
                );
            }
        }
        result
    }

    pub fn save(&self, game: &SaveGame) -> Result<(), SaveError> {
        if let Some(parent) = self.file_path.parent() {
            if let Err(error) = fs::create_dir_all(parent) {
                eprintln!(
                    "[save-store] failed to create parent dir {}: {error}",
                    parent.display()
                );
                return Err(error.into());
            }
        }
        let text = serde_json::to_string_pretty(game)?;
        if let Err(error) = fs::write(&self.file_path, text) {
            eprintln!(
                "[save-store] failed to write {}: {error}",
                self.file_path.display()
            );
            return Err(error.into());
        }
        Ok(())
    }
}

fn load_save(path: &Path) -> Result<SaveGame, SaveError> {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Err(SaveError::NotFound)
        }
        Err(error) => return Err(error.into()),
    };
    let header: SaveHeader = serde_json::from_str(&text)?;
    if header.version != SAVE_FORMAT_VERSION {
        return Err(SaveError::UnsupportedVersion {
            expected: SAVE_FORMAT_VERSION,
            found: header.version,
        });
    }
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::MobileEntity;
    use crate::grid::GridPos;
    use crate::items::{Consumable, Passive, Weapon};

    fn temp_file(name: &str) -> PathBuf {
        let unique = format!(
            "{}-{}-{}",
            name,
            std::process::id(),
            rand::random::<u32>()
        );
        std::env::temp_dir().join(unique).join("save.json")
    }

    fn cleanup(path: &Path) {
        let _ = fs::remove_file(path);
        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }

    fn sample_inventory() -> Inventory {
        let mut inventory = Inventory::new();
        let sword = inventory
            .add(Item::Weapon(Weapon::new("Sword", 4, 10).expect("weapon")))
            .expect("add");
        inventory
            .add(Item::Passive(Passive {
                name: "Shield".to_string(),
                defense_bonus: 2,
                unique: true,
            }))
            .expect("add");
        inventory
            .add(Item::Consumable(Consumable {
                name: "Bomb".to_string(),
            }))
            .expect("add");
        inventory.equip(sword).expect("equip");
        inventory
    }

    #[test]
    fn save_then_load_restores_player_and_map() {
        let path = temp_file("save-store-round-trip");
        let store = SaveStore::new(path.clone());
        let config = GameConfig::default();
        let mut rng = Rng::new(12);
        let map = MapEngine::new_game(config.clone(), &mut rng).expect("new game");
        let stats = PlayerStats {
            hp: 17,
            max_hp: 30,
            gold: 44,
            power: 6,
        };
        let inventory = sample_inventory();

        let game = SaveGame::capture(&stats, &inventory, map.state());
        store.save(&game).expect("save");
        assert!(store.exists());

        let text = fs::read_to_string(&path).expect("read");
        assert!(text.contains("\"map_state\""));
        assert!(!text.contains("asteroid"));

        let loaded = store
            .load()
            .expect("load")
            .restore(&config, &mut rng)
            .expect("restore");
        assert_eq!(loaded.stats, stats);
        assert_eq!(loaded.inventory.len(), 3);
        assert_eq!(
            loaded.inventory.equipped_weapon().map(|w| w.name.as_str()),
            Some("Sword")
        );
        assert_eq!(loaded.inventory.total_defense(), 2);
        assert_eq!(loaded.map.state().monsters, map.state().monsters);
        assert_eq!(loaded.map.state().player_pos(), map.state().player_pos());
        assert_eq!(loaded.map.state().asteroids.len(), config.asteroid_floor);

        cleanup(&path);
    }

    #[test]
    fn missing_file_reports_not_found() {
        let store = SaveStore::new(temp_file("save-store-missing"));
        assert!(!store.exists());
        assert!(matches!(store.load(), Err(SaveError::NotFound)));
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let path = temp_file("save-store-corrupt");
        fs::create_dir_all(path.parent().expect("parent")).expect("dir");
        fs::write(&path, "{ not json").expect("write");
        let store = SaveStore::new(path.clone());
        assert!(matches!(store.load(), Err(SaveError::Serialization(_))));
        cleanup(&path);
    }

    #[test]
    fn future_version_is_rejected() {
        let path = temp_file("save-store-version");
        fs::create_dir_all(path.parent().expect("parent")).expect("dir");
        fs::write(&path, r#"{"version": 9}"#).expect("write");
        let store = SaveStore::new(path.clone());
        assert!(matches!(
            store.load(),
            Err(SaveError::UnsupportedVersion {
                expected: 1,
                found: 9
            })
        ));
        cleanup(&path);
    }

    #[test]
    fn hand_written_save_with_legacy_monster_loads() {
        let path = temp_file("save-store-legacy");
        fs::create_dir_all(path.parent().expect("parent")).expect("dir");
        let raw = r#"{
  "version": 1,
  "player_hp": 30,
  "player_max_hp": 30,
  "player_gold": 10,
  "player_power": 5,
  "equipped_weapon": {"type": "weapon", "name": "Dagger", "damage_bonus": 2,
                      "max_durability": 5, "current_durability": 3},
  "player_inventory": [],
  "map_state": {
    "player_pos": [3, 3],
    "town_pos": [0, 0],
    "moved_from_town": true,
    "turn_count": 8,
    "monsters": [
      {"name": "Slime", "description": "A blob", "health": 9, "power": 4,
       "money": 7, "color": [0, 200, 0], "x": 5, "y": 6}
    ]
  }
}"#;
        fs::write(&path, raw).expect("write");
        let store = SaveStore::new(path.clone());
        let mut rng = Rng::new(3);
        let loaded = store
            .load()
            .expect("load")
            .restore(&GameConfig::default(), &mut rng)
            .expect("restore");
        let dagger = loaded.inventory.equipped_weapon().expect("equipped");
        assert_eq!(dagger.current_durability, 3);
        assert_eq!(loaded.inventory.len(), 1);
        let state = loaded.map.state();
        assert_eq!(state.turn_count, 8);
        assert_eq!(state.monsters[0].position(), GridPos::new(5, 6));
        assert_eq!(state.monsters[0].max_health, 9);
        cleanup(&path);
    }

    #[test]
    fn save_with_out_of_bounds_monster_is_invalid() {
        let config = GameConfig::default();
        let mut rng = Rng::new(5);
        let map = MapEngine::new_game(config.clone(), &mut rng).expect("new game");
        let mut game = SaveGame::capture(&PlayerStats::starting(), &Inventory::new(), map.state());
        game.map_state.monsters[0].x = 99;
        assert!(matches!(
            game.restore(&config, &mut rng),
            Err(SaveError::Invalid(_))
        ));
    }
}
