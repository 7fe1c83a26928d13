use serde::{Deserialize, Serialize};

use crate::error::{EngineError, InventoryError};
use crate::types::CombatModifiers;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    pub damage_bonus: i32,
    pub max_durability: u32,
    pub current_durability: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crit_chance: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crit_multiplier: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miss_chance: Option<f32>,
}

impl Weapon {
    pub fn new(name: &str, damage_bonus: i32, durability: u32) -> Result<Self, EngineError> {
        let weapon = Self {
            name: name.to_string(),
            damage_bonus,
            max_durability: durability,
            current_durability: durability,
            crit_chance: None,
            crit_multiplier: None,
            miss_chance: None,
        };
        weapon.validate()?;
        Ok(weapon)
    }

    pub fn with_modifiers(mut self, modifiers: CombatModifiers) -> Result<Self, EngineError> {
        self.crit_chance = Some(modifiers.crit_chance);
        self.crit_multiplier = Some(modifiers.crit_multiplier);
        self.miss_chance = Some(modifiers.miss_chance);
        self.validate()?;
        Ok(self)
    }

    pub fn is_functional(&self) -> bool {
        self.current_durability > 0
    }

    pub fn modifiers(&self, base: CombatModifiers) -> CombatModifiers {
        CombatModifiers {
            crit_chance: self.crit_chance.unwrap_or(base.crit_chance),
            crit_multiplier: self.crit_multiplier.unwrap_or(base.crit_multiplier),
            miss_chance: self.miss_chance.unwrap_or(base.miss_chance),
        }
    }

    fn validate(&self) -> Result<(), EngineError> {
        let invalid = |reason: String| EngineError::InvalidItem {
            name: self.name.clone(),
            reason,
        };
        if self.name.trim().is_empty() {
            return Err(invalid("empty name".to_string()));
        }
        if self.damage_bonus < 0 {
            return Err(invalid(format!("negative damage bonus {}", self.damage_bonus)));
        }
        if self.current_durability > self.max_durability {
            return Err(invalid(format!(
                "durability {} exceeds maximum {}",
                self.current_durability, self.max_durability
            )));
        }
        for chance in [self.crit_chance, self.miss_chance].into_iter().flatten() {
            if !(0.0..=1.0).contains(&chance) {
                return Err(invalid(format!("probability {chance} outside [0, 1]")));
            }
        }
        if let Some(multiplier) = self.crit_multiplier {
            if !multiplier.is_finite() || multiplier < 1.0 {
                return Err(invalid(format!("crit multiplier {multiplier} below 1")));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passive {
    pub name: String,
    pub defense_bonus: i32,
    #[serde(default)]
    pub unique: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumable {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Item {
    Weapon(Weapon),
    Passive(Passive),
    Consumable(Consumable),
}

impl Item {
    pub fn name(&self) -> &str {
        match self {
            Item::Weapon(weapon) => &weapon.name,
            Item::Passive(passive) => &passive.name,
            Item::Consumable(consumable) => &consumable.name,
        }
    }

    pub fn defense_bonus(&self) -> i32 {
        match self {
            Item::Passive(passive) => passive.defense_bonus,
            _ => 0,
        }
    }

    pub fn is_unique(&self) -> bool {
        matches!(self, Item::Passive(Passive { unique: true, .. }))
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        match self {
            Item::Weapon(weapon) => weapon.validate(),
            Item::Passive(passive) if passive.defense_bonus < 0 => Err(EngineError::InvalidItem {
                name: passive.name.clone(),
                reason: format!("negative defense bonus {}", passive.defense_bonus),
            }),
            other if other.name().trim().is_empty() => Err(EngineError::InvalidItem {
                name: String::new(),
                reason: "empty name".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u32);

#[derive(Clone, Debug, PartialEq)]
struct InventorySlot {
    id: ItemId,
    item: Item,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Inventory {
    slots: Vec<InventorySlot>,
    equipped: Option<ItemId>,
    next_id: u32,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn add(&mut self, item: Item) -> Result<ItemId, InventoryError> {
        if item.is_unique() && self.slots.iter().any(|slot| slot.item.name() == item.name()) {
            return Err(InventoryError::DuplicateUnique(item.name().to_string()));
        }
        let id = ItemId(self.next_id);
        self.next_id += 1;
        self.slots.push(InventorySlot { id, item });
        Ok(id)
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.slots.iter().find(|slot| slot.id == id).map(|slot| &slot.item)
    }

    pub fn remove(&mut self, id: ItemId) -> Result<Item, InventoryError> {
        let idx = self
            .slots
            .iter()
            .position(|slot| slot.id == id)
            .ok_or(InventoryError::UnknownItem(id.0))?;
        if self.equipped == Some(id) {
            self.equipped = None;
        }
        Ok(self.slots.remove(idx).item)
    }

    pub fn equip(&mut self, id: ItemId) -> Result<(), InventoryError> {
        match self.get(id) {
            Some(Item::Weapon(_)) => {
                self.equipped = Some(id);
                Ok(())
            }
            Some(other) => Err(InventoryError::NotAWeapon(other.name().to_string())),
            None => Err(InventoryError::UnknownItem(id.0)),
        }
    }

    pub fn equipped_id(&self) -> Option<ItemId> {
        self.equipped
    }

    pub fn equipped_weapon(&self) -> Option<&Weapon> {
        let id = self.equipped?;
        match self.get(id) {
            Some(Item::Weapon(weapon)) => Some(weapon),
            _ => None,
        }
    }

    pub fn equipped_weapon_mut(&mut self) -> Option<&mut Weapon> {
        let id = self.equipped?;
        self.slots
            .iter_mut()
            .find(|slot| slot.id == id)
            .and_then(|slot| match &mut slot.item {
                Item::Weapon(weapon) => Some(weapon),
                _ => None,
            })
    }

    pub fn total_defense(&self) -> i32 {
        self.slots.iter().map(|slot| slot.item.defense_bonus()).sum()
    }

    pub fn first_consumable(&self) -> Option<ItemId> {
        self.slots
            .iter()
            .find(|slot| matches!(slot.item, Item::Consumable(_)))
            .map(|slot| slot.id)
    }

    pub fn weapon_ids(&self) -> Vec<ItemId> {
        self.slots
            .iter()
            .filter(|slot| matches!(slot.item, Item::Weapon(_)))
            .map(|slot| slot.id)
            .collect()
    }

    pub fn discard_broken_weapons(&mut self) -> Vec<String> {
        let broken: Vec<ItemId> = self
            .slots
            .iter()
            .filter(|slot| matches!(&slot.item, Item::Weapon(weapon) if !weapon.is_functional()))
            .map(|slot| slot.id)
            .collect();
        let mut names = Vec::new();
        for id in broken {
            if let Ok(item) = self.remove(id) {
                names.push(item.name().to_string());
            }
        }
        names
    }

    pub fn to_records(&self) -> (Option<Item>, Vec<Item>) {
        let equipped = self.equipped_weapon().cloned().map(Item::Weapon);
        let items = self.slots.iter().map(|slot| slot.item.clone()).collect();
        (equipped, items)
    }

    // Rebuilds an inventory from persisted records. The equipped weapon is
    // linked to the first inventory weapon with the same name; if none is
    // held it is added to the inventory.
    pub fn from_records(equipped: Option<Item>, items: Vec<Item>) -> Result<Self, EngineError> {
        let mut inventory = Inventory::new();
        for item in items {
            item.validate()?;
            inventory
                .add(item)
                .map_err(|error| EngineError::InvalidRecord {
                    kind: "inventory",
                    reason: error.to_string(),
                })?;
        }
        let Some(equipped) = equipped else {
            return Ok(inventory);
        };
        let weapon = match equipped {
            Item::Weapon(weapon) => weapon,
            other => {
                return Err(EngineError::InvalidRecord {
                    kind: "equipped_weapon",
                    reason: format!("'{}' is not a weapon", other.name()),
                })
            }
        };
        weapon.validate()?;
        let linked = inventory.slots.iter().find(|slot| {
            matches!(&slot.item, Item::Weapon(held) if held.name == weapon.name)
        });
        let id = match linked {
            Some(slot) => slot.id,
            None => inventory
                .add(Item::Weapon(weapon))
                .map_err(|error| EngineError::InvalidRecord {
                    kind: "equipped_weapon",
                    reason: error.to_string(),
                })?,
        };
        inventory.equipped = Some(id);
        Ok(inventory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sword() -> Item {
        Item::Weapon(Weapon::new("Sword", 3, 10).expect("valid weapon"))
    }

    fn buckler() -> Item {
        Item::Passive(Passive {
            name: "Buckler".to_string(),
            defense_bonus: 2,
            unique: true,
        })
    }

    #[test]
    fn weapon_validation_rejects_bad_values() {
        assert!(Weapon::new("", 1, 1).is_err());
        assert!(Weapon::new("Club", -1, 1).is_err());
        let bad_chance = Weapon::new("Club", 1, 1).expect("valid").with_modifiers(CombatModifiers {
            crit_chance: 1.5,
            ..CombatModifiers::default()
        });
        assert!(bad_chance.is_err());
    }

    #[test]
    fn unique_passive_can_only_be_owned_once() {
        let mut inventory = Inventory::new();
        inventory.add(buckler()).expect("first copy");
        assert_eq!(
            inventory.add(buckler()),
            Err(InventoryError::DuplicateUnique("Buckler".to_string()))
        );
    }

    #[test]
    fn equip_only_accepts_weapons() {
        let mut inventory = Inventory::new();
        let shield = inventory.add(buckler()).expect("add");
        let sword = inventory.add(sword()).expect("add");
        assert!(matches!(inventory.equip(shield), Err(InventoryError::NotAWeapon(_))));
        inventory.equip(sword).expect("equip");
        assert_eq!(inventory.equipped_weapon().map(|w| w.name.as_str()), Some("Sword"));
    }

    #[test]
    fn removing_equipped_weapon_clears_slot() {
        let mut inventory = Inventory::new();
        let id = inventory.add(sword()).expect("add");
        inventory.equip(id).expect("equip");
        inventory.remove(id).expect("remove");
        assert!(inventory.equipped_weapon().is_none());
        assert_eq!(inventory.equipped_id(), None);
    }

    #[test]
    fn defense_sums_all_passives() {
        let mut inventory = Inventory::new();
        inventory.add(buckler()).expect("add");
        inventory
            .add(Item::Passive(Passive {
                name: "Charm".to_string(),
                defense_bonus: 1,
                unique: false,
            }))
            .expect("add");
        inventory.add(sword()).expect("add");
        assert_eq!(inventory.total_defense(), 3);
    }

    #[test]
    fn discard_broken_weapons_unequips_and_removes() {
        let mut inventory = Inventory::new();
        let id = inventory.add(sword()).expect("add");
        inventory.equip(id).expect("equip");
        if let Some(weapon) = inventory.equipped_weapon_mut() {
            weapon.current_durability = 0;
        }
        assert_eq!(inventory.discard_broken_weapons(), vec!["Sword".to_string()]);
        assert!(inventory.is_empty());
        assert!(inventory.equipped_weapon().is_none());
    }

    #[test]
    fn records_relink_equipped_weapon_by_name() {
        let mut inventory = Inventory::new();
        inventory.add(buckler()).expect("add");
        let id = inventory.add(sword()).expect("add");
        inventory.equip(id).expect("equip");

        let (equipped, items) = inventory.to_records();
        let text = serde_json::to_string(&items).expect("serialize");
        assert!(text.contains(r#""type":"weapon""#));
        let items: Vec<Item> = serde_json::from_str(&text).expect("deserialize");

        let restored = Inventory::from_records(equipped, items).expect("restore");
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.equipped_weapon().map(|w| w.name.as_str()), Some("Sword"));
    }

    #[test]
    fn equipped_record_missing_from_inventory_is_added() {
        let restored = Inventory::from_records(Some(sword()), Vec::new()).expect("restore");
        assert_eq!(restored.len(), 1);
        assert!(restored.equipped_weapon().is_some());
    }

    #[test]
    fn equipped_record_must_be_a_weapon() {
        assert!(Inventory::from_records(Some(buckler()), Vec::new()).is_err());
    }
}
