use serde::Serialize;

use crate::error::{EngineError, InventoryError, ShopError};
use crate::items::{Consumable, Inventory, Item, ItemId, Passive, Weapon};
use crate::types::{CombatModifiers, PlayerStats};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TownChoice {
    Explore,
    Rest,
    Shop,
    Equip,
    Save,
    Quit,
}

impl TownChoice {
    pub const MENU: [(TownChoice, &'static str); 6] = [
        (TownChoice::Explore, "Leave town"),
        (TownChoice::Rest, "Sleep at the inn"),
        (TownChoice::Shop, "Visit the shop"),
        (TownChoice::Equip, "Equip a weapon"),
        (TownChoice::Save, "Save game"),
        (TownChoice::Quit, "Quit"),
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "explore" => Some(Self::Explore),
            "2" | "rest" | "sleep" => Some(Self::Rest),
            "3" | "shop" => Some(Self::Shop),
            "4" | "equip" => Some(Self::Equip),
            "5" | "save" => Some(Self::Save),
            "6" | "quit" | "q" => Some(Self::Quit),
            _ => None,
        }
    }
}

pub fn purchase_item(price: i32, money: i32, quantity: i32) -> (i32, i32) {
    if price <= 0 || quantity <= 0 || money <= 0 {
        return (0, money);
    }
    let total = price.saturating_mul(quantity);
    if total <= money {
        return (quantity, money - total);
    }
    let affordable = money / price;
    (affordable, money - affordable * price)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RestOutcome {
    Rested { paid: i32, hp: i32 },
    AlreadyFull,
    NotEnoughGold { cost: i32, gold: i32 },
}

// Sleeps at the inn. Gold is checked first, so a broke player is turned
// away even at full health.
pub fn rest(stats: &mut PlayerStats, cost: i32) -> RestOutcome {
    if stats.gold < cost {
        return RestOutcome::NotEnoughGold {
            cost,
            gold: stats.gold,
        };
    }
    if stats.hp >= stats.max_hp {
        return RestOutcome::AlreadyFull;
    }
    stats.gold -= cost;
    stats.hp = stats.max_hp;
    RestOutcome::Rested {
        paid: cost,
        hp: stats.hp,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShopStock {
    Weapon {
        damage_bonus: i32,
        durability: u32,
        modifiers: Option<CombatModifiers>,
    },
    Passive {
        defense_bonus: i32,
        unique: bool,
    },
    Consumable,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShopEntry {
    pub name: &'static str,
    pub price: i32,
    pub stock: ShopStock,
}

impl ShopEntry {
    pub fn to_item(&self) -> Result<Item, EngineError> {
        let item = match self.stock {
            ShopStock::Weapon {
                damage_bonus,
                durability,
                modifiers,
            } => {
                let weapon = Weapon::new(self.name, damage_bonus, durability)?;
                match modifiers {
                    Some(modifiers) => Item::Weapon(weapon.with_modifiers(modifiers)?),
                    None => Item::Weapon(weapon),
                }
            }
            ShopStock::Passive {
                defense_bonus,
                unique,
            } => Item::Passive(Passive {
                name: self.name.to_string(),
                defense_bonus,
                unique,
            }),
            ShopStock::Consumable => Item::Consumable(Consumable {
                name: self.name.to_string(),
            }),
        };
        item.validate()?;
        Ok(item)
    }

    pub fn describe(&self) -> String {
        match self.stock {
            ShopStock::Weapon {
                damage_bonus,
                durability,
                ..
            } => format!("+{damage_bonus} damage, {durability} uses"),
            ShopStock::Passive { defense_bonus, .. } => format!("+{defense_bonus} defense"),
            ShopStock::Consumable => "defeats any monster instantly".to_string(),
        }
    }
}

pub const SHOP_CATALOG: &[ShopEntry] = &[
    ShopEntry {
        name: "Sword",
        price: 15,
        stock: ShopStock::Weapon {
            damage_bonus: 4,
            durability: 8,
            modifiers: None,
        },
    },
    ShopEntry {
        name: "War Axe",
        price: 30,
        stock: ShopStock::Weapon {
            damage_bonus: 7,
            durability: 5,
            modifiers: Some(CombatModifiers {
                crit_chance: 0.1,
                crit_multiplier: 2.0,
                miss_chance: 0.1,
            }),
        },
    },
    ShopEntry {
        name: "Iron Shield",
        price: 25,
        stock: ShopStock::Passive {
            defense_bonus: 2,
            unique: true,
        },
    },
    ShopEntry {
        name: "Bomb",
        price: 20,
        stock: ShopStock::Consumable,
    },
];

pub fn buy(
    catalog: &[ShopEntry],
    index: usize,
    stats: &mut PlayerStats,
    inventory: &mut Inventory,
) -> Result<ItemId, ShopError> {
    let entry = catalog.get(index).ok_or(ShopError::UnknownEntry(index))?;
    let (purchased, leftover) = purchase_item(entry.price, stats.gold, 1);
    if purchased == 0 {
        return Err(ShopError::NotEnoughGold {
            price: entry.price,
            gold: stats.gold,
        });
    }
    let id = inventory.add(entry.to_item()?)?;
    stats.gold = leftover;
    Ok(id)
}

pub fn equip(inventory: &mut Inventory, id: ItemId) -> Result<&Weapon, InventoryError> {
    inventory.equip(id)?;
    inventory
        .equipped_weapon()
        .ok_or(InventoryError::UnknownItem(id.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rich() -> PlayerStats {
        PlayerStats {
            hp: 30,
            max_hp: 30,
            gold: 100,
            power: 5,
        }
    }

    #[test]
    fn purchase_item_buys_what_gold_allows() {
        assert_eq!(purchase_item(341, 2112, 1), (1, 1771));
        assert_eq!(purchase_item(123, 201, 3), (1, 78));
        assert_eq!(purchase_item(123, 500, 3), (3, 131));
        assert_eq!(purchase_item(0, 50, 2), (0, 50));
        assert_eq!(purchase_item(-4, 50, 2), (0, 50));
        assert_eq!(purchase_item(10, 5, 1), (0, 5));
    }

    #[test]
    fn rest_restores_and_charges_once() {
        let mut stats = rich();
        stats.hp = 4;
        assert_eq!(rest(&mut stats, 5), RestOutcome::Rested { paid: 5, hp: 30 });
        assert_eq!(stats.gold, 95);
        assert_eq!(rest(&mut stats, 5), RestOutcome::AlreadyFull);
        assert_eq!(stats.gold, 95);
    }

    #[test]
    fn rest_refused_without_gold() {
        let mut stats = rich();
        stats.hp = 10;
        stats.gold = 3;
        assert_eq!(rest(&mut stats, 5), RestOutcome::NotEnoughGold { cost: 5, gold: 3 });
        assert_eq!(stats.hp, 10);
        assert_eq!(stats.gold, 3);
    }

    #[test]
    fn every_catalog_entry_builds_a_valid_item() {
        for entry in SHOP_CATALOG {
            let item = entry.to_item().expect("valid catalog item");
            assert_eq!(item.name(), entry.name);
        }
    }

    #[test]
    fn buying_charges_gold_and_stores_item() {
        let mut stats = rich();
        let mut inventory = Inventory::new();
        let id = buy(SHOP_CATALOG, 0, &mut stats, &mut inventory).expect("buy sword");
        assert_eq!(stats.gold, 85);
        assert_eq!(inventory.get(id).map(Item::name), Some("Sword"));
        let weapon = equip(&mut inventory, id).expect("equip");
        assert_eq!(weapon.damage_bonus, 4);
    }

    #[test]
    fn unique_passive_can_only_be_bought_once() {
        let mut stats = rich();
        let mut inventory = Inventory::new();
        buy(SHOP_CATALOG, 2, &mut stats, &mut inventory).expect("first shield");
        let gold = stats.gold;
        let result = buy(SHOP_CATALOG, 2, &mut stats, &mut inventory);
        assert!(matches!(
            result,
            Err(ShopError::Inventory(InventoryError::DuplicateUnique(_)))
        ));
        assert_eq!(stats.gold, gold);
        assert_eq!(inventory.len(), 1);
    }

    #[test]
    fn shop_rejects_poor_players_and_bad_indices() {
        let mut stats = rich();
        stats.gold = 10;
        let mut inventory = Inventory::new();
        assert_eq!(
            buy(SHOP_CATALOG, 1, &mut stats, &mut inventory),
            Err(ShopError::NotEnoughGold { price: 30, gold: 10 })
        );
        assert_eq!(
            buy(SHOP_CATALOG, 99, &mut stats, &mut inventory),
            Err(ShopError::UnknownEntry(99))
        );
        assert!(inventory.is_empty());
    }

    #[test]
    fn equipping_a_consumable_fails() {
        let mut stats = rich();
        let mut inventory = Inventory::new();
        let bomb = buy(SHOP_CATALOG, 3, &mut stats, &mut inventory).expect("bomb");
        assert!(matches!(
            equip(&mut inventory, bomb),
            Err(InventoryError::NotAWeapon(_))
        ));
    }

    #[test]
    fn town_choice_accepts_numbers_and_words() {
        assert_eq!(TownChoice::parse("1"), Some(TownChoice::Explore));
        assert_eq!(TownChoice::parse(" Rest "), Some(TownChoice::Rest));
        assert_eq!(TownChoice::parse("q"), Some(TownChoice::Quit));
        assert_eq!(TownChoice::parse("7"), None);
    }
}
