use crate::entities::WanderingMonster;
use crate::error::CombatError;
use crate::items::{Inventory, Item, Weapon};
use crate::rng::Rng;
use crate::types::{CombatAction, CombatEvent, CombatModifiers, CombatState, GameConfig, PlayerStats};

pub trait CombatInput {
    fn choose_action(&mut self, session: &CombatSession<'_>) -> CombatAction;

    fn on_events(&mut self, _events: &[CombatEvent]) {}

    fn on_rejected(&mut self, _error: &CombatError) {}
}

#[derive(Clone, Debug)]
pub struct CombatOutcome {
    pub stats: PlayerStats,
    pub inventory: Inventory,
    pub equipped: Option<Weapon>,
    pub state: CombatState,
    pub won: bool,
    pub turns: u32,
    pub events: Vec<CombatEvent>,
}

pub struct CombatSession<'a> {
    config: &'a GameConfig,
    stats: PlayerStats,
    inventory: Inventory,
    monster: &'a mut WanderingMonster,
    state: CombatState,
    events: Vec<CombatEvent>,
    turns: u32,
}

impl<'a> CombatSession<'a> {
    pub fn new(
        config: &'a GameConfig,
        stats: PlayerStats,
        inventory: Inventory,
        monster: &'a mut WanderingMonster,
    ) -> Self {
        Self {
            config,
            stats,
            inventory,
            monster,
            state: CombatState::Active,
            events: Vec::new(),
            turns: 0,
        }
    }

    pub fn state(&self) -> CombatState {
        self.state
    }

    pub fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn monster(&self) -> &WanderingMonster {
        &*self.monster
    }

    pub fn turns(&self) -> u32 {
        self.turns
    }

    pub fn available_actions(&self) -> Vec<CombatAction> {
        let mut actions = vec![CombatAction::Attack, CombatAction::Flee];
        if self.inventory.first_consumable().is_some() {
            actions.push(CombatAction::UseConsumable);
        }
        actions
    }

    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn take_turn(
        &mut self,
        action: CombatAction,
        rng: &mut Rng,
    ) -> Result<CombatState, CombatError> {
        if self.state.is_terminal() {
            return Err(CombatError::AlreadyFinished);
        }
        match action {
            CombatAction::Attack => self.player_attack(rng),
            CombatAction::Flee => self.flee(rng),
            CombatAction::UseConsumable => self.use_consumable()?,
        }
        self.turns += 1;
        self.settle();
        Ok(self.state)
    }

    pub fn finish(mut self) -> CombatOutcome {
        for name in self.inventory.discard_broken_weapons() {
            self.events.push(CombatEvent::WeaponDiscarded { name });
        }
        let equipped = self.inventory.equipped_weapon().cloned();
        CombatOutcome {
            stats: self.stats,
            inventory: self.inventory,
            equipped,
            state: self.state,
            won: self.state == CombatState::MonsterDefeated,
            turns: self.turns,
            events: self.events,
        }
    }

    fn player_attack(&mut self, rng: &mut Rng) {
        let (bonus, modifiers) = match self.inventory.equipped_weapon_mut() {
            Some(weapon) if weapon.is_functional() => {
                let used = (weapon.damage_bonus, weapon.modifiers(self.config.unarmed));
                weapon.current_durability -= 1;
                if !weapon.is_functional() {
                    self.events.push(CombatEvent::WeaponNonFunctional {
                        name: weapon.name.clone(),
                    });
                }
                used
            }
            _ => (0, self.config.unarmed),
        };

        let base = self.stats.power + bonus;
        match roll_damage(base, modifiers, rng) {
            None => self.events.push(CombatEvent::PlayerMissed),
            Some((damage, critical)) => {
                self.monster.health -= damage;
                self.events.push(CombatEvent::PlayerHit {
                    damage,
                    critical,
                    monster_hp: self.monster.health,
                });
            }
        }

        if self.monster.health > 0 {
            self.monster_attack(rng);
        }
    }

    fn monster_attack(&mut self, rng: &mut Rng) {
        let Some((raw, critical)) = roll_damage(self.monster.power, self.monster.modifiers, rng) else {
            self.events.push(CombatEvent::MonsterMissed);
            return;
        };
        let defense = self.inventory.total_defense();
        let damage = (raw - defense).max(0);
        self.stats.hp -= damage;
        self.events.push(CombatEvent::MonsterHit {
            raw,
            blocked: raw - damage,
            damage,
            critical,
            player_hp: self.stats.hp,
        });
    }

    fn flee(&mut self, rng: &mut Rng) {
        if rng.int(0, 99) <= self.config.flee_success_max_roll {
            self.state = CombatState::PlayerFled;
            self.events.push(CombatEvent::FleeSucceeded);
            return;
        }
        let damage = (self.monster.power - self.inventory.total_defense()).max(0);
        self.stats.hp -= damage;
        self.events.push(CombatEvent::FleeFailed {
            damage,
            player_hp: self.stats.hp,
        });
    }

    fn use_consumable(&mut self) -> Result<(), CombatError> {
        let id = self
            .inventory
            .first_consumable()
            .ok_or(CombatError::NoConsumable)?;
        let item = self
            .inventory
            .remove(id)
            .map_err(|_| CombatError::NoConsumable)?;
        if let Item::Consumable(consumable) = item {
            self.events.push(CombatEvent::ConsumableUsed {
                name: consumable.name,
            });
        }
        self.monster.health = 0;
        Ok(())
    }

    fn settle(&mut self) {
        if self.stats.hp <= 0 {
            self.state = CombatState::PlayerDefeated;
            self.events.push(CombatEvent::PlayerDefeated);
        } else if self.monster.health <= 0 {
            self.state = CombatState::MonsterDefeated;
            self.stats.gold += self.monster.money;
            self.events.push(CombatEvent::Reward {
                gold: self.monster.money,
                total: self.stats.gold,
            });
        }
    }
}

// Miss draw first; only a hit consumes the crit draw. `None` is a miss.
fn roll_damage(base: i32, modifiers: CombatModifiers, rng: &mut Rng) -> Option<(i32, bool)> {
    if rng.chance(modifiers.miss_chance) {
        return None;
    }
    if rng.chance(modifiers.crit_chance) {
        let damage = (base as f32 * modifiers.crit_multiplier).floor() as i32;
        return Some((damage, true));
    }
    Some((base, false))
}

pub fn run_combat(
    config: &GameConfig,
    stats: PlayerStats,
    inventory: Inventory,
    monster: &mut WanderingMonster,
    input: &mut impl CombatInput,
    rng: &mut Rng,
) -> CombatOutcome {
    let mut session = CombatSession::new(config, stats, inventory, monster);
    while !session.state().is_terminal() {
        let action = input.choose_action(&session);
        match session.take_turn(action, rng) {
            Ok(_) => {
                let events = session.drain_events();
                input.on_events(&events);
            }
            Err(error) => input.on_rejected(&error),
        }
    }
    let outcome = session.finish();
    if !outcome.events.is_empty() {
        input.on_events(&outcome.events);
    }
    outcome
}
