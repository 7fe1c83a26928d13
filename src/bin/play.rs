use grid_adventure::combat::{CombatInput, CombatSession};
use grid_adventure::constants::INN_COST;
use grid_adventure::engine::{MapDriver, MapEngine, MapState};
use grid_adventure::error::{CombatError, SaveError};
use grid_adventure::grid::Direction;
use grid_adventure::items::{Inventory, Item};
use grid_adventure::render::{render_map, SpriteRegistry};
use grid_adventure::rng::Rng;
use grid_adventure::save_store::{SaveGame, SaveStore};
use grid_adventure::town::{buy, equip, rest, RestOutcome, TownChoice, SHOP_CATALOG};
use grid_adventure::types::{
    CombatAction, CombatEvent, CombatState, GameConfig, MapAction, MapEvent, MapInput, PlayerStats,
};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

struct Game {
    config: GameConfig,
    stats: PlayerStats,
    inventory: Inventory,
    map: MapEngine,
}

enum Exploration {
    BackInTown,
    Quit,
    GameOver,
}

fn main() {
    let save_path = env::var("SAVE_PATH").unwrap_or_else(|_| ".data/save.json".to_string());
    let sprites_path =
        env::var("SPRITES_PATH").unwrap_or_else(|_| "assets/sprites.json".to_string());
    let mut rng = match env::var("SEED").ok().and_then(|raw| raw.parse::<u32>().ok()) {
        Some(seed) => Rng::new(seed),
        None => Rng::from_entropy(),
    };

    let store = SaveStore::new(PathBuf::from(save_path));
    let sprites = SpriteRegistry::load(&PathBuf::from(sprites_path));
    let config = GameConfig::default();

    let mut game = match load_or_start(&store, &config, &mut rng) {
        Ok(game) => game,
        Err(error) => {
            eprintln!("cannot start a new game: {error}");
            std::process::exit(1);
        }
    };

    println!("Welcome to town.");
    loop {
        print_status(&game.stats, &game.inventory);
        for (idx, (_, label)) in TownChoice::MENU.iter().enumerate() {
            println!("  {}) {label}", idx + 1);
        }
        let Some(line) = prompt("Choose an option: ") else {
            return;
        };
        let Some(choice) = TownChoice::parse(&line) else {
            println!("Invalid choice. Enter a number from 1 to 6.");
            continue;
        };

        match choice {
            TownChoice::Explore => match explore(&mut game, &sprites, &mut rng) {
                Exploration::BackInTown => println!("You return to town."),
                Exploration::Quit => return,
                Exploration::GameOver => {
                    println!("You have been defeated. Game over.");
                    return;
                }
            },
            TownChoice::Rest => match rest(&mut game.stats, INN_COST) {
                RestOutcome::Rested { paid, hp } => {
                    println!("You sleep and feel better. HP restored to {hp} for {paid} gold.")
                }
                RestOutcome::AlreadyFull => println!("You are already at full health."),
                RestOutcome::NotEnoughGold { cost, gold } => {
                    println!("You need {cost} gold to sleep, but you only have {gold}.")
                }
            },
            TownChoice::Shop => visit_shop(&mut game),
            TownChoice::Equip => choose_weapon(&mut game.inventory),
            TownChoice::Save => {
                let save = SaveGame::capture(&game.stats, &game.inventory, game.map.state());
                match store.save(&save) {
                    Ok(()) => println!("Game saved to {}.", store.path().display()),
                    Err(error) => println!("Could not save: {error}"),
                }
            }
            TownChoice::Quit => return,
        }
    }
}

fn load_or_start(
    store: &SaveStore,
    config: &GameConfig,
    rng: &mut Rng,
) -> Result<Game, grid_adventure::error::EngineError> {
    match store.load().and_then(|save| save.restore(config, rng)) {
        Ok(loaded) => {
            println!("Loaded save from {}.", store.path().display());
            return Ok(Game {
                config: config.clone(),
                stats: loaded.stats,
                inventory: loaded.inventory,
                map: loaded.map,
            });
        }
        Err(SaveError::NotFound) => {}
        Err(error) => println!("Save could not be loaded ({error}); starting a new game."),
    }
    Ok(Game {
        config: config.clone(),
        stats: PlayerStats::starting(),
        inventory: Inventory::new(),
        map: MapEngine::new_game(config.clone(), rng)?,
    })
}

fn explore(game: &mut Game, sprites: &SpriteRegistry, rng: &mut Rng) -> Exploration {
    let mut driver = TerminalMap {
        sprites,
        grid_size: game.config.grid_size,
    };
    loop {
        let action = match game.map.run(&mut driver, rng) {
            Ok(action) => action,
            Err(error) => {
                eprintln!("map simulation failed: {error}");
                return Exploration::Quit;
            }
        };
        match action {
            MapAction::Quit => return Exploration::Quit,
            MapAction::ReturnToTown => return Exploration::BackInTown,
            MapAction::MonsterEncounter => {
                if let Some(monster) = game.map.encountered_monster() {
                    println!("A wild {} appears! {}", monster.name, monster.description);
                }
                let outcome = match game.map.fight(
                    game.stats,
                    game.inventory.clone(),
                    &mut TerminalCombat,
                    rng,
                ) {
                    Ok(outcome) => outcome,
                    Err(error) => {
                        eprintln!("combat could not start: {error}");
                        return Exploration::Quit;
                    }
                };
                game.stats = outcome.stats;
                game.inventory = outcome.inventory;
                match outcome.state {
                    CombatState::PlayerDefeated => return Exploration::GameOver,
                    CombatState::PlayerFled => println!("You escaped."),
                    _ => println!("Victory!"),
                }
            }
        }
    }
}

struct TerminalMap<'a> {
    sprites: &'a SpriteRegistry,
    grid_size: i32,
}

impl MapDriver for TerminalMap<'_> {
    fn poll_input(&mut self, _state: &MapState) -> MapInput {
        loop {
            let Some(line) = prompt("Move (w/a/s/d, q to quit): ") else {
                return MapInput::Quit;
            };
            if line.trim().eq_ignore_ascii_case("q") {
                return MapInput::Quit;
            }
            match Direction::parse_move(&line) {
                Some(direction) => return MapInput::Move(direction),
                None => println!("Unknown move '{}'.", line.trim()),
            }
        }
    }

    fn render(&mut self, state: &MapState, events: &[MapEvent]) {
        for event in events {
            match event {
                MapEvent::MoveBlocked { .. } => println!("An asteroid blocks the way."),
                MapEvent::AsteroidDestroyed { .. } => println!("An asteroid drifts out of sight."),
                MapEvent::MonstersRepopulated { count } => {
                    println!("{count} new monsters roam the land.")
                }
                MapEvent::ReturnedToTown => println!("The town gates are ahead."),
                _ => {}
            }
        }
        for row in render_map(state, self.grid_size, self.sprites, true) {
            println!("{row}");
        }
        println!("turn {}", state.turn_count);
    }
}

struct TerminalCombat;

impl CombatInput for TerminalCombat {
    fn choose_action(&mut self, session: &CombatSession<'_>) -> CombatAction {
        let monster = session.monster();
        println!(
            "You: {}/{} HP | {}: {}/{} HP",
            session.stats().hp,
            session.stats().max_hp,
            monster.name,
            monster.health,
            monster.max_health
        );
        let actions = session.available_actions();
        println!("  1) Attack");
        println!("  2) Flee");
        if actions.contains(&CombatAction::UseConsumable) {
            println!("  3) Use item");
        }
        loop {
            let Some(line) = prompt("Action: ") else {
                return CombatAction::Flee;
            };
            match CombatAction::parse(&line) {
                Some(action) if actions.contains(&action) => return action,
                _ => println!("Invalid action."),
            }
        }
    }

    fn on_events(&mut self, events: &[CombatEvent]) {
        for event in events {
            println!("{}", describe_combat_event(event));
        }
    }

    fn on_rejected(&mut self, error: &CombatError) {
        println!("{error}");
    }
}

fn describe_combat_event(event: &CombatEvent) -> String {
    match event {
        CombatEvent::PlayerHit {
            damage,
            critical,
            monster_hp,
        } => {
            let crit = if *critical { " Critical hit!" } else { "" };
            format!("You deal {damage} damage.{crit} Monster HP: {monster_hp}")
        }
        CombatEvent::PlayerMissed => "You miss.".to_string(),
        CombatEvent::WeaponNonFunctional { name } => format!("Your {name} breaks!"),
        CombatEvent::MonsterHit {
            damage,
            blocked,
            critical,
            player_hp,
            ..
        } => {
            let crit = if *critical { " Critical hit!" } else { "" };
            format!("The monster hits for {damage} ({blocked} blocked).{crit} Your HP: {player_hp}")
        }
        CombatEvent::MonsterMissed => "The monster misses.".to_string(),
        CombatEvent::FleeSucceeded => "You got away.".to_string(),
        CombatEvent::FleeFailed { damage, player_hp } => {
            format!("You fail to flee and take {damage} damage. Your HP: {player_hp}")
        }
        CombatEvent::ConsumableUsed { name } => format!("You use the {name}."),
        CombatEvent::Reward { gold, total } => format!("You loot {gold} gold ({total} total)."),
        CombatEvent::PlayerDefeated => "You collapse.".to_string(),
        CombatEvent::WeaponDiscarded { name } => format!("You throw away the broken {name}."),
    }
}

fn visit_shop(game: &mut Game) {
    println!("Gold: {}", game.stats.gold);
    for (idx, entry) in SHOP_CATALOG.iter().enumerate() {
        println!(
            "  {}) {:<12}{:>5}g  {}",
            idx + 1,
            entry.name,
            entry.price,
            entry.describe()
        );
    }
    let Some(line) = prompt("Buy which item (blank to leave): ") else {
        return;
    };
    if line.trim().is_empty() {
        return;
    }
    let Some(index) = line.trim().parse::<usize>().ok().and_then(|n| n.checked_sub(1)) else {
        println!("Invalid choice.");
        return;
    };
    match buy(SHOP_CATALOG, index, &mut game.stats, &mut game.inventory) {
        Ok(id) => {
            let name = game.inventory.get(id).map(Item::name).unwrap_or("item");
            println!("Bought {name}. {} gold left.", game.stats.gold);
        }
        Err(error) => println!("{error}"),
    }
}

fn choose_weapon(inventory: &mut Inventory) {
    let weapons = inventory.weapon_ids();
    if weapons.is_empty() {
        println!("You have no weapons.");
        return;
    }
    for (idx, id) in weapons.iter().enumerate() {
        if let Some(Item::Weapon(weapon)) = inventory.get(*id) {
            let marker = if inventory.equipped_id() == Some(*id) { " (equipped)" } else { "" };
            println!(
                "  {}) {} +{} [{}/{}]{marker}",
                idx + 1,
                weapon.name,
                weapon.damage_bonus,
                weapon.current_durability,
                weapon.max_durability
            );
        }
    }
    let Some(line) = prompt("Equip which weapon: ") else {
        return;
    };
    let picked = line
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|idx| weapons.get(idx).copied());
    match picked.map(|id| equip(inventory, id)) {
        Some(Ok(weapon)) => println!("You equip the {}.", weapon.name),
        Some(Err(error)) => println!("{error}"),
        None => println!("Invalid choice."),
    }
}

fn print_status(stats: &PlayerStats, inventory: &Inventory) {
    let weapon = inventory
        .equipped_weapon()
        .map(|w| w.name.as_str())
        .unwrap_or("bare hands");
    println!(
        "HP {}/{} | Gold {} | Power {} | Weapon: {weapon} | Defense {}",
        stats.hp,
        stats.max_hp,
        stats.gold,
        stats.power,
        inventory.total_defense()
    );
}

fn prompt(label: &str) -> Option<String> {
    print!("{label}");
    let _ = io::stdout().flush();
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line),
    }
}
