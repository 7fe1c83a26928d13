use chrono::Utc;
use clap::Parser;
use grid_adventure::combat::{CombatInput, CombatSession};
use grid_adventure::constants::{GRID_SIZE, INN_COST};
use grid_adventure::engine::{MapEngine, MapSnapshot};
use grid_adventure::error::ShopError;
use grid_adventure::grid::{in_bounds, Direction, GridPos};
use grid_adventure::items::Inventory;
use grid_adventure::rng::Rng;
use grid_adventure::save_store::SaveGame;
use grid_adventure::town::{buy, equip, rest, SHOP_CATALOG};
use grid_adventure::types::{
    CombatAction, CombatEvent, CombatState, GameConfig, MapAction, MapEvent, MapInput, PlayerStats,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

const SWORD_ENTRY: usize = 0;
const BOMB_ENTRY: usize = 3;
const BOMB_RESERVE_GOLD: i32 = 40;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 3)]
    runs: u32,
    #[arg(long, default_value_t = 400)]
    max_turns: u32,
    #[arg(long, default_value_t = GRID_SIZE)]
    grid_size: i32,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum RunEnd {
    TurnLimit,
    PlayerDefeated,
    EngineError,
}

#[derive(Clone, Debug, Serialize)]
struct RunResultLine {
    seed: u32,
    #[serde(rename = "gridSize")]
    grid_size: i32,
    reason: RunEnd,
    turns: u64,
    inputs: u32,
    encounters: u32,
    victories: u32,
    flees: u32,
    #[serde(rename = "townVisits")]
    town_visits: u32,
    #[serde(rename = "blockedMoves")]
    blocked_moves: u32,
    #[serde(rename = "asteroidsDestroyed")]
    asteroids_destroyed: u32,
    repopulations: u32,
    #[serde(rename = "weaponsBroken")]
    weapons_broken: u32,
    #[serde(rename = "goldEarned")]
    gold_earned: i32,
    #[serde(rename = "finalHp")]
    final_hp: i32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    turn: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct RunOutcome {
    #[serde(flatten)]
    result: RunResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "runCount")]
    run_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageTurns")]
    average_turns: u64,
    #[serde(rename = "reasonCounts")]
    reason_counts: BTreeMap<String, usize>,
    runs: Vec<RunResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    turn: Option<u64>,
    details: Value,
}

fn main() {
    let cli = Cli::parse();
    let base_seed = normalize_seed(cli.seed.unwrap_or_else(now_ms));
    let runs = cli.runs.clamp(1, 1_000);
    let config = GameConfig::with_grid_size(cli.grid_size);
    let started_at_ms = now_ms();
    let run_id = default_run_id(base_seed, started_at_ms);
    let mut has_anomaly = false;
    let mut results = Vec::new();
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_turns = 0u64;
    let mut total_anomalies = 0usize;

    for idx in 0..runs {
        let seed = base_seed.wrapping_add(idx);
        emit_log(
            "info",
            "run_started",
            &run_id,
            Some(seed),
            None,
            json!({
                "gridSize": config.grid_size,
                "maxTurns": cli.max_turns,
            }),
        );
        let outcome = run_simulation(&config, seed, cli.max_turns);

        for anomaly in &outcome.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(seed),
                Some(anomaly.turn),
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !outcome.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += outcome.anomaly_records.len();
        total_turns += outcome.result.turns;
        *reason_counts
            .entry(run_end_key(outcome.result.reason))
            .or_insert(0) += 1;

        emit_log(
            "info",
            "run_finished",
            &run_id,
            Some(seed),
            Some(outcome.result.turns),
            json!({
                "reason": outcome.result.reason,
                "victories": outcome.result.victories,
                "finalHp": outcome.result.final_hp,
                "anomalyCount": outcome.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&outcome.result).expect("run result should serialize")
        );
        results.push(outcome.result);
    }

    let summary = build_run_summary(
        run_id.clone(),
        started_at_ms,
        now_ms(),
        results,
        reason_counts,
        total_anomalies,
        total_turns,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "simulation_finished",
        &run_id,
        None,
        None,
        json!({
            "runCount": summary.run_count,
            "anomalyCount": summary.anomaly_count,
            "averageTurns": summary.average_turns,
            "reasonCounts": summary.reason_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

#[derive(Default)]
struct Autopilot {
    seen: Vec<CombatEvent>,
}

impl CombatInput for Autopilot {
    fn choose_action(&mut self, session: &CombatSession<'_>) -> CombatAction {
        let stats = session.stats();
        if session.available_actions().contains(&CombatAction::UseConsumable)
            && session.monster().health > stats.hp
        {
            return CombatAction::UseConsumable;
        }
        if stats.hp * 3 < stats.max_hp {
            return CombatAction::Flee;
        }
        CombatAction::Attack
    }

    fn on_events(&mut self, events: &[CombatEvent]) {
        self.seen.extend_from_slice(events);
    }
}

#[derive(Default)]
struct Tally {
    inputs: u32,
    encounters: u32,
    victories: u32,
    flees: u32,
    town_visits: u32,
    blocked_moves: u32,
    asteroids_destroyed: u32,
    repopulations: u32,
    weapons_broken: u32,
    gold_earned: i32,
}

impl Tally {
    fn count_map_events(&mut self, events: &[MapEvent]) {
        for event in events {
            match event {
                MapEvent::MoveBlocked { .. } => self.blocked_moves += 1,
                MapEvent::AsteroidDestroyed { .. } => self.asteroids_destroyed += 1,
                MapEvent::MonstersRepopulated { .. } => self.repopulations += 1,
                _ => {}
            }
        }
    }

    fn count_combat_events(&mut self, events: &[CombatEvent]) {
        for event in events {
            match event {
                CombatEvent::Reward { gold, .. } => self.gold_earned += gold,
                CombatEvent::WeaponDiscarded { .. } => self.weapons_broken += 1,
                _ => {}
            }
        }
    }
}

struct AnomalyLog {
    anomalies: Vec<String>,
    records: Vec<AnomalyRecord>,
    seen: HashSet<String>,
}

impl AnomalyLog {
    fn new() -> Self {
        Self {
            anomalies: Vec::new(),
            records: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn push(&mut self, turn: u64, message: String) {
        push_anomaly(
            &mut self.anomalies,
            &mut self.records,
            &mut self.seen,
            turn,
            message,
        );
    }
}

fn run_simulation(config: &GameConfig, seed: u32, max_turns: u32) -> RunOutcome {
    let mut rng = Rng::new(seed);
    let mut pilot = Rng::new(seed ^ 0x9e37_79b9);
    let mut stats = PlayerStats::starting();
    let mut inventory = Inventory::new();
    let mut tally = Tally::default();
    let mut log = AnomalyLog::new();
    let mut last_turn = 0u64;

    let mut map = match MapEngine::new_game(config.clone(), &mut rng) {
        Ok(map) => map,
        Err(error) => {
            log.push(0, format!("new game failed: {error}"));
            return finish_run(config, seed, RunEnd::EngineError, 0, &stats, tally, log);
        }
    };
    map.drain_events();
    let mut reason = RunEnd::TurnLimit;

    while tally.inputs < max_turns {
        tally.inputs += 1;
        let direction = Direction::ALL[pilot.pick_index(Direction::ALL.len())];
        let action = match map.step(MapInput::Move(direction), &mut rng) {
            Ok(action) => action,
            Err(error) => {
                log.push(map.state().turn_count, format!("engine error: {error}"));
                reason = RunEnd::EngineError;
                break;
            }
        };

        match action {
            Some(MapAction::MonsterEncounter) => {
                tally.encounters += 1;
                let mut autopilot = Autopilot::default();
                match map.fight(stats, inventory.clone(), &mut autopilot, &mut rng) {
                    Ok(outcome) => {
                        tally.count_combat_events(&autopilot.seen);
                        stats = outcome.stats;
                        inventory = outcome.inventory;
                        match outcome.state {
                            CombatState::MonsterDefeated => tally.victories += 1,
                            CombatState::PlayerFled => tally.flees += 1,
                            CombatState::PlayerDefeated => reason = RunEnd::PlayerDefeated,
                            CombatState::Active => log.push(
                                map.state().turn_count,
                                "combat returned while still active".to_string(),
                            ),
                        }
                    }
                    Err(error) => {
                        log.push(map.state().turn_count, format!("fight failed: {error}"));
                        reason = RunEnd::EngineError;
                    }
                }
            }
            Some(MapAction::ReturnToTown) => {
                tally.town_visits += 1;
                for message in visit_town(&mut stats, &mut inventory) {
                    log.push(map.state().turn_count, message);
                }
            }
            Some(MapAction::Quit) | None => {}
        }
        tally.count_map_events(&map.drain_events());

        let snapshot = map.snapshot();
        for message in collect_snapshot_anomalies(&snapshot, config, &stats, last_turn) {
            log.push(snapshot.turn, message);
        }
        last_turn = snapshot.turn;
        if reason != RunEnd::TurnLimit {
            break;
        }
    }

    if let Some(message) = check_save_round_trip(config, &stats, &inventory, &map, seed) {
        log.push(last_turn, message);
    }
    finish_run(config, seed, reason, last_turn, &stats, tally, log)
}

fn finish_run(
    config: &GameConfig,
    seed: u32,
    reason: RunEnd,
    turns: u64,
    stats: &PlayerStats,
    tally: Tally,
    log: AnomalyLog,
) -> RunOutcome {
    RunOutcome {
        result: RunResultLine {
            seed,
            grid_size: config.grid_size,
            reason,
            turns,
            inputs: tally.inputs,
            encounters: tally.encounters,
            victories: tally.victories,
            flees: tally.flees,
            town_visits: tally.town_visits,
            blocked_moves: tally.blocked_moves,
            asteroids_destroyed: tally.asteroids_destroyed,
            repopulations: tally.repopulations,
            weapons_broken: tally.weapons_broken,
            gold_earned: tally.gold_earned,
            final_hp: stats.hp,
            anomalies: log.anomalies,
        },
        anomaly_records: log.records,
    }
}

fn visit_town(stats: &mut PlayerStats, inventory: &mut Inventory) -> Vec<String> {
    let mut problems = Vec::new();
    rest(stats, INN_COST);
    if inventory.equipped_weapon().is_none() {
        match buy(SHOP_CATALOG, SWORD_ENTRY, stats, inventory) {
            Ok(id) => {
                if let Err(error) = equip(inventory, id) {
                    problems.push(format!("bought weapon could not be equipped: {error}"));
                }
            }
            Err(ShopError::NotEnoughGold { .. }) => {}
            Err(error) => problems.push(format!("weapon purchase failed: {error}")),
        }
    }
    if inventory.first_consumable().is_none() && stats.gold >= BOMB_RESERVE_GOLD {
        if let Err(error) = buy(SHOP_CATALOG, BOMB_ENTRY, stats, inventory) {
            problems.push(format!("bomb purchase failed: {error}"));
        }
    }
    problems
}

fn check_save_round_trip(
    config: &GameConfig,
    stats: &PlayerStats,
    inventory: &Inventory,
    map: &MapEngine,
    seed: u32,
) -> Option<String> {
    let save = SaveGame::capture(stats, inventory, map.state());
    let text = match serde_json::to_string(&save) {
        Ok(text) => text,
        Err(error) => return Some(format!("save serialization failed: {error}")),
    };
    let parsed: SaveGame = match serde_json::from_str(&text) {
        Ok(parsed) => parsed,
        Err(error) => return Some(format!("save parse failed: {error}")),
    };
    let mut rng = Rng::new(seed);
    match parsed.restore(config, &mut rng) {
        Ok(loaded) if loaded.map.state().monsters != map.state().monsters => {
            Some("save round trip changed monsters".to_string())
        }
        Ok(loaded) if loaded.map.state().player_pos() != map.state().player_pos() => {
            Some("save round trip moved the player".to_string())
        }
        Ok(_) => None,
        Err(error) => Some(format!("save restore failed: {error}")),
    }
}

fn collect_snapshot_anomalies(
    snapshot: &MapSnapshot,
    config: &GameConfig,
    stats: &PlayerStats,
    last_turn: u64,
) -> Vec<String> {
    let mut anomalies = Vec::new();
    let grid_size = config.grid_size;
    if !in_bounds(snapshot.player, grid_size) {
        anomalies.push(format!("player out of bounds: {}", snapshot.player));
    }
    if snapshot.turn < last_turn {
        anomalies.push(format!("turn went backwards: {last_turn} -> {}", snapshot.turn));
    }
    if stats.hp > stats.max_hp {
        anomalies.push(format!("hp above max: {}/{}", stats.hp, stats.max_hp));
    }
    if stats.gold < 0 {
        anomalies.push(format!("negative gold: {}", stats.gold));
    }
    if snapshot.monsters.is_empty() {
        anomalies.push("no monsters left on the map".to_string());
    }
    if snapshot.asteroids.len() < config.asteroid_floor {
        anomalies.push(format!(
            "asteroid population below floor: {}",
            snapshot.asteroids.len()
        ));
    }

    for monster in &snapshot.monsters {
        let pos = GridPos::new(monster.x, monster.y);
        if !in_bounds(pos, grid_size) {
            anomalies.push(format!("monster out of bounds: {} at {pos}", monster.name));
        }
        if pos == snapshot.town {
            anomalies.push(format!("monster in town: {}", monster.name));
        }
        if monster.health <= 0 {
            anomalies.push(format!("defeated monster remains: {}", monster.name));
        }
    }

    for asteroid in &snapshot.asteroids {
        let pos = GridPos::new(asteroid.x, asteroid.y);
        if !in_bounds(pos, grid_size) {
            anomalies.push(format!("asteroid out of bounds at {pos}"));
        }
        if pos == snapshot.player {
            anomalies.push(format!("asteroid on player at {pos}"));
        }
        if pos == snapshot.town {
            anomalies.push("asteroid in town".to_string());
        }
        if (asteroid.dx, asteroid.dy) == (0, 0) {
            anomalies.push(format!("stationary asteroid at {pos}"));
        }
    }
    anomalies
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    turn: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        turn,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    runs: Vec<RunResultLine>,
    reason_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_turns: u64,
) -> RunSummary {
    let run_count = runs.len();
    let average_turns = if run_count == 0 {
        0
    } else {
        total_turns / run_count as u64
    };
    RunSummary {
        run_id,
        started_at_ms,
        finished_at_ms,
        run_count,
        anomaly_count,
        average_turns,
        reason_counts,
        runs,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    seed: Option<u32>,
    turn: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        seed,
        turn,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn run_end_key(reason: RunEnd) -> String {
    match reason {
        RunEnd::TurnLimit => "turn_limit",
        RunEnd::PlayerDefeated => "player_defeated",
        RunEnd::EngineError => "engine_error",
    }
    .to_string()
}

fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_result(reason: RunEnd, turns: u64) -> RunResultLine {
        RunResultLine {
            seed: 42,
            grid_size: 10,
            reason,
            turns,
            inputs: turns as u32,
            encounters: 0,
            victories: 0,
            flees: 0,
            town_visits: 0,
            blocked_moves: 0,
            asteroids_destroyed: 0,
            repopulations: 0,
            weapons_broken: 0,
            gold_earned: 0,
            final_hp: 30,
            anomalies: Vec::new(),
        }
    }

    #[test]
    fn default_run_id_contains_seed_and_timestamp() {
        assert_eq!(default_run_id(42, 123456789), "sim-42-123456789");
    }

    #[test]
    fn build_run_summary_calculates_average_turns() {
        let summary = build_run_summary(
            "sim-42-1".to_string(),
            1,
            2,
            vec![
                make_result(RunEnd::TurnLimit, 300),
                make_result(RunEnd::PlayerDefeated, 100),
            ],
            BTreeMap::from([
                ("turn_limit".to_string(), 1usize),
                ("player_defeated".to_string(), 1usize),
            ]),
            0,
            400,
        );
        assert_eq!(summary.average_turns, 200);
        assert_eq!(summary.run_count, 2);
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let target = std::env::temp_dir()
            .join(format!("grid-adventure-missing-{}", now_ms()))
            .join("summary.json");
        let summary = build_run_summary(
            "sim-1-1".to_string(),
            1,
            2,
            vec![make_result(RunEnd::TurnLimit, 10)],
            BTreeMap::from([("turn_limit".to_string(), 1usize)]),
            0,
            10,
        );
        assert!(write_summary(&target, &summary).is_err());
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(&mut anomalies, &mut records, &mut seen, 10, "same anomaly".to_string());
        push_anomaly(&mut anomalies, &mut records, &mut seen, 11, "same anomaly".to_string());

        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].turn, 10);
        assert_eq!(records[1].turn, 11);
    }

    #[test]
    fn simulated_runs_stay_consistent() {
        let config = GameConfig::default();
        for seed in [1u32, 7, 2024] {
            let outcome = run_simulation(&config, seed, 300);
            assert!(
                outcome.result.anomalies.is_empty(),
                "seed {seed}: {:?}",
                outcome.result.anomalies
            );
            assert_ne!(outcome.result.reason, RunEnd::EngineError);
            assert!(outcome.result.inputs > 0);
        }
    }

    #[test]
    fn simulation_is_deterministic_per_seed() {
        let config = GameConfig::with_grid_size(6);
        let a = run_simulation(&config, 55, 150);
        let b = run_simulation(&config, 55, 150);
        assert_eq!(
            serde_json::to_string(&a.result).expect("serialize"),
            serde_json::to_string(&b.result).expect("serialize")
        );
    }

    #[test]
    fn town_visit_buys_and_equips_a_weapon() {
        let mut stats = PlayerStats {
            hp: 10,
            max_hp: 30,
            gold: 60,
            power: 5,
        };
        let mut inventory = Inventory::new();
        assert!(visit_town(&mut stats, &mut inventory).is_empty());
        assert_eq!(stats.hp, 30);
        assert_eq!(inventory.equipped_weapon().map(|w| w.name.as_str()), Some("Sword"));
        // 40 left after inn and sword is enough for a bomb.
        assert_eq!(stats.gold, 60 - INN_COST - 15 - 20);
        let bomb = inventory.first_consumable().expect("bomb bought");
        assert_eq!(inventory.get(bomb).map(|item| item.name()), Some("Bomb"));
    }

    #[test]
    fn town_visit_keeps_gold_below_bomb_reserve() {
        let mut stats = PlayerStats {
            hp: 10,
            max_hp: 30,
            gold: 50,
            power: 5,
        };
        let mut inventory = Inventory::new();
        assert!(visit_town(&mut stats, &mut inventory).is_empty());
        assert_eq!(stats.gold, 50 - INN_COST - 15);
        assert!(inventory.equipped_weapon().is_some());
        assert!(inventory.first_consumable().is_none());
    }

    #[test]
    fn town_visit_without_gold_reports_nothing() {
        let mut stats = PlayerStats {
            hp: 10,
            max_hp: 30,
            gold: 3,
            power: 5,
        };
        let mut inventory = Inventory::new();
        assert!(visit_town(&mut stats, &mut inventory).is_empty());
        assert_eq!(stats.hp, 10);
        assert!(inventory.is_empty());
    }
}
