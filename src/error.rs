use thiserror::Error;

use crate::grid::GridPos;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("no free cell for {what} after {attempts} attempts")]
    SpawnExhausted { what: &'static str, attempts: u32 },

    #[error("position {pos} is outside a {grid_size}x{grid_size} grid")]
    OutOfBounds { pos: GridPos, grid_size: i32 },

    #[error("invalid {kind} record: {reason}")]
    InvalidRecord { kind: &'static str, reason: String },

    #[error("invalid item '{name}': {reason}")]
    InvalidItem { name: String, reason: String },

    #[error("no active encounter to resolve")]
    NoActiveEncounter,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error("no inventory item with id {0}")]
    UnknownItem(u32),

    #[error("'{0}' is not a weapon")]
    NotAWeapon(String),

    #[error("only one '{0}' can be owned")]
    DuplicateUnique(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CombatError {
    #[error("no consumable left to use")]
    NoConsumable,

    #[error("combat is already over")]
    AlreadyFinished,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShopError {
    #[error("no shop entry at index {0}")]
    UnknownEntry(usize),

    #[error("need {price} gold but only have {gold}")]
    NotEnoughGold { price: i32, gold: i32 },

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("catalog entry is malformed: {0}")]
    Catalog(#[from] EngineError),
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("save file not found")]
    NotFound,

    #[error("unsupported save version {found} (expected {expected})")]
    UnsupportedVersion { expected: u8, found: u8 },

    #[error("save contents rejected: {0}")]
    Invalid(#[from] EngineError),
}
