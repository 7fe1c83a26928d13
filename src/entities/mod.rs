mod asteroid;
mod monster;
mod player;

pub use self::asteroid::{Asteroid, AsteroidRecord, AsteroidStep};
pub use self::monster::{MonsterRecord, MonsterStep, WanderingMonster};
pub use self::player::{Player, PlayerStep};

use crate::error::EngineError;
use crate::grid::GridPos;
use crate::rng::Rng;

pub trait MobileEntity: Sized {
    type Context<'a>;
    type Record;

    fn position(&self) -> GridPos;

    fn advance(&mut self, ctx: Self::Context<'_>, rng: &mut Rng) -> GridPos;

    fn to_record(&self) -> Self::Record;

    fn from_record(record: Self::Record, grid_size: i32) -> Result<Self, EngineError>;
}
