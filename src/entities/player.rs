use crate::error::EngineError;
use crate::grid::{in_bounds, is_occupied, Direction, GridPos, OccupiedSet};
use crate::rng::Rng;

use super::MobileEntity;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pos: GridPos,
}

pub struct PlayerStep<'a> {
    pub direction: Direction,
    pub blocked: &'a OccupiedSet,
    pub grid_size: i32,
}

impl Player {
    pub fn new(pos: GridPos) -> Self {
        Self { pos }
    }

    pub fn destination(&self, step: &PlayerStep<'_>) -> Option<GridPos> {
        let (dx, dy) = step.direction.delta();
        let next = self.pos.offset(dx, dy);
        if !in_bounds(next, step.grid_size) || is_occupied(next, step.blocked) {
            return None;
        }
        Some(next)
    }

    pub(crate) fn place(&mut self, pos: GridPos) {
        self.pos = pos;
    }
}

impl MobileEntity for Player {
    type Context<'a> = PlayerStep<'a>;
    type Record = GridPos;

    fn position(&self) -> GridPos {
        self.pos
    }

    fn advance(&mut self, ctx: PlayerStep<'_>, _rng: &mut Rng) -> GridPos {
        if let Some(next) = self.destination(&ctx) {
            self.pos = next;
        }
        self.pos
    }

    fn to_record(&self) -> GridPos {
        self.pos
    }

    fn from_record(record: GridPos, grid_size: i32) -> Result<Self, EngineError> {
        if !in_bounds(record, grid_size) {
            return Err(EngineError::OutOfBounds {
                pos: record,
                grid_size,
            });
        }
        Ok(Self::new(record))
    }
}
