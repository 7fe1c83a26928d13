use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::grid::{in_bounds, GridPos, OccupiedSet};
use crate::rng::Rng;

use super::MobileEntity;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Asteroid {
    pos: GridPos,
    dx: i32,
    dy: i32,
    grid_size: i32,
}

pub struct AsteroidStep<'a> {
    pub avoid: &'a OccupiedSet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsteroidRecord {
    pub x: i32,
    pub y: i32,
    pub dx: i32,
    pub dy: i32,
}

impl Asteroid {
    pub fn new(pos: GridPos, dx: i32, dy: i32, grid_size: i32) -> Self {
        let (dx, dy) = match (dx.signum(), dy.signum()) {
            (0, 0) => (1, 1),
            other => other,
        };
        Self {
            pos,
            dx,
            dy,
            grid_size,
        }
    }

    pub fn velocity(&self) -> (i32, i32) {
        (self.dx, self.dy)
    }

    pub fn is_out_of_bounds(&self) -> bool {
        !in_bounds(self.pos, self.grid_size)
    }
}

impl MobileEntity for Asteroid {
    type Context<'a> = AsteroidStep<'a>;
    type Record = AsteroidRecord;

    fn position(&self) -> GridPos {
        self.pos
    }

    // Straight-line drift with wall reflection. Grid bounds are not walls:
    // an asteroid drifting off the edge leaves the map.
    fn advance(&mut self, ctx: AsteroidStep<'_>, rng: &mut Rng) -> GridPos {
        let avoid = ctx.avoid;
        let mut next = self.pos.offset(self.dx, self.dy);

        if avoid.contains(&next) {
            let hit_x_wall = avoid.contains(&self.pos.offset(self.dx, 0));
            let hit_y_wall = avoid.contains(&self.pos.offset(0, self.dy));
            if hit_x_wall {
                self.dx = -self.dx;
                if self.dy == 0 {
                    self.dy = rng.sign();
                }
            }
            if hit_y_wall {
                self.dy = -self.dy;
                if self.dx == 0 {
                    self.dx = rng.sign();
                }
            }
            if !hit_x_wall && !hit_y_wall {
                // corner bounce: only the diagonal target was taken
                self.dx = -self.dx;
                self.dy = -self.dy;
                next = self.pos.offset(self.dx, self.dy);
            }
        }

        if !avoid.contains(&next) {
            self.pos = next;
        }
        self.pos
    }

    fn to_record(&self) -> AsteroidRecord {
        AsteroidRecord {
            x: self.pos.x,
            y: self.pos.y,
            dx: self.dx,
            dy: self.dy,
        }
    }

    fn from_record(record: AsteroidRecord, grid_size: i32) -> Result<Self, EngineError> {
        let valid_axis = |v: i32| (-1..=1).contains(&v);
        if !valid_axis(record.dx) || !valid_axis(record.dy) || (record.dx, record.dy) == (0, 0) {
            return Err(EngineError::InvalidRecord {
                kind: "asteroid",
                reason: format!("velocity ({}, {}) is not a unit step", record.dx, record.dy),
            });
        }
        let pos = GridPos::new(record.x, record.y);
        if !in_bounds(pos, grid_size) {
            return Err(EngineError::OutOfBounds { pos, grid_size });
        }
        Ok(Self::new(pos, record.dx, record.dy, grid_size))
    }
}
