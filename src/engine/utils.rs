use crate::entities::MobileEntity;
use crate::grid::OccupiedSet;

pub(super) fn cells_of<E: MobileEntity>(entities: &[E]) -> OccupiedSet {
    entities.iter().map(MobileEntity::position).collect()
}
