//! Uniform-grid broad phase.

use indexmap::IndexMap;
use smallvec::SmallVec;
use tandem_core::{EntityId, Fixed};

use crate::aabb::Aabb;
use crate::error::SpaceError;

/// Integer grid cell coordinate.
pub type CellKey = (i32, i32);

/// A uniform grid mapping cells to the bodies whose boxes touch them.
///
/// Each inserted box is bucketed into every cell its bounds cover,
/// boundaries included, so queries may return false positives but never
/// miss a true overlap. Query results are sorted by id and deduplicated,
/// which makes them independent of insertion order.
///
/// # Examples
///
/// ```
/// use tandem_core::{EntityId, Fixed, Vec2};
/// use tandem_space::{Aabb, SpatialHash};
///
/// let mut hash = SpatialHash::new(Fixed::from_int(16)).unwrap();
/// hash.insert(EntityId(2), Aabb::new(Vec2::from_ints(0, 0), Vec2::from_ints(4, 4)));
/// hash.insert(EntityId(1), Aabb::new(Vec2::from_ints(40, 40), Vec2::from_ints(44, 44)));
///
/// let near_origin = Aabb::new(Vec2::from_ints(-2, -2), Vec2::from_ints(2, 2));
/// assert_eq!(hash.query(&near_origin), vec![EntityId(2)]);
/// ```
#[derive(Clone, Debug)]
pub struct SpatialHash {
    cell_size: Fixed,
    cells: IndexMap<CellKey, SmallVec<[EntityId; 4]>>,
    entries: IndexMap<EntityId, SmallVec<[CellKey; 4]>>,
}

impl SpatialHash {
    /// Create an empty hash with square cells of side `cell_size`.
    ///
    /// Returns [`SpaceError::InvalidCellSize`] if `cell_size <= 0`.
    pub fn new(cell_size: Fixed) -> Result<Self, SpaceError> {
        if cell_size <= Fixed::ZERO {
            return Err(SpaceError::InvalidCellSize { cell_size });
        }
        Ok(Self {
            cell_size,
            cells: IndexMap::new(),
            entries: IndexMap::new(),
        })
    }

    /// Side length of each cell.
    pub fn cell_size(&self) -> Fixed {
        self.cell_size
    }

    /// Number of bodies currently indexed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no bodies are indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of non-empty cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Whether `id` is indexed.
    pub fn contains(&self, id: EntityId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Index `id` under `bounds`, replacing any previous entry for `id`.
    pub fn insert(&mut self, id: EntityId, bounds: Aabb) {
        self.remove(id);
        let keys = self.cells_for(&bounds);
        for &key in &keys {
            self.cells.entry(key).or_default().push(id);
        }
        self.entries.insert(id, keys);
    }

    /// Remove every bucket entry for `id`. Returns whether it was present.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(keys) = self.entries.swap_remove(&id) else {
            return false;
        };
        for key in keys {
            if let Some(bucket) = self.cells.get_mut(&key) {
                bucket.retain(|e| *e != id);
                if bucket.is_empty() {
                    self.cells.swap_remove(&key);
                }
            }
        }
        true
    }

    /// Drop all entries. Cell size is retained.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.entries.clear();
    }

    /// Candidate ids whose cells intersect `region`, ascending and unique.
    pub fn query(&self, region: &Aabb) -> Vec<EntityId> {
        let mut out = Vec::new();
        self.query_into(region, &mut out);
        out
    }

    /// Like [`query`](Self::query) but writes into `out`, clearing it first.
    pub fn query_into(&self, region: &Aabb, out: &mut Vec<EntityId>) {
        out.clear();
        let ((x0, y0), (x1, y1)) = self.cell_range(region);
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                if let Some(bucket) = self.cells.get(&(cx, cy)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
    }

    fn cell_of(&self, v: Fixed) -> i32 {
        v.raw().div_euclid(self.cell_size.raw())
    }

    fn cell_range(&self, bounds: &Aabb) -> (CellKey, CellKey) {
        (
            (self.cell_of(bounds.min.x), self.cell_of(bounds.min.y)),
            (self.cell_of(bounds.max.x), self.cell_of(bounds.max.y)),
        )
    }

    fn cells_for(&self, bounds: &Aabb) -> SmallVec<[CellKey; 4]> {
        let ((x0, y0), (x1, y1)) = self.cell_range(bounds);
        let mut keys = SmallVec::new();
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                keys.push((cx, cy));
            }
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tandem_core::Vec2;

    fn boxi(x0: i32, y0: i32, x1: i32, y1: i32) -> Aabb {
        Aabb::new(Vec2::from_ints(x0, y0), Vec2::from_ints(x1, y1))
    }

    fn hash() -> SpatialHash {
        SpatialHash::new(Fixed::from_int(10)).unwrap()
    }

    #[test]
    fn rejects_non_positive_cell_size() {
        assert!(SpatialHash::new(Fixed::ZERO).is_err());
        assert!(SpatialHash::new(Fixed::from_int(-1)).is_err());
    }

    #[test]
    fn box_spanning_cells_is_bucketed_in_each() {
        let mut h = hash();
        h.insert(EntityId(1), boxi(5, 5, 15, 15));
        assert_eq!(h.cell_count(), 4);
        assert_eq!(h.query(&boxi(12, 12, 13, 13)), vec![EntityId(1)]);
        assert_eq!(h.query(&boxi(1, 1, 2, 2)), vec![EntityId(1)]);
    }

    #[test]
    fn negative_coordinates_use_floor_cells() {
        let mut h = hash();
        h.insert(EntityId(1), boxi(-3, -3, -1, -1));
        assert!(h.query(&boxi(1, 1, 2, 2)).is_empty());
        assert_eq!(h.query(&boxi(-9, -9, -8, -8)), vec![EntityId(1)]);
    }

    #[test]
    fn remove_and_reinsert() {
        let mut h = hash();
        h.insert(EntityId(1), boxi(0, 0, 1, 1));
        h.insert(EntityId(1), boxi(50, 50, 51, 51));
        assert!(h.query(&boxi(0, 0, 1, 1)).is_empty());
        assert_eq!(h.len(), 1);
        assert!(h.remove(EntityId(1)));
        assert!(!h.remove(EntityId(1)));
        assert!(h.is_empty());
        assert_eq!(h.cell_count(), 0);
    }

    #[test]
    fn clear_keeps_cell_size() {
        let mut h = hash();
        h.insert(EntityId(1), boxi(0, 0, 1, 1));
        h.clear();
        assert!(h.is_empty());
        assert_eq!(h.cell_size(), Fixed::from_int(10));
    }

    #[test]
    fn query_is_sorted_and_unique() {
        let mut h = hash();
        for id in [5, 3, 9, 1] {
            h.insert(EntityId(id), boxi(0, 0, 25, 25));
        }
        assert_eq!(
            h.query(&boxi(0, 0, 30, 30)),
            vec![EntityId(1), EntityId(3), EntityId(5), EntityId(9)]
        );
    }

    proptest! {
        #[test]
        fn never_misses_a_true_overlap(
            boxes in prop::collection::vec((-200i32..200, -200i32..200, 1i32..60, 1i32..60), 1..24),
            q in (-200i32..200, -200i32..200, 1i32..60, 1i32..60),
        ) {
            let mut h = SpatialHash::new(Fixed::from_int(16)).unwrap();
            let mut all = Vec::new();
            for (i, (x, y, w, hgt)) in boxes.into_iter().enumerate() {
                let b = boxi(x, y, x + w, y + hgt);
                let id = EntityId(i as u32 + 1);
                h.insert(id, b);
                all.push((id, b));
            }
            let region = boxi(q.0, q.1, q.0 + q.2, q.1 + q.3);
            let candidates = h.query(&region);
            for (id, b) in all {
                if b.overlaps(&region) {
                    prop_assert!(candidates.contains(&id));
                }
            }
        }
    }
}
