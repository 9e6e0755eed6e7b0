// Sparse farm grid: cell key -> resource code.
//
// The grid is a square of `width x width` cells. Only cells holding a
// resource have an entry; absence means empty, tillable ground. Keys are
// `x * width + y`, so the width is fixed at construction and never changes.
//
// Claiming a cell removes its entry. The assignment phase claims in the
// same logical step as it decides, so two agents are never routed to the
// same resource. Claims are idempotent: a second claim is a no-op that
// returns `None`, which is how the deferred commit detects a lost race.
//
// `search()` is the ring search: rings of increasing Chebyshev radius
// around the origin cell, each scanned row-major (y ascending, then x
// ascending), first match wins. Ties within a ring go to scan order, not
// to Euclidean distance. Cost is bounded by `(2 * radius + 1)^2` lookups.
//
// Out-of-range coordinates at the hash boundary are a programming error:
// `debug_assert!` in debug builds, clamped into the grid in release builds.
// Host-facing edits go through `try_place`, which reports them instead.
//
// See also: `obstacle.rs` which walks routes over this grid,
// `assignment.rs` which searches and claims, `work.rs` which places the
// results of finished work.
//
// **Critical constraint: determinism.** The map uses `FxHashMap` (no
// per-process hasher seed) and is never iterated to make a decision; every
// decision goes through point lookups in a fixed scan order.

use crate::error::GridError;
use crate::types::{CellKey, GridCoord, ResourceCode};
use rustc_hash::FxHashMap;

/// The shared spatial index of the farm.
#[derive(Clone, Debug, Default)]
pub struct FarmGrid {
    cells: FxHashMap<CellKey, ResourceCode>,
    width: u32,
}

impl FarmGrid {
    /// Create an all-empty grid.
    pub fn new(width: u32) -> Self {
        Self {
            cells: FxHashMap::default(),
            width,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn in_bounds(&self, coord: GridCoord) -> bool {
        let w = self.width as i32;
        coord.x >= 0 && coord.y >= 0 && coord.x < w && coord.y < w
    }

    /// Hash a cell coordinate into its key.
    pub fn hash(&self, x: i32, y: i32) -> CellKey {
        let w = self.width as i32;
        debug_assert!(
            x >= 0 && y >= 0 && x < w && y < w,
            "cell ({x}, {y}) outside {w}x{w} grid"
        );
        let hi = (w - 1).max(0);
        CellKey(x.clamp(0, hi) * w + y.clamp(0, hi))
    }

    pub fn key(&self, coord: GridCoord) -> CellKey {
        self.hash(coord.x, coord.y)
    }

    /// The coordinate a key was hashed from.
    pub fn coord_of(&self, key: CellKey) -> GridCoord {
        let w = (self.width as i32).max(1);
        GridCoord::new(key.0 / w, key.0 % w)
    }

    pub fn lookup(&self, key: CellKey) -> Option<ResourceCode> {
        self.cells.get(&key).copied()
    }

    /// What a cell holds. Out-of-bounds cells read as `Empty`.
    pub fn get(&self, coord: GridCoord) -> ResourceCode {
        if !self.in_bounds(coord) {
            return ResourceCode::Empty;
        }
        self.lookup(self.key(coord)).unwrap_or(ResourceCode::Empty)
    }

    /// Remove a cell's entry, returning what it held. No-op on an absent key.
    pub fn claim(&mut self, key: CellKey) -> Option<ResourceCode> {
        self.cells.remove(&key)
    }

    /// Set a cell's contents; `Empty` removes the entry.
    pub fn try_place(&mut self, coord: GridCoord, code: ResourceCode) -> Result<(), GridError> {
        if !self.in_bounds(coord) {
            return Err(GridError::OutOfBounds {
                coord,
                width: self.width,
            });
        }
        let key = self.key(coord);
        match code {
            ResourceCode::Empty => {
                self.cells.remove(&key);
            }
            code => {
                self.cells.insert(key, code);
            }
        }
        Ok(())
    }

    /// Whether a cell satisfies a search for `wanted`. Searching for `Empty`
    /// means an in-bounds cell with no entry.
    pub fn matches(&self, coord: GridCoord, wanted: ResourceCode) -> bool {
        if !self.in_bounds(coord) {
            return false;
        }
        let held = self.lookup(self.key(coord));
        match wanted {
            ResourceCode::Empty => held.is_none(),
            code => held == Some(code),
        }
    }

    /// Ring search for the first cell matching `wanted` within `radius`
    /// rings of `origin`.
    pub fn search(&self, origin: GridCoord, radius: u32, wanted: ResourceCode) -> Option<GridCoord> {
        let w = self.width as i32;
        // Rings past twice the width around an in-grid origin lie wholly outside it.
        let radius = radius.min(self.width.saturating_mul(2)).min(i32::MAX as u32) as i32;
        for r in 0..=radius {
            if let Some(found) = ring(origin, r).find(|&c| self.matches(c, wanted)) {
                return Some(found);
            }
            // Once a ring encloses the whole grid, later rings are all outside it.
            if origin.x - r <= 0 && origin.y - r <= 0 && origin.x + r >= w - 1 && origin.y + r >= w - 1 {
                break;
            }
        }
        None
    }

    /// Number of occupied cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of cells holding `code`. Diagnostic only.
    pub fn count(&self, code: ResourceCode) -> usize {
        self.cells.values().filter(|&&c| c == code).count()
    }
}

/// Cells at Chebyshev distance exactly `r` from `origin`, row-major.
pub fn ring(origin: GridCoord, r: i32) -> impl Iterator<Item = GridCoord> {
    (origin.y - r..=origin.y + r).flat_map(move |y| {
        let edge_row = y == origin.y - r || y == origin.y + r;
        let step = if edge_row { 1 } else { (2 * r) as usize };
        (origin.x - r..=origin.x + r)
            .step_by(step)
            .map(move |x| GridCoord::new(x, y))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::GameRng;

    fn grid_with(width: u32, cells: &[(i32, i32, ResourceCode)]) -> FarmGrid {
        let mut grid = FarmGrid::new(width);
        for &(x, y, code) in cells {
            grid.try_place(GridCoord::new(x, y), code).unwrap();
        }
        grid
    }

    #[test]
    fn hash_is_bijective_in_range() {
        let grid = FarmGrid::new(10);
        let mut seen = std::collections::BTreeSet::new();
        for x in 0..10 {
            for y in 0..10 {
                let key = grid.hash(x, y);
                assert!(seen.insert(key), "duplicate key for ({x}, {y})");
                assert_eq!(grid.coord_of(key), GridCoord::new(x, y));
            }
        }
        assert_eq!(grid.hash(3, 7), CellKey(37));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "outside 10x10 grid")]
    fn hash_asserts_on_out_of_range_in_debug() {
        FarmGrid::new(10).hash(10, 0);
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn hash_clamps_out_of_range_in_release() {
        let grid = FarmGrid::new(10);
        assert_eq!(grid.hash(10, 0), grid.hash(9, 0));
        assert_eq!(grid.hash(-3, 12), grid.hash(0, 9));
    }

    #[test]
    fn ring_cells_are_row_major_and_exact_distance() {
        let origin = GridCoord::new(5, 5);
        assert_eq!(ring(origin, 0).collect::<Vec<_>>(), vec![origin]);
        let r1: Vec<_> = ring(origin, 1).collect();
        assert_eq!(r1.len(), 8);
        assert_eq!(r1[0], GridCoord::new(4, 4));
        assert_eq!(r1[3], GridCoord::new(4, 5));
        assert_eq!(r1[4], GridCoord::new(6, 5));
        assert_eq!(r1[7], GridCoord::new(6, 6));
        for r in 0..6 {
            let cells: Vec<_> = ring(origin, r).collect();
            assert_eq!(cells.len(), if r == 0 { 1 } else { 8 * r as usize });
            assert!(cells.iter().all(|&c| origin.ring_distance(c) == r as u32));
        }
    }

    #[test]
    fn finds_rock_within_radius_and_claim_removes_it() {
        let mut grid = grid_with(10, &[(3, 3, ResourceCode::Rock)]);
        let found = grid.search(GridCoord::new(0, 0), 5, ResourceCode::Rock);
        assert_eq!(found, Some(GridCoord::new(3, 3)));
        let key = grid.key(GridCoord::new(3, 3));
        assert_eq!(grid.claim(key), Some(ResourceCode::Rock));
        assert_eq!(grid.lookup(key), None);
    }

    #[test]
    fn claim_is_idempotent() {
        let mut once = grid_with(10, &[(1, 2, ResourceCode::Plant), (4, 4, ResourceCode::Rock)]);
        let mut twice = once.clone();
        let key = once.key(GridCoord::new(1, 2));
        once.claim(key);
        twice.claim(key);
        assert_eq!(twice.claim(key), None);
        assert_eq!(once.len(), twice.len());
        assert_eq!(once.get(GridCoord::new(4, 4)), twice.get(GridCoord::new(4, 4)));
    }

    #[test]
    fn nearer_ring_beats_scan_order() {
        // (0,0) comes first in row-major order but sits on ring 4.
        let grid = grid_with(10, &[(0, 0, ResourceCode::Plant), (6, 5, ResourceCode::Plant)]);
        assert_eq!(
            grid.search(GridCoord::new(4, 4), 5, ResourceCode::Plant),
            Some(GridCoord::new(6, 5))
        );
    }

    #[test]
    fn ties_within_a_ring_follow_row_major_order() {
        let grid = grid_with(
            10,
            &[(5, 3, ResourceCode::TilledSoil), (3, 5, ResourceCode::TilledSoil)],
        );
        // Ring 1 around (4,4): (5,3) is on row 3, scanned before row 5.
        assert_eq!(
            grid.search(GridCoord::new(4, 4), 3, ResourceCode::TilledSoil),
            Some(GridCoord::new(5, 3))
        );
    }

    #[test]
    fn miss_beyond_radius_returns_none() {
        let grid = grid_with(20, &[(10, 10, ResourceCode::Rock)]);
        assert_eq!(grid.search(GridCoord::new(0, 0), 5, ResourceCode::Rock), None);
        assert_eq!(
            GridCoord::encode(grid.search(GridCoord::new(0, 0), 5, ResourceCode::Rock)),
            GridCoord::NOT_FOUND
        );
        assert_eq!(
            grid.search(GridCoord::new(0, 0), 10, ResourceCode::Rock),
            Some(GridCoord::new(10, 10))
        );
    }

    #[test]
    fn huge_radius_still_searches_from_the_origin() {
        let grid = grid_with(10, &[(3, 3, ResourceCode::Rock), (9, 0, ResourceCode::Plant)]);
        for radius in [1 << 31, u32::MAX] {
            assert_eq!(
                grid.search(GridCoord::new(3, 3), radius, ResourceCode::Rock),
                Some(GridCoord::new(3, 3))
            );
            assert_eq!(
                grid.search(GridCoord::new(0, 9), radius, ResourceCode::Plant),
                Some(GridCoord::new(9, 0))
            );
        }
    }

    #[test]
    fn empty_search_finds_absence_not_code_zero() {
        let grid = grid_with(
            4,
            &[(1, 1, ResourceCode::Rock), (0, 1, ResourceCode::Plant), (1, 0, ResourceCode::Storage)],
        );
        // Origin occupied; ring 1 row 0: (0,0) is empty.
        assert_eq!(
            grid.search(GridCoord::new(1, 1), 2, ResourceCode::Empty),
            Some(GridCoord::new(0, 0))
        );
        let full = grid_with(1, &[(0, 0, ResourceCode::Rock)]);
        assert_eq!(full.search(GridCoord::new(0, 0), 3, ResourceCode::Empty), None);
    }

    #[test]
    fn search_never_leaves_the_grid_or_the_radius() {
        let mut rng = GameRng::new(2024);
        let codes = [
            ResourceCode::Empty,
            ResourceCode::Rock,
            ResourceCode::TilledSoil,
            ResourceCode::Plant,
            ResourceCode::Storage,
        ];
        for _ in 0..50 {
            let width = rng.range_usize(1, 24) as u32;
            let mut grid = FarmGrid::new(width);
            for x in 0..width as i32 {
                for y in 0..width as i32 {
                    let code = codes[rng.range_usize(0, codes.len())];
                    grid.try_place(GridCoord::new(x, y), code).unwrap();
                }
            }
            let origin = GridCoord::new(
                rng.range_usize(0, width as usize) as i32,
                rng.range_usize(0, width as usize) as i32,
            );
            let radius = rng.range_usize(0, 8) as u32;
            for wanted in codes {
                match grid.search(origin, radius, wanted) {
                    Some(c) => {
                        assert!(grid.in_bounds(c), "{c} outside grid");
                        assert!(origin.ring_distance(c) <= radius);
                        assert_eq!(grid.get(c), wanted);
                    }
                    None => {
                        // Brute force agrees nothing matches within the radius.
                        for x in 0..width as i32 {
                            for y in 0..width as i32 {
                                let c = GridCoord::new(x, y);
                                if origin.ring_distance(c) <= radius {
                                    assert_ne!(grid.get(c), wanted, "missed {c}");
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn try_place_rejects_out_of_bounds() {
        let mut grid = FarmGrid::new(8);
        let err = grid.try_place(GridCoord::new(-1, 3), ResourceCode::Rock).unwrap_err();
        assert_eq!(
            err,
            GridError::OutOfBounds {
                coord: GridCoord::new(-1, 3),
                width: 8
            }
        );
        assert!(grid.is_empty());
        assert_eq!(grid.get(GridCoord::new(100, 0)), ResourceCode::Empty);
    }

    #[test]
    fn placing_empty_removes_the_entry() {
        let mut grid = grid_with(8, &[(2, 2, ResourceCode::TilledSoil)]);
        assert_eq!(grid.count(ResourceCode::TilledSoil), 1);
        grid.try_place(GridCoord::new(2, 2), ResourceCode::Empty).unwrap();
        assert!(grid.is_empty());
    }
}
