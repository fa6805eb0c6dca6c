use std::collections::BTreeSet;

use super::grid::Grid;
use super::types::{Axis, GemId, GemType, MIN_MATCH, Position, SwapRequest};

/// Each half-scan must reach this length, seed included, before it joins a run.
const HALF_RUN: usize = 2;

/// Deduplicated set of matched gems. A gem sitting on both a horizontal and a
/// vertical run appears once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchSet {
    gems: BTreeSet<GemId>,
}

impl MatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.gems.is_empty()
    }

    pub fn len(&self) -> usize {
        self.gems.len()
    }

    pub fn contains(&self, id: GemId) -> bool {
        self.gems.contains(&id)
    }

    pub fn insert(&mut self, id: GemId) -> bool {
        self.gems.insert(id)
    }

    pub fn union_with(&mut self, other: MatchSet) {
        self.gems.extend(other.gems);
    }

    pub fn iter(&self) -> impl Iterator<Item = GemId> + '_ {
        self.gems.iter().copied()
    }

    /// Current cells of the matched gems still on the board.
    pub fn positions(&self, grid: &Grid) -> Vec<Position> {
        self.iter()
            .filter_map(|id| grid.gem(id).map(|gem| gem.position()))
            .collect()
    }
}

impl FromIterator<GemId> for MatchSet {
    fn from_iter<I: IntoIterator<Item = GemId>>(iter: I) -> Self {
        Self {
            gems: iter.into_iter().collect(),
        }
    }
}

impl Extend<GemId> for MatchSet {
    fn extend<I: IntoIterator<Item = GemId>>(&mut self, iter: I) {
        self.gems.extend(iter);
    }
}

/// Walks from `seed` one unit step `(dx, dy)` at a time while cells stay on the
/// board, occupied and of the seed's type. Returns the run (seed first) when
/// it holds at least `min_run` gems.
pub fn scan_direction(
    grid: &Grid,
    seed: Position,
    dx: i32,
    dy: i32,
    min_run: usize,
) -> Option<Vec<GemId>> {
    debug_assert!(dx.abs() + dy.abs() == 1, "scan step must be a unit step");

    let start = grid.gem_at(seed)?;
    let mut run = vec![start.id()];

    let (mut x, mut y) = (seed.x as i64, seed.y as i64);
    loop {
        x += dx as i64;
        y += dy as i64;
        if !grid.in_bounds(x, y) {
            break;
        }
        let Some(next) = grid.gem_at(Position::new(x as usize, y as usize)) else {
            break;
        };
        if next.gem_type() != start.gem_type() || run.contains(&next.id()) {
            break;
        }
        run.push(next.id());
    }

    (run.len() >= min_run).then_some(run)
}

/// Maximal run along `axis` through `seed`.
///
/// Both halves are scanned with a threshold of two (seed plus one neighbour)
/// and merged with the seed counted once, so the seed may sit anywhere inside
/// the run, not only at one end. The run is returned in axis order.
pub fn matches_through_axis(
    grid: &Grid,
    seed: Position,
    axis: Axis,
    min_run: usize,
) -> Option<Vec<GemId>> {
    let [negative, positive] = axis.directions();
    let before = scan_direction(grid, seed, negative.0, negative.1, HALF_RUN).unwrap_or_default();
    let after = scan_direction(grid, seed, positive.0, positive.1, HALF_RUN).unwrap_or_default();

    let mut run: Vec<GemId> = before.iter().skip(1).rev().copied().collect();
    match (before.first(), after.first()) {
        (Some(&seed_id), _) | (None, Some(&seed_id)) => run.push(seed_id),
        (None, None) => {}
    }
    run.extend(after.iter().skip(1).copied());

    (run.len() >= min_run).then_some(run)
}

pub fn matches_at(grid: &Grid, pos: Position, min_run: usize) -> MatchSet {
    let mut matches = MatchSet::new();
    for axis in Axis::BOTH {
        if let Some(run) = matches_through_axis(grid, pos, axis, min_run) {
            matches.extend(run);
        }
    }
    matches
}

pub fn has_match_at(grid: &Grid, pos: Position) -> bool {
    Axis::BOTH
        .iter()
        .any(|&axis| matches_through_axis(grid, pos, axis, MIN_MATCH).is_some())
}

pub fn matches_through_seeds(
    grid: &Grid,
    seeds: impl IntoIterator<Item = Position>,
    min_run: usize,
) -> MatchSet {
    let mut matches = MatchSet::new();
    for seed in seeds {
        matches.union_with(matches_at(grid, seed, min_run));
    }
    matches
}

pub fn all_matches(grid: &Grid) -> MatchSet {
    matches_through_seeds(grid, grid.positions(), MIN_MATCH)
}

/// Would the gem type `gem_type` complete a run if it sat at the empty cell `pos`?
pub fn completes_match(grid: &Grid, pos: Position, gem_type: GemType) -> bool {
    let same = |dx: i32, dy: i32| -> usize {
        let mut count = 0;
        let mut cursor = pos;
        while let Some(next) = cursor.offset(dx, dy) {
            if grid.gem_type_at(next) != Some(gem_type) {
                break;
            }
            count += 1;
            cursor = next;
        }
        count
    };

    Axis::BOTH.iter().any(|&axis| {
        let [negative, positive] = axis.directions();
        1 + same(negative.0, negative.1) + same(positive.0, positive.1) >= MIN_MATCH
    })
}

/// First adjacent pair, in column-major scan order, whose exchange produces a match.
pub fn find_valid_swap(grid: &Grid) -> Option<SwapRequest> {
    let mut scratch = grid.clone();
    let candidates: Vec<Position> = grid.positions().collect();

    for from in candidates {
        for (dx, dy) in [(1, 0), (0, 1)] {
            let Some(to) = from.offset(dx, dy) else {
                continue;
            };
            if !scratch.is_occupied(from) || !scratch.is_occupied(to) {
                continue;
            }
            if scratch.gem_type_at(from) == scratch.gem_type_at(to) {
                continue;
            }

            scratch.swap(from, to);
            let found = has_match_at(&scratch, from) || has_match_at(&scratch, to);
            scratch.swap(from, to);

            if found {
                return Some(SwapRequest::new(from, to));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids_at(grid: &Grid, cells: &[(usize, usize)]) -> MatchSet {
        cells
            .iter()
            .map(|&(x, y)| grid.gem_id_at(Position::new(x, y)).unwrap())
            .collect()
    }

    #[test]
    fn test_matches_at_row_of_three() {
        #[rustfmt::skip]
        let grid = Grid::from_rows(&[
            "BBBG",
            "RPOT",
            "GRPO",
            "TOGR",
        ]).unwrap();

        let matches = matches_at(&grid, Position::new(0, 0), MIN_MATCH);
        assert_eq!(matches, ids_at(&grid, &[(0, 0), (1, 0), (2, 0)]));

        let lone = matches_at(&grid, Position::new(3, 0), MIN_MATCH);
        assert!(lone.is_empty());
    }

    #[test]
    fn test_seed_in_middle_of_run() {
        let grid = Grid::from_rows(&["RBBBBR"]).unwrap();

        let run = matches_through_axis(&grid, Position::new(2, 0), Axis::Horizontal, MIN_MATCH)
            .unwrap();
        let expected: Vec<GemId> = (1..=4)
            .map(|x| grid.gem_id_at(Position::new(x, 0)).unwrap())
            .collect();
        assert_eq!(run, expected);
    }

    #[test]
    fn test_pair_is_not_a_match() {
        let grid = Grid::from_rows(&["RBBR"]).unwrap();
        assert!(matches_at(&grid, Position::new(1, 0), MIN_MATCH).is_empty());
        assert!(matches_at(&grid, Position::new(2, 0), MIN_MATCH).is_empty());
    }

    #[test]
    fn test_vertical_run() {
        #[rustfmt::skip]
        let grid = Grid::from_rows(&[
            "GR",
            "GB",
            "GR",
            "BR",
        ]).unwrap();

        let matches = matches_at(&grid, Position::new(0, 1), MIN_MATCH);
        assert_eq!(matches, ids_at(&grid, &[(0, 0), (0, 1), (0, 2)]));
    }

    #[test]
    fn test_cross_shape_counts_corner_once() {
        #[rustfmt::skip]
        let grid = Grid::from_rows(&[
            "RRRB",
            "RGBG",
            "RBGB",
        ]).unwrap();

        let matches = matches_at(&grid, Position::new(0, 0), MIN_MATCH);
        assert_eq!(matches.len(), 5);
        assert_eq!(
            matches,
            ids_at(&grid, &[(0, 0), (1, 0), (2, 0), (0, 1), (0, 2)])
        );
    }

    #[test]
    fn test_runs_stop_at_empty_cells() {
        let grid = Grid::from_rows(&["RR.RR"]).unwrap();
        assert!(all_matches(&grid).is_empty());
        assert!(matches_at(&grid, Position::new(2, 0), MIN_MATCH).is_empty());
    }

    #[test]
    fn test_scan_direction_respects_min_run() {
        let grid = Grid::from_rows(&["RRRB"]).unwrap();
        let run = scan_direction(&grid, Position::new(0, 0), 1, 0, 3).unwrap();
        assert_eq!(run.len(), 3);
        assert!(scan_direction(&grid, Position::new(1, 0), 1, 0, 3).is_none());
        assert!(scan_direction(&grid, Position::new(0, 0), -1, 0, 1).is_some());
    }

    #[test]
    fn test_runs_are_maximal_and_single_typed() {
        #[rustfmt::skip]
        let grid = Grid::from_rows(&[
            "GGGGRB",
            "RBRBGG",
            "BRBRBR",
        ]).unwrap();

        let run = matches_through_axis(&grid, Position::new(1, 0), Axis::Horizontal, MIN_MATCH)
            .unwrap();
        assert_eq!(run.len(), 4);
        assert!(run
            .iter()
            .all(|&id| grid.gem(id).unwrap().gem_type() == GemType::Green));
    }

    #[test]
    fn test_all_matches_unions_everything() {
        #[rustfmt::skip]
        let grid = Grid::from_rows(&[
            "RRRB",
            "GBGB",
            "BGBB",
        ]).unwrap();

        let matches = all_matches(&grid);
        assert_eq!(
            matches,
            ids_at(&grid, &[(0, 0), (1, 0), (2, 0), (3, 0), (3, 1), (3, 2)])
        );
    }

    #[test]
    fn test_matches_through_seeds_only_checks_seeds() {
        #[rustfmt::skip]
        let grid = Grid::from_rows(&[
            "RRRB",
            "GBGO",
            "BGGG",
        ]).unwrap();

        let from_bottom = matches_through_seeds(&grid, [Position::new(1, 0)], MIN_MATCH);
        assert_eq!(from_bottom, ids_at(&grid, &[(0, 0), (1, 0), (2, 0)]));

        let none = matches_through_seeds(&grid, [Position::new(3, 0)], MIN_MATCH);
        assert!(none.is_empty());
    }

    #[test]
    fn test_completes_match_checks_both_sides() {
        let grid = Grid::from_rows(&["RR.", "G.R", "G.B"]).unwrap();

        assert!(completes_match(&grid, Position::new(2, 0), GemType::Red));
        assert!(!completes_match(&grid, Position::new(2, 0), GemType::Blue));
        assert!(!completes_match(&grid, Position::new(1, 1), GemType::Green));
        let gap = Grid::from_rows(&["R.R"]).unwrap();
        assert!(completes_match(&gap, Position::new(1, 0), GemType::Red));
    }

    #[test]
    fn test_completes_match_vertical() {
        #[rustfmt::skip]
        let grid = Grid::from_rows(&[
            "T",
            "T",
            ".",
        ]).unwrap();
        assert!(completes_match(&grid, Position::new(0, 2), GemType::Teal));
        assert!(!completes_match(&grid, Position::new(0, 2), GemType::Red));
    }

    #[test]
    fn test_find_valid_swap() {
        #[rustfmt::skip]
        let grid = Grid::from_rows(&[
            "RRBR",
            "GBGO",
        ]).unwrap();

        let swap = find_valid_swap(&grid).unwrap();
        let mut scratch = grid.clone();
        scratch.swap(swap.from, swap.to);
        assert!(!all_matches(&scratch).is_empty());
    }

    #[test]
    fn test_find_valid_swap_none_available() {
        #[rustfmt::skip]
        let grid = Grid::from_rows(&[
            "RGB",
            "GBR",
            "BRG",
        ]).unwrap();

        assert!(find_valid_swap(&grid).is_none());
    }
}
