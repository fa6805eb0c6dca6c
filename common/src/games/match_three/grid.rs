use std::collections::HashMap;
use std::fmt;

use super::types::{GemId, GemType, Position};

#[derive(Clone, Debug, PartialEq)]
pub struct Gem {
    id: GemId,
    gem_type: GemType,
    position: Position,
    moving: bool,
}

impl Gem {
    pub fn id(&self) -> GemId {
        self.id
    }

    pub fn gem_type(&self) -> GemType {
        self.gem_type
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Set while a move command is in flight and cleared when the gem settles.
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub(crate) fn set_moving(&mut self, moving: bool) {
        self.moving = moving;
    }
}

/// Board storage: a `[y][x]` table of gem ids plus the gems themselves.
///
/// Every occupied cell maps to exactly one gem and that gem's recorded
/// position is the cell. All mutators keep both sides in step and panic
/// rather than let them drift apart.
#[derive(Clone, Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Vec<Option<GemId>>>,
    gems: HashMap<GemId, Gem>,
    next_id: GemId,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![vec![None; width]; height],
            gems: HashMap::new(),
            next_id: 1,
        }
    }

    /// Builds a grid from text rows, bottom row first. One char per cell:
    /// a gem symbol (`B G O P R T`) or `.` for an empty cell.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, String> {
        let height = rows.len();
        if height == 0 {
            return Err("layout has no rows".to_string());
        }
        let width = rows[0].as_ref().chars().count();
        if width == 0 {
            return Err("layout rows are empty".to_string());
        }

        let mut grid = Grid::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.chars().count() != width {
                return Err(format!(
                    "layout row {} has {} cells, expected {}",
                    y,
                    row.chars().count(),
                    width
                ));
            }
            for (x, symbol) in row.chars().enumerate() {
                if symbol == '.' {
                    continue;
                }
                let gem_type = GemType::from_symbol(symbol).ok_or_else(|| {
                    format!("unknown gem symbol '{}' at ({}, {})", symbol, x, y)
                })?;
                grid.place(gem_type, Position::new(x, y));
            }
        }
        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && x < self.width as i64 && y >= 0 && y < self.height as i64
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    pub fn gem_id_at(&self, pos: Position) -> Option<GemId> {
        if !self.contains(pos) {
            return None;
        }
        self.cells[pos.y][pos.x]
    }

    pub fn gem_at(&self, pos: Position) -> Option<&Gem> {
        self.gem_id_at(pos).and_then(|id| self.gems.get(&id))
    }

    pub fn gem_type_at(&self, pos: Position) -> Option<GemType> {
        self.gem_at(pos).map(Gem::gem_type)
    }

    pub fn is_occupied(&self, pos: Position) -> bool {
        self.gem_id_at(pos).is_some()
    }

    pub fn gem(&self, id: GemId) -> Option<&Gem> {
        self.gems.get(&id)
    }

    pub(crate) fn gem_mut(&mut self, id: GemId) -> Option<&mut Gem> {
        self.gems.get_mut(&id)
    }

    pub fn gem_count(&self) -> usize {
        self.gems.len()
    }

    pub fn gems(&self) -> impl Iterator<Item = &Gem> {
        self.gems.values()
    }

    /// Creates a gem in an empty cell. Panics if the cell is out of bounds or occupied.
    pub fn place(&mut self, gem_type: GemType, pos: Position) -> GemId {
        assert!(self.contains(pos), "cannot place gem outside the board at {}", pos);
        assert!(
            self.cells[pos.y][pos.x].is_none(),
            "cell {} is already occupied",
            pos
        );

        let id = self.next_id;
        self.next_id += 1;
        self.cells[pos.y][pos.x] = Some(id);
        self.gems.insert(
            id,
            Gem {
                id,
                gem_type,
                position: pos,
                moving: false,
            },
        );
        id
    }

    pub fn remove(&mut self, pos: Position) -> Option<Gem> {
        let id = self.gem_id_at(pos)?;
        self.cells[pos.y][pos.x] = None;
        self.gems.remove(&id)
    }

    /// Moves a gem into an empty cell, vacating its old one.
    pub fn relocate(&mut self, id: GemId, to: Position) {
        assert!(self.contains(to), "cannot move gem {} outside the board to {}", id, to);
        assert!(
            self.cells[to.y][to.x].is_none(),
            "cannot move gem {} into occupied cell {}",
            id,
            to
        );
        let gem = self
            .gems
            .get_mut(&id)
            .unwrap_or_else(|| panic!("gem {} is not on the board", id));

        let from = gem.position;
        gem.position = to;
        self.cells[from.y][from.x] = None;
        self.cells[to.y][to.x] = Some(id);
    }

    /// Exchanges the gems of two occupied cells.
    pub fn swap(&mut self, a: Position, b: Position) {
        let (Some(first), Some(second)) = (self.gem_id_at(a), self.gem_id_at(b)) else {
            panic!("swap needs two occupied cells, got {} and {}", a, b);
        };

        self.cells[a.y][a.x] = Some(second);
        self.cells[b.y][b.x] = Some(first);
        if let Some(gem) = self.gems.get_mut(&first) {
            gem.position = b;
        }
        if let Some(gem) = self.gems.get_mut(&second) {
            gem.position = a;
        }
    }

    /// Every cell, column by column from the bottom up.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.width).flat_map(move |x| (0..self.height).map(move |y| Position::new(x, y)))
    }

    pub fn empty_positions(&self) -> Vec<Position> {
        self.positions().filter(|&pos| !self.is_occupied(pos)).collect()
    }

    /// Gem types per row, bottom row first.
    pub fn type_layout(&self) -> Vec<Vec<Option<GemType>>> {
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| self.gem_type_at(Position::new(x, y)))
                    .collect()
            })
            .collect()
    }

    pub fn column_types(&self, x: usize) -> Vec<Option<GemType>> {
        (0..self.height)
            .map(|y| self.gem_type_at(Position::new(x, y)))
            .collect()
    }

    /// Verifies the cell table and the gem table describe the same board.
    pub fn check_consistency(&self) -> Result<(), String> {
        let mut occupied = 0;
        for pos in self.positions() {
            let Some(id) = self.cells[pos.y][pos.x] else {
                continue;
            };
            occupied += 1;
            let gem = self
                .gems
                .get(&id)
                .ok_or_else(|| format!("cell {} references missing gem {}", pos, id))?;
            if gem.position != pos {
                return Err(format!(
                    "gem {} sits in {} but records {}",
                    id, pos, gem.position
                ));
            }
        }
        if occupied != self.gems.len() {
            return Err(format!(
                "{} occupied cells but {} gems",
                occupied,
                self.gems.len()
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Grid {
    /// Top row first, the way the board is looked at.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in (0..self.height).rev() {
            write!(f, "{:>2} ", y)?;
            for x in 0..self.width {
                let symbol = self
                    .gem_type_at(Position::new(x, y))
                    .map(GemType::symbol)
                    .unwrap_or('.');
                write!(f, "{}", symbol)?;
            }
            writeln!(f)?;
        }
        write!(f, "   ")?;
        for x in 0..self.width {
            write!(f, "{}", x % 10)?;
        }
        Ok(())
    }
}

/// Distinct x-coordinates in first-seen order.
pub fn distinct_columns(positions: impl IntoIterator<Item = Position>) -> Vec<usize> {
    let mut columns = Vec::new();
    for pos in positions {
        if !columns.contains(&pos.x) {
            columns.push(pos.x);
        }
    }
    columns
}
