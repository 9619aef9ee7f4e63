//! Grid primitives: cells, directions, and dense per-cell storage.
//!
//! Every per-cell container in the crate ([`Bitmap`], [`CellArray`]) is a
//! dense row-major store sized by a [`Bounds`]. Writing outside the bounds is
//! a programming error and panics; read-only membership queries such as
//! [`Bitmap::contains`] simply answer `false` for foreign cells.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// An encoded `(x, y)` grid coordinate.
///
/// Both axes fit in 16 bits. `x` is stored in the high half, so the derived
/// ordering is lexicographic by `(x, y)`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell(u32);

impl Cell {
    /// Encode a coordinate pair.
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self(((x as u32) << 16) | y as u32)
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Vertical coordinate.
    #[must_use]
    pub const fn y(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// The raw encoded key.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The adjacent cell in `dir`, or `None` if it would leave the 16-bit
    /// coordinate space. The result is not checked against any grid bounds.
    #[must_use]
    pub fn neighbor(self, dir: Direction) -> Option<Self> {
        let (dx, dy) = dir.delta();
        let x = u16::try_from(i32::from(self.x()) + dx).ok()?;
        let y = u16::try_from(i32::from(self.y()) + dy).ok()?;
        Some(Self::new(x, y))
    }

    /// The (up to) four axis neighbors in [`Direction::ALL`] order.
    pub fn neighbors(self) -> impl Iterator<Item = Self> {
        Direction::ALL
            .into_iter()
            .filter_map(move |dir| self.neighbor(dir))
    }

    /// Manhattan distance between two cells.
    #[must_use]
    pub fn manhattan(self, other: Self) -> u32 {
        u32::from(self.x().abs_diff(other.x())) + u32::from(self.y().abs_diff(other.y()))
    }

    /// Whether `other` is one of the four axis neighbors.
    #[must_use]
    pub fn is_adjacent(self, other: Self) -> bool {
        self.manhattan(other) == 1
    }

    /// Direction of the step from `self` to an adjacent `other`.
    #[must_use]
    pub fn direction_to(self, other: Self) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|&dir| self.neighbor(dir) == Some(other))
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cell({}, {})", self.x(), self.y())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x(), self.y())
    }
}

/// One of the four axis-aligned unit steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// `(1, 0)`
    XPos,
    /// `(0, 1)`
    YPos,
    /// `(-1, 0)`
    XNeg,
    /// `(0, -1)`
    YNeg,
}

impl Direction {
    /// All directions in enumeration order. BFS ties are broken by this order.
    pub const ALL: [Self; 4] = [Self::XPos, Self::YPos, Self::XNeg, Self::YNeg];

    /// The `(dx, dy)` step.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::XPos => (1, 0),
            Self::YPos => (0, 1),
            Self::XNeg => (-1, 0),
            Self::YNeg => (0, -1),
        }
    }

    /// The reverse step.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::XPos => Self::XNeg,
            Self::YPos => Self::YNeg,
            Self::XNeg => Self::XPos,
            Self::YNeg => Self::YPos,
        }
    }

    /// Two-bit index, used by the packed movement map.
    #[must_use]
    pub const fn index(self) -> u16 {
        match self {
            Self::XPos => 0,
            Self::YPos => 1,
            Self::XNeg => 2,
            Self::YNeg => 3,
        }
    }

    /// Inverse of [`Direction::index`]; only the low two bits are read.
    #[must_use]
    pub const fn from_index(index: u16) -> Self {
        match index & 0b11 {
            0 => Self::XPos,
            1 => Self::YPos,
            2 => Self::XNeg,
            _ => Self::YNeg,
        }
    }
}

/// A `width x height` rectangle anchored at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    width: u16,
    height: u16,
}

impl Bounds {
    /// Create bounds for a grid.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        assert!(width > 0, "grid width must be positive");
        assert!(height > 0, "grid height must be positive");
        Self { width, height }
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Total number of cells.
    #[must_use]
    pub const fn area(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Check if a cell lies inside the rectangle.
    #[must_use]
    pub const fn contains(&self, cell: Cell) -> bool {
        cell.x() < self.width && cell.y() < self.height
    }

    /// Row-major storage index of `cell`.
    ///
    /// # Panics
    ///
    /// Panics if `cell` is out of bounds.
    #[inline]
    #[must_use]
    pub fn index_of(&self, cell: Cell) -> usize {
        assert!(self.contains(cell), "{cell} outside {}x{} grid", self.width, self.height);
        (cell.y() as usize) * (self.width as usize) + (cell.x() as usize)
    }

    /// Inverse of [`Bounds::index_of`].
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn cell_at(&self, index: usize) -> Cell {
        let width = self.width as usize;
        // Both quotients are bounded by u16 dimensions.
        Cell::new((index % width) as u16, (index / width) as u16)
    }

    /// In-bounds neighbors of `cell`.
    pub fn neighbors(self, cell: Cell) -> impl Iterator<Item = Cell> {
        cell.neighbors().filter(move |&n| self.contains(n))
    }

    /// Every cell in row-major order (x varies fastest).
    #[must_use]
    pub fn cells(&self) -> CellIter {
        CellIter {
            bounds: *self,
            next: 0,
        }
    }
}

/// Row-major iterator over a [`Bounds`]. Clone it to restart.
#[derive(Debug, Clone)]
pub struct CellIter {
    bounds: Bounds,
    next: usize,
}

impl Iterator for CellIter {
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        if self.next >= self.bounds.area() {
            return None;
        }
        let cell = self.bounds.cell_at(self.next);
        self.next += 1;
        Some(cell)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.bounds.area().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CellIter {}

/// Dense boolean map over a grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    bounds: Bounds,
    words: Vec<u64>,
}

impl Bitmap {
    /// An all-false bitmap.
    #[must_use]
    pub fn empty(bounds: Bounds) -> Self {
        Self {
            bounds,
            words: vec![0; bounds.area().div_ceil(64)],
        }
    }

    /// A bitmap containing every cell `pred` accepts.
    #[must_use]
    pub fn from_fn(bounds: Bounds, pred: impl Fn(Cell) -> bool) -> Self {
        let mut map = Self::empty(bounds);
        for (index, cell) in bounds.cells().enumerate() {
            if pred(cell) {
                map.words[index / 64] |= 1 << (index % 64);
            }
        }
        map
    }

    /// Bounds the bitmap covers.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Membership test. Out-of-range cells are never contained.
    #[must_use]
    pub fn contains(&self, cell: Cell) -> bool {
        if !self.bounds.contains(cell) {
            return false;
        }
        let index = self.bounds.index_of(cell);
        self.words[index / 64] & (1 << (index % 64)) != 0
    }

    /// Set or clear a cell.
    ///
    /// # Panics
    ///
    /// Panics if `cell` is out of bounds.
    pub fn set(&mut self, cell: Cell, value: bool) {
        let index = self.bounds.index_of(cell);
        if value {
            self.words[index / 64] |= 1 << (index % 64);
        } else {
            self.words[index / 64] &= !(1 << (index % 64));
        }
    }

    /// Cells in both `self` and `other`.
    #[must_use]
    pub fn and(&self, other: impl Fn(Cell) -> bool) -> Self {
        Self::from_fn(self.bounds, |c| self.contains(c) && other(c))
    }

    /// Cells in either `self` or `other`.
    #[must_use]
    pub fn or(&self, other: impl Fn(Cell) -> bool) -> Self {
        Self::from_fn(self.bounds, |c| self.contains(c) || other(c))
    }

    /// Cells in exactly one of `self` and `other`.
    #[must_use]
    pub fn xor(&self, other: impl Fn(Cell) -> bool) -> Self {
        Self::from_fn(self.bounds, |c| self.contains(c) != other(c))
    }

    /// Complement within the bounds.
    #[must_use]
    pub fn not(&self) -> Self {
        Self::from_fn(self.bounds, |c| !self.contains(c))
    }

    /// Number of contained cells.
    #[must_use]
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Whether no cell is contained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Contained cells in row-major order, produced lazily.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.bounds.cells().filter(move |&c| self.contains(c))
    }
}

/// Dense per-cell array.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellArray<T> {
    bounds: Bounds,
    data: Vec<T>,
}

impl<T: Clone> CellArray<T> {
    /// An array with every cell set to `fill`.
    #[must_use]
    pub fn filled(bounds: Bounds, fill: T) -> Self {
        Self {
            bounds,
            data: vec![fill; bounds.area()],
        }
    }
}

impl<T> CellArray<T> {
    /// Build from a per-cell constructor, row-major.
    pub fn from_fn(bounds: Bounds, f: impl FnMut(Cell) -> T) -> Self {
        Self {
            bounds,
            data: bounds.cells().map(f).collect(),
        }
    }

    /// Bounds the array covers.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Checked read.
    #[must_use]
    pub fn get(&self, cell: Cell) -> Option<&T> {
        self.bounds
            .contains(cell)
            .then(|| &self.data[self.bounds.index_of(cell)])
    }

    /// Every `(cell, value)` pair in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Cell, &T)> + '_ {
        self.bounds.cells().zip(self.data.iter())
    }
}

impl<T> Index<Cell> for CellArray<T> {
    type Output = T;

    fn index(&self, cell: Cell) -> &T {
        &self.data[self.bounds.index_of(cell)]
    }
}

impl<T> IndexMut<Cell> for CellArray<T> {
    fn index_mut(&mut self, cell: Cell) -> &mut T {
        let index = self.bounds.index_of(cell);
        &mut self.data[index]
    }
}
