// src/maze/grid.rs

// Discrete view of the maze: a regular grid of square cells carrying a
// wall label (obstacles inflated by the robot radius) and a two-slot mark
// table recording which robots currently occupy each cell. The grid knows
// nothing about the swarm; settled robots leave their compass facing in
// the mark itself.

use log::warn;

use crate::geometry::{Circle, Triangle, Vector};
use crate::maze::ROBOT_RADIUS;
use crate::swarm::robot::RobotId;

/// A grid cell index. Signed so neighbour templates may step outside the
/// map before bounds filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Column index
    pub x: i64,
    /// Row index
    pub y: i64,
}

impl Cell {
    /// Builds a cell from raw indices.
    pub fn new(x: i64, y: i64) -> Self {
        Cell { x, y }
    }

    fn offset(self, dx: i64, dy: i64) -> Self {
        Cell { x: self.x + dx, y: self.y + dy }
    }
}

/// Compass direction on the grid. The index order left, down, right, up
/// is part of the observer contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Negative x
    Left,
    /// Negative y
    Down,
    /// Positive x
    Right,
    /// Positive y
    Up,
}

impl Direction {
    /// Rule evaluation order: left, down, right, up.
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Down,
        Direction::Right,
        Direction::Up,
    ];

    /// The opposite compass direction.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Down => Direction::Up,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
        }
    }

    /// Unit displacement of one step in this direction.
    pub fn unit(self) -> Vector {
        match self {
            Direction::Left => Vector::new(-1.0, 0.0),
            Direction::Down => Vector::new(0.0, -1.0),
            Direction::Right => Vector::new(1.0, 0.0),
            Direction::Up => Vector::new(0.0, 1.0),
        }
    }

    /// Cell offset of one step in this direction.
    pub fn cell_offset(self) -> (i64, i64) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Down => (0, -1),
            Direction::Right => (1, 0),
            Direction::Up => (0, 1),
        }
    }

    /// Slot of the adjacent cell in this direction within the
    /// twelve-neighbour template.
    pub fn adjacent_slot(self) -> usize {
        match self {
            Direction::Left => 5,
            Direction::Down => 9,
            Direction::Right => 6,
            Direction::Up => 2,
        }
    }

    /// Slot of the cell two steps away in this direction within the
    /// twelve-neighbour template.
    pub fn two_away_slot(self) -> usize {
        match self {
            Direction::Left => 4,
            Direction::Down => 11,
            Direction::Right => 7,
            Direction::Up => 0,
        }
    }
}

/// Cell offsets of the diamond-of-radius-2 neighbourhood a robot can
/// observe. Slot positions are part of the local-rule contract:
///
/// ```text
///                  (0, 2)            slot 0
///        (-1, 1)   (0, 1)   (1, 1)   slots 1 2 3
/// (-2,0) (-1, 0)            (1, 0) (2,0)  slots 4 5 6 7
///        (-1,-1)   (0,-1)   (1,-1)   slots 8 9 10
///                  (0,-2)            slot 11
/// ```
pub const NEIGHBOR_OFFSETS: [(i64, i64); 12] = [
    (0, 2),
    (-1, 1),
    (0, 1),
    (1, 1),
    (-2, 0),
    (-1, 0),
    (1, 0),
    (2, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (0, -2),
];

/// Template slots lying on the two compass axes; occupancy is only ever
/// inspected there.
pub const AXIS_SLOTS: [usize; 8] = [0, 2, 4, 5, 6, 7, 9, 11];

/// One occupancy record in a cell's mark table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    /// Owning robot
    pub robot: RobotId,
    /// Whether the owner has settled in this cell
    pub settled: bool,
    /// Compass facing of a settled owner; `None` for unsettled marks and
    /// for the source-of-chain robot, which settles without a facing
    pub facing: Option<Direction>,
}

/// The mark table of one cell: at most two occupants. Slot order carries
/// no meaning.
pub type CellSlots = [Option<Mark>; 2];

/// Cell-marking error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkError {
    /// Target cell lies outside the map
    OutOfMap(Cell),
    /// Target cell already holds two robots
    CellFull(Cell),
}

impl std::fmt::Display for MarkError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MarkError::OutOfMap(cell) => {
                write!(f, "cell ({}, {}) is outside the map", cell.x, cell.y)
            }
            MarkError::CellFull(cell) => {
                write!(f, "cell ({}, {}) already holds two robots", cell.x, cell.y)
            }
        }
    }
}

impl std::error::Error for MarkError {}

/// Wall labels and mark table over a `width x height` cell grid.
#[derive(Debug, Clone)]
pub struct MarkGrid {
    width: i64,
    height: i64,
    grid_length: f64,
    walls: Vec<Cell>, // append-only; duplicates are harmless
    wall_mask: Vec<bool>,
    marks: Vec<CellSlots>,
}

impl MarkGrid {
    /// Creates an empty grid of `width x height` cells of side
    /// `grid_length` meters.
    pub fn new(width: i64, height: i64, grid_length: f64) -> Self {
        let cells = (width * height).max(0) as usize;
        MarkGrid {
            width,
            height,
            grid_length,
            walls: Vec::new(),
            wall_mask: vec![false; cells],
            marks: vec![[None, None]; cells],
        }
    }

    /// Number of cell columns.
    pub fn width(&self) -> i64 {
        self.width
    }

    /// Number of cell rows.
    pub fn height(&self) -> i64 {
        self.height
    }

    /// Whether `cell` lies inside the map.
    pub fn in_bounds(&self, cell: Cell) -> bool {
        0 <= cell.x && cell.x < self.width && 0 <= cell.y && cell.y < self.height
    }

    fn idx(&self, cell: Cell) -> usize {
        (cell.y * self.width + cell.x) as usize
    }

    /// Whether `cell` is in bounds and not a wall.
    pub fn passable(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && !self.wall_mask[self.idx(cell)]
    }

    /// Every cell rasterized as a wall, in insertion order.
    pub fn walls(&self) -> &[Cell] {
        &self.walls
    }

    /// The mark table of `cell`, or `None` outside the map.
    pub fn slots(&self, cell: Cell) -> Option<&CellSlots> {
        if self.in_bounds(cell) {
            Some(&self.marks[self.idx(cell)])
        } else {
            None
        }
    }

    /// Number of occupants marked in `cell`, or `None` outside the map.
    pub fn occupant_count(&self, cell: Cell) -> Option<usize> {
        self.slots(cell)
            .map(|slots| slots.iter().flatten().count())
    }

    /// Removes `robot`'s mark from `cell` if present. Out-of-map cells
    /// are ignored (robots enter the maze from the sentinel location).
    pub fn remove_mark(&mut self, cell: Cell, robot: RobotId) {
        if !self.in_bounds(cell) {
            return;
        }
        let idx = self.idx(cell);
        for slot in self.marks[idx].iter_mut() {
            if slot.map(|m| m.robot) == Some(robot) {
                *slot = None;
                return;
            }
        }
    }

    /// Inserts `mark` into `cell`, failing when the cell is missing or
    /// already holds two robots. The caller decides to crash the robot.
    pub fn place_mark(&mut self, cell: Cell, mark: Mark) -> Result<(), MarkError> {
        if !self.in_bounds(cell) {
            warn!("robot {} marked out of the map at ({}, {})", mark.robot, cell.x, cell.y);
            return Err(MarkError::OutOfMap(cell));
        }
        let idx = self.idx(cell);
        let slots = &mut self.marks[idx];
        if slots.iter().flatten().count() >= 2 {
            warn!("cell ({}, {}) is full, robot {} cannot enter", cell.x, cell.y, mark.robot);
            return Err(MarkError::CellFull(cell));
        }
        for slot in slots.iter_mut() {
            if slot.is_none() {
                *slot = Some(mark);
                break;
            }
        }
        Ok(())
    }

    /// The passable subset of the twelve-neighbour template around
    /// `cell`, in template order.
    pub fn passable_neighbors(&self, cell: Cell) -> [Option<Cell>; 12] {
        let mut out = [None; 12];
        for (slot, &(dx, dy)) in NEIGHBOR_OFFSETS.iter().enumerate() {
            let neighbor = cell.offset(dx, dy);
            if self.passable(neighbor) {
                out[slot] = Some(neighbor);
            }
        }
        out
    }

    fn cell_center(&self, cell: Cell) -> (f64, f64) {
        (
            self.grid_length * (cell.x as f64 + 0.5),
            self.grid_length * (cell.y as f64 + 0.5),
        )
    }

    fn push_wall(&mut self, cell: Cell) {
        let idx = self.idx(cell);
        self.wall_mask[idx] = true;
        self.walls.push(cell);
    }

    /// Labels as walls every cell whose center lies within the circle
    /// inflated by the robot radius.
    pub fn rasterize_circle(&mut self, circle: &Circle) {
        let (x, y, r) = (circle.center.x, circle.center.y, circle.radius);
        let left = (((x - r) / self.grid_length).floor() as i64).max(0);
        let bottom = (((y - r) / self.grid_length).floor() as i64).max(0);
        let right = (((x + r) / self.grid_length).floor() as i64 + 1).min(self.width);
        let top = (((y + r) / self.grid_length).floor() as i64 + 1).min(self.height);
        let r_margin = r + ROBOT_RADIUS;

        for i in left..right {
            for j in bottom..top {
                let (cx, cy) = self.cell_center(Cell::new(i, j));
                if (x - cx).powi(2) + (y - cy).powi(2) < r_margin.powi(2) {
                    self.push_wall(Cell::new(i, j));
                }
            }
        }
    }

    /// Labels as walls every cell whose center lies inside the triangle
    /// or within the robot radius of one of its edges.
    pub fn rasterize_triangle(&mut self, tri: &Triangle) {
        let xs = [tri.a.x, tri.b.x, tri.c.x];
        let ys = [tri.a.y, tri.b.y, tri.c.y];
        let min = |v: [f64; 3]| v.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = |v: [f64; 3]| v.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let left = ((min(xs) / self.grid_length).floor() as i64).max(0);
        let bottom = ((min(ys) / self.grid_length).floor() as i64).max(0);
        let right = ((max(xs) / self.grid_length).floor() as i64 + 1).min(self.width);
        let top = ((max(ys) / self.grid_length).floor() as i64 + 1).min(self.height);

        for i in left..right {
            for j in bottom..top {
                let (cx, cy) = self.cell_center(Cell::new(i, j));
                if tri.contains_with_margin(crate::geometry::Point::new(cx, cy), ROBOT_RADIUS) {
                    self.push_wall(Cell::new(i, j));
                }
            }
        }
    }
}

// Weaknesses:
// - Rasterization tests every cell in a shape's bounding box; a large
//   shape on a fine grid pays for cells nowhere near an edge.
// - The wall list keeps duplicates when obstacles overlap; only the mask
//   is consulted for membership, so duplicates cost memory, not answers.
// - remove_mark ignores ids that are not present, which also hides a
//   caller removing from the wrong cell.

// Current Functionality:
// - Rasterizes circles and triangles into robot-radius-inflated wall labels.
// - Enforces the two-robot cell capacity with explicit mark errors.
// - Stores settled facings in marks so neighbours can read chain directions.
// - Serves the twelve-neighbour template with bounds and wall filtering.
