//! Maze representation for swarm dispersion
//!
//! A [`Maze`] couples two views of the same world: the geometric view
//! (circles and triangles, kept for observers and rasterization) and the
//! discrete grid view (wall labels inflated by the robot radius plus the
//! per-cell mark table). Robots query and mark the world exclusively
//! through this facade; the maze never initiates calls.

pub mod grid;

use log::warn;

use crate::geometry::{Circle, Point, Triangle};
use crate::swarm::robot::{Robot, RobotId, Status};
use grid::{Cell, CellSlots, Direction, Mark, MarkError, MarkGrid, AXIS_SLOTS};

/// Upper bound on swarm size; used only to size id spaces.
pub const MAX_ROBOTS: usize = 20_000;
/// Physical robot radius in meters; obstacles are inflated by this much
/// on the grid.
pub const ROBOT_RADIUS: f64 = 0.1;
/// Radius within which a robot senses a survivor, meters.
pub const SENSOR_RANGE: f64 = 0.65;
/// Default side length of a grid cell, meters.
pub const DEFAULT_GRID_LENGTH: f64 = 0.5;
/// Radius a robot is drawn with, meters.
pub const DRAW_RADIUS: f64 = 0.05;

/// What a resting robot can observe of its twelve nearest cells.
///
/// The three arrays are parallel and indexed by the slots of
/// [`grid::NEIGHBOR_OFFSETS`]. Occupant counts and facings are resolved
/// only for the eight axis-cardinal slots; `settled_facing[i]` is `Some`
/// only when the slot holds exactly one mark and that mark is settled
/// with a chosen facing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalView {
    /// Whether the slot's cell is missing or labelled as a wall
    pub is_wall: [bool; 12],
    /// Occupants marked in the slot's cell (0, 1 or 2)
    pub occupants: [u8; 12],
    /// Facing of the single settled occupant, if any
    pub settled_facing: [Option<Direction>; 12],
}

/// The world shared by all robots: obstacles, survivors and the marked
/// occupancy grid.
#[derive(Debug, Clone)]
pub struct Maze {
    height: f64,
    width: f64,
    grid_length: f64,
    circles: Vec<Circle>,
    triangles: Vec<Triangle>,
    grid: MarkGrid,
    survivors: Vec<Point>,
}

impl Maze {
    /// Creates an empty maze of `height x width` meters discretized into
    /// square cells of side `grid_length`.
    pub fn new(height: f64, width: f64, grid_length: f64) -> Self {
        Maze {
            height,
            width,
            grid_length,
            circles: Vec::new(),
            triangles: Vec::new(),
            grid: MarkGrid::new(
                (width / grid_length).floor() as i64,
                (height / grid_length).floor() as i64,
                grid_length,
            ),
            survivors: Vec::new(),
        }
    }

    /// Adds an axis-aligned rectangular obstacle given two opposite
    /// corners. Stored as two triangles sharing the main diagonal in both
    /// views.
    pub fn add_rect(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.add_triangle(x1, y1, x2, y2, x1, y2);
        self.add_triangle(x1, y1, x2, y2, x2, y1);
    }

    /// Adds a circular obstacle and rasterizes it onto the grid.
    pub fn add_circle(&mut self, x: f64, y: f64, r: f64) {
        let circle = Circle { center: Point::new(x, y), radius: r };
        if r > 0.0 {
            self.circles.push(circle);
        }
        self.grid.rasterize_circle(&circle);
    }

    /// Adds a triangular obstacle and rasterizes it onto the grid.
    pub fn add_triangle(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        let tri = Triangle {
            a: Point::new(x1, y1),
            b: Point::new(x2, y2),
            c: Point::new(x3, y3),
        };
        self.triangles.push(tri);
        self.grid.rasterize_triangle(&tri);
    }

    /// Places a stationary survivor.
    pub fn add_survivor(&mut self, x: f64, y: f64) {
        self.survivors.push(Point::new(x, y));
    }

    /// The cell containing `point`.
    pub fn cell_of(&self, point: Point) -> Cell {
        Cell::new(
            (point.x / self.grid_length).floor() as i64,
            (point.y / self.grid_length).floor() as i64,
        )
    }

    // Cell used for mark placement: the coordinate is first rounded to
    // `decimals` places, then floor-divided by the grid length. Motion
    // uses 4 decimals so transition cells resolve stably; everything else
    // uses 1.
    fn mark_cell(&self, point: Point, decimals: i32) -> Cell {
        let scale = 10f64.powi(decimals);
        let rx = (point.x * scale).round() / scale;
        let ry = (point.y * scale).round() / scale;
        Cell::new(
            (rx / self.grid_length).floor() as i64,
            (ry / self.grid_length).floor() as i64,
        )
    }

    /// Moves `robot`'s mark from its previous cell to its current cell.
    ///
    /// Crashed robots only vacate their previous cell. On failure the
    /// mark has already been removed and the caller crashes the robot.
    pub fn mark_robot(&mut self, robot: &Robot) -> Result<(), MarkError> {
        let decimals = if robot.status() == Status::Moving { 4 } else { 1 };
        let prev = self.mark_cell(robot.prev_location(), decimals);
        let curr = self.mark_cell(robot.location(), decimals);

        self.grid.remove_mark(prev, robot.id());
        if robot.status() == Status::Crashed {
            return Ok(());
        }
        self.grid.place_mark(
            curr,
            Mark {
                robot: robot.id(),
                settled: robot.status() == Status::Settled,
                facing: if robot.status() == Status::Settled {
                    robot.direction()
                } else {
                    None
                },
            },
        )
    }

    /// Resolves what `robot` can observe of its twelve nearest cells.
    pub fn local_view(&self, robot: &Robot) -> LocalView {
        let base = self.cell_of(robot.location());
        let passable = self.grid.passable_neighbors(base);

        let mut view = LocalView {
            is_wall: [true; 12],
            occupants: [0; 12],
            settled_facing: [None; 12],
        };
        for slot in 0..12 {
            view.is_wall[slot] = passable[slot].is_none();
        }
        for &slot in AXIS_SLOTS.iter() {
            let Some(cell) = passable[slot] else { continue };
            let Some(slots) = self.grid.slots(cell) else { continue };
            let mut occupants = slots.iter().flatten();
            match (occupants.next(), occupants.next()) {
                (Some(mark), None) => {
                    view.occupants[slot] = 1;
                    if mark.settled {
                        view.settled_facing[slot] = mark.facing;
                    }
                }
                (Some(_), Some(_)) => view.occupants[slot] = 2,
                _ => {}
            }
        }
        view
    }

    /// Id of the settled robot in the cell adjacent to `location` in
    /// `direction`, or `None` when no settled robot is marked there. When
    /// two settled robots share the cell the larger id wins.
    pub fn marked_neighbor(&self, location: Point, direction: Direction) -> Option<RobotId> {
        let (dx, dy) = direction.cell_offset();
        let base = self.cell_of(location);
        let cell = Cell::new(base.x + dx, base.y + dy);
        self.grid
            .slots(cell)?
            .iter()
            .flatten()
            .filter(|mark| mark.settled)
            .map(|mark| mark.robot)
            .max()
    }

    /// Whether any survivor lies within `robot`'s sensor range.
    pub fn senses_survivor(&self, robot: &Robot) -> bool {
        let loc = robot.location();
        let range = robot.sensor_range();
        self.survivors
            .iter()
            .any(|s| (s.x - loc.x).powi(2) + (s.y - loc.y).powi(2) < range.powi(2))
    }

    /// Occupant count of `cell`, or `None` outside the map.
    pub fn occupancy_at(&self, cell: Cell) -> Option<usize> {
        self.grid.occupant_count(cell)
    }

    /// Whether the source cell still has a free slot.
    pub fn is_source_open(&self, source: Point) -> bool {
        match self.occupancy_at(self.cell_of(source)) {
            Some(count) => count < 2,
            None => {
                warn!("source {:?} lies outside the map", source);
                false
            }
        }
    }

    /// Map height in meters.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Map width in meters.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Side length of a grid cell in meters.
    pub fn grid_length(&self) -> f64 {
        self.grid_length
    }

    /// Circular obstacles, for observers.
    pub fn circles(&self) -> &[Circle] {
        &self.circles
    }

    /// Triangular obstacles (rectangles appear as their two halves), for
    /// observers.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Wall cells in rasterization order; duplicates are possible.
    pub fn walls(&self) -> &[Cell] {
        self.grid.walls()
    }

    /// Survivor positions.
    pub fn survivors(&self) -> &[Point] {
        &self.survivors
    }

    /// The mark table of `cell`, or `None` outside the map.
    pub fn marks_at(&self, cell: Cell) -> Option<&CellSlots> {
        self.grid.slots(cell)
    }

    /// Whether `cell` is inside the map and not a wall.
    pub fn passable(&self, cell: Cell) -> bool {
        self.grid.passable(cell)
    }
}

// Weaknesses:
// - mark_robot trusts the caller's previous location; nothing audits stale
//   marks left behind by a caller that skipped an upload.
// - Survivor sensing scans the whole survivor list per query; fine for a
//   handful of survivors, wasteful for many.
// Future improvement: rasterize survivor ranges onto the grid like walls.
// - The geometric and grid views are only coupled by construction order;
//   they cannot be cross-checked after the setup phase.

// Current Functionality:
// - Maintains the geometric and the rasterized view of every obstacle.
// - Tracks per-cell robot marks with settled facings for chain queries.
// - Answers the twelve-cell local view, settled-neighbour lookups, source
//   occupancy and survivor sensing for robots.
// - Exposes read-only getters for rendering and tests.
