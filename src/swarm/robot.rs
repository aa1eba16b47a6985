// src/swarm/robot.rs

// The per-robot local-rule state machine. A robot only ever observes the
// twelve nearest grid cells through the maze, writes its own cell marks
// back through the maze, and otherwise keeps purely private state.

use log::info;
use rand::rngs::StdRng;
use rand::Rng;

use crate::geometry::{Point, Vector, DIST_EPS};
use crate::maze::grid::Direction;
use crate::maze::{Maze, DEFAULT_GRID_LENGTH, DRAW_RADIUS, SENSOR_RANGE};

/// Robot identifier, unique within a swarm. Ids start at 1; robot lists
/// are 0-indexed internally.
pub type RobotId = usize;

/// Lifecycle state of a robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Not in the maze yet, or standing down between activations
    Inactive,
    /// In the maze, standing still, evaluating the local rules
    Resting,
    /// Committed to a cell as a chain member
    Settled,
    /// Between two cells
    Moving,
    /// Permanently failed
    Crashed,
}

/// A single swarm member.
#[derive(Debug, Clone)]
pub struct Robot {
    id: RobotId,
    location: Point,
    prev_location: Point,
    status: Status,
    first_activated: bool,
    source: Point,
    grid_length: f64,
    step_length: f64,
    speed: f64,
    move_vector: Vector, // always a unit vector
    move_target: Point,
    settled_after_moving: bool,
    direction: Option<Direction>,
    planned_direction: Option<Direction>,
    found_survivor: bool,
    next_in_path: Option<Direction>,
    crash_rate: f64,
}

impl Robot {
    /// Creates an inactive robot at the sentinel location (-1, -1).
    pub fn new(id: RobotId, source: Point, step_length: f64, crash_rate: f64) -> Self {
        Robot {
            id,
            location: Point::new(-1.0, -1.0),
            prev_location: Point::new(-1.0, -1.0),
            status: Status::Inactive,
            first_activated: false,
            source,
            grid_length: DEFAULT_GRID_LENGTH,
            step_length,
            speed: 1.0,
            move_vector: Vector::new(1.0, 0.0),
            move_target: Point::new(0.0, 0.0),
            settled_after_moving: false,
            direction: None,
            planned_direction: None,
            found_survivor: false,
            next_in_path: None,
            crash_rate,
        }
    }

    /// Wakes an inactive robot.
    ///
    /// A robot entering the maze for the first time teleports to the
    /// source if its cell has a free slot; the very first robot to ever
    /// enter settles there and anchors the chain, in which case its id is
    /// returned for the swarm to record. Robots that already entered once
    /// simply resume evaluating the local rules where they stand.
    pub fn activate(&mut self, maze: &mut Maze) -> Option<RobotId> {
        if self.status != Status::Inactive {
            return None;
        }
        self.status = Status::Resting;
        if self.first_activated {
            return None;
        }
        match maze.occupancy_at(maze.cell_of(self.source)) {
            Some(count) if count < 2 => {
                self.location = self.source;
                self.first_activated = true;
                if count == 0 {
                    self.status = Status::Settled;
                    self.upload(maze);
                    return Some(self.id);
                }
                self.upload(maze);
                None
            }
            // source cell filled (or off the map): cannot insert now
            _ => {
                self.status = Status::Inactive;
                None
            }
        }
    }

    /// Advances the robot by one simulation tick.
    pub fn advance(&mut self, maze: &mut Maze) {
        match self.status {
            Status::Inactive | Status::Settled | Status::Crashed => {}
            Status::Moving => self.advance_along_move(maze),
            Status::Resting => self.apply_local_rules(maze),
        }
    }

    fn advance_along_move(&mut self, maze: &mut Maze) {
        self.prev_location = self.location;
        self.location += self.move_vector * self.speed * self.step_length;
        if (self.move_target - self.location).norm() < DIST_EPS {
            if self.settled_after_moving {
                self.status = Status::Settled;
                self.direction = self.planned_direction;
            } else {
                // move complete; stand down until the next activation
                self.status = Status::Inactive;
            }
        }
        self.upload(maze);
    }

    fn apply_local_rules(&mut self, maze: &mut Maze) {
        let view = maze.local_view(self);

        // A settled neighbour pointing back at this cell marks a chain to
        // extend: step onto it without settling.
        for dir in Direction::ALL {
            if view.settled_facing[dir.adjacent_slot()] == Some(dir.opposite()) {
                self.begin_move(dir, None);
                return;
            }
        }
        // Otherwise drop into an empty corridor two cells deep and settle
        // there, pointing back the way we came.
        for dir in Direction::ALL {
            let near = dir.adjacent_slot();
            if !view.is_wall[near]
                && view.occupants[near] == 0
                && view.occupants[dir.two_away_slot()] == 0
            {
                self.begin_move(dir, Some(dir.opposite()));
                return;
            }
        }
    }

    fn begin_move(&mut self, dir: Direction, settle_facing: Option<Direction>) {
        self.move_vector = dir.unit();
        self.move_target = self.location + self.move_vector * self.grid_length;
        self.status = Status::Moving;
        self.settled_after_moving = settle_facing.is_some();
        self.planned_direction = settle_facing;
    }

    /// Uploads status and location to the maze; a refused mark crashes
    /// the robot.
    fn upload(&mut self, maze: &mut Maze) {
        if maze.mark_robot(self).is_err() {
            self.crash(maze);
        }
    }

    /// Fails the robot permanently and vacates its cell. Inactive and
    /// settled robots are exempt.
    pub fn crash(&mut self, maze: &mut Maze) {
        if !matches!(self.status, Status::Resting | Status::Moving) {
            return;
        }
        info!("robot {} has crashed", self.id);
        self.status = Status::Crashed;
        self.direction = None;
        self.prev_location = self.location;
        self.upload(maze);
    }

    /// Draws from the swarm's crash stream and crashes the robot when the
    /// draw falls below its crash rate. Rates at or below 0.2% are
    /// treated as zero and consume no draw.
    pub fn crash_with_prob(&mut self, maze: &mut Maze, rng: &mut StdRng) {
        if self.crash_rate > 0.002 && rng.gen::<f64>() < self.crash_rate {
            self.crash(maze);
        }
    }

    /// Records an incoming survivor report arriving from a downstream
    /// neighbour that faces `from`.
    pub(crate) fn receive_report(&mut self, from: Direction) {
        self.found_survivor = true;
        self.next_in_path = Some(from.opposite());
    }

    pub(crate) fn flag_survivor(&mut self) {
        self.found_survivor = true;
    }

    /// Whether the robot stands at the source point.
    pub fn at_source(&self) -> bool {
        (self.location - self.source).norm() < DIST_EPS
    }

    /// Robot id (1-based).
    pub fn id(&self) -> RobotId {
        self.id
    }

    /// Current location in the continuous plane.
    pub fn location(&self) -> Point {
        self.location
    }

    /// Location at the start of the last motion tick.
    pub fn prev_location(&self) -> Point {
        self.prev_location
    }

    /// Current lifecycle state.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Compass facing while settled.
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Whether the robot has ever entered the maze.
    pub fn first_activated(&self) -> bool {
        self.first_activated
    }

    /// Direction of the next chain member on the reconstructed path.
    pub fn next_in_path(&self) -> Option<Direction> {
        self.next_in_path
    }

    /// Whether the robot sensed the survivor or relayed a report.
    pub fn found_survivor(&self) -> bool {
        self.found_survivor
    }

    /// Entry point this robot materializes at.
    pub fn source(&self) -> Point {
        self.source
    }

    /// Radius the robot is drawn with, meters.
    pub fn radius(&self) -> f64 {
        DRAW_RADIUS
    }

    /// Survivor sensing radius, meters.
    pub fn sensor_range(&self) -> f64 {
        SENSOR_RANGE
    }
}

// Weaknesses:
// - Rule evaluation is strictly ordered with no backoff; a robot boxed in
//   by transients re-checks the same dead rules every tick.
// Future improvement: skip rule evaluation until a neighbouring mark changes.
// - A move's target cell is only claimed in transit, never reserved, so two
//   robots can commit to the same cell; capacity then crashes the loser.
// - Crash clearing re-derives the vacated cell at 1-decimal precision; a
//   crash early in a transit can miss the mark left near the old cell.
// Future improvement: remember the exact marked cell instead of re-deriving it.

// Current Functionality:
// - Activates robots at the source, settling the very first as chain anchor.
// - Follows settled neighbours or settles into open corridors using the
//   eight-rule priority list.
// - Advances transit moves tick by tick, settling or standing down on arrival.
// - Crashes irrecoverably on refused marks or unlucky crash draws.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::grid::Cell;

    fn open_maze() -> Maze {
        Maze::new(3.0, 3.0, 0.5)
    }

    // Places a settled robot with the given facing so its mark is visible
    // to neighbours.
    fn settle_at(maze: &mut Maze, id: RobotId, x: f64, y: f64, facing: Option<Direction>) -> Robot {
        let mut robot = Robot::new(id, Point::new(x, y), 0.01, 0.0);
        robot.location = Point::new(x, y);
        robot.prev_location = Point::new(x, y);
        robot.status = Status::Settled;
        robot.direction = facing;
        maze.mark_robot(&robot).expect("settling in an open cell");
        robot
    }

    fn resting_at(id: RobotId, x: f64, y: f64) -> Robot {
        let mut robot = Robot::new(id, Point::new(x, y), 0.01, 0.0);
        robot.location = Point::new(x, y);
        robot.prev_location = Point::new(x, y);
        robot.status = Status::Resting;
        robot.first_activated = true;
        robot
    }

    #[test]
    fn follows_settled_neighbor_over_empty_corridor() {
        let mut maze = open_maze();
        // Left-adjacent cell holds a settled robot facing right, i.e.
        // pointing back at the observer. The down corridor is wide open,
        // yet following the chain must win.
        settle_at(&mut maze, 1, 0.75, 1.25, Some(Direction::Right));
        let mut robot = resting_at(2, 1.25, 1.25);

        robot.advance(&mut maze);

        assert_eq!(robot.status, Status::Moving);
        assert_eq!(robot.move_vector, Direction::Left.unit());
        assert!(!robot.settled_after_moving);
        assert_eq!(robot.planned_direction, None);
    }

    #[test]
    fn settles_into_first_open_corridor_when_no_chain_nearby() {
        let mut maze = open_maze();
        // The settled neighbour faces away, so no chain rule applies; the
        // left corridor is blocked by its occupant and the robot settles
        // downward instead.
        settle_at(&mut maze, 1, 0.75, 1.25, Some(Direction::Left));
        let mut robot = resting_at(2, 1.25, 1.25);

        robot.advance(&mut maze);

        assert_eq!(robot.status, Status::Moving);
        assert_eq!(robot.move_vector, Direction::Down.unit());
        assert!(robot.settled_after_moving);
        assert_eq!(robot.planned_direction, Some(Direction::Up));
    }

    #[test]
    fn stays_resting_when_every_rule_is_blocked() {
        let mut maze = Maze::new(1.5, 1.5, 0.5);
        // A 3x3-cell map whose border is all wall leaves the center cell
        // with no passable axis neighbour.
        maze.add_rect(0.0, 0.0, 1.5, 0.5);
        maze.add_rect(0.0, 1.0, 1.5, 1.5);
        maze.add_rect(0.0, 0.0, 0.5, 1.5);
        maze.add_rect(1.0, 0.0, 1.5, 1.5);
        let mut robot = resting_at(1, 0.75, 0.75);

        robot.advance(&mut maze);

        assert_eq!(robot.status, Status::Resting);
    }

    #[test]
    fn arrival_settles_with_planned_direction() {
        let mut maze = open_maze();
        let mut robot = resting_at(1, 1.25, 1.25);
        robot.begin_move(Direction::Left, Some(Direction::Right));

        // 0.5 m at speed 1.0 with 0.01 s ticks: 50 ticks to arrive.
        for _ in 0..50 {
            robot.advance(&mut maze);
        }

        assert_eq!(robot.status, Status::Settled);
        assert_eq!(robot.direction, Some(Direction::Right));
        let cell = maze.cell_of(robot.location);
        let mark = maze.marks_at(cell).unwrap()[0].expect("settled mark present");
        assert!(mark.settled);
        assert_eq!(mark.facing, Some(Direction::Right));
    }

    #[test]
    fn arrival_without_settling_stands_down() {
        let mut maze = open_maze();
        let mut robot = resting_at(1, 1.25, 1.25);
        robot.begin_move(Direction::Left, None);

        for _ in 0..50 {
            robot.advance(&mut maze);
        }

        assert_eq!(robot.status, Status::Inactive);
        assert!(robot.first_activated);
        // a fresh activation resumes in place, without teleporting back
        let resumed = robot.activate(&mut maze);
        assert_eq!(resumed, None);
        assert_eq!(robot.status, Status::Resting);
        assert_eq!(robot.location, Point::new(0.75, 1.25));
    }

    #[test]
    fn arriving_in_a_full_cell_crashes_the_intruder() {
        let mut maze = open_maze();
        settle_at(&mut maze, 1, 0.75, 1.25, None);
        settle_at(&mut maze, 2, 0.75, 1.25, None);
        let mut robot = resting_at(3, 1.25, 1.25);
        // force a move into the full cell, bypassing the rules
        robot.begin_move(Direction::Left, None);

        for _ in 0..50 {
            robot.advance(&mut maze);
            if robot.status == Status::Crashed {
                break;
            }
        }

        assert_eq!(robot.status, Status::Crashed);
        // a crashed robot appears in no cell's marks
        let full = maze.marks_at(Cell::new(1, 2)).unwrap();
        assert!(full.iter().flatten().all(|m| m.robot != 3));
    }

    #[test]
    fn two_settlers_can_share_a_cell_and_the_larger_id_wins() {
        let mut maze = open_maze();
        // Both robots pick the same empty cell before either mark exists
        // to block the other, approach from opposite sides and settle.
        let mut west = resting_at(2, 0.75, 1.25);
        let mut east = resting_at(5, 1.75, 1.25);
        west.begin_move(Direction::Right, Some(Direction::Left));
        east.begin_move(Direction::Left, Some(Direction::Right));

        for _ in 0..50 {
            west.advance(&mut maze);
            east.advance(&mut maze);
        }

        assert_eq!(west.status, Status::Settled);
        assert_eq!(east.status, Status::Settled);
        let shared = Cell::new(2, 2);
        let marks = maze.marks_at(shared).unwrap();
        assert_eq!(marks.iter().flatten().count(), 2);
        assert!(marks.iter().flatten().all(|m| m.settled));

        // decode from any adjacent cell: the larger settled id wins
        let found = maze.marked_neighbor(Point::new(1.75, 1.25), Direction::Left);
        assert_eq!(found, Some(5));
        let found = maze.marked_neighbor(Point::new(0.75, 1.25), Direction::Right);
        assert_eq!(found, Some(5));
    }

    // Walks a full transit and checks the 4-decimal mark placement: the
    // robot holds exactly one mark at every tick and its cell membership
    // flips from origin to target exactly once, with no flicker around
    // the cell boundary.
    fn assert_single_mark_handover(start: Point, dir: Direction, origin: Cell, target: Cell) {
        let mut maze = open_maze();
        let mut robot = resting_at(1, start.x, start.y);
        robot.begin_move(dir, Some(dir.opposite()));

        let mut in_target = false;
        let mut handovers = 0;
        for tick in 0..50 {
            robot.advance(&mut maze);
            let at_origin = maze.marks_at(origin).unwrap().iter().flatten().count();
            let at_target = maze.marks_at(target).unwrap().iter().flatten().count();
            assert_eq!(
                at_origin + at_target,
                1,
                "mark lost or duplicated at tick {}",
                tick
            );
            if (at_target == 1) != in_target {
                in_target = at_target == 1;
                handovers += 1;
            }
        }
        assert!(in_target, "mark never reached the target cell");
        assert_eq!(handovers, 1, "cell membership flickered during transit");
        assert_eq!(robot.status, Status::Settled);
    }

    #[test]
    fn westward_transit_hands_the_mark_over_exactly_once() {
        assert_single_mark_handover(
            Point::new(1.25, 1.25),
            Direction::Left,
            Cell::new(2, 2),
            Cell::new(1, 2),
        );
    }

    #[test]
    fn eastward_transit_hands_the_mark_over_exactly_once() {
        assert_single_mark_handover(
            Point::new(0.75, 1.25),
            Direction::Right,
            Cell::new(1, 2),
            Cell::new(2, 2),
        );
    }
}
