//! Swarm container and simulation driver
//!
//! The [`Swarm`] owns the robot list and advances the whole population in
//! lockstep: every tick it samples activations, samples crashes on crash
//! ticks, and lets each robot act in ascending id order. Once a settled
//! robot senses a survivor, the discovery is propagated back along the
//! settled chain and the simulation reports completion.

pub mod robot;

use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geometry::Point;
use crate::maze::grid::Direction;
use crate::maze::{Maze, MAX_ROBOTS};
use crate::{SimConfig, SwarmError};
use robot::{Robot, RobotId, Status};

/// Result of one simulation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The survivor has not been found yet
    Continuing,
    /// A robot has sensed the survivor and the report reached the chain
    Done,
}

/// The robot population and the global simulation state.
#[derive(Debug)]
pub struct Swarm {
    robots: Vec<Robot>, // ids are 1-based; the list is 0-based
    survivor_found: bool,
    next_first_entry: usize,
    step_length: f64,
    t: f64,
    step_count: u64,
    step_per_crash: u64,
    source_id: Option<RobotId>,
    activation_rate: f64,
    crash_rate: f64,
    serial_entry: bool,
    activation_rng: StdRng,
    crash_rng: StdRng,
}

impl Swarm {
    /// Creates an empty swarm with entropy-seeded randomness and default
    /// activation behaviour.
    pub fn new(step_length: f64, t: f64) -> Self {
        Self::build(step_length, t, 1.0, 0.0, true, None)
    }

    /// Creates an empty swarm from a [`SimConfig`].
    pub fn from_config(config: &SimConfig) -> Self {
        Self::build(
            config.step_length,
            0.0,
            config.activation_rate,
            config.crash_rate,
            config.serial_entry,
            config.rng_seed,
        )
    }

    fn build(
        step_length: f64,
        t: f64,
        activation_rate: f64,
        crash_rate: f64,
        serial_entry: bool,
        seed: Option<u64>,
    ) -> Self {
        // independent streams for activation and crash draws, so enabling
        // crashes does not perturb the activation sequence
        let (activation_rng, crash_rng) = match seed {
            Some(seed) => (
                StdRng::seed_from_u64(seed),
                StdRng::seed_from_u64(seed.wrapping_add(1)),
            ),
            None => (StdRng::from_entropy(), StdRng::from_entropy()),
        };
        Swarm {
            robots: Vec::new(),
            survivor_found: false,
            next_first_entry: 0,
            step_length,
            t,
            step_count: 0,
            step_per_crash: (30.0 / step_length).round() as u64,
            source_id: None,
            activation_rate,
            crash_rate,
            serial_entry,
            activation_rng,
            crash_rng,
        }
    }

    /// Appends `count` robots referencing the same source point.
    ///
    /// The whole batch is refused when it would push the swarm past
    /// [`MAX_ROBOTS`] or when the survivor has already been found.
    pub fn add_robot_batch(&mut self, count: usize, source: Point) -> Result<(), SwarmError> {
        if self.survivor_found {
            return Err(SwarmError::AddAfterDiscovery);
        }
        let total = self.robots.len() + count;
        if total > MAX_ROBOTS {
            error!("cannot add {} robots, swarm would hold {}", count, total);
            return Err(SwarmError::TooManyRobots { requested: total });
        }
        for _ in 0..count {
            let id = self.robots.len() + 1;
            self.robots
                .push(Robot::new(id, source, self.step_length, self.crash_rate));
        }
        Ok(())
    }

    /// Advances the simulation by one tick.
    ///
    /// Order within a tick is part of the contract: activation draws for
    /// every robot first, then each robot in ascending id order is
    /// crash-tested (on crash ticks), moved, and checked for survivor
    /// contact.
    pub fn rand_step_update(&mut self, maze: &mut Maze) -> StepOutcome {
        if self.survivor_found {
            return StepOutcome::Done;
        }
        self.t += self.step_length;
        self.step_count += 1;
        self.rand_activation(maze);
        let crash_tick = self.step_count % self.step_per_crash == 0;
        for idx in 0..self.robots.len() {
            if crash_tick {
                self.robots[idx].crash_with_prob(maze, &mut self.crash_rng);
            }
            self.robots[idx].advance(maze);
            if self.robots[idx].status() == Status::Settled
                && maze.senses_survivor(&self.robots[idx])
            {
                let detector = self.robots[idx].id();
                self.propagate_report(maze, detector);
                self.survivor_found = true;
                info!("dispersion ended at {:.2} s", self.t);
                return StepOutcome::Done;
            }
        }
        StepOutcome::Continuing
    }

    /// Samples the activation process for every robot and wakes the
    /// candidates.
    ///
    /// Each robot draws an exponential waiting time; it is a candidate
    /// when the draw falls inside the tick. With serialized entry a robot
    /// that never entered the maze may only do so when the entry cursor
    /// points at it, which admits first entries in id order while letting
    /// recycled robots re-activate freely.
    fn rand_activation(&mut self, maze: &mut Maze) {
        let beta = 1.0 / self.activation_rate;
        let candidates: Vec<bool> = (0..self.robots.len())
            .map(|_| {
                let u: f64 = self.activation_rng.gen();
                -beta * (1.0 - u).ln() < self.step_length
            })
            .collect();

        if self.serial_entry {
            for (idx, &candidate) in candidates.iter().enumerate() {
                if !candidate {
                    continue;
                }
                if self.robots[idx].first_activated() {
                    self.robots[idx].activate(maze);
                } else if self.next_first_entry == idx {
                    if let Some(id) = self.robots[idx].activate(maze) {
                        self.source_id = Some(id);
                    }
                    if self.robots[idx].first_activated() {
                        self.next_first_entry += 1;
                    }
                }
            }
        } else {
            for (idx, &candidate) in candidates.iter().enumerate() {
                if candidate {
                    if let Some(id) = self.robots[idx].activate(maze) {
                        self.source_id = Some(id);
                    }
                }
            }
        }
    }

    /// Walks the settled chain from the detector back to the source,
    /// stamping the next-hop direction on every link.
    fn propagate_report(&mut self, maze: &Maze, detector: RobotId) {
        info!(
            "robot {} sensed the survivor, propagating toward the source",
            detector
        );
        self.robots[detector - 1].flag_survivor();
        let mut current = detector;
        loop {
            let (at_source, direction, location) = {
                let r = &self.robots[current - 1];
                (r.at_source(), r.direction(), r.location())
            };
            if at_source {
                info!("survivor report has reached the source");
                return;
            }
            let Some(direction) = direction else {
                warn!("robot {} has no upstream to report to", current);
                return;
            };
            let Some(next) = maze.marked_neighbor(location, direction) else {
                warn!("survivor report chain broken at robot {}", current);
                return;
            };
            self.robots[next - 1].receive_report(direction);
            current = next;
        }
    }

    /// Reconstructs the source-to-survivor path from the stamped chain.
    ///
    /// Returns an empty path before discovery. A hop with no settled
    /// robot behind it stops the walk with an error; a terminal robot
    /// that never sensed the survivor is reported rather than silently
    /// accepted.
    pub fn get_path_to_surv(&self, maze: &Maze) -> Vec<Point> {
        let mut path = Vec::new();
        if !self.survivor_found {
            return path;
        }
        let Some(source_id) = self.source_id else {
            return path;
        };
        let mut id = source_id;
        path.push(self.robots[id - 1].location());
        while let Some(hop) = self.robots[id - 1].next_in_path() {
            match maze.marked_neighbor(self.robots[id - 1].location(), hop) {
                Some(next) => {
                    id = next;
                    path.push(self.robots[id - 1].location());
                }
                None => {
                    error!(
                        "path reconstruction stopped, no settled robot {:?} of robot {}",
                        hop, id
                    );
                    return path;
                }
            }
        }
        if !self.robots[id - 1].found_survivor() {
            warn!("path ends at robot {} which never sensed the survivor", id);
        }
        path
    }

    /// Number of robots in the swarm.
    pub fn num_robots(&self) -> usize {
        self.robots.len()
    }

    /// The robot with the given 1-based id, for observers.
    pub fn robot(&self, id: RobotId) -> Option<&Robot> {
        if id == 0 {
            return None;
        }
        self.robots.get(id - 1)
    }

    /// Number of robots that have entered the maze at least once.
    pub fn count_first_activated(&self) -> usize {
        self.robots.iter().filter(|r| r.first_activated()).count()
    }

    /// Number of crashed robots.
    pub fn count_crashed(&self) -> usize {
        self.robots
            .iter()
            .filter(|r| r.status() == Status::Crashed)
            .count()
    }

    /// Current simulation time in seconds.
    pub fn t(&self) -> f64 {
        self.t
    }

    /// Number of ticks simulated so far.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Tick length in seconds.
    pub fn step_length(&self) -> f64 {
        self.step_length
    }

    /// Id of the robot anchoring the chain at the source, once recorded.
    pub fn source_id(&self) -> Option<RobotId> {
        self.source_id
    }

    /// Whether a survivor has been found.
    pub fn survivor_found(&self) -> bool {
        self.survivor_found
    }

    /// Compass facing of the robot with the given id, for observers.
    pub fn robot_direction(&self, id: RobotId) -> Option<Direction> {
        self.robot(id).and_then(|r| r.direction())
    }

    /// Location and drawn radius of the robot with the given id, for
    /// observers.
    pub fn robot_geometry(&self, id: RobotId) -> Option<(Point, f64)> {
        self.robot(id).map(|r| (r.location(), r.radius()))
    }
}

// Weaknesses:
// - The robot loop is sequential; parallelizing a tick would require
//   per-cell locking of the mark table.
// - Activation draws one sample per robot per tick even when the swarm is
//   mostly settled.
// Future improvement: draw next-activation times once and keep a schedule.
// - Propagation assumes chain facings never form a cycle; a corrupted mark
//   table could walk forever.

// Current Functionality:
// - Creates robot batches bound to one source point, capped at MAX_ROBOTS.
// - Steps the population in id order with exponential activation and
//   periodic crash draws from two independently seeded streams.
// - Propagates survivor reports along the settled chain and rebuilds the
//   source-to-survivor path.
// - Reports per-run counters for activated and crashed robots.
