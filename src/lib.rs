//! Myrmex - dispersive swarm simulation for maze search and rescue
//!
//! This library simulates a swarm of homogeneous, locally sensing robots
//! released into a cluttered 2D maze from a single source point. Robots
//! disperse along corridors using purely local rules, settle into a chain
//! of beacons, and once one of them senses a stationary survivor the
//! discovery propagates back along the settled chain so a
//! source-to-survivor path can be reconstructed.
//!
//! The three core components are [`Maze`] (obstacles plus a marked
//! occupancy grid), [`Robot`] (the per-robot local-rule state machine) and
//! [`Swarm`] (the lockstep simulation driver).

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod geometry;
pub mod maze;
pub mod swarm;

// Re-export commonly used items for easier access
pub use geometry::{Circle, Point, Triangle, Vector, DIST_EPS};
pub use maze::grid::{Cell, CellSlots, Direction, Mark, MarkError};
pub use maze::{Maze, DEFAULT_GRID_LENGTH, DRAW_RADIUS, MAX_ROBOTS, ROBOT_RADIUS, SENSOR_RANGE};
pub use swarm::robot::{Robot, RobotId, Status};
pub use swarm::{StepOutcome, Swarm};

/// Simulation parameters shared by the swarm and the driver loop.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SimConfig {
    /// Simulation tick length in seconds
    pub step_length: f64,
    /// Poisson rate (lambda) of the per-robot activation process
    pub activation_rate: f64,
    /// Per-robot crash probability applied on crash ticks
    pub crash_rate: f64,
    /// Serialize first entries in id order (recycled robots are exempt)
    pub serial_entry: bool,
    /// Seed for deterministic replay; `None` seeds from entropy
    pub rng_seed: Option<u64>,
    /// Upper bound on simulation ticks for the driver loop
    pub max_steps: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            step_length: 0.01,
            activation_rate: 1.0,
            crash_rate: 0.0,
            serial_entry: true,
            rng_seed: None,
            max_steps: 1_000_000,
        }
    }
}

impl SimConfig {
    /// Loads a configuration from a YAML file.
    pub fn from_yaml_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let file = std::fs::File::open(path)?;
        let config: SimConfig = serde_yaml::from_reader(file)?;
        Ok(config)
    }
}

/// Swarm construction error types
#[derive(Debug, PartialEq, Eq)]
pub enum SwarmError {
    /// A robot batch would push the swarm past the supported maximum
    TooManyRobots {
        /// Total robot count the batch would have produced
        requested: usize,
    },
    /// Robots cannot be added once the survivor has been found
    AddAfterDiscovery,
}

impl std::fmt::Display for SwarmError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SwarmError::TooManyRobots { requested } => write!(
                f,
                "cannot add robots: {} exceeds the maximum of {}",
                requested, MAX_ROBOTS
            ),
            SwarmError::AddAfterDiscovery => {
                write!(f, "cannot add robots after the survivor has been found")
            }
        }
    }
}

impl std::error::Error for SwarmError {}
