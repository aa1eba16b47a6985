// src/main.rs
// Demo entry point: builds the large rescue maze, releases the swarm and
// reports the reconstructed source-to-survivor path once a robot senses
// the survivor.

use log::{info, warn};
use myrmex::{Maze, Point, SimConfig, StepOutcome, Swarm};

const NUM_ROBOTS: usize = 3000;
const MAZE_HEIGHT: f64 = 15.0;
const MAZE_WIDTH: f64 = 10.0;
const SOURCE: (f64, f64) = (0.25, 13.75);
const SURVIVOR: (f64, f64) = (9.61, 6.8);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::from_yaml_file(&path)?,
        None => SimConfig::default(),
    };

    info!("simulation started, initializing swarm...");
    let mut swarm = Swarm::from_config(&config);
    info!("adding {} robots to the swarm", NUM_ROBOTS);
    swarm.add_robot_batch(NUM_ROBOTS, Point::new(SOURCE.0, SOURCE.1))?;

    info!("building the maze...");
    let mut maze = Maze::new(MAZE_HEIGHT, MAZE_WIDTH, 0.5);
    build_rescue_maze(&mut maze);
    info!("adding the survivor");
    maze.add_survivor(SURVIVOR.0, SURVIVOR.1);

    for _ in 0..config.max_steps {
        if swarm.step_count() % 1000 == 0 && swarm.step_count() != 0 {
            info!("{} s simulated", swarm.t().round() as i64);
        }
        if swarm.rand_step_update(&mut maze) == StepOutcome::Done {
            break;
        }
    }

    if swarm.survivor_found() {
        info!("survivor found at t = {:.2} s", swarm.t());
        let path = swarm.get_path_to_surv(&maze);
        info!("chain path from source to survivor ({} hops):", path.len());
        for point in &path {
            info!("  ({:.2}, {:.2})", point.x, point.y);
        }
    } else {
        warn!("survivor not found within {} steps", config.max_steps);
    }

    info!("robots activated at least once: {}", swarm.count_first_activated());
    info!("robots crashed: {}", swarm.count_crashed());

    Ok(())
}

// Obstacle layout of the 10 x 15 m rescue scenario: outer walls, an
// office-like block structure, a pillar row, and assorted debris wedges.
fn build_rescue_maze(maze: &mut Maze) {
    maze.add_rect(0.0, 0.0, 0.15, 12.5);
    maze.add_rect(0.0, 0.0, 10.0, 0.1);
    maze.add_rect(9.85, 0.0, 10.0, 15.0);
    maze.add_rect(0.0, 14.9, 10.0, 15.0);
    maze.add_rect(1.25, 0.0, 1.6, 2.5);
    maze.add_rect(1.25, 2.15, 2.3, 2.5);
    maze.add_rect(3.0, 2.15, 3.75, 2.5);
    maze.add_rect(3.4, 0.0, 3.75, 2.5);
    maze.add_rect(0.0, 3.15, 3.75, 3.5);
    maze.add_rect(0.0, 8.5, 3.75, 8.85);
    maze.add_rect(0.0, 12.15, 3.75, 12.5);
    maze.add_rect(3.4, 8.5, 3.75, 11.0);
    maze.add_rect(3.4, 11.5, 3.75, 12.5);
    maze.add_rect(3.4, 3.15, 3.75, 6.0);
    maze.add_rect(3.4, 6.5, 3.75, 8.5);
    maze.add_rect(4.75, 11.53, 10.0, 11.88);
    maze.add_rect(4.75, 8.9, 8.0, 9.25);
    maze.add_rect(8.5, 8.9, 10.0, 9.25);
    maze.add_rect(4.75, 8.9, 5.1, 10.5);
    maze.add_rect(4.75, 11.0, 5.1, 11.88);
    maze.add_rect(6.75, 8.9, 7.1, 9.5);
    maze.add_rect(6.75, 10.0, 7.1, 11.88);
    maze.add_rect(7.4, 6.4, 7.75, 6.75);
    maze.add_rect(7.4, 6.4, 7.75, 8.9);
    maze.add_rect(7.4, 6.4, 10.0, 6.75);
    maze.add_rect(7.4, 7.55, 8.5, 7.9);
    maze.add_rect(9.0, 7.55, 10.0, 7.9);
    maze.add_rect(8.5, 4.5, 10.0, 4.85);
    maze.add_rect(0.0, 5.0, 2.9, 5.2);
    maze.add_rect(4.9, 0.0, 5.25, 2.0);

    maze.add_circle(1.25, 4.0, 0.4);
    maze.add_circle(1.25, 5.9, 0.4);
    maze.add_circle(1.25, 7.8, 0.4);
    maze.add_circle(1.25, 9.7, 0.4);
    maze.add_circle(1.25, 11.6, 0.4);
    maze.add_circle(5.6, 2.0, 0.7);
    maze.add_circle(7.55, 2.0, 0.7);

    maze.add_triangle(7.1, 9.25, 8.0, 9.25, 8.0, 10.0);
    maze.add_triangle(2.7, 13.1, 6.3, 14.0, 5.0, 14.4);
    maze.add_triangle(2.7, 13.1, 1.9, 14.2, 4.25, 14.0);
    maze.add_triangle(6.6, 3.7, 9.55, 4.6, 5.9, 6.4);
    maze.add_triangle(7.1, 15.0, 7.3, 15.0, 8.4, 12.6);
    maze.add_triangle(8.4, 12.6, 8.6, 12.8, 7.3, 15.0);
    maze.add_triangle(5.5, 11.88, 5.7, 11.88, 6.6, 13.66);
    maze.add_triangle(6.6, 13.66, 6.8, 13.77, 5.7, 11.88);
    maze.add_triangle(7.2, 2.4, 10.0, 0.0, 10.0, 3.54);
    maze.add_triangle(7.6, 1.5, 10.0, 2.5, 10.0, 0.0);
    maze.add_triangle(7.1, 9.5, 7.1, 9.0, 8.0, 10.0);
    maze.add_triangle(4.75, 4.37, 5.25, 4.37, 6.6, 6.6);
    maze.add_triangle(6.4, 4.9, 6.7, 6.4, 6.6, 6.6);
    maze.add_triangle(6.6, 6.6, 6.6, 6.0, 6.2, 6.0);
    maze.add_triangle(6.25, 6.25, 5.4, 8.0, 5.6, 8.0);
    maze.add_triangle(6.4, 6.25, 6.6, 6.6, 5.6, 8.0);
    maze.add_triangle(6.25, 6.25, 6.5, 6.25, 5.6, 7.9);
}

// SWOT Analysis
// Strengths:
// - Integration: exercises maze, swarm and robots end to end in one realistic scenario.
// - Demo-Ready: logs the reconstructed path and final counters for quick inspection.
// - Reproducibility: a YAML config with a seed replays a run exactly.
//
// Weaknesses:
// - Hard-Coded Scenario: maze layout, swarm size and survivor live in constants.
// - Single-Threaded: robots act one at a time; a 3000-robot swarm simulates slowly.
// - Log-Only Output: no frame or path export for animation tooling.
//
// Opportunities:
// - Scenario Files: load obstacle sets from YAML next to SimConfig.
// - Visualization: feed the observer getters into a plotting frontend.
// - Benchmarking: reuse this loop for activation-rate and crash-rate sweeps.
//
// Threats:
// - Parameter Drift: constants here can diverge from the scenarios the tests pin down.
// - Long Runs: a maze with an unreachable survivor only stops at max_steps.
