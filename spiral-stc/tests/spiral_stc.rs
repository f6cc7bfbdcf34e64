//! Spiral-STC coverage tests on simulated maps.
//!
//! Each map character is one whole cell, so the map's exact obstacle probe
//! stands in for the laser. Verifies:
//! - Dead-end corridor: N cells out, N cells back, then completion
//! - Start facing a wall: the robot turns round into the space behind it
//! - Open and cluttered rooms: every free cell visited, moves between
//!   neighbouring cells only
//!
//! Run with: `cargo test --test spiral_stc`

use approx::assert_relative_eq;
use spiral_stc::config::PlanConfig;
use spiral_stc::geometry::{Point, Pose, Vector};
use spiral_stc::plans::{CoveragePlan, MoveIntent, SpiralStc};
use spiral_stc::sim::GridWorld;

const ROBOT_SIZE: f64 = 1.0;
const CELL: f64 = 2.0 * ROBOT_SIZE;

struct Run {
    plan: SpiralStc,
    targets: Vec<Point>,
    completed: bool,
}

/// Drive the planner from the map's spawn until it completes.
fn cover(map: &str, heading: Vector) -> (GridWorld, Run) {
    let world = GridWorld::from_ascii(map, CELL).unwrap();
    let start = world.spawn().unwrap();
    let config = PlanConfig {
        robot_size: ROBOT_SIZE,
        ..Default::default()
    };
    let mut plan = SpiralStc::new(&config, Pose::new(start, heading));

    let mut pose = Pose::new(start, heading);
    let mut targets = Vec::new();
    let mut completed = false;
    for _ in 0..500 {
        let obstacles = world.probe(&pose, CELL);
        match plan.next_move(&pose, obstacles) {
            MoveIntent::GoTo(target) => {
                assert_relative_eq!(target.distance(pose.position), CELL, epsilon = 1e-9);
                assert!(
                    world.is_region_free(target, CELL),
                    "drove into blocked cell at {:?}",
                    target
                );
                pose = Pose::new(target, target - pose.position);
                targets.push(target);
            }
            MoveIntent::Hold => panic!("base planner never holds"),
            MoveIntent::Complete => {
                completed = true;
                break;
            }
        }
    }

    (
        world,
        Run {
            plan,
            targets,
            completed,
        },
    )
}

fn assert_all_free_visited(world: &GridWorld, run: &Run) {
    let start = world.spawn().unwrap();
    for square in world.free_squares() {
        assert!(
            square.approx_eq(start, 1e-9) || run.targets.iter().any(|t| t.approx_eq(square, 1e-9)),
            "free cell {:?} never visited",
            square
        );
    }
}

#[test]
fn test_dead_end_corridor() {
    let map = "\
########
#S.....#
########
";
    let (world, run) = cover(map, Vector::EAST);
    let start = world.spawn().unwrap();
    let n = 5;

    assert!(run.completed);
    assert_eq!(run.targets.len(), 2 * n);
    for (i, target) in run.targets[..n].iter().enumerate() {
        assert!(target.approx_eq(start + Vector::EAST * (CELL * (i + 1) as f64), 1e-9));
    }
    for (i, target) in run.targets[n..].iter().enumerate() {
        assert!(target.approx_eq(start + Vector::EAST * (CELL * (n - 1 - i) as f64), 1e-9));
    }

    let report = run.plan.report();
    assert_eq!(report.discovered, n + 1);
    assert_eq!(report.covered, n + 1);
    assert_eq!(report.backtracks, n);
    assert!(report.complete);
}

#[test]
fn test_start_facing_a_wall_covers_the_corridor_behind() {
    let map = "\
#######
#....S#
#######
";
    let (world, run) = cover(map, Vector::EAST);
    let start = world.spawn().unwrap();

    assert!(run.completed);
    assert_all_free_visited(&world, &run);
    assert!(run.targets[0].approx_eq(start + Vector::WEST * CELL, 1e-9));

    let report = run.plan.report();
    assert_eq!(report.discovered, world.free_squares().len());
    assert_eq!(report.discovered, 5);
    assert_eq!(report.backtracks, 4);
    assert_eq!(run.targets.len(), 8);
}

#[test]
fn test_open_room_with_free_cell_behind_start() {
    // The cell south of the spawn starts out behind the robot.
    let map = "\
#######
#.....#
#.....#
#..S..#
#.....#
#######
";
    let (world, run) = cover(map, Vector::NORTH);

    assert!(run.completed);
    assert_all_free_visited(&world, &run);
    let report = run.plan.report();
    assert_eq!(report.discovered, 20);
    assert_eq!(report.covered, 20);
    assert_eq!(report.uncovered_quadrants, 0);
    // Every tree edge is walked once out and once back.
    assert_eq!(run.targets.len(), 2 * (report.discovered - 1));
}

#[test]
fn test_room_with_pillars() {
    let map = "\
########
#......#
#.##.#.#
#...S#.#
#.#....#
########
";
    let (world, run) = cover(map, Vector::WEST);

    assert!(run.completed);
    assert_all_free_visited(&world, &run);
    let report = run.plan.report();
    assert_eq!(report.discovered, world.free_squares().len());
    assert_eq!(report.partial, 0);
}
