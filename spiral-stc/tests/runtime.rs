//! End-to-end runtime tests.
//!
//! Runs the sensor and coverage threads against a simulated robot: the
//! laser-derived obstacle flags, odometry frame and move execution all go
//! through the same code paths as the binary.
//!
//! Run with: `cargo test --test runtime`

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use spiral_stc::commands::{OperatorCommand, create_command_channel};
use spiral_stc::config::{PlanKind, StcConfig};
use spiral_stc::geometry::Point;
use spiral_stc::robot::{RobotDriver, SharedDriver};
use spiral_stc::shared::{CancellationToken, SharedState};
use spiral_stc::sim::{GridWorld, SimulatedRobot};
use spiral_stc::threads::spawn_threads;

const ROOM: &str = "\
#######
#.....#
#.....#
#..S..#
#.....#
#.....#
#######
";

const SMALL_ROOM: &str = "\
######
#....#
#....#
#....#
#.S..#
######
";

fn test_config(plan: PlanKind, auto_run: bool) -> StcConfig {
    let mut config = StcConfig::default();
    config.plan.name = plan;
    config.plan.robot_size = 1.0;
    config.control.sensor_period_ms = 1;
    config.control.decision_period_ms = 1;
    config.control.status_interval_secs = 60;
    config.control.auto_run = auto_run;
    if plan == PlanKind::SpiralStc {
        // Whole-cell moves: the laser has to see into the next cell.
        config.sensing.threshold_range = 1.8;
    }
    config
}

fn simulated(map: &str, config: &StcConfig) -> Arc<Mutex<SimulatedRobot>> {
    let world = GridWorld::from_ascii(map, config.plan.robot_size).unwrap();
    let mut robot = SimulatedRobot::from_config(world, &config.plan, &config.simulation).unwrap();
    robot.connect().unwrap();
    Arc::new(Mutex::new(robot))
}

fn wait_until(timeout: Duration, done: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    done()
}

fn visited(trail: &[Point], square: Point) -> bool {
    trail.iter().any(|p| p.approx_eq(square, 1e-6))
}

#[test]
fn test_spiral_stc_covers_room() {
    let config = test_config(PlanKind::SpiralStc, true);
    let robot = simulated(ROOM, &config);
    let driver: SharedDriver = robot.clone();
    let state = Arc::new(SharedState::new(CancellationToken::new()));
    let (_commands_tx, commands_rx) = create_command_channel();

    let handles = spawn_threads(config, Arc::clone(&state), driver, commands_rx).unwrap();
    let finished = wait_until(Duration::from_secs(30), || {
        state.is_coverage_complete() || state.is_safety_stop()
    });
    state.signal_shutdown();
    handles.sensor.join().unwrap();
    handles.coverage.join().unwrap();

    assert!(finished, "coverage did not finish");
    assert!(
        state.is_coverage_complete(),
        "safety stop: {:?}",
        state.safety_reason()
    );

    let report = state.report().unwrap();
    assert!(report.complete);
    // Cells are two squares wide: a 5x5 room holds 3x3 of them.
    assert_eq!(report.discovered, 9);
    assert_eq!(report.covered, 9);

    let robot = robot.lock();
    let spawn = robot.world().spawn().unwrap();
    for dx in [-2.0, 0.0, 2.0] {
        for dy in [-2.0, 0.0, 2.0] {
            let cell = Point::new(spawn.x + dx, spawn.y + dy);
            assert!(visited(robot.trail(), cell), "cell {:?} not visited", cell);
        }
    }
    assert!(robot.trail().last().unwrap().approx_eq(spawn, 1e-6));
}

#[test]
fn test_full_spiral_stc_covers_every_square() {
    let config = test_config(PlanKind::FullSpiralStc, true);
    let robot = simulated(SMALL_ROOM, &config);
    let driver: SharedDriver = robot.clone();
    let state = Arc::new(SharedState::new(CancellationToken::new()));
    let (_commands_tx, commands_rx) = create_command_channel();

    let handles = spawn_threads(config, Arc::clone(&state), driver, commands_rx).unwrap();
    let finished = wait_until(Duration::from_secs(30), || {
        state.is_coverage_complete() || state.is_safety_stop()
    });
    state.signal_shutdown();
    handles.sensor.join().unwrap();
    handles.coverage.join().unwrap();

    assert!(finished, "coverage did not finish");
    assert!(
        state.is_coverage_complete(),
        "safety stop: {:?}",
        state.safety_reason()
    );
    let report = state.report().unwrap();
    assert_eq!(report.uncovered_quadrants, 0);

    let robot = robot.lock();
    for square in robot.world().free_squares() {
        assert!(visited(robot.trail(), square), "square {:?} not visited", square);
    }
}

#[test]
fn test_waits_for_run_command() {
    let config = test_config(PlanKind::SpiralStc, false);
    let robot = simulated(ROOM, &config);
    let driver: SharedDriver = robot.clone();
    let state = Arc::new(SharedState::new(CancellationToken::new()));
    let (commands_tx, commands_rx) = create_command_channel();

    let handles = spawn_threads(config, Arc::clone(&state), driver, commands_rx).unwrap();

    // Snapshots flow but nothing moves before 'r'.
    assert!(wait_until(Duration::from_secs(5), || state.scan_count() > 5));
    assert!(state.report().is_none());
    assert!(!robot.lock().is_powered());
    assert_eq!(robot.lock().trail().len(), 1);

    commands_tx.send(OperatorCommand::Run).unwrap();
    assert!(wait_until(Duration::from_secs(30), || state.is_coverage_complete()));
    assert!(robot.lock().is_powered());

    state.signal_shutdown();
    handles.sensor.join().unwrap();
    handles.coverage.join().unwrap();
    assert!(state.report().unwrap().complete);
}

#[test]
fn test_quit_stops_an_idle_runtime() {
    let config = test_config(PlanKind::FullSpiralStc, false);
    let robot = simulated(SMALL_ROOM, &config);
    let driver: SharedDriver = robot.clone();
    let state = Arc::new(SharedState::new(CancellationToken::new()));
    let (commands_tx, commands_rx) = create_command_channel();

    let handles = spawn_threads(config, Arc::clone(&state), driver, commands_rx).unwrap();
    commands_tx.send(OperatorCommand::ToggleLogging).unwrap();
    commands_tx.send(OperatorCommand::Quit).unwrap();

    assert!(wait_until(Duration::from_secs(5), || state.should_shutdown()));
    handles.sensor.join().unwrap();
    handles.coverage.join().unwrap();
    assert!(state.is_obstacle_logging());
    assert!(!state.is_coverage_complete());
}

#[test]
fn test_shipped_config_and_map_load() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let config = StcConfig::load(&dir.join("spiral-stc.toml")).unwrap();
    assert_eq!(config.plan.name, PlanKind::FullSpiralStc);

    let world = GridWorld::load(dir.join(&config.simulation.map_path), config.plan.robot_size).unwrap();
    assert!(world.spawn().is_some());
    assert!(SimulatedRobot::from_config(world, &config.plan, &config.simulation).is_ok());
}
