// Robot actuator over simulated backends

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::Instant;

use robo_rs::config::Config;
use robo_rs::engine;
use robo_rs::hardware::{
    Actuator, ActuatorError, HardwareContext, SimulatedGpio, SimulatedMotorDriver, SimulatedServoDriver,
    SimulatedSpeech,
};
use robo_rs::motion::{Direction, DriveCommand, WheelThrottle};
use robo_rs::program::compile;
use robo_rs::{Angle, Level, Robot, Side};

struct Rig {
    gpio: SimulatedGpio,
    servos: SimulatedServoDriver,
    motors: SimulatedMotorDriver,
    speech: SimulatedSpeech,
    robot: Robot,
}

fn rig() -> Rig {
    let gpio = SimulatedGpio::new();
    let servos = SimulatedServoDriver::new();
    let motors = SimulatedMotorDriver::new();
    let speech = SimulatedSpeech::with_playback(Duration::from_millis(500));
    let hw = HardwareContext::new(
        Box::new(gpio.clone()),
        Box::new(servos.clone()),
        Box::new(motors.clone()),
        Box::new(speech.clone()),
    );
    let robot = Robot::new(hw, &Config::default());
    Rig { gpio, servos, motors, speech, robot }
}

fn full(direction: Direction) -> WheelThrottle {
    WheelThrottle { direction, percent: 100 }
}

#[tokio::test(start_paused = true)]
async fn test_initialize_rests_every_actuator() {
    let rig = rig();
    rig.robot.initialize().await.unwrap();

    assert_eq!(rig.gpio.claimed(), 4);
    assert_eq!(rig.gpio.level(17), Some(Level::Low));
    assert_eq!(rig.servos.position(0), Some(Angle::OUT));
    assert_eq!(rig.servos.position(1), Some(Angle::OUT));
    assert_eq!(rig.motors.commands(), vec![DriveCommand::Disable]);
}

#[tokio::test(start_paused = true)]
async fn test_arm_ramps_one_degree_per_tick() {
    let rig = rig();
    rig.robot.initialize().await.unwrap();
    let before = rig.servos.writes().len();

    let start = Instant::now();
    rig.robot.move_arm(Side::Left, Angle::UP).await.unwrap();
    let elapsed = start.elapsed();

    // 90 steps of 10ms from the resting position.
    assert!(elapsed >= Duration::from_millis(900));
    assert!(elapsed < Duration::from_millis(1000));

    let writes = &rig.servos.writes()[before..];
    assert_eq!(writes.len(), 90);
    assert_eq!(writes[0], (0, Angle::new(89).unwrap()));
    assert!(writes.windows(2).all(|w| w[0].1.degrees() == w[1].1.degrees() + 1));
    assert_eq!(rig.servos.position(0), Some(Angle::UP));
    assert_eq!(rig.robot.arm_position(Side::Left).await, Angle::UP);
}

#[tokio::test(start_paused = true)]
async fn test_inverted_arm_mirrors_servo_angle() {
    let rig = rig();
    rig.robot.initialize().await.unwrap();

    rig.robot.move_arm(Side::Right, Angle::UP).await.unwrap();
    assert_eq!(rig.robot.arm_position(Side::Right).await, Angle::UP);
    assert_eq!(rig.servos.position(1), Some(Angle::DOWN));
}

#[tokio::test(start_paused = true)]
async fn test_repeated_arm_move_is_idempotent() {
    let rig = rig();
    rig.robot.initialize().await.unwrap();
    let before = rig.servos.writes().len();

    let start = Instant::now();
    rig.robot.move_arm(Side::Left, Angle::OUT).await.unwrap();
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(rig.servos.writes().len(), before);
}

#[tokio::test(start_paused = true)]
async fn test_eye_settles_before_switching() {
    let rig = rig();
    rig.robot.initialize().await.unwrap();

    let start = Instant::now();
    rig.robot.set_eye_state(Side::Left, Level::High).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(50));
    assert_eq!(rig.gpio.level(17), Some(Level::High));
    assert_eq!(rig.gpio.level(27), Some(Level::Low));

    rig.robot.set_antenna_state(Side::Right, Level::High).await.unwrap();
    assert_eq!(rig.gpio.level(23), Some(Level::High));
}

#[tokio::test(start_paused = true)]
async fn test_outputs_require_initialize() {
    let rig = rig();
    let err = rig.robot.set_eye_state(Side::Right, Level::High).await.unwrap_err();
    assert!(matches!(err, ActuatorError::UnknownPin(27)));
}

#[tokio::test(start_paused = true)]
async fn test_move_base_drives_then_disables() {
    let rig = rig();
    let start = Instant::now();
    rig.robot.move_base(0.0, 1.0, Duration::from_secs(3)).await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(3));

    assert_eq!(
        rig.motors.commands(),
        vec![
            DriveCommand::Drive { left: full(Direction::Forward), right: full(Direction::Forward) },
            DriveCommand::Disable,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_move_base_rejects_out_of_range_axis() {
    let rig = rig();
    let err = rig.robot.move_base(1.5, 0.0, Duration::from_secs(1)).await.unwrap_err();
    assert!(matches!(err, ActuatorError::Validation(_)));
    assert!(rig.motors.commands().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_releases_everything() {
    let rig = rig();
    rig.robot.initialize().await.unwrap();
    rig.robot.set_eye_state(Side::Left, Level::High).await.unwrap();

    rig.robot.shutdown().await.unwrap();
    assert_eq!(rig.gpio.claimed(), 0);
    assert!(rig.servos.is_released());
    assert_eq!(rig.motors.last(), Some(DriveCommand::Disable));
}

#[tokio::test(start_paused = true)]
async fn test_program_runs_end_to_end() {
    let rig = rig();
    rig.robot.initialize().await.unwrap();
    let Rig { gpio, servos, motors, speech, robot } = rig;

    let (queue, engine) = engine::channel(robot, &Config::default().engine);
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let program = compile([
        "[",
        "move both arms up",
        "set both eyes on",
        "say Hello",
        "]",
        "go",
        "set left antenna on",
    ])
    .unwrap();
    assert_eq!(queue.enqueue_program(program).unwrap(), 3);
    drop(queue);

    let start = Instant::now();
    let stats = engine.run(shutdown_rx).await.unwrap();
    assert_eq!(stats.groups_completed, 3);
    assert_eq!(stats.actions_completed, 7);
    assert_eq!(stats.actions_failed, 0);

    // Arms (900ms) dominate the first group, then three seconds of driving.
    assert!(start.elapsed() >= Duration::from_millis(3900));

    assert_eq!(speech.spoken(), vec!["Hello".to_string()]);
    assert_eq!(servos.position(0), Some(Angle::UP));
    assert_eq!(servos.position(1), Some(Angle::DOWN));
    assert!(servos.is_released());
    assert_eq!(gpio.claimed(), 0);
    assert_eq!(
        motors.commands(),
        vec![
            DriveCommand::Disable,
            DriveCommand::Drive { left: full(Direction::Forward), right: full(Direction::Forward) },
            DriveCommand::Disable,
            DriveCommand::Disable,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_mid_group_disables_motors_and_lowers_outputs() {
    let rig = rig();
    rig.robot.initialize().await.unwrap();
    let Rig { gpio, motors, robot, .. } = rig;

    let (queue, engine) = engine::channel(robot, &Config::default().engine);
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    queue.enqueue_program(compile(["[", "go", "set left eye on", "]"]).unwrap()).unwrap();
    let handle = tokio::spawn(engine.run(shutdown_rx));

    // The eye is lit and the base is still driving.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(gpio.level(17), Some(Level::High));
    assert!(matches!(motors.last(), Some(DriveCommand::Drive { .. })));

    shutdown_tx.send(()).unwrap();
    let stats = handle.await.unwrap().unwrap();

    assert_eq!(stats.groups_completed, 0);
    assert_eq!(motors.last(), Some(DriveCommand::Disable));
    assert_eq!(gpio.claimed(), 0);
    assert_eq!(gpio.level(17), None);
}
