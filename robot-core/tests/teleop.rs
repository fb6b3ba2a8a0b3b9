mod common;

use common::{Harness, Mock, parts};
use robot_core::commands::{CommandId, MemoryStore};
use robot_core::config::{DEFAULT_TASK_ORDER, NEC_REPEAT_CODE, RobotConfig, ScheduleConfig};
use robot_core::drive::{MotionIntent, WheelPair};
use robot_core::input::InputSymbol;
use robot_core::robot::Robot;
use robot_core::scheduler::{ScheduleError, TaskId};
use robot_core::telemetry::EventKind;

#[test]
fn forward_drives_both_wheels_at_full_speed() {
    let mut h = Harness::new();
    h.key(b'w');

    assert_eq!(h.robot.drive().intent(), MotionIntent::new(100, 0));
    assert_eq!(h.robot.wheels().last(), WheelPair::new(100, 100));
    assert_eq!(h.robot.executor().last_command(), Some(CommandId::Forward));
}

#[test]
fn full_right_spins_in_place() {
    let mut h = Harness::new();
    h.key(b'w');
    for _ in 0..20 {
        h.key(b'd');
    }

    assert_eq!(h.robot.drive().intent(), MotionIntent::new(100, 100));
    assert_eq!(h.robot.wheels().last(), WheelPair::new(100, -100));

    h.key(b'd');
    assert_eq!(
        h.robot.drive().intent().direction,
        100,
        "turning past the bound should clamp"
    );
}

#[test]
fn stop_keeps_direction_and_speed_steps_clamp() {
    let mut h = Harness::new();
    h.keys(b"wa");
    h.key(b' ');
    assert_eq!(h.robot.drive().intent(), MotionIntent::new(0, -5));
    assert_eq!(h.robot.wheels().last(), WheelPair::STOPPED);

    h.keys(b"wwww");
    h.key(b'+');
    assert_eq!(h.robot.drive().intent().speed, 100);
    h.key(b'-');
    assert_eq!(h.robot.drive().intent().speed, 95);
}

#[test]
fn unbound_input_is_reported_and_ignored() {
    let mut h = Harness::new();
    h.key(b'w');
    h.key(b'#');

    assert_eq!(h.robot.drive().intent(), MotionIntent::new(100, 0));
    assert!(
        h.events()
            .contains(&EventKind::InvalidInput(InputSymbol::Key(b'#'))),
        "invalid input should be logged"
    );
    // Remote bindings start empty, so every code is invalid.
    h.ir(0x00FF_18E7);
    assert!(
        h.events()
            .contains(&EventKind::InvalidInput(InputSymbol::Code(0x00FF_18E7)))
    );
}

#[test]
fn arrivals_inside_the_minimum_delay_are_dropped() {
    let mut h = Harness::new();
    h.robot.keyboard_mut().push(b'w');
    h.robot.keyboard_mut().push(b's');
    h.run_for(common::KEY_GAP);

    assert_eq!(
        h.robot.drive().intent().speed,
        100,
        "the second key arrived 1 ms after the first and must be discarded"
    );
    assert_eq!(h.robot.executor().executed(), 1);
}

#[test]
fn held_keys_decode_with_repeat_counts() {
    let mut h = Harness::new();
    for _ in 0..3 {
        h.robot.keyboard_mut().push(b'a');
        h.run_for(150);
    }

    let repeats: Vec<u8> = h
        .events()
        .into_iter()
        .filter_map(|kind| match kind {
            EventKind::CommandDecoded { repeat_count, .. } => Some(repeat_count),
            _ => None,
        })
        .collect();
    assert_eq!(repeats, vec![0, 1, 2]);
    assert_eq!(h.robot.drive().intent().direction, -15);
}

#[test]
fn remote_repeat_marker_counts_as_the_previous_code() {
    let mut h = Harness::new();
    // Teach the remote one code for Forward, leave the rest unbound.
    h.keys(b"li");
    h.ir(0x00FF_629D);
    h.keys(&[b'\r'; 8]);
    h.key(b'n');
    assert!(!h.robot.decoder().is_learning());

    h.robot.remote_mut().push(0x00FF_629D);
    h.run_for(150);
    h.robot.remote_mut().push(NEC_REPEAT_CODE);
    h.run_for(150);

    let decoded: Vec<EventKind> = h
        .events()
        .into_iter()
        .filter(|kind| matches!(kind, EventKind::CommandDecoded { .. }))
        .collect();
    assert_eq!(
        decoded,
        vec![
            EventKind::CommandDecoded {
                id: CommandId::Forward,
                repeat_count: 0
            },
            EventKind::CommandDecoded {
                id: CommandId::Forward,
                repeat_count: 1
            },
        ]
    );
}

#[test]
fn info_prints_a_report_without_moving() {
    let mut h = Harness::new();
    h.key(b'i');

    assert_eq!(h.robot.drive().intent(), MotionIntent::default());
    assert!(h.console().contains("mode=manual last=none"));
    assert!(h.console().contains("Slow down  key=- ir=none"));
}

#[test]
fn status_display_refreshes_every_hundred_millis() {
    let mut h = Harness::new();
    h.key(b'w');
    h.run_for(700);

    let frames = &h.robot.display().rendered;
    assert_eq!(frames.len(), 10, "1000 ms of ticks should render ten frames");
    assert_eq!(frames[0].at, 0);
    assert_eq!(frames[1].at, 100);
    let last = frames.last().expect("frames rendered");
    assert_eq!(last.last_command, Some(CommandId::Forward));
    assert_eq!(last.wheels, WheelPair::new(100, 100));
}

#[test]
fn default_schedule_runs_safety_first() {
    let h = Harness::new();
    assert_eq!(h.robot.scheduler().order(), DEFAULT_TASK_ORDER);
    assert_eq!(h.robot.scheduler().order().first(), Some(&TaskId::Safety));
}

#[test]
fn invalid_schedules_are_refused() {
    let config = RobotConfig {
        schedule: ScheduleConfig::new(&[]),
        ..RobotConfig::default()
    };
    let result = Robot::<Mock>::new(parts(MemoryStore::new()), config);
    assert!(matches!(result, Err(ScheduleError::Empty)));

    let config = RobotConfig {
        schedule: ScheduleConfig::new(&[TaskId::Safety, TaskId::Decoder, TaskId::Safety]),
        ..RobotConfig::default()
    };
    let result = Robot::<Mock>::new(parts(MemoryStore::new()), config);
    assert!(matches!(
        result,
        Err(ScheduleError::Duplicate(TaskId::Safety))
    ));
}
