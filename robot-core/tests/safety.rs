mod common;

use common::Harness;
use robot_core::drive::{MotionIntent, WheelPair};
use robot_core::safety::{Bumper, BumperMask};
use robot_core::telemetry::EventKind;

#[test]
fn bumper_hit_stops_the_wheels_without_touching_intent() {
    let mut h = Harness::new();
    h.keys(b"wd");
    let intent = h.robot.drive().intent();
    let cruising = h.robot.wheels().last();
    assert_eq!(cruising, WheelPair::new(100, 90));

    h.robot.bumpers_mut().press(Bumper::FrontLeft);
    h.run_for(1);
    assert_eq!(h.robot.wheels().last(), WheelPair::STOPPED);
    assert_eq!(h.robot.drive().intent(), intent, "intent must survive the override");
    assert!(h.robot.lamp().on);

    h.robot.bumpers_mut().release(Bumper::FrontLeft);
    h.run_for(1);
    assert_eq!(
        h.robot.wheels().last(),
        cruising,
        "motion resumes without operator input"
    );
    assert!(!h.robot.lamp().on);
}

#[test]
fn commands_issued_under_override_stay_gated() {
    let mut h = Harness::new();
    h.robot.bumpers_mut().press(Bumper::RearRight);
    h.run_for(1);

    h.key(b's');
    assert_eq!(h.robot.drive().intent(), MotionIntent::new(-100, 0));
    assert_eq!(h.robot.wheels().last(), WheelPair::STOPPED);

    h.robot.bumpers_mut().release(Bumper::RearRight);
    h.run_for(1);
    assert_eq!(h.robot.wheels().last(), WheelPair::new(-100, -100));
}

#[test]
fn safety_is_applied_before_a_command_in_the_same_pass() {
    let mut h = Harness::new();
    h.robot.keyboard_mut().push(b'w');
    h.robot.bumpers_mut().press(Bumper::FrontRight);
    h.run_for(1);

    assert_eq!(h.robot.drive().intent().speed, 100);
    assert!(
        h.robot
            .wheels()
            .history
            .iter()
            .all(|pair| *pair == WheelPair::STOPPED),
        "the wheels must never see the forward command while bumped"
    );
}

#[test]
fn only_mask_changes_are_reported() {
    let mut h = Harness::new();
    h.robot.bumpers_mut().press(Bumper::FrontLeft);
    h.run_for(50);
    h.robot.bumpers_mut().press(Bumper::FrontRight);
    h.run_for(50);
    h.robot.bumpers_mut().release(Bumper::FrontLeft);
    h.robot.bumpers_mut().release(Bumper::FrontRight);
    h.run_for(50);

    let masks: Vec<BumperMask> = h
        .events()
        .into_iter()
        .filter_map(|kind| match kind {
            EventKind::BumpersChanged(mask) => Some(mask),
            _ => None,
        })
        .collect();
    let front_left = BumperMask::CLEAR.with(Bumper::FrontLeft, true);
    assert_eq!(
        masks,
        vec![
            front_left,
            front_left.with(Bumper::FrontRight, true),
            BumperMask::CLEAR,
        ]
    );
}
