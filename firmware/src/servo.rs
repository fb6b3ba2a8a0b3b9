#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Wheel percentages to continuous-rotation servo pulses.
//!
//! A continuous-rotation servo treats its "angle" as a velocity: 90° holds
//! still, 0° and 180° are full speed in opposite directions. The servos are
//! mounted facing each other, so the left wheel's angle is mirrored.

use robot_core::drive::{WheelPair, map_range};

/// 50 Hz servo frame.
pub const SERVO_FRAME_US: u32 = 20_000;
/// Pulse width commanding 0°.
pub const MIN_PULSE_US: u32 = 544;
/// Pulse width commanding 180°.
pub const MAX_PULSE_US: u32 = 2_400;

const STOP_ANGLE: u8 = 90;

/// Servo angles for both wheels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServoAngles {
    pub left: u8,
    pub right: u8,
}

impl From<WheelPair> for ServoAngles {
    fn from(wheels: WheelPair) -> Self {
        Self {
            left: 180 - right_angle(wheels.left),
            right: right_angle(wheels.right),
        }
    }
}

/// `map(speed, -100, 100, 0, 180)`.
pub fn right_angle(speed: i16) -> u8 {
    let angle = map_range(i32::from(speed.clamp(-100, 100)), -100, 100, 0, 180);
    u8::try_from(angle).unwrap_or(STOP_ANGLE)
}

pub fn pulse_width_us(angle: u8) -> u32 {
    let angle = i32::from(angle.min(180));
    let min = i32::try_from(MIN_PULSE_US).unwrap_or_default();
    let max = i32::try_from(MAX_PULSE_US).unwrap_or_default();
    u32::try_from(map_range(angle, 0, 180, min, max)).unwrap_or(MIN_PULSE_US)
}

/// Compare value for `angle` on a timer whose full frame counts `max_duty`.
pub fn duty_for(angle: u8, max_duty: u16) -> u16 {
    let duty = pulse_width_us(angle) * u32::from(max_duty) / SERVO_FRAME_US;
    u16::try_from(duty).unwrap_or(max_duty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_maps_onto_the_servo_range() {
        assert_eq!(right_angle(-100), 0);
        assert_eq!(right_angle(0), 90);
        assert_eq!(right_angle(100), 180);
        assert_eq!(right_angle(50), 135);
        assert_eq!(right_angle(i16::MAX), 180);
    }

    #[test]
    fn left_wheel_is_mirrored() {
        assert_eq!(
            ServoAngles::from(WheelPair::new(100, 100)),
            ServoAngles { left: 0, right: 180 }
        );
        assert_eq!(
            ServoAngles::from(WheelPair::STOPPED),
            ServoAngles { left: 90, right: 90 }
        );
    }

    #[test]
    fn pulses_span_the_frame() {
        assert_eq!(pulse_width_us(0), MIN_PULSE_US);
        assert_eq!(pulse_width_us(180), MAX_PULSE_US);
        assert_eq!(pulse_width_us(90), 1_472);
        assert_eq!(duty_for(180, 20_000), 2_400);
        assert_eq!(duty_for(0, 40_000), 1_088);
    }
}
