//! Differential steering math.

use super::{MotionIntent, WheelPair};

/// Integer linear interpolation of `value` from `[in_min, in_max]` onto
/// `[out_min, out_max]`, truncating toward zero. Values outside the input
/// range extrapolate. A degenerate input range yields `out_min`.
#[must_use]
pub const fn map_range(value: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    let span = in_max - in_min;
    if span == 0 {
        return out_min;
    }
    (value - in_min) * (out_max - out_min) / span + out_min
}

/// Converts commanded speed and direction into per-wheel percentages.
///
/// The wheel on the outside of the turn keeps full relative speed; the inner
/// wheel slows, stops at `|direction| == 50` and reverses beyond it.
#[must_use]
pub fn wheel_speeds(intent: MotionIntent) -> WheelPair {
    let direction = i32::from(intent.direction);
    let (left_rel, right_rel) = if direction >= 0 {
        (100, map_range(direction, 0, 100, 100, -100))
    } else {
        (map_range(direction, 0, -100, 100, -100), 100)
    };

    let speed = i32::from(intent.speed);
    WheelPair::new(percent(speed * left_rel / 100), percent(speed * right_rel / 100))
}

fn percent(value: i32) -> i16 {
    i16::try_from(value.clamp(-100, 100)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_range_truncates_toward_zero() {
        assert_eq!(map_range(-300, -1000, 1000, -100, 100), -30);
        assert_eq!(map_range(25, 0, 100, 100, -100), 50);
        assert_eq!(map_range(33, 0, 100, 100, -100), 34);
        assert_eq!(map_range(5, 3, 3, 7, 9), 7);
    }

    #[test]
    fn straight_ahead_drives_both_wheels_equally() {
        assert_eq!(wheel_speeds(MotionIntent::new(100, 0)), WheelPair::new(100, 100));
        assert_eq!(wheel_speeds(MotionIntent::new(-70, 0)), WheelPair::new(-70, -70));
    }

    #[test]
    fn full_right_spins_the_right_wheel_backwards() {
        assert_eq!(wheel_speeds(MotionIntent::new(100, 100)), WheelPair::new(100, -100));
    }

    #[test]
    fn left_turns_slow_the_left_wheel() {
        assert_eq!(wheel_speeds(MotionIntent::new(100, -50)), WheelPair::new(0, 100));
        assert_eq!(wheel_speeds(MotionIntent::new(100, -100)), WheelPair::new(-100, 100));
        assert_eq!(wheel_speeds(MotionIntent::new(70, -25)), WheelPair::new(35, 70));
    }

    #[test]
    fn output_rounds_toward_zero() {
        // right_rel = 100 - 2 * 33 = 34; 55 * 34 / 100 = 18.7
        assert_eq!(wheel_speeds(MotionIntent::new(55, 33)), WheelPair::new(55, 18));
        assert_eq!(wheel_speeds(MotionIntent::new(-55, 33)), WheelPair::new(-55, -18));
    }
}
