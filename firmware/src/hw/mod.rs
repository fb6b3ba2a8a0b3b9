//! Board adapters implementing the `robot-core` hardware seams.
//!
//! Pin map:
//!
//! | Function            | Pin(s)             |
//! |---------------------|--------------------|
//! | Bumpers FL/FR/RL/RR | PA0, PA1, PA4, PA6 |
//! | Bump lamp           | PA5                |
//! | Line sensors L/R    | PB0, PB1 (ADC1)    |
//! | Wheel servos L/R    | PB4, PB5 (TIM3)    |
//! | Console UART        | PA2 TX, PA3 RX     |

#![cfg(target_os = "none")]

use embassy_stm32::adc::{Adc, AnyAdcChannel, Resolution, SampleTime};
use embassy_stm32::gpio::{Input, Level, Output};
use embassy_stm32::peripherals::{ADC1, TIM3};
use embassy_stm32::timer::simple_pwm::SimplePwm;
use embassy_time::Instant;
use robot_core::clock::{Clock, Millis};
use robot_core::drive::{WheelActuator, WheelPair};
use robot_core::line_follow::{LineReading, LineSensors};
use robot_core::safety::{BUMPER_COUNT, Bumper, BumperSensors, Indicator};

use crate::servo::{ServoAngles, duty_for};

/// Milliseconds since boot, wrapping like the core expects.
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now(&self) -> Millis {
        let wrapped = Instant::now().as_millis() & u64::from(Millis::MAX);
        Millis::try_from(wrapped).unwrap_or_default()
    }
}

/// Pulled-up bumper switches; pressed reads low.
pub struct BumperPins {
    inputs: [Input<'static>; BUMPER_COUNT],
}

impl BumperPins {
    pub fn new(inputs: [Input<'static>; BUMPER_COUNT]) -> Self {
        Self { inputs }
    }
}

impl BumperSensors for BumperPins {
    fn level(&mut self, bumper: Bumper) -> Option<bool> {
        self.inputs.get(bumper.as_index()).map(Input::is_high)
    }
}

pub struct Lamp {
    pin: Output<'static>,
}

impl Lamp {
    pub fn new(pin: Output<'static>) -> Self {
        Self { pin }
    }
}

impl Indicator for Lamp {
    fn set(&mut self, on: bool) {
        self.pin.set_level(Level::from(on));
    }
}

/// Two reflectance sensors sampled at 10 bits, matching the line thresholds.
pub struct AdcLineSensors {
    adc: Adc<'static, ADC1>,
    left: AnyAdcChannel<ADC1>,
    right: AnyAdcChannel<ADC1>,
}

impl AdcLineSensors {
    pub fn new(
        mut adc: Adc<'static, ADC1>,
        left: AnyAdcChannel<ADC1>,
        right: AnyAdcChannel<ADC1>,
    ) -> Self {
        adc.set_resolution(Resolution::BITS10);
        adc.set_sample_time(SampleTime::CYCLES79_5);
        Self { adc, left, right }
    }
}

impl LineSensors for AdcLineSensors {
    fn read(&mut self) -> LineReading {
        let left = self.adc.blocking_read(&mut self.left);
        let right = self.adc.blocking_read(&mut self.right);
        LineReading::new(left, right)
    }
}

/// Continuous-rotation servos on TIM3 channels 1 (left) and 2 (right).
pub struct ServoWheels {
    pwm: SimplePwm<'static, TIM3>,
}

impl ServoWheels {
    pub fn new(mut pwm: SimplePwm<'static, TIM3>) -> Self {
        pwm.ch1().enable();
        pwm.ch2().enable();
        let mut wheels = Self { pwm };
        wheels.set_wheels(WheelPair::STOPPED);
        wheels
    }
}

impl WheelActuator for ServoWheels {
    fn set_wheels(&mut self, wheels: WheelPair) {
        let angles = ServoAngles::from(wheels);
        let max = self.pwm.max_duty_cycle();
        self.pwm.ch1().set_duty_cycle(duty_for(angles.left, max));
        self.pwm.ch2().set_duty_cycle(duty_for(angles.right, max));
    }
}
