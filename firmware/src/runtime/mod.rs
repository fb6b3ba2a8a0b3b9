use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::adc::{Adc, AdcChannel};
use embassy_stm32::flash::Flash;
use embassy_stm32::gpio::{Input, Level, Output, OutputType, Pull, Speed};
use embassy_stm32::time::Hertz;
use embassy_stm32::timer::low_level::CountingMode;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::pipe::Pipe;
use robot_core::config::RobotConfig;
use robot_core::input::NoInput;
use robot_core::robot::{Platform, PlatformParts, Robot};
use static_cell::StaticCell;

use crate::console::{CONSOLE_PIPE_LEN, ConsoleWriter, KEY_QUEUE_DEPTH, KeyQueue};
use crate::hw::{AdcLineSensors, BumperPins, Lamp, ServoWheels};
use crate::status::SharedStatus;
use crate::storage::FlashStore;

mod control_task;
mod report_task;
mod uart_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

defmt::timestamp!("{=u64:ms}", embassy_time::Instant::now().as_millis());

pub(super) type KeyChannel = Channel<CriticalSectionRawMutex, u8, KEY_QUEUE_DEPTH>;
pub(super) type ConsolePipe = Pipe<CriticalSectionRawMutex, CONSOLE_PIPE_LEN>;

pub(super) static KEYS: KeyChannel = Channel::new();
pub(super) static CONSOLE: ConsolePipe = Pipe::new();
static ROBOT: StaticCell<Robot<Board>> = StaticCell::new();

/// The hardware this binary runs on.
pub enum Board {}

impl Platform for Board {
    type Keyboard = KeyQueue<'static, CriticalSectionRawMutex, KEY_QUEUE_DEPTH>;
    type Remote = NoInput<u32>;
    type Bumpers = BumperPins;
    type Lamp = Lamp;
    type Line = AdcLineSensors;
    type Wheels = ServoWheels;
    type Store = FlashStore;
    type Console = ConsoleWriter<'static, CriticalSectionRawMutex, CONSOLE_PIPE_LEN>;
    type Display = SharedStatus;
}

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA0,
        PA1,
        PA2,
        PA3,
        PA4,
        PA5,
        PA6,
        PB0,
        PB1,
        PB4,
        PB5,
        ADC1,
        TIM3,
        USART2,
        FLASH,
        ..
    } = hal::init(config);

    let servos = SimplePwm::new(
        TIM3,
        Some(PwmPin::new(PB4, OutputType::PushPull)),
        Some(PwmPin::new(PB5, OutputType::PushPull)),
        None,
        None,
        Hertz(50),
        CountingMode::EdgeAlignedUp,
    );

    let parts = PlatformParts::<Board> {
        keyboard: KeyQueue::new(KEYS.receiver()),
        remote: NoInput::new(),
        bumpers: BumperPins::new([
            Input::new(PA0, Pull::Up),
            Input::new(PA1, Pull::Up),
            Input::new(PA4, Pull::Up),
            Input::new(PA6, Pull::Up),
        ]),
        lamp: Lamp::new(Output::new(PA5, Level::Low, Speed::Low)),
        line: AdcLineSensors::new(Adc::new(ADC1), PB0.degrade_adc(), PB1.degrade_adc()),
        wheels: ServoWheels::new(servos),
        store: FlashStore::new(Flash::new_blocking(FLASH)),
        console: ConsoleWriter::new(&CONSOLE),
        display: SharedStatus,
    };

    let robot = match Robot::new(parts, RobotConfig::default()) {
        Ok(robot) => ROBOT.init(robot),
        Err(err) => {
            defmt::error!("robot: {}", defmt::Display2Format(&err));
            return;
        }
    };

    if spawner
        .spawn(uart_task::run(&KEYS, &CONSOLE, USART2, PA2, PA3))
        .is_err()
    {
        defmt::error!("failed to spawn console UART task");
    }
    if spawner.spawn(report_task::run()).is_err() {
        defmt::error!("failed to spawn status report task");
    }
    if spawner.spawn(control_task::run(robot)).is_err() {
        defmt::error!("failed to spawn control task");
    }

    core::future::pending::<()>().await;
}
