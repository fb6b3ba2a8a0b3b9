use embassy_time::{Duration, Ticker};
use robot_core::clock::Clock;
use robot_core::robot::Robot;
use robot_core::telemetry::EventCursor;

use super::Board;
use crate::hw::EmbassyClock;

/// Scheduler pass period; every component runs on the millisecond clock.
const PASS_PERIOD: Duration = Duration::from_millis(1);

#[embassy_executor::task]
pub async fn run(robot: &'static mut Robot<Board>) -> ! {
    let clock = EmbassyClock;
    let mut events = EventCursor::new();

    // The load outcome is drained with the first pass's events.
    robot.boot(clock.now());

    let mut ticker = Ticker::every(PASS_PERIOD);
    let mut dropped = 0;
    loop {
        robot.tick(clock.now());

        for record in events.advance(robot.events()) {
            defmt::info!("{}", defmt::Display2Format(record));
        }

        let now_dropped = robot.console().dropped();
        if now_dropped != dropped {
            defmt::warn!("console: {=u32} bytes dropped", now_dropped - dropped);
            dropped = now_dropped;
        }

        ticker.next().await;
    }
}
