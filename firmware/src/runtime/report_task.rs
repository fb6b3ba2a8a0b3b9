use embassy_time::{Duration, Ticker};
use robot_core::commands::CommandId;

use crate::status::published;

const REPORT_PERIOD: Duration = Duration::from_secs(1);

/// Logs the published status once a second.
#[embassy_executor::task]
pub async fn run() -> ! {
    let mut ticker = Ticker::every(REPORT_PERIOD);
    loop {
        ticker.next().await;
        let status = published();
        let line = status.line.unwrap_or_default();
        defmt::info!(
            "status t={=u32}ms mode={=str} last={=str} speed={=i16} dir={=i16} wheels={=i16}/{=i16} bumpers={=u8:04b} line={=u16}/{=u16} learn={=bool} frames={=u32}",
            status.at,
            status.mode.name(),
            status.last_command.map_or("none", CommandId::name),
            status.speed,
            status.direction,
            status.wheels.left,
            status.wheels.right,
            status.bumpers.bits(),
            line.left,
            line.right,
            status.learning,
            status.frames,
        );
    }
}
