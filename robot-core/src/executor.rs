//! Turns decoded commands into motion and mode changes.

use core::fmt::Write;

use crate::commands::{BindingTable, CommandId};
use crate::decoder::DecodedCommand;
use crate::drive::{DriveTrain, WheelActuator};
use crate::input::Channel;
use crate::line_follow::{LineFollower, LineSensors};
use crate::status::{StatusFormatter, StatusSnapshot};

/// Collaborators borrowed for one command.
pub struct ExecutionContext<'a, W, L, C: ?Sized> {
    pub drive: &'a mut DriveTrain<W>,
    pub follower: &'a mut LineFollower<L>,
    pub console: &'a mut C,
    /// Read-only view for the info report.
    pub bindings: &'a BindingTable,
    pub status: &'a StatusSnapshot,
}

/// Command executor.
#[derive(Clone, Copy, Debug, Default)]
pub struct CommandExecutor {
    last: Option<CommandId>,
    executed: u32,
}

impl CommandExecutor {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: None,
            executed: 0,
        }
    }

    /// Last command executed, for the status display.
    #[must_use]
    pub const fn last_command(&self) -> Option<CommandId> {
        self.last
    }

    #[must_use]
    pub const fn executed(&self) -> u32 {
        self.executed
    }

    pub fn execute<W, L, C>(
        &mut self,
        command: DecodedCommand,
        ctx: &mut ExecutionContext<'_, W, L, C>,
    ) -> CommandId
    where
        W: WheelActuator,
        L: LineSensors,
        C: Write + ?Sized,
    {
        match command.id {
            CommandId::Forward => ctx.drive.forward(),
            CommandId::Reverse => ctx.drive.reverse(),
            CommandId::Left => ctx.drive.left(),
            CommandId::Right => ctx.drive.right(),
            CommandId::SpeedUp => ctx.drive.speed_up(),
            CommandId::SlowDown => ctx.drive.slow_down(),
            CommandId::Brake => {
                ctx.follower.deactivate();
                ctx.drive.stop();
            }
            CommandId::Demo => {
                if !ctx.follower.is_active() {
                    ctx.drive.stop();
                    ctx.follower.activate();
                }
            }
            CommandId::Info => {
                // Console output is best-effort.
                let _ = write_info(ctx.console, ctx.status, ctx.bindings);
            }
            // Decoded learn commands never reach the executor.
            CommandId::Learn => {}
        }

        self.last = Some(command.id);
        self.executed = self.executed.wrapping_add(1);
        command.id
    }
}

fn write_info<C: Write + ?Sized>(
    console: &mut C,
    status: &StatusSnapshot,
    bindings: &BindingTable,
) -> core::fmt::Result {
    let formatter = StatusFormatter::new(status);
    console.write_char('\n')?;
    formatter.write_mode_line(console)?;
    console.write_char('\n')?;
    formatter.write_motion_line(console)?;
    console.write_char('\n')?;
    formatter.write_sensor_line(console)?;
    console.write_char('\n')?;
    for id in CommandId::ALL {
        writeln!(
            console,
            "  {:<10} key={} ir={}",
            id.name(),
            bindings.binding(id, Channel::Keyboard),
            bindings.binding(id, Channel::Remote)
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DriveConfig, LineFollowConfig};
    use crate::drive::{MotionIntent, NoopWheels};
    use crate::line_follow::{LineReading, LineSensors};

    struct OnLine;

    impl LineSensors for OnLine {
        fn read(&mut self) -> LineReading {
            LineReading::new(600, 600)
        }
    }

    struct Rig {
        drive: DriveTrain<NoopWheels>,
        follower: LineFollower<OnLine>,
        console: heapless::String<1024>,
        bindings: BindingTable,
        status: StatusSnapshot,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                drive: DriveTrain::new(NoopWheels, DriveConfig::default()),
                follower: LineFollower::new(OnLine, LineFollowConfig::default()),
                console: heapless::String::new(),
                bindings: BindingTable::factory(),
                status: StatusSnapshot::default(),
            }
        }

        fn run(&mut self, executor: &mut CommandExecutor, id: CommandId) -> CommandId {
            let mut ctx = ExecutionContext {
                drive: &mut self.drive,
                follower: &mut self.follower,
                console: &mut self.console,
                bindings: &self.bindings,
                status: &self.status,
            };
            executor.execute(DecodedCommand::new(id, 0), &mut ctx)
        }
    }

    #[test]
    fn teleop_commands_drive_the_arbiter() {
        let mut rig = Rig::new();
        let mut executor = CommandExecutor::new();
        rig.run(&mut executor, CommandId::Forward);
        rig.run(&mut executor, CommandId::Left);
        rig.run(&mut executor, CommandId::SlowDown);
        assert_eq!(rig.drive.intent(), MotionIntent::new(95, -5));
        assert_eq!(executor.last_command(), Some(CommandId::SlowDown));
        assert_eq!(executor.executed(), 3);
    }

    #[test]
    fn demo_hands_over_to_the_line_follower_and_brake_takes_it_back() {
        let mut rig = Rig::new();
        let mut executor = CommandExecutor::new();
        rig.run(&mut executor, CommandId::Forward);
        rig.run(&mut executor, CommandId::Demo);
        assert!(rig.follower.is_active());
        assert_eq!(rig.drive.intent().speed, 0);

        rig.run(&mut executor, CommandId::Brake);
        assert!(!rig.follower.is_active());
        assert_eq!(rig.drive.intent().speed, 0);
    }

    #[test]
    fn info_reports_bindings() {
        let mut rig = Rig::new();
        let mut executor = CommandExecutor::new();
        rig.run(&mut executor, CommandId::Info);
        assert!(rig.console.contains("Forward    key=w ir=none"));
        assert!(rig.console.contains("mode=manual"));
    }
}
