//! Two-thread architecture for AkashMover.
//!
//! - Dispatch thread: drains inbound commands and telemetry, mutates the
//!   shared registers
//! - Control thread: arbitrates and emits one command per active tick
//!
//! The threads communicate only through [`Registers`]; shutdown is a
//! cooperative flag both loops re-check every iteration.

mod control;
mod dispatch;

pub use control::ControlThread;
pub use dispatch::{CommandOutcome, DispatchThread};

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::avoidance::CandidateSource;
use crate::client::{BusFeed, CommandLink};
use crate::config::MoverConfig;
use crate::error::Result;
use crate::shared::Registers;

/// Thread handles for the running arbiter.
pub struct ThreadHandles {
    pub dispatch: JoinHandle<()>,
    pub control: JoinHandle<()>,
}

/// Spawn both threads and return their handles.
pub fn spawn_threads(
    config: &MoverConfig,
    registers: Arc<Registers>,
    source: CandidateSource,
    feed: BusFeed,
    link: CommandLink,
    self_id: u32,
) -> Result<ThreadHandles> {
    let tick = Duration::from_millis(config.control.tick_ms);

    let dispatch_registers = Arc::clone(&registers);
    let dispatch_handle = thread::Builder::new()
        .name("dispatch".into())
        .spawn(move || {
            let mut dispatch =
                DispatchThread::new(dispatch_registers, source, Some(feed), self_id);
            dispatch.run();
        })
        .expect("Failed to spawn dispatch thread");

    let control_handle = thread::Builder::new()
        .name("control".into())
        .spawn(move || {
            let mut control = ControlThread::new(registers, tick, Some(link));
            control.run();
        })
        .expect("Failed to spawn control thread");

    Ok(ThreadHandles {
        dispatch: dispatch_handle,
        control: control_handle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Mode;
    use crate::types::{Command, Telemetry, EMERGENCY_LAT};

    const SELF_ID: u32 = 7;

    /// Operator sequence from a cold start: nothing goes out while halted,
    /// a start-direct directive opens the channel, and the next tick emits
    /// the freshly set goal.
    #[test]
    fn startup_to_direct_emission_scenario() {
        let registers = Arc::new(Registers::new(SELF_ID));
        let mut dispatch = DispatchThread::new(
            Arc::clone(&registers),
            CandidateSource::BypassToGoal,
            None,
            SELF_ID,
        );
        let control = ControlThread::new(Arc::clone(&registers), Duration::from_millis(250), None);

        // cold start: halted, no emission
        assert_eq!(registers.mode(), Mode::Halted);
        assert_eq!(control.next_command(), None);

        // operator releases the halt
        let outcome = dispatch.handle_command(Command {
            target_id: SELF_ID,
            latitude: EMERGENCY_LAT,
            longitude: 2.0, // start direct
            altitude: 0.0,
            param: 0,
            sequence_id: 1,
        });
        assert_eq!(outcome, CommandOutcome::ModeChanged(Mode::ActiveDirect));
        assert_eq!(registers.mode(), Mode::ActiveDirect);

        // operator sets a destination
        let goal = Command {
            target_id: SELF_ID,
            latitude: 10.0,
            longitude: 20.0,
            altitude: 30.0,
            param: 2,
            sequence_id: 2,
        };
        dispatch.handle_command(goal.clone());

        // next tick forwards it
        assert_eq!(control.next_command(), Some(goal));
    }

    /// While avoiding, a planner that recommends no maneuver produces a
    /// silent tick.
    #[test]
    fn avoiding_with_no_recommendation_is_silent() {
        use crate::avoidance::PassivePlanner;

        let registers = Arc::new(Registers::new(SELF_ID));
        let mut dispatch = DispatchThread::new(
            Arc::clone(&registers),
            CandidateSource::Live(Box::new(PassivePlanner::new(SELF_ID))),
            None,
            SELF_ID,
        );
        let control = ControlThread::new(Arc::clone(&registers), Duration::from_millis(250), None);

        registers.set_mode(Mode::ActiveAvoiding);
        dispatch.handle_telemetry(&Telemetry {
            vehicle_id: SELF_ID,
            latitude: 32.6,
            longitude: -85.5,
            altitude: 400.0,
            heading: 90.0,
            ground_speed: 20.0,
            sequence_id: 1,
        });

        assert_eq!(control.next_command(), None);
    }
}
