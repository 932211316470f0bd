//! Control thread: fixed-cadence command arbitration and emission.
//!
//! Every iteration reads the mode fresh and applies its tick policy:
//! - Halted: nothing goes out; a short idle yield keeps CPU bounded while
//!   staying responsive to the next mode change.
//! - ActiveDirect: one tick sleep, then the goal waypoint goes out
//!   unconditionally.
//! - ActiveAvoiding: one tick sleep, then the pending candidate goes out if
//!   there is one; an empty slot is a silent tick, not an error.
//!
//! At most one command is emitted per active tick, and no register lock is
//! ever held across the publish call.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::client::CommandLink;
use crate::shared::{Mode, Registers};
use crate::types::Command;

/// Idle yield while halted. Long enough to keep the loop off the CPU, short
/// enough that a mode change is picked up without a visible delay.
const HALTED_IDLE: Duration = Duration::from_millis(5);

/// Control thread state and logic.
pub struct ControlThread {
    registers: Arc<Registers>,
    link: Option<CommandLink>,
    tick: Duration,
    last_status_time: Instant,
    status_interval: Duration,
}

impl ControlThread {
    /// Create a new control thread. `link` is `None` in tests.
    pub fn new(registers: Arc<Registers>, tick: Duration, link: Option<CommandLink>) -> Self {
        Self {
            registers,
            link,
            tick,
            last_status_time: Instant::now(),
            status_interval: Duration::from_secs(3),
        }
    }

    /// Run the control thread main loop.
    pub fn run(&mut self) {
        tracing::info!("Control thread started (tick {:?})", self.tick);

        loop {
            if self.registers.should_shutdown() {
                tracing::info!("Control thread shutting down");
                break;
            }

            match self.registers.mode() {
                Mode::Halted => std::thread::sleep(HALTED_IDLE),
                Mode::ActiveDirect | Mode::ActiveAvoiding => {
                    std::thread::sleep(self.tick);
                    // woke up: re-check before doing anything
                    if self.registers.should_shutdown() {
                        tracing::info!("Control thread shutting down");
                        break;
                    }
                    if let Some(cmd) = self.next_command() {
                        self.publish(cmd);
                    }
                }
            }

            if self.last_status_time.elapsed() >= self.status_interval {
                self.log_status();
                self.last_status_time = Instant::now();
            }
        }

        tracing::info!("Control thread exited");
    }

    /// Arbitrate this tick's emission.
    ///
    /// Reads the mode fresh — never a cached snapshot — so a halt that
    /// arrived during the tick sleep suppresses emission right here. Each
    /// register is consulted under its own lock, released before return.
    pub fn next_command(&self) -> Option<Command> {
        match self.registers.mode() {
            Mode::Halted => None,
            Mode::ActiveDirect => Some(self.registers.goal()),
            Mode::ActiveAvoiding => self.registers.take_candidate(),
        }
    }

    /// Publish one command on the outbound channel.
    fn publish(&mut self, cmd: Command) {
        if let Some(link) = self.link.as_mut() {
            if let Err(e) = link.publish(&cmd) {
                // the transport owns reliability; nothing to retry here
                tracing::error!("Failed to publish command: {}", e);
                return;
            }
        }
        self.registers.count_emitted();
        tracing::debug!(
            "Emitted command seq {} ({:.6}, {:.6}, {:.1})",
            cmd.sequence_id,
            cmd.latitude,
            cmd.longitude,
            cmd.altitude
        );
    }

    /// Log arbiter status.
    fn log_status(&self) {
        tracing::info!(
            "Arbiter: mode={:?}, emitted={}, rejected={}",
            self.registers.mode(),
            self.registers.emitted_count(),
            self.registers.rejected_count()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const SELF_ID: u32 = 7;

    fn control_with(registers: &Arc<Registers>) -> ControlThread {
        ControlThread::new(Arc::clone(registers), Duration::from_millis(250), None)
    }

    fn candidate(seq: u32) -> Command {
        Command {
            target_id: SELF_ID,
            latitude: 33.0,
            longitude: -86.0,
            altitude: 500.0,
            param: 2,
            sequence_id: seq,
        }
    }

    #[test]
    fn halted_emits_nothing_even_with_pending_state() {
        let registers = Arc::new(Registers::new(SELF_ID));
        registers.set_goal(candidate(1));
        registers.offer_candidate(candidate(2));

        let control = control_with(&registers);
        assert_eq!(control.next_command(), None);
        // the slot was not consumed while halted
        assert_eq!(registers.take_candidate(), Some(candidate(2)));
    }

    #[test]
    fn active_direct_emits_goal_unconditionally() {
        let registers = Arc::new(Registers::new(SELF_ID));
        registers.set_mode(Mode::ActiveDirect);

        let control = control_with(&registers);
        // even the placeholder goal goes out in direct mode
        assert_eq!(control.next_command(), Some(Command::empty_goal(SELF_ID)));

        registers.set_goal(candidate(5));
        assert_eq!(control.next_command(), Some(candidate(5)));
        // direct emission does not consume anything
        assert_eq!(control.next_command(), Some(candidate(5)));
    }

    #[test]
    fn active_avoiding_takes_then_goes_silent() {
        let registers = Arc::new(Registers::new(SELF_ID));
        registers.set_mode(Mode::ActiveAvoiding);
        registers.offer_candidate(candidate(1));

        let control = control_with(&registers);
        assert_eq!(control.next_command(), Some(candidate(1)));
        // silence is a valid outcome on the next tick
        assert_eq!(control.next_command(), None);
    }

    #[test]
    fn halt_gates_emission_under_concurrent_producers() {
        let registers = Arc::new(Registers::new(SELF_ID));
        let control = control_with(&registers);

        // mode stays halted while another thread hammers the other registers
        let producer = {
            let registers = Arc::clone(&registers);
            thread::spawn(move || {
                for seq in 0..2000 {
                    registers.offer_candidate(candidate(seq));
                    registers.set_goal(candidate(seq));
                }
            })
        };

        while !producer.is_finished() {
            assert_eq!(control.next_command(), None);
        }
        producer.join().unwrap();
        assert_eq!(control.next_command(), None);
    }

    #[test]
    fn stop_takes_effect_on_the_next_decision() {
        let registers = Arc::new(Registers::new(SELF_ID));
        registers.set_mode(Mode::ActiveDirect);
        registers.set_goal(candidate(1));

        let control = control_with(&registers);
        assert!(control.next_command().is_some());

        registers.set_mode(Mode::Halted);
        assert_eq!(control.next_command(), None);
    }
}
