//! Dispatch thread: inbound command and telemetry handling.
//!
//! Drains the bus feed and applies each message to the shared registers:
//! - Commands addressed to us either switch the mode (meta-command) or
//!   replace the goal waypoint.
//! - Telemetry is handed to the candidate source; valid candidates overwrite
//!   the avoidance slot.
//!
//! Handling is fire-and-forget and at-most-once per arrival; dropped input
//! is counted, never an error.

use std::sync::Arc;
use std::time::Duration;

use crate::avoidance::CandidateSource;
use crate::client::BusFeed;
use crate::shared::{Mode, Registers};
use crate::types::{BusMessage, Command, MetaOpcode, Telemetry};

/// What happened to an inbound command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Meta-command applied; the new mode.
    ModeChanged(Mode),
    /// Navigation command accepted into the goal register.
    GoalUpdated,
    /// Addressed to another vehicle; nothing mutated.
    ForeignTarget,
    /// Meta-command with an opcode we don't know; nothing mutated.
    UnknownOpcode,
}

/// Dispatch thread state and logic.
pub struct DispatchThread {
    registers: Arc<Registers>,
    source: CandidateSource,
    feed: Option<BusFeed>,
    self_id: u32,
}

impl DispatchThread {
    /// Create a new dispatch thread. `feed` is `None` in tests.
    pub fn new(
        registers: Arc<Registers>,
        source: CandidateSource,
        feed: Option<BusFeed>,
        self_id: u32,
    ) -> Self {
        Self {
            registers,
            source,
            feed,
            self_id,
        }
    }

    /// Run the dispatch thread main loop.
    pub fn run(&mut self) {
        tracing::info!("Dispatch thread started (vehicle {})", self.self_id);

        loop {
            if self.registers.should_shutdown() {
                tracing::info!("Dispatch thread shutting down");
                break;
            }

            self.process_bus_messages();

            // Small sleep to avoid busy-waiting between drains
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    /// Drain all currently available bus messages.
    fn process_bus_messages(&mut self) {
        const MAX_MESSAGES_PER_ITERATION: usize = 50;

        let mut processed = 0;
        while processed < MAX_MESSAGES_PER_ITERATION {
            let msg = match self.feed.as_mut() {
                Some(feed) => feed.recv(),
                None => return,
            };

            match msg {
                Ok(Some(BusMessage::Command(cmd))) => {
                    processed += 1;
                    let outcome = self.handle_command(cmd);
                    tracing::trace!("Command handled: {:?}", outcome);
                }
                Ok(Some(BusMessage::Telemetry(telemetry))) => {
                    processed += 1;
                    self.handle_telemetry(&telemetry);
                }
                Ok(None) => break,
                Err(e) => {
                    // Malformed datagram or transport hiccup; drop and move on
                    tracing::error!("Bus receive error: {}", e);
                    break;
                }
            }
        }
    }

    /// Apply one inbound command.
    ///
    /// Commands for other vehicles mutate nothing. A meta-command switches
    /// the mode unconditionally; a navigation command replaces the goal
    /// register and keeps the planner's goal in sync.
    pub fn handle_command(&mut self, cmd: Command) -> CommandOutcome {
        if cmd.target_id != self.self_id {
            self.registers.count_rejected();
            return CommandOutcome::ForeignTarget;
        }

        if cmd.is_meta() {
            let mode = match MetaOpcode::decode(cmd.longitude) {
                Some(MetaOpcode::StartAvoidance) => Mode::ActiveAvoiding,
                Some(MetaOpcode::Stop) => Mode::Halted,
                Some(MetaOpcode::StartDirect) => Mode::ActiveDirect,
                None => {
                    self.registers.count_rejected();
                    tracing::debug!("Unrecognized meta opcode {}", cmd.longitude as i32);
                    return CommandOutcome::UnknownOpcode;
                }
            };
            tracing::info!("Mode change: {:?}", mode);
            self.registers.set_mode(mode);
            return CommandOutcome::ModeChanged(mode);
        }

        tracing::info!(
            "New goal waypoint: lat {:.6} | lon {:.6} | alt {:.1}",
            cmd.latitude,
            cmd.longitude,
            cmd.altitude
        );
        self.registers.set_goal(cmd.clone());
        if let CandidateSource::Live(planner) = &mut self.source {
            planner.set_goal_waypoint(&cmd);
        }
        CommandOutcome::GoalUpdated
    }

    /// Apply one telemetry sample.
    ///
    /// The candidate source produces a maneuver; the no-maneuver sentinel
    /// is discarded without disturbing whatever is pending in the slot.
    pub fn handle_telemetry(&mut self, telemetry: &Telemetry) {
        let candidate = match &mut self.source {
            CandidateSource::Live(planner) => planner.avoid(telemetry),
            CandidateSource::BypassToGoal => self.registers.goal(),
        };

        if candidate.is_no_maneuver() {
            tracing::debug!("No maneuver recommended for sample {}", telemetry.sequence_id);
            return;
        }

        self.registers.offer_candidate(candidate);
    }
}
