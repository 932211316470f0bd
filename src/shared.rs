//! Shared registers for the two-thread architecture.
//!
//! Provides thread-safe shared state between:
//! - Dispatch thread (inbound commands and telemetry)
//! - Control thread (fixed-cadence command arbitration and emission)
//!
//! Each register sits behind its own lock and is exposed only through
//! narrow get/set/take methods; no caller ever sees a guard, and no method
//! touches two registers at once.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::types::Command;

/// Operating mode gating emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Emit nothing, unconditionally. Initial state.
    Halted,
    /// Emit the operator goal waypoint every tick.
    ActiveDirect,
    /// Emit the pending avoidance candidate, if any, every tick.
    ActiveAvoiding,
}

/// Shared registers between the dispatch and control threads.
#[derive(Debug)]
pub struct Registers {
    /// Current operating mode
    mode: Mutex<Mode>,

    /// Latest accepted goal waypoint (latest-write-wins, no history)
    goal: Mutex<Command>,

    /// Pending avoidance candidate. A mailbox, not a queue: the producer
    /// overwrites, the single consumer takes-and-clears.
    avoidance: Mutex<Option<Command>>,

    /// Shutdown signal for graceful termination
    shutdown: AtomicBool,

    /// Commands emitted (for status reporting)
    emitted: AtomicU32,

    /// Inbound commands dropped: foreign target or unrecognized opcode
    rejected: AtomicU32,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicked holder cannot leave a register half-written; all writes
    // are single assignments. Keep going with the inner value.
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl Registers {
    /// Create the registers in their startup state: halted, with a
    /// placeholder goal carrying our own id and no coordinates.
    pub fn new(self_id: u32) -> Self {
        Self {
            mode: Mutex::new(Mode::Halted),
            goal: Mutex::new(Command::empty_goal(self_id)),
            avoidance: Mutex::new(None),
            shutdown: AtomicBool::new(false),
            emitted: AtomicU32::new(0),
            rejected: AtomicU32::new(0),
        }
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        *lock(&self.mode)
    }

    /// Switch mode. Takes effect for the control loop's next iteration.
    pub fn set_mode(&self, mode: Mode) {
        *lock(&self.mode) = mode;
    }

    /// Snapshot of the goal waypoint.
    pub fn goal(&self) -> Command {
        lock(&self.goal).clone()
    }

    /// Replace the goal waypoint.
    pub fn set_goal(&self, cmd: Command) {
        *lock(&self.goal) = cmd;
    }

    /// Put a candidate in the avoidance slot, dropping any unconsumed
    /// predecessor.
    pub fn offer_candidate(&self, cmd: Command) {
        *lock(&self.avoidance) = Some(cmd);
    }

    /// Take the pending candidate, leaving the slot empty.
    pub fn take_candidate(&self) -> Option<Command> {
        lock(&self.avoidance).take()
    }

    /// Signal shutdown.
    pub fn signal_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    /// Check if shutdown is signaled.
    pub fn should_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Record one emitted command.
    pub fn count_emitted(&self) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Commands emitted so far.
    pub fn emitted_count(&self) -> u32 {
        self.emitted.load(Ordering::Relaxed)
    }

    /// Record one dropped inbound command.
    pub fn count_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Inbound commands dropped so far.
    pub fn rejected_count(&self) -> u32 {
        self.rejected.load(Ordering::Relaxed)
    }
}
