//! Interrupt-priority bookkeeping shared by the timer and serial engines.
//!
//! The NVIC happily lets two enabled vectors share a preemption level; this
//! crate does not, because the drivers rely on priority ordering instead of
//! locks for their handler/foreground handoff. The ledger records which of
//! the 16 F401 priority levels is spoken for.

use crate::{Error, Result};

/// Number of priority levels the F401's 4 priority bits encode.
pub const LEVELS: usize = 16;

/// An interrupt priority level, 0 (highest urgency) to 15.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Priority(u8);

impl Priority {
    /// Most urgent level.
    pub const HIGHEST: Self = Self(0);
    /// Least urgent level.
    pub const LOWEST: Self = Self((LEVELS - 1) as u8);

    pub fn new(level: u8) -> Result<Self> {
        if (level as usize) < LEVELS {
            Ok(Self(level))
        } else {
            Err(Error::InvalidParam)
        }
    }

    pub fn level(self) -> u8 {
        self.0
    }
}

/// One claim flag per priority level.
///
/// Owned by an explicit context object (typically [`crate::irq::IrqSystem`])
/// rather than living in a process-wide static, so each test starts from a
/// clean table.
#[derive(Debug, Default)]
pub struct PriorityLedger {
    claimed: [bool; LEVELS],
}

impl PriorityLedger {
    pub const fn new() -> Self {
        Self {
            claimed: [false; LEVELS],
        }
    }

    /// Marks `priority` as claimed. Fails without mutating if the slot is
    /// already taken.
    pub fn claim(&mut self, priority: Priority) -> Result<()> {
        let slot = &mut self.claimed[priority.0 as usize];
        if *slot {
            return Err(Error::InvalidParam);
        }
        *slot = true;
        Ok(())
    }

    /// Frees `priority`. Peripheral teardown never calls this implicitly;
    /// releasing a slot is always an explicit caller decision.
    pub fn release(&mut self, priority: Priority) {
        self.claimed[priority.0 as usize] = false;
    }

    pub fn is_claimed(&self, priority: Priority) -> bool {
        self.claimed[priority.0 as usize]
    }
}
