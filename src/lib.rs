//! Timer and serial drivers for the STM32F401.
//!
//! The crate covers the advanced-control timer TIM1 in all four of its roles
//! (free-running counter, input capture, output compare, PWM in both
//! directions), the three USART instances with interrupt-driven transfers,
//! and the interrupt-priority bookkeeping both engines share.
//!
//! Register access goes through the [`pac::RegisterAccess`] trait so the
//! drivers run against memory-mapped hardware on the target and against
//! [`pac::mock::MockRegs`] in host tests.

#![cfg_attr(not(test), no_std)]

pub extern crate nb;

pub use embedded_hal as hal;
pub use nb::block;

pub mod delay;
pub mod irq;
pub mod pac;
pub mod prelude;
pub mod priority;
pub mod rcc;
pub mod serial;
pub mod time;
pub mod timer;

/// Driver error taxonomy.
///
/// Every fallible operation reports failure through this enum; there is no
/// secondary error channel. Errors detected inside interrupt handlers
/// (framing/noise/overrun on a running receive) do not surface here, they
/// flip the transfer status to idle and are observable via polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Malformed input: out-of-range field, disallowed enum value or a
    /// priority collision. Nothing was written to hardware.
    InvalidParam,
    /// The request is well formed but cannot proceed now, e.g. a transfer
    /// is already in flight on that port and direction.
    Busy,
}

pub type Result<T> = core::result::Result<T, Error>;
