//! Peripheral clock control.
//!
//! Clock-tree bring-up is outside this crate; [`Clocks`] describes a system
//! clock that is already running, and [`Rcc`] gates the enable/reset lines
//! of the peripherals the drivers own.

use crate::pac::{rcc, RegisterAccess};
use crate::time::Hertz;

/// HSI speed
pub const HSI_FREQ: u32 = 16_000_000;

/// Origin of the system clock; the timer time base derives its prescaler
/// from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SysClockSrc {
    /// Internal 16 MHz RC oscillator.
    Hsi,
    /// External crystal at the given frequency.
    Hse(Hertz),
}

/// Clock frequencies
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Clocks {
    /// System frequency
    pub sys_clk: Hertz,
    /// System clock source
    pub source: SysClockSrc,
}

impl Clocks {
    pub fn hsi() -> Self {
        Self {
            sys_clk: Hertz::from_raw(HSI_FREQ),
            source: SysClockSrc::Hsi,
        }
    }

    pub fn hse(freq: Hertz) -> Self {
        Self {
            sys_clk: freq,
            source: SysClockSrc::Hse(freq),
        }
    }
}

impl Default for Clocks {
    fn default() -> Self {
        Self::hsi()
    }
}

/// Peripherals with a clock gate this crate manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Peripheral {
    Tim1,
    Usart1,
    Usart2,
    Usart6,
}

impl Peripheral {
    /// (enable register, reset register, bit) routing for each peripheral.
    const fn route(self) -> (usize, usize, u32) {
        match self {
            Peripheral::Tim1 => (rcc::APB2ENR, rcc::APB2RSTR, rcc::apb2::TIM1),
            Peripheral::Usart1 => (rcc::APB2ENR, rcc::APB2RSTR, rcc::apb2::USART1),
            Peripheral::Usart2 => (rcc::APB1ENR, rcc::APB1RSTR, rcc::apb1::USART2),
            Peripheral::Usart6 => (rcc::APB2ENR, rcc::APB2RSTR, rcc::apb2::USART6),
        }
    }
}

/// Constrained RCC peripheral
pub struct Rcc<R: RegisterAccess> {
    /// Clock configuration
    pub clocks: Clocks,
    regs: R,
}

impl<R: RegisterAccess> Rcc<R> {
    pub fn new(regs: R, clocks: Clocks) -> Self {
        Self { clocks, regs }
    }

    pub fn enable(&mut self, p: Peripheral) {
        let (enr, _, mask) = p.route();
        self.regs.set_bits(enr, mask);
    }

    pub fn disable(&mut self, p: Peripheral) {
        let (enr, _, mask) = p.route();
        self.regs.clear_bits(enr, mask);
    }

    pub fn is_enabled(&self, p: Peripheral) -> bool {
        let (enr, _, mask) = p.route();
        self.regs.is_set(enr, mask)
    }

    /// Asserts the peripheral's reset line and leaves it asserted; the
    /// peripheral stays parked until the next enable/deassert cycle.
    pub fn assert_reset(&mut self, p: Peripheral) {
        let (_, rstr, mask) = p.route();
        self.regs.set_bits(rstr, mask);
    }

    pub fn deassert_reset(&mut self, p: Peripheral) {
        let (_, rstr, mask) = p.route();
        self.regs.clear_bits(rstr, mask);
    }
}
