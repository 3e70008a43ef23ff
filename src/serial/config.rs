//! Serial configuration.

use crate::pac::usart::cr2;
use crate::priority::Priority;
use crate::time::Bps;

/// Frame length including the parity bit when parity is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WordLength {
    DataBits8,
    DataBits9,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    ParityNone,
    ParityEven,
    ParityOdd,
}

/// Receiver oversampling; 8x halves the divisor range but allows higher
/// baud rates from the same clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OverSampling {
    Over16,
    Over8,
}

impl OverSampling {
    pub(super) fn divisor(self) -> u32 {
        match self {
            OverSampling::Over16 => 16,
            OverSampling::Over8 => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    #[doc = "1 stop bit"]
    STOP1,
    #[doc = "0.5 stop bits"]
    STOP0P5,
    #[doc = "2 stop bits"]
    STOP2,
}

impl StopBits {
    pub(super) fn bits(self) -> u32 {
        let raw = match self {
            StopBits::STOP1 => 0b00,
            StopBits::STOP0P5 => 0b01,
            StopBits::STOP2 => 0b10,
        };
        raw << cr2::STOP_SHIFT
    }
}

/// USART configuration.
///
/// `Default` is 115 200 baud, 8N1, 16x oversampling, three-sample majority
/// voting, no extra condition interrupts, lowest interrupt priority.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub(super) baudrate: Bps,
    pub(super) wordlength: WordLength,
    pub(super) parity: Parity,
    pub(super) stopbits: StopBits,
    pub(super) oversampling: OverSampling,
    pub(super) onebit_sampling: bool,
    pub(super) priority: Priority,
    pub(super) parity_error_interrupt: bool,
    pub(super) idle_interrupt: bool,
    pub(super) cts_interrupt: bool,
    pub(super) error_interrupt: bool,
    pub(super) lin_break_interrupt: bool,
}

impl Config {
    pub fn baudrate(mut self, baudrate: Bps) -> Self {
        self.baudrate = baudrate;
        self
    }

    pub fn wordlength_8(mut self) -> Self {
        self.wordlength = WordLength::DataBits8;
        self
    }

    pub fn wordlength_9(mut self) -> Self {
        self.wordlength = WordLength::DataBits9;
        self
    }

    pub fn parity_none(mut self) -> Self {
        self.parity = Parity::ParityNone;
        self
    }

    pub fn parity_even(mut self) -> Self {
        self.parity = Parity::ParityEven;
        self
    }

    pub fn parity_odd(mut self) -> Self {
        self.parity = Parity::ParityOdd;
        self
    }

    pub fn stopbits(mut self, stopbits: StopBits) -> Self {
        self.stopbits = stopbits;
        self
    }

    pub fn oversampling(mut self, oversampling: OverSampling) -> Self {
        self.oversampling = oversampling;
        self
    }

    /// Sample each bit once instead of three-sample majority voting; more
    /// tolerant of clock deviation, less tolerant of noise.
    pub fn onebit_sampling(mut self, enable: bool) -> Self {
        self.onebit_sampling = enable;
        self
    }

    /// NVIC priority for this instance's interrupt vector.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn parity_error_interrupt(mut self, enable: bool) -> Self {
        self.parity_error_interrupt = enable;
        self
    }

    pub fn idle_interrupt(mut self, enable: bool) -> Self {
        self.idle_interrupt = enable;
        self
    }

    pub fn cts_interrupt(mut self, enable: bool) -> Self {
        self.cts_interrupt = enable;
        self
    }

    /// Enable the CR3 error interrupt (noise, framing, overrun during
    /// multibuffer communication).
    pub fn error_interrupt(mut self, enable: bool) -> Self {
        self.error_interrupt = enable;
        self
    }

    pub fn lin_break_interrupt(mut self, enable: bool) -> Self {
        self.lin_break_interrupt = enable;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            baudrate: Bps(115_200),
            wordlength: WordLength::DataBits8,
            parity: Parity::ParityNone,
            stopbits: StopBits::STOP1,
            oversampling: OverSampling::Over16,
            onebit_sampling: false,
            priority: Priority::LOWEST,
            parity_error_interrupt: false,
            idle_interrupt: false,
            cts_interrupt: false,
            error_interrupt: false,
            lin_break_interrupt: false,
        }
    }
}
