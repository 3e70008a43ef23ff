//! TIM1 (advanced-control timer) register map.

pub const CR1: usize = 0x00;
pub const CR2: usize = 0x04;
pub const SMCR: usize = 0x08;
pub const DIER: usize = 0x0C;
pub const SR: usize = 0x10;
pub const EGR: usize = 0x14;
pub const CCMR1: usize = 0x18;
pub const CCMR2: usize = 0x1C;
pub const CCER: usize = 0x20;
pub const CNT: usize = 0x24;
pub const PSC: usize = 0x28;
pub const ARR: usize = 0x2C;
pub const RCR: usize = 0x30;
pub const CCR1: usize = 0x34;
pub const CCR2: usize = 0x38;
pub const CCR3: usize = 0x3C;
pub const CCR4: usize = 0x40;
pub const BDTR: usize = 0x44;

pub mod cr1 {
    pub const CEN: u32 = 1 << 0;
    pub const UDIS: u32 = 1 << 1;
    pub const URS: u32 = 1 << 2;
    pub const DIR: u32 = 1 << 4;
    pub const CMS_MASK: u32 = 0b11 << 5;
    pub const CMS_SHIFT: u32 = 5;
    pub const ARPE: u32 = 1 << 7;
}

pub mod smcr {
    pub const SMS_MASK: u32 = 0b111;
    /// Slave mode: counter reset on trigger input rising edge.
    pub const SMS_RESET: u32 = 0b100;
    pub const TS_MASK: u32 = 0b111 << 4;
    pub const TS_TI1FP1: u32 = 0b101 << 4;
    pub const TS_TI2FP2: u32 = 0b110 << 4;
}

pub mod dier {
    pub const UIE: u32 = 1 << 0;
    pub const UDE: u32 = 1 << 8;

    /// Capture/compare interrupt enable for channel `n` (1-4).
    pub const fn ccie(n: u8) -> u32 {
        1 << n
    }

    /// Capture/compare DMA request enable for channel `n` (1-4).
    pub const fn ccde(n: u8) -> u32 {
        1 << (8 + n)
    }
}

pub mod sr {
    pub const UIF: u32 = 1 << 0;

    /// Capture/compare flag for channel `n` (1-4).
    pub const fn ccif(n: u8) -> u32 {
        1 << n
    }
}

pub mod egr {
    pub const UG: u32 = 1 << 0;
}

/// Capture/compare mode register field placement.
///
/// Channels 1 and 3 occupy the low byte of CCMR1/CCMR2, channels 2 and 4 the
/// high byte; within a byte the sub-fields sit at fixed bit positions.
pub mod ccmr {
    /// Byte offset of channel `n` inside its CCMR register.
    pub const fn shift(n: u8) -> u32 {
        if n % 2 == 1 {
            0
        } else {
            8
        }
    }

    /// CCMR register (byte offset) holding channel `n`.
    pub const fn reg(n: u8) -> usize {
        if n <= 2 {
            super::CCMR1
        } else {
            super::CCMR2
        }
    }

    /// CCxS: channel direction / input mapping, 2 bits at +0.
    pub const CCS_WIDTH: u32 = 0b11;
    /// Input prescaler, 2 bits at +2.
    pub const ICPSC_OFFSET: u32 = 2;
    pub const ICPSC_WIDTH: u32 = 0b11;
    /// Input filter, 4 bits at +4.
    pub const ICF_OFFSET: u32 = 4;
    pub const ICF_WIDTH: u32 = 0b1111;
    /// Output compare fast enable, 1 bit at +2.
    pub const OCFE_OFFSET: u32 = 2;
    /// Output compare preload enable, 1 bit at +3.
    pub const OCPE_OFFSET: u32 = 3;
    /// Output compare mode, 3 bits at +4.
    pub const OCM_OFFSET: u32 = 4;
    pub const OCM_WIDTH: u32 = 0b111;
}

pub mod ccer {
    /// Capture/compare enable for channel `n` (1-4).
    pub const fn cce(n: u8) -> u32 {
        1 << ((n - 1) * 4)
    }

    /// Capture/compare polarity for channel `n`.
    pub const fn ccp(n: u8) -> u32 {
        1 << ((n - 1) * 4 + 1)
    }

    /// Capture complementary polarity for channel `n`; together with CCxP it
    /// encodes both-edges capture.
    pub const fn ccnp(n: u8) -> u32 {
        1 << ((n - 1) * 4 + 3)
    }
}

pub mod bdtr {
    /// Main output enable; without it no compare output reaches a pin on an
    /// advanced-control timer.
    pub const MOE: u32 = 1 << 15;
}

/// Capture/compare register (byte offset) of channel `n` (1-4).
pub const fn ccr(n: u8) -> usize {
    CCR1 + 4 * (n as usize - 1)
}
