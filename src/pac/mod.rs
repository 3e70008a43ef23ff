//! Register-level contract for the peripherals this crate drives.
//!
//! Each peripheral block is described by a module of byte offsets and bit
//! masks matching the STM32F401 reference manual. The drivers never touch
//! addresses directly; they go through [`RegisterAccess`], which has two
//! implementations: [`Mmio`] for the real memory-mapped blocks and
//! [`mock::MockRegs`] for host-side tests.

pub mod nvic;
pub mod rcc;
pub mod tim;
pub mod usart;

pub mod mock;

/// Word-sized read/write access to one peripheral's register file.
///
/// Offsets are byte offsets from the block base, as printed in the reference
/// manual register maps.
pub trait RegisterAccess {
    fn read(&self, offset: usize) -> u32;
    fn write(&mut self, offset: usize, value: u32);

    fn modify(&mut self, offset: usize, f: impl FnOnce(u32) -> u32) {
        let value = self.read(offset);
        self.write(offset, f(value));
    }

    /// Set `mask` bits, leaving the rest of the register untouched.
    fn set_bits(&mut self, offset: usize, mask: u32) {
        self.modify(offset, |r| r | mask);
    }

    /// Clear `mask` bits, leaving the rest of the register untouched.
    fn clear_bits(&mut self, offset: usize, mask: u32) {
        self.modify(offset, |r| r & !mask);
    }

    /// Replace the field selected by `mask` with `value` (already shifted).
    fn write_field(&mut self, offset: usize, mask: u32, value: u32) {
        self.modify(offset, |r| (r & !mask) | (value & mask));
    }

    fn is_set(&self, offset: usize, mask: u32) -> bool {
        self.read(offset) & mask != 0
    }
}

/// Memory-mapped register block at a fixed base address.
pub struct Mmio {
    base: *mut u32,
}

impl Mmio {
    /// Creates an accessor for the block at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be the base address of a peripheral register block that
    /// is not aliased by another live `Mmio`, and the block's clock domain
    /// must be powered.
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            base: base as *mut u32,
        }
    }
}

// The pointer refers to a fixed peripheral block, not host memory.
unsafe impl Send for Mmio {}

impl RegisterAccess for Mmio {
    #[inline]
    fn read(&self, offset: usize) -> u32 {
        unsafe { self.base.add(offset / 4).read_volatile() }
    }

    #[inline]
    fn write(&mut self, offset: usize, value: u32) {
        unsafe { self.base.add(offset / 4).write_volatile(value) }
    }
}

/// STM32F401 peripheral base addresses.
pub mod base {
    pub const TIM1: usize = 0x4001_0000;
    pub const USART1: usize = 0x4001_1000;
    pub const USART2: usize = 0x4000_4400;
    pub const USART6: usize = 0x4001_1400;
    pub const RCC: usize = 0x4002_3800;
    pub const NVIC: usize = 0xE000_E100;
}
