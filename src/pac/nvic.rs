//! NVIC register map, offsets relative to the interrupt controller base
//! (0xE000_E100).

/// Interrupt set-enable registers, one bit per vector.
pub const ISER: usize = 0x000;
/// Interrupt clear-enable registers.
pub const ICER: usize = 0x080;
/// Interrupt set-pending registers.
pub const ISPR: usize = 0x100;
/// Interrupt clear-pending registers.
pub const ICPR: usize = 0x180;
/// Interrupt active-bit registers (read-only).
pub const IABR: usize = 0x200;
/// Interrupt priority registers, one byte per vector.
pub const IPR: usize = 0x300;

/// The F401 implements 4 priority bits; levels live in the upper nibble of
/// each IPR byte.
pub const PRIORITY_BITS: u32 = 4;

/// Word offset + bit mask addressing vector `irqn` in a bitmap register bank.
pub const fn bitmap(bank: usize, irqn: u16) -> (usize, u32) {
    (bank + 4 * (irqn as usize / 32), 1 << (irqn % 32))
}

/// Word offset + byte lane addressing vector `irqn` in the IPR byte array.
pub const fn ipr(irqn: u16) -> (usize, u32) {
    (IPR + 4 * (irqn as usize / 4), 8 * (irqn as u32 % 4))
}
