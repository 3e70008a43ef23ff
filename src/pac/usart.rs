//! USART register map (STM32F401: USART1, USART2, USART6).

pub const SR: usize = 0x00;
pub const DR: usize = 0x04;
pub const BRR: usize = 0x08;
pub const CR1: usize = 0x0C;
pub const CR2: usize = 0x10;
pub const CR3: usize = 0x14;

pub mod sr {
    pub const PE: u32 = 1 << 0;
    pub const FE: u32 = 1 << 1;
    pub const NF: u32 = 1 << 2;
    pub const ORE: u32 = 1 << 3;
    pub const IDLE: u32 = 1 << 4;
    pub const RXNE: u32 = 1 << 5;
    pub const TC: u32 = 1 << 6;
    pub const TXE: u32 = 1 << 7;
    pub const LBD: u32 = 1 << 8;
    pub const CTS: u32 = 1 << 9;
}

pub mod brr {
    pub const FRACTION_MASK: u32 = 0xF;
    pub const MANTISSA_SHIFT: u32 = 4;
    pub const MANTISSA_MAX: u32 = 0xFFF;
}

pub mod cr1 {
    pub const RE: u32 = 1 << 2;
    pub const TE: u32 = 1 << 3;
    pub const IDLEIE: u32 = 1 << 4;
    pub const RXNEIE: u32 = 1 << 5;
    pub const TCIE: u32 = 1 << 6;
    pub const TXEIE: u32 = 1 << 7;
    pub const PEIE: u32 = 1 << 8;
    pub const PS: u32 = 1 << 9;
    pub const PCE: u32 = 1 << 10;
    pub const M: u32 = 1 << 12;
    pub const UE: u32 = 1 << 13;
    pub const OVER8: u32 = 1 << 15;
}

pub mod cr2 {
    pub const LBDIE: u32 = 1 << 6;
    pub const STOP_MASK: u32 = 0b11 << 12;
    pub const STOP_SHIFT: u32 = 12;
}

pub mod cr3 {
    pub const EIE: u32 = 1 << 0;
    pub const CTSIE: u32 = 1 << 10;
    pub const ONEBIT: u32 = 1 << 11;
}
