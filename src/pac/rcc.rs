//! RCC register map: only the enable/reset registers the drivers touch.

pub const APB1RSTR: usize = 0x20;
pub const APB2RSTR: usize = 0x24;
pub const APB1ENR: usize = 0x40;
pub const APB2ENR: usize = 0x44;

pub mod apb1 {
    pub const USART2: u32 = 1 << 17;
}

pub mod apb2 {
    pub const TIM1: u32 = 1 << 0;
    pub const USART1: u32 = 1 << 4;
    pub const USART6: u32 = 1 << 5;
}
