//! USART serial port support.
//!
//! Covers the three USART instances of the STM32F401 in asynchronous mode
//! without hardware flow control. Byte transfers are interrupt-driven: the
//! foreground starts a transfer and polls its status while the handler moves
//! data. GPIO pins must be put into their alternate function before a port
//! is brought up.

pub mod config;
pub mod usart;

pub use config::*;
pub use usart::*;
