//! Interrupt-driven USART engine.
//!
//! Transfers hand a buffer to the driver and return immediately; the
//! interrupt handler moves the bytes and flips the per-direction status back
//! to idle when done. A polled `nb` interface and `core::fmt::Write` sit on
//! top for the simple cases.

use core::fmt;

use crate::irq::{Irq, IrqSystem};
use crate::pac::usart::{self, brr, cr1, cr2, cr3, sr};
use crate::pac::{base, RegisterAccess};
use crate::rcc::{Peripheral, Rcc};
use crate::serial::config::*;
use crate::{Error, Result};

/// The three USART instances wired up on the F401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsartInstance {
    Usart1,
    Usart2,
    Usart6,
}

impl UsartInstance {
    pub fn irq(self) -> Irq {
        match self {
            UsartInstance::Usart1 => Irq::Usart1,
            UsartInstance::Usart2 => Irq::Usart2,
            UsartInstance::Usart6 => Irq::Usart6,
        }
    }

    pub(crate) fn peripheral(self) -> Peripheral {
        match self {
            UsartInstance::Usart1 => Peripheral::Usart1,
            UsartInstance::Usart2 => Peripheral::Usart2,
            UsartInstance::Usart6 => Peripheral::Usart6,
        }
    }

    /// Register block base address, for building the MMIO backend.
    pub const fn base(self) -> usize {
        match self {
            UsartInstance::Usart1 => base::USART1,
            UsartInstance::Usart2 => base::USART2,
            UsartInstance::Usart6 => base::USART6,
        }
    }
}

/// Receive-side line error, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxError {
    /// A byte arrived before the previous one was read out.
    Overrun,
    /// Stop bit not where it should be.
    Framing,
    /// Noise detected on a start, data or stop bit.
    Noise,
}

/// State of one transfer direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    Idle,
    Busy,
}

/// One USART port with its in-flight transfer state.
pub struct Serial<R: RegisterAccess> {
    regs: R,
    instance: UsartInstance,
    tx_buffer: Option<&'static [u8]>,
    tx_cursor: usize,
    tx_status: Status,
    rx_buffer: Option<&'static mut [u8]>,
    rx_cursor: usize,
    rx_status: Status,
    rx_error: Option<RxError>,
}

/// `BRR = mantissa << 4 | fraction` in pure integer arithmetic; a fraction
/// that rounds up to the oversampling divisor carries into the mantissa.
fn compute_brr(clk: u32, baudrate: u32, over: u32) -> Result<u32> {
    let denom = match baudrate.checked_mul(over) {
        Some(d) if d > 0 => d,
        _ => return Err(Error::InvalidParam),
    };
    let mut mantissa = clk / denom;
    let rem = clk % denom;
    let mut fraction =
        ((rem as u64 * over as u64 + denom as u64 / 2) / denom as u64) as u32;
    if fraction == over {
        mantissa += 1;
        fraction = 0;
    }
    // DIV must be at least 1.0 after the carry.
    if mantissa == 0 || mantissa > brr::MANTISSA_MAX {
        return Err(Error::InvalidParam);
    }
    Ok(mantissa << brr::MANTISSA_SHIFT | fraction)
}

impl<R: RegisterAccess> Serial<R> {
    /// Brings up `instance` against an already-running system clock.
    ///
    /// The baud divisor is computed and the priority claimed before any
    /// peripheral register is touched, so a failed call leaves both the port
    /// and the NVIC as they were.
    pub fn new<C: RegisterAccess, N: RegisterAccess>(
        instance: UsartInstance,
        mut regs: R,
        config: Config,
        rcc: &mut Rcc<C>,
        irqs: &mut IrqSystem<N>,
    ) -> Result<Self> {
        let brr = compute_brr(
            rcc.clocks.sys_clk.raw(),
            config.baudrate.0,
            config.oversampling.divisor(),
        )?;
        irqs.install(instance.irq(), config.priority)?;
        rcc.enable(instance.peripheral());

        regs.write(usart::BRR, brr);

        let mut cr2v = config.stopbits.bits();
        if config.lin_break_interrupt {
            cr2v |= cr2::LBDIE;
        }
        regs.write_field(usart::CR2, cr2::STOP_MASK | cr2::LBDIE, cr2v);

        let mut cr3v = 0;
        if config.onebit_sampling {
            cr3v |= cr3::ONEBIT;
        }
        if config.cts_interrupt {
            cr3v |= cr3::CTSIE;
        }
        if config.error_interrupt {
            cr3v |= cr3::EIE;
        }
        regs.write_field(usart::CR3, cr3::ONEBIT | cr3::CTSIE | cr3::EIE, cr3v);

        let mut cr1v = cr1::TE | cr1::RE;
        if config.wordlength == WordLength::DataBits9 {
            cr1v |= cr1::M;
        }
        if config.oversampling == OverSampling::Over8 {
            cr1v |= cr1::OVER8;
        }
        match config.parity {
            Parity::ParityNone => {}
            Parity::ParityEven => cr1v |= cr1::PCE,
            Parity::ParityOdd => cr1v |= cr1::PCE | cr1::PS,
        }
        if config.parity_error_interrupt {
            cr1v |= cr1::PEIE;
        }
        if config.idle_interrupt {
            cr1v |= cr1::IDLEIE;
        }
        regs.write(usart::CR1, cr1v);
        // UE last, once the frame format is in place.
        regs.set_bits(usart::CR1, cr1::UE);

        Ok(Self {
            regs,
            instance,
            tx_buffer: None,
            tx_cursor: 0,
            tx_status: Status::Idle,
            rx_buffer: None,
            rx_cursor: 0,
            rx_status: Status::Idle,
            rx_error: None,
        })
    }

    /// Starts an interrupt-driven transmission of `data`.
    ///
    /// The first byte goes out immediately; the handler feeds the rest on
    /// TXE and arms TC to observe the final frame leaving the wire.
    pub fn transmit(&mut self, data: &'static [u8]) -> Result<()> {
        if data.is_empty() {
            return Err(Error::InvalidParam);
        }
        if self.tx_status == Status::Busy {
            return Err(Error::Busy);
        }

        self.tx_buffer = Some(data);
        self.tx_cursor = 1;
        self.tx_status = Status::Busy;

        self.regs.set_bits(usart::CR1, cr1::TXEIE);
        self.regs.write(usart::DR, data[0] as u32);
        Ok(())
    }

    /// Starts an interrupt-driven reception filling the whole of `buffer`.
    pub fn receive(&mut self, buffer: &'static mut [u8]) -> Result<()> {
        if buffer.is_empty() {
            return Err(Error::InvalidParam);
        }
        if self.rx_status == Status::Busy {
            return Err(Error::Busy);
        }

        self.rx_buffer = Some(buffer);
        self.rx_cursor = 0;
        self.rx_status = Status::Busy;
        self.rx_error = None;

        self.regs.set_bits(usart::CR1, cr1::RXNEIE);
        Ok(())
    }

    /// Services this port's interrupt vector.
    ///
    /// Error flags are classified before the DR read because that read
    /// clears them together with RXNE; a corrupted byte is never stored and
    /// aborts the receive in progress.
    pub fn on_interrupt(&mut self) {
        let status = self.regs.read(usart::SR);

        if status & sr::TXE != 0 {
            match self.tx_buffer {
                Some(data) if self.tx_cursor < data.len() => {
                    self.regs.write(usart::DR, data[self.tx_cursor] as u32);
                    self.tx_cursor += 1;
                }
                _ => {
                    // Buffer drained: stop feeding, watch for the last frame.
                    self.regs.modify(usart::CR1, |r| (r & !cr1::TXEIE) | cr1::TCIE);
                }
            }
        }

        if status & sr::RXNE != 0 {
            let error = if status & sr::ORE != 0 {
                Some(RxError::Overrun)
            } else if status & sr::FE != 0 {
                Some(RxError::Framing)
            } else if status & sr::NF != 0 {
                Some(RxError::Noise)
            } else {
                None
            };

            let data = self.regs.read(usart::DR) as u8;

            match error {
                None => {
                    if self.rx_status == Status::Busy {
                        if let Some(buffer) = self.rx_buffer.as_mut() {
                            buffer[self.rx_cursor] = data;
                            self.rx_cursor += 1;
                            if self.rx_cursor >= buffer.len() {
                                self.rx_status = Status::Idle;
                            }
                        }
                    }
                }
                Some(e) => {
                    self.rx_error = Some(e);
                    self.rx_status = Status::Idle;
                }
            }
        }

        if status & sr::TC != 0 {
            self.regs.clear_bits(usart::CR1, cr1::TCIE);
            self.tx_status = Status::Idle;
        }
    }

    pub fn tx_status(&self) -> Status {
        self.tx_status
    }

    pub fn rx_status(&self) -> Status {
        self.rx_status
    }

    /// Line error that aborted the last receive, if any.
    pub fn rx_error(&self) -> Option<RxError> {
        self.rx_error
    }

    /// Bytes stored by the current or last receive.
    pub fn rx_count(&self) -> usize {
        self.rx_cursor
    }

    /// Hands the receive buffer back once the transfer is no longer running.
    pub fn take_rx_buffer(&mut self) -> Option<&'static mut [u8]> {
        if self.rx_status == Status::Busy {
            return None;
        }
        self.rx_buffer.take()
    }

    /// Single-byte polled read. Error flags are reported before data; the DR
    /// read that clears them happens either way.
    pub fn read(&mut self) -> nb::Result<u8, RxError> {
        let status = self.regs.read(usart::SR);
        if status & sr::ORE != 0 {
            let _ = self.regs.read(usart::DR);
            Err(nb::Error::Other(RxError::Overrun))
        } else if status & sr::FE != 0 {
            let _ = self.regs.read(usart::DR);
            Err(nb::Error::Other(RxError::Framing))
        } else if status & sr::NF != 0 {
            let _ = self.regs.read(usart::DR);
            Err(nb::Error::Other(RxError::Noise))
        } else if status & sr::RXNE != 0 {
            Ok(self.regs.read(usart::DR) as u8)
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    /// Single-byte polled write; refuses to interleave with an
    /// interrupt-driven transmission.
    pub fn write(&mut self, byte: u8) -> nb::Result<(), core::convert::Infallible> {
        if self.tx_status == Status::Busy {
            return Err(nb::Error::WouldBlock);
        }
        if self.regs.is_set(usart::SR, sr::TXE) {
            self.regs.write(usart::DR, byte as u32);
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    pub fn flush(&mut self) -> nb::Result<(), core::convert::Infallible> {
        if self.regs.is_set(usart::SR, sr::TC) {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    /// Shuts the port down and returns the register backend.
    ///
    /// An in-flight transmission is allowed to finish first (TC must read
    /// set before UE may be cleared). The priority slot stays claimed; free
    /// it with [`IrqSystem::release_priority`] when nothing will reuse it.
    pub fn release<C: RegisterAccess, N: RegisterAccess>(
        mut self,
        rcc: &mut Rcc<C>,
        irqs: &mut IrqSystem<N>,
    ) -> R {
        if self.tx_status == Status::Busy {
            while !self.regs.is_set(usart::SR, sr::TC) {
                core::hint::spin_loop();
            }
        }
        self.regs.clear_bits(
            usart::CR1,
            cr1::UE | cr1::TE | cr1::RE | cr1::TXEIE | cr1::TCIE | cr1::RXNEIE | cr1::PEIE
                | cr1::IDLEIE,
        );
        irqs.uninstall(self.instance.irq());
        rcc.disable(self.instance.peripheral());
        rcc.assert_reset(self.instance.peripheral());
        self.regs
    }
}

impl<R: RegisterAccess> fmt::Write for Serial<R> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let _ = s.as_bytes().iter().map(|c| nb::block!(self.write(*c))).last();
        Ok(())
    }
}
