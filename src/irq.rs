//! Interrupt controller interface, priority installation and ISR dispatch.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::pac::{nvic, RegisterAccess};
use crate::priority::{Priority, PriorityLedger};
use crate::Result;

/// Interrupt vectors used by this crate (F401 position numbers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Irq {
    /// TIM1 update (shared with TIM10 global).
    Tim1Up = 25,
    /// TIM1 capture/compare, one vector for all four channels.
    Tim1Cc = 27,
    Usart1 = 37,
    Usart2 = 38,
    Usart6 = 71,
}

impl Irq {
    pub const fn number(self) -> u16 {
        self as u16
    }
}

/// Total vector table positions on the F401.
pub const VECTOR_COUNT: usize = 85;

/// Thin wrapper over the NVIC register bank.
pub struct Nvic<R: RegisterAccess> {
    regs: R,
}

impl<R: RegisterAccess> Nvic<R> {
    pub fn new(regs: R) -> Self {
        Self { regs }
    }

    pub fn enable(&mut self, irq: Irq) {
        let (offset, mask) = nvic::bitmap(nvic::ISER, irq.number());
        // Read-modify-write: zeros are a no-op in the write-1-to-set bank,
        // so this is safe on hardware and keeps the mock backend coherent.
        self.regs.set_bits(offset, mask);
    }

    pub fn disable(&mut self, irq: Irq) {
        let (offset, mask) = nvic::bitmap(nvic::ICER, irq.number());
        self.regs.write(offset, mask);
        let (offset, mask) = nvic::bitmap(nvic::ISER, irq.number());
        self.regs.clear_bits(offset, mask);
    }

    pub fn is_enabled(&self, irq: Irq) -> bool {
        let (offset, mask) = nvic::bitmap(nvic::ISER, irq.number());
        self.regs.is_set(offset, mask)
    }

    pub fn set_pending(&mut self, irq: Irq) {
        let (offset, mask) = nvic::bitmap(nvic::ISPR, irq.number());
        self.regs.set_bits(offset, mask);
    }

    pub fn clear_pending(&mut self, irq: Irq) {
        let (offset, mask) = nvic::bitmap(nvic::ICPR, irq.number());
        self.regs.write(offset, mask);
        let (offset, mask) = nvic::bitmap(nvic::ISPR, irq.number());
        self.regs.clear_bits(offset, mask);
    }

    pub fn is_pending(&self, irq: Irq) -> bool {
        let (offset, mask) = nvic::bitmap(nvic::ISPR, irq.number());
        self.regs.is_set(offset, mask)
    }

    pub fn is_active(&self, irq: Irq) -> bool {
        let (offset, mask) = nvic::bitmap(nvic::IABR, irq.number());
        self.regs.is_set(offset, mask)
    }

    pub fn set_priority(&mut self, irq: Irq, priority: Priority) {
        let (offset, lane) = nvic::ipr(irq.number());
        let byte = (priority.level() as u32) << (8 - nvic::PRIORITY_BITS);
        self.regs
            .write_field(offset, 0xFF << lane, byte << lane);
    }

    pub fn priority(&self, irq: Irq) -> Priority {
        let (offset, lane) = nvic::ipr(irq.number());
        let byte = (self.regs.read(offset) >> lane) & 0xFF;
        // A 4-bit field read back cannot be out of range.
        Priority::new((byte >> (8 - nvic::PRIORITY_BITS)) as u8).unwrap_or(Priority::LOWEST)
    }
}

/// NVIC plus the shared priority ledger.
///
/// Both engines install their vectors through this object so that the
/// ledger claim and the NVIC priority/enable programming happen as one
/// atomic unit: a higher-priority handler that fires in between could
/// otherwise claim the same level and then observe a collision.
pub struct IrqSystem<R: RegisterAccess> {
    nvic: Nvic<R>,
    ledger: PriorityLedger,
}

impl<R: RegisterAccess> IrqSystem<R> {
    pub fn new(nvic_regs: R) -> Self {
        Self {
            nvic: Nvic::new(nvic_regs),
            ledger: PriorityLedger::new(),
        }
    }

    /// Claims `priority` and wires `irq` to it, all with interrupts masked.
    ///
    /// Fails with `InvalidParam` on a priority collision, leaving the NVIC
    /// untouched.
    pub fn install(&mut self, irq: Irq, priority: Priority) -> Result<()> {
        critical_section::with(|_| {
            self.ledger.claim(priority)?;
            self.nvic.set_priority(irq, priority);
            self.nvic.enable(irq);
            Ok(())
        })
    }

    /// Disables `irq` delivery. The priority slot stays claimed; use
    /// [`IrqSystem::release_priority`] to free it.
    pub fn uninstall(&mut self, irq: Irq) {
        critical_section::with(|_| self.nvic.disable(irq));
    }

    pub fn release_priority(&mut self, priority: Priority) {
        critical_section::with(|_| self.ledger.release(priority));
    }

    pub fn ledger(&self) -> &PriorityLedger {
        &self.ledger
    }

    pub fn nvic(&self) -> &Nvic<R> {
        &self.nvic
    }

    pub fn nvic_mut(&mut self) -> &mut Nvic<R> {
        &mut self.nvic
    }
}

/// Vector-number-indexed handler table.
///
/// The application's raw vector entries stay fixed trampolines; at init time
/// each driver registers the function that services its vector, and the
/// trampoline body is a single `dispatch` call.
pub struct DispatchTable {
    handlers: [Option<fn()>; VECTOR_COUNT],
}

impl DispatchTable {
    pub const fn new() -> Self {
        Self {
            handlers: [None; VECTOR_COUNT],
        }
    }

    pub fn register(&mut self, irq: Irq, handler: fn()) {
        self.handlers[irq.number() as usize] = Some(handler);
    }

    pub fn unregister(&mut self, irq: Irq) {
        self.handlers[irq.number() as usize] = None;
    }

    /// Invokes the handler registered for `irq`, if any. Spurious vectors
    /// are ignored.
    pub fn dispatch(&self, irq: Irq) {
        if let Some(handler) = self.handlers[irq.number() as usize] {
            handler();
        }
    }
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

/// A driver instance parked in a `static` and shared between the foreground
/// context and its interrupt handler.
///
/// `with` locks out interrupts for the duration of the closure, which keeps
/// handler and foreground mutation serialized.
pub struct Shared<T> {
    inner: Mutex<RefCell<Option<T>>>,
}

impl<T> Shared<T> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Installs the instance. Any previous occupant is returned.
    pub fn put(&self, value: T) -> Option<T> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).replace(value))
    }

    /// Runs `f` against the stored instance. Returns `None` when nothing has
    /// been installed, which lets trampolines tolerate early interrupts.
    pub fn with<U>(&self, f: impl FnOnce(&mut T) -> U) -> Option<U> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).as_mut().map(f))
    }

    pub fn take(&self) -> Option<T> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).take())
    }
}

impl<T> Default for Shared<T> {
    fn default() -> Self {
        Self::new()
    }
}
