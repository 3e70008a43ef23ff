//! Millisecond time base and busy-wait delays.
//!
//! [`TickCounter`] is a static counter the TIM1 update interrupt advances
//! once per millisecond (see [`crate::timer::Tim1::ms_base`]); [`Delay`]
//! spins against it.

use core::sync::atomic::{AtomicU32, Ordering};

use embedded_hal::delay::DelayNs;

/// Free-running millisecond counter, safe to read from any context.
///
/// Wraps after about 49.7 days; [`TickCounter::elapsed_since`] stays correct
/// across a single wrap.
#[derive(Debug)]
pub struct TickCounter {
    ms: AtomicU32,
}

impl TickCounter {
    pub const fn new() -> Self {
        Self {
            ms: AtomicU32::new(0),
        }
    }

    /// Called from the timer update interrupt, once per millisecond.
    pub fn increment(&self) {
        self.ms.fetch_add(1, Ordering::Relaxed);
    }

    /// Milliseconds since the time base was started.
    pub fn now(&self) -> u32 {
        self.ms.load(Ordering::Relaxed)
    }

    /// Milliseconds elapsed since an earlier [`TickCounter::now`] reading.
    pub fn elapsed_since(&self, earlier: u32) -> u32 {
        self.now().wrapping_sub(earlier)
    }

    pub fn reset(&self) {
        self.ms.store(0, Ordering::Relaxed);
    }
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Busy-wait delay provider backed by the millisecond tick.
pub struct Delay {
    tick: &'static TickCounter,
}

impl Delay {
    pub fn new(tick: &'static TickCounter) -> Self {
        Self { tick }
    }

    /// Spins until `ms` milliseconds have elapsed.
    pub fn delay_ms(&mut self, ms: u32) {
        let start = self.tick.now();
        while self.tick.elapsed_since(start) < ms {
            core::hint::spin_loop();
        }
    }
}

impl DelayNs for Delay {
    /// Resolution is one millisecond; shorter requests still wait a full
    /// tick so the contract "at least `ns`" holds.
    fn delay_ns(&mut self, ns: u32) {
        let ms = ns.div_ceil(1_000_000);
        self.delay_ms(ms);
    }

    fn delay_ms(&mut self, ms: u32) {
        Delay::delay_ms(self, ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_advances_and_resets() {
        let tick = TickCounter::new();
        assert_eq!(tick.now(), 0);

        tick.increment();
        tick.increment();
        assert_eq!(tick.now(), 2);

        tick.reset();
        assert_eq!(tick.now(), 0);
    }

    #[test]
    fn elapsed_survives_a_wrap() {
        let tick = TickCounter::new();
        tick.ms.store(u32::MAX - 1, Ordering::Relaxed);
        let start = tick.now();

        tick.increment();
        tick.increment();
        tick.increment();
        assert_eq!(tick.elapsed_since(start), 3);
    }
}
