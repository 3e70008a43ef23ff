//! TIM1 multiplexing engine.
//!
//! One physical counter is shared across four channels; the counter itself is
//! either stopped or running, while every channel independently carries a
//! capture or compare role. PWM output is a compare specialization, PWM input
//! is the channel 1/2 pair cooperating with the slave-mode controller.
//!
//! All init paths validate their whole configuration before the first
//! register write, so a rejected call leaves the hardware exactly as it was.

use crate::delay::TickCounter;
use crate::irq::{Irq, IrqSystem};
use crate::pac::tim::{self, bdtr, ccer, ccmr, cr1, dier, smcr, sr};
use crate::pac::RegisterAccess;
use crate::priority::Priority;
use crate::rcc::{Peripheral, Rcc};
use crate::time::Hertz;
use crate::{Error, Result};

pub mod config;
pub mod pwm;

pub use config::*;
pub use pwm::*;

/// Role a channel is currently configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelRole {
    Unconfigured,
    Capture,
    Compare,
}

/// Counts captured for one PWM-input period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmInputMeasurement {
    /// Ticks between the two most recent reference edges.
    pub period_ticks: u16,
    /// Ticks between the reference edge and the complementary edge.
    pub pulse_ticks: u16,
}

impl PwmInputMeasurement {
    /// Pulse width over period; `None` when the period is degenerate.
    pub fn duty(&self) -> Option<f32> {
        if self.period_ticks == 0 {
            None
        } else {
            Some(self.pulse_ticks as f32 / self.period_ticks as f32)
        }
    }
}

#[derive(Debug)]
struct PwmInputState {
    reference: Channel,
    complementary: Channel,
    prev_ref: Option<u16>,
    curr_ref: Option<u16>,
    pulse: Option<u16>,
}

impl PwmInputState {
    fn new(reference: Channel, complementary: Channel) -> Self {
        Self {
            reference,
            complementary,
            prev_ref: None,
            curr_ref: None,
            pulse: None,
        }
    }

    fn record_reference(&mut self, value: u16) {
        self.prev_ref = self.curr_ref;
        self.curr_ref = Some(value);
    }

    fn record_complementary(&mut self, value: u16) {
        // The counter is reset on every reference edge, so captured counts
        // are elapsed ticks; the subtraction wraps at the 16-bit boundary.
        if let Some(reference) = self.curr_ref {
            self.pulse = Some(value.wrapping_sub(reference));
        }
    }
}

/// The advanced-control timer.
pub struct Tim1<R: RegisterAccess> {
    regs: R,
    clk: Hertz,
    roles: [ChannelRole; 4],
    captures: [Option<u16>; 4],
    pwm_input: Option<PwmInputState>,
    tick: Option<&'static TickCounter>,
}

fn check_counts(prescaler: u32, reload: u32) -> Result<()> {
    if (1..=0x1_0000).contains(&prescaler) && (1..=0x1_0000).contains(&reload) {
        Ok(())
    } else {
        Err(Error::InvalidParam)
    }
}

impl<R: RegisterAccess> Tim1<R> {
    /// Takes ownership of the TIM1 register block and enables its clock.
    pub fn new<C: RegisterAccess>(regs: R, rcc: &mut Rcc<C>) -> Self {
        rcc.enable(Peripheral::Tim1);
        Self {
            regs,
            clk: rcc.clocks.sys_clk,
            roles: [ChannelRole::Unconfigured; 4],
            captures: [None; 4],
            pwm_input: None,
            tick: None,
        }
    }

    /// Programs the free-running counter and starts it.
    ///
    /// `PSC`/`ARR` are written as `prescaler - 1` / `reload - 1`.
    pub fn configure_counter<N: RegisterAccess>(
        &mut self,
        cfg: CounterConfig,
        irqs: &mut IrqSystem<N>,
    ) -> Result<()> {
        check_counts(cfg.prescaler, cfg.reload)?;
        if cfg.repetition > 0xFF {
            return Err(Error::InvalidParam);
        }

        let mut cr1v = self.regs.read(tim::CR1)
            & !(cr1::DIR | cr1::CMS_MASK | cr1::ARPE | cr1::UDIS | cr1::URS);
        match cfg.mode {
            CountMode::Edge(Direction::Up) => {}
            CountMode::Edge(Direction::Down) => cr1v |= cr1::DIR,
            CountMode::Center(mode) => cr1v |= (mode as u32) << cr1::CMS_SHIFT,
        }
        if cfg.reload_preload {
            cr1v |= cr1::ARPE;
        }
        if !cfg.update_event {
            cr1v |= cr1::UDIS;
        }
        if cfg.update_request == UpdateRequest::CounterFlow {
            cr1v |= cr1::URS;
        }

        if let Some(priority) = cfg.interrupt {
            irqs.install(Irq::Tim1Up, priority)?;
        }

        self.regs.write(tim::ARR, cfg.reload - 1);
        self.regs.write(tim::PSC, cfg.prescaler - 1);
        self.regs.write(tim::RCR, cfg.repetition);

        self.regs.modify(tim::DIER, |r| {
            let mut r = r & !(dier::UIE | dier::UDE);
            if cfg.interrupt.is_some() {
                r |= dier::UIE;
            }
            if cfg.dma {
                r |= dier::UDE;
            }
            r
        });

        self.regs.write(tim::CR1, cr1v | cr1::CEN);
        Ok(())
    }

    /// Configures the counter as a millisecond time base feeding `tick` from
    /// the update interrupt: 1000 counts per update at a 1 MHz count rate.
    pub fn ms_base<N: RegisterAccess>(
        &mut self,
        tick: &'static TickCounter,
        priority: Priority,
        irqs: &mut IrqSystem<N>,
    ) -> Result<()> {
        // 16 at 16 MHz HSI, 25 at a 25 MHz crystal.
        let prescaler = self.clk.raw() / 1_000_000;
        tick.reset();
        self.tick = Some(tick);
        self.configure_counter(CounterConfig::new(prescaler, 1000).listen(priority), irqs)
    }

    /// Puts `cfg.channel` into input-capture mode. Starts the counter if it
    /// is idle so captures advance immediately.
    pub fn configure_capture<N: RegisterAccess>(
        &mut self,
        cfg: CaptureConfig,
        irqs: &mut IrqSystem<N>,
    ) -> Result<()> {
        if cfg.filter > 0xF {
            return Err(Error::InvalidParam);
        }
        if let Some(priority) = cfg.interrupt {
            irqs.install(Irq::Tim1Cc, priority)?;
        }
        self.apply_capture(&cfg);
        Ok(())
    }

    /// Configures the channel 1/2 pair for PWM input measurement.
    ///
    /// The reference channel captures rising edges of its own input, the
    /// complementary channel captures falling edges of the same signal via
    /// the indirect mapping, and the slave-mode controller resets the counter
    /// on each reference edge so captures read directly as elapsed ticks.
    pub fn configure_pwm_input<N: RegisterAccess>(
        &mut self,
        cfg: PwmInputConfig,
        irqs: &mut IrqSystem<N>,
    ) -> Result<()> {
        let (reference, complementary) = match cfg.reference {
            Channel::C1 => (Channel::C1, Channel::C2),
            Channel::C2 => (Channel::C2, Channel::C1),
            _ => return Err(Error::InvalidParam),
        };
        if cfg.filter > 0xF {
            return Err(Error::InvalidParam);
        }

        let mut reference_cfg = CaptureConfig::new(reference, CaptureSelection::Direct)
            .prescaler(cfg.prescaler)
            .filter(cfg.filter)
            .polarity(CapturePolarity::Rising);
        let mut complementary_cfg = CaptureConfig::new(complementary, CaptureSelection::Indirect)
            .prescaler(cfg.prescaler)
            .filter(cfg.filter)
            .polarity(CapturePolarity::Falling);
        if let Some(priority) = cfg.interrupt {
            // One claim for the shared capture/compare vector; both channels
            // still get their own DIER enable bit.
            irqs.install(Irq::Tim1Cc, priority)?;
            reference_cfg = reference_cfg.listen(priority);
            complementary_cfg = complementary_cfg.listen(priority);
        }

        let ts = match cfg.trigger {
            TriggerInput::FilteredTi1 => smcr::TS_TI1FP1,
            TriggerInput::FilteredTi2 => smcr::TS_TI2FP2,
        };
        self.regs
            .write_field(tim::SMCR, smcr::TS_MASK | smcr::SMS_MASK, ts | smcr::SMS_RESET);

        self.apply_capture(&reference_cfg);
        self.apply_capture(&complementary_cfg);
        self.pwm_input = Some(PwmInputState::new(reference, complementary));
        Ok(())
    }

    /// Puts `cfg.channel` into output-compare mode and routes the waveform to
    /// the pin (main output enable is required on an advanced-control timer).
    pub fn configure_compare<N: RegisterAccess>(
        &mut self,
        cfg: CompareConfig,
        irqs: &mut IrqSystem<N>,
    ) -> Result<()> {
        check_counts(cfg.prescaler, cfg.reload)?;
        if cfg.compare > 0xFFFF {
            return Err(Error::InvalidParam);
        }
        if let Some(priority) = cfg.interrupt {
            irqs.install(Irq::Tim1Cc, priority)?;
        }

        let n = cfg.channel.index();
        self.regs.clear_bits(tim::CCER, ccer::cce(n));

        self.regs.write(tim::ARR, cfg.reload - 1);
        self.regs.write(tim::PSC, cfg.prescaler - 1);
        self.regs.write(tim::ccr(n), cfg.compare);

        let shift = ccmr::shift(n);
        let mask = (ccmr::CCS_WIDTH
            | 1 << ccmr::OCFE_OFFSET
            | 1 << ccmr::OCPE_OFFSET
            | ccmr::OCM_WIDTH << ccmr::OCM_OFFSET)
            << shift;
        // CCxS = 00 selects output mode.
        let mut field = (cfg.mode as u32) << ccmr::OCM_OFFSET;
        if cfg.preload {
            field |= 1 << ccmr::OCPE_OFFSET;
        }
        if cfg.fast_enable {
            field |= 1 << ccmr::OCFE_OFFSET;
        }
        self.regs.write_field(ccmr::reg(n), mask, field << shift);

        self.regs.modify(tim::CCER, |r| match cfg.polarity {
            OcPolarity::ActiveHigh => r & !ccer::ccp(n),
            OcPolarity::ActiveLow => r | ccer::ccp(n),
        });

        self.regs.modify(tim::DIER, |r| {
            let mut r = r & !(dier::ccie(n) | dier::ccde(n));
            if cfg.interrupt.is_some() {
                r |= dier::ccie(n);
            }
            if cfg.dma {
                r |= dier::ccde(n);
            }
            r
        });

        self.regs.set_bits(tim::CCER, ccer::cce(n));
        self.regs.set_bits(tim::BDTR, bdtr::MOE);
        self.start_if_idle();
        self.roles[n as usize - 1] = ChannelRole::Compare;
        Ok(())
    }

    /// PWM output: a compare channel with `compare = round(duty * reload)`.
    pub fn configure_pwm_output<N: RegisterAccess>(
        &mut self,
        cfg: PwmOutputConfig,
        irqs: &mut IrqSystem<N>,
    ) -> Result<()> {
        if !(0.0..=1.0).contains(&cfg.duty) {
            return Err(Error::InvalidParam);
        }
        let compare = libm::roundf(cfg.reload as f32 * cfg.duty) as u32;

        let mut compare_cfg =
            CompareConfig::new(cfg.channel, cfg.reload, cfg.prescaler, compare, cfg.mode)
                .preload(cfg.preload)
                .polarity(cfg.polarity)
                .fast_enable(cfg.fast_enable)
                .dma(cfg.dma);
        if let Some(priority) = cfg.interrupt {
            compare_cfg = compare_cfg.listen(priority);
        }
        self.configure_compare(compare_cfg, irqs)
    }

    /// Runtime duty update against the currently programmed auto-reload.
    ///
    /// Only the duty range is re-validated; with preload enabled the new
    /// compare value takes effect at the next update event, glitch-free.
    pub fn set_duty_cycle(&mut self, channel: Channel, duty: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&duty) {
            return Err(Error::InvalidParam);
        }
        let arr = self.regs.read(tim::ARR) as f32;
        let compare = libm::roundf(arr * duty) as u32;
        self.regs.write(tim::ccr(channel.index()), compare);
        Ok(())
    }

    fn apply_capture(&mut self, cfg: &CaptureConfig) {
        let n = cfg.channel.index();

        // Capture must be off while the channel is remapped.
        self.regs.clear_bits(tim::CCER, ccer::cce(n));

        let shift = ccmr::shift(n);
        let mask = (ccmr::CCS_WIDTH
            | ccmr::ICPSC_WIDTH << ccmr::ICPSC_OFFSET
            | ccmr::ICF_WIDTH << ccmr::ICF_OFFSET)
            << shift;
        let field = (cfg.selection as u32)
            | (cfg.prescaler as u32) << ccmr::ICPSC_OFFSET
            | (cfg.filter as u32) << ccmr::ICF_OFFSET;
        self.regs.write_field(ccmr::reg(n), mask, field << shift);

        // Rising = both bits clear, falling = CCxP, both edges = CCxP+CCxNP.
        let (p, np) = match cfg.polarity {
            CapturePolarity::Rising => (false, false),
            CapturePolarity::Falling => (true, false),
            CapturePolarity::BothEdges => (true, true),
        };
        self.regs.modify(tim::CCER, |r| {
            let mut r = r & !(ccer::ccp(n) | ccer::ccnp(n));
            if p {
                r |= ccer::ccp(n);
            }
            if np {
                r |= ccer::ccnp(n);
            }
            r
        });

        self.regs.modify(tim::DIER, |r| {
            let mut r = r & !(dier::ccie(n) | dier::ccde(n));
            if cfg.interrupt.is_some() {
                r |= dier::ccie(n);
            }
            if cfg.dma {
                r |= dier::ccde(n);
            }
            r
        });

        self.regs.set_bits(tim::CCER, ccer::cce(n));
        self.start_if_idle();
        self.roles[n as usize - 1] = ChannelRole::Capture;
    }

    /// Services the TIM1 update vector: clears the flag and advances the
    /// millisecond tick when a time base is attached.
    pub fn on_update_interrupt(&mut self) {
        if self.regs.is_set(tim::SR, sr::UIF) {
            self.regs.clear_bits(tim::SR, sr::UIF);
            if let Some(tick) = self.tick {
                tick.increment();
            }
        }
    }

    /// Services the shared capture/compare vector.
    ///
    /// One vector covers all four channels, so every channel's own flag is
    /// tested; each set flag is cleared and its captured count recorded.
    pub fn on_capture_compare_interrupt(&mut self) {
        for n in 1..=4u8 {
            if !self.regs.is_set(tim::SR, sr::ccif(n)) {
                continue;
            }
            self.regs.clear_bits(tim::SR, sr::ccif(n));
            let value = self.regs.read(tim::ccr(n)) as u16;
            self.captures[n as usize - 1] = Some(value);

            if let Some(state) = self.pwm_input.as_mut() {
                if state.reference.index() == n {
                    state.record_reference(value);
                } else if state.complementary.index() == n {
                    state.record_complementary(value);
                }
            }
        }
    }

    /// Latest PWM-input measurement.
    ///
    /// `None` until the pair has seen a complementary edge and two reference
    /// edges; the first reference edge has no predecessor to span a period.
    pub fn pwm_input_measurement(&self) -> Option<PwmInputMeasurement> {
        let state = self.pwm_input.as_ref()?;
        let prev = state.prev_ref?;
        let curr = state.curr_ref?;
        let pulse = state.pulse?;
        Some(PwmInputMeasurement {
            period_ticks: curr.wrapping_sub(prev),
            pulse_ticks: pulse,
        })
    }

    /// Most recent capture on `channel`, if any.
    pub fn last_capture(&self, channel: Channel) -> Option<u16> {
        self.captures[channel.index() as usize - 1]
    }

    pub fn channel_role(&self, channel: Channel) -> ChannelRole {
        self.roles[channel.index() as usize - 1]
    }

    pub fn start(&mut self) {
        self.regs.set_bits(tim::CR1, cr1::CEN);
    }

    pub fn stop(&mut self) {
        self.regs.clear_bits(tim::CR1, cr1::CEN);
    }

    pub fn is_running(&self) -> bool {
        self.regs.is_set(tim::CR1, cr1::CEN)
    }

    pub fn count(&self) -> u16 {
        self.regs.read(tim::CNT) as u16
    }

    fn start_if_idle(&mut self) {
        if !self.is_running() {
            self.start();
        }
    }

    /// Stops the counter, masks its interrupt/DMA requests, gates the clock
    /// and asserts the peripheral reset.
    ///
    /// Any claimed priority slot stays claimed; freeing it is an explicit
    /// [`IrqSystem::release_priority`] call because another init may reuse
    /// the vector immediately.
    pub fn release<C: RegisterAccess>(mut self, rcc: &mut Rcc<C>) -> R {
        self.regs.clear_bits(tim::CR1, cr1::CEN);
        self.regs.write(tim::DIER, 0);
        rcc.disable(Peripheral::Tim1);
        rcc.assert_reset(Peripheral::Tim1);
        self.regs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac::mock::MockRegs;
    use crate::rcc::Clocks;
    use proptest::prelude::*;

    type TestTim = Tim1<MockRegs<32>>;

    struct Bench {
        tim: TestTim,
        rcc: Rcc<MockRegs<64>>,
        irqs: IrqSystem<MockRegs<256>>,
    }

    fn bench() -> Bench {
        bench_with(Clocks::hsi())
    }

    fn bench_with(clocks: Clocks) -> Bench {
        let mut rcc = Rcc::new(MockRegs::new(), clocks);
        let tim = Tim1::new(MockRegs::new(), &mut rcc);
        Bench {
            tim,
            rcc,
            irqs: IrqSystem::new(MockRegs::new()),
        }
    }

    fn prio(level: u8) -> Priority {
        Priority::new(level).unwrap()
    }

    #[test]
    fn counter_programs_psc_and_arr_minus_one() {
        let mut b = bench();
        b.tim
            .configure_counter(CounterConfig::new(16, 1000), &mut b.irqs)
            .unwrap();

        assert_eq!(b.tim.regs.get(tim::PSC), 15);
        assert_eq!(b.tim.regs.get(tim::ARR), 999);
        assert!(b.tim.is_running());
    }

    #[test]
    fn counter_rejects_out_of_range_without_writes() {
        let mut b = bench();
        let before = b.tim.regs.write_count();

        assert_eq!(
            b.tim
                .configure_counter(CounterConfig::new(0, 1000), &mut b.irqs),
            Err(Error::InvalidParam)
        );
        assert_eq!(
            b.tim
                .configure_counter(CounterConfig::new(16, 0x1_0001), &mut b.irqs),
            Err(Error::InvalidParam)
        );
        assert_eq!(
            b.tim
                .configure_counter(CounterConfig::new(16, 1000).repetition(256), &mut b.irqs),
            Err(Error::InvalidParam)
        );
        assert_eq!(b.tim.regs.write_count(), before);
    }

    #[test]
    fn counter_priority_collision_is_invalid_param() {
        let mut b = bench();
        b.irqs.install(Irq::Usart1, prio(4)).unwrap();

        let before = b.tim.regs.write_count();
        assert_eq!(
            b.tim.configure_counter(
                CounterConfig::new(16, 1000).listen(prio(4)),
                &mut b.irqs
            ),
            Err(Error::InvalidParam)
        );
        assert_eq!(b.tim.regs.write_count(), before);
    }

    #[test]
    fn counter_down_and_center_modes_are_distinct() {
        let mut b = bench();
        b.tim
            .configure_counter(
                CounterConfig::new(1, 100).count_mode(CountMode::Edge(Direction::Down)),
                &mut b.irqs,
            )
            .unwrap();
        assert!(b.tim.regs.get(tim::CR1) & cr1::DIR != 0);

        b.tim
            .configure_counter(
                CounterConfig::new(1, 100).count_mode(CountMode::Center(CenterMode::Mode3)),
                &mut b.irqs,
            )
            .unwrap();
        let r = b.tim.regs.get(tim::CR1);
        assert_eq!((r & cr1::CMS_MASK) >> cr1::CMS_SHIFT, 0b11);
        assert!(r & cr1::DIR == 0);
    }

    #[test]
    fn ms_base_prescaler_follows_the_clock() {
        static TICK: TickCounter = TickCounter::new();

        let mut b = bench();
        b.tim.ms_base(&TICK, prio(0), &mut b.irqs).unwrap();
        assert_eq!(b.tim.regs.get(tim::PSC), 15);
        assert_eq!(b.tim.regs.get(tim::ARR), 999);

        let mut b = bench_with(Clocks::hse(Hertz::from_raw(25_000_000)));
        b.tim.ms_base(&TICK, prio(0), &mut b.irqs).unwrap();
        assert_eq!(b.tim.regs.get(tim::PSC), 24);
    }

    #[test]
    fn update_interrupt_drives_the_tick() {
        static TICK: TickCounter = TickCounter::new();

        let mut b = bench();
        b.tim.ms_base(&TICK, prio(1), &mut b.irqs).unwrap();

        b.tim.regs.load(tim::SR, sr::UIF);
        b.tim.on_update_interrupt();
        b.tim.regs.load(tim::SR, sr::UIF);
        b.tim.on_update_interrupt();
        // No flag set: not an update, tick must not advance.
        b.tim.on_update_interrupt();

        assert_eq!(TICK.now(), 2);
        assert_eq!(b.tim.regs.get(tim::SR) & sr::UIF, 0);
    }

    #[test]
    fn capture_fields_land_in_the_right_ccmr_byte() {
        let mut b = bench();

        // Channel 1: low byte of CCMR1.
        b.tim
            .configure_capture(
                CaptureConfig::new(Channel::C1, CaptureSelection::Direct)
                    .prescaler(CapturePrescaler::Div4)
                    .filter(0b0110),
                &mut b.irqs,
            )
            .unwrap();
        let ccmr1 = b.tim.regs.get(tim::CCMR1);
        assert_eq!(ccmr1 & 0xFF, 0b0110_10_01);

        // Channel 4: high byte of CCMR2.
        b.tim
            .configure_capture(
                CaptureConfig::new(Channel::C4, CaptureSelection::Indirect)
                    .prescaler(CapturePrescaler::Div8)
                    .filter(0b0011),
                &mut b.irqs,
            )
            .unwrap();
        let ccmr2 = b.tim.regs.get(tim::CCMR2);
        assert_eq!((ccmr2 >> 8) & 0xFF, 0b0011_11_10);

        assert_eq!(b.tim.channel_role(Channel::C1), ChannelRole::Capture);
        assert_eq!(b.tim.channel_role(Channel::C4), ChannelRole::Capture);
    }

    #[test]
    fn both_edges_polarity_sets_both_bits() {
        let mut b = bench();
        b.tim
            .configure_capture(
                CaptureConfig::new(Channel::C2, CaptureSelection::Direct)
                    .polarity(CapturePolarity::BothEdges),
                &mut b.irqs,
            )
            .unwrap();

        let r = b.tim.regs.get(tim::CCER);
        assert!(r & ccer::ccp(2) != 0);
        assert!(r & ccer::ccnp(2) != 0);
        assert!(r & ccer::cce(2) != 0);
    }

    #[test]
    fn capture_rejects_filter_out_of_range_without_writes() {
        let mut b = bench();
        let before = b.tim.regs.write_count();
        assert_eq!(
            b.tim.configure_capture(
                CaptureConfig::new(Channel::C1, CaptureSelection::Direct).filter(16),
                &mut b.irqs
            ),
            Err(Error::InvalidParam)
        );
        assert_eq!(b.tim.regs.write_count(), before);
    }

    #[test]
    fn compare_enables_main_output_and_starts_the_counter() {
        let mut b = bench();
        b.tim
            .configure_compare(
                CompareConfig::new(Channel::C3, 20_000, 16, 1500, OcMode::Pwm1).preload(true),
                &mut b.irqs,
            )
            .unwrap();

        assert_eq!(b.tim.regs.get(tim::CCR3), 1500);
        assert!(b.tim.regs.get(tim::BDTR) & bdtr::MOE != 0);
        assert!(b.tim.is_running());
        // Low byte of CCMR2: output mode, PWM1, preload.
        let ccmr2 = b.tim.regs.get(tim::CCMR2);
        assert_eq!(ccmr2 & 0b11, 0);
        assert_eq!((ccmr2 >> ccmr::OCM_OFFSET) & 0b111, 0b110);
        assert!(ccmr2 & (1 << ccmr::OCPE_OFFSET) != 0);
        assert_eq!(b.tim.channel_role(Channel::C3), ChannelRole::Compare);
    }

    #[test]
    fn pwm_output_rounds_the_compare_value() {
        let mut b = bench();
        b.tim
            .configure_pwm_output(
                PwmOutputConfig::new(Channel::C1, 1000, 16, 0.25),
                &mut b.irqs,
            )
            .unwrap();
        assert_eq!(b.tim.regs.get(tim::CCR1), 250);
    }

    #[test]
    fn pwm_input_requires_the_channel_1_2_pair() {
        let mut b = bench();
        let before = b.tim.regs.write_count();
        assert_eq!(
            b.tim.configure_pwm_input(
                PwmInputConfig::new(Channel::C3, TriggerInput::FilteredTi1),
                &mut b.irqs
            ),
            Err(Error::InvalidParam)
        );
        assert_eq!(b.tim.regs.write_count(), before);
    }

    #[test]
    fn pwm_input_configures_slave_reset_and_complementary_mappings() {
        let mut b = bench();
        b.tim
            .configure_pwm_input(
                PwmInputConfig::new(Channel::C1, TriggerInput::FilteredTi1).listen(prio(2)),
                &mut b.irqs,
            )
            .unwrap();

        let slave = b.tim.regs.get(tim::SMCR);
        assert_eq!(slave & smcr::SMS_MASK, smcr::SMS_RESET);
        assert_eq!(slave & smcr::TS_MASK, smcr::TS_TI1FP1);

        let ccmr1 = b.tim.regs.get(tim::CCMR1);
        assert_eq!(ccmr1 & 0b11, CaptureSelection::Direct as u32);
        assert_eq!((ccmr1 >> 8) & 0b11, CaptureSelection::Indirect as u32);

        // Reference rising, complementary falling.
        let enables = b.tim.regs.get(tim::CCER);
        assert!(enables & ccer::ccp(1) == 0);
        assert!(enables & ccer::ccp(2) != 0);

        // Both channel interrupts on the shared vector, one claim.
        let requests = b.tim.regs.get(tim::DIER);
        assert!(requests & dier::ccie(1) != 0);
        assert!(requests & dier::ccie(2) != 0);
        assert!(b.irqs.ledger().is_claimed(prio(2)));
    }

    fn fire_capture(tim: &mut TestTim, n: u8, value: u32) {
        tim.regs.load(tim::ccr(n), value);
        tim.regs.load(tim::SR, sr::ccif(n));
        tim.on_capture_compare_interrupt();
    }

    #[test]
    fn pwm_input_measurement_without_wraparound() {
        let mut b = bench();
        b.tim
            .configure_pwm_input(
                PwmInputConfig::new(Channel::C1, TriggerInput::FilteredTi1).listen(prio(2)),
                &mut b.irqs,
            )
            .unwrap();

        fire_capture(&mut b.tim, 1, 100);
        // One reference edge is not enough to span a period.
        assert!(b.tim.pwm_input_measurement().is_none());

        fire_capture(&mut b.tim, 2, 150);
        assert!(b.tim.pwm_input_measurement().is_none());

        fire_capture(&mut b.tim, 1, 300);
        let m = b.tim.pwm_input_measurement().unwrap();
        assert_eq!(m.pulse_ticks, 50);
        assert_eq!(m.period_ticks, 200);
        assert_eq!(m.duty(), Some(0.25));
    }

    #[test]
    fn pwm_input_pulse_width_wraps_at_16_bits() {
        let mut b = bench();
        b.tim
            .configure_pwm_input(
                PwmInputConfig::new(Channel::C1, TriggerInput::FilteredTi1).listen(prio(2)),
                &mut b.irqs,
            )
            .unwrap();

        fire_capture(&mut b.tim, 1, 65_500);
        fire_capture(&mut b.tim, 2, 20);
        fire_capture(&mut b.tim, 1, 100);

        let m = b.tim.pwm_input_measurement().unwrap();
        assert_eq!(m.pulse_ticks, 56);
        assert_eq!(m.period_ticks, 100u16.wrapping_sub(65_500));
    }

    #[test]
    fn set_duty_cycle_updates_only_the_compare_register() {
        let mut b = bench();
        b.tim
            .configure_pwm_output(
                PwmOutputConfig::new(Channel::C2, 20_000, 16, 0.0),
                &mut b.irqs,
            )
            .unwrap();

        let before = b.tim.regs.write_count();
        b.tim.set_duty_cycle(Channel::C2, 0.5).unwrap();
        assert_eq!(b.tim.regs.get(tim::CCR2), 10_000);
        assert_eq!(b.tim.regs.write_count(), before + 1);

        assert_eq!(
            b.tim.set_duty_cycle(Channel::C2, 1.5),
            Err(Error::InvalidParam)
        );
        assert_eq!(
            b.tim.set_duty_cycle(Channel::C2, -0.1),
            Err(Error::InvalidParam)
        );
    }

    #[test]
    fn release_parks_the_peripheral_but_keeps_the_priority() {
        let mut b = bench();
        b.tim
            .configure_counter(CounterConfig::new(16, 1000).listen(prio(3)), &mut b.irqs)
            .unwrap();

        let regs = b.tim.release(&mut b.rcc);
        assert_eq!(regs.get(tim::CR1) & cr1::CEN, 0);
        assert_eq!(regs.get(tim::DIER), 0);
        assert!(!b.rcc.is_enabled(Peripheral::Tim1));
        assert!(b.irqs.ledger().is_claimed(prio(3)));
    }

    proptest! {
        #[test]
        fn psc_arr_hold_for_all_valid_pairs(prescaler in 1u32..=0x1_0000, reload in 1u32..=0x1_0000) {
            let mut b = bench();
            b.tim
                .configure_counter(CounterConfig::new(prescaler, reload), &mut b.irqs)
                .unwrap();
            prop_assert_eq!(b.tim.regs.get(tim::PSC), prescaler - 1);
            prop_assert_eq!(b.tim.regs.get(tim::ARR), reload - 1);
        }

        #[test]
        fn duty_compare_never_exceeds_arr(duty in 0.0f32..=1.0) {
            let mut b = bench();
            b.tim
                .configure_pwm_output(
                    PwmOutputConfig::new(Channel::C1, 20_000, 16, 0.0),
                    &mut b.irqs,
                )
                .unwrap();
            b.tim.set_duty_cycle(Channel::C1, duty).unwrap();

            let arr = b.tim.regs.get(tim::ARR);
            let ccr = b.tim.regs.get(tim::CCR1);
            prop_assert!(ccr <= arr);
            prop_assert_eq!(ccr, libm::roundf(arr as f32 * duty) as u32);
        }
    }
}
