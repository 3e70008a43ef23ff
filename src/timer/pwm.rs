//! PWM output helpers on top of the compare machinery.

use embedded_hal::pwm::{ErrorType, SetDutyCycle};

use crate::irq::IrqSystem;
use crate::pac::tim::{self, egr};
use crate::pac::RegisterAccess;
use crate::{Error, Result};

use super::{Channel, PwmOutputConfig, Tim1};

/// Hobby-servo frame: 20 ms period at a 1 us tick.
pub const SERVO_PERIOD_TICKS: u32 = 20_000;
/// 0 degrees sits at a 3 % duty (0.6 ms pulse).
const SERVO_MIN_DUTY: f32 = 0.03;
/// Full travel spans another 9 % (0.6 ms to 2.4 ms).
const SERVO_DUTY_SPAN: f32 = 0.09;

impl<R: RegisterAccess> Tim1<R> {
    /// Configures `channel` for a hobby servo: PWM mode 1, active high,
    /// preloaded compare, 50 Hz frame with 1 us resolution, pulse initially
    /// off. Position it afterwards with [`Tim1::servo_set_position`].
    pub fn servo<N: RegisterAccess>(
        &mut self,
        channel: Channel,
        irqs: &mut IrqSystem<N>,
    ) -> Result<()> {
        let prescaler = self.clk.raw() / 1_000_000;
        self.configure_pwm_output(
            PwmOutputConfig::new(channel, SERVO_PERIOD_TICKS, prescaler, 0.0),
            irqs,
        )
    }

    /// Moves the servo to `degrees` in `[0, 180]`.
    ///
    /// An update event is generated after the compare write so the preloaded
    /// value latches immediately instead of at the next 20 ms frame.
    pub fn servo_set_position(&mut self, channel: Channel, degrees: f32) -> Result<()> {
        if !(0.0..=180.0).contains(&degrees) {
            return Err(Error::InvalidParam);
        }
        let duty = SERVO_MIN_DUTY + degrees / 180.0 * SERVO_DUTY_SPAN;
        self.set_duty_cycle(channel, duty)?;
        self.regs.write(tim::EGR, egr::UG);
        Ok(())
    }

    /// Borrows one channel as an `embedded-hal` PWM pin.
    pub fn pwm_channel(&mut self, channel: Channel) -> PwmChannel<'_, R> {
        PwmChannel { tim: self, channel }
    }
}

/// A single compare channel exposed through `embedded_hal::pwm`.
pub struct PwmChannel<'a, R: RegisterAccess> {
    tim: &'a mut Tim1<R>,
    channel: Channel,
}

impl<R: RegisterAccess> ErrorType for PwmChannel<'_, R> {
    type Error = core::convert::Infallible;
}

impl<R: RegisterAccess> SetDutyCycle for PwmChannel<'_, R> {
    fn max_duty_cycle(&self) -> u16 {
        // Period is ARR + 1 ticks; a compare equal to it is always-on.
        let arr = self.tim.regs.read(tim::ARR);
        (arr + 1).min(u16::MAX as u32) as u16
    }

    fn set_duty_cycle(&mut self, duty: u16) -> core::result::Result<(), Self::Error> {
        let capped = (duty as u32).min(self.max_duty_cycle() as u32);
        self.tim
            .regs
            .write(tim::ccr(self.channel.index()), capped);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac::mock::MockRegs;
    use crate::rcc::{Clocks, Rcc};
    use crate::timer::{ChannelRole, OcPolarity};

    fn servo_bench() -> (Tim1<MockRegs<32>>, IrqSystem<MockRegs<256>>) {
        let mut rcc = Rcc::new(MockRegs::<64>::new(), Clocks::hsi());
        let mut timer = Tim1::new(MockRegs::new(), &mut rcc);
        let mut irqs = IrqSystem::new(MockRegs::new());
        timer.servo(Channel::C1, &mut irqs).unwrap();
        (timer, irqs)
    }

    #[test]
    fn servo_sets_up_a_50_hz_microsecond_frame() {
        let (timer, _) = servo_bench();

        assert_eq!(timer.regs.get(tim::PSC), 15);
        assert_eq!(timer.regs.get(tim::ARR), 19_999);
        assert_eq!(timer.regs.get(tim::CCR1), 0);
        assert_eq!(timer.channel_role(Channel::C1), ChannelRole::Compare);
        assert!(timer.is_running());
    }

    #[test]
    fn servo_position_maps_degrees_onto_the_pulse() {
        let (mut timer, _) = servo_bench();

        timer.servo_set_position(Channel::C1, 0.0).unwrap();
        assert_eq!(timer.regs.get(tim::CCR1), 600);

        timer.servo_set_position(Channel::C1, 90.0).unwrap();
        assert_eq!(timer.regs.get(tim::CCR1), 1500);

        timer.servo_set_position(Channel::C1, 180.0).unwrap();
        assert_eq!(timer.regs.get(tim::CCR1), 2400);

        // Each move latches the preloaded compare with a UG write.
        assert_eq!(timer.regs.get(tim::EGR) & egr::UG, egr::UG);
    }

    #[test]
    fn servo_rejects_out_of_range_degrees_without_writes() {
        let (mut timer, _) = servo_bench();
        let before = timer.regs.write_count();

        assert_eq!(
            timer.servo_set_position(Channel::C1, -1.0),
            Err(Error::InvalidParam)
        );
        assert_eq!(
            timer.servo_set_position(Channel::C1, 180.5),
            Err(Error::InvalidParam)
        );
        assert_eq!(timer.regs.write_count(), before);
    }

    #[test]
    fn pwm_channel_speaks_embedded_hal() {
        let mut rcc = Rcc::new(MockRegs::<64>::new(), Clocks::hsi());
        let mut timer = Tim1::new(MockRegs::<32>::new(), &mut rcc);
        let mut irqs = IrqSystem::new(MockRegs::<256>::new());
        timer.configure_pwm_output(
            PwmOutputConfig::new(Channel::C2, 1000, 16, 0.0).polarity(OcPolarity::ActiveHigh),
            &mut irqs,
        )
        .unwrap();

        let mut pin = timer.pwm_channel(Channel::C2);
        assert_eq!(pin.max_duty_cycle(), 1000);

        pin.set_duty_cycle(250).unwrap();
        assert_eq!(timer.regs.get(tim::CCR2), 250);

        let mut pin = timer.pwm_channel(Channel::C2);
        pin.set_duty_cycle(u16::MAX).unwrap();
        assert_eq!(timer.regs.get(tim::CCR2), 1000);

    }
}
