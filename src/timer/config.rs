//! Timer configuration types.
//!
//! Each config couples the fields an init call cannot do without to a
//! mandatory constructor; everything else is a chained setter with the
//! hardware reset value as default.

use crate::priority::Priority;

/// Timer channel, 1-4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    C1 = 1,
    C2 = 2,
    C3 = 3,
    C4 = 4,
}

impl Channel {
    pub const fn index(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Up,
    Down,
}

/// Center-aligned counting; the number picks when compare-interrupt flags
/// are raised (1 = counting down, 2 = counting up, 3 = both).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CenterMode {
    Mode1 = 0b01,
    Mode2 = 0b10,
    Mode3 = 0b11,
}

/// Counting mode. Direction and center-aligned operation are mutually
/// exclusive in hardware, so the type offers one or the other, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CountMode {
    Edge(Direction),
    Center(CenterMode),
}

/// Which events generate an update request when URS is in play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UpdateRequest {
    /// Counter overflow/underflow, UG writes and slave-mode resets.
    Any,
    /// Counter overflow/underflow only.
    CounterFlow,
}

/// Free-running counter configuration.
#[derive(Debug, Clone, Copy)]
pub struct CounterConfig {
    pub(super) prescaler: u32,
    pub(super) reload: u32,
    pub(super) mode: CountMode,
    pub(super) repetition: u32,
    pub(super) reload_preload: bool,
    pub(super) interrupt: Option<Priority>,
    pub(super) dma: bool,
    pub(super) update_event: bool,
    pub(super) update_request: UpdateRequest,
}

impl CounterConfig {
    /// `prescaler` and `reload` are in counts (1-65536); the hardware
    /// registers are programmed with `value - 1`.
    pub fn new(prescaler: u32, reload: u32) -> Self {
        Self {
            prescaler,
            reload,
            mode: CountMode::Edge(Direction::Up),
            repetition: 0,
            reload_preload: true,
            interrupt: None,
            dma: false,
            update_event: true,
            update_request: UpdateRequest::Any,
        }
    }

    pub fn count_mode(mut self, mode: CountMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn repetition(mut self, repetition: u32) -> Self {
        self.repetition = repetition;
        self
    }

    pub fn reload_preload(mut self, buffered: bool) -> Self {
        self.reload_preload = buffered;
        self
    }

    /// Enable the update interrupt at the given priority.
    pub fn listen(mut self, priority: Priority) -> Self {
        self.interrupt = Some(priority);
        self
    }

    pub fn dma(mut self, enable: bool) -> Self {
        self.dma = enable;
        self
    }

    pub fn update_event(mut self, enable: bool) -> Self {
        self.update_event = enable;
        self
    }

    pub fn update_request(mut self, source: UpdateRequest) -> Self {
        self.update_request = source;
        self
    }
}

/// Input selection for a capture channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CaptureSelection {
    /// Channel samples its own timer input (CCxS = 01).
    Direct = 0b01,
    /// Channel samples its neighbour's timer input (CCxS = 10).
    Indirect = 0b10,
    /// Channel samples the internal trigger (CCxS = 11).
    Trc = 0b11,
}

/// Capture input prescaler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CapturePrescaler {
    Div1 = 0b00,
    Div2 = 0b01,
    Div4 = 0b10,
    Div8 = 0b11,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CapturePolarity {
    Rising,
    Falling,
    /// Capture on both edges (sets both polarity bits).
    BothEdges,
}

/// Input-capture channel configuration.
#[derive(Debug, Clone, Copy)]
pub struct CaptureConfig {
    pub(super) channel: Channel,
    pub(super) selection: CaptureSelection,
    pub(super) prescaler: CapturePrescaler,
    pub(super) filter: u8,
    pub(super) polarity: CapturePolarity,
    pub(super) interrupt: Option<Priority>,
    pub(super) dma: bool,
}

impl CaptureConfig {
    pub fn new(channel: Channel, selection: CaptureSelection) -> Self {
        Self {
            channel,
            selection,
            prescaler: CapturePrescaler::Div1,
            filter: 0,
            polarity: CapturePolarity::Rising,
            interrupt: None,
            dma: false,
        }
    }

    pub fn prescaler(mut self, prescaler: CapturePrescaler) -> Self {
        self.prescaler = prescaler;
        self
    }

    /// Digital input filter length, 0-15.
    pub fn filter(mut self, filter: u8) -> Self {
        self.filter = filter;
        self
    }

    pub fn polarity(mut self, polarity: CapturePolarity) -> Self {
        self.polarity = polarity;
        self
    }

    /// Enable this channel's capture interrupt on the shared
    /// capture/compare vector.
    pub fn listen(mut self, priority: Priority) -> Self {
        self.interrupt = Some(priority);
        self
    }

    pub fn dma(mut self, enable: bool) -> Self {
        self.dma = enable;
        self
    }
}

/// Output-compare waveform mode (OCxM).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OcMode {
    Frozen = 0b000,
    ActiveOnMatch = 0b001,
    InactiveOnMatch = 0b010,
    Toggle = 0b011,
    ForceInactive = 0b100,
    ForceActive = 0b101,
    Pwm1 = 0b110,
    Pwm2 = 0b111,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OcPolarity {
    ActiveHigh,
    ActiveLow,
}

/// Output-compare channel configuration.
#[derive(Debug, Clone, Copy)]
pub struct CompareConfig {
    pub(super) channel: Channel,
    pub(super) reload: u32,
    pub(super) prescaler: u32,
    pub(super) compare: u32,
    pub(super) mode: OcMode,
    pub(super) preload: bool,
    pub(super) polarity: OcPolarity,
    pub(super) fast_enable: bool,
    pub(super) interrupt: Option<Priority>,
    pub(super) dma: bool,
}

impl CompareConfig {
    pub fn new(channel: Channel, reload: u32, prescaler: u32, compare: u32, mode: OcMode) -> Self {
        Self {
            channel,
            reload,
            prescaler,
            compare,
            mode,
            preload: false,
            polarity: OcPolarity::ActiveHigh,
            fast_enable: false,
            interrupt: None,
            dma: false,
        }
    }

    /// Buffer CCR writes until the next update event; needed for glitch-free
    /// duty changes while the counter runs.
    pub fn preload(mut self, enable: bool) -> Self {
        self.preload = enable;
        self
    }

    pub fn polarity(mut self, polarity: OcPolarity) -> Self {
        self.polarity = polarity;
        self
    }

    pub fn fast_enable(mut self, enable: bool) -> Self {
        self.fast_enable = enable;
        self
    }

    pub fn listen(mut self, priority: Priority) -> Self {
        self.interrupt = Some(priority);
        self
    }

    pub fn dma(mut self, enable: bool) -> Self {
        self.dma = enable;
        self
    }
}

/// PWM output configuration; compiled down to a [`CompareConfig`] with
/// `compare = round(duty * reload)`.
#[derive(Debug, Clone, Copy)]
pub struct PwmOutputConfig {
    pub(super) channel: Channel,
    pub(super) reload: u32,
    pub(super) prescaler: u32,
    pub(super) duty: f32,
    pub(super) mode: OcMode,
    pub(super) polarity: OcPolarity,
    pub(super) preload: bool,
    pub(super) fast_enable: bool,
    pub(super) interrupt: Option<Priority>,
    pub(super) dma: bool,
}

impl PwmOutputConfig {
    pub fn new(channel: Channel, reload: u32, prescaler: u32, duty: f32) -> Self {
        Self {
            channel,
            reload,
            prescaler,
            duty,
            mode: OcMode::Pwm1,
            polarity: OcPolarity::ActiveHigh,
            preload: true,
            fast_enable: false,
            interrupt: None,
            dma: false,
        }
    }

    pub fn mode(mut self, mode: OcMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn polarity(mut self, polarity: OcPolarity) -> Self {
        self.polarity = polarity;
        self
    }

    pub fn preload(mut self, enable: bool) -> Self {
        self.preload = enable;
        self
    }

    pub fn fast_enable(mut self, enable: bool) -> Self {
        self.fast_enable = enable;
        self
    }

    pub fn listen(mut self, priority: Priority) -> Self {
        self.interrupt = Some(priority);
        self
    }

    pub fn dma(mut self, enable: bool) -> Self {
        self.dma = enable;
        self
    }
}

/// Trigger input feeding the slave-mode controller in PWM-input mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerInput {
    FilteredTi1,
    FilteredTi2,
}

/// PWM-input configuration.
///
/// PWM input needs the channel 1/2 pair: the reference channel captures the
/// chosen edge of the signal directly, its neighbour captures the opposite
/// edge through the indirect mapping, and the slave-mode controller resets
/// the counter on each reference edge. Picking the reference channel fixes
/// the whole pair, so an invalid pairing is unrepresentable.
#[derive(Debug, Clone, Copy)]
pub struct PwmInputConfig {
    pub(super) reference: Channel,
    pub(super) trigger: TriggerInput,
    pub(super) prescaler: CapturePrescaler,
    pub(super) filter: u8,
    pub(super) interrupt: Option<Priority>,
}

impl PwmInputConfig {
    /// `reference` must be channel 1 or 2; the complementary channel is the
    /// other half of the pair.
    pub fn new(reference: Channel, trigger: TriggerInput) -> Self {
        Self {
            reference,
            trigger,
            prescaler: CapturePrescaler::Div1,
            filter: 0,
            interrupt: None,
        }
    }

    pub fn prescaler(mut self, prescaler: CapturePrescaler) -> Self {
        self.prescaler = prescaler;
        self
    }

    pub fn filter(mut self, filter: u8) -> Self {
        self.filter = filter;
        self
    }

    /// Enable capture interrupts for both channels of the pair; without
    /// them no measurement is ever taken.
    pub fn listen(mut self, priority: Priority) -> Self {
        self.interrupt = Some(priority);
        self
    }
}
