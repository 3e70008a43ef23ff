//! Time units.

pub use fugit::{ExtU32, HertzU32 as Hertz, MicrosDurationU32 as MicroSecond, RateExtU32};

/// Baudrate
#[derive(Debug, Eq, PartialEq, PartialOrd, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Bps(pub u32);

pub trait U32Ext {
    /// Wrap in `Bps`
    fn bps(self) -> Bps;
}

impl U32Ext for u32 {
    fn bps(self) -> Bps {
        assert!(self > 0);
        Bps(self)
    }
}
