//! Convenience re-export of the traits the drivers are used through.

pub use crate::pac::RegisterAccess as _;
pub use crate::time::{ExtU32 as _, RateExtU32 as _, U32Ext as _};
pub use embedded_hal::delay::DelayNs as _;
pub use embedded_hal::pwm::SetDutyCycle as _;
