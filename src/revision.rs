//! Hardware revision selection.

use crate::consts;
use crate::error::{Error, Result};
use crate::gpio::HostPin;
use std::fmt;

/// Which rotary hardware backs the four encoder slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// Four RV112 analog encoders.
    FourAnalog,
    /// Three RV112 analog encoders and one PEC11 quadrature encoder in slot 3.
    ThreeAnalogOneDigital,
}

impl Topology {
    /// Number of analog encoder bindings this topology creates.
    pub fn analog_count(&self) -> usize {
        match self {
            Topology::FourAnalog => 4,
            Topology::ThreeAnalogOneDigital => 3,
        }
    }
}

/// Control board revision (1, 2, 3, ...).
///
/// The revision is a property of the build: take it from [`HardwareRevision::from_build`]
/// or construct it once at startup. Nothing in the crate detects it at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HardwareRevision(u8);

impl HardwareRevision {
    pub const V1: HardwareRevision = HardwareRevision(1);
    pub const V2: HardwareRevision = HardwareRevision(2);
    pub const V3: HardwareRevision = HardwareRevision(3);

    /// Creates a revision, returning an error for 0.
    pub fn new(revision: u8) -> Result<Self> {
        if revision >= 1 {
            Ok(HardwareRevision(revision))
        } else {
            Err(Error::InvalidRevision(revision))
        }
    }

    /// The revision selected by cargo features (`z2-v1`, `z2-v2`), revision 3 otherwise.
    pub const fn from_build() -> Self {
        if cfg!(feature = "z2-v1") {
            HardwareRevision::V1
        } else if cfg!(feature = "z2-v2") {
            HardwareRevision::V2
        } else {
            HardwareRevision::V3
        }
    }

    #[inline]
    pub fn number(&self) -> u8 {
        self.0
    }

    pub fn topology(&self) -> Topology {
        if self.0 > 2 {
            Topology::ThreeAnalogOneDigital
        } else {
            Topology::FourAnalog
        }
    }

    /// Host pins carrying the second expander's bank A and bank B interrupts.
    pub fn expander_2_interrupt_pins(&self) -> (HostPin, HostPin) {
        if self.0 == 1 {
            (
                HostPin(consts::expander_2::INTA_PIN_V1),
                HostPin(consts::expander_2::INTB_PIN_V1),
            )
        } else {
            (
                HostPin(consts::expander_2::INTA_PIN),
                HostPin(consts::expander_2::INTB_PIN),
            )
        }
    }
}

impl Default for HardwareRevision {
    fn default() -> Self {
        HardwareRevision::from_build()
    }
}

impl fmt::Display for HardwareRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Z2 v{}", self.0)
    }
}
