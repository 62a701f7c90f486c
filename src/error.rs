use crate::gpio::{ChipIndex, ExtendedPin, HostPin};
use crate::i2c::I2cAddress;
use thiserror::Error;

/// Errors that can occur while bringing up or tearing down the control surface.
///
/// Configuration conflicts are detected before any driver is touched for the
/// affected component and abort setup. Bus failures are reported by the
/// collaborator drivers and abort the enclosing lifecycle call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An underlying chip did not respond or reported a failure.
    #[error("Bus failure on {device}: {message}")]
    Bus {
        /// The device (chip or subsystem) that failed.
        device: String,
        /// Details reported by the driver.
        message: String,
    },
    /// Two components claim the same extended pin.
    #[error("Pin {pin} is assigned twice: {message}")]
    PinConflict {
        /// The pin claimed twice.
        pin: ExtendedPin,
        /// Which assignments collide.
        message: String,
    },
    /// An extended pin does not fall inside the pin block of the chip it is bound to.
    #[error("Pin {pin} is outside the pin block of expander {chip}")]
    PinOutOfRange {
        /// The offending pin.
        pin: ExtendedPin,
        /// The chip the pin was bound to.
        chip: ChipIndex,
    },
    /// Two analog encoder bindings use the same channel of one ADC node.
    #[error("ADC node at {address} channel {channel} is already bound to encoder {existing}")]
    ChannelConflict {
        /// Bus address of the ADC node.
        address: I2cAddress,
        /// The channel requested twice.
        channel: u8,
        /// The encoder index already holding the channel.
        existing: usize,
    },
    /// Logical switch index ranges overlap.
    #[error("Switch index {index} is assigned twice")]
    SwitchIndexConflict {
        /// The logical switch index assigned twice.
        index: usize,
    },
    /// Two chips share the same bus address.
    #[error("Bus address {address} is used by more than one chip")]
    BusAddressConflict {
        /// The duplicated address.
        address: I2cAddress,
    },
    /// Two interrupt lines are wired to the same host pin.
    #[error("Host interrupt pin {pin} is used by more than one expander bank")]
    InterruptPinConflict {
        /// The duplicated host pin.
        pin: HostPin,
    },
    /// Two expander pin blocks overlap.
    #[error("Pin block of expander {first} overlaps the pin block of expander {second}")]
    PinBlockOverlap {
        /// First chip.
        first: ChipIndex,
        /// Second chip.
        second: ChipIndex,
    },
    /// The ADC node pool has no free slot left.
    #[error("ADC node pool exhausted (max {max} nodes)")]
    PoolExhausted {
        /// Capacity of the pool.
        max: usize,
    },
    /// An ADC channel selector beyond the node's channel count.
    #[error("ADC channel {channel} out of range (node exposes {count} encoder channels)")]
    ChannelOutOfRange {
        /// The requested channel.
        channel: u8,
        /// Channels available on one node.
        count: u8,
    },
    /// Bindings cannot be added while the sampling cadence is running.
    #[error("Analog sampling is already running; stop it before adding encoder {index}")]
    SamplingActive {
        /// The encoder index that could not be added.
        index: usize,
    },
    /// Unified encoder index outside the slot table.
    #[error("Encoder index {index} out of range (0-{max})")]
    EncoderIndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Highest valid index.
        max: usize,
    },
    /// A unified encoder slot was registered twice.
    #[error("Encoder slot {index} is already bound")]
    EncoderSlotConflict {
        /// The index bound twice.
        index: usize,
    },
    /// Revision numbers start at 1.
    #[error("Invalid hardware revision {0} (must be 1 or greater)")]
    InvalidRevision(u8),
    /// An expander pin offset or chip index outside its range.
    #[error("Argument out of range: {0}")]
    ArgumentOutOfRange(String),
    /// A value range with `min > max` or a zero step.
    #[error("Invalid encoder range: min={min}, max={max}, step={step}")]
    InvalidRange {
        /// Lower bound.
        min: i32,
        /// Upper bound.
        max: i32,
        /// Step per detent.
        step: i32,
    },
    /// The operation requires the control surface to be running.
    #[error("Control surface is not running")]
    NotRunning,
    /// `init_control` called while already running.
    #[error("Control surface is already running")]
    AlreadyRunning,
    /// The control surface was stopped; a fresh instance is required.
    #[error("Control surface has been stopped and cannot be restarted")]
    Stopped,
}

/// Result type alias for control-surface operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Builds a [`Error::Bus`] for a driver failure.
    ///
    /// Collaborator drivers should use this to report an unreachable chip.
    pub fn bus(device: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Bus {
            device: device.into(),
            message: message.into(),
        }
    }

    /// Returns true for the configuration conflict family, which is always fatal
    /// for the setup step that raised it.
    pub fn is_configuration_conflict(&self) -> bool {
        matches!(
            self,
            Error::PinConflict { .. }
                | Error::PinOutOfRange { .. }
                | Error::ChannelConflict { .. }
                | Error::SwitchIndexConflict { .. }
                | Error::BusAddressConflict { .. }
                | Error::InterruptPinConflict { .. }
                | Error::PinBlockOverlap { .. }
                | Error::PoolExhausted { .. }
                | Error::ChannelOutOfRange { .. }
                | Error::SamplingActive { .. }
                | Error::EncoderSlotConflict { .. }
        )
    }
}

// Helpers for the digital encoder pin reservation checks
pub(crate) fn pin_reserved_for_encoder(pin: ExtendedPin, index: usize) -> Error {
    Error::PinConflict {
        pin,
        message: format!("reserved for digital encoder {}", index),
    }
}
pub(crate) fn pin_claimed_twice(pin: ExtendedPin, first: &str, second: &str) -> Error {
    Error::PinConflict {
        pin,
        message: format!("claimed by {} and by {}", first, second),
    }
}
