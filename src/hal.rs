//! Interfaces of the chip drivers this crate sequences.
//!
//! The register-level drivers (MCP23017, ADS1115/RV112, PEC11 decoding, switch
//! debouncing, LM4811 volume) and the host interrupt dispatcher live outside this
//! crate. They are shared between the orchestrator and interrupt handlers, so every
//! method takes `&self` and implementations must be `Send + Sync`.

use crate::adc::AdcNodeConfig;
use crate::error::Result;
use crate::expander::ExpanderConfig;
use crate::gpio::{ActiveLevel, Bank, ChipIndex, ExtendedPin};
use crate::interrupt::BankIsrs;
use std::sync::Arc;

/// Opaque handle to an ADC node returned by [`AdcDriver::configure_node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(pub usize);

/// Opaque handle to an analog encoder returned by [`AdcDriver::configure_channel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnalogHandle(pub usize);

/// Host GPIO interrupt delivery.
pub trait InterruptRegistry: Send + Sync {
    /// Prepares the registry; expander drivers attach bank handlers afterwards.
    fn init(&self) -> Result<()>;
    /// Starts delivering interrupts to the attached handlers.
    fn start(&self) -> Result<()>;
    /// Stops delivery. No handler runs after this returns.
    fn stop(&self) -> Result<()>;
}

/// MCP23017 register access.
pub trait ExpanderDriver: Send + Sync {
    /// Forgets every configured chip.
    fn reset_all(&self) -> Result<()>;
    /// Configures one chip and attaches its bank handlers to the interrupt lines.
    fn configure(&self, config: &ExpanderConfig, isrs: BankIsrs) -> Result<()>;
    /// Reads the bank's interrupt flags, updates pin state and returns the mask of
    /// pins that changed (0 when nothing did).
    fn scan(&self, chip: ChipIndex, bank: Bank) -> Result<u8>;
}

/// Debounced switch inputs.
pub trait SwitchDriver: Send + Sync {
    fn reset_all(&self) -> Result<()>;
    fn configure(&self, index: usize, pin: ExtendedPin, active: ActiveLevel) -> Result<()>;
}

/// ADS1115 sampling of RV112 analog encoders.
pub trait AdcDriver: Send + Sync {
    /// Drops every node and encoder; the driver is ready for fresh configuration.
    fn reset_all(&self) -> Result<()>;
    fn configure_node(&self, config: &AdcNodeConfig) -> Result<NodeHandle>;
    /// Attaches encoder `index` to `channel` of `node`.
    fn configure_channel(&self, node: NodeHandle, channel: u8, index: usize)
        -> Result<AnalogHandle>;
    /// Starts the single background sampling cadence over all configured encoders.
    fn start_sampling(&self) -> Result<()>;
    fn stop_sampling(&self) -> Result<()>;
    /// Relative rotation accumulated since the previous read.
    fn read_delta(&self, encoder: AnalogHandle) -> Result<i32>;
}

/// PEC11 quadrature decoding on expander pins.
pub trait DigitalEncoderDriver: Send + Sync {
    fn reset_all(&self) -> Result<()>;
    fn configure(&self, index: usize, pin_a: ExtendedPin, pin_b: ExtendedPin) -> Result<()>;
    /// Relative count accumulated since the previous read.
    fn read_delta(&self, index: usize) -> Result<i32>;
}

/// LM4811 headphone volume.
pub trait VolumeDriver: Send + Sync {
    fn init(&self) -> Result<()>;
    fn end(&self) -> Result<()>;
    /// Sets the level and returns the level actually applied.
    fn set(&self, level: u8) -> Result<u8>;
    fn get(&self) -> Result<u8>;
    fn get_max(&self) -> Result<u8>;
}

/// The set of drivers one control surface runs on.
#[derive(Clone)]
pub struct Drivers {
    pub interrupts: Arc<dyn InterruptRegistry>,
    pub expanders: Arc<dyn ExpanderDriver>,
    pub switches: Arc<dyn SwitchDriver>,
    pub adc: Arc<dyn AdcDriver>,
    pub encoders: Arc<dyn DigitalEncoderDriver>,
    pub volume: Arc<dyn VolumeDriver>,
}
