//! ADS1115 node pool and RV112 analog encoder bindings.
//!
//! A small fixed pool of ADC nodes is shared by the analog encoders: several
//! bindings hold the same node by reference (`Arc`). Reads issued through a binding
//! take the node's bus lock, so channels of one node are never read concurrently.

use crate::consts;
use crate::error::{Error, Result};
use crate::hal::{AdcDriver, AnalogHandle, NodeHandle};
use crate::i2c::I2cAddress;
use log::{debug, info, trace};
use std::sync::{Arc, Mutex, PoisonError};

/// ADS1115 programmable gain, named by full-scale range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdcGain {
    /// ±6.144 V
    Fsr6_144,
    /// ±4.096 V
    Fsr4_096,
    /// ±2.048 V (power-on default)
    Fsr2_048,
    /// ±1.024 V
    Fsr1_024,
    /// ±0.512 V
    Fsr0_512,
    /// ±0.256 V
    Fsr0_256,
}

impl AdcGain {
    pub fn full_scale_volts(&self) -> f64 {
        match self {
            AdcGain::Fsr6_144 => 6.144,
            AdcGain::Fsr4_096 => 4.096,
            AdcGain::Fsr2_048 => 2.048,
            AdcGain::Fsr1_024 => 1.024,
            AdcGain::Fsr0_512 => 0.512,
            AdcGain::Fsr0_256 => 0.256,
        }
    }

    /// PGA field of the config register (bits 11:9).
    pub fn config_bits(&self) -> u16 {
        let pga: u16 = match self {
            AdcGain::Fsr6_144 => 0b000,
            AdcGain::Fsr4_096 => 0b001,
            AdcGain::Fsr2_048 => 0b010,
            AdcGain::Fsr1_024 => 0b011,
            AdcGain::Fsr0_512 => 0b100,
            AdcGain::Fsr0_256 => 0b101,
        };
        pga << 9
    }
}

/// ADS1115 data rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdcRate {
    Sps8,
    Sps16,
    Sps32,
    Sps64,
    Sps128,
    Sps250,
    Sps475,
    Sps860,
}

impl AdcRate {
    pub fn samples_per_second(&self) -> u32 {
        match self {
            AdcRate::Sps8 => 8,
            AdcRate::Sps16 => 16,
            AdcRate::Sps32 => 32,
            AdcRate::Sps64 => 64,
            AdcRate::Sps128 => 128,
            AdcRate::Sps250 => 250,
            AdcRate::Sps475 => 475,
            AdcRate::Sps860 => 860,
        }
    }

    /// DR field of the config register (bits 7:5).
    pub fn config_bits(&self) -> u16 {
        let dr: u16 = match self {
            AdcRate::Sps8 => 0b000,
            AdcRate::Sps16 => 0b001,
            AdcRate::Sps32 => 0b010,
            AdcRate::Sps64 => 0b011,
            AdcRate::Sps128 => 0b100,
            AdcRate::Sps250 => 0b101,
            AdcRate::Sps475 => 0b110,
            AdcRate::Sps860 => 0b111,
        };
        dr << 5
    }

    /// Time for one conversion, in microseconds (rounded up).
    pub fn conversion_time_us(&self) -> u32 {
        1_000_000_u32.div_ceil(self.samples_per_second())
    }
}

/// Bus address and conversion settings of one ADC node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdcNodeConfig {
    pub address: I2cAddress,
    pub gain: AdcGain,
    pub rate: AdcRate,
}

impl AdcNodeConfig {
    /// Volts represented by one count of a signed 16-bit conversion result.
    pub fn volts_per_count(&self) -> f64 {
        self.gain.full_scale_volts() / 32768.0
    }

    /// Converts a raw conversion result to volts.
    pub fn to_volts(&self, raw: i16) -> f64 {
        raw as f64 * self.volts_per_count()
    }
}

/// A provisioned ADC node.
#[derive(Debug)]
pub struct AdcNode {
    config: AdcNodeConfig,
    handle: NodeHandle,
    bus: Mutex<()>,
}

impl AdcNode {
    pub fn config(&self) -> &AdcNodeConfig {
        &self.config
    }

    pub fn handle(&self) -> NodeHandle {
        self.handle
    }

    /// Runs `f` while holding this node's bus lock.
    pub fn with_bus<T>(&self, f: impl FnOnce() -> T) -> T {
        let _guard = self.bus.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }
}

/// Fixed-capacity pool of ADC nodes.
#[derive(Debug, Default)]
pub struct AdcNodePool {
    nodes: Vec<Arc<AdcNode>>,
}

impl AdcNodePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures a node in the driver and adds it to the pool.
    pub fn provision(
        &mut self,
        driver: &dyn AdcDriver,
        config: AdcNodeConfig,
    ) -> Result<Arc<AdcNode>> {
        if self.nodes.len() >= consts::MAX_NUM_ADS1115 {
            return Err(Error::PoolExhausted {
                max: consts::MAX_NUM_ADS1115,
            });
        }
        if self.nodes.iter().any(|n| n.config.address == config.address) {
            return Err(Error::BusAddressConflict {
                address: config.address,
            });
        }
        debug!(
            "Configuring ADS1115 at {}: gain ±{} V, {} SPS",
            config.address,
            config.gain.full_scale_volts(),
            config.rate.samples_per_second()
        );
        let handle = driver.configure_node(&config)?;
        let node = Arc::new(AdcNode {
            config,
            handle,
            bus: Mutex::new(()),
        });
        self.nodes.push(Arc::clone(&node));
        Ok(node)
    }

    /// Node in pool slot `slot`.
    pub fn get(&self, slot: usize) -> Option<&Arc<AdcNode>> {
        self.nodes.get(slot)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

/// Placement of one analog encoder: pool slot and channel within that node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalogChannel {
    /// Logical analog encoder index.
    pub index: usize,
    /// Pool slot of the ADC node.
    pub node: usize,
    /// Encoder channel within the node.
    pub channel: u8,
}

/// One analog encoder attached to an ADC node channel.
#[derive(Debug, Clone)]
pub struct AnalogEncoderBinding {
    index: usize,
    node: Arc<AdcNode>,
    channel: u8,
    handle: AnalogHandle,
}

impl AnalogEncoderBinding {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn node(&self) -> &Arc<AdcNode> {
        &self.node
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn handle(&self) -> AnalogHandle {
        self.handle
    }

    /// Reads the accumulated rotation, serialized with other reads on the same node.
    pub fn read_delta(&self, driver: &dyn AdcDriver) -> Result<i32> {
        self.node.with_bus(|| driver.read_delta(self.handle))
    }
}

/// The analog encoder layer: node pool, bindings and sampling state.
#[derive(Debug, Default)]
pub struct AnalogEncoders {
    pool: AdcNodePool,
    bindings: Vec<AnalogEncoderBinding>,
    sampling: bool,
}

impl AnalogEncoders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops a running cadence, resets the driver layer, provisions `nodes`, binds
    /// `channels` and starts sampling once all bindings exist.
    pub fn initialize(
        &mut self,
        driver: &dyn AdcDriver,
        nodes: &[AdcNodeConfig],
        channels: &[AnalogChannel],
    ) -> Result<()> {
        if self.sampling {
            self.stop_sampling(driver)?;
        }
        self.clear();
        driver.reset_all()?;

        for config in nodes {
            self.pool.provision(driver, *config)?;
        }
        info!("Setting-up {} x RV112 analog encoders...", channels.len());
        for channel in channels {
            self.bind(driver, channel)?;
        }
        self.start_sampling(driver)
    }

    /// Attaches one encoder to a node channel.
    pub fn bind(
        &mut self,
        driver: &dyn AdcDriver,
        placement: &AnalogChannel,
    ) -> Result<&AnalogEncoderBinding> {
        if self.sampling {
            return Err(Error::SamplingActive {
                index: placement.index,
            });
        }
        let node = self.pool.get(placement.node).cloned().ok_or_else(|| {
            Error::ArgumentOutOfRange(format!(
                "ADC node slot {} is not provisioned ({} nodes)",
                placement.node,
                self.pool.len()
            ))
        })?;
        if placement.channel >= consts::ENCODER_CHANNELS_PER_ADS1115 {
            return Err(Error::ChannelOutOfRange {
                channel: placement.channel,
                count: consts::ENCODER_CHANNELS_PER_ADS1115,
            });
        }
        if let Some(existing) = self
            .bindings
            .iter()
            .find(|b| Arc::ptr_eq(&b.node, &node) && b.channel == placement.channel)
        {
            return Err(Error::ChannelConflict {
                address: node.config.address,
                channel: placement.channel,
                existing: existing.index,
            });
        }
        if self.bindings.iter().any(|b| b.index == placement.index) {
            return Err(Error::EncoderSlotConflict {
                index: placement.index,
            });
        }

        debug!(
            "RV112 {} -> ADS1115 {} channel {}",
            placement.index, node.config.address, placement.channel
        );
        let handle = driver.configure_channel(node.handle, placement.channel, placement.index)?;
        self.bindings.push(AnalogEncoderBinding {
            index: placement.index,
            node,
            channel: placement.channel,
            handle,
        });
        Ok(&self.bindings[self.bindings.len() - 1])
    }

    pub fn start_sampling(&mut self, driver: &dyn AdcDriver) -> Result<()> {
        trace!("Starting analog sampling over {} encoders", self.bindings.len());
        driver.start_sampling()?;
        self.sampling = true;
        Ok(())
    }

    pub fn stop_sampling(&mut self, driver: &dyn AdcDriver) -> Result<()> {
        self.sampling = false;
        driver.stop_sampling()
    }

    /// Forgets nodes and bindings without touching the driver.
    pub fn clear(&mut self) {
        self.sampling = false;
        self.bindings.clear();
        self.pool.clear();
    }

    pub fn is_sampling(&self) -> bool {
        self.sampling
    }

    pub fn pool(&self) -> &AdcNodePool {
        &self.pool
    }

    pub fn bindings(&self) -> &[AnalogEncoderBinding] {
        &self.bindings
    }

    /// Binding for logical analog encoder `index`.
    pub fn binding(&self, index: usize) -> Option<&AnalogEncoderBinding> {
        self.bindings.iter().find(|b| b.index == index)
    }
}
