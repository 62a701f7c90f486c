//! MCP23017 expander configuration and interrupt wiring.

use crate::consts;
use crate::error::{Error, Result};
use crate::gpio::{Bank, ChipIndex, ExpanderPin, ExtendedPin, HostPin};
use crate::hal::ExpanderDriver;
use crate::i2c::I2cAddress;
use crate::interrupt::{bank_isrs, InterruptStats};
use log::{debug, info};
use std::collections::HashSet;
use std::ops::Range;
use std::sync::Arc;

/// Static configuration of one expander chip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpanderConfig {
    pub chip: ChipIndex,
    /// Extended pin number of the chip's pin 0.
    pub base_pin: u16,
    pub address: I2cAddress,
    /// Host pin wired to INTA.
    pub int_a: HostPin,
    /// Host pin wired to INTB.
    pub int_b: HostPin,
}

impl ExpanderConfig {
    /// Extended pin number of `pin` on this chip.
    pub fn pin(&self, pin: ExpanderPin) -> ExtendedPin {
        ExtendedPin::from_base(self.base_pin, pin)
    }

    /// The chip's block of extended pin numbers.
    pub fn pin_range(&self) -> Range<u16> {
        self.base_pin..self.base_pin + consts::PINS_PER_CHIP as u16
    }

    pub fn contains(&self, pin: ExtendedPin) -> bool {
        self.pin_range().contains(&pin.number())
    }

    /// Host pin carrying the interrupt line of `bank`.
    pub fn interrupt_pin(&self, bank: Bank) -> HostPin {
        match bank {
            Bank::A => self.int_a,
            Bank::B => self.int_b,
        }
    }
}

/// Checks that `chips` lists chip 0 then chip 1 with disjoint pin blocks, distinct
/// bus addresses and distinct interrupt lines.
pub fn validate_expanders(chips: &[ExpanderConfig]) -> Result<()> {
    if chips.len() != consts::NUM_EXPANDERS {
        return Err(Error::ArgumentOutOfRange(format!(
            "Expected {} expander chips, got {}",
            consts::NUM_EXPANDERS,
            chips.len()
        )));
    }
    for (position, config) in chips.iter().enumerate() {
        if config.chip.index() != position {
            return Err(Error::ArgumentOutOfRange(format!(
                "Expander {} listed in position {}; chips must be configured in index order",
                config.chip, position
            )));
        }
    }

    let mut addresses = HashSet::new();
    let mut int_pins = HashSet::new();
    for (i, config) in chips.iter().enumerate() {
        if !addresses.insert(config.address) {
            return Err(Error::BusAddressConflict {
                address: config.address,
            });
        }
        for bank in Bank::ALL {
            let pin = config.interrupt_pin(bank);
            if !int_pins.insert(pin) {
                return Err(Error::InterruptPinConflict { pin });
            }
        }
        for other in &chips[..i] {
            let (a, b) = (config.pin_range(), other.pin_range());
            if a.start < b.end && b.start < a.end {
                return Err(Error::PinBlockOverlap {
                    first: other.chip,
                    second: config.chip,
                });
            }
        }
    }
    Ok(())
}

/// The configured expanders and their per-bank interrupt counters.
#[derive(Debug, Default)]
pub struct ExpanderSet {
    chips: Vec<ExpanderConfig>,
    stats: Arc<InterruptStats>,
}

impl ExpanderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets every chip, then configures `configs` in order, handing each chip its
    /// bank A/B handlers. Stops at the first failure; chips configured before it
    /// stay configured.
    pub fn initialize(
        &mut self,
        driver: &Arc<dyn ExpanderDriver>,
        configs: &[ExpanderConfig],
    ) -> Result<()> {
        validate_expanders(configs)?;
        self.reset(driver.as_ref())?;

        info!("Setting-up {} x MCP23017 expanders...", configs.len());
        for config in configs {
            debug!(
                "Configuring expander {}: base={}, addr={}, INTA={}, INTB={}",
                config.chip, config.base_pin, config.address, config.int_a, config.int_b
            );
            let isrs = bank_isrs(
                config.chip,
                Arc::downgrade(driver),
                Arc::clone(&self.stats),
            );
            driver.configure(config, isrs)?;
            self.chips.push(config.clone());
        }
        Ok(())
    }

    /// Forgets the configured chips and resets them in the driver.
    pub fn reset(&mut self, driver: &dyn ExpanderDriver) -> Result<()> {
        self.chips.clear();
        self.stats.reset();
        driver.reset_all()
    }

    /// Chips configured so far, in configuration order.
    pub fn chips(&self) -> &[ExpanderConfig] {
        &self.chips
    }

    pub fn stats(&self) -> &InterruptStats {
        &self.stats
    }

    /// Finds the chip and pin offset behind an extended pin number.
    pub fn locate(&self, pin: ExtendedPin) -> Option<(ChipIndex, ExpanderPin)> {
        self.chips.iter().find(|c| c.contains(pin)).and_then(|c| {
            ExpanderPin::new((pin.number() - c.base_pin) as u8)
                .ok()
                .map(|offset| (c.chip, offset))
        })
    }
}
