//! Logical switch table.
//!
//! Switches are numbered in one flat index space. Each [`SwitchBlock`] binds a
//! contiguous run of indices to a contiguous run of pins on one expander.

use crate::error::{pin_claimed_twice, pin_reserved_for_encoder, Error, Result};
use crate::expander::ExpanderConfig;
use crate::gpio::{ActiveLevel, ChipIndex, ExpanderPin, ExtendedPin};
use crate::hal::SwitchDriver;
use log::{debug, info};
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

/// A contiguous run of switches on one expander.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchBlock {
    pub chip: ChipIndex,
    /// Logical index of the block's first switch.
    pub first_index: usize,
    /// Expander pin of the block's first switch.
    pub first_pin: ExpanderPin,
    pub count: u8,
    pub active: ActiveLevel,
}

impl SwitchBlock {
    /// Logical indices covered by this block.
    pub fn indices(&self) -> Range<usize> {
        self.first_index..self.first_index + self.count as usize
    }

    /// Pin offsets covered by this block, failing if the run leaves the chip.
    pub fn pins(&self) -> Result<Vec<ExpanderPin>> {
        (0..self.count)
            .map(|i| ExpanderPin::new(self.first_pin.number() + i))
            .collect()
    }
}

/// One configured switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchBinding {
    pub index: usize,
    pub chip: ChipIndex,
    pub pin: ExtendedPin,
    pub active: ActiveLevel,
}

/// Expands `blocks` into individual switch bindings and checks them.
///
/// Fails on a block naming an unknown chip, a run that leaves its chip, a logical
/// index used twice, a pin used twice, or a pin in `reserved` (pins held by
/// digital encoders, paired with the encoder index).
pub fn plan_switches(
    chips: &[ExpanderConfig],
    blocks: &[SwitchBlock],
    reserved: &[(ExtendedPin, usize)],
) -> Result<Vec<SwitchBinding>> {
    let mut plan = Vec::new();
    let mut by_index: HashMap<usize, ExtendedPin> = HashMap::new();
    let mut by_pin: HashMap<ExtendedPin, usize> = HashMap::new();

    for block in blocks {
        let chip = chips
            .iter()
            .find(|c| c.chip == block.chip)
            .ok_or_else(|| {
                Error::ArgumentOutOfRange(format!(
                    "Switch block starting at {} names unconfigured expander {}",
                    block.first_index, block.chip
                ))
            })?;
        let pins = block.pins().map_err(|_| Error::PinOutOfRange {
            pin: ExtendedPin(
                chip.base_pin + block.first_pin.number() as u16 + block.count as u16 - 1,
            ),
            chip: block.chip,
        })?;

        for (index, offset) in block.indices().zip(pins) {
            let pin = chip.pin(offset);
            if let Some(&(_, encoder)) = reserved.iter().find(|(p, _)| *p == pin) {
                return Err(pin_reserved_for_encoder(pin, encoder));
            }
            if by_index.insert(index, pin).is_some() {
                return Err(Error::SwitchIndexConflict { index });
            }
            if let Some(other) = by_pin.insert(pin, index) {
                return Err(pin_claimed_twice(
                    pin,
                    &format!("switch {}", other),
                    &format!("switch {}", index),
                ));
            }
            plan.push(SwitchBinding {
                index,
                chip: block.chip,
                pin,
                active: block.active,
            });
        }
    }
    Ok(plan)
}

/// The switches currently configured in the switch driver.
#[derive(Debug, Default)]
pub struct SwitchTable {
    bindings: BTreeMap<usize, SwitchBinding>,
}

impl SwitchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the table, then configures every switch described by `blocks`.
    pub fn initialize(
        &mut self,
        driver: &dyn SwitchDriver,
        chips: &[ExpanderConfig],
        blocks: &[SwitchBlock],
        reserved: &[(ExtendedPin, usize)],
    ) -> Result<()> {
        let plan = plan_switches(chips, blocks, reserved)?;
        self.reset(driver)?;

        info!("Setting-up {} x Zynswitches...", plan.len());
        for binding in plan {
            debug!(
                "Switch {} -> expander {} pin {} (active {:?})",
                binding.index, binding.chip, binding.pin, binding.active
            );
            driver.configure(binding.index, binding.pin, binding.active)?;
            self.bindings.insert(binding.index, binding);
        }
        Ok(())
    }

    pub fn reset(&mut self, driver: &dyn SwitchDriver) -> Result<()> {
        self.bindings.clear();
        driver.reset_all()
    }

    pub fn get(&self, index: usize) -> Option<&SwitchBinding> {
        self.bindings.get(&index)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings in logical index order.
    pub fn iter(&self) -> impl Iterator<Item = &SwitchBinding> {
        self.bindings.values()
    }
}
